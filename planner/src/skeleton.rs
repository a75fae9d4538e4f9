use std::collections::{HashMap, HashSet};

use cvs_log::{DeltaInfo, RcsInfo};
use revision::Revision;

use crate::{introduce::introduce_1_1, PlanEntry, Planner};

/// Wraps another planner and narrows its input down to the topologically
/// significant revisions: the extremes, branch-point transitions, `1.1`,
/// and tagged revisions. Stacking (`-s -s`) is just nesting one Skeleton
/// inside another.
pub struct Skeleton {
    inner: Box<dyn Planner>,
    introduce_1_1: bool,
}

impl Skeleton {
    pub fn new(inner: Box<dyn Planner>, introduce_1_1: bool) -> Self {
        Self {
            inner,
            introduce_1_1,
        }
    }

    fn interesting_revisions(rcsinfo: &RcsInfo, sorted: &[DeltaInfo]) -> HashSet<Revision> {
        let mut interesting = HashSet::new();

        if let Some(first) = sorted.first() {
            interesting.insert(first.revision.clone());
        }
        if let Some(last) = sorted.last() {
            interesting.insert(last.revision.clone());
        }

        for pair in sorted.windows(2) {
            let (r1, r2) = (&pair[0].revision, &pair[1].revision);
            if !r1.same_branch(r2) {
                interesting.insert(r1.clone());
                if !r2.is_trunk() {
                    if let Ok(point) = r2.branch_point() {
                        interesting.insert(point);
                    }
                }
            }
        }

        let one_one: Revision = "1.1".parse().expect("1.1 is a valid revision");
        if sorted.iter().any(|d| d.revision == one_one) {
            interesting.insert(one_one);
        }

        for (_, tag_revision) in &rcsinfo.tags {
            if tag_revision.is_magic_branch() {
                if let Ok(point) = tag_revision.branch_point() {
                    interesting.insert(point);
                }
            } else if !tag_revision.is_branch() {
                interesting.insert(tag_revision.clone());
            }
        }

        interesting
    }
}

impl Planner for Skeleton {
    fn plan(&self, rcsinfo: &RcsInfo, deltas: &[DeltaInfo]) -> Vec<PlanEntry> {
        let mut sorted = introduce_1_1(deltas.to_vec(), self.introduce_1_1);
        sorted.sort_by(|a, b| a.revision.cmp(&b.revision));

        let interesting = Self::interesting_revisions(rcsinfo, &sorted);

        let by_revision: HashMap<Revision, DeltaInfo> = sorted
            .into_iter()
            .map(|delta| (delta.revision.clone(), delta))
            .collect();

        let mut filtered: Vec<DeltaInfo> = interesting
            .into_iter()
            .filter_map(|rev| by_revision.get(&rev).cloned())
            .collect();
        filtered.sort_by(|a, b| a.revision.cmp(&b.revision));

        self.inner.plan(rcsinfo, &filtered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ExactPlanner;

    fn rcsinfo(tags: Vec<(&str, &str)>) -> RcsInfo {
        RcsInfo {
            rcs_path: "/cvsroot/m/file.c,v".into(),
            working_file: "file.c".to_string(),
            head: Some("1.5".parse().unwrap()),
            default_branch: None,
            tags: tags
                .into_iter()
                .map(|(n, r)| (n.to_string(), r.parse().unwrap()))
                .collect(),
            keyword_mode: None,
            description: String::new(),
        }
    }

    fn delta(rev: &str) -> DeltaInfo {
        DeltaInfo {
            revision: rev.parse().unwrap(),
            date: "2021/08/20 17:34:26".to_string(),
            author: "adam".to_string(),
            state: "Exp".to_string(),
            branches: Vec::new(),
            log: "log".to_string(),
        }
    }

    #[test]
    fn test_skeleton_keeps_extremes_and_tag() {
        let deltas: Vec<_> = ["1.1", "1.2", "1.3", "1.4", "1.5"].iter().map(|r| delta(r)).collect();
        let info = rcsinfo(vec![("REL", "1.3")]);

        let plan = Skeleton::new(Box::new(ExactPlanner::new(false)), false).plan(&info, &deltas);
        let revisions: Vec<_> = plan.iter().map(|e| e.remote_delta.revision.to_string()).collect();

        assert_eq!(revisions, vec!["1.1", "1.3", "1.5"]);
    }

    #[test]
    fn test_skeleton_keeps_branch_point_on_transition() {
        let deltas: Vec<_> = ["1.1", "1.2", "1.2.2.1", "1.2.2.2"]
            .iter()
            .map(|r| delta(r))
            .collect();
        let info = rcsinfo(vec![]);

        let plan = Skeleton::new(Box::new(ExactPlanner::new(false)), false).plan(&info, &deltas);
        let revisions: Vec<_> = plan.iter().map(|e| e.remote_delta.revision.to_string()).collect();

        assert_eq!(revisions, vec!["1.1", "1.2", "1.2.2.2"]);
    }

    #[test]
    fn test_skeleton_keeps_magic_branch_tag_branch_point() {
        let deltas: Vec<_> = ["1.1", "1.2", "1.3"].iter().map(|r| delta(r)).collect();
        let info = rcsinfo(vec![("vendor", "1.2.0.2")]);

        let plan = Skeleton::new(Box::new(ExactPlanner::new(false)), false).plan(&info, &deltas);
        let revisions: Vec<_> = plan.iter().map(|e| e.remote_delta.revision.to_string()).collect();

        assert_eq!(revisions, vec!["1.1", "1.2", "1.3"]);
    }

    #[test]
    fn test_skeleton_idempotent_under_double_wrapping() {
        let deltas: Vec<_> = ["1.1", "1.2", "1.3", "1.4", "1.5"].iter().map(|r| delta(r)).collect();
        let info = rcsinfo(vec![("REL", "1.3")]);

        let once = Skeleton::new(Box::new(ExactPlanner::new(false)), false).plan(&info, &deltas);
        let twice = Skeleton::new(
            Box::new(Skeleton::new(Box::new(ExactPlanner::new(false)), false)),
            false,
        )
        .plan(&info, &deltas);

        let once_revs: Vec<_> = once.iter().map(|e| e.remote_delta.revision.to_string()).collect();
        let twice_revs: Vec<_> = twice.iter().map(|e| e.remote_delta.revision.to_string()).collect();
        assert_eq!(once_revs, twice_revs);
    }
}
