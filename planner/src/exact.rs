use cvs_log::{DeltaInfo, RcsInfo};

use crate::{entry::attic_flag, introduce::introduce_1_1, PlanEntry, Planner};

/// Yields every delta, in revision order, with no reduction.
pub struct ExactPlanner {
    introduce_1_1: bool,
}

impl ExactPlanner {
    pub fn new(introduce_1_1: bool) -> Self {
        Self { introduce_1_1 }
    }
}

impl Planner for ExactPlanner {
    fn plan(&self, rcsinfo: &RcsInfo, deltas: &[DeltaInfo]) -> Vec<PlanEntry> {
        let mut deltas = introduce_1_1(deltas.to_vec(), self.introduce_1_1);
        deltas.sort_by(|a, b| a.revision.cmp(&b.revision));

        deltas
            .into_iter()
            .map(|delta| PlanEntry {
                attic: attic_flag(&delta, rcsinfo),
                remote_delta: delta.clone(),
                local_delta: delta,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rcsinfo() -> RcsInfo {
        RcsInfo {
            rcs_path: "/cvsroot/m/file.c,v".into(),
            working_file: "file.c".to_string(),
            head: Some("1.3".parse().unwrap()),
            default_branch: None,
            tags: Vec::new(),
            keyword_mode: None,
            description: String::new(),
        }
    }

    fn delta(rev: &str, state: &str) -> DeltaInfo {
        DeltaInfo {
            revision: rev.parse().unwrap(),
            date: "2021/08/20 17:34:26".to_string(),
            author: "adam".to_string(),
            state: state.to_string(),
            branches: Vec::new(),
            log: "log".to_string(),
        }
    }

    #[test]
    fn test_exact_preserves_all_in_order() {
        let deltas = vec![delta("1.3", "Exp"), delta("1.1", "Exp"), delta("1.2", "Exp")];
        let plan = ExactPlanner::new(false).plan(&rcsinfo(), &deltas);

        let revisions: Vec<_> = plan.iter().map(|e| e.remote_delta.revision.to_string()).collect();
        assert_eq!(revisions, vec!["1.1", "1.2", "1.3"]);
    }

    #[test]
    fn test_exact_attic_flag_on_dead_head() {
        let deltas = vec![delta("1.3", "dead")];
        let mut info = rcsinfo();
        info.rcs_path = "/cvsroot/m/Attic/file.c,v".into();
        let plan = ExactPlanner::new(false).plan(&info, &deltas);

        assert_eq!(plan[0].attic, Some(true));
    }

    #[test]
    fn test_exact_non_trunk_attic_is_none() {
        let deltas = vec![delta("1.2.2.1", "Exp")];
        let plan = ExactPlanner::new(false).plan(&rcsinfo(), &deltas);

        assert_eq!(plan[0].attic, None);
    }
}
