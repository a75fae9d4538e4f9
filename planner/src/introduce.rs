use cvs_log::DeltaInfo;
use revision::Revision;

/// RCS's own epoch; used as the date of a synthetic 1.1 when `introduce-1.1`
/// fires and the tool itself has to stand in as the delta's author.
const EPOCH_DATE: &str = "1970/01/01 00:00:00";
const SYNTHETIC_AUTHOR: &str = "cvssuck";

/// If `enabled` and no `1.1` delta is present, returns `deltas` with a
/// synthetic dead `1.1` prepended. Some vendor-branch layouts make `1.1` the
/// conceptual branch-point of the vendor branch even when it never existed
/// as a real revision on the server.
pub(crate) fn introduce_1_1(deltas: Vec<DeltaInfo>, enabled: bool) -> Vec<DeltaInfo> {
    if !enabled {
        return deltas;
    }

    let one_one: Revision = "1.1".parse().expect("1.1 is a valid revision");
    if deltas.iter().any(|d| d.revision == one_one) {
        return deltas;
    }

    let mut with_synthetic = Vec::with_capacity(deltas.len() + 1);
    with_synthetic.push(DeltaInfo {
        revision: one_one,
        date: EPOCH_DATE.to_string(),
        author: SYNTHETIC_AUTHOR.to_string(),
        state: "dead".to_string(),
        branches: Vec::new(),
        log: String::new(),
    });
    with_synthetic.extend(deltas);
    with_synthetic
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn test_disabled_is_noop() {
        let deltas = vec![delta("1.2", "Exp")];
        assert_eq!(introduce_1_1(deltas.clone(), false), deltas);
    }

    #[test]
    fn test_injects_when_absent() {
        let deltas = vec![delta("1.2", "Exp")];
        let result = introduce_1_1(deltas, true);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].revision, "1.1".parse().unwrap());
        assert!(result[0].is_dead());
        assert_eq!(result[0].date, EPOCH_DATE);
        assert_eq!(result[1].revision, "1.2".parse().unwrap());
    }

    #[test]
    fn test_noop_when_already_present() {
        let deltas = vec![delta("1.1", "Exp"), delta("1.2", "Exp")];
        assert_eq!(introduce_1_1(deltas.clone(), true), deltas);
    }
}
