use cvs_log::{DeltaInfo, RcsInfo};

/// One step of a plan: check out `remote_delta` from the server, record it
/// locally as `local_delta`, and for trunk revisions, set the file's Attic
/// placement to `attic`.
///
/// `remote_delta` and `local_delta` are the same `DeltaInfo` in both
/// planners this crate ships; the split exists because Skeleton's design
/// anticipates a mode where a delta's contents are checked out from one
/// revision slot but recorded under another's metadata. Neither planner
/// here does that yet, so the two are always equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanEntry {
    pub remote_delta: DeltaInfo,
    pub local_delta: DeltaInfo,
    pub attic: Option<bool>,
}

/// `attic = (delta.state == "dead" AND delta.revision == rcsinfo.head AND
/// rcsinfo.path is in Attic/)` for trunk revisions; `None` for everything
/// else, since only a file's trunk head governs whether it belongs in the
/// Attic.
pub(crate) fn attic_flag(delta: &DeltaInfo, rcsinfo: &RcsInfo) -> Option<bool> {
    if !delta.revision.is_trunk() {
        return None;
    }

    Some(delta.is_dead() && rcsinfo.head.as_ref() == Some(&delta.revision) && rcsinfo.is_attic())
}
