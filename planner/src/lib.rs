//! Turns a file's remote log history into an ordered plan of revisions to
//! check in locally.

mod entry;
mod exact;
mod introduce;
mod skeleton;

use cvs_log::{DeltaInfo, RcsInfo};

pub use crate::entry::PlanEntry;
pub use crate::exact::ExactPlanner;
pub use crate::skeleton::Skeleton;

/// Produces an ordered plan from a file's remote header and delta chain.
/// `Skeleton` wraps another `Planner`; both ship with this crate, but the
/// trait exists so the orchestrator can compose `-s` stacking without
/// knowing the concrete wrapped type.
pub trait Planner {
    fn plan(&self, rcsinfo: &RcsInfo, deltas: &[DeltaInfo]) -> Vec<PlanEntry>;
}
