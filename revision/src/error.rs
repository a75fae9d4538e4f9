use thiserror::Error;

/// Possible errors from the `revision` crate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("revision must have at least two components: {0}")]
    TooShort(String),

    #[error("invalid revision component in {0:?}")]
    InvalidComponent(String),

    #[error("branch() is only valid on non-branch (even length) revisions: {0}")]
    NotNonBranch(String),

    #[error("branch_point() is only valid on non-trunk, non-branch-tag revisions: {0}")]
    NotBranchPointable(String),

    #[error("{0} is already present in the revision set")]
    AlreadyPresent(String),
}
