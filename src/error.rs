use thiserror::Error;

/// Errors raised while mirroring a single file or directory. These map
/// directly onto the taxonomy in the design: a `LogFormat`/`Revision`/
/// `Command` failure aborts the file or directory it occurred in, but the
/// orchestrator keeps going; `CouldNotLock` aborts the directory; anything
/// else bubbles all the way out via `anyhow` in `main`.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    LogFormat(#[from] cvs_log::Error),

    #[error(transparent)]
    Revision(#[from] revision::Error),

    #[error("{0}")]
    CvsCommandFailure(cvssuck_process::Error),

    #[error("{0}")]
    RcsCommandFailure(cvssuck_process::Error),

    #[error("could not acquire {kind} lock on {path}: {source}")]
    LockFailure {
        kind: &'static str,
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("gave up acquiring {kind} lock on {path} after {attempts} attempts")]
    CouldNotLock {
        kind: &'static str,
        path: std::path::PathBuf,
        attempts: u32,
    },

    #[error("{path} is not locked, but an operation requiring a lock was attempted")]
    NotLocked { path: std::path::PathBuf },

    #[error("usage error: {0}")]
    Usage(String),

    #[error("unknown -D debug flag: {0}")]
    UnknownDebugFlag(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
