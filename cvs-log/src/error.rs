use thiserror::Error;

/// Errors raised while parsing `cvs log` / `rlog` output. These are always
/// fatal for the file currently being parsed, but never for the stream as a
/// whole: the caller may resynchronise at the next file delimiter.
#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed cvs log output: {0}")]
    LogFormat(String),

    #[error("invalid revision in log output: {0}")]
    Revision(#[from] revision::Error),

    #[error("invalid UTF-8 and Latin-1 fallback also failed")]
    Encoding,
}
