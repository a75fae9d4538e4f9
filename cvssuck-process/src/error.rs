use std::fmt::{Debug, Display};

use thiserror::Error;

/// Possible errors from running an external command.
#[derive(Debug, Error)]
pub enum Error {
    #[error("error spawning {0:?}: {1}")]
    Spawn(String, std::io::Error),

    #[error("error waiting for {0:?}: {1}")]
    Wait(String, std::io::Error),

    #[error(transparent)]
    NonZeroExit(#[from] Failure),
}

/// A command that ran but exited unsuccessfully, carrying enough context to
/// report the failure and (for `cvs log`'s "nothing known about" case) let
/// the caller inspect stderr before deciding whether it's actually fatal.
#[derive(Debug)]
pub struct Failure {
    pub program: String,
    pub args: Vec<String>,
    pub code: Option<i32>,
    pub signal: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl Failure {
    pub fn stderr_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.stderr)
    }
}

impl Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "running `{} {}` failed with {}\n\nstdout:\n{}\n\nstderr:\n{}\n",
            self.program,
            self.args.join(" "),
            match (self.code, self.signal) {
                (Some(code), _) => format!("exit code {}", code),
                (None, Some(signal)) => format!("signal {}", signal),
                (None, None) => "an unknown status".to_string(),
            },
            String::from_utf8_lossy(&self.stdout),
            self.stderr_lossy(),
        )
    }
}

impl std::error::Error for Failure {}
