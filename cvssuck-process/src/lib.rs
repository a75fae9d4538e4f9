//! Synchronous execution of the external `cvs`, `ci`, `rcs`, and `rlog`
//! commands this tool drives as its local and remote write/read paths.
//!
//! Unlike the teacher's `git fast-import` child, none of these commands are
//! long-lived: each invocation runs to completion, and its output is small
//! enough (a single file's log, a single check-in) to buffer in memory
//! rather than stream.

mod error;

use std::{
    ffi::OsStr,
    os::unix::process::ExitStatusExt,
    path::Path,
    process::{Command, Output},
};

pub use crate::error::{Error, Failure};

/// Runs `program` with `args`, capturing stdout and stderr in full.
/// Returns `Ok(stdout)` on a zero exit; otherwise `Err(Error::NonZeroExit)`
/// carrying both streams, so callers that need to distinguish a benign
/// condition (e.g. `cvs log`'s "nothing known about" on an empty directory)
/// can inspect stderr themselves before treating the failure as fatal.
pub fn run<I, S>(program: &str, args: I) -> Result<Vec<u8>, Error>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    run_in(program, args, None)
}

/// As `run`, but runs with `cwd` as the working directory.
pub fn run_in<I, S>(program: &str, args: I, cwd: Option<&Path>) -> Result<Vec<u8>, Error>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let raw = run_raw(program, args, cwd)?;
    if raw.success {
        return Ok(raw.stdout);
    }

    Err(Error::NonZeroExit(Failure {
        program: program.to_string(),
        args: raw.args,
        code: raw.code,
        signal: raw.signal,
        stdout: raw.stdout,
        stderr: raw.stderr,
    }))
}

/// The full result of running a command, regardless of its exit status.
/// Only a handful of callers need this (`cvs update -r00 -d` and `cvs log`
/// both report benign conditions through a non-zero exit plus a specific
/// stderr message) — everyone else wants `run`/`run_in`'s fail-fast
/// behaviour instead.
pub struct CommandOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub signal: Option<i32>,
    pub args: Vec<String>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// Runs `program` with `args` in `cwd`, returning its full result whether
/// or not it exited successfully. Only fails if the process couldn't be
/// spawned at all.
pub fn run_raw<I, S>(program: &str, args: I, cwd: Option<&Path>) -> Result<CommandOutput, Error>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let args: Vec<String> = args
        .into_iter()
        .map(|a| a.as_ref().to_string_lossy().into_owned())
        .collect();

    log::debug!("running: {} {}", program, args.join(" "));

    let mut command = Command::new(program);
    command.args(&args);
    if let Some(cwd) = cwd {
        command.current_dir(cwd);
    }

    let Output {
        status,
        stdout,
        stderr,
    } = command
        .output()
        .map_err(|e| Error::Spawn(program.to_string(), e))?;

    if !status.success() {
        log::debug!(
            "{} exited unsuccessfully: {:?}\nstderr:\n{}",
            program,
            status,
            String::from_utf8_lossy(&stderr)
        );
    }

    Ok(CommandOutput {
        success: status.success(),
        code: status.code(),
        signal: status.signal(),
        args,
        stdout,
        stderr,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_success() {
        let out = run("printf", vec!["hello"]).unwrap();
        assert_eq!(out, b"hello");
    }

    #[test]
    fn test_run_failure_carries_streams() {
        let err = run("sh", vec!["-c", "echo oops >&2; exit 3"]).unwrap_err();
        match err {
            Error::NonZeroExit(failure) => {
                assert_eq!(failure.code, Some(3));
                assert_eq!(failure.stderr_lossy().trim(), "oops");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_run_missing_binary() {
        assert!(run("cvssuck-definitely-not-a-real-binary", Vec::<&str>::new()).is_err());
    }

    #[test]
    fn test_run_raw_never_fails_on_nonzero_exit() {
        let out = run_raw("sh", vec!["-c", "echo oops >&2; exit 1"], None).unwrap();
        assert!(!out.success);
        assert_eq!(out.code, Some(1));
        assert_eq!(String::from_utf8_lossy(&out.stderr).trim(), "oops");
    }
}
