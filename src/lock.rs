//! CVS-compatible reader/writer locking of a single local directory.
//!
//! Follows the on-disk protocol CVS clients have used for decades so that
//! this tool can interoperate with any other CVS client working against
//! the same local tree: `#cvs.lock` is a directory used purely for mutual
//! exclusion (created via `mkdir`, which is atomic), and `#cvs.rfl<info>` /
//! `#cvs.wfl<info>` are per-holder sentinel files that record who is
//! reading or writing.

use std::{
    cell::{Cell, RefCell},
    fs, io,
    path::{Path, PathBuf},
    thread,
    time::Duration,
};

use rand::Rng;

use crate::{signal::MaskedSignals, Error};

const LOCK_DIR_NAME: &str = "#cvs.lock";
const READER_PREFIX: &str = "#cvs.rfl";
const WRITER_PREFIX: &str = "#cvs.wfl";

const BACKOFF_MIN_SECS: u64 = 45;
const BACKOFF_MAX_SECS: u64 = 74;
const MAX_ATTEMPTS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LockState {
    Unlocked,
    ReadLocked,
    WriteLocked,
}

/// The CVS-style `.<hostname>.<pid>` suffix that disambiguates our lock
/// sentinels from everyone else's.
fn info_string() -> String {
    format!(".{}.{}", hostname(), std::process::id())
}

fn hostname() -> String {
    let mut buf = vec![0u8; 256];
    let ok = unsafe {
        libc::gethostname(buf.as_mut_ptr() as *mut libc::c_char, buf.len()) == 0
    };
    if !ok {
        return "localhost".to_string();
    }
    let len = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    String::from_utf8_lossy(&buf[..len]).into_owned()
}

/// Lock state for one directory of the local mirror. `path` is where the
/// RCS files live; `lock_path` is where the `#cvs.*` sentinels are created,
/// which may be the same directory or a separate `-L`/`-l` target.
pub struct LocalDirectory {
    path: PathBuf,
    lock_path: PathBuf,
    info: String,
    state: Cell<LockState>,
    age: Cell<u64>,
    signals: RefCell<Option<MaskedSignals>>,
}

impl LocalDirectory {
    pub fn new(path: PathBuf, lock_path: PathBuf) -> Self {
        Self {
            path,
            lock_path,
            info: info_string(),
            state: Cell::new(LockState::Unlocked),
            age: Cell::new(0),
            signals: RefCell::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Monotonically increasing counter bumped on every transition into or
    /// out of a locked state, and on every read↔write transition. Callers
    /// that cache anything derived from the directory's contents must
    /// discard that cache whenever this value changes.
    pub fn age(&self) -> u64 {
        self.age.get()
    }

    /// True if a read or write lock is currently held (by any scope on this
    /// handle, nested or not).
    pub fn is_locked(&self) -> bool {
        self.state.get() != LockState::Unlocked
    }

    fn bump_age(&self) {
        self.age.set(self.age.get() + 1);
    }

    fn lock_dir(&self) -> PathBuf {
        self.lock_path.join(LOCK_DIR_NAME)
    }

    fn reader_sentinel(&self) -> PathBuf {
        self.lock_path.join(format!("{}{}", READER_PREFIX, self.info))
    }

    fn writer_sentinel(&self) -> PathBuf {
        self.lock_path.join(format!("{}{}", WRITER_PREFIX, self.info))
    }

    /// Runs `body` with at least a read lock held. If a lock (of either
    /// kind) is already held, runs `body` inline without touching the
    /// filesystem.
    pub fn read_lock<T>(&self, body: impl FnOnce() -> Result<T, Error>) -> Result<T, Error> {
        if self.state.get() != LockState::Unlocked {
            return body();
        }

        self.enter_locked_scope()?;
        self.try_lock("read", || self.acquire_read())?;
        self.state.set(LockState::ReadLocked);
        self.bump_age();

        let result = body();

        let _ = fs::remove_file(self.reader_sentinel());
        self.state.set(LockState::Unlocked);
        self.bump_age();
        self.exit_locked_scope();

        result
    }

    /// Runs `body` with a write lock held. May be nested inside
    /// `read_lock`, in which case the prior read-locked state is restored
    /// once `body` returns. If already write-locked, runs `body` inline.
    pub fn write_lock<T>(&self, body: impl FnOnce() -> Result<T, Error>) -> Result<T, Error> {
        if self.state.get() == LockState::WriteLocked {
            return body();
        }

        let prior = self.state.get();
        if prior == LockState::Unlocked {
            self.enter_locked_scope()?;
        }

        self.try_lock("write", || self.acquire_write())?;
        self.state.set(LockState::WriteLocked);
        self.bump_age();

        let result = body();

        let _ = fs::remove_file(self.writer_sentinel());
        let _ = fs::remove_dir(self.lock_dir());
        self.state.set(prior);
        self.bump_age();

        if prior == LockState::Unlocked {
            self.exit_locked_scope();
        }

        result
    }

    fn enter_locked_scope(&self) -> Result<(), Error> {
        *self.signals.borrow_mut() = Some(MaskedSignals::new()?);
        Ok(())
    }

    fn exit_locked_scope(&self) {
        self.signals.borrow_mut().take();
    }

    /// A single read-lock acquisition attempt: mkdir the master lock,
    /// create our reader sentinel, release the master lock. Any failure is
    /// wrapped as `Error::LockFailure` so `try_lock` will retry.
    fn acquire_read(&self) -> Result<(), Error> {
        self.mkdir_master()?;

        let result = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.reader_sentinel())
            .map_err(|source| self.lock_failure("read", source));

        let _ = fs::remove_dir(self.lock_dir());
        result.map(|_| ())
    }

    /// A single write-lock acquisition attempt: mkdir the master lock,
    /// confirm no other process holds a reader sentinel, create our writer
    /// sentinel. The master lock is deliberately *not* released here: the
    /// caller keeps holding it for the duration of the write-locked body.
    fn acquire_write(&self) -> Result<(), Error> {
        self.mkdir_master()?;

        if let Err(e) = self.check_no_foreign_readers() {
            let _ = fs::remove_dir(self.lock_dir());
            return Err(e);
        }

        if let Err(source) = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.writer_sentinel())
        {
            let _ = fs::remove_dir(self.lock_dir());
            return Err(self.lock_failure("write", source));
        }

        Ok(())
    }

    fn mkdir_master(&self) -> Result<(), Error> {
        fs::create_dir(self.lock_dir()).map_err(|source| self.lock_failure("master", source))
    }

    fn check_no_foreign_readers(&self) -> Result<(), Error> {
        let entries = match fs::read_dir(&self.lock_path) {
            Ok(entries) => entries,
            Err(source) => return Err(self.lock_failure("write", source)),
        };

        for entry in entries.flatten() {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if let Some(suffix) = name.strip_prefix(READER_PREFIX) {
                if suffix != self.info {
                    return Err(self.lock_failure(
                        "write",
                        io::Error::new(
                            io::ErrorKind::WouldBlock,
                            format!("foreign reader sentinel present: {}", name),
                        ),
                    ));
                }
            }
        }

        Ok(())
    }

    fn lock_failure(&self, kind: &'static str, source: io::Error) -> Error {
        Error::LockFailure {
            kind,
            path: self.lock_path.clone(),
            source,
        }
    }

    /// Retries `attempt` on `Error::LockFailure` with a randomised 45–74s
    /// backoff, up to 10 tries, giving up with `Error::CouldNotLock`.
    fn try_lock(&self, kind: &'static str, mut attempt: impl FnMut() -> Result<(), Error>) -> Result<(), Error> {
        for n in 1..=MAX_ATTEMPTS {
            match attempt() {
                Ok(()) => return Ok(()),
                Err(Error::LockFailure { source, .. }) => {
                    log::debug!(
                        "{} lock attempt {} of {} on {} failed: {}",
                        kind,
                        n,
                        MAX_ATTEMPTS,
                        self.lock_path.display(),
                        source
                    );
                    if n == MAX_ATTEMPTS {
                        break;
                    }
                    thread::sleep(backoff());
                }
                Err(e) => return Err(e),
            }
        }

        Err(Error::CouldNotLock {
            kind,
            path: self.lock_path.clone(),
            attempts: MAX_ATTEMPTS,
        })
    }
}

fn backoff() -> Duration {
    let secs = rand::thread_rng().gen_range(BACKOFF_MIN_SECS..=BACKOFF_MAX_SECS);
    Duration::from_secs(secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dir() -> (tempfile::TempDir, LocalDirectory) {
        let tmp = tempfile::tempdir().unwrap();
        let local = LocalDirectory::new(tmp.path().to_path_buf(), tmp.path().to_path_buf());
        (tmp, local)
    }

    #[test]
    fn test_read_lock_runs_body_and_cleans_up() {
        let (tmp, local) = dir();
        let age_before = local.age();

        let result = local.read_lock(|| Ok(42)).unwrap();
        assert_eq!(result, 42);
        assert!(local.age() > age_before);
        assert!(!tmp.path().join(LOCK_DIR_NAME).exists());

        let entries: Vec<_> = fs::read_dir(tmp.path()).unwrap().collect();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_write_lock_runs_body_and_cleans_up() {
        let (tmp, local) = dir();

        local.write_lock(|| Ok(())).unwrap();
        assert!(!tmp.path().join(LOCK_DIR_NAME).exists());
        let entries: Vec<_> = fs::read_dir(tmp.path()).unwrap().collect();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_write_lock_nested_in_read_lock_restores_state() {
        let (_tmp, local) = dir();

        local
            .read_lock(|| {
                local.write_lock(|| Ok::<_, Error>(())).unwrap();
                assert_eq!(local.state.get(), LockState::ReadLocked);
                Ok(())
            })
            .unwrap();

        assert_eq!(local.state.get(), LockState::Unlocked);
    }

    #[test]
    fn test_nested_same_kind_lock_runs_inline() {
        let (_tmp, local) = dir();
        let mut calls = 0;

        local
            .write_lock(|| {
                calls += 1;
                local.write_lock(|| {
                    calls += 1;
                    Ok::<_, Error>(())
                })
            })
            .unwrap();

        assert_eq!(calls, 2);
    }

    #[test]
    fn test_age_bumps_on_read_write_transition() {
        let (_tmp, local) = dir();

        local
            .read_lock(|| {
                let before = local.age();
                local.write_lock(|| Ok::<_, Error>(())).unwrap();
                assert!(local.age() > before);
                Ok(())
            })
            .unwrap();
    }
}
