use std::{
    cell::RefCell,
    fs,
    path::{Path, PathBuf},
    rc::Rc,
};

use cvs_log::{DeltaInfo, RcsInfo};
use revision::{Checkinable, Revision, RevisionSet};

use crate::{lock::LocalDirectory, Error};

const ATTIC_DIR: &str = "Attic";
const EMPTY_LOG_PLACEHOLDER: &str = "*** empty log message ***";

struct FileState {
    rcs_path: Option<PathBuf>,
    info: Option<RcsInfo>,
    deltas: Vec<DeltaInfo>,
    revisions: RevisionSet,
}

impl FileState {
    fn absent() -> Self {
        Self {
            rcs_path: None,
            info: None,
            deltas: Vec::new(),
            revisions: RevisionSet::new(),
        }
    }
}

struct Cache {
    age: u64,
    state: FileState,
}

/// The local, on-disk half of a single file: reads and caches its current
/// RCS state, and drives `ci`/`rcs` to bring it up to date with a plan
/// produced by a `Planner`.
pub struct LocalFile {
    dir: Rc<LocalDirectory>,
    working_file: String,
    cache: RefCell<Option<Cache>>,
}

impl LocalFile {
    pub(crate) fn new(dir: Rc<LocalDirectory>, working_file: String) -> Self {
        Self {
            dir,
            working_file,
            cache: RefCell::new(None),
        }
    }

    pub fn working_file(&self) -> &str {
        &self.working_file
    }

    fn non_attic_path(&self) -> PathBuf {
        self.dir.path().join(format!("{},v", self.working_file))
    }

    fn attic_path(&self) -> PathBuf {
        self.dir
            .path()
            .join(ATTIC_DIR)
            .join(format!("{},v", self.working_file))
    }

    /// Probes for `<dir>/<name>,v` and `<dir>/Attic/<name>,v`, in that
    /// order, returning the first that exists. Requires the directory to
    /// already be locked (by the caller, or by an enclosing `read_lock`/
    /// `write_lock` on the same `LocalDirectory`).
    pub fn find(&self) -> Result<Option<PathBuf>, Error> {
        if !self.dir.is_locked() {
            return Err(Error::NotLocked {
                path: self.dir.path().to_path_buf(),
            });
        }

        for candidate in [self.non_attic_path(), self.attic_path()] {
            if candidate.is_file() {
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }

    /// Refreshes (or invalidates) the cached `(RcsInfo, [DeltaInfo],
    /// RevisionSet)` under a read lock, unless the cache is already current
    /// for the directory's age.
    pub fn read_rcsinfo_deltas(&self) -> Result<(), Error> {
        self.dir.read_lock(|| self.refresh())
    }

    fn refresh(&self) -> Result<(), Error> {
        if let Some(cache) = self.cache.borrow().as_ref() {
            if cache.age == self.dir.age() {
                return Ok(());
            }
        }

        let rcs_path = self.find()?;
        let state = match rcs_path {
            None => FileState::absent(),
            Some(path) => {
                let output = cvssuck_process::run("rlog", vec![path.as_os_str()])
                    .map_err(Error::RcsCommandFailure)?;
                let mut logs = cvs_log::parse(&output)?;
                let log = logs.pop().ok_or_else(|| {
                    cvs_log::Error::LogFormat(format!("rlog produced no file entries for {:?}", path))
                })?;

                let mut revisions = RevisionSet::new();
                for delta in &log.deltas {
                    if !revisions.contains(&delta.revision) {
                        revisions.insert(delta.revision.clone())?;
                    }
                }

                FileState {
                    rcs_path: Some(path),
                    info: Some(log.info),
                    deltas: log.deltas,
                    revisions,
                }
            }
        };

        *self.cache.borrow_mut() = Some(Cache {
            age: self.dir.age(),
            state,
        });
        Ok(())
    }

    /// Cheaply rules out a negative `checkinable` answer from the cached
    /// `RevisionSet`; only re-reads from disk (under a read lock) when the
    /// cached answer is positive, since the cache can only go stale by
    /// *growing* (RCS files are never pruned by this tool).
    pub fn checkinable(&self, revision: &Revision) -> Result<Checkinable, Error> {
        if let Some(cache) = self.cache.borrow().as_ref() {
            if !cache.state.revisions.checkinable(revision)?.is_yes() {
                return Ok(Checkinable::No);
            }
        }

        self.dir.read_lock(|| {
            self.refresh()?;
            let cache = self.cache.borrow();
            Ok(cache
                .as_ref()
                .expect("refresh populates the cache")
                .state
                .revisions
                .checkinable(revision)?)
        })
    }

    /// Checks in `delta` (whose contents are at `contents_path`, or which
    /// is treated as empty if `contents_path` is `None`) if it's
    /// check-in-able, placing the file in or out of `Attic/` per `attic`.
    pub fn commit(
        &self,
        attic: Option<bool>,
        rcsinfo: &RcsInfo,
        delta: &DeltaInfo,
        contents_path: Option<&Path>,
    ) -> Result<(), Error> {
        self.dir.write_lock(|| {
            self.refresh()?;

            {
                let cache = self.cache.borrow();
                let state = &cache.as_ref().expect("refresh populates the cache").state;
                if state.revisions.contains(&delta.revision) {
                    return Ok(());
                }
            }

            let checkinable = {
                let cache = self.cache.borrow();
                cache
                    .as_ref()
                    .expect("refresh populates the cache")
                    .state
                    .revisions
                    .checkinable(&delta.revision)?
            };

            let predecessor = match checkinable {
                Checkinable::No => return Ok(()),
                Checkinable::Yes { predecessor } => predecessor,
            };

            let rcs_path = {
                let cache = self.cache.borrow();
                let state = &cache.as_ref().expect("refresh populates the cache").state;
                state
                    .rcs_path
                    .clone()
                    .unwrap_or_else(|| self.target_path(attic))
            };
            if let Some(parent) = rcs_path.parent() {
                fs::create_dir_all(parent)?;
            }

            if let Some(predecessor) = &predecessor {
                cvssuck_process::run(
                    "rcs",
                    vec![
                        "-q".to_string(),
                        format!("-l{}", predecessor),
                        rcs_path.to_string_lossy().into_owned(),
                    ],
                )
                .map_err(Error::RcsCommandFailure)?;
            }

            let work_dir = rcs_path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| self.dir.path().to_path_buf());
            let work_copy = work_dir.join(&self.working_file);
            match contents_path {
                Some(path) => {
                    fs::copy(path, &work_copy)?;
                }
                None => {
                    fs::write(&work_copy, b"")?;
                }
            }

            let log = if delta.log.trim().is_empty() {
                EMPTY_LOG_PLACEHOLDER.to_string()
            } else {
                delta.log.clone()
            };

            let result = cvssuck_process::run(
                "ci",
                vec![
                    "-q".to_string(),
                    format!("-r{}", delta.revision),
                    "-f".to_string(),
                    format!("-d{}", delta.date),
                    format!("-m{}", log),
                    format!("-t-{}", rcsinfo.description),
                    format!("-s{}", delta.state),
                    format!("-w{}", delta.author),
                    rcs_path.to_string_lossy().into_owned(),
                    work_copy.to_string_lossy().into_owned(),
                ],
            )
            .map_err(Error::RcsCommandFailure);

            let _ = fs::remove_file(&work_copy);
            result?;

            let final_path = self.relocate_for_attic(&rcs_path, attic)?;

            let mut cache = self.cache.borrow_mut();
            let state = &mut cache.as_mut().expect("refresh populates the cache").state;
            state.rcs_path = Some(final_path);
            state.revisions.insert(delta.revision.clone())?;
            state.deltas.push(delta.clone());

            Ok(())
        })
    }

    fn target_path(&self, attic: Option<bool>) -> PathBuf {
        if attic == Some(true) {
            self.attic_path()
        } else {
            self.non_attic_path()
        }
    }

    /// Renames between `<name>,v` and `Attic/<name>,v` if `attic` disagrees
    /// with the file's current placement. A `None` attic value (non-trunk
    /// revisions) never touches placement.
    fn relocate_for_attic(&self, current: &Path, attic: Option<bool>) -> Result<PathBuf, Error> {
        let want_attic = match attic {
            Some(want) => want,
            None => return Ok(current.to_path_buf()),
        };

        let is_attic = current
            .parent()
            .map(|p| p.file_name().map(|n| n == ATTIC_DIR).unwrap_or(false))
            .unwrap_or(false);

        if is_attic == want_attic {
            return Ok(current.to_path_buf());
        }

        let target = self.target_path(Some(want_attic));
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::rename(current, &target)?;
        Ok(target)
    }

    /// Diffs the remote `RCSInfo` against the cached local one and issues a
    /// single `rcs -q` call for the default branch, keyword mode, and any
    /// added/changed tags. No-op if nothing differs.
    pub fn update_attributes(&self, remote: &RcsInfo) -> Result<(), Error> {
        self.dir.write_lock(|| {
            self.refresh()?;

            let rcs_path = {
                let cache = self.cache.borrow();
                match &cache.as_ref().expect("refresh populates the cache").state.rcs_path {
                    Some(path) => path.clone(),
                    None => return Ok(()),
                }
            };

            let mut args: Vec<String> = vec!["-q".to_string()];
            {
                let cache = self.cache.borrow();
                let local = cache
                    .as_ref()
                    .expect("refresh populates the cache")
                    .state
                    .info
                    .as_ref();

                let local_branch = local.and_then(|i| i.default_branch.clone());
                if remote.default_branch != local_branch {
                    match &remote.default_branch {
                        Some(branch) => args.push(format!("-b{}", branch)),
                        None => args.push("-b".to_string()),
                    }
                }

                let local_mode = local.and_then(|i| i.keyword_mode.clone());
                if remote.keyword_mode != local_mode {
                    if let Some(mode) = &remote.keyword_mode {
                        args.push(format!("-k{}", mode));
                    }
                }

                for (name, revision) in remote.tags.iter().rev() {
                    match local.and_then(|i| i.tag_revision(name)) {
                        None => args.push(format!("-n{}:{}", name, revision)),
                        Some(local_revision) if local_revision != revision => {
                            args.push(format!("-N{}:{}", name, revision))
                        }
                        Some(_) => {}
                    }
                }
            }

            if args.len() == 1 {
                return Ok(());
            }
            args.push(rcs_path.to_string_lossy().into_owned());

            cvssuck_process::run("rcs", args).map_err(Error::RcsCommandFailure)?;

            let mut cache = self.cache.borrow_mut();
            cache.as_mut().expect("refresh populates the cache").state.info = Some(remote.clone());
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lock::LocalDirectory;

    fn file_in(tmp: &std::path::Path) -> LocalFile {
        let dir = Rc::new(LocalDirectory::new(tmp.to_path_buf(), tmp.to_path_buf()));
        LocalFile::new(dir, "widget.c".to_string())
    }

    #[test]
    fn test_find_requires_lock() {
        let tmp = tempfile::tempdir().unwrap();
        let file = file_in(tmp.path());
        assert!(matches!(file.find(), Err(Error::NotLocked { .. })));
    }

    #[test]
    fn test_find_none_when_absent() {
        let tmp = tempfile::tempdir().unwrap();
        let file = file_in(tmp.path());
        let found = file.dir.read_lock(|| file.find()).unwrap();
        assert_eq!(found, None);
    }

    #[test]
    fn test_find_prefers_non_attic() {
        let tmp = tempfile::tempdir().unwrap();
        let file = file_in(tmp.path());
        fs::write(file.non_attic_path(), b"rcs").unwrap();

        let found = file.dir.read_lock(|| file.find()).unwrap();
        assert_eq!(found, Some(file.non_attic_path()));
    }

    #[test]
    fn test_find_attic() {
        let tmp = tempfile::tempdir().unwrap();
        let file = file_in(tmp.path());
        fs::create_dir_all(file.attic_path().parent().unwrap()).unwrap();
        fs::write(file.attic_path(), b"rcs").unwrap();

        let found = file.dir.read_lock(|| file.find()).unwrap();
        assert_eq!(found, Some(file.attic_path()));
    }

    #[test]
    fn test_relocate_no_op_for_non_trunk() {
        let tmp = tempfile::tempdir().unwrap();
        let file = file_in(tmp.path());
        let current = file.non_attic_path();
        let result = file.relocate_for_attic(&current, None).unwrap();
        assert_eq!(result, current);
    }
}
