use std::{
    cell::RefCell,
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    rc::Rc,
};

use crate::{local::LocalFile, lock::LocalDirectory, Error};

/// A tree of RCS files at `topdir`, with its lock sentinels written under
/// `lockdir` (which may be the same tree, when `-l`/`-L` weren't given).
///
/// Owns every `LocalDirectory` it has handed out, keyed by the directory's
/// path relative to `topdir`. The source's weak-reference cache collapses
/// to a plain map here: a single-threaded, single-run process has no
/// pressure to reclaim entries mid-run.
pub struct LocalRepository {
    topdir: PathBuf,
    lockdir: PathBuf,
    directories: RefCell<HashMap<PathBuf, Rc<LocalDirectory>>>,
}

impl LocalRepository {
    pub fn new(topdir: PathBuf, lockdir: PathBuf) -> Self {
        Self {
            topdir,
            lockdir,
            directories: RefCell::new(HashMap::new()),
        }
    }

    pub fn topdir(&self) -> &Path {
        &self.topdir
    }

    /// Returns the `LocalDirectory` for `rel` (relative to `topdir`),
    /// creating both the RCS tree directory and the lock-sentinel
    /// directory on disk if they don't already exist.
    pub fn directory(&self, rel: &Path) -> Result<Rc<LocalDirectory>, Error> {
        if let Some(existing) = self.directories.borrow().get(rel) {
            return Ok(existing.clone());
        }

        let path = self.topdir.join(rel);
        let lock_path = self.lockdir.join(rel);
        fs::create_dir_all(&path)?;
        fs::create_dir_all(&lock_path)?;

        let directory = Rc::new(LocalDirectory::new(path, lock_path));
        self.directories
            .borrow_mut()
            .insert(rel.to_path_buf(), directory.clone());
        Ok(directory)
    }

    /// Returns a `LocalFile` handle for `working_file` inside `rel`.
    /// `LocalFile`s aren't cached by the repository: they're cheap views
    /// over a `LocalDirectory` plus an in-memory cache of their own, and
    /// the orchestrator creates at most one per file per directory visit.
    pub fn file(&self, rel: &Path, working_file: &str) -> Result<LocalFile, Error> {
        Ok(LocalFile::new(self.directory(rel)?, working_file.to_string()))
    }
}
