//! Walks a remote module directory by directory, planning and checking in
//! each file's revisions into the local mirror.

use std::{
    collections::VecDeque,
    path::{Path, PathBuf},
};

use planner::Planner;

use crate::{cvswork::CvsWork, local::LocalRepository, Error};

/// Whether subdirectories are enqueued at the back (visited after siblings,
/// breadth-first) or at the front in reverse (visited before siblings,
/// depth-first).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Traversal {
    BreadthFirst,
    DepthFirst,
}

/// Borrows the scratch workspace rather than owning it: a single `CvsWork`
/// (and its `next_workdir` counter) is shared across every module in a run,
/// so that sibling scratch directories are never reused between modules.
pub struct CvsSuck<'a> {
    work: &'a mut CvsWork,
    local: LocalRepository,
    planner: Box<dyn Planner>,
    traversal: Traversal,
}

impl<'a> CvsSuck<'a> {
    pub fn new(
        work: &'a mut CvsWork,
        local: LocalRepository,
        planner: Box<dyn Planner>,
        traversal: Traversal,
    ) -> Self {
        Self {
            work,
            local,
            planner,
            traversal,
        }
    }

    /// Mirrors `module`, recursing into every subdirectory the server
    /// reports, in the traversal order the `CvsSuck` was built with.
    pub fn update_module(&mut self, module: &str) -> Result<(), Error> {
        let mut queue: VecDeque<PathBuf> = VecDeque::new();
        queue.push_back(PathBuf::from(module));

        while let Some(rel) = queue.pop_front() {
            match self.update_directory(&rel) {
                Ok(subdirs) => {
                    for name in subdirs {
                        let child = rel.join(name);
                        match self.traversal {
                            Traversal::BreadthFirst => queue.push_back(child),
                            Traversal::DepthFirst => queue.push_front(child),
                        }
                    }
                }
                Err(e) => {
                    log::error!("giving up on directory {}: {}", rel.display(), e);
                }
            }
        }

        Ok(())
    }

    /// Processes one remote directory: sets up its scratch workspace, lists
    /// its files and subdirectories, then checks in every file's plan.
    /// Returns the immediate subdirectory names found, for the caller to
    /// enqueue. All per-directory scratch state (the workspace handle, any
    /// cached checkouts) is scoped to this call and dropped on return.
    fn update_directory(&mut self, rel: &Path) -> Result<Vec<String>, Error> {
        log::info!("entering directory {}", rel.display());

        let repository = rel.to_string_lossy().into_owned();
        let workdir = self.work.setup_workdir(&repository)?;
        let subdirs = self.work.getsubdirs(&workdir)?;

        let logs = self.work.parselogs(&workdir, None)?;
        for file_log in logs {
            let working_file = &file_log.info.working_file;
            if let Err(e) = self.update_file(rel, &workdir, working_file, &file_log) {
                log::error!(
                    "giving up on {}/{}: {}",
                    rel.display(),
                    working_file,
                    e
                );
            }
        }

        log::info!("leaving directory {}", rel.display());
        Ok(subdirs)
    }

    fn update_file(
        &mut self,
        rel: &Path,
        workdir: &Path,
        working_file: &str,
        file_log: &cvs_log::FileLog,
    ) -> Result<(), Error> {
        let plan = self.planner.plan(&file_log.info, &file_log.deltas);
        let local_file = self.local.file(rel, working_file)?;

        for entry in &plan {
            let checkinable = local_file.checkinable(&entry.remote_delta.revision)?;
            if !checkinable.is_yes() {
                continue;
            }

            let contents_path = if entry.remote_delta.is_dead() {
                None
            } else {
                Some(self.work.getrevision(
                    workdir,
                    working_file,
                    &entry.remote_delta.revision,
                )?)
            };

            local_file.commit(
                entry.attic,
                &file_log.info,
                &entry.local_delta,
                contents_path.as_deref(),
            )?;

            log::info!(
                "checked in {}/{} revision {}",
                rel.display(),
                working_file,
                entry.local_delta.revision
            );
        }

        local_file.update_attributes(&file_log.info)?;
        Ok(())
    }
}
