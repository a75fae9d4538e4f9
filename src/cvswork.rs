//! Drives the `cvs` client against the remote server from a scratch
//! workspace: directory listing, `log`, and per-revision checkout.

use std::{fs, path::{Path, PathBuf}};

use cvs_log::FileLog;
use revision::Revision;

use crate::Error;

const NEW_DIRECTORY_MARKER: &str = "-- ignored";

/// Owns the scratch tree's top-level `CVS/` administrative files and hands
/// out fresh sibling working directories, one per remote directory visited.
pub struct CvsWork {
    cvsroot: String,
    scratch_root: PathBuf,
    next_workdir: u32,
    last_checkout: Option<(PathBuf, String, Revision, PathBuf)>,
}

impl CvsWork {
    pub fn new(cvsroot: &str, scratch_root: PathBuf) -> Result<Self, Error> {
        let work = Self {
            cvsroot: cvsroot.to_string(),
            scratch_root,
            next_workdir: 0,
            last_checkout: None,
        };
        work.write_cvs_admin(&work.scratch_root, ".")?;
        Ok(work)
    }

    fn write_cvs_admin(&self, dir: &Path, repository: &str) -> Result<(), Error> {
        let cvs_dir = dir.join("CVS");
        fs::create_dir_all(&cvs_dir)?;
        fs::write(cvs_dir.join("Root"), format!("{}\n", self.cvsroot))?;
        fs::write(cvs_dir.join("Repository"), format!("{}\n", repository))?;
        if !cvs_dir.join("Entries").exists() {
            fs::write(cvs_dir.join("Entries"), "")?;
        }
        Ok(())
    }

    /// Allocates a fresh sibling scratch directory (`a`, `b`, `c`, ...) for
    /// `repository`, registers it as a subdirectory entry of the scratch
    /// root, and discards any cached checkout (it belonged to whichever
    /// directory was worked on before).
    pub fn setup_workdir(&mut self, repository: &str) -> Result<PathBuf, Error> {
        let name = workdir_name(self.next_workdir);
        self.next_workdir += 1;

        let workdir = self.scratch_root.join(&name);
        self.write_cvs_admin(&workdir, repository)?;

        let entries_path = self.scratch_root.join("CVS").join("Entries");
        let mut entries = fs::read_to_string(&entries_path).unwrap_or_default();
        entries.push_str(&format!("D/{}////\n", name));
        fs::write(entries_path, entries)?;

        self.last_checkout = None;
        Ok(workdir)
    }

    /// Runs `cvs update -r00 -d -p` in `workdir` and scans its stderr for
    /// the immediate-subdirectory side channel CVS reports new directories
    /// through: `` : New directory `<path>/<name>' -- ignored ``.
    pub fn getsubdirs(&self, workdir: &Path) -> Result<Vec<String>, Error> {
        let raw = cvssuck_process::run_raw(
            "cvs",
            vec!["update", "-r00", "-d", "-p"],
            Some(workdir),
        )
        .map_err(Error::CvsCommandFailure)?;

        let stderr = String::from_utf8_lossy(&raw.stderr);
        let mut names = Vec::new();
        for line in stderr.lines() {
            if let Some(name) = parse_new_directory_line(line) {
                if name != "." && name != ".." {
                    names.push(name);
                }
            }
        }
        Ok(names)
    }

    /// Runs `cvs log` (optionally `-d<since>`) in `workdir` and parses the
    /// result. A "nothing known about" failure (an empty remote directory)
    /// is demoted to an empty result with a logged warning rather than an
    /// error.
    pub fn parselogs(&self, workdir: &Path, since: Option<&str>) -> Result<Vec<FileLog>, Error> {
        let mut args = vec!["log".to_string()];
        if let Some(since) = since {
            args.push(format!("-d{}", since));
        }

        let raw = cvssuck_process::run_raw("cvs", args, Some(workdir)).map_err(Error::CvsCommandFailure)?;

        if !raw.success {
            let stderr = String::from_utf8_lossy(&raw.stderr);
            if stderr.contains("nothing known about") {
                log::warn!("cvs log reported an empty directory in {:?}", workdir);
                return Ok(Vec::new());
            }

            return Err(Error::CvsCommandFailure(cvssuck_process::Error::NonZeroExit(
                cvssuck_process::Failure {
                    program: "cvs".to_string(),
                    args: raw.args,
                    code: raw.code,
                    signal: raw.signal,
                    stdout: raw.stdout,
                    stderr: raw.stderr,
                },
            )));
        }

        Ok(cvs_log::parse(&raw.stdout)?)
    }

    /// Runs `cvs update -ko -r<rev> <file>` in `workdir`, returning the
    /// resulting checked-out path. Skips the checkout if the planner just
    /// asked for the same (directory, file, revision) again.
    pub fn getrevision(
        &mut self,
        workdir: &Path,
        working_file: &str,
        revision: &Revision,
    ) -> Result<PathBuf, Error> {
        if let Some((cached_dir, cached_file, cached_rev, cached_path)) = &self.last_checkout {
            if cached_dir == workdir && cached_file == working_file && cached_rev == revision {
                return Ok(cached_path.clone());
            }
        }

        cvssuck_process::run_in(
            "cvs",
            vec![
                "update".to_string(),
                "-ko".to_string(),
                format!("-r{}", revision),
                working_file.to_string(),
            ],
            Some(workdir),
        )
        .map_err(Error::CvsCommandFailure)?;

        let path = workdir.join(working_file);
        self.last_checkout = Some((workdir.to_path_buf(), working_file.to_string(), revision.clone(), path.clone()));
        Ok(path)
    }
}

fn parse_new_directory_line(line: &str) -> Option<String> {
    let line = line.trim();
    let (marker_pos, marker_len) = line
        .find(": New directory `")
        .map(|pos| (pos, ": New directory `".len()))
        .or_else(|| line.find(": New directory \"").map(|pos| (pos, ": New directory \"".len())))?;

    let rest = &line[marker_pos + marker_len..];
    let rest = rest.strip_suffix(NEW_DIRECTORY_MARKER)?.trim();
    let name = rest.strip_suffix('\'').or_else(|| rest.strip_suffix('"'))?;
    name.rsplit('/').next().map(str::to_string)
}

/// `0 -> "a"`, `25 -> "z"`, `26 -> "aa"`, ... matching the allocation scheme
/// described for scratch sibling directories.
fn workdir_name(mut n: u32) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push((b'a' + (n % 26) as u8) as char);
        n /= 26;
        if n == 0 {
            break;
        }
        n -= 1;
    }
    letters.into_iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workdir_name_sequence() {
        assert_eq!(workdir_name(0), "a");
        assert_eq!(workdir_name(25), "z");
        assert_eq!(workdir_name(26), "aa");
        assert_eq!(workdir_name(27), "ab");
    }

    #[test]
    fn test_parse_new_directory_line() {
        assert_eq!(
            parse_new_directory_line("cvs update: New directory `mod/sub' -- ignored"),
            Some("sub".to_string())
        );
        assert_eq!(parse_new_directory_line("cvs update: `mod/file.c' is locally modified"), None);
    }

    #[test]
    fn test_setup_workdir_allocates_siblings() {
        let tmp = tempfile::tempdir().unwrap();
        let mut work = CvsWork::new(":pserver:example.com:/cvsroot", tmp.path().to_path_buf()).unwrap();

        let first = work.setup_workdir("mod/sub1").unwrap();
        let second = work.setup_workdir("mod/sub2").unwrap();

        assert_eq!(first.file_name().unwrap(), "a");
        assert_eq!(second.file_name().unwrap(), "b");
        assert!(first.join("CVS/Root").exists());
        assert_eq!(
            fs::read_to_string(first.join("CVS/Repository")).unwrap(),
            "mod/sub1\n"
        );

        let entries = fs::read_to_string(tmp.path().join("CVS/Entries")).unwrap();
        assert!(entries.contains("D/a////"));
        assert!(entries.contains("D/b////"));
    }
}
