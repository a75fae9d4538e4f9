use std::path::{Path, PathBuf};

use revision::Revision;

/// Per-file header information as reported by `cvs log` / `rlog`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RcsInfo {
    pub rcs_path: PathBuf,
    pub working_file: String,
    pub head: Option<Revision>,
    pub default_branch: Option<Revision>,
    /// Symbolic names in the order the server reported them.
    pub tags: Vec<(String, Revision)>,
    pub keyword_mode: Option<String>,
    pub description: String,
}

impl RcsInfo {
    /// True if the RCS file's path puts it in an `Attic/` directory.
    pub fn is_attic(&self) -> bool {
        self.rcs_path
            .components()
            .any(|c| c.as_os_str() == "Attic")
    }

    pub fn tag_revision(&self, tag: &str) -> Option<&Revision> {
        self.tags
            .iter()
            .find(|(name, _)| name == tag)
            .map(|(_, rev)| rev)
    }
}

/// A single delta (revision) as reported by `cvs log` / `rlog`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeltaInfo {
    pub revision: Revision,
    /// The RCS-style date string, preserved verbatim (e.g.
    /// `2021.08.20.17.34.26` style is never produced by `cvs log`, but the
    /// textual `YYYY/MM/DD HH:MM:SS` / `YYYY-MM-DD HH:MM:SS` forms are, and
    /// we keep whichever one the server sent).
    pub date: String,
    pub author: String,
    pub state: String,
    pub branches: Vec<Revision>,
    pub log: String,
}

impl DeltaInfo {
    pub fn is_dead(&self) -> bool {
        self.state == "dead"
    }
}

/// A single file's header plus its deltas, in the order `cvs log` emitted
/// them (descending from `head` down each chain, branches interleaved).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileLog {
    pub info: RcsInfo,
    pub deltas: Vec<DeltaInfo>,
}

impl FileLog {
    pub fn delta(&self, revision: &Revision) -> Option<&DeltaInfo> {
        self.deltas.iter().find(|d| &d.revision == revision)
    }
}

pub(crate) fn working_file_component(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let name = Path::new(trimmed).file_name()?.to_str()?.to_string();

    if trimmed.contains('/') || name == "." || name == ".." {
        return None;
    }

    Some(name)
}
