use std::collections::{HashMap, HashSet};

use crate::{Branch, Error, Revision};

/// Whether a revision can currently be checked in, and if so, which existing
/// revision must be RCS-locked first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Checkinable {
    No,
    Yes { predecessor: Option<Revision> },
}

impl Checkinable {
    pub fn is_yes(&self) -> bool {
        matches!(self, Checkinable::Yes { .. })
    }
}

/// The set of revisions known to be present in an RCS file, plus the head
/// (maximum-ordered member) of every branch that has at least one member.
#[derive(Debug, Clone, Default)]
pub struct RevisionSet {
    revisions: HashSet<Revision>,
    heads: HashMap<Branch, Revision>,
}

impl RevisionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.revisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.revisions.is_empty()
    }

    pub fn contains(&self, rev: &Revision) -> bool {
        self.revisions.contains(rev)
    }

    pub fn head(&self, branch: &Branch) -> Option<&Revision> {
        self.heads.get(branch)
    }

    /// Records `rev` as present, updating the owning branch's head if `rev`
    /// is now the maximum-ordered member. Fails if `rev` is a branch-tag
    /// revision rather than a real commit, or is already present.
    pub fn insert(&mut self, rev: Revision) -> Result<(), Error> {
        if self.revisions.contains(&rev) {
            return Err(Error::AlreadyPresent(rev.to_string()));
        }

        let branch = rev.branch()?;
        let is_new_head = match self.heads.get(&branch) {
            Some(head) => &rev > head,
            None => true,
        };

        if is_new_head {
            self.heads.insert(branch, rev.clone());
        }

        self.revisions.insert(rev);
        Ok(())
    }

    /// Determines whether `rev` could be checked in given the current set,
    /// and if so, which revision (if any) must be locked as its
    /// predecessor first.
    pub fn checkinable(&self, rev: &Revision) -> Result<Checkinable, Error> {
        if rev.is_branch() {
            return Ok(Checkinable::No);
        }

        let branch = rev.branch()?;

        if let Some(head) = self.heads.get(&branch) {
            return Ok(if head < rev {
                Checkinable::Yes {
                    predecessor: Some(head.clone()),
                }
            } else {
                Checkinable::No
            });
        }

        let ok = match &branch {
            Branch::Trunk => true,
            Branch::Sub(_) => branch
                .root_revision()
                .map(|root| self.contains(&root))
                .unwrap_or(false),
        };

        Ok(if ok {
            Checkinable::Yes { predecessor: None }
        } else {
            Checkinable::No
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Revision> {
        self.revisions.iter()
    }
}
