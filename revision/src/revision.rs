use std::{fmt::Display, str::FromStr};

use itertools::Itertools;

use crate::{Branch, Error};

/// A dotted-numeric RCS/CVS revision identity, e.g. `1.4` or `1.4.2.1`.
///
/// Components are ordered lexicographically with shorter sequences sorting
/// before longer ones that share the same prefix, which is exactly what
/// deriving `Ord` on the inner `Vec<u32>` gives us.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Revision(Vec<u32>);

impl Revision {
    /// Constructs a revision from its dotted components. Returns an error if
    /// fewer than two components are given.
    pub fn new(parts: Vec<u32>) -> Result<Self, Error> {
        if parts.len() < 2 {
            return Err(Error::TooShort(
                parts.iter().map(|p| p.to_string()).join("."),
            ));
        }

        Ok(Self(parts))
    }

    pub fn components(&self) -> &[u32] {
        &self.0
    }

    /// True for a trunk revision, e.g. `1.4`.
    pub fn is_trunk(&self) -> bool {
        self.0.len() == 2
    }

    /// True for a branch tag's own revision value, e.g. `1.4.2` (the
    /// symbolic-names table entry naming branch 2 off 1.4, once it has real
    /// commits). These are never themselves check-in-able revisions.
    pub fn is_branch(&self) -> bool {
        self.0.len() % 2 == 1
    }

    /// True for the magic-branch encoding `P.0.N`, used by CVS to name a
    /// branch tag before any revision has been committed to it.
    pub fn is_magic_branch(&self) -> bool {
        let n = self.0.len();
        n >= 4 && n % 2 == 0 && self.0[n - 2] == 0
    }

    /// Drops the last component, identifying the branch this revision lives
    /// on. Valid for any non-branch (even-length) revision: trunk revisions,
    /// ordinary commits, and magic-branch tags alike.
    pub fn branch(&self) -> Result<Branch, Error> {
        if self.is_branch() {
            return Err(Error::NotNonBranch(self.to_string()));
        }

        let parent = &self.0[..self.0.len() - 1];
        if parent.len() == 1 {
            Ok(Branch::Trunk)
        } else {
            Ok(Branch::Sub(parent.to_vec()))
        }
    }

    /// Drops the last two components, yielding the revision this one's
    /// branch forked from: for an ordinary sub-branch commit like
    /// `1.4.2.3` that's `1.4`, and for a magic-branch tag like `1.4.0.2`
    /// it's the same `1.4`. Invalid on trunk revisions (nothing to drop
    /// to) and on branch-tag-shaped revisions like `1.4.2` (dropping two
    /// of three components wouldn't land on a real, committed revision).
    pub fn branch_point(&self) -> Result<Revision, Error> {
        if self.is_trunk() || self.is_branch() {
            return Err(Error::NotBranchPointable(self.to_string()));
        }

        Revision::new(self.0[..self.0.len() - 2].to_vec())
    }

    /// True iff `self` and `other` are on the same branch: same length,
    /// agreeing on every component but the last, with any two trunk
    /// revisions always considered to be on the same branch.
    pub fn same_branch(&self, other: &Revision) -> bool {
        if self.is_trunk() && other.is_trunk() {
            return true;
        }

        self.0.len() == other.0.len() && self.0[..self.0.len() - 1] == other.0[..other.0.len() - 1]
    }
}

impl FromStr for Revision {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .split('.')
            .map(|part| {
                part.parse::<u32>()
                    .map_err(|_| Error::InvalidComponent(s.to_string()))
            })
            .collect::<Result<Vec<u32>, Error>>()?;

        Revision::new(parts)
    }
}

impl Display for Revision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.iter().map(|p| p.to_string()).join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rev(s: &str) -> Revision {
        s.parse().unwrap()
    }

    #[test]
    fn test_predicates() {
        assert!(rev("1.4").is_trunk());
        assert!(!rev("1.4").is_branch());
        assert!(!rev("1.4").is_magic_branch());

        assert!(rev("1.4.2").is_branch());
        assert!(!rev("1.4.2").is_trunk());
        assert!(!rev("1.4.2").is_magic_branch());

        assert!(rev("1.4.0.2").is_magic_branch());
        assert!(!rev("1.4.0.2").is_branch());

        assert!(!rev("1.4.2.1").is_branch());
        assert!(!rev("1.4.2.1").is_magic_branch());
    }

    #[test]
    fn test_ordering() {
        assert!(rev("1.1") < rev("1.2"));
        assert!(rev("1.2") < rev("1.10"));
        assert!(rev("1.2") < rev("1.2.2.1"));
        assert!(rev("1.2.2.1") < rev("1.2.2.2"));
        assert!(rev("1.9") < rev("1.10"));
    }

    #[test]
    fn test_branch() {
        assert_eq!(rev("1.4").branch().unwrap(), Branch::Trunk);
        assert_eq!(
            rev("1.4.2.1").branch().unwrap(),
            Branch::Sub(vec![1, 4, 2])
        );
        assert!(rev("1.4.2").branch().is_err());
    }

    #[test]
    fn test_branch_point() {
        assert_eq!(rev("1.4.0.2").branch_point().unwrap(), rev("1.4"));
        assert_eq!(rev("1.4.2.3").branch_point().unwrap(), rev("1.4"));
        assert_eq!(rev("1.4.2.3.2.1").branch_point().unwrap(), rev("1.4.2.3"));
        assert!(rev("1.4.2").branch_point().is_err());
        assert!(rev("1.4").branch_point().is_err());
    }

    #[test]
    fn test_same_branch() {
        assert!(rev("1.2").same_branch(&rev("1.9")));
        assert!(rev("1.2.2.1").same_branch(&rev("1.2.2.2")));
        assert!(!rev("1.2.2.1").same_branch(&rev("1.2.4.1")));
        assert!(!rev("1.2").same_branch(&rev("1.2.2.1")));
    }

    #[test]
    fn test_parse_rejects_short() {
        assert!("1".parse::<Revision>().is_err());
        assert!("".parse::<Revision>().is_err());
    }
}
