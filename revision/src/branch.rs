use crate::Revision;

/// Identifies the branch a revision belongs to: either the trunk, or a
/// sub-branch named by the dotted components of its branch tag (without any
/// magic `0`), e.g. `Sub(vec![1, 4, 2])` for revisions `1.4.2.*`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Branch {
    Trunk,
    Sub(Vec<u32>),
}

impl Branch {
    /// The real, committed revision this branch was forked from, if any can
    /// be derived. `Trunk` has no root revision: the first trunk commit has
    /// no predecessor at all. A `Sub` branch's root is obtained by dropping
    /// its trailing branch-number component.
    pub fn root_revision(&self) -> Option<Revision> {
        match self {
            Branch::Trunk => None,
            Branch::Sub(parts) => {
                let root = &parts[..parts.len() - 1];
                Revision::new(root.to_vec()).ok()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_revision() {
        assert_eq!(Branch::Trunk.root_revision(), None);
        assert_eq!(
            Branch::Sub(vec![1, 4, 2]).root_revision(),
            Some("1.4".parse().unwrap())
        );
        assert_eq!(
            Branch::Sub(vec![1, 4, 2, 3, 2]).root_revision(),
            Some("1.4.2.3".parse().unwrap())
        );
    }
}
