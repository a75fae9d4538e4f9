//! `revision` models CVS/RCS dotted-numeric revision identities and the set
//! of revisions known to exist in a given RCS file.

mod branch;
mod error;
mod revision;
mod set;

pub use self::branch::Branch;
pub use self::error::Error;
pub use self::revision::Revision;
pub use self::set::{Checkinable, RevisionSet};
