use std::convert::Infallible;
use std::fmt::Display;
use std::str::FromStr;

use derive_more::{AsRef, Constructor, Deref, Display, From, Into};

/// A Git revision name, as accepted by `git rev-parse`.
///
/// Usually this is an (abbreviated) commit hash, but revisions given on the command line may be
/// anything Git understands, like `HEAD~2`.
#[derive(
    serde::Serialize,
    serde::Deserialize,
    Debug,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    Into,
    From,
    AsRef,
    Deref,
    Constructor,
)]
#[serde(transparent)]
pub struct RevisionId(String);

impl RevisionId {
    pub fn head() -> Self {
        Self("HEAD".to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RevisionId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// A point in history that a change can be compared against.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Revision {
    /// A commit whose dependencies may be explored further.
    Concrete(RevisionId),
    /// A commit at the edge of the explorable history.
    ///
    /// `git blame` marks these with a leading `^`. They are reported but never expanded.
    Boundary(RevisionId),
    /// Uncommitted changes in the working tree, compared against `HEAD`.
    WorkingState,
}

impl Revision {
    /// The name used for [`Revision::WorkingState`] on the command line.
    pub const WORKING: &'static str = "WORKING";

    /// Parse the revision column of a `git blame` line.
    pub fn from_blame(token: &str) -> Self {
        match token.strip_prefix('^') {
            Some(id) => Self::Boundary(RevisionId::from(id)),
            None => Self::Concrete(RevisionId::from(token)),
        }
    }

    /// The commit this revision names, if any.
    pub fn id(&self) -> Option<&RevisionId> {
        match self {
            Revision::Concrete(id) | Revision::Boundary(id) => Some(id),
            Revision::WorkingState => None,
        }
    }
}

impl Display for Revision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Revision::Concrete(id) => id.fmt(f),
            Revision::Boundary(id) => write!(f, "^{id}"),
            Revision::WorkingState => f.write_str(Self::WORKING),
        }
    }
}

/// Parses revisions given on the command line.
///
/// Boundary markers only appear in `git blame` output, see [`Revision::from_blame`].
impl FromStr for Revision {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == Self::WORKING {
            Ok(Self::WorkingState)
        } else {
            Ok(Self::Concrete(RevisionId::from(s)))
        }
    }
}
