//! Source inputs and their staleness signal.

use std::path::{Path, PathBuf};

/// How a source file changed since the last recorded build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Staleness {
    /// Same content as the last successful build.
    Unchanged,
    /// New or modified; needs regeneration.
    OutOfDate,
    /// Present in the last build, gone now.
    Removed,
}

/// A schema file together with its staleness, as reported by a
/// [`StalenessOracle`](crate::StalenessOracle).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceInput {
    path: PathBuf,
    staleness: Staleness,
}

impl SourceInput {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, staleness: Staleness) -> Self {
        Self {
            path: path.into(),
            staleness,
        }
    }

    #[must_use]
    pub fn out_of_date(path: impl Into<PathBuf>) -> Self {
        Self::new(path, Staleness::OutOfDate)
    }

    #[must_use]
    pub fn unchanged(path: impl Into<PathBuf>) -> Self {
        Self::new(path, Staleness::Unchanged)
    }

    #[must_use]
    pub fn removed(path: impl Into<PathBuf>) -> Self {
        Self::new(path, Staleness::Removed)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn staleness(&self) -> Staleness {
        self.staleness
    }

    #[must_use]
    pub fn is_out_of_date(&self) -> bool {
        self.staleness == Staleness::OutOfDate
    }

    pub(crate) fn into_path(self) -> PathBuf {
        self.path
    }
}
