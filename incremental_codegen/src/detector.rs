//! Turns the oracle's classification into the ordered set of inputs to regenerate.

use std::path::{Path, PathBuf};

use crate::error::DetectionError;
use crate::oracle::StalenessOracle;
use crate::source::{SourceInput, Staleness};

/// Result of change detection for one build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    /// Inputs to regenerate, sorted by path, without duplicates.
    pub out_of_date: Vec<SourceInput>,
    /// Inputs that disappeared since the last build, sorted by path.
    /// Never passed to the compiler.
    pub removed: Vec<PathBuf>,
}

impl ChangeSet {
    /// Partition raw oracle output. Unchanged entries are dropped.
    ///
    /// Sorting makes the request order independent of the order the oracle
    /// happened to walk the filesystem in.
    #[must_use]
    pub fn from_inputs(inputs: Vec<SourceInput>) -> Self {
        let mut out_of_date: Vec<SourceInput> = Vec::new();
        let mut removed: Vec<PathBuf> = Vec::new();
        for input in inputs {
            match input.staleness() {
                Staleness::OutOfDate => out_of_date.push(input),
                Staleness::Removed => removed.push(input.into_path()),
                Staleness::Unchanged => {}
            }
        }

        out_of_date.sort_by(|a, b| a.path().cmp(b.path()));
        out_of_date.dedup_by(|a, b| a.path() == b.path());
        removed.sort();
        removed.dedup();
        // A path reported both ways is regenerated, not treated as removed.
        removed.retain(|path| {
            out_of_date
                .binary_search_by(|input| input.path().cmp(path.as_path()))
                .is_err()
        });

        Self {
            out_of_date,
            removed,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.out_of_date.is_empty()
    }
}

/// Asks a [`StalenessOracle`] which inputs changed.
pub struct ChangeDetector<'a, O: StalenessOracle + ?Sized> {
    oracle: &'a mut O,
}

impl<'a, O: StalenessOracle + ?Sized> ChangeDetector<'a, O> {
    #[must_use]
    pub fn new(oracle: &'a mut O) -> Self {
        Self { oracle }
    }

    /// Classify the files under `source_root`.
    ///
    /// # Errors
    ///
    /// Propagates the oracle's [`DetectionError`]; nothing is returned on failure.
    #[tracing::instrument(level = "debug", skip_all, fields(source_root = %source_root.display()))]
    pub fn detect(&mut self, source_root: &Path) -> Result<ChangeSet, DetectionError> {
        let inputs: Vec<SourceInput> = self.oracle.detect_changes(source_root)?;
        let change_set: ChangeSet = ChangeSet::from_inputs(inputs);
        tracing::debug!(
            out_of_date = change_set.out_of_date.len(),
            removed = change_set.removed.len(),
            "change detection complete"
        );
        Ok(change_set)
    }
}
