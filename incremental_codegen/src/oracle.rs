//! The staleness oracle seam.

use std::path::Path;

use crate::error::{DetectionError, StateCommitError};
use crate::source::SourceInput;

/// Classifies the files under a source root against the last build.
///
/// Implementations own whatever history they keep. The pipeline never
/// persists change history itself.
pub trait StalenessOracle {
    /// Report every known file under `source_root` with its staleness.
    ///
    /// Unchanged files may be omitted.
    ///
    /// # Errors
    ///
    /// Returns a [`DetectionError`] if the source set cannot be classified.
    /// No partial result is used when this fails.
    fn detect_changes(&mut self, source_root: &Path) -> Result<Vec<SourceInput>, DetectionError>;

    /// Called once after a build finished successfully, so the oracle can
    /// commit the state it observed during [`detect_changes`](Self::detect_changes).
    ///
    /// # Errors
    ///
    /// Returns a [`StateCommitError`] if the state cannot be persisted. The
    /// compiled output is already in place at that point.
    fn record_success(&mut self) -> Result<(), StateCommitError> {
        Ok(())
    }
}
