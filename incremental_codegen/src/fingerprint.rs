//! Content-hash staleness oracle.
//!
//! Walks the source root, hashes every schema file with SHA-256 and compares
//! the hashes with the [`BuildState`] of the last successful build. The new
//! state is only written by [`StalenessOracle::record_success`], so a failed
//! build leaves the previous state in place and the same files are reported
//! out of date next time.

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::error::{DetectionError, StateCommitError};
use crate::oracle::StalenessOracle;
use crate::source::{SourceInput, Staleness};
use crate::state::BuildState;

/// Schema file extension considered by default.
pub const DEFAULT_EXTENSION: &str = "graphql";

/// Hash a file's contents, returning a `sha256:`-prefixed hex digest.
///
/// # Errors
///
/// Returns [`DetectionError::ReadSource`] if the file cannot be read.
pub fn hash_file(path: &Path) -> Result<String, DetectionError> {
    let contents: Vec<u8> = fs::read(path).map_err(|e| DetectionError::ReadSource {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut hasher = Sha256::new();
    hasher.update(&contents);
    Ok(format!("sha256:{:x}", hasher.finalize()))
}

/// [`StalenessOracle`] that fingerprints files by content.
#[derive(Debug, Clone)]
pub struct FingerprintOracle {
    state_file: PathBuf,
    extension: String,
    options_fingerprint: Option<String>,
    pending: Option<BuildState>,
}

impl FingerprintOracle {
    /// Oracle persisting its state at `state_file`, considering `.graphql` files.
    #[must_use]
    pub fn new(state_file: impl Into<PathBuf>) -> Self {
        Self {
            state_file: state_file.into(),
            extension: DEFAULT_EXTENSION.to_string(),
            options_fingerprint: None,
            pending: None,
        }
    }

    /// Only consider files with this extension. An empty extension matches every file.
    #[must_use]
    pub fn with_extension(mut self, extension: &str) -> Self {
        self.extension = extension.trim_start_matches('.').to_string();
        self
    }

    /// Treat every file as out of date when the options differ from the last build.
    ///
    /// Usually [`GenerationOptions::fingerprint`](crate::GenerationOptions::fingerprint).
    #[must_use]
    pub fn with_options_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.options_fingerprint = Some(fingerprint.into());
        self
    }

    #[must_use]
    pub fn state_file(&self) -> &Path {
        &self.state_file
    }

    fn matches_extension(&self, path: &Path) -> bool {
        self.extension.is_empty()
            || path
                .extension()
                .is_some_and(|ext| ext == OsStr::new(&self.extension))
    }

    /// Hash every matching file, keyed by path relative to `source_root`.
    fn scan(&self, source_root: &Path) -> Result<BTreeMap<PathBuf, String>, DetectionError> {
        let mut files: BTreeMap<PathBuf, String> = BTreeMap::new();
        for entry in WalkDir::new(source_root)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry: walkdir::DirEntry = entry.map_err(|e| {
                let path: PathBuf = e
                    .path()
                    .map_or_else(|| source_root.to_path_buf(), Path::to_path_buf);
                DetectionError::Walk { path, source: e }
            })?;
            if !entry.file_type().is_file() || !self.matches_extension(entry.path()) {
                continue;
            }
            let relative: PathBuf = entry
                .path()
                .strip_prefix(source_root)
                .unwrap_or(entry.path())
                .to_path_buf();
            files.insert(relative, hash_file(entry.path())?);
        }
        Ok(files)
    }
}

impl StalenessOracle for FingerprintOracle {
    #[tracing::instrument(level = "debug", skip_all, fields(source_root = %source_root.display()))]
    fn detect_changes(&mut self, source_root: &Path) -> Result<Vec<SourceInput>, DetectionError> {
        if !source_root.is_dir() {
            return Err(DetectionError::SourceRootMissing {
                path: source_root.to_path_buf(),
            });
        }

        let previous: Option<BuildState> = BuildState::load(&self.state_file)?;
        let current: BTreeMap<PathBuf, String> = self.scan(source_root)?;

        let (previous_files, options_changed): (BTreeMap<PathBuf, String>, bool) = match previous
        {
            Some(state) => {
                let changed: bool = state.options_fingerprint != self.options_fingerprint;
                (state.files, changed)
            }
            None => {
                tracing::debug!("no previous build state; every input is out of date");
                (BTreeMap::new(), false)
            }
        };
        if options_changed {
            tracing::debug!("generation options changed; every input is out of date");
        }

        let mut inputs: Vec<SourceInput> = Vec::with_capacity(current.len());
        for (relative, hash) in &current {
            let staleness: Staleness = match previous_files.get(relative) {
                Some(previous_hash) if !options_changed && previous_hash == hash => {
                    Staleness::Unchanged
                }
                _ => Staleness::OutOfDate,
            };
            inputs.push(SourceInput::new(source_root.join(relative), staleness));
        }
        for relative in previous_files.keys() {
            if !current.contains_key(relative) {
                inputs.push(SourceInput::removed(source_root.join(relative)));
            }
        }

        self.pending = Some(BuildState::new(self.options_fingerprint.clone(), current));
        Ok(inputs)
    }

    fn record_success(&mut self) -> Result<(), StateCommitError> {
        if let Some(state) = self.pending.take() {
            state.save(&self.state_file)?;
            tracing::debug!(
                path = %self.state_file.display(),
                files = state.files.len(),
                "build state recorded"
            );
        }
        Ok(())
    }
}
