//! Persisted fingerprints of the last successful build.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DetectionError, StateCommitError};

/// On-disk format version. A state file with another version is ignored,
/// whatever other keys it carries.
pub const STATE_VERSION: u32 = 1;

/// Only the version, read before the strict parse.
#[derive(Deserialize)]
struct VersionProbe {
    version: u32,
}

/// File fingerprints keyed by path relative to the source root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BuildState {
    pub version: u32,
    #[serde(default)]
    pub options_fingerprint: Option<String>,
    #[serde(default)]
    pub files: BTreeMap<PathBuf, String>,
}

impl BuildState {
    #[must_use]
    pub fn new(options_fingerprint: Option<String>, files: BTreeMap<PathBuf, String>) -> Self {
        Self {
            version: STATE_VERSION,
            options_fingerprint,
            files,
        }
    }

    /// Load the state at `path`. A missing file means no build has succeeded yet.
    ///
    /// # Errors
    ///
    /// Returns [`DetectionError::ReadState`] if the file exists but cannot be
    /// read, or [`DetectionError::CorruptState`] if it is not valid state JSON.
    pub fn load(path: &Path) -> Result<Option<Self>, DetectionError> {
        let contents: String = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(DetectionError::ReadState {
                    path: path.to_path_buf(),
                    source: e,
                });
            }
        };

        let corrupt = |source: serde_json::Error| DetectionError::CorruptState {
            path: path.to_path_buf(),
            source,
        };

        let probe: VersionProbe = serde_json::from_str(&contents).map_err(corrupt)?;
        if probe.version != STATE_VERSION {
            tracing::debug!(
                path = %path.display(),
                version = probe.version,
                "ignoring build state with unknown version"
            );
            return Ok(None);
        }

        let state: Self = serde_json::from_str(&contents).map_err(corrupt)?;
        Ok(Some(state))
    }

    /// Write the state to `path`, replacing any previous state.
    ///
    /// Parent directories are created. The file is written to a sibling
    /// temporary path and renamed into place.
    ///
    /// # Errors
    ///
    /// Returns [`StateCommitError::Encode`] if a path cannot be encoded, or
    /// [`StateCommitError::Write`] on any I/O failure.
    pub fn save(&self, path: &Path) -> Result<(), StateCommitError> {
        let write_error = |source: io::Error| StateCommitError::Write {
            path: path.to_path_buf(),
            source,
        };

        let json: String =
            serde_json::to_string_pretty(self).map_err(|e| StateCommitError::Encode {
                path: path.to_path_buf(),
                source: e,
            })?;

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(write_error)?;
        }

        let mut temp_name = path.as_os_str().to_os_string();
        temp_name.push(".tmp");
        let temp_path: PathBuf = PathBuf::from(temp_name);
        fs::write(&temp_path, json).map_err(write_error)?;
        fs::rename(&temp_path, path).map_err(write_error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_state() -> BuildState {
        let mut files: BTreeMap<PathBuf, String> = BTreeMap::new();
        files.insert(PathBuf::from("a.graphql"), "sha256:aa".to_string());
        files.insert(PathBuf::from("nested/b.graphql"), "sha256:bb".to_string());
        BuildState::new(Some("sha256:options".to_string()), files)
    }

    #[test]
    fn load_missing_file_is_first_build() {
        let temp_dir: TempDir = TempDir::new().expect("temp dir");
        let actual: Option<BuildState> =
            BuildState::load(&temp_dir.path().join("state.json")).expect("load should succeed");
        assert_eq!(None, actual);
    }

    #[test]
    fn save_creates_parents_and_load_reads_back() {
        let temp_dir: TempDir = TempDir::new().expect("temp dir");
        let path: PathBuf = temp_dir.path().join("incgen").join("main-state.json");
        let expected: BuildState = sample_state();

        expected.save(&path).expect("save should succeed");
        let actual: Option<BuildState> = BuildState::load(&path).expect("load should succeed");

        assert_eq!(Some(expected), actual);
        let mut temp_name = path.as_os_str().to_os_string();
        temp_name.push(".tmp");
        assert!(!PathBuf::from(temp_name).exists());
    }

    #[test]
    fn corrupt_state_is_a_detection_error() {
        let temp_dir: TempDir = TempDir::new().expect("temp dir");
        let path: PathBuf = temp_dir.path().join("state.json");
        fs::write(&path, "{ not json").expect("write");

        let error: DetectionError = BuildState::load(&path).expect_err("state is corrupt");
        assert!(matches!(error, DetectionError::CorruptState { .. }));
    }

    #[test]
    fn unknown_version_is_ignored() {
        let temp_dir: TempDir = TempDir::new().expect("temp dir");
        let path: PathBuf = temp_dir.path().join("state.json");
        fs::write(&path, r#"{ "version": 99, "files": {} }"#).expect("write");

        let actual: Option<BuildState> = BuildState::load(&path).expect("load should succeed");
        assert_eq!(None, actual);
    }

    #[test]
    fn newer_version_with_unknown_keys_is_ignored() {
        let temp_dir: TempDir = TempDir::new().expect("temp dir");
        let path: PathBuf = temp_dir.path().join("state.json");
        fs::write(&path, r#"{"version":2,"files":{},"newKey":1}"#).expect("write");

        let actual: Option<BuildState> = BuildState::load(&path).expect("load should succeed");
        assert_eq!(None, actual);
    }

    #[test]
    fn current_version_with_unknown_keys_is_corrupt() {
        let temp_dir: TempDir = TempDir::new().expect("temp dir");
        let path: PathBuf = temp_dir.path().join("state.json");
        fs::write(&path, r#"{"version":1,"files":{},"newKey":1}"#).expect("write");

        let error: DetectionError = BuildState::load(&path).expect_err("unknown key");
        assert!(matches!(error, DetectionError::CorruptState { .. }));
    }

    #[test]
    fn missing_version_is_corrupt() {
        let temp_dir: TempDir = TempDir::new().expect("temp dir");
        let path: PathBuf = temp_dir.path().join("state.json");
        fs::write(&path, r#"{"files":{}}"#).expect("write");

        let error: DetectionError = BuildState::load(&path).expect_err("no version");
        assert!(matches!(error, DetectionError::CorruptState { .. }));
    }

    #[test]
    fn save_into_a_file_path_fails() {
        let temp_dir: TempDir = TempDir::new().expect("temp dir");
        let blocker: PathBuf = temp_dir.path().join("blocker");
        fs::write(&blocker, "not a directory").expect("write");

        let error: StateCommitError = sample_state()
            .save(&blocker.join("state.json"))
            .expect_err("parent is a file");
        assert!(matches!(error, StateCommitError::Write { .. }));
    }
}
