//! File-based configuration and command-line overrides.
//!
//! A config file is JSON with camelCase keys:
//!
//! ```json
//! {
//!   "variant": "debug",
//!   "customTypeMapping": { "Date": "java.util.Date" },
//!   "useOptional": true,
//!   "hasGuavaDep": false,
//!   "buildDir": "build",
//!   "sourceRoot": "src/main/graphql"
//! }
//! ```
//!
//! Every key is optional. Values set on the command line win.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{ConfigurationError, ConfigurationIssue, ConfigurationIssueKind};
use crate::fingerprint::DEFAULT_EXTENSION;
use crate::options::{GenerationOptions, GenerationOptionsBuilder};

/// Build directory used when none is configured.
pub const DEFAULT_BUILD_DIR: &str = "build";

/// Schema source root used when none is configured.
pub const DEFAULT_SOURCE_ROOT: &str = "src/main/graphql";

/// Split a `SCALAR=TYPE` entry.
///
/// # Errors
///
/// Returns a message if there is no `=` or either side is empty.
pub fn parse_type_mapping(entry: &str) -> Result<(String, String), String> {
    match entry.split_once('=') {
        Some((scalar, target)) if !scalar.trim().is_empty() && !target.trim().is_empty() => {
            Ok((scalar.trim().to_string(), target.trim().to_string()))
        }
        _ => Err(ConfigurationIssue::new(entry, ConfigurationIssueKind::MalformedMappingEntry)
            .to_string()),
    }
}

/// Generation configuration, as read from a config file and/or the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CodegenConfig {
    #[serde(default)]
    pub variant: Option<String>,

    #[serde(default)]
    pub custom_type_mapping: BTreeMap<String, String>,

    /// Mapping entries given on the command line. They replace file entries for
    /// the same scalar; repeating a scalar here is an error.
    #[serde(skip)]
    pub type_mapping_overrides: Vec<(String, String)>,

    #[serde(default)]
    pub use_optional: Option<bool>,

    #[serde(default)]
    pub has_guava_dep: Option<bool>,

    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    #[serde(default)]
    pub build_dir: Option<PathBuf>,

    #[serde(default)]
    pub source_root: Option<PathBuf>,

    #[serde(default)]
    pub extension: Option<String>,

    #[serde(default)]
    pub state_file: Option<PathBuf>,
}

impl CodegenConfig {
    /// Read a JSON config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::ReadConfig`] if the file cannot be read and
    /// [`ConfigurationError::ParseConfig`] if it is malformed or has unknown keys.
    pub fn load(path: &Path) -> Result<Self, ConfigurationError> {
        let contents: String =
            fs::read_to_string(path).map_err(|e| ConfigurationError::ReadConfig {
                path: path.to_path_buf(),
                source: e,
            })?;
        serde_json::from_str(&contents).map_err(|e| ConfigurationError::ParseConfig {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Layer `overrides` on top of `self`. Set values in `overrides` win.
    #[must_use]
    pub fn merge(self, overrides: Self) -> Self {
        let mut custom_type_mapping: BTreeMap<String, String> = self.custom_type_mapping;
        custom_type_mapping.extend(overrides.custom_type_mapping);
        let mut type_mapping_overrides: Vec<(String, String)> = self.type_mapping_overrides;
        type_mapping_overrides.extend(overrides.type_mapping_overrides);

        Self {
            variant: overrides.variant.or(self.variant),
            custom_type_mapping,
            type_mapping_overrides,
            use_optional: overrides.use_optional.or(self.use_optional),
            has_guava_dep: overrides.has_guava_dep.or(self.has_guava_dep),
            output_dir: overrides.output_dir.or(self.output_dir),
            build_dir: overrides.build_dir.or(self.build_dir),
            source_root: overrides.source_root.or(self.source_root),
            extension: overrides.extension.or(self.extension),
            state_file: overrides.state_file.or(self.state_file),
        }
    }

    #[must_use]
    pub fn build_dir(&self) -> PathBuf {
        self.build_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BUILD_DIR))
    }

    #[must_use]
    pub fn source_root(&self) -> PathBuf {
        self.source_root
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SOURCE_ROOT))
    }

    #[must_use]
    pub fn extension(&self) -> &str {
        self.extension.as_deref().unwrap_or(DEFAULT_EXTENSION)
    }

    /// Configured output directory, or `<buildDir>/generated/source/graphql`.
    #[must_use]
    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| GenerationOptions::default_output_dir(&self.build_dir()))
    }

    /// Configured state file, or `<buildDir>/incgen/<variant>-state.json`.
    #[must_use]
    pub fn state_file(&self) -> PathBuf {
        self.state_file.clone().unwrap_or_else(|| {
            let variant: &str = match self.variant.as_deref() {
                Some(variant) if !variant.is_empty() => variant,
                _ => "main",
            };
            self.build_dir()
                .join("incgen")
                .join(format!("{variant}-state.json"))
        })
    }

    /// Build the immutable options for one build.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::Invalid`] with every validation issue.
    pub fn generation_options(&self) -> Result<GenerationOptions, ConfigurationError> {
        let file_entries = self
            .custom_type_mapping
            .iter()
            .filter(|(scalar, _)| {
                !self
                    .type_mapping_overrides
                    .iter()
                    .any(|(overridden, _)| overridden == *scalar)
            })
            .map(|(scalar, target)| (scalar.clone(), target.clone()));

        let builder: GenerationOptionsBuilder = GenerationOptions::builder(self.output_dir())
            .variant(self.variant.clone().unwrap_or_default())
            .type_mappings(file_entries)
            .type_mappings(self.type_mapping_overrides.iter().cloned())
            .use_optional(self.use_optional.unwrap_or(true))
            .has_guava_dep(self.has_guava_dep.unwrap_or(false));
        builder.build()
    }
}
