//! Error types for the incremental generation pipeline.
//!
//! Every failure surfaces as a [`CodegenError`]. Configuration problems are
//! collected and reported together; compile failures carry the offending input.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// What is wrong with one piece of generation configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigurationIssueKind {
    /// No output directory was configured.
    MissingOutputDir,
    /// The output directory could not be resolved to an absolute path.
    UnresolvableOutputDir,
    /// A custom type mapping key is not a valid schema scalar name.
    InvalidScalarName,
    /// A custom type mapping value is not a valid target type name.
    InvalidTargetType,
    /// The same scalar was mapped more than once.
    DuplicateScalar,
    /// A `SCALAR=TYPE` entry is missing its `=` separator.
    MalformedMappingEntry,
    /// The variant contains characters outside `[A-Za-z0-9_-]`.
    InvalidVariant,
}

impl fmt::Display for ConfigurationIssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let description: &str = match self {
            Self::MissingOutputDir => "output directory is missing",
            Self::UnresolvableOutputDir => "output directory cannot be made absolute",
            Self::InvalidScalarName => "not a valid scalar type name",
            Self::InvalidTargetType => "not a valid target type name",
            Self::DuplicateScalar => "scalar type is mapped more than once",
            Self::MalformedMappingEntry => "expected SCALAR=TYPE",
            Self::InvalidVariant => "not a valid variant name",
        };
        f.write_str(description)
    }
}

/// A single configuration problem and the value it was found on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationIssue {
    /// The offending value (mapping key, mapping value, path, ...).
    pub subject: String,
    pub kind: ConfigurationIssueKind,
}

impl ConfigurationIssue {
    #[must_use]
    pub fn new(subject: impl Into<String>, kind: ConfigurationIssueKind) -> Self {
        Self {
            subject: subject.into(),
            kind,
        }
    }
}

impl fmt::Display for ConfigurationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.subject.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "`{}`: {}", self.subject, self.kind)
        }
    }
}

fn join_issues(issues: &[ConfigurationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<String>>()
        .join("; ")
}

/// Invalid or unreadable generation configuration.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// One or more option values failed validation.
    #[error("invalid generation options: {}", join_issues(.issues))]
    Invalid { issues: Vec<ConfigurationIssue> },

    /// The config file could not be read.
    #[error("cannot read config file {}: {source}", .path.display())]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The config file is not valid JSON or has unknown keys.
    #[error("malformed config file {}: {source}", .path.display())]
    ParseConfig {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl ConfigurationError {
    /// The validation issues, empty for file-level errors.
    #[must_use]
    pub fn issues(&self) -> &[ConfigurationIssue] {
        match self {
            Self::Invalid { issues } => issues,
            Self::ReadConfig { .. } | Self::ParseConfig { .. } => &[],
        }
    }
}

/// The staleness oracle could not classify the source set.
#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("source root {} does not exist or is not a directory", .path.display())]
    SourceRootMissing { path: PathBuf },

    #[error("cannot walk {}: {source}", .path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("cannot read source file {}: {source}", .path.display())]
    ReadSource {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot read build state {}: {source}", .path.display())]
    ReadState {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("corrupt build state {}: {source}", .path.display())]
    CorruptState {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Failure reported by a host-supplied oracle.
    #[error("{message}")]
    Oracle { message: String },
}

/// The oracle could not persist its state after a successful build.
///
/// Every input was already compiled when this happens; the generated output
/// stays in place and the next build re-detects the same inputs.
#[derive(Debug, Error)]
pub enum StateCommitError {
    #[error("cannot write build state {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot encode build state {}: {source}", .path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Failure reported by a host-supplied oracle.
    #[error("{message}")]
    Oracle { message: String },
}

/// A single input file failed to compile.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}: {message}", .input_file.display())]
pub struct CompileError {
    pub input_file: PathBuf,
    /// Diagnostic reported by the compiler.
    pub message: String,
}

impl CompileError {
    #[must_use]
    pub fn new(input_file: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            input_file: input_file.into(),
            message: message.into(),
        }
    }
}

/// Coarse classification of a failed build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Detection,
    Compile,
    OutputDir,
    StateCommit,
}

/// Terminal failure of one build invocation.
#[derive(Debug, Error)]
pub enum CodegenError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("change detection failed: {0}")]
    Detection(#[from] DetectionError),

    #[error("compilation failed: {0}")]
    Compile(#[from] CompileError),

    /// The output directory could not be created or is not a directory.
    #[error("cannot prepare output directory {}: {source}", .path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Generation succeeded but the oracle's state was not saved.
    #[error("generated output is in place but build state was not saved: {0}")]
    StateCommit(#[from] StateCommitError),
}

impl CodegenError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Detection(_) => ErrorKind::Detection,
            Self::Compile(_) => ErrorKind::Compile,
            Self::OutputDir { .. } => ErrorKind::OutputDir,
            Self::StateCommit(_) => ErrorKind::StateCommit,
        }
    }

    /// Human-readable reason. For compile failures this is the compiler's own message.
    #[must_use]
    pub fn reason(&self) -> String {
        match self {
            Self::Compile(compile_error) => compile_error.message.clone(),
            Self::Configuration(_)
            | Self::Detection(_)
            | Self::OutputDir { .. }
            | Self::StateCommit(_) => self.to_string(),
        }
    }

    /// The input file that caused the failure, if the failure is tied to one.
    #[must_use]
    pub fn failing_input(&self) -> Option<&Path> {
        match self {
            Self::Compile(compile_error) => Some(&compile_error.input_file),
            Self::Configuration(_)
            | Self::Detection(_)
            | Self::OutputDir { .. }
            | Self::StateCommit(_) => None,
        }
    }
}
