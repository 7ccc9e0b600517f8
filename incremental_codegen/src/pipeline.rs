//! The build entry point: detect changes, then generate.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::compiler::Compiler;
use crate::detector::{ChangeDetector, ChangeSet};
use crate::driver::{GenerationDriver, ensure_output_dir};
use crate::error::CodegenError;
use crate::options::GenerationOptions;
use crate::oracle::StalenessOracle;
use crate::request::GenerationRequest;

/// Where a build invocation is.
///
/// `Idle → DetectingChanges → {NoChanges | Generating} → {Success | Failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildPhase {
    Idle,
    DetectingChanges,
    NoChanges,
    Generating,
    Success,
    Failed,
}

impl BuildPhase {
    /// Whether `next` may follow `self`.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::DetectingChanges)
                | (
                    Self::DetectingChanges,
                    Self::NoChanges | Self::Generating | Self::Failed
                )
                | (Self::NoChanges | Self::Generating, Self::Success | Self::Failed)
        )
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }
}

impl fmt::Display for BuildPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name: &str = match self {
            Self::Idle => "idle",
            Self::DetectingChanges => "detecting changes",
            Self::NoChanges => "no changes",
            Self::Generating => "generating",
            Self::Success => "success",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Phase tracker for one build. A new build gets a new tracker.
#[derive(Debug)]
struct Build {
    phase: BuildPhase,
}

impl Build {
    fn new() -> Self {
        Self {
            phase: BuildPhase::Idle,
        }
    }

    fn advance(&mut self, next: BuildPhase) {
        debug_assert!(
            self.phase.can_transition_to(next),
            "invalid build transition {} -> {next}",
            self.phase
        );
        tracing::debug!(from = %self.phase, to = %next, "build phase");
        self.phase = next;
    }
}

/// Summary of a successful build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    /// Inputs handed to the compiler, in invocation order.
    pub compiled: Vec<PathBuf>,
    /// Inputs that disappeared since the last build. Their generated output is
    /// left in place.
    pub removed: Vec<PathBuf>,
    pub output_dir: PathBuf,
}

impl BuildReport {
    /// True when nothing was out of date.
    #[must_use]
    pub fn is_up_to_date(&self) -> bool {
        self.compiled.is_empty()
    }
}

/// Outcome of [`run`].
pub type BuildResult = Result<BuildReport, CodegenError>;

/// Run one incremental build.
///
/// Asks `oracle` which files under `source_root` are out of date, prepares the
/// output directory, and compiles each stale file exactly once, in path order,
/// stopping at the first failure. The oracle's state is committed only when
/// every step succeeded.
///
/// Generated output of removed source files is not deleted.
///
/// # Errors
///
/// Returns [`CodegenError::Detection`] if the oracle fails (no compiler
/// invocation happens), [`CodegenError::OutputDir`] if the output directory
/// cannot be prepared, or [`CodegenError::Compile`] for the first failing input.
/// [`CodegenError::StateCommit`] means every input compiled but the oracle
/// could not save its state; the output stays and the next build redoes it.
#[tracing::instrument(
    level = "info",
    skip_all,
    fields(task = %options.task_name(), source_root = %source_root.display())
)]
pub fn run<O, C>(
    options: &GenerationOptions,
    source_root: &Path,
    oracle: &mut O,
    compiler: &mut C,
) -> BuildResult
where
    O: StalenessOracle + ?Sized,
    C: Compiler + ?Sized,
{
    let mut build: Build = Build::new();
    let result: BuildResult = execute(&mut build, options, source_root, oracle, compiler);
    match &result {
        Ok(report) => {
            build.advance(BuildPhase::Success);
            tracing::info!(
                compiled = report.compiled.len(),
                removed = report.removed.len(),
                "build succeeded"
            );
        }
        Err(e) => {
            build.advance(BuildPhase::Failed);
            tracing::error!(error = %e, "build failed");
        }
    }
    result
}

fn execute<O, C>(
    build: &mut Build,
    options: &GenerationOptions,
    source_root: &Path,
    oracle: &mut O,
    compiler: &mut C,
) -> BuildResult
where
    O: StalenessOracle + ?Sized,
    C: Compiler + ?Sized,
{
    build.advance(BuildPhase::DetectingChanges);
    let change_set: ChangeSet = ChangeDetector::new(&mut *oracle).detect(source_root)?;

    for removed in &change_set.removed {
        tracing::warn!(
            input = %removed.display(),
            "source removed; previously generated output is kept"
        );
    }

    let compiled: Vec<PathBuf> = if change_set.is_empty() {
        build.advance(BuildPhase::NoChanges);
        ensure_output_dir(options.output_dir())?;
        Vec::new()
    } else {
        build.advance(BuildPhase::Generating);
        GenerationDriver::new(options, compiler)
            .generate(GenerationRequest::for_inputs(&change_set.out_of_date, options))?
    };

    oracle.record_success()?;

    Ok(BuildReport {
        compiled,
        removed: change_set.removed,
        output_dir: options.output_dir().to_path_buf(),
    })
}
