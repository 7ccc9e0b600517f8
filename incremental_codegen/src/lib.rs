//! Incremental orchestration of a schema code generator.
//!
//! A build asks a [`StalenessOracle`] which schema files changed since the
//! last successful build, then hands each out-of-date file to a [`Compiler`]
//! exactly once, in path order, writing into a single output directory. The
//! first compile failure stops the build.
//!
//! ```no_run
//! use std::path::Path;
//! use incremental_codegen::{CommandCompiler, FingerprintOracle, GenerationOptions, run};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let options = GenerationOptions::builder("build/generated/source/graphql")
//!     .type_mapping("Date", "java.util.Date")
//!     .build()?;
//! let mut oracle = FingerprintOracle::new("build/incgen/main-state.json")
//!     .with_options_fingerprint(options.fingerprint());
//! let mut compiler = CommandCompiler::new("graphql-codegen");
//!
//! let report = run(&options, Path::new("src/main/graphql"), &mut oracle, &mut compiler)?;
//! println!("compiled {} file(s)", report.compiled.len());
//! # Ok(())
//! # }
//! ```
//!
//! Generated output of a source file that is later removed is not deleted;
//! removed files are logged and listed in [`BuildReport::removed`].

mod compiler;
mod config;
mod detector;
mod driver;
mod error;
mod fingerprint;
mod options;
mod oracle;
mod pipeline;
mod request;
mod source;
mod state;

pub use compiler::{CommandCompiler, Compiler};
pub use config::{CodegenConfig, DEFAULT_BUILD_DIR, DEFAULT_SOURCE_ROOT, parse_type_mapping};
pub use detector::{ChangeDetector, ChangeSet};
pub use driver::{GenerationDriver, ensure_output_dir};
pub use error::{
    CodegenError, CompileError, ConfigurationError, ConfigurationIssue, ConfigurationIssueKind,
    DetectionError, ErrorKind, StateCommitError,
};
pub use fingerprint::{DEFAULT_EXTENSION, FingerprintOracle, hash_file};
pub use options::{GenerationOptions, GenerationOptionsBuilder};
pub use oracle::StalenessOracle;
pub use pipeline::{BuildPhase, BuildReport, BuildResult, run};
pub use request::{GenerationRequest, NullableValueType};
pub use source::{SourceInput, Staleness};
pub use state::{BuildState, STATE_VERSION};

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Install a `tracing` subscriber once.
///
/// `RUST_LOG` takes precedence, e.g. `RUST_LOG=incremental_codegen=debug`.
/// Without it, `default_directive` is used if given; otherwise nothing is
/// installed. Later calls do nothing.
pub fn init_tracing(default_directive: Option<&str>) {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{EnvFilter, fmt, prelude::*};

        let filter: Option<EnvFilter> = if std::env::var("RUST_LOG").is_ok() {
            Some(EnvFilter::from_default_env())
        } else {
            default_directive.map(EnvFilter::new)
        };
        if let Some(filter) = filter {
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(true)
                        .with_level(true),
                )
                .with(filter)
                .init();
        }
    });
}
