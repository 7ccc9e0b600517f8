//! Issues one compiler invocation per stale input.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::compiler::Compiler;
use crate::error::CodegenError;
use crate::options::GenerationOptions;
use crate::request::GenerationRequest;

/// Create `output_dir` and its parents if missing.
///
/// An existing directory is fine; an existing file at that path is not.
///
/// # Errors
///
/// Returns [`CodegenError::OutputDir`] if the directory cannot be created or
/// the path is taken by something other than a directory.
pub fn ensure_output_dir(output_dir: &Path) -> Result<(), CodegenError> {
    let output_dir_error = |source: io::Error| CodegenError::OutputDir {
        path: output_dir.to_path_buf(),
        source,
    };

    fs::create_dir_all(output_dir).map_err(output_dir_error)?;
    if !output_dir.is_dir() {
        return Err(output_dir_error(io::Error::new(
            io::ErrorKind::NotADirectory,
            "path exists and is not a directory",
        )));
    }
    Ok(())
}

/// Runs requests through a [`Compiler`], strictly one after another.
pub struct GenerationDriver<'a, C: Compiler + ?Sized> {
    options: &'a GenerationOptions,
    compiler: &'a mut C,
}

impl<'a, C: Compiler + ?Sized> GenerationDriver<'a, C> {
    #[must_use]
    pub fn new(options: &'a GenerationOptions, compiler: &'a mut C) -> Self {
        Self { options, compiler }
    }

    /// Compile every request, stopping at the first failure.
    ///
    /// The output directory is created before the first invocation, even when
    /// there are no requests. Returns the compiled input files in invocation
    /// order.
    ///
    /// # Errors
    ///
    /// Returns [`CodegenError::OutputDir`] before any invocation if the output
    /// directory cannot be prepared, or [`CodegenError::Compile`] for the first
    /// request that fails. Requests after a failure are never invoked and
    /// outputs of earlier requests are left in place.
    pub fn generate<'r, I>(&mut self, requests: I) -> Result<Vec<PathBuf>, CodegenError>
    where
        I: IntoIterator<Item = GenerationRequest<'r>>,
    {
        ensure_output_dir(self.options.output_dir())?;

        let mut compiled: Vec<PathBuf> = Vec::new();
        for request in requests {
            debug_assert_eq!(self.options, request.options());
            let _span = tracing::debug_span!(
                "compile",
                input = %request.input_file().display()
            )
            .entered();

            if let Err(e) = self.compiler.compile(&request) {
                tracing::error!(
                    input = %e.input_file.display(),
                    message = %e.message,
                    "compilation failed"
                );
                return Err(e.into());
            }
            tracing::debug!("compiled");
            compiled.push(request.input_file().to_path_buf());
        }
        Ok(compiled)
    }
}
