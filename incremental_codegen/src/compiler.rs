//! The compiler seam, and a compiler that runs an external generator program.

use std::path::PathBuf;
use std::process::{Command, Output};

use crate::error::CompileError;
use crate::request::GenerationRequest;

/// Generates code for one schema file.
///
/// Called synchronously, once per stale input, with output written under
/// [`GenerationRequest::output_dir`].
pub trait Compiler {
    /// Compile `request.input_file()` into `request.output_dir()`.
    ///
    /// # Errors
    ///
    /// Returns a [`CompileError`] naming the input file and the diagnostic.
    fn compile(&mut self, request: &GenerationRequest<'_>) -> Result<(), CompileError>;
}

/// Runs an external generator program once per request.
///
/// The program is invoked as
///
/// ```text
/// <program> [args...] --input <file> --output-dir <dir> --nullable-value-type <kind>
///           [--type-mapping SCALAR=TYPE ...] [--use-optional] [--guava]
/// ```
///
/// and must exit with status 0 on success. On failure its trimmed stderr is
/// used as the diagnostic.
#[derive(Debug, Clone)]
pub struct CommandCompiler {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandCompiler {
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Arguments placed before the per-request arguments.
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// The command that compiles `request`.
    #[must_use]
    pub fn command(&self, request: &GenerationRequest<'_>) -> Command {
        let mut command: Command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg("--input")
            .arg(request.input_file())
            .arg("--output-dir")
            .arg(request.output_dir())
            .arg("--nullable-value-type")
            .arg(request.nullable_value_type().as_str());
        for (scalar, target) in request.type_mapping() {
            command.arg("--type-mapping").arg(format!("{scalar}={target}"));
        }
        if request.use_optional() {
            command.arg("--use-optional");
        }
        if request.has_guava_dep() {
            command.arg("--guava");
        }
        command
    }

    fn diagnostic(&self, output: &Output) -> String {
        let stderr: String = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if stderr.is_empty() {
            format!("`{}` exited with {}", self.program.display(), output.status)
        } else {
            stderr
        }
    }
}

impl Compiler for CommandCompiler {
    fn compile(&mut self, request: &GenerationRequest<'_>) -> Result<(), CompileError> {
        let output: Output = self.command(request).output().map_err(|e| {
            CompileError::new(
                request.input_file(),
                format!("cannot run `{}`: {e}", self.program.display()),
            )
        })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(CompileError::new(
                request.input_file(),
                self.diagnostic(&output),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::GenerationOptions;
    use std::ffi::OsStr;
    use std::path::Path;

    fn options() -> GenerationOptions {
        GenerationOptions::builder("/build/gen")
            .type_mapping("Date", "CustomDate")
            .type_mapping("Url", "java.net.URL")
            .use_optional(true)
            .has_guava_dep(false)
            .build()
            .expect("options should be valid")
    }

    #[test]
    fn command_passes_request_arguments() {
        let options: GenerationOptions = options();
        let request: GenerationRequest<'_> =
            GenerationRequest::new(Path::new("schema/a.graphql"), &options);
        let compiler: CommandCompiler =
            CommandCompiler::new("graphql-codegen").with_args(["--package", "com.example"]);

        let command: Command = compiler.command(&request);

        let actual: Vec<&OsStr> = command.get_args().collect();
        let expected: Vec<&OsStr> = [
            "--package",
            "com.example",
            "--input",
            "schema/a.graphql",
            "--output-dir",
            "/build/gen",
            "--nullable-value-type",
            "builtin-optional",
            "--type-mapping",
            "Date=CustomDate",
            "--type-mapping",
            "Url=java.net.URL",
            "--use-optional",
        ]
        .into_iter()
        .map(OsStr::new)
        .collect();
        assert_eq!(expected, actual);
        assert_eq!(OsStr::new("graphql-codegen"), command.get_program());
    }

    #[test]
    fn missing_program_is_a_compile_error_for_the_input() {
        let options: GenerationOptions = options();
        let request: GenerationRequest<'_> =
            GenerationRequest::new(Path::new("schema/a.graphql"), &options);
        let mut compiler: CommandCompiler =
            CommandCompiler::new("/nonexistent/incgen-test-compiler");

        let error: CompileError = compiler.compile(&request).expect_err("program is missing");

        assert_eq!(Path::new("schema/a.graphql"), error.input_file);
        assert!(error.message.starts_with("cannot run"));
    }

    #[cfg(unix)]
    #[test]
    fn failing_program_reports_stderr() {
        let options: GenerationOptions = options();
        let request: GenerationRequest<'_> =
            GenerationRequest::new(Path::new("schema/b.graphql"), &options);
        let mut compiler: CommandCompiler = CommandCompiler::new("sh").with_args([
            "-c",
            "echo 'unknown type Foo' >&2; exit 1",
            "sh",
        ]);

        let error: CompileError = compiler.compile(&request).expect_err("program fails");

        assert_eq!(
            CompileError::new("schema/b.graphql", "unknown type Foo"),
            error
        );
    }

    #[cfg(unix)]
    #[test]
    fn failing_program_without_stderr_reports_status() {
        let options: GenerationOptions = options();
        let request: GenerationRequest<'_> =
            GenerationRequest::new(Path::new("schema/b.graphql"), &options);
        let mut compiler: CommandCompiler =
            CommandCompiler::new("sh").with_args(["-c", "exit 3", "sh"]);

        let error: CompileError = compiler.compile(&request).expect_err("program fails");

        assert!(error.message.contains("exited with"));
    }

    #[cfg(unix)]
    #[test]
    fn succeeding_program_is_ok() {
        let options: GenerationOptions = options();
        let request: GenerationRequest<'_> =
            GenerationRequest::new(Path::new("schema/a.graphql"), &options);
        let mut compiler: CommandCompiler = CommandCompiler::new("true");

        compiler.compile(&request).expect("program succeeds");
    }
}
