//! Two builds over a throwaway schema directory: the first compiles every
//! file, the second finds nothing to do.
//!
//! The compiler here is an in-process stand-in that writes one stub class per
//! schema file.

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use incremental_codegen::{
    CompileError, Compiler, FingerprintOracle, GenerationOptions, GenerationRequest, run,
};

struct StubCompiler;

impl Compiler for StubCompiler {
    fn compile(&mut self, request: &GenerationRequest<'_>) -> Result<(), CompileError> {
        let stem: String = request
            .input_file()
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let class: String = format!(
            "// Generated from {}. Do not edit manually.\npublic class {stem} {{}}\n",
            request.input_file().display()
        );
        fs::write(request.output_dir().join(format!("{stem}.java")), class)
            .map_err(|e| CompileError::new(request.input_file(), e.to_string()))
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let root: PathBuf = std::env::temp_dir().join("incgen-readme-example");
    let source_root: PathBuf = root.join("src").join("main").join("graphql");
    fs::create_dir_all(&source_root)?;
    fs::write(source_root.join("HeroName.graphql"), "query HeroName { hero { name } }")?;
    fs::write(
        source_root.join("HeroDetails.graphql"),
        "query HeroDetails { hero { name friends { name } } }",
    )?;

    let build_dir: PathBuf = root.join("build");
    let options: GenerationOptions =
        GenerationOptions::builder(GenerationOptions::default_output_dir(&build_dir))
            .type_mapping("Date", "java.util.Date")
            .build()?;
    let state_file: &Path = &build_dir.join("incgen").join("main-state.json");

    for attempt in 1..=2 {
        let mut oracle: FingerprintOracle =
            FingerprintOracle::new(state_file).with_options_fingerprint(options.fingerprint());
        let report = run(&options, &source_root, &mut oracle, &mut StubCompiler)?;
        println!(
            "build {attempt}: {} compiled, output in {}",
            report.compiled.len(),
            report.output_dir.display()
        );
    }

    Ok(())
}
