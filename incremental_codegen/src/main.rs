//! Binary that regenerates code for every changed schema file.
//!
//! Usage: `incgen --compiler graphql-codegen [--config codegen.json] [options]`
//!
//! Only files changed since the last successful run are compiled. Set
//! `RUST_LOG=incremental_codegen=debug` or pass `--verbose` for logs.

use std::path::PathBuf;
use std::process;

use clap::Parser;
use incremental_codegen::{
    BuildReport, CodegenConfig, CodegenError, CommandCompiler, FingerprintOracle,
    GenerationOptions, init_tracing, parse_type_mapping, run,
};

#[derive(Debug, Parser)]
#[command(name = "incgen", version, about = "Incrementally generate code from schema files")]
struct Cli {
    /// JSON config file; command-line values override it.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Generator program, invoked once per changed schema file.
    #[arg(long, value_name = "PROGRAM")]
    compiler: PathBuf,

    /// Extra argument passed to the generator before the per-file arguments.
    #[arg(long = "compiler-arg", value_name = "ARG", allow_hyphen_values = true)]
    compiler_args: Vec<String>,

    /// Directory containing the schema files [default: src/main/graphql].
    #[arg(long, value_name = "DIR")]
    source_root: Option<PathBuf>,

    /// Output directory [default: <build-dir>/generated/source/graphql].
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Build directory [default: build].
    #[arg(long, value_name = "DIR")]
    build_dir: Option<PathBuf>,

    /// Build variant name.
    #[arg(long)]
    variant: Option<String>,

    /// Map a schema scalar to a target type; may be repeated.
    #[arg(long = "type-mapping", value_name = "SCALAR=TYPE", value_parser = parse_type_mapping)]
    type_mappings: Vec<(String, String)>,

    /// Wrap nullable values in an optional type [default: true].
    #[arg(long, value_name = "BOOL")]
    use_optional: Option<bool>,

    /// The consuming project depends on Guava [default: false].
    #[arg(long, value_name = "BOOL")]
    has_guava_dep: Option<bool>,

    /// Schema file extension [default: graphql].
    #[arg(long)]
    extension: Option<String>,

    /// Where the last successful build's fingerprints are kept
    /// [default: <build-dir>/incgen/<variant>-state.json].
    #[arg(long, value_name = "FILE")]
    state_file: Option<PathBuf>,

    /// Log progress at debug level when `RUST_LOG` is unset.
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn overrides(&self) -> CodegenConfig {
        CodegenConfig {
            variant: self.variant.clone(),
            type_mapping_overrides: self.type_mappings.clone(),
            use_optional: self.use_optional,
            has_guava_dep: self.has_guava_dep,
            output_dir: self.output_dir.clone(),
            build_dir: self.build_dir.clone(),
            source_root: self.source_root.clone(),
            extension: self.extension.clone(),
            state_file: self.state_file.clone(),
            ..CodegenConfig::default()
        }
    }
}

fn build(cli: &Cli) -> Result<BuildReport, CodegenError> {
    let file_config: CodegenConfig = match &cli.config {
        Some(path) => CodegenConfig::load(path)?,
        None => CodegenConfig::default(),
    };
    let config: CodegenConfig = file_config.merge(cli.overrides());
    let options: GenerationOptions = config.generation_options()?;

    let mut oracle: FingerprintOracle = FingerprintOracle::new(config.state_file())
        .with_extension(config.extension())
        .with_options_fingerprint(options.fingerprint());
    let mut compiler: CommandCompiler =
        CommandCompiler::new(&cli.compiler).with_args(cli.compiler_args.iter().cloned());

    run(&options, &config.source_root(), &mut oracle, &mut compiler)
}

fn main() {
    let cli: Cli = Cli::parse();
    init_tracing(cli.verbose.then_some("incremental_codegen=debug"));

    match build(&cli) {
        Ok(report) => {
            println!(
                "{} file(s) compiled into {}",
                report.compiled.len(),
                report.output_dir.display()
            );
        }
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}
