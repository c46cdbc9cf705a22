//! Command-line driver: compiles a single source file to NASM assembly.

use std::path::PathBuf;
use std::process;

use clap::Parser as ClapParser;

#[derive(ClapParser)]
#[command(name = "nasmpyc")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Compiles a small Python-like source file to x86-64 NASM assembly")]
struct Cli {
    /// Source file to compile
    input: PathBuf,

    /// Output assembly path (defaults to the input path with a `.asm` extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write the assembly even if diagnostics were reported
    #[arg(long)]
    emit_on_error: bool,

    /// Raise log verbosity from warn to debug
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = nasmpy::CompilerConfig::new().with_emit_on_error(cli.emit_on_error);
    if let Some(output) = cli.output {
        config = config.with_output_path(output);
    }

    match nasmpy::compile_file(&cli.input, &config) {
        Ok(outcome) => {
            for diagnostic in &outcome.diagnostics {
                eprintln!("{diagnostic}");
            }
            if outcome.has_errors() {
                process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(2);
        }
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
