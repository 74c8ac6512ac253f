//! Poseidon CLI.
//!
//! Hashes field elements read from stdin and exports parameter sets.

use clap::{Parser, Subcommand};
use poseidon_engine::params::builtin;
use poseidon_engine::{ErrorCode, Fr, ParameterFile, Poseidon, PoseidonResult};
use std::io::{self, BufWriter, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "poseidon")]
#[command(about = "Poseidon hash over the BLS12-381 scalar field", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version information
    Version,

    /// Hash little-endian hex field elements read from stdin, `arity` per instance
    Hash {
        /// Elements absorbed per instance
        #[arg(long)]
        arity: usize,

        /// Digest elements printed per instance
        #[arg(long, default_value_t = 1)]
        outputs: usize,

        /// Parameter set JSON to use instead of the built-in one
        #[arg(long)]
        params: Option<PathBuf>,
    },

    /// Print the built-in parameter set for an arity as JSON
    ExportParams {
        /// Arity of the built-in set
        #[arg(long)]
        arity: usize,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Version) | None => {
            println!("poseidon v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Some(Commands::Hash {
            arity,
            outputs,
            params,
        }) => run_hash(arity, outputs, params),
        Some(Commands::ExportParams { arity }) => run_export(arity),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::json!({ "err": { "code": e.code(), "name": e.name(), "message": e.to_string() } })
            );
            ExitCode::FAILURE
        }
    }
}

fn load_instance(arity: usize, params: Option<PathBuf>) -> PoseidonResult<Poseidon> {
    let Some(path) = params else {
        return Poseidon::load(arity);
    };

    debug!(path = %path.display(), "loading parameter file");
    let json = std::fs::read_to_string(&path)
        .map_err(|e| ErrorCode::InvalidParameters(format!("{}: {}", path.display(), e)))?;
    let constants = ParameterFile::from_json(&json)?.into_constants()?;
    if constants.arity() != arity {
        return Err(ErrorCode::InvalidParameters(format!(
            "parameter file is for arity {}, requested {}",
            constants.arity(),
            arity
        )));
    }
    Ok(Poseidon::from_constants(Arc::new(constants)))
}

fn run_hash(arity: usize, outputs: usize, params: Option<PathBuf>) -> PoseidonResult<()> {
    let poseidon = load_instance(arity, params)?;

    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .map_err(|e| ErrorCode::ExecutionFailure(format!("reading stdin: {}", e)))?;
    let elements = input
        .split_whitespace()
        .map(Fr::from_hex)
        .collect::<PoseidonResult<Vec<_>>>()?;

    if elements.len() % arity != 0 {
        return Err(ErrorCode::ShapeMismatch(format!(
            "{} elements do not split into blocks of {}",
            elements.len(),
            arity
        )));
    }
    let number_of_states = elements.len() / arity;

    let cfg = poseidon.default_hash_config();
    let mut digests = vec![Fr::ZERO; number_of_states * outputs];
    poseidon.hash_many(&elements, &mut digests, number_of_states, arity, outputs, &cfg)?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for row in digests.chunks(outputs.max(1)) {
        let line: Vec<String> = row.iter().map(Fr::to_hex).collect();
        writeln!(out, "{}", line.join(" "))
            .map_err(|e| ErrorCode::ExecutionFailure(format!("writing stdout: {}", e)))?;
    }
    out.flush()
        .map_err(|e| ErrorCode::ExecutionFailure(format!("writing stdout: {}", e)))
}

fn run_export(arity: usize) -> PoseidonResult<()> {
    let constants = builtin::load(arity)?;
    println!("{}", ParameterFile::from_constants(&constants).to_json()?);
    Ok(())
}
