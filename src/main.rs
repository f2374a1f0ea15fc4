use clap::Parser;
use log::{error, info};
use minidb::{DatabaseCli, EngineConfig, LiteralPolicy};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

// Command-line flags and positional arguments.
#[derive(Parser, Debug)]
#[command(author, version, about = "A minimal single-user SQL engine")]
struct Args {
    /// Script to run in batch mode. Without it an interactive session starts.
    #[arg(requires = "output")]
    input: Option<PathBuf>,

    /// File receiving SELECT results in batch mode.
    #[arg(requires = "input")]
    output: Option<PathBuf>,

    /// Directory holding the database files.
    #[arg(long, default_value = minidb::config::DEFAULT_DATA_DIRECTORY)]
    data_dir: PathBuf,

    /// Store 114514 / 114.514 for numeric literals that do not parse instead of
    /// rejecting the row.
    #[arg(long)]
    lenient: bool,

    /// Enable debug logging. RUST_LOG takes precedence.
    #[arg(long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let policy = if args.lenient {
        LiteralPolicy::Substitute
    } else {
        LiteralPolicy::Reject
    };
    let config = EngineConfig::new()
        .with_data_directory(&args.data_dir)
        .with_literal_policy(policy);
    info!("data directory: {}", config.data_directory.display());

    let mut cli = DatabaseCli::from_config(config);

    match (args.input, args.output) {
        (Some(input), Some(output)) => match cli.run_file(&input, &output) {
            Ok(summary) => {
                info!(
                    "{} statements executed, {} failed",
                    summary.executed, summary.failed
                );
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!("{}", e);
                eprintln!("Error: {}", e);
                ExitCode::FAILURE
            }
        },
        _ => {
            let stdin = io::stdin().lock();
            let mut stdout = io::stdout().lock();
            match cli.run_interactive(stdin, &mut stdout) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    error!("interactive session failed: {}", e);
                    ExitCode::FAILURE
                }
            }
        }
    }
}
