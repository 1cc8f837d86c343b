//! flatdb binary.
//!
//! Runs an optional script, then reads statements from stdin until `.EXIT`.

use std::path::PathBuf;

use clap::Parser;
use flatdb::{
    config::Config,
    shell::Shell,
    sql::engine::{Session, file::FileEngine},
    storage::disk::DiskEngine,
};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "flatdb", version)]
struct Cli {
    /// Script to run before reading from stdin.
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Delete every database before starting.
    #[arg(short, long)]
    reset: bool,

    /// Set the log level to debug.
    #[arg(short, long)]
    debug: bool,

    /// Set the log level to info.
    #[arg(short, long)]
    verbose: bool,

    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the databases (overrides the config file).
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    let level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        config.log_level.as_str()
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut files = FileEngine::new(DiskEngine::new(), config.data_dir.clone(), config.table_extension.as_str());
    if cli.reset {
        info!(data_dir = %config.data_dir.display(), "resetting");
        files.reset()?;
    }
    let session = Session::new(files)?;
    let mut shell = Shell::new(session, std::io::stdout().lock());

    let mut running = true;
    if let Some(script) = &cli.file {
        running = shell.run_script(script)?;
    }
    if running {
        shell.run(std::io::stdin().lock())?;
    }

    println!("All done.");
    Ok(())
}
