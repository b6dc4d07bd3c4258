//! Configuration CLI commands.
//!
//! Provides `config path` and `config show` for inspecting the engine
//! settings the other commands run with.

use clap::Subcommand;
use texlayer::config::{config_file_path, EngineConfig};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the configuration file path
    Path,

    /// Show the effective configuration
    Show,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands, config: &EngineConfig) -> Result<(), CliError> {
    match command {
        ConfigCommands::Path => run_path(),
        ConfigCommands::Show => run_show(config),
    }
}

fn run_path() -> Result<(), CliError> {
    let path = config_file_path();
    println!("{}", path.display());
    if !path.exists() {
        println!("(file does not exist, defaults are used)");
    }
    Ok(())
}

fn run_show(config: &EngineConfig) -> Result<(), CliError> {
    println!("[engine]");
    println!("  parallel_threshold = {}", config.parallel_threshold);
    match config.worker_threads {
        Some(threads) => println!("  worker_threads = {}", threads),
        None => println!("  worker_threads = (all cores)"),
    }
    println!();
    println!("[logging]");
    println!("  level = {}", config.log_level);
    match &config.log_directory {
        Some(dir) => println!("  directory = {}", dir.display()),
        None => println!("  directory = (stderr only)"),
    }
    Ok(())
}
