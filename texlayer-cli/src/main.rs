//! TexLayer CLI - render layered, animated textures from image files.

mod commands;
mod error;

use clap::{Parser, Subcommand};
use texlayer::config::EngineConfig;
use texlayer::logging::{init_logging, LoggingConfig};

use commands::animate::AnimateArgs;
use commands::config::ConfigCommands;
use commands::mipmaps::MipmapsArgs;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "texlayer")]
#[command(version = texlayer::VERSION)]
#[command(about = "Render layered, animated textures and their mipmaps", long_about = None)]
struct Cli {
    /// Log at debug level regardless of the configured level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Play a vertical sprite strip and write each uploaded tick as PNGs
    Animate(AnimateArgs),

    /// Write the mipmap chain of an image as PNGs
    Mipmaps(MipmapsArgs),

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = EngineConfig::load()?;

    let mut logging = LoggingConfig::from(&config);
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    // Keep the guard alive so buffered file logs are flushed on exit.
    let _guard = init_logging(logging)?;

    tracing::debug!(version = texlayer::VERSION, "Starting texlayer");

    match cli.command {
        Commands::Animate(args) => commands::animate::run(args, &config),
        Commands::Mipmaps(args) => commands::mipmaps::run(args),
        Commands::Config { command } => commands::config::run(command, &config),
    }
}
