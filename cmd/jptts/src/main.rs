//! jptts - Japanese text-to-speech from the command line.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{BackendsCommand, ConfigCommand, SayCommand, SpeakersCommand, StreamCommand};

/// jptts - Japanese text-to-speech from the command line.
///
/// Drives VOICEVOX, Web VOICEVOX, COEIROINK, TALQu and AssistantSeika through
/// one interface. Backends that do not answer at startup are skipped.
///
/// Configuration is stored in ~/.jptts/config.yaml.
#[derive(Parser)]
#[command(name = "jptts")]
#[command(about = "Japanese TTS engines CLI tool")]
#[command(version)]
pub struct Cli {
    /// Config file (default is ~/.jptts/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Output file (audio for `say`, file prefix for `stream`, default: stdout)
    #[arg(short = 'o', long, global = true)]
    pub output: Option<String>,

    /// Output as JSON (for piping)
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage CLI configuration
    Config(ConfigCommand),
    /// List available backends
    Backends(BackendsCommand),
    /// List the speakers of a backend
    Speakers(SpeakersCommand),
    /// Synthesize text into one audio file
    Say(SayCommand),
    /// Synthesize text sentence by sentence into numbered files
    Stream(StreamCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Config(cmd) => cmd.run(&cli).await,
        Commands::Backends(cmd) => cmd.run(&cli).await,
        Commands::Speakers(cmd) => cmd.run(&cli).await,
        Commands::Say(cmd) => cmd.run(&cli).await,
        Commands::Stream(cmd) => cmd.run(&cli).await,
    }
}
