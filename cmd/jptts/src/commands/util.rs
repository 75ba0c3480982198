//! Utility functions for CLI commands.

use jptts::Jptts;
use jptts_cli::{load_config, Config, Output, OutputFormat};

use crate::Cli;

/// Gets the global configuration.
pub fn get_config(cli: &Cli) -> anyhow::Result<Config> {
    load_config(cli.config.as_deref())
}

/// Creates the client from the configuration file.
pub fn create_client(cli: &Cli) -> anyhow::Result<Jptts> {
    let cfg = get_config(cli)?;
    print_verbose(cli, &format!("Using config: {}", cfg.path().display()));
    Ok(Jptts::new(cfg.jptts))
}

/// Requires the output path to be provided.
pub fn require_output(cli: &Cli) -> anyhow::Result<&str> {
    cli.output
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("output file is required, use -o flag"))
}

/// Outputs result as JSON or YAML.
pub fn output_result<T: serde::Serialize + ?Sized>(result: &T, output_path: Option<&str>, as_json: bool) -> anyhow::Result<()> {
    let format = if as_json { OutputFormat::Json } else { OutputFormat::Yaml };
    Output::new(format, output_path.map(str::to_string)).write(result)
}

/// Prints verbose output if enabled.
pub fn print_verbose(cli: &Cli, msg: &str) {
    jptts_cli::print_verbose(cli.verbose, msg);
}

/// Prints success message.
pub fn print_success(msg: &str) {
    eprintln!("\x1b[32m✓\x1b[0m {}", msg);
}

/// Formats bytes as human-readable string.
pub fn format_bytes(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Path of the `index`-th (1-based) chunk written by `stream`.
pub fn chunk_path(prefix: &str, index: usize) -> String {
    format!("{prefix}_{index:03}.wav")
}
