//! Configuration management commands.

use std::time::Duration;

use clap::{Args, Subcommand};
use jptts::ServiceConfig;

use super::{get_config, output_result, print_success, print_verbose};
use crate::Cli;

/// Manage CLI configuration.
///
/// Configuration is stored in ~/.jptts/config.yaml
#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    command: ConfigSubcommand,
}

#[derive(Subcommand)]
enum ConfigSubcommand {
    /// View the current configuration (API keys masked)
    Show,
    /// Set options of a backend; unspecified options are kept
    Set {
        /// Backend name
        backend: String,
        /// API base URL
        #[arg(long)]
        base_url: Option<String>,
        /// API key
        #[arg(long)]
        api_key: Option<String>,
        /// Path to the engine executable
        #[arg(long)]
        exe_path: Option<String>,
        /// Timeout in milliseconds
        #[arg(long)]
        timeout: Option<u64>,
    },
    /// Remove the configuration of a backend
    Unset {
        /// Backend name
        backend: String,
    },
}

impl ConfigCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        match &self.command {
            ConfigSubcommand::Show => {
                let cfg = get_config(cli)?;
                print_verbose(cli, &format!("Config file: {}", cfg.path().display()));
                output_result(&cfg.masked(), cli.output.as_deref(), cli.json)
            }

            ConfigSubcommand::Set {
                backend,
                base_url,
                api_key,
                exe_path,
                timeout,
            } => {
                let mut update = ServiceConfig::default();
                if let Some(url) = base_url {
                    update = update.base_url(url);
                }
                if let Some(key) = api_key {
                    update = update.api_key(key);
                }
                if let Some(path) = exe_path {
                    update = update.exe_path(path);
                }
                if let Some(ms) = timeout {
                    update = update.timeout(Duration::from_millis(*ms));
                }

                let mut cfg = get_config(cli)?;
                let name = cfg.set_service(backend, update)?;
                print_success(&format!("Backend \"{}\" updated", name));
                Ok(())
            }

            ConfigSubcommand::Unset { backend } => {
                let mut cfg = get_config(cli)?;
                cfg.unset_service(backend)?;
                print_success(&format!("Backend \"{}\" removed", backend));
                Ok(())
            }
        }
    }
}
