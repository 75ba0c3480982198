//! Backend and speaker listing commands.

use clap::Args;

use super::{create_client, output_result, print_verbose};
use crate::Cli;

/// List the backends that answered at startup.
#[derive(Args)]
pub struct BackendsCommand;

impl BackendsCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let client = create_client(cli)?;
        let backends = client.list_available_backends().await;
        if backends.is_empty() {
            print_verbose(cli, "No backend is available");
        }
        output_result(&backends, cli.output.as_deref(), cli.json)
    }
}

/// List the speakers of a backend.
#[derive(Args)]
pub struct SpeakersCommand {
    /// Backend name
    backend: String,

    /// Fetch the list again instead of using the cache
    #[arg(long)]
    refresh: bool,
}

impl SpeakersCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let client = create_client(cli)?;
        let catalog = client.fetch_speakers(&self.backend, self.refresh).await?;
        print_verbose(cli, &format!("{} speakers on {}", catalog.len(), self.backend));
        output_result(catalog.speakers(), cli.output.as_deref(), cli.json)
    }
}
