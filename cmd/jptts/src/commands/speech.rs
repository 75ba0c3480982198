//! Speech synthesis commands.

use std::pin::pin;

use clap::Args;
use futures::StreamExt;

use super::{chunk_path, create_client, format_bytes, output_result, print_success, print_verbose, require_output};
use crate::Cli;

/// Synthesize text into one audio file.
#[derive(Args)]
pub struct SayCommand {
    /// Backend name
    backend: String,
    /// Speaker id (see `jptts speakers`)
    speaker: String,
    /// Text to read
    text: String,
    /// Style id (default: the speaker's first style)
    #[arg(long)]
    style: Option<String>,
}

impl SayCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let output_path = require_output(cli)?;
        let client = create_client(cli)?;

        print_verbose(cli, &format!("Backend: {}", self.backend));
        print_verbose(cli, &format!("Text length: {} characters", self.text.chars().count()));

        let audio = client
            .synthesize(&self.text, &self.speaker, &self.backend, self.style.as_deref())
            .await?;
        audio.save_to_file(output_path).await?;

        print_success(&format!("Audio saved to {} ({})", output_path, format_bytes(audio.len())));
        Ok(())
    }
}

/// Synthesize text sentence by sentence into `<prefix>_001.wav`, ...
#[derive(Args)]
pub struct StreamCommand {
    /// Backend name
    backend: String,
    /// Speaker id (see `jptts speakers`)
    speaker: String,
    /// Text to read
    text: String,
    /// Style id (default: the speaker's first style)
    #[arg(long)]
    style: Option<String>,
}

impl StreamCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let prefix = require_output(cli)?;
        let client = create_client(cli)?;

        let stream = client
            .synthesize_stream(&self.text, &self.speaker, &self.backend, self.style.as_deref())
            .await?;
        let mut stream = pin!(stream);

        let mut written = Vec::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            let path = chunk_path(prefix, written.len() + 1);
            chunk.save_to_file(&path).await?;
            print_verbose(cli, &format!("{}: {}", path, chunk.text().unwrap_or_default()));

            written.push(serde_json::json!({
                "file": path,
                "text": chunk.text(),
                "size": chunk.len(),
            }));
        }

        print_success(&format!("{} chunks written", written.len()));
        output_result(&written, None, cli.json)
    }
}
