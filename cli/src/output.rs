//! Output utilities for the jptts command.

use std::{fs::File, io::Write};

use serde::Serialize;

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// YAML format (default).
    #[default]
    Yaml,
    /// JSON format.
    Json,
}

/// Output configuration.
pub struct Output {
    pub format: OutputFormat,
    pub file: Option<String>,
}

impl Output {
    /// Creates a new output configuration.
    pub fn new(format: OutputFormat, file: Option<String>) -> Self {
        Self { format, file }
    }

    /// Renders `value` in the configured format.
    pub fn render<T: Serialize + ?Sized>(&self, value: &T) -> anyhow::Result<String> {
        Ok(match self.format {
            OutputFormat::Yaml => serde_yaml::to_string(value)?,
            OutputFormat::Json => serde_json::to_string_pretty(value)?,
        })
    }

    /// Outputs the result.
    pub fn write<T: Serialize + ?Sized>(&self, value: &T) -> anyhow::Result<()> {
        let output = self.render(value)?;

        match &self.file {
            Some(path) => {
                let mut file = File::create(path)?;
                file.write_all(output.as_bytes())?;
            }
            None => {
                println!("{}", output.trim_end());
            }
        }

        Ok(())
    }
}

/// Prints verbose output if enabled.
pub fn print_verbose(enabled: bool, message: &str) {
    if enabled {
        eprintln!("[verbose] {}", message);
    }
}
