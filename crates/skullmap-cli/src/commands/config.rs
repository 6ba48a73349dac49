//! Config command - print effective mapping parameters.

use std::path::Path;

use anyhow::{Context, Result};

use super::load_params;
use crate::{output, Cli, OutputFormat};

/// Run the config command.
pub fn run(config: Option<&Path>, cli: &Cli) -> Result<()> {
    let params = load_params(config, None)?;
    match cli.format {
        OutputFormat::Text => {
            let text = params
                .to_toml_string()
                .context("Failed to encode parameters as TOML")?;
            if !cli.quiet {
                print!("{text}");
            }
        }
        OutputFormat::Json => output::print(&params, cli.format, cli.quiet),
    }
    Ok(())
}
