//! Subcommand implementations and the option handling they share.

pub mod config;
pub mod info;
pub mod map;
pub mod top_faces;

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use skullmap_mesh::TriangleMesh;
use skullmap_thickness::{GridDimensions, ThicknessParams};
use tracing::{debug, info};

use crate::{output, Cli};

/// Load parameters from an optional TOML file, then apply flag overrides.
pub fn load_params(config: Option<&Path>, precision: Option<f64>) -> Result<ThicknessParams> {
    let mut params = match config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {path:?}"))?;
            ThicknessParams::from_toml_str(&text)
                .with_context(|| format!("Invalid config in {path:?}"))?
        }
        None => ThicknessParams::default(),
    };
    if let Some(precision) = precision {
        params.precision = precision;
    }
    params.validate().context("Invalid mapping parameters")?;
    Ok(params)
}

/// Grid dimensions from the `--dims` flag, or the grid enclosing the mesh.
pub fn resolve_dims(dims: Option<&[u32]>, mesh: &TriangleMesh) -> Result<GridDimensions> {
    let dims = match dims {
        Some(&[depth, width, height]) => GridDimensions::new(depth, width, height),
        Some(other) => bail!("--dims takes 3 values, got {}", other.len()),
        None => {
            let dims = GridDimensions::enclosing(&mesh.bounds());
            info!(
                depth = dims.depth,
                width = dims.width,
                height = dims.height,
                "no --dims given, using the grid enclosing the mesh"
            );
            dims
        }
    };
    dims.validate().context("Invalid grid dimensions")?;
    Ok(dims)
}

/// Status observer forwarding pipeline messages to stderr.
///
/// Messages are shown unless `--quiet` or JSON output is selected; percentages
/// go to the debug log.
pub fn progress(cli: &Cli) -> impl Fn(Option<&str>, Option<u32>) + '_ {
    move |message: Option<&str>, percent: Option<u32>| {
        if let Some(message) = message {
            output::status(message, cli.format, cli.quiet);
        }
        if let Some(percent) = percent {
            debug!(percent, "progress");
        }
    }
}
