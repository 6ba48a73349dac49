//! Top-faces command - original faces hit first by the rainfall grid.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Serialize;
use skullmap_mesh::io::{load_mesh, write_stl};
use skullmap_thickness::{build_index, inflate_faces, select_top_faces, TOP_FACE_BAND};
use tracing::info;

use super::{load_params, progress, resolve_dims};
use crate::{output, Cli, OutputFormat};

#[derive(Serialize)]
struct TopFacesReport<'a> {
    input: &'a Path,
    output: &'a Path,
    band: [f64; 2],
    selected: usize,
    written: usize,
    inflated: bool,
}

/// Parse the `--band` flag, defaulting to [`TOP_FACE_BAND`].
pub fn resolve_band(band: Option<&[f64]>) -> Result<[f64; 2]> {
    match band {
        None => Ok(TOP_FACE_BAND),
        Some(&[low, high]) if low < high => Ok([low, high]),
        Some(&[low, high]) => bail!("--band low ({low}) must be below high ({high})"),
        Some(other) => bail!("--band takes 2 values, got {}", other.len()),
    }
}

/// Run the top-faces command.
#[allow(clippy::too_many_arguments)]
pub fn run(
    input: &Path,
    output: &Path,
    dims: Option<&[u32]>,
    precision: Option<f64>,
    config: Option<&Path>,
    band: Option<&[f64]>,
    inflate: bool,
    cli: &Cli,
) -> Result<()> {
    let params = load_params(config, precision)?;
    let band = resolve_band(band)?;
    let mesh = load_mesh(input).with_context(|| format!("Failed to load mesh from {input:?}"))?;
    let dims = resolve_dims(dims, &mesh)?;

    let index = build_index(&mesh, &progress(cli)).context("Failed to index mesh")?;
    let selected = select_top_faces(&index, &dims, &params, band)
        .context("Top face selection failed")?;
    let faces = if inflate {
        inflate_faces(&mesh, &selected)
    } else {
        selected.clone()
    };
    if faces.is_empty() {
        bail!(
            "No faces hit within x in [{}, {}); check --dims and --band",
            band[0],
            band[1]
        );
    }

    let top = mesh.extract_faces(&faces);
    write_stl(output, &top).with_context(|| format!("Failed to write faces to {output:?}"))?;
    info!(
        selected = selected.len(),
        written = faces.len(),
        "wrote top faces to {:?}",
        output
    );

    match cli.format {
        OutputFormat::Text => {
            if !cli.quiet {
                println!("Top faces: {} selected, {} written", selected.len(), faces.len());
                println!("Output: {}", output.display());
            }
        }
        OutputFormat::Json => output::print(
            &TopFacesReport {
                input,
                output,
                band,
                selected: selected.len(),
                written: faces.len(),
                inflated: inflate,
            },
            cli.format,
            cli.quiet,
        ),
    }

    Ok(())
}
