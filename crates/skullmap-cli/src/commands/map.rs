//! Map command - top surface extraction plus thickness maps.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use skullmap_mesh::io::{load_mesh, write_vtk};
use skullmap_thickness::{map_thickness, GridDimensions, MapField, ThicknessSummary};
use tracing::info;

use super::{load_params, progress, resolve_dims};
use crate::{output, ActiveField, Cli, OutputFormat};

#[derive(Serialize)]
struct MapReport<'a> {
    input: &'a Path,
    output: &'a Path,
    dims: GridDimensions,
    precision: f64,
    active_field: &'static str,
    summary: &'a ThicknessSummary,
}

impl From<ActiveField> for MapField {
    fn from(field: ActiveField) -> Self {
        match field {
            ActiveField::Thickness => MapField::Thickness,
            ActiveField::Void => MapField::DistanceToFirstVoid,
        }
    }
}

/// Default output path: `<stem>_thickness.vtk` next to the input.
pub fn default_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("surface");
    input.with_file_name(format!("{stem}_thickness.vtk"))
}

/// Run the map command.
pub fn run(
    input: &Path,
    output: Option<&Path>,
    dims: Option<&[u32]>,
    precision: Option<f64>,
    config: Option<&Path>,
    active: ActiveField,
    cli: &Cli,
) -> Result<()> {
    let params = load_params(config, precision)?;
    let mesh = load_mesh(input).with_context(|| format!("Failed to load mesh from {input:?}"))?;
    let dims = resolve_dims(dims, &mesh)?;

    let mut result = map_thickness(&mesh, &dims, &params, &progress(cli))
        .context("Thickness mapping failed")?;

    let field = MapField::from(active);
    result
        .surface
        .mesh
        .set_active_scalars(field.field_name())
        .context("Failed to select the active field")?;

    let output_path = output.map(Path::to_path_buf).unwrap_or_else(|| default_output(input));
    write_vtk(&output_path, &result.surface.mesh)
        .with_context(|| format!("Failed to write surface to {output_path:?}"))?;
    info!(
        points = result.summary.points,
        quads = result.summary.quads,
        "wrote thickness map to {:?}",
        output_path
    );

    match cli.format {
        OutputFormat::Text => {
            if !cli.quiet {
                println!("{}", result.summary);
                println!("Output: {}", output_path.display());
            }
        }
        OutputFormat::Json => output::print(
            &MapReport {
                input,
                output: &output_path,
                dims,
                precision: params.precision,
                active_field: field.field_name(),
                summary: &result.summary,
            },
            cli.format,
            cli.quiet,
        ),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output() {
        assert_eq!(
            default_output(Path::new("/data/scans/skull_01.stl")),
            PathBuf::from("/data/scans/skull_01_thickness.vtk")
        );
        assert_eq!(
            default_output(Path::new("head.obj")),
            PathBuf::from("head_thickness.vtk")
        );
    }

    #[test]
    fn test_active_field_mapping() {
        assert_eq!(MapField::from(ActiveField::Thickness), MapField::Thickness);
        assert_eq!(
            MapField::from(ActiveField::Void),
            MapField::DistanceToFirstVoid
        );
    }
}
