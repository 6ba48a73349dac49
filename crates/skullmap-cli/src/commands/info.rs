//! Info command - mesh statistics.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use skullmap_mesh::io::load_mesh;
use skullmap_thickness::GridDimensions;

use crate::{output, Cli, OutputFormat};

#[derive(Serialize)]
struct MeshInfo {
    points: usize,
    faces: usize,
    bounds_min: [f64; 3],
    bounds_max: [f64; 3],
    enclosing_dims: GridDimensions,
}

/// Run the info command.
pub fn run(input: &Path, cli: &Cli) -> Result<()> {
    let mesh = load_mesh(input).with_context(|| format!("Failed to load mesh from {input:?}"))?;
    let bounds = mesh.bounds();
    let info = MeshInfo {
        points: mesh.num_points(),
        faces: mesh.num_faces(),
        bounds_min: [bounds.min.x, bounds.min.y, bounds.min.z],
        bounds_max: [bounds.max.x, bounds.max.y, bounds.max.z],
        enclosing_dims: GridDimensions::enclosing(&bounds),
    };

    match cli.format {
        OutputFormat::Text => {
            if !cli.quiet {
                println!("Mesh: {}", input.display());
                println!("  Points: {}", info.points);
                println!("  Faces: {}", info.faces);
                println!(
                    "  Bounds: [{:.3}, {:.3}, {:.3}] to [{:.3}, {:.3}, {:.3}]",
                    info.bounds_min[0],
                    info.bounds_min[1],
                    info.bounds_min[2],
                    info.bounds_max[0],
                    info.bounds_max[1],
                    info.bounds_max[2]
                );
                let dims = info.enclosing_dims;
                println!(
                    "  Enclosing grid: {} x {} x {}",
                    dims.depth, dims.width, dims.height
                );
            }
        }
        OutputFormat::Json => output::print(&info, cli.format, cli.quiet),
    }

    Ok(())
}
