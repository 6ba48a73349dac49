//! Mesh file I/O: STL and OBJ input, binary STL and legacy VTK output.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use skullmap_math::{Point3, Vec3};
use tracing::{debug, info};

use crate::error::{MeshError, Result};
use crate::{QuadMesh, TriangleMesh};

/// Supported input mesh formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshFormat {
    /// Binary or ASCII STL.
    Stl,
    /// Wavefront OBJ.
    Obj,
}

impl MeshFormat {
    /// Detect format from file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .and_then(|ext| match ext.as_str() {
                "stl" => Some(MeshFormat::Stl),
                "obj" => Some(MeshFormat::Obj),
                _ => None,
            })
    }
}

/// Load a triangle mesh, detecting the format from the extension.
///
/// The result is validated: it has at least one face and every index is in
/// range.
pub fn load_mesh(path: &Path) -> Result<TriangleMesh> {
    let format = MeshFormat::from_path(path).ok_or_else(|| MeshError::UnsupportedFormat {
        extension: path.extension().and_then(|e| e.to_str()).map(String::from),
    })?;

    let mesh = match format {
        MeshFormat::Stl => load_stl(path)?,
        MeshFormat::Obj => load_obj(path)?,
    };

    mesh.validate()?;
    let bounds = mesh.bounds();
    info!(
        points = mesh.num_points(),
        faces = mesh.num_faces(),
        ?format,
        "loaded mesh from {:?}",
        path
    );
    debug!(
        "bounds: [{:.2}, {:.2}, {:.2}] to [{:.2}, {:.2}, {:.2}]",
        bounds.min.x, bounds.min.y, bounds.min.z, bounds.max.x, bounds.max.y, bounds.max.z
    );
    Ok(mesh)
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|source| MeshError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn create(path: &Path) -> Result<File> {
    File::create(path).map_err(|source| MeshError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn load_stl(path: &Path) -> Result<TriangleMesh> {
    let mut reader = BufReader::new(open(path)?);
    let stl = stl_io::read_stl(&mut reader).map_err(|e| MeshError::Parse {
        path: path.to_path_buf(),
        details: e.to_string(),
    })?;

    let mut mesh = TriangleMesh::with_capacity(stl.vertices.len(), stl.faces.len());
    for v in &stl.vertices {
        mesh.points
            .push(Point3::new(v.0[0] as f64, v.0[1] as f64, v.0[2] as f64));
    }
    for face in &stl.faces {
        let [a, b, c] = face.vertices;
        // Collapsed triangles carry no surface and only produce ambiguous hits.
        if a != b && b != c && a != c {
            mesh.faces.push([a as u32, b as u32, c as u32]);
        }
    }

    debug!(
        "STL: {} vertices, {} of {} triangles kept",
        mesh.num_points(),
        mesh.num_faces(),
        stl.faces.len()
    );
    Ok(mesh)
}

fn load_obj(path: &Path) -> Result<TriangleMesh> {
    let (models, _materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
    )
    .map_err(|e| MeshError::Parse {
        path: path.to_path_buf(),
        details: e.to_string(),
    })?;

    if models.is_empty() {
        return Err(MeshError::EmptyMesh("OBJ file contains no models".into()));
    }

    let mut mesh = TriangleMesh::new();
    for model in &models {
        let offset = mesh.points.len() as u32;
        let positions = &model.mesh.positions;
        for c in positions.chunks_exact(3) {
            mesh.points
                .push(Point3::new(c[0] as f64, c[1] as f64, c[2] as f64));
        }
        for c in model.mesh.indices.chunks_exact(3) {
            mesh.faces.push([c[0] + offset, c[1] + offset, c[2] + offset]);
        }
        debug!("OBJ model {:?}: {} positions", model.name, positions.len() / 3);
    }
    Ok(mesh)
}

/// Encode a triangle mesh as binary STL.
pub fn stl_bytes(mesh: &TriangleMesh) -> Vec<u8> {
    let num_triangles = mesh.num_faces();
    let mut data = Vec::with_capacity(84 + num_triangles * 50);

    let mut header = [b' '; 80];
    let label = b"skullmap STL export";
    header[..label.len()].copy_from_slice(label);
    data.extend_from_slice(&header);
    data.extend_from_slice(&(num_triangles as u32).to_le_bytes());

    for tri in mesh.triangles() {
        let n = tri.normal().unwrap_or_else(Vec3::z);
        for c in [n.x, n.y, n.z] {
            data.extend_from_slice(&(c as f32).to_le_bytes());
        }
        for v in [tri.v0, tri.v1, tri.v2] {
            for c in [v.x, v.y, v.z] {
                data.extend_from_slice(&(c as f32).to_le_bytes());
            }
        }
        // Attribute byte count
        data.extend_from_slice(&[0u8, 0u8]);
    }

    data
}

/// Write a triangle mesh as binary STL.
pub fn write_stl(path: &Path, mesh: &TriangleMesh) -> Result<()> {
    let mut file = create(path)?;
    file.write_all(&stl_bytes(mesh))
        .map_err(|source| MeshError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    info!(faces = mesh.num_faces(), "wrote STL to {:?}", path);
    Ok(())
}

/// Legacy VTK splits names on whitespace; `%20` is decoded by readers.
fn vtk_name(name: &str) -> String {
    name.replace(' ', "%20")
}

/// Encode a quad mesh as legacy ASCII VTK polydata.
///
/// Every attached scalar field becomes a `SCALARS` block. The active field is
/// written first so readers that pick the first block display it.
pub fn write_vtk_to<W: Write>(mut w: W, mesh: &QuadMesh) -> std::io::Result<()> {
    writeln!(w, "# vtk DataFile Version 3.0")?;
    writeln!(w, "skullmap top surface")?;
    writeln!(w, "ASCII")?;
    writeln!(w, "DATASET POLYDATA")?;
    writeln!(w, "POINTS {} double", mesh.num_points())?;
    for p in &mesh.points {
        writeln!(w, "{} {} {}", p.x, p.y, p.z)?;
    }
    writeln!(w, "POLYGONS {} {}", mesh.num_quads(), mesh.num_quads() * 5)?;
    for q in &mesh.quads {
        writeln!(w, "4 {} {} {} {}", q[0], q[1], q[2], q[3])?;
    }

    if mesh.point_data.is_empty() {
        return Ok(());
    }

    let mut fields: Vec<_> = mesh.point_data.iter().collect();
    if let Some(active) = mesh.active_scalars.as_deref() {
        fields.sort_by_key(|f| f.name != active);
    }

    writeln!(w, "POINT_DATA {}", mesh.num_points())?;
    for field in fields {
        writeln!(w, "SCALARS {} double 1", vtk_name(&field.name))?;
        writeln!(w, "LOOKUP_TABLE default")?;
        for v in &field.values {
            writeln!(w, "{v}")?;
        }
    }
    Ok(())
}

/// Write a quad mesh as legacy ASCII VTK polydata.
pub fn write_vtk(path: &Path, mesh: &QuadMesh) -> Result<()> {
    let mut writer = BufWriter::new(create(path)?);
    write_vtk_to(&mut writer, mesh)
        .and_then(|()| writer.flush())
        .map_err(|source| MeshError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    info!(
        points = mesh.num_points(),
        quads = mesh.num_quads(),
        fields = mesh.point_data.len(),
        "wrote VTK polydata to {:?}",
        path
    );
    Ok(())
}
