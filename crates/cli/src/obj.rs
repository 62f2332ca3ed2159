//! Wavefront OBJ export of an extracted surface.

use ferrofluid_core::{FerroError, IsoSurface};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Writes `mesh` as OBJ with per-vertex normals and 1-based `f v//vn` faces.
pub fn write_obj_to<W: Write>(mesh: &IsoSurface, mut out: W) -> io::Result<()> {
    writeln!(out, "# ferrofluid surface: {} vertices, {} triangles", mesh.vertex_count(), mesh.triangle_count())?;
    for p in &mesh.positions {
        writeln!(out, "v {} {} {}", p.x, p.y, p.z)?;
    }
    for n in &mesh.normals {
        writeln!(out, "vn {} {} {}", n.x, n.y, n.z)?;
    }
    for [a, b, c] in mesh.triangles() {
        let (a, b, c) = (a + 1, b + 1, c + 1);
        writeln!(out, "f {a}//{a} {b}//{b} {c}//{c}")?;
    }
    out.flush()
}

/// Writes `mesh` to the file at `path`.
///
/// Returns `FerroError::Io` if the file cannot be created or written.
pub fn write_obj(mesh: &IsoSurface, path: &Path) -> Result<(), FerroError> {
    let file = File::create(path).map_err(|e| FerroError::Io(format!("{}: {e}", path.display())))?;
    write_obj_to(mesh, BufWriter::new(file)).map_err(|e| FerroError::Io(format!("{}: {e}", path.display())))
}
