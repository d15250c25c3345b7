//! Wavefront OBJ output.
//!
//! Vertices carry their color inline (`v x y z r g b`) and faces reference
//! a vertex and its normal by the same index (`f a//a b//b c//c`).

use super::{Mesh, MeshError};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Writes `mesh` as OBJ text.
pub fn write_obj<W: Write>(mesh: &Mesh, mut out: W) -> io::Result<()> {
    for (p, c) in mesh.positions().iter().zip(mesh.colors()) {
        writeln!(out, "v {} {} {} {} {} {}", p[0], p[1], p[2], c[0], c[1], c[2])?;
    }
    for n in mesh.normals() {
        writeln!(out, "vn {} {} {}", n[0], n[1], n[2])?;
    }
    for [a, b, c] in mesh.faces() {
        writeln!(out, "f {a}//{a} {b}//{b} {c}//{c}")?;
    }
    out.flush()
}

/// Writes `mesh` to an OBJ file at `path`.
pub fn save_obj(mesh: &Mesh, path: impl AsRef<Path>) -> Result<(), MeshError> {
    let path = path.as_ref();
    let io_error = |source| MeshError::Write {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(io_error)?;
    write_obj(mesh, BufWriter::new(file)).map_err(io_error)?;

    tracing::debug!(
        path = %path.display(),
        vertices = mesh.vertex_count(),
        faces = mesh.face_count(),
        "Mesh written"
    );
    Ok(())
}
