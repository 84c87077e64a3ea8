use crate::math::{Point3, Vec3};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read mesh file: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
}

/// The arrays an OBJ-style file yields: positions, zero-based flattened
/// indices (one per corner), and one precomputed face normal per triangle.
#[derive(Debug, Default)]
pub struct ObjData {
    pub positions: Vec<Point3>,
    pub indices: Vec<u32>,
    pub normals: Vec<Vec3>,
}

/// Parses the `v x y z` / `f i0 i1 i2` subset of the OBJ format.
///
/// Face indices are 1-based in the file; `i/t/n` corner syntax is accepted
/// by taking the first slash-separated component. Comments and unsupported
/// keywords (`vt`, `vn`, `o`, `usemtl`, ...) are skipped. Face normals are
/// derived from the winding order after parsing.
pub fn parse_obj(reader: impl BufRead) -> Result<ObjData, LoadError> {
    let mut data = ObjData::default();

    for (line_idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = line_idx + 1;
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("v") => {
                let mut coords = [0.0f32; 3];
                for coord in &mut coords {
                    let token = tokens.next().ok_or_else(|| LoadError::Parse {
                        line: line_no,
                        message: "vertex needs three coordinates".into(),
                    })?;
                    *coord = token.parse().map_err(|_| LoadError::Parse {
                        line: line_no,
                        message: format!("bad vertex coordinate `{token}`"),
                    })?;
                }
                data.positions.push(Point3::new(coords[0], coords[1], coords[2]));
            }
            Some("f") => {
                for _ in 0..3 {
                    let token = tokens.next().ok_or_else(|| LoadError::Parse {
                        line: line_no,
                        message: "face needs three corners".into(),
                    })?;
                    let first = token.split('/').next().unwrap_or(token);
                    let index: i64 = first.parse().map_err(|_| LoadError::Parse {
                        line: line_no,
                        message: format!("bad face index `{token}`"),
                    })?;
                    if index < 1 || index as usize > data.positions.len() {
                        return Err(LoadError::Parse {
                            line: line_no,
                            message: format!("face index {index} out of range"),
                        });
                    }
                    data.indices.push((index - 1) as u32);
                }
            }
            // Comments and unsupported keywords.
            _ => {}
        }
    }

    for triple in data.indices.chunks_exact(3) {
        let v0 = data.positions[triple[0] as usize];
        let v1 = data.positions[triple[1] as usize];
        let v2 = data.positions[triple[2] as usize];
        data.normals.push((v1 - v0).cross(v2 - v0).normalized());
    }

    Ok(data)
}

pub fn load_obj(path: impl AsRef<Path>) -> Result<ObjData, LoadError> {
    let path = path.as_ref();
    let data = parse_obj(BufReader::new(File::open(path)?))?;
    info!(
        path = %path.display(),
        vertices = data.positions.len(),
        triangles = data.indices.len() / 3,
        "loaded mesh"
    );
    Ok(data)
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parses_vertices_and_faces() {
        let src = "\
# a single triangle
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 0.0 1.0 0.0
f 1 2 3
";
        let data = parse_obj(Cursor::new(src)).unwrap();
        assert_eq!(data.positions.len(), 3);
        assert_eq!(data.indices, vec![0, 1, 2]);
        assert_eq!(data.normals.len(), 1);
        assert!((data.normals[0] - Vec3::unit_z()).length() < 1e-6);
    }

    #[test]
    fn slash_corners_take_the_position_index() {
        let src = "\
v 0 0 0
v 1 0 0
v 0 1 0
vt 0.5 0.5
vn 0 0 1
f 1/1/1 2/1/1 3/1/1
";
        let data = parse_obj(Cursor::new(src)).unwrap();
        assert_eq!(data.indices, vec![0, 1, 2]);
    }

    #[test]
    fn unknown_keywords_are_skipped() {
        let src = "\
o cube
s off
usemtl stone
v 0 0 0
v 1 0 0
v 0 1 0
f 1 2 3
";
        let data = parse_obj(Cursor::new(src)).unwrap();
        assert_eq!(data.positions.len(), 3);
        assert_eq!(data.indices.len(), 3);
    }

    #[test]
    fn out_of_range_face_index_is_an_error() {
        let src = "v 0 0 0\nf 1 2 3\n";
        let err = parse_obj(Cursor::new(src)).unwrap_err();
        assert!(matches!(err, LoadError::Parse { line: 2, .. }));
    }

    #[test]
    fn malformed_vertex_is_an_error() {
        let src = "v 0 zero 0\n";
        let err = parse_obj(Cursor::new(src)).unwrap_err();
        assert!(matches!(err, LoadError::Parse { line: 1, .. }));
    }
}
