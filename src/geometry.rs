//! Model ingestion: text geometry files into renderable vertex lists.
//!
//! The model format is line oriented. Every line starts with a tag:
//!
//! | Tag  | Payload                          | Meaning              |
//! |------|----------------------------------|----------------------|
//! | `v`  | `x y z`                          | position             |
//! | `vt` | `u v`                            | texture coordinate   |
//! | `vn` | `x y z`                          | normal               |
//! | `f`  | `p/t/n p/t/n p/t/n`              | triangle, 1-based    |
//!
//! Anything else (comments, groups, `usemtl`, smoothing groups, ...) is
//! ignored. Faces are expanded on the spot: each of the three references of
//! a face becomes one [`Vertex3d`], with no deduplication.
//!
//! # Quick Start
//!
//! ```
//! use vitrine::GeometryLoader;
//!
//! let source = "\
//! v 0 0 0
//! v 1 0 0
//! v 0 1 0
//! vt 0 0
//! vt 1 0
//! vt 0 1
//! vn 0 0 1
//! f 1/1/1 2/2/1 3/3/1
//! ";
//!
//! let geometry = GeometryLoader::from_source(source).build().unwrap();
//! assert_eq!(geometry.vertex_count(), 3);
//! ```
//!
//! # Error Handling
//!
//! A record that cannot be parsed (missing fields, non-numeric tokens) is
//! skipped with a warning and loading continues. A face that points at an
//! attribute that does not exist is a hard [`GeometryError::IndexOutOfBounds`]:
//! the loader never invents vertex data.

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::gpu::GpuContext;
use crate::material::Material;
use crate::mesh::{Mesh, Vertex3d};
use crate::texture::Texture;

/// Which attribute stream a face reference points into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Attribute {
    Position,
    TexCoord,
    Normal,
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attribute::Position => write!(f, "position"),
            Attribute::TexCoord => write!(f, "texture coordinate"),
            Attribute::Normal => write!(f, "normal"),
        }
    }
}

/// Errors that can occur when loading geometry.
#[derive(Debug, thiserror::Error)]
pub enum GeometryError {
    /// The model file could not be opened.
    #[error("failed to open model '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Reading from the underlying source failed midway.
    #[error("failed to read model data: {0}")]
    Io(#[from] std::io::Error),
    /// A face refers to an attribute that was never declared.
    #[error("line {line}: {attribute} index {index} is out of bounds ({available} available)")]
    IndexOutOfBounds {
        line: usize,
        attribute: Attribute,
        index: u32,
        available: usize,
    },
}

/// Raw geometry data before GPU upload.
///
/// Holds the expanded triangle list. Three consecutive vertices form one
/// triangle.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawGeometry {
    pub vertices: Vec<Vertex3d>,
}

impl RawGeometry {
    pub fn new(vertices: Vec<Vertex3d>) -> Self {
        Self { vertices }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Uploads this geometry to the GPU as a [`Mesh`].
    pub fn upload(&self, gpu: &GpuContext, label: &str) -> Mesh {
        Mesh::new(gpu, &self.vertices, label)
    }
}

/// One `p/t/n` triple of 1-based indices.
type FaceRef = [u32; 3];

struct Face {
    line: usize,
    refs: [FaceRef; 3],
}

/// Parses model text into an expanded triangle list.
///
/// `origin` names the source in diagnostics (usually the file path).
pub fn parse_model<R: BufRead>(reader: R, origin: &str) -> Result<RawGeometry, GeometryError> {
    let mut positions: Vec<[f32; 3]> = Vec::new();
    let mut tex_coords: Vec<[f32; 2]> = Vec::new();
    let mut normals: Vec<[f32; 3]> = Vec::new();
    let mut faces: Vec<Face> = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = idx + 1;
        let mut tokens = line.split_whitespace();

        let parsed = match tokens.next() {
            Some("v") => parse_floats::<3>(tokens).map(|p| positions.push(p)),
            Some("vt") => parse_floats::<2>(tokens).map(|t| tex_coords.push(t)),
            Some("vn") => parse_floats::<3>(tokens).map(|n| normals.push(n)),
            Some("f") => parse_face(tokens, origin, line_no).map(|refs| {
                faces.push(Face {
                    line: line_no,
                    refs,
                })
            }),
            _ => Some(()),
        };

        if parsed.is_none() {
            log::warn!(
                "{}:{}: skipping malformed record '{}'",
                origin,
                line_no,
                line.trim()
            );
        }
    }

    let mut vertices = Vec::with_capacity(faces.len() * 3);
    for face in &faces {
        for &[p, t, n] in &face.refs {
            vertices.push(Vertex3d::new(
                resolve(&positions, p, Attribute::Position, face.line)?,
                resolve(&tex_coords, t, Attribute::TexCoord, face.line)?,
                resolve(&normals, n, Attribute::Normal, face.line)?,
            ));
        }
    }

    log::debug!(
        "{}: {} positions, {} uvs, {} normals, {} triangles",
        origin,
        positions.len(),
        tex_coords.len(),
        normals.len(),
        faces.len()
    );

    Ok(RawGeometry::new(vertices))
}

/// Parses the first `N` tokens as floats; extra tokens are ignored.
fn parse_floats<'a, const N: usize>(mut tokens: impl Iterator<Item = &'a str>) -> Option<[f32; N]> {
    let mut out = [0.0; N];
    for slot in &mut out {
        *slot = tokens.next()?.parse().ok()?;
    }
    Some(out)
}

fn parse_face<'a>(
    tokens: impl Iterator<Item = &'a str>,
    origin: &str,
    line_no: usize,
) -> Option<[FaceRef; 3]> {
    let records: Vec<&str> = tokens.collect();
    if records.len() < 3 {
        return None;
    }
    if records.len() > 3 {
        log::warn!(
            "{}:{}: face has {} vertices, only the first 3 are used",
            origin,
            line_no,
            records.len()
        );
    }

    let mut refs = [[0; 3]; 3];
    for (slot, record) in refs.iter_mut().zip(&records) {
        *slot = parse_face_ref(record)?;
    }
    Some(refs)
}

fn parse_face_ref(record: &str) -> Option<FaceRef> {
    let mut parts = record.split('/');
    let mut out = [0; 3];
    for slot in &mut out {
        *slot = parts.next()?.parse().ok()?;
    }
    Some(out)
}

fn resolve<T: Copy>(
    items: &[T],
    index: u32,
    attribute: Attribute,
    line: usize,
) -> Result<T, GeometryError> {
    (index as usize)
        .checked_sub(1)
        .and_then(|i| items.get(i))
        .copied()
        .ok_or(GeometryError::IndexOutOfBounds {
            line,
            attribute,
            index,
            available: items.len(),
        })
}

/// Loads geometry from a file or in-memory text.
///
/// ```no_run
/// use vitrine::GeometryLoader;
///
/// let geometry = GeometryLoader::from_file("assets/models/cube.obj")
///     .build()
///     .unwrap();
/// println!("{} triangles", geometry.triangle_count());
/// ```
pub struct GeometryLoader {
    result: Result<RawGeometry, GeometryError>,
}

impl GeometryLoader {
    /// Load geometry from a file path.
    pub fn from_file(path: impl AsRef<Path>) -> Self {
        Self {
            result: Self::load_file(path.as_ref()),
        }
    }

    /// Parse geometry from in-memory text.
    pub fn from_source(source: &str) -> Self {
        Self {
            result: parse_model(source.as_bytes(), "<memory>"),
        }
    }

    pub fn build(self) -> Result<RawGeometry, GeometryError> {
        self.result
    }

    fn load_file(path: &Path) -> Result<RawGeometry, GeometryError> {
        let file = File::open(path).map_err(|source| GeometryError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        parse_model(BufReader::new(file), &path.display().to_string())
    }
}

/// Everything the geometry loader produces for one entity.
#[derive(Debug)]
pub struct LoadedModel {
    pub mesh: Mesh,
    pub material: Material,
    pub texture: Option<Texture>,
}

/// Loads the material, the model and the optional texture, uploading the
/// model and texture to the GPU.
///
/// Only a model failure is an error. A missing material keeps the defaults and
/// a texture that fails to decode is logged and dropped.
///
/// An empty `texture_path` means the entity has no texture.
pub fn load_model(
    gpu: &GpuContext,
    model_path: &Path,
    material_path: &Path,
    texture_path: &Path,
) -> Result<LoadedModel, GeometryError> {
    let material = Material::load(material_path);

    let geometry = GeometryLoader::from_file(model_path).build()?;
    if geometry.is_empty() {
        log::warn!("{}: model contains no faces", model_path.display());
    }

    let label = model_path.display().to_string();
    let mesh = geometry.upload(gpu, &label);

    let texture = if texture_path.as_os_str().is_empty() {
        None
    } else {
        match Texture::from_file(gpu, texture_path) {
            Ok(texture) => Some(texture),
            Err(e) => {
                log::error!(
                    "Failed to load texture '{}': {}",
                    texture_path.display(),
                    e
                );
                None
            }
        }
    };

    log::info!(
        "Loaded '{}' ({} vertices, texture: {})",
        label,
        mesh.vertex_count(),
        texture.is_some()
    );

    Ok(LoadedModel {
        mesh,
        material,
        texture,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIANGLE: &str = "\
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 0.0 1.0 0.0
vt 0.0 0.0
vt 1.0 0.0
vt 0.0 1.0
vn 0.0 0.0 1.0
vn 0.0 1.0 0.0
vn 1.0 0.0 0.0
f 1/1/1 2/2/2 3/3/3
";

    fn parse(source: &str) -> Result<RawGeometry, GeometryError> {
        parse_model(source.as_bytes(), "test")
    }

    #[test]
    fn single_triangle_emits_three_vertices() {
        let geom = parse(TRIANGLE).unwrap();
        assert_eq!(geom.vertex_count(), 3);
        assert_eq!(geom.triangle_count(), 1);

        assert_eq!(
            geom.vertices[0],
            Vertex3d::new([0.0, 0.0, 0.0], [0.0, 0.0], [0.0, 0.0, 1.0])
        );
        assert_eq!(
            geom.vertices[1],
            Vertex3d::new([1.0, 0.0, 0.0], [1.0, 0.0], [0.0, 1.0, 0.0])
        );
        assert_eq!(
            geom.vertices[2],
            Vertex3d::new([0.0, 1.0, 0.0], [0.0, 1.0], [1.0, 0.0, 0.0])
        );
    }

    #[test]
    fn index_streams_are_independent() {
        let source = "\
v 1 1 1
v 2 2 2
vt 0.25 0.75
vn 0 0 -1
f 2/1/1 1/1/1 2/1/1
";
        let geom = parse(source).unwrap();
        assert_eq!(geom.vertices[0].position, [2.0, 2.0, 2.0]);
        assert_eq!(geom.vertices[1].position, [1.0, 1.0, 1.0]);
        assert!(geom.vertices.iter().all(|v| v.uv == [0.25, 0.75]));
        assert!(geom.vertices.iter().all(|v| v.normal == [0.0, 0.0, -1.0]));
    }

    #[test]
    fn faces_may_precede_their_attributes() {
        let source = "\
f 1/1/1 2/1/1 3/1/1
v 0 0 0
v 1 0 0
v 0 1 0
vt 0 0
vn 0 0 1
";
        assert_eq!(parse(source).unwrap().vertex_count(), 3);
    }

    #[test]
    fn out_of_range_index_is_an_error() {
        let source = TRIANGLE.replace("f 1/1/1 2/2/2 3/3/3", "f 1/1/1 2/2/2 99/3/3");
        match parse(&source) {
            Err(GeometryError::IndexOutOfBounds {
                line,
                attribute,
                index,
                available,
            }) => {
                assert_eq!(line, 10);
                assert_eq!(attribute, Attribute::Position);
                assert_eq!(index, 99);
                assert_eq!(available, 3);
            }
            other => panic!("expected IndexOutOfBounds, got {:?}", other),
        }
    }

    #[test]
    fn zero_index_is_an_error() {
        let source = TRIANGLE.replace("f 1/1/1 2/2/2 3/3/3", "f 1/1/1 2/0/2 3/3/3");
        assert!(matches!(
            parse(&source),
            Err(GeometryError::IndexOutOfBounds {
                attribute: Attribute::TexCoord,
                index: 0,
                ..
            })
        ));
    }

    #[test]
    fn malformed_records_are_skipped() {
        // The broken `v` line must not shift the indices of later positions.
        let source = "\
v 0 0 0
v oops 1 2
v 1 0 0
v 0 1 0
vt 0 0
vn 0 0 1
f 1/1/1 2/1/1
f 1/1/1 2//1 3/1/1
f 1/1/1 2/1/1 3/1/1
";
        let geom = parse(source).unwrap();
        assert_eq!(geom.vertex_count(), 3);
        assert_eq!(geom.vertices[1].position, [1.0, 0.0, 0.0]);
        assert_eq!(geom.vertices[2].position, [0.0, 1.0, 0.0]);
    }

    #[test]
    fn unknown_tags_and_comments_are_ignored() {
        let source = format!("# exported\no Triangle\nusemtl Default\ns off\n\n{}", TRIANGLE);
        assert_eq!(parse(&source).unwrap().vertex_count(), 3);
    }

    #[test]
    fn extra_face_vertices_are_truncated() {
        let source = format!("{}f 1/1/1 2/2/2 3/3/3 1/1/1\n", TRIANGLE);
        assert_eq!(parse(&source).unwrap().vertex_count(), 6);
    }

    #[test]
    fn missing_file_reports_open_error() {
        let result = GeometryLoader::from_file("definitely/not/here.obj").build();
        assert!(matches!(result, Err(GeometryError::Open { .. })));
    }

    #[test]
    fn bundled_cube_is_twelve_triangles() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("assets/models/cube.obj");
        let geom = GeometryLoader::from_file(path).build().unwrap();
        assert_eq!(geom.triangle_count(), 12);
        assert!(
            geom.vertices
                .iter()
                .all(|v| v.position.iter().all(|c| c.abs() == 0.5))
        );
    }
}
