use glam::Vec3;

use crate::error::LoadError;

/// One object from a parsed OBJ file: flat `xyz` positions and triangle
/// indices into those positions.
#[derive(Debug, Clone)]
pub struct Shape {
    pub name: String,
    pub positions: Vec<f32>,
    pub indices: Vec<u32>,
}

impl Shape {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    fn position(&self, index: u32) -> Option<[f32; 3]> {
        let start = index as usize * 3;
        self.positions
            .get(start..start + 3)
            .map(|p| [p[0], p[1], p[2]])
    }
}

pub fn parse_shapes(text: &str) -> Result<Vec<Shape>, LoadError> {
    let load_opts = tobj::LoadOptions {
        triangulate: true,
        ..Default::default()
    };

    let (models, _materials) = tobj::load_obj_buf(&mut text.as_bytes(), &load_opts, |_| {
        Ok((Vec::new(), Default::default()))
    })
    .map_err(|e| LoadError::ParseFailed(e.to_string()))?;

    // tobj yields an empty default shape for text without faces.
    if models.iter().all(|m| m.mesh.positions.is_empty()) {
        return Err(LoadError::ParseFailed("no vertices in mesh".into()));
    }

    Ok(models
        .into_iter()
        .map(|m| Shape {
            name: m.name,
            positions: m.mesh.positions,
            indices: m.mesh.indices,
        })
        .collect())
}

/// Indexed triangle mesh in the layout the occluder generator consumes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceMesh {
    pub vertices: Vec<Vec3>,
    pub indices: Vec<u32>,
}

impl SourceMesh {
    /// Concatenates all shapes. Indices of later shapes are rebased onto the
    /// concatenated vertex list.
    pub fn from_shapes(shapes: &[Shape]) -> Result<Self, LoadError> {
        let mut mesh = SourceMesh::default();

        for shape in shapes {
            let base = mesh.vertices.len() as u32;
            let count = shape.vertex_count() as u32;

            if let Some(&bad) = shape.indices.iter().find(|&&i| i >= count) {
                return Err(LoadError::ParseFailed(format!(
                    "shape '{}' references vertex {} of {}",
                    shape.name, bad, count
                )));
            }

            mesh.vertices.extend(
                shape
                    .positions
                    .chunks_exact(3)
                    .map(|p| Vec3::new(p[0], p[1], p[2])),
            );
            mesh.indices.extend(shape.indices.iter().map(|&i| base + i));
        }

        if mesh.vertices.is_empty() {
            return Err(LoadError::ParseFailed("mesh has no vertices".into()));
        }

        Ok(mesh)
    }

    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| {
            [
                self.vertices[t[0] as usize],
                self.vertices[t[1] as usize],
                self.vertices[t[2] as usize],
            ]
        })
    }

    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let first = *self.vertices.first()?;
        Some(
            self.vertices
                .iter()
                .fold((first, first), |(min, max), &v| (min.min(v), max.max(v))),
        )
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct RenderVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

/// Expands every face-vertex into its own vertex so the mesh can be drawn
/// without an index buffer.
pub fn render_vertices(shapes: &[Shape], tint: [f32; 3]) -> Vec<RenderVertex> {
    let total: usize = shapes.iter().map(|s| s.indices.len()).sum();
    let mut vertices = Vec::with_capacity(total);

    for shape in shapes {
        for &index in &shape.indices {
            if let Some(position) = shape.position(index) {
                vertices.push(RenderVertex {
                    position,
                    color: tint,
                });
            }
        }
    }

    vertices
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_TRIANGLES: &str = "\
o first
v 0 0 0
v 1 0 0
v 0 1 0
f 1 2 3
o second
v 0 0 1
v 1 0 1
v 0 1 1
f 4 5 6
";

    #[test]
    fn parse_rejects_text_without_geometry() {
        for text in ["", "hello world\n", "v 0 0 0\n"] {
            assert!(
                matches!(parse_shapes(text), Err(LoadError::ParseFailed(_))),
                "{:?}",
                text
            );
        }
    }

    #[test]
    fn parse_splits_objects_into_shapes() {
        let shapes = parse_shapes(TWO_TRIANGLES).unwrap();
        assert_eq!(shapes.len(), 2);
        assert_eq!(shapes[0].indices, vec![0, 1, 2]);
        assert_eq!(shapes[1].vertex_count(), 3);
    }

    #[test]
    fn flatten_rebases_later_shapes() {
        let shapes = parse_shapes(TWO_TRIANGLES).unwrap();
        let mesh = SourceMesh::from_shapes(&shapes).unwrap();

        assert_eq!(mesh.vertices.len(), 6);
        assert_eq!(mesh.indices, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(mesh.vertices[3], Vec3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn flatten_rejects_out_of_range_index() {
        let shape = Shape {
            name: "broken".into(),
            positions: vec![0.0; 9],
            indices: vec![0, 1, 3],
        };
        assert!(matches!(
            SourceMesh::from_shapes(&[shape]),
            Err(LoadError::ParseFailed(_))
        ));
    }

    #[test]
    fn flatten_rejects_mesh_without_vertices() {
        let shape = Shape {
            name: "empty".into(),
            positions: Vec::new(),
            indices: Vec::new(),
        };
        assert!(SourceMesh::from_shapes(&[shape]).is_err());
    }

    #[test]
    fn render_vertices_duplicate_every_face_vertex() {
        let shapes = parse_shapes("v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n").unwrap();
        let tint = [1.0, 0.5, 0.5];
        let vertices = render_vertices(&shapes, tint);

        assert_eq!(vertices.len(), 6);
        assert!(vertices.iter().all(|v| v.color == tint));
        assert_eq!(vertices[0].position, vertices[3].position);
    }

    #[test]
    fn bounds_cover_all_vertices() {
        let shapes = parse_shapes(TWO_TRIANGLES).unwrap();
        let mesh = SourceMesh::from_shapes(&shapes).unwrap();
        let (min, max) = mesh.bounds().unwrap();
        assert_eq!(min, Vec3::ZERO);
        assert_eq!(max, Vec3::ONE);
        assert_eq!(mesh.triangles().count(), 2);
    }
}
