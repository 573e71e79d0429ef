pub mod registry;
pub mod source;

pub use registry::{MODELS, ModelAsset, Placement, find_model, model_index};
pub use source::{RenderVertex, SourceMesh, parse_shapes, render_vertices};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_embedded_model_flattens_in_range() {
        for model in MODELS {
            let shapes = parse_shapes(model.source).unwrap();
            let mesh = SourceMesh::from_shapes(&shapes).unwrap();

            let count = mesh.vertices.len() as u32;
            assert!(mesh.indices.iter().all(|&i| i < count), "{}", model.id);
            assert_eq!(mesh.indices.len() % 3, 0, "{}", model.id);

            let expected: usize = shapes.iter().map(|s| s.indices.len()).sum();
            assert_eq!(render_vertices(&shapes, [1.0; 3]).len(), expected);
        }
    }

    #[test]
    fn column_is_made_of_three_shapes() {
        let column = find_model("column").unwrap();
        let shapes = parse_shapes(column.source).unwrap();
        let names: Vec<_> = shapes.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["base", "shaft", "capital"]);
    }
}
