use glam::Vec3;

/// How a model is placed in the scene and the generator defaults it ships with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub scale: Vec3,
    pub translation: Vec3,
    pub voxel_size: f32,
    pub fill_percentage: f32,
}

pub struct ModelAsset {
    pub id: &'static str,
    pub description: &'static str,
    pub source: &'static str,
    pub placement: Placement,
}

pub const MODELS: &[ModelAsset] = &[
    ModelAsset {
        id: "cube",
        description: "Closed unit cube",
        source: include_str!("../../assets/cube.obj"),
        placement: Placement {
            scale: Vec3::new(1.0, 1.0, 1.0),
            translation: Vec3::new(0.0, 0.0, 0.0),
            voxel_size: 0.25,
            fill_percentage: 1.0,
        },
    },
    ModelAsset {
        id: "column",
        description: "Base, shaft and capital as separate objects",
        source: include_str!("../../assets/column.obj"),
        placement: Placement {
            scale: Vec3::new(0.6, 0.6, 0.6),
            translation: Vec3::new(0.0, 0.0, 0.0),
            voxel_size: 0.1,
            fill_percentage: 1.0,
        },
    },
    ModelAsset {
        id: "sphere",
        description: "UV sphere",
        source: include_str!("../../assets/sphere.obj"),
        placement: Placement {
            scale: Vec3::new(1.2, 1.2, 1.2),
            translation: Vec3::new(0.0, 0.0, 0.0),
            voxel_size: 0.15,
            fill_percentage: 0.9,
        },
    },
    ModelAsset {
        id: "torus",
        description: "Ring with a thick tube",
        source: include_str!("../../assets/torus.obj"),
        placement: Placement {
            scale: Vec3::new(1.0, 1.0, 1.0),
            translation: Vec3::new(0.0, 0.3, 0.0),
            voxel_size: 0.1,
            fill_percentage: 0.8,
        },
    },
];

pub fn find_model(id: &str) -> Option<&'static ModelAsset> {
    MODELS.iter().find(|m| m.id == id)
}

pub fn model_index(id: &str) -> Option<usize> {
    MODELS.iter().position(|m| m.id == id)
}
