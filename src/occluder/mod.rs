pub mod generator;
pub mod intersect;
pub mod params;
pub mod voxel;

use glam::Vec3;

pub use generator::VoxelOccluderGenerator;
pub use params::{
    BoxTypeFlags, DebugFlags, DebugSettings, GenerationConfig, GenerationParams, Parameter,
    ParameterLimits,
};

/// Visualisable generator output: positions plus a 16-bit triangle list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DebugMesh {
    pub vertices: Vec<Vec3>,
    pub indices: Vec<u16>,
}

impl DebugMesh {
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Checks that the indices form whole triangles over existing vertices.
    pub fn check(&self) -> Result<(), String> {
        if self.indices.len() % 3 != 0 {
            return Err(format!("{} indices do not form triangles", self.indices.len()));
        }
        let count = self.vertices.len();
        match self.indices.iter().find(|&&i| i as usize >= count) {
            Some(bad) => Err(format!("index {} out of range for {} vertices", bad, count)),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GenerationStats {
    pub grid_dims: [u32; 3],
    pub surface_voxels: usize,
    pub inner_voxels: usize,
    pub boxes_total: usize,
    pub boxes_used: usize,
    /// Fraction of inner voxels covered by the boxes in use.
    pub coverage: f32,
    pub truncated: bool,
}

#[derive(Debug, Clone, Default)]
pub struct OccluderResult {
    pub debug_mesh: DebugMesh,
    pub stats: GenerationStats,
}

/// Synchronous occluder generation. Runs to completion on the caller's thread.
pub trait OccluderGenerator {
    fn generate(&mut self, params: &GenerationParams) -> OccluderResult;
}

impl<F> OccluderGenerator for F
where
    F: FnMut(&GenerationParams) -> OccluderResult,
{
    fn generate(&mut self, params: &GenerationParams) -> OccluderResult {
        self(params)
    }
}
