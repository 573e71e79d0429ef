use glam::Vec3;

use crate::occluder::params::{BoxTypeFlags, DebugFlags, GenerationParams};
use crate::occluder::voxel::{Cell, VoxelBox, VoxelGrid};
use crate::occluder::{DebugMesh, GenerationStats, OccluderGenerator, OccluderResult};

pub const DEFAULT_MAX_CELLS: usize = 2_000_000;

// Box corners: bit 0 selects max x, bit 1 max y, bit 2 max z.
const FACE_BOTTOM: [u16; 4] = [0, 1, 5, 4];
const FACE_TOP: [u16; 4] = [2, 6, 7, 3];
const FACES_SIDES: [[u16; 4]; 4] = [[0, 4, 6, 2], [1, 3, 7, 5], [0, 2, 3, 1], [4, 5, 7, 6]];
const FACES_DIAGONALS: [[u16; 4]; 2] = [[0, 5, 7, 2], [1, 4, 6, 3]];

fn box_faces(types: BoxTypeFlags) -> Vec<[u16; 4]> {
    let mut faces = Vec::with_capacity(6);
    if types.contains(BoxTypeFlags::REGULAR) {
        faces.push(FACE_BOTTOM);
        faces.push(FACE_TOP);
        faces.extend(FACES_SIDES);
        return faces;
    }
    if types.contains(BoxTypeFlags::TOP) {
        faces.push(FACE_TOP);
    }
    if types.contains(BoxTypeFlags::BOTTOM) {
        faces.push(FACE_BOTTOM);
    }
    if types.contains(BoxTypeFlags::SIDES) {
        faces.extend(FACES_SIDES);
    }
    if types.contains(BoxTypeFlags::DIAGONALS) {
        faces.extend(FACES_DIAGONALS);
    }
    faces
}

#[derive(Default)]
struct DebugMeshBuilder {
    mesh: DebugMesh,
    truncated: bool,
}

impl DebugMeshBuilder {
    fn push_box(&mut self, min: Vec3, max: Vec3, faces: &[[u16; 4]]) -> bool {
        if faces.is_empty() {
            return true;
        }
        let base = self.mesh.vertices.len();
        if base + 8 > u16::MAX as usize + 1 {
            self.truncated = true;
            return false;
        }

        self.mesh.vertices.extend((0..8).map(|i| {
            Vec3::new(
                if i & 1 != 0 { max.x } else { min.x },
                if i & 2 != 0 { max.y } else { min.y },
                if i & 4 != 0 { max.z } else { min.z },
            )
        }));

        let base = base as u16;
        for &[a, b, c, d] in faces {
            self.mesh
                .indices
                .extend([a, b, c, a, c, d].map(|i| base + i));
        }
        true
    }

    fn push_voxels(&mut self, grid: &VoxelGrid, cell: Cell, scale: f32) {
        let half = Vec3::splat(grid.voxel_size * 0.5 * scale);
        let faces = box_faces(BoxTypeFlags::REGULAR);
        for p in grid.positions(cell) {
            let center = grid.voxel_center(p);
            if !self.push_box(center - half, center + half, &faces) {
                break;
            }
        }
    }
}

/// Builds box occluders from the enclosed volume of a voxelized mesh.
pub struct VoxelOccluderGenerator {
    max_cells: usize,
}

impl Default for VoxelOccluderGenerator {
    fn default() -> Self {
        Self {
            max_cells: DEFAULT_MAX_CELLS,
        }
    }
}

impl VoxelOccluderGenerator {
    pub fn with_max_cells(max_cells: usize) -> Self {
        Self { max_cells }
    }
}

fn select_boxes(boxes: &[VoxelBox], inner: usize, fill: f32) -> &[VoxelBox] {
    let target = (fill.clamp(0.0, 1.0) * inner as f32).ceil() as u32;
    let mut covered = 0;
    let mut used = 0;
    while covered < target && used < boxes.len() {
        covered += boxes[used].volume();
        used += 1;
    }
    &boxes[..used]
}

impl OccluderGenerator for VoxelOccluderGenerator {
    fn generate(&mut self, params: &GenerationParams) -> OccluderResult {
        let config = &params.config;
        let Some(grid) = VoxelGrid::from_mesh(&params.mesh, config.voxel_size, self.max_cells)
        else {
            return OccluderResult::default();
        };

        let inner = grid.count(Cell::Inner);
        let boxes = grid.inner_boxes();
        let selected = select_boxes(&boxes, inner, config.fill_percentage);
        let covered: u32 = selected.iter().map(VoxelBox::volume).sum();

        let mut builder = DebugMeshBuilder::default();
        let debug = config.debug;

        if debug.flags.contains(DebugFlags::SHOW_RESULT) {
            let faces = box_faces(config.box_types);
            for b in selected {
                let (min, max) = grid.box_bounds(b);
                if !builder.push_box(min, max, &faces) {
                    break;
                }
            }
        }
        if debug.flags.contains(DebugFlags::SHOW_INNER) {
            builder.push_voxels(&grid, Cell::Inner, debug.voxel_scale);
        }
        if debug.flags.contains(DebugFlags::SHOW_SURFACE) {
            builder.push_voxels(&grid, Cell::Surface, debug.voxel_scale);
        }

        if builder.truncated {
            log::warn!(
                "Debug mesh truncated at {} vertices",
                builder.mesh.vertices.len()
            );
        }

        OccluderResult {
            debug_mesh: builder.mesh,
            stats: GenerationStats {
                grid_dims: grid.dims.to_array(),
                surface_voxels: grid.count(Cell::Surface),
                inner_voxels: inner,
                boxes_total: boxes.len(),
                boxes_used: selected.len(),
                coverage: if inner > 0 {
                    covered as f32 / inner as f32
                } else {
                    0.0
                },
                truncated: builder.truncated,
            },
        }
    }
}
