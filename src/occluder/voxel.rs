use glam::{UVec3, Vec3};

use crate::mesh::SourceMesh;
use crate::occluder::intersect::triangle_overlaps_box;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Outside,
    Surface,
    Inner,
}

/// Dense voxel grid over a mesh's bounds, padded by one empty layer on every
/// side so the outside region is connected.
pub struct VoxelGrid {
    pub origin: Vec3,
    pub voxel_size: f32,
    pub dims: UVec3,
    cells: Vec<Cell>,
}

/// Inclusive-exclusive voxel range `[min, max)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoxelBox {
    pub min: UVec3,
    pub max: UVec3,
}

impl VoxelBox {
    pub fn volume(&self) -> u32 {
        let size = self.max - self.min;
        size.x * size.y * size.z
    }
}

impl VoxelGrid {
    /// Returns `None` when the mesh is degenerate or the grid would exceed
    /// `max_cells`.
    pub fn from_mesh(mesh: &SourceMesh, voxel_size: f32, max_cells: usize) -> Option<Self> {
        if !(voxel_size > 0.0) {
            return None;
        }
        let (min, max) = mesh.bounds()?;

        // Mesh bounds land on voxel centers, never on a shared voxel face.
        let dims = ((max - min) / voxel_size + Vec3::splat(1.5))
            .floor()
            .as_uvec3()
            + UVec3::splat(2);
        let total = dims.x as usize * dims.y as usize * dims.z as usize;
        if total > max_cells {
            log::warn!(
                "Voxel grid {}x{}x{} exceeds budget of {} cells",
                dims.x,
                dims.y,
                dims.z,
                max_cells
            );
            return None;
        }

        let mut grid = Self {
            origin: min - Vec3::splat(voxel_size * 1.5),
            voxel_size,
            dims,
            cells: vec![Cell::Inner; total],
        };

        grid.mark_surface(mesh);
        grid.flood_outside();
        Some(grid)
    }

    pub fn get(&self, p: UVec3) -> Cell {
        self.cells[self.index(p)]
    }

    pub fn count(&self, cell: Cell) -> usize {
        self.cells.iter().filter(|&&c| c == cell).count()
    }

    pub fn voxel_center(&self, p: UVec3) -> Vec3 {
        self.origin + (p.as_vec3() + Vec3::splat(0.5)) * self.voxel_size
    }

    pub fn box_bounds(&self, b: &VoxelBox) -> (Vec3, Vec3) {
        (
            self.origin + b.min.as_vec3() * self.voxel_size,
            self.origin + b.max.as_vec3() * self.voxel_size,
        )
    }

    pub fn positions(&self, cell: Cell) -> impl Iterator<Item = UVec3> + '_ {
        self.iter_positions().filter(move |&p| self.get(p) == cell)
    }

    fn iter_positions(&self) -> impl Iterator<Item = UVec3> + use<> {
        let dims = self.dims;
        (0..dims.y).flat_map(move |y| {
            (0..dims.z).flat_map(move |z| (0..dims.x).map(move |x| UVec3::new(x, y, z)))
        })
    }

    fn index(&self, p: UVec3) -> usize {
        (p.y as usize * self.dims.z as usize + p.z as usize) * self.dims.x as usize + p.x as usize
    }

    fn cell_of(&self, point: Vec3) -> UVec3 {
        ((point - self.origin) / self.voxel_size)
            .floor()
            .max(Vec3::ZERO)
            .as_uvec3()
            .min(self.dims - UVec3::ONE)
    }

    fn mark_surface(&mut self, mesh: &SourceMesh) {
        let half = Vec3::splat(self.voxel_size * 0.5);

        for triangle in mesh.triangles() {
            let lo = self.cell_of(triangle[0].min(triangle[1]).min(triangle[2]));
            let hi = self.cell_of(triangle[0].max(triangle[1]).max(triangle[2]));

            for y in lo.y..=hi.y {
                for z in lo.z..=hi.z {
                    for x in lo.x..=hi.x {
                        let p = UVec3::new(x, y, z);
                        let i = self.index(p);
                        if self.cells[i] == Cell::Surface {
                            continue;
                        }
                        if triangle_overlaps_box(self.voxel_center(p), half, triangle) {
                            self.cells[i] = Cell::Surface;
                        }
                    }
                }
            }
        }
    }

    /// Marks everything reachable from the padded corner without crossing
    /// the surface as outside. What remains `Inner` is enclosed.
    fn flood_outside(&mut self) {
        let mut stack = vec![UVec3::ZERO];
        let start = self.index(UVec3::ZERO);
        self.cells[start] = Cell::Outside;

        while let Some(p) = stack.pop() {
            for n in self.neighbours(p) {
                let i = self.index(n);
                if self.cells[i] == Cell::Inner {
                    self.cells[i] = Cell::Outside;
                    stack.push(n);
                }
            }
        }
    }

    fn neighbours(&self, p: UVec3) -> impl Iterator<Item = UVec3> + use<> {
        let dims = self.dims;
        let candidates = [
            (p.x > 0).then(|| p - UVec3::X),
            (p.x + 1 < dims.x).then(|| p + UVec3::X),
            (p.y > 0).then(|| p - UVec3::Y),
            (p.y + 1 < dims.y).then(|| p + UVec3::Y),
            (p.z > 0).then(|| p - UVec3::Z),
            (p.z + 1 < dims.z).then(|| p + UVec3::Z),
        ];
        candidates.into_iter().flatten()
    }

    /// Greedily merges inner voxels into boxes, growing along x, then z,
    /// then y. Boxes are returned largest first.
    pub fn inner_boxes(&self) -> Vec<VoxelBox> {
        let mut taken = vec![false; self.cells.len()];
        let mut boxes = Vec::new();
        let free = |taken: &[bool], p: UVec3| {
            let i = self.index(p);
            self.cells[i] == Cell::Inner && !taken[i]
        };

        for start in self.iter_positions() {
            if !free(&taken, start) {
                continue;
            }

            let mut end = start + UVec3::ONE;
            while end.x < self.dims.x && free(&taken, UVec3::new(end.x, start.y, start.z)) {
                end.x += 1;
            }
            while end.z < self.dims.z
                && (start.x..end.x).all(|x| free(&taken, UVec3::new(x, start.y, end.z)))
            {
                end.z += 1;
            }
            while end.y < self.dims.y
                && (start.z..end.z)
                    .all(|z| (start.x..end.x).all(|x| free(&taken, UVec3::new(x, end.y, z))))
            {
                end.y += 1;
            }

            for y in start.y..end.y {
                for z in start.z..end.z {
                    for x in start.x..end.x {
                        let i = self.index(UVec3::new(x, y, z));
                        taken[i] = true;
                    }
                }
            }
            boxes.push(VoxelBox {
                min: start,
                max: end,
            });
        }

        boxes.sort_by(|a, b| b.volume().cmp(&a.volume()));
        boxes
    }
}
