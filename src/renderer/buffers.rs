use crate::error::DeviceError;
use crate::mesh::RenderVertex;
use crate::occluder::DebugMesh;
use crate::renderer::device::{BufferDesc, BufferUsage, RenderDevice};

/// Owns at most one GPU resource. "Nothing uploaded yet" is `None`.
pub struct GpuSlot<T> {
    label: &'static str,
    current: Option<T>,
}

impl<T> GpuSlot<T> {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            current: None,
        }
    }

    pub fn get(&self) -> Option<&T> {
        self.current.as_ref()
    }

    /// Publishes `next`, then drops whatever was there before.
    pub fn replace(&mut self, next: T) {
        let previous = self.current.replace(next);
        if previous.is_some() {
            log::debug!("Replacing {}", self.label);
        }
        drop(previous);
    }

    /// Returns whether a resource was held.
    pub fn release(&mut self) -> bool {
        self.current.take().is_some()
    }
}

/// Source mesh buffer and its vertex count, always swapped together.
pub struct MeshGpu<B> {
    pub vertices: B,
    pub vertex_count: u32,
}

pub struct OccluderGpu<B> {
    pub vertices: B,
    pub indices: B,
    pub index_count: u32,
}

pub struct MeshBuffer<B> {
    slot: GpuSlot<MeshGpu<B>>,
}

impl<B> Default for MeshBuffer<B> {
    fn default() -> Self {
        Self {
            slot: GpuSlot::new("mesh buffer"),
        }
    }
}

impl<B> MeshBuffer<B> {
    pub fn upload<D>(&mut self, device: &D, vertices: &[RenderVertex]) -> Result<(), DeviceError>
    where
        D: RenderDevice<Buffer = B>,
    {
        let buffer = device.create_buffer(&BufferDesc {
            label: "mesh_vertex_buffer",
            usage: BufferUsage::Vertex,
            contents: bytemuck::cast_slice(vertices),
        })?;

        self.slot.replace(MeshGpu {
            vertices: buffer,
            vertex_count: vertices.len() as u32,
        });
        Ok(())
    }

    pub fn get(&self) -> Option<&MeshGpu<B>> {
        self.slot.get()
    }

    pub fn vertex_count(&self) -> u32 {
        self.get().map_or(0, |m| m.vertex_count)
    }

    pub fn release(&mut self) -> bool {
        self.slot.release()
    }
}

pub struct OccluderBuffer<B> {
    slot: GpuSlot<OccluderGpu<B>>,
}

impl<B> Default for OccluderBuffer<B> {
    fn default() -> Self {
        Self {
            slot: GpuSlot::new("occluder buffers"),
        }
    }
}

impl<B> OccluderBuffer<B> {
    /// Both buffers are created before either old one is dropped. If the
    /// index buffer fails, the fresh vertex buffer is discarded and the
    /// previous pair stays bound.
    pub fn upload<D>(&mut self, device: &D, mesh: &DebugMesh) -> Result<(), DeviceError>
    where
        D: RenderDevice<Buffer = B>,
    {
        let vertices = device.create_buffer(&BufferDesc {
            label: "occluder_position_buffer",
            usage: BufferUsage::Vertex,
            contents: bytemuck::cast_slice(&mesh.vertices),
        })?;
        let indices = device.create_buffer(&BufferDesc {
            label: "occluder_index_buffer",
            usage: BufferUsage::Index,
            contents: bytemuck::cast_slice(&mesh.indices),
        })?;

        self.slot.replace(OccluderGpu {
            vertices,
            indices,
            index_count: mesh.indices.len() as u32,
        });
        Ok(())
    }

    pub fn get(&self) -> Option<&OccluderGpu<B>> {
        self.slot.get()
    }

    pub fn index_count(&self) -> u32 {
        self.get().map_or(0, |o| o.index_count)
    }

    pub fn release(&mut self) -> bool {
        self.slot.release()
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::renderer::device::testing::RecordingDevice;

    fn triangle() -> DebugMesh {
        DebugMesh {
            vertices: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            indices: vec![0, 1, 2],
        }
    }

    fn vertices(n: usize) -> Vec<RenderVertex> {
        vec![
            RenderVertex {
                position: [0.0; 3],
                color: [1.0; 3],
            };
            n
        ]
    }

    #[test]
    fn slot_starts_empty() {
        let slot: GpuSlot<u32> = GpuSlot::new("test");
        assert!(slot.get().is_none());
    }

    #[test]
    fn mesh_upload_replaces_and_frees_previous() {
        let device = RecordingDevice::default();
        let mut mesh = MeshBuffer::default();

        mesh.upload(&device, &vertices(3)).unwrap();
        let first = mesh.get().unwrap().vertices.id;
        mesh.upload(&device, &vertices(6)).unwrap();
        let second = mesh.get().unwrap().vertices.id;

        assert_ne!(first, second);
        assert!(!device.is_live(first));
        assert!(device.is_live(second));
        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.get().unwrap().vertices.len, 6 * 24);
        assert_eq!(mesh.get().unwrap().vertices.usage, BufferUsage::Vertex);
    }

    #[test]
    fn failed_mesh_upload_keeps_previous_pair() {
        let device = RecordingDevice::default();
        let mut mesh = MeshBuffer::default();
        mesh.upload(&device, &vertices(3)).unwrap();
        let first = mesh.get().unwrap().vertices.id;

        device.fail_next_creation();
        assert_eq!(
            mesh.upload(&device, &vertices(9)),
            Err(DeviceError::OutOfMemory)
        );

        assert_eq!(mesh.get().unwrap().vertices.id, first);
        assert_eq!(mesh.vertex_count(), 3);
        assert!(device.is_live(first));
    }

    #[test]
    fn occluder_upload_keeps_old_pair_when_index_buffer_fails() {
        let device = RecordingDevice::default();
        let mut occluder = OccluderBuffer::default();
        occluder.upload(&device, &triangle()).unwrap();
        let before = occluder.get().map(|o| (o.vertices.id, o.indices.id));
        let uploaded = occluder.get().unwrap();
        assert_eq!(uploaded.vertices.usage, BufferUsage::Vertex);
        assert_eq!(uploaded.indices.usage, BufferUsage::Index);

        let quad = DebugMesh {
            vertices: vec![Vec3::ZERO; 4],
            indices: vec![0, 1, 2, 0, 2, 3],
        };
        device.fail_creation_after(1);
        assert_eq!(
            occluder.upload(&device, &quad),
            Err(DeviceError::OutOfMemory)
        );

        assert_eq!(occluder.get().map(|o| (o.vertices.id, o.indices.id)), before);
        assert_eq!(occluder.index_count(), 3);
        assert_eq!(device.live_buffers().len(), 2);
    }

    #[test]
    fn release_frees_everything() {
        let device = RecordingDevice::default();
        let mut mesh = MeshBuffer::default();
        let mut occluder = OccluderBuffer::default();
        mesh.upload(&device, &vertices(3)).unwrap();
        occluder.upload(&device, &triangle()).unwrap();
        assert_eq!(device.live_buffers().len(), 3);

        assert!(mesh.release());
        assert!(occluder.release());
        assert!(!occluder.release());
        assert!(device.live_buffers().is_empty());
        assert_eq!(mesh.vertex_count(), 0);
    }
}
