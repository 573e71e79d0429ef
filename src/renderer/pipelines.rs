use glam::Vec3;

use crate::mesh::RenderVertex;

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// The two geometry streams drawn every frame. The source mesh is drawn
/// unindexed, the occluder with 16-bit indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryStream {
    Mesh,
    Occluder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepthMode {
    /// Compare always, no depth writes.
    Overlay,
    /// Compare less-equal, depth writes on.
    Tested,
}

impl DepthMode {
    pub fn from_toggle(depth_test: bool) -> Self {
        if depth_test {
            DepthMode::Tested
        } else {
            DepthMode::Overlay
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineKey {
    pub stream: GeometryStream,
    pub depth: DepthMode,
}

impl PipelineKey {
    pub const ALL: [PipelineKey; 4] = [
        PipelineKey {
            stream: GeometryStream::Mesh,
            depth: DepthMode::Overlay,
        },
        PipelineKey {
            stream: GeometryStream::Mesh,
            depth: DepthMode::Tested,
        },
        PipelineKey {
            stream: GeometryStream::Occluder,
            depth: DepthMode::Overlay,
        },
        PipelineKey {
            stream: GeometryStream::Occluder,
            depth: DepthMode::Tested,
        },
    ];

    /// Keys for the mesh and occluder draws under the given depth toggle.
    pub fn select(depth_test: bool) -> (PipelineKey, PipelineKey) {
        let depth = DepthMode::from_toggle(depth_test);
        (
            PipelineKey {
                stream: GeometryStream::Mesh,
                depth,
            },
            PipelineKey {
                stream: GeometryStream::Occluder,
                depth,
            },
        )
    }

    fn slot(self) -> usize {
        let stream = match self.stream {
            GeometryStream::Mesh => 0,
            GeometryStream::Occluder => 2,
        };
        let depth = match self.depth {
            DepthMode::Overlay => 0,
            DepthMode::Tested => 1,
        };
        stream + depth
    }
}

/// All pipeline variants, built once up front. Lookups never build anything.
pub struct PipelineSet<P> {
    variants: [P; 4],
}

impl<P> PipelineSet<P> {
    pub fn build(create: impl FnMut(PipelineKey) -> P) -> Self {
        Self {
            variants: PipelineKey::ALL.map(create),
        }
    }

    pub fn get(&self, key: PipelineKey) -> &P {
        &self.variants[key.slot()]
    }
}

fn mesh_vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<RenderVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x3,
            },
        ],
    }
}

fn occluder_vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vec3>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[wgpu::VertexAttribute {
            offset: 0,
            shader_location: 0,
            format: wgpu::VertexFormat::Float32x3,
        }],
    }
}

fn depth_state(mode: DepthMode) -> wgpu::DepthStencilState {
    let (depth_write_enabled, depth_compare) = match mode {
        DepthMode::Overlay => (false, wgpu::CompareFunction::Always),
        DepthMode::Tested => (true, wgpu::CompareFunction::LessEqual),
    };
    wgpu::DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled,
        depth_compare,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

pub fn create_pipeline_set(
    device: &wgpu::Device,
    color_format: wgpu::TextureFormat,
    uniform_layout: &wgpu::BindGroupLayout,
) -> PipelineSet<wgpu::RenderPipeline> {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Viewer Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("shaders.wgsl").into()),
    });

    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Viewer Pipeline Layout"),
        bind_group_layouts: &[uniform_layout],
        push_constant_ranges: &[],
    });

    PipelineSet::build(|key| {
        let (label, vs, fs, vertex_layout) = match key.stream {
            GeometryStream::Mesh => ("Mesh Pipeline", "vs_mesh", "fs_mesh", mesh_vertex_layout()),
            GeometryStream::Occluder => (
                "Occluder Pipeline",
                "vs_occluder",
                "fs_occluder",
                occluder_vertex_layout(),
            ),
        };
        log::debug!("Building {} ({:?})", label, key.depth);

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some(vs),
                buffers: &[vertex_layout],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some(fs),
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(depth_state(key.depth)),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_key_maps_to_its_own_variant() {
        let set = PipelineSet::build(|key| key);
        for key in PipelineKey::ALL {
            assert_eq!(*set.get(key), key);
        }
    }

    #[test]
    fn build_runs_once_per_variant() {
        let mut built = 0;
        let _set = PipelineSet::build(|_| built += 1);
        assert_eq!(built, 4);
    }

    #[test]
    fn toggle_selects_depth_mode_for_both_streams() {
        let (mesh, occluder) = PipelineKey::select(true);
        assert_eq!(mesh.stream, GeometryStream::Mesh);
        assert_eq!(occluder.stream, GeometryStream::Occluder);
        assert_eq!(mesh.depth, DepthMode::Tested);
        assert_eq!(occluder.depth, DepthMode::Tested);

        let (mesh, occluder) = PipelineKey::select(false);
        assert_eq!(mesh.depth, DepthMode::Overlay);
        assert_eq!(occluder.depth, DepthMode::Overlay);
    }

    #[test]
    fn overlay_never_writes_depth() {
        let overlay = depth_state(DepthMode::Overlay);
        assert!(!overlay.depth_write_enabled);
        assert_eq!(overlay.depth_compare, wgpu::CompareFunction::Always);

        let tested = depth_state(DepthMode::Tested);
        assert!(tested.depth_write_enabled);
        assert_eq!(tested.depth_compare, wgpu::CompareFunction::LessEqual);
    }
}
