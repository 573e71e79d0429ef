pub mod buffers;
pub mod camera;
pub mod device;
pub mod gpu;
pub mod pipelines;

pub use device::WgpuDevice;
pub use gpu::GpuState;
