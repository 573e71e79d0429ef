use std::sync::Arc;

use wgpu::util::DeviceExt;

use crate::error::DeviceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    Vertex,
    Index,
}

pub struct BufferDesc<'a> {
    pub label: &'a str,
    pub usage: BufferUsage,
    pub contents: &'a [u8],
}

/// The slice of the graphics device the viewer needs: immutable buffers
/// initialised from bytes. Dropping a `Buffer` releases it.
pub trait RenderDevice {
    type Buffer;

    fn create_buffer(&self, desc: &BufferDesc<'_>) -> Result<Self::Buffer, DeviceError>;
}

pub struct WgpuDevice {
    device: Arc<wgpu::Device>,
}

impl WgpuDevice {
    pub fn new(device: Arc<wgpu::Device>) -> Self {
        Self { device }
    }
}

impl RenderDevice for WgpuDevice {
    type Buffer = wgpu::Buffer;

    fn create_buffer(&self, desc: &BufferDesc<'_>) -> Result<wgpu::Buffer, DeviceError> {
        let usage = match desc.usage {
            BufferUsage::Vertex => wgpu::BufferUsages::VERTEX,
            BufferUsage::Index => wgpu::BufferUsages::INDEX,
        };

        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(desc.label),
                contents: desc.contents,
                usage,
            });

        let validation = pollster::block_on(self.device.pop_error_scope());
        let out_of_memory = pollster::block_on(self.device.pop_error_scope());

        if out_of_memory.is_some() {
            return Err(DeviceError::OutOfMemory);
        }
        if let Some(err) = validation {
            return Err(DeviceError::BufferCreation(format!("{}: {}", desc.label, err)));
        }

        log::debug!("Created {} ({} bytes)", desc.label, desc.contents.len());
        Ok(buffer)
    }
}

#[cfg(test)]
pub mod testing {
    use std::cell::{Cell, RefCell};
    use std::collections::BTreeSet;
    use std::rc::Rc;

    use super::*;

    /// Device double that hands out numbered buffers and tracks which ones
    /// are still alive.
    #[derive(Default)]
    pub struct RecordingDevice {
        next_id: Cell<u64>,
        live: Rc<RefCell<BTreeSet<u64>>>,
        fail_after: Cell<Option<u32>>,
    }

    #[derive(Debug)]
    pub struct RecordedBuffer {
        pub id: u64,
        pub usage: BufferUsage,
        pub len: usize,
        live: Rc<RefCell<BTreeSet<u64>>>,
    }

    impl Drop for RecordedBuffer {
        fn drop(&mut self) {
            self.live.borrow_mut().remove(&self.id);
        }
    }

    impl RecordingDevice {
        pub fn live_buffers(&self) -> Vec<u64> {
            self.live.borrow().iter().copied().collect()
        }

        pub fn is_live(&self, id: u64) -> bool {
            self.live.borrow().contains(&id)
        }

        pub fn fail_next_creation(&self) {
            self.fail_creation_after(0);
        }

        /// Lets `successes` more creations through, then fails one.
        pub fn fail_creation_after(&self, successes: u32) {
            self.fail_after.set(Some(successes));
        }
    }

    impl RenderDevice for RecordingDevice {
        type Buffer = RecordedBuffer;

        fn create_buffer(&self, desc: &BufferDesc<'_>) -> Result<RecordedBuffer, DeviceError> {
            match self.fail_after.get() {
                Some(0) => {
                    self.fail_after.set(None);
                    return Err(DeviceError::OutOfMemory);
                }
                Some(n) => self.fail_after.set(Some(n - 1)),
                None => {}
            }

            let id = self.next_id.get() + 1;
            self.next_id.set(id);
            self.live.borrow_mut().insert(id);

            Ok(RecordedBuffer {
                id,
                usage: desc.usage,
                len: desc.contents.len(),
                live: Rc::clone(&self.live),
            })
        }
    }
}
