//! GPU buffer objects
//!
//! A [`Vbo`] is a fixed-capacity buffer allocated through the
//! [`VboManager`], which keeps allocation statistics for diagnostics.

use crate::error::{RenderError, Result};
use crate::gl::{BufferId, BufferTarget, BufferUsage, GlRef};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, trace};

/// Allocation statistics kept by a [`VboManager`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VboStats {
    pub live_buffers: usize,
    pub live_bytes: usize,
    pub peak_buffers: usize,
}

/// A buffer object of fixed capacity, deleted on drop
pub struct Vbo {
    gl: GlRef,
    id: BufferId,
    target: BufferTarget,
    capacity: usize,
    stats: Rc<RefCell<VboStats>>,
}

impl Vbo {
    pub fn id(&self) -> BufferId {
        self.id
    }

    pub fn target(&self) -> BufferTarget {
        self.target
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Offset of this buffer's data block; always 0 since blocks are not shared
    pub fn offset(&self) -> usize {
        0
    }

    pub fn bind(&self) {
        self.gl.bind_buffer(self.target, Some(self.id));
    }

    pub fn unbind(&self) {
        self.gl.bind_buffer(self.target, None);
    }

    /// Write `data` at `offset`; the buffer must be bound
    pub fn write(&self, offset: usize, data: &[u8]) -> Result<()> {
        if offset + data.len() > self.capacity {
            return Err(RenderError::BufferOverflow {
                offset,
                len: data.len(),
                capacity: self.capacity,
            });
        }
        trace!(id = self.id.get(), offset, len = data.len(), "Buffer write");
        self.gl.buffer_sub_data(self.target, offset, data);
        Ok(())
    }
}

impl Drop for Vbo {
    fn drop(&mut self) {
        self.gl.delete_buffer(self.id);
        let mut stats = self.stats.borrow_mut();
        stats.live_buffers = stats.live_buffers.saturating_sub(1);
        stats.live_bytes = stats.live_bytes.saturating_sub(self.capacity);
    }
}

impl std::fmt::Debug for Vbo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vbo")
            .field("id", &self.id)
            .field("target", &self.target)
            .field("capacity", &self.capacity)
            .finish()
    }
}

/// Allocates buffer objects and tracks how many are alive
pub struct VboManager {
    gl: GlRef,
    stats: Rc<RefCell<VboStats>>,
}

impl VboManager {
    pub fn new(gl: GlRef) -> Self {
        Self {
            gl,
            stats: Rc::new(RefCell::new(VboStats::default())),
        }
    }

    /// Allocate a buffer with room for `capacity` bytes
    pub fn allocate(
        &self,
        target: BufferTarget,
        usage: BufferUsage,
        capacity: usize,
    ) -> Result<Vbo> {
        let id = self.gl.create_buffer()?;
        self.gl.bind_buffer(target, Some(id));
        self.gl.buffer_data_size(target, capacity, usage);
        self.gl.bind_buffer(target, None);

        let mut stats = self.stats.borrow_mut();
        stats.live_buffers += 1;
        stats.live_bytes += capacity;
        stats.peak_buffers = stats.peak_buffers.max(stats.live_buffers);
        debug!(id = id.get(), ?target, capacity, "Allocated buffer");

        Ok(Vbo {
            gl: Rc::clone(&self.gl),
            id,
            target,
            capacity,
            stats: Rc::clone(&self.stats),
        })
    }

    pub fn stats(&self) -> VboStats {
        *self.stats.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gl::RecordingGl;

    #[test]
    fn test_allocate_and_drop_updates_stats() {
        let gl = Rc::new(RecordingGl::new());
        let manager = VboManager::new(gl.clone());
        let a = manager
            .allocate(BufferTarget::Array, BufferUsage::StaticDraw, 64)
            .unwrap();
        let b = manager
            .allocate(BufferTarget::ElementArray, BufferUsage::StaticDraw, 16)
            .unwrap();
        assert_eq!(manager.stats().live_buffers, 2);
        assert_eq!(manager.stats().live_bytes, 80);
        drop(a);
        assert_eq!(manager.stats().live_buffers, 1);
        assert_eq!(manager.stats().peak_buffers, 2);
        assert_eq!(gl.live_buffers(), 1);
        assert_eq!(b.offset(), 0);
    }

    #[test]
    fn test_write_is_bounds_checked() {
        let gl = Rc::new(RecordingGl::new());
        let manager = VboManager::new(gl.clone());
        let vbo = manager
            .allocate(BufferTarget::Array, BufferUsage::StaticDraw, 4)
            .unwrap();
        vbo.bind();
        vbo.write(0, &[1, 2, 3]).unwrap();
        let err = vbo.write(2, &[4, 5, 6]).unwrap_err();
        assert!(matches!(
            err,
            RenderError::BufferOverflow {
                offset: 2,
                len: 3,
                capacity: 4
            }
        ));
        assert_eq!(gl.buffer_data(vbo.id()), Some(vec![1, 2, 3, 0]));
    }
}
