use super::RenderState;
use crate::error::Result;
use crate::graphics::VboManager;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::trace;

/// Something that uploads vertex data and issues draw calls
pub trait Renderable {
    fn prepare_vertices(&mut self, vbos: &VboManager) -> Result<()>;
    fn render(&mut self, state: &mut RenderState<'_>) -> Result<()>;
}

enum Entry {
    Shared(Rc<RefCell<dyn Renderable>>),
    OneShot(Box<dyn Renderable>),
}

impl Entry {
    fn prepare_vertices(&mut self, vbos: &VboManager) -> Result<()> {
        match self {
            Self::Shared(r) => r.borrow_mut().prepare_vertices(vbos),
            Self::OneShot(r) => r.prepare_vertices(vbos),
        }
    }

    fn render(&mut self, state: &mut RenderState<'_>) -> Result<()> {
        match self {
            Self::Shared(r) => r.borrow_mut().render(state),
            Self::OneShot(r) => r.render(state),
        }
    }
}

/// Renderables collected for one frame
///
/// Rendering prepares every entry, then renders them in insertion order
/// and empties the batch.
#[derive(Default)]
pub struct RenderBatch {
    entries: Vec<Entry>,
}

impl RenderBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a renderable owned elsewhere that outlives this frame
    pub fn add(&mut self, renderable: Rc<RefCell<dyn Renderable>>) {
        self.entries.push(Entry::Shared(renderable));
    }

    /// Add a renderable that is dropped after this frame
    pub fn add_one_shot(&mut self, renderable: Box<dyn Renderable>) {
        self.entries.push(Entry::OneShot(renderable));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn render(&mut self, state: &mut RenderState<'_>) -> Result<()> {
        let mut entries = std::mem::take(&mut self.entries);
        trace!(count = entries.len(), "Rendering batch");
        let vbos = state.context().vbo_manager();
        for entry in &mut entries {
            entry.prepare_vertices(vbos)?;
        }
        for entry in &mut entries {
            entry.render(state)?;
        }
        Ok(())
    }
}
