//! Undoable commands and the processor that executes them
//!
//! Every change to a document goes through a command submitted to the
//! [`CommandProcessor`]. Commands know how to undo themselves, may merge
//! with the next command of the same kind (collation) and may produce a
//! copy of themselves to repeat on the current selection.

mod change_face_attributes;
mod document_command;
mod group;
mod processor;

pub use change_face_attributes::{ChangeFaceAttributes, ChangeFaceAttributesCommand, CHANGE_FACE_ATTRIBUTES};
pub use document_command::{DocumentCommand, DocumentOperation};
pub use group::{CommandGroup, COMMAND_GROUP};
pub use processor::CommandProcessor;

use crate::document::DocumentCommandFacade;
use crate::error::Result;
use std::any::Any;
use std::sync::atomic::{AtomicU32, Ordering};

/// Identifies a kind of command; only commands of the same kind collate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandType(u32);

static NEXT_COMMAND_TYPE: AtomicU32 = AtomicU32::new(1);

impl CommandType {
    /// A command type no other call has returned
    pub fn free_type() -> CommandType {
        CommandType(NEXT_COMMAND_TYPE.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommandState {
    #[default]
    Default,
    Doing,
    Done,
    Undoing,
}

pub trait UndoableCommand: Any {
    fn command_type(&self) -> CommandType;

    fn name(&self) -> &str;

    fn state(&self) -> CommandState;

    /// Apply the command; `Ok(false)` means nothing was changed
    fn perform_do(&mut self, document: &mut dyn DocumentCommandFacade) -> Result<bool>;

    fn perform_undo(&mut self, document: &mut dyn DocumentCommandFacade) -> Result<bool>;

    /// Whether this command ends the sequence of commands to repeat
    fn is_repeat_delimiter(&self) -> bool {
        false
    }

    fn is_repeatable(&self, document: &dyn DocumentCommandFacade) -> bool;

    /// A fresh command applying the same change to the current document
    fn repeat(&self, _document: &dyn DocumentCommandFacade) -> Option<Box<dyn UndoableCommand>> {
        None
    }

    /// Absorb `other`, which has already been performed
    ///
    /// On success `other` is discarded and this command undoes both.
    fn collate_with(&mut self, other: &mut dyn UndoableCommand) -> bool;

    /// Number of document modifications this command accounts for
    fn modification_count(&self) -> usize {
        0
    }

    fn as_any_mut(&mut self) -> &mut dyn Any;
}
