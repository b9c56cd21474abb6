use super::{CommandState, CommandType, UndoableCommand};
use crate::document::DocumentCommandFacade;
use crate::error::Result;
use std::any::Any;

/// The document-specific part of a [`DocumentCommand`]
pub trait DocumentOperation: 'static {
    fn command_type(&self) -> CommandType;

    fn name(&self) -> &str;

    fn perform_do(&mut self, document: &mut dyn DocumentCommandFacade) -> Result<bool>;

    fn perform_undo(&mut self, document: &mut dyn DocumentCommandFacade) -> Result<bool>;

    fn is_repeat_delimiter(&self) -> bool {
        false
    }

    fn is_repeatable(&self, document: &dyn DocumentCommandFacade) -> bool;

    fn repeat(&self, _document: &dyn DocumentCommandFacade) -> Option<Self>
    where
        Self: Sized,
    {
        None
    }

    fn collate_with(&mut self, other: &Self) -> bool
    where
        Self: Sized;
}

/// A command that keeps the document's modification count in step
///
/// Doing the command adds its modification count to the document and
/// undoing subtracts it again. Collated commands sum their counts so a
/// single undo balances every merged change.
pub struct DocumentCommand<O> {
    operation: O,
    state: CommandState,
    modification_count: usize,
}

impl<O: DocumentOperation> DocumentCommand<O> {
    pub fn new(operation: O) -> Self {
        Self {
            operation,
            state: CommandState::Default,
            modification_count: 1,
        }
    }

    pub fn operation(&self) -> &O {
        &self.operation
    }
}

impl<O: DocumentOperation> UndoableCommand for DocumentCommand<O> {
    fn command_type(&self) -> CommandType {
        self.operation.command_type()
    }

    fn name(&self) -> &str {
        self.operation.name()
    }

    fn state(&self) -> CommandState {
        self.state
    }

    fn perform_do(&mut self, document: &mut dyn DocumentCommandFacade) -> Result<bool> {
        self.state = CommandState::Doing;
        match self.operation.perform_do(document) {
            Ok(true) => {
                self.state = CommandState::Done;
                document.inc_modification_count(self.modification_count);
                Ok(true)
            }
            other => {
                self.state = CommandState::Default;
                other
            }
        }
    }

    fn perform_undo(&mut self, document: &mut dyn DocumentCommandFacade) -> Result<bool> {
        self.state = CommandState::Undoing;
        match self.operation.perform_undo(document) {
            Ok(true) => {
                self.state = CommandState::Default;
                document.dec_modification_count(self.modification_count);
                Ok(true)
            }
            other => {
                self.state = CommandState::Done;
                other
            }
        }
    }

    fn is_repeat_delimiter(&self) -> bool {
        self.operation.is_repeat_delimiter()
    }

    fn is_repeatable(&self, document: &dyn DocumentCommandFacade) -> bool {
        self.operation.is_repeatable(document)
    }

    fn repeat(&self, document: &dyn DocumentCommandFacade) -> Option<Box<dyn UndoableCommand>> {
        self.operation
            .repeat(document)
            .map(|operation| Box::new(DocumentCommand::new(operation)) as Box<dyn UndoableCommand>)
    }

    fn collate_with(&mut self, other: &mut dyn UndoableCommand) -> bool {
        if other.command_type() != self.command_type() {
            return false;
        }
        let Some(other) = other.as_any_mut().downcast_mut::<Self>() else {
            return false;
        };
        if self.operation.collate_with(&other.operation) {
            self.modification_count += other.modification_count;
            true
        } else {
            false
        }
    }

    fn modification_count(&self) -> usize {
        self.modification_count
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
