use super::{CommandState, CommandType, UndoableCommand};
use crate::document::DocumentCommandFacade;
use crate::error::Result;
use once_cell::sync::Lazy;
use std::any::Any;
use tracing::warn;

pub static COMMAND_GROUP: Lazy<CommandType> = Lazy::new(CommandType::free_type);

/// Commands executed and undone as one step
pub struct CommandGroup {
    name: String,
    commands: Vec<Box<dyn UndoableCommand>>,
    state: CommandState,
}

impl CommandGroup {
    /// Group commands that have already been performed
    pub fn new(name: impl Into<String>, commands: Vec<Box<dyn UndoableCommand>>) -> Self {
        Self {
            name: name.into(),
            commands,
            state: CommandState::Done,
        }
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Undo the first `count` commands in reverse order
    fn undo_prefix(
        &mut self,
        count: usize,
        document: &mut dyn DocumentCommandFacade,
    ) -> Result<()> {
        for command in self.commands[..count].iter_mut().rev() {
            if !command.perform_undo(document)? {
                warn!(command = command.name(), "Could not undo command of group {}", self.name);
            }
        }
        Ok(())
    }
}

impl UndoableCommand for CommandGroup {
    fn command_type(&self) -> CommandType {
        *COMMAND_GROUP
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn state(&self) -> CommandState {
        self.state
    }

    fn perform_do(&mut self, document: &mut dyn DocumentCommandFacade) -> Result<bool> {
        self.state = CommandState::Doing;
        for index in 0..self.commands.len() {
            let result = self.commands[index].perform_do(document);
            if !matches!(result, Ok(true)) {
                self.undo_prefix(index, document)?;
                self.state = CommandState::Default;
                return result;
            }
        }
        self.state = CommandState::Done;
        Ok(true)
    }

    fn perform_undo(&mut self, document: &mut dyn DocumentCommandFacade) -> Result<bool> {
        self.state = CommandState::Undoing;
        for index in (0..self.commands.len()).rev() {
            let result = self.commands[index].perform_undo(document);
            if !matches!(result, Ok(true)) {
                // Redo what was already undone so the group stays consistent
                for command in &mut self.commands[index + 1..] {
                    command.perform_do(document)?;
                }
                self.state = CommandState::Done;
                return result;
            }
        }
        self.state = CommandState::Default;
        Ok(true)
    }

    fn is_repeatable(&self, document: &dyn DocumentCommandFacade) -> bool {
        !self.commands.is_empty() && self.commands.iter().all(|c| c.is_repeatable(document))
    }

    fn repeat(&self, document: &dyn DocumentCommandFacade) -> Option<Box<dyn UndoableCommand>> {
        let commands = self
            .commands
            .iter()
            .map(|c| c.repeat(document))
            .collect::<Option<Vec<_>>>()?;
        let mut group = CommandGroup::new(self.name.clone(), commands);
        group.state = CommandState::Default;
        Some(Box::new(group))
    }

    fn collate_with(&mut self, _other: &mut dyn UndoableCommand) -> bool {
        false
    }

    fn modification_count(&self) -> usize {
        self.commands.iter().map(|c| c.modification_count()).sum()
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
