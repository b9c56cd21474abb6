use super::{CommandGroup, UndoableCommand};
use crate::document::DocumentCommandFacade;
use crate::error::{EditorError, Result};
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

/// Commands submitted between starting and committing a transaction
struct Transaction {
    name: String,
    commands: Vec<Box<dyn UndoableCommand>>,
}

/// Executes commands and keeps the undo and redo stacks
///
/// A command submitted within the collation interval of the previous
/// one is offered to it for collation; if accepted the two share one undo
/// step. Commands submitted inside a transaction are stored as one
/// [`CommandGroup`] when the transaction is committed.
pub struct CommandProcessor {
    undo_stack: Vec<Box<dyn UndoableCommand>>,
    redo_stack: Vec<Box<dyn UndoableCommand>>,
    /// Templates of the commands "repeat" replays
    repeatable: Vec<Box<dyn UndoableCommand>>,
    transactions: Vec<Transaction>,
    last_command_time: Option<Instant>,
    collation_interval: Duration,
    is_repeating: bool,
}

impl CommandProcessor {
    pub fn new(collation_interval: Duration) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            repeatable: Vec::new(),
            transactions: Vec::new(),
            last_command_time: None,
            collation_interval,
            is_repeating: false,
        }
    }

    pub fn collation_interval(&self) -> Duration {
        self.collation_interval
    }

    pub fn set_collation_interval(&mut self, interval: Duration) {
        self.collation_interval = interval;
    }

    pub fn can_undo(&self) -> bool {
        self.transactions.is_empty() && !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        self.transactions.is_empty() && !self.redo_stack.is_empty()
    }

    pub fn can_repeat(&self) -> bool {
        !self.repeatable.is_empty()
    }

    pub fn undo_name(&self) -> Option<&str> {
        self.undo_stack.last().map(|c| c.name())
    }

    pub fn redo_name(&self) -> Option<&str> {
        self.redo_stack.last().map(|c| c.name())
    }

    pub fn is_in_transaction(&self) -> bool {
        !self.transactions.is_empty()
    }

    pub fn transaction_depth(&self) -> usize {
        self.transactions.len()
    }

    /// Perform `command` and store it for undo
    ///
    /// Returns `Ok(false)` without storing anything if the command did not
    /// change the document.
    pub fn submit_and_store(
        &mut self,
        document: &mut dyn DocumentCommandFacade,
        mut command: Box<dyn UndoableCommand>,
    ) -> Result<bool> {
        if !command.perform_do(document)? {
            debug!(command = command.name(), "Command changed nothing");
            return Ok(false);
        }
        trace!(command = command.name(), "Executed command");
        self.redo_stack.clear();

        if !self.is_repeating {
            if command.is_repeat_delimiter() {
                self.repeatable.clear();
            } else if command.is_repeatable(document) {
                if let Some(template) = command.repeat(document) {
                    self.repeatable.push(template);
                }
            }
        }

        self.store(command, true);
        Ok(true)
    }

    fn store(&mut self, mut command: Box<dyn UndoableCommand>, collate: bool) {
        if let Some(transaction) = self.transactions.last_mut() {
            if collate {
                if let Some(last) = transaction.commands.last_mut() {
                    if last.collate_with(command.as_mut()) {
                        return;
                    }
                }
            }
            transaction.commands.push(command);
            return;
        }

        let now = Instant::now();
        if collate && self.collatable(now) {
            if let Some(last) = self.undo_stack.last_mut() {
                if last.collate_with(command.as_mut()) {
                    trace!(command = last.name(), "Collated command");
                    self.last_command_time = Some(now);
                    return;
                }
            }
        }
        self.undo_stack.push(command);
        self.last_command_time = Some(now);
    }

    fn collatable(&self, now: Instant) -> bool {
        self.redo_stack.is_empty()
            && self
                .last_command_time
                .is_some_and(|last| now.duration_since(last) < self.collation_interval)
    }

    pub fn undo(&mut self, document: &mut dyn DocumentCommandFacade) -> Result<bool> {
        if self.is_in_transaction() {
            return Err(EditorError::Transaction(
                "Cannot undo while a transaction is open".to_string(),
            ));
        }
        let Some(mut command) = self.undo_stack.pop() else {
            return Ok(false);
        };
        match command.perform_undo(document) {
            Ok(true) => {
                debug!(command = command.name(), "Undid command");
                self.redo_stack.push(command);
                self.repeatable.clear();
                self.last_command_time = None;
                Ok(true)
            }
            other => {
                warn!(command = command.name(), "Could not undo command");
                self.undo_stack.push(command);
                other
            }
        }
    }

    pub fn redo(&mut self, document: &mut dyn DocumentCommandFacade) -> Result<bool> {
        if self.is_in_transaction() {
            return Err(EditorError::Transaction(
                "Cannot redo while a transaction is open".to_string(),
            ));
        }
        let Some(mut command) = self.redo_stack.pop() else {
            return Ok(false);
        };
        match command.perform_do(document) {
            Ok(true) => {
                debug!(command = command.name(), "Redid command");
                self.undo_stack.push(command);
                self.last_command_time = None;
                Ok(true)
            }
            other => {
                warn!(command = command.name(), "Could not redo command");
                self.redo_stack.push(command);
                other
            }
        }
    }

    /// Apply the repeatable commands since the last delimiter again, as one step
    pub fn repeat_last_commands(&mut self, document: &mut dyn DocumentCommandFacade) -> Result<bool> {
        let commands: Vec<_> = self
            .repeatable
            .iter()
            .filter_map(|template| template.repeat(document))
            .collect();
        if commands.is_empty() {
            return Ok(false);
        }

        self.is_repeating = true;
        self.start_transaction("Repeat Commands");
        let mut result = Ok(true);
        for command in commands {
            if let Err(e) = self.submit_and_store(document, command) {
                result = Err(e);
                break;
            }
        }
        self.is_repeating = false;

        match result {
            Ok(_) => self.commit_transaction().map(|_| true),
            Err(e) => {
                self.rollback_transaction(document)?;
                Err(e)
            }
        }
    }

    pub fn start_transaction(&mut self, name: impl Into<String>) {
        let name = name.into();
        debug!(transaction = %name, depth = self.transactions.len() + 1, "Started transaction");
        self.transactions.push(Transaction {
            name,
            commands: Vec::new(),
        });
    }

    /// Store the commands of the innermost transaction as one undo step
    pub fn commit_transaction(&mut self) -> Result<()> {
        let transaction = self.transactions.pop().ok_or_else(|| {
            EditorError::Transaction("No transaction to commit".to_string())
        })?;
        debug!(transaction = %transaction.name, commands = transaction.commands.len(), "Committed transaction");
        if !transaction.commands.is_empty() {
            let group = CommandGroup::new(transaction.name, transaction.commands);
            self.store(Box::new(group), false);
        }
        Ok(())
    }

    /// Undo every command of the innermost transaction and close it
    pub fn rollback_transaction(&mut self, document: &mut dyn DocumentCommandFacade) -> Result<()> {
        let mut transaction = self.transactions.pop().ok_or_else(|| {
            EditorError::Transaction("No transaction to roll back".to_string())
        })?;
        debug!(transaction = %transaction.name, "Rolling back transaction");
        while let Some(mut command) = transaction.commands.pop() {
            if !command.perform_undo(document)? {
                return Err(EditorError::Command {
                    name: command.name().to_string(),
                    reason: format!("could not undo during rollback of {}", transaction.name),
                });
            }
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.repeatable.clear();
        self.transactions.clear();
        self.last_command_time = None;
    }
}

impl Default for CommandProcessor {
    fn default() -> Self {
        Self::new(Duration::from_millis(1000))
    }
}
