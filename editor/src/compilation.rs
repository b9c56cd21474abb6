//! Context shared by the tasks of a map compilation
//!
//! Task parameters may reference variables as `${NAME}`. The
//! [`VariableTable`] declares which names exist; the
//! [`VariableValueTable`] holds their current values. Tasks may redefine
//! declared variables as they run.

use crate::document::MapDocument;
use crate::error::{EditorError, Result};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, trace};

/// Declared variable names with a description for the user
#[derive(Debug, Clone, Default)]
pub struct VariableTable {
    variables: BTreeMap<String, String>,
}

impl VariableTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(&mut self, name: impl Into<String>, description: impl Into<String>) {
        self.variables.insert(name.into(), description.into());
    }

    pub fn declared(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub fn description(&self, name: &str) -> Option<&str> {
        self.variables.get(name).map(String::as_str)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }
}

#[derive(Debug, Clone, Default)]
pub struct VariableValueTable {
    values: HashMap<String, String>,
}

impl VariableValueTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}

/// Compiler output collected from worker threads
#[derive(Debug, Clone, Default)]
pub struct CompilationOutput(Arc<Mutex<String>>);

impl CompilationOutput {
    pub fn append(&self, text: &str) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_str(text);
    }

    pub fn contents(&self) -> String {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

pub struct CompilationContext {
    document: Rc<RefCell<MapDocument>>,
    variables: VariableTable,
    values: VariableValueTable,
    output: CompilationOutput,
}

impl CompilationContext {
    pub fn new(
        document: Rc<RefCell<MapDocument>>,
        variables: VariableTable,
        values: VariableValueTable,
    ) -> Self {
        Self {
            document,
            variables,
            values,
            output: CompilationOutput::default(),
        }
    }

    pub fn document(&self) -> &Rc<RefCell<MapDocument>> {
        &self.document
    }

    pub fn variables(&self) -> &VariableTable {
        &self.variables
    }

    /// Replace every `${NAME}` in `input` with the variable's value
    pub fn translate_variables(&self, input: &str) -> Result<String> {
        let mut result = String::with_capacity(input.len());
        let mut rest = input;
        let mut position = 0;
        while let Some(start) = rest.find("${") {
            result.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let end = after
                .find('}')
                .ok_or(EditorError::UnterminatedVariable(position + start))?;
            let name = after[..end].trim();
            let value = self
                .variables
                .declared(name)
                .then(|| self.values.value(name))
                .flatten()
                .ok_or_else(|| EditorError::UnknownVariable(name.to_string()))?;
            result.push_str(value);
            position += start + 2 + end + 1;
            rest = &after[end + 1..];
        }
        result.push_str(rest);
        trace!(input, output = %result, "Translated variables");
        Ok(result)
    }

    /// Change the value of a declared variable for the remaining tasks
    pub fn redefine_variable(&mut self, name: &str, value: impl Into<String>) -> Result<()> {
        if !self.variables.declared(name) {
            return Err(EditorError::UndeclaredVariable(name.to_string()));
        }
        let value = value.into();
        debug!(variable = name, value = %value, "Redefined variable");
        self.values.define(name, value);
        Ok(())
    }

    /// A handle worker threads can append output through
    pub fn output_sink(&self) -> CompilationOutput {
        self.output.clone()
    }

    pub fn append_output(&self, text: &str) {
        self.output.append(text);
    }

    pub fn output(&self) -> String {
        self.output.contents()
    }
}
