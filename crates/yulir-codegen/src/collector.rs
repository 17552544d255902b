use crate::{precondition, Result};
use std::collections::BTreeMap;

/// Generated helper functions keyed by name.
///
/// Each function is created at most once no matter how many generators ask for it, and the
/// combined output is ordered by name so it is identical across runs and platforms.
#[derive(Debug, Default)]
pub struct MultiUseFunctionCollector {
    /// `None` while the function is reserved but its text is not produced yet.
    functions: BTreeMap<String, Option<String>>,
}

impl MultiUseFunctionCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Returns `name`, running `creator` first if no function of that name exists yet.
    ///
    /// The name is reserved before `creator` runs, so a creator that asks for its own function
    /// again gets the name back instead of recursing.
    pub fn create_function<F>(&mut self, name: &str, creator: F) -> Result<String>
    where
        F: FnOnce(&mut Self) -> Result<String>,
    {
        if !self.reserve(name) {
            return Ok(name.to_string());
        }
        match creator(self) {
            Ok(code) => {
                self.define(name, code)?;
                Ok(name.to_string())
            }
            Err(err) => {
                self.release(name);
                Err(err)
            }
        }
    }

    /// Claims `name` for a function whose text is produced later. Returns false if the name is
    /// already taken, either by finished code or by another reservation.
    pub fn reserve(&mut self, name: &str) -> bool {
        if self.functions.contains_key(name) {
            return false;
        }
        self.functions.insert(name.to_string(), None);
        true
    }

    /// Fills in a reserved name.
    pub fn define(&mut self, name: &str, code: String) -> Result<()> {
        match self.functions.get_mut(name) {
            Some(slot @ None) => {
                *slot = Some(code);
                Ok(())
            }
            _ => Err(crate::CodegenError::PreconditionViolation(format!(
                "Function {} defined without a reservation.",
                name
            ))),
        }
    }

    /// Gives up a reservation that will not be filled.
    pub fn release(&mut self, name: &str) {
        if self.functions.get(name).is_some_and(Option::is_none) {
            self.functions.remove(name);
        }
    }

    /// Text of a finished function. Reserved names have none yet.
    pub fn function_code(&self, name: &str) -> Option<&str> {
        self.functions.get(name).and_then(Option::as_deref)
    }

    /// All collected function text in name order, leaving the collector empty.
    pub fn take_requested_functions(&mut self) -> Result<String> {
        precondition(self.functions.values().all(Option::is_some), || {
            "Requested functions taken while a function was still being created.".to_string()
        })?;
        let functions = std::mem::take(&mut self.functions);
        Ok(functions.into_values().flatten().collect::<Vec<_>>().join("\n"))
    }
}
