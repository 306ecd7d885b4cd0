use crate::error::{ProbeError, Result};
use serde::Serialize;
use std::collections::BTreeMap;

/// Parsed option values, keyed by option name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct OptionStore {
    vars: BTreeMap<String, Vec<String>>,
}

impl OptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up an option that a probe depends on.
    pub fn get(&self, name: &str) -> Result<&[String]> {
        self.vars
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| ProbeError::MissingOption(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn set(&mut self, name: impl Into<String>, tokens: Vec<String>) {
        self.vars.insert(name.into(), tokens);
    }

    pub fn delete(&mut self, name: &str) -> Option<Vec<String>> {
        self.vars.remove(name)
    }

    /// Moves the value of `from` to `to`, replacing anything already stored under `to`.
    ///
    /// Fails if `from` is not set, so a second rename is an error rather than a no-op.
    pub fn rename(&mut self, from: &str, to: &str) -> Result<()> {
        let tokens = self
            .delete(from)
            .ok_or_else(|| ProbeError::MissingOption(from.to_string()))?;
        self.set(to, tokens);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}
