use std::collections::HashMap;
use std::fmt;

use crate::config::Limits;

/// Errors from mutating the environment store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvError {
    /// The store is at capacity and the name is not already present.
    Full { max: usize },
    /// Variable names are restricted to ASCII alphanumerics and underscores.
    InvalidName(String),
}

impl fmt::Display for EnvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvError::Full { max } => write!(f, "too many shell variables (limit {})", max),
            EnvError::InvalidName(name) => write!(f, "invalid variable name '{}'", name),
        }
    }
}

impl std::error::Error for EnvError {}

/// Per-instance store of shell variables.
///
/// The store is independent of the OS process environment: it starts empty,
/// is mutated only by the `set` and `unset` builtins, and is never exported
/// back to the process environment. Lookups that miss return `None`, not an
/// error.
#[derive(Debug, Clone)]
pub struct Environment {
    vars: HashMap<String, String>,
    max_vars: usize,
}

impl Environment {
    pub fn new(limits: &Limits) -> Self {
        Self {
            vars: HashMap::new(),
            max_vars: limits.max_env_vars,
        }
    }

    /// Insert or overwrite a variable.
    ///
    /// Overwriting an existing name always succeeds; inserting a new name
    /// fails when the store is at capacity. Names that could never be
    /// expanded (anything outside `[A-Za-z0-9_]`) are rejected outright.
    pub fn set(&mut self, name: &str, value: &str) -> Result<(), EnvError> {
        if !is_valid_name(name) {
            return Err(EnvError::InvalidName(name.to_string()));
        }
        if !self.vars.contains_key(name) && self.vars.len() >= self.max_vars {
            return Err(EnvError::Full { max: self.max_vars });
        }
        self.vars.insert(name.to_string(), value.to_string());
        Ok(())
    }

    /// Exact-match lookup. An absent name is `None`, never an error.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Remove a variable. Removing an absent name is a no-op.
    pub fn unset(&mut self, name: &str) {
        self.vars.remove(name);
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
