use std::collections::BTreeMap;

use serde_json::{Map, Value};

use super::ast::{Path, PathSegment};
use crate::error::TextMetalError;

/// Runtime state threaded through rendering: variable scopes, the model
/// stack and the strict flag.
///
/// The root scope binds `model` (the root model) and `properties` (the
/// `--property` pairs).
#[derive(Debug)]
pub struct TemplatingContext {
    scopes: Vec<BTreeMap<String, Value>>,
    models: Vec<Value>,
    strict: bool,
}

impl TemplatingContext {
    pub fn new(model: Value, properties: BTreeMap<String, String>, strict: bool) -> Self {
        let properties: Map<String, Value> = properties
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect();

        let mut root = BTreeMap::new();
        root.insert("model".to_string(), model.clone());
        root.insert("properties".to_string(), Value::Object(properties));

        TemplatingContext {
            scopes: vec![root],
            models: vec![model],
            strict,
        }
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(BTreeMap::new());
    }

    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Bind a loop variable in the current scope, replacing any earlier
    /// binding there.
    pub fn bind(&mut self, name: &str, value: Value) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), value);
        }
    }

    /// Declare a variable in the current scope.
    pub fn allocate(&mut self, name: &str, value: Value) -> Result<(), TextMetalError> {
        let Some(scope) = self.scopes.last_mut() else {
            return Err(TextMetalError::Variable("no active scope".to_string()));
        };
        if scope.contains_key(name) {
            return Err(TextMetalError::Variable(format!(
                "'{name}' is already declared in this scope"
            )));
        }
        scope.insert(name.to_string(), value);
        Ok(())
    }

    /// Update the nearest declaration of a variable.
    pub fn assign(&mut self, name: &str, value: Value) -> Result<(), TextMetalError> {
        match self
            .scopes
            .iter_mut()
            .rev()
            .find_map(|scope| scope.get_mut(name))
        {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(TextMetalError::Variable(format!("'{name}' is not declared"))),
        }
    }

    pub fn push_model(&mut self, model: Value) {
        self.models.push(model);
    }

    pub fn pop_model(&mut self) {
        if self.models.len() > 1 {
            self.models.pop();
        }
    }

    /// Resolve a path: variables innermost scope outward, then the model
    /// stack top-down as object fields. `None` when nothing matches or a
    /// later segment is missing.
    pub fn resolve(&self, path: &Path) -> Option<Value> {
        let head = path.head();
        let start = self
            .scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(head))
            .or_else(|| self.models.iter().rev().find_map(|model| model.get(head)))?;

        let mut current = start;
        for segment in path.tail() {
            current = match segment {
                PathSegment::Field(name) => current.get(name.as_str())?,
                PathSegment::Index(i) => current.get(*i)?,
            };
        }
        Some(current.clone())
    }

    pub fn is_defined(&self, path: &Path) -> bool {
        self.resolve(path).is_some()
    }
}
