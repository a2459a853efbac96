//! Name-keyed store of action descriptors.

use super::action::Action;
use super::schema::InputSchema;
use super::tool_definition::ToolDefinition;
use crate::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// A registered action together with its schema, captured at registration.
pub struct RegisteredAction<C> {
    action: Arc<dyn Action<C>>,
    schema: InputSchema,
}

impl<C> RegisteredAction<C> {
    pub fn name(&self) -> &'static str {
        self.action.name()
    }

    pub fn description(&self) -> &'static str {
        self.action.description()
    }

    pub fn schema(&self) -> &InputSchema {
        &self.schema
    }

    pub fn action(&self) -> &Arc<dyn Action<C>> {
        &self.action
    }

    pub fn tool_definition(&self) -> ToolDefinition {
        ToolDefinition::new(self.name(), self.description(), &self.schema)
    }
}

/// Registry of actions, read-only once built and shared behind `Arc`.
pub struct ActionRegistry<C> {
    actions: Vec<RegisteredAction<C>>,
    index: HashMap<&'static str, usize>,
}

impl<C> Default for ActionRegistry<C> {
    fn default() -> Self {
        Self {
            actions: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<C> ActionRegistry<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `action`. The registry is left unchanged on error.
    pub fn register<A>(&mut self, action: A) -> Result<()>
    where
        A: Action<C> + 'static,
    {
        self.register_arc(Arc::new(action))
    }

    pub fn register_arc(&mut self, action: Arc<dyn Action<C>>) -> Result<()> {
        let name = action.name();
        if name.trim().is_empty() {
            return Err(Error::InvalidActionName(name.to_string()));
        }
        if self.index.contains_key(name) {
            return Err(Error::DuplicateAction(name.to_string()));
        }

        let schema = action.schema();
        tracing::debug!(action = name, fields = schema.fields().len(), "Registered action");
        self.index.insert(name, self.actions.len());
        self.actions.push(RegisteredAction { action, schema });
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredAction<C>> {
        self.index.get(name).map(|&i| &self.actions[i])
    }

    /// Like [`get`](Self::get) but reports a missing name as `UnknownAction`.
    pub fn require(&self, name: &str) -> Result<&RegisteredAction<C>> {
        self.get(name)
            .ok_or_else(|| Error::UnknownAction(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Registered actions in registration order.
    pub fn list(&self) -> impl Iterator<Item = &RegisteredAction<C>> {
        self.actions.iter()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.actions.iter().map(|a| a.name()).collect()
    }

    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.actions.iter().map(|a| a.tool_definition()).collect()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
