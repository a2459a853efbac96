//! The action descriptor trait.

use super::schema::{ActionInput, InputSchema};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

/// Illustrative call of an action. Shown to models, never executed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionExample {
    pub input: Value,
    pub output: Value,
    pub explanation: &'static str,
}

impl ActionExample {
    pub fn new(input: Value, output: Value, explanation: &'static str) -> Self {
        Self {
            input,
            output,
            explanation,
        }
    }
}

/// A named, schema-described operation runnable against a context `C`.
///
/// Implementors return bare payloads from [`Action::handle`]; the executor
/// wraps them into the result envelope. Errors are turned into failure
/// envelopes carrying the error's display text.
#[async_trait]
pub trait Action<C>: Send + Sync {
    /// Unique dispatch key.
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Alternative phrasings of the action name.
    fn similes(&self) -> &'static [&'static str] {
        &[]
    }

    fn examples(&self) -> Vec<ActionExample> {
        Vec::new()
    }

    fn schema(&self) -> InputSchema;

    async fn handle(&self, ctx: &C, input: ActionInput) -> crate::Result<Value>;
}
