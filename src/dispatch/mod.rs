//! Action dispatch framework
//!
//! Actions declare an [`InputSchema`] and an async handler. The
//! [`ActionRegistry`] keys them by name, the [`ActionExecutor`] validates raw
//! JSON arguments, runs the handler against a caller-supplied context and
//! returns an [`Envelope`]. [`ToolDefinition`] renders schemas for
//! function-calling front ends.

mod action;
mod envelope;
mod executor;
mod registry;
mod schema;
mod tool_definition;

pub use action::{Action, ActionExample};
pub use envelope::Envelope;
pub use executor::{execute, ActionExecutor};
pub use registry::{ActionRegistry, RegisteredAction};
pub use schema::{ActionInput, FieldKind, FieldSpec, InputSchema, ValidationError};
pub use tool_definition::{parameters_schema, to_tool_definition, ToolDefinition};
