//! EVM Agent Kit
//!
//! Named, schema-described actions for tool-calling agents on EVM chains:
//! - Actions declare an input schema and an async handler
//! - A registry holds them and renders tool definitions (OpenAI, MCP)
//! - The executor validates input and returns a uniform result envelope
//! - Built-in actions cover wallet basics, Compound, FourMeme, DeFiLlama and CoinGecko
//!
//! # Security Model
//!
//! - Private keys never leave the wallet module
//! - All calls pass through the interceptor pipeline (policy, audit log)
//! - Nothing raised while executing an action escapes the executor

pub mod actions;
pub mod agent;
pub mod config;
pub mod contracts;
pub mod dispatch;
pub mod interceptors;
pub mod mcp;
pub mod services;
pub mod units;
pub mod wallet;

mod error;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use actions::builtin_registry;
pub use agent::EvmAgentKit;
pub use config::{Config, RpcConfig};
pub use dispatch::{Action, ActionExecutor, ActionRegistry, Envelope};
pub use error::{Error, Result};
