//! Model Context Protocol server over stdio
//!
//! Newline-delimited JSON-RPC 2.0. Registered actions are listed as MCP tools;
//! `tools/call` results carry the action's envelope as JSON text and set
//! `isError` for failure envelopes.

pub mod protocol;
mod server;

pub use protocol::{error_codes, Request, Response, RpcError};
pub use server::McpServer;
