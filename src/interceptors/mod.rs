//! Governance interceptors around action execution
//!
//! Every call routed through an [`ActionExecutor`](crate::dispatch::ActionExecutor)
//! passes the interceptor pipeline: each interceptor may block the call
//! before validation and is told about the outcome afterwards.

mod audit_log;
mod policy;

pub use audit_log::AuditLogInterceptor;
pub use policy::{PolicyConfig, PolicyInterceptor};

use crate::dispatch::Envelope;
use async_trait::async_trait;
use serde_json::Value;

/// The call being intercepted. `args` are the raw, unvalidated arguments.
#[derive(Debug, Clone, Copy)]
pub struct ActionCall<'a> {
    /// Distinct per call within one executor; pairs `before_execute` with
    /// `after_execute`.
    pub id: u64,
    pub action: &'a str,
    pub args: &'a Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterceptorDecision {
    Allow,
    /// Reject the call; the reason becomes the failure envelope message.
    Block(String),
}

#[async_trait]
pub trait ActionInterceptor: Send + Sync {
    async fn before_execute(&self, _call: &ActionCall<'_>) -> InterceptorDecision {
        InterceptorDecision::Allow
    }

    /// Runs for every call, including ones that never reached
    /// `before_execute` (unknown action, blocked by an earlier interceptor).
    async fn after_execute(&self, _call: &ActionCall<'_>, _envelope: &Envelope, _duration_ms: u64) {}
}
