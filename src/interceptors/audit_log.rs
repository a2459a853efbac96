//! Audit log interceptor
//!
//! Appends one JSONL entry when an action call starts and one when it
//! completes. Entries carry the executor's `call_id`; every complete entry has
//! a matching start entry, written late for calls that never reached this
//! interceptor's `before_execute`.

use super::{ActionCall, ActionInterceptor, InterceptorDecision};
use crate::dispatch::Envelope;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use tokio::sync::Mutex;

const MAX_RESULT_CHARS: usize = 1000;

#[derive(Debug, Serialize)]
struct AuditEntry<'a> {
    timestamp: DateTime<Utc>,
    entry_type: &'static str,
    call_id: u64,
    action: &'a str,
    args: &'a Value,
    result: Option<Value>,
    error: Option<&'a str>,
    duration_ms: u64,
    status: &'static str,
}

impl<'a> AuditEntry<'a> {
    fn start(call: &ActionCall<'a>) -> Self {
        Self {
            timestamp: Utc::now(),
            entry_type: "action_call_start",
            call_id: call.id,
            action: call.action,
            args: call.args,
            result: None,
            error: None,
            duration_ms: 0,
            status: "pending",
        }
    }
}

struct AuditLogWriter {
    path: PathBuf,
    /// Calls with a start entry and no complete entry yet.
    open_calls: HashSet<u64>,
}

impl AuditLogWriter {
    fn write(&self, entry: &AuditEntry<'_>) {
        if let Err(e) = self.try_write(entry) {
            tracing::warn!(error = %e, path = %self.path.display(), "Failed to write audit log entry");
        }
    }

    fn try_write(&self, entry: &AuditEntry<'_>) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let json = serde_json::to_string(entry)?;
        writeln!(file, "{}", json)?;
        Ok(())
    }
}

/// Interceptor that records every action call to a file. Never blocks.
pub struct AuditLogInterceptor {
    writer: Mutex<AuditLogWriter>,
}

impl AuditLogInterceptor {
    pub fn new(log_path: impl Into<PathBuf>) -> Self {
        Self {
            writer: Mutex::new(AuditLogWriter {
                path: log_path.into(),
                open_calls: HashSet::new(),
            }),
        }
    }
}

#[async_trait]
impl ActionInterceptor for AuditLogInterceptor {
    async fn before_execute(&self, call: &ActionCall<'_>) -> InterceptorDecision {
        let mut writer = self.writer.lock().await;
        writer.open_calls.insert(call.id);
        writer.write(&AuditEntry::start(call));

        InterceptorDecision::Allow
    }

    async fn after_execute(&self, call: &ActionCall<'_>, envelope: &Envelope, duration_ms: u64) {
        let (result, error, status) = match envelope {
            Envelope::Success { result } => (Some(truncate_result(result)), None, "success"),
            Envelope::Error { message } => (None, Some(message.as_str()), "error"),
        };

        let mut writer = self.writer.lock().await;
        if !writer.open_calls.remove(&call.id) {
            writer.write(&AuditEntry::start(call));
        }
        writer.write(&AuditEntry {
            timestamp: Utc::now(),
            entry_type: "action_call_complete",
            call_id: call.id,
            action: call.action,
            args: call.args,
            result,
            error,
            duration_ms,
            status,
        });
    }
}

fn truncate_result(result: &Value) -> Value {
    let s = result.to_string();
    if s.chars().count() > MAX_RESULT_CHARS {
        let head: String = s.chars().take(MAX_RESULT_CHARS).collect();
        Value::String(format!("{}... [truncated]", head))
    } else {
        result.clone()
    }
}
