//! Runs actions by name and folds every outcome into an [`Envelope`].

use super::envelope::Envelope;
use super::registry::ActionRegistry;
use crate::interceptors::{ActionCall, ActionInterceptor, InterceptorDecision};
use futures::FutureExt;
use serde_json::Value;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Dispatcher over a shared registry with an interceptor pipeline.
///
/// The executor never fails: unknown names, blocked calls, invalid input,
/// handler errors and handler panics all come back as failure envelopes.
pub struct ActionExecutor<C> {
    registry: Arc<ActionRegistry<C>>,
    interceptors: Vec<Arc<dyn ActionInterceptor>>,
    next_call_id: Arc<AtomicU64>,
}

impl<C> Clone for ActionExecutor<C> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            interceptors: self.interceptors.clone(),
            next_call_id: Arc::clone(&self.next_call_id),
        }
    }
}

impl<C: Send + Sync> ActionExecutor<C> {
    pub fn new(registry: Arc<ActionRegistry<C>>) -> Self {
        Self {
            registry,
            interceptors: Vec::new(),
            next_call_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Append an interceptor; interceptors run in insertion order.
    pub fn with_interceptor(mut self, interceptor: Arc<dyn ActionInterceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    pub fn registry(&self) -> &Arc<ActionRegistry<C>> {
        &self.registry
    }

    pub async fn execute(&self, ctx: &C, name: &str, raw: Value) -> Envelope {
        let started = Instant::now();
        let call = ActionCall {
            id: self.next_call_id.fetch_add(1, Ordering::Relaxed),
            action: name,
            args: &raw,
        };

        let envelope = dispatch(&self.registry, &self.interceptors, ctx, &call).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        match &envelope {
            Envelope::Success { .. } => {
                tracing::info!(action = name, duration_ms, "Action succeeded")
            }
            Envelope::Error { message } => {
                tracing::warn!(action = name, duration_ms, error = %message, "Action failed")
            }
        }

        for interceptor in &self.interceptors {
            interceptor.after_execute(&call, &envelope, duration_ms).await;
        }

        envelope
    }
}

/// One-shot dispatch without interceptors.
pub async fn execute<C: Send + Sync>(
    registry: &ActionRegistry<C>,
    ctx: &C,
    name: &str,
    raw: Value,
) -> Envelope {
    let call = ActionCall {
        id: 0,
        action: name,
        args: &raw,
    };
    dispatch(registry, &[], ctx, &call).await
}

async fn dispatch<C: Send + Sync>(
    registry: &ActionRegistry<C>,
    interceptors: &[Arc<dyn ActionInterceptor>],
    ctx: &C,
    call: &ActionCall<'_>,
) -> Envelope {
    let entry = match registry.require(call.action) {
        Ok(entry) => entry,
        Err(e) => return e.into(),
    };

    for interceptor in interceptors {
        if let InterceptorDecision::Block(reason) = interceptor.before_execute(call).await {
            tracing::warn!(action = call.action, reason = %reason, "Action blocked");
            return Envelope::error(reason);
        }
    }

    let input = match entry.schema().validate(call.args) {
        Ok(input) => input,
        Err(e) => {
            tracing::debug!(action = call.action, error = %e, "Input rejected");
            return Envelope::error(e.to_string());
        }
    };

    tracing::debug!(action = call.action, "Invoking handler");
    let handled = AssertUnwindSafe(entry.action().handle(ctx, input))
        .catch_unwind()
        .await;

    match handled {
        Ok(Ok(value)) => Envelope::from_handler_value(value),
        Ok(Err(e)) => e.into(),
        Err(panic) => Envelope::error(panic_message(panic.as_ref())),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned());
    match detail {
        Some(detail) => format!("action panicked: {}", detail),
        None => "action panicked".to_string(),
    }
}
