//! Policy enforcement interceptor for action calls.

use super::{ActionCall, ActionInterceptor, InterceptorDecision};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PolicyMode {
    AllowAll,
    DefaultDeny,
}

#[derive(Debug, Clone)]
struct PolicyDecision {
    allowed: bool,
    rule_id: Option<String>,
    reason: String,
}

/// Per-action allow/deny rules over a default mode.
#[derive(Debug, Clone)]
pub struct PolicyConfig {
    mode: PolicyMode,
    rules: HashMap<String, PolicyDecision>,
}

impl PolicyConfig {
    pub fn allow_all() -> Self {
        Self {
            mode: PolicyMode::AllowAll,
            rules: HashMap::new(),
        }
    }

    /// Load a policy file. A missing file means allow-all.
    pub async fn load(path: &Path) -> crate::Result<Self> {
        if !path.exists() {
            return Ok(Self::allow_all());
        }

        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| crate::Error::Config(format!("{}: {}", path.display(), e)))?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> crate::Result<Self> {
        let parsed: PolicyFile = serde_json::from_str(contents)?;

        let mode = match parsed.mode.as_str() {
            "default-deny" => PolicyMode::DefaultDeny,
            "allow-all" => PolicyMode::AllowAll,
            other => {
                warn!(mode = other, "Unknown policy mode, defaulting to allow-all");
                PolicyMode::AllowAll
            }
        };

        let mut rules = HashMap::new();
        for rule in parsed.rules {
            if !is_valid_action_name(&rule.action) {
                warn!(action = %rule.action, "Invalid action name in policy; skipping rule");
                continue;
            }

            rules.insert(
                rule.action,
                PolicyDecision {
                    allowed: rule.allowed,
                    rule_id: rule.rule_id,
                    reason: rule.reason.unwrap_or_else(|| "policy rule".to_string()),
                },
            );
        }

        Ok(Self { mode, rules })
    }

    fn decision_for(&self, action: &str) -> PolicyDecision {
        if let Some(decision) = self.rules.get(action) {
            return decision.clone();
        }

        match self.mode {
            PolicyMode::AllowAll => PolicyDecision {
                allowed: true,
                rule_id: None,
                reason: "allowed by default policy".to_string(),
            },
            PolicyMode::DefaultDeny => PolicyDecision {
                allowed: false,
                rule_id: None,
                reason: "denied by default policy".to_string(),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct PolicyInterceptor {
    policy: PolicyConfig,
}

impl PolicyInterceptor {
    pub fn new(policy: PolicyConfig) -> Self {
        Self { policy }
    }
}

#[async_trait::async_trait]
impl ActionInterceptor for PolicyInterceptor {
    async fn before_execute(&self, call: &ActionCall<'_>) -> InterceptorDecision {
        let decision = self.policy.decision_for(call.action);
        if decision.allowed {
            return InterceptorDecision::Allow;
        }

        let rule_id = decision
            .rule_id
            .as_ref()
            .map(|id| format!(" rule_id={}", id))
            .unwrap_or_default();
        InterceptorDecision::Block(format!(
            "Policy denied action {}: {}{}",
            call.action, decision.reason, rule_id
        ))
    }
}

#[derive(Debug, Clone, Deserialize)]
struct PolicyFile {
    mode: String,
    #[serde(default)]
    rules: Vec<PolicyRule>,
}

#[derive(Debug, Clone, Deserialize)]
struct PolicyRule {
    action: String,
    allowed: bool,
    rule_id: Option<String>,
    reason: Option<String>,
}

fn is_valid_action_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|ch| ch.is_ascii_uppercase() || ch.is_ascii_digit() || ch == b'_')
}
