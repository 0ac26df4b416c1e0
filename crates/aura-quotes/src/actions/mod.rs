//! Tool registry: named handlers dispatching the orchestrator's action
//! variants.
//!
//! Each tool carries a stable name, a natural-language description, and a
//! parameter schema; invocation is by keyword-matched parameters carried in
//! the action's own struct. A handler failure is captured in that action's
//! outcome and the remaining actions still run.

pub mod handlers;

pub use handlers::default_registry;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::warn;

use crate::orchestrator::{Action, ActionPlan};

/// Primitive type tag for a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    Text,
    Number,
    Integer,
}

/// Per-turn data shared by every handler invocation.
#[derive(Debug, Clone)]
pub struct TurnContext {
    pub session_id: String,
    /// Seed for any sampling a handler performs, so tests can assert
    /// deterministic output.
    pub seed: u64,
}

#[async_trait]
pub trait ToolHandler: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn parameters(&self) -> &'static [(&'static str, ParamKind)];

    /// Execute the action. Handlers only receive actions whose tool name
    /// matches theirs.
    async fn invoke(&self, action: &Action, context: &TurnContext)
        -> anyhow::Result<serde_json::Value>;
}

/// Result of one action execution. `error` is set when the handler failed;
/// the plan continues regardless.
#[derive(Debug, Clone, Serialize)]
pub struct ActionOutcome {
    pub tool: String,
    pub output: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct ToolRegistry {
    handlers: Vec<Arc<dyn ToolHandler>>,
}

impl ToolRegistry {
    pub fn new(handlers: Vec<Arc<dyn ToolHandler>>) -> Self {
        Self { handlers }
    }

    pub fn handler_for(&self, tool_name: &str) -> Option<&Arc<dyn ToolHandler>> {
        self.handlers.iter().find(|h| h.name() == tool_name)
    }

    /// Tool descriptions for surfaces that list available capabilities.
    pub fn describe(&self) -> Vec<serde_json::Value> {
        self.handlers
            .iter()
            .map(|h| {
                serde_json::json!({
                    "name": h.name(),
                    "description": h.description(),
                    "parameters": h.parameters()
                        .iter()
                        .map(|(name, kind)| (name.to_string(), *kind))
                        .collect::<std::collections::HashMap<_, _>>(),
                })
            })
            .collect()
    }

    /// Execute a plan action by action. Each failure is recorded with an
    /// error field on its own outcome; no failure aborts the rest.
    pub async fn execute(&self, plan: &ActionPlan, context: &TurnContext) -> Vec<ActionOutcome> {
        let mut outcomes = Vec::with_capacity(plan.actions.len());

        for action in &plan.actions {
            let tool = action.tool_name().to_string();
            let outcome = match self.handler_for(&tool) {
                Some(handler) => match handler.invoke(action, context).await {
                    Ok(output) => ActionOutcome {
                        tool,
                        output,
                        error: None,
                    },
                    Err(e) => {
                        warn!("Tool {} failed: {}", action.tool_name(), e);
                        ActionOutcome {
                            tool,
                            output: serde_json::Value::Null,
                            error: Some(e.to_string()),
                        }
                    }
                },
                None => ActionOutcome {
                    tool: tool.clone(),
                    output: serde_json::Value::Null,
                    error: Some(format!("No handler registered for {}", tool)),
                },
            };
            outcomes.push(outcome);
        }

        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::{ConversationFlowParams, ConversationStage};

    struct FailingHandler;

    #[async_trait]
    impl ToolHandler for FailingHandler {
        fn name(&self) -> &'static str {
            "conversation_manager"
        }
        fn description(&self) -> &'static str {
            "always fails"
        }
        fn parameters(&self) -> &'static [(&'static str, ParamKind)] {
            &[]
        }
        async fn invoke(
            &self,
            _action: &Action,
            _context: &TurnContext,
        ) -> anyhow::Result<serde_json::Value> {
            Err(anyhow::anyhow!("synthetic failure"))
        }
    }

    struct EchoHandler;

    #[async_trait]
    impl ToolHandler for EchoHandler {
        fn name(&self) -> &'static str {
            "quote_navigator"
        }
        fn description(&self) -> &'static str {
            "echoes"
        }
        fn parameters(&self) -> &'static [(&'static str, ParamKind)] {
            &[("category", ParamKind::Text)]
        }
        async fn invoke(
            &self,
            _action: &Action,
            _context: &TurnContext,
        ) -> anyhow::Result<serde_json::Value> {
            Ok(serde_json::json!({"ok": true}))
        }
    }

    fn plan() -> ActionPlan {
        ActionPlan {
            actions: vec![
                Action::ConversationFlow(ConversationFlowParams {
                    message_count: 0,
                    stage: ConversationStage::Opening,
                }),
                Action::Navigate(crate::orchestrator::NavigateParams {
                    category: crate::mood::verdict::MoodCategory::Funny,
                    confidence: 0.9,
                }),
            ],
        }
    }

    #[tokio::test]
    async fn test_failed_action_recorded_and_plan_continues() {
        let registry = ToolRegistry::new(vec![Arc::new(FailingHandler), Arc::new(EchoHandler)]);
        let context = TurnContext {
            session_id: "s1".to_string(),
            seed: 7,
        };

        let outcomes = registry.execute(&plan(), &context).await;
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes[0].error.is_some());
        assert!(outcomes[1].error.is_none());
        assert_eq!(outcomes[1].output["ok"], true);
    }

    #[tokio::test]
    async fn test_missing_handler_is_an_error_outcome() {
        let registry = ToolRegistry::new(vec![]);
        let context = TurnContext {
            session_id: "s1".to_string(),
            seed: 7,
        };

        let outcomes = registry.execute(&plan(), &context).await;
        assert!(outcomes.iter().all(|o| o.error.is_some()));
    }

    #[test]
    fn test_describe_exposes_schema() {
        let registry = ToolRegistry::new(vec![Arc::new(EchoHandler)]);
        let described = registry.describe();
        assert_eq!(described.len(), 1);
        assert_eq!(described[0]["name"], "quote_navigator");
        assert_eq!(described[0]["parameters"]["category"], "text");
    }
}
