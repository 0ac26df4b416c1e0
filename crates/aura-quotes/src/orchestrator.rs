//! Deterministic mapping from a mood verdict to the set of downstream
//! actions for the turn.
//!
//! Actions are a closed set of tagged variants, each carrying its own
//! parameter struct; the registry in `actions` dispatches them to handlers.
//! Planning has no side effects and performs no retrieval or persistence.

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::mood::verdict::{MoodCategory, MoodVerdict};
use crate::session::SessionContext;

/// Prior-message threshold separating an opening conversation from an
/// ongoing one.
const OPENING_STAGE_THRESHOLD: usize = 3;

/// Quotes fetched per turn.
const QUOTE_FETCH_COUNT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationStage {
    Opening,
    Ongoing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationFlowParams {
    pub message_count: usize,
    pub stage: ConversationStage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigateParams {
    pub category: MoodCategory,
    pub confidence: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchQuotesParams {
    pub query: String,
    pub category: MoodCategory,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportParams {
    pub category: MoodCategory,
    pub intensity: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    ConversationFlow(ConversationFlowParams),
    Navigate(NavigateParams),
    FetchQuotes(FetchQuotesParams),
    EmotionalSupport(SupportParams),
}

impl Action {
    /// Stable tool name for the registry and for invocation metadata.
    pub fn tool_name(&self) -> &'static str {
        match self {
            Action::ConversationFlow(_) => "conversation_manager",
            Action::Navigate(_) => "quote_navigator",
            Action::FetchQuotes(_) => "quote_fetcher",
            Action::EmotionalSupport(_) => "emotional_support",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ActionPlan {
    pub actions: Vec<Action>,
}

impl ActionPlan {
    pub fn contains(&self, tool_name: &str) -> bool {
        self.actions.iter().any(|a| a.tool_name() == tool_name)
    }

    pub fn find(&self, tool_name: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.tool_name() == tool_name)
    }
}

pub struct ToolOrchestrator {
    quote_confidence_threshold: f32,
    support_intensity_threshold: f32,
}

impl ToolOrchestrator {
    pub fn new(config: &Config) -> Self {
        Self {
            quote_confidence_threshold: config.quote_confidence_threshold,
            support_intensity_threshold: config.support_intensity_threshold,
        }
    }

    /// Build the action plan for one turn. Deterministic and stateless
    /// given the verdict and session context.
    pub fn plan(&self, message: &str, verdict: &MoodVerdict, context: &SessionContext) -> ActionPlan {
        let mut actions = Vec::new();

        // Conversation flow is always tracked
        let stage = if context.message_count < OPENING_STAGE_THRESHOLD {
            ConversationStage::Opening
        } else {
            ConversationStage::Ongoing
        };
        actions.push(Action::ConversationFlow(ConversationFlowParams {
            message_count: context.message_count,
            stage,
        }));

        // Navigation is always offered; the handler resolves non-specific
        // categories to the configured default section
        actions.push(Action::Navigate(NavigateParams {
            category: verdict.category,
            confidence: verdict.confidence,
        }));

        // Quote retrieval is never skipped: low confidence falls back to the
        // general category rather than dropping the action
        let quote_category = if verdict.confidence > self.quote_confidence_threshold {
            verdict.category
        } else {
            MoodCategory::General
        };
        actions.push(Action::FetchQuotes(FetchQuotesParams {
            query: message.to_string(),
            category: quote_category,
            count: QUOTE_FETCH_COUNT,
        }));

        if verdict.emotional_intensity > self.support_intensity_threshold {
            actions.push(Action::EmotionalSupport(SupportParams {
                category: verdict.category,
                intensity: verdict.emotional_intensity,
            }));
        }

        ActionPlan { actions }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mood::verdict::AnalysisMethod;

    fn orchestrator() -> ToolOrchestrator {
        ToolOrchestrator::new(&Config::default())
    }

    fn verdict(category: MoodCategory, confidence: f32, intensity: f32) -> MoodVerdict {
        MoodVerdict::new(category, confidence, intensity, "need", AnalysisMethod::PhraseCascade)
    }

    fn context_with_messages(count: usize) -> SessionContext {
        SessionContext {
            message_count: count,
            ..Default::default()
        }
    }

    #[test]
    fn test_plan_always_has_flow_and_navigation() {
        let plan = orchestrator().plan(
            "zzz",
            &verdict(MoodCategory::General, 0.1, 0.1),
            &SessionContext::default(),
        );
        assert!(plan.contains("conversation_manager"));
        assert!(plan.contains("quote_navigator"));
    }

    #[test]
    fn test_quote_fetch_never_skipped() {
        let confident = orchestrator().plan(
            "need a laugh",
            &verdict(MoodCategory::Funny, 0.9, 0.4),
            &SessionContext::default(),
        );
        let uncertain = orchestrator().plan(
            "hmm",
            &verdict(MoodCategory::Funny, 0.2, 0.4),
            &SessionContext::default(),
        );

        match confident.find("quote_fetcher") {
            Some(Action::FetchQuotes(params)) => assert_eq!(params.category, MoodCategory::Funny),
            other => panic!("unexpected action: {:?}", other),
        }
        // Low confidence falls back to general retrieval instead of skipping
        match uncertain.find("quote_fetcher") {
            Some(Action::FetchQuotes(params)) => assert_eq!(params.category, MoodCategory::General),
            other => panic!("unexpected action: {:?}", other),
        }
    }

    #[test]
    fn test_support_gated_on_intensity() {
        let calm = orchestrator().plan(
            "hello",
            &verdict(MoodCategory::General, 0.95, 0.2),
            &SessionContext::default(),
        );
        assert!(!calm.contains("emotional_support"));

        let charged = orchestrator().plan(
            "desperately need help",
            &verdict(MoodCategory::Motivational, 0.9, 0.8),
            &SessionContext::default(),
        );
        match charged.find("emotional_support") {
            Some(Action::EmotionalSupport(params)) => {
                assert_eq!(params.category, MoodCategory::Motivational);
                assert!((params.intensity - 0.8).abs() < 1e-6);
            }
            other => panic!("unexpected action: {:?}", other),
        }
    }

    #[test]
    fn test_support_absent_at_exact_threshold() {
        let plan = orchestrator().plan(
            "hey",
            &verdict(MoodCategory::General, 0.95, 0.6),
            &SessionContext::default(),
        );
        assert!(!plan.contains("emotional_support"));
    }

    #[test]
    fn test_conversation_stage_threshold() {
        let orchestrator = orchestrator();
        let verdict = verdict(MoodCategory::General, 0.5, 0.3);

        for (count, expected) in [
            (0, ConversationStage::Opening),
            (2, ConversationStage::Opening),
            (3, ConversationStage::Ongoing),
            (9, ConversationStage::Ongoing),
        ] {
            let plan = orchestrator.plan("msg", &verdict, &context_with_messages(count));
            match plan.find("conversation_manager") {
                Some(Action::ConversationFlow(params)) => {
                    assert_eq!(params.stage, expected, "count {}", count);
                    assert_eq!(params.message_count, count);
                }
                other => panic!("unexpected action: {:?}", other),
            }
        }
    }

    #[test]
    fn test_plan_is_deterministic() {
        let orchestrator = orchestrator();
        let verdict = verdict(MoodCategory::Funny, 0.9, 0.7);
        let a = orchestrator.plan("make me laugh", &verdict, &context_with_messages(4));
        let b = orchestrator.plan("make me laugh", &verdict, &context_with_messages(4));
        assert_eq!(a.actions.len(), b.actions.len());
        assert_eq!(
            serde_json::to_string(&a.actions).unwrap(),
            serde_json::to_string(&b.actions).unwrap()
        );
    }
}
