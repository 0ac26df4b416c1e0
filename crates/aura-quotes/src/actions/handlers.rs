//! Built-in tool handlers.

use std::sync::Arc;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde_json::json;

use crate::actions::{ParamKind, ToolHandler, ToolRegistry, TurnContext};
use crate::mood::verdict::MoodCategory;
use crate::orchestrator::Action;
use crate::quote_db::QuoteDatabase;
use crate::retrieval::records::RecordPayload;
use crate::retrieval::{ranking, RetrievalEngine};

/// Tracks conversation flow and engagement.
pub struct ConversationFlowHandler;

#[async_trait]
impl ToolHandler for ConversationFlowHandler {
    fn name(&self) -> &'static str {
        "conversation_manager"
    }

    fn description(&self) -> &'static str {
        "Manages conversation flow, context, and user engagement"
    }

    fn parameters(&self) -> &'static [(&'static str, ParamKind)] {
        &[
            ("message_count", ParamKind::Integer),
            ("stage", ParamKind::Text),
        ]
    }

    async fn invoke(
        &self,
        action: &Action,
        _context: &TurnContext,
    ) -> anyhow::Result<serde_json::Value> {
        let params = match action {
            Action::ConversationFlow(params) => params,
            other => anyhow::bail!("conversation_manager received {:?}", other.tool_name()),
        };

        Ok(json!({
            "is_new_conversation": params.message_count == 0,
            "message_count": params.message_count,
            "engagement_level": (params.message_count as f32 / 10.0).min(1.0),
            "conversation_stage": params.stage,
        }))
    }
}

/// Resolves a mood category to a quote section.
pub struct NavigationHandler {
    default_section: String,
}

impl NavigationHandler {
    pub fn new(default_section: impl Into<String>) -> Self {
        Self {
            default_section: default_section.into(),
        }
    }

    fn section_for(&self, category: MoodCategory) -> String {
        if category.is_specific() {
            format!("/quotes/{}", category)
        } else {
            self.default_section.clone()
        }
    }
}

#[async_trait]
impl ToolHandler for NavigationHandler {
    fn name(&self) -> &'static str {
        "quote_navigator"
    }

    fn description(&self) -> &'static str {
        "Returns the quote page for the detected mood category"
    }

    fn parameters(&self) -> &'static [(&'static str, ParamKind)] {
        &[
            ("category", ParamKind::Text),
            ("confidence", ParamKind::Number),
        ]
    }

    async fn invoke(
        &self,
        action: &Action,
        _context: &TurnContext,
    ) -> anyhow::Result<serde_json::Value> {
        let params = match action {
            Action::Navigate(params) => params,
            other => anyhow::bail!("quote_navigator received {:?}", other.tool_name()),
        };

        Ok(json!({
            "recommended_page": self.section_for(params.category),
            "category": params.category,
            "confidence": params.confidence,
        }))
    }
}

/// Fetches quotes: semantic search first, category-random fallback, and a
/// presentation re-rank over whichever candidate set was used.
pub struct QuoteFetchHandler {
    retrieval: Arc<RetrievalEngine>,
    database: Arc<QuoteDatabase>,
}

impl QuoteFetchHandler {
    pub fn new(retrieval: Arc<RetrievalEngine>, database: Arc<QuoteDatabase>) -> Self {
        Self {
            retrieval,
            database,
        }
    }
}

#[async_trait]
impl ToolHandler for QuoteFetchHandler {
    fn name(&self) -> &'static str {
        "quote_fetcher"
    }

    fn description(&self) -> &'static str {
        "Fetches relevant quotes for a mood category"
    }

    fn parameters(&self) -> &'static [(&'static str, ParamKind)] {
        &[
            ("query", ParamKind::Text),
            ("category", ParamKind::Text),
            ("count", ParamKind::Integer),
        ]
    }

    async fn invoke(
        &self,
        action: &Action,
        context: &TurnContext,
    ) -> anyhow::Result<serde_json::Value> {
        let params = match action {
            Action::FetchQuotes(params) => params,
            other => anyhow::bail!("quote_fetcher received {:?}", other.tool_name()),
        };

        let semantic = self
            .retrieval
            .search_quotes(&params.query, params.category, params.count * 2)
            .await;

        if !semantic.is_empty() {
            let candidates: Vec<serde_json::Value> = semantic
                .into_iter()
                .filter_map(|(record, similarity)| match record.payload {
                    RecordPayload::Quote { text, author } => Some(json!({
                        "quote": text,
                        "author": author,
                        "category": record.category,
                        "relevance_score": similarity,
                    })),
                    _ => None,
                })
                .collect();

            let mut ranked = ranking::rank_for_presentation(candidates, |entry| {
                entry["quote"].as_str().unwrap_or("")
            });
            ranked.truncate(params.count);
            let count = ranked.len();

            return Ok(json!({
                "quotes": ranked,
                "category": params.category,
                "count": count,
                "source": "semantic_search",
            }));
        }

        // Fallback: random sample from the catalogue, deterministic per-turn
        // sampling on top of it, then the same presentation re-rank. The
        // general category samples across the whole catalogue.
        let mut candidates = if params.category.is_specific() {
            self.database
                .quotes
                .get_by_category(params.category.as_str(), params.count * 4)?
        } else {
            self.database.quotes.get_all(params.count * 4)?
        };
        let mut rng = StdRng::seed_from_u64(context.seed);
        candidates.shuffle(&mut rng);
        candidates.truncate(params.count * 2);

        let mut ranked = ranking::rank_for_presentation(candidates, |quote| quote.quote.as_str());
        ranked.truncate(params.count);

        let quotes: Vec<serde_json::Value> = ranked
            .iter()
            .map(|q| {
                json!({
                    "quote": q.quote,
                    "author": q.author,
                    "category": q.category,
                })
            })
            .collect();

        let count = quotes.len();
        Ok(json!({
            "quotes": quotes,
            "category": params.category,
            "count": count,
            "source": "database",
        }))
    }
}

/// Contextual encouragement for high emotional intensity.
pub struct EmotionalSupportHandler;

impl EmotionalSupportHandler {
    fn support_message(category: MoodCategory) -> &'static str {
        match category {
            MoodCategory::Motivational => {
                "Remember, every expert was once a beginner. You have the strength to achieve your goals!"
            }
            MoodCategory::Romantic => {
                "Love is a beautiful journey with ups and downs. Your heart's capacity for love is a gift."
            }
            MoodCategory::Funny => {
                "Laughter truly is the best medicine! Keep that beautiful sense of humor alive."
            }
            MoodCategory::Inspirational => {
                "You're exactly where you need to be in your journey. Trust the process and keep growing."
            }
            MoodCategory::General => "You're doing great! Keep going!",
        }
    }
}

#[async_trait]
impl ToolHandler for EmotionalSupportHandler {
    fn name(&self) -> &'static str {
        "emotional_support"
    }

    fn description(&self) -> &'static str {
        "Provides contextual emotional support based on mood and intensity"
    }

    fn parameters(&self) -> &'static [(&'static str, ParamKind)] {
        &[
            ("category", ParamKind::Text),
            ("intensity", ParamKind::Number),
        ]
    }

    async fn invoke(
        &self,
        action: &Action,
        _context: &TurnContext,
    ) -> anyhow::Result<serde_json::Value> {
        let params = match action {
            Action::EmotionalSupport(params) => params,
            other => anyhow::bail!("emotional_support received {:?}", other.tool_name()),
        };

        Ok(json!({
            "support_provided": params.intensity > 0.5,
            "support_message": Self::support_message(params.category),
            "intensity_level": params.intensity,
            "mood_addressed": params.category,
        }))
    }
}

/// The standard handler set.
pub fn default_registry(
    retrieval: Arc<RetrievalEngine>,
    database: Arc<QuoteDatabase>,
    default_section: &str,
) -> ToolRegistry {
    ToolRegistry::new(vec![
        Arc::new(ConversationFlowHandler),
        Arc::new(NavigationHandler::new(default_section)),
        Arc::new(QuoteFetchHandler::new(retrieval, database)),
        Arc::new(EmotionalSupportHandler),
    ])
}
