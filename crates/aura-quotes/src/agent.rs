//! The turn pipeline: session context, classification, planning, tool
//! execution, response composition, and memory updates.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::actions::{default_registry, ActionOutcome, ToolRegistry, TurnContext};
use crate::composer::ResponseComposer;
use crate::config::Config;
use crate::learning::{bootstrap_training, FeedbackLearner};
use crate::llm_worker::OllamaWorker;
use crate::mood::{ClassifierSettings, MoodClassifier, MoodVerdict};
use crate::orchestrator::ToolOrchestrator;
use crate::quote_db::QuoteDatabase;
use crate::retrieval::records::{RecordPayload, VectorRecord};
use crate::retrieval::RetrievalEngine;
use crate::session::{SessionContext, SessionMessage, SessionStore};

/// Everything a completed turn produced.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub response: String,
    pub session_id: String,
    pub verdict: MoodVerdict,
    pub outcomes: Vec<ActionOutcome>,
    /// Similar past interactions and correction hints surfaced for this turn.
    pub retrieval_context: serde_json::Value,
}

pub struct QuoteAgent {
    config: Config,
    sessions: SessionStore,
    classifier: MoodClassifier,
    orchestrator: ToolOrchestrator,
    registry: ToolRegistry,
    retrieval: Arc<RetrievalEngine>,
    learner: FeedbackLearner,
    database: Arc<QuoteDatabase>,
}

impl QuoteAgent {
    pub fn new(config: Config, database: Arc<QuoteDatabase>) -> Self {
        let worker = Arc::new(OllamaWorker::new(
            config.ollama_host.clone(),
            config.ai_model.clone(),
        ));
        Self::with_worker(config, database, worker)
    }

    pub fn with_worker(
        config: Config,
        database: Arc<QuoteDatabase>,
        worker: Arc<OllamaWorker>,
    ) -> Self {
        let retrieval = Arc::new(RetrievalEngine::new(
            worker.clone(),
            database.clone(),
            config.embedding_dimension,
        ));
        let registry = default_registry(
            retrieval.clone(),
            database.clone(),
            &config.default_quote_section,
        );
        let classifier = MoodClassifier::new(ClassifierSettings::from(&config), Some(worker));
        let learner = FeedbackLearner::new(retrieval.clone());

        Self {
            orchestrator: ToolOrchestrator::new(&config),
            config,
            sessions: SessionStore::new(),
            classifier,
            registry,
            retrieval,
            learner,
            database,
        }
    }

    /// Process one inbound message. Classification and retrieval degrade
    /// internally; the session log is appended exactly once, after the
    /// response is composed, so a failed turn never leaves it truncated or
    /// duplicated.
    pub async fn process_message(
        &self,
        message: &str,
        session_id: Option<&str>,
    ) -> anyhow::Result<TurnOutcome> {
        let session_id = match session_id.filter(|id| !id.is_empty()) {
            Some(id) => id.to_string(),
            None => Uuid::new_v4().to_string(),
        };

        let context = self.sessions.context(&session_id);
        let verdict = self.classifier.classify(message, &context).await;
        debug!(
            "Verdict for session {}: {} ({:.2} via {})",
            session_id,
            verdict.category,
            verdict.confidence,
            verdict.analysis_method.as_str()
        );

        let plan = self.orchestrator.plan(message, &verdict, &context);
        let seed = self.turn_seed();
        let turn_context = TurnContext {
            session_id: session_id.clone(),
            seed,
        };
        let outcomes = self.registry.execute(&plan, &turn_context).await;
        let retrieval_context = self.gather_retrieval_context(message).await;
        let response = ResponseComposer::compose(&verdict, &outcomes, seed);

        let invoked_tools: Vec<String> = outcomes.iter().map(|o| o.tool.clone()).collect();
        self.sessions.append(
            &session_id,
            SessionMessage {
                timestamp: Utc::now(),
                user_text: message.to_string(),
                agent_text: response.clone(),
                verdict: verdict.clone(),
                invoked_tools: invoked_tools.clone(),
            },
        );

        self.persist_turn(
            &session_id,
            message,
            &response,
            &verdict,
            &outcomes,
            &retrieval_context,
        );

        // Successful interactions feed the conversation collection so
        // future retrieval can learn from them
        if let Err(e) = self
            .learner
            .record_outcome(
                message,
                &response,
                verdict.category,
                verdict.confidence,
                None,
                false,
            )
            .await
        {
            warn!("Interaction ingestion skipped: {}", e);
        }

        Ok(TurnOutcome {
            response,
            session_id,
            verdict,
            outcomes,
            retrieval_context,
        })
    }

    /// Similar well-received interactions plus correction hints for the
    /// current utterance. Degraded retrieval yields empty lists.
    async fn gather_retrieval_context(&self, message: &str) -> serde_json::Value {
        let similar = self.retrieval.search_conversations(message, 3).await;
        let corrections = self.retrieval.search_corrections(message).await;

        let similar_conversations: Vec<serde_json::Value> = similar
            .iter()
            .filter_map(|(record, similarity)| match &record.payload {
                RecordPayload::Interaction {
                    prompt, response, ..
                } => Some(json!({
                    "prompt": prompt,
                    "response": response,
                    "mood_category": record.category,
                    "similarity_score": similarity,
                    "quality_score": record.quality_score,
                })),
                _ => None,
            })
            .collect();

        let correction_hints: Vec<serde_json::Value> = corrections
            .iter()
            .filter_map(|(record, similarity)| match &record.payload {
                RecordPayload::Correction {
                    prompt,
                    corrected_response,
                    error_kind,
                    ..
                } => Some(json!({
                    "original_prompt": prompt,
                    "corrected_response": corrected_response,
                    "error_type": error_kind.as_str(),
                    "similarity_score": similarity,
                })),
                _ => None,
            })
            .collect();

        json!({
            "similar_conversations": similar_conversations,
            "correction_hints": correction_hints,
        })
    }

    /// Route explicit user feedback to the learner. The judged message's
    /// verdict is looked up in the session log; if it is no longer there the
    /// message is re-classified. Storage failures are logged, not surfaced.
    pub async fn record_feedback(
        &self,
        message: &str,
        response: &str,
        feedback: &str,
        session_id: Option<&str>,
        is_correction: bool,
    ) {
        let (category, confidence) = self.resolve_feedback_verdict(message, session_id).await;

        if let Err(e) = self
            .learner
            .record_outcome(
                message,
                response,
                category,
                confidence,
                Some(feedback),
                is_correction,
            )
            .await
        {
            warn!("Feedback ingestion failed: {}", e);
        }
    }

    async fn resolve_feedback_verdict(
        &self,
        message: &str,
        session_id: Option<&str>,
    ) -> (crate::mood::MoodCategory, f32) {
        if let Some(id) = session_id {
            if let Some(turn) = self
                .sessions
                .history(id)
                .into_iter()
                .rev()
                .find(|turn| turn.user_text == message)
            {
                return (turn.verdict.category, turn.verdict.confidence);
            }
        }

        let verdict = self
            .classifier
            .classify(message, &SessionContext::default())
            .await;
        (verdict.category, verdict.confidence)
    }

    /// One-time warm-up: embed the quote catalogue and the bootstrap
    /// training set. Individual embedding failures are skipped.
    pub async fn bootstrap(&self) -> anyhow::Result<()> {
        self.retrieval.ensure_initialized().await;

        let quotes = self.database.quotes.get_all(500)?;
        let mut ingested = 0;
        for quote in &quotes {
            let record = VectorRecord::quote(
                &quote.quote,
                &quote.author,
                crate::mood::MoodCategory::parse_lossy(&quote.category),
            );
            match self.retrieval.ingest(record).await {
                Ok(()) => ingested += 1,
                Err(e) => {
                    warn!("Quote embedding skipped ({}): {}", quote.id, e);
                }
            }
        }
        info!("Embedded {}/{} catalogue quotes", ingested, quotes.len());

        bootstrap_training(&self.learner).await;
        Ok(())
    }

    fn turn_seed(&self) -> u64 {
        self.config.rng_seed.unwrap_or_else(rand::random)
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn database(&self) -> &Arc<QuoteDatabase> {
        &self.database
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    fn persist_turn(
        &self,
        session_id: &str,
        message: &str,
        response: &str,
        verdict: &MoodVerdict,
        outcomes: &[ActionOutcome],
        retrieval_context: &serde_json::Value,
    ) {
        let metadata = json!({
            "mood_analysis": verdict,
            "tools_invoked": outcomes.iter().map(|o| o.tool.as_str()).collect::<Vec<_>>(),
            "tool_results": outcomes,
            "retrieval_context": retrieval_context,
        });

        if let Err(e) = self
            .database
            .conversations
            .save_message(session_id, "user", message, None)
        {
            warn!("Failed to persist user message: {}", e);
        }
        if let Err(e) =
            self.database
                .conversations
                .save_message(session_id, "assistant", response, Some(&metadata))
        {
            warn!("Failed to persist assistant message: {}", e);
        }
    }
}
