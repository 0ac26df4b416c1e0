pub mod actions;
pub mod agent;
#[cfg(feature = "cli")]
pub mod api;
pub mod composer;
pub mod config;
pub mod learning;
pub mod llm_worker;
pub mod mood;
pub mod orchestrator;
pub mod quote_db;
pub mod retrieval;
pub mod session;
pub mod telemetry;
pub mod utils;

// Public API exports
pub use agent::{QuoteAgent, TurnOutcome};
pub use config::{ClassifierMode, Config};
pub use mood::{AnalysisMethod, MoodCategory, MoodClassifier, MoodVerdict};
pub use orchestrator::{Action, ActionPlan, ToolOrchestrator};
pub use retrieval::RetrievalEngine;
pub use session::SessionStore;
