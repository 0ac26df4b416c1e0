use anyhow::Result;
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use tracing::{info, warn};

/// Which deep-analysis stage the mood classifier runs when the phrase
/// cascade does not short-circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierMode {
    /// Keyword tables only, no model call.
    Fast,
    /// Constrained model call with a short prompt, keyword fallback.
    Hybrid,
    /// Model call with recent history and worked examples, keyword fallback.
    Full,
}

impl FromStr for ClassifierMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "fast" => Ok(ClassifierMode::Fast),
            "hybrid" => Ok(ClassifierMode::Hybrid),
            "full" => Ok(ClassifierMode::Full),
            other => Err(anyhow::anyhow!("Unknown classifier mode: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub ai_model: String,
    pub ollama_host: String,
    pub classifier_mode: ClassifierMode,
    pub llm_timeout_seconds: u64,
    pub quick_exit_confidence: f32,
    pub phrase_confidence: f32,
    pub keyword_confidence: f32,
    pub greeting_confidence: f32,
    pub quote_confidence_threshold: f32,
    pub support_intensity_threshold: f32,
    pub embedding_dimension: usize,
    pub database_path: String,
    pub default_quote_section: String,
    pub api_host: String,
    pub api_port: u16,
    pub rng_seed: Option<u64>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let ai_model = env::var("AI_MODEL").unwrap_or_else(|_| "llama3.2:1b".into());
        let ollama_host =
            env::var("OLLAMA_HOST").unwrap_or_else(|_| "http://localhost:11434".into());

        let classifier_mode = match env::var("CLASSIFIER_MODE") {
            Ok(raw) => raw.parse().unwrap_or_else(|e| {
                warn!("{}. Falling back to hybrid mode.", e);
                ClassifierMode::Hybrid
            }),
            Err(_) => ClassifierMode::Hybrid,
        };

        let rng_seed = match env::var("RNG_SEED") {
            Ok(raw) => match raw.parse::<u64>() {
                Ok(seed) => Some(seed),
                Err(_) => {
                    warn!("RNG_SEED is not a valid u64, ignoring: {}", raw);
                    None
                }
            },
            Err(_) => None,
        };

        let config = Self {
            ai_model,
            ollama_host,
            classifier_mode,
            llm_timeout_seconds: Self::env_u64("LLM_TIMEOUT_SECONDS", 8),
            quick_exit_confidence: Self::env_f32("QUICK_EXIT_CONFIDENCE", 0.85),
            phrase_confidence: Self::env_f32("PHRASE_CONFIDENCE", 0.92),
            keyword_confidence: Self::env_f32("KEYWORD_CONFIDENCE", 0.87),
            greeting_confidence: Self::env_f32("GREETING_CONFIDENCE", 0.95),
            quote_confidence_threshold: Self::env_f32("QUOTE_CONFIDENCE_THRESHOLD", 0.3),
            support_intensity_threshold: Self::env_f32("SUPPORT_INTENSITY_THRESHOLD", 0.6),
            embedding_dimension: Self::env_u64("EMBEDDING_DIMENSION", 384) as usize,
            database_path: env::var("DATABASE_PATH").unwrap_or_else(|_| "./aura.db".into()),
            default_quote_section: env::var("DEFAULT_QUOTE_SECTION")
                .unwrap_or_else(|_| "/quotes".into()),
            api_host: env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".into()),
            api_port: Self::env_u64("API_PORT", 8000) as u16,
            rng_seed,
        };

        info!(
            "Classifier configuration: mode {:?}, quick exit {:.2}, model {}",
            config.classifier_mode, config.quick_exit_confidence, config.ai_model
        );

        Ok(config)
    }

    fn env_u64(key: &str, default: u64) -> u64 {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    fn env_f32(key: &str, default: f32) -> f32 {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    pub fn print_config(&self) {
        info!("Current Configuration:");
        info!("- AI Model: {}", self.ai_model);
        info!("- Ollama Host: {}", self.ollama_host);
        info!("- Classifier Mode: {:?}", self.classifier_mode);
        info!("- LLM Timeout: {}s", self.llm_timeout_seconds);
        info!("- Quick Exit Confidence: {:.2}", self.quick_exit_confidence);
        info!("- Embedding Dimension: {}", self.embedding_dimension);
        info!("- Database Path: {}", self.database_path);
        info!("- API: {}:{}", self.api_host, self.api_port);
    }

    pub fn api_addr(&self) -> SocketAddr {
        format!("{}:{}", self.api_host, self.api_port)
            .parse()
            .expect("API host/port must form a valid socket address")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ai_model: "llama3.2:1b".to_string(),
            ollama_host: "http://localhost:11434".to_string(),
            classifier_mode: ClassifierMode::Hybrid,
            llm_timeout_seconds: 8,
            quick_exit_confidence: 0.85,
            phrase_confidence: 0.92,
            keyword_confidence: 0.87,
            greeting_confidence: 0.95,
            quote_confidence_threshold: 0.3,
            support_intensity_threshold: 0.6,
            embedding_dimension: 384,
            database_path: "./aura.db".to_string(),
            default_quote_section: "/quotes".to_string(),
            api_host: "127.0.0.1".to_string(),
            api_port: 8000,
            rng_seed: None,
        }
    }
}
