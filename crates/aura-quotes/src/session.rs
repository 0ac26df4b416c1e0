//! Per-session conversation state.
//!
//! Sessions are created on first reference and never destroyed by the core.
//! The message log is capacity-bounded (oldest entries evicted from the
//! front); the mood history is append-only and unbounded here, and callers
//! window it for profile statistics.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::mood::verdict::{MoodCategory, MoodVerdict};

/// Default capacity of the per-session message log.
pub const MESSAGE_LOG_CAPACITY: usize = 10;

/// One completed turn. Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMessage {
    pub timestamp: DateTime<Utc>,
    pub user_text: String,
    pub agent_text: String,
    pub verdict: MoodVerdict,
    pub invoked_tools: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub messages: Vec<SessionMessage>,
    pub mood_history: Vec<MoodVerdict>,
    pub preferences: HashMap<String, String>,
}

impl Session {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            created_at: Utc::now(),
            messages: Vec::new(),
            mood_history: Vec::new(),
            preferences: HashMap::new(),
        }
    }
}

/// Lock-free snapshot of session state taken at the start of a turn, so
/// classification and retrieval can run without holding the session lock.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    pub session_id: String,
    pub message_count: usize,
    /// Up to the last 3 (user, agent) exchanges, oldest first.
    pub recent_exchanges: Vec<(String, String)>,
    /// Up to the last 5 mood categories, oldest first.
    pub recent_moods: Vec<MoodCategory>,
}

/// Aggregate mood statistics over the recent history window.
#[derive(Debug, Clone)]
pub struct MoodProfile {
    pub favorite_categories: Vec<MoodCategory>,
    pub average_confidence: f32,
    pub interaction_count: usize,
}

/// Session registry with per-session exclusion. The map itself is sharded;
/// each session carries its own lock so concurrent turns for the same
/// session serialize their append step only.
pub struct SessionStore {
    sessions: DashMap<String, Arc<RwLock<Session>>>,
    capacity: usize,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::with_capacity(MESSAGE_LOG_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            capacity,
        }
    }

    /// Get or create session state.
    pub fn get_or_create(&self, session_id: &str) -> Arc<RwLock<Session>> {
        // Fast path: existing session
        if let Some(session) = self.sessions.get(session_id) {
            return session.clone();
        }

        // Slow path: create; entry() keeps concurrent creators from racing
        self.sessions
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(RwLock::new(Session::new(session_id))))
            .clone()
    }

    /// Append a completed turn, evicting from the front until the log is
    /// back within capacity. The verdict is also recorded in the unbounded
    /// mood history.
    pub fn append(&self, session_id: &str, message: SessionMessage) {
        let session = self.get_or_create(session_id);
        let mut guard = session.write().unwrap();
        guard.mood_history.push(message.verdict.clone());
        guard.messages.push(message);
        while guard.messages.len() > self.capacity {
            guard.messages.remove(0);
        }
    }

    /// Ordered copy of the message log.
    pub fn history(&self, session_id: &str) -> Vec<SessionMessage> {
        match self.sessions.get(session_id) {
            Some(session) => session.read().unwrap().messages.clone(),
            None => Vec::new(),
        }
    }

    /// Snapshot the state a turn needs, then release the lock.
    pub fn context(&self, session_id: &str) -> SessionContext {
        let session = self.get_or_create(session_id);
        let guard = session.read().unwrap();

        let recent_exchanges = guard
            .messages
            .iter()
            .rev()
            .take(3)
            .rev()
            .map(|m| (m.user_text.clone(), m.agent_text.clone()))
            .collect();

        let recent_moods = guard
            .mood_history
            .iter()
            .rev()
            .take(5)
            .rev()
            .map(|v| v.category)
            .collect();

        SessionContext {
            session_id: guard.id.clone(),
            message_count: guard.messages.len(),
            recent_exchanges,
            recent_moods,
        }
    }

    /// Profile statistics over the last 5 moods.
    pub fn mood_profile(&self, session_id: &str) -> MoodProfile {
        let session = self.get_or_create(session_id);
        let guard = session.read().unwrap();

        let window: Vec<&MoodVerdict> = guard.mood_history.iter().rev().take(5).collect();
        let mut counts: HashMap<MoodCategory, usize> = HashMap::new();
        for verdict in &window {
            *counts.entry(verdict.category).or_insert(0) += 1;
        }

        let mut ranked: Vec<(MoodCategory, usize)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.as_str().cmp(b.0.as_str())));

        let average_confidence = if window.is_empty() {
            0.0
        } else {
            window.iter().map(|v| v.confidence).sum::<f32>() / window.len() as f32
        };

        MoodProfile {
            favorite_categories: ranked.into_iter().take(2).map(|(c, _)| c).collect(),
            average_confidence,
            interaction_count: guard.messages.len(),
        }
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mood::verdict::AnalysisMethod;

    fn turn(n: usize) -> SessionMessage {
        SessionMessage {
            timestamp: Utc::now(),
            user_text: format!("message {}", n),
            agent_text: format!("reply {}", n),
            verdict: MoodVerdict::new(
                MoodCategory::General,
                0.5,
                0.3,
                "support",
                AnalysisMethod::Fallback,
            ),
            invoked_tools: vec!["conversation_manager".to_string()],
        }
    }

    #[test]
    fn test_get_or_create_reuses_session() {
        let store = SessionStore::new();
        let a = store.get_or_create("s1");
        let b = store.get_or_create("s1");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(store.session_count(), 1);
    }

    #[test]
    fn test_append_never_exceeds_capacity() {
        let store = SessionStore::new();
        for n in 1..=11 {
            store.append("s1", turn(n));
            assert!(store.history("s1").len() <= MESSAGE_LOG_CAPACITY);
        }
    }

    #[test]
    fn test_eleven_appends_keep_last_ten_in_order() {
        let store = SessionStore::new();
        for n in 1..=11 {
            store.append("s1", turn(n));
        }

        let history = store.history("s1");
        assert_eq!(history.len(), 10);
        let expected: Vec<String> = (2..=11).map(|n| format!("message {}", n)).collect();
        let actual: Vec<String> = history.iter().map(|m| m.user_text.clone()).collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_mood_history_is_unbounded() {
        let store = SessionStore::new();
        for n in 1..=25 {
            store.append("s1", turn(n));
        }
        let session = store.get_or_create("s1");
        assert_eq!(session.read().unwrap().mood_history.len(), 25);
    }

    #[test]
    fn test_context_snapshot_windows() {
        let store = SessionStore::new();
        for n in 1..=6 {
            store.append("s1", turn(n));
        }
        let ctx = store.context("s1");
        assert_eq!(ctx.message_count, 6);
        assert_eq!(ctx.recent_exchanges.len(), 3);
        assert_eq!(ctx.recent_exchanges[0].0, "message 4");
        assert_eq!(ctx.recent_moods.len(), 5);
    }

    #[test]
    fn test_history_for_unknown_session_is_empty() {
        let store = SessionStore::new();
        assert!(store.history("nope").is_empty());
    }

    #[test]
    fn test_mood_profile_windows_last_five() {
        let store = SessionStore::new();
        let mut message = turn(1);
        message.verdict = MoodVerdict::new(
            MoodCategory::Funny,
            0.9,
            0.4,
            "humor and lightness",
            AnalysisMethod::PhraseCascade,
        );
        for _ in 0..3 {
            store.append("s1", message.clone());
        }
        store.append("s1", turn(2));

        let profile = store.mood_profile("s1");
        assert_eq!(profile.favorite_categories[0], MoodCategory::Funny);
        assert_eq!(profile.interaction_count, 4);
        assert!(profile.average_confidence > 0.0);
    }

    #[test]
    fn test_concurrent_appends_serialize() {
        let store = Arc::new(SessionStore::new());
        let mut handles = Vec::new();
        for n in 0..8 {
            let store = store.clone();
            handles.push(std::thread::spawn(move || {
                for i in 0..5 {
                    store.append("shared", turn(n * 10 + i));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let session = store.get_or_create("shared");
        let guard = session.read().unwrap();
        assert_eq!(guard.messages.len(), MESSAGE_LOG_CAPACITY);
        assert_eq!(guard.mood_history.len(), 40);
    }
}
