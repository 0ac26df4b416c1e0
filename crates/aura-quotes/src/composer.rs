//! Assembles the final reply from the verdict, the executed action
//! outcomes, and the navigation target. Pure templating: acknowledgment,
//! quote block, navigation line, optional support line. Template choice is
//! seeded so tests can assert exact output.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::actions::ActionOutcome;
use crate::mood::verdict::{AnalysisMethod, MoodCategory, MoodVerdict};

const GREETING_RESPONSES: &[&str] = &[
    "Hello! I'm your companion for mood-based quote recommendations. How are you feeling today?",
    "Hi there! I'm here to understand how you feel and find the perfect quotes for your mood. What's on your mind?",
    "Welcome! Tell me how you're feeling and I'll find quotes that fit the moment.",
];

const MOTIVATIONAL_ACKS: &[&str] = &[
    "I can sense you're looking for some motivation and drive! Let me find quotes that will energize you.",
    "Motivation is what you need right now - let's find that inner fire with the right quotes.",
];

const ROMANTIC_ACKS: &[&str] = &[
    "I can feel the romance in your message. Let me find quotes that speak to your heart.",
    "Romance is in the air! Whether it's celebration or longing, here are words that capture those feelings.",
];

const FUNNY_ACKS: &[&str] = &[
    "You're in need of some humor and laughter! Life's better with a smile - let me brighten your day.",
    "I can tell you want something funny and uplifting. Laughter is the best medicine!",
];

const INSPIRATIONAL_ACKS: &[&str] = &[
    "I sense you're seeking deeper meaning and inspiration. Let me find quotes that will uplift your spirit.",
    "Looking for inspiration and wisdom, I see. Here are thoughts to guide your journey.",
];

const GENERAL_ACKS: &[&str] = &["I'm here to help you find great quotes for any moment."];

pub struct ResponseComposer;

impl ResponseComposer {
    /// Compose the reply text for a turn.
    pub fn compose(verdict: &MoodVerdict, outcomes: &[ActionOutcome], seed: u64) -> String {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut response = Self::pick(Self::acknowledgments(verdict), &mut rng).to_string();

        if let Some(output) = Self::successful_output(outcomes, "quote_fetcher") {
            if let Some(first) = output["quotes"].as_array().and_then(|quotes| quotes.first()) {
                let quote = first["quote"].as_str().unwrap_or_default();
                let author = first["author"].as_str().unwrap_or("Unknown");
                if !quote.is_empty() {
                    response.push_str(&format!("\n\n\u{275d} {} \u{275e}\n\u{2014} {}", quote, author));
                }
            }
        }

        if let Some(output) = Self::successful_output(outcomes, "quote_navigator") {
            if let Some(page) = output["recommended_page"].as_str() {
                response.push_str(&format!(
                    "\n\nExplore more {} quotes: {}",
                    verdict.category, page
                ));
            }
        }

        if let Some(output) = Self::successful_output(outcomes, "emotional_support") {
            if let Some(message) = output["support_message"].as_str() {
                response.push_str(&format!("\n\n{}", message));
            }
        }

        response
    }

    fn acknowledgments(verdict: &MoodVerdict) -> &'static [&'static str] {
        if verdict.analysis_method == AnalysisMethod::Greeting {
            return GREETING_RESPONSES;
        }
        match verdict.category {
            MoodCategory::Motivational => MOTIVATIONAL_ACKS,
            MoodCategory::Romantic => ROMANTIC_ACKS,
            MoodCategory::Funny => FUNNY_ACKS,
            MoodCategory::Inspirational => INSPIRATIONAL_ACKS,
            MoodCategory::General => GENERAL_ACKS,
        }
    }

    fn pick<'a>(templates: &'a [&'a str], rng: &mut StdRng) -> &'a str {
        templates[rng.gen_range(0..templates.len())]
    }

    fn successful_output<'a>(
        outcomes: &'a [ActionOutcome],
        tool: &str,
    ) -> Option<&'a serde_json::Value> {
        outcomes
            .iter()
            .find(|o| o.tool == tool && o.error.is_none())
            .map(|o| &o.output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn verdict(category: MoodCategory, method: AnalysisMethod) -> MoodVerdict {
        MoodVerdict::new(category, 0.9, 0.4, "need", method)
    }

    fn quote_outcome() -> ActionOutcome {
        ActionOutcome {
            tool: "quote_fetcher".to_string(),
            output: json!({
                "quotes": [{"quote": "Dream bigger. Do bigger.", "author": "Unknown"}],
                "source": "semantic_search",
            }),
            error: None,
        }
    }

    fn navigation_outcome() -> ActionOutcome {
        ActionOutcome {
            tool: "quote_navigator".to_string(),
            output: json!({"recommended_page": "/quotes/motivational"}),
            error: None,
        }
    }

    #[test]
    fn test_compose_is_deterministic_for_a_seed() {
        let verdict = verdict(MoodCategory::Funny, AnalysisMethod::PhraseCascade);
        let a = ResponseComposer::compose(&verdict, &[], 9);
        let b = ResponseComposer::compose(&verdict, &[], 9);
        assert_eq!(a, b);
    }

    #[test]
    fn test_compose_includes_quote_and_navigation() {
        let verdict = verdict(MoodCategory::Motivational, AnalysisMethod::PhraseCascade);
        let response = ResponseComposer::compose(
            &verdict,
            &[quote_outcome(), navigation_outcome()],
            0,
        );

        assert!(response.contains("Dream bigger. Do bigger."));
        assert!(response.contains("\u{2014} Unknown"));
        assert!(response.contains("Explore more motivational quotes: /quotes/motivational"));
    }

    #[test]
    fn test_compose_greeting_uses_greeting_template() {
        let verdict = verdict(MoodCategory::General, AnalysisMethod::Greeting);
        let response = ResponseComposer::compose(&verdict, &[], 0);
        assert!(GREETING_RESPONSES.iter().any(|t| response.starts_with(t)));
    }

    #[test]
    fn test_compose_skips_failed_outcomes() {
        let failed = ActionOutcome {
            tool: "quote_fetcher".to_string(),
            output: serde_json::Value::Null,
            error: Some("boom".to_string()),
        };
        let verdict = verdict(MoodCategory::Funny, AnalysisMethod::PhraseCascade);
        let response = ResponseComposer::compose(&verdict, &[failed], 0);
        assert!(!response.contains('\u{275d}'));
    }

    #[test]
    fn test_compose_appends_support_message() {
        let support = ActionOutcome {
            tool: "emotional_support".to_string(),
            output: json!({"support_message": "Keep that sense of humor alive."}),
            error: None,
        };
        let verdict = verdict(MoodCategory::Funny, AnalysisMethod::PhraseCascade);
        let response = ResponseComposer::compose(&verdict, &[support], 0);
        assert!(response.ends_with("Keep that sense of humor alive."));
    }
}
