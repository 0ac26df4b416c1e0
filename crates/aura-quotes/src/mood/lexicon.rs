//! Phrase and keyword tables backing the classification cascade.
//!
//! Two tiers per category: a small set of high-signal multi-word phrases and
//! single-word indicators used by the first cascade stage, and a larger
//! extended table used by fast-mode analysis when the first stage stays
//! below the quick-exit threshold.

use std::collections::HashSet;

use crate::mood::verdict::MoodCategory;

struct CategoryTable {
    category: MoodCategory,
    phrases: &'static [&'static str],
    indicators: &'static [&'static str],
    extended: &'static [&'static str],
}

/// Tables in cascade priority order.
static TABLES: [CategoryTable; 4] = [
    CategoryTable {
        category: MoodCategory::Motivational,
        phrases: &[
            "stay motivated",
            "want to achieve",
            "reach my goals",
            "can't seem to",
            "get things done",
            "push myself",
        ],
        indicators: &[
            "goal", "goals", "achieve", "motivation", "motivated", "productivity",
            "productive", "challenge", "succeed", "success", "determination",
            "drive", "overcome", "effort", "progress", "ambition", "focus",
            "discipline",
        ],
        extended: &[
            "energy", "push", "habits", "workout", "fitness", "career",
            "procrastinating", "stuck", "lazy", "consistency", "persevere",
            "grind", "hustle",
        ],
    },
    CategoryTable {
        category: MoodCategory::Romantic,
        phrases: &[
            "deeply in love",
            "in love with",
            "miss them so much",
            "miss him so much",
            "miss her so much",
            "our anniversary",
            "valentine's day",
        ],
        indicators: &[
            "love", "relationship", "heart", "partner", "dating", "valentine",
            "anniversary", "crush", "romance", "romantic", "marriage",
            "proposal", "boyfriend", "girlfriend", "husband", "wife",
        ],
        extended: &[
            "soulmate", "wedding", "honeymoon", "darling", "affection",
            "propose", "feelings", "sweetheart",
        ],
    },
    CategoryTable {
        category: MoodCategory::Funny,
        phrases: &[
            "cheer me up",
            "make me laugh",
            "need a laugh",
            "need to laugh",
            "something funny",
            "comic relief",
            "crack me up",
        ],
        indicators: &[
            "laugh", "laughter", "humor", "joke", "jokes", "cheer", "comedy",
            "amusing", "witty", "hilarious", "smile", "silly", "playful",
            "lighthearted", "funny",
        ],
        extended: &[
            "fun", "entertain", "entertainment", "giggle", "chuckle", "prank",
            "sarcastic", "goofy", "comedian",
        ],
    },
    CategoryTable {
        category: MoodCategory::Inspirational,
        phrases: &[
            "meaning of life",
            "searching for meaning",
            "feeling lost",
            "need direction",
            "life's purpose",
            "inner peace",
            "going through changes",
        ],
        indicators: &[
            "meaning", "purpose", "wisdom", "spiritual", "hope", "faith",
            "guidance", "enlightenment", "philosophy", "inspire",
            "inspiration", "inspirational", "soul", "growth", "deeper",
        ],
        extended: &[
            "calling", "journey", "transformation", "awakening", "believe",
            "mindful", "destiny", "truth", "uplift",
        ],
    },
];

/// Greeting single words are matched as whole tokens so that e.g.
/// "hilarious" does not register as "hi".
static GREETING_WORDS: &[&str] = &["hello", "hi", "hey", "greetings", "yo", "howdy"];

static GREETING_PHRASES: &[&str] = &[
    "good morning",
    "good afternoon",
    "good evening",
    "what's up",
    "how are you",
    "just saying hi",
];

/// Intensity markers are counted independently of category matching; they
/// estimate how charged the message is, not what it is about.
static INTENSITY_MARKERS: &[&str] = &[
    "desperately",
    "really need",
    "so much",
    "awful",
    "terrible",
    "struggling",
    "deeply",
    "urgent",
    "crying",
    "heartbroken",
    "exhausted",
    "overwhelmed",
    "worst",
    "hopeless",
];

pub struct MoodLexicon;

impl MoodLexicon {
    /// Whether a high-signal multi-word phrase for the category is present.
    pub fn phrase_hit(text_lower: &str, category: MoodCategory) -> bool {
        TABLES
            .iter()
            .find(|table| table.category == category)
            .map(|table| table.phrases.iter().any(|p| text_lower.contains(p)))
            .unwrap_or(false)
    }

    /// Count of distinct single-word indicators present for a category.
    pub fn indicator_hits(text_lower: &str, category: MoodCategory) -> usize {
        let words = Self::word_set(text_lower);
        TABLES
            .iter()
            .find(|table| table.category == category)
            .map(|table| {
                table
                    .indicators
                    .iter()
                    .filter(|word| words.contains(**word))
                    .count()
            })
            .unwrap_or(0)
    }

    /// First category (in priority order) matching the larger fast-mode
    /// table: any indicator or extended keyword counts.
    pub fn extended_match(text_lower: &str) -> Option<MoodCategory> {
        let words = Self::word_set(text_lower);
        TABLES
            .iter()
            .find(|table| {
                table
                    .indicators
                    .iter()
                    .chain(table.extended.iter())
                    .any(|word| words.contains(*word))
            })
            .map(|table| table.category)
    }

    pub fn is_greeting(text_lower: &str) -> bool {
        if GREETING_PHRASES.iter().any(|p| text_lower.contains(p)) {
            return true;
        }
        let words = Self::word_set(text_lower);
        GREETING_WORDS.iter().any(|word| words.contains(*word))
    }

    /// Emotional-intensity estimate, independent of confidence.
    pub fn estimate_intensity(text_lower: &str) -> f32 {
        let hits = INTENSITY_MARKERS
            .iter()
            .filter(|marker| text_lower.contains(**marker))
            .count();
        (0.3 + hits as f32 * 0.15).clamp(0.0, 1.0)
    }

    /// Short free-text description of what the user needs for a category.
    pub fn user_need(category: MoodCategory) -> &'static str {
        match category {
            MoodCategory::Motivational => "motivation and drive",
            MoodCategory::Romantic => "love and connection",
            MoodCategory::Funny => "humor and lightness",
            MoodCategory::Inspirational => "meaning and guidance",
            MoodCategory::General => "support and connection",
        }
    }

    fn word_set(text_lower: &str) -> HashSet<&str> {
        text_lower
            .split(|c: char| !c.is_alphanumeric() && c != '\'')
            .filter(|w| !w.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phrase_hit_funny() {
        let text = "i desperately need something hilarious to cheer me up";
        assert!(MoodLexicon::phrase_hit(text, MoodCategory::Funny));
        assert!(!MoodLexicon::phrase_hit(text, MoodCategory::Romantic));
    }

    #[test]
    fn test_indicator_hits_counts_distinct_words() {
        let text = "my goal is success, real success through discipline";
        assert_eq!(
            MoodLexicon::indicator_hits(text, MoodCategory::Motivational),
            3
        );
    }

    #[test]
    fn test_greeting_word_boundaries() {
        assert!(MoodLexicon::is_greeting("hello"));
        assert!(MoodLexicon::is_greeting("hey there, what a day"));
        assert!(MoodLexicon::is_greeting("good morning everyone"));
        // "hi" inside a longer word must not count
        assert!(!MoodLexicon::is_greeting("something hilarious happened"));
    }

    #[test]
    fn test_extended_match_wider_than_indicators() {
        assert_eq!(
            MoodLexicon::extended_match("stop procrastinating already"),
            Some(MoodCategory::Motivational)
        );
        assert_eq!(MoodLexicon::extended_match("nothing relevant here"), None);
    }

    #[test]
    fn test_intensity_bounded() {
        assert!((MoodLexicon::estimate_intensity("calm words only") - 0.3).abs() < f32::EPSILON);
        let charged = "desperately struggling, awful terrible worst hopeless \
                       overwhelmed exhausted heartbroken crying deeply";
        assert!(MoodLexicon::estimate_intensity(charged) <= 1.0);
    }
}
