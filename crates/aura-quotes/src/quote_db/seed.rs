//! Starter quote catalogue, loaded when the quotes table is empty

use tracing::info;

use crate::quote_db::QuoteDatabase;

pub const SEED_QUOTES: &[(&str, &str, &str)] = &[
    // Motivational
    ("motivational", "The only way to do great work is to love what you do.", "Steve Jobs"),
    ("motivational", "Success is not final, failure is not fatal: it is the courage to continue that counts.", "Winston Churchill"),
    ("motivational", "The way to get started is to quit talking and begin doing.", "Walt Disney"),
    ("motivational", "Great things never come from comfort zones.", "Unknown"),
    ("motivational", "Don't stop when you're tired. Stop when you're done.", "Unknown"),
    ("motivational", "Do something today that your future self will thank you for.", "Sean Patrick Flanery"),
    ("motivational", "The key to success is to focus on goals, not obstacles.", "Unknown"),
    ("motivational", "Difficult roads often lead to beautiful destinations.", "Unknown"),
    // Romantic
    ("romantic", "You know you're in love when you can't fall asleep because reality is finally better than your dreams.", "Dr. Seuss"),
    ("romantic", "Being deeply loved by someone gives you strength, while loving someone deeply gives you courage.", "Lao Tzu"),
    ("romantic", "The best love is the kind that awakens the soul and makes us reach for more.", "Nicholas Sparks"),
    ("romantic", "I love you not only for what you are, but for what I am when I am with you.", "Elizabeth Barrett Browning"),
    ("romantic", "You are my sun, my moon, and all my stars.", "E.E. Cummings"),
    ("romantic", "Whatever our souls are made of, his and mine are the same.", "Emily Brontë"),
    ("romantic", "Grow old with me! The best is yet to be.", "Robert Browning"),
    ("romantic", "I fell in love the way you fall asleep: slowly, and then all at once.", "John Green"),
    // Funny
    ("funny", "I'm not lazy, I'm just on energy saving mode.", "Unknown"),
    ("funny", "I told my wife she was drawing her eyebrows too high. She looked surprised.", "Unknown"),
    ("funny", "Why don't scientists trust atoms? Because they make up everything!", "Unknown"),
    ("funny", "I'm not arguing, I'm just explaining why I'm right.", "Unknown"),
    ("funny", "Behind every successful person is a substantial amount of coffee.", "Unknown"),
    ("funny", "My bed is a magical place where I suddenly remember everything I forgot to do.", "Unknown"),
    ("funny", "Life is short. Smile while you still have teeth.", "Unknown"),
    ("funny", "The early bird might get the worm, but the second mouse gets the cheese.", "Unknown"),
    // Inspirational
    ("inspirational", "The future belongs to those who believe in the beauty of their dreams.", "Eleanor Roosevelt"),
    ("inspirational", "It is during our darkest moments that we must focus to see the light.", "Aristotle"),
    ("inspirational", "Believe you can and you're halfway there.", "Theodore Roosevelt"),
    ("inspirational", "In the middle of difficulty lies opportunity.", "Albert Einstein"),
    ("inspirational", "The only person you are destined to become is the person you decide to be.", "Ralph Waldo Emerson"),
    ("inspirational", "You are never too old to set another goal or to dream a new dream.", "C.S. Lewis"),
    ("inspirational", "Life is 10% what happens to you and 90% how you react to it.", "Charles R. Swindoll"),
    ("inspirational", "It does not matter how slowly you go as long as you do not stop.", "Confucius"),
];

/// Insert the starter catalogue when the table is empty. Returns the number
/// of quotes inserted.
pub fn seed_quotes(db: &QuoteDatabase) -> anyhow::Result<usize> {
    if db.quotes.count()? > 0 {
        return Ok(0);
    }

    for (category, quote, author) in SEED_QUOTES {
        db.quotes.insert(category, quote, author)?;
    }

    info!("Seeded {} starter quotes", SEED_QUOTES.len());
    Ok(SEED_QUOTES.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_populates_empty_database() {
        let db = QuoteDatabase::new_in_memory().unwrap();
        let inserted = seed_quotes(&db).unwrap();
        assert_eq!(inserted, SEED_QUOTES.len());
        assert!(!db.quotes.get_by_category("funny", 5).unwrap().is_empty());
    }

    #[test]
    fn test_seed_skips_populated_database() {
        let db = QuoteDatabase::new_in_memory().unwrap();
        seed_quotes(&db).unwrap();
        assert_eq!(seed_quotes(&db).unwrap(), 0);
    }

    #[test]
    fn test_seed_covers_all_specific_categories() {
        for category in ["motivational", "romantic", "funny", "inspirational"] {
            assert!(SEED_QUOTES.iter().any(|(c, _, _)| *c == category));
        }
    }
}
