use lazy_static::lazy_static;
use regex::{Matches, Regex};
use std::collections::HashSet;
use std::sync::Arc;

/// Function words dropped by the default tokenizer.
pub const DEFAULT_STOP_WORDS: &[&str] = &[
    "the", "of", "in", "and", "to", "a", "an", "was", "for", "on", "with", "is", "by", "as", "at",
    "from", "that", "it", "were", "are", "has", "had", "also", "its", "this", "may", "be", "or",
];

lazy_static! {
    // whitespace plus the ASCII information separators U+001C..U+001F
    static ref WORD: Regex = Regex::new(r"[^\s\x1C-\x1F]+").expect("valid regex");
    static ref DEFAULT_STOPWORDS: Arc<HashSet<String>> =
        Arc::new(DEFAULT_STOP_WORDS.iter().map(|w| w.to_string()).collect());
}

/// Splits text into lower-cased terms, dropping stop words and words without
/// any alphanumeric character.
///
/// The stop-word set is shared behind an `Arc`, so clones are cheap and an
/// index and its queries always see the same list.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    stop_words: Arc<HashSet<String>>,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self { stop_words: DEFAULT_STOPWORDS.clone() }
    }
}

impl Tokenizer {
    /// Build a tokenizer with a custom stop-word list. Entries are lower-cased
    /// since they are compared against lower-cased words.
    pub fn with_stop_words<I, S>(stop_words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let stop_words = stop_words.into_iter().map(|w| w.as_ref().to_lowercase()).collect();
        Self { stop_words: Arc::new(stop_words) }
    }

    pub fn is_stop_word(&self, word: &str) -> bool {
        self.stop_words.contains(word)
    }

    pub fn stop_words(&self) -> &HashSet<String> {
        &self.stop_words
    }

    /// Lazily tokenize `text`. The position of a term is its index in the
    /// returned sequence; filtered words leave no gap.
    pub fn tokens<'t>(&'t self, text: &'t str) -> Tokens<'t> {
        Tokens { words: WORD.find_iter(text), stop_words: &self.stop_words }
    }
}

pub struct Tokens<'t> {
    words: Matches<'static, 't>,
    stop_words: &'t HashSet<String>,
}

impl<'t> Iterator for Tokens<'t> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            let word = self.words.next()?.as_str().to_lowercase();
            if word.chars().any(char::is_alphanumeric) && !self.stop_words.contains(&word) {
                return Some(word);
            }
        }
    }
}

/// Tokenize with the default stop words.
pub fn tokenize(text: &str) -> Vec<String> {
    Tokenizer::default().tokens(text).collect()
}
