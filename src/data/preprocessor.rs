// ============================================================
// Layer 4 — Text Preprocessor
// ============================================================
// Turns an SMS into the word list the vocabulary is built from.
//
// The mobile app tokenises incoming messages the same way
// before looking words up in vocab.txt, so these rules are
// part of the exported contract:
//
//   1. Lower-case the whole text
//   2. Replace every filter character with a space
//   3. Split on the space character
//   4. Drop empty pieces
//
// Example:
//   "Rs. 15,400.00!"  →  ["rs", "15", "400", "00"]
//
// Apostrophes are NOT filtered, so "don't" stays one word.

/// Characters treated as separators.
pub const FILTERS: &str = "!\"#$%&()*+,-./:;<=>?@[\\]^_`{|}~\t\n";

/// The separator every filter character is replaced with
pub const SPLIT: char = ' ';

#[derive(Debug, Clone)]
pub struct Preprocessor {
    lower: bool,
}

impl Preprocessor {
    pub fn new() -> Self {
        Self { lower: true }
    }

    /// Apply lower-casing and the filter replacement without splitting.
    pub fn normalise(&self, text: &str) -> String {
        let text = if self.lower { text.to_lowercase() } else { text.to_string() };
        text.chars()
            .map(|c| if FILTERS.contains(c) { SPLIT } else { c })
            .collect()
    }

    /// Split a message into words.
    pub fn words(&self, text: &str) -> Vec<String> {
        self.normalise(text)
            .split(SPLIT)
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// The filter set as a regex character class, for tokenizers that
    /// need to reproduce `normalise`.
    pub fn filter_pattern(&self) -> String {
        let mut class = String::from("[");
        for c in FILTERS.chars() {
            match c {
                '\t' => class.push_str("\\t"),
                '\n' => class.push_str("\\n"),
                '\\' | '[' | ']' | '^' | '-' => {
                    class.push('\\');
                    class.push(c);
                }
                c => class.push(c),
            }
        }
        class.push(']');
        class
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}
