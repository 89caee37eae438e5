//! Word Provider: the vocabulary plus masking and guess matching.

use std::collections::HashSet;

use rand::{Rng, seq::SliceRandom};

use super::error::WordError;

/// Number of candidate words offered to the drawer each round.
pub const WORD_CHOICES: usize = 3;

/// In-memory vocabulary loaded once at startup.
#[derive(Debug, Clone)]
pub struct WordProvider {
    words: Vec<String>,
}

impl WordProvider {
    /// Build a provider from a list of words.
    ///
    /// Blank entries are dropped and duplicates are removed (first occurrence
    /// wins). Fails when fewer than [`WORD_CHOICES`] words remain, since a
    /// round could not be started.
    pub fn new<I, S>(words: I) -> Result<Self, WordError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let words: Vec<String> = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_string())
            .filter(|w| !w.is_empty())
            .filter(|w| seen.insert(w.to_lowercase()))
            .collect();

        if words.len() < WORD_CHOICES {
            return Err(WordError::EmptyVocabulary {
                requested: WORD_CHOICES,
                available: words.len(),
            });
        }

        Ok(Self { words })
    }

    /// Parse a line-delimited word list.
    pub fn from_lines(contents: &str) -> Result<Self, WordError> {
        Self::new(contents.lines())
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Pick `n` distinct words uniformly at random.
    pub fn pick_words<R: Rng>(&self, n: usize, rng: &mut R) -> Result<Vec<String>, WordError> {
        if n > self.words.len() {
            return Err(WordError::EmptyVocabulary {
                requested: n,
                available: self.words.len(),
            });
        }
        Ok(self.words.choose_multiple(rng, n).cloned().collect())
    }

    /// Pick one word from the whole vocabulary.
    pub fn random_word<R: Rng>(&self, rng: &mut R) -> String {
        // the constructor guarantees at least WORD_CHOICES words
        let index = rng.gen_range(0..self.words.len());
        self.words[index].clone()
    }
}

/// Replace every non-space character with a blank, keeping the spacing.
///
/// ```
/// use sketchroom_server::domain::mask_word;
///
/// assert_eq!(mask_word("ice cream"), "___ _____");
/// ```
pub fn mask_word(word: &str) -> String {
    word.chars()
        .map(|c| if c == ' ' { ' ' } else { '_' })
        .collect()
}

/// Whether a chat message is the secret word, ignoring case and surrounding whitespace.
pub fn matches_word(message: &str, word: &str) -> bool {
    message.trim().to_lowercase() == word.trim().to_lowercase()
}
