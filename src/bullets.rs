//! Split summary text into short bullet points.

use lazy_static::lazy_static;
use regex::Regex;

/// Units shorter than this (in characters) are dropped as noise.
pub const MIN_BULLET_CHARS: usize = 10;

lazy_static! {
    static ref SENTENCE_BREAK: Regex = Regex::new(r"[.!?]\s+").expect("valid sentence pattern");
    static ref CLAUSE_BREAK: Regex = Regex::new(r"[\n;]+").expect("valid clause pattern");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulletSplitter {
    max_points: usize,
    min_chars: usize,
}

impl BulletSplitter {
    pub fn new(max_points: usize) -> Self {
        Self {
            max_points,
            min_chars: MIN_BULLET_CHARS,
        }
    }

    pub fn with_min_chars(mut self, min_chars: usize) -> Self {
        self.min_chars = min_chars;
        self
    }

    /// Split `text` into at most `max_points` bullets.
    ///
    /// Sentences are tried first. Text without any sentence punctuation, or
    /// whose sentences are all too short, is split on newlines and semicolons
    /// instead. Unpunctuated text whose clauses are all too short stays one
    /// unit. The result may be empty.
    pub fn split(&self, text: &str) -> Vec<String> {
        let text = text.trim();
        if text.is_empty() {
            return Vec::new();
        }

        let sentences = self.clean(SENTENCE_BREAK.split(text));
        let mut points = if text.contains(is_terminal) && !sentences.is_empty() {
            sentences
        } else {
            let clauses = self.clean(CLAUSE_BREAK.split(text));
            if clauses.is_empty() {
                sentences
            } else {
                clauses
            }
        };

        points.truncate(self.max_points);
        points
    }

    fn clean<'a>(&self, units: impl Iterator<Item = &'a str>) -> Vec<String> {
        units
            .map(|unit| strip_terminal_punctuation(unit.trim()))
            .filter(|unit| unit.chars().count() >= self.min_chars)
            .map(str::to_string)
            .collect()
    }
}

fn is_terminal(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

fn strip_terminal_punctuation(unit: &str) -> &str {
    unit.trim_end_matches(is_terminal).trim_end()
}
