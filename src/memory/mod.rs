//! Bounded conversation memory.
//!
//! The memory is never kept between requests. Every cycle rebuilds it
//! from the session's append-only chat log, so the window can only ever
//! contain the `k` most recent completed turns.

use serde::{ Deserialize, Serialize };
use std::fmt;
use thiserror::Error;

use crate::models::chat::Turn;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("memory length must be between {min} and {max}, got {got}")]
pub struct InvalidWindowLength {
    pub got: usize,
    pub min: usize,
    pub max: usize,
}

/// Number of most recent turns handed to the model as context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct WindowLength(usize);

impl WindowLength {
    pub const MIN: usize = 1;
    pub const MAX: usize = 10;
    pub const DEFAULT: usize = 5;

    pub fn new(k: usize) -> Result<Self, InvalidWindowLength> {
        if (Self::MIN..=Self::MAX).contains(&k) {
            Ok(Self(k))
        } else {
            Err(InvalidWindowLength { got: k, min: Self::MIN, max: Self::MAX })
        }
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for WindowLength {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl TryFrom<usize> for WindowLength {
    type Error = InvalidWindowLength;

    fn try_from(k: usize) -> Result<Self, Self::Error> {
        Self::new(k)
    }
}

impl From<WindowLength> for usize {
    fn from(k: WindowLength) -> usize {
        k.0
    }
}

impl fmt::Display for WindowLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Snapshot of the last `k` turns of a chat log, oldest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationMemory<'a> {
    turns: &'a [Turn],
}

impl<'a> ConversationMemory<'a> {
    /// Keeps `min(k, turns.len())` trailing turns. Never fails.
    pub fn rebuild(turns: &'a [Turn], k: WindowLength) -> Self {
        let start = turns.len().saturating_sub(k.get());
        Self { turns: &turns[start..] }
    }

    pub fn turns(&self) -> &'a [Turn] {
        self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Renders as `Human: ..\nAI: ..` pairs joined by newlines. Empty
    /// memory renders as an empty string.
    pub fn render(&self) -> String {
        self.turns
            .iter()
            .map(|turn| format!("Human: {}\nAI: {}", turn.human, turn.assistant))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log_of(n: usize) -> Vec<Turn> {
        (1..=n).map(|i| Turn::new(format!("q{}", i), format!("a{}", i))).collect()
    }

    fn k(n: usize) -> WindowLength {
        WindowLength::new(n).unwrap()
    }

    #[test]
    fn empty_log_renders_empty_context() {
        let log: Vec<Turn> = Vec::new();
        let memory = ConversationMemory::rebuild(&log, WindowLength::default());
        assert!(memory.is_empty());
        assert_eq!(memory.render(), "");
    }

    #[test]
    fn keeps_last_three_of_seven() {
        let log = log_of(7);
        let memory = ConversationMemory::rebuild(&log, k(3));
        let humans: Vec<_> = memory.turns().iter().map(|t| t.human.as_str()).collect();
        assert_eq!(humans, ["q5", "q6", "q7"]);
    }

    #[test]
    fn retains_min_of_k_and_len_for_every_window() {
        for n in 0..=12 {
            let log = log_of(n);
            for window in WindowLength::MIN..=WindowLength::MAX {
                let memory = ConversationMemory::rebuild(&log, k(window));
                let expected = window.min(n);
                assert_eq!(memory.len(), expected, "n={} k={}", n, window);
                assert_eq!(memory.turns(), &log[n - expected..]);
            }
        }
    }

    #[test]
    fn render_format_and_idempotence() {
        let log = log_of(2);
        let memory = ConversationMemory::rebuild(&log, k(5));
        let first = memory.render();
        assert_eq!(first, "Human: q1\nAI: a1\nHuman: q2\nAI: a2");
        assert_eq!(first, memory.render());
    }

    #[test]
    fn shrinking_window_only_affects_next_rebuild() {
        let log = log_of(6);
        let wide = ConversationMemory::rebuild(&log, k(5)).render();
        let narrow = ConversationMemory::rebuild(&log, k(1)).render();
        assert_eq!(narrow, "Human: q6\nAI: a6");
        assert!(wide.starts_with("Human: q2"));
    }

    #[test]
    fn window_length_bounds() {
        assert!(WindowLength::new(0).is_err());
        assert!(WindowLength::new(11).is_err());
        assert_eq!(WindowLength::new(10).unwrap().get(), 10);
        assert_eq!(WindowLength::default().get(), 5);
        assert!(serde_json::from_str::<WindowLength>("42").is_err());
    }
}
