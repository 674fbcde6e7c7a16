use crate::models::chat::Turn;

/// Append-only transcript of one session.
///
/// Only successful exchanges are recorded; entries are never edited,
/// removed or reordered. The log lives as long as its session.
#[derive(Debug, Default, Clone)]
pub struct ChatLog {
    turns: Vec<Turn>,
}

impl ChatLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn all(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
