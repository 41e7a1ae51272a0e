//! Append-only history of the turns exchanged in one session.

use crate::core::message::Turn;

#[derive(Debug, Clone, Default)]
pub struct ConversationLog {
    turns: Vec<Turn>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Rendered `"<Role>: <text>"` lines in insertion order.
    ///
    /// The iterator is lazy; calling `render` again starts over from the first turn.
    pub fn render(&self) -> impl Iterator<Item = String> + '_ {
        self.turns.iter().map(Turn::render)
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Copy of the log with every failed exchange removed.
    ///
    /// A failed exchange is the user turn together with the diagnostic
    /// assistant turn that answered it.
    pub fn without_failed_exchanges(&self) -> ConversationLog {
        let mut kept = Vec::with_capacity(self.turns.len());
        let mut index = 0;
        while index < self.turns.len() {
            let turn = &self.turns[index];
            let answer = self.turns.get(index + 1);
            if turn.role().is_user() && answer.is_some_and(Turn::is_failed) {
                index += 2;
                continue;
            }
            if !turn.is_failed() {
                kept.push(turn.clone());
            }
            index += 1;
        }
        ConversationLog { turns: kept }
    }
}
