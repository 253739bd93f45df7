//! Ordered transcript storage for a single chat session.

use crate::core::message::{Role, Turn};

/// Insertion-ordered list of turns. Grows only through [`Conversation::append_turn`]
/// and shrinks only through [`Conversation::reset`].
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_turn(&mut self, role: Role, text: impl Into<String>) {
        self.turns.push(Turn::new(role, text));
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn history(&self) -> &[Turn] {
        &self.turns
    }

    pub fn reset(&mut self) {
        self.turns.clear();
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_preserves_insertion_order() {
        let mut conversation = Conversation::new();
        let inputs = [
            (Role::User, "one"),
            (Role::Assistant, "two"),
            (Role::User, "three"),
            (Role::System, "four"),
            (Role::User, "five"),
        ];
        for (role, text) in inputs {
            conversation.append_turn(role, text);
        }

        let history: Vec<(Role, &str)> = conversation
            .history()
            .iter()
            .map(|turn| (turn.role(), turn.text()))
            .collect();
        assert_eq!(history, inputs.to_vec());
    }

    #[test]
    fn reset_is_idempotent() {
        let mut conversation = Conversation::new();
        for i in 0..10 {
            conversation.append_turn(Role::User, format!("message {i}"));
        }

        conversation.reset();
        assert!(conversation.is_empty());
        conversation.reset();
        assert!(conversation.is_empty());
        assert_eq!(conversation.len(), 0);
    }
}
