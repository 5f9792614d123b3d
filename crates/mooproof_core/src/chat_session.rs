//! crates/mooproof_core/src/chat_session.rs
//!
//! Bookkeeping over a client-held follow-up conversation.
//!
//! Nothing here is persisted: the history travels with every request and the
//! server re-counts it each time, so the limit is enforced against whatever the
//! caller reports.

use crate::domain::{ChatRole, ChatTurn};
use crate::error::{ProofError, ProofResult};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatSession {
    limit: u32,
    turns: Vec<ChatTurn>,
}

impl ChatSession {
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            turns: Vec::new(),
        }
    }

    pub fn with_history(limit: u32, turns: Vec<ChatTurn>) -> Self {
        Self { limit, turns }
    }

    /// Builds a session from the serialized history a client sent.
    ///
    /// Anything that is not a JSON array of turns is treated as an empty history.
    pub fn from_json(limit: u32, raw: &str) -> Self {
        let turns = if raw.trim().is_empty() {
            Vec::new()
        } else {
            serde_json::from_str::<Vec<ChatTurn>>(raw).unwrap_or_default()
        };
        Self::with_history(limit, turns)
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn history(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.turns).unwrap_or_else(|_| "[]".to_string())
    }

    pub fn user_turns(&self) -> u32 {
        self.turns
            .iter()
            .filter(|turn| turn.role == ChatRole::User)
            .count() as u32
    }

    pub fn remaining(&self) -> u32 {
        self.limit.saturating_sub(self.user_turns())
    }

    pub fn is_exhausted(&self) -> bool {
        self.user_turns() >= self.limit
    }

    /// Records a new question, refusing it once the limit has been used up.
    pub fn begin_turn(&mut self, message: impl Into<String>) -> ProofResult<()> {
        if self.is_exhausted() {
            return Err(ProofError::ChatLimitReached);
        }
        self.turns.push(ChatTurn::user(message));
        Ok(())
    }

    /// Records the tutor's reply and returns the questions left.
    pub fn complete_turn(&mut self, reply: impl Into<String>) -> u32 {
        self.turns.push(ChatTurn::assistant(reply));
        self.remaining()
    }

    /// Drops an unanswered question so it does not count against the limit.
    pub fn abandon_turn(&mut self) {
        if matches!(self.turns.last(), Some(turn) if turn.role == ChatRole::User) {
            self.turns.pop();
        }
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remaining_counts_only_user_turns() {
        let session = ChatSession::with_history(
            3,
            vec![
                ChatTurn::user("a"),
                ChatTurn::assistant("b"),
                ChatTurn::user("c"),
            ],
        );
        assert_eq!(session.user_turns(), 2);
        assert_eq!(session.remaining(), 1);
    }

    #[test]
    fn full_history_rejects_another_question() {
        let mut session = ChatSession::with_history(
            3,
            vec![ChatTurn::user("1"), ChatTurn::user("2"), ChatTurn::user("3")],
        );
        assert!(matches!(
            session.begin_turn("4"),
            Err(ProofError::ChatLimitReached)
        ));
        assert_eq!(session.history().len(), 3);
    }

    #[test]
    fn a_full_turn_appends_both_sides() {
        let mut session = ChatSession::new(2);
        session.begin_turn("Why?").unwrap();
        let remaining = session.complete_turn("Because.");

        assert_eq!(remaining, 1);
        assert_eq!(
            session.history(),
            &[ChatTurn::user("Why?"), ChatTurn::assistant("Because.")]
        );
    }

    #[test]
    fn abandoned_questions_are_not_counted() {
        let mut session = ChatSession::new(1);
        session.begin_turn("Lost in transit").unwrap();
        session.abandon_turn();
        assert_eq!(session.remaining(), 1);
        assert!(session.history().is_empty());
    }

    #[test]
    fn history_json_is_parsed_leniently() {
        let raw = r#"[{"role":"user","content":"hi"},{"role":"system","content":"x"},{"role":"assistant"}]"#;
        let session = ChatSession::from_json(5, raw);
        assert_eq!(session.history().len(), 3);
        assert_eq!(session.user_turns(), 1);
        assert_eq!(session.history()[2], ChatTurn::assistant(""));

        assert!(ChatSession::from_json(5, "").history().is_empty());
        assert!(ChatSession::from_json(5, "{\"role\":\"user\"}").history().is_empty());
        assert!(ChatSession::from_json(5, "not json").history().is_empty());
    }
}
