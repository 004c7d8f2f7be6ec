//! The ordered conversation sent to the endpoint on every turn.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{Message, MessageRole};

/// Why a turn was refused by [`Transcript`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TurnOrderError {
    /// A user turn arrived while the previous user turn is still unanswered.
    #[error("previous user turn has no reply yet")]
    UnansweredUser,
    /// An assistant turn arrived with no user turn to answer.
    #[error("no user turn awaiting a reply")]
    NothingToAnswer,
}

/// Ordered, append-only list of turns.
///
/// The first turn is always the single system message. After it, user and
/// assistant turns strictly alternate, except that the last turn may be an
/// unanswered user turn.
#[derive(Debug, Clone)]
pub struct Transcript {
    messages: Vec<Message>,
    started_at: DateTime<Utc>,
}

impl Transcript {
    /// Start a transcript with its system message.
    pub fn new(system: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system)],
            started_at: Utc::now(),
        }
    }

    /// Append a user turn.
    pub fn push_user(&mut self, content: impl Into<String>) -> Result<(), TurnOrderError> {
        if self.awaiting_reply() {
            return Err(TurnOrderError::UnansweredUser);
        }
        self.messages.push(Message::user(content));
        Ok(())
    }

    /// Append the assistant's reply to the pending user turn.
    pub fn push_assistant(&mut self, content: impl Into<String>) -> Result<(), TurnOrderError> {
        if !self.awaiting_reply() {
            return Err(TurnOrderError::NothingToAnswer);
        }
        self.messages.push(Message::assistant(content));
        Ok(())
    }

    /// Whether the last turn is a user turn with no reply.
    pub fn awaiting_reply(&self) -> bool {
        self.messages
            .last()
            .is_some_and(|m| m.role == MessageRole::User)
    }

    /// All turns, system message first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The system message.
    pub fn system(&self) -> &Message {
        &self.messages[0]
    }

    /// Total number of turns, including the system message.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Always `false`: the system message is never removed.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Number of user turns sent so far.
    pub fn user_turns(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| m.role == MessageRole::User)
            .count()
    }

    /// When the transcript was created.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_system_only() {
        let t = Transcript::new("persona");
        assert_eq!(t.len(), 1);
        assert_eq!(t.system().role, MessageRole::System);
        assert_eq!(t.system().content, "persona");
        assert!(!t.awaiting_reply());
        assert!(!t.is_empty());
    }

    #[test]
    fn alternating_turns_accepted() {
        let mut t = Transcript::new("sys");
        for i in 0..3 {
            t.push_user(format!("q{i}")).unwrap();
            assert!(t.awaiting_reply());
            t.push_assistant(format!("a{i}")).unwrap();
        }
        assert_eq!(t.len(), 7);
        assert_eq!(t.user_turns(), 3);

        let roles: Vec<MessageRole> = t.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles[0], MessageRole::System);
        for pair in roles[1..].chunks(2) {
            assert_eq!(pair, [MessageRole::User, MessageRole::Assistant]);
        }
    }

    #[test]
    fn double_user_rejected() {
        let mut t = Transcript::new("sys");
        t.push_user("one").unwrap();
        assert_eq!(t.push_user("two"), Err(TurnOrderError::UnansweredUser));
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn reply_without_question_rejected() {
        let mut t = Transcript::new("sys");
        assert_eq!(
            t.push_assistant("unprompted"),
            Err(TurnOrderError::NothingToAnswer)
        );
        t.push_user("q").unwrap();
        t.push_assistant("a").unwrap();
        assert_eq!(t.push_assistant("again"), Err(TurnOrderError::NothingToAnswer));
    }

    #[test]
    fn started_at_is_not_in_future() {
        let t = Transcript::new("sys");
        assert!(t.started_at() <= Utc::now());
    }
}
