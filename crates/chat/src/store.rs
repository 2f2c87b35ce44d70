use snafu::{OptionExt, ensure};

use crate::error::{ChatResult, DuplicateIdSnafu, IndexOutOfRangeSnafu};
use crate::message::{ConversationSession, Message};

/// Read-only listing row for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub index: usize,
    pub id: String,
    pub message_count: usize,
    pub active: bool,
}

/// Owns every conversation session and the active selection.
///
/// Insertion order is display order. `active_index`, when set, always points at
/// an existing session.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    sessions: Vec<ConversationSession>,
    active_index: Option<usize>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store pre-populated with empty sessions, none selected.
    pub fn with_sessions<I, S>(ids: I) -> ChatResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut store = Self::new();
        for id in ids {
            store.create_session(id)?;
        }
        Ok(store)
    }

    pub fn create_session(&mut self, id: impl Into<String>) -> ChatResult<usize> {
        let id = id.into();
        ensure!(
            self.position(&id).is_none(),
            DuplicateIdSnafu {
                stage: "store-create-session",
                id,
            }
        );

        self.sessions.push(ConversationSession::new(id));
        Ok(self.sessions.len() - 1)
    }

    pub fn select_session(&mut self, index: usize) -> ChatResult<()> {
        self.check_index(index, "store-select-session")?;
        self.active_index = Some(index);
        Ok(())
    }

    pub fn append_message(&mut self, index: usize, message: Message) -> ChatResult<()> {
        let len = self.sessions.len();
        let session = self.sessions.get_mut(index).context(IndexOutOfRangeSnafu {
            stage: "store-append-message",
            index,
            len,
        })?;
        session.push(message);
        Ok(())
    }

    pub fn active_session(&self) -> Option<&ConversationSession> {
        self.active_index.and_then(|index| self.sessions.get(index))
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active_index
    }

    pub fn session(&self, index: usize) -> Option<&ConversationSession> {
        self.sessions.get(index)
    }

    /// Index of the session named `id`, if any.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.sessions.iter().position(|session| session.id() == id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn summaries(&self) -> Vec<SessionSummary> {
        self.sessions
            .iter()
            .enumerate()
            .map(|(index, session)| SessionSummary {
                index,
                id: session.id().to_string(),
                message_count: session.len(),
                active: self.active_index == Some(index),
            })
            .collect()
    }

    fn check_index(&self, index: usize, stage: &'static str) -> ChatResult<()> {
        ensure!(
            index < self.sessions.len(),
            IndexOutOfRangeSnafu {
                stage,
                index,
                len: self.sessions.len(),
            }
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChatError;
    use crate::message::Sender;

    #[test]
    fn appended_messages_keep_call_order() {
        let mut store = SessionStore::with_sessions(["A"]).unwrap();
        for turn in 0..50 {
            store
                .append_message(0, Message::user(format!("turn-{turn}")))
                .unwrap();
        }

        let texts = store
            .session(0)
            .unwrap()
            .messages()
            .iter()
            .map(|message| message.text().to_string())
            .collect::<Vec<_>>();
        let expected = (0..50).map(|turn| format!("turn-{turn}")).collect::<Vec<_>>();
        assert_eq!(texts, expected);
    }

    #[test]
    fn duplicate_id_is_rejected_and_store_is_unchanged() {
        let mut store = SessionStore::new();
        assert_eq!(store.create_session("S1").unwrap(), 0);

        let err = store.create_session("S1").unwrap_err();
        assert!(matches!(err, ChatError::DuplicateId { ref id, .. } if id == "S1"));
        assert_eq!(store.len(), 1);
        assert_eq!(
            store.summaries().iter().filter(|row| row.id == "S1").count(),
            1
        );
    }

    #[test]
    fn initial_ids_must_be_unique() {
        let err = SessionStore::with_sessions(["A", "B", "A"]).unwrap_err();
        assert!(matches!(err, ChatError::DuplicateId { .. }));
    }

    #[test]
    fn out_of_range_selection_keeps_previous_active_index() {
        let mut store = SessionStore::with_sessions(["A", "B"]).unwrap();
        store.select_session(1).unwrap();

        let err = store.select_session(2).unwrap_err();
        assert_eq!(
            err,
            ChatError::IndexOutOfRange {
                stage: "store-select-session",
                index: 2,
                len: 2,
            }
        );
        assert_eq!(store.active_index(), Some(1));
        assert_eq!(store.active_session().map(|s| s.id()), Some("B"));
    }

    #[test]
    fn append_to_missing_session_fails() {
        let mut store = SessionStore::with_sessions(["A"]).unwrap();
        let err = store.append_message(3, Message::ai("lost")).unwrap_err();
        assert!(matches!(err, ChatError::IndexOutOfRange { index: 3, len: 1, .. }));
        assert!(store.session(0).unwrap().is_empty());
    }

    #[test]
    fn empty_store_has_no_active_session() {
        let mut store = SessionStore::new();
        assert!(store.active_session().is_none());
        assert!(store.select_session(0).is_err());
        assert_eq!(store.active_index(), None);
    }

    #[test]
    fn summaries_mark_active_row_and_counts() {
        let mut store = SessionStore::with_sessions(["A", "B"]).unwrap();
        store.select_session(0).unwrap();
        store.append_message(0, Message::user("hi")).unwrap();
        store.append_message(0, Message::ai("Echo: hi")).unwrap();

        let rows = store.summaries();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].active);
        assert_eq!(rows[0].message_count, 2);
        assert!(!rows[1].active);
        assert_eq!(
            store.session(0).unwrap().messages()[1].sender(),
            Sender::Ai
        );
    }
}
