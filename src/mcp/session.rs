use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use uuid::Uuid;

/// Lifecycle state of a tool protocol session.
///
/// A session id that was never minted has no entry at all. Closed ids are
/// retained so a request against a closed session is distinguishable from a
/// request against an unknown one, and an id is never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Established,
    Closed,
}

/// Registry of tool protocol sessions.
#[derive(Debug, Clone, Default)]
pub struct ToolSessions {
    inner: Arc<RwLock<HashMap<Uuid, SessionState>>>,
}

impl ToolSessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mints a fresh session id and marks it established.
    pub fn establish(&self) -> Uuid {
        let id = Uuid::new_v4();
        let mut sessions = self
            .inner
            .write()
            .expect("session registry lock poisoned");
        sessions.insert(id, SessionState::Established);
        tracing::info!("🔌 Session established: {}", id);
        id
    }

    /// Looks up the state of a session id, if it was ever minted.
    pub fn state(&self, id: &Uuid) -> Option<SessionState> {
        let sessions = self
            .inner
            .read()
            .expect("session registry lock poisoned");
        sessions.get(id).copied()
    }

    pub fn is_established(&self, id: &Uuid) -> bool {
        self.state(id) == Some(SessionState::Established)
    }

    /// Closes an established session. Returns false when the id is unknown
    /// or already closed.
    pub fn close(&self, id: &Uuid) -> bool {
        let mut sessions = self
            .inner
            .write()
            .expect("session registry lock poisoned");
        match sessions.get_mut(id) {
            Some(state @ SessionState::Established) => {
                *state = SessionState::Closed;
                tracing::info!("🔌 Session closed: {}", id);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_establish_and_lookup() {
        let sessions = ToolSessions::new();
        let id = sessions.establish();
        assert!(sessions.is_established(&id));
        assert_eq!(sessions.state(&id), Some(SessionState::Established));
    }

    #[test]
    fn test_unknown_id_has_no_state() {
        let sessions = ToolSessions::new();
        assert_eq!(sessions.state(&Uuid::new_v4()), None);
    }

    #[test]
    fn test_close_retains_id() {
        let sessions = ToolSessions::new();
        let id = sessions.establish();
        assert!(sessions.close(&id));
        assert!(!sessions.is_established(&id));
        assert_eq!(sessions.state(&id), Some(SessionState::Closed));
    }

    #[test]
    fn test_close_is_not_repeatable() {
        let sessions = ToolSessions::new();
        let id = sessions.establish();
        assert!(sessions.close(&id));
        assert!(!sessions.close(&id));
        assert!(!sessions.close(&Uuid::new_v4()));
    }

    #[test]
    fn test_ids_are_unique() {
        let sessions = ToolSessions::new();
        let a = sessions.establish();
        let b = sessions.establish();
        assert_ne!(a, b);
    }
}
