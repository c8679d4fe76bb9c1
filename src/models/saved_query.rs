use serde::Serialize;
use uuid::Uuid;

/// A saved query kept in the in-memory store.
#[derive(Clone, Debug, Serialize)]
pub struct SavedQuery {
    /// The unique identifier for the saved query.
    pub id: Uuid,
    /// A human-readable name.
    pub name: String,
    /// The SQL text.
    pub sql: String,
    /// Free-form tags.
    pub tags: Vec<String>,
}
