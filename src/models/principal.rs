use serde::{Deserialize, Serialize};

/// The single authenticated identity the system currently recognizes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// The principal's username.
    pub username: String,
}

/// The stored credential backing the active principal.
///
/// The hash is an Argon2id PHC string; the plaintext password is never
/// stored or logged.
#[derive(Clone, Debug)]
pub struct Credential {
    /// The principal's username.
    pub username: String,
    /// The salted Argon2id password hash.
    pub password_hash: String,
}
