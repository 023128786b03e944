//! Auth records and the events clients emit when their auth state changes.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Prefix reserved for ephemeral identities. Anonymous sessions are never
/// persisted across logout and skip remote de-authentication.
pub const ANONYMOUS_PREFIX: &str = "anonymous-";

/// An auth issued by the API for a specific user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Auth {
    pub uid: String,
    pub access_token: String,
    /// Lifetime of the access token, in seconds.
    pub expires_in: u64,
}

impl Auth {
    /// Compose the bearer token stored in the cache and sent with requests.
    pub fn gen_token(&self) -> String {
        format!("{}:{}", self.uid, self.access_token)
    }

    /// Lifetime of the access token as a duration.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.expires_in)
    }
}

/// An auth event produced by a client for a specific user.
///
/// A present `auth` means the user (re)authenticated; an absent one means
/// the user was de-authenticated and the cached token must be cleared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientAuth {
    pub user_id: String,
    pub auth: Option<Auth>,
}

/// Check whether a user id denotes an ephemeral anonymous session.
pub fn is_anonymous(user_id: &str) -> bool {
    user_id.starts_with(ANONYMOUS_PREFIX)
}

/// Build the anonymous user id for the given counter value.
pub fn anonymous_user_id(n: u64) -> String {
    format!("{ANONYMOUS_PREFIX}{n}")
}
