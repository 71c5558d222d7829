// src/models/user.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// The user performing a request, as vouched for by the identity provider.
///
/// Handed explicitly to every service call that mutates state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActingUser {
    pub id: i64,
    /// Display name shown next to authored content.
    pub username: String,
    /// Staff may mutate content they did not author.
    pub is_staff: bool,
}

/// Optional requester for read endpoints. `None` for anonymous callers.
#[derive(Debug, Clone, Default)]
pub struct Viewer(pub Option<ActingUser>);

impl Viewer {
    pub fn user_id(&self) -> Option<i64> {
        self.0.as_ref().map(|u| u.id)
    }
}

/// Author block embedded in post, comment and like views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Author {
    pub id: i64,
    pub username: String,
}
