//! Request context carrying the authenticated user.

use serde::{Deserialize, Serialize};

use nimbus_core::types::UserId;

/// Context for the current authenticated request.
///
/// Built by the API layer from a verified bearer token and passed into
/// every service method, so each query is scoped to *who* is acting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The authenticated user's ID.
    pub user_id: UserId,
    /// The username (convenience field from JWT claims).
    pub username: String,
}

impl RequestContext {
    /// Creates a new request context.
    pub fn new(user_id: UserId, username: impl Into<String>) -> Self {
        Self {
            user_id,
            username: username.into(),
        }
    }
}
