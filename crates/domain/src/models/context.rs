//! Explicit acting-user context.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The user on whose behalf a query or mutation runs.
///
/// Every gateway call and every handler receives one of these instead of
/// reading a process-wide "current user".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserContext {
    user_id: Uuid,
}

impl UserContext {
    pub fn new(user_id: Uuid) -> Self {
        Self { user_id }
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    /// Returns true if the entity owned by `owner_id` belongs to this user.
    pub fn owns(&self, owner_id: Uuid) -> bool {
        self.user_id == owner_id
    }
}

impl From<Uuid> for UserContext {
    fn from(user_id: Uuid) -> Self {
        Self::new(user_id)
    }
}
