//! User entities and identity switching

use std::sync::Arc;

use serde::Deserialize;

use crate::error::Result;
use crate::session::Session;

/// Raw user fields from a `sl_users_list_req` response item
#[derive(Debug, Clone, Deserialize)]
pub struct UserData {
    pub name: String,
}

/// A user defined on the gateway
#[derive(Debug, Clone)]
pub struct User {
    data: UserData,
    session: Arc<Session>,
}

impl User {
    pub(crate) fn new(data: UserData, session: Arc<Session>) -> Self {
        Self { data, session }
    }

    /// Name of the user
    pub fn name(&self) -> &str {
        &self.data.name
    }

    /// Make this user the session's current identity
    ///
    /// Logs the current user out and logs back in as this user. If the
    /// switch fails at any step, the previous identity is restored in full
    /// and keeps working without re-entering its credentials.
    pub async fn set_as_current_user(&self, password: &str) -> Result<()> {
        self.session.switch_user(self.name(), password).await
    }
}
