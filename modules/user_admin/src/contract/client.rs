use async_trait::async_trait;

use crate::contract::{
    error::UserAdminError,
    model::{CallerContext, DeletionReport},
};

/// Public API of the user_admin module for in-process consumers
#[async_trait]
pub trait UserAdminApi: Send + Sync {
    /// Delete a user from the application record store and the
    /// authentication identity store, after verifying the caller.
    async fn delete_user(
        &self,
        user_id: &str,
        caller: CallerContext,
    ) -> Result<DeletionReport, UserAdminError>;
}
