//! Ports the deletion workflow depends on. Adapters live in `infra`.

use async_trait::async_trait;

use crate::contract::model::{CallerContext, RecordRemoval, Role, UserId};
use crate::domain::error::StoreError;

/// Administrative-privilege data source: "look up role by identifier".
#[async_trait]
pub trait RoleDirectory: Send + Sync {
    /// `Ok(None)` when there is no record (or no role) for the user.
    async fn role_of(&self, id: &UserId) -> Result<Option<Role>, StoreError>;
}

/// Application record store: "delete record by identifier".
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Deleting a record that does not exist is not an error.
    async fn delete_record(&self, id: &UserId) -> Result<RecordRemoval, StoreError>;
}

/// Authentication identity store.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Map a caller's access token to the identity it belongs to.
    /// `Ok(None)` when the store does not accept the token.
    async fn resolve_caller(&self, access_token: &str) -> Result<Option<UserId>, StoreError>;

    /// Delete the identity; returns the provider's response payload.
    async fn delete_identity(&self, id: &UserId) -> Result<serde_json::Value, StoreError>;
}

/// Authorization predicate over the request context, evaluated before any
/// store is touched.
pub trait AccessPolicy: Send + Sync {
    fn permits(&self, caller: &CallerContext) -> bool;
}
