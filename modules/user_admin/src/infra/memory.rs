//! In-process stores backing `--mock` mode and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::config::MockUser;
use crate::contract::model::{RecordRemoval, Role, UserId};
use crate::domain::error::StoreError;
use crate::domain::ports::{IdentityStore, RecordStore, RoleDirectory};

#[derive(Default)]
struct Inner {
    /// Application records: id -> role.
    records: HashMap<UserId, Role>,
    /// Authentication identities, with the provider metadata returned on delete.
    identities: HashMap<UserId, serde_json::Value>,
    /// Access token -> identity.
    tokens: HashMap<String, UserId>,
}

/// One shared directory implementing the role, record and identity ports.
#[derive(Default)]
pub struct InMemoryDirectory {
    inner: RwLock<Inner>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from configured seed users; blank ids are skipped.
    pub fn seeded(users: &[MockUser]) -> Self {
        let dir = Self::new();
        for u in users {
            let Some(id) = UserId::parse(&u.id) else {
                tracing::warn!("Skipping mock user with an empty id");
                continue;
            };
            dir.insert_user(id.clone(), Role::parse(&u.role));
            if let Some(token) = &u.access_token {
                dir.issue_token(token, &id);
            }
        }
        dir
    }

    /// Create both the application record and the identity.
    pub fn insert_user(&self, id: UserId, role: Role) {
        let mut inner = self.inner.write();
        let meta = serde_json::json!({ "id": id.as_str() });
        inner.identities.insert(id.clone(), meta);
        inner.records.insert(id, role);
    }

    pub fn issue_token(&self, token: &str, id: &UserId) {
        self.inner.write().tokens.insert(token.to_owned(), id.clone());
    }

    pub fn has_record(&self, id: &UserId) -> bool {
        self.inner.read().records.contains_key(id)
    }

    pub fn has_identity(&self, id: &UserId) -> bool {
        self.inner.read().identities.contains_key(id)
    }

    pub fn user_count(&self) -> usize {
        self.inner.read().identities.len()
    }
}

#[async_trait]
impl RoleDirectory for InMemoryDirectory {
    async fn role_of(&self, id: &UserId) -> Result<Option<Role>, StoreError> {
        Ok(self.inner.read().records.get(id).cloned())
    }
}

#[async_trait]
impl RecordStore for InMemoryDirectory {
    async fn delete_record(&self, id: &UserId) -> Result<RecordRemoval, StoreError> {
        Ok(match self.inner.write().records.remove(id) {
            Some(_) => RecordRemoval::Deleted,
            None => RecordRemoval::AlreadyAbsent,
        })
    }
}

#[async_trait]
impl IdentityStore for InMemoryDirectory {
    async fn resolve_caller(&self, access_token: &str) -> Result<Option<UserId>, StoreError> {
        Ok(self.inner.read().tokens.get(access_token).cloned())
    }

    async fn delete_identity(&self, id: &UserId) -> Result<serde_json::Value, StoreError> {
        let mut inner = self.inner.write();
        let meta = inner
            .identities
            .remove(id)
            .ok_or_else(|| StoreError::NotFound("not found".into()))?;
        inner.tokens.retain(|_, owner| owner != id);
        Ok(meta)
    }
}
