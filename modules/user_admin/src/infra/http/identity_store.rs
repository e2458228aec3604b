use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use tracing::instrument;
use url::Url;

use super::client::{check_status, endpoint, StoreClient};
use crate::contract::model::UserId;
use crate::domain::error::StoreError;
use crate::domain::ports::IdentityStore;

#[derive(Deserialize)]
struct AuthUser {
    id: String,
}

/// Identities held by the authentication service, managed through its
/// admin API.
pub struct AuthAdminIdentityStore {
    client: StoreClient,
    auth_base: Url,
}

impl AuthAdminIdentityStore {
    pub fn new(client: StoreClient, auth_url: &str) -> anyhow::Result<Self> {
        let auth_base =
            Url::parse(auth_url).with_context(|| format!("Invalid auth_url '{auth_url}'"))?;
        Ok(Self { client, auth_base })
    }
}

#[async_trait]
impl IdentityStore for AuthAdminIdentityStore {
    #[instrument(name = "user_admin.http.identity.resolve_caller", skip_all)]
    async fn resolve_caller(&self, access_token: &str) -> Result<Option<UserId>, StoreError> {
        let url = endpoint(&self.auth_base, &["user"])?;
        let resp = self
            .client
            .send(self.client.request_as(Method::GET, url, access_token))
            .await?;

        if matches!(resp.status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Ok(None);
        }
        check_status(resp.status, &resp.body)?;

        let user: AuthUser = serde_json::from_slice(&resp.body)
            .map_err(|e| StoreError::Malformed(format!("unexpected user response: {e}")))?;
        UserId::parse(&user.id)
            .map(Some)
            .ok_or_else(|| StoreError::Malformed("user response carries an empty id".into()))
    }

    #[instrument(
        name = "user_admin.http.identity.delete",
        skip_all,
        fields(user_id = %id)
    )]
    async fn delete_identity(&self, id: &UserId) -> Result<serde_json::Value, StoreError> {
        let url = endpoint(&self.auth_base, &["admin", "users", id.as_str()])?;
        let resp = self
            .client
            .execute(self.client.service_request(Method::DELETE, url))
            .await?;

        if resp.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(serde_json::json!({}));
        }
        serde_json::from_slice(&resp.body)
            .map_err(|e| StoreError::Malformed(format!("unexpected delete response: {e}")))
    }
}
