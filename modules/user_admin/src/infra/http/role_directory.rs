use anyhow::Context;
use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use tracing::instrument;
use url::Url;

use super::client::{endpoint, StoreClient};
use crate::contract::model::{Role, UserId};
use crate::domain::error::StoreError;
use crate::domain::ports::RoleDirectory;

#[derive(Deserialize)]
struct RoleRow {
    role: Option<String>,
}

/// Reads the `role` column of the application users table.
pub struct RestRoleDirectory {
    client: StoreClient,
    rest_base: Url,
    table: String,
}

impl RestRoleDirectory {
    pub fn new(client: StoreClient, rest_url: &str, table: impl Into<String>) -> anyhow::Result<Self> {
        let rest_base =
            Url::parse(rest_url).with_context(|| format!("Invalid rest_url '{rest_url}'"))?;
        Ok(Self {
            client,
            rest_base,
            table: table.into(),
        })
    }
}

#[async_trait]
impl RoleDirectory for RestRoleDirectory {
    #[instrument(
        name = "user_admin.http.roles.lookup",
        skip_all,
        fields(table = %self.table, user_id = %id)
    )]
    async fn role_of(&self, id: &UserId) -> Result<Option<Role>, StoreError> {
        let mut url = endpoint(&self.rest_base, &[&self.table])?;
        url.query_pairs_mut()
            .append_pair("id", &format!("eq.{id}"))
            .append_pair("select", "role");

        let resp = self
            .client
            .execute(self.client.service_request(Method::GET, url))
            .await?;

        let rows: Vec<RoleRow> = serde_json::from_slice(&resp.body)
            .map_err(|e| StoreError::Malformed(format!("unexpected role response: {e}")))?;
        Ok(rows
            .into_iter()
            .next()
            .and_then(|r| r.role)
            .map(|r| Role::parse(&r)))
    }
}
