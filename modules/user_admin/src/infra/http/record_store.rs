use anyhow::Context;
use async_trait::async_trait;
use reqwest::Method;
use tracing::instrument;
use url::Url;

use super::client::{endpoint, StoreClient};
use crate::contract::model::{RecordRemoval, UserId};
use crate::domain::error::StoreError;
use crate::domain::ports::RecordStore;

/// Application records behind a PostgREST-style API.
pub struct RestRecordStore {
    client: StoreClient,
    rest_base: Url,
    table: String,
}

impl RestRecordStore {
    pub fn new(client: StoreClient, rest_url: &str, table: impl Into<String>) -> anyhow::Result<Self> {
        let rest_base =
            Url::parse(rest_url).with_context(|| format!("Invalid rest_url '{rest_url}'"))?;
        Ok(Self {
            client,
            rest_base,
            table: table.into(),
        })
    }

    fn rows_url(&self, id: &UserId) -> Result<Url, StoreError> {
        let mut url = endpoint(&self.rest_base, &[&self.table])?;
        url.query_pairs_mut()
            .append_pair("id", &format!("eq.{id}"));
        Ok(url)
    }
}

#[async_trait]
impl RecordStore for RestRecordStore {
    #[instrument(
        name = "user_admin.http.records.delete",
        skip_all,
        fields(table = %self.table, user_id = %id)
    )]
    async fn delete_record(&self, id: &UserId) -> Result<RecordRemoval, StoreError> {
        let url = self.rows_url(id)?;
        let rb = self
            .client
            .service_request(Method::DELETE, url)
            .header("Prefer", "return=representation");
        let resp = self.client.execute(rb).await?;

        // Without a representation the store gives no row count; trust the 2xx.
        if resp.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(RecordRemoval::Deleted);
        }

        let rows: Vec<serde_json::Value> = serde_json::from_slice(&resp.body)
            .map_err(|e| StoreError::Malformed(format!("unexpected delete response: {e}")))?;
        Ok(if rows.is_empty() {
            RecordRemoval::AlreadyAbsent
        } else {
            RecordRemoval::Deleted
        })
    }
}
