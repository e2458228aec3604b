use async_trait::async_trait;
use std::sync::Arc;

use crate::contract::{
    client::UserAdminApi,
    error::UserAdminError,
    model::{CallerContext, DeletionReport},
};
use crate::domain::service::Service;

/// Local implementation of the UserAdminApi trait that delegates to the domain service
pub struct UserAdminLocalClient {
    service: Arc<Service>,
}

impl UserAdminLocalClient {
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl UserAdminApi for UserAdminLocalClient {
    async fn delete_user(
        &self,
        user_id: &str,
        caller: CallerContext,
    ) -> Result<DeletionReport, UserAdminError> {
        self.service
            .delete_user(user_id, &caller)
            .await
            .map_err(Into::into)
    }
}
