use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use arc_swap::ArcSwapOption;
use tracing::{debug, info, warn};

use crate::api::rest::routes;
use crate::config::UserAdminConfig;
use crate::contract::client::UserAdminApi;
use crate::domain::access::{ReferrerAllowList, UnresolvedCallerPolicy};
use crate::domain::ports::{IdentityStore, RecordStore, RoleDirectory};
use crate::domain::service::Service;
use crate::gateways::local::UserAdminLocalClient;
use crate::infra::http::{AuthAdminIdentityStore, RestRecordStore, RestRoleDirectory, StoreClient};
use crate::infra::memory::InMemoryDirectory;

/// The three store ports the service is wired with.
#[derive(Clone)]
pub struct Stores {
    pub roles: Arc<dyn RoleDirectory>,
    pub records: Arc<dyn RecordStore>,
    pub identities: Arc<dyn IdentityStore>,
}

impl Stores {
    /// Every port served by the same in-memory directory.
    pub fn in_memory(dir: Arc<InMemoryDirectory>) -> Self {
        Self {
            roles: dir.clone(),
            records: dir.clone(),
            identities: dir,
        }
    }

    /// HTTP adapters for the configured database REST API and auth service.
    pub fn http(cfg: &UserAdminConfig) -> anyhow::Result<Self> {
        let stores = &cfg.stores;
        if stores.service_key.trim().is_empty() {
            warn!("user_admin.stores.service_key is empty; store calls will be rejected");
        }
        let client = StoreClient::new(
            stores.service_key.clone(),
            Duration::from_millis(stores.connect_timeout_ms),
        )?;
        Ok(Self {
            roles: Arc::new(RestRoleDirectory::new(
                client.clone(),
                &stores.rest_url,
                stores.users_table.clone(),
            )?),
            records: Arc::new(RestRecordStore::new(
                client.clone(),
                &stores.rest_url,
                stores.users_table.clone(),
            )?),
            identities: Arc::new(AuthAdminIdentityStore::new(client, &stores.auth_url)?),
        })
    }
}

/// Main module struct: owns the configured domain service and exposes it
/// to REST and to in-process callers.
#[derive(Default)]
pub struct UserAdmin {
    // Keep the domain service behind ArcSwap for cheap read-mostly access.
    service: ArcSwapOption<Service>,
    route: ArcSwapOption<String>,
}

impl UserAdmin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wire the service with in-memory stores (`mock`) or the HTTP stores.
    pub fn init(&self, cfg: &UserAdminConfig, mock: bool) -> anyhow::Result<()> {
        info!("Initializing user_admin module");
        let stores = if mock {
            let dir = InMemoryDirectory::seeded(&cfg.mock_users);
            info!(users = dir.user_count(), "Using in-memory stores");
            Stores::in_memory(Arc::new(dir))
        } else {
            debug!(
                rest_url = %cfg.stores.rest_url,
                auth_url = %cfg.stores.auth_url,
                table = %cfg.stores.users_table,
                "Using HTTP stores"
            );
            Stores::http(cfg).context("Failed to build user_admin store adapters")?
        };
        self.init_with(cfg, stores)
    }

    /// Wire the service with the given stores.
    pub fn init_with(&self, cfg: &UserAdminConfig, stores: Stores) -> anyhow::Result<()> {
        if !cfg.route.starts_with('/') {
            bail!("user_admin.route must start with '/': '{}'", cfg.route);
        }
        if cfg.admin_origin_markers.iter().all(|m| m.is_empty()) {
            warn!("user_admin.admin_origin_markers is empty; every deletion will be refused");
        }
        if cfg.unresolved_caller == UnresolvedCallerPolicy::Allow {
            warn!("user_admin.unresolved_caller is 'allow'; unidentified callers may delete users");
        }

        let service = Service::new(
            stores.roles,
            stores.records,
            stores.identities,
            Arc::new(ReferrerAllowList::new(cfg.admin_origin_markers.clone())),
            cfg.service_config(),
        );
        self.service.store(Some(Arc::new(service)));
        self.route.store(Some(Arc::new(cfg.route.clone())));
        Ok(())
    }

    fn service(&self) -> anyhow::Result<Arc<Service>> {
        self.service
            .load_full()
            .ok_or_else(|| anyhow::anyhow!("Service not initialized"))
    }

    fn route(&self) -> String {
        self.route
            .load_full()
            .map(|r| r.as_ref().clone())
            .unwrap_or_else(|| UserAdminConfig::default().route)
    }

    pub fn register_rest(&self, router: axum::Router) -> anyhow::Result<axum::Router> {
        let service = self.service()?;
        let route = self.route();
        info!(%route, "Registering user_admin REST routes");
        Ok(routes::register_routes(router, service, &route))
    }

    pub fn openapi(&self) -> utoipa::openapi::OpenApi {
        routes::openapi(&self.route())
    }

    /// Local in-process client.
    pub fn client(&self) -> anyhow::Result<Arc<dyn UserAdminApi>> {
        Ok(Arc::new(UserAdminLocalClient::new(self.service()?)))
    }
}
