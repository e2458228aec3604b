use std::time::Duration;

use anyhow::bail;
use serde::{Deserialize, Serialize};

use crate::domain::access::UnresolvedCallerPolicy;
use crate::domain::retry::RetryPolicy;
use crate::domain::service::ServiceConfig;

/// Configuration for the user_admin module
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserAdminConfig {
    /// Path of the delete endpoint.
    #[serde(default = "default_route")]
    pub route: String,
    /// Substrings a request referrer must contain to be accepted.
    #[serde(default = "default_admin_origin_markers")]
    pub admin_origin_markers: Vec<String>,
    #[serde(default)]
    pub unresolved_caller: UnresolvedCallerPolicy,
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub stores: StoresConfig,
    /// Users seeded into the in-memory stores when running with `--mock`.
    #[serde(default)]
    pub mock_users: Vec<MockUser>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoresConfig {
    /// Base URL of the REST API fronting the application database.
    #[serde(default = "default_rest_url")]
    pub rest_url: String,
    /// Base URL of the authentication service.
    #[serde(default = "default_auth_url")]
    pub auth_url: String,
    #[serde(default = "default_users_table")]
    pub users_table: String,
    /// Privileged key used for record deletion and the auth admin API.
    #[serde(default)]
    pub service_key: String,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MockUser {
    pub id: String,
    pub role: String,
    #[serde(default)]
    pub access_token: Option<String>,
}

impl Default for UserAdminConfig {
    fn default() -> Self {
        Self {
            route: default_route(),
            admin_origin_markers: default_admin_origin_markers(),
            unresolved_caller: UnresolvedCallerPolicy::default(),
            store_timeout_ms: default_store_timeout_ms(),
            retry: RetryConfig::default(),
            stores: StoresConfig::default(),
            mock_users: Vec::new(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

impl Default for StoresConfig {
    fn default() -> Self {
        Self {
            rest_url: default_rest_url(),
            auth_url: default_auth_url(),
            users_table: default_users_table(),
            service_key: String::new(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

impl UserAdminConfig {
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            unresolved_caller: self.unresolved_caller,
            store_timeout: Duration::from_millis(self.store_timeout_ms),
            retry: RetryPolicy {
                max_attempts: self.retry.max_attempts,
                backoff: Duration::from_millis(self.retry.backoff_ms),
            },
        }
    }

    /// A deletion must finish, or fail with its own JSON error, before the
    /// HTTP request timeout drops it halfway through the two stores.
    pub fn ensure_fits_request_timeout(&self, request_timeout: Duration) -> anyhow::Result<()> {
        let budget = self.service_config().worst_case_deletion();
        if budget >= request_timeout {
            bail!(
                "user_admin store budget of {} ms (store_timeout_ms={}, retry.max_attempts={}, retry.backoff_ms={}) \
                 does not fit in the {} s request timeout; lower the store settings or raise api_ingress.request_timeout_sec",
                budget.as_millis(),
                self.store_timeout_ms,
                self.retry.max_attempts,
                self.retry.backoff_ms,
                request_timeout.as_secs()
            );
        }
        Ok(())
    }
}

fn default_route() -> String {
    "/admin/users".to_string()
}

fn default_admin_origin_markers() -> Vec<String> {
    vec!["/admin/".to_string()]
}

fn default_store_timeout_ms() -> u64 {
    2000
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_ms() -> u64 {
    100
}

fn default_rest_url() -> String {
    "http://localhost:54321/rest/v1".to_string()
}

fn default_auth_url() -> String {
    "http://localhost:54321/auth/v1".to_string()
}

fn default_users_table() -> String {
    "users".to_string()
}

fn default_connect_timeout_ms() -> u64 {
    2000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_section_uses_defaults() {
        let cfg: UserAdminConfig = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(cfg.route, "/admin/users");
        assert_eq!(cfg.admin_origin_markers, vec!["/admin/"]);
        assert_eq!(cfg.unresolved_caller, UnresolvedCallerPolicy::Deny);

        let svc = cfg.service_config();
        assert_eq!(svc.store_timeout, Duration::from_secs(2));
        assert_eq!(svc.retry.max_attempts, 3);
        assert_eq!(svc.retry.backoff, Duration::from_millis(100));
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let cfg: UserAdminConfig = serde_json::from_value(serde_json::json!({
            "unresolved_caller": "allow",
            "retry": { "max_attempts": 1 },
            "stores": { "service_key": "secret" },
            "mock_users": [{ "id": "admin-1", "role": "admin", "access_token": "t1" }]
        }))
        .unwrap();

        assert_eq!(cfg.unresolved_caller, UnresolvedCallerPolicy::Allow);
        assert_eq!(cfg.retry.max_attempts, 1);
        assert_eq!(cfg.retry.backoff_ms, 100);
        assert_eq!(cfg.stores.service_key, "secret");
        assert_eq!(cfg.stores.users_table, "users");
        assert_eq!(cfg.mock_users[0].access_token.as_deref(), Some("t1"));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let res: Result<UserAdminConfig, _> =
            serde_json::from_value(serde_json::json!({ "rout": "/x" }));
        assert!(res.is_err());
    }

    #[test]
    fn default_budget_fits_default_request_timeout() {
        let cfg = UserAdminConfig::default();
        assert_eq!(
            cfg.service_config().worst_case_deletion(),
            Duration::from_millis(4 * (3 * 2000 + 100 + 200))
        );
        assert!(cfg.ensure_fits_request_timeout(Duration::from_secs(30)).is_ok());
    }

    #[test]
    fn budget_exceeding_request_timeout_is_rejected() {
        let cfg = UserAdminConfig {
            store_timeout_ms: 5000,
            ..Default::default()
        };

        let err = cfg
            .ensure_fits_request_timeout(Duration::from_secs(30))
            .unwrap_err();
        assert!(err.to_string().contains("does not fit in the 30 s request timeout"));
        assert!(cfg.ensure_fits_request_timeout(Duration::from_secs(90)).is_ok());
    }
}
