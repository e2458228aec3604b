use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, error, info, instrument, warn};

use crate::contract::model::{CallerContext, DeletionReport, Role, StepOutcome, UserId};
use crate::domain::access::UnresolvedCallerPolicy;
use crate::domain::error::DomainError;
use crate::domain::ports::{AccessPolicy, IdentityStore, RecordStore, RoleDirectory};
use crate::domain::error::StoreError;
use crate::domain::retry::{call_store, call_store_attempts, RetryPolicy};

/// Domain service running the deletion workflow.
/// Depends only on the ports, not on infra types.
#[derive(Clone)]
pub struct Service {
    roles: Arc<dyn RoleDirectory>,
    records: Arc<dyn RecordStore>,
    identities: Arc<dyn IdentityStore>,
    access: Arc<dyn AccessPolicy>,
    config: ServiceConfig,
}

/// Configuration for the domain service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub unresolved_caller: UnresolvedCallerPolicy,
    pub store_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            unresolved_caller: UnresolvedCallerPolicy::Deny,
            store_timeout: Duration::from_secs(2),
            retry: RetryPolicy::default(),
        }
    }
}

/// Store calls one deletion makes at most: caller lookup, role lookup,
/// record delete, identity delete.
pub const STORE_CALLS_PER_DELETION: u32 = 4;

impl ServiceConfig {
    /// Longest a single deletion can spend waiting on stores.
    pub fn worst_case_deletion(&self) -> Duration {
        self.retry
            .worst_case(self.store_timeout)
            .saturating_mul(STORE_CALLS_PER_DELETION)
    }
}

/// Outcome of establishing who the caller is.
enum CallerCheck {
    Admin(UserId),
    Unresolved(String),
}

impl Service {
    /// Create a service with dependencies.
    pub fn new(
        roles: Arc<dyn RoleDirectory>,
        records: Arc<dyn RecordStore>,
        identities: Arc<dyn IdentityStore>,
        access: Arc<dyn AccessPolicy>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            roles,
            records,
            identities,
            access,
            config,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Delete a user from the record store, then from the identity store.
    ///
    /// Validation and authorization failures return before any store is
    /// touched. A failed record deletion is logged and reported in the
    /// result; a failed identity deletion aborts with `AuthDeletionFailed`.
    #[instrument(
        name = "user_admin.service.delete_user",
        skip(self, caller),
        fields(has_token = caller.access_token.is_some())
    )]
    pub async fn delete_user(
        &self,
        raw_id: &str,
        caller: &CallerContext,
    ) -> Result<DeletionReport, DomainError> {
        let id = UserId::parse(raw_id).ok_or_else(DomainError::missing_user_id)?;

        if !self.access.permits(caller) {
            warn!(
                user_id = %id,
                origin = caller.origin.as_deref().unwrap_or("<none>"),
                "Deletion refused: request did not come from an administrative origin"
            );
            return Err(DomainError::forbidden_origin());
        }

        self.authorize_caller(caller).await?;

        let record = self.delete_record_step(&id).await;
        let identity = self.delete_identity_step(&id).await?;

        let report = DeletionReport {
            user_id: id,
            record,
            identity,
            completed_at: Utc::now(),
        };
        info!(
            user_id = %report.user_id,
            record = report.record.label(),
            fully_purged = report.fully_purged(),
            "User deleted"
        );
        Ok(report)
    }

    /// Require an administrator caller, applying the configured policy when
    /// the caller cannot be identified at all.
    async fn authorize_caller(&self, caller: &CallerContext) -> Result<(), DomainError> {
        match self.check_caller(caller).await? {
            CallerCheck::Admin(admin) => {
                debug!(caller = %admin, "Caller verified as administrator");
                Ok(())
            }
            CallerCheck::Unresolved(reason) => match self.config.unresolved_caller {
                UnresolvedCallerPolicy::Deny => {
                    warn!(%reason, "Deletion refused: caller identity not established");
                    Err(DomainError::unauthorized(reason))
                }
                UnresolvedCallerPolicy::Allow => {
                    warn!(
                        %reason,
                        "Caller identity not established; proceeding because unresolved callers are allowed"
                    );
                    Ok(())
                }
            },
        }
    }

    async fn check_caller(&self, caller: &CallerContext) -> Result<CallerCheck, DomainError> {
        let Some(token) = caller.access_token.as_deref() else {
            return Ok(CallerCheck::Unresolved("no access token".into()));
        };

        let identities = &self.identities;
        let resolved = call_store(
            "resolve_caller",
            self.config.store_timeout,
            self.config.retry,
            move || identities.resolve_caller(token),
        )
        .await;

        let caller_id = match resolved {
            Ok(Some(id)) => id,
            Ok(None) => return Ok(CallerCheck::Unresolved("access token not accepted".into())),
            Err(e) => {
                return Ok(CallerCheck::Unresolved(format!(
                    "identity lookup failed ({}): {}",
                    e.kind(),
                    e
                )))
            }
        };

        let roles = &self.roles;
        let lookup_id = &caller_id;
        let role = call_store(
            "role_of",
            self.config.store_timeout,
            self.config.retry,
            move || roles.role_of(lookup_id),
        )
        .await;

        match role {
            Ok(Some(Role::Admin)) => Ok(CallerCheck::Admin(caller_id)),
            Ok(Some(Role::Other(observed))) => {
                warn!(caller = %caller_id, role = %observed, "Deletion refused: caller is not an administrator");
                Err(DomainError::not_admin(Some(observed)))
            }
            Ok(None) => {
                warn!(caller = %caller_id, "Deletion refused: caller has no role");
                Err(DomainError::not_admin(None))
            }
            Err(e) => Ok(CallerCheck::Unresolved(format!(
                "role lookup failed ({}): {}",
                e.kind(),
                e
            ))),
        }
    }

    /// Non-fatal: failures end up in the report, not in the result.
    async fn delete_record_step(&self, id: &UserId) -> StepOutcome {
        let records = &self.records;
        let result = call_store(
            "delete_record",
            self.config.store_timeout,
            self.config.retry,
            move || records.delete_record(id),
        )
        .await;

        match result {
            Ok(removal) => {
                let outcome = StepOutcome::from(removal);
                info!(step = "record", outcome = outcome.label(), user_id = %id, "Application record step done");
                outcome
            }
            Err(e) => {
                warn!(
                    step = "record",
                    outcome = "failed",
                    kind = %e.kind(),
                    user_id = %id,
                    error = %e,
                    "Failed to delete application user record. Continuing with identity deletion"
                );
                StepOutcome::Failed {
                    kind: e.kind(),
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn delete_identity_step(&self, id: &UserId) -> Result<serde_json::Value, DomainError> {
        let identities = &self.identities;
        let attempted = call_store_attempts(
            "delete_identity",
            self.config.store_timeout,
            self.config.retry,
            move || identities.delete_identity(id),
        )
        .await;
        let unconfirmed = attempted.after_unconfirmed_attempt();

        match attempted.result {
            Ok(payload) => {
                info!(step = "identity", outcome = "deleted", user_id = %id, "Authentication identity deleted");
                Ok(payload)
            }
            // An earlier timed-out or unavailable attempt went through.
            Err(StoreError::NotFound(message)) if unconfirmed => {
                info!(
                    step = "identity",
                    outcome = "deleted",
                    attempts = attempted.attempts,
                    user_id = %id,
                    provider = %message,
                    "Authentication identity already gone after an unconfirmed attempt"
                );
                Ok(serde_json::json!({}))
            }
            Err(e) => {
                error!(
                    step = "identity",
                    outcome = "failed",
                    kind = %e.kind(),
                    user_id = %id,
                    error = %e,
                    "Authentication identity deletion failed"
                );
                Err(DomainError::auth_deletion_failed(e))
            }
        }
    }
}
