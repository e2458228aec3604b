#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use user_admin::contract::model::{CallerContext, RecordRemoval, Role, UserId};
use user_admin::domain::access::{ReferrerAllowList, UnresolvedCallerPolicy};
use user_admin::domain::error::StoreError;
use user_admin::domain::ports::{IdentityStore, RecordStore, RoleDirectory};
use user_admin::domain::retry::RetryPolicy;
use user_admin::domain::service::{Service, ServiceConfig};
use user_admin::module::Stores;

pub const ADMIN_ID: &str = "admin-1";
pub const ADMIN_TOKEN: &str = "admin-token";
pub const ADMIN_REFERER: &str = "https://console.example.com/admin/users";

/// Scripted stand-in for all three stores. Queued results are consumed in
/// order; once a queue is empty the call succeeds.
pub struct FakeStores {
    caller: Mutex<Result<Option<UserId>, StoreError>>,
    role: Mutex<Result<Option<Role>, StoreError>>,
    record_results: Mutex<VecDeque<Result<RecordRemoval, StoreError>>>,
    identity_results: Mutex<VecDeque<Result<serde_json::Value, StoreError>>>,
    identity_delay: Mutex<Option<Duration>>,
    identity_delay_once: Mutex<Option<Duration>>,
    record_panic: Mutex<Option<&'static str>>,
    /// Store operations in call order.
    pub journal: Mutex<Vec<&'static str>>,
    pub resolve_calls: AtomicUsize,
    pub role_calls: AtomicUsize,
    pub record_calls: AtomicUsize,
    pub identity_calls: AtomicUsize,
}

impl FakeStores {
    /// Caller resolves to an administrator; both deletions succeed.
    pub fn admin() -> Arc<Self> {
        Arc::new(Self {
            caller: Mutex::new(Ok(Some(uid(ADMIN_ID)))),
            role: Mutex::new(Ok(Some(Role::Admin))),
            record_results: Mutex::new(VecDeque::new()),
            identity_results: Mutex::new(VecDeque::new()),
            identity_delay: Mutex::new(None),
            identity_delay_once: Mutex::new(None),
            record_panic: Mutex::new(None),
            journal: Mutex::new(Vec::new()),
            resolve_calls: AtomicUsize::new(0),
            role_calls: AtomicUsize::new(0),
            record_calls: AtomicUsize::new(0),
            identity_calls: AtomicUsize::new(0),
        })
    }

    pub fn set_caller(&self, result: Result<Option<UserId>, StoreError>) {
        *self.caller.lock() = result;
    }

    pub fn set_role(&self, result: Result<Option<Role>, StoreError>) {
        *self.role.lock() = result;
    }

    pub fn push_record(&self, result: Result<RecordRemoval, StoreError>) {
        self.record_results.lock().push_back(result);
    }

    pub fn push_identity(&self, result: Result<serde_json::Value, StoreError>) {
        self.identity_results.lock().push_back(result);
    }

    pub fn delay_identity(&self, delay: Duration) {
        *self.identity_delay.lock() = Some(delay);
    }

    /// Only the next identity deletion is slowed down.
    pub fn delay_next_identity(&self, delay: Duration) {
        *self.identity_delay_once.lock() = Some(delay);
    }

    pub fn panic_on_record(&self, message: &'static str) {
        *self.record_panic.lock() = Some(message);
    }

    pub fn deletion_calls(&self) -> usize {
        self.record_calls.load(Ordering::SeqCst) + self.identity_calls.load(Ordering::SeqCst)
    }

    pub fn lookup_calls(&self) -> usize {
        self.resolve_calls.load(Ordering::SeqCst) + self.role_calls.load(Ordering::SeqCst)
    }

    pub fn stores(self: &Arc<Self>) -> Stores {
        Stores {
            roles: self.clone(),
            records: self.clone(),
            identities: self.clone(),
        }
    }
}

#[async_trait]
impl RoleDirectory for FakeStores {
    async fn role_of(&self, _id: &UserId) -> Result<Option<Role>, StoreError> {
        self.role_calls.fetch_add(1, Ordering::SeqCst);
        self.journal.lock().push("role_of");
        self.role.lock().clone()
    }
}

#[async_trait]
impl RecordStore for FakeStores {
    async fn delete_record(&self, _id: &UserId) -> Result<RecordRemoval, StoreError> {
        self.record_calls.fetch_add(1, Ordering::SeqCst);
        self.journal.lock().push("delete_record");
        let panic_message = self.record_panic.lock().take();
        if let Some(message) = panic_message {
            panic!("{message}");
        }
        self.record_results
            .lock()
            .pop_front()
            .unwrap_or(Ok(RecordRemoval::Deleted))
    }
}

#[async_trait]
impl IdentityStore for FakeStores {
    async fn resolve_caller(&self, _access_token: &str) -> Result<Option<UserId>, StoreError> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        self.journal.lock().push("resolve_caller");
        self.caller.lock().clone()
    }

    async fn delete_identity(&self, id: &UserId) -> Result<serde_json::Value, StoreError> {
        self.identity_calls.fetch_add(1, Ordering::SeqCst);
        self.journal.lock().push("delete_identity");
        let once = self.identity_delay_once.lock().take();
        let delay = once.or(*self.identity_delay.lock());
        if let Some(d) = delay {
            tokio::time::sleep(d).await;
        }
        let next = self.identity_results.lock().pop_front();
        next.unwrap_or_else(|| Ok(serde_json::json!({ "id": id.as_str() })))
    }
}

pub fn uid(s: &str) -> UserId {
    UserId::parse(s).unwrap()
}

pub fn admin_caller() -> CallerContext {
    CallerContext::new(Some(ADMIN_REFERER.into()), Some(ADMIN_TOKEN.into()))
}

/// Deny unresolved callers, five second timeout, single attempt.
pub fn single_attempt() -> ServiceConfig {
    ServiceConfig {
        unresolved_caller: UnresolvedCallerPolicy::Deny,
        store_timeout: Duration::from_secs(5),
        retry: RetryPolicy::no_retry(),
    }
}

pub fn service(fake: &Arc<FakeStores>, config: ServiceConfig) -> Service {
    let stores = fake.stores();
    Service::new(
        stores.roles,
        stores.records,
        stores.identities,
        Arc::new(ReferrerAllowList::new(["/admin/"])),
        config,
    )
}
