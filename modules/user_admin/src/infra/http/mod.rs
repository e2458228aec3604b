//! HTTP adapters for the hosted database REST API and the auth admin API.

mod client;
mod identity_store;
mod record_store;
mod role_directory;

pub use client::StoreClient;
pub use identity_store::AuthAdminIdentityStore;
pub use record_store::RestRecordStore;
pub use role_directory::RestRoleDirectory;
