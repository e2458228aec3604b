//! HTTP store adapters against a mock REST/auth server.

mod common;

use std::sync::Arc;

use httpmock::prelude::*;
use serde_json::json;

use common::*;
use user_admin::contract::model::{RecordRemoval, Role, StoreErrorKind};
use user_admin::domain::access::ReferrerAllowList;
use user_admin::domain::error::{DomainError, StoreError};
use user_admin::domain::ports::{IdentityStore, RecordStore, RoleDirectory};
use user_admin::domain::service::Service;
use user_admin::infra::http::{
    AuthAdminIdentityStore, RestRecordStore, RestRoleDirectory, StoreClient,
};

const SERVICE_KEY: &str = "service-key";

fn client() -> StoreClient {
    StoreClient::from_client(reqwest::Client::new(), SERVICE_KEY)
}

fn records(server: &MockServer) -> RestRecordStore {
    RestRecordStore::new(client(), &server.url("/rest/v1"), "users").unwrap()
}

fn roles(server: &MockServer) -> RestRoleDirectory {
    RestRoleDirectory::new(client(), &server.url("/rest/v1"), "users").unwrap()
}

fn identities(server: &MockServer) -> AuthAdminIdentityStore {
    AuthAdminIdentityStore::new(client(), &server.url("/auth/v1")).unwrap()
}

#[tokio::test]
async fn record_delete_sends_filter_and_service_credentials() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(DELETE)
                .path("/rest/v1/users")
                .query_param("id", "eq.user-42")
                .header("apikey", SERVICE_KEY)
                .header("authorization", "Bearer service-key")
                .header("prefer", "return=representation");
            then.status(200).json_body(json!([{ "id": "user-42" }]));
        })
        .await;

    let result = records(&server).delete_record(&uid("user-42")).await;

    mock.assert_async().await;
    assert_eq!(result, Ok(RecordRemoval::Deleted));
}

#[tokio::test]
async fn record_delete_with_no_matching_rows_is_already_absent() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(DELETE).path("/rest/v1/users");
            then.status(200).json_body(json!([]));
        })
        .await;

    let result = records(&server).delete_record(&uid("user-42")).await;

    assert_eq!(result, Ok(RecordRemoval::AlreadyAbsent));
}

#[tokio::test]
async fn record_delete_server_error_is_unavailable() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(DELETE).path("/rest/v1/users");
            then.status(503).body("upstream unavailable");
        })
        .await;

    let result = records(&server).delete_record(&uid("user-42")).await;

    assert_eq!(
        result,
        Err(StoreError::Unavailable("upstream unavailable".into()))
    );
}

#[tokio::test]
async fn role_lookup_reads_first_row() {
    let server = MockServer::start_async().await;
    let admin = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/rest/v1/users")
                .query_param("id", "eq.admin-1")
                .query_param("select", "role");
            then.status(200).json_body(json!([{ "role": "admin" }]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/rest/v1/users")
                .query_param("id", "eq.ghost");
            then.status(200).json_body(json!([]));
        })
        .await;

    let dir = roles(&server);
    assert_eq!(dir.role_of(&uid("admin-1")).await, Ok(Some(Role::Admin)));
    assert_eq!(dir.role_of(&uid("ghost")).await, Ok(None));
    admin.assert_async().await;
}

#[tokio::test]
async fn role_lookup_with_unexpected_body_is_malformed() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/rest/v1/users");
            then.status(200).body("<html>maintenance</html>");
        })
        .await;

    let result = roles(&server).role_of(&uid("admin-1")).await;

    assert!(matches!(result, Err(StoreError::Malformed(_))));
}

#[tokio::test]
async fn caller_is_resolved_with_their_own_token() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/auth/v1/user")
                .header("authorization", "Bearer caller-token")
                .header("apikey", SERVICE_KEY);
            then.status(200)
                .json_body(json!({ "id": "admin-1", "email": "admin@example.com" }));
        })
        .await;

    let result = identities(&server).resolve_caller("caller-token").await;

    mock.assert_async().await;
    assert_eq!(result, Ok(Some(uid("admin-1"))));
}

#[tokio::test]
async fn rejected_caller_token_resolves_to_none() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/auth/v1/user");
            then.status(401).json_body(json!({ "msg": "invalid JWT" }));
        })
        .await;

    let result = identities(&server).resolve_caller("expired").await;

    assert_eq!(result, Ok(None));
}

#[tokio::test]
async fn identity_delete_returns_provider_payload() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(DELETE)
                .path("/auth/v1/admin/users/user-42")
                .header("authorization", "Bearer service-key");
            then.status(200).json_body(json!({ "id": "user-42", "aud": "authenticated" }));
        })
        .await;

    let result = identities(&server).delete_identity(&uid("user-42")).await;

    mock.assert_async().await;
    assert_eq!(result, Ok(json!({ "id": "user-42", "aud": "authenticated" })));
}

#[tokio::test]
async fn identity_delete_with_empty_body_yields_empty_object() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(DELETE).path("/auth/v1/admin/users/user-42");
            then.status(204);
        })
        .await;

    let result = identities(&server).delete_identity(&uid("user-42")).await;

    assert_eq!(result, Ok(json!({})));
}

#[tokio::test]
async fn identity_not_found_surfaces_provider_message() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(DELETE).path("/auth/v1/admin/users/user-42");
            then.status(404)
                .json_body(json!({ "code": 404, "error_code": "user_not_found", "msg": "not found" }));
        })
        .await;

    let result = identities(&server).delete_identity(&uid("user-42")).await;

    assert_eq!(result, Err(StoreError::NotFound("not found".into())));
}

#[tokio::test]
async fn unreachable_store_is_unavailable() {
    // Nothing listens on the discard port.
    let store = AuthAdminIdentityStore::new(client(), "http://127.0.0.1:9/auth/v1").unwrap();

    let result = store.delete_identity(&uid("user-42")).await;

    assert!(matches!(result, Err(e) if e.kind() == StoreErrorKind::Unavailable));
}

#[tokio::test]
async fn service_over_http_reports_auth_not_found() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/auth/v1/user");
            then.status(200).json_body(json!({ "id": "admin-1" }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/rest/v1/users")
                .query_param("select", "role");
            then.status(200).json_body(json!([{ "role": "admin" }]));
        })
        .await;
    let record_delete = server
        .mock_async(|when, then| {
            when.method(DELETE).path("/rest/v1/users");
            then.status(200).json_body(json!([]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(DELETE).path("/auth/v1/admin/users/user-42");
            then.status(404).json_body(json!({ "msg": "not found" }));
        })
        .await;

    let svc = Service::new(
        Arc::new(roles(&server)),
        Arc::new(records(&server)),
        Arc::new(identities(&server)),
        Arc::new(ReferrerAllowList::new(["/admin/"])),
        single_attempt(),
    );

    let err = svc.delete_user("user-42", &admin_caller()).await.unwrap_err();

    record_delete.assert_async().await;
    assert_eq!(
        err,
        DomainError::auth_deletion_failed(StoreError::NotFound("not found".into()))
    );
}
