use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::json;

use captable_api::config::{AdminBootstrap, AppConfig};
use captable_auth::{JwtClaims, Role};
use captable_core::UserId;
use captable_store::MemoryStore;

const JWT_SECRET: &str = "test-secret";
const ADMIN_EMAIL: &str = "admin@example.com";
const ADMIN_PASSWORD: &str = "admin-pw";

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, on the in-memory store and an ephemeral port.
        let config = AppConfig {
            bind_addr: "127.0.0.1:0".to_string(),
            database_url: None,
            jwt_secret: JWT_SECRET.to_string(),
            token_ttl_secs: 1_800,
            company_name: "Test Holdings, Inc.".to_string(),
            admin: Some(AdminBootstrap {
                email: ADMIN_EMAIL.to_string(),
                password: ADMIN_PASSWORD.to_string(),
            }),
        };
        let app = captable_api::app::build_app(&config, Arc::new(MemoryStore::new())).await;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn login(client: &reqwest::Client, base_url: &str, email: &str, password: &str) -> String {
    let res = client
        .post(format!("{base_url}/api/token/"))
        .form(&[("username", email), ("password", password)])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK, "login failed for {email}");
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["token_type"], "bearer");
    body["access_token"].as_str().unwrap().to_string()
}

async fn create_shareholder(
    client: &reqwest::Client,
    base_url: &str,
    admin_token: &str,
    full_name: &str,
    email: &str,
    password: &str,
) -> serde_json::Value {
    let res = client
        .post(format!("{base_url}/api/shareholders/"))
        .bearer_auth(admin_token)
        .json(&json!({
            "full_name": full_name,
            "email": email,
            "password": password,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    res.json().await.unwrap()
}

async fn issue_shares(
    client: &reqwest::Client,
    base_url: &str,
    admin_token: &str,
    shareholder_id: &str,
    quantity: i64,
) -> serde_json::Value {
    let res = client
        .post(format!("{base_url}/api/issuances/"))
        .bearer_auth(admin_token)
        .json(&json!({
            "shareholder_id": shareholder_id,
            "share_class": "common",
            "quantity": quantity,
            "price_per_share_cents": 150,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    res.json().await.unwrap()
}

#[tokio::test]
async fn login_mints_bearer_token() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/api/token/", srv.base_url))
        .form(&[("username", ADMIN_EMAIL), ("password", ADMIN_PASSWORD)])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["token_type"], "bearer");
    assert_eq!(body["expires_in"], 1_800);
    assert!(!body["access_token"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn bad_credentials_are_rejected_uniformly() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    // Wrong password and unknown email produce identical error shapes.
    for (email, password) in [(ADMIN_EMAIL, "wrong"), ("ghost@example.com", "whatever")] {
        let res = client
            .post(format!("{}/api/token/", srv.base_url))
            .form(&[("username", email), ("password", password)])
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body["error"], "unauthorized");
    }
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/api/shareholders/", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn expired_tokens_are_rejected() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let now = Utc::now();
    let claims = JwtClaims {
        sub: UserId::new(),
        role: Role::Admin,
        issued_at: now - Duration::hours(1),
        expires_at: now - Duration::minutes(30),
    };
    let stale = jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap();

    let res = client
        .get(format!("{}/api/shareholders/", srv.base_url))
        .bearer_auth(stale)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn shareholders_cannot_use_admin_operations() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let admin = login(&client, &srv.base_url, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    create_shareholder(
        &client,
        &srv.base_url,
        &admin,
        "Grace Hopper",
        "grace@example.com",
        "grace-pw",
    )
    .await;
    let token = login(&client, &srv.base_url, "grace@example.com", "grace-pw").await;

    // Well-formed requests, so authorization is the only thing that fails.
    let attempts = [
        (
            reqwest::Method::POST,
            "/api/shareholders/",
            Some(json!({ "full_name": "Eve", "email": "eve@example.com" })),
        ),
        (reqwest::Method::GET, "/api/shareholders/", None),
        (
            reqwest::Method::POST,
            "/api/issuances/",
            Some(json!({
                "shareholder_id": uuid::Uuid::now_v7().to_string(),
                "share_class": "common",
                "quantity": 1,
                "price_per_share_cents": 100,
            })),
        ),
        (reqwest::Method::GET, "/api/audit/", None),
    ];
    for (method, path, body) in attempts {
        let mut req = client
            .request(method.clone(), format!("{}{path}", srv.base_url))
            .bearer_auth(&token);
        if let Some(body) = &body {
            req = req.json(body);
        }
        let res = req.send().await.unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN, "{method} {path}");
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body["error"], "forbidden");
    }
}

#[tokio::test]
async fn ownership_is_derived_and_listings_are_scoped() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let admin = login(&client, &srv.base_url, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let s = create_shareholder(
        &client,
        &srv.base_url,
        &admin,
        "Grace Hopper",
        "grace@example.com",
        "grace-pw",
    )
    .await;
    let t = create_shareholder(
        &client,
        &srv.base_url,
        &admin,
        "Ada Lovelace",
        "ada@example.com",
        "ada-pw",
    )
    .await;

    issue_shares(&client, &srv.base_url, &admin, s["id"].as_str().unwrap(), 100).await;
    issue_shares(&client, &srv.base_url, &admin, t["id"].as_str().unwrap(), 300).await;

    // Percentages come out of the ledger, never stored.
    let res = client
        .get(format!(
            "{}/api/shareholders/{}",
            srv.base_url,
            s["id"].as_str().unwrap()
        ))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let view: serde_json::Value = res.json().await.unwrap();
    assert_eq!(view["total_shares"], 100);
    assert!((view["ownership_pct"].as_f64().unwrap() - 25.0).abs() < 1e-9);

    // A shareholder sees exactly their own ledger rows.
    let token = login(&client, &srv.base_url, "grace@example.com", "grace-pw").await;
    let res = client
        .get(format!("{}/api/issuances/", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["quantity"], 100);
    assert_eq!(items[0]["total_value_cents"], 15_000);
}

#[tokio::test]
async fn cross_shareholder_access_is_forbidden_not_hidden() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let admin = login(&client, &srv.base_url, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let _mine = create_shareholder(
        &client,
        &srv.base_url,
        &admin,
        "Grace Hopper",
        "grace@example.com",
        "grace-pw",
    )
    .await;
    let t = create_shareholder(
        &client,
        &srv.base_url,
        &admin,
        "Ada Lovelace",
        "ada@example.com",
        "ada-pw",
    )
    .await;
    let theirs = issue_shares(&client, &srv.base_url, &admin, t["id"].as_str().unwrap(), 300).await;

    let token = login(&client, &srv.base_url, "grace@example.com", "grace-pw").await;
    let res = client
        .get(format!(
            "{}/api/issuances/{}",
            srv.base_url,
            theirs["id"].as_str().unwrap()
        ))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    // The row exists, so the answer is forbidden rather than not_found.
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "forbidden");

    // A well-formed id that matches nothing is a 404 even for admins.
    let res = client
        .get(format!(
            "{}/api/issuances/{}",
            srv.base_url,
            uuid::Uuid::now_v7()
        ))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // A malformed id is a validation error, not a crash or a 404.
    let res = client
        .get(format!("{}/api/issuances/not-a-uuid", srv.base_url))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn certificate_downloads_are_byte_identical() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let admin = login(&client, &srv.base_url, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let s = create_shareholder(
        &client,
        &srv.base_url,
        &admin,
        "Grace Hopper",
        "grace@example.com",
        "grace-pw",
    )
    .await;
    let issuance = issue_shares(&client, &srv.base_url, &admin, s["id"].as_str().unwrap(), 100).await;
    let url = format!(
        "{}/api/issuances/{}/certificate",
        srv.base_url,
        issuance["id"].as_str().unwrap()
    );

    let first = client.get(&url).bearer_auth(&admin).send().await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(
        first.headers()["content-type"].to_str().unwrap(),
        "application/pdf"
    );
    assert!(first.headers()["content-disposition"]
        .to_str()
        .unwrap()
        .starts_with("attachment"));
    let first = first.bytes().await.unwrap();
    assert!(first.starts_with(b"%PDF-"));

    let second = client.get(&url).bearer_auth(&admin).send().await.unwrap();
    let second = second.bytes().await.unwrap();
    assert_eq!(first, second);

    // Preview serves the same document inline.
    let preview = client
        .get(format!(
            "{}/api/issuances/{}/preview",
            srv.base_url,
            issuance["id"].as_str().unwrap()
        ))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(
        preview.headers()["content-disposition"].to_str().unwrap(),
        "inline"
    );
    assert_eq!(preview.bytes().await.unwrap(), first);
}

#[tokio::test]
async fn health_reports_storage_status() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/health", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn detailed_health_breaks_out_component_checks() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/health/detailed", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["checks"]["database"], "healthy");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn root_lists_service_metadata_and_entry_points() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("x-process-time"));
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["health_check"], "/health");
    assert_eq!(body["api_base"], "/api");
    assert_eq!(body["endpoints"]["login"], "/api/token/");
    assert_eq!(body["endpoints"]["shareholders"], "/api/shareholders/");
    assert_eq!(body["endpoints"]["issuances"], "/api/issuances/");
}

#[tokio::test]
async fn audit_trail_records_registry_and_ledger_actions() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let admin = login(&client, &srv.base_url, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let s = create_shareholder(
        &client,
        &srv.base_url,
        &admin,
        "Grace Hopper",
        "grace@example.com",
        "grace-pw",
    )
    .await;
    issue_shares(&client, &srv.base_url, &admin, s["id"].as_str().unwrap(), 100).await;

    let res = client
        .get(format!("{}/api/audit/", srv.base_url))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    let actions: Vec<&str> = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["action"].as_str().unwrap())
        .collect();

    for expected in [
        "auth.login_succeeded",
        "registry.shareholder_created",
        "ledger.shares_issued",
    ] {
        assert!(actions.contains(&expected), "missing {expected}: {actions:?}");
    }
}

#[tokio::test]
async fn duplicate_shareholder_email_is_a_conflict() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let admin = login(&client, &srv.base_url, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    create_shareholder(
        &client,
        &srv.base_url,
        &admin,
        "Grace Hopper",
        "grace@example.com",
        "grace-pw",
    )
    .await;

    let res = client
        .post(format!("{}/api/shareholders/", srv.base_url))
        .bearer_auth(&admin)
        .json(&json!({
            "full_name": "Grace Again",
            "email": "grace@example.com",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "conflict");
}

#[tokio::test]
async fn issuance_validation_rejects_out_of_range_input() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let admin = login(&client, &srv.base_url, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let s = create_shareholder(
        &client,
        &srv.base_url,
        &admin,
        "Grace Hopper",
        "grace@example.com",
        "grace-pw",
    )
    .await;

    // (quantity, price_per_share_cents); each violates one bound, including
    // a pair the bounds exist to stop from overflowing the total.
    let cases = [
        (0_i64, 150_i64),
        (-5, 150),
        (1_000_001, 150),
        (100, -1),
        (100, 1_000_001),
        (1_000_000, i64::MAX / 1_000),
    ];
    for (quantity, price) in cases {
        let res = client
            .post(format!("{}/api/issuances/", srv.base_url))
            .bearer_auth(&admin)
            .json(&json!({
                "shareholder_id": s["id"],
                "share_class": "common",
                "quantity": quantity,
                "price_per_share_cents": price,
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(
            res.status(),
            StatusCode::BAD_REQUEST,
            "quantity {quantity}, price {price}"
        );
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body["error"], "validation_error");
    }
}
