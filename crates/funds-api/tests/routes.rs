/// End-to-end route tests: the real router over SQLite, with a fixed clock
/// so maturity can be reached without waiting.
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use chrono::{DateTime, Duration, Utc};
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use funds_api::{AppStateInner, auth, router};
use funds_core::{FixedClock, FundsService};
use funds_db::Database;

struct Harness {
    app: Router,
    clock: Arc<FixedClock>,
    path: PathBuf,
}

impl Drop for Harness {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", self.path.display(), suffix));
        }
    }
}

fn harness() -> Harness {
    let path = std::env::temp_dir().join(format!("funds_api_test_{}.db", Uuid::new_v4()));
    let db = Arc::new(Database::open(&path).unwrap());
    auth::ensure_default_admin(&db, "admin", "admin123", "admin@example.com").unwrap();

    let start: DateTime<Utc> = DateTime::parse_from_rfc3339("2025-03-01T09:00:00Z")
        .unwrap()
        .with_timezone(&Utc);
    let clock = Arc::new(FixedClock::new(start));
    let funds = FundsService::new(db.clone(), clock.clone());

    let state = Arc::new(AppStateInner {
        db,
        funds,
        jwt_secret: "test-secret".into(),
        token_ttl: Duration::minutes(30),
    });

    Harness {
        app: router(state),
        clock,
        path,
    }
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn login(app: &Router, username: &str, password: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "username": username, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);
    assert_eq!(body["token_type"], "bearer");
    body["access_token"].as_str().unwrap().to_string()
}

async fn create_user(app: &Router, admin: &str, username: &str) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        "/admin/users",
        Some(admin),
        Some(json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "password": "password1",
        })),
    )
    .await
}

fn amount(value: &Value) -> Decimal {
    match value {
        Value::String(s) => s.parse().unwrap(),
        Value::Number(n) => n.to_string().parse().unwrap(),
        other => panic!("not an amount: {}", other),
    }
}

#[tokio::test]
async fn health_and_root_are_public() {
    let h = harness();
    let (status, body) = send(&h.app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(&h.app, Method::GET, "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Personal Funds Management API");
}

#[tokio::test]
async fn login_rejects_bad_credentials() {
    let h = harness();
    let wrong = json!({ "username": "admin", "password": "nope" });
    let (status, _) = send(&h.app, Method::POST, "/auth/login", None, Some(wrong)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let unknown = json!({ "username": "ghost", "password": "admin123" });
    let (status, _) = send(&h.app, Method::POST, "/auth/login", None, Some(unknown)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn routes_require_a_valid_token() {
    let h = harness();
    let (status, _) = send(&h.app, Method::GET, "/user/balance", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&h.app, Method::GET, "/user/balance", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&h.app, Method::GET, "/admin/users", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_routes_need_admin_role() {
    let h = harness();
    let admin = login(&h.app, "admin", "admin123").await;

    let (status, user) = create_user(&h.app, &admin, "alice").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["role"], "user");
    assert_eq!(user["is_active"], true);

    let (status, body) = create_user(&h.app, &admin, "alice").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["detail"], "Username already exists");

    let alice = login(&h.app, "alice", "password1").await;
    let (status, _) = send(&h.app, Method::GET, "/admin/users", Some(&alice), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = create_user(&h.app, &alice, "mallory").await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Admins are not listed
    let (status, users) = send(&h.app, Method::GET, "/admin/users", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<_> = users.as_array().unwrap().iter().map(|u| u["username"].clone()).collect();
    assert_eq!(names, vec![json!("alice")]);

    let (status, profile) = send(&h.app, Method::GET, "/user/profile", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["email"], "alice@example.com");
    assert!(profile.get("password").is_none());
}

#[tokio::test]
async fn create_user_validates_input() {
    let h = harness();
    let admin = login(&h.app, "admin", "admin123").await;

    let bad_email = json!({ "username": "bob", "email": "bob", "password": "password1" });
    let (status, body) =
        send(&h.app, Method::POST, "/admin/users", Some(&admin), Some(bad_email)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_argument");

    let short = json!({ "username": "bob", "email": "bob@example.com", "password": "short" });
    let (status, _) = send(&h.app, Method::POST, "/admin/users", Some(&admin), Some(short)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let taken = json!({
        "username": "bobby",
        "email": "admin@example.com",
        "password": "password1",
    });
    let (status, body) =
        send(&h.app, Method::POST, "/admin/users", Some(&admin), Some(taken)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["detail"], "Email already exists");
}

#[tokio::test]
async fn deposit_lifecycle_over_http() {
    let h = harness();
    let admin = login(&h.app, "admin", "admin123").await;
    create_user(&h.app, &admin, "alice").await;
    let alice = login(&h.app, "alice", "password1").await;

    // Nothing yet
    let (status, current) =
        send(&h.app, Method::GET, "/user/deposit/current", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(current.is_null());

    let submit = json!({ "amount": 1000, "proof_url": "https://proofs.example.com/1.png" });
    let (status, deposit) =
        send(&h.app, Method::POST, "/user/deposit", Some(&alice), Some(submit.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(deposit["status"], "pending");
    assert_eq!(deposit["is_mature"], false);
    let deposit_id = deposit["id"].as_str().unwrap().to_string();

    let (status, body) =
        send(&h.app, Method::POST, "/user/deposit", Some(&alice), Some(submit)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "conflict");

    let (_, pending) =
        send(&h.app, Method::GET, "/admin/deposits/pending", Some(&admin), None).await;
    assert_eq!(pending.as_array().unwrap().len(), 1);

    let approve = format!("/admin/deposits/{}/approve", deposit_id);
    let (status, body) = send(&h.app, Method::POST, &approve, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Deposit approved successfully");
    assert!(body["maturity_date"].as_str().unwrap().starts_with("2025-05-30"));

    let (status, body) = send(&h.app, Method::POST, &approve, Some(&admin), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_state");

    // Too early
    let full = json!({ "withdraw_type": "full" });
    let (status, body) =
        send(&h.app, Method::POST, "/user/withdraw", Some(&alice), Some(full.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "not_mature");
    assert_eq!(body["days_left"], 90);

    h.clock.advance(Duration::days(90));

    let (_, balance) = send(&h.app, Method::GET, "/user/balance", Some(&alice), None).await;
    assert_eq!(amount(&balance["principal"]), dec!(1000));
    assert_eq!(amount(&balance["accrued_interest"]), dec!(120.00));
    assert_eq!(amount(&balance["total_balance"]), dec!(1120.00));
    assert_eq!(balance["has_active_deposit"], true);

    let bogus = json!({ "withdraw_type": "everything" });
    let (status, body) =
        send(&h.app, Method::POST, "/user/withdraw", Some(&alice), Some(bogus)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_argument");

    let (status, body) =
        send(&h.app, Method::POST, "/user/withdraw", Some(&alice), Some(full.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(amount(&body["amount"]), dec!(1120.00));
    assert_eq!(body["type"], "full");
    assert_eq!(body["description"], "Full withdrawal: Principal $1000.00 + Interest $120.00");

    let (status, _) = send(&h.app, Method::POST, "/user/withdraw", Some(&alice), Some(full)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, ledger) = send(&h.app, Method::GET, "/user/transactions", Some(&alice), None).await;
    let ledger = ledger.as_array().unwrap();
    assert_eq!(ledger.len(), 2);
    assert_eq!(ledger[0]["type"], "withdrawal");
    assert_eq!(amount(&ledger[0]["balance_after"]), Decimal::ZERO);
    assert_eq!(ledger[1]["type"], "deposit");

    let (_, current) = send(&h.app, Method::GET, "/user/deposit/current", Some(&alice), None).await;
    assert!(current.is_null());

    let (_, all) = send(&h.app, Method::GET, "/admin/deposits", Some(&admin), None).await;
    assert_eq!(all[0]["status"], "withdrawn");
}

#[tokio::test]
async fn reject_frees_the_slot() {
    let h = harness();
    let admin = login(&h.app, "admin", "admin123").await;
    create_user(&h.app, &admin, "bob").await;
    let bob = login(&h.app, "bob", "password1").await;

    let submit = json!({ "amount": "250.50", "proof_url": "p" });
    let (_, deposit) =
        send(&h.app, Method::POST, "/user/deposit", Some(&bob), Some(submit.clone())).await;
    let reject = format!("/admin/deposits/{}/reject", deposit["id"].as_str().unwrap());

    let (status, body) = send(&h.app, Method::POST, &reject, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Deposit rejected successfully");

    let (_, balance) = send(&h.app, Method::GET, "/user/balance", Some(&bob), None).await;
    assert_eq!(balance["has_active_deposit"], false);

    let (status, _) = send(&h.app, Method::POST, "/user/deposit", Some(&bob), Some(submit)).await;
    assert_eq!(status, StatusCode::CREATED);

    let missing = format!("/admin/deposits/{}/approve", Uuid::new_v4());
    let (status, body) = send(&h.app, Method::POST, &missing, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "not_found");
}

#[tokio::test]
async fn out_of_range_amount_is_rejected() {
    let h = harness();
    let admin = login(&h.app, "admin", "admin123").await;
    create_user(&h.app, &admin, "carol").await;
    let carol = login(&h.app, "carol", "password1").await;

    let submit = json!({ "amount": 0, "proof_url": "p" });
    let (status, body) =
        send(&h.app, Method::POST, "/user/deposit", Some(&carol), Some(submit)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_argument");

    let submit = json!({ "amount": 1_000_000_000_001u64, "proof_url": "p" });
    let (status, body) =
        send(&h.app, Method::POST, "/user/deposit", Some(&carol), Some(submit)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_argument");
}
