use axum::{
    Json, Router, middleware,
    routing::{get, post},
};
use serde_json::{Value, json};

use crate::auth::{self, AppState};
use crate::middleware::{require_admin, require_auth};
use crate::{admin, user};

/// Every route, with state applied. CORS and tracing layers are left to the
/// binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/auth/login", post(auth::login))
        .with_state(state.clone());

    let user_routes = Router::new()
        .route("/user/profile", get(user::profile))
        .route("/user/deposit", post(user::submit_deposit))
        .route("/user/deposit/current", get(user::current_deposit))
        .route("/user/balance", get(user::balance))
        .route("/user/withdraw", post(user::withdraw))
        .route("/user/transactions", get(user::transactions))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state.clone());

    // Layers run outside-in: auth first, then the role check
    let admin_routes = Router::new()
        .route("/admin/users", post(admin::create_user).get(admin::list_users))
        .route("/admin/deposits", get(admin::all_deposits))
        .route("/admin/deposits/pending", get(admin::pending_deposits))
        .route("/admin/deposits/{deposit_id}/approve", post(admin::approve_deposit))
        .route("/admin/deposits/{deposit_id}/reject", post(admin::reject_deposit))
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(user_routes)
        .merge(admin_routes)
}

async fn root() -> Json<Value> {
    Json(json!({
        "message": "Personal Funds Management API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}
