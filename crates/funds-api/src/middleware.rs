use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use jsonwebtoken::{DecodingKey, Validation, decode};
use tracing::{error, warn};

use funds_types::api::Claims;
use funds_types::models::{Role, User};

use crate::auth::AppState;

/// Extract and validate the JWT, then load the account it names.
///
/// Inserts the current `User` into request extensions. A token for a
/// deleted account is 401, a deactivated one 403.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let bearer = req
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token_data = decode::<Claims>(
        bearer.token(),
        &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| StatusCode::UNAUTHORIZED)?;

    let db = state.db.clone();
    let user_id = token_data.claims.sub.to_string();
    let row = tokio::task::spawn_blocking(move || db.get_user_by_id(&user_id))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .map_err(|e| {
            error!("User lookup failed: {:#}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let user = User::try_from(row).map_err(|e| {
        error!("Corrupt user row: {:#}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    if !user.is_active {
        warn!("Inactive user {} rejected", user.username);
        return Err(StatusCode::FORBIDDEN);
    }

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Must run inside `require_auth`.
pub async fn require_admin(req: Request, next: Next) -> Result<Response, StatusCode> {
    let user = req
        .extensions()
        .get::<User>()
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if user.role != Role::Admin {
        warn!("Non-admin {} denied admin route", user.username);
        return Err(StatusCode::FORBIDDEN);
    }

    Ok(next.run(req).await)
}
