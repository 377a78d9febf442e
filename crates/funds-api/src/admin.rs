use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use funds_types::api::{ApproveResponse, CreateUserRequest, MessageResponse};
use funds_types::models::{Role, User};

use crate::auth::{AppState, hash_password};
use crate::error::{ApiError, blocking};

pub async fn create_user(
    State(state): State<AppState>,
    Extension(admin): Extension<User>,
    Json(req): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // Validate input
    if req.username.len() < 3 || req.username.len() > 32 {
        return Err(ApiError::invalid("Username must be 3 to 32 characters"));
    }
    if !is_plausible_email(&req.email) {
        return Err(ApiError::invalid("Invalid email address"));
    }
    if req.password.len() < 8 {
        return Err(ApiError::invalid("Password must be at least 8 characters"));
    }

    let db = state.db.clone();
    let user = blocking(move || -> Result<User, ApiError> {
        if db.get_user_by_username(&req.username)?.is_some() {
            return Err(ApiError::conflict("Username already exists"));
        }
        if db.get_user_by_email(&req.email)?.is_some() {
            return Err(ApiError::conflict("Email already exists"));
        }

        let user = User {
            id: Uuid::new_v4(),
            username: req.username,
            email: req.email,
            role: req.role,
            created_at: Utc::now(),
            is_active: true,
        };
        db.create_user(&user, &hash_password(&req.password)?)?;
        Ok(user)
    })
    .await?;

    info!("User {} ({}) created by {}", user.username, user.role.as_str(), admin.username);
    Ok((StatusCode::CREATED, Json(user)))
}

/// Accounts with the `user` role.
pub async fn list_users(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let db = state.db.clone();
    let users = blocking(move || db.list_users(Role::User)).await?;
    Ok(Json(users))
}

pub async fn pending_deposits(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let funds = state.funds.clone();
    let deposits = blocking(move || funds.list_pending_deposits()).await?;
    Ok(Json(deposits))
}

pub async fn approve_deposit(
    State(state): State<AppState>,
    Extension(admin): Extension<User>,
    Path(deposit_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let funds = state.funds.clone();
    let (_, maturity_date) = blocking(move || funds.approve_deposit(deposit_id, admin.id)).await?;

    Ok(Json(ApproveResponse {
        message: "Deposit approved successfully".into(),
        maturity_date,
    }))
}

pub async fn reject_deposit(
    State(state): State<AppState>,
    Extension(admin): Extension<User>,
    Path(deposit_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let funds = state.funds.clone();
    blocking(move || funds.reject_deposit(deposit_id, admin.id)).await?;

    Ok(Json(MessageResponse::new("Deposit rejected successfully")))
}

/// Every deposit, newest submission first, with interest recomputed.
pub async fn all_deposits(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let funds = state.funds.clone();
    let deposits = blocking(move || funds.list_all_deposits()).await?;
    Ok(Json(deposits))
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}
