use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};

use funds_core::WithdrawKind;
use funds_types::api::{SubmitDepositRequest, WithdrawRequest, WithdrawResponse};
use funds_types::models::User;

use crate::auth::AppState;
use crate::error::{ApiError, blocking};

pub async fn profile(Extension(user): Extension<User>) -> Json<User> {
    Json(user)
}

/// Submit a deposit with proof of payment. Only one pending or approved
/// deposit is allowed per user.
pub async fn submit_deposit(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(req): Json<SubmitDepositRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.proof_url.trim().is_empty() {
        return Err(ApiError::invalid("proof_url must not be empty"));
    }

    let funds = state.funds.clone();
    let view = blocking(move || {
        funds
            .submit_deposit(user.id, req.amount, &req.proof_url)
            .and_then(|deposit| funds.view(&deposit))
    })
    .await?;

    Ok((StatusCode::CREATED, Json(view)))
}

/// The pending or approved deposit, or `null`.
pub async fn current_deposit(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<impl IntoResponse, ApiError> {
    let funds = state.funds.clone();
    let view = blocking(move || funds.current_deposit(user.id)).await?;
    Ok(Json(view))
}

pub async fn balance(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<impl IntoResponse, ApiError> {
    let funds = state.funds.clone();
    let balance = blocking(move || funds.balance(user.id)).await?;
    Ok(Json(balance))
}

pub async fn withdraw(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(req): Json<WithdrawRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let kind: WithdrawKind = req.withdraw_type.parse()?;

    let funds = state.funds.clone();
    let withdrawal = blocking(move || funds.withdraw(user.id, kind)).await?;

    Ok(Json(WithdrawResponse {
        message: "Withdrawal successful".into(),
        amount: withdrawal.amount,
        kind: withdrawal.kind.to_string(),
        description: withdrawal.description,
    }))
}

/// Ledger entries, newest first.
pub async fn transactions(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<impl IntoResponse, ApiError> {
    let funds = state.funds.clone();
    let entries = blocking(move || funds.list_transactions(user.id)).await?;
    Ok(Json(entries))
}
