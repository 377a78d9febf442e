use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::{info, warn};
use uuid::Uuid;

use funds_core::FundsService;
use funds_db::Database;
use funds_types::api::{Claims, LoginRequest, LoginResponse};
use funds_types::models::{Role, User};

use crate::error::{ApiError, blocking};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub funds: FundsService,
    pub jwt_secret: String,
    pub token_ttl: Duration,
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // Lookup and Argon2 verification are both blocking
    let db = state.db.clone();
    let user = blocking(move || -> Result<User, ApiError> {
        let row = db
            .get_user_by_username(&req.username)?
            .ok_or(StatusCode::UNAUTHORIZED)?;

        if !verify_password(&req.password, &row.password)? {
            warn!("Failed login for {}", req.username);
            return Err(StatusCode::UNAUTHORIZED.into());
        }

        Ok(User::try_from(row)?)
    })
    .await?;

    if !user.is_active {
        return Err(StatusCode::FORBIDDEN.into());
    }

    let access_token = create_token(&state.jwt_secret, &user, state.token_ttl)?;
    info!("User {} logged in", user.username);

    Ok(Json(LoginResponse {
        access_token,
        token_type: "bearer".into(),
        user,
    }))
}

/// Hash a password with Argon2id and a fresh salt.
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Password hashing failed: {}", e))?
        .to_string();
    Ok(hash)
}

/// `Ok(false)` on a mismatch; errors only for an unparseable stored hash.
pub fn verify_password(password: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed =
        PasswordHash::new(hash).map_err(|e| anyhow::anyhow!("Corrupt password hash: {}", e))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

pub fn create_token(secret: &str, user: &User, ttl: Duration) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user.id,
        username: user.username.clone(),
        role: user.role,
        exp: (Utc::now() + ttl).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Create the bootstrap admin unless that username is already taken.
/// Returns whether an account was created.
pub fn ensure_default_admin(
    db: &Database,
    username: &str,
    password: &str,
    email: &str,
) -> anyhow::Result<bool> {
    if db.get_user_by_username(username)?.is_some() {
        info!("Admin account already exists: {}", username);
        return Ok(false);
    }

    let admin = User {
        id: Uuid::new_v4(),
        username: username.to_string(),
        email: email.to_string(),
        role: Role::Admin,
        created_at: Utc::now(),
        is_active: true,
    };
    db.create_user(&admin, &hash_password(password)?)?;

    info!("Default admin account created: {}", username);
    warn!("Change the default admin password before going to production");
    Ok(true)
}
