//! HTTP layer: login and JWT auth, the user and admin routes, and the
//! mapping from domain errors onto status codes.

pub mod admin;
pub mod auth;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod user;

pub use auth::{AppState, AppStateInner};
pub use error::ApiError;
pub use routes::router;
