//! Authentication route handlers.
//!
//! Registering or logging in signs the user into the current session, which
//! folds any anonymous cart into the user's cart.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use bookstore_core::{Email, UserId};

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::CartSession;
use crate::models::{MergeOutcome, User};
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Login request body.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Registration request body.
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

/// Public view of a signed-in user.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: UserId,
    pub email: Email,
    pub full_name: Option<String>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
        }
    }
}

/// Response to a successful sign-in.
#[derive(Debug, Serialize)]
pub struct SignedInResponse {
    pub user: UserResponse,
    /// What happened to the anonymous cart.
    pub cart: MergeOutcome,
}

/// Create an account and sign it in.
#[instrument(skip(state, cart_session, body), fields(email = %body.email))]
pub async fn register(
    State(state): State<AppState>,
    cart_session: CartSession,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<SignedInResponse>)> {
    let user = AuthService::new(state.pool())
        .register_with_password(&body.email, &body.password, body.full_name.as_deref())
        .await?;

    let response = sign_in(&state, &cart_session, user).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Log in with email and password.
#[instrument(skip(state, cart_session, body), fields(email = %body.email))]
pub async fn login(
    State(state): State<AppState>,
    cart_session: CartSession,
    Json(body): Json<LoginRequest>,
) -> Result<Json<SignedInResponse>> {
    let user = AuthService::new(state.pool())
        .login_with_password(&body.email, &body.password)
        .await?;

    Ok(Json(sign_in(&state, &cart_session, user).await?))
}

/// Log out and drop the session.
#[instrument(skip(cart_session))]
pub async fn logout(cart_session: CartSession) -> Result<StatusCode> {
    cart_session.sign_out().await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

async fn sign_in(
    state: &AppState,
    cart_session: &CartSession,
    user: User,
) -> Result<SignedInResponse> {
    let cart = cart_session.sign_in(state.pool(), &user).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));

    Ok(SignedInResponse {
        user: user.into(),
        cart,
    })
}
