//! Session middleware and the cart session service.
//!
//! Sets up `PostgreSQL`-backed sessions using tower-sessions and exposes
//! [`CartSession`], the handler-side view of who owns the current cart.
//!
//! ## Ownership rules
//!
//! - A signed-in user owns their cart, whatever else is in the session.
//! - An anonymous visitor gets a [`SessionId`] the first time they write to
//!   a cart; reading an empty cart never creates one.
//! - Signing in folds the anonymous cart into the user's cart once, then
//!   forgets the anonymous id and cycles the session cookie.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
};
use sqlx::PgPool;
use tower_sessions::{Expiry, Session, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;
use tracing::{info, warn};

use bookstore_core::{CartOwner, SessionId};

use crate::config::StorefrontConfig;
use crate::db::CartRepository;
use crate::error::AppError;
use crate::models::{CurrentUser, MergeOutcome, User, session_keys};

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "bookstore_session";

/// Session expiry time in seconds (30 days), matching the anonymous cart lifetime.
const SESSION_EXPIRY_SECONDS: i64 = 30 * 24 * 60 * 60;

/// Create the session layer with `PostgreSQL` store.
///
/// The `tower_sessions.session` table is created by the storefront migrations.
#[must_use]
pub fn create_session_layer(
    pool: &PgPool,
    config: &StorefrontConfig,
) -> SessionManagerLayer<PostgresStore> {
    let store = PostgresStore::new(pool.clone());

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// Extractor resolving the cart owner for the current request.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(cart_session: CartSession) -> Result<Json<Cart>> {
///     let owner = cart_session.owner_or_create().await?;
///     ...
/// }
/// ```
#[derive(Clone)]
pub struct CartSession {
    session: Session,
}

impl<S> FromRequestParts<S> for CartSession
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by SessionManagerLayer
        let session = parts.extensions.get::<Session>().cloned().ok_or((
            StatusCode::INTERNAL_SERVER_ERROR,
            "session layer is not installed",
        ))?;

        Ok(Self { session })
    }
}

impl CartSession {
    /// Wrap an existing session.
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }

    /// The signed-in user, if any.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Session` if the session store cannot be read.
    pub async fn current_user(&self) -> Result<Option<CurrentUser>, AppError> {
        Ok(self
            .session
            .get::<CurrentUser>(session_keys::CURRENT_USER)
            .await?)
    }

    /// The owner of the current cart, or `None` for a visitor who has not
    /// put anything in a cart yet.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Session` if the session store cannot be read.
    pub async fn owner(&self) -> Result<Option<CartOwner>, AppError> {
        if let Some(user) = self.current_user().await? {
            return Ok(Some(CartOwner::User(user.id)));
        }
        Ok(self.anonymous_id().await?.map(CartOwner::Session))
    }

    /// The owner of the current cart, assigning a fresh anonymous id to a
    /// first-time visitor.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Session` if the session store cannot be written.
    pub async fn owner_or_create(&self) -> Result<CartOwner, AppError> {
        if let Some(owner) = self.owner().await? {
            return Ok(owner);
        }

        let session_id = SessionId::generate();
        self.session
            .insert(session_keys::CART_SESSION_ID, &session_id)
            .await?;
        Ok(CartOwner::Session(session_id))
    }

    /// Sign a user in.
    ///
    /// Merges the anonymous cart (if any) into the user's cart, forgets the
    /// anonymous id, cycles the session id and stores the user.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the merge fails; the session is left
    /// untouched in that case so the visitor keeps their cart.
    pub async fn sign_in(&self, pool: &PgPool, user: &User) -> Result<MergeOutcome, AppError> {
        let outcome = match self.anonymous_id().await? {
            Some(session_id) => {
                let outcome = CartRepository::new(pool).merge(&session_id, user.id).await?;
                self.session
                    .remove::<SessionId>(session_keys::CART_SESSION_ID)
                    .await?;
                outcome
            }
            None => MergeOutcome::default(),
        };

        self.session.cycle_id().await?;
        self.session
            .insert(
                session_keys::CURRENT_USER,
                CurrentUser {
                    id: user.id,
                    email: user.email.clone(),
                },
            )
            .await?;

        info!(
            user_id = %user.id,
            merged = outcome.merged_lines,
            dropped = outcome.dropped_lines,
            "User signed in"
        );
        Ok(outcome)
    }

    /// Sign out and drop everything stored in the session.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Session` if the session cannot be deleted.
    pub async fn sign_out(&self) -> Result<(), AppError> {
        self.session.flush().await?;
        Ok(())
    }

    async fn anonymous_id(&self) -> Result<Option<SessionId>, AppError> {
        let raw = self
            .session
            .get::<String>(session_keys::CART_SESSION_ID)
            .await?;

        Ok(raw.and_then(|raw| match SessionId::parse(&raw) {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(error = %e, "Discarding malformed cart session id");
                None
            }
        }))
    }
}
