//! Cart ownership.
//!
//! A cart line belongs to exactly one owner: either an anonymous visitor,
//! identified by an opaque [`SessionId`], or an authenticated [`UserId`].
//! Encoding this as an enum means "both" and "neither" cannot be expressed.

use core::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::id::UserId;

/// Errors that can occur when parsing a [`SessionId`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionIdError {
    /// The input string is empty.
    #[error("session id cannot be empty")]
    Empty,
    /// The input string is too long to be a session id.
    #[error("session id must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
}

/// Opaque identifier assigned to an anonymous visitor's cart.
///
/// New identifiers are random UUIDs, but any non-empty string up to
/// [`SessionId::MAX_LENGTH`] is accepted when reading back from storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Longest identifier accepted from the outside.
    pub const MAX_LENGTH: usize = 128;

    /// Generate a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Parse an identifier received from a session store or a client.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty or longer than
    /// [`SessionId::MAX_LENGTH`].
    pub fn parse(s: &str) -> Result<Self, SessionIdError> {
        if s.is_empty() {
            return Err(SessionIdError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(SessionIdError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        Ok(Self(s.to_owned()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for SessionId {
    type Err = SessionIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The identity a cart line belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum CartOwner {
    /// Anonymous visitor.
    Session(SessionId),
    /// Authenticated shopper.
    User(UserId),
}

impl CartOwner {
    /// The user, if this owner is authenticated.
    #[must_use]
    pub const fn user_id(&self) -> Option<UserId> {
        match self {
            Self::User(id) => Some(*id),
            Self::Session(_) => None,
        }
    }

    /// The session, if this owner is anonymous.
    #[must_use]
    pub const fn session_id(&self) -> Option<&SessionId> {
        match self {
            Self::Session(id) => Some(id),
            Self::User(_) => None,
        }
    }
}

impl fmt::Display for CartOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Session(id) => write!(f, "session:{id}"),
            Self::User(id) => write!(f, "user:{id}"),
        }
    }
}

impl From<UserId> for CartOwner {
    fn from(id: UserId) -> Self {
        Self::User(id)
    }
}

impl From<SessionId> for CartOwner {
    fn from(id: SessionId) -> Self {
        Self::Session(id)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for SessionId {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for SessionId {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for SessionId {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique_uuids() {
        let a = SessionId::generate();
        let b = SessionId::generate();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(a.as_str()).is_ok());
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(SessionId::parse(""), Err(SessionIdError::Empty));
    }

    #[test]
    fn test_parse_too_long() {
        let long = "x".repeat(SessionId::MAX_LENGTH + 1);
        assert!(matches!(
            SessionId::parse(&long),
            Err(SessionIdError::TooLong { .. })
        ));
    }

    #[test]
    fn test_owner_accessors_are_exclusive() {
        let session = CartOwner::Session(SessionId::parse("abc").unwrap());
        assert_eq!(session.user_id(), None);
        assert_eq!(session.session_id().map(SessionId::as_str), Some("abc"));

        let user = CartOwner::User(UserId::new(3));
        assert_eq!(user.user_id(), Some(UserId::new(3)));
        assert!(user.session_id().is_none());
    }

    #[test]
    fn test_owner_display() {
        assert_eq!(CartOwner::User(UserId::new(5)).to_string(), "user:5");
        assert_eq!(
            CartOwner::Session(SessionId::parse("s-1").unwrap()).to_string(),
            "session:s-1"
        );
    }

    #[test]
    fn test_owner_serde_shape() {
        let json = serde_json::to_value(CartOwner::User(UserId::new(2))).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "user", "id": 2}));
    }
}
