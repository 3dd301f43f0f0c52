//! The session context that is passed explicitly into every store operation.

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};
use time::OffsetDateTime;

use crate::{Error, auth::UserId};

/// When the auth cookie of the current request runs out. The auth middleware
/// stores it in the request extensions next to the [UserId].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SessionExpiry(pub(crate) OffsetDateTime);

/// Who is making a request.
///
/// Store operations never look up the current user on their own, the caller
/// hands them a `Session` instead. An anonymous session makes every store
/// operation fail with [Error::Unauthenticated].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Session {
    user_id: Option<UserId>,
    expires_at: Option<OffsetDateTime>,
}

impl Session {
    /// A session for the logged in user `user_id`.
    pub fn for_user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            expires_at: None,
        }
    }

    /// The same session, ending at `expires_at`.
    pub fn until(self, expires_at: OffsetDateTime) -> Self {
        Self {
            expires_at: Some(expires_at),
            ..self
        }
    }

    /// A session without a logged in user.
    pub fn anonymous() -> Self {
        Self {
            user_id: None,
            expires_at: None,
        }
    }

    /// The logged in user, if any.
    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    /// When the session ends, if it has a known end. Long-lived responses
    /// such as live feeds stop at this time.
    pub fn expires_at(&self) -> Option<OffsetDateTime> {
        self.expires_at
    }

    /// The logged in user.
    ///
    /// # Errors
    /// Returns [Error::Unauthenticated] for an anonymous session.
    pub fn require_user(&self) -> Result<UserId, Error> {
        self.user_id.ok_or(Error::Unauthenticated)
    }
}

/// Reads the user ID that the auth middleware stores in the request
/// extensions. Requests that did not pass through the middleware get an
/// anonymous session.
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = match parts.extensions.get::<UserId>() {
            Some(user_id) => Session::for_user(*user_id),
            None => return Ok(Session::anonymous()),
        };

        let session = match parts.extensions.get::<SessionExpiry>() {
            Some(SessionExpiry(expires_at)) => session.until(*expires_at),
            None => session,
        };

        Ok(session)
    }
}
