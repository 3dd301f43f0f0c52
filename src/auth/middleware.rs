//! Authentication middleware that validates cookies, extends sessions, and handles redirects.

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{StatusCode, header::SET_COOKIE},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use time::{Duration, OffsetDateTime};

use crate::{
    AppState,
    auth::cookie::{extend_auth_cookie_duration_if_needed, get_token_from_cookies},
    endpoints,
    session::SessionExpiry,
};

/// The state needed for the auth middleware
#[derive(Clone)]
pub struct AuthState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.cookie_key.clone()
    }
}

/// How an unauthenticated request is sent to the log-in page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogInRedirect {
    /// A 303 redirect for page loads.
    Page,
    /// A 200 with the `HX-Redirect` header for HTMX and script requests.
    Htmx,
}

impl IntoResponse for LogInRedirect {
    fn into_response(self) -> Response {
        match self {
            LogInRedirect::Page => Redirect::to(endpoints::LOG_IN_VIEW).into_response(),
            LogInRedirect::Htmx => (
                HxRedirect(endpoints::LOG_IN_VIEW.to_owned()),
                StatusCode::OK,
            )
                .into_response(),
        }
    }
}

/// Run `request` as the user in the auth cookie and refresh the cookie on the
/// way out. Requests without a valid cookie get `redirect` instead.
async fn guard(
    state: AuthState,
    request: Request,
    next: Next,
    redirect: LogInRedirect,
) -> Response {
    let (mut parts, body) = request.into_parts();

    let jar = match PrivateCookieJar::from_request_parts(&mut parts, &state).await {
        Ok(jar) => jar,
        Err(error) => {
            tracing::error!("could not read cookie jar, sending client to log in: {error:?}");
            return redirect.into_response();
        }
    };

    let Ok(token) = get_token_from_cookies(&jar) else {
        return redirect.into_response();
    };

    let (jar, expires_at) = refresh_cookie(jar, token.expires_at, state.cookie_duration);

    parts.extensions.insert(token.user_id);
    parts.extensions.insert(SessionExpiry(expires_at));
    let response = next.run(Request::from_parts(parts, body)).await;

    with_cookie_headers(response, jar)
}

/// Extend the auth cookie in `jar` and return the jar with its new expiry.
/// The jar and `expires_at` are returned unchanged if the cookie cannot be extended.
fn refresh_cookie(
    jar: PrivateCookieJar,
    expires_at: OffsetDateTime,
    cookie_duration: Duration,
) -> (PrivateCookieJar, OffsetDateTime) {
    match extend_auth_cookie_duration_if_needed(jar.clone(), cookie_duration) {
        Ok(extended) => {
            let expires_at = get_token_from_cookies(&extended)
                .map(|token| token.expires_at)
                .unwrap_or(expires_at);

            (extended, expires_at)
        }
        Err(error) => {
            tracing::error!("could not extend auth cookie: {error:?}");
            (jar, expires_at)
        }
    }
}

/// Copy the `Set-Cookie` headers of `jar` onto `response`.
fn with_cookie_headers(response: Response, jar: PrivateCookieJar) -> Response {
    let (mut parts, body) = response.into_parts();
    let cookie_headers = jar.into_response();

    for value in cookie_headers.headers().get_all(SET_COOKIE) {
        parts.headers.append(SET_COOKIE, value.to_owned());
    }

    Response::from_parts(parts, body)
}

/// Let requests with a valid auth cookie through as that user, otherwise
/// redirect to the log-in page.
///
/// Handlers read the user through the [crate::Session] extractor.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    guard(state, request, next, LogInRedirect::Page).await
}

/// Like [auth_guard], but redirects with the `HX-Redirect` header so that
/// HTMX requests load the log-in page instead of swapping it in.
pub async fn auth_guard_hx(
    State(state): State<AuthState>,
    request: Request,
    next: Next,
) -> Response {
    guard(state, request, next, LogInRedirect::Htmx).await
}
