//! Log-out route handler that invalidates authentication cookies and redirects users.

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::PrivateCookieJar;

use crate::{
    auth::{cookie::get_token_from_cookies, invalidate_auth_cookie},
    endpoints,
    transaction::TransactionStore,
};

/// Invalidate the auth cookie, end the user's live feeds and redirect the
/// client to the log-in page.
pub async fn get_log_out(State(store): State<TransactionStore>, jar: PrivateCookieJar) -> Response {
    if let Ok(token) = get_token_from_cookies(&jar) {
        store.close_user(token.user_id);
        tracing::info!("user {} logged out", token.user_id);
    }

    let jar = invalidate_auth_cookie(jar);

    (jar, Redirect::to(endpoints::LOG_IN_VIEW)).into_response()
}
