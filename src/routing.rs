//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router, middleware,
    response::Redirect,
    routing::{get, post, put},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    auth::{
        auth_guard, auth_guard_hx, get_log_in_page, get_log_out, get_register_page, post_log_in,
        register_user,
    },
    bank_import::{post_bank_import, post_link_token},
    dashboard::{get_dashboard_page, stream_dashboard},
    endpoints,
    internal_server_error::get_internal_server_error_page,
    not_found::get_404_not_found,
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, get_edit_transaction_view,
        get_summary, get_transaction_view, get_transactions, stream_transactions,
        update_transaction_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::LOG_IN_VIEW, get(get_log_in_page))
        .route(endpoints::LOG_IN_API, post(post_log_in))
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(endpoints::REGISTER_VIEW, get(get_register_page))
        .route(endpoints::USERS, post(register_user))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let protected_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::DASHBOARD_VIEW, get(get_dashboard_page))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    // Routes requested by HTMX or scripts use the HX-REDIRECT header for auth redirects.
    let protected_routes = protected_routes.merge(
        Router::new()
            .route(endpoints::DASHBOARD_LIVE, get(stream_dashboard))
            .route(endpoints::TRANSACTION_VIEW, get(get_transaction_view))
            .route(
                endpoints::EDIT_TRANSACTION_VIEW,
                get(get_edit_transaction_view),
            )
            .route(
                endpoints::TRANSACTIONS_API,
                get(get_transactions).post(create_transaction_endpoint),
            )
            .route(endpoints::TRANSACTIONS_STREAM, get(stream_transactions))
            .route(
                endpoints::TRANSACTION,
                put(update_transaction_endpoint).delete(delete_transaction_endpoint),
            )
            .route(endpoints::SUMMARY_API, get(get_summary))
            .route(endpoints::BANK_LINK_TOKEN, post(post_link_token))
            .route(endpoints::BANK_IMPORT, post(post_bank_import))
            .layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx)),
    );

    protected_routes
        .merge(unprotected_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the dashboard page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::DASHBOARD_VIEW)
}
