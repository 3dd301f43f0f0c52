//! The URIs of the pages and API routes.
//!
//! For routes that take a parameter, e.g., '/api/transactions/{transaction_id}', use [format_endpoint].

/// The root route which redirects to the dashboard.
pub const ROOT: &str = "/";
/// The landing page for logged in users with the summary and transaction list.
pub const DASHBOARD_VIEW: &str = "/dashboard";
/// Server-sent events that re-render the dashboard whenever the user's transactions change.
pub const DASHBOARD_LIVE: &str = "/dashboard/live";
/// The route for getting the registration page.
pub const REGISTER_VIEW: &str = "/register";
/// The route for getting the log in page.
pub const LOG_IN_VIEW: &str = "/log_in";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// A single transaction row in view mode.
pub const TRANSACTION_VIEW: &str = "/transactions/{transaction_id}";
/// A single transaction row in edit mode.
pub const EDIT_TRANSACTION_VIEW: &str = "/transactions/{transaction_id}/edit";
/// The route for static files.
pub const STATIC: &str = "/static";

/// The route for logging in a user.
pub const LOG_IN_API: &str = "/api/log_in";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/api/log_out";
/// The route to register users.
pub const USERS: &str = "/api/users";
/// The route to list and create transactions.
pub const TRANSACTIONS_API: &str = "/api/transactions";
/// Server-sent events carrying a JSON snapshot of the user's transactions on every change.
pub const TRANSACTIONS_STREAM: &str = "/api/transactions/stream";
/// The route to update or delete a single transaction.
pub const TRANSACTION: &str = "/api/transactions/{transaction_id}";
/// The route for the aggregated totals of the user's transactions.
pub const SUMMARY_API: &str = "/api/summary";
/// The route for requesting a link token from the bank aggregator.
pub const BANK_LINK_TOKEN: &str = "/api/bank/link_token";
/// The route for exchanging a public token and importing the bank's transactions.
pub const BANK_IMPORT: &str = "/api/bank/import";

/// Replace the first parameter in `endpoint_path` with `id`.
///
/// A parameter starts with a left brace and ends with the next right brace,
/// e.g., '{transaction_id}' in '/api/transactions/{transaction_id}'.
/// A parameter without a closing brace runs to the end of the path.
///
/// If no parameter is found in `endpoint_path`, the original path is returned.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let end = endpoint_path[start..]
        .find('}')
        .map(|offset| start + offset + 1)
        .unwrap_or(endpoint_path.len());

    format!("{}{id}{}", &endpoint_path[..start], &endpoint_path[end..])
}

// These tests are here so that we know that parsing the routes as URIs will not panic.
#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;

    use crate::endpoints;

    use super::format_endpoint;

    #[track_caller]
    fn assert_endpoint_is_valid_uri(uri: &str) {
        assert!(uri.parse::<Uri>().is_ok(), "{uri} is not a valid URI");
    }

    #[test]
    fn endpoints_are_valid_uris() {
        for endpoint in [
            endpoints::ROOT,
            endpoints::DASHBOARD_VIEW,
            endpoints::DASHBOARD_LIVE,
            endpoints::REGISTER_VIEW,
            endpoints::LOG_IN_VIEW,
            endpoints::INTERNAL_ERROR_VIEW,
            endpoints::STATIC,
            endpoints::LOG_IN_API,
            endpoints::LOG_OUT,
            endpoints::USERS,
            endpoints::TRANSACTIONS_API,
            endpoints::TRANSACTIONS_STREAM,
            endpoints::SUMMARY_API,
            endpoints::BANK_LINK_TOKEN,
            endpoints::BANK_IMPORT,
        ] {
            assert_endpoint_is_valid_uri(endpoint);
        }

        for endpoint in [
            endpoints::TRANSACTION_VIEW,
            endpoints::EDIT_TRANSACTION_VIEW,
            endpoints::TRANSACTION,
        ] {
            assert_endpoint_is_valid_uri(&format_endpoint(endpoint, 1));
        }
    }

    #[test]
    fn replaces_parameter_with_id() {
        assert_eq!(format_endpoint("/hello/{world_id}", 1), "/hello/1");
        assert_eq!(format_endpoint("/hello/{world}", 42), "/hello/42");
    }

    #[test]
    fn returns_original_path_with_no_parameter() {
        assert_eq!(format_endpoint("/hello/world", 1), "/hello/world");
    }

    #[test]
    fn parameter_in_middle() {
        assert_eq!(
            format_endpoint(endpoints::EDIT_TRANSACTION_VIEW, 7),
            "/transactions/7/edit"
        );
    }
}
