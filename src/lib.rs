//! Budget Tracker is a web app for recording income and expenses and keeping an
//! eye on where the money goes.
//!
//! The library provides the transaction store with its realtime snapshot feed,
//! the aggregation of a snapshot into a summary, the row editing state machine,
//! the bank import bridge, and a REST API that serves HTML pages and JSON.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod alert;
mod app_state;
mod auth;
mod bank_import;
mod dashboard;
mod db;
mod endpoints;
mod html;
mod internal_server_error;
mod logging;
mod navigation;
mod not_found;
mod routing;
mod session;
mod transaction;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use auth::{PasswordHash, User, UserId, ValidatedPassword};
pub use bank_import::{
    AccessToken, BankAggregator, BankClient, BankConfig, DEFAULT_BANK_BASE_URL,
    ExternalTransaction, ImportedTransaction, import_transactions, map_external_transaction,
};
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;
pub use session::Session;
pub use transaction::{
    Category, Draft, EditState, NewTransaction, Subscription, Summary, Transaction,
    TransactionEditor, TransactionId, TransactionStore, TransactionType, TransactionUpdate,
    ValidationError, share_of_income, summarize,
};

use crate::{
    alert::Alert,
    internal_server_error::InternalServerError,
    not_found::get_404_not_found_response,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// An operation that needs a logged in user was called without one.
    #[error("no user is logged in")]
    Unauthenticated,

    /// The access policy rejected the operation, e.g., the transaction
    /// belongs to another user.
    #[error("permission denied")]
    PermissionDenied,

    /// User input failed local validation and was never sent to the store.
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// The editor was asked to commit while no row was being edited.
    #[error("no transaction is being edited")]
    NotEditing,

    /// The user provided an invalid combination of email and password.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The email address could not be parsed.
    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    /// The email address is already registered.
    #[error("the email address is already in use")]
    DuplicateEmail,

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The auth cookie is missing from the cookie jar in the request.
    #[error("no cookies in the cookie jar :(")]
    CookieMissing,

    /// The expiry of the auth cookie could not be formatted or parsed.
    #[error("could not format expiry cookie date-time string: {0}")]
    InvalidDateFormat(String),

    /// The bank aggregator could not be reached.
    #[error("could not reach the bank aggregator: {0}")]
    NetworkFailure(String),

    /// The bank aggregator answered with a non-success status.
    #[error("bank aggregator error ({status}): {message}")]
    BankApi {
        /// HTTP status code returned by the aggregator.
        status: u16,
        /// Error message or response body.
        message: String,
    },

    /// The bank aggregator answered with data that could not be read.
    #[error("could not read bank aggregator response: {0}")]
    InvalidBankData(String),

    /// Bank import was requested but no aggregator credentials are configured.
    #[error("bank import is not configured")]
    BankNotConfigured,

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An error occurred while serializing a struct as JSON
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

/// The notice shown to the user when any step of a bank import fails.
pub const BANK_IMPORT_FAILED_MESSAGE: &str = "Failed to link bank account. Please try again.";

impl Error {
    /// A human-readable message that is safe to show to the user.
    pub fn user_message(&self) -> String {
        match self {
            Error::Unauthenticated => "You must be logged in to do that.".to_owned(),
            Error::PermissionDenied => {
                "You do not have permission to perform this action".to_owned()
            }
            Error::Validation(error) => error.to_string(),
            Error::NotEditing => "Select a transaction to edit first.".to_owned(),
            Error::NotFound => "The transaction could not be found. \
                Try refreshing the page to see if it has already been deleted."
                .to_owned(),
            Error::InvalidCredentials => "Incorrect email or password.".to_owned(),
            Error::InvalidEmail(_) => "Enter a valid email address.".to_owned(),
            Error::DuplicateEmail => "That email address is already registered.".to_owned(),
            Error::TooWeak(feedback) => format!("Password is too weak: {feedback}"),
            Error::NetworkFailure(_)
            | Error::BankApi { .. }
            | Error::InvalidBankData(_)
            | Error::BankNotConfigured => BANK_IMPORT_FAILED_MESSAGE.to_owned(),
            _ => "An error occurred. Please try again.".to_owned(),
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthenticated | Error::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Error::PermissionDenied => StatusCode::FORBIDDEN,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::Validation(_)
            | Error::NotEditing
            | Error::InvalidEmail(_)
            | Error::DuplicateEmail
            | Error::TooWeak(_) => StatusCode::BAD_REQUEST,
            Error::NetworkFailure(_) | Error::BankApi { .. } | Error::InvalidBankData(_) => {
                StatusCode::BAD_GATEWAY
            }
            Error::BankNotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Render the error as an alert fragment for HTMX requests.
    fn into_alert_response(self) -> Response {
        let status_code = self.status_code();

        if status_code.is_server_error() {
            tracing::error!("An unexpected error occurred: {self}");
        }

        let title = match self {
            Error::Validation(_) => "Invalid transaction",
            Error::PermissionDenied => "Permission denied",
            Error::NotFound => "Transaction not found",
            Error::Unauthenticated => "Not logged in",
            _ if status_code.is_server_error() => "Something went wrong",
            _ => "Could not complete the request",
        };

        (status_code, Alert::error(title, &self.user_message()).into_html()).into_response()
    }

    /// Render the error as a JSON body of the form `{"error": "..."}`.
    fn into_json_response(self) -> Response {
        let status_code = self.status_code();

        if status_code.is_server_error() {
            tracing::error!("An unexpected error occurred: {self}");
        }

        (status_code, Json(json!({ "error": self.user_message() }))).into_response()
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => get_404_not_found_response(),
            Error::DatabaseLockError => InternalServerError::default().into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}
