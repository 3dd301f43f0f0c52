//! Defines the endpoint for deleting a transaction.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;

use crate::{
    Session,
    transaction::{TransactionEditor, TransactionId, TransactionStore},
};

/// The answer to the "are you sure?" prompt.
#[derive(Debug, Default, Deserialize)]
pub struct DeleteQuery {
    #[serde(default)]
    confirmed: bool,
}

/// A route handler for deleting a transaction.
///
/// Nothing is deleted unless the request says the user confirmed it. Responds
/// with an empty body on deletion, which removes the card, or with 204 No
/// Content when the deletion was not confirmed, which leaves the page as is.
pub async fn delete_transaction_endpoint(
    State(store): State<TransactionStore>,
    session: Session,
    Path(id): Path<TransactionId>,
    Query(query): Query<DeleteQuery>,
) -> Response {
    let editor = TransactionEditor::new();

    match editor.delete_row(&store, &session, id, || query.confirmed) {
        Ok(true) => {
            tracing::info!("deleted transaction {id}");
            // The status code has to be 200 OK or HTMX will not remove the card.
            Html("").into_response()
        }
        Ok(false) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => {
            tracing::error!("could not delete transaction {id}: {error}");
            error.into_alert_response()
        }
    }
}
