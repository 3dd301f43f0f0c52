//! Defines the endpoint for creating a new transaction.

use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of crashing like axum::Form.
use axum_extra::extract::Form;
use maud::html;

use crate::{
    Session,
    alert::Alert,
    transaction::{
        TransactionStore,
        form::NewTransactionForm,
        view::{NewTransactionFormValues, new_transaction_form},
    },
};

/// A route handler for creating a new transaction.
///
/// Responds with a blank form and a success alert. Invalid input is sent back
/// in the form with an error message and nothing is saved. The dashboard picks
/// up the new transaction through its live feed.
pub async fn create_transaction_endpoint(
    State(store): State<TransactionStore>,
    session: Session,
    Form(form): Form<NewTransactionForm>,
) -> Response {
    let transaction = match form.to_new_transaction() {
        Ok(transaction) => transaction,
        Err(error) => {
            tracing::debug!("rejected new transaction: {error}");
            return new_transaction_form(&form.values(), Some(&error)).into_response();
        }
    };

    let kind = transaction.kind;

    match store.create(&session, transaction) {
        Ok(id) => {
            tracing::info!("created {kind} transaction {id}");

            html! {
                (new_transaction_form(&NewTransactionFormValues::default(), None))
                (Alert::success("Transaction added", "").into_oob_markup())
            }
            .into_response()
        }
        Err(error) => {
            tracing::error!("could not create transaction: {error}");
            error.into_alert_response()
        }
    }
}
