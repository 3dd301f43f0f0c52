//! JSON endpoints used by the browser's bank linking widget.

use axum::{
    Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    AppState, Error, Session,
    bank_import::{BankAggregator, BankClient, create_link_token, import_transactions},
    transaction::TransactionStore,
};

/// The state needed to link a bank and save its transactions.
#[derive(Debug, Clone)]
pub struct BankImportState {
    /// `None` when the server was started without aggregator credentials.
    pub bank_client: Option<BankClient>,
    /// Where imported transactions are saved.
    pub store: TransactionStore,
}

impl FromRef<AppState> for BankImportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            bank_client: state.bank_client.clone(),
            store: state.transaction_store.clone(),
        }
    }
}

/// The body the widget posts after the user linked an account.
#[derive(Debug, Deserialize)]
pub struct BankImportRequest {
    /// The widget's one-time public token.
    pub public_token: String,
}

/// Respond with `{"link_token": "..."}` for starting the bank linking widget.
pub async fn post_link_token(State(state): State<BankImportState>, session: Session) -> Response {
    let Some(client) = state.bank_client else {
        return Error::BankNotConfigured.into_json_response();
    };

    link_token_response(&client, &session).await
}

/// Import the linked account's recent transactions and respond with
/// `{"imported": n}`.
///
/// Either every fetched transaction is saved or none is.
pub async fn post_bank_import(
    State(state): State<BankImportState>,
    session: Session,
    Json(request): Json<BankImportRequest>,
) -> Response {
    let Some(client) = state.bank_client else {
        return Error::BankNotConfigured.into_json_response();
    };

    import_response(&client, &state.store, &session, &request.public_token).await
}

async fn link_token_response<A>(aggregator: &A, session: &Session) -> Response
where
    A: BankAggregator + Sync,
{
    match create_link_token(aggregator, session).await {
        Ok(link_token) => Json(json!({ "link_token": link_token })).into_response(),
        Err(error) => error.into_json_response(),
    }
}

async fn import_response<A>(
    aggregator: &A,
    store: &TransactionStore,
    session: &Session,
    public_token: &str,
) -> Response
where
    A: BankAggregator + Sync,
{
    match import_and_save(aggregator, store, session, public_token).await {
        Ok(count) => Json(json!({ "imported": count })).into_response(),
        Err(error) => error.into_json_response(),
    }
}

async fn import_and_save<A>(
    aggregator: &A,
    store: &TransactionStore,
    session: &Session,
    public_token: &str,
) -> Result<usize, Error>
where
    A: BankAggregator + Sync,
{
    let imported = import_transactions(aggregator, session, public_token).await?;

    let transactions = imported
        .iter()
        .map(|transaction| transaction.to_new_transaction())
        .collect::<Result<Vec<_>, _>>()?;

    let ids = store.create_batch(session, transactions)?;

    Ok(ids.len())
}
