//! JSON endpoints for reading a user's transactions and their summary.

use std::convert::Infallible;

use axum::{
    Json,
    extract::State,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
};
use futures::{Stream, StreamExt};

use crate::{
    Error, Session,
    transaction::{Transaction, TransactionStore, summarize},
};

/// The user's transactions as a JSON array.
pub async fn get_transactions(
    State(store): State<TransactionStore>,
    session: Session,
) -> Response {
    match store.snapshot(&session) {
        Ok(transactions) => Json(transactions).into_response(),
        Err(error) => error.into_json_response(),
    }
}

/// The income, expenses, balance and expense percentage of the user's transactions.
pub async fn get_summary(State(store): State<TransactionStore>, session: Session) -> Response {
    match store.snapshot(&session) {
        Ok(transactions) => Json(summarize(&transactions)).into_response(),
        Err(error) => error.into_json_response(),
    }
}

/// A server-sent event stream with a `snapshot` event holding the user's
/// transactions as JSON, sent on connect and after every change.
///
/// Failed reads are sent as an `error` event with a message for the user.
/// The subscription is released when the client disconnects.
pub async fn stream_transactions(
    State(store): State<TransactionStore>,
    session: Session,
) -> Response {
    match store.subscribe(&session) {
        Ok(subscription) => Sse::new(snapshot_events(subscription.into_stream()))
            .keep_alive(KeepAlive::default())
            .into_response(),
        Err(error) => error.into_json_response(),
    }
}

fn snapshot_events(
    snapshots: impl Stream<Item = Result<Vec<Transaction>, Error>> + Send + 'static,
) -> impl Stream<Item = Result<Event, Infallible>> + Send + 'static {
    snapshots.map(|snapshot| {
        let event = match snapshot {
            Ok(transactions) => match Event::default().event("snapshot").json_data(&transactions) {
                Ok(event) => event,
                Err(error) => {
                    tracing::error!("could not serialize transactions: {error}");
                    error_event(&Error::JSONSerializationError(error.to_string()))
                }
            },
            Err(error) => {
                tracing::error!("could not read transactions for live feed: {error}");
                error_event(&error)
            }
        };

        Ok(event)
    })
}

fn error_event(error: &Error) -> Event {
    Event::default().event("error").data(error.user_message())
}
