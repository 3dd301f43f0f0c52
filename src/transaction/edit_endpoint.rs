//! Endpoints for switching a transaction card between view and edit mode and
//! for saving an edit.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;

use crate::{
    Error, Session,
    transaction::{
        Draft, EditState, TransactionEditor, TransactionId, TransactionStore, ValidationError,
        summarize,
        view::{edit_transaction_card, transaction_card},
    },
};

/// Render the card of transaction `id` in view mode.
///
/// Also used to cancel an edit: the draft lives only in the browser's form,
/// so going back to the stored values discards it.
pub async fn get_transaction_view(
    State(store): State<TransactionStore>,
    session: Session,
    Path(id): Path<TransactionId>,
) -> Response {
    render_view_card(&store, &session, id).unwrap_or_else(Error::into_alert_response)
}

fn render_view_card(
    store: &TransactionStore,
    session: &Session,
    id: TransactionId,
) -> Result<Response, Error> {
    let transaction = store.get(session, id)?;
    let total_income = summarize(&store.snapshot(session)?).income;

    Ok(transaction_card(&transaction, total_income).into_response())
}

/// Render the card of transaction `id` in edit mode, seeded with its stored values.
pub async fn get_edit_transaction_view(
    State(store): State<TransactionStore>,
    session: Session,
    Path(id): Path<TransactionId>,
) -> Response {
    let transaction = match store.get(&session, id) {
        Ok(transaction) => transaction,
        Err(error) => return error.into_alert_response(),
    };

    let mut editor = TransactionEditor::new();
    editor.start_edit(&transaction);

    render_editor(&editor, None)
}

fn render_editor(editor: &TransactionEditor, error: Option<&ValidationError>) -> Response {
    match editor.state() {
        EditState::Editing { id, kind, draft, .. } => {
            edit_transaction_card(*id, *kind, draft, error).into_response()
        }
        EditState::Viewing => Error::NotEditing.into_alert_response(),
    }
}

/// Save the edited values of transaction `id`.
///
/// Responds with the card in view mode on success. An invalid draft is sent
/// back in edit mode with the error and the store is left untouched.
pub async fn update_transaction_endpoint(
    State(store): State<TransactionStore>,
    session: Session,
    Path(id): Path<TransactionId>,
    Form(form): Form<Draft>,
) -> Response {
    let transaction = match store.get(&session, id) {
        Ok(transaction) => transaction,
        Err(error) => return error.into_alert_response(),
    };

    let mut editor = TransactionEditor::new();
    editor.start_edit(&transaction);
    if let Some(draft) = editor.draft_mut() {
        *draft = form;
    }

    match editor.commit(&store, &session) {
        Ok(id) => {
            tracing::info!("updated transaction {id}");
            render_view_card(&store, &session, id).unwrap_or_else(Error::into_alert_response)
        }
        Err(Error::Validation(error)) => render_editor(&editor, Some(&error)),
        Err(error) => {
            tracing::error!("could not update transaction {id}: {error}");
            error.into_alert_response()
        }
    }
}
