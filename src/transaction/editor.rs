//! Editing a single transaction row: the row is either being viewed or being
//! edited with a local draft that is only sent to the store on commit.

use serde::Deserialize;

use crate::{
    Error, Session,
    transaction::{
        Category, Transaction, TransactionId, TransactionStore, TransactionType,
        TransactionUpdate, ValidationError, core::parse_positive_amount,
    },
};

/// The unsaved values of the row being edited, as the user typed them.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Draft {
    /// The magnitude of the amount. The sign comes from the row's type.
    pub amount: String,
    /// The category label.
    pub category: String,
    /// Empty when the transaction has no description.
    #[serde(default)]
    pub description: String,
}

impl Draft {
    /// Seed a draft from the stored values of `transaction`.
    pub fn from_transaction(transaction: &Transaction) -> Self {
        Self {
            amount: transaction.amount.abs().to_string(),
            category: transaction.category.to_string(),
            description: transaction.description.clone().unwrap_or_default(),
        }
    }

    /// Turn the draft into an update for a row of type `kind` that is
    /// currently filed under `stored`.
    ///
    /// Income always stays under "Income", whatever the draft says. An expense
    /// may keep its stored label, e.g. an imported "Dining", or move to one of
    /// the fixed expense categories.
    ///
    /// # Errors
    /// Returns a [ValidationError] if the amount is not a number greater than
    /// zero, or an expense category is blank or not in the fixed list.
    pub fn to_update(
        &self,
        kind: TransactionType,
        stored: &Category,
    ) -> Result<TransactionUpdate, ValidationError> {
        let amount = parse_positive_amount(&self.amount)?;

        let category = match kind {
            TransactionType::Income => Category::income(),
            TransactionType::Expense if self.category.trim() == stored.as_str() => stored.clone(),
            TransactionType::Expense => Category::expense(&self.category)?,
        };

        Ok(TransactionUpdate {
            amount: Some(kind.signed(amount)),
            category: Some(category),
            description: Some(self.description.trim().to_owned()),
        })
    }
}

/// Whether a row is being viewed or edited.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum EditState {
    /// No row is being edited.
    #[default]
    Viewing,
    /// The row `id` is being edited.
    Editing {
        /// The row being edited.
        id: TransactionId,
        /// The row's type, which fixes the sign of the saved amount.
        kind: TransactionType,
        /// The category the row is saved under.
        category: Category,
        /// The values typed so far.
        draft: Draft,
    },
}

/// Drives the view/edit cycle of transaction rows. One row is edited at a time.
#[derive(Debug, Clone, Default)]
pub struct TransactionEditor {
    state: EditState,
}

impl TransactionEditor {
    /// An editor that is not editing anything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a row is being edited, and which.
    pub fn state(&self) -> &EditState {
        &self.state
    }

    /// Whether the row `id` is in edit mode.
    pub fn is_editing(&self, id: TransactionId) -> bool {
        matches!(self.state, EditState::Editing { id: editing, .. } if editing == id)
    }

    /// Switch `transaction` into edit mode with a draft of its current values.
    ///
    /// Any other row that was being edited loses its draft.
    pub fn start_edit(&mut self, transaction: &Transaction) {
        self.state = EditState::Editing {
            id: transaction.id,
            kind: transaction.kind,
            category: transaction.category.clone(),
            draft: Draft::from_transaction(transaction),
        };
    }

    /// The draft of the row being edited.
    pub fn draft(&self) -> Option<&Draft> {
        match &self.state {
            EditState::Editing { draft, .. } => Some(draft),
            EditState::Viewing => None,
        }
    }

    /// The draft of the row being edited, for applying the user's changes.
    pub fn draft_mut(&mut self) -> Option<&mut Draft> {
        match &mut self.state {
            EditState::Editing { draft, .. } => Some(draft),
            EditState::Viewing => None,
        }
    }

    /// Discard the draft and go back to viewing.
    pub fn cancel(&mut self) {
        self.state = EditState::Viewing;
    }

    /// Validate the draft and save it.
    ///
    /// The signed amount is derived from the row's type. On success the
    /// editor goes back to viewing. On failure it stays in edit mode with the
    /// draft untouched so the user can fix it.
    ///
    /// # Errors
    /// Returns [Error::NotEditing] if no row is being edited,
    /// [Error::Validation] if the draft is invalid, or any error from
    /// [TransactionStore::update].
    pub fn commit(
        &mut self,
        store: &TransactionStore,
        session: &Session,
    ) -> Result<TransactionId, Error> {
        let EditState::Editing {
            id,
            kind,
            category,
            draft,
        } = &self.state
        else {
            return Err(Error::NotEditing);
        };

        let id = *id;
        let update = draft.to_update(*kind, category)?;
        store.update(session, id, update)?;

        self.state = EditState::Viewing;

        Ok(id)
    }

    /// Delete the row `id` if `confirm` says yes.
    ///
    /// This does not depend on or change the edit state.
    /// Returns whether the row was deleted.
    ///
    /// # Errors
    /// Returns any error from [TransactionStore::delete].
    pub fn delete_row(
        &self,
        store: &TransactionStore,
        session: &Session,
        id: TransactionId,
        confirm: impl FnOnce() -> bool,
    ) -> Result<bool, Error> {
        if !confirm() {
            tracing::debug!("deletion of transaction {id} was not confirmed");
            return Ok(false);
        }

        store.delete(session, id)?;

        Ok(true)
    }
}
