//! The form data for adding a transaction.

use serde::Deserialize;

use crate::transaction::{
    Category, NewTransaction, TransactionType, ValidationError, core::parse_positive_amount,
    view::NewTransactionFormValues,
};

/// What the user entered in the add transaction form.
///
/// The amount is always entered as a positive number, the sign comes from the
/// transaction type.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewTransactionForm {
    /// The amount as typed.
    pub amount: String,
    /// Income or expense.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// Ignored for income.
    #[serde(default)]
    pub category: Option<String>,
    /// Optional free text.
    #[serde(default)]
    pub description: Option<String>,
}

impl NewTransactionForm {
    /// Validate the form and turn it into a transaction for the store.
    ///
    /// Expenses must use one of the fixed expense categories. Income always
    /// gets the income category, whatever was selected.
    ///
    /// # Errors
    /// Returns a [ValidationError] if the amount is not a number greater than
    /// zero or an expense has no valid category.
    pub fn to_new_transaction(&self) -> Result<NewTransaction, ValidationError> {
        let magnitude = parse_positive_amount(&self.amount)?;

        let category = match self.kind {
            TransactionType::Income => Category::income(),
            TransactionType::Expense => match self.category.as_deref().map(str::trim) {
                None | Some("") => return Err(ValidationError::MissingCategory),
                Some(label) => Category::expense(label)?,
            },
        };

        NewTransaction::new(
            self.kind.signed(magnitude),
            self.kind,
            category,
            self.description.as_deref(),
        )
    }

    /// The form values to show again after a failed submission.
    pub fn values(&self) -> NewTransactionFormValues<'_> {
        let defaults = NewTransactionFormValues::default();

        NewTransactionFormValues {
            amount: &self.amount,
            kind: self.kind,
            category: self.category.as_deref().unwrap_or(defaults.category),
            description: self.description.as_deref().unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::transaction::{Category, TransactionType, ValidationError};

    use super::NewTransactionForm;

    fn form(amount: &str, kind: TransactionType, category: Option<&str>) -> NewTransactionForm {
        NewTransactionForm {
            amount: amount.to_owned(),
            kind,
            category: category.map(ToOwned::to_owned),
            description: None,
        }
    }

    #[test]
    fn expense_amount_is_negated() {
        let transaction = form("50", TransactionType::Expense, Some("Food"))
            .to_new_transaction()
            .unwrap();

        assert_eq!(transaction.amount, -50.0);
        assert_eq!(transaction.category.as_str(), "Food");
    }

    #[test]
    fn income_ignores_selected_category() {
        let transaction = form("1000", TransactionType::Income, Some("Food"))
            .to_new_transaction()
            .unwrap();

        assert_eq!(transaction.amount, 1000.0);
        assert_eq!(transaction.category, Category::income());
    }

    #[test]
    fn rejects_non_positive_and_non_numeric_amounts() {
        for amount in ["0", "-5", "abc", ""] {
            assert_eq!(
                form(amount, TransactionType::Expense, Some("Food")).to_new_transaction(),
                Err(ValidationError::InvalidAmount),
                "amount {amount:?} should be rejected"
            );
        }
    }

    #[test]
    fn expense_needs_known_category() {
        assert_eq!(
            form("5", TransactionType::Expense, None).to_new_transaction(),
            Err(ValidationError::MissingCategory)
        );
        assert_eq!(
            form("5", TransactionType::Expense, Some("Dining")).to_new_transaction(),
            Err(ValidationError::UnknownCategory("Dining".to_owned()))
        );
    }

    #[test]
    fn blank_description_is_dropped() {
        let mut form = form("5", TransactionType::Expense, Some("Food"));
        form.description = Some("   ".to_owned());

        assert_eq!(form.to_new_transaction().unwrap().description, None);
    }
}
