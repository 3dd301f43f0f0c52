//! Turning the aggregator's transaction records into local transactions.

use serde::Deserialize;
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    Error,
    transaction::{Category, NewTransaction, TransactionType, ValidationError},
};

const BANK_DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// A transaction record as the bank aggregator sends it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExternalTransaction {
    /// The amount in the aggregator's sign convention.
    pub amount: f64,
    /// The merchant or payee name.
    pub name: String,
    /// The category hierarchy, most general first.
    #[serde(default)]
    pub category: Option<Vec<String>>,
    /// The posting date as `YYYY-MM-DD`.
    pub date: String,
}

/// A bank record mapped onto the local transaction fields, ready to be saved.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedTransaction {
    /// The bank's amount, sign untouched.
    pub amount: f64,
    /// The merchant or payee name.
    pub description: String,
    /// The bank's primary category mapped to one of ours.
    pub category: Category,
    /// The bank's posting date.
    pub date: Date,
    /// Income for money in, expense for money out.
    pub kind: TransactionType,
}

impl ImportedTransaction {
    /// The transaction to hand to the store.
    ///
    /// The store dates transactions when they are saved, so the bank's posting
    /// date is not kept.
    ///
    /// # Errors
    /// Returns a [ValidationError] if the amount is not a finite number.
    pub fn to_new_transaction(&self) -> Result<NewTransaction, ValidationError> {
        NewTransaction::new(
            self.amount,
            self.kind,
            self.category.clone(),
            Some(&self.description),
        )
    }
}

/// Map a bank record onto the local fields.
///
/// The amount is kept as-is and its sign decides the type. The category is
/// the most general one from the bank, or "Other" if the bank has none.
///
/// # Errors
/// Returns [Error::InvalidBankData] if the date is not a `YYYY-MM-DD` date.
pub fn map_external_transaction(external: &ExternalTransaction) -> Result<ImportedTransaction, Error> {
    let category = external
        .category
        .as_deref()
        .and_then(|categories| categories.first())
        .and_then(|label| Category::new(label).ok())
        .unwrap_or_else(Category::other);

    let date = Date::parse(&external.date, BANK_DATE_FORMAT).map_err(|error| {
        Error::InvalidBankData(format!("invalid date {:?}: {error}", external.date))
    })?;

    Ok(ImportedTransaction {
        amount: external.amount,
        description: external.name.clone(),
        category,
        date,
        kind: TransactionType::from_amount(external.amount),
    })
}
