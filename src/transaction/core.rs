//! Defines the core data models and database queries for transactions.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, auth::UserId};

// ============================================================================
// MODELS
// ============================================================================

/// The store-assigned identifier of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(i64);

impl TransactionId {
    /// Wrap a raw database ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// The raw database ID.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Whether money was earned or spent.
///
/// The type of a transaction is fixed when it is created and decides the sign
/// of its amount: expenses are negative, income is zero or positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money earned.
    Income,
    /// Money spent.
    Expense,
}

impl TransactionType {
    /// The lowercase name used in forms, JSON and the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }

    /// The type implied by the sign of `amount`.
    pub fn from_amount(amount: f64) -> Self {
        if amount < 0.0 {
            TransactionType::Expense
        } else {
            TransactionType::Income
        }
    }

    /// Whether the sign of `amount` agrees with this type.
    pub fn matches(&self, amount: f64) -> bool {
        match self {
            TransactionType::Income => amount >= 0.0,
            TransactionType::Expense => amount < 0.0,
        }
    }

    /// Give `magnitude` the sign of this type.
    pub fn signed(&self, magnitude: f64) -> f64 {
        match self {
            TransactionType::Income => magnitude.abs(),
            TransactionType::Expense => -magnitude.abs(),
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            other => Err(format!("unknown transaction type {other:?}")),
        }
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: String| FromSqlError::Other(error.into()))
    }
}

/// The categories a user can pick from when recording an expense.
pub const EXPENSE_CATEGORIES: [&str; 6] = [
    "Food",
    "Transport",
    "Utilities",
    "Entertainment",
    "Shopping",
    "Other",
];

/// The fallback category for imported transactions without one.
pub const DEFAULT_CATEGORY: &str = "Other";

/// A non-empty category label, e.g. "Food".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    /// The category every income transaction is filed under.
    pub const INCOME: &str = "Income";

    /// A category with any non-empty label. Surrounding whitespace is removed.
    ///
    /// # Errors
    /// Returns [ValidationError::MissingCategory] if `label` is blank.
    pub fn new(label: &str) -> Result<Self, ValidationError> {
        let label = label.trim();

        if label.is_empty() {
            return Err(ValidationError::MissingCategory);
        }

        Ok(Self(label.to_owned()))
    }

    /// A category from the fixed list of [EXPENSE_CATEGORIES].
    ///
    /// # Errors
    /// Returns [ValidationError::MissingCategory] if `label` is blank or
    /// [ValidationError::UnknownCategory] if it is not in the list.
    pub fn expense(label: &str) -> Result<Self, ValidationError> {
        let category = Self::new(label)?;

        if !EXPENSE_CATEGORIES.contains(&category.as_str()) {
            return Err(ValidationError::UnknownCategory(category.0));
        }

        Ok(category)
    }

    /// The "Income" category.
    pub fn income() -> Self {
        Self(Self::INCOME.to_owned())
    }

    /// The catch-all [DEFAULT_CATEGORY].
    pub fn other() -> Self {
        Self(DEFAULT_CATEGORY.to_owned())
    }

    /// The label of the category.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Problems with user input that are caught before anything is sent to the store.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// The amount was not a number or was not greater than zero.
    #[error("Enter an amount greater than zero.")]
    InvalidAmount,

    /// No category was given.
    #[error("Choose a category.")]
    MissingCategory,

    /// The category is not one of [EXPENSE_CATEGORIES].
    #[error("{0:?} is not a valid category.")]
    UnknownCategory(String),

    /// The sign of the amount contradicts the transaction type.
    #[error("Expenses must be negative and income must not be.")]
    SignMismatch,
}

impl ValidationError {
    /// The name of the form field the error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::InvalidAmount | ValidationError::SignMismatch => "amount",
            ValidationError::MissingCategory | ValidationError::UnknownCategory(_) => "category",
        }
    }
}

/// Parse user input for an amount, which must be a finite number greater than zero.
///
/// # Errors
/// Returns [ValidationError::InvalidAmount] otherwise.
pub fn parse_positive_amount(raw: &str) -> Result<f64, ValidationError> {
    match raw.trim().parse::<f64>() {
        Ok(amount) if amount.is_finite() && amount > 0.0 => Ok(amount),
        _ => Err(ValidationError::InvalidAmount),
    }
}

/// Trim a description and treat an empty one as absent.
pub fn normalize_description(description: Option<&str>) -> Option<String> {
    description
        .map(str::trim)
        .filter(|description| !description.is_empty())
        .map(ToOwned::to_owned)
}

/// An expense or income, i.e. an event where money was either spent or earned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The amount of money earned (positive) or spent (negative).
    pub amount: f64,
    /// Whether money was earned or spent.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// What the money was for, e.g. "Food".
    pub category: Category,
    /// Optional free text.
    pub description: Option<String>,
    /// When the transaction was recorded.
    #[serde(with = "rfc3339")]
    pub date: OffsetDateTime,
    /// The user who owns the transaction.
    pub user_id: UserId,
}

/// The fields of a transaction the caller decides when creating one.
///
/// The store adds the ID, the owner and the date.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// Negative for expenses.
    pub amount: f64,
    /// Whether the transaction is income or an expense.
    pub kind: TransactionType,
    /// The category label.
    pub category: Category,
    /// Trimmed, `None` when blank.
    pub description: Option<String>,
}

impl NewTransaction {
    /// Check the sign of `amount` against `kind` and normalize the description.
    ///
    /// # Errors
    /// Returns [ValidationError::InvalidAmount] for a non-finite amount and
    /// [ValidationError::SignMismatch] if the sign contradicts `kind`.
    pub fn new(
        amount: f64,
        kind: TransactionType,
        category: Category,
        description: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let transaction = Self {
            amount,
            kind,
            category,
            description: normalize_description(description),
        };
        transaction.validate()?;

        Ok(transaction)
    }

    pub(crate) fn validate(&self) -> Result<(), ValidationError> {
        if !self.amount.is_finite() {
            return Err(ValidationError::InvalidAmount);
        }

        if !self.kind.matches(self.amount) {
            return Err(ValidationError::SignMismatch);
        }

        Ok(())
    }
}

/// The changes to apply to an existing transaction.
///
/// Only the amount, category and description of a transaction can change.
/// `None` leaves a field as it is. A description of `Some("")` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionUpdate {
    /// The new unsigned amount. The stored sign follows the transaction type.
    pub amount: Option<f64>,
    /// The new category.
    pub category: Option<Category>,
    /// The new description.
    pub description: Option<String>,
}

impl TransactionUpdate {
    /// Apply the changes to a copy of `transaction`.
    ///
    /// # Errors
    /// Returns [ValidationError::SignMismatch] if the new amount contradicts
    /// the transaction's type.
    pub(crate) fn apply_to(&self, transaction: &Transaction) -> Result<Transaction, ValidationError> {
        let mut updated = transaction.clone();

        if let Some(amount) = self.amount {
            if !amount.is_finite() {
                return Err(ValidationError::InvalidAmount);
            }

            if !updated.kind.matches(amount) {
                return Err(ValidationError::SignMismatch);
            }

            updated.amount = amount;
        }

        if let Some(category) = &self.category {
            updated.category = category.clone();
        }

        if let Some(description) = &self.description {
            updated.description = normalize_description(Some(description));
        }

        Ok(updated)
    }
}

mod rfc3339 {
    //! Serializes a [time::OffsetDateTime] as an RFC 3339 string.
    use serde::{Deserialize, Deserializer, Serializer};
    use time::{OffsetDateTime, format_description::well_known::Rfc3339};

    pub fn serialize<S>(date: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let formatted = date.format(&Rfc3339).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&formatted)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        OffsetDateTime::parse(&raw, &Rfc3339).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                amount REAL NOT NULL,
                type TEXT NOT NULL CHECK (type IN ('income', 'expense')),
                category TEXT NOT NULL,
                description TEXT,
                date TEXT NOT NULL,
                user_id INTEGER NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    // Every read is filtered by owner.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user ON \"transaction\"(user_id);",
        (),
    )?;

    Ok(())
}

/// Insert a transaction for `user_id` dated `date`.
///
/// # Errors
/// Returns [Error::SqlError] if the insert fails.
pub(crate) fn insert_transaction(
    user_id: UserId,
    transaction: &NewTransaction,
    date: OffsetDateTime,
    connection: &Connection,
) -> Result<TransactionId, Error> {
    let id = connection
        .prepare(
            "INSERT INTO \"transaction\" (amount, type, category, description, date, user_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING id",
        )?
        .query_row(
            (
                transaction.amount,
                transaction.kind,
                transaction.category.as_str(),
                transaction.description.as_deref(),
                date,
                user_id.as_i64(),
            ),
            |row| row.get(0),
        )?;

    Ok(TransactionId::new(id))
}

/// Retrieve a transaction by its `id`, regardless of who owns it.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction,
/// - or [Error::SqlError] there is some other SQL error.
pub(crate) fn select_transaction(
    id: TransactionId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "SELECT id, amount, type, category, description, date, user_id
             FROM \"transaction\" WHERE id = :id",
        )?
        .query_row(&[(":id", &id.as_i64())], map_transaction_row)?;

    Ok(transaction)
}

/// Retrieve every transaction owned by `user_id`, in store order.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub(crate) fn select_transactions_for_user(
    user_id: UserId,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(
            "SELECT id, amount, type, category, description, date, user_id
             FROM \"transaction\" WHERE user_id = :user_id",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

/// Overwrite the editable fields of the transaction `transaction.id`.
///
/// # Errors
/// Returns [Error::SqlError] if the update fails.
pub(crate) fn update_transaction(
    transaction: &Transaction,
    connection: &Connection,
) -> Result<(), Error> {
    connection.execute(
        "UPDATE \"transaction\" SET amount = ?1, category = ?2, description = ?3 WHERE id = ?4",
        (
            transaction.amount,
            transaction.category.as_str(),
            transaction.description.as_deref(),
            transaction.id.as_i64(),
        ),
    )?;

    Ok(())
}

type RowsAffected = usize;

pub(crate) fn delete_transaction(
    id: TransactionId,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    connection
        .execute(
            "DELETE FROM \"transaction\" WHERE id = :id",
            &[(":id", &id.as_i64())],
        )
        .map_err(|error| error.into())
}

/// Map a database row to a Transaction.
fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let amount = row.get(1)?;
    let kind = row.get(2)?;
    let category: String = row.get(3)?;
    let description = row.get(4)?;
    let date = row.get(5)?;
    let user_id = row.get(6)?;

    Ok(Transaction {
        id: TransactionId::new(id),
        amount,
        kind,
        category: Category(category),
        description,
        date,
        user_id: UserId::new(user_id),
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod model_tests {
    use time::macros::datetime;

    use crate::{UserId, transaction::core::TransactionId};

    use super::{
        Category, NewTransaction, Transaction, TransactionType, TransactionUpdate, ValidationError,
        normalize_description, parse_positive_amount,
    };

    fn food_expense() -> Transaction {
        Transaction {
            id: TransactionId::new(1),
            amount: -50.0,
            kind: TransactionType::Expense,
            category: Category::expense("Food").unwrap(),
            description: Some("Groceries".to_owned()),
            date: datetime!(2025-01-02 03:04:05 UTC),
            user_id: UserId::new(1),
        }
    }

    #[test]
    fn expense_categories_are_a_closed_set() {
        assert!(Category::expense("Transport").is_ok());
        assert_eq!(
            Category::expense("Rent"),
            Err(ValidationError::UnknownCategory("Rent".to_owned()))
        );
        assert_eq!(Category::expense("  "), Err(ValidationError::MissingCategory));
    }

    #[test]
    fn any_non_empty_label_is_a_category() {
        assert_eq!(Category::new(" Dining ").unwrap().as_str(), "Dining");
        assert_eq!(Category::new(""), Err(ValidationError::MissingCategory));
    }

    #[test]
    fn amount_must_be_positive_number() {
        assert_eq!(parse_positive_amount(" 12.50 "), Ok(12.5));
        assert_eq!(parse_positive_amount("0"), Err(ValidationError::InvalidAmount));
        assert_eq!(parse_positive_amount("-3"), Err(ValidationError::InvalidAmount));
        assert_eq!(parse_positive_amount("abc"), Err(ValidationError::InvalidAmount));
        assert_eq!(parse_positive_amount("NaN"), Err(ValidationError::InvalidAmount));
    }

    #[test]
    fn sign_follows_type() {
        assert_eq!(TransactionType::Expense.signed(50.0), -50.0);
        assert_eq!(TransactionType::Income.signed(-50.0), 50.0);
        assert!(TransactionType::Income.matches(0.0));
        assert!(!TransactionType::Expense.matches(0.0));
        assert_eq!(TransactionType::from_amount(-0.01), TransactionType::Expense);
    }

    #[test]
    fn new_transaction_rejects_sign_mismatch() {
        let result = NewTransaction::new(
            50.0,
            TransactionType::Expense,
            Category::expense("Food").unwrap(),
            None,
        );

        assert_eq!(result, Err(ValidationError::SignMismatch));
    }

    #[test]
    fn blank_description_is_absent() {
        assert_eq!(normalize_description(Some("   ")), None);
        assert_eq!(normalize_description(Some(" lunch ")), Some("lunch".to_owned()));
        assert_eq!(normalize_description(None), None);
    }

    #[test]
    fn update_changes_only_given_fields() {
        let transaction = food_expense();
        let update = TransactionUpdate {
            amount: Some(-30.0),
            category: None,
            description: Some(String::new()),
        };

        let updated = update.apply_to(&transaction).unwrap();

        assert_eq!(updated.amount, -30.0);
        assert_eq!(updated.category, transaction.category);
        assert_eq!(updated.description, None);
        assert_eq!(updated.date, transaction.date);
        assert_eq!(updated.kind, transaction.kind);
    }

    #[test]
    fn update_rejects_amount_that_contradicts_type() {
        let update = TransactionUpdate {
            amount: Some(30.0),
            ..Default::default()
        };

        assert_eq!(
            update.apply_to(&food_expense()),
            Err(ValidationError::SignMismatch)
        );
    }

    #[test]
    fn serializes_with_type_key_and_rfc3339_date() {
        let json = serde_json::to_value(food_expense()).unwrap();

        assert_eq!(json["type"], "expense");
        assert_eq!(json["category"], "Food");
        assert_eq!(json["date"], "2025-01-02T03:04:05Z");
        assert_eq!(json["userId"], 1);
        assert_eq!(json["id"], 1);
    }
}

#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;
    use time::macros::datetime;

    use crate::{Error, UserId, db::initialize, test_utils::insert_test_user};

    use super::{
        Category, NewTransaction, TransactionType, delete_transaction, insert_transaction,
        select_transaction, select_transactions_for_user,
    };

    fn get_test_connection() -> (Connection, UserId) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user_id = insert_test_user("alice@example.com", &conn);
        (conn, user_id)
    }

    fn salary() -> NewTransaction {
        NewTransaction::new(1000.0, TransactionType::Income, Category::income(), Some("Pay"))
            .unwrap()
    }

    #[test]
    fn insert_then_select_round_trips_fields() {
        let (conn, user_id) = get_test_connection();
        let date = datetime!(2025-03-04 05:06:07 UTC);

        let id = insert_transaction(user_id, &salary(), date, &conn).unwrap();
        let transaction = select_transaction(id, &conn).unwrap();

        assert_eq!(transaction.amount, 1000.0);
        assert_eq!(transaction.kind, TransactionType::Income);
        assert_eq!(transaction.category, Category::income());
        assert_eq!(transaction.description.as_deref(), Some("Pay"));
        assert_eq!(transaction.date, date);
        assert_eq!(transaction.user_id, user_id);
    }

    #[test]
    fn select_for_user_filters_by_owner() {
        let (conn, alice) = get_test_connection();
        let bob = insert_test_user("bob@example.com", &conn);
        let date = datetime!(2025-03-04 05:06:07 UTC);
        insert_transaction(alice, &salary(), date, &conn).unwrap();
        insert_transaction(bob, &salary(), date, &conn).unwrap();

        let transactions = select_transactions_for_user(alice, &conn).unwrap();

        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].user_id, alice);
    }

    #[test]
    fn insert_fails_for_unknown_user() {
        let (conn, _) = get_test_connection();

        let result = insert_transaction(
            UserId::new(999),
            &salary(),
            datetime!(2025-03-04 05:06:07 UTC),
            &conn,
        );

        assert!(matches!(result, Err(Error::SqlError(_))));
    }

    #[test]
    fn deleted_transaction_is_not_found() {
        let (conn, user_id) = get_test_connection();
        let id = insert_transaction(
            user_id,
            &salary(),
            datetime!(2025-03-04 05:06:07 UTC),
            &conn,
        )
        .unwrap();

        assert_eq!(delete_transaction(id, &conn).unwrap(), 1);
        assert_eq!(select_transaction(id, &conn), Err(Error::NotFound));
    }
}
