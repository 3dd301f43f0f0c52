//! Transaction management for the budgeting application.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model, its validation and database queries
//! - The `TransactionStore` with owner checks and live `Subscription`s
//! - The summary of income and expenses
//! - The `TransactionEditor` for the view/edit cycle of a row
//! - View handlers and JSON endpoints

mod aggregation;
mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod editor;
mod form;
mod list_endpoint;
mod store;
mod subscription;
mod view;

pub use aggregation::{Summary, share_of_income, summarize};
pub use core::{
    Category, EXPENSE_CATEGORIES, NewTransaction, Transaction, TransactionId,
    TransactionType, TransactionUpdate, ValidationError, create_transaction_table,
};
pub use create_endpoint::create_transaction_endpoint;
pub use delete_endpoint::delete_transaction_endpoint;
pub use edit_endpoint::{
    get_edit_transaction_view, get_transaction_view, update_transaction_endpoint,
};
pub use editor::{Draft, EditState, TransactionEditor};
pub use list_endpoint::{get_summary, get_transactions, stream_transactions};
pub use store::TransactionStore;
pub use subscription::Subscription;
pub use view::{
    NewTransactionFormValues, new_transaction_form, transaction_list,
};
