use std::{
    str::FromStr,
    sync::{Arc, Mutex},
};

use email_address::EmailAddress;
use rusqlite::Connection;

use crate::{
    AppState, PasswordHash, Session, UserId,
    auth::create_user,
    db::initialize,
    transaction::{Category, NewTransaction, TransactionStore, TransactionType},
};

/// Register a user with a dummy password hash and return their ID.
#[track_caller]
pub(crate) fn insert_test_user(email: &str, connection: &Connection) -> UserId {
    create_user(
        EmailAddress::from_str(email).expect("invalid test email"),
        PasswordHash::new_unchecked("hunter2"),
        connection,
    )
    .expect("could not create test user")
    .id
}

fn test_connection() -> Connection {
    let connection =
        Connection::open_in_memory().expect("could not create in-memory SQLite database");
    initialize(&connection).expect("could not initialize test DB");
    connection
}

/// A store on an in-memory database with the users alice and bob.
pub(crate) fn test_store_with_users() -> (TransactionStore, Session, Session) {
    let connection = test_connection();
    let alice = insert_test_user("alice@example.com", &connection);
    let bob = insert_test_user("bob@example.com", &connection);

    (
        TransactionStore::new(Arc::new(Mutex::new(connection))),
        Session::for_user(alice),
        Session::for_user(bob),
    )
}

/// App state on an in-memory database with the user alice, without bank import.
pub(crate) fn test_app_state() -> (AppState, Session) {
    let state = AppState::new(
        Connection::open_in_memory().expect("could not create in-memory SQLite database"),
        "foobar",
        None,
    )
    .expect("could not create test app state");
    let alice = insert_test_user(
        "alice@example.com",
        &state.db_connection.lock().expect("could not lock test DB"),
    );

    (state, Session::for_user(alice))
}

/// An expense of `magnitude` dollars in `category`.
pub(crate) fn expense(magnitude: f64, category: &str) -> NewTransaction {
    NewTransaction::new(
        -magnitude,
        TransactionType::Expense,
        Category::expense(category).expect("invalid test category"),
        None,
    )
    .expect("invalid test expense")
}

/// Income of `amount` dollars.
pub(crate) fn income(amount: f64) -> NewTransaction {
    NewTransaction::new(amount, TransactionType::Income, Category::income(), None)
        .expect("invalid test income")
}
