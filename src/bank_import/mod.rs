//! Linking a bank account through a Plaid-style aggregator and importing its
//! recent transactions.
//!
//! The browser widget hands the server a one-time public token. The server
//! exchanges it for an access token, fetches the last 30 days of transactions
//! and maps each record onto the local transaction fields. The access token is
//! never sent back to the browser and is not stored.

mod client;
mod endpoint;
mod mapping;

use std::{fmt, future::Future};

pub use client::{BankClient, BankConfig, DEFAULT_BANK_BASE_URL};
pub use endpoint::{BankImportState, post_bank_import, post_link_token};
pub use mapping::{ExternalTransaction, ImportedTransaction, map_external_transaction};

use crate::{Error, Session, auth::UserId};

/// A long-lived credential for reading a linked bank account.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wrap an access token returned by the aggregator.
    pub fn new(token: String) -> Self {
        Self(token)
    }

    /// The raw token, for requests to the aggregator only.
    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(********)")
    }
}

/// The calls the import flow makes to a bank aggregator.
pub trait BankAggregator {
    /// Ask for a link token that starts the browser's bank linking widget for `user_id`.
    fn create_link_token(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<String, Error>> + Send;

    /// Trade the widget's one-time public token for an access token.
    fn exchange_public_token(
        &self,
        public_token: &str,
    ) -> impl Future<Output = Result<AccessToken, Error>> + Send;

    /// The linked account's transactions from the last 30 days.
    fn fetch_transactions(
        &self,
        access_token: &AccessToken,
    ) -> impl Future<Output = Result<Vec<ExternalTransaction>, Error>> + Send;
}

/// Request a link token for the session's user.
///
/// # Errors
/// Returns [Error::Unauthenticated] for an anonymous session, or the
/// aggregator's error.
pub async fn create_link_token<A>(aggregator: &A, session: &Session) -> Result<String, Error>
where
    A: BankAggregator + Sync,
{
    let user_id = session.require_user()?;

    aggregator.create_link_token(user_id).await
}

/// Exchange `public_token`, fetch the account's recent transactions and map
/// them onto local fields.
///
/// Nothing is saved here. Any failed step aborts the whole import.
///
/// # Errors
/// Returns [Error::Unauthenticated] for an anonymous session,
/// [Error::NetworkFailure] or [Error::BankApi] if the aggregator call failed,
/// or [Error::InvalidBankData] if a record could not be mapped.
pub async fn import_transactions<A>(
    aggregator: &A,
    session: &Session,
    public_token: &str,
) -> Result<Vec<ImportedTransaction>, Error>
where
    A: BankAggregator + Sync,
{
    let user_id = session.require_user()?;

    let access_token = aggregator.exchange_public_token(public_token).await?;
    let external = aggregator.fetch_transactions(&access_token).await?;

    let imported = external
        .iter()
        .map(map_external_transaction)
        .collect::<Result<Vec<_>, _>>()?;

    tracing::info!(
        "fetched {} transactions from the bank for user {user_id}",
        imported.len()
    );

    Ok(imported)
}
