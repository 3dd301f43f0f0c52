//! The transaction store: owner-filtered reads, access-checked writes and
//! change notifications for live subscriptions.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use rusqlite::Connection;
use time::OffsetDateTime;
use tokio::sync::broadcast;

use crate::{
    Error, Session,
    auth::UserId,
    transaction::{
        NewTransaction, Subscription, Transaction, TransactionId, TransactionUpdate,
        core::{
            delete_transaction, insert_transaction, select_transaction,
            select_transactions_for_user, update_transaction,
        },
    },
};

/// Pending change notifications per user before a slow subscriber starts lagging.
const CHANNEL_CAPACITY: usize = 16;

/// Reads and writes a user's transactions.
///
/// Every operation takes the [Session] of the caller. A user can only see and
/// change their own transactions, the owner of a new transaction is always the
/// session's user.
///
/// Successful writes wake up the [Subscription]s of the user who owns the
/// transactions.
#[derive(Debug, Clone)]
pub struct TransactionStore {
    connection: Arc<Mutex<Connection>>,
    channels: Arc<Mutex<Channels>>,
}

/// The change notification channel of each user with live subscriptions.
#[derive(Debug, Default)]
struct Channels {
    by_user: HashMap<UserId, UserChannel>,
    /// Tells a channel apart from an earlier one of the same user that was closed.
    next_epoch: u64,
}

#[derive(Debug)]
struct UserChannel {
    sender: broadcast::Sender<()>,
    epoch: u64,
}

impl TransactionStore {
    /// Create a store on a connection whose tables have been set up with
    /// [crate::initialize_db].
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self {
            connection,
            channels: Arc::new(Mutex::new(Channels::default())),
        }
    }

    fn lock_connection(&self) -> Result<MutexGuard<'_, Connection>, Error> {
        self.connection.lock().map_err(|error| {
            tracing::error!("could not acquire database lock: {error}");
            Error::DatabaseLockError
        })
    }

    /// The current set of the user's transactions, in store order.
    ///
    /// # Errors
    /// Returns [Error::Unauthenticated] for an anonymous session.
    pub fn snapshot(&self, session: &Session) -> Result<Vec<Transaction>, Error> {
        let user_id = session.require_user()?;
        let connection = self.lock_connection()?;

        select_transactions_for_user(user_id, &connection)
    }

    /// A single transaction owned by the session's user.
    ///
    /// # Errors
    /// Returns [Error::Unauthenticated] for an anonymous session,
    /// [Error::NotFound] if `id` does not exist, or [Error::PermissionDenied]
    /// if another user owns it.
    pub fn get(&self, session: &Session, id: TransactionId) -> Result<Transaction, Error> {
        let user_id = session.require_user()?;
        let connection = self.lock_connection()?;

        select_owned(user_id, id, &connection)
    }

    /// Record a transaction for the session's user, dated now.
    ///
    /// # Errors
    /// Returns [Error::Unauthenticated] for an anonymous session or
    /// [Error::Validation] if the amount's sign contradicts the type.
    pub fn create(
        &self,
        session: &Session,
        transaction: NewTransaction,
    ) -> Result<TransactionId, Error> {
        let user_id = session.require_user()?;
        transaction.validate()?;

        let id = {
            let connection = self.lock_connection()?;
            insert_transaction(user_id, &transaction, OffsetDateTime::now_utc(), &connection)?
        };

        self.notify(user_id);

        Ok(id)
    }

    /// Record several transactions at once. Either all of them are saved or none.
    ///
    /// Subscribers are notified once for the whole batch.
    ///
    /// # Errors
    /// Returns [Error::Unauthenticated] for an anonymous session or
    /// [Error::Validation] if any transaction is invalid, in which case
    /// nothing is written.
    pub fn create_batch(
        &self,
        session: &Session,
        transactions: Vec<NewTransaction>,
    ) -> Result<Vec<TransactionId>, Error> {
        let user_id = session.require_user()?;

        for transaction in &transactions {
            transaction.validate()?;
        }

        if transactions.is_empty() {
            return Ok(Vec::new());
        }

        let ids = {
            let connection = self.lock_connection()?;
            let sql_transaction = connection.unchecked_transaction()?;
            let now = OffsetDateTime::now_utc();

            let ids = transactions
                .iter()
                .map(|transaction| insert_transaction(user_id, transaction, now, &sql_transaction))
                .collect::<Result<Vec<_>, Error>>()?;

            sql_transaction.commit()?;
            ids
        };

        self.notify(user_id);

        Ok(ids)
    }

    /// Change the amount, category or description of a transaction.
    ///
    /// # Errors
    /// Returns [Error::Unauthenticated] for an anonymous session,
    /// [Error::NotFound] if `id` does not exist, [Error::PermissionDenied] if
    /// another user owns it, or [Error::Validation] if the new amount's sign
    /// contradicts the transaction's type.
    pub fn update(
        &self,
        session: &Session,
        id: TransactionId,
        update: TransactionUpdate,
    ) -> Result<(), Error> {
        let user_id = session.require_user()?;

        {
            let connection = self.lock_connection()?;
            let existing = select_owned(user_id, id, &connection)?;
            let updated = update.apply_to(&existing)?;
            update_transaction(&updated, &connection)?;
        }

        self.notify(user_id);

        Ok(())
    }

    /// Remove a transaction.
    ///
    /// # Errors
    /// Returns [Error::Unauthenticated] for an anonymous session,
    /// [Error::NotFound] if `id` does not exist, or [Error::PermissionDenied]
    /// if another user owns it.
    pub fn delete(&self, session: &Session, id: TransactionId) -> Result<(), Error> {
        let user_id = session.require_user()?;

        {
            let connection = self.lock_connection()?;
            select_owned(user_id, id, &connection)?;
            delete_transaction(id, &connection)?;
        }

        self.notify(user_id);

        Ok(())
    }

    /// Follow the user's transactions.
    ///
    /// The subscription yields the current set first and then a fresh set
    /// after every change. See [Subscription].
    ///
    /// # Errors
    /// Returns [Error::Unauthenticated] for an anonymous session.
    pub fn subscribe(&self, session: &Session) -> Result<Subscription, Error> {
        let user_id = session.require_user()?;

        let (receiver, epoch) = {
            let mut channels = self.lock_channels()?;
            let Channels {
                by_user,
                next_epoch,
            } = &mut *channels;

            let channel = by_user.entry(user_id).or_insert_with(|| {
                *next_epoch += 1;
                UserChannel {
                    sender: broadcast::channel(CHANNEL_CAPACITY).0,
                    epoch: *next_epoch,
                }
            });

            (channel.sender.subscribe(), channel.epoch)
        };

        tracing::debug!("opened transaction subscription for user {user_id}");

        Ok(Subscription::new(
            self.clone(),
            user_id,
            epoch,
            receiver,
            session.expires_at(),
        ))
    }

    /// End every live subscription of `user_id`, e.g. when they log out.
    ///
    /// Open subscriptions return `None` from their next pull. Later calls to
    /// [TransactionStore::subscribe] start a new channel.
    pub fn close_user(&self, user_id: UserId) {
        let Ok(mut channels) = self.lock_channels() else {
            return;
        };

        if channels.by_user.remove(&user_id).is_some() {
            tracing::info!("closed transaction subscriptions of user {user_id}");
        }
    }

    fn lock_channels(&self) -> Result<MutexGuard<'_, Channels>, Error> {
        self.channels.lock().map_err(|error| {
            tracing::error!("could not acquire subscription lock: {error}");
            Error::DatabaseLockError
        })
    }

    fn notify(&self, user_id: UserId) {
        let Ok(channels) = self.lock_channels() else {
            return;
        };

        if let Some(channel) = channels.by_user.get(&user_id) {
            // An error only means nobody is listening.
            let _ = channel.sender.send(());
        }
    }

    /// Called when a subscription of `user_id` on the channel `epoch` goes
    /// away. Tears down the user's channel once its last subscription is gone.
    pub(crate) fn release(&self, user_id: UserId, epoch: u64) {
        let Ok(mut channels) = self.lock_channels() else {
            return;
        };

        // The subscription being released still holds its receiver.
        let is_last = channels
            .by_user
            .get(&user_id)
            .is_some_and(|channel| channel.epoch == epoch && channel.sender.receiver_count() <= 1);

        if is_last {
            channels.by_user.remove(&user_id);
            tracing::debug!("closed last transaction subscription for user {user_id}");
        }
    }

    #[cfg(test)]
    pub(crate) fn has_channel(&self, user_id: UserId) -> bool {
        self.channels
            .lock()
            .map(|channels| channels.by_user.contains_key(&user_id))
            .unwrap_or(false)
    }
}

/// Fetch `id` and check that `user_id` owns it.
fn select_owned(
    user_id: UserId,
    id: TransactionId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = select_transaction(id, connection)?;

    if transaction.user_id != user_id {
        tracing::warn!("user {user_id} tried to access transaction {id} owned by another user");
        return Err(Error::PermissionDenied);
    }

    Ok(transaction)
}
