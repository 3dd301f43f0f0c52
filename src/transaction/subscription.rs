//! A live feed of a user's transactions.

use futures::Stream;
use time::OffsetDateTime;
use tokio::sync::broadcast::{
    self,
    error::{RecvError, TryRecvError},
};

use crate::{
    Error, Session,
    auth::UserId,
    transaction::{Transaction, TransactionStore},
};

/// Yields the full set of a user's transactions, first as they are now and
/// then again every time one of them is created, updated or deleted.
///
/// Each item is a complete list, not a diff, in store order. Several changes
/// that happen before the next pull are folded into a single snapshot.
///
/// Dropping the subscription, or calling [Subscription::close], releases it.
/// The user's notification channel is torn down with their last subscription.
/// The feed ends when the session it was opened with expires or when
/// [TransactionStore::close_user] is called, e.g. on log out.
/// Call [TransactionStore::subscribe] again to start over.
#[derive(Debug)]
pub struct Subscription {
    store: TransactionStore,
    user_id: UserId,
    epoch: u64,
    receiver: broadcast::Receiver<()>,
    expires_at: Option<OffsetDateTime>,
    sent_initial_snapshot: bool,
}

impl Subscription {
    pub(crate) fn new(
        store: TransactionStore,
        user_id: UserId,
        epoch: u64,
        receiver: broadcast::Receiver<()>,
        expires_at: Option<OffsetDateTime>,
    ) -> Self {
        Self {
            store,
            user_id,
            epoch,
            receiver,
            expires_at,
            sent_initial_snapshot: false,
        }
    }

    /// Wait for the next snapshot.
    ///
    /// Returns the current set immediately on the first call. Later calls wait
    /// for a change. Returns `None` once the session has expired or the store
    /// has shut the feed down.
    pub async fn next(&mut self) -> Option<Result<Vec<Transaction>, Error>> {
        let remaining = match self.expires_at.map(time_left) {
            Some(Ok(remaining)) => Some(remaining),
            Some(Err(_)) => {
                tracing::debug!("session of user {} expired, ending feed", self.user_id);
                return None;
            }
            None => None,
        };

        if !self.sent_initial_snapshot {
            self.sent_initial_snapshot = true;
            return Some(self.read_snapshot());
        }

        let notification = match remaining {
            Some(remaining) => match tokio::time::timeout(remaining, self.receiver.recv()).await {
                Ok(notification) => notification,
                Err(_) => {
                    tracing::debug!("session of user {} expired, ending feed", self.user_id);
                    return None;
                }
            },
            None => self.receiver.recv().await,
        };

        match notification {
            Ok(()) => {}
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!(
                    "subscription for user {} skipped {skipped} notifications",
                    self.user_id
                );
            }
            Err(RecvError::Closed) => return None,
        }

        // The snapshot read below covers every change queued so far.
        loop {
            match self.receiver.try_recv() {
                Ok(()) | Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Closed) => return None,
            }
        }

        Some(self.read_snapshot())
    }

    fn read_snapshot(&self) -> Result<Vec<Transaction>, Error> {
        self.store.snapshot(&Session::for_user(self.user_id))
    }

    /// Release the subscription.
    pub fn close(self) {}

    /// Turn the subscription into a [Stream] of snapshots.
    ///
    /// The subscription is released when the stream is dropped.
    pub fn into_stream(self) -> impl Stream<Item = Result<Vec<Transaction>, Error>> + Send {
        futures::stream::unfold(self, |mut subscription| async move {
            subscription
                .next()
                .await
                .map(|snapshot| (snapshot, subscription))
        })
    }
}

/// Time until `expires_at`, or an error once it has passed.
fn time_left(
    expires_at: OffsetDateTime,
) -> Result<std::time::Duration, time::error::ConversionRange> {
    std::time::Duration::try_from(expires_at - OffsetDateTime::now_utc())
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.store.release(self.user_id, self.epoch);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures::StreamExt;
    use time::OffsetDateTime;
    use tokio::time::timeout;

    use crate::{
        test_utils::{expense, income, test_store_with_users},
        transaction::{TransactionType, TransactionUpdate},
    };

    const WAIT: Duration = Duration::from_secs(1);

    #[tokio::test]
    async fn first_pull_is_current_set() {
        let (store, alice, _) = test_store_with_users();
        store.create(&alice, income(1000.0)).unwrap();

        let mut subscription = store.subscribe(&alice).unwrap();
        let snapshot = subscription.next().await.unwrap().unwrap();

        assert_eq!(snapshot.len(), 1);
    }

    #[tokio::test]
    async fn emits_full_set_after_each_write() {
        let (store, alice, _) = test_store_with_users();
        let mut subscription = store.subscribe(&alice).unwrap();
        assert!(subscription.next().await.unwrap().unwrap().is_empty());

        let id = store.create(&alice, expense(50.0, "Food")).unwrap();
        let snapshot = timeout(WAIT, subscription.next()).await.unwrap().unwrap().unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].kind, TransactionType::Expense);
        assert!(snapshot[0].amount < 0.0);

        store
            .update(&alice, id, TransactionUpdate {
                amount: Some(-30.0),
                ..Default::default()
            })
            .unwrap();
        let snapshot = timeout(WAIT, subscription.next()).await.unwrap().unwrap().unwrap();
        assert_eq!(snapshot[0].amount, -30.0);

        store.delete(&alice, id).unwrap();
        let snapshot = timeout(WAIT, subscription.next()).await.unwrap().unwrap().unwrap();
        assert!(snapshot.is_empty());
    }

    #[tokio::test]
    async fn queued_changes_fold_into_one_snapshot() {
        let (store, alice, _) = test_store_with_users();
        let mut subscription = store.subscribe(&alice).unwrap();
        subscription.next().await.unwrap().unwrap();

        store.create(&alice, income(1.0)).unwrap();
        store.create(&alice, income(2.0)).unwrap();
        store.create(&alice, income(3.0)).unwrap();

        let snapshot = timeout(WAIT, subscription.next()).await.unwrap().unwrap().unwrap();
        assert_eq!(snapshot.len(), 3);
        assert!(
            timeout(Duration::from_millis(50), subscription.next())
                .await
                .is_err(),
            "no further snapshot expected"
        );
    }

    #[tokio::test]
    async fn other_users_writes_do_not_wake_subscription() {
        let (store, alice, bob) = test_store_with_users();
        let mut subscription = store.subscribe(&alice).unwrap();
        subscription.next().await.unwrap().unwrap();

        store.create(&bob, income(1.0)).unwrap();

        assert!(
            timeout(Duration::from_millis(50), subscription.next())
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn last_subscription_tears_down_channel() {
        let (store, alice, _) = test_store_with_users();
        let user_id = alice.user_id().unwrap();

        let first = store.subscribe(&alice).unwrap();
        let second = store.subscribe(&alice).unwrap();
        assert!(store.has_channel(user_id));

        first.close();
        assert!(store.has_channel(user_id));

        drop(second);
        assert!(!store.has_channel(user_id));
    }

    #[tokio::test]
    async fn resubscribing_after_close_works() {
        let (store, alice, _) = test_store_with_users();
        store.subscribe(&alice).unwrap().close();

        let mut subscription = store.subscribe(&alice).unwrap();
        subscription.next().await.unwrap().unwrap();
        store.create(&alice, income(5.0)).unwrap();

        let snapshot = timeout(WAIT, subscription.next()).await.unwrap().unwrap().unwrap();
        assert_eq!(snapshot.len(), 1);
    }

    #[tokio::test]
    async fn stream_yields_snapshots_and_releases_on_drop() {
        let (store, alice, _) = test_store_with_users();
        let user_id = alice.user_id().unwrap();
        let stream = store.subscribe(&alice).unwrap().into_stream();
        let mut stream = Box::pin(stream);

        assert!(stream.next().await.unwrap().unwrap().is_empty());
        store.create(&alice, income(5.0)).unwrap();
        assert_eq!(
            timeout(WAIT, stream.next()).await.unwrap().unwrap().unwrap().len(),
            1
        );

        drop(stream);
        assert!(!store.has_channel(user_id));
    }

    #[tokio::test]
    async fn closing_the_user_ends_their_feeds() {
        let (store, alice, bob) = test_store_with_users();
        let mut subscription = store.subscribe(&alice).unwrap();
        let mut other_user = store.subscribe(&bob).unwrap();
        subscription.next().await.unwrap().unwrap();
        other_user.next().await.unwrap().unwrap();

        store.close_user(alice.user_id().unwrap());
        store.create(&alice, income(5.0)).unwrap();
        store.create(&bob, income(5.0)).unwrap();

        assert!(timeout(WAIT, subscription.next()).await.unwrap().is_none());
        assert!(timeout(WAIT, other_user.next()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn closing_ends_feed_with_pending_changes() {
        let (store, alice, _) = test_store_with_users();
        let mut subscription = store.subscribe(&alice).unwrap();
        subscription.next().await.unwrap().unwrap();

        store.create(&alice, income(5.0)).unwrap();
        store.close_user(alice.user_id().unwrap());

        assert!(timeout(WAIT, subscription.next()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn old_feed_does_not_tear_down_new_channel() {
        let (store, alice, _) = test_store_with_users();
        let user_id = alice.user_id().unwrap();
        let old = store.subscribe(&alice).unwrap();

        store.close_user(user_id);
        let mut new = store.subscribe(&alice).unwrap();
        new.next().await.unwrap().unwrap();
        drop(old);

        assert!(store.has_channel(user_id));
        store.create(&alice, income(5.0)).unwrap();
        let snapshot = timeout(WAIT, new.next()).await.unwrap().unwrap().unwrap();
        assert_eq!(snapshot.len(), 1);
    }

    #[tokio::test]
    async fn feed_ends_when_session_expires() {
        let (store, alice, _) = test_store_with_users();
        let session = alice.until(OffsetDateTime::now_utc() + time::Duration::milliseconds(100));
        let mut subscription = store.subscribe(&session).unwrap();
        subscription.next().await.unwrap().unwrap();

        assert!(timeout(WAIT, subscription.next()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn expired_session_gets_no_snapshot() {
        let (store, alice, _) = test_store_with_users();
        let session = alice.until(OffsetDateTime::now_utc() - time::Duration::seconds(1));
        let mut subscription = store.subscribe(&session).unwrap();

        assert!(subscription.next().await.is_none());
    }
}
