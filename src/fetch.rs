//! Guards for in-flight requests: cooperative cancellation and a
//! latest-generation slot that rejects stale results.

use std::future::Future;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Notify;
use tokio::time::Instant;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("request cancelled")]
pub struct Cancelled;

/// Clonable cancellation token passed into every network call. A call whose
/// token fires mid-flight resolves to [`Cancelled`] instead of applying its
/// result.
#[derive(Debug, Clone)]
pub struct CancelToken {
    shared: Arc<TokenShared>,
    deadline: Option<Instant>,
}

#[derive(Debug)]
struct TokenShared {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancelToken {
    /// A token that only fires when [`cancel`](Self::cancel) is called.
    #[must_use]
    pub fn never() -> Self {
        Self {
            shared: Arc::new(TokenShared {
                cancelled: AtomicBool::new(false),
                notify: Notify::new(),
            }),
            deadline: None,
        }
    }

    /// A token that fires automatically once `timeout` has elapsed.
    #[must_use]
    pub fn after(timeout: Duration) -> Self {
        let mut token = Self::never();
        token.deadline = Some(Instant::now() + timeout);
        token
    }

    pub fn cancel(&self) {
        self.shared.cancelled.store(true, Ordering::SeqCst);
        self.shared.notify.notify_waiters();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        if self.shared.cancelled.load(Ordering::SeqCst) {
            return true;
        }
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Resolves once the token fires. Never resolves for an uncancelled
    /// deadline-free token.
    pub async fn cancelled(&self) {
        loop {
            if self.is_cancelled() {
                return;
            }

            let notified = self.shared.notify.notified();
            if self.is_cancelled() {
                return;
            }

            match self.deadline {
                Some(deadline) => {
                    tokio::select! {
                        () = notified => {}
                        () = tokio::time::sleep_until(deadline) => return,
                    }
                }
                None => notified.await,
            }
        }
    }
}

/// Race `fut` against the token. The token is re-checked after `fut`
/// completes, so a result that arrives after cancellation is dropped rather
/// than applied.
pub async fn abortable<T>(token: &CancelToken, fut: impl Future<Output = T>) -> Result<T, Cancelled> {
    if token.is_cancelled() {
        return Err(Cancelled);
    }

    tokio::select! {
        () = token.cancelled() => Err(Cancelled),
        res = fut => {
            if token.is_cancelled() {
                Err(Cancelled)
            } else {
                Ok(res)
            }
        }
    }
}

/// Ticket issued by [`Latest::begin`]; a commit is accepted only while its
/// ticket is still the newest one issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

/// A slot guarded by a monotonically increasing generation counter. Fetches
/// call [`begin`](Self::begin) before going to the network and
/// [`commit`](Self::commit) when the response lands; a response that was
/// superseded in the meantime is rejected so it can never overwrite newer
/// state.
#[derive(Debug)]
pub struct Latest<T> {
    slot: Mutex<Slot<T>>,
}

#[derive(Debug)]
struct Slot<T> {
    generation: u64,
    value: Option<T>,
}

impl<T> Default for Latest<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Latest<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot {
                generation: 0,
                value: None,
            }),
        }
    }

    /// Start a new fetch generation. Any ticket issued earlier becomes stale.
    pub fn begin(&self) -> Ticket {
        let mut slot = self.slot.lock().expect("latest slot poisoned");
        slot.generation += 1;
        Ticket(slot.generation)
    }

    /// Store `value` if `ticket` is still current. Returns whether the value
    /// was applied.
    pub fn commit(&self, ticket: Ticket, value: T) -> bool {
        let mut slot = self.slot.lock().expect("latest slot poisoned");
        if slot.generation != ticket.0 {
            return false;
        }
        slot.value = Some(value);
        true
    }

    /// Drop the stored value and invalidate all outstanding tickets.
    pub fn invalidate(&self) {
        let mut slot = self.slot.lock().expect("latest slot poisoned");
        slot.generation += 1;
        slot.value = None;
    }
}

impl<T: Clone> Latest<T> {
    #[must_use]
    pub fn get(&self) -> Option<T> {
        self.slot.lock().expect("latest slot poisoned").value.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_commit_is_rejected() {
        let latest = Latest::new();

        let first = latest.begin();
        let second = latest.begin();

        // The response for the newer request lands first.
        assert!(latest.commit(second, "page-2"));
        // The slow, superseded response must not overwrite it.
        assert!(!latest.commit(first, "page-1"));

        assert_eq!(latest.get(), Some("page-2"));
    }

    #[test]
    fn test_invalidate_clears_value_and_outstanding_tickets() {
        let latest = Latest::new();
        let ticket = latest.begin();
        assert!(latest.commit(ticket, 42));

        let in_flight = latest.begin();
        latest.invalidate();

        assert_eq!(latest.get(), None);
        assert!(!latest.commit(in_flight, 7));
        assert_eq!(latest.get(), None);
    }

    #[tokio::test]
    async fn test_abortable_returns_cancelled_for_fired_token() {
        let token = CancelToken::never();
        token.cancel();

        let result = abortable(&token, async { 5 }).await;
        assert_eq!(result, Err(Cancelled));
    }

    #[tokio::test]
    async fn test_abortable_passes_through_when_not_cancelled() {
        let token = CancelToken::never();
        let result = abortable(&token, async { 5 }).await;
        assert_eq!(result, Ok(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_token_fires() {
        let token = CancelToken::after(Duration::from_secs(1));
        assert!(!token.is_cancelled());

        let pending = abortable(&token, std::future::pending::<()>());
        let result = pending.await;
        assert_eq!(result, Err(Cancelled));
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancel_unblocks_waiters() {
        let token = CancelToken::never();
        let waiter = {
            let token = token.clone();
            tokio::spawn(async move { abortable(&token, std::future::pending::<()>()).await })
        };

        tokio::task::yield_now().await;
        token.cancel();

        assert_eq!(waiter.await.unwrap(), Err(Cancelled));
    }
}
