//! Predicate-condition queue.
//!
//! Producers push items; consumers claim the first queued item matching their
//! predicate, blocking until one arrives, the deadline passes, or the wait is
//! cancelled. A claimed item is removed and never seen by another consumer.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::ClientError;

struct QueueState<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// Unbounded multi-consumer queue with predicate claims.
pub struct EventQueue<T> {
    state: Mutex<QueueState<T>>,
    notify: Notify,
}

impl<T> Default for EventQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> EventQueue<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::new(),
                closed: false,
            }),
            notify: Notify::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enqueue an item and wake all waiters. Returns `false` once closed.
    pub fn push(&self, item: T) -> bool {
        {
            let mut state = self.lock();
            if state.closed {
                return false;
            }
            state.items.push_back(item);
        }
        self.notify.notify_waiters();
        true
    }

    /// Close the queue, discard unclaimed items and wake all waiters.
    ///
    /// Returns `true` for the call that actually closed it.
    pub fn close(&self) -> bool {
        let first = {
            let mut state = self.lock();
            let first = !state.closed;
            state.closed = true;
            state.items.clear();
            first
        };
        self.notify.notify_waiters();
        first
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove and return the first queued item matching `predicate`.
    ///
    /// `Err(())` means the queue is closed.
    fn try_take<P>(&self, predicate: &P) -> Result<Option<T>, ()>
    where
        P: Fn(&T) -> bool,
    {
        let mut state = self.lock();
        if state.closed {
            return Err(());
        }
        let pos = state.items.iter().position(predicate);
        Ok(pos.and_then(|i| state.items.remove(i)))
    }

    /// Claim the first item matching `predicate`.
    ///
    /// Items queued before the call are considered first. `timeout = None`
    /// waits until cancelled or closed. A closed queue or a cancelled
    /// `cancel` token yields `Cancelled`; an elapsed timeout yields `Timeout`.
    pub async fn take_matching<P>(
        &self,
        what: &'static str,
        predicate: P,
        timeout: Option<Duration>,
        cancel: &CancellationToken,
    ) -> Result<T, ClientError>
    where
        P: Fn(&T) -> bool,
    {
        let deadline = timeout.map(|t| Instant::now() + t);
        loop {
            // Register for wakeups before looking, so a push between the
            // look and the await is not lost.
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            match self.try_take(&predicate) {
                Err(()) => return Err(ClientError::Cancelled),
                Ok(Some(item)) => return Ok(item),
                Ok(None) => {}
            }

            tokio::select! {
                () = &mut notified => {}
                () = cancel.cancelled() => return Err(ClientError::Cancelled),
                () = sleep_until(deadline) => {
                    return Err(ClientError::Timeout {
                        what,
                        after: timeout.unwrap_or_default(),
                    });
                }
            }
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(d) => tokio::time::sleep_until(d).await,
        None => std::future::pending().await,
    }
}
