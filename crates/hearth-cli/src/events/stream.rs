//! The single push-stream subscription and its owner.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use hearth_proto::v1::{EventMessage, RequestToJoin};

use super::predicates;
use super::queue::EventQueue;
use crate::error::ClientError;
use crate::gateway::{EventFrames, EventSource};

/// Default wait for a join request in `space approve`.
pub const JOIN_REQUEST_WAIT: Duration = Duration::from_secs(5 * 60);

/// A claimed event that lacks the payload its predicate promised.
fn malformed_event(kind: &str) -> ClientError {
    ClientError::Remote {
        code: 0,
        description: format!("malformed {kind} event"),
    }
}

/// A live subscription: one receive loop feeding a claim queue.
pub struct EventStream {
    queue: Arc<EventQueue<EventMessage>>,
    cancel: CancellationToken,
    closed: AtomicBool,
    ended: Arc<AtomicBool>,
}

impl std::fmt::Debug for EventStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStream")
            .field("queued", &self.queue.len())
            .field("closed", &self.is_closed())
            .field("ended", &self.has_ended())
            .finish_non_exhaustive()
    }
}

impl EventStream {
    /// Start the receive loop over `frames`. Cancelling `cancel` stops the loop
    /// and fails pending waits with `Cancelled`.
    pub fn start(frames: EventFrames, cancel: CancellationToken) -> Arc<Self> {
        let queue = Arc::new(EventQueue::new());
        let ended = Arc::new(AtomicBool::new(false));

        tokio::spawn(receive_loop(
            frames,
            Arc::clone(&queue),
            cancel.clone(),
            Arc::clone(&ended),
        ));

        Arc::new(Self {
            queue,
            cancel,
            closed: AtomicBool::new(false),
            ended,
        })
    }

    /// Claim the next event matching `predicate`, waiting up to `timeout`.
    pub async fn wait_for<P>(&self, predicate: P, timeout: Duration) -> Result<EventMessage, ClientError>
    where
        P: Fn(&EventMessage) -> bool,
    {
        self.wait_named("matching event", predicate, Some(timeout))
            .await
    }

    /// Claim the next event of any kind.
    pub async fn wait_one(&self, timeout: Duration) -> Result<EventMessage, ClientError> {
        self.wait_named("event", |_| true, Some(timeout)).await
    }

    async fn wait_named<P>(
        &self,
        what: &'static str,
        predicate: P,
        timeout: Option<Duration>,
    ) -> Result<EventMessage, ClientError>
    where
        P: Fn(&EventMessage) -> bool,
    {
        self.queue
            .take_matching(what, predicate, timeout, &self.cancel)
            .await
    }

    /// Wait for the account-show event produced by account recovery.
    pub async fn wait_for_account_id(&self, timeout: Duration) -> Result<String, ClientError> {
        let msg = self
            .wait_named("account id", predicates::account_available, Some(timeout))
            .await?;
        predicates::account_id(&msg)
            .map(str::to_string)
            .ok_or_else(|| malformed_event("account show"))
    }

    /// Wait for a join request for `space_id`.
    pub async fn wait_for_join_request(
        &self,
        space_id: &str,
        timeout: Duration,
    ) -> Result<RequestToJoin, ClientError> {
        let msg = self
            .wait_named(
                "join request",
                predicates::join_request_for(space_id),
                Some(timeout),
            )
            .await?;
        predicates::request_to_join(&msg)
            .cloned()
            .ok_or_else(|| malformed_event("join request"))
    }

    /// Cancel the subscription and discard unclaimed events.
    ///
    /// Safe to call concurrently; returns `true` only for the call that tore down.
    pub fn close(&self) -> bool {
        if self.closed.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.cancel.cancel();
        self.queue.close();
        debug!("Event stream closed");
        true
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// The server side finished or failed; queued events can still be claimed.
    pub fn has_ended(&self) -> bool {
        self.ended.load(Ordering::Acquire)
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn receive_loop(
    mut frames: EventFrames,
    queue: Arc<EventQueue<EventMessage>>,
    cancel: CancellationToken,
    ended: Arc<AtomicBool>,
) {
    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                debug!("Event receive loop cancelled");
                break;
            }
            frame = frames.next() => match frame {
                Some(Ok(event)) => {
                    for msg in event.messages {
                        if !queue.push(msg) {
                            return;
                        }
                    }
                }
                Some(Err(e)) => {
                    if !cancel.is_cancelled() {
                        warn!(error = %e, "Event stream error");
                    }
                    break;
                }
                None => {
                    info!("Event stream ended");
                    break;
                }
            }
        }
    }
    ended.store(true, Ordering::Release);
}

/// Owner of the process-wide subscription.
///
/// `open` hands out the live stream, subscribing only when there is none;
/// concurrent callers are serialised so exactly one subscription is made.
pub struct EventHub {
    source: Arc<dyn EventSource>,
    current: Mutex<Option<Arc<EventStream>>>,
    shutdown: CancellationToken,
}

impl EventHub {
    pub fn new(source: Arc<dyn EventSource>) -> Self {
        Self::with_shutdown(source, CancellationToken::new())
    }

    /// Streams opened by this hub are cancelled when `shutdown` is.
    pub fn with_shutdown(source: Arc<dyn EventSource>, shutdown: CancellationToken) -> Self {
        Self {
            source,
            current: Mutex::new(None),
            shutdown,
        }
    }

    /// Return the live stream, subscribing with `token` if none is open.
    ///
    /// A stream that was closed or whose server side ended is replaced.
    pub async fn open(&self, token: &str) -> Result<Arc<EventStream>, ClientError> {
        let mut current = self.current.lock().await;
        if let Some(stream) = current.as_ref() {
            if !stream.is_closed() && !stream.has_ended() {
                return Ok(Arc::clone(stream));
            }
            stream.close();
        }

        let frames = self.source.subscribe(token).await?;
        let stream = EventStream::start(frames, self.shutdown.child_token());
        *current = Some(Arc::clone(&stream));
        info!("Subscribed to event stream");
        Ok(stream)
    }

    /// The live stream, if any.
    pub async fn current(&self) -> Option<Arc<EventStream>> {
        self.current
            .lock()
            .await
            .as_ref()
            .filter(|s| !s.is_closed())
            .map(Arc::clone)
    }

    /// Close the live stream. A later `open` subscribes afresh.
    pub async fn close(&self) -> bool {
        self.current
            .lock()
            .await
            .take()
            .is_some_and(|stream| stream.close())
    }
}
