//! Event publishing/subscription abstraction (mechanics only).
//!
//! The bus distributes messages to any number of consumers (notification
//! workers, live views). It makes minimal assumptions:
//!
//! - **Transport-agnostic**: the in-memory implementation uses channels
//! - **Broadcast**: every subscriber gets a copy of every message
//! - **No persistence**: the ledger is the source of truth, the bus only fans out
//!
//! Publishing is fire-and-forget from the publisher's point of view: a slow or
//! failing consumer never blocks or rolls back the state change that produced
//! the message.

use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::Duration;

/// A subscription to a message stream.
///
/// ```ignore
/// let subscription = bus.subscribe();
///
/// loop {
///     match subscription.recv_timeout(Duration::from_millis(250)) {
///         Ok(alert) => notify(alert),
///         Err(std::sync::mpsc::RecvTimeoutError::Timeout) => continue,  // check for shutdown
///         Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,  // bus dropped
///     }
/// }
/// ```
///
/// Subscriptions are meant for a single consuming thread.
#[derive(Debug)]
pub struct Subscription<M> {
    receiver: Receiver<M>,
}

impl<M> Subscription<M> {
    pub fn new(receiver: Receiver<M>) -> Self {
        Self { receiver }
    }

    /// Block until the next message is available.
    pub fn recv(&self) -> Result<M, std::sync::mpsc::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive a message without blocking.
    pub fn try_recv(&self) -> Result<M, std::sync::mpsc::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Block for up to `timeout` waiting for a message.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<M, std::sync::mpsc::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }
}

/// Message bus (pub/sub abstraction).
///
/// Implementations must be safe to share across threads; several request
/// handlers may publish concurrently.
pub trait EventBus<M>: Send + Sync {
    type Error: core::fmt::Debug + Send + Sync + 'static;

    fn publish(&self, message: M) -> Result<(), Self::Error>;

    fn subscribe(&self) -> Subscription<M>;
}

impl<M, B> EventBus<M> for Arc<B>
where
    B: EventBus<M> + ?Sized,
{
    type Error = B::Error;

    fn publish(&self, message: M) -> Result<(), Self::Error> {
        (**self).publish(message)
    }

    fn subscribe(&self) -> Subscription<M> {
        (**self).subscribe()
    }
}
