//! Push-based broadcast stream
//!
//! A [`Stream`] holds an ordered list of listeners. `next` and `error` deliver
//! synchronously to every listener attached at the moment of the call, in
//! attachment order. There is no completion signal: a stream accepts values
//! for as long as a handle to it exists.
//!
//! Dispatch works on a snapshot of the listener list taken under the lock, and
//! the lock is released before any handler runs. Handlers may therefore
//! subscribe, unsubscribe or emit reentrantly without disturbing the delivery
//! in progress.

pub mod listener;
pub mod operators;
pub mod settle;
pub mod subscription;

use crate::config::StreamConfig;
use crate::error::{StreamError, UsageError};
use crate::fault::{self, Fault, FaultKind};
use listener::{IntoHandlers, Listener};
use parking_lot::Mutex;
use std::fmt;
use std::ptr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use subscription::Subscription;

/// Process-unique stream identifier, increasing in creation order.
///
/// Only meant for identity and log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StreamId(u64);

impl StreamId {
    fn next() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        StreamId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[cfg(test)]
    pub(crate) fn from_raw(raw: u64) -> Self {
        StreamId(raw)
    }

    /// Returns the raw numeric id.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stream#{}", self.0)
    }
}

pub(crate) struct Inner<T> {
    id: StreamId,
    config: Arc<StreamConfig>,
    listeners: Mutex<Vec<Arc<Listener<T>>>>,
}

/// Single-producer, multi-consumer broadcast channel with synchronous delivery.
///
/// `Stream` is a handle: clones share the same listeners and id.
///
/// ```rust
/// use std::sync::Arc;
/// use parking_lot::Mutex;
/// use sugars_push_stream::{Handlers, Stream};
///
/// let stream = Stream::new();
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = seen.clone();
/// let subscription = stream
///     .map(|v: &i32| v * 10)
///     .subscribe(Handlers::new().on_next(move |v: &i32| sink.lock().push(*v)))
///     .unwrap();
///
/// stream.next(1);
/// subscription.unsubscribe();
/// stream.next(2);
/// assert_eq!(*seen.lock(), vec![10]);
/// ```
pub struct Stream<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Stream<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: 'static> Default for Stream<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Stream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stream")
            .field("id", &self.inner.id)
            .field("label", &self.inner.config.label())
            .field("listeners", &self.inner.listeners.lock().len())
            .finish()
    }
}

impl<T: 'static> Stream<T> {
    /// Creates a stream with the default configuration.
    pub fn new() -> Self {
        Self::with_shared_config(Arc::default())
    }

    /// Creates a stream with the given configuration.
    pub fn with_config(config: StreamConfig) -> Self {
        Self::with_shared_config(Arc::new(config))
    }

    pub(crate) fn with_shared_config(config: Arc<StreamConfig>) -> Self {
        Self {
            inner: Arc::new(Inner {
                id: StreamId::next(),
                config,
                listeners: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Returns this stream's id.
    pub fn id(&self) -> StreamId {
        self.inner.id
    }

    /// Returns the configuration shared with derived streams.
    pub fn config(&self) -> &StreamConfig {
        &self.inner.config
    }

    pub(crate) fn shared_config(&self) -> Arc<StreamConfig> {
        Arc::clone(&self.inner.config)
    }

    /// Number of listeners currently attached.
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.lock().len()
    }

    /// Delivers `value` to every attached listener, in order.
    ///
    /// A listener whose `next` handler fails does not stop delivery: its error
    /// is emitted on this stream's error channel and the remaining listeners
    /// still receive `value`.
    pub fn next(&self, value: T) {
        for listener in self.snapshot() {
            if let Err(err) = listener.on_next(&value) {
                log::debug!(
                    "{}: next handler failed, routing to error channel: {err}",
                    self.inner.id
                );
                self.error(err);
            }
        }
    }

    /// Delivers `err` to every attached listener's error handler, in order.
    ///
    /// With no listeners attached the error is scheduled as an unhandled
    /// fault. An error handler that fails is scheduled as a fault as well and
    /// is never fed back into the stream.
    pub fn error(&self, err: impl Into<StreamError>) {
        let err = err.into();
        let listeners = self.snapshot();
        if listeners.is_empty() {
            self.raise(FaultKind::Unhandled, err);
            return;
        }
        for listener in listeners {
            if let Err(failure) = listener.on_error(&err) {
                let kind = if failure.ptr_eq(&err) {
                    FaultKind::Unhandled
                } else {
                    FaultKind::HandlerFailed
                };
                self.raise(kind, failure);
            }
        }
    }

    /// Attaches a listener built from `handlers`.
    ///
    /// Accepts a [`Handlers`](listener::Handlers) record. A bare closure,
    /// whatever it returns, is rejected with [`UsageError::InvalidArgument`]
    /// since it does not say which channel it is meant for.
    ///
    /// A missing `next` handler ignores values. A missing `error` handler
    /// re-raises, which surfaces the error as an unhandled fault.
    pub fn subscribe<H>(&self, handlers: H) -> Result<Subscription, UsageError>
    where
        H: IntoHandlers<T>,
    {
        let listener = handlers.into_handlers()?.into_listener();
        Ok(self.attach(listener))
    }

    pub(crate) fn attach(&self, listener: Listener<T>) -> Subscription {
        let listener = Arc::new(listener);
        let handle = Arc::downgrade(&listener);
        self.inner.listeners.lock().push(listener);
        log::trace!("{}: listener attached", self.inner.id);

        let stream = Arc::downgrade(&self.inner);
        Subscription::new(self.inner.id, move || {
            let Some(inner) = stream.upgrade() else {
                return false;
            };
            let removed = {
                let mut listeners = inner.listeners.lock();
                let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut *listeners)
                    .into_iter()
                    .partition(|l| ptr::eq(Arc::as_ptr(l), handle.as_ptr()));
                *listeners = kept;
                removed
            };
            !removed.is_empty()
        })
    }

    fn snapshot(&self) -> Vec<Arc<Listener<T>>> {
        self.inner.listeners.lock().clone()
    }

    fn raise(&self, kind: FaultKind, error: StreamError) {
        let config = &self.inner.config;
        match kind {
            FaultKind::Unhandled => {
                log::warn!("{}: scheduling unhandled error: {error}", self.inner.id)
            }
            FaultKind::HandlerFailed => {
                log::error!("{}: error handler failed: {error}", self.inner.id)
            }
        }
        let fault = Fault::new(
            kind,
            self.inner.id,
            config.label().map(str::to_owned),
            error,
        );
        fault::schedule(config.policy_for(kind).clone(), fault);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_increase_across_streams() {
        let first = Stream::<u8>::new();
        let second = Stream::<String>::new();
        assert!(second.id() > first.id());
        assert_eq!(first.clone().id(), first.id());
        assert_eq!(StreamId::from_raw(3).to_string(), "stream#3");
    }

    #[test]
    fn debug_shows_id_and_listener_count() {
        let stream = Stream::<u8>::new();
        let _derived = stream.map(|v| *v);
        let rendered = format!("{stream:?}");
        assert!(rendered.contains(&format!("{:?}", stream.id())));
        assert!(rendered.contains("listeners: 1"));
    }
}
