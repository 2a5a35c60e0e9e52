//! One-shot bridge from a stream to a future

use super::listener::Listener;
use super::subscription::Subscription;
use super::Stream;
use crate::error::{Result, StreamError};
use futures::channel::oneshot;
use parking_lot::Mutex;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

/// Future returned by [`Stream::as_promise`].
///
/// Wraps a oneshot receiver and settles exactly once: with the first matching
/// value, or with the first error seen before one. If every handle to the
/// source is dropped first it settles with a closed [`StreamError`].
#[must_use = "futures do nothing unless polled"]
#[derive(Debug)]
pub struct Settlement<T> {
    receiver: oneshot::Receiver<Result<T>>,
}

impl<T> Future for Settlement<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            Poll::Ready(Err(oneshot::Canceled)) => Poll::Ready(Err(StreamError::closed())),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Sender side of a settlement plus the subscriptions to drop once it settles.
struct Bridge<T> {
    sender: Mutex<Option<oneshot::Sender<Result<T>>>>,
    subscriptions: Mutex<Option<Vec<Subscription>>>,
}

impl<T> Bridge<T> {
    fn settle(&self, outcome: Result<T>) {
        let Some(sender) = self.sender.lock().take() else {
            return;
        };
        // The receiver may already be gone; the outcome is simply dropped then.
        let _ = sender.send(outcome);
        self.teardown();
    }

    fn arm(&self, subscriptions: Vec<Subscription>) {
        *self.subscriptions.lock() = Some(subscriptions);
        if self.sender.lock().is_none() {
            self.teardown();
        }
    }

    fn teardown(&self) {
        let subscriptions = self.subscriptions.lock().take();
        for subscription in subscriptions.into_iter().flatten() {
            subscription.unsubscribe();
        }
    }
}

impl<T: Clone + Send + 'static> Stream<T> {
    /// Resolves with the first value for which `check` returns true.
    ///
    /// An error reaching the bridge first rejects it instead. Either way the
    /// bridge detaches itself from the stream after settling.
    ///
    /// ```rust
    /// use sugars_push_stream::Stream;
    ///
    /// let stream = Stream::<u32>::new();
    /// let settlement = stream.as_promise(|v| *v > 1);
    /// stream.next(1);
    /// stream.next(2);
    /// stream.next(3);
    /// assert_eq!(stream.listener_count(), 0);
    /// assert_eq!(futures::executor::block_on(settlement).unwrap(), 2);
    /// ```
    pub fn as_promise<F>(&self, check: F) -> Settlement<T>
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.try_as_promise(move |value| Ok(check(value)))
    }

    /// Like [`as_promise`](Self::as_promise) with a check that may fail.
    ///
    /// A failing check rejects the settlement.
    pub fn try_as_promise<F>(&self, check: F) -> Settlement<T>
    where
        F: Fn(&T) -> Result<bool> + Send + Sync + 'static,
    {
        let (sender, receiver) = oneshot::channel();
        let bridge = Arc::new(Bridge {
            sender: Mutex::new(Some(sender)),
            subscriptions: Mutex::new(None),
        });

        let (filtered, upstream) = self.filtered(check);
        let on_next = Arc::clone(&bridge);
        let on_error = Arc::clone(&bridge);
        let downstream = filtered.attach(Listener::new(
            Box::new(move |value: &T| {
                on_next.settle(Ok(value.clone()));
                Ok(())
            }),
            Box::new(move |err: &StreamError| {
                on_error.settle(Err(err.clone()));
                Ok(())
            }),
        ));
        bridge.arm(vec![downstream, upstream]);
        log::trace!("{}: promise bridge armed", self.id());

        Settlement { receiver }
    }
}
