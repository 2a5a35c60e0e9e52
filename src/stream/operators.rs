//! Derivation operators and fan-in
//!
//! Every operator builds a new downstream stream and attaches one internal
//! listener to its source. Values pass through the operator's function; errors
//! pass through unchanged. A failing predicate or transform is emitted on the
//! downstream error channel, never returned to whoever called `next` upstream.

use super::listener::Listener;
use super::subscription::Subscription;
use super::Stream;
use crate::error::{Result, StreamError};
use std::borrow::Borrow;

impl<T: 'static> Stream<T> {
    /// Forwards values for which `predicate` returns true.
    pub fn filter<F>(&self, predicate: F) -> Stream<T>
    where
        T: Clone,
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.try_filter(move |value| Ok(predicate(value)))
    }

    /// Like [`filter`](Self::filter) with a predicate that may fail.
    ///
    /// A predicate error is emitted downstream and the value is dropped.
    pub fn try_filter<F>(&self, predicate: F) -> Stream<T>
    where
        T: Clone,
        F: Fn(&T) -> Result<bool> + Send + Sync + 'static,
    {
        self.filtered(predicate).0
    }

    pub(crate) fn filtered<F>(&self, predicate: F) -> (Stream<T>, Subscription)
    where
        T: Clone,
        F: Fn(&T) -> Result<bool> + Send + Sync + 'static,
    {
        self.derive(move |value, downstream| {
            if predicate(value)? {
                downstream.next(value.clone());
            }
            Ok(())
        })
    }

    /// Forwards `transform(value)` for every value.
    pub fn map<U, F>(&self, transform: F) -> Stream<U>
    where
        U: 'static,
        F: Fn(&T) -> U + Send + Sync + 'static,
    {
        self.try_map(move |value| Ok(transform(value)))
    }

    /// Like [`map`](Self::map) with a transform that may fail.
    ///
    /// A transform error is emitted downstream in place of the value.
    pub fn try_map<U, F>(&self, transform: F) -> Stream<U>
    where
        U: 'static,
        F: Fn(&T) -> Result<U> + Send + Sync + 'static,
    {
        self.derive(move |value, downstream| {
            downstream.next(transform(value)?);
            Ok(())
        })
        .0
    }

    fn derive<U, F>(&self, forward: F) -> (Stream<U>, Subscription)
    where
        U: 'static,
        F: Fn(&T, &Stream<U>) -> Result<()> + Send + Sync + 'static,
    {
        let downstream = Stream::with_shared_config(self.shared_config());
        let subscription = self.forward_into(&downstream, forward);
        log::trace!("{}: derived from {}", downstream.id(), self.id());
        (downstream, subscription)
    }

    /// Attaches a listener that feeds `target`. Failures of `forward` go to
    /// `target`'s error channel.
    fn forward_into<U, F>(&self, target: &Stream<U>, forward: F) -> Subscription
    where
        U: 'static,
        F: Fn(&T, &Stream<U>) -> Result<()> + Send + Sync + 'static,
    {
        let next_target = target.clone();
        let error_target = target.clone();
        self.attach(Listener::new(
            Box::new(move |value: &T| {
                if let Err(err) = forward(value, &next_target) {
                    next_target.error(err);
                }
                Ok(())
            }),
            Box::new(move |err: &StreamError| {
                error_target.error(err.clone());
                Ok(())
            }),
        ))
    }
}

/// Merges several streams into one.
///
/// Accepts any sequence of streams or stream references. Values and errors
/// from every source are forwarded in the order they are emitted. An error on
/// one source is relayed without detaching the others. The merged stream
/// shares the first source's configuration.
///
/// ```rust
/// use sugars_push_stream::{merge, Stream};
///
/// let a = Stream::<i32>::new();
/// let b = Stream::<i32>::new();
/// let merged = merge([&a, &b]);
/// assert_eq!(a.listener_count(), 1);
/// assert_eq!(merged.listener_count(), 0);
/// ```
pub fn merge<T, I>(streams: I) -> Stream<T>
where
    T: Clone + 'static,
    I: IntoIterator,
    I::Item: Borrow<Stream<T>>,
{
    let mut sources = streams.into_iter().peekable();
    let config = sources
        .peek()
        .map(|first| Borrow::<Stream<T>>::borrow(first).shared_config())
        .unwrap_or_default();
    let merged = Stream::with_shared_config(config);
    for source in sources {
        let source: &Stream<T> = source.borrow();
        source.forward_into(&merged, |value, merged| {
            merged.next(value.clone());
            Ok(())
        });
        log::trace!("{}: merging {}", merged.id(), source.id());
    }
    merged
}
