//! Listener records and the handler builder used by `subscribe`

use crate::error::{Result, StreamError, UsageError};

type NextFn<T> = Box<dyn Fn(&T) -> Result<()> + Send + Sync + 'static>;
type ErrorFn = Box<dyn Fn(&StreamError) -> Result<()> + Send + Sync + 'static>;

const BARE_FUNCTION: &str =
    "handlers must be an object with `next`/`error` callbacks, not a bare function";

/// A `next`/`error` handler pair attached to a stream.
///
/// Handlers report failure by returning `Err`.
pub(crate) struct Listener<T> {
    next: NextFn<T>,
    error: ErrorFn,
}

impl<T> Listener<T> {
    pub(crate) fn new(next: NextFn<T>, error: ErrorFn) -> Self {
        Self { next, error }
    }

    pub(crate) fn on_next(&self, value: &T) -> Result<()> {
        (self.next)(value)
    }

    pub(crate) fn on_error(&self, err: &StreamError) -> Result<()> {
        (self.error)(err)
    }
}

/// Handlers passed to [`Stream::subscribe`](crate::Stream::subscribe).
///
/// Both handlers are optional. Without `next`, values are ignored. Without
/// `error`, errors are re-raised and surface as an unhandled fault.
///
/// ```rust
/// use sugars_push_stream::{Handlers, Stream};
///
/// let stream = Stream::<u32>::new();
/// let handlers = Handlers::new()
///     .on_next(|v: &u32| println!("got {v}"))
///     .on_error(|err| eprintln!("failed: {err}"));
/// stream.subscribe(handlers).unwrap();
/// ```
pub struct Handlers<T> {
    next: Option<NextFn<T>>,
    error: Option<ErrorFn>,
}

impl<T> Default for Handlers<T> {
    fn default() -> Self {
        Self {
            next: None,
            error: None,
        }
    }
}

impl<T: 'static> Handlers<T> {
    /// Creates an empty handler record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an infallible `next` handler.
    pub fn on_next<F>(self, f: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.try_on_next(move |value| {
            f(value);
            Ok(())
        })
    }

    /// Sets a `next` handler that may fail.
    ///
    /// A failure is emitted on the stream's error channel.
    pub fn try_on_next<F>(mut self, f: F) -> Self
    where
        F: Fn(&T) -> Result<()> + Send + Sync + 'static,
    {
        self.next = Some(Box::new(f));
        self
    }

    /// Sets an infallible `error` handler.
    pub fn on_error<F>(self, f: F) -> Self
    where
        F: Fn(&StreamError) + Send + Sync + 'static,
    {
        self.try_on_error(move |err| {
            f(err);
            Ok(())
        })
    }

    /// Sets an `error` handler that may fail.
    ///
    /// Returning the received error re-raises it as unhandled. Returning any
    /// other error is a handler fault.
    pub fn try_on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&StreamError) -> Result<()> + Send + Sync + 'static,
    {
        self.error = Some(Box::new(f));
        self
    }

    pub(crate) fn into_listener(self) -> Listener<T> {
        let next: NextFn<T> = match self.next {
            Some(next) => next,
            None => Box::new(|_: &T| Ok(())),
        };
        let error: ErrorFn = match self.error {
            Some(error) => error,
            None => Box::new(|err: &StreamError| Err(err.clone())),
        };
        Listener::new(next, error)
    }
}

/// Conversion into [`Handlers`], checked at subscribe time.
pub trait IntoHandlers<T> {
    /// Converts `self`, or reports why it cannot be used as handlers.
    fn into_handlers(self) -> Result<Handlers<T>, UsageError>;
}

impl<T> IntoHandlers<T> for Handlers<T> {
    fn into_handlers(self) -> Result<Handlers<T>, UsageError> {
        Ok(self)
    }
}

/// A bare closure is ambiguous between the two channels and is rejected,
/// whatever it returns.
impl<T, F, R> IntoHandlers<T> for F
where
    F: Fn(&T) -> R,
{
    fn into_handlers(self) -> Result<Handlers<T>, UsageError> {
        Err(UsageError::InvalidArgument {
            reason: BARE_FUNCTION,
        })
    }
}
