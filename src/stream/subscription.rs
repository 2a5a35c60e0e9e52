//! Unsubscribe capability returned by `subscribe`

use super::StreamId;
use std::fmt;
use std::sync::Arc;

type Detach = Arc<dyn Fn() -> bool + Send + Sync + 'static>;

/// Handle that detaches exactly one listener from a stream.
///
/// Dropping a `Subscription` leaves the listener attached. Only
/// [`unsubscribe`](Subscription::unsubscribe) removes it. The handle holds the
/// stream weakly and does not keep it alive.
#[derive(Clone)]
pub struct Subscription {
    stream: StreamId,
    detach: Detach,
}

impl Subscription {
    pub(crate) fn new<F>(stream: StreamId, detach: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        Self {
            stream,
            detach: Arc::new(detach),
        }
    }

    /// The stream this subscription belongs to.
    pub fn stream_id(&self) -> StreamId {
        self.stream
    }

    /// Removes the listener. Calling it again is a no-op.
    pub fn unsubscribe(&self) {
        if (self.detach)() {
            log::trace!("{}: listener detached", self.stream);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("stream", &self.stream)
            .finish_non_exhaustive()
    }
}
