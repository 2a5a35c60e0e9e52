//! Faults: stream errors that could not be delivered
//!
//! A fault is never handed back to the producer. It is scheduled onto the
//! running tokio runtime when there is one, otherwise onto a short-lived
//! thread, and then resolved through the stream's [`FaultPolicy`]. A fault
//! whose task is discarded by a runtime shutdown is still resolved.

use crate::config::FaultPolicy;
use crate::error::StreamError;
use crate::stream::StreamId;
use std::fmt;

/// Why an error could not be delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    /// No listener handled the error: the stream had no listeners, or a
    /// listener without an error handler re-raised it
    Unhandled,
    /// An error handler failed while handling an error
    HandlerFailed,
}

/// An undeliverable stream error together with where it happened
#[derive(Debug, Clone)]
pub struct Fault {
    kind: FaultKind,
    stream: StreamId,
    label: Option<String>,
    error: StreamError,
}

impl Fault {
    pub(crate) fn new(
        kind: FaultKind,
        stream: StreamId,
        label: Option<String>,
        error: StreamError,
    ) -> Self {
        Self {
            kind,
            stream,
            label,
            error,
        }
    }

    /// The kind of fault.
    pub fn kind(&self) -> FaultKind {
        self.kind
    }

    /// The stream the error was emitted on.
    pub fn stream_id(&self) -> StreamId {
        self.stream
    }

    /// The undelivered error.
    pub fn error(&self) -> &StreamError {
        &self.error
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self.kind {
            FaultKind::Unhandled => "unhandled stream error",
            FaultKind::HandlerFailed => "error handler failed",
        };
        match &self.label {
            Some(label) => write!(f, "{what} on {} ({label}): {}", self.stream, self.error),
            None => write!(f, "{what} on {}: {}", self.stream, self.error),
        }
    }
}

/// Exit status used by [`FaultPolicy::Exit`], matching an uncaught panic.
pub(crate) const EXIT_CODE: i32 = 101;

/// Schedules `fault` to be resolved by `policy` outside the current call stack.
pub(crate) fn schedule(policy: FaultPolicy, fault: Fault) {
    let pending = Pending::new(policy, fault);

    #[cfg(feature = "tokio")]
    if let Ok(handle) = tokio::runtime::Handle::try_current() {
        handle.spawn(async move { pending.run() });
        return;
    }

    on_thread(pending);
}

fn on_thread(pending: Pending) {
    let (tx, rx) = std::sync::mpsc::sync_channel::<Pending>(1);
    let spawned = std::thread::Builder::new()
        .name("stream-fault".into())
        .spawn(move || {
            if let Ok(pending) = rx.recv() {
                pending.run();
            }
        });
    match spawned {
        Ok(_) => {
            if let Err(std::sync::mpsc::SendError(pending)) = tx.send(pending) {
                pending.run();
            }
        }
        Err(err) => {
            log::error!("could not schedule stream fault off-thread: {err}");
            pending.run();
        }
    }
}

/// A scheduled fault that has not been resolved yet.
///
/// Dropping it unresolved, as happens to queued tasks when a tokio runtime
/// shuts down, moves the fault onto a `stream-fault` thread.
struct Pending {
    job: Option<(FaultPolicy, Fault)>,
}

impl Pending {
    fn new(policy: FaultPolicy, fault: Fault) -> Self {
        Self {
            job: Some((policy, fault)),
        }
    }

    fn run(mut self) {
        if let Some((policy, fault)) = self.job.take() {
            resolve(&policy, &fault);
        }
    }
}

impl Drop for Pending {
    fn drop(&mut self) {
        if let Some((policy, fault)) = self.job.take() {
            log::debug!("{}: fault task dropped before running", fault.stream_id());
            on_thread(Pending::new(policy, fault));
        }
    }
}

fn resolve(policy: &FaultPolicy, fault: &Fault) {
    match policy {
        FaultPolicy::Log => log::error!("{fault}"),
        FaultPolicy::Panic => panic!("{fault}"),
        FaultPolicy::Exit => {
            report(fault, "exiting");
            std::process::exit(EXIT_CODE);
        }
        FaultPolicy::Abort => {
            report(fault, "aborting");
            std::process::abort();
        }
        FaultPolicy::Custom(hook) => hook(fault),
    }
}

/// Reports a fatal fault once: through `log` when a logger takes error
/// records, otherwise on stderr.
fn report(fault: &Fault, action: &str) {
    if log::log_enabled!(log::Level::Error) {
        log::error!("{fault}; {action}");
    } else {
        eprintln!("{fault}; {action}");
    }
}
