//! Stream configuration
//!
//! A [`StreamConfig`] decides what happens to faults a stream cannot deliver:
//! errors emitted with nobody listening, errors a subscriber declined to
//! handle, and error handlers that themselves fail. Derived streams (`filter`,
//! `map`, `merge`) share the configuration of their source.

use crate::fault::{Fault, FaultKind};
use std::fmt;
use std::sync::Arc;

/// Callback type for [`FaultPolicy::Custom`]
pub type FaultHook = Arc<dyn Fn(&Fault) + Send + Sync + 'static>;

/// What to do with a fault once it has been scheduled off the emitting call stack
#[derive(Clone)]
pub enum FaultPolicy {
    /// Log the fault at error level and carry on
    Log,
    /// Panic on the task or thread the fault was scheduled onto
    ///
    /// This only ends that task or thread, not the process.
    Panic,
    /// Report the fault and exit the process with status 101
    Exit,
    /// Log the fault and abort the process
    Abort,
    /// Hand the fault to a user callback
    Custom(FaultHook),
}

impl FaultPolicy {
    /// Wraps a closure as a [`FaultPolicy::Custom`].
    pub fn custom<F>(hook: F) -> Self
    where
        F: Fn(&Fault) + Send + Sync + 'static,
    {
        FaultPolicy::Custom(Arc::new(hook))
    }
}

impl fmt::Debug for FaultPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultPolicy::Log => f.write_str("Log"),
            FaultPolicy::Panic => f.write_str("Panic"),
            FaultPolicy::Exit => f.write_str("Exit"),
            FaultPolicy::Abort => f.write_str("Abort"),
            FaultPolicy::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Settings shared by a stream and everything derived from it
#[derive(Debug, Clone)]
pub struct StreamConfig {
    unhandled_error: FaultPolicy,
    handler_fault: FaultPolicy,
    label: Option<String>,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            unhandled_error: FaultPolicy::Exit,
            handler_fault: FaultPolicy::Abort,
            label: None,
        }
    }
}

impl StreamConfig {
    /// Starts a builder from the default configuration.
    pub fn builder() -> StreamConfigBuilder {
        StreamConfigBuilder {
            config: StreamConfig::default(),
        }
    }

    /// Policy for errors that reach no handler.
    pub fn unhandled_error(&self) -> &FaultPolicy {
        &self.unhandled_error
    }

    /// Policy for error handlers that fail.
    pub fn handler_fault(&self) -> &FaultPolicy {
        &self.handler_fault
    }

    /// Label used in log output, if any.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub(crate) fn policy_for(&self, kind: FaultKind) -> &FaultPolicy {
        match kind {
            FaultKind::Unhandled => &self.unhandled_error,
            FaultKind::HandlerFailed => &self.handler_fault,
        }
    }
}

/// Builder for [`StreamConfig`]
#[derive(Debug, Clone)]
pub struct StreamConfigBuilder {
    config: StreamConfig,
}

impl StreamConfigBuilder {
    /// Sets the policy for errors that reach no handler.
    pub fn unhandled_error(mut self, policy: FaultPolicy) -> Self {
        self.config.unhandled_error = policy;
        self
    }

    /// Sets the policy for error handlers that fail.
    pub fn handler_fault(mut self, policy: FaultPolicy) -> Self {
        self.config.handler_fault = policy;
        self
    }

    /// Routes every fault kind to one callback.
    pub fn on_fault<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Fault) + Send + Sync + 'static,
    {
        let policy = FaultPolicy::custom(hook);
        self.config.unhandled_error = policy.clone();
        self.config.handler_fault = policy;
        self
    }

    /// Sets the label used in log output.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.config.label = Some(label.into());
        self
    }

    /// Finishes the configuration.
    pub fn build(self) -> StreamConfig {
        self.config
    }
}
