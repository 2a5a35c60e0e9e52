//! # Sugars Push Stream
//!
//! Push-based broadcast streams: one producer, many listeners, synchronous
//! delivery.
//!
//! - [`Stream::next`] / [`Stream::error`] deliver to every attached listener,
//!   in attachment order, before returning
//! - [`Stream::subscribe`] attaches a listener and returns a [`Subscription`]
//! - [`Stream::filter`], [`Stream::map`] and [`merge`] derive new streams
//! - [`Stream::as_promise`] bridges the first matching value into a future
//!
//! Errors are first-class. A failing handler, predicate or transform puts its
//! error on the error channel. Errors that nobody handles are never dropped:
//! they are scheduled off the emitting call stack and resolved by the stream's
//! [`FaultPolicy`].
//!
//! ## Features
//!
//! - `tokio` - schedule faults onto the running tokio runtime when there is one
//! - `macros` - the [`merge!`] and [`handlers!`] macros
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use parking_lot::Mutex;
//! use sugars_push_stream::{Handlers, Stream, StreamConfig, StreamError};
//!
//! let config = StreamConfig::builder().label("readings").build();
//! let readings = Stream::with_config(config);
//! let alerts = Arc::new(Mutex::new(Vec::new()));
//! let errors = Arc::new(Mutex::new(Vec::new()));
//!
//! let (a, e) = (alerts.clone(), errors.clone());
//! readings
//!     .filter(|celsius: &f64| *celsius > 30.0)
//!     .map(|celsius| format!("hot: {celsius}"))
//!     .subscribe(
//!         Handlers::new()
//!             .on_next(move |msg: &String| a.lock().push(msg.clone()))
//!             .on_error(move |err| e.lock().push(err.to_string())),
//!     )
//!     .unwrap();
//!
//! readings.next(21.0);
//! readings.next(35.5);
//! readings.error(StreamError::msg("sensor offline"));
//!
//! assert_eq!(*alerts.lock(), vec!["hot: 35.5".to_string()]);
//! assert_eq!(*errors.lock(), vec!["sensor offline".to_string()]);
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod fault;
pub mod stream;

#[cfg(feature = "macros")]
mod macros;

pub use config::{FaultHook, FaultPolicy, StreamConfig, StreamConfigBuilder};
pub use error::{Result, StreamError, StreamErrorKind, UsageError};
pub use fault::{Fault, FaultKind};
pub use stream::listener::{Handlers, IntoHandlers};
pub use stream::operators::merge;
pub use stream::settle::Settlement;
pub use stream::subscription::Subscription;
pub use stream::{Stream, StreamId};
