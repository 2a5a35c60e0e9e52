//────────────────────────────────────────────────────────────────────────────
// macros – variadic fan-in and handler records
//────────────────────────────────────────────────────────────────────────────

/// Variadic form of [`merge`](crate::merge).
///
/// ```rust
/// use sugars_push_stream::{merge, Stream};
///
/// let a = Stream::<u8>::new();
/// let b = Stream::<u8>::new();
/// let c = Stream::<u8>::new();
/// let merged = merge!(a, b, c);
/// assert_eq!(c.listener_count(), 1);
/// # drop(merged);
/// ```
#[macro_export]
macro_rules! merge {
    ($($stream:expr),+ $(,)?) => {
        $crate::merge([$(&$stream),+])
    };
}

/// Builds a [`Handlers`](crate::Handlers) record from named callbacks.
///
/// ```rust
/// use sugars_push_stream::{handlers, Stream};
///
/// let stream = Stream::<u8>::new();
/// stream
///     .subscribe(handlers! {
///         next: |v: &u8| println!("{v}"),
///         error: |err| eprintln!("{err}"),
///     })
///     .unwrap();
/// ```
#[macro_export]
macro_rules! handlers {
    () => {
        $crate::Handlers::new()
    };
    (next: $next:expr $(, error: $error:expr)? $(,)?) => {
        $crate::Handlers::new().on_next($next) $(.on_error($error))?
    };
    (error: $error:expr $(,)?) => {
        $crate::Handlers::new().on_error($error)
    };
}
