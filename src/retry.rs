//! Error-triggered refresh-and-retry wrapper.
//!
//! Typical use: an operation fails because the credentials it read from the
//! cache have been rotated upstream. Wrapping it with [`RefreshOnError`]
//! forces a cache refresh on the first matching failure and re-runs the
//! operation exactly once, this time with the retry signal set:
//!
//! ```
//! use param_cache::{memory::MemoryStore, Parameter, Refreshable};
//!
//! let store = MemoryStore::new();
//! store.put("api_key", "stale");
//! let key = Parameter::new("api_key", store.clone()).expect("valid name");
//! key.value().expect("resolves"); // now cached
//!
//! store.put("api_key", "fresh"); // rotated upstream
//! let result = key.refresh_on_error::<String>().run(|_is_retry| {
//!     let value = key.value().map_err(|e| e.to_string())?;
//!     if value.as_str() == Some("fresh") {
//!         Ok(value)
//!     } else {
//!         Err("credentials rejected".to_string())
//!     }
//! });
//! assert!(result.is_ok());
//! ```
//!
//! The operation takes an explicit `is_retry: bool` — `false` on the first
//! attempt, `true` on the single retry — instead of having a flag injected
//! into its arguments behind its back.

use crate::error::Error;
use crate::staleness::Refreshable;
use std::fmt;

/// Failure of a wrapped operation.
#[derive(Debug)]
pub enum RetryError<E> {
    /// The operation itself failed (uncaught class, or failed again on the
    /// retry).
    Operation(E),
    /// The forced refresh between the two attempts failed.
    Refresh(Error),
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryError::Operation(error) => write!(f, "Operation failed: {}", error),
            RetryError::Refresh(error) => write!(f, "Refresh failed: {}", error),
        }
    }
}

impl<E: fmt::Display + fmt::Debug> std::error::Error for RetryError<E> {}

/// Wraps a fallible operation with refresh-then-retry-once semantics.
///
/// Built via [`Refreshable::refresh_on_error`]. By default every error is
/// caught on the first attempt; [`catching`](Self::catching) narrows that to
/// a designated class. Whatever the second attempt does propagates — there
/// is never more than one retry.
pub struct RefreshOnError<'a, E> {
    source: &'a dyn Refreshable,
    classify: Box<dyn Fn(&E) -> bool + 'a>,
    on_error: Option<Box<dyn FnMut() + 'a>>,
}

impl<'a, E> RefreshOnError<'a, E> {
    pub fn new(source: &'a dyn Refreshable) -> Self {
        RefreshOnError {
            source,
            classify: Box::new(|_| true),
            on_error: None,
        }
    }

    /// Only errors for which `classify` returns `true` trigger the
    /// refresh-and-retry; everything else propagates immediately.
    pub fn catching(mut self, classify: impl Fn(&E) -> bool + 'a) -> Self {
        self.classify = Box::new(classify);
        self
    }

    /// Callback invoked after the refresh, before the retry.
    pub fn on_error(mut self, callback: impl FnMut() + 'a) -> Self {
        self.on_error = Some(Box::new(callback));
        self
    }

    /// Run the operation.
    ///
    /// `operation` receives the retry signal: `false` on the first attempt,
    /// `true` on the (at most one) retry.
    ///
    /// # Errors
    ///
    /// - `RetryError::Operation` when the first failure is outside the
    ///   caught class, or when the retry fails too
    /// - `RetryError::Refresh` when the forced refresh fails
    pub fn run<T, F>(mut self, mut operation: F) -> std::result::Result<T, RetryError<E>>
    where
        F: FnMut(bool) -> std::result::Result<T, E>,
    {
        match operation(false) {
            Ok(value) => Ok(value),
            Err(error) if (self.classify)(&error) => {
                debug!("Operation failed, refreshing and retrying once");
                self.source.refresh().map_err(RetryError::Refresh)?;
                if let Some(callback) = self.on_error.as_mut() {
                    callback();
                }
                operation(true).map_err(RetryError::Operation)
            }
            Err(error) => Err(RetryError::Operation(error)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use std::cell::Cell;

    /// Counts refreshes; `should_refresh` is never consulted by the wrapper.
    #[derive(Default)]
    struct FakeSource {
        refreshes: Cell<usize>,
        fail_refresh: bool,
    }

    impl Refreshable for FakeSource {
        fn should_refresh(&self) -> bool {
            false
        }

        fn refresh(&self) -> Result<()> {
            self.refreshes.set(self.refreshes.get() + 1);
            if self.fail_refresh {
                return Err(Error::BackendError("store down".to_string()));
            }
            Ok(())
        }
    }

    #[derive(Debug, PartialEq)]
    enum TestError {
        Credentials,
        Other,
    }

    #[test]
    fn test_success_skips_refresh() {
        let source = FakeSource::default();
        let result = source
            .refresh_on_error::<TestError>()
            .run(|_| Ok("immediate"));
        assert_eq!(result.expect("succeeds"), "immediate");
        assert_eq!(source.refreshes.get(), 0);
    }

    #[test]
    fn test_retry_after_refresh() {
        let source = FakeSource::default();
        let result = source.refresh_on_error::<TestError>().run(|is_retry| {
            if is_retry {
                Ok("recovered")
            } else {
                Err(TestError::Credentials)
            }
        });
        assert_eq!(result.expect("recovers"), "recovered");
        assert_eq!(source.refreshes.get(), 1);
    }

    #[test]
    fn test_second_failure_propagates() {
        let source = FakeSource::default();
        let attempts = Cell::new(0);
        let result: std::result::Result<(), _> =
            source.refresh_on_error::<TestError>().run(|_| {
                attempts.set(attempts.get() + 1);
                Err(TestError::Credentials)
            });

        assert!(matches!(
            result,
            Err(RetryError::Operation(TestError::Credentials))
        ));
        assert_eq!(attempts.get(), 2);
        assert_eq!(source.refreshes.get(), 1);
    }

    #[test]
    fn test_unmatched_class_propagates_immediately() {
        let source = FakeSource::default();
        let result: std::result::Result<(), _> = source
            .refresh_on_error::<TestError>()
            .catching(|error| *error == TestError::Credentials)
            .run(|_| Err(TestError::Other));

        assert!(matches!(result, Err(RetryError::Operation(TestError::Other))));
        assert_eq!(source.refreshes.get(), 0);
    }

    #[test]
    fn test_callback_runs_between_attempts() {
        let source = FakeSource::default();
        let callback_ran = Cell::new(false);
        let result = source
            .refresh_on_error::<TestError>()
            .on_error(|| callback_ran.set(true))
            .run(|is_retry| {
                if is_retry {
                    assert!(callback_ran.get());
                    Ok(())
                } else {
                    Err(TestError::Credentials)
                }
            });

        assert!(result.is_ok());
        assert!(callback_ran.get());
    }

    #[test]
    fn test_refresh_failure_short_circuits() {
        let source = FakeSource {
            fail_refresh: true,
            ..FakeSource::default()
        };
        let attempts = Cell::new(0);
        let result: std::result::Result<(), _> =
            source.refresh_on_error::<TestError>().run(|_| {
                attempts.set(attempts.get() + 1);
                Err(TestError::Credentials)
            });

        assert!(matches!(result, Err(RetryError::Refresh(_))));
        // No retry once the refresh itself failed.
        assert_eq!(attempts.get(), 1);
    }
}
