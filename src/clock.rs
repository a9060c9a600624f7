//! Time source abstraction for deterministic staleness testing.
//!
//! Production code uses [`SystemClock`]; tests (yours included) can inject a
//! [`ManualClock`] and move time forward explicitly instead of sleeping.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// A source of "now" for max-age decisions.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Default clock backed by [`Instant::now`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same underlying time, so a test can keep one handle and
/// hand another to a [`Parameter`](crate::Parameter) or
/// [`ParameterGroup`](crate::ParameterGroup).
///
/// # Example
///
/// ```
/// use param_cache::clock::{Clock, ManualClock};
/// use std::time::Duration;
///
/// let clock = ManualClock::new();
/// let start = clock.now();
/// clock.advance(Duration::from_secs(60));
/// assert_eq!(clock.now() - start, Duration::from_secs(60));
/// ```
#[derive(Clone)]
pub struct ManualClock {
    now: Rc<Cell<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        ManualClock {
            now: Rc::new(Cell::new(Instant::now())),
        }
    }

    /// Move the clock forward by `delta`.
    pub fn advance(&self, delta: Duration) {
        self.now.set(self.now.get() + delta);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}
