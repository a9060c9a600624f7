//! Max-age staleness tracking shared by parameters and groups.
//!
//! A [`StalenessTracker`] is a pure state machine: it never reads the wall
//! clock and performs no I/O. Callers pass `now` in from a
//! [`Clock`](crate::clock::Clock), which keeps every expiry decision
//! reproducible in tests.
//!
//! The decision table:
//!
//! | `max_age` | `last_refresh` | `should_refresh_at(now)` |
//! |-----------|----------------|--------------------------|
//! | `None`    | anything       | `false` (never stale)    |
//! | `Some`    | `None`         | `true` (never fetched)   |
//! | `Some`    | `Some(t)`      | `now > t + max_age`      |

use crate::error::Result;
use crate::retry::RefreshOnError;
use std::time::{Duration, Instant};

/// Tracks when a cached value was last refreshed and whether it is due again.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StalenessTracker {
    max_age: Option<Duration>,
    last_refresh: Option<Instant>,
}

impl StalenessTracker {
    /// Create a tracker. `None` means cached values never go stale.
    pub fn new(max_age: Option<Duration>) -> Self {
        StalenessTracker {
            max_age,
            last_refresh: None,
        }
    }

    pub fn max_age(&self) -> Option<Duration> {
        self.max_age
    }

    pub(crate) fn set_max_age(&mut self, max_age: Option<Duration>) {
        self.max_age = max_age;
    }

    /// Timestamp of the last recorded refresh, if any.
    pub fn last_refresh(&self) -> Option<Instant> {
        self.last_refresh
    }

    /// Whether a refresh is due at `now`.
    pub fn should_refresh_at(&self, now: Instant) -> bool {
        let Some(max_age) = self.max_age else {
            return false;
        };
        let Some(last_refresh) = self.last_refresh else {
            return true;
        };
        // An unrepresentable deadline can never be reached.
        match last_refresh.checked_add(max_age) {
            Some(deadline) => now > deadline,
            None => false,
        }
    }

    /// Record a successful refresh at `now`.
    ///
    /// With `coalesce_oldest`, a prior timestamp is kept if it is older than
    /// `now` — groups use this so that overlapping discovery calls make the
    /// shared clock track the *stalest* contributor, not the most recent one.
    pub fn record_refresh_at(&mut self, now: Instant, coalesce_oldest: bool) {
        self.last_refresh = match self.last_refresh {
            Some(previous) if coalesce_oldest => Some(previous.min(now)),
            _ => Some(now),
        };
    }
}

/// Capability interface for anything that can be refreshed from its store.
///
/// Implemented by [`Parameter`](crate::Parameter) and
/// [`ParameterGroup`](crate::ParameterGroup). A grouped parameter answers
/// both questions by delegating to its group, so callers never need to know
/// which kind of source they hold.
pub trait Refreshable {
    /// Whether the cached state is due for a refresh.
    fn should_refresh(&self) -> bool;

    /// Unconditionally re-fetch from the backing store.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the store reports unresolved names or fails outright.
    fn refresh(&self) -> Result<()>;

    /// Build a [`RefreshOnError`] wrapper around this source.
    ///
    /// See the [`retry`](crate::retry) module for the full contract.
    fn refresh_on_error<E>(&self) -> RefreshOnError<'_, E>
    where
        Self: Sized,
    {
        RefreshOnError::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX_AGE: Duration = Duration::from_secs(10);
    const TICK: Duration = Duration::from_millis(1);

    #[test]
    fn test_no_max_age_never_refreshes() {
        let tracker = StalenessTracker::new(None);
        let now = Instant::now();

        assert!(!tracker.should_refresh_at(now));
        assert!(!tracker.should_refresh_at(now + Duration::from_secs(86_400)));
    }

    #[test]
    fn test_never_fetched_is_stale() {
        let tracker = StalenessTracker::new(Some(MAX_AGE));
        assert!(tracker.should_refresh_at(Instant::now()));
    }

    #[test]
    fn test_fresh_within_window_stale_after() {
        let mut tracker = StalenessTracker::new(Some(MAX_AGE));
        let start = Instant::now();

        tracker.record_refresh_at(start, false);
        assert!(!tracker.should_refresh_at(start));
        assert!(!tracker.should_refresh_at(start + MAX_AGE - TICK));
        // The deadline itself is still fresh; staleness is strictly after.
        assert!(!tracker.should_refresh_at(start + MAX_AGE));
        assert!(tracker.should_refresh_at(start + MAX_AGE + TICK));
    }

    #[test]
    fn test_overwrite_moves_the_window() {
        let mut tracker = StalenessTracker::new(Some(MAX_AGE));
        let start = Instant::now();

        tracker.record_refresh_at(start, false);
        tracker.record_refresh_at(start + MAX_AGE, false);

        assert!(!tracker.should_refresh_at(start + MAX_AGE + Duration::from_secs(5)));
        assert_eq!(tracker.last_refresh(), Some(start + MAX_AGE));
    }

    #[test]
    fn test_coalesce_keeps_oldest_timestamp() {
        let mut tracker = StalenessTracker::new(Some(MAX_AGE));
        let t1 = Instant::now();
        let t2 = t1 + Duration::from_secs(6);

        tracker.record_refresh_at(t1, true);
        tracker.record_refresh_at(t2, true);

        // The clock still reads t1, so expiry follows the older fetch.
        assert_eq!(tracker.last_refresh(), Some(t1));
        assert!(!tracker.should_refresh_at(t1 + MAX_AGE - TICK));
        assert!(tracker.should_refresh_at(t1 + MAX_AGE + TICK));
    }

    #[test]
    fn test_coalesce_without_prior_stamp_records_now() {
        let mut tracker = StalenessTracker::new(Some(MAX_AGE));
        let now = Instant::now();

        tracker.record_refresh_at(now, true);
        assert_eq!(tracker.last_refresh(), Some(now));
    }

    #[test]
    fn test_overwrite_after_coalesce_resets_window() {
        let mut tracker = StalenessTracker::new(Some(MAX_AGE));
        let t1 = Instant::now();
        let t2 = t1 + Duration::from_secs(6);

        tracker.record_refresh_at(t1, true);
        tracker.record_refresh_at(t2, false);

        assert_eq!(tracker.last_refresh(), Some(t2));
        assert!(!tracker.should_refresh_at(t1 + MAX_AGE + TICK));
    }
}
