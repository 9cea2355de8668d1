//! Sources of the current instant
//!
//! A [`UsagePeriod`](super::UsagePeriod) never reads the system clock
//! directly. It asks its [`Clock`], which is [`SystemClock`] in production
//! and usually a [`ScriptedClock`] in tests.

use chrono::{DateTime, TimeDelta, Utc};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

/// Supplies the current instant to a usage period
pub trait Clock: Send + Sync {
    /// Returns the current instant
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock backed by [`Utc::now`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Replayable sequence of instants
///
/// Each call to [`now`](Clock::now) consumes the next scripted instant. Once
/// the script runs out the clock stays at the last instant it returned.
/// Clones share the same script, so a test can keep one handle to steer time
/// while the usage period owns another.
///
/// # Example
///
/// ```
/// use chrono::{TimeDelta, TimeZone, Utc};
/// use quotaslice::{Clock, ScriptedClock};
///
/// let start = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
/// let clock = ScriptedClock::starting_at(start);
///
/// assert_eq!(clock.now(), start);
/// clock.advance(TimeDelta::hours(1));
/// assert_eq!(clock.now(), start + TimeDelta::hours(1));
/// assert_eq!(clock.now(), start + TimeDelta::hours(1));
/// ```
#[derive(Debug, Clone)]
pub struct ScriptedClock {
    inner: Arc<Mutex<Script>>,
}

#[derive(Debug)]
struct Script {
    pending: VecDeque<DateTime<Utc>>,
    current: DateTime<Utc>,
}

impl ScriptedClock {
    /// Create a clock that replays `instants` in order
    ///
    /// An empty script starts at the Unix epoch.
    pub fn new(instants: impl IntoIterator<Item = DateTime<Utc>>) -> Self {
        let pending: VecDeque<_> = instants.into_iter().collect();
        let current = pending.front().copied().unwrap_or(DateTime::<Utc>::UNIX_EPOCH);

        ScriptedClock {
            inner: Arc::new(Mutex::new(Script { pending, current })),
        }
    }

    /// Create a clock that is held at `instant` until told otherwise
    pub fn starting_at(instant: DateTime<Utc>) -> Self {
        Self::new([instant])
    }

    /// Append an instant to the end of the script
    pub fn push(&self, instant: DateTime<Utc>) {
        self.with_script(|script| script.pending.push_back(instant));
    }

    /// Schedule the instant `delta` after the last scripted one
    pub fn advance(&self, delta: TimeDelta) {
        self.with_script(|script| {
            let last = script.pending.back().copied().unwrap_or(script.current);
            script.pending.push_back(last + delta);
        });
    }

    /// Number of scripted instants not yet consumed
    pub fn remaining(&self) -> usize {
        self.with_script(|script| script.pending.len())
    }

    fn with_script<R>(&self, f: impl FnOnce(&mut Script) -> R) -> R {
        // A panic while holding the lock cannot leave the script half-updated
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

impl Clock for ScriptedClock {
    fn now(&self) -> DateTime<Utc> {
        self.with_script(|script| {
            if let Some(next) = script.pending.pop_front() {
                script.current = next;
            }
            script.current
        })
    }
}
