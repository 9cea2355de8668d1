//! Usage period: quota policy plus the live admission count
//!
//! A [`UsagePeriod`] answers one question per request: may this request
//! proceed? It advances its view of time through its [`Clock`], appends a
//! slice whenever time enters a new granularity window, renews or slides the
//! quota as the period moves on, and then compares the running count against
//! the limit.

use super::clock::{Clock, SystemClock};
use super::slice::{SliceChain, TimeSlice};
use super::unit::{TIME_QUANTUM, TimeUnit, aligned_bounds};
use super::ValidationError;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Raw settings for a usage period, as supplied by a caller or a loader
///
/// Call [`initialise`](Self::initialise) to validate and normalise the
/// fields into a [`PeriodPolicy`].
///
/// # Example
///
/// ```
/// use quotaslice::{PeriodConfig, TimeUnit};
///
/// let mut config = PeriodConfig::new(" partner-api ", "DAY", 1000)
///     .with_granularity("HOUR")
///     .clock_aligned(true);
///
/// let policy = config.initialise().unwrap();
/// assert_eq!(policy.name, "partner-api");
/// assert_eq!(policy.granularity, TimeUnit::Hour);
/// assert_eq!(policy.unit_multiple, 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodConfig {
    /// Subject name; surrounding whitespace is trimmed, inner whitespace is rejected
    pub name: String,
    /// Period unit label: SECOND, MINUTE, HOUR or DAY
    pub unit: String,
    /// Slice width label; defaults to `unit`
    pub granularity: Option<String>,
    /// Number of units in one period; 0 means 1
    pub unit_multiple: i64,
    /// Align windows to the UTC calendar instead of rolling
    pub clock_aligned: bool,
    /// Admissions allowed per period
    pub limit: i64,
}

impl PeriodConfig {
    /// Create a rolling, single-unit configuration
    pub fn new(name: impl Into<String>, unit: impl Into<String>, limit: i64) -> Self {
        PeriodConfig {
            name: name.into(),
            unit: unit.into(),
            limit,
            ..Default::default()
        }
    }

    pub fn with_granularity(mut self, granularity: impl Into<String>) -> Self {
        self.granularity = Some(granularity.into());
        self
    }

    pub fn with_unit_multiple(mut self, unit_multiple: i64) -> Self {
        self.unit_multiple = unit_multiple;
        self
    }

    pub fn clock_aligned(mut self, clock_aligned: bool) -> Self {
        self.clock_aligned = clock_aligned;
        self
    }

    /// Validate the settings and derive the typed policy
    ///
    /// Normalised values are written back: the trimmed name, the defaulted
    /// granularity and a `unit_multiple` of at least 1. Running it again
    /// after changing fields re-validates from scratch.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found, checking name, unit,
    /// granularity, multiple and limit in that order.
    pub fn initialise(&mut self) -> Result<PeriodPolicy, ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::MissingName);
        }
        if name.chars().any(char::is_whitespace) {
            return Err(ValidationError::NameContainsWhitespace(name.to_string()));
        }
        self.name = name.to_string();

        let unit: TimeUnit = self.unit.parse()?;

        let granularity = match self.granularity.as_deref().filter(|g| !g.trim().is_empty()) {
            Some(label) => label.parse()?,
            None => unit,
        };
        self.granularity = Some(granularity.label().to_string());

        if granularity > unit {
            return Err(ValidationError::GranularityTooCoarse { granularity, unit });
        }

        if self.unit_multiple < 0 {
            return Err(ValidationError::NegativeMultiple(self.unit_multiple));
        }
        if self.unit_multiple == 0 {
            self.unit_multiple = 1;
        }

        let unit_multiple = i32::try_from(self.unit_multiple)
            .ok()
            .and_then(|m| unit.duration().checked_mul(m).map(|d| (m as u32, d)));
        let Some((unit_multiple, period_duration)) = unit_multiple else {
            return Err(ValidationError::MultipleOutOfRange(self.unit_multiple));
        };

        if self.limit <= 0 {
            return Err(ValidationError::NonPositiveLimit(self.limit));
        }

        Ok(PeriodPolicy {
            name: self.name.clone(),
            unit,
            granularity,
            unit_multiple,
            clock_aligned: self.clock_aligned,
            limit: self.limit as u64,
            period_duration,
        })
    }
}

/// Validated, typed quota policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodPolicy {
    pub name: String,
    pub unit: TimeUnit,
    pub granularity: TimeUnit,
    pub unit_multiple: u32,
    pub clock_aligned: bool,
    pub limit: u64,
    /// `unit` duration times `unit_multiple`
    pub period_duration: TimeDelta,
}

/// Point-in-time view of a usage period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    pub name: String,
    pub unit: TimeUnit,
    pub granularity: TimeUnit,
    pub unit_multiple: u32,
    pub clock_aligned: bool,
    pub limit: u64,
    pub total_count: u64,
    pub remaining: u64,
    pub slices: usize,
    /// When a clock-aligned period next renews its quota
    pub reset_at: Option<DateTime<Utc>>,
}

/// Usage-window tracker for one quota subject
///
/// The tracker is single-writer: every admission check takes `&mut self`, so
/// the trim, slice maintenance and decision steps run as one critical
/// section. Share it between tasks through an owning actor or a mutex.
///
/// # Window semantics
///
/// - **Clock aligned**: slices cover calendar windows of the granularity
///   unit. The first admission of a period fixes the renewal instant at the
///   end of the calendar period containing it; the first call after that
///   instant clears the chain and restores the full quota.
/// - **Rolling**: slices are single instants. Slices older than one period
///   duration drop off the head of the chain and hand their admissions back,
///   so the quota slides continuously. Only the latest slice may be empty,
///   which keeps the chain at most `limit + 1` slices long.
///
/// # Example
///
/// ```
/// use chrono::{TimeDelta, TimeZone, Utc};
/// use quotaslice::{PeriodConfig, ScriptedClock, UsagePeriod};
///
/// let start = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
/// let clock = ScriptedClock::starting_at(start);
/// let config = PeriodConfig::new("reports", "DAY", 2).clock_aligned(true);
/// let mut period = UsagePeriod::with_clock(config, clock.clone()).unwrap();
///
/// assert!(period.allowed());
/// assert!(period.allowed());
/// assert!(!period.allowed());
///
/// clock.advance(TimeDelta::days(1));
/// assert!(period.allowed());
/// assert_eq!(period.total_slices(), 1);
/// ```
#[derive(Debug)]
pub struct UsagePeriod<C: Clock = SystemClock> {
    policy: PeriodPolicy,
    chain: SliceChain,
    total_count: u64,
    reset_at: Option<DateTime<Utc>>,
    clock: C,
}

impl UsagePeriod<SystemClock> {
    /// Create a usage period driven by the system clock
    pub fn new(config: PeriodConfig) -> Result<Self, ValidationError> {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> UsagePeriod<C> {
    /// Validate `config` and create a usage period driven by `clock`
    pub fn with_clock(mut config: PeriodConfig, clock: C) -> Result<Self, ValidationError> {
        let policy = config.initialise()?;
        Ok(Self::from_policy(policy, clock))
    }

    /// Create a usage period from an already validated policy
    pub fn from_policy(policy: PeriodPolicy, clock: C) -> Self {
        UsagePeriod {
            policy,
            chain: SliceChain::new(),
            total_count: 0,
            reset_at: None,
            clock,
        }
    }

    /// Decide whether a request arriving now is admitted
    pub fn allowed(&mut self) -> bool {
        let now = self.clock.now();
        self.allowed_at(now)
    }

    /// Decide whether a request arriving at `now` is admitted
    ///
    /// An admitted request is counted in the latest slice and in the period
    /// total. A refused request changes no counters.
    pub fn allowed_at(&mut self, now: DateTime<Utc>) -> bool {
        self.trim(now);

        if self.chain.is_empty() {
            self.chain.push(self.build_slice(now));
            if self.policy.clock_aligned {
                self.reset_at = Some(self.period_end(now));
            }
        } else {
            self.update_latest(now);
        }

        if self.total_count >= self.policy.limit {
            return false;
        }

        if let Some(latest) = self.chain.latest_mut() {
            latest.count = latest.count.saturating_add(1);
        }
        self.total_count += 1;

        true
    }

    /// Drop all recorded usage and restore the full quota
    pub fn reset(&mut self) {
        self.chain.clear();
        self.total_count = 0;
        self.reset_at = None;
    }

    /// Number of slices currently chained
    pub fn total_slices(&self) -> usize {
        self.chain.len()
    }

    /// Admissions counted in the current period
    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    /// Admissions left before the limit is reached
    pub fn remaining(&self) -> u64 {
        self.policy.limit.saturating_sub(self.total_count)
    }

    pub fn limit(&self) -> u64 {
        self.policy.limit
    }

    pub fn name(&self) -> &str {
        &self.policy.name
    }

    pub fn policy(&self) -> &PeriodPolicy {
        &self.policy
    }

    /// Instant after which a clock-aligned period renews its quota
    pub fn reset_at(&self) -> Option<DateTime<Utc>> {
        self.reset_at
    }

    /// Slices from earliest to latest
    pub fn slices(&self) -> impl Iterator<Item = &TimeSlice> {
        self.chain.iter()
    }

    pub fn snapshot(&self) -> UsageSnapshot {
        UsageSnapshot {
            name: self.policy.name.clone(),
            unit: self.policy.unit,
            granularity: self.policy.granularity,
            unit_multiple: self.policy.unit_multiple,
            clock_aligned: self.policy.clock_aligned,
            limit: self.policy.limit,
            total_count: self.total_count,
            remaining: self.remaining(),
            slices: self.chain.len(),
            reset_at: self.reset_at,
        }
    }

    /// Reclaim quota that `now` has moved past
    fn trim(&mut self, now: DateTime<Utc>) {
        if self.chain.is_empty() {
            return;
        }

        if self.policy.clock_aligned {
            if self.reset_at.is_some_and(|reset_at| now > reset_at) {
                tracing::debug!(period = %self.policy.name, "quota period renewed");
                self.reset();
            }
            return;
        }

        let Some(cutoff) = now.checked_sub_signed(self.policy.period_duration) else {
            return;
        };
        let released = self.chain.pop_expired(cutoff);
        if released > 0 {
            self.total_count = self.total_count.saturating_sub(released);
            tracing::debug!(
                period = %self.policy.name,
                released,
                "expired admissions slid out of the rolling window"
            );
        }
    }

    fn update_latest(&mut self, now: DateTime<Utc>) {
        let Some(latest) = self.chain.latest_mut() else {
            return;
        };
        if now <= latest.end {
            return;
        }

        // An empty rolling slice moves forward instead of leaving a gap
        // behind, so refused traffic never grows the chain.
        if !self.policy.clock_aligned && latest.count == 0 {
            latest.start = now;
            latest.end = now;
            return;
        }

        let slice = self.build_slice(now);
        self.chain.push(slice);
    }

    fn build_slice(&self, now: DateTime<Utc>) -> TimeSlice {
        if self.policy.clock_aligned {
            let (start, end) = aligned_bounds(now, self.policy.granularity);
            TimeSlice::new(start, end)
        } else {
            TimeSlice::new(now, now)
        }
    }

    /// Last instant of the calendar period that starts with the unit window
    /// containing `now`
    fn period_end(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let (start, _) = aligned_bounds(now, self.policy.unit);
        start
            .checked_add_signed(self.policy.period_duration - TIME_QUANTUM)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}
