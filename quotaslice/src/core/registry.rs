//! Usage periods keyed by quota subject

use super::clock::{Clock, SystemClock};
use super::period::{UsagePeriod, UsageSnapshot};

#[cfg(feature = "ahash")]
use ahash::AHashMap as HashMap;
#[cfg(not(feature = "ahash"))]
use std::collections::HashMap;

/// One usage period per quota subject
///
/// Subjects are independent: checking one never touches another's state.
///
/// # Example
///
/// ```
/// use quotaslice::{PeriodConfig, QuotaRegistry, UsagePeriod};
///
/// let mut registry = QuotaRegistry::new();
/// registry.insert(UsagePeriod::new(PeriodConfig::new("search", "MINUTE", 1)).unwrap());
///
/// assert_eq!(registry.check("search"), Some(true));
/// assert_eq!(registry.check("search"), Some(false));
/// assert_eq!(registry.check("unknown"), None);
/// ```
#[derive(Debug)]
pub struct QuotaRegistry<C: Clock = SystemClock> {
    periods: HashMap<String, UsagePeriod<C>>,
}

impl<C: Clock> Default for QuotaRegistry<C> {
    fn default() -> Self {
        QuotaRegistry {
            periods: HashMap::new(),
        }
    }
}

impl<C: Clock> QuotaRegistry<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `period` under its name, returning any period it replaces
    pub fn insert(&mut self, period: UsagePeriod<C>) -> Option<UsagePeriod<C>> {
        self.periods.insert(period.name().to_string(), period)
    }

    /// Run an admission check for `subject`
    ///
    /// Returns `None` when the subject is not registered.
    pub fn check(&mut self, subject: &str) -> Option<bool> {
        self.periods.get_mut(subject).map(UsagePeriod::allowed)
    }

    /// Force a quota renewal for `subject`
    ///
    /// Returns `false` when the subject is not registered.
    pub fn reset(&mut self, subject: &str) -> bool {
        match self.periods.get_mut(subject) {
            Some(period) => {
                period.reset();
                true
            }
            None => false,
        }
    }

    pub fn snapshot(&self, subject: &str) -> Option<UsageSnapshot> {
        self.periods.get(subject).map(UsagePeriod::snapshot)
    }

    pub fn get(&self, subject: &str) -> Option<&UsagePeriod<C>> {
        self.periods.get(subject)
    }

    /// Registered subject names, in no particular order
    pub fn subjects(&self) -> impl Iterator<Item = &str> {
        self.periods.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }
}

impl<C: Clock> FromIterator<UsagePeriod<C>> for QuotaRegistry<C> {
    fn from_iter<I: IntoIterator<Item = UsagePeriod<C>>>(iter: I) -> Self {
        let mut registry = Self::new();
        for period in iter {
            registry.insert(period);
        }
        registry
    }
}
