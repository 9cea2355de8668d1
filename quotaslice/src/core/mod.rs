//! Core components of the quotaslice usage tracker
//!
//! This module contains the fundamental building blocks:
//! - [`unit`]: Calendar time units and window boundaries
//! - [`clock`]: Injectable sources of the current instant
//! - [`slice`]: Time slices and the chain that records them
//! - [`period`]: The usage period and its admission decision
//! - [`registry`]: Usage periods keyed by quota subject

pub mod clock;
pub mod period;
pub mod registry;
pub mod slice;
pub mod unit;

pub use clock::{Clock, ScriptedClock, SystemClock};
pub use period::{PeriodConfig, PeriodPolicy, UsagePeriod, UsageSnapshot};
pub use registry::QuotaRegistry;
pub use slice::{SliceChain, TimeSlice};
pub use unit::{TIME_QUANTUM, TimeUnit, aligned_bounds};

/// Errors raised while validating a usage period configuration
///
/// # Example
///
/// ```
/// use quotaslice::{PeriodConfig, ValidationError};
///
/// let mut config = PeriodConfig::new("bad name", "DAY", 10);
/// assert!(matches!(
///     config.initialise(),
///     Err(ValidationError::NameContainsWhitespace(_))
/// ));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("a usage period must have a name")]
    MissingName,

    #[error("usage period name {0:?} must not contain whitespace")]
    NameContainsWhitespace(String),

    #[error("no such supported time unit {0:?}")]
    UnknownUnit(String),

    #[error("granularity {granularity} is coarser than the period unit {unit}")]
    GranularityTooCoarse {
        granularity: TimeUnit,
        unit: TimeUnit,
    },

    #[error("unit multiple must be unset or >= 1 (is {0})")]
    NegativeMultiple(i64),

    #[error("unit multiple {0} makes the period too long")]
    MultipleOutOfRange(i64),

    #[error("limit must be greater than zero (is {0})")]
    NonPositiveLimit(i64),
}
