//! # quotaslice
//!
//! A usage-window tracker for enforcing API request quotas.
//!
//! ## Overview
//!
//! quotaslice counts how many requests a consumer has made within a
//! configured period and decides whether the next one is admitted:
//! - **Calendar-aligned periods**: quotas renew at the start of each UTC
//!   second, minute, hour or day (or a multiple of one)
//! - **Rolling periods**: admissions age out one period after they happened
//! - **Sliced history**: usage is recorded per granularity window, so a
//!   daily quota can be inspected hour by hour
//! - **Deterministic time**: the current instant comes from an injectable
//!   [`Clock`]
//!
//! ## Quick Start
//!
//! ```
//! use quotaslice::{PeriodConfig, UsagePeriod};
//!
//! // 1000 requests per calendar day, tracked per hour
//! let config = PeriodConfig::new("partner-api", "DAY", 1000)
//!     .with_granularity("HOUR")
//!     .clock_aligned(true);
//!
//! let mut period = UsagePeriod::new(config)?;
//!
//! if period.allowed() {
//!     println!("Request admitted, {} left today", period.remaining());
//! } else {
//!     println!("Quota exhausted until {:?}", period.reset_at());
//! }
//! # Ok::<(), quotaslice::ValidationError>(())
//! ```
//!
//! ## Testing With Scripted Time
//!
//! ```
//! use chrono::{TimeDelta, TimeZone, Utc};
//! use quotaslice::{PeriodConfig, ScriptedClock, UsagePeriod};
//!
//! let clock = ScriptedClock::starting_at(Utc.with_ymd_and_hms(2024, 1, 1, 23, 59, 0).unwrap());
//! let config = PeriodConfig::new("batch", "DAY", 1).clock_aligned(true);
//! let mut period = UsagePeriod::with_clock(config, clock.clone())?;
//!
//! assert!(period.allowed());
//! assert!(!period.allowed());
//!
//! clock.advance(TimeDelta::minutes(2));
//! assert!(period.allowed());
//! # Ok::<(), quotaslice::ValidationError>(())
//! ```
//!
//! ## Thread Safety
//!
//! A [`UsagePeriod`] is mutated by every check and is not internally
//! synchronised. For concurrent access, wrap it in a mutex or give it to a
//! single owning task:
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use quotaslice::{PeriodConfig, UsagePeriod};
//!
//! let period = UsagePeriod::new(PeriodConfig::new("shared", "MINUTE", 60)).unwrap();
//! let period = Arc::new(Mutex::new(period));
//! ```
//!
//! ## Features
//!
//! - `ahash` (default): Use AHash for the subject map in [`QuotaRegistry`]

pub mod core;

pub use core::{
    Clock, PeriodConfig, PeriodPolicy, QuotaRegistry, ScriptedClock, SliceChain, SystemClock,
    TIME_QUANTUM, TimeSlice, TimeUnit, UsagePeriod, UsageSnapshot, ValidationError,
    aligned_bounds,
};
