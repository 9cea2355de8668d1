//! Common types used across the server
//!
//! Responses returned by the actor and serialised as-is by the transports.

use chrono::{DateTime, Utc};
use quotaslice::{Clock, UsagePeriod};
use serde::{Deserialize, Serialize};

/// Admission decision for one request
///
/// # Example
///
/// ```json
/// {
///   "subject": "search",
///   "allowed": false,
///   "limit": 100,
///   "remaining": 0,
///   "reset_at": "2024-06-03T23:59:59.999999999Z"
/// }
/// ```
///
/// `reset_at` is only present for clock-aligned periods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResponse {
    /// Quota subject the request was counted against
    pub subject: String,
    /// Whether the request is admitted
    pub allowed: bool,
    /// Admissions allowed per period
    pub limit: u64,
    /// Admissions left in the current period
    pub remaining: u64,
    /// When the quota next renews
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_at: Option<DateTime<Utc>>,
}

impl CheckResponse {
    pub fn from_period<C: Clock>(allowed: bool, period: &UsagePeriod<C>) -> Self {
        CheckResponse {
            subject: period.name().to_string(),
            allowed,
            limit: period.limit(),
            remaining: period.remaining(),
            reset_at: period.reset_at(),
        }
    }
}
