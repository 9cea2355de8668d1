//! # quotaslice Server
//!
//! A standalone quota enforcement service built on the [`quotaslice`]
//! usage-window tracker.
//!
//! ## Purpose
//!
//! Each API consumer or rule is a *quota subject* with its own usage period.
//! Callers such as an API gateway ask the server, once per incoming request,
//! whether the request fits in the subject's quota.
//!
//! ## Quick Start
//!
//! ```bash
//! # Serve the rules in rules.toml over HTTP on port 8080
//! quotaslice --http --http-port 8080 --rules rules.toml
//!
//! # Keep serving the valid subjects even if some rules are broken
//! quotaslice --http --rules rules.yaml --strict false
//!
//! # List all available environment variables
//! quotaslice --list-env-vars
//! ```
//!
//! ## Rules
//!
//! ```toml
//! [search.timePeriod]
//! mode = "ROLLING"
//! unit = "MINUTE"
//! requestLimit = 100
//!
//! [reports.timePeriod]
//! mode = "CLOCK_ALIGNED"
//! unit = "DAY"
//! requestLimit = 1000
//! granularity = "HOUR"
//! ```
//!
//! Every invalid field of every subject is logged before the server decides
//! whether to start.
//!
//! ## Architecture
//!
//! ```text
//!                    ┌─────────────┐
//!                    │    HTTP     │
//!                    │  Transport  │
//!                    └──────┬──────┘
//!                           │
//!                     ┌─────▼─────┐
//!                     │   Actor   │
//!                     │ (single   │
//!                     │  owner)   │
//!                     └─────┬─────┘
//!                           │
//!                     ┌─────▼─────┐
//!                     │  Quota    │
//!                     │ Registry  │
//!                     └───────────┘
//! ```
//!
//! The actor owns every usage period, so checks against one subject are
//! strictly serialised while the transports stay fully concurrent.
//!
//! ## Usage
//!
//! ```bash
//! curl -X POST http://localhost:8080/check/search
//! curl http://localhost:8080/usage/search
//! curl -X POST http://localhost:8080/reset/search
//! curl http://localhost:8080/metrics
//! ```

pub mod actor;
pub mod config;
pub mod metrics;
pub mod rules;
pub mod transport;
pub mod types;
