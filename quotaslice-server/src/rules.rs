//! Quota rule loading
//!
//! A rules file maps each quota subject to a `timePeriod` block:
//!
//! ```toml
//! [search.timePeriod]
//! mode = "ROLLING"          # or CLOCK_ALIGNED
//! unit = "MINUTE"           # SECOND, MINUTE, HOUR or DAY
//! requestLimit = 100
//! quantity = 5              # optional, defaults to 1
//! granularity = "SECOND"    # optional, defaults to unit
//! ```
//!
//! Every subject is checked and every bad field is reported; loading never
//! stops at the first problem. Subjects that pass are returned ready to serve.

use anyhow::Result;
use quotaslice::{Clock, PeriodConfig, TimeUnit, UsagePeriod, ValidationError};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;

const TIME_PERIOD: &str = "timePeriod";
const ALIGNED_MODE: &str = "CLOCK_ALIGNED";
const ROLLING_MODE: &str = "ROLLING";

/// Raw rules keyed by subject name
pub type RawRules = BTreeMap<String, Value>;

/// A problem with one subject's rule
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuleError {
    #[error("no timePeriod config block defined for {subject}")]
    MissingBlock { subject: String },

    #[error("{subject}.timePeriod must be a table of settings")]
    NotATable { subject: String },

    #[error("{subject}.timePeriod.{field} {problem}")]
    InvalidField {
        subject: String,
        field: &'static str,
        problem: String,
    },

    #[error("{subject}: {source}")]
    Rejected {
        subject: String,
        source: ValidationError,
    },
}

/// Outcome of loading a set of rules
#[derive(Debug)]
pub struct LoadReport<C: Clock> {
    /// Usage periods for every subject whose rule is valid
    pub periods: Vec<UsagePeriod<C>>,
    /// Every problem found, across all subjects
    pub errors: Vec<RuleError>,
}

impl<C: Clock> LoadReport<C> {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Read raw rules from a file, picking the format from its extension
pub fn read_rules_file(path: &Path) -> Result<RawRules> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path))
        .build()?;
    Ok(settings.try_deserialize()?)
}

/// Read raw rules from an in-memory document
pub fn parse_rules(source: &str, format: config::FileFormat) -> Result<RawRules> {
    let settings = config::Config::builder()
        .add_source(config::File::from_str(source, format))
        .build()?;
    Ok(settings.try_deserialize()?)
}

/// Validate every rule and build usage periods for the valid ones
///
/// Each period gets its own clone of `clock`.
pub fn load_rules<C: Clock + Clone>(rules: &RawRules, clock: C) -> LoadReport<C> {
    let mut report = LoadReport {
        periods: Vec::new(),
        errors: Vec::new(),
    };

    for (subject, rule) in rules {
        tracing::debug!("Parsing rule for {}", subject);

        let config = match period_config(subject, rule) {
            Ok(config) => config,
            Err(errors) => {
                report.errors.extend(errors);
                continue;
            }
        };

        match UsagePeriod::with_clock(config, clock.clone()) {
            Ok(period) => report.periods.push(period),
            Err(source) => report.errors.push(RuleError::Rejected {
                subject: subject.clone(),
                source,
            }),
        }
    }

    report
}

fn period_config(subject: &str, rule: &Value) -> Result<PeriodConfig, Vec<RuleError>> {
    let block = match rule.as_object().and_then(|table| field(table, TIME_PERIOD)) {
        None | Some(Value::Null) => {
            return Err(vec![RuleError::MissingBlock {
                subject: subject.to_string(),
            }]);
        }
        Some(Value::Object(block)) => block,
        Some(_) => {
            return Err(vec![RuleError::NotATable {
                subject: subject.to_string(),
            }]);
        }
    };

    let mut errors = Vec::new();
    let mut invalid = |field: &'static str, problem: String| {
        errors.push(RuleError::InvalidField {
            subject: subject.to_string(),
            field,
            problem,
        });
    };

    let clock_aligned = match field(block, "mode").and_then(Value::as_str) {
        None => {
            invalid("mode", "not defined (or value is not a string)".into());
            None
        }
        Some(ALIGNED_MODE) => Some(true),
        Some(ROLLING_MODE) => Some(false),
        Some(other) => {
            invalid(
                "mode",
                format!("can only be {ROLLING_MODE} or {ALIGNED_MODE} (is {other})"),
            );
            None
        }
    };

    let unit = unit_field(block, "unit", &mut invalid, true);
    let granularity = unit_field(block, "granularity", &mut invalid, false);

    let limit = match field(block, "requestLimit") {
        None | Some(Value::Null) => {
            invalid(
                "requestLimit",
                "not defined (or value is not a positive integer)".into(),
            );
            None
        }
        Some(value) => match value.as_i64() {
            Some(limit) if limit > 0 => Some(limit),
            _ => {
                invalid("requestLimit", "must be a positive integer".into());
                None
            }
        },
    };

    let quantity = match field(block, "quantity") {
        None | Some(Value::Null) => Some(1),
        Some(value) => match value.as_i64() {
            Some(quantity) if quantity > 0 => Some(quantity),
            _ => {
                invalid("quantity", "must be a positive integer if set".into());
                None
            }
        },
    };

    match (clock_aligned, unit, granularity, limit, quantity) {
        (Some(clock_aligned), Some(Some(unit)), Some(granularity), Some(limit), Some(quantity))
            if errors.is_empty() =>
        {
            Ok(PeriodConfig {
                name: subject.to_string(),
                unit: unit.label().to_string(),
                granularity: granularity.map(|g| g.label().to_string()),
                unit_multiple: quantity,
                clock_aligned,
                limit,
            })
        }
        _ => Err(errors),
    }
}

/// Extract an optional or required unit label
///
/// Returns `None` when the field is invalid, `Some(None)` when an optional
/// field is absent.
fn unit_field(
    block: &Map<String, Value>,
    name: &'static str,
    invalid: &mut impl FnMut(&'static str, String),
    required: bool,
) -> Option<Option<TimeUnit>> {
    match field(block, name) {
        None | Some(Value::Null) if !required => Some(None),
        None | Some(Value::Null) => {
            invalid(name, "not defined (or value is not a string)".into());
            None
        }
        Some(value) => match value.as_str().map(str::parse::<TimeUnit>) {
            Some(Ok(unit)) => Some(Some(unit)),
            Some(Err(_)) | None => {
                let labels: Vec<&str> = TimeUnit::ALL.iter().rev().map(|u| u.label()).collect();
                let shown = value.as_str().map_or_else(|| value.to_string(), str::to_string);
                invalid(
                    name,
                    format!("can only be {} (is {})", labels.join(", "), shown),
                );
                None
            }
        },
    }
}

/// Case-insensitive key lookup; some rule file formats fold key case
fn field<'a>(table: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    table.get(name).or_else(|| {
        table
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    })
}
