use chrono::{TimeDelta, TimeZone, Utc};
use quotaslice::{QuotaRegistry, ScriptedClock, TimeUnit};
use quotaslice_server::actor::QuotaActor;
use quotaslice_server::rules::{load_rules, parse_rules, read_rules_file};
use std::path::Path;

fn example_rules() -> quotaslice_server::rules::RawRules {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("rules.example.toml");
    read_rules_file(&path).unwrap()
}

#[test]
fn test_example_rules_load_cleanly() {
    let report = load_rules(&example_rules(), ScriptedClock::new([]));

    assert!(report.is_clean(), "{:?}", report.errors);
    assert_eq!(report.periods.len(), 3);

    let export = report
        .periods
        .iter()
        .find(|p| p.name() == "bulk-export")
        .unwrap();
    assert_eq!(export.policy().unit, TimeUnit::Hour);
    assert_eq!(export.policy().unit_multiple, 6);
    assert_eq!(export.policy().period_duration, TimeDelta::hours(6));
}

#[test]
fn test_missing_rules_file_is_an_error() {
    assert!(read_rules_file(Path::new("/nonexistent/quotaslice/rules.toml")).is_err());
}

#[test]
fn test_yaml_rules_with_errors_keep_valid_subjects() {
    let rules = parse_rules(
        r#"
search:
  timePeriod:
    mode: ROLLING
    unit: SECOND
    requestLimit: 3
broken:
  timePeriod:
    mode: EVENTUALLY
    unit: YEAR
    requestLimit: -1
"#,
        config::FileFormat::Yaml,
    )
    .unwrap();

    let report = load_rules(&rules, ScriptedClock::new([]));
    assert_eq!(report.periods.len(), 1);
    assert_eq!(report.periods[0].name(), "search");
    assert_eq!(report.errors.len(), 3);
    assert!(
        report
            .errors
            .iter()
            .all(|e| e.to_string().starts_with("broken.timePeriod."))
    );
}

#[tokio::test]
async fn test_loaded_rules_served_by_actor() {
    let clock = ScriptedClock::starting_at(Utc.with_ymd_and_hms(2024, 6, 3, 5, 0, 0).unwrap());
    let report = load_rules(&example_rules(), clock.clone());
    let registry: QuotaRegistry<ScriptedClock> = report.periods.into_iter().collect();
    let quotas = QuotaActor::spawn(64, registry);

    for _ in 0..10 {
        assert!(quotas.check("bulk-export").await.unwrap().unwrap().allowed);
    }
    let refused = quotas.check("bulk-export").await.unwrap().unwrap();
    assert!(!refused.allowed);
    assert_eq!(
        refused.reset_at,
        Some(Utc.with_ymd_and_hms(2024, 6, 3, 11, 0, 0).unwrap() - TimeDelta::nanoseconds(1))
    );

    clock.advance(TimeDelta::hours(6));
    assert!(quotas.check("bulk-export").await.unwrap().unwrap().allowed);
}
