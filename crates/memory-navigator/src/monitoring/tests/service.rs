use std::sync::Arc;

use super::common::*;
use crate::monitoring::domain::EventType;
use crate::monitoring::evaluation::{EvaluationConfig, FactorKind, RiskTier};
use crate::monitoring::ingestion::{EventPayload, TelemetryPayload};
use crate::monitoring::repository::AlertSource;
use crate::monitoring::service::{MonitoringService, MonitoringServiceError};

fn telemetry(north_meters: &[f64], heart_rate: i64) -> TelemetryPayload {
    serde_json::from_value(telemetry_body(north_meters, heart_rate)).expect("payload parses")
}

fn event(event_type: &str, north_meters: f64) -> EventPayload {
    serde_json::from_value(event_body(event_type, north_meters)).expect("payload parses")
}

#[test]
fn service_requires_a_profile_before_evaluating() {
    let (service, _, alerts) = build_service();

    let error = service
        .ingest_telemetry(telemetry(&[10.0], 70))
        .expect_err("profile missing");

    match error {
        MonitoringServiceError::ConfigurationMissing(subject_id) => {
            assert_eq!(subject_id, subject());
        }
        other => panic!("expected missing configuration, got {other:?}"),
    }
    assert!(alerts.events().is_empty());
}

#[test]
fn service_evaluates_each_record_in_order() {
    let (service, alerts) = configured_service();

    let assessment = service
        .ingest_telemetry(telemetry(&[10.0, 450.0, 750.0], 70))
        .expect("batch evaluated");

    let tiers = assessment
        .results
        .iter()
        .map(|result| result.tier)
        .collect::<Vec<_>>();
    assert_eq!(
        tiers,
        vec![RiskTier::Safe, RiskTier::Safe, RiskTier::Critical]
    );

    let events = alerts.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].tier, RiskTier::Critical);
    assert_eq!(events[0].source, AlertSource::Telemetry);
    assert_eq!(events[0].subject_id, subject());
}

#[test]
fn service_rejects_invalid_records_without_alerting() {
    let (service, alerts) = configured_service();

    let error = service
        .ingest_telemetry(telemetry(&[10.0], -5))
        .expect_err("negative heart rate rejected");

    assert!(matches!(error, MonitoringServiceError::Validation(_)));
    assert!(alerts.events().is_empty());
}

#[test]
fn service_uses_the_latest_profile() {
    let (service, _) = configured_service();
    let first = service
        .ingest_telemetry(telemetry(&[750.0], 70))
        .expect("evaluated");
    assert_eq!(first.results[0].tier, RiskTier::Critical);

    service
        .upsert_profile(subject(), profile(1_000.0, false))
        .expect("profile updated");
    let second = service
        .ingest_telemetry(telemetry(&[750.0], 70))
        .expect("evaluated");
    assert_eq!(second.results[0].tier, RiskTier::Safe);
}

#[test]
fn removed_profiles_stop_evaluation() {
    let (service, _) = configured_service();
    service.remove_profile(&subject()).expect("profile removed");

    assert!(matches!(
        service.profile(&subject()),
        Err(MonitoringServiceError::ConfigurationMissing(_))
    ));
    assert!(matches!(
        service.remove_profile(&subject()),
        Err(MonitoringServiceError::ConfigurationMissing(_))
    ));
}

#[test]
fn fall_events_raise_critical_alerts() {
    let (service, alerts) = configured_service();

    let (event, result) = service
        .ingest_event(event("FALL_DETECTED", 0.0))
        .expect("event evaluated");

    assert_eq!(event.event_type, EventType::FallDetected);
    assert_eq!(result.tier, RiskTier::Critical);
    let events = alerts.events();
    assert_eq!(events.len(), 1);
    assert_eq!(
        events[0].source,
        AlertSource::Event(EventType::FallDetected)
    );
}

#[test]
fn door_open_marks_the_next_breach_only() {
    let (service, alerts) = configured_service();

    let (_, door) = service
        .ingest_event(event("DOOR_OPEN", 0.0))
        .expect("event evaluated");
    assert_eq!(door.tier, RiskTier::Safe);
    assert!(alerts.events().is_empty());

    let breach = service
        .ingest_telemetry(telemetry(&[750.0, 800.0], 70))
        .expect("evaluated");
    assert!(breach.results[0].has_factor(FactorKind::DoorOpenBeforeBreach));
    assert!(!breach.results[1].has_factor(FactorKind::DoorOpenBeforeBreach));
    assert_eq!(breach.results[0].score, 100);
}

#[test]
fn door_open_followed_by_safe_sample_is_cleared() {
    let (service, _) = configured_service();

    service
        .ingest_event(event("DOOR_OPEN", 0.0))
        .expect("event evaluated");
    let quiet = service
        .ingest_telemetry(telemetry(&[10.0, 750.0], 70))
        .expect("evaluated");

    assert!(!quiet.results[0].has_factor(FactorKind::DoorOpenBeforeBreach));
    assert!(!quiet.results[1].has_factor(FactorKind::DoorOpenBeforeBreach));
}

#[test]
fn repository_failures_surface_as_errors() {
    let service = MonitoringService::new(
        Arc::new(UnavailableProfiles),
        Arc::new(MemoryAlerts::default()),
        EvaluationConfig::default(),
    );

    let error = service
        .ingest_telemetry(telemetry(&[10.0], 70))
        .expect_err("store unavailable");

    assert!(matches!(error, MonitoringServiceError::Repository(_)));
}

#[test]
fn concurrent_batches_evaluate_independently() {
    let (service, alerts) = configured_service();
    let service = Arc::new(service);

    let handles = (0..8)
        .map(|index| {
            let service = Arc::clone(&service);
            std::thread::spawn(move || {
                let meters = if index % 2 == 0 { 10.0 } else { 900.0 };
                service
                    .ingest_telemetry(telemetry(&[meters], 70))
                    .expect("evaluated")
                    .results[0]
                    .tier
            })
        })
        .collect::<Vec<_>>();

    let tiers = handles
        .into_iter()
        .map(|handle| handle.join().expect("thread finished"))
        .collect::<Vec<_>>();

    for (index, tier) in tiers.iter().enumerate() {
        let expected = if index % 2 == 0 {
            RiskTier::Safe
        } else {
            RiskTier::Critical
        };
        assert_eq!(*tier, expected);
    }
    assert_eq!(alerts.events().len(), 4);
}

#[test]
fn failed_alert_delivery_does_not_abort_the_batch() {
    let (service, alerts) = flaky_service(1);

    service
        .ingest_event(event("DOOR_OPEN", 0.0))
        .expect("door event evaluated");
    let assessment = service
        .ingest_telemetry(telemetry(&[750.0, 800.0, 10.0], 70))
        .expect("batch evaluated despite delivery failure");

    assert_eq!(assessment.results.len(), 3);
    assert_eq!(assessment.results[2].tier, RiskTier::Safe);
    assert!(assessment.results[0].has_factor(FactorKind::DoorOpenBeforeBreach));
    assert_eq!(assessment.undelivered_alerts, vec![0]);

    let delivered = alerts.events();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].tier, RiskTier::Critical);
}

#[test]
fn event_alert_failures_surface_as_errors() {
    let (service, alerts) = flaky_service(1);

    let error = service
        .ingest_event(event("SOS_BUTTON", 0.0))
        .expect_err("delivery failed");

    assert!(matches!(error, MonitoringServiceError::Alert(_)));
    assert!(alerts.events().is_empty());
}

#[test]
fn delivered_batches_report_no_undelivered_alerts() {
    let (service, _) = configured_service();

    let assessment = service
        .ingest_telemetry(telemetry(&[750.0, 10.0], 70))
        .expect("evaluated");

    assert!(assessment.undelivered_alerts.is_empty());
}
