#![allow(clippy::unwrap_used)]
// `HttpPodClient` and the coordinator against a wiremock free-sleep server.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use freesleep_core::{
    Clock, Command, Coordinator, CoordinatorConfig, CoreError, HttpPodClient, ManualClock, PodAction,
    PodClient, Side, TapAction, ThermalMode, VibrationPattern, WaterLevel,
};

// ── Fixtures ────────────────────────────────────────────────────────

fn config_for(server: &MockServer) -> CoordinatorConfig {
    let addr = server.address();
    CoordinatorConfig {
        port: addr.port(),
        ..CoordinatorConfig::for_host(addr.ip().to_string())
    }
}

fn week(time: &str) -> Value {
    let alarm = json!({
        "alarm": {
            "time": time,
            "enabled": true,
            "vibrationIntensity": 40,
            "vibrationPattern": "rise",
            "duration": 20
        }
    });
    json!({
        "monday": alarm, "tuesday": alarm, "wednesday": alarm, "thursday": alarm,
        "friday": alarm, "saturday": alarm, "sunday": alarm
    })
}

async fn mount_json(server: &MockServer, route: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn device_status() -> Value {
    json!({
        "left": {
            "currentTemperatureF": 76.5,
            "targetTemperatureF": 82,
            "secondsRemaining": 3600,
            "isAlarmVibrating": false,
            "isOn": true
        },
        "right": {
            "currentTemperatureF": 74,
            "targetTemperatureF": 70,
            "secondsRemaining": 0,
            "isAlarmVibrating": false,
            "isOn": false
        },
        "waterLevel": "true",
        "isPriming": false,
        "settings": { "v": 1, "gainLeft": 400, "gainRight": 400, "ledBrightness": 60 },
        "coverVersion": "Pod 4",
        "hubVersion": "Pod 4",
        "freeSleep": { "version": "2.3.1", "branch": "main" },
        "wifiStrength": 72
    })
}

/// Mount every required read endpoint. Metrics and server status are left
/// to each test.
async fn mount_pod(server: &MockServer) {
    mount_pod_with(server, device_status()).await;
}

async fn mount_pod_with(server: &MockServer, device: Value) {
    mount_json(server, "/api/deviceStatus", device).await;
    mount_json(
        server,
        "/api/settings",
        json!({
            "timeZone": "America/New_York",
            "left": {
                "name": "Alex",
                "awayMode": false,
                "taps": {
                    "doubleTap": { "type": "temperature", "change": "increment", "amount": 1 },
                    "tripleTap": {
                        "type": "alarm",
                        "behavior": "snooze",
                        "snoozeDuration": 60,
                        "inactiveAlarmBehavior": "power"
                    }
                }
            },
            "right": {
                "name": "",
                "awayMode": true,
                "scheduleOverrides": {
                    "alarm": {
                        "disabled": true,
                        "timeOverride": "",
                        "expiresAt": "2024-06-11T06:17:00-04:00"
                    },
                    "temperatureSchedules": { "disabled": false, "expiresAt": "" }
                }
            },
            "primePodDaily": { "enabled": true, "time": "14:00" },
            "rebootDaily": true
        }),
    )
    .await;
    mount_json(
        server,
        "/api/metrics/presence",
        json!({ "left": { "present": true }, "right": { "present": false } }),
    )
    .await;
    mount_json(
        server,
        "/api/schedules",
        json!({ "left": week("07:00"), "right": week("06:15") }),
    )
    .await;
    mount_json(server, "/api/services", json!({ "biometrics": { "enabled": true } })).await;
}

// ── Reads ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_fetch_snapshot_assembles_all_endpoints() {
    let server = MockServer::start().await;
    mount_pod(&server).await;
    mount_json(
        &server,
        "/api/metrics/vitals/summary",
        json!({ "avgHeartRate": 58.2, "avgHRV": 41.0, "avgBreathingRate": 14.1 }),
    )
    .await;
    mount_json(
        &server,
        "/api/metrics/sleep",
        json!([{
            "id": 7,
            "side": "left",
            "entered_bed_at": "2024-06-09T23:10:00Z",
            "left_bed_at": "2024-06-10T06:40:00Z",
            "sleep_period_seconds": 27000,
            "times_exited_bed": 2
        }]),
    )
    .await;
    mount_json(
        &server,
        "/api/serverStatus",
        json!({
            "franken": { "status": "healthy" },
            "database": { "status": "healthy", "message": "ok" }
        }),
    )
    .await;

    let client = HttpPodClient::from_config(&config_for(&server)).unwrap();
    let snapshot = client.fetch_snapshot().await.unwrap();

    assert_eq!(snapshot.pod.water_level, WaterLevel::Ok);
    assert_eq!(snapshot.pod.led_brightness, 60);
    assert_eq!(snapshot.pod.server_version, "2.3.1");
    assert!(snapshot.pod.reboot_daily);
    assert_eq!(snapshot.pod.prime_daily.time, "14:00");
    assert_eq!(
        snapshot.pod.server_health.as_ref().unwrap().get("database"),
        Some(&"healthy".to_owned())
    );

    assert_eq!(snapshot.left.name.as_deref(), Some("Alex"));
    assert_eq!(snapshot.left.mode, ThermalMode::Heating);
    assert_eq!(snapshot.left.taps.double, Some(TapAction::IncreaseTemperature));
    assert_eq!(snapshot.left.taps.triple, Some(TapAction::SnoozeAlarm));
    assert_eq!(snapshot.left.taps.quad, None);
    assert_eq!(snapshot.right.name, None);
    assert!(snapshot.right.away_mode);
    assert!(!snapshot.right.present);
    assert!(snapshot.right.alarm_disabled_tonight);
    assert!(!snapshot.right.temp_schedules_disabled_tonight);
    assert!(!snapshot.left.alarm_disabled_tonight);
    assert_eq!(snapshot.right.mode, ThermalMode::Idle);
    assert_eq!(snapshot.right.schedule.monday.alarm.time, "06:15");
    assert_eq!(
        snapshot.right.schedule.monday.alarm.vibration_pattern,
        VibrationPattern::Rise
    );

    let hr = snapshot.left.vitals.avg_heart_rate.unwrap();
    assert!((hr.value - 58.2).abs() < f64::EPSILON);
    assert_eq!(
        hr.sampled_at,
        Utc.with_ymd_and_hms(2024, 6, 10, 6, 40, 0).unwrap()
    );
    assert_eq!(snapshot.left.vitals.times_exited_bed.unwrap().value, 2);
}

#[tokio::test]
async fn test_optional_endpoint_failures_do_not_fail_poll() {
    let server = MockServer::start().await;
    mount_pod(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/metrics/vitals/summary"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/serverStatus"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    // Sleep records are unmounted: wiremock answers 404.

    let client = HttpPodClient::from_config(&config_for(&server)).unwrap();
    let snapshot = client.fetch_snapshot().await.unwrap();

    assert!(snapshot.left.vitals.is_empty());
    assert!(snapshot.right.vitals.is_empty());
    assert_eq!(snapshot.pod.server_health, None);
}

#[tokio::test]
async fn test_required_endpoint_failure_fails_poll() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/deviceStatus"))
        .respond_with(ResponseTemplate::new(503).set_body_string("franken down"))
        .mount(&server)
        .await;

    let client = HttpPodClient::from_config(&config_for(&server)).unwrap();
    let err = client.fetch_snapshot().await.unwrap_err();
    assert!(matches!(err, CoreError::HttpError { .. }), "{err:?}");
}

#[tokio::test]
async fn test_missing_required_field_is_malformed() {
    let server = MockServer::start().await;
    let mut device = device_status();
    device["left"].as_object_mut().unwrap().remove("targetTemperatureF");
    mount_pod_with(&server, device).await;

    let client = HttpPodClient::from_config(&config_for(&server)).unwrap();
    let err = client.fetch_snapshot().await.unwrap_err();
    assert!(matches!(err, CoreError::MalformedResponse { .. }), "{err:?}");
}

#[tokio::test]
async fn test_unknown_water_level_is_malformed() {
    let server = MockServer::start().await;
    let mut device = device_status();
    device["waterLevel"] = json!("maybe");
    mount_pod_with(&server, device).await;

    let client = HttpPodClient::from_config(&config_for(&server)).unwrap();
    let err = client.fetch_snapshot().await.unwrap_err();
    assert!(matches!(err, CoreError::MalformedResponse { .. }), "{err:?}");
}

// ── Coordinator over HTTP ───────────────────────────────────────────

fn coordinator_for(server: &MockServer) -> Coordinator {
    let config = config_for(server);
    let now = DateTime::parse_from_rfc3339("2024-06-10T21:00:00-04:00").unwrap();
    let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(now));
    let client = HttpPodClient::from_config(&config)
        .unwrap()
        .with_clock(Arc::clone(&clock));
    Coordinator::with_client(config, Arc::new(client), clock).unwrap()
}

#[tokio::test]
async fn test_vitals_window_ends_at_coordinator_clock() {
    let server = MockServer::start().await;
    mount_pod(&server).await;
    // 21:00 New York is 01:00 UTC the next day; the window reaches back 12h.
    for route in ["/api/metrics/vitals/summary", "/api/metrics/sleep"] {
        let body = if route.ends_with("sleep") {
            json!([])
        } else {
            json!({ "avgHeartRate": 61.0 })
        };
        Mock::given(method("GET"))
            .and(path(route))
            .and(query_param("side", "left"))
            .and(query_param("startTime", "2024-06-10T13:00:00Z"))
            .and(query_param("endTime", "2024-06-11T01:00:00Z"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(&server)
            .await;
    }

    let coordinator = coordinator_for(&server);
    coordinator.refresh_now().await.unwrap();
    assert!(coordinator.state().available);
}

#[tokio::test]
async fn test_skip_alarm_tonight_posts_override() {
    let server = MockServer::start().await;
    mount_pod(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/settings"))
        .and(body_json(json!({
            "left": {
                "scheduleOverrides": {
                    "alarm": {
                        "disabled": true,
                        "timeOverride": "",
                        "expiresAt": "2024-06-11T07:02:00-04:00"
                    }
                }
            }
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let coordinator = coordinator_for(&server);
    coordinator.refresh_now().await.unwrap();
    coordinator
        .dispatch(Command::SetAlarmDisabledTonight {
            side: Side::Left,
            disabled: true,
        })
        .await
        .unwrap();

    let state = coordinator.state();
    assert!(state.snapshot.as_ref().unwrap().left.alarm_disabled_tonight);
}

#[tokio::test]
async fn test_trigger_alarm_does_not_force() {
    let server = MockServer::start().await;
    mount_pod(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/alarm"))
        .and(body_json(json!({
            "side": "right",
            "vibrationIntensity": 80,
            "vibrationPattern": "double",
            "duration": 30,
            "force": false
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let coordinator = coordinator_for(&server);
    coordinator
        .run_action(PodAction::TriggerAlarm {
            side: Side::Right,
            vibration_intensity: 80,
            vibration_pattern: VibrationPattern::Double,
            duration_secs: 30,
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn test_dispatch_posts_partial_update() {
    let server = MockServer::start().await;
    mount_pod(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/deviceStatus"))
        .and(body_json(json!({ "left": { "targetTemperatureF": 75 } })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let coordinator = coordinator_for(&server);
    coordinator.refresh_now().await.unwrap();
    coordinator
        .dispatch(Command::SetTargetTemperature {
            side: Side::Left,
            temperature_f: 75,
        })
        .await
        .unwrap();

    let state = coordinator.state();
    assert_eq!(state.snapshot.as_ref().unwrap().left.target_temperature_f, 75);
    assert_eq!(coordinator.pending_commands().await.len(), 1);
}

#[tokio::test]
async fn test_rejected_write_reverts() {
    let server = MockServer::start().await;
    mount_pod(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/settings"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad awayMode"))
        .mount(&server)
        .await;

    let coordinator = coordinator_for(&server);
    coordinator.refresh_now().await.unwrap();
    let err = coordinator
        .dispatch(Command::SetAwayMode {
            side: Side::Left,
            away: true,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::HttpError { status: 400, .. }), "{err:?}");
    assert!(!coordinator.state().snapshot.as_ref().unwrap().left.away_mode);
}

#[tokio::test]
async fn test_reboot_posts_job_and_refreshes() {
    let server = MockServer::start().await;
    mount_pod(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/jobs"))
        .and(body_json(json!(["reboot"])))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let coordinator = coordinator_for(&server);
    coordinator.run_action(PodAction::Reboot).await.unwrap();
    assert!(coordinator.state().available);
}
