// Shared fixtures for unit tests.

use crate::model::{
    Alarm, DaySchedule, PodSnapshot, PodStatus, PrimeDaily, SideSnapshot, TapActions,
    ThermalMode, VibrationPattern, Vitals, WaterLevel, WeeklySchedule,
};

pub(crate) fn alarm(time: &str) -> Alarm {
    Alarm {
        time: time.into(),
        enabled: true,
        vibration_intensity: 50,
        vibration_duration: 10,
        vibration_pattern: VibrationPattern::Rise,
        alarm_temperature_f: None,
    }
}

pub(crate) fn side() -> SideSnapshot {
    let day = |t: &str| DaySchedule { alarm: alarm(t) };
    SideSnapshot {
        name: None,
        is_on: true,
        target_temperature_f: 80,
        current_temperature_f: 78.0,
        mode: ThermalMode::Heating,
        away_mode: false,
        present: false,
        alarm_vibrating: false,
        alarm_disabled_tonight: false,
        temp_schedules_disabled_tonight: false,
        vitals: Vitals::default(),
        schedule: WeeklySchedule {
            monday: day("07:00"),
            tuesday: day("07:30"),
            wednesday: day("07:00"),
            thursday: day("07:00"),
            friday: day("07:00"),
            saturday: day("09:00"),
            sunday: day("09:00"),
        },
        taps: TapActions::default(),
    }
}

pub(crate) fn snapshot() -> PodSnapshot {
    PodSnapshot {
        pod: PodStatus {
            water_level: WaterLevel::Ok,
            wifi_strength: 70,
            cover_version: "Pod 4".into(),
            hub_version: "Pod 4".into(),
            server_version: "2.3.1".into(),
            server_branch: Some("main".into()),
            is_priming: false,
            led_brightness: 50,
            prime_daily: PrimeDaily {
                enabled: false,
                time: "14:00".into(),
            },
            biometrics_enabled: true,
            reboot_daily: false,
            server_health: None,
        },
        left: side(),
        right: side(),
    }
}
