//! Status command handler.

use tabled::Tabled;

use freesleep_core::{DerivedState, MergedState, PodSnapshot, Side};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output::{self, Painter};

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct SideRow {
    #[tabled(rename = "Side")]
    side: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Power")]
    power: String,
    #[tabled(rename = "Target")]
    target: String,
    #[tabled(rename = "Current")]
    current: String,
    #[tabled(rename = "Mode")]
    mode: String,
    #[tabled(rename = "Activity")]
    activity: String,
    #[tabled(rename = "In bed")]
    present: String,
    #[tabled(rename = "Alarm today")]
    alarm: String,
    #[tabled(rename = "Vitals")]
    vitals: String,
}

fn side_row(side: Side, snapshot: &PodSnapshot, derived: &DerivedState, paint: Painter) -> SideRow {
    let s = snapshot.side(side);
    let d = derived.side(side);
    let alarm = if !d.today_alarm.enabled {
        paint.dim("off")
    } else if s.alarm_disabled_tonight {
        paint.dim(&format!("{} (skipped)", d.today_alarm.time))
    } else {
        d.today_alarm.time.clone()
    };
    let vitals = match s.vitals.avg_heart_rate {
        Some(hr) if d.vitals_available => format!("{:.0} bpm", hr.value),
        _ => paint.dim("-"),
    };

    SideRow {
        side: util::side_title(side).into(),
        name: s.name.clone().unwrap_or_default(),
        power: if s.is_on {
            paint.good("on")
        } else {
            paint.dim("off")
        },
        target: format!("{}°F", s.target_temperature_f),
        current: format!("{:.1}°F", s.current_temperature_f),
        mode: if s.temp_schedules_disabled_tonight {
            format!("{} (schedule paused)", util::label(&s.mode))
        } else {
            util::label(&s.mode)
        },
        activity: util::label(&d.activity),
        present: if s.present { "yes".into() } else { "no".into() },
        alarm,
        vitals,
    }
}

// ── Detail view ─────────────────────────────────────────────────────

pub(super) fn detail(state: &MergedState, paint: Painter) -> String {
    let (Some(snapshot), Some(derived)) = (&state.snapshot, &state.derived) else {
        return paint.bad("unavailable (no data)");
    };
    let pod = &snapshot.pod;

    let availability = if state.available {
        paint.good("available")
    } else {
        paint.bad(&format!(
            "unavailable ({} failed polls)",
            state.consecutive_failures
        ))
    };
    let water = match util::label(&pod.water_level).as_str() {
        "ok" => paint.good("ok"),
        other => paint.bad(other),
    };
    let health = match derived.server_healthy {
        Some(true) => paint.good("healthy"),
        Some(false) => paint.bad("degraded"),
        None => paint.dim("unknown"),
    };
    let version = pod.server_branch.as_deref().map_or_else(
        || pod.server_version.clone(),
        |branch| format!("{} ({branch})", pod.server_version),
    );

    let mut lines = vec![
        format!("Pod:          {availability}"),
        format!("Hardware:     {} / {}", pod.cover_version, pod.hub_version),
        format!("Server:       {version}, {health}"),
        format!("Water:        {water}"),
        format!("Priming:      {}", if pod.is_priming { "yes" } else { "no" }),
        format!(
            "Prime daily:  {} at {}",
            util::on_off(pod.prime_daily.enabled),
            pod.prime_daily.time
        ),
        format!("Reboot daily: {}", util::on_off(pod.reboot_daily)),
        format!("Biometrics:   {}", util::on_off(pod.biometrics_enabled)),
        format!("LED:          {}%", pod.led_brightness),
        format!("WiFi:         {}%", pod.wifi_strength),
        format!("Today:        {}", paint.accent(derived.today.as_str())),
    ];
    if let Some(at) = state.last_success {
        lines.push(format!("Updated:      {}", at.format("%Y-%m-%d %H:%M:%S")));
    }

    let rows = Side::ALL.map(|side| side_row(side, snapshot, derived, paint));
    lines.push(String::new());
    lines.push(output::render_table(&rows));
    lines.join("\n")
}

pub async fn handle(
    coordinator: &freesleep_core::Coordinator,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let state = util::load_state(coordinator).await?;
    let paint = Painter::new(&global.color);

    let out = output::render_single(
        &global.output,
        &*state,
        |s| detail(s, paint),
        |s| if s.available { "available" } else { "unavailable" }.into(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
