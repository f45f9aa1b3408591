// ── Pod domain model ──
//
// Canonical, typed view of one pod. Wire payloads from `freesleep-api` are
// converted into these types in `crate::convert`; everything downstream
// (cache, derived state, commands, CLI) works on this model only.
//
// Field names here are also the field paths used for diffing, so renaming
// a field changes the public change-notification contract.

pub mod derived;
pub mod schedule;
pub mod side;
pub mod snapshot;
pub mod vitals;

// ── Re-exports ──────────────────────────────────────────────────────

pub use derived::{DerivedState, RunningStatus, SideActivity, SideDerived};
pub use schedule::{
    Alarm, DaySchedule, TapAction, TapActions, TapGesture, VibrationPattern, WeeklySchedule,
};
pub use side::{Side, Weekday};
pub use snapshot::{PodSnapshot, PodStatus, PrimeDaily, SideSnapshot, ThermalMode, WaterLevel};
pub use vitals::{Sampled, Vitals};
