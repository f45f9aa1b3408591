//! State synchronization for free-sleep pods, between `freesleep-api` and
//! host adapters (CLI, home automation bridges).
//!
//! - **[`Coordinator`]**: Owns one pod's state. Polls on a fixed interval
//!   or on demand ([`refresh_now()`](Coordinator::refresh_now), coalesced),
//!   tracks availability across failed polls, and publishes field-level
//!   change sets.
//!
//! - **[`SnapshotCache`]**: The last authoritative [`PodSnapshot`] plus
//!   optimistic overlays. Every mutation rebuilds the merged view, with
//!   derived fields recomputed for the current time, and diffs it per
//!   [`FieldPath`].
//!
//! - **[`DerivedStateResolver`]**: Pure functions of (snapshot, now):
//!   today's alarm in local time, vitals freshness, running/idle, server
//!   health.
//!
//! - **[`Command`]**: Typed writes. [`Coordinator::dispatch`] validates,
//!   applies the change locally, writes it to the pod and tracks it in the
//!   [`PendingTable`] until a poll confirms it, two acknowledged polls pass
//!   (force-confirmed with a warning), or the write fails (reverted).
//!
//! - **[`PodClient`]**: The I/O seam. [`HttpPodClient`] implements it over
//!   the free-sleep REST API.

pub mod client;
pub mod clock;
pub mod command;
pub mod config;
pub mod convert;
pub mod coordinator;
pub mod derive;
pub mod error;
pub mod model;
pub mod reconcile;
pub mod store;
pub mod stream;

#[cfg(test)]
mod test_support;

// ── Primary re-exports ──────────────────────────────────────────────
pub use client::{HttpPodClient, PodClient};
pub use clock::{Clock, ManualClock, SystemClock};
pub use command::{Command, CommandPlan, PodAction, PodWrite};
pub use config::CoordinatorConfig;
pub use coordinator::{Coordinator, PollPhase, PollReport};
pub use derive::DerivedStateResolver;
pub use error::CoreError;
pub use reconcile::{PendingCommand, PendingTable};
pub use store::{
    ChangeSet, FieldChange, FieldPath, MergedState, SnapshotCache, StateUpdate, UpdateCause,
};
pub use stream::{StateStream, UpdateStream};

pub use model::{
    Alarm, DerivedState, PodSnapshot, PodStatus, RunningStatus, Side, SideActivity, SideSnapshot,
    TapAction, TapGesture, ThermalMode, VibrationPattern, Vitals, WaterLevel, Weekday,
};
