// ── Snapshot store ──
//
// Owned cache of the last pod snapshot plus optimistic overlays, diffed
// per field path on every mutation.

mod cache;
mod changes;
mod path;

pub use cache::{MergedState, SnapshotCache};
pub use changes::{ChangeSet, FieldChange, StateUpdate, UpdateCause};
pub use path::{FieldPath, flatten};
