// ── Coordinator ──
//
// Owns the snapshot cache and pending-command table for one pod. Polls on
// a fixed interval (or on demand), publishes field-level change sets, and
// applies commands optimistically before writing them to the pod.
//
// Polls never overlap: concurrent `refresh_now()` calls share the result
// of the poll already in flight. No poll error ends the background loop;
// failures only surface through availability.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use serde::Serialize;
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::{HttpPodClient, PodClient};
use crate::clock::{Clock, SystemClock};
use crate::command::{Command, PodAction};
use crate::config::CoordinatorConfig;
use crate::derive::DerivedStateResolver;
use crate::error::CoreError;
use crate::model::PodSnapshot;
use crate::reconcile::{PendingCommand, PendingTable};
use crate::store::{ChangeSet, MergedState, SnapshotCache, StateUpdate, UpdateCause};
use crate::stream::{StateStream, UpdateStream};

const UPDATE_CHANNEL_SIZE: usize = 64;

type SharedPoll = Shared<BoxFuture<'static, Result<PollReport, CoreError>>>;

// ── PollPhase ────────────────────────────────────────────────────

/// Poll state machine: `Idle → Polling → (Success | Failed) → Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PollPhase {
    Idle,
    Polling,
    Success,
    Failed,
}

/// Summary of one successful poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PollReport {
    /// Fields whose published value changed.
    pub changed_fields: usize,
    /// Pending commands the pod now reports as applied.
    pub confirmed: usize,
    /// Pending commands force-confirmed after waiting too long.
    pub forced: usize,
}

// ── Coordinator ──────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<CoordinatorInner>`. Call
/// [`start()`](Self::start) to run the first poll and the background
/// poll loop, [`shutdown()`](Self::shutdown) to stop it.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    config: CoordinatorConfig,
    client: Arc<dyn PodClient>,
    clock: Arc<dyn Clock>,
    /// Cache and pending table change together under one lock.
    sync: Mutex<SyncState>,
    state_tx: watch::Sender<Arc<MergedState>>,
    update_tx: broadcast::Sender<Arc<StateUpdate>>,
    phase_tx: watch::Sender<PollPhase>,
    /// Poll currently running, tagged with its generation so a finished
    /// poll only clears its own slot.
    in_flight: Mutex<Option<(u64, SharedPoll)>>,
    poll_generation: AtomicU64,
    started: AtomicBool,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
    /// Non-fatal problems (unconfirmed writes) for the host to surface.
    warnings: Mutex<Vec<String>>,
}

struct SyncState {
    cache: SnapshotCache,
    pending: PendingTable,
}

impl Coordinator {
    /// Coordinator talking HTTP to the pod in `config`, on the system clock.
    /// Does NOT poll: call [`start()`](Self::start).
    pub fn new(config: CoordinatorConfig) -> Result<Self, CoreError> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let client = HttpPodClient::from_config(&config)?.with_clock(Arc::clone(&clock));
        Self::with_client(config, Arc::new(client), clock)
    }

    /// Coordinator over any [`PodClient`] and [`Clock`].
    pub fn with_client(
        config: CoordinatorConfig,
        client: Arc<dyn PodClient>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, CoreError> {
        config.validate()?;

        let cache = SnapshotCache::new(DerivedStateResolver::new(config.vitals_window));
        let pending = PendingTable::new(config.confirm_polls, config.confirmation_window());
        let (state_tx, _) = watch::channel(cache.get());
        let (update_tx, _) = broadcast::channel(UPDATE_CHANNEL_SIZE);
        let (phase_tx, _) = watch::channel(PollPhase::Idle);

        Ok(Self {
            inner: Arc::new(CoordinatorInner {
                config,
                client,
                clock,
                sync: Mutex::new(SyncState { cache, pending }),
                state_tx,
                update_tx,
                phase_tx,
                in_flight: Mutex::new(None),
                poll_generation: AtomicU64::new(0),
                started: AtomicBool::new(false),
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
                warnings: Mutex::new(Vec::new()),
            }),
        })
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.inner.config
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Run the first poll, then spawn the background poll loop.
    ///
    /// A failed first poll is logged, not returned: the loop keeps
    /// retrying and availability reports the outcome.
    pub async fn start(&self) -> Result<(), CoreError> {
        self.ensure_running()?;
        if self.inner.started.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        match self.refresh_now().await {
            Ok(report) => info!(
                host = %self.inner.config.host,
                fields = report.changed_fields,
                "initial poll complete"
            ),
            Err(e) => warn!(host = %self.inner.config.host, error = %e, "initial poll failed"),
        }

        let cancel = self.inner.cancel.child_token();
        let handle = tokio::spawn(poll_task(
            self.clone(),
            self.inner.config.poll_interval,
            cancel,
        ));
        self.inner.task_handles.lock().await.push(handle);
        Ok(())
    }

    /// Stop the poll loop and wait for it to exit. Later calls that need
    /// the pod return [`CoreError::Stopped`].
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        self.inner.phase_tx.send_replace(PollPhase::Idle);
        debug!("coordinator stopped");
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    // ── Polling ──────────────────────────────────────────────────

    /// Poll now, or join the poll already in flight.
    pub async fn refresh_now(&self) -> Result<PollReport, CoreError> {
        self.ensure_running()?;

        let poll = {
            let mut slot = self.inner.in_flight.lock().await;
            if let Some((_, running)) = slot.as_ref() {
                running.clone()
            } else {
                let generation = self.inner.poll_generation.fetch_add(1, Ordering::Relaxed);
                let this = self.clone();
                let fut: BoxFuture<'static, Result<PollReport, CoreError>> =
                    Box::pin(async move {
                        let result = this.poll_once().await;
                        let mut slot = this.inner.in_flight.lock().await;
                        if slot.as_ref().is_some_and(|(g, _)| *g == generation) {
                            *slot = None;
                        }
                        result
                    });
                let shared = fut.shared();
                *slot = Some((generation, shared.clone()));
                shared
            }
        };
        poll.await
    }

    async fn poll_once(&self) -> Result<PollReport, CoreError> {
        let inner = &self.inner;
        inner.phase_tx.send_replace(PollPhase::Polling);
        inner.sync.lock().await.cache.record_attempt(inner.clock.now());

        let result = inner.client.fetch_snapshot().await;

        let mut guard = inner.sync.lock().await;
        let now = inner.clock.now();
        let outcome = match result {
            Ok(snapshot) => self.apply_success(&mut guard, snapshot, now).await,
            Err(e) => self.apply_failure(&mut guard, &e, now).and(Err(e)),
        };
        drop(guard);

        let phase = if outcome.is_ok() {
            PollPhase::Success
        } else {
            PollPhase::Failed
        };
        inner.phase_tx.send_replace(phase);
        inner.phase_tx.send_replace(PollPhase::Idle);
        outcome
    }

    async fn apply_success(
        &self,
        sync: &mut SyncState,
        snapshot: PodSnapshot,
        now: DateTime<FixedOffset>,
    ) -> Result<PollReport, CoreError> {
        let SyncState { cache, pending } = sync;
        let was_available = cache.is_available();
        let failures = cache.consecutive_failures();

        cache.reset_failures();
        let mut changes = cache.replace(snapshot, now)?;

        let rec = pending.reconcile(cache, now);
        for cmd in &rec.confirmed {
            debug!(path = %cmd.path, id = cmd.id, "write confirmed by pod");
            changes.merge(cache.confirm(&cmd.path, now)?);
        }
        for cmd in &rec.forced {
            let warning = CoreError::ReconciliationTimeout {
                path: cmd.path.to_string(),
            };
            warn!(path = %cmd.path, id = cmd.id, polls = cmd.polls_seen, "{warning}");
            self.inner.warnings.lock().await.push(warning.to_string());
            changes.merge(cache.commit(&cmd.path, now)?);
        }

        changes.merge(cache.set_availability(true, now)?);
        if !was_available && failures > 0 {
            info!(after_failures = failures, "pod available again");
        }

        let report = PollReport {
            changed_fields: changes.len(),
            confirmed: rec.confirmed.len(),
            forced: rec.forced.len(),
        };
        self.publish(cache, UpdateCause::Poll, changes);
        Ok(report)
    }

    fn apply_failure(
        &self,
        sync: &mut SyncState,
        error: &CoreError,
        now: DateTime<FixedOffset>,
    ) -> Result<(), CoreError> {
        let cache = &mut sync.cache;
        let failures = cache.record_failure();
        let threshold = self.inner.config.failure_threshold;

        let mut changes = cache.refresh_derived(now)?;
        if failures >= threshold {
            if cache.is_available() {
                warn!(failures, error = %error, "pod unavailable");
            }
            changes.merge(cache.set_availability(false, now)?);
        } else {
            debug!(failures, threshold, error = %error, "poll failed");
        }

        self.publish(cache, UpdateCause::PollFailed, changes);
        Ok(())
    }

    // ── Commands ─────────────────────────────────────────────────

    /// Validate, apply optimistically, write to the pod. On failure the
    /// local change is reverted (unless a newer command for the same field
    /// has replaced it) and the error is returned.
    pub async fn dispatch(&self, command: Command) -> Result<(), CoreError> {
        self.ensure_running()?;
        command.validate()?;
        let inner = &self.inner;

        let (plan, id) = {
            let mut guard = inner.sync.lock().await;
            let SyncState { cache, pending } = &mut *guard;
            let now = inner.clock.now();

            let view = cache.merged_snapshot().ok_or(CoreError::NotReady)?;
            let plan = command.plan(view, now)?;
            let previous = cache.get().value_at(plan.path.as_str());

            let id = pending.insert(plan.path.clone(), previous, plan.value.clone(), now);
            match cache.apply_optimistic(plan.path.clone(), plan.value.clone(), now) {
                Ok(changes) => self.publish(cache, UpdateCause::Optimistic, changes),
                Err(e) => {
                    pending.remove_if_current(&plan.path, id);
                    return Err(e);
                }
            }
            (plan, id)
        };
        debug!(command = command.name(), path = %plan.path, id, "applied optimistically");

        let result = inner.client.send_command(&plan.write).await;

        let mut guard = inner.sync.lock().await;
        let SyncState { cache, pending } = &mut *guard;
        match result {
            Ok(()) => {
                pending.mark_acked(&plan.path, id);
                Ok(())
            }
            Err(e) => {
                if pending.remove_if_current(&plan.path, id).is_some() {
                    warn!(command = command.name(), path = %plan.path, error = %e, "write failed, reverting");
                    let changes = cache.revert(&plan.path, inner.clock.now())?;
                    self.publish(cache, UpdateCause::Rollback, changes);
                } else {
                    debug!(command = command.name(), path = %plan.path, error = %e, "superseded write failed");
                }
                Err(e)
            }
        }
    }

    /// Run a fire-and-forget action, then refresh. A failed refresh is
    /// not an error of the action.
    pub async fn run_action(&self, action: PodAction) -> Result<(), CoreError> {
        self.ensure_running()?;
        action.validate()?;

        self.inner.client.run_action(&action).await?;
        info!(action = action.name(), "pod action started");

        if let Err(e) = self.refresh_now().await {
            debug!(action = action.name(), error = %e, "refresh after action failed");
        }
        Ok(())
    }

    // ── State observation ────────────────────────────────────────

    /// The current merged view.
    pub fn state(&self) -> Arc<MergedState> {
        self.inner.state_tx.borrow().clone()
    }

    /// Latest-value subscription to the merged view.
    pub fn watch_state(&self) -> StateStream {
        StateStream::new(self.inner.state_tx.subscribe())
    }

    /// Every published change set, in order.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<StateUpdate>> {
        self.inner.update_tx.subscribe()
    }

    /// [`subscribe()`](Self::subscribe) as a `Stream`.
    pub fn updates(&self) -> UpdateStream {
        UpdateStream::new(self.inner.update_tx.subscribe())
    }

    pub fn poll_phase(&self) -> watch::Receiver<PollPhase> {
        self.inner.phase_tx.subscribe()
    }

    /// Commands still waiting for the pod to confirm them.
    pub async fn pending_commands(&self) -> Vec<PendingCommand> {
        self.inner.sync.lock().await.pending.snapshot()
    }

    /// Drain accumulated warnings.
    pub async fn take_warnings(&self) -> Vec<String> {
        std::mem::take(&mut *self.inner.warnings.lock().await)
    }

    // ── Helpers ──────────────────────────────────────────────────

    fn ensure_running(&self) -> Result<(), CoreError> {
        if self.inner.cancel.is_cancelled() {
            Err(CoreError::Stopped)
        } else {
            Ok(())
        }
    }

    /// Publish under the sync lock so subscribers see updates in order.
    fn publish(&self, cache: &SnapshotCache, cause: UpdateCause, changes: ChangeSet) {
        let state = cache.get();
        self.inner.state_tx.send_replace(Arc::clone(&state));
        if !changes.is_empty() {
            let _ = self.inner.update_tx.send(Arc::new(StateUpdate {
                cause,
                changes,
                state,
            }));
        }
    }
}

// ── Background tasks ─────────────────────────────────────────────

/// Poll on a fixed interval until cancelled.
async fn poll_task(coordinator: Coordinator, period: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    result = coordinator.refresh_now() => {
                        if let Err(e) = result {
                            debug!(error = %e, "scheduled poll failed");
                        }
                    }
                }
            }
        }
    }
}
