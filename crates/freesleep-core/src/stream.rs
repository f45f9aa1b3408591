// ── State subscriptions ──
//
// Two ways to follow the pod: `StateStream` for the latest merged view
// (intermediate states may be skipped), `UpdateStream` for every change
// set in publish order.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, ready};

use futures_core::Stream;
use tokio::sync::{broadcast, watch};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::{BroadcastStream, WatchStream};
use tracing::warn;

use crate::store::{MergedState, StateUpdate};

/// A subscription to the merged view.
///
/// Provides both point-in-time access and change notification via
/// [`changed()`](Self::changed) or by converting to a `Stream`.
pub struct StateStream {
    current: Arc<MergedState>,
    receiver: watch::Receiver<Arc<MergedState>>,
}

impl StateStream {
    pub(crate) fn new(receiver: watch::Receiver<Arc<MergedState>>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// The state captured at creation or by the last `changed()`.
    pub fn current(&self) -> &Arc<MergedState> {
        &self.current
    }

    /// The latest published state.
    pub fn latest(&self) -> Arc<MergedState> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next publish. Returns `None` once the coordinator is
    /// dropped.
    pub async fn changed(&mut self) -> Option<Arc<MergedState>> {
        self.receiver.changed().await.ok()?;
        let state = self.receiver.borrow_and_update().clone();
        self.current = Arc::clone(&state);
        Some(state)
    }

    pub fn into_stream(self) -> WatchStream<Arc<MergedState>> {
        WatchStream::new(self.receiver)
    }
}

/// `Stream` of change sets. A subscriber that falls behind skips the
/// updates it missed (logged) and continues with the next one; the
/// `state` carried by each update is always complete.
pub struct UpdateStream {
    inner: BroadcastStream<Arc<StateUpdate>>,
}

impl UpdateStream {
    pub(crate) fn new(receiver: broadcast::Receiver<Arc<StateUpdate>>) -> Self {
        Self {
            inner: BroadcastStream::new(receiver),
        }
    }
}

impl Stream for UpdateStream {
    type Item = Arc<StateUpdate>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match ready!(Pin::new(&mut self.inner).poll_next(cx)) {
                Some(Ok(update)) => return Poll::Ready(Some(update)),
                Some(Err(BroadcastStreamRecvError::Lagged(skipped))) => {
                    warn!(skipped, "update subscriber lagged");
                }
                None => return Poll::Ready(None),
            }
        }
    }
}
