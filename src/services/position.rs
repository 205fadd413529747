// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Geopositioning adapter.
//!
//! Position fixes arrive from the host (a browser shell posting samples to
//! the API) and are exposed as a push-based [`PositionWatch`] stream. A
//! provider error ends the stream; there is no retry here.

use crate::models::Coordinate;
use futures_util::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tokio::sync::{mpsc, Notify};

/// Options passed when starting a watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WatchOptions {
    pub high_accuracy: bool,
}

/// Failure reported by the host's location provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum PositionError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Position unavailable")]
    PositionUnavailable,

    #[error("Timed out waiting for a position fix")]
    Timeout,
}

/// A source of continuous position updates.
pub trait PositionSource: Send + Sync {
    /// Start watching. The returned stream is infinite until the provider
    /// fails or the watch is replaced, and cannot be restarted.
    fn watch(&self, options: WatchOptions) -> PositionWatch;
}

enum PositionEvent {
    Sample(Coordinate),
    Failed(PositionError),
}

type Slot = Arc<Mutex<Option<ActiveWatch>>>;

struct ActiveWatch {
    id: u64,
    tx: mpsc::UnboundedSender<PositionEvent>,
}

/// Releases the host subscription when the watch goes away.
struct WatchRelease {
    slot: Slot,
    id: u64,
}

impl Drop for WatchRelease {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.slot.lock() {
            if guard.as_ref().is_some_and(|w| w.id == self.id) {
                *guard = None;
                tracing::debug!(watch_id = self.id, "Position watch released");
            }
        }
    }
}

/// Stream of coordinate samples from a [`PositionSource`].
pub struct PositionWatch {
    rx: mpsc::UnboundedReceiver<PositionEvent>,
    release: Option<WatchRelease>,
    error: Option<PositionError>,
}

impl PositionWatch {
    /// The error that ended this watch, if any.
    pub fn error(&self) -> Option<PositionError> {
        self.error
    }
}

impl Stream for PositionWatch {
    type Item = Coordinate;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Coordinate>> {
        let this = self.get_mut();
        if this.release.is_none() {
            return Poll::Ready(None);
        }
        match this.rx.poll_recv(cx) {
            Poll::Ready(Some(PositionEvent::Sample(c))) => Poll::Ready(Some(c)),
            Poll::Ready(Some(PositionEvent::Failed(err))) => {
                tracing::error!(error = %err, "Position watch failed");
                this.error = Some(err);
                this.release = None;
                Poll::Ready(None)
            }
            Poll::Ready(None) => {
                this.release = None;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Host-fed position source.
///
/// The host calls [`publish`](Self::publish) for every fix and
/// [`report_error`](Self::report_error) when its provider fails. Only one
/// watch is active at a time; starting a new one ends the previous stream.
#[derive(Clone, Default)]
pub struct ChannelPositionSource {
    slot: Slot,
    next_id: Arc<AtomicU64>,
    high_accuracy: Arc<AtomicBool>,
    /// Signalled when a sample arrives with nobody watching
    demand: Arc<Notify>,
}

impl ChannelPositionSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver a sample to the active watch. Returns false if nobody is watching.
    pub fn publish(&self, coords: Coordinate) -> bool {
        let Ok(mut guard) = self.slot.lock() else {
            return false;
        };
        match guard.as_ref() {
            Some(active) if active.tx.send(PositionEvent::Sample(coords)).is_ok() => true,
            Some(_) => {
                // Receiver gone without running its release
                *guard = None;
                self.demand.notify_one();
                false
            }
            None => {
                self.demand.notify_one();
                false
            }
        }
    }

    /// Wait until the host publishes a sample while no watch is active.
    ///
    /// A sample published before this is called still counts, so a caller
    /// restarting its watch cannot miss the request.
    pub async fn sample_demand(&self) {
        self.demand.notified().await;
    }

    /// Report a provider failure. The active watch ends after draining
    /// samples published before the error.
    pub fn report_error(&self, err: PositionError) -> bool {
        let Ok(mut guard) = self.slot.lock() else {
            return false;
        };
        match guard.take() {
            Some(active) => active.tx.send(PositionEvent::Failed(err)).is_ok(),
            None => false,
        }
    }

    pub fn is_watching(&self) -> bool {
        self.slot.lock().map(|g| g.is_some()).unwrap_or(false)
    }

    /// Whether the current watcher asked for high-accuracy fixes.
    pub fn high_accuracy_requested(&self) -> bool {
        self.high_accuracy.load(Ordering::Relaxed)
    }
}

impl PositionSource for ChannelPositionSource {
    fn watch(&self, options: WatchOptions) -> PositionWatch {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.high_accuracy
            .store(options.high_accuracy, Ordering::Relaxed);

        let (tx, rx) = mpsc::unbounded_channel();
        if let Ok(mut guard) = self.slot.lock() {
            if guard.replace(ActiveWatch { id, tx }).is_some() {
                tracing::debug!(watch_id = id, "Replacing existing position watch");
            }
        }
        tracing::info!(watch_id = id, high_accuracy = options.high_accuracy, "Position watch started");

        PositionWatch {
            rx,
            release: Some(WatchRelease {
                slot: self.slot.clone(),
                id,
            }),
            error: None,
        }
    }
}
