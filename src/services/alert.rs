// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Danger alerts: a transient visible flag plus a system notification.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

pub const ALERT_TITLE: &str = "RSA CRITICAL ALERT";
pub const ALERT_BODY: &str =
    "DANGER ZONE DETECTED. RSA Sentinel advises immediate tactical reassessment.";

/// How long the alert stays visible after the last trigger.
pub const DEFAULT_ALERT_WINDOW: Duration = Duration::from_millis(8_000);

/// Permission state of the notification facility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPermission {
    Granted,
    Denied,
    #[default]
    Undetermined,
}

impl FromStr for NotificationPermission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "granted" => Ok(Self::Granted),
            "denied" => Ok(Self::Denied),
            "undetermined" | "default" | "" => Ok(Self::Undetermined),
            other => Err(format!("unknown notification permission: {other}")),
        }
    }
}

/// System notification facility.
pub trait NotificationSink: Send + Sync {
    fn permission(&self) -> NotificationPermission;

    /// Ask for permission. Must not block waiting for the answer.
    fn request_permission(&self);

    fn show(&self, title: &str, body: &str);
}

/// Sink that turns notifications into `warn` log events.
#[derive(Debug)]
pub struct LogNotificationSink {
    permission: Mutex<NotificationPermission>,
}

impl LogNotificationSink {
    pub fn new(permission: NotificationPermission) -> Self {
        Self {
            permission: Mutex::new(permission),
        }
    }

    /// Record the user's answer to a permission request.
    pub fn set_permission(&self, permission: NotificationPermission) {
        if let Ok(mut guard) = self.permission.lock() {
            *guard = permission;
        }
    }
}

impl NotificationSink for LogNotificationSink {
    fn permission(&self) -> NotificationPermission {
        self.permission
            .lock()
            .map(|p| *p)
            .unwrap_or(NotificationPermission::Denied)
    }

    fn request_permission(&self) {
        tracing::info!("Notification permission requested");
    }

    fn show(&self, title: &str, body: &str) {
        tracing::warn!(title, body, "Notification");
    }
}

#[derive(Debug, Default)]
struct AlertState {
    visible: bool,
    epoch: u64,
}

/// Shows the danger alert and hides it again after a fixed window.
///
/// Each [`notify`](Self::notify) restarts the window; only the newest timer
/// may clear the flag.
pub struct AlertNotifier {
    sink: Arc<dyn NotificationSink>,
    window: Duration,
    state: Arc<Mutex<AlertState>>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl AlertNotifier {
    pub fn new(sink: Arc<dyn NotificationSink>, window: Duration) -> Self {
        Self {
            sink,
            window,
            state: Arc::new(Mutex::new(AlertState::default())),
            timer: Mutex::new(None),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.state.lock().map(|s| s.visible).unwrap_or(false)
    }

    /// Raise the alert. Must be called from within a tokio runtime.
    pub fn notify(&self) {
        let epoch = match self.state.lock() {
            Ok(mut state) => {
                state.visible = true;
                state.epoch = state.epoch.wrapping_add(1);
                state.epoch
            }
            Err(_) => return,
        };

        let state = self.state.clone();
        let window = self.window;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(window).await;
            if let Ok(mut state) = state.lock() {
                if state.epoch == epoch {
                    state.visible = false;
                    tracing::debug!("Alert window elapsed");
                }
            }
        });

        if let Ok(mut timer) = self.timer.lock() {
            if let Some(previous) = timer.replace(handle) {
                previous.abort();
            }
        }

        match self.sink.permission() {
            NotificationPermission::Granted => self.sink.show(ALERT_TITLE, ALERT_BODY),
            NotificationPermission::Undetermined => self.sink.request_permission(),
            NotificationPermission::Denied => {}
        }
    }
}

impl Drop for AlertNotifier {
    fn drop(&mut self) {
        if let Ok(mut timer) = self.timer.lock() {
            if let Some(handle) = timer.take() {
                handle.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Default)]
    struct RecordingSink {
        permission: NotificationPermission,
        shown: Mutex<Vec<(String, String)>>,
        requests: AtomicU32,
    }

    impl NotificationSink for RecordingSink {
        fn permission(&self) -> NotificationPermission {
            self.permission
        }

        fn request_permission(&self) {
            self.requests.fetch_add(1, Ordering::SeqCst);
        }

        fn show(&self, title: &str, body: &str) {
            self.shown
                .lock()
                .unwrap()
                .push((title.to_string(), body.to_string()));
        }
    }

    fn notifier(permission: NotificationPermission) -> (AlertNotifier, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink {
            permission,
            ..Default::default()
        });
        (AlertNotifier::new(sink.clone(), DEFAULT_ALERT_WINDOW), sink)
    }

    async fn advance(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_alert_clears_after_window() {
        let (n, _) = notifier(NotificationPermission::Denied);
        assert!(!n.is_visible());

        n.notify();
        assert!(n.is_visible());

        advance(7_999).await;
        assert!(n.is_visible());

        advance(2).await;
        assert!(!n.is_visible());
    }

    #[tokio::test(start_paused = true)]
    async fn test_renotify_restarts_window() {
        let (n, _) = notifier(NotificationPermission::Denied);
        n.notify();
        advance(5_000).await;
        n.notify();

        // First timer would have fired at 8000
        advance(4_000).await;
        assert!(n.is_visible());

        advance(4_001).await;
        assert!(!n.is_visible());
    }

    #[tokio::test]
    async fn test_granted_shows_notification() {
        let (n, sink) = notifier(NotificationPermission::Granted);
        n.notify();
        let shown = sink.shown.lock().unwrap().clone();
        assert_eq!(shown, vec![(ALERT_TITLE.to_string(), ALERT_BODY.to_string())]);
        assert_eq!(sink.requests.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_undetermined_requests_permission() {
        let (n, sink) = notifier(NotificationPermission::Undetermined);
        n.notify();
        assert!(sink.shown.lock().unwrap().is_empty());
        assert_eq!(sink.requests.load(Ordering::SeqCst), 1);
        assert!(n.is_visible());
    }

    #[tokio::test]
    async fn test_denied_is_silent() {
        let (n, sink) = notifier(NotificationPermission::Denied);
        n.notify();
        assert!(sink.shown.lock().unwrap().is_empty());
        assert_eq!(sink.requests.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_permission_from_str() {
        assert_eq!("GRANTED".parse::<NotificationPermission>(), Ok(NotificationPermission::Granted));
        assert_eq!("denied".parse::<NotificationPermission>(), Ok(NotificationPermission::Denied));
        assert_eq!("default".parse::<NotificationPermission>(), Ok(NotificationPermission::Undetermined));
        assert!("maybe".parse::<NotificationPermission>().is_err());
    }

    #[test]
    fn test_log_sink_permission() {
        let sink = LogNotificationSink::new(NotificationPermission::Undetermined);
        sink.set_permission(NotificationPermission::Granted);
        assert_eq!(sink.permission(), NotificationPermission::Granted);
    }
}
