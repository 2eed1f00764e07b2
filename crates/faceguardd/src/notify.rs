//! Intruder alert dispatch.
//!
//! Alerts are fire-and-forget: the sink runs on a detached thread so a
//! slow or dead transport never stalls recognition, and failures are
//! logged once and dropped — no retries, nothing surfaces back into
//! the pipeline.

use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("transport error: {0}")]
    Transport(String),
}

/// One confirmed intruder event.
#[derive(Debug, Clone, Serialize)]
pub struct IntruderAlert {
    pub intruder_id: String,
    pub snapshot: PathBuf,
    /// Wall-clock time of the event, `%Y-%m-%d %H:%M:%S`.
    pub timestamp: String,
    /// Feed URI of the camera that saw the face.
    pub source: String,
}

/// Fire-and-forget alert transport.
pub trait AlertSink: Send + Sync {
    fn notify(&self, alert: &IntruderAlert) -> Result<(), NotifyError>;
}

/// POSTs alerts as JSON to a configured webhook endpoint.
pub struct WebhookSink {
    url: String,
}

impl WebhookSink {
    pub fn new(url: String) -> Self {
        Self { url }
    }
}

impl AlertSink for WebhookSink {
    fn notify(&self, alert: &IntruderAlert) -> Result<(), NotifyError> {
        ureq::post(&self.url)
            .send_json(alert)
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        tracing::debug!(url = %self.url, id = %alert.intruder_id, "alert delivered");
        Ok(())
    }
}

/// Run the sink on a detached thread.
pub fn dispatch(sink: Arc<dyn AlertSink>, alert: IntruderAlert) {
    let spawned = std::thread::Builder::new()
        .name("alert-dispatch".into())
        .spawn(move || {
            if let Err(err) = sink.notify(&alert) {
                tracing::warn!(error = %err, id = %alert.intruder_id, "alert dispatch failed");
            }
        });
    if let Err(err) = spawned {
        tracing::warn!(error = %err, "could not spawn alert dispatch thread");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingSink {
        delivered: AtomicUsize,
    }

    impl AlertSink for CountingSink {
        fn notify(&self, _alert: &IntruderAlert) -> Result<(), NotifyError> {
            self.delivered.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingSink;

    impl AlertSink for FailingSink {
        fn notify(&self, _alert: &IntruderAlert) -> Result<(), NotifyError> {
            Err(NotifyError::Transport("connection refused".into()))
        }
    }

    fn alert() -> IntruderAlert {
        IntruderAlert {
            intruder_id: "Intruder_1".into(),
            snapshot: PathBuf::from("intruders/intruder_x.jpg"),
            timestamp: "2025-01-01 12:00:00".into(),
            source: "stub:lobby".into(),
        }
    }

    #[test]
    fn test_dispatch_runs_sink() {
        let sink = Arc::new(CountingSink { delivered: AtomicUsize::new(0) });
        dispatch(sink.clone(), alert());

        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while sink.delivered.load(Ordering::SeqCst) == 0 {
            assert!(std::time::Instant::now() < deadline, "alert never delivered");
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_dispatch_swallows_sink_failure() {
        // A failing transport must not panic or propagate.
        dispatch(Arc::new(FailingSink), alert());
        std::thread::sleep(Duration::from_millis(50));
    }

    #[test]
    fn test_alert_serializes_for_webhook() {
        let json = serde_json::to_value(alert()).unwrap();
        assert_eq!(json["intruder_id"], "Intruder_1");
        assert_eq!(json["source"], "stub:lobby");
    }
}
