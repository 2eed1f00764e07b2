//! Pipeline supervisor.
//!
//! Builds the shared recognition state, verifies the configured feeds,
//! spawns one camera session per live feed, and fans a single stop
//! signal out to every stage. A fatal condition in any one session
//! halts the entire pipeline.

use crate::config::Config;
use crate::notify::{AlertSink, WebhookSink};
use crate::session::{CameraSession, SessionConfig, SharedState};
use faceguard_capture::SourceOpener;
use faceguard_core::{EngineError, FaceEngine, UnknownEventGate};
use faceguard_store::{Catalog, EventLog, IntruderRegistry, SnapshotDir, StoreError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Shared stop signal, checked at the top of every pipeline loop and at
/// blocking-call timeouts. There is no hard interrupt: a stage blocked
/// in a stalled I/O call observes the flag when that call returns.
#[derive(Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no active feeds: every configured camera failed to open")]
    NoActiveFeeds,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("failed to spawn session threads: {0}")]
    Spawn(#[from] std::io::Error),
}

/// The running multi-camera pipeline.
pub struct Pipeline {
    sessions: Vec<CameraSession>,
    stop: StopFlag,
}

impl Pipeline {
    /// Load shared state, verify feeds, and spawn all sessions.
    ///
    /// Feeds that fail the startup probe are skipped with an error log;
    /// starting with zero live feeds is refused.
    pub fn start<F>(
        cfg: &Config,
        opener: Arc<dyn SourceOpener>,
        engine_factory: F,
    ) -> Result<Self, PipelineError>
    where
        F: Fn(&str) -> Result<Box<dyn FaceEngine>, EngineError>,
    {
        let catalog = Arc::new(Catalog::load(&cfg.catalog_path)?);
        if catalog.is_empty() {
            tracing::warn!("no known faces loaded; every face will resolve as unknown");
        }
        let registry = Arc::new(IntruderRegistry::open(&cfg.registry_path, cfg.tolerance)?);
        let entry_log = Arc::new(EventLog::open(&cfg.entry_log_path)?);
        let snapshots = Arc::new(SnapshotDir::create(&cfg.snapshot_dir)?);

        let alerts: Option<Arc<dyn AlertSink>> = match &cfg.webhook_url {
            Some(url) => {
                tracing::info!(url, "intruder alerts enabled");
                Some(Arc::new(WebhookSink::new(url.clone())))
            }
            None => {
                tracing::info!("no alert webhook configured; intruder alerts disabled");
                None
            }
        };

        let shared = SharedState {
            catalog,
            registry,
            unknown_gate: Arc::new(UnknownEventGate::new(cfg.unknown_window)),
            entry_log,
            snapshots,
            alerts,
        };

        let mut active = Vec::new();
        for feed in &cfg.feeds {
            match opener.open(feed) {
                Ok(_probe) => {
                    tracing::info!(feed, "feed verified");
                    active.push(feed.clone());
                }
                Err(err) => {
                    tracing::error!(feed, error = %err, "feed failed to open; skipping");
                }
            }
        }
        if active.is_empty() {
            return Err(PipelineError::NoActiveFeeds);
        }

        let session_cfg = SessionConfig {
            tolerance: cfg.tolerance,
            detect_every: cfg.detect_every,
            detect_scale: cfg.detect_scale,
            max_faces: cfg.max_faces,
            min_face_px: cfg.min_face_px,
            reopen_backoff: cfg.reopen_backoff,
            known_log_window: cfg.known_log_window,
            ..SessionConfig::default()
        };

        let stop = StopFlag::default();
        let mut sessions = Vec::with_capacity(active.len());
        for feed in active {
            let engine = engine_factory(&feed)?;
            sessions.push(CameraSession::spawn(
                feed,
                session_cfg.clone(),
                shared.clone(),
                engine,
                Arc::clone(&opener),
                stop.clone(),
            )?);
        }

        tracing::info!(sessions = sessions.len(), "pipeline running");
        Ok(Self { sessions, stop })
    }

    pub fn stop_flag(&self) -> StopFlag {
        self.stop.clone()
    }

    /// Signal every session to stop.
    pub fn stop(&self) {
        self.stop.set();
    }

    /// Running sessions; each exposes its output queue for the display
    /// collaborator.
    pub fn sessions(&self) -> &[CameraSession] {
        &self.sessions
    }

    /// Wait for every session's threads to exit. Call after `stop`.
    pub fn join(self) {
        for session in self.sessions {
            session.join();
        }
        tracing::info!("all camera sessions joined");
    }
}
