//! Camera sessions.
//!
//! One session per configured feed: an acquisition thread pulls frames
//! from the source and hands the freshest one over a single-slot queue
//! to a recognition thread, which detects and resolves faces, fires the
//! debounced side-effect pipeline, annotates the frame, and publishes
//! it on the session's output queue for the display collaborator.
//!
//! The per-frame recognition logic lives in [`FrameProcessor::step`],
//! a synchronous unit the recognition thread drives in a loop.

use crate::latest::{latest_slot, SlotReceiver, SlotSender};
use crate::notify::{self, AlertSink, IntruderAlert};
use crate::pipeline::StopFlag;
use chrono::Local;
use faceguard_capture::annotate;
use faceguard_capture::{Frame, FrameSource, SourceOpener};
use faceguard_core::types::Descriptor;
use faceguard_core::{EngineError, FaceEngine, KnownLogGate, UnknownEventGate};
use faceguard_store::{Catalog, EventLog, IntruderRegistry, SnapshotDir};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Per-session tuning, copied out of the daemon config.
#[derive(Clone)]
pub struct SessionConfig {
    pub tolerance: f32,
    /// Run detection on every Nth frame.
    pub detect_every: u64,
    /// Downscale divisor applied before detection.
    pub detect_scale: u32,
    /// Detection counts above this drop the frame as garbled.
    pub max_faces: usize,
    /// Minimum box side in downscaled pixels; smaller detections are
    /// discarded before encoding.
    pub min_face_px: u32,
    /// Wait between releasing a failed source and reopening it.
    pub reopen_backoff: Duration,
    /// Internal-queue poll timeout; bounds stop-flag latency when idle.
    pub poll_timeout: Duration,
    pub known_log_window: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tolerance: 0.6,
            detect_every: 4,
            detect_scale: 4,
            max_faces: 10,
            min_face_px: 20,
            reopen_backoff: Duration::from_millis(500),
            poll_timeout: Duration::from_millis(50),
            known_log_window: Duration::from_secs(25),
        }
    }
}

/// Collaborators shared by every session in the pipeline.
#[derive(Clone)]
pub struct SharedState {
    pub catalog: Arc<Catalog>,
    pub registry: Arc<IntruderRegistry>,
    pub unknown_gate: Arc<UnknownEventGate>,
    pub entry_log: Arc<EventLog>,
    pub snapshots: Arc<SnapshotDir>,
    pub alerts: Option<Arc<dyn AlertSink>>,
}

/// Outcome of processing one frame.
pub enum Step {
    /// Forward this frame to the output queue.
    Publish(Frame),
    /// Drop the frame entirely (garbled detection pass).
    Discard,
    /// The engine is in an unknown state; publish the frame, then stop
    /// the whole pipeline.
    Fatal(Frame),
}

/// Per-session recognition state and the per-frame pipeline step.
pub struct FrameProcessor {
    feed: String,
    cfg: SessionConfig,
    shared: SharedState,
    engine: Box<dyn FaceEngine>,
    known_gate: KnownLogGate,
    counter: u64,
}

impl FrameProcessor {
    pub fn new(
        feed: String,
        cfg: SessionConfig,
        shared: SharedState,
        engine: Box<dyn FaceEngine>,
    ) -> Self {
        let known_gate = KnownLogGate::new(cfg.known_log_window);
        Self {
            feed,
            cfg,
            shared,
            engine,
            known_gate,
            counter: 0,
        }
    }

    pub fn feed(&self) -> &str {
        &self.feed
    }

    /// Process one frame: skip-rate gating, detection, identity
    /// resolution, side effects, annotation.
    pub fn step(&mut self, frame: Frame) -> Step {
        self.counter += 1;
        if self.counter % self.cfg.detect_every != 0 {
            return Step::Publish(frame);
        }

        let small = frame.downscale(self.cfg.detect_scale);

        let boxes = match self.engine.locate(&small.data, small.width, small.height) {
            Ok(boxes) => boxes,
            Err(err) if err.is_fatal() => {
                tracing::error!(feed = %self.feed, error = %err, "detection failed; stopping pipeline");
                return Step::Fatal(frame);
            }
            Err(err) => {
                tracing::warn!(feed = %self.feed, error = %err, "detection skipped for this frame");
                return Step::Publish(frame);
            }
        };

        if boxes.len() > self.cfg.max_faces {
            tracing::warn!(
                feed = %self.feed,
                detections = boxes.len(),
                max = self.cfg.max_faces,
                "implausible detection count; dropping frame"
            );
            return Step::Discard;
        }

        let min = self.cfg.min_face_px;
        let (kept, rejected): (Vec<_>, Vec<_>) = boxes
            .into_iter()
            .partition(|b| b.width() >= min && b.height() >= min);
        for b in &rejected {
            tracing::warn!(
                feed = %self.feed,
                width = b.width(),
                height = b.height(),
                frame = self.counter,
                "discarding undersized detection"
            );
        }

        let descriptors = match self.engine.encode(&small.data, small.width, small.height, &kept) {
            Ok(descriptors) => descriptors,
            Err(err) if err.is_fatal() => {
                tracing::error!(feed = %self.feed, error = %err, "encoding failed; stopping pipeline");
                return Step::Fatal(frame);
            }
            Err(err) => {
                tracing::warn!(feed = %self.feed, error = %err, "encoding skipped for this frame");
                return Step::Publish(frame);
            }
        };

        let now = Instant::now();
        let mut overlays = Vec::with_capacity(kept.len());
        for (bbox, descriptor) in kept.iter().zip(descriptors.iter()) {
            let (label, known) = self.resolve_face(descriptor, &frame, now);
            overlays.push((bbox.scale(self.cfg.detect_scale), label, known));
        }

        let mut annotated = frame;
        if overlays.is_empty() {
            annotate::draw_banner(&mut annotated, annotate::NO_FACE_BANNER);
        } else {
            for (bbox, label, known) in &overlays {
                let (box_color, text_color) = if *known {
                    (annotate::KNOWN_BOX, annotate::KNOWN_TEXT)
                } else {
                    (annotate::INTRUDER_BOX, annotate::INTRUDER_TEXT)
                };
                annotate::draw_face_box(&mut annotated, *bbox, box_color);
                annotate::draw_face_label(&mut annotated, *bbox, label, box_color, text_color);
            }
        }
        Step::Publish(annotated)
    }

    /// Resolve one descriptor to a display label, running whichever
    /// side effects its debounce tier admits.
    fn resolve_face(&mut self, descriptor: &Descriptor, frame: &Frame, now: Instant) -> (String, bool) {
        match self.shared.catalog.find(descriptor, self.cfg.tolerance) {
            Some(identity) => {
                if self.known_gate.should_log(&identity.label, now) {
                    if let Err(err) =
                        self.shared.entry_log.append(identity.name(), &identity.gender(), None)
                    {
                        tracing::warn!(feed = %self.feed, error = %err, "known-face log entry failed");
                    }
                }
                (identity.name().to_string(), true)
            }
            None => (self.handle_unknown(descriptor, frame, now), false),
        }
    }

    /// Escalate an unrecognized face. The global gate admits at most
    /// one full event (snapshot + log + alert) per window across all
    /// sessions; suppressed or failed events display "Unknown".
    fn handle_unknown(&self, descriptor: &Descriptor, frame: &Frame, now: Instant) -> String {
        if !self.shared.unknown_gate.try_fire(now) {
            tracing::debug!(feed = %self.feed, "intruder event suppressed by debounce window");
            return "Unknown".to_string();
        }

        let id = match self.shared.registry.resolve(descriptor) {
            Ok(id) => id,
            Err(err) => {
                tracing::warn!(feed = %self.feed, error = %err, "intruder resolution failed");
                return "Unknown".to_string();
            }
        };
        tracing::info!(feed = %self.feed, id, "intruder event triggered");

        match self.shared.snapshots.save(frame) {
            Ok(path) => {
                if let Err(err) = self.shared.entry_log.append(&id, "Intruder", Some(&path)) {
                    tracing::warn!(feed = %self.feed, error = %err, "intruder log entry failed");
                }
                if let Some(sink) = &self.shared.alerts {
                    notify::dispatch(
                        Arc::clone(sink),
                        IntruderAlert {
                            intruder_id: id.clone(),
                            snapshot: path,
                            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
                            source: self.feed.clone(),
                        },
                    );
                }
            }
            Err(err) => {
                tracing::warn!(feed = %self.feed, error = %err, "snapshot failed; skipping log entry and alert");
            }
        }
        id
    }
}

/// A running acquisition/recognition thread pair for one feed.
pub struct CameraSession {
    pub feed: String,
    reader: JoinHandle<()>,
    processor: JoinHandle<()>,
    output: SlotReceiver<Frame>,
}

impl CameraSession {
    /// Spawn both stages. The acquisition thread opens its own source
    /// through `opener` and owns it exclusively.
    pub fn spawn(
        feed: String,
        cfg: SessionConfig,
        shared: SharedState,
        engine: Box<dyn FaceEngine>,
        opener: Arc<dyn SourceOpener>,
        stop: StopFlag,
    ) -> std::io::Result<Self> {
        let (frame_tx, frame_rx) = latest_slot();
        let (out_tx, out_rx) = latest_slot();

        let reader = {
            let feed = feed.clone();
            let stop = stop.clone();
            let backoff = cfg.reopen_backoff;
            std::thread::Builder::new()
                .name(format!("acquire-{feed}"))
                .spawn(move || acquisition_loop(&feed, opener.as_ref(), &frame_tx, &stop, backoff))?
        };

        let poll_timeout = cfg.poll_timeout;
        let frame_processor = FrameProcessor::new(feed.clone(), cfg, shared, engine);
        let processor = std::thread::Builder::new()
            .name(format!("recognize-{feed}"))
            .spawn(move || recognition_loop(frame_processor, &frame_rx, &out_tx, &stop, poll_timeout))?;

        Ok(Self {
            feed,
            reader,
            processor,
            output: out_rx,
        })
    }

    /// Output queue for the display collaborator; always holds the
    /// newest annotated frame and never blocks the session.
    pub fn frames(&self) -> &SlotReceiver<Frame> {
        &self.output
    }

    /// Wait for both stages to exit. Call after the stop flag is set.
    pub fn join(self) {
        if self.reader.join().is_err() {
            tracing::error!(feed = %self.feed, "acquisition thread panicked");
        }
        if self.processor.join().is_err() {
            tracing::error!(feed = %self.feed, "recognition thread panicked");
        }
    }
}

/// Acquisition stage: read frames and publish the freshest one,
/// reopening the source with backoff after a read failure. A failed
/// reopen (or a failed first open) halts the whole pipeline.
fn acquisition_loop(
    feed: &str,
    opener: &dyn SourceOpener,
    tx: &SlotSender<Frame>,
    stop: &StopFlag,
    backoff: Duration,
) {
    let mut source: Box<dyn FrameSource> = match opener.open(feed) {
        Ok(source) => source,
        Err(err) => {
            tracing::error!(feed, error = %err, "could not open feed; stopping pipeline");
            stop.set();
            return;
        }
    };

    while !stop.is_set() {
        match source.read() {
            Ok(frame) => {
                if tx.publish(frame).is_some() {
                    tracing::trace!(feed, "evicted unconsumed frame");
                }
            }
            Err(err) => {
                tracing::warn!(feed, error = %err, "frame read failed; reopening source");
                drop(source);
                std::thread::sleep(backoff);
                match opener.open(feed) {
                    Ok(reopened) => source = reopened,
                    Err(err) => {
                        tracing::error!(feed, error = %err, "reopen failed; stopping pipeline");
                        stop.set();
                        return;
                    }
                }
            }
        }
    }
    tracing::debug!(feed, "acquisition stopped");
}

/// Recognition stage: drain the internal queue with a short timeout so
/// the stop flag stays responsive even on an idle feed.
fn recognition_loop(
    mut processor: FrameProcessor,
    rx: &SlotReceiver<Frame>,
    out: &SlotSender<Frame>,
    stop: &StopFlag,
    poll_timeout: Duration,
) {
    while !stop.is_set() {
        let Some(frame) = rx.recv_timeout(poll_timeout) else {
            continue;
        };
        match processor.step(frame) {
            Step::Publish(frame) => {
                if out.publish(frame).is_some() {
                    tracing::trace!(feed = %processor.feed(), "evicted undisplayed frame");
                }
            }
            Step::Discard => {}
            Step::Fatal(frame) => {
                out.publish(frame);
                stop.set();
                break;
            }
        }
    }
    tracing::debug!(feed = %processor.feed(), "recognition stopped");
}
