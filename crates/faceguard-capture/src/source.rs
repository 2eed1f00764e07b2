//! Live feed sources.
//!
//! A feed is addressed by URI: `stub:<name>` yields a deterministic
//! synthetic pattern (always available, used by tests and model-less
//! demo runs), `v4l2:<device>` opens a local camera when the `v4l2`
//! feature is enabled. Acquisition owns its source exclusively and
//! reopens through the same [`SourceOpener`] after a read failure.

use crate::frame::Frame;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("unsupported feed '{0}'")]
    Unsupported(String),
    #[error("open failed for '{feed}': {reason}")]
    OpenFailed { feed: String, reason: String },
    #[error("read failed: {0}")]
    ReadFailed(String),
}

/// A live video feed.
///
/// Implementations own the capture resource and release it on drop;
/// `read` blocks until the next frame arrives or fails.
pub trait FrameSource: Send {
    fn read(&mut self) -> Result<Frame, SourceError>;
}

/// Opens feed URIs. Split from [`FrameSource`] so the acquisition loop
/// can reopen a failed feed, and so tests can inject scripted sources.
pub trait SourceOpener: Send + Sync {
    fn open(&self, feed: &str) -> Result<Box<dyn FrameSource>, SourceError>;
}

/// Standard opener: dispatches on the URI scheme at the configured
/// capture resolution.
pub struct StdOpener {
    pub width: u32,
    pub height: u32,
}

impl SourceOpener for StdOpener {
    fn open(&self, feed: &str) -> Result<Box<dyn FrameSource>, SourceError> {
        if let Some(name) = feed.strip_prefix("stub:") {
            tracing::info!(feed = name, width = self.width, height = self.height, "opened synthetic source");
            return Ok(Box::new(SyntheticSource::new(self.width, self.height)));
        }
        #[cfg(feature = "v4l2")]
        if let Some(device) = feed.strip_prefix("v4l2:") {
            return Ok(Box::new(crate::v4l2::V4l2Source::open(
                device,
                self.width,
                self.height,
            )?));
        }
        Err(SourceError::Unsupported(feed.to_string()))
    }
}

/// Deterministic synthetic feed: a gray gradient with a bright bar that
/// advances one column per frame.
pub struct SyntheticSource {
    width: u32,
    height: u32,
    sequence: u64,
}

impl SyntheticSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height, sequence: 0 }
    }
}

impl FrameSource for SyntheticSource {
    fn read(&mut self) -> Result<Frame, SourceError> {
        self.sequence += 1;
        let bar = (self.sequence % self.width as u64) as u32;
        let mut data = Vec::with_capacity((self.width * self.height * 3) as usize);
        for y in 0..self.height {
            for x in 0..self.width {
                let shade = ((x + y) % 256) as u8;
                if x == bar {
                    data.extend_from_slice(&[255, 255, 255]);
                } else {
                    data.extend_from_slice(&[shade, shade, shade]);
                }
            }
        }
        Frame::from_rgb(data, self.width, self.height, self.sequence)
            .map_err(|e| SourceError::ReadFailed(e.to_string()))
    }
}
