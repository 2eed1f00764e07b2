//! The opaque face detection and encoding capability.
//!
//! The pipeline never sees how faces are located or embedded; it hands
//! a raw RGB buffer to a [`FaceEngine`] and gets boxes and descriptors
//! back. Real backends wrap a model runtime; [`StubEngine`] answers
//! with a fixed response for tests and model-less deployments.

use crate::types::{Descriptor, FaceBox};
use thiserror::Error;

/// Why a detection or encoding pass failed.
///
/// `Frame` means this frame was unusable; the session skips it and
/// keeps running. `Fatal` means the backend is in an unknown state and
/// the whole pipeline must stop.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("frame rejected: {0}")]
    Frame(String),
    #[error("engine failure: {0}")]
    Fatal(String),
}

impl EngineError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, EngineError::Fatal(_))
    }
}

/// Face detection and descriptor extraction over raw RGB frames.
///
/// `rgb` is width * height * 3 bytes, row-major interleaved.
pub trait FaceEngine: Send {
    /// Locate faces in the frame.
    fn locate(&mut self, rgb: &[u8], width: u32, height: u32) -> Result<Vec<FaceBox>, EngineError>;

    /// Compute one descriptor per box, in box order.
    fn encode(
        &mut self,
        rgb: &[u8],
        width: u32,
        height: u32,
        boxes: &[FaceBox],
    ) -> Result<Vec<Descriptor>, EngineError>;
}

/// Fixed-response backend.
///
/// `locate` always returns the canned boxes; `encode` returns the
/// canned descriptors truncated to the requested box count. The default
/// instance detects nothing, which keeps the capture and display path
/// runnable on machines without a recognition model.
#[derive(Default)]
pub struct StubEngine {
    boxes: Vec<FaceBox>,
    descriptors: Vec<Descriptor>,
}

impl StubEngine {
    pub fn with_faces(boxes: Vec<FaceBox>, descriptors: Vec<Descriptor>) -> Self {
        Self { boxes, descriptors }
    }
}

impl FaceEngine for StubEngine {
    fn locate(&mut self, _rgb: &[u8], _width: u32, _height: u32) -> Result<Vec<FaceBox>, EngineError> {
        Ok(self.boxes.clone())
    }

    fn encode(
        &mut self,
        _rgb: &[u8],
        _width: u32,
        _height: u32,
        boxes: &[FaceBox],
    ) -> Result<Vec<Descriptor>, EngineError> {
        Ok(self.descriptors.iter().take(boxes.len()).cloned().collect())
    }
}
