//! faceguard-capture — camera frames and feed sources.
//!
//! Provides the RGB [`Frame`] type with the pixel operations the
//! pipeline needs (YUYV conversion, downscaling, annotation drawing)
//! and the [`FrameSource`] abstraction over live feeds, with a
//! synthetic `stub:` source always available and a V4L2 source behind
//! the `v4l2` feature.

pub mod annotate;
pub mod frame;
pub mod source;
#[cfg(feature = "v4l2")]
pub mod v4l2;

pub use frame::{Frame, FrameError};
pub use source::{FrameSource, SourceError, SourceOpener, StdOpener, SyntheticSource};
