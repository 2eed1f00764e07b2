//! V4L2 feed source (feature `v4l2`).

use crate::frame::{self, Frame};
use crate::source::{FrameSource, SourceError};
use v4l::buffer::Type as BufType;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;
use v4l::FourCC;

enum PixelFormat {
    Yuyv,
    Grey,
}

/// A local V4L2 capture device producing RGB frames.
pub struct V4l2Source {
    device: Device,
    width: u32,
    height: u32,
    pixel_format: PixelFormat,
    sequence: u64,
}

impl V4l2Source {
    /// Open a device path (e.g. `/dev/video0`) and negotiate YUYV at
    /// the requested size; GREY is accepted for IR cameras.
    pub fn open(device_path: &str, width: u32, height: u32) -> Result<Self, SourceError> {
        let open_err = |reason: String| SourceError::OpenFailed {
            feed: device_path.to_string(),
            reason,
        };

        let device = Device::with_path(device_path).map_err(|e| open_err(e.to_string()))?;

        let caps = device
            .query_caps()
            .map_err(|e| open_err(format!("failed to query capabilities: {e}")))?;
        if !caps.capabilities.contains(v4l::capability::Flags::VIDEO_CAPTURE) {
            return Err(open_err("device does not support video capture".into()));
        }

        let mut fmt = device
            .format()
            .map_err(|e| open_err(format!("failed to get format: {e}")))?;
        fmt.fourcc = FourCC::new(b"YUYV");
        fmt.width = width;
        fmt.height = height;

        let negotiated = device
            .set_format(&fmt)
            .map_err(|e| open_err(format!("failed to set format: {e}")))?;

        let pixel_format = if negotiated.fourcc == FourCC::new(b"YUYV") {
            PixelFormat::Yuyv
        } else if negotiated.fourcc == FourCC::new(b"GREY") {
            PixelFormat::Grey
        } else {
            return Err(open_err(format!(
                "unsupported pixel format {:?} (need YUYV or GREY)",
                negotiated.fourcc
            )));
        };

        tracing::info!(
            device = device_path,
            driver = %caps.driver,
            card = %caps.card,
            width = negotiated.width,
            height = negotiated.height,
            fourcc = ?negotiated.fourcc,
            "opened v4l2 camera"
        );

        Ok(Self {
            device,
            width: negotiated.width,
            height: negotiated.height,
            pixel_format,
            sequence: 0,
        })
    }
}

impl FrameSource for V4l2Source {
    fn read(&mut self) -> Result<Frame, SourceError> {
        let mut stream = MmapStream::with_buffers(&self.device, BufType::VideoCapture, 4)
            .map_err(|e| SourceError::ReadFailed(format!("failed to create mmap stream: {e}")))?;

        let (buf, _meta) = stream
            .next()
            .map_err(|e| SourceError::ReadFailed(format!("failed to dequeue buffer: {e}")))?;

        let rgb = match self.pixel_format {
            PixelFormat::Yuyv => frame::yuyv_to_rgb(buf, self.width, self.height),
            PixelFormat::Grey => frame::gray_to_rgb(buf, self.width, self.height),
        }
        .map_err(|e| SourceError::ReadFailed(e.to_string()))?;

        self.sequence += 1;
        Frame::from_rgb(rgb, self.width, self.height, self.sequence)
            .map_err(|e| SourceError::ReadFailed(e.to_string()))
    }
}
