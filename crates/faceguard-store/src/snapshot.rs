//! Intruder snapshot storage.

use crate::StoreError;
use chrono::Local;
use faceguard_capture::Frame;
use std::path::{Path, PathBuf};

/// Directory of timestamped full-resolution intruder captures.
pub struct SnapshotDir {
    dir: PathBuf,
}

impl SnapshotDir {
    /// Ensure the snapshot directory exists.
    pub fn create(dir: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(dir).map_err(|source| StoreError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    /// Save a frame as `intruder_<timestamp>.jpg` and return its path.
    ///
    /// The frame is written unannotated, exactly as captured.
    pub fn save(&self, frame: &Frame) -> Result<PathBuf, StoreError> {
        let filename = format!("intruder_{}.jpg", Local::now().format("%Y%m%d_%H%M%S_%6f"));
        let path = self.dir.join(filename);

        image::save_buffer(
            &path,
            &frame.data,
            frame.width,
            frame.height,
            image::ExtendedColorType::Rgb8,
        )?;

        tracing::info!(path = %path.display(), "captured intruder snapshot");
        Ok(path)
    }
}
