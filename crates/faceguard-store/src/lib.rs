//! faceguard-store — persisted recognition state.
//!
//! Four artifacts: the read-only known-identity catalog, the intruder
//! registry with match-or-create resolution, the append-only entry log,
//! and the directory of intruder snapshot images.

pub mod catalog;
pub mod event_log;
pub mod registry;
pub mod snapshot;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed store file {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("image encode failed: {0}")]
    Image(#[from] image::ImageError),
}

pub use catalog::Catalog;
pub use event_log::EventLog;
pub use registry::{IntruderRecord, IntruderRegistry};
pub use snapshot::SnapshotDir;
