//! The intruder registry: persisted descriptors with match-or-create
//! identity resolution.
//!
//! The whole resolve operation runs under one mutex. Camera sessions
//! hitting the registry at the same instant serialize here, so an
//! append can never be lost to a concurrent read-modify-write.

use crate::StoreError;
use faceguard_core::{matcher, Descriptor, Reference};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// One registered intruder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntruderRecord {
    pub id: String,
    pub descriptor: Descriptor,
}

impl Reference for IntruderRecord {
    fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }
}

pub struct IntruderRegistry {
    path: PathBuf,
    tolerance: f32,
    records: Mutex<Vec<IntruderRecord>>,
}

impl IntruderRegistry {
    /// Open the registry file; a missing file starts an empty registry.
    ///
    /// State is read once here. Afterwards the mutex-guarded in-memory
    /// records are the authority and every create rewrites the file.
    pub fn open(path: &Path, tolerance: f32) -> Result<Self, StoreError> {
        let records = if path.exists() {
            let raw = std::fs::read(path).map_err(|source| StoreError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            serde_json::from_slice(&raw).map_err(|source| StoreError::Malformed {
                path: path.to_path_buf(),
                source,
            })?
        } else {
            tracing::info!(path = %path.display(), "registry file not found; starting with no known intruders");
            Vec::new()
        };

        tracing::debug!(path = %path.display(), count = records.len(), "intruder registry ready");
        Ok(Self {
            path: path.to_path_buf(),
            tolerance,
            records: Mutex::new(records),
        })
    }

    /// Resolve a descriptor to an intruder id.
    ///
    /// Matches within tolerance return the existing id. A miss assigns
    /// the next dense sequential id (`Intruder_1`, `Intruder_2`, ...),
    /// persists the full registry, and returns the new id. A failed
    /// persist rolls the append back.
    pub fn resolve(&self, probe: &Descriptor) -> Result<String, StoreError> {
        let mut records = self
            .records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(m) = matcher::nearest(probe, &records, self.tolerance) {
            let id = records[m.index].id.clone();
            tracing::debug!(id, distance = m.distance, "matched existing intruder");
            return Ok(id);
        }

        let id = format!("Intruder_{}", records.len() + 1);
        records.push(IntruderRecord {
            id: id.clone(),
            descriptor: probe.clone(),
        });

        if let Err(err) = self.persist(&records) {
            records.pop();
            return Err(err);
        }

        tracing::info!(id, total = records.len(), "registered new intruder");
        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn persist(&self, records: &[IntruderRecord]) -> Result<(), StoreError> {
        let raw = serde_json::to_vec_pretty(records).map_err(|source| StoreError::Malformed {
            path: self.path.clone(),
            source,
        })?;
        std::fs::write(&self.path, raw).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }
}
