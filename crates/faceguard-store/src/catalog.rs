//! The known-identity catalog.
//!
//! Loaded once at pipeline start and shared read-only by every camera
//! session; no writer exists during a run, so no locking either.

use crate::StoreError;
use faceguard_core::{matcher, Descriptor, KnownIdentity};
use std::path::Path;

pub struct Catalog {
    entries: Vec<KnownIdentity>,
}

impl Catalog {
    /// Load the catalog from a JSON file.
    ///
    /// A missing file is not an error: the pipeline runs with an empty
    /// catalog and every face resolves as unknown.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "catalog file not found; starting with no known faces");
            return Ok(Self { entries: Vec::new() });
        }

        let raw = std::fs::read(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let entries: Vec<KnownIdentity> =
            serde_json::from_slice(&raw).map_err(|source| StoreError::Malformed {
                path: path.to_path_buf(),
                source,
            })?;

        tracing::info!(path = %path.display(), count = entries.len(), "loaded known identities");
        Ok(Self { entries })
    }

    pub fn from_entries(entries: Vec<KnownIdentity>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve a probe descriptor to the nearest enrolled identity
    /// within tolerance.
    pub fn find(&self, probe: &Descriptor, tolerance: f32) -> Option<&KnownIdentity> {
        matcher::nearest(probe, &self.entries, tolerance).map(|m| &self.entries[m.index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> KnownIdentity {
        KnownIdentity {
            label: "Alice__female".to_string(),
            descriptor: Descriptor::new(vec![0.0, 0.0, 0.0]),
        }
    }

    #[test]
    fn test_missing_file_yields_empty_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Catalog::load(&dir.path().join("absent.json")).unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("known_faces.json");
        std::fs::write(&path, serde_json::to_vec(&vec![alice()]).unwrap()).unwrap();

        let catalog = Catalog::load(&path).unwrap();
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("known_faces.json");
        std::fs::write(&path, b"not json").unwrap();
        assert!(matches!(Catalog::load(&path), Err(StoreError::Malformed { .. })));
    }

    #[test]
    fn test_find_within_tolerance() {
        // Probe at distance 0.4 from Alice resolves; gender parses from the label.
        let catalog = Catalog::from_entries(vec![alice()]);
        let probe = Descriptor::new(vec![0.4, 0.0, 0.0]);
        let id = catalog.find(&probe, 0.6).unwrap();
        assert_eq!(id.name(), "Alice");
        assert_eq!(id.gender(), "female");
    }

    #[test]
    fn test_find_beyond_tolerance() {
        let catalog = Catalog::from_entries(vec![alice()]);
        let probe = Descriptor::new(vec![0.9, 0.0, 0.0]);
        assert!(catalog.find(&probe, 0.6).is_none());
    }

    #[test]
    fn test_find_picks_nearest_of_many() {
        let bob = KnownIdentity {
            label: "Bob__male".to_string(),
            descriptor: Descriptor::new(vec![1.0, 0.0, 0.0]),
        };
        let catalog = Catalog::from_entries(vec![alice(), bob]);
        let probe = Descriptor::new(vec![0.8, 0.0, 0.0]);
        assert_eq!(catalog.find(&probe, 0.6).unwrap().name(), "Bob");
    }
}
