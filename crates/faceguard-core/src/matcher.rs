//! Nearest-neighbor identity matching.
//!
//! Used identically against the known-identity catalog and the intruder
//! registry; only the tolerance and the caller's no-match action differ.

use crate::types::{Descriptor, KnownIdentity};

/// A reference entry a probe descriptor can be matched against.
pub trait Reference {
    fn descriptor(&self) -> &Descriptor;
}

impl Reference for Descriptor {
    fn descriptor(&self) -> &Descriptor {
        self
    }
}

impl Reference for KnownIdentity {
    fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }
}

/// Accepted nearest-neighbor result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match {
    /// Index of the winning entry in the reference slice.
    pub index: usize,
    /// Distance of the winning entry.
    pub distance: f32,
}

/// Find the reference entry closest to `probe`.
///
/// Every entry is compared; the minimum-distance entry wins and is
/// accepted only when its distance is within `tolerance`. An empty
/// reference set, or a minimum beyond tolerance, is no match.
pub fn nearest<R: Reference>(probe: &Descriptor, refs: &[R], tolerance: f32) -> Option<Match> {
    let mut best: Option<Match> = None;

    for (index, entry) in refs.iter().enumerate() {
        let distance = probe.distance(entry.descriptor());
        if best.map_or(true, |b| distance < b.distance) {
            best = Some(Match { index, distance });
        }
    }

    best.filter(|b| b.distance <= tolerance)
}
