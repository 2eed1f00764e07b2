use serde::{Deserialize, Serialize};

/// Fixed-length numeric descriptor of one detected face.
///
/// Produced by the detection/encoding capability; compared by Euclidean
/// distance (lower = more similar).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Descriptor {
    pub values: Vec<f32>,
}

impl Descriptor {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    /// Euclidean distance to another descriptor.
    ///
    /// Dimensions beyond the shorter vector are ignored, matching the
    /// zip semantics of the encoding capability.
    pub fn distance(&self, other: &Descriptor) -> f32 {
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f32>()
            .sqrt()
    }
}

/// Detection rectangle in pixel coordinates of the frame it was found in.
///
/// Field order follows the capability's (top, right, bottom, left)
/// convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceBox {
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    pub left: u32,
}

impl FaceBox {
    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }

    /// Map coordinates from a downscaled detection frame back to the
    /// full-resolution frame.
    pub fn scale(&self, factor: u32) -> FaceBox {
        FaceBox {
            top: self.top * factor,
            right: self.right * factor,
            bottom: self.bottom * factor,
            left: self.left * factor,
        }
    }
}

/// A person enrolled in the known-identity catalog.
///
/// The label carries the enrollment convention `Name__gender`
/// (e.g. `Alice__female`); [`name`](Self::name) and
/// [`gender`](Self::gender) split it. Entries are loaded once at
/// pipeline start and never mutated during a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnownIdentity {
    pub label: String,
    pub descriptor: Descriptor,
}

impl KnownIdentity {
    /// Display name: the part of the label before `__`.
    pub fn name(&self) -> &str {
        match self.label.split_once("__") {
            Some((name, _)) => name,
            None => &self.label,
        }
    }

    /// Gender parsed from the label, lowercased; "unknown" when the
    /// label has no `__` separator or an empty gender part.
    pub fn gender(&self) -> String {
        match self.label.split_once("__") {
            Some((_, gender)) if !gender.is_empty() => gender.to_lowercase(),
            _ => "unknown".to_string(),
        }
    }
}
