//! faceguard-core — identity matching and event gating.
//!
//! Pure recognition-side logic shared by every camera session: face
//! descriptors and nearest-neighbor matching, the two debounce gates,
//! and the opaque detection/encoding capability trait.

pub mod debounce;
pub mod engine;
pub mod matcher;
pub mod types;

pub use debounce::{KnownLogGate, UnknownEventGate};
pub use engine::{EngineError, FaceEngine, StubEngine};
pub use matcher::{nearest, Match, Reference};
pub use types::{Descriptor, FaceBox, KnownIdentity};
