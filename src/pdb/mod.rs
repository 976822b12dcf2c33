//! PDB / STRIDE input model: CA atoms, secondary-structure elements, H-bonds.

pub mod atom;
pub mod sse;
pub mod sses;
pub mod stride;

pub use atom::CaAtom;
pub use sse::{LoopRegion, Sse, SseHeader, SseKind};
pub use sses::{SseFilter, Sses};
pub use stride::Stride;

/// Which backbone side of a residue carries the hydrogen bond.
///
/// Used to decide whether an edge residue one past an SSE terminus still
/// belongs to the SSE for pairing purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HbondSide {
    /// The residue's N–H donates.
    N,
    /// The residue's C=O accepts.
    C,
    /// No preference.
    Any,
}
