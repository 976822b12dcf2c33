//! CA atom records.

use glam::Vec3;

/// One CA position inside an SSE's dense residue vector.
///
/// Slots for residues missing from the ATOM records are padding: `real` is
/// false and the coordinates are zero. Padding atoms are never used in
/// geometric decisions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaAtom {
    pub xyz: Vec3,
    pub real: bool,
}

impl CaAtom {
    pub fn real(xyz: Vec3) -> Self {
        CaAtom { xyz, real: true }
    }

    pub fn padding() -> Self {
        CaAtom {
            xyz: Vec3::ZERO,
            real: false,
        }
    }
}

impl Default for CaAtom {
    fn default() -> Self {
        CaAtom::padding()
    }
}
