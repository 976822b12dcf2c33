//! Secondary-structure elements and the loop regions between them.

use std::collections::BTreeMap;

use glam::Vec3;

use crate::error::{Result, TopoError};
use crate::pdb::{CaAtom, HbondSide};

/// Minimum residue counts below which an SSE is flagged `too_short`.
pub const HELIX_MIN_LEN: i32 = 5;
pub const STRAND_MIN_LEN: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SseKind {
    Helix,
    Strand,
}

impl SseKind {
    pub fn from_char(c: char) -> Result<Self> {
        match c {
            'H' => Ok(SseKind::Helix),
            'E' => Ok(SseKind::Strand),
            other => Err(TopoError::UnknownSseKind(other)),
        }
    }

    pub fn code(self) -> char {
        match self {
            SseKind::Helix => 'H',
            SseKind::Strand => 'E',
        }
    }
}

/// Raw header line before atom resolution. Sortable by initial residue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SseHeader {
    pub kind: SseKind,
    pub init: i32,
    pub end: i32,
}

/// Weighted-mean windows for the representative atoms of each SSE kind.
struct ReprInfo {
    len: usize,
    coeff: &'static [f32],
    div: f32,
    intrvl: usize,
}

impl ReprInfo {
    fn for_kind(kind: SseKind) -> Self {
        match kind {
            SseKind::Helix => ReprInfo {
                len: 4,
                coeff: &[0.74, 1.0, 1.0, 0.74],
                div: 3.48,
                intrvl: 1,
            },
            SseKind::Strand => ReprInfo {
                len: 2,
                coeff: &[1.0, 1.0],
                div: 2.0,
                intrvl: 1,
            },
        }
    }
}

/// One SSE with its dense CA vector over `[init, end]`.
#[derive(Debug, Clone)]
pub struct Sse {
    pub kind: SseKind,
    pub init: i32,
    pub end: i32,
    /// Index of this SSE in the sorted SSE list.
    pub index: usize,
    /// False if at least one residue in range has no ATOM record.
    pub entire: bool,
    pub atoms: Vec<CaAtom>,
    /// Number of real (non-padding) atoms.
    pub n_real: usize,
    pub too_short: bool,
    /// `[n_term_side, c_term_side]`, each `[outer_mean, inner_mean]`.
    /// Zeros when `with_rep` is false.
    pub rep_atoms: [[Vec3; 2]; 2],
    pub with_rep: bool,
}

impl Sse {
    pub fn new(
        header: SseHeader,
        index: usize,
        ca_map: &BTreeMap<i32, Vec3>,
    ) -> Result<Self> {
        if header.end < header.init {
            return Err(TopoError::InvalidSseRange {
                init: header.init,
                end: header.end,
            });
        }

        let mut entire = true;
        let mut atoms = Vec::with_capacity((header.end - header.init + 1) as usize);
        for resnum in header.init..=header.end {
            match ca_map.get(&resnum) {
                Some(&xyz) => atoms.push(CaAtom::real(xyz)),
                None => {
                    log::warn!(
                        "residue {resnum} is missing in SSE index {index}; slot kept as padding"
                    );
                    entire = false;
                    atoms.push(CaAtom::padding());
                }
            }
        }
        let n_real = atoms.iter().filter(|a| a.real).count();

        let len = header.end - header.init + 1;
        let too_short = match header.kind {
            SseKind::Helix => len < HELIX_MIN_LEN,
            SseKind::Strand => len < STRAND_MIN_LEN,
        };

        let rep = ReprInfo::for_kind(header.kind);
        let head = gen_representative(&atoms, &rep, 0);
        let tail_first = atoms.len() as isize - rep.len as isize - rep.intrvl as isize;
        let tail = if tail_first < 0 {
            None
        } else {
            gen_representative(&atoms, &rep, tail_first as usize)
        };
        let (rep_atoms, with_rep) = match (head, tail) {
            (Some(h), Some(t)) => ([h, t], true),
            _ => ([[Vec3::ZERO; 2]; 2], false),
        };

        Ok(Sse {
            kind: header.kind,
            init: header.init,
            end: header.end,
            index,
            entire,
            atoms,
            n_real,
            too_short,
            rep_atoms,
            with_rep,
        })
    }

    /// Whether `resnum` is inside this SSE, optionally extended by `offset`.
    ///
    /// With `HbondSide::N` the extension applies only past the C-terminus,
    /// with `HbondSide::C` only past the N-terminus: an edge residue counts
    /// as part of the SSE only when its bonding group points outward.
    pub fn in_range(&self, resnum: i32, offset: i32, side: HbondSide) -> bool {
        let first = if side == HbondSide::N {
            self.init
        } else {
            self.init - offset
        };
        let last = if side == HbondSide::C {
            self.end
        } else {
            self.end + offset
        };
        first <= resnum && resnum <= last
    }

    /// Index into `atoms` for a residue number, if in range.
    pub fn atom_index(&self, resnum: i32) -> Option<usize> {
        let idx = resnum - self.init;
        if idx < 0 || idx as usize >= self.atoms.len() {
            return None;
        }
        Some(idx as usize)
    }

    /// Representative CA coordinates at the unit's outer/inner ends, honoring
    /// a virtual reversal of this SSE.
    pub fn rep_outer_head(&self, reversed: bool) -> Vec3 {
        if reversed {
            self.rep_atoms[1][1]
        } else {
            self.rep_atoms[0][0]
        }
    }

    pub fn rep_inner_head(&self, reversed: bool) -> Vec3 {
        if reversed {
            self.rep_atoms[1][0]
        } else {
            self.rep_atoms[0][1]
        }
    }

    pub fn rep_inner_tail(&self, reversed: bool) -> Vec3 {
        if reversed {
            self.rep_atoms[0][1]
        } else {
            self.rep_atoms[1][0]
        }
    }

    pub fn rep_outer_tail(&self, reversed: bool) -> Vec3 {
        if reversed {
            self.rep_atoms[0][0]
        } else {
            self.rep_atoms[1][1]
        }
    }
}

/// `[mean(first..), mean(first+intrvl..)]`, or None when a padding atom falls
/// inside either window.
fn gen_representative(atoms: &[CaAtom], rep: &ReprInfo, first: usize) -> Option<[Vec3; 2]> {
    if atoms.len() < rep.len + rep.intrvl {
        return None;
    }
    let one = |start: usize| -> Option<Vec3> {
        let mut sum = Vec3::ZERO;
        for i in 0..rep.len {
            let a = atoms.get(start + i)?;
            if !a.real {
                return None;
            }
            sum += a.xyz * rep.coeff[i];
        }
        Some(sum / rep.div)
    };
    Some([one(first)?, one(first + rep.intrvl)?])
}

/// The stretch of residues between two consecutive SSEs.
#[derive(Debug, Clone)]
pub struct LoopRegion {
    pub init: i32,
    pub end: i32,
    pub index: usize,
    pub atoms: Vec<CaAtom>,
    pub n_real: usize,
    /// True when the flanking SSEs touch and no residue lies between them.
    pub zero_size: bool,
}

impl LoopRegion {
    pub fn new(init: i32, end: i32, index: usize, ca_map: &BTreeMap<i32, Vec3>) -> Self {
        if end < init {
            log::warn!("zero-length loop between SSE indices {} and {}", index, index + 1);
            return LoopRegion {
                init,
                end,
                index,
                atoms: Vec::new(),
                n_real: 0,
                zero_size: true,
            };
        }
        let atoms: Vec<CaAtom> = (init..=end)
            .map(|r| match ca_map.get(&r) {
                Some(&xyz) => CaAtom::real(xyz),
                None => CaAtom::padding(),
            })
            .collect();
        let n_real = atoms.iter().filter(|a| a.real).count();
        LoopRegion {
            init,
            end,
            index,
            atoms,
            n_real,
            zero_size: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ca_map(range: std::ops::RangeInclusive<i32>) -> BTreeMap<i32, Vec3> {
        range
            .map(|r| (r, Vec3::new(r as f32, 0.0, 0.0)))
            .collect()
    }

    #[test]
    fn strand_too_short_threshold() {
        let map = ca_map(1..=10);
        let short = Sse::new(
            SseHeader {
                kind: SseKind::Strand,
                init: 3,
                end: 3,
            },
            0,
            &map,
        )
        .unwrap();
        assert!(short.too_short);

        let ok = Sse::new(
            SseHeader {
                kind: SseKind::Strand,
                init: 3,
                end: 4,
            },
            0,
            &map,
        )
        .unwrap();
        assert!(!ok.too_short);
    }

    #[test]
    fn helix_too_short_threshold() {
        let map = ca_map(1..=10);
        let short = Sse::new(
            SseHeader {
                kind: SseKind::Helix,
                init: 1,
                end: 4,
            },
            0,
            &map,
        )
        .unwrap();
        assert!(short.too_short);
    }

    #[test]
    fn inverted_range_is_fatal() {
        let map = ca_map(1..=10);
        let err = Sse::new(
            SseHeader {
                kind: SseKind::Strand,
                init: 5,
                end: 3,
            },
            0,
            &map,
        );
        assert!(err.is_err());
    }

    #[test]
    fn missing_residue_disables_rep() {
        let mut map = ca_map(1..=5);
        map.remove(&3);
        let sse = Sse::new(
            SseHeader {
                kind: SseKind::Strand,
                init: 1,
                end: 5,
            },
            0,
            &map,
        )
        .unwrap();
        assert!(!sse.entire);
        assert!(!sse.with_rep);
        assert_eq!(sse.n_real, 4);
        assert!(!sse.atoms[2].real);
        assert_eq!(sse.atoms.len(), 5);
    }

    #[test]
    fn strand_representative_means() {
        let map = ca_map(1..=4);
        let sse = Sse::new(
            SseHeader {
                kind: SseKind::Strand,
                init: 1,
                end: 4,
            },
            0,
            &map,
        )
        .unwrap();
        assert!(sse.with_rep);
        // head outer = mean of residues 1,2; head inner = mean of 2,3
        assert_eq!(sse.rep_atoms[0][0], Vec3::new(1.5, 0.0, 0.0));
        assert_eq!(sse.rep_atoms[0][1], Vec3::new(2.5, 0.0, 0.0));
        // tail outer = mean of residues 3,4
        assert_eq!(sse.rep_atoms[1][1], Vec3::new(3.5, 0.0, 0.0));
        // reversal swaps head and tail
        assert_eq!(sse.rep_outer_head(true), sse.rep_atoms[1][1]);
        assert_eq!(sse.rep_outer_head(false), sse.rep_atoms[0][0]);
    }

    #[test]
    fn in_range_hbond_side_offsets() {
        let map = ca_map(10..=15);
        let sse = Sse::new(
            SseHeader {
                kind: SseKind::Strand,
                init: 10,
                end: 15,
            },
            0,
            &map,
        )
        .unwrap();
        assert!(sse.in_range(16, 1, HbondSide::N));
        assert!(!sse.in_range(16, 1, HbondSide::C));
        assert!(sse.in_range(9, 1, HbondSide::C));
        assert!(!sse.in_range(9, 1, HbondSide::N));
        assert!(sse.in_range(9, 1, HbondSide::Any));
        assert!(sse.in_range(16, 1, HbondSide::Any));
    }
}
