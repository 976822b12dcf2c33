//! Per-strand hydrogen-bond pair lists built from the STRIDE donor records.

use std::cmp::Ordering;

use crate::pdb::{HbondSide, SseFilter, Sses, Stride};
use crate::sheet::UndirectedAdj;

/// One hydrogen bond normalised onto a target strand.
///
/// `res0` lies on (or one residue past) the target strand; `res1` is the
/// partner. `reversed` is false when `res0`'s N donates to `res1`'s C=O and
/// true for the opposite orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hbond {
    pub res0: i32,
    pub res1: i32,
    pub reversed: bool,
}

impl Hbond {
    /// Which side of `res0` carries the bond, for SSE lookup of `res1`.
    pub fn partner_side(&self) -> HbondSide {
        if self.reversed {
            HbondSide::N
        } else {
            HbondSide::C
        }
    }
}

/// The H-bond lists per strand (indexed by strand serial id).
#[derive(Debug, Clone)]
pub struct HbondPairs {
    pub involved: Vec<Vec<Hbond>>,
}

impl HbondPairs {
    pub fn new(sses: &Sses, stride: &Stride) -> Self {
        let involved = sses
            .indices(SseFilter::Strand, true)
            .iter()
            .map(|&sse_id| involve_with(&stride.hbonds, sses, sse_id, 1))
            .collect();
        HbondPairs { involved }
    }

    /// The involved pairs of one strand re-sorted for strict-zone seeding:
    /// by target residue, then along the partner strand in its pairing
    /// direction (ascending for parallel, descending for anti-parallel).
    pub fn resorted(
        &self,
        strand_serial: usize,
        undirected: &UndirectedAdj,
        sses: &Sses,
    ) -> Vec<Hbond> {
        let sse_id = sses.indices(SseFilter::Strand, true)[strand_serial];
        let mut out = self.involved[strand_serial].clone();
        out.sort_by(|a, b| {
            match a.res0.cmp(&b.res0) {
                Ordering::Equal => {}
                other => return other,
            }
            let (Some(sse_a), Some(sse_b)) = (partner_strand(sses, a), partner_strand(sses, b))
            else {
                return Ordering::Equal;
            };
            if sse_a != sse_b {
                return Ordering::Equal;
            }
            let Some(data) = undirected.get(&(sse_id, sse_a)) else {
                return Ordering::Equal;
            };
            let by_res1 = if data.direction.is_parallel() {
                a.res1.cmp(&b.res1)
            } else {
                b.res1.cmp(&a.res1)
            };
            match by_res1 {
                Ordering::Equal => a.reversed.cmp(&b.reversed),
                other => other,
            }
        });
        out
    }
}

/// SSE id of the strand holding the partner residue of an H-bond, if any.
pub fn partner_strand(sses: &Sses, hbond: &Hbond) -> Option<usize> {
    sses.sse_containing(hbond.res1, SseFilter::Strand, 1, true, hbond.partner_side())
}

/// All hydrogen bonds with an endpoint on strand `sse_id` (allowing one
/// residue of overhang), normalised so the first component is on the strand.
fn involve_with(dnr: &[(i32, i32)], sses: &Sses, sse_id: usize, offset: i32) -> Vec<Hbond> {
    let sse = &sses[sse_id];
    let mut out = Vec::new();
    for &(donor, acceptor) in dnr {
        if sse.in_range(donor, offset, HbondSide::N) {
            out.push(Hbond {
                res0: donor,
                res1: acceptor,
                reversed: false,
            });
        } else if sse.in_range(acceptor, offset, HbondSide::C) {
            out.push(Hbond {
                res0: acceptor,
                res1: donor,
                reversed: true,
            });
        }
    }
    out.sort_by(|a, b| {
        (a.res0, a.reversed, a.res1).cmp(&(b.res0, b.reversed, b.res1))
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdb::sse::{SseHeader, SseKind};
    use glam::Vec3;
    use std::collections::BTreeMap;

    fn two_strand_sses() -> Sses {
        let ca_map: BTreeMap<i32, Vec3> = (1..=14)
            .map(|r| (r, Vec3::new(r as f32, 0.0, 0.0)))
            .collect();
        let headers = vec![
            SseHeader {
                kind: SseKind::Strand,
                init: 1,
                end: 5,
            },
            SseHeader {
                kind: SseKind::Strand,
                init: 10,
                end: 14,
            },
        ];
        Sses::from_parts(headers, &ca_map).unwrap()
    }

    #[test]
    fn involved_pairs_are_normalised_and_sorted() {
        let sses = two_strand_sses();
        let stride = Stride {
            headers: Vec::new(),
            hbonds: vec![(1, 14), (14, 1), (3, 12), (12, 3)],
        };
        let pairs = HbondPairs::new(&sses, &stride);

        // strand 0 sees all four bonds, first component always on it
        assert_eq!(
            pairs.involved[0],
            vec![
                Hbond {
                    res0: 1,
                    res1: 14,
                    reversed: false
                },
                Hbond {
                    res0: 1,
                    res1: 14,
                    reversed: true
                },
                Hbond {
                    res0: 3,
                    res1: 12,
                    reversed: false
                },
                Hbond {
                    res0: 3,
                    res1: 12,
                    reversed: true
                },
            ]
        );
    }

    #[test]
    fn overhang_residue_participates_on_outward_side() {
        let sses = two_strand_sses();
        // residue 6 is one past strand 0's C-terminus: only its N–H side counts
        let stride = Stride {
            headers: Vec::new(),
            hbonds: vec![(6, 10), (10, 6)],
        };
        let pairs = HbondPairs::new(&sses, &stride);
        assert_eq!(
            pairs.involved[0],
            vec![Hbond {
                res0: 6,
                res1: 10,
                reversed: false
            }]
        );
    }
}
