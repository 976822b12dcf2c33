//! Topology filters over consecutive strand pairs: parallel crossover
//! connections and long anti-parallel jumps.

use crate::sheet::topology::SheetTopology;
use crate::sheet::{Direction, SubStrand};

pub const PCC_MIN_ALLOWED_JUMP: usize = 1;
pub const APJ_MAX_ALLOWED_JUMP: usize = 1;

/// Apparent orientation of two strands once virtual reversals are applied:
/// reversing both ends leaves the orientation unchanged, reversing exactly
/// one flips it.
pub fn direction_with_reverse(
    direction: Direction,
    rev_first: bool,
    rev_last: bool,
) -> Direction {
    if rev_first == rev_last {
        direction
    } else {
        direction.flip()
    }
}

/// The sub-strand a traversal enters (`first = false`) or leaves
/// (`first = true`) a strand through, honoring a virtual reversal.
pub fn terminal_substr(
    topo: &SheetTopology,
    sse_id: usize,
    first: bool,
    reversed: bool,
) -> Option<SubStrand> {
    let serial = topo.sses.strand_serial(sse_id)?;
    if first == reversed {
        topo.substrands.n_term_sub(serial)
    } else {
        topo.substrands.c_term_sub(serial)
    }
}

/// The pair of terminal sub-strands between two consecutive strands, with
/// the apparent direction and jump. None when a strand lost its sub-strands
/// or the pair is unreachable.
fn consecutive_pair(
    topo: &SheetTopology,
    sse_0: usize,
    sse_1: usize,
    reversed_0: bool,
    reversed_1: bool,
) -> Option<(SubStrand, SubStrand, Direction, usize)> {
    let ss0 = terminal_substr(topo, sse_0, true, reversed_0)?;
    let ss1 = terminal_substr(topo, sse_1, false, reversed_1)?;
    let attr = topo.attr(ss0, ss1);
    if !attr.reachable {
        return None;
    }
    let apparent = direction_with_reverse(attr.direction, reversed_0, reversed_1);
    Some((ss0, ss1, apparent, attr.jump))
}

/// Flags parallel crossover connections: consecutive strands, apparently
/// parallel, closer than the minimum allowed jump.
#[derive(Debug, Clone, Copy)]
pub struct PccFilter {
    pub min_allowed_jump: usize,
}

impl Default for PccFilter {
    fn default() -> Self {
        PccFilter {
            min_allowed_jump: PCC_MIN_ALLOWED_JUMP,
        }
    }
}

impl PccFilter {
    pub fn is_rare(
        &self,
        topo: &SheetTopology,
        sse_0: usize,
        sse_1: usize,
        reversed_0: bool,
        reversed_1: bool,
    ) -> bool {
        match consecutive_pair(topo, sse_0, sse_1, reversed_0, reversed_1) {
            Some((_, _, dir, jump)) => dir.is_parallel() && jump < self.min_allowed_jump,
            None => false,
        }
    }
}

/// Flags anti-parallel connections jumping farther than allowed.
#[derive(Debug, Clone, Copy)]
pub struct ApJumpFilter {
    pub max_allowed_jump: usize,
}

impl Default for ApJumpFilter {
    fn default() -> Self {
        ApJumpFilter {
            max_allowed_jump: APJ_MAX_ALLOWED_JUMP,
        }
    }
}

impl ApJumpFilter {
    pub fn is_rare(
        &self,
        topo: &SheetTopology,
        sse_0: usize,
        sse_1: usize,
        reversed_0: bool,
        reversed_1: bool,
    ) -> bool {
        match consecutive_pair(topo, sse_0, sse_1, reversed_0, reversed_1) {
            Some((_, _, dir, jump)) => !dir.is_parallel() && self.max_allowed_jump < jump,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdb::sse::{SseHeader, SseKind};
    use crate::pdb::{Sses, Stride};
    use glam::Vec3;
    use std::collections::BTreeMap;

    fn parallel_pair_topo() -> SheetTopology {
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
        let sses = Sses::from_parts(headers, &ca_map).unwrap();
        let stride = Stride {
            headers: Vec::new(),
            hbonds: vec![(2, 10), (12, 2), (4, 12), (14, 4)],
        };
        SheetTopology::new(sses, &stride).unwrap()
    }

    #[test]
    fn pcc_flags_adjacent_parallel_pair() {
        let topo = parallel_pair_topo();
        let pcc = PccFilter::default();
        assert!(pcc.is_rare(&topo, 0, 1, false, false));
        // reversing one end makes it apparently anti-parallel
        assert!(!pcc.is_rare(&topo, 0, 1, true, false));
    }

    #[test]
    fn apj_needs_a_long_antiparallel_jump() {
        let topo = parallel_pair_topo();
        let apj = ApJumpFilter::default();
        // adjacent pair: jump 0 never exceeds the allowed maximum
        assert!(!apj.is_rare(&topo, 0, 1, false, false));
        assert!(!apj.is_rare(&topo, 0, 1, true, false));
    }
}
