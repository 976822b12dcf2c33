//! The β–α–β handedness filter.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::bab::direction_with_reverse;
use crate::bab::side::TriangleSide;
use crate::pdb::{CaAtom, SseKind};
use crate::sheet::{PairKey, SheetTopology, SubStrand};

pub const DEFAULT_MAX_MID_RESIDUES: u32 = 60;
pub const DEFAULT_MAX_MID_STRANDS: u32 = 1;
pub const DEFAULT_CUTOFF_LEFT_SCORE: f32 = 0.6;
pub const DEFAULT_MIN_SIDE_DIST: f32 = 1.0;

/// Tunables of the handedness filter.
#[derive(Debug, Clone, Copy)]
pub struct BabConfig {
    /// Reject units whose intervening part has more residues than this.
    pub max_mid_residues: u32,
    /// Reject units with more same-sheet strands in between than this.
    pub max_mid_strands: u32,
    /// Score threshold separating left- from right-handed.
    pub cutoff_left_score: f32,
    /// Probe atoms closer than this to a triangle plane are not counted.
    pub min_side_dist: f32,
    /// When true (the default) a unit is a hit when its score exceeds the
    /// cutoff; flip to select right-handed units instead.
    pub left_if_greater: bool,
    /// Also count the CA atoms of the loops between the unit's SSEs.
    pub with_loops: bool,
}

impl Default for BabConfig {
    fn default() -> Self {
        BabConfig {
            max_mid_residues: DEFAULT_MAX_MID_RESIDUES,
            max_mid_strands: DEFAULT_MAX_MID_STRANDS,
            cutoff_left_score: DEFAULT_CUTOFF_LEFT_SCORE,
            min_side_dist: DEFAULT_MIN_SIDE_DIST,
            left_if_greater: true,
            with_loops: false,
        }
    }
}

/// Outcome of filtering one candidate unit.
#[derive(Debug, Clone, Copy, Default)]
pub struct BabResult {
    /// True when the unit passed all gates and a score was computed.
    pub success: bool,
    /// Bit 0: helices counted; bit 1: loops counted; bit 2: other-sheet
    /// strands counted. Zero only when `success` is false.
    pub connection_type: u8,
    /// Gate that rejected the unit (1..=5); 0 when none did.
    pub non_bab_reason: u8,
    /// Fraction of counted probe atoms on the left-handed side.
    pub left_score: f32,
    /// Residues of the intervening SSEs (and loops when configured).
    pub mid_res_len: u32,
    /// Probe-atom/triangle decisions that passed the distance gate.
    pub tri_atom_count: u32,
    /// Real probe atoms encountered.
    pub n_real_atoms: u32,
    /// Intervening strands on the same sheet as the first sub-strand.
    pub n_mid_strands: u32,
    pub jump: usize,
    pub sub_first: SubStrand,
    pub sub_last: SubStrand,
}

impl BabResult {
    fn new(sub_first: SubStrand, sub_last: SubStrand) -> Self {
        BabResult {
            sub_first,
            sub_last,
            ..Default::default()
        }
    }
}

/// Scores β–α–β (and related) candidates against the triangulated sides of
/// their flanking sub-strand pair.
pub struct BabFilter<'a> {
    topo: &'a SheetTopology,
    sides: BTreeMap<PairKey, Vec<TriangleSide>>,
    cfg: BabConfig,
    last: BabResult,
}

impl<'a> BabFilter<'a> {
    pub fn new(topo: &'a SheetTopology, cfg: BabConfig) -> Self {
        let sides = init_sides_map(topo);
        BabFilter {
            topo,
            sides,
            cfg,
            last: BabResult::default(),
        }
    }

    /// The result of the most recent run.
    pub fn result(&self) -> &BabResult {
        &self.last
    }

    /// Filter the SSE window `seq` (first and last must be strands), trying
    /// every sub-strand pair of the flanking strands. `reverse` virtually
    /// reverses the SSEs whose bit is set.
    pub fn run(&mut self, seq: &[usize], reverse: u64) -> bool {
        let (Some(&first), Some(&last)) = (seq.first(), seq.last()) else {
            self.last = BabResult::default();
            self.last.non_bab_reason = 2;
            return false;
        };
        if self.topo.sses[first].kind != SseKind::Strand
            || self.topo.sses[last].kind != SseKind::Strand
        {
            self.last = BabResult::default();
            self.last.non_bab_reason = 1;
            return false;
        }

        let serial_first = self.topo.sses.strand_serial(first).expect("strand");
        let serial_last = self.topo.sses.strand_serial(last).expect("strand");
        for &sub_first in self.topo.substrands.of_strand(serial_first) {
            for &sub_last in self.topo.substrands.of_strand(serial_last) {
                if self.run_pair(sub_first, sub_last, seq, reverse) {
                    return true;
                }
            }
        }
        false
    }

    /// Filter one specific sub-strand pair.
    pub fn run_pair(
        &mut self,
        ss0: SubStrand,
        ss1: SubStrand,
        seq: &[usize],
        reverse: u64,
    ) -> bool {
        self.last = BabResult::new(ss0, ss1);

        let cond = self.non_bab_condition(seq);
        if cond != 0 {
            self.last.non_bab_reason = cond;
            return false;
        }

        let attr = self.topo.attr(ss0, ss1);
        let rev_first = reverse & (1 << seq[0]) != 0;
        let rev_last = reverse & (1 << *seq.last().unwrap()) != 0;
        if !attr.reachable
            || !direction_with_reverse(attr.direction, rev_first, rev_last).is_parallel()
        {
            self.last.non_bab_reason = 3;
            return false;
        }

        let mut result = self.filter_one_unit(ss0, ss1, rev_first, rev_last, seq);
        result.jump = attr.jump;
        self.last = result;

        self.last.success && self.is_hit(self.last.left_score)
    }

    fn is_hit(&self, score: f32) -> bool {
        if self.cfg.left_if_greater {
            score > self.cfg.cutoff_left_score
        } else {
            score < self.cfg.cutoff_left_score
        }
    }

    /// 0 when the window can hold a unit, otherwise the reject reason.
    fn non_bab_condition(&self, seq: &[usize]) -> u8 {
        match seq.len() {
            0 | 1 => 2,
            2 if !self.cfg.with_loops => 2,
            _ => 0,
        }
    }

    fn filter_one_unit(
        &self,
        b0: SubStrand,
        b1: SubStrand,
        b0_reverse: bool,
        b1_reverse: bool,
        seq: &[usize],
    ) -> BabResult {
        let mut result = BabResult::new(b0, b1);

        if self.cfg.with_loops {
            if let Some(first_loop) = self.topo.sses.loop_after(seq[0]) {
                let counts = self.count_left(b0, b1, b0_reverse, b1_reverse, &first_loop.atoms);
                result.left_score += counts.0 as f32;
                result.tri_atom_count += counts.1;
                result.n_real_atoms += first_loop.n_real as u32;
                result.mid_res_len += first_loop.atoms.len() as u32;
                if first_loop.n_real > 0 {
                    result.connection_type |= 2;
                }
            }
        }

        for &sse_id in &seq[1..seq.len() - 1] {
            let sse = &self.topo.sses[sse_id];
            result.mid_res_len += sse.atoms.len() as u32;
            if self.cfg.max_mid_residues < result.mid_res_len {
                result.non_bab_reason = 4;
                return result;
            }

            match sse.kind {
                SseKind::Helix => {
                    let counts = self.count_left(b0, b1, b0_reverse, b1_reverse, &sse.atoms);
                    result.left_score += counts.0 as f32;
                    result.tri_atom_count += counts.1;
                    result.n_real_atoms += sse.n_real as u32;
                    if counts.1 > 0 {
                        result.connection_type |= 1;
                    }
                }
                SseKind::Strand => {
                    let serial = self.topo.sses.strand_serial(sse_id).expect("strand");
                    for &mid_ss in self.topo.substrands.of_strand(serial) {
                        // strands of the same sheet are not probes
                        if self.topo.attr(b0, mid_ss).reachable {
                            result.n_mid_strands += 1;
                            if self.cfg.max_mid_strands < result.n_mid_strands {
                                result.non_bab_reason = 5;
                                return result;
                            }
                            continue;
                        }
                        let counts = self.count_left(
                            b0,
                            b1,
                            b0_reverse,
                            b1_reverse,
                            self.topo.atoms(mid_ss),
                        );
                        result.left_score += counts.0 as f32;
                        result.tri_atom_count += counts.1;
                        result.n_real_atoms += sse.n_real as u32;
                        if counts.1 > 0 {
                            result.connection_type |= 4;
                        }
                    }
                }
            }

            if self.cfg.with_loops {
                if let Some(mid_loop) = self.topo.sses.loop_after(sse_id) {
                    let counts =
                        self.count_left(b0, b1, b0_reverse, b1_reverse, &mid_loop.atoms);
                    result.left_score += counts.0 as f32;
                    result.tri_atom_count += counts.1;
                    result.n_real_atoms += mid_loop.n_real as u32;
                    result.mid_res_len += mid_loop.atoms.len() as u32;
                }
            }
        }

        if self.cfg.max_mid_residues < result.mid_res_len {
            result.non_bab_reason = 4;
            return result;
        }

        if result.tri_atom_count != 0 {
            result.left_score /= result.tri_atom_count as f32;
        } else {
            result.left_score = 0.0;
        }
        result.success = true;
        result
    }

    /// Count `(left, total)` of real probe atoms against all sides of both
    /// orientations of the flanking pair.
    fn count_left(
        &self,
        b0: SubStrand,
        b1: SubStrand,
        b0_reverse: bool,
        b1_reverse: bool,
        atoms: &[CaAtom],
    ) -> (u32, u32) {
        let mut left = 0;
        let mut total = 0;
        let sides_0 = &self.sides[&PairKey::new(b0, b1)];
        let sides_1 = &self.sides[&PairKey::new(b1, b0)];

        for atom in atoms {
            if !atom.real {
                continue;
            }
            for side in sides_0 {
                let (on_left, is_distant) =
                    side.on_left_side(atom.xyz, b0_reverse, true, self.cfg.min_side_dist);
                if is_distant {
                    total += 1;
                    if on_left {
                        left += 1;
                    }
                }
            }
            for side in sides_1 {
                let (on_left, is_distant) =
                    side.on_left_side(atom.xyz, b1_reverse, false, self.cfg.min_side_dist);
                if is_distant {
                    total += 1;
                    if on_left {
                        left += 1;
                    }
                }
            }
        }
        (left, total)
    }
}

/// One vector of sides per ordered reachable sub-strand pair; when the two
/// strands differ in length, only the widest-angle sides of the longer one
/// are kept.
fn init_sides_map(topo: &SheetTopology) -> BTreeMap<PairKey, Vec<TriangleSide>> {
    let mut map = BTreeMap::new();
    let subs = topo.substrands.all();
    for (i, &ss0) in subs.iter().enumerate() {
        for &ss1 in &subs[i + 1..] {
            let key = PairKey::new(ss0, ss1);
            if !topo.attr_directed(ss0, ss1).reachable
                && !topo.attr_directed(ss1, ss0).reachable
            {
                continue;
            }

            let mut sides_0 = gen_sides_vec(topo, ss0, ss1);
            let mut sides_1 = gen_sides_vec(topo, ss1, ss0);

            if sides_0.len() != sides_1.len() {
                let keep = sides_0.len().min(sides_1.len());
                let longer = if sides_0.len() > sides_1.len() {
                    &mut sides_0
                } else {
                    &mut sides_1
                };
                longer.sort_by(|a, b| {
                    b.max_angle()
                        .partial_cmp(&a.max_angle())
                        .unwrap_or(Ordering::Equal)
                });
                longer.truncate(keep);
            }

            map.insert(key, sides_0);
            map.insert(key.reverse(), sides_1);
        }
    }
    map
}

/// A side for every consecutive CA pair of `ss0`, triangulated against `ss1`.
fn gen_sides_vec(topo: &SheetTopology, ss0: SubStrand, ss1: SubStrand) -> Vec<TriangleSide> {
    let atoms = topo.atoms(ss0);
    let opposite = topo.atoms(ss1);
    atoms
        .windows(2)
        .map(|w| TriangleSide::new(w[0].xyz, w[1].xyz, opposite))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdb::sse::{SseHeader, SseKind};
    use crate::pdb::{Sses, Stride};
    use glam::Vec3;
    use std::collections::BTreeMap;

    /// Two parallel strands A=[1..4], B=[20..23] in the z=0 plane with a
    /// helix H=[8..16] in between. Bridges 2–21, 3–22, 4–23.
    ///
    /// The helix CA height above the sheet plane is a parameter: at z > 1
    /// every triangle sees it on the left-handed side.
    fn bab_structure(helix_z: f32, drop_helix_residue: Option<i32>) -> (Sses, Stride) {
        let mut ca_map: BTreeMap<i32, Vec3> = BTreeMap::new();
        for r in 1..=4 {
            ca_map.insert(r, Vec3::new(r as f32, 0.0, 0.0));
        }
        for r in 20..=23 {
            ca_map.insert(r, Vec3::new((r - 19) as f32, 5.0, 0.0));
        }
        for r in 8..=16 {
            ca_map.insert(r, Vec3::new((r - 8) as f32 * 0.5, 2.5, helix_z));
        }
        if let Some(r) = drop_helix_residue {
            ca_map.remove(&r);
        }

        let headers = vec![
            SseHeader {
                kind: SseKind::Strand,
                init: 1,
                end: 4,
            },
            SseHeader {
                kind: SseKind::Helix,
                init: 8,
                end: 16,
            },
            SseHeader {
                kind: SseKind::Strand,
                init: 20,
                end: 23,
            },
        ];
        let sses = Sses::from_parts(headers, &ca_map).unwrap();
        let stride = Stride {
            headers: Vec::new(),
            hbonds: vec![(2, 20), (22, 2), (4, 22), (24, 4)],
        };
        (sses, stride)
    }

    fn ss(strand: usize, substr: usize) -> SubStrand {
        SubStrand::new(strand, substr)
    }

    #[test]
    fn left_handed_unit_scores_one() {
        let (sses, stride) = bab_structure(5.0, None);
        let topo = SheetTopology::new(sses, &stride).unwrap();
        let mut filter = BabFilter::new(&topo, BabConfig::default());

        let hit = filter.run(&[0, 1, 2], 0);
        assert!(hit);
        let result = filter.result();
        assert!(result.success);
        assert_eq!(result.left_score, 1.0);
        assert_eq!(result.connection_type, 1);
        assert_eq!(result.jump, 0);
        assert_eq!(result.mid_res_len, 9);
        // 9 helix atoms x (2 + 2) triangles, all beyond the dead zone
        assert_eq!(result.tri_atom_count, 36);
    }

    #[test]
    fn right_handed_unit_is_no_hit() {
        let (sses, stride) = bab_structure(-5.0, None);
        let topo = SheetTopology::new(sses, &stride).unwrap();
        let mut filter = BabFilter::new(&topo, BabConfig::default());

        let hit = filter.run(&[0, 1, 2], 0);
        assert!(!hit);
        let result = filter.result();
        assert!(result.success);
        assert_eq!(result.left_score, 0.0);
        assert_eq!(result.connection_type, 1);
    }

    #[test]
    fn missing_helix_residue_is_skipped() {
        let (sses, stride) = bab_structure(5.0, Some(12));
        let topo = SheetTopology::new(sses, &stride).unwrap();
        assert!(!topo.sses[1].entire);
        assert!(!topo.sses[1].with_rep);

        let mut filter = BabFilter::new(&topo, BabConfig::default());
        assert!(filter.run(&[0, 1, 2], 0));
        let result = filter.result();
        assert_eq!(result.left_score, 1.0);
        // one of the nine probe atoms is padding now
        assert_eq!(result.tri_atom_count, 32);
    }

    #[test]
    fn non_strand_endpoint_is_reason_one() {
        let (sses, stride) = bab_structure(5.0, None);
        let topo = SheetTopology::new(sses, &stride).unwrap();
        let mut filter = BabFilter::new(&topo, BabConfig::default());

        assert!(!filter.run(&[1, 2], 0));
        assert_eq!(filter.result().non_bab_reason, 1);
    }

    #[test]
    fn no_mid_sse_is_reason_two() {
        let (sses, stride) = bab_structure(5.0, None);
        let topo = SheetTopology::new(sses, &stride).unwrap();
        let mut filter = BabFilter::new(&topo, BabConfig::default());

        assert!(!filter.run_pair(ss(0, 0), ss(1, 0), &[0], 0));
        assert_eq!(filter.result().non_bab_reason, 2);
    }

    #[test]
    fn single_reversal_fails_the_direction_gate() {
        let (sses, stride) = bab_structure(5.0, None);
        let topo = SheetTopology::new(sses, &stride).unwrap();
        let mut filter = BabFilter::new(&topo, BabConfig::default());

        // reversing only the first strand makes the pair apparently anti-parallel
        assert!(!filter.run(&[0, 1, 2], 1 << 0));
        assert_eq!(filter.result().non_bab_reason, 3);

        // reversing both flanks restores the apparent direction
        assert!(filter.run(&[0, 1, 2], (1 << 0) | (1 << 2)));
    }

    #[test]
    fn too_many_mid_residues_is_reason_four() {
        let (sses, stride) = bab_structure(5.0, None);
        let topo = SheetTopology::new(sses, &stride).unwrap();
        let cfg = BabConfig {
            max_mid_residues: 5,
            ..Default::default()
        };
        let mut filter = BabFilter::new(&topo, cfg);

        assert!(!filter.run(&[0, 1, 2], 0));
        let result = filter.result();
        assert!(!result.success);
        assert_eq!(result.non_bab_reason, 4);
    }

    #[test]
    fn score_is_always_a_fraction() {
        let (sses, stride) = bab_structure(2.0, None);
        let topo = SheetTopology::new(sses, &stride).unwrap();
        let mut filter = BabFilter::new(&topo, BabConfig::default());
        filter.run(&[0, 1, 2], 0);
        let result = filter.result();
        assert!(result.success);
        assert!((0.0..=1.0).contains(&result.left_score));
    }
}
