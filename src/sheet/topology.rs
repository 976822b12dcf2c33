//! The pipeline coordinator: from SSEs and STRIDE hydrogen bonds to the
//! directed sub-strand adjacency, sheets, and the all-pairs attribute cache.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::error::{Result, TopoError};
use crate::pdb::{CaAtom, SseFilter, Sses, Stride};
use crate::sheet::adjacency::{SideIndex, SubStrandAdjacency};
use crate::sheet::pairs::{partner_strand, Hbond, HbondPairs};
use crate::sheet::sheets::Sheets;
use crate::sheet::substrands::SubStrandRanges;
use crate::sheet::zone::StrictZone;
use crate::sheet::{
    Direction, PairKey, PairNode, StrandPairData, SubStrand, UndirectedAdj,
};

/// Cached relation between two sub-strands on the directed adjacency.
#[derive(Debug, Clone)]
pub struct PairAttribute {
    pub ss0: SubStrand,
    pub ss1: SubStrand,
    /// True when `ss1` is reachable from `ss0`. All other fields are
    /// meaningless when false.
    pub reachable: bool,
    /// Sub-strands jumped over on the path; 0 for direct neighbours.
    pub jump: usize,
    /// Orientation accumulated along the path.
    pub direction: Direction,
    /// Intermediate sub-strands, nearest-to-`ss1` first.
    pub jumped: Vec<SubStrand>,
}

impl PairAttribute {
    fn unreachable(ss0: SubStrand, ss1: SubStrand) -> Self {
        PairAttribute {
            ss0,
            ss1,
            reachable: false,
            jump: 0,
            direction: Direction::Parallel,
            jumped: Vec::new(),
        }
    }
}

/// BFS from `ss0` to `ss1` over the given outgoing-key view.
pub(crate) fn search_pair(
    adj_vec: &BTreeMap<SubStrand, Vec<PairKey>>,
    map: &BTreeMap<PairKey, PairNode>,
    ss0: SubStrand,
    ss1: SubStrand,
) -> PairAttribute {
    let mut attr = PairAttribute::unreachable(ss0, ss1);

    let mut parents: BTreeMap<SubStrand, SubStrand> = BTreeMap::new();
    let mut examined: BTreeSet<SubStrand> = BTreeSet::new();
    let mut queue: VecDeque<SubStrand> = VecDeque::from([ss0]);
    let mut found = false;

    while let Some(node) = queue.pop_front() {
        if !examined.insert(node) {
            continue;
        }
        if node == ss1 {
            found = true;
            break;
        }
        let Some(keys) = adj_vec.get(&node) else {
            continue;
        };
        for key in keys {
            let adj = key.s1;
            if examined.contains(&adj) {
                continue;
            }
            queue.push_back(adj);
            parents.entry(adj).or_insert(node);
        }
    }

    if !found {
        return attr;
    }
    attr.reachable = true;

    // Backtrace, accumulating the orientation edge by edge.
    let mut edges = 0usize;
    let mut last = ss1;
    while last != ss0 {
        edges += 1;
        let next = parents[&last];
        let node = &map[&PairKey::new(next, last)];
        attr.direction = attr.direction.combine(node.direction);
        if next != ss0 {
            attr.jumped.push(next);
        }
        last = next;
    }
    attr.jump = edges.saturating_sub(1);
    attr
}

/// β-sheet topology of one structure.
///
/// Construction runs the whole analysis: undirected strand adjacency with
/// direction votes, strict-zone seeding, the side/direction BFS, sub-strand
/// cleanup, sheet assembly with cycle detection and undirected-branch
/// pruning, and the all-pairs attribute cache.
#[derive(Debug, Clone)]
pub struct SheetTopology {
    pub sses: Sses,
    /// SSE ids of strands; position = strand serial.
    pub strand_indices: Vec<usize>,
    pub substrands: SubStrandRanges,
    pub zone: StrictZone,
    pub side_index: SideIndex,
    pub adjacency: SubStrandAdjacency,
    pub sheets: Sheets,
    attrs: BTreeMap<PairKey, PairAttribute>,
}

impl SheetTopology {
    pub fn new(sses: Sses, stride: &Stride) -> Result<Self> {
        let strand_indices = sses.indices(SseFilter::Strand, true).to_vec();
        let pairs = HbondPairs::new(&sses, stride);

        log::debug!("building undirected adjacency over {} strands", strand_indices.len());
        let (undirected, adj_index_map) = build_undirected(&sses, &strand_indices, &pairs)?;
        symmetry_check(&undirected, &strand_indices)?;

        let mut zone = StrictZone::new(&sses, &strand_indices);
        zone.seed(&sses, &pairs, &undirected, &adj_index_map)?;

        let mut substrands = SubStrandRanges::new(strand_indices.len());
        let mut side_index = SideIndex::default();
        let mut adjacency =
            zone.decide_side(&sses, &undirected, &mut substrands, &mut side_index)?;

        let mut sheets = Sheets::default();
        for &s0 in substrands.all() {
            for &s1 in substrands.all() {
                if s0 == s1 {
                    continue;
                }
                let attr = search_pair(adjacency.adj_vec(), adjacency.map(), s0, s1);
                if attr.reachable {
                    sheets.add(PairKey::new(s0, s1), &attr);
                }
            }
        }
        sheets.cycle_check(adjacency.map());

        // Undirected paths outside of any cycle carry a spurious reverse
        // edge; strip it so only cycles stay undirected.
        side_index.fix_undirected_paths(&mut adjacency, &sheets)?;
        sheets.add_key_vec(&adjacency);
        sheets.sort_sheets();

        let mut attrs = BTreeMap::new();
        for &s0 in substrands.all() {
            for &s1 in substrands.all() {
                if s0 == s1 {
                    continue;
                }
                let attr = search_pair(adjacency.adj_vec(), adjacency.map(), s0, s1);
                attrs.insert(PairKey::new(s0, s1), attr);
            }
        }

        Ok(SheetTopology {
            sses,
            strand_indices,
            substrands,
            zone,
            side_index,
            adjacency,
            sheets,
            attrs,
        })
    }

    /// BFS over the full directed adjacency.
    pub fn search(&self, ss0: SubStrand, ss1: SubStrand) -> PairAttribute {
        search_pair(self.adjacency.adj_vec(), self.adjacency.map(), ss0, ss1)
    }

    /// BFS over a restricted outgoing-key view.
    pub fn search_in(
        &self,
        ss0: SubStrand,
        ss1: SubStrand,
        adj_vec: &BTreeMap<SubStrand, Vec<PairKey>>,
    ) -> PairAttribute {
        search_pair(adj_vec, self.adjacency.map(), ss0, ss1)
    }

    /// The cached attribute of a pair, looked up in whichever direction is
    /// reachable (forward preferred).
    pub fn attr(&self, ss0: SubStrand, ss1: SubStrand) -> &PairAttribute {
        let key = PairKey::new(ss0, ss1);
        let fwd = &self.attrs[&key];
        if fwd.reachable {
            fwd
        } else {
            &self.attrs[&key.reverse()]
        }
    }

    /// The cached attribute in exactly the given direction.
    pub fn attr_directed(&self, ss0: SubStrand, ss1: SubStrand) -> &PairAttribute {
        &self.attrs[&PairKey::new(ss0, ss1)]
    }

    /// CA atoms covered by a sub-strand.
    pub fn atoms(&self, ss: SubStrand) -> &[CaAtom] {
        let sse = &self.sses[self.strand_indices[ss.strand]];
        let first = (self.substrands.n_term_res(ss) - sse.init) as usize;
        let last = (self.substrands.c_term_res(ss) - sse.init) as usize;
        &sse.atoms[first..=last]
    }

    /// Display label of a sub-strand: `<sse_id>_<substr_id>`.
    pub fn substr_label(&self, ss: SubStrand) -> String {
        format!("{}_{}", self.strand_indices[ss.strand], ss.substr)
    }

    /// Sub-strand → sheet index over all sheets.
    pub fn sheet_id_map(&self) -> BTreeMap<SubStrand, usize> {
        let mut map = BTreeMap::new();
        for (sheet_id, sheet) in self.sheets.iter().enumerate() {
            for &ss in sheet.members() {
                map.insert(ss, sheet_id);
            }
        }
        map
    }
}

/// Build the strand-level undirected adjacency by voting over consecutive
/// hydrogen bonds, and the per-strand adjacent-id sets.
fn build_undirected(
    sses: &Sses,
    strand_indices: &[usize],
    pairs: &HbondPairs,
) -> Result<(UndirectedAdj, BTreeMap<usize, BTreeSet<usize>>)> {
    let mut undirected = UndirectedAdj::new();
    let mut adj_index_map: BTreeMap<usize, BTreeSet<usize>> = BTreeMap::new();

    for (serial, &sse_id) in strand_indices.iter().enumerate() {
        let involved = &pairs.involved[serial];
        let mut adj_ids: BTreeSet<usize> = involved
            .iter()
            .filter_map(|h| partner_strand(sses, h))
            .collect();

        let mut counts: BTreeMap<usize, u32> = adj_ids.iter().map(|&i| (i, 0)).collect();
        let mut votes: BTreeMap<usize, (u32, u32)> =
            adj_ids.iter().map(|&i| (i, (0, 0))).collect();
        let mut last_pairs: BTreeMap<usize, Hbond> = BTreeMap::new();

        for h in involved {
            let Some(partner) = partner_strand(sses, h) else {
                continue;
            };

            if let Some(last) = last_pairs.get(&partner).copied() {
                if last.reversed == h.reversed {
                    log::debug!(
                        "consecutive hbonds in the same direction: {} -> {} / {} -> {}",
                        last.res0,
                        last.res1,
                        h.res0,
                        h.res1
                    );
                    continue;
                }
                let vote = consecutive_vote(last, *h);
                let entry = votes.get_mut(&partner).expect("partner registered");
                match vote {
                    Direction::Parallel => entry.0 += 1,
                    Direction::AntiParallel => entry.1 += 1,
                }
            }

            *counts.get_mut(&partner).expect("partner registered") += 1;
            last_pairs.insert(partner, *h);
        }

        for partner in adj_ids.clone() {
            let (parallel, anti) = votes[&partner];
            let direction = direction_by_majority(sse_id, partner, parallel, anti)?;

            if counts[&partner] < 2 {
                log::debug!(
                    "unpaired strand pair ({sse_id}, {partner}): count {}",
                    counts[&partner]
                );
                adj_ids.remove(&partner);
                continue;
            }
            undirected.insert(
                (sse_id, partner),
                StrandPairData {
                    direction,
                    count: counts[&partner],
                },
            );
        }

        adj_index_map.insert(sse_id, adj_ids);
    }

    Ok((undirected, adj_index_map))
}

/// The direction signature of two consecutive hydrogen bonds to the same
/// partner strand (the bonds are known to differ in donor/acceptor side).
fn consecutive_vote(last: Hbond, h: Hbond) -> Direction {
    if h.res0 == last.res0 {
        if last.res1 < h.res1 {
            Direction::Parallel
        } else {
            Direction::AntiParallel
        }
    } else if last.res1 < h.res1 {
        Direction::Parallel
    } else if last.res1 == h.res1 {
        // Same acceptor-side residue: the side flip decides.
        if last.reversed {
            Direction::Parallel
        } else {
            Direction::AntiParallel
        }
    } else {
        Direction::AntiParallel
    }
}

/// Majority vote; a minority share of one half or more is unresolvable.
fn direction_by_majority(
    sse0: usize,
    sse1: usize,
    parallel: u32,
    anti: u32,
) -> Result<Direction> {
    let total = parallel + anti;
    if total > 0 {
        let minority = parallel.min(anti) as f64 / total as f64;
        if minority >= 0.5 {
            return Err(TopoError::DirectionUnresolvable {
                sse0,
                sse1,
                parallel,
                anti,
            });
        }
    }
    Ok(if anti < parallel {
        Direction::Parallel
    } else {
        Direction::AntiParallel
    })
}

/// Every kept strand pair must exist in both directions with one direction
/// value.
fn symmetry_check(undirected: &UndirectedAdj, strand_indices: &[usize]) -> Result<()> {
    for (i, &s0) in strand_indices.iter().enumerate() {
        for &s1 in &strand_indices[i + 1..] {
            let fwd = undirected.get(&(s0, s1));
            let rev = undirected.get(&(s1, s0));
            match (fwd, rev) {
                (None, None) => {}
                (Some(a), Some(b)) => {
                    if a.direction != b.direction {
                        return Err(TopoError::NonSymmetricDirection(s0, s1));
                    }
                }
                (Some(_), None) => return Err(TopoError::NonSymmetric(s1, s0)),
                (None, Some(_)) => return Err(TopoError::NonSymmetric(s0, s1)),
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdb::sse::{SseHeader, SseKind};
    use glam::Vec3;

    /// Straight-line CA map covering every listed residue range.
    fn ca_map(ranges: &[std::ops::RangeInclusive<i32>]) -> BTreeMap<i32, Vec3> {
        ranges
            .iter()
            .flat_map(|r| r.clone())
            .map(|res| (res, Vec3::new(res as f32, 0.0, 0.0)))
            .collect()
    }

    fn strand(init: i32, end: i32) -> SseHeader {
        SseHeader {
            kind: SseKind::Strand,
            init,
            end,
        }
    }

    fn topo(headers: Vec<SseHeader>, hbonds: Vec<(i32, i32)>) -> SheetTopology {
        let ranges: Vec<std::ops::RangeInclusive<i32>> =
            headers.iter().map(|h| h.init..=h.end).collect();
        let sses = Sses::from_parts(headers, &ca_map(&ranges)).unwrap();
        let stride = Stride {
            headers: Vec::new(),
            hbonds,
        };
        SheetTopology::new(sses, &stride).unwrap()
    }

    fn ss(strand: usize, substr: usize) -> SubStrand {
        SubStrand::new(strand, substr)
    }

    /// Parallel ladder between strands [1..5] and [10..14]: bridges
    /// 2–11, 3–12, 4–13.
    #[test]
    fn two_strand_parallel_ladder() {
        let t = topo(
            vec![strand(1, 5), strand(10, 14)],
            vec![(2, 10), (12, 2), (4, 12), (14, 4)],
        );

        assert_eq!(t.sheets.len(), 1);
        let sheet = &t.sheets[0];
        assert_eq!(sheet.members().len(), 2);
        assert_eq!(sheet.size(), 2);
        assert!(!sheet.has_cycle());
        assert!(!sheet.undirected());

        let key = PairKey::new(ss(0, 0), ss(1, 0));
        let node = t.adjacency.node(key).expect("directed edge A -> B");
        assert_eq!(node.direction, Direction::Parallel);
        assert_eq!(node.residue_pairs, 3);
        assert_eq!((node.delta_1, node.delta_2), (0, 0));
        assert!(t.adjacency.node(key.reverse()).is_none());

        // sub-strand ranges cover the bridged stretch
        assert_eq!(t.substrands.n_term_res(ss(0, 0)), 2);
        assert_eq!(t.substrands.c_term_res(ss(0, 0)), 4);
        assert_eq!(t.substrands.n_term_res(ss(1, 0)), 11);
        assert_eq!(t.substrands.c_term_res(ss(1, 0)), 13);

        // attr lookup works from either side
        let attr = t.attr(ss(1, 0), ss(0, 0));
        assert!(attr.reachable);
        assert_eq!(attr.jump, 0);
        assert_eq!(attr.direction, Direction::Parallel);
    }

    /// Anti-parallel ladder: small rings at 1–14, 3–12, 5–10 colour all
    /// five residue pairs.
    #[test]
    fn two_strand_antiparallel_ladder() {
        let t = topo(
            vec![strand(1, 5), strand(10, 14)],
            vec![(1, 14), (14, 1), (3, 12), (12, 3), (5, 10), (10, 5)],
        );

        assert_eq!(t.sheets.len(), 1);
        assert_eq!(t.sheets[0].size(), 2);
        assert!(!t.sheets[0].undirected());

        let node = t
            .adjacency
            .node(PairKey::new(ss(0, 0), ss(1, 0)))
            .expect("directed edge A -> B");
        assert_eq!(node.direction, Direction::AntiParallel);
        assert_eq!(node.residue_pairs, 5);
        assert_eq!((node.delta_1, node.delta_2), (0, 0));

        assert_eq!(t.substrands.n_term_res(ss(0, 0)), 1);
        assert_eq!(t.substrands.c_term_res(ss(0, 0)), 5);
    }

    /// Mixed three-strand sheet: A parallel to B, B anti-parallel to C. The
    /// A–C relation follows by composition.
    #[test]
    fn three_strand_mixed_sheet() {
        let t = topo(
            vec![strand(1, 5), strand(10, 14), strand(20, 24)],
            vec![
                // A || B ladder
                (2, 10),
                (12, 2),
                (4, 12),
                (14, 4),
                // B anti C ladder
                (11, 24),
                (24, 11),
                (13, 22),
                (22, 13),
            ],
        );

        assert_eq!(t.sheets.len(), 1);
        assert_eq!(t.sheets[0].members().len(), 3);
        assert_eq!(t.sheets[0].size(), 3);
        assert!(!t.sheets[0].has_cycle());

        let attr = t.attr(ss(0, 0), ss(2, 0));
        assert!(attr.reachable);
        assert_eq!(attr.jump, 1);
        assert_eq!(attr.direction, Direction::AntiParallel);
        assert_eq!(attr.jumped, vec![ss(1, 0)]);

        // path-independence of the composed direction
        let ab = t.attr(ss(0, 0), ss(1, 0)).direction;
        let bc = t.attr(ss(1, 0), ss(2, 0)).direction;
        assert_eq!(ab.combine(bc), attr.direction);
    }

    /// Four strands closed into a barrel: one directed cycle of length 4.
    #[test]
    fn four_strand_barrel_cycle() {
        let t = topo(
            vec![strand(1, 5), strand(10, 14), strand(20, 24), strand(30, 34)],
            vec![
                // A || B
                (2, 10),
                (12, 2),
                (4, 12),
                (14, 4),
                // B anti C
                (11, 24),
                (24, 11),
                (13, 22),
                (22, 13),
                // C || D
                (31, 21),
                (23, 31),
                (33, 23),
                (25, 33),
                // D anti A
                (1, 34),
                (34, 1),
                (3, 32),
                (32, 3),
                (5, 30),
                (30, 5),
            ],
        );

        assert_eq!(t.sheets.len(), 1);
        let sheet = &t.sheets[0];
        assert_eq!(sheet.members().len(), 4);
        assert!(sheet.has_cycle());
        assert_eq!(sheet.cycles().len(), 1);
        assert_eq!(sheet.cycles()[0].len(), 4);
        assert_eq!(sheet.size(), 4);
        assert!(!sheet.undirected());

        // inside the cycle both directions are reachable
        assert!(t.attr_directed(ss(0, 0), ss(1, 0)).reachable);
        assert!(t.attr_directed(ss(1, 0), ss(0, 0)).reachable);
    }

    /// In a directed sheet exactly one of the two orientations of any member
    /// pair is reachable.
    #[test]
    fn directed_sheet_is_one_way() {
        let t = topo(
            vec![strand(1, 5), strand(10, 14), strand(20, 24)],
            vec![
                (2, 10),
                (12, 2),
                (4, 12),
                (14, 4),
                (11, 24),
                (24, 11),
                (13, 22),
                (22, 13),
            ],
        );
        let members = [ss(0, 0), ss(1, 0), ss(2, 0)];
        for &a in &members {
            for &b in &members {
                if a == b {
                    continue;
                }
                let fwd = t.attr_directed(a, b).reachable;
                let rev = t.attr_directed(b, a).reachable;
                assert!(fwd ^ rev, "{a:?} / {b:?}");
            }
        }
    }

    /// The direction the undirected classifier voted for survives into the
    /// directed edge.
    #[test]
    fn vote_direction_matches_edge_direction() {
        let t = topo(
            vec![strand(1, 5), strand(10, 14)],
            vec![(2, 10), (12, 2), (4, 12), (14, 4)],
        );
        let edge = t.adjacency.map().values().next().unwrap();
        assert_eq!(edge.direction, Direction::Parallel);
    }

    /// Conflicting votes with no majority abort the run.
    #[test]
    fn unresolvable_direction_is_fatal() {
        let err = direction_by_majority(0, 1, 2, 2);
        assert!(err.is_err());
        assert!(direction_by_majority(0, 1, 3, 1).is_ok());
        // a pair with no votes at all defaults to anti-parallel
        assert_eq!(
            direction_by_majority(0, 1, 0, 0).unwrap(),
            Direction::AntiParallel
        );
    }

    /// A missing CA inside a strand disables its representative atoms but
    /// does not shrink the sub-strand range covering it.
    #[test]
    fn missing_residue_keeps_substrand_range() {
        let headers = vec![strand(1, 5), strand(10, 14)];
        let mut map = ca_map(&[1..=5, 10..=14]);
        map.remove(&3);
        let sses = Sses::from_parts(headers, &map).unwrap();
        assert!(!sses[0].entire);
        assert!(!sses[0].with_rep);

        let stride = Stride {
            headers: Vec::new(),
            hbonds: vec![(2, 10), (12, 2), (4, 12), (14, 4)],
        };
        let t = SheetTopology::new(sses, &stride).unwrap();
        assert_eq!(t.substrands.n_term_res(ss(0, 0)), 2);
        assert_eq!(t.substrands.c_term_res(ss(0, 0)), 4);
        assert!(!t.atoms(ss(0, 0))[1].real);
    }

    /// Two runs over identical inputs give identical structures.
    #[test]
    fn construction_is_deterministic() {
        let build = || {
            topo(
                vec![strand(1, 5), strand(10, 14), strand(20, 24)],
                vec![
                    (2, 10),
                    (12, 2),
                    (4, 12),
                    (14, 4),
                    (11, 24),
                    (24, 11),
                    (13, 22),
                    (22, 13),
                ],
            )
        };
        let a = build();
        let b = build();
        assert_eq!(format!("{:?}", a.adjacency.map()), format!("{:?}", b.adjacency.map()));
        assert_eq!(
            format!("{:?}", a.sheets[0].members()),
            format!("{:?}", b.sheets[0].members())
        );
        assert_eq!(a.substrands.all(), b.substrands.all());
    }

    /// Two independent ladders give two sheets, ordered by their smallest
    /// member.
    #[test]
    fn independent_ladders_make_two_sheets() {
        let t = topo(
            vec![
                strand(1, 5),
                strand(10, 14),
                strand(20, 24),
                strand(30, 34),
            ],
            vec![
                // A || B
                (2, 10),
                (12, 2),
                (4, 12),
                (14, 4),
                // C || D
                (21, 30),
                (32, 21),
                (23, 32),
                (34, 23),
            ],
        );
        assert_eq!(t.sheets.len(), 2);
        assert!(t.sheets[0].members().contains(&ss(0, 0)));
        assert!(t.sheets[1].members().contains(&ss(2, 0)));
        let map = t.sheet_id_map();
        assert_eq!(map[&ss(0, 0)], 0);
        assert_eq!(map[&ss(3, 0)], 1);
    }
}
