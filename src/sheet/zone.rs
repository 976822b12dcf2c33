//! The strict zone: residues locked into the regular hydrogen-bonding
//! pattern of a sheet, and the BFS that turns them into a directed
//! sub-strand adjacency with consistent orientations and side labels.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::error::{Result, TopoError};
use crate::pdb::Sses;
use crate::sheet::adjacency::{SideIndex, SubStrandAdjacency};
use crate::sheet::pairs::{partner_strand, Hbond, HbondPairs};
use crate::sheet::substrands::SubStrandRanges;
use crate::sheet::{Direction, PairKey, SubStrand, UndirectedAdj};

/// How a residue-level β-bridge was recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeKind {
    /// Parallel pair on the hydrogen-bonded rung.
    ParallelHbonds,
    /// Parallel pair between the rungs.
    ParallelNoHbonds,
    /// Anti-parallel pair inside the small (hydrogen-bonded) ring.
    SmallRing,
    /// Anti-parallel pair inside the large ring.
    LargeRing,
}

/// Which face of the sheet a residue's side chain points to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SideTag {
    #[default]
    Undefined,
    Upper,
    Lower,
}

impl SideTag {
    fn flipped(self) -> Self {
        match self {
            SideTag::Upper => SideTag::Lower,
            SideTag::Lower => SideTag::Upper,
            SideTag::Undefined => SideTag::Undefined,
        }
    }
}

/// One residue of a strand, addressed both by residue number and by its
/// offset inside the SSE. Ordered by (strand serial, residue number) so the
/// BFS seed choice is deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ZoneResidue {
    pub strand: usize,
    pub resnum: i32,
    pub sse_id: usize,
    pub offset: usize,
}

impl ZoneResidue {
    fn next(self, sses: &Sses) -> Option<Self> {
        if sses[self.sse_id].end == self.resnum {
            return None;
        }
        Some(ZoneResidue {
            resnum: self.resnum + 1,
            offset: self.offset + 1,
            ..self
        })
    }

    fn prev(self, sses: &Sses) -> Option<Self> {
        if sses[self.sse_id].init == self.resnum {
            return None;
        }
        Some(ZoneResidue {
            resnum: self.resnum - 1,
            offset: self.offset - 1,
            ..self
        })
    }
}

/// The bridge partner stored in one slot of a residue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgePartner {
    pub residue: ZoneResidue,
    pub kind: BridgeKind,
}

/// Zone data of one residue: colour, side, and up to two bridge partners
/// (slot 0 = non-hydrogen-bonded, slot 1 = hydrogen-bonded).
#[derive(Debug, Clone, Copy, Default)]
pub struct ZoneInfo {
    pub colored: bool,
    pub side: SideTag,
    pub adj: [Option<BridgePartner>; 2],
}

impl ZoneInfo {
    /// Register a bridge partner. Returns false when the slot is already
    /// taken by a different residue.
    fn add_pair(&mut self, residue: ZoneResidue, hbonded: bool, kind: BridgeKind) -> bool {
        let slot = &mut self.adj[hbonded as usize];
        match slot {
            Some(existing) if existing.residue == residue => true,
            Some(_) => false,
            None => {
                self.colored = true;
                *slot = Some(BridgePartner { residue, kind });
                true
            }
        }
    }
}

/// Orientation bookkeeping of one BFS component. Once a component falls
/// back to undirected form it never recovers: the relative-direction vector
/// only exists while the component is still consistently orientable.
enum OrientationState {
    Building(Vec<Option<Direction>>),
    Fallback,
}

/// Per-strand zone storage plus the BFS that decides sides and directions.
#[derive(Debug, Clone)]
pub struct StrictZone {
    /// SSE ids of all strands, ascending; position = strand serial id.
    strand_indices: Vec<usize>,
    /// `zones[strand_serial][residue_offset]`.
    pub zones: Vec<Vec<ZoneInfo>>,
}

impl StrictZone {
    pub fn new(sses: &Sses, strand_indices: &[usize]) -> Self {
        let zones = strand_indices
            .iter()
            .map(|&sse_id| {
                let sse = &sses[sse_id];
                vec![ZoneInfo::default(); (sse.end - sse.init + 1) as usize]
            })
            .collect();
        StrictZone {
            strand_indices: strand_indices.to_vec(),
            zones,
        }
    }

    fn serial_of(&self, sse_id: usize) -> usize {
        self.strand_indices.partition_point(|&id| id < sse_id)
    }

    /// Validated construction: `resnum` must lie inside the given strand.
    fn residue(&self, sses: &Sses, sse_id: usize, resnum: i32) -> Option<ZoneResidue> {
        let sse = &sses[sse_id];
        if resnum < sse.init || sse.end < resnum {
            return None;
        }
        Some(ZoneResidue {
            strand: self.serial_of(sse_id),
            resnum,
            sse_id,
            offset: (resnum - sse.init) as usize,
        })
    }

    pub fn info(&self, res: ZoneResidue) -> &ZoneInfo {
        &self.zones[res.strand][res.offset]
    }

    fn info_mut(&mut self, res: ZoneResidue) -> &mut ZoneInfo {
        &mut self.zones[res.strand][res.offset]
    }

    /// Register one residue pair in the zone (the `On` operation).
    ///
    /// Out-of-range residues are skipped with a warning; a third distinct
    /// partner for one slot aborts the analysis.
    fn mark(
        &mut self,
        sses: &Sses,
        sse_id: usize,
        resnum: i32,
        paired_sse_id: usize,
        paired_resnum: i32,
        hbonded: bool,
        kind: BridgeKind,
    ) -> Result<()> {
        let (Some(res0), Some(res1)) = (
            self.residue(sses, sse_id, resnum),
            self.residue(sses, paired_sse_id, paired_resnum),
        ) else {
            log::warn!(
                "residue pair SSE[{sse_id}] {resnum} <-> SSE[{paired_sse_id}] {paired_resnum} \
                 falls outside its strand; skipped"
            );
            return Ok(());
        };

        if !self.info_mut(res0).add_pair(res1, hbonded, kind) {
            return Err(TopoError::ThirdPairFound {
                sse_id,
                resnum,
                new_sse_id: paired_sse_id,
                new_resnum: paired_resnum,
            });
        }
        Ok(())
    }

    /// Seed the strict zone: walk the strand graph breadth-first and colour
    /// every residue pair that matches one of the four bridge signatures
    /// between consecutive hydrogen bonds to the same partner strand.
    pub fn seed(
        &mut self,
        sses: &Sses,
        pairs: &HbondPairs,
        undirected: &UndirectedAdj,
        adj_index_map: &BTreeMap<usize, BTreeSet<usize>>,
    ) -> Result<()> {
        let mut strands: Vec<usize> = self.strand_indices.clone();

        while let Some(&start) = strands.first() {
            let mut finished: BTreeSet<usize> = BTreeSet::new();
            let mut queue: VecDeque<usize> = VecDeque::from([start]);

            while let Some(target) = queue.pop_front() {
                // A barrel can enqueue a strand twice.
                if !finished.insert(target) {
                    continue;
                }

                let neighbours = &adj_index_map[&target];
                queue.extend(neighbours.iter().copied());

                let mut last_pairs: BTreeMap<usize, Hbond> = BTreeMap::new();
                for hbond in pairs.resorted(self.serial_of(target), undirected, sses) {
                    let Some(adj_str) = partner_strand(sses, &hbond) else {
                        continue;
                    };
                    if !neighbours.contains(&adj_str) {
                        continue;
                    }

                    let dir = undirected[&(target, adj_str)].direction;
                    if let Some(last) = last_pairs.get(&adj_str).copied() {
                        self.classify_consecutive(sses, target, adj_str, dir, last, hbond)?;
                    }
                    last_pairs.insert(adj_str, hbond);
                }

                strands.retain(|&s| s != target);
            }
        }
        Ok(())
    }

    /// Match one consecutive hbond pair against the bridge signatures.
    fn classify_consecutive(
        &mut self,
        sses: &Sses,
        target: usize,
        adj_str: usize,
        dir: Direction,
        last: Hbond,
        h: Hbond,
    ) -> Result<()> {
        if h.reversed == last.reversed {
            return Ok(());
        }
        if dir.is_parallel() {
            if h.res0 == last.res0 && h.res1 == last.res1 + 2 {
                self.mark(
                    sses,
                    target,
                    h.res0,
                    adj_str,
                    h.res1 - 1,
                    true,
                    BridgeKind::ParallelHbonds,
                )?;
            } else if h.res0 == last.res0 + 2 && h.res1 == last.res1 {
                self.mark(
                    sses,
                    target,
                    h.res0 - 1,
                    adj_str,
                    h.res1,
                    false,
                    BridgeKind::ParallelNoHbonds,
                )?;
            }
        } else if h.res0 == last.res0 && h.res1 == last.res1 {
            self.mark(sses, target, h.res0, adj_str, h.res1, true, BridgeKind::SmallRing)?;
        } else if h.res0 == last.res0 + 2 && h.res1 == last.res1 - 2 {
            self.mark(
                sses,
                target,
                h.res0 - 1,
                adj_str,
                h.res1 + 1,
                false,
                BridgeKind::LargeRing,
            )?;
        }
        Ok(())
    }

    /// Run the side/direction BFS over every coloured component, then seal
    /// and renumber the sub-strand registry, drop weak reverse edges, and
    /// compute the terminal deltas.
    pub fn decide_side(
        &mut self,
        sses: &Sses,
        undirected: &UndirectedAdj,
        ranges: &mut SubStrandRanges,
        side_index: &mut SideIndex,
    ) -> Result<SubStrandAdjacency> {
        let mut adj = SubStrandAdjacency::default();

        let mut remainder = self.collect_colored(sses);
        while !remainder.is_empty() {
            self.bfs(sses, undirected, &mut adj, &mut remainder, ranges, side_index)?;
        }

        let conv = ranges.finish();
        adj.update_keys(&conv);
        adj.cleanup(&self.strand_indices)?;
        self.calc_deltas(sses, ranges, &mut adj)?;
        adj.gen_adj_vec();
        Ok(adj)
    }

    fn collect_colored(&self, sses: &Sses) -> BTreeSet<ZoneResidue> {
        let mut set = BTreeSet::new();
        for (strand, zone) in self.zones.iter().enumerate() {
            let sse_id = self.strand_indices[strand];
            for (offset, info) in zone.iter().enumerate() {
                if info.colored {
                    set.insert(ZoneResidue {
                        strand,
                        resnum: sses[sse_id].init + offset as i32,
                        sse_id,
                        offset,
                    });
                }
            }
        }
        set
    }

    /// One BFS component: colour propagation, side assignment, relative
    /// directions, and the directed (or fallback-undirected) edge counts.
    fn bfs(
        &mut self,
        sses: &Sses,
        undirected: &UndirectedAdj,
        adj: &mut SubStrandAdjacency,
        remainder: &mut BTreeSet<ZoneResidue>,
        ranges: &mut SubStrandRanges,
        side_index: &mut SideIndex,
    ) -> Result<()> {
        let mut rel_dirs: Vec<Option<Direction>> = vec![None; self.strand_indices.len()];

        let first = *remainder.iter().next().expect("component is non-empty");
        let mut queue: VecDeque<ZoneResidue> = VecDeque::from([first]);
        let mut contents: BTreeSet<ZoneResidue> = BTreeSet::from([first]);

        adj.add_sheet();

        self.info_mut(first).side = SideTag::Upper;
        rel_dirs[first.strand] = Some(Direction::Parallel);
        let mut state = OrientationState::Building(rel_dirs);

        while let Some(target) = queue.pop_front() {
            ranges.extend(target.strand, target.resnum);
            log::debug!(
                "bfs target SSE[{}] residue {}",
                target.sse_id,
                target.resnum
            );

            // Bridge partners on other strands (non-hbonded slot first).
            for hbonded in [false, true] {
                let Some(partner) = self.info(target).adj[hbonded as usize] else {
                    continue;
                };
                let adj_res = partner.residue;
                if !remainder.contains(&adj_res) {
                    continue;
                }

                let target_side = self.info(target).side;
                self.info_mut(adj_res).side = target_side;
                ranges.extend(adj_res.strand, adj_res.resnum);

                let direction_to_adj = undirected[&(target.sse_id, adj_res.sse_id)].direction;

                if let OrientationState::Building(rel_dirs) = &mut state {
                    if self.update_rel_dir(target, adj_res, direction_to_adj, rel_dirs)? {
                        state = OrientationState::Fallback;
                    }
                }

                match &state {
                    OrientationState::Fallback => {
                        let key = PairKey::new(
                            SubStrand::new(target.strand, ranges.last_substr_id(target.strand)),
                            SubStrand::new(adj_res.strand, ranges.last_substr_id(adj_res.strand)),
                        );
                        adj.add_bridge_count(key, direction_to_adj)?;
                        adj.add_bridge_count(key.reverse(), direction_to_adj)?;
                    }
                    OrientationState::Building(rel_dirs) => {
                        let key =
                            self.gen_list_key(target, adj_res, hbonded, rel_dirs, ranges)?;
                        adj.add_bridge_count(key, direction_to_adj)?;
                    }
                }

                let right = (target_side == SideTag::Upper) == hbonded;
                side_index.add(
                    SubStrand::new(target.strand, ranges.last_substr_id(target.strand)),
                    SubStrand::new(adj_res.strand, ranges.last_substr_id(adj_res.strand)),
                    right,
                    direction_to_adj,
                );

                push_once(&mut queue, &mut contents, adj_res);
            }

            // Sequential neighbours on the same strand flip the side.
            for diff in [-1i32, 1] {
                let Some(ba) = self.ba_check(sses, target, diff, remainder) else {
                    continue;
                };
                let side = self.info(target).side;
                debug_assert!(side != SideTag::Undefined);
                self.info_mut(ba).side = side.flipped();
                push_once(&mut queue, &mut contents, ba);
            }

            remainder.remove(&target);
            contents.remove(&target);
        }

        let too_short = ranges.close_component();
        adj.erase_too_short(&too_short);
        let fallback = matches!(state, OrientationState::Fallback);
        if fallback {
            adj.ensure_undirected();
        }
        adj.register_sheet_directed(!fallback);
        Ok(())
    }

    /// Resolve the relative direction of the partner strand. Returns true
    /// when the new value conflicts with an earlier one, which switches the
    /// component to fallback (undirected) mode.
    fn update_rel_dir(
        &self,
        target: ZoneResidue,
        adj: ZoneResidue,
        direction_to_adj: Direction,
        rel_dirs: &mut [Option<Direction>],
    ) -> Result<bool> {
        let target_dir = rel_dirs[target.strand]
            .ok_or(TopoError::RelativeDirectionNotSet(target.sse_id))?;
        let adj_dir = if target_dir.is_parallel() {
            direction_to_adj
        } else {
            direction_to_adj.flip()
        };

        match rel_dirs[adj.strand] {
            None => {
                rel_dirs[adj.strand] = Some(adj_dir);
                Ok(false)
            }
            Some(existing) if existing == adj_dir => Ok(false),
            Some(_) => {
                log::warn!(
                    "relative direction changed on SSE[{}]; falling back to an undirected graph",
                    adj.sse_id
                );
                Ok(true)
            }
        }
    }

    /// Orient the edge between the current sub-strands of two bridged
    /// residues. The partner is on the right of the target exactly when
    /// `relative_dir == (side == hbonded)`.
    fn gen_list_key(
        &self,
        res0: ZoneResidue,
        res1: ZoneResidue,
        hbonded: bool,
        rel_dirs: &[Option<Direction>],
        ranges: &SubStrandRanges,
    ) -> Result<PairKey> {
        let dir = rel_dirs[res0.strand]
            .ok_or(TopoError::RelativeDirectionNotSet(res0.sse_id))?;
        let upper = self.info(res0).side == SideTag::Upper;

        let sub0 = SubStrand::new(res0.strand, ranges.last_substr_id(res0.strand));
        let sub1 = SubStrand::new(res1.strand, ranges.last_substr_id(res1.strand));
        if dir.is_parallel() == (upper == hbonded) {
            Ok(PairKey::new(sub0, sub1))
        } else {
            Ok(PairKey::new(sub1, sub0))
        }
    }

    /// The sequential neighbour of `target`, unless it is out of range,
    /// already processed, or would extend a bridge of the same kind to the
    /// same partner strand (which must start a new sub-strand instead).
    fn ba_check(
        &self,
        sses: &Sses,
        target: ZoneResidue,
        diff: i32,
        remainder: &BTreeSet<ZoneResidue>,
    ) -> Option<ZoneResidue> {
        let ba = if diff < 0 {
            target.prev(sses)?
        } else {
            target.next(sses)?
        };
        if !remainder.contains(&ba) {
            return None;
        }

        let info_t = self.info(target);
        let info_ba = self.info(ba);
        for pt in info_t.adj.iter().flatten() {
            for pb in info_ba.adj.iter().flatten() {
                if pt.residue.sse_id == pb.residue.sse_id && pt.kind == pb.kind {
                    log::warn!(
                        "ignoring continuous bridges of the same kind at SSE[{}] residue {}",
                        ba.sse_id,
                        ba.resnum
                    );
                    return None;
                }
            }
        }
        Some(ba)
    }

    /// Fill `delta_1` / `delta_2` on every retained edge.
    fn calc_deltas(
        &self,
        sses: &Sses,
        ranges: &SubStrandRanges,
        adj: &mut SubStrandAdjacency,
    ) -> Result<()> {
        let keys: Vec<(PairKey, Direction)> = adj
            .map()
            .iter()
            .map(|(key, node)| (*key, node.direction))
            .collect();
        for (key, dir) in keys {
            let d1 = self.count_delta_1(sses, ranges, key.s0, key.s1, dir)?;
            let d2 = self.count_delta_2(sses, ranges, key.s0, key.s1, dir)?;
            adj.update_delta(key, d1, d2);
        }
        Ok(())
    }

    /// From `start`, walk along the base strand until a residue bridging
    /// into `ss_adj` is found; count coloured residues passed on the way.
    fn count_delta_base(
        &self,
        sses: &Sses,
        ranges: &SubStrandRanges,
        start: ZoneResidue,
        toward_c: bool,
        ss_adj: SubStrand,
    ) -> Result<(i32, ZoneResidue)> {
        let mut delta = 0;
        let mut zres = start;
        loop {
            for partner in self.info(zres).adj.iter().flatten() {
                let res = partner.residue;
                if res.strand == ss_adj.strand
                    && ranges.n_term_res(ss_adj) <= res.resnum
                    && res.resnum <= ranges.c_term_res(ss_adj)
                {
                    return Ok((delta, res));
                }
            }
            if self.info(zres).colored {
                delta += 1;
            }
            zres = match if toward_c {
                zres.next(sses)
            } else {
                zres.prev(sses)
            } {
                Some(z) => z,
                None => {
                    return Err(TopoError::PairedResidueNotFound {
                        sse_id: start.sse_id,
                        resnum: start.resnum,
                    })
                }
            };
        }
    }

    /// Coloured residues on the partner strand from `start` (inclusive) up
    /// to `last` (exclusive), stepping by `step`.
    fn count_delta_adj(&self, start: ZoneResidue, step: i32, last: ZoneResidue) -> i32 {
        debug_assert_eq!(start.strand, last.strand);
        let mut delta = 0;
        let mut off = start.offset as i32;
        while off != last.offset as i32 {
            if self.zones[start.strand][off as usize].colored {
                delta += 1;
            }
            off += step;
        }
        delta
    }

    fn count_delta_1(
        &self,
        sses: &Sses,
        ranges: &SubStrandRanges,
        ss_base: SubStrand,
        ss_adj: SubStrand,
        dir: Direction,
    ) -> Result<i32> {
        let sse_id = self.strand_indices[ss_base.strand];
        let base_init = sses[sse_id].init;
        let start = ZoneResidue {
            strand: ss_base.strand,
            resnum: ranges.n_term_res(ss_base),
            sse_id,
            offset: (ranges.n_term_res(ss_base) - base_init) as usize,
        };
        let (delta_base, bridge_adj) = self.count_delta_base(sses, ranges, start, true, ss_adj)?;

        let adj_sse_id = self.strand_indices[ss_adj.strand];
        let term_res = if dir.is_parallel() {
            ranges.n_term_res(ss_adj)
        } else {
            ranges.c_term_res(ss_adj)
        };
        let term = ZoneResidue {
            strand: ss_adj.strand,
            resnum: term_res,
            sse_id: adj_sse_id,
            offset: (term_res - sses[adj_sse_id].init) as usize,
        };
        let step = if dir.is_parallel() { -1 } else { 1 };
        Ok(delta_base - self.count_delta_adj(bridge_adj, step, term))
    }

    fn count_delta_2(
        &self,
        sses: &Sses,
        ranges: &SubStrandRanges,
        ss_base: SubStrand,
        ss_adj: SubStrand,
        dir: Direction,
    ) -> Result<i32> {
        let sse_id = self.strand_indices[ss_base.strand];
        let base_init = sses[sse_id].init;
        let start = ZoneResidue {
            strand: ss_base.strand,
            resnum: ranges.c_term_res(ss_base),
            sse_id,
            offset: (ranges.c_term_res(ss_base) - base_init) as usize,
        };
        let (delta_base, bridge_adj) = self.count_delta_base(sses, ranges, start, false, ss_adj)?;

        let adj_sse_id = self.strand_indices[ss_adj.strand];
        let term_res = if dir.is_parallel() {
            ranges.c_term_res(ss_adj)
        } else {
            ranges.n_term_res(ss_adj)
        };
        let term = ZoneResidue {
            strand: ss_adj.strand,
            resnum: term_res,
            sse_id: adj_sse_id,
            offset: (term_res - sses[adj_sse_id].init) as usize,
        };
        let step = if dir.is_parallel() { 1 } else { -1 };
        Ok(self.count_delta_adj(bridge_adj, step, term) - delta_base)
    }
}

fn push_once(
    queue: &mut VecDeque<ZoneResidue>,
    contents: &mut BTreeSet<ZoneResidue>,
    res: ZoneResidue,
) {
    if contents.insert(res) {
        queue.push_back(res);
    }
}
