//! The directed sub-strand adjacency and its side-keyed auxiliary index.
//!
//! Both structures are populated during the zone BFS and must stay in sync:
//! the pair map holds the edges, the side index remembers on which lateral
//! side of a sub-strand each neighbour sits, which is what the
//! undirected-branch pruning walks.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Result, TopoError};
use crate::sheet::sheets::{Sheet, Sheets};
use crate::sheet::{Direction, PairKey, PairNode, SubStrand};

/// Directed adjacency over sub-strands, with per-component key vectors.
#[derive(Debug, Clone, Default)]
pub struct SubStrandAdjacency {
    map: BTreeMap<PairKey, PairNode>,
    adj_vec: BTreeMap<SubStrand, Vec<PairKey>>,
    sheet_keys: Vec<Vec<PairKey>>,
    sheet_directed: Vec<bool>,
}

impl SubStrandAdjacency {
    pub fn map(&self) -> &BTreeMap<PairKey, PairNode> {
        &self.map
    }

    pub fn node(&self, key: PairKey) -> Option<&PairNode> {
        self.map.get(&key)
    }

    /// Start the key vector of the next BFS component.
    pub fn add_sheet(&mut self) {
        self.sheet_keys.push(Vec::new());
    }

    /// Record one more bridged residue pair on `key`.
    ///
    /// Inserting a key whose stored direction disagrees with `direction` is
    /// an invariant violation.
    pub fn add_bridge_count(&mut self, key: PairKey, direction: Direction) -> Result<()> {
        match self.map.get_mut(&key) {
            None => {
                self.map.insert(key, PairNode::new(direction));
                self.sheet_keys
                    .last_mut()
                    .expect("add_sheet precedes edge insertion")
                    .push(key);
            }
            Some(node) if node.direction == direction => {
                node.residue_pairs += 1;
            }
            Some(_) => return Err(TopoError::BridgeDirectionChanged),
        }
        Ok(())
    }

    /// Erase current-component edges touching a too-short sub-strand.
    pub fn erase_too_short(&mut self, short: &BTreeSet<SubStrand>) -> bool {
        let map = &mut self.map;
        let Some(keys) = self.sheet_keys.last_mut() else {
            return false;
        };
        let mut erased = false;
        keys.retain(|key| {
            if short.contains(&key.s0) || short.contains(&key.s1) {
                map.remove(key);
                erased = true;
                false
            } else {
                true
            }
        });
        erased
    }

    /// Duplicate every one-way edge of the current component in reverse.
    /// Called when the component fell back to undirected form.
    pub fn ensure_undirected(&mut self) {
        let Some(keys) = self.sheet_keys.last_mut() else {
            return;
        };
        let mut to_add = Vec::new();
        for key in keys.iter() {
            if !self.map.contains_key(&key.reverse()) {
                to_add.push(*key);
            }
        }
        for key in to_add {
            let node = self.map[&key];
            self.map.insert(key.reverse(), node);
            keys.push(key.reverse());
        }
    }

    pub fn register_sheet_directed(&mut self, directed: bool) {
        self.sheet_directed.push(directed);
    }

    pub fn directed_flags(&self) -> &[bool] {
        &self.sheet_directed
    }

    /// Apply the sub-strand renumbering produced by the registry's `finish`.
    pub fn update_keys(&mut self, conv: &BTreeMap<SubStrand, SubStrand>) {
        let renamed = |ss: SubStrand| conv.get(&ss).copied().unwrap_or(ss);

        let old_map = std::mem::take(&mut self.map);
        for (key, node) in old_map {
            let new_key = PairKey::new(renamed(key.s0), renamed(key.s1));
            self.map.insert(new_key, node);
        }
        for keys in &mut self.sheet_keys {
            for key in keys.iter_mut() {
                *key = PairKey::new(renamed(key.s0), renamed(key.s1));
            }
        }
    }

    /// Drop the weaker of each reverse-edge pair inside directed components.
    ///
    /// If the two reverse edges carry comparable weight (ratio above 0.66)
    /// there is no principled winner and the analysis aborts.
    pub fn cleanup(&mut self, strand_indices: &[usize]) -> Result<()> {
        let mut si = 0;
        while si < self.sheet_keys.len() {
            if !self.sheet_directed[si] {
                si += 1;
                continue;
            }

            let mut ki = 0;
            while ki < self.sheet_keys[si].len() {
                let key = self.sheet_keys[si][ki];
                let rev = key.reverse();
                if !self.map.contains_key(&rev) {
                    ki += 1;
                    continue;
                }
                let n_key = self.map[&key].residue_pairs;
                let n_rev = self.map[&rev].residue_pairs;

                let min = n_key.min(n_rev) as f64;
                let max = n_key.max(n_rev) as f64;
                if 0.66 < min / max {
                    return Err(TopoError::SubstrandCleanupFailure {
                        s0: strand_indices[rev.s1.strand],
                        ss0: rev.s1.substr,
                        n0: n_key,
                        s1: strand_indices[rev.s0.strand],
                        ss1: rev.s0.substr,
                        n1: n_rev,
                    });
                }

                if n_key < n_rev {
                    self.map.remove(&key);
                    self.sheet_keys[si].remove(ki);
                } else {
                    let pos = self.sheet_keys[si]
                        .iter()
                        .position(|k| *k == rev)
                        .expect("reverse key is registered in the same component");
                    self.sheet_keys[si].remove(pos);
                    self.map.remove(&rev);
                    ki = self.sheet_keys[si]
                        .iter()
                        .position(|k| *k == key)
                        .expect("key survives its own cleanup step")
                        + 1;
                }
            }

            if self.sheet_keys[si].is_empty() {
                self.sheet_keys.remove(si);
                self.sheet_directed.remove(si);
            } else {
                si += 1;
            }
        }
        Ok(())
    }

    pub fn update_delta(&mut self, key: PairKey, delta_1: i32, delta_2: i32) {
        if let Some(node) = self.map.get_mut(&key) {
            node.delta_1 = delta_1;
            node.delta_2 = delta_2;
        }
    }

    /// Build the sub-strand → outgoing-keys view used by the BFS search.
    pub fn gen_adj_vec(&mut self) {
        self.adj_vec.clear();
        for key in self.map.keys() {
            self.adj_vec.entry(key.s0).or_default().push(*key);
        }
    }

    pub fn adj_vec(&self) -> &BTreeMap<SubStrand, Vec<PairKey>> {
        &self.adj_vec
    }

    /// Remove one edge everywhere: pair map, component key vector, and the
    /// outgoing-keys view.
    pub fn remove(&mut self, key: PairKey) {
        self.map.remove(&key);
        for keys in &mut self.sheet_keys {
            if let Some(pos) = keys.iter().position(|k| *k == key) {
                keys.remove(pos);
                break;
            }
        }
        if let Some(vec) = self.adj_vec.get_mut(&key.s0) {
            if let Some(pos) = vec.iter().position(|k| *k == key) {
                vec.remove(pos);
            }
        }
    }

    /// Outgoing-keys view restricted to a set of sub-strands.
    pub fn induced_adj_vec(
        &self,
        subs: &[SubStrand],
    ) -> BTreeMap<SubStrand, Vec<PairKey>> {
        let set: BTreeSet<SubStrand> = subs.iter().copied().collect();
        let mut out = BTreeMap::new();
        for ss in subs {
            let Some(candidates) = self.adj_vec.get(ss) else {
                continue;
            };
            let kept: Vec<PairKey> = candidates
                .iter()
                .filter(|key| set.contains(&key.s1))
                .copied()
                .collect();
            if !kept.is_empty() {
                out.insert(*ss, kept);
            }
        }
        out
    }
}

/// Which lateral neighbours a sub-strand has, per side.
///
/// `data[ss][1]` lists the sub-strands on the right of `ss`, `data[ss][0]`
/// the ones on its left, in the upper/lower labelling the zone BFS chose.
#[derive(Debug, Clone, Default)]
pub struct SideIndex {
    data: BTreeMap<SubStrand, [Vec<SubStrand>; 2]>,
}

impl SideIndex {
    /// Register `ss` as a lateral neighbour of `key` (and vice versa).
    /// `right` says `ss` sits on the right of `key`; for an anti-parallel
    /// pair the reciprocal entry lands on the same nominal side.
    pub fn add(&mut self, key: SubStrand, ss: SubStrand, right: bool, dir: Direction) {
        let side_r = if dir.is_parallel() { !right } else { right };
        self.add_helper(key, ss, right);
        self.add_helper(ss, key, side_r);
    }

    fn add_helper(&mut self, key: SubStrand, ss: SubStrand, right: bool) {
        let vec = &mut self.data.entry(key).or_default()[right as usize];
        if !vec.contains(&ss) {
            vec.push(ss);
        }
    }

    pub fn neighbours(&self, key: SubStrand, right: bool) -> &[SubStrand] {
        self.data
            .get(&key)
            .map(|sides| sides[right as usize].as_slice())
            .unwrap_or(&[])
    }

    /// Which side of `base` the neighbour `adj` sits on.
    fn side_of(&self, adj: SubStrand, base: SubStrand) -> Result<bool> {
        for right in [true, false] {
            if self.neighbours(base, right).contains(&adj) {
                return Ok(right);
            }
        }
        Err(TopoError::AdjacentSubStrandNotFound {
            base: format!("{}_{}", base.strand, base.substr),
            adj: format!("{}_{}", adj.strand, adj.substr),
        })
    }

    /// In every undirected sheet, strip the duplicated reverse edges off the
    /// branches dangling from cycles, leaving cycles as the only undirected
    /// structure.
    pub fn fix_undirected_paths(
        &self,
        adj: &mut SubStrandAdjacency,
        sheets: &Sheets,
    ) -> Result<()> {
        for sheet in sheets.iter() {
            if sheet.undirected() {
                self.remove_adj_paths(adj, sheet)?;
            }
        }
        Ok(())
    }

    fn remove_adj_paths(&self, adj: &mut SubStrandAdjacency, sheet: &Sheet) -> Result<()> {
        let in_cycles = sheet.subs_in_cycles();
        for &sub_in_cycle in &in_cycles {
            for side in [true, false] {
                for &sub in self.neighbours(sub_in_cycle, side) {
                    if !in_cycles.contains(&sub) {
                        let mut visited = BTreeSet::new();
                        visited.insert(sub_in_cycle);
                        self.remove_one_path(
                            &mut visited,
                            &in_cycles,
                            adj,
                            sub_in_cycle,
                            sub,
                            side,
                        )?;
                    }
                }
            }
        }
        Ok(())
    }

    fn remove_one_path(
        &self,
        visited: &mut BTreeSet<SubStrand>,
        cycle_subs: &BTreeSet<SubStrand>,
        adj: &mut SubStrandAdjacency,
        start: SubStrand,
        next: SubStrand,
        side: bool,
    ) -> Result<()> {
        let remove_key = if side {
            PairKey::new(next, start)
        } else {
            PairKey::new(start, next)
        };
        adj.remove(remove_key);
        visited.insert(next);

        let next_next_side = !self.side_of(start, next)?;
        for &next_next in self.neighbours(next, next_next_side) {
            if !visited.contains(&next_next) && !cycle_subs.contains(&next_next) {
                self.remove_one_path(visited, cycle_subs, adj, next, next_next, side)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ss(strand: usize, substr: usize) -> SubStrand {
        SubStrand::new(strand, substr)
    }

    #[test]
    fn count_accumulates_per_direction() {
        let mut adj = SubStrandAdjacency::default();
        adj.add_sheet();
        let key = PairKey::new(ss(0, 0), ss(1, 0));
        adj.add_bridge_count(key, Direction::Parallel).unwrap();
        adj.add_bridge_count(key, Direction::Parallel).unwrap();
        assert_eq!(adj.node(key).unwrap().residue_pairs, 2);
        assert!(adj
            .add_bridge_count(key, Direction::AntiParallel)
            .is_err());
    }

    #[test]
    fn ensure_undirected_duplicates_edges() {
        let mut adj = SubStrandAdjacency::default();
        adj.add_sheet();
        let key = PairKey::new(ss(0, 0), ss(1, 0));
        adj.add_bridge_count(key, Direction::Parallel).unwrap();
        adj.ensure_undirected();
        assert!(adj.node(key.reverse()).is_some());
        assert_eq!(
            adj.node(key.reverse()).unwrap().direction,
            Direction::Parallel
        );
    }

    #[test]
    fn cleanup_drops_weaker_reverse_edge() {
        let mut adj = SubStrandAdjacency::default();
        adj.add_sheet();
        let key = PairKey::new(ss(0, 0), ss(1, 0));
        for _ in 0..4 {
            adj.add_bridge_count(key, Direction::Parallel).unwrap();
        }
        adj.add_bridge_count(key.reverse(), Direction::Parallel)
            .unwrap();
        adj.register_sheet_directed(true);
        adj.cleanup(&[0, 1]).unwrap();
        assert!(adj.node(key).is_some());
        assert!(adj.node(key.reverse()).is_none());
    }

    #[test]
    fn cleanup_rejects_comparable_reverse_edges() {
        let mut adj = SubStrandAdjacency::default();
        adj.add_sheet();
        let key = PairKey::new(ss(0, 0), ss(1, 0));
        for _ in 0..3 {
            adj.add_bridge_count(key, Direction::Parallel).unwrap();
        }
        for _ in 0..3 {
            adj.add_bridge_count(key.reverse(), Direction::Parallel)
                .unwrap();
        }
        adj.register_sheet_directed(true);
        assert!(adj.cleanup(&[0, 1]).is_err());
    }

    #[test]
    fn cleanup_skips_undirected_sheets() {
        let mut adj = SubStrandAdjacency::default();
        adj.add_sheet();
        let key = PairKey::new(ss(0, 0), ss(1, 0));
        adj.add_bridge_count(key, Direction::Parallel).unwrap();
        adj.add_bridge_count(key.reverse(), Direction::Parallel)
            .unwrap();
        adj.register_sheet_directed(false);
        adj.cleanup(&[0, 1]).unwrap();
        assert!(adj.node(key).is_some());
        assert!(adj.node(key.reverse()).is_some());
    }

    #[test]
    fn pruning_directizes_branches_off_a_cycle() {
        use crate::sheet::topology::PairAttribute;
        use crate::sheet::Sheets;

        let (a, b, c, d) = (ss(0, 0), ss(1, 0), ss(2, 0), ss(3, 0));

        // Fallback component: a three-cycle a-b-c with every edge duplicated
        // in both directions, plus a dangling branch d off a.
        let mut adj = SubStrandAdjacency::default();
        adj.add_sheet();
        let pairs = [(a, b), (b, c), (c, a), (a, d)];
        for &(x, y) in &pairs {
            adj.add_bridge_count(PairKey::new(x, y), Direction::Parallel)
                .unwrap();
        }
        adj.ensure_undirected();
        adj.register_sheet_directed(false);
        adj.gen_adj_vec();

        let mut idx = SideIndex::default();
        idx.add(a, b, true, Direction::Parallel);
        idx.add(b, c, true, Direction::Parallel);
        idx.add(c, a, true, Direction::Parallel);
        // d hangs off the left side of a
        idx.add(a, d, false, Direction::Parallel);

        let mut sheets = Sheets::default();
        let attr = |x, y| PairAttribute {
            ss0: x,
            ss1: y,
            reachable: true,
            jump: 0,
            direction: Direction::Parallel,
            jumped: Vec::new(),
        };
        for &(x, y) in &pairs {
            sheets.add(PairKey::new(x, y), &attr(x, y));
        }
        sheets.cycle_check(adj.map());
        assert!(sheets[0].undirected());
        assert!(sheets[0].has_cycle());

        idx.fix_undirected_paths(&mut adj, &sheets).unwrap();

        // the branch keeps only the edge matching its side registration
        assert!(adj.node(PairKey::new(a, d)).is_none());
        assert!(adj.node(PairKey::new(d, a)).is_some());
        // the cycle stays undirected
        assert!(adj.node(PairKey::new(a, b)).is_some());
        assert!(adj.node(PairKey::new(b, a)).is_some());
    }

    #[test]
    fn side_index_reciprocal_entries() {
        let mut idx = SideIndex::default();
        // parallel: reciprocal lands on the opposite nominal side
        idx.add(ss(0, 0), ss(1, 0), true, Direction::Parallel);
        assert_eq!(idx.neighbours(ss(0, 0), true), &[ss(1, 0)]);
        assert_eq!(idx.neighbours(ss(1, 0), false), &[ss(0, 0)]);
        // anti-parallel: reciprocal lands on the same nominal side
        let mut idx = SideIndex::default();
        idx.add(ss(0, 0), ss(1, 0), true, Direction::AntiParallel);
        assert_eq!(idx.neighbours(ss(1, 0), true), &[ss(0, 0)]);
    }
}
