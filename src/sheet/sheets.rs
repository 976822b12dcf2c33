//! Sheets: connected groups of sub-strands with their cycles.

use std::collections::{BTreeMap, BTreeSet};

use crate::sheet::adjacency::SubStrandAdjacency;
use crate::sheet::cycles::find_cycles;
use crate::sheet::topology::PairAttribute;
use crate::sheet::{PairKey, PairNode, SubStrand};

/// True when at least one edge of `keys` has its reverse among them.
pub fn check_undirected(keys: &[PairKey]) -> bool {
    let mut set: BTreeSet<PairKey> = keys.iter().copied().collect();
    let mut found = false;
    while let Some(key) = set.pop_first() {
        if set.remove(&key.reverse()) {
            found = true;
        }
    }
    found
}

#[derive(Debug, Clone, Default)]
pub struct Sheet {
    members: BTreeSet<SubStrand>,
    cycles: Vec<Vec<SubStrand>>,
    size: usize,
    max_key: Option<PairKey>,
    has_cycle: bool,
    undirected: bool,
    pair_keys: Vec<PairKey>,
}

impl Sheet {
    pub fn members(&self) -> &BTreeSet<SubStrand> {
        &self.members
    }

    pub fn cycles(&self) -> &[Vec<SubStrand>] {
        &self.cycles
    }

    /// `max(longest jump + 2, largest cycle length)`.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn has_cycle(&self) -> bool {
        self.has_cycle
    }

    pub fn undirected(&self) -> bool {
        self.undirected
    }

    /// The adjacency keys internal to this sheet (after pruning), sorted.
    pub fn pair_keys(&self) -> &[PairKey] {
        &self.pair_keys
    }

    fn add(&mut self, key: PairKey, attr: &PairAttribute) {
        self.members.insert(key.s0);
        self.members.insert(key.s1);
        self.members.extend(attr.jumped.iter().copied());
        self.add_jump(key, attr.jump);
    }

    fn merge(&mut self, other: &Sheet) {
        self.members.extend(other.members.iter().copied());
        if let Some(max_key) = other.max_key {
            self.add_jump(max_key, other.size.saturating_sub(2));
        }
    }

    fn add_jump(&mut self, key: PairKey, jump: usize) {
        if self.size < jump + 2 {
            self.size = jump + 2;
            self.max_key = Some(key);
        }
    }

    fn keys(&self, all_keys: &[PairKey]) -> Vec<PairKey> {
        all_keys
            .iter()
            .filter(|key| self.members.contains(&key.s0) && self.members.contains(&key.s1))
            .copied()
            .collect()
    }

    /// Decide undirectedness and collect cycles from the pre-pruning keys.
    fn finish(&mut self, all_keys: &[PairKey]) {
        let this_keys = self.keys(all_keys);
        self.undirected = check_undirected(&this_keys);
        self.cycles = find_cycles(&this_keys);
        if let Some(longest) = self.cycles.iter().map(|c| c.len()).max() {
            self.has_cycle = true;
            self.size = self.size.max(longest);
        }
        debug_assert!(!self.undirected || self.has_cycle);
    }

    /// Every sub-strand appearing in any cycle.
    pub fn subs_in_cycles(&self) -> BTreeSet<SubStrand> {
        self.cycles.iter().flatten().copied().collect()
    }

    /// Whether both sub-strands appear in one of this sheet's cycles.
    pub fn in_same_cycle(&self, a: SubStrand, b: SubStrand) -> bool {
        self.cycles
            .iter()
            .any(|cycle| cycle.contains(&a) && cycle.contains(&b))
    }

    fn add_key_vec(&mut self, all_keys: &[PairKey]) {
        self.pair_keys = self.keys(all_keys);
        self.pair_keys.sort();
    }
}

/// All sheets of one structure.
#[derive(Debug, Clone, Default)]
pub struct Sheets {
    data: Vec<Sheet>,
}

impl Sheets {
    /// Place a reachable pair into a sheet, merging any sheets the new
    /// members connect.
    pub fn add(&mut self, key: PairKey, attr: &PairAttribute) {
        let mut involved: Vec<SubStrand> = vec![key.s0, key.s1];
        involved.extend(attr.jumped.iter().copied());

        let idx = match self
            .data
            .iter()
            .position(|sheet| involved.iter().any(|ss| sheet.members.contains(ss)))
        {
            Some(i) => i,
            None => {
                self.data.push(Sheet::default());
                self.data.len() - 1
            }
        };
        self.data[idx].add(key, attr);
        self.reconstruct();
    }

    /// Merge sheets sharing a sub-strand.
    fn reconstruct(&mut self) {
        let mut i = 0;
        while i < self.data.len() {
            let mut j = i + 1;
            while j < self.data.len() {
                let overlap = self.data[i]
                    .members
                    .intersection(&self.data[j].members)
                    .next()
                    .is_some();
                if overlap {
                    let other = self.data.remove(j);
                    self.data[i].merge(&other);
                } else {
                    j += 1;
                }
            }
            i += 1;
        }
    }

    /// Run cycle detection and the undirectedness check on every sheet.
    pub fn cycle_check(&mut self, adj_map: &BTreeMap<PairKey, PairNode>) {
        let keys: Vec<PairKey> = adj_map.keys().copied().collect();
        for sheet in &mut self.data {
            sheet.finish(&keys);
        }
    }

    /// Seed each sheet's key vector from the (pruned) adjacency.
    pub fn add_key_vec(&mut self, adj: &SubStrandAdjacency) {
        let keys: Vec<PairKey> = adj.map().keys().copied().collect();
        for sheet in &mut self.data {
            sheet.add_key_vec(&keys);
        }
    }

    /// Order sheets by their smallest member sub-strand.
    pub fn sort_sheets(&mut self) {
        self.data
            .sort_by_key(|sheet| sheet.members.iter().next().copied());
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sheet> {
        self.data.iter()
    }

    /// Index of the sheet containing `sub`, if any.
    pub fn find_sheet(&self, sub: SubStrand) -> Option<usize> {
        self.data
            .iter()
            .position(|sheet| sheet.members.contains(&sub))
    }
}

impl std::ops::Index<usize> for Sheets {
    type Output = Sheet;

    fn index(&self, i: usize) -> &Sheet {
        &self.data[i]
    }
}
