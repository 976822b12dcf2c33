//! The sub-strand registry: mutable residue ranges while the zone BFS runs,
//! then a sorted immutable index after `finish()`.

use std::collections::{BTreeMap, BTreeSet};

use crate::sheet::SubStrand;

/// Minimum residue count for any sub-strand.
pub const MIN_SUBSTRAND_LEN: i32 = 2;

/// Per-strand inclusive residue ranges.
///
/// During the BFS each strand has at most one open range, extended residue by
/// residue; `close_component()` seals the open ranges after each connected
/// component. `finish()` sorts and renumbers, after which only the accessor
/// methods may be used.
#[derive(Debug, Clone)]
pub struct SubStrandRanges {
    closed: Vec<Vec<[i32; 2]>>,
    open: Vec<Option<[i32; 2]>>,
    index_vec: Vec<SubStrand>,
    finished: bool,
}

impl SubStrandRanges {
    pub fn new(n_strands: usize) -> Self {
        SubStrandRanges {
            closed: vec![Vec::new(); n_strands],
            open: vec![None; n_strands],
            index_vec: Vec::new(),
            finished: false,
        }
    }

    /// Grow the strand's open range to cover `resnum`.
    pub fn extend(&mut self, strand: usize, resnum: i32) {
        debug_assert!(!self.finished);
        match &mut self.open[strand] {
            Some(range) => {
                if resnum < range[0] {
                    range[0] = resnum;
                } else if range[1] < resnum {
                    range[1] = resnum;
                }
            }
            slot @ None => *slot = Some([resnum, resnum]),
        }
    }

    /// Id the strand's open (or next) sub-strand will have.
    pub fn last_substr_id(&self, strand: usize) -> usize {
        self.closed[strand].len()
    }

    /// Seal every open range. Ranges shorter than [`MIN_SUBSTRAND_LEN`] are
    /// dropped and reported back so their edges can be erased.
    pub fn close_component(&mut self) -> BTreeSet<SubStrand> {
        let mut too_short = BTreeSet::new();
        for strand in 0..self.open.len() {
            if let Some(range) = self.open[strand].take() {
                if range[1] - range[0] + 1 < MIN_SUBSTRAND_LEN {
                    too_short.insert(SubStrand::new(strand, self.closed[strand].len()));
                } else {
                    self.closed[strand].push(range);
                }
            }
        }
        too_short
    }

    /// Sort each strand's sub-strands N→C and renumber. Returns the map of
    /// renumbered ids (old → new) to apply to adjacency keys.
    pub fn finish(&mut self) -> BTreeMap<SubStrand, SubStrand> {
        debug_assert!(!self.finished);
        let mut conv = BTreeMap::new();
        for (strand, ranges) in self.closed.iter_mut().enumerate() {
            let mut order: Vec<usize> = (0..ranges.len()).collect();
            order.sort_by_key(|&i| ranges[i][0]);
            let old = ranges.clone();
            for (new_id, &old_id) in order.iter().enumerate() {
                ranges[new_id] = old[old_id];
                if new_id != old_id {
                    conv.insert(
                        SubStrand::new(strand, old_id),
                        SubStrand::new(strand, new_id),
                    );
                }
            }
        }

        self.index_vec = self
            .closed
            .iter()
            .enumerate()
            .flat_map(|(strand, ranges)| {
                (0..ranges.len()).map(move |substr| SubStrand::new(strand, substr))
            })
            .collect();
        self.finished = true;
        conv
    }

    pub fn n_term_res(&self, ss: SubStrand) -> i32 {
        self.closed[ss.strand][ss.substr][0]
    }

    pub fn c_term_res(&self, ss: SubStrand) -> i32 {
        self.closed[ss.strand][ss.substr][1]
    }

    /// All sub-strands, sorted by (strand, substr).
    pub fn all(&self) -> &[SubStrand] {
        debug_assert!(self.finished);
        &self.index_vec
    }

    /// The sub-strands of one strand.
    pub fn of_strand(&self, strand: usize) -> &[SubStrand] {
        let lo = self.index_vec.partition_point(|ss| ss.strand < strand);
        let hi = self.index_vec.partition_point(|ss| ss.strand <= strand);
        &self.index_vec[lo..hi]
    }

    /// N-terminal-most sub-strand of a strand; None when the strand lost all
    /// of its sub-strands.
    pub fn n_term_sub(&self, strand: usize) -> Option<SubStrand> {
        self.of_strand(strand).first().copied()
    }

    pub fn c_term_sub(&self, strand: usize) -> Option<SubStrand> {
        self.of_strand(strand).last().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extend_and_close() {
        let mut ranges = SubStrandRanges::new(2);
        ranges.extend(0, 5);
        ranges.extend(0, 3);
        ranges.extend(0, 7);
        assert_eq!(ranges.last_substr_id(0), 0);
        let short = ranges.close_component();
        assert!(short.is_empty());
        ranges.finish();
        let ss = SubStrand::new(0, 0);
        assert_eq!(ranges.n_term_res(ss), 3);
        assert_eq!(ranges.c_term_res(ss), 7);
    }

    #[test]
    fn short_ranges_are_dropped() {
        let mut ranges = SubStrandRanges::new(1);
        ranges.extend(0, 4);
        let short = ranges.close_component();
        assert_eq!(short.len(), 1);
        assert!(short.contains(&SubStrand::new(0, 0)));
        ranges.finish();
        assert!(ranges.all().is_empty());
        assert_eq!(ranges.n_term_sub(0), None);
    }

    #[test]
    fn finish_sorts_and_renumbers() {
        let mut ranges = SubStrandRanges::new(1);
        // first component covers the C-terminal stretch
        ranges.extend(0, 20);
        ranges.extend(0, 22);
        ranges.close_component();
        // second component covers the N-terminal stretch
        ranges.extend(0, 10);
        ranges.extend(0, 12);
        ranges.close_component();

        let conv = ranges.finish();
        // old id 0 (range 20..22) becomes id 1, old id 1 becomes id 0
        assert_eq!(
            conv.get(&SubStrand::new(0, 0)),
            Some(&SubStrand::new(0, 1))
        );
        assert_eq!(
            conv.get(&SubStrand::new(0, 1)),
            Some(&SubStrand::new(0, 0))
        );
        assert_eq!(ranges.n_term_res(SubStrand::new(0, 0)), 10);
        assert_eq!(ranges.n_term_res(SubStrand::new(0, 1)), 20);
        assert_eq!(ranges.of_strand(0).len(), 2);
        assert_eq!(ranges.n_term_sub(0), Some(SubStrand::new(0, 0)));
        assert_eq!(ranges.c_term_sub(0), Some(SubStrand::new(0, 1)));
    }
}
