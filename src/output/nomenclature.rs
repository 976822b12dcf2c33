//! Sheet nomenclature strings and adjacent sub-strand extraction.

use std::collections::BTreeMap;

use crate::sheet::cycles::find_cycles;
use crate::sheet::sheets::{check_undirected, Sheet};
use crate::sheet::{PairKey, SheetTopology, SubStrand};

/// One step of the pair-style (Richardson) description: how far the next
/// sequential strand sits and whether the junction is parallel.
#[derive(Debug, Clone, Copy)]
struct PairArrangement {
    to_next: i32,
    parallel: bool,
}

/// One strand of the position-style (Cohen) description.
#[derive(Debug, Clone, Copy)]
struct Position {
    seq_id: usize,
    pos: i32,
    plus: bool,
}

/// Topology strings of a sheet or an extracted sub-strand walk.
#[derive(Debug, Clone)]
pub struct TopologyString {
    pair_style: Vec<PairArrangement>,
    position_style: Vec<Position>,
}

impl TopologyString {
    /// For a whole sheet. Undirected or branched sheets have no linear
    /// description and render as "NA".
    pub fn for_sheet(sheet: &Sheet, topo: &SheetTopology) -> Self {
        if sheet.undirected() || sheet.size() != sheet.members().len() {
            return TopologyString {
                pair_style: Vec::new(),
                position_style: Vec::new(),
            };
        }
        let members: Vec<SubStrand> = sheet.members().iter().copied().collect();
        Self::build(&members, topo.adjacency.adj_vec(), sheet.has_cycle(), topo)
    }

    /// For an explicit sub-strand set, searched over its induced adjacency.
    pub fn for_substrands(
        ss_vec: &[SubStrand],
        with_cycle: bool,
        topo: &SheetTopology,
    ) -> Self {
        let induced = topo.adjacency.induced_adj_vec(ss_vec);
        Self::build(ss_vec, &induced, with_cycle, topo)
    }

    fn build(
        ss_vec: &[SubStrand],
        adj_vec: &BTreeMap<SubStrand, Vec<PairKey>>,
        with_cycle: bool,
        topo: &SheetTopology,
    ) -> Self {
        let mut seq_ss = ss_vec.to_vec();
        seq_ss.sort();

        let mut pair_style = Vec::new();
        if seq_ss.len() > 1 {
            if with_cycle {
                // Inside a cycle both directions reach; walk the shorter way.
                let fwd = topo.search_in(seq_ss[0], seq_ss[1], adj_vec);
                let rev = topo.search_in(seq_ss[1], seq_ss[0], adj_vec);
                let forward = fwd.jump < rev.jump;
                for pair in seq_ss.windows(2) {
                    let attr = if forward {
                        topo.search_in(pair[0], pair[1], adj_vec)
                    } else {
                        topo.search_in(pair[1], pair[0], adj_vec)
                    };
                    pair_style.push(PairArrangement {
                        to_next: attr.jump as i32 + 1,
                        parallel: attr.direction.is_parallel(),
                    });
                }
            } else {
                for pair in seq_ss.windows(2) {
                    let fwd = topo.search_in(pair[0], pair[1], adj_vec);
                    let rev = topo.search_in(pair[1], pair[0], adj_vec);
                    let (attr, sign) = if fwd.reachable { (fwd, 1) } else { (rev, -1) };
                    pair_style.push(PairArrangement {
                        to_next: sign * (attr.jump as i32 + 1),
                        parallel: attr.direction.is_parallel(),
                    });
                }
            }

            // Normalise so the first step is positive.
            if pair_style.first().map(|p| p.to_next < 0).unwrap_or(false) {
                for pair in &mut pair_style {
                    pair.to_next = -pair.to_next;
                }
            }
        }

        let position_style = init_position_style(&pair_style);
        TopologyString {
            pair_style,
            position_style,
        }
    }

    /// Richardson style: `[+-]<n>` per junction, `x` marking parallel ones.
    pub fn richardson(&self) -> String {
        if self.pair_style.is_empty() {
            return "NA".to_string();
        }
        self.pair_style
            .iter()
            .map(|p| format!("{:+}{}", p.to_next, if p.parallel { "x" } else { "" }))
            .collect()
    }

    /// Cohen style: `[+-]_<seq>,` per strand, sorted by lateral position.
    pub fn cohen(&self) -> String {
        if self.position_style.is_empty() {
            return "NA".to_string();
        }
        let mut by_pos = self.position_style.clone();
        for (i, p) in by_pos.iter_mut().enumerate() {
            p.seq_id = i + 1;
        }
        by_pos.sort_by_key(|p| p.pos);
        by_pos
            .iter()
            .map(|p| format!("{}_{},", if p.plus { "+" } else { "-" }, p.seq_id))
            .collect()
    }
}

/// Accumulate lateral positions from the pair style, rebase the smallest to
/// 1, and flip horizontally when the first strand falls in the right half.
fn init_position_style(pair_style: &[PairArrangement]) -> Vec<Position> {
    if pair_style.is_empty() {
        return Vec::new();
    }
    let n_str = pair_style.len() + 1;

    let mut raw = Vec::with_capacity(n_str);
    raw.push(Position {
        seq_id: 0,
        pos: 0,
        plus: true,
    });
    for (i, pair) in pair_style.iter().enumerate() {
        raw.push(Position {
            seq_id: 0,
            pos: raw[i].pos + pair.to_next,
            plus: raw[i].plus == pair.parallel,
        });
    }

    let min_pos = raw.iter().map(|p| p.pos).min().unwrap_or(0);
    let diff = -min_pos + 1;
    let mut out: Vec<Position> = raw
        .iter()
        .enumerate()
        .map(|(seq_id, p)| Position {
            seq_id,
            pos: p.pos + diff,
            plus: p.plus,
        })
        .collect();

    if (n_str as i32) / 2 < out[0].pos {
        for p in &mut out {
            p.pos = n_str as i32 - p.pos + 1;
        }
    }
    out
}

/// Whether the induced edge set over `ss_vec` contains a cycle.
pub fn has_cycle_within(ss_vec: &[SubStrand], topo: &SheetTopology) -> bool {
    let keys: Vec<PairKey> = topo
        .adjacency
        .map()
        .keys()
        .filter(|key| ss_vec.contains(&key.s0) && ss_vec.contains(&key.s1))
        .copied()
        .collect();
    !find_cycles(&keys).is_empty()
}

/// All walks of `n` adjacent sub-strands inside each sheet whose induced
/// sub-graph is directed. Returns (sorted members, sheet index,
/// sheet-has-exactly-n-members).
pub fn extract_adjacent_substrands(
    topo: &SheetTopology,
    n: usize,
) -> Vec<(Vec<SubStrand>, usize, bool)> {
    let mut out = Vec::new();
    for (sheet_idx, sheet) in topo.sheets.iter().enumerate() {
        for &start in sheet.members() {
            let mut found: Vec<Vec<SubStrand>> = Vec::new();
            recursive_extract(&[start], &mut found, sheet, n, topo);
            for path in found {
                let mut sorted = path;
                sorted.sort();
                out.push((sorted, sheet_idx, n == sheet.members().len()));
            }
        }
    }
    out
}

fn recursive_extract(
    path: &[SubStrand],
    found: &mut Vec<Vec<SubStrand>>,
    sheet: &Sheet,
    n: usize,
    topo: &SheetTopology,
) {
    if path.len() == n {
        let induced = topo.adjacency.induced_adj_vec(path);
        let keys: Vec<PairKey> = induced.values().flatten().copied().collect();
        if !keys.is_empty() && !check_undirected(&keys) {
            found.push(path.to_vec());
        }
        return;
    }

    for key in sheet.pair_keys() {
        if key.s0 != *path.last().unwrap() || path.contains(&key.s1) {
            continue;
        }
        let mut next = path.to_vec();
        next.push(key.s1);
        recursive_extract(&next, found, sheet, n, topo);
    }
}
