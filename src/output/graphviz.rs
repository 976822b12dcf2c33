//! Graphviz rendering of the sub-strand adjacency.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Write};

use crate::color::split_blue_red;
use crate::sheet::{SheetTopology, SubStrand};

const MAX_PENWIDTH: f32 = 5.0;

/// Write the sub-strand graph as a dot file: one node per sub-strand on a
/// blue→red ramp over strands, edge width scaled by bridge count, and
/// `dir=none` on undirected edges.
pub fn write_dot(w: &mut impl Write, topo: &SheetTopology) -> io::Result<()> {
    writeln!(w, "digraph G {{")?;

    let n_sse = topo.sses.len();
    let mut nodes: BTreeMap<SubStrand, usize> = BTreeMap::new();
    let mut node_counter = 0usize;

    for (serial, &sse_id) in topo.strand_indices.iter().enumerate() {
        let substr_vec = topo.substrands.of_strand(serial);
        let fill = split_blue_red(n_sse, sse_id).to_rgb().hex();

        if substr_vec.is_empty() {
            // the strand lost all of its sub-strands to the length filter
            writeln!(
                w,
                "{node_counter}[label=\"{sse_id}\\n[Erased]\", fillcolor=\"{fill}99\", style=filled];"
            )?;
            nodes.insert(SubStrand::new(serial, 0), node_counter);
            node_counter += 1;
            continue;
        }

        let one_substr = substr_vec.len() == 1;
        for &sub in substr_vec {
            nodes.insert(sub, node_counter);
            let label = if one_substr {
                format!("{sse_id}")
            } else {
                format!("{}-{}", sse_id, sub.substr)
            };
            writeln!(
                w,
                "{node_counter}[label=\"{label}\\n[{} ~ {}]\", fillcolor=\"{fill}99\", style=filled];",
                topo.substrands.n_term_res(sub),
                topo.substrands.c_term_res(sub),
            )?;
            node_counter += 1;
        }
    }

    let max_residue_pairs = topo
        .adjacency
        .map()
        .values()
        .map(|node| node.residue_pairs)
        .max();
    let Some(max_residue_pairs) = max_residue_pairs else {
        writeln!(w, "}}")?;
        return Ok(());
    };

    let mut drawn: BTreeSet<crate::sheet::PairKey> = BTreeSet::new();
    for sheet in topo.sheets.iter() {
        for &key in sheet.pair_keys() {
            let directed = !topo.adjacency.map().contains_key(&key.reverse());
            if !directed && drawn.contains(&key.reverse()) {
                continue;
            }
            let node = &topo.adjacency.map()[&key];

            // for undirected edges the deltas read from the N-term side
            let (da, db) = if key.s0.substr < key.s1.substr {
                (node.delta_2, node.delta_1)
            } else {
                (node.delta_1, node.delta_2)
            };
            let penwidth =
                MAX_PENWIDTH * node.residue_pairs as f32 / max_residue_pairs as f32;

            writeln!(
                w,
                "{}->{} [label=\"{}Parallel {da}:{db}\", labeldistance=2.0, penwidth={penwidth}{}];",
                nodes[&key.s0],
                nodes[&key.s1],
                if node.direction.is_parallel() { "" } else { "Anti-" },
                if directed { "" } else { ", dir=none" },
            )?;
            drawn.insert(key);
        }
    }

    writeln!(w, "}}")?;
    Ok(())
}
