//! Simple-cycle enumeration over the directed sub-strand edges.

use crate::sheet::{PairKey, SubStrand};

/// Rotate a cyclic sequence so its smallest element comes first.
pub fn rotate_to_smallest<T: Ord + Clone>(seq: &[T]) -> Vec<T> {
    let Some(min_pos) = seq
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.cmp(b.1))
        .map(|(i, _)| i)
    else {
        return Vec::new();
    };
    let mut out = Vec::with_capacity(seq.len());
    out.extend_from_slice(&seq[min_pos..]);
    out.extend_from_slice(&seq[..min_pos]);
    out
}

/// The reversed cycle, normalised the same way.
pub fn inverted<T: Ord + Clone>(seq: &[T]) -> Vec<T> {
    let rev: Vec<T> = seq.iter().rev().cloned().collect();
    rotate_to_smallest(&rev)
}

/// All simple cycles (length ≥ 3) in the directed multigraph spanned by
/// `keys`, as rotation-normalised node sequences with one representative per
/// {cycle, reverse(cycle)} class.
pub fn find_cycles(keys: &[PairKey]) -> Vec<Vec<SubStrand>> {
    // Intern nodes in first-seen order; edges flat as (even, odd) id pairs.
    let mut nodes: Vec<SubStrand> = Vec::new();
    let mut edges: Vec<usize> = Vec::with_capacity(keys.len() * 2);
    let intern = |nodes: &mut Vec<SubStrand>, ss: SubStrand| -> usize {
        match nodes.iter().position(|n| *n == ss) {
            Some(i) => i,
            None => {
                nodes.push(ss);
                nodes.len() - 1
            }
        }
    };
    for key in keys {
        let id0 = intern(&mut nodes, key.s0);
        edges.push(id0);
        let id1 = intern(&mut nodes, key.s1);
        edges.push(id1);
    }

    let mut hidden: Vec<Vec<usize>> = Vec::new();
    for &start in &edges {
        extend_path(&[start], &edges, &mut hidden);
    }

    hidden
        .iter()
        .map(|cycle| {
            let as_subs: Vec<SubStrand> = cycle.iter().map(|&i| nodes[i]).collect();
            rotate_to_smallest(&as_subs)
        })
        .collect()
}

/// Grow `path` leftward along any edge whose tail equals the current head;
/// a closure onto the path's last node of length ≥ 3 is a cycle.
fn extend_path(path: &[usize], edges: &[usize], cycles: &mut Vec<Vec<usize>>) {
    for i in (0..edges.len()).step_by(2) {
        if path[0] != edges[i] {
            continue;
        }
        let next = edges[i + 1];
        if !path.contains(&next) {
            let mut sub = Vec::with_capacity(path.len() + 1);
            sub.push(next);
            sub.extend_from_slice(path);
            extend_path(&sub, edges, cycles);
        } else if path.len() > 2 && next == *path.last().unwrap() {
            let norm = rotate_to_smallest(path);
            let inv = inverted(&norm);
            if !cycles.contains(&norm) && !cycles.contains(&inv) {
                cycles.push(inv);
            }
        }
    }
}
