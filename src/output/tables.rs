//! The record-stream sections of the report, in a PDB-like and an
//! mmCIF-like flavour.

use std::collections::BTreeMap;
use std::io::{self, Write};

use crate::bab::{BabFilter, BabResult};
use crate::error::{Result, TopoError};
use crate::output::nomenclature::{has_cycle_within, TopologyString};
use crate::output::join;
use crate::pdb::SseKind;
use crate::sheet::cycles::find_cycles;
use crate::sheet::zone::{BridgeKind, SideTag};
use crate::sheet::{PairKey, SheetTopology, SubStrand};

/// Output style. The mmCIF-like flavour additionally carries the
/// `adjacency_list` and `handedness` sections but drops the strand-pair and
/// residue-pair streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    PdbLike,
    MmcifLike,
}

fn mmcif_loop_head(w: &mut impl Write, class: &str, keys: &[&str]) -> io::Result<()> {
    writeln!(w, "#")?;
    writeln!(w, "loop_")?;
    for key in keys {
        writeln!(w, "_{class}.{key}")?;
    }
    Ok(())
}

fn tf(b: bool) -> char {
    if b {
        'T'
    } else {
        'F'
    }
}

/// SUBSTRAND: one row per sub-strand with its sheet and residue range.
pub fn write_substrands(
    w: &mut impl Write,
    topo: &SheetTopology,
    sheet_map: &BTreeMap<SubStrand, usize>,
    flavor: Flavor,
) -> io::Result<()> {
    if topo.substrands.all().is_empty() {
        return Ok(());
    }
    match flavor {
        Flavor::PdbLike => {
            writeln!(w, "REMARK            SubStrand_ID  Sheet_ID   Ini   End")?;
            for &ss in topo.substrands.all() {
                writeln!(
                    w,
                    "SUBSTRAND         {:>12}  {:>8}  {:>4}  {:>4}",
                    topo.substr_label(ss),
                    sheet_map[&ss],
                    topo.substrands.n_term_res(ss),
                    topo.substrands.c_term_res(ss),
                )?;
            }
        }
        Flavor::MmcifLike => {
            mmcif_loop_head(w, "substrand", &["SubStrand_ID", "Sheet_ID", "Ini", "End"])?;
            for &ss in topo.substrands.all() {
                writeln!(
                    w,
                    "{:>4}  {:>4}  {:>4}  {:>4}",
                    topo.substr_label(ss),
                    sheet_map[&ss],
                    topo.substrands.n_term_res(ss),
                    topo.substrands.c_term_res(ss),
                )?;
            }
        }
    }
    Ok(())
}

/// HELIX: the helices of the structure by SSE id.
pub fn write_helices(w: &mut impl Write, topo: &SheetTopology, flavor: Flavor) -> io::Result<()> {
    let helices: Vec<usize> = (0..topo.sses.len())
        .filter(|&i| topo.sses[i].kind == SseKind::Helix)
        .collect();
    if helices.is_empty() {
        return Ok(());
    }
    match flavor {
        Flavor::PdbLike => {
            writeln!(w, "REMARK                              SSE_ID   Ini   End")?;
            for i in helices {
                writeln!(
                    w,
                    "HELIX                           {:>8}  {:>4}  {:>4}",
                    i, topo.sses[i].init, topo.sses[i].end
                )?;
            }
        }
        Flavor::MmcifLike => {
            mmcif_loop_head(w, "helix", &["SSE_ID", "Ini", "End"])?;
            for i in helices {
                writeln!(w, "{:>8}  {:>4}  {:>4}", i, topo.sses[i].init, topo.sses[i].end)?;
            }
        }
    }
    Ok(())
}

/// True when walking the sheet members in order never skips a sub-strand or
/// a strand.
fn is_all_consec(sheet: &crate::sheet::Sheet, topo: &SheetTopology) -> bool {
    let seq_ss: Vec<SubStrand> = sheet.members().iter().copied().collect();
    let all = topo.substrands.all();
    for pair in seq_ss.windows(2) {
        let i0 = all.iter().position(|&s| s == pair[0]);
        let i1 = all.iter().position(|&s| s == pair[1]);
        match (i0, i1) {
            (Some(a), Some(b)) if b == a + 1 => {}
            _ => return false,
        }
        let diff = topo.strand_indices[pair[1].strand] as i64
            - topo.strand_indices[pair[0].strand] as i64;
        if diff != 0 && diff != 1 {
            return false;
        }
    }
    true
}

/// (all directly-paired members parallel, all anti-parallel).
fn check_all_pap(sheet: &crate::sheet::Sheet, topo: &SheetTopology) -> (bool, bool) {
    let members: Vec<SubStrand> = sheet.members().iter().copied().collect();
    let mut all_p = true;
    let mut all_ap = true;
    for (i, &a) in members.iter().enumerate() {
        for &b in &members[i + 1..] {
            let attr = topo.attr(a, b);
            if attr.jump != 0 {
                continue;
            }
            if attr.direction.is_parallel() {
                all_ap = false;
            } else {
                all_p = false;
            }
        }
    }
    (all_p, all_ap)
}

/// SHEET_INFO: per-sheet summary with member list and both nomenclatures.
pub fn write_sheet_info(
    w: &mut impl Write,
    topo: &SheetTopology,
    flavor: Flavor,
) -> io::Result<()> {
    if topo.sheets.is_empty() {
        return Ok(());
    }

    struct Row {
        n_members: usize,
        n_cycles: usize,
        undirected: bool,
        with_branch: bool,
        consecutive: bool,
        all_p: bool,
        all_ap: bool,
        members: String,
        richardson: String,
        cohen: String,
    }

    let rows: Vec<Row> = topo
        .sheets
        .iter()
        .map(|sheet| {
            let topo_str = TopologyString::for_sheet(sheet, topo);
            let (all_p, all_ap) = check_all_pap(sheet, topo);
            let members = format!(
                "'{}'",
                join(sheet.members().iter().map(|&ss| topo.substr_label(ss)), ",")
            );
            Row {
                n_members: sheet.members().len(),
                n_cycles: sheet.cycles().len(),
                undirected: sheet.undirected(),
                with_branch: sheet.size() != sheet.members().len(),
                consecutive: is_all_consec(sheet, topo),
                all_p,
                all_ap,
                members,
                richardson: topo_str.richardson(),
                cohen: topo_str.cohen(),
            }
        })
        .collect();

    match flavor {
        Flavor::PdbLike => {
            writeln!(
                w,
                "REMARK            Sheet_ID  N_strands  Cycle  Undirected  With_branch  Consecutive  All_para  All_anti"
            )?;
            for (sheet_id, row) in rows.iter().enumerate() {
                writeln!(
                    w,
                    "SHEET_INFO        {:>8}  {:>9}  {:>5}  {:>10}  {:>11}  {:>11}  {:>8}  {:>8}",
                    sheet_id,
                    row.n_members,
                    row.n_cycles,
                    tf(row.undirected),
                    tf(row.with_branch),
                    tf(row.consecutive),
                    tf(row.all_p),
                    tf(row.all_ap),
                )?;
            }
            writeln!(w)?;
            writeln!(w, "REMARK            Sheet  Description")?;
            for (sheet_id, row) in rows.iter().enumerate() {
                writeln!(w, "MEMBER            {:>5}  {}", sheet_id, row.members)?;
                writeln!(w, "NOMENCLATURE_R    {:>5}  {}", sheet_id, row.richardson)?;
                writeln!(w, "NOMENCLATURE_C    {:>5}  {}", sheet_id, row.cohen)?;
            }
        }
        Flavor::MmcifLike => {
            mmcif_loop_head(
                w,
                "sheet",
                &[
                    "Sheet_ID",
                    "N_strands",
                    "Cycle",
                    "Undirected",
                    "With_branch",
                    "Consecutive",
                    "All_para",
                    "All_anti",
                    "Member",
                    "Nomenclature_R",
                    "Nomenclature_C",
                ],
            )?;
            for (sheet_id, row) in rows.iter().enumerate() {
                writeln!(
                    w,
                    "{:>3}  {:>3}  {:>3} {} {} {} {} {} {}  {}  {}",
                    sheet_id,
                    row.n_members,
                    row.n_cycles,
                    tf(row.undirected),
                    tf(row.with_branch),
                    tf(row.consecutive),
                    tf(row.all_p),
                    tf(row.all_ap),
                    row.members,
                    row.richardson,
                    row.cohen,
                )?;
            }
        }
    }
    Ok(())
}

/// EXT_SHEET: walks of `n` adjacent sub-strands with their Cohen strings.
pub fn write_ext_sheets(
    w: &mut impl Write,
    topo: &SheetTopology,
    n: usize,
    flavor: Flavor,
) -> io::Result<()> {
    let extracted = crate::output::extract_adjacent_substrands(topo, n);
    if extracted.is_empty() {
        return Ok(());
    }
    if flavor == Flavor::PdbLike {
        writeln!(
            w,
            "REMARK            Sheet_ID  N_strands  Same_as_Original  Member  Nomenclature_C"
        )?;
    } else {
        mmcif_loop_head(
            w,
            "extracted_sheet",
            &["Sheet_ID", "N_strands", "Same_as_Original", "Member", "Nomenclature_C"],
        )?;
    }
    for (members, sheet_idx, same_as_whole) in &extracted {
        let with_cycle = has_cycle_within(members, topo);
        let topo_str = TopologyString::for_substrands(members, with_cycle, topo);
        let member_list = format!(
            "'{}'",
            join(members.iter().map(|&ss| topo.substr_label(ss)), ",")
        );
        match flavor {
            Flavor::PdbLike => writeln!(
                w,
                "EXT_SHEET         {:>8}  {:>9}  {}                 {}  {}",
                sheet_idx,
                n,
                tf(*same_as_whole),
                member_list,
                topo_str.cohen(),
            )?,
            Flavor::MmcifLike => writeln!(
                w,
                "{:>3} {:>3} {} {}  {}",
                sheet_idx,
                n,
                tf(*same_as_whole),
                member_list,
                topo_str.cohen(),
            )?,
        }
    }
    Ok(())
}

/// CYCLE: every cycle found over the pruned per-sheet edges.
pub fn write_cycles(w: &mut impl Write, topo: &SheetTopology, flavor: Flavor) -> io::Result<()> {
    let mut rows = Vec::new();
    for (sheet_id, sheet) in topo.sheets.iter().enumerate() {
        for cycle in find_cycles(sheet.pair_keys()) {
            let members = format!(
                "'{}'",
                join(cycle.iter().map(|&ss| topo.substr_label(ss)), ",")
            );
            rows.push((sheet_id, cycle.len(), members));
        }
    }
    if rows.is_empty() {
        return Ok(());
    }
    if flavor == Flavor::PdbLike {
        writeln!(w, "REMARK            Sheet_ID  N_strands  Member")?;
        for (sheet_id, len, members) in rows {
            writeln!(w, "CYCLE             {:>8}  {:>9}  {}", sheet_id, len, members)?;
        }
    } else {
        mmcif_loop_head(w, "cycle", &["Sheet_ID", "N_strands", "Member"])?;
        for (sheet_id, len, members) in rows {
            writeln!(w, "{:>3} {:>3} {}", sheet_id, len, members)?;
        }
    }
    Ok(())
}

/// One STRAND_PAIR row.
#[derive(Debug, Clone)]
pub struct StrandPairRow {
    pub b1: String,
    pub b2: String,
    pub sheet: String,
    pub dir: String,
    pub pora: String,
    pub jump: usize,
    pub d1: i32,
    pub d2: i32,
    pub bridge: u32,
    pub score: f32,
    pub sses_lbts: String,
    pub numres_lbts: i64,
}

/// Connection-class string of the stretch between two sub-strands:
/// `b-c-b`, `b-a-b`, `b-ab'-b`, ...
fn connection_class(
    topo: &SheetTopology,
    sheet_map: &BTreeMap<SubStrand, usize>,
    ss0: SubStrand,
    ss1: SubStrand,
) -> String {
    let mut has_helix = false;
    let first_sse = topo.strand_indices[ss0.strand];
    let last_sse = topo.strand_indices[ss1.strand];
    for sse_id in first_sse + 1..last_sse {
        if topo.sses[sse_id].kind == SseKind::Helix {
            has_helix = true;
            break;
        }
    }

    let all = topo.substrands.all();
    let i0 = all.iter().position(|&s| s == ss0).expect("known sub-strand");
    let i1 = all.iter().position(|&s| s == ss1).expect("known sub-strand");
    let target_sheet = sheet_map[&ss1];
    let mut same_sheet = false;
    let mut other_sheet = false;
    for &mid in &all[i0 + 1..i1] {
        if sheet_map[&mid] == target_sheet {
            same_sheet = true;
        } else {
            other_sheet = true;
        }
    }

    if !has_helix && !other_sheet && !same_sheet {
        return "b-c-b".to_string();
    }
    let mut class = String::from("b-");
    if has_helix {
        class.push('a');
    }
    if same_sheet {
        class.push('b');
    }
    if other_sheet {
        class.push_str("b'");
    }
    class + "-b"
}

/// Build all STRAND_PAIR rows, driving the handedness filter for each
/// same-sheet pair.
pub fn strand_pair_rows(
    topo: &SheetTopology,
    sheet_map: &BTreeMap<SubStrand, usize>,
    bab: &mut BabFilter,
) -> Result<Vec<StrandPairRow>> {
    let mut rows = Vec::new();
    let subs = topo.substrands.all();

    for (i, &ss0) in subs.iter().enumerate() {
        for &ss1 in &subs[i + 1..] {
            let b1 = topo.substr_label(ss0);
            let b2 = topo.substr_label(ss1);
            let sses_lbts = connection_class(topo, sheet_map, ss0, ss1);
            let numres_lbts = topo.substrands.n_term_res(ss1) as i64
                - topo.substrands.c_term_res(ss0) as i64
                - 1;

            if sheet_map[&ss0] != sheet_map[&ss1] {
                rows.push(StrandPairRow {
                    b1,
                    b2,
                    sheet: "other".into(),
                    dir: String::new(),
                    pora: String::new(),
                    jump: 0,
                    d1: -1,
                    d2: -1,
                    bridge: 0,
                    score: -1.0,
                    sses_lbts: String::new(),
                    numres_lbts: 0,
                });
                continue;
            }

            let seq_key = PairKey::new(ss0, ss1);
            let seq_attr = topo.attr_directed(ss0, ss1);
            let rev_attr = topo.attr_directed(ss1, ss0);

            if !seq_attr.reachable && !rev_attr.reachable {
                // 100 is a sentinel: same sheet, but no path either way.
                rows.push(StrandPairRow {
                    b1,
                    b2,
                    sheet: "same".into(),
                    dir: "?".into(),
                    pora: "????".into(),
                    jump: 100,
                    d1: -1,
                    d2: -1,
                    bridge: 0,
                    score: -1.0,
                    sses_lbts,
                    numres_lbts,
                });
                continue;
            }

            let sheet = &topo.sheets[sheet_map[&ss0]];
            let undirected = sheet.undirected();
            let in_same_cycle = sheet.in_same_cycle(ss0, ss1);

            if in_same_cycle && !(seq_attr.reachable && rev_attr.reachable) {
                let (from, to) = if seq_attr.reachable {
                    (b2, b1)
                } else {
                    (b1, b2)
                };
                return Err(TopoError::OneDirectionalCycle(from, to));
            }

            let take_seq = if in_same_cycle {
                seq_attr.jump < rev_attr.jump
            } else {
                seq_attr.reachable
            };
            let (attr, key) = if take_seq {
                (seq_attr, seq_key)
            } else {
                (rev_attr, seq_key.reverse())
            };

            let (mut d1, mut d2, mut bridge) = (-1, -1, 0);
            if attr.jump == 0 {
                let node = topo.adjacency.node(key).expect("adjacent pair has an edge");
                d1 = node.delta_1;
                d2 = node.delta_2;
                bridge = node.residue_pairs;
                debug_assert_eq!(node.direction, attr.direction);
            }

            let (sheet_label, dir) = if in_same_cycle && undirected {
                ("same_undir_cycle".to_string(), "?".to_string())
            } else if in_same_cycle {
                (
                    "same_in_cycle".to_string(),
                    if seq_attr.jump < rev_attr.jump { "-->" } else { "<--" }.to_string(),
                )
            } else if undirected {
                (
                    "same_undirected".to_string(),
                    if seq_attr.reachable { "-->" } else { "<--" }.to_string(),
                )
            } else {
                (
                    "same".to_string(),
                    if seq_attr.reachable { "-->" } else { "<--" }.to_string(),
                )
            };

            // Anti-parallel pairs are scored as if the second strand were
            // reversed.
            let reversed: u64 = if attr.direction.is_parallel() {
                0
            } else {
                1 << topo.strand_indices[ss1.strand]
            };
            let seq: Vec<usize> =
                (topo.strand_indices[ss0.strand]..=topo.strand_indices[ss1.strand]).collect();
            bab.run_pair(ss0, ss1, &seq, reversed);
            let score = if bab.result().success {
                bab.result().left_score
            } else {
                -1.0
            };

            rows.push(StrandPairRow {
                b1,
                b2,
                sheet: sheet_label,
                dir,
                pora: attr.direction.short().to_string(),
                jump: attr.jump,
                d1,
                d2,
                bridge,
                score,
                sses_lbts,
                numres_lbts,
            });
        }
    }
    Ok(rows)
}

/// STRAND_PAIR: PDB-like flavour only. Columns that carry no information
/// for a row are printed as `?`.
pub fn write_strand_pairs(w: &mut impl Write, rows: &[StrandPairRow]) -> io::Result<()> {
    if rows.is_empty() {
        return Ok(());
    }
    writeln!(
        w,
        "REMARK               B1    B2             Sheet Dir PorA Jump  D1  D2 Bridge Score SSEs_LBTS NumRes_LBTS"
    )?;
    for row in rows {
        if !row.sheet.starts_with("same") {
            writeln!(
                w,
                "STRAND_PAIR       {:>5} {:>5} {:>17}   ?    ?    ?   ?   ?      ?     ?         ?           ?",
                row.b1, row.b2, row.sheet
            )?;
            continue;
        }
        let score = if row.score < 0.0 {
            "?".to_string()
        } else {
            format!("{:.2}", row.score)
        };
        let (d1, d2, bridge) = if row.jump != 0 {
            ("?".to_string(), "?".to_string(), "?".to_string())
        } else {
            (
                row.d1.to_string(),
                row.d2.to_string(),
                row.bridge.to_string(),
            )
        };
        writeln!(
            w,
            "STRAND_PAIR       {:>5} {:>5} {:>17} {:>3} {:>4} {:>4} {:>3} {:>3} {:>6} {:>5} {:>9} {:>11}",
            row.b1,
            row.b2,
            row.sheet,
            row.dir,
            row.pora,
            row.jump,
            d1,
            d2,
            bridge,
            score,
            row.sses_lbts,
            row.numres_lbts,
        )?;
    }
    Ok(())
}

/// RESIDUE_PAIR: every coloured residue's bridges with class and face.
pub fn write_residue_pairs(w: &mut impl Write, topo: &SheetTopology) -> io::Result<()> {
    let mut rows: Vec<(i32, i32, &str, &str, &str)> = Vec::new();

    for (strand, zone) in topo.zone.zones.iter().enumerate() {
        let init = topo.sses[topo.strand_indices[strand]].init;
        for (offset, info) in zone.iter().enumerate() {
            if !info.colored {
                continue;
            }
            let res0 = init + offset as i32;
            for partner in info.adj.iter().flatten() {
                let res1 = topo.sses[topo.strand_indices[partner.residue.strand]].init
                    + partner.residue.offset as i32;
                let (pora, kind) = match partner.kind {
                    BridgeKind::ParallelNoHbonds => ("para", "A"),
                    BridgeKind::ParallelHbonds => ("para", "B"),
                    BridgeKind::LargeRing => ("anti", "Non-H-bonded"),
                    BridgeKind::SmallRing => ("anti", "H-bonded"),
                };
                let face = if info.side == SideTag::Upper {
                    "Front"
                } else {
                    "Back"
                };
                rows.push((res0, res1, pora, kind, face));
            }
        }
    }
    if rows.is_empty() {
        return Ok(());
    }
    rows.sort_by_key(|r| (r.0, r.1));

    writeln!(w, "REMARK            ResNum1  ResNum2  PorA     Pair-type   ForB")?;
    for (res0, res1, pora, kind, face) in rows {
        writeln!(
            w,
            "RESIDUE_PAIR      {:>7}  {:>7}  {}  {:>12}  {:>5}",
            res0, res1, pora, kind, face
        )?;
    }
    Ok(())
}

/// mmCIF-only: every retained edge with its sheet, direction, deltas, and
/// bridge count.
pub fn write_adjacency_list(w: &mut impl Write, topo: &SheetTopology) -> io::Result<()> {
    let mut lines = Vec::new();
    for (sheet_idx, sheet) in topo.sheets.iter().enumerate() {
        for key in sheet.pair_keys() {
            let node = &topo.adjacency.map()[key];
            lines.push(format!(
                "{:>3}  {:>13} {:>3} {:>3} {:>3}  {:>5} {:>5}",
                sheet_idx,
                node.direction.label(),
                node.delta_1,
                node.delta_2,
                node.residue_pairs,
                topo.substr_label(key.s0),
                topo.substr_label(key.s1),
            ));
        }
    }

    writeln!(w, "#")?;
    writeln!(w, "_adjacency_list.num\t{}", lines.len())?;
    if lines.is_empty() {
        return Ok(());
    }
    mmcif_loop_head(
        w,
        "adjacency_list",
        &["sheet_id", "direction", "delta_1", "delta_2", "num_bridges", "substr_0", "substr_1"],
    )?;
    for line in lines {
        writeln!(w, "{line}")?;
    }
    Ok(())
}

/// Survey all SSE windows with the handedness filter, returning every
/// successful run.
pub fn handedness_survey(topo: &SheetTopology, bab: &mut BabFilter) -> Vec<BabResult> {
    let n_sse = topo.sses.len();
    let seq: Vec<usize> = (0..n_sse).collect();
    let mut found = Vec::new();
    for i in 0..n_sse {
        for j in i + 1..=n_sse {
            bab.run(&seq[i..j], 0);
            if bab.result().success {
                found.push(*bab.result());
            }
        }
    }
    found
}

fn connection_type_string(connection_type: u8) -> &'static str {
    match connection_type {
        1 | 3 => "beta-alpha-beta",
        2 => "beta-loop-beta",
        4 | 6 => "beta-beta-beta",
        5 | 7 => "beta-alpha(+beta)-beta",
        _ => "",
    }
}

/// mmCIF-only: the handedness survey results.
pub fn write_handedness(
    w: &mut impl Write,
    topo: &SheetTopology,
    results: &[BabResult],
) -> io::Result<()> {
    writeln!(w, "#")?;
    writeln!(w, "_handedness.num\t{}", results.len())?;
    if results.is_empty() {
        return Ok(());
    }
    mmcif_loop_head(
        w,
        "handedness",
        &["SubStrand_0", "SubStrand_1", "score", "mid_residues", "mid_strands", "type", "jump"],
    )?;
    for result in results {
        writeln!(
            w,
            "{:>5} {:>5} {:>4.2} {:>3} {:>2} {:>22} {}",
            topo.substr_label(result.sub_first),
            topo.substr_label(result.sub_last),
            result.left_score,
            result.mid_res_len,
            result.n_mid_strands,
            connection_type_string(result.connection_type),
            result.jump,
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bab::BabConfig;
    use crate::pdb::sse::{SseHeader, SseKind as Kind};
    use crate::pdb::{Sses, Stride};
    use glam::Vec3;

    fn three_strand_topo() -> SheetTopology {
        let ca_map: std::collections::BTreeMap<i32, Vec3> = (1..=24)
            .map(|r| (r, Vec3::new(r as f32, 0.0, 0.0)))
            .collect();
        let headers = vec![
            SseHeader {
                kind: Kind::Strand,
                init: 1,
                end: 5,
            },
            SseHeader {
                kind: Kind::Strand,
                init: 10,
                end: 14,
            },
            SseHeader {
                kind: Kind::Strand,
                init: 20,
                end: 24,
            },
        ];
        let sses = Sses::from_parts(headers, &ca_map).unwrap();
        let stride = Stride {
            headers: Vec::new(),
            hbonds: vec![
                (2, 10),
                (12, 2),
                (4, 12),
                (14, 4),
                (11, 24),
                (24, 11),
                (13, 22),
                (22, 13),
            ],
        };
        SheetTopology::new(sses, &stride).unwrap()
    }

    #[test]
    fn substrand_section_lists_all_substrands() {
        let topo = three_strand_topo();
        let map = topo.sheet_id_map();
        let mut buf = Vec::new();
        write_substrands(&mut buf, &topo, &map, Flavor::PdbLike).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.matches("SUBSTRAND").count(), 3);
        assert!(text.contains("0_0"));
        assert!(text.contains("2_0"));
    }

    #[test]
    fn strand_pair_rows_cover_all_pairs() {
        let topo = three_strand_topo();
        let map = topo.sheet_id_map();
        let mut bab = BabFilter::new(&topo, BabConfig::default());
        let rows = strand_pair_rows(&topo, &map, &mut bab).unwrap();
        assert_eq!(rows.len(), 3);

        // the adjacent pair carries deltas and a bridge count
        let adjacent: Vec<&StrandPairRow> = rows.iter().filter(|r| r.jump == 0).collect();
        assert_eq!(adjacent.len(), 2);
        for row in adjacent {
            assert_eq!(row.sheet, "same");
            assert!(row.bridge > 0);
        }

        // the jump-1 pair hides deltas in the rendered table
        let far = rows.iter().find(|r| r.jump == 1).unwrap();
        assert_eq!(far.pora, "anti");
    }

    #[test]
    fn residue_pair_section_is_sorted() {
        let topo = three_strand_topo();
        let mut buf = Vec::new();
        write_residue_pairs(&mut buf, &topo).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let resnums: Vec<i32> = text
            .lines()
            .filter(|l| l.starts_with("RESIDUE_PAIR"))
            .map(|l| l.split_whitespace().nth(1).unwrap().parse().unwrap())
            .collect();
        assert!(!resnums.is_empty());
        assert!(resnums.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn connection_class_plain_loop() {
        let topo = three_strand_topo();
        let map = topo.sheet_id_map();
        let class = connection_class(
            &topo,
            &map,
            SubStrand::new(0, 0),
            SubStrand::new(1, 0),
        );
        assert_eq!(class, "b-c-b");
    }

    #[test]
    fn handedness_survey_reports_nothing_without_parallel_units() {
        let topo = three_strand_topo();
        let mut bab = BabFilter::new(&topo, BabConfig::default());
        // every window here lacks an intervening SSE or is anti-parallel
        let results = handedness_survey(&topo, &mut bab);
        assert!(results.is_empty());
    }
}
