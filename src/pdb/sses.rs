//! The SSE collection parsed from a PDB file (headers + CA atoms), with the
//! dense strand numbering used throughout the sheet modules.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use glam::Vec3;

use crate::error::{Result, TopoError};
use crate::pdb::sse::{LoopRegion, Sse, SseHeader, SseKind};
use crate::pdb::stride::Stride;
use crate::pdb::HbondSide;

/// Which SSE kinds an index query covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SseFilter {
    Helix,
    Strand,
    Any,
}

/// All SSEs of one structure, sorted by initial residue number.
#[derive(Debug, Clone)]
pub struct Sses {
    pub data: Vec<Sse>,
    /// Loop i sits between SSE i and SSE i+1.
    pub loops: Vec<LoopRegion>,
    /// `[helix, strand, any]` without too-short SSEs, then the same with them.
    index_vecs: [Vec<usize>; 6],
    /// Dense numbering over strands only; None for helices.
    pub serial_strand_id: Vec<Option<usize>>,
}

impl Sses {
    pub fn from_pdb_file(path: &Path, stride: Option<&Stride>) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| TopoError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_pdb_str(&text, stride)
    }

    /// Parse SSE headers (from STRIDE when given, else from the PDB header
    /// records) and CA coordinates from PDB text.
    pub fn from_pdb_str(pdb_text: &str, stride: Option<&Stride>) -> Result<Self> {
        let headers = match stride {
            Some(s) => s.headers.clone(),
            None => read_sse_headers_pdb(pdb_text)?,
        };
        let ca_map = read_ca_atoms(pdb_text)?;
        Self::from_parts(headers, &ca_map)
    }

    /// Assemble from already-parsed headers and a resnum → CA map.
    pub fn from_parts(mut headers: Vec<SseHeader>, ca_map: &BTreeMap<i32, Vec3>) -> Result<Self> {
        headers.sort_by_key(|h| h.init);

        let mut data = Vec::with_capacity(headers.len());
        for (index, header) in headers.iter().enumerate() {
            data.push(Sse::new(*header, index, ca_map)?);
        }

        let mut loops = Vec::new();
        if !headers.is_empty() {
            for i in 0..headers.len() - 1 {
                loops.push(LoopRegion::new(
                    headers[i].end + 1,
                    headers[i + 1].init - 1,
                    i,
                    ca_map,
                ));
            }
        }

        let index_vecs = [
            gen_indices(&data, SseFilter::Helix, false),
            gen_indices(&data, SseFilter::Strand, false),
            gen_indices(&data, SseFilter::Any, false),
            gen_indices(&data, SseFilter::Helix, true),
            gen_indices(&data, SseFilter::Strand, true),
            gen_indices(&data, SseFilter::Any, true),
        ];

        let mut serial_strand_id = vec![None; data.len()];
        for (serial, &sse_id) in index_vecs[4].iter().enumerate() {
            serial_strand_id[sse_id] = Some(serial);
        }

        Ok(Sses {
            data,
            loops,
            index_vecs,
            serial_strand_id,
        })
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// SSE indices of the requested kinds, sorted by initial residue.
    pub fn indices(&self, filter: SseFilter, with_too_short: bool) -> &[usize] {
        let base = match filter {
            SseFilter::Helix => 0,
            SseFilter::Strand => 1,
            SseFilter::Any => 2,
        };
        &self.index_vecs[base + if with_too_short { 3 } else { 0 }]
    }

    /// The SSE containing `resnum`, by binary search over the filtered index.
    ///
    /// `offset` virtually extends SSE ranges by one residue; `side` keeps the
    /// extension off the terminus whose bonding group points inward.
    pub fn sse_containing(
        &self,
        resnum: i32,
        filter: SseFilter,
        offset: i32,
        with_too_short: bool,
        side: HbondSide,
    ) -> Option<usize> {
        let indices = self.indices(filter, with_too_short);
        let n_offset = if offset == 0 {
            0
        } else if side == HbondSide::N {
            offset - 1
        } else {
            offset
        };
        let c_offset = if offset == 0 {
            0
        } else if side == HbondSide::C {
            offset - 1
        } else {
            offset
        };

        let lo = indices.partition_point(|&id| self.data[id].end + c_offset < resnum);
        let id = *indices.get(lo)?;
        if resnum < self.data[id].init - n_offset {
            return None;
        }
        Some(id)
    }

    pub fn strand_serial(&self, sse_id: usize) -> Option<usize> {
        self.serial_strand_id[sse_id]
    }

    /// The loop following `sse_id`, if any.
    pub fn loop_after(&self, sse_id: usize) -> Option<&LoopRegion> {
        self.loops.get(sse_id)
    }
}

impl std::ops::Index<usize> for Sses {
    type Output = Sse;

    fn index(&self, i: usize) -> &Sse {
        &self.data[i]
    }
}

fn gen_indices(data: &[Sse], filter: SseFilter, with_too_short: bool) -> Vec<usize> {
    data.iter()
        .enumerate()
        .filter(|(_, sse)| {
            let kind_ok = match filter {
                SseFilter::Helix => sse.kind == SseKind::Helix,
                SseFilter::Strand => sse.kind == SseKind::Strand,
                SseFilter::Any => true,
            };
            kind_ok && (with_too_short || !sse.too_short)
        })
        .map(|(i, _)| i)
        .collect()
}

fn col_i32(line: &str, start: usize, len: usize) -> Result<i32> {
    line.get(start..start + len)
        .map(str::trim)
        .and_then(|s| s.parse::<i32>().ok())
        .ok_or_else(|| TopoError::MalformedRecord(line.to_string()))
}

fn col_f32(line: &str, start: usize, len: usize) -> Result<f32> {
    line.get(start..start + len)
        .map(str::trim)
        .and_then(|s| s.parse::<f32>().ok())
        .ok_or_else(|| TopoError::MalformedRecord(line.to_string()))
}

/// HELIX / SHEET header records, up to the first ATOM line.
fn read_sse_headers_pdb(text: &str) -> Result<Vec<SseHeader>> {
    let mut headers = Vec::new();
    for line in text.lines() {
        if line.starts_with("HELIX") {
            headers.push(SseHeader {
                kind: SseKind::Helix,
                init: col_i32(line, 21, 4)?,
                end: col_i32(line, 33, 4)?,
            });
        } else if line.starts_with("SHEET") {
            headers.push(SseHeader {
                kind: SseKind::Strand,
                init: col_i32(line, 22, 4)?,
                end: col_i32(line, 33, 4)?,
            });
        } else if line.starts_with("ATOM") {
            break;
        }
    }
    Ok(headers)
}

/// resnum → CA coordinates from the ATOM records.
fn read_ca_atoms(text: &str) -> Result<BTreeMap<i32, Vec3>> {
    let mut map = BTreeMap::new();
    for line in text.lines() {
        if line.starts_with("ATOM") && line.get(12..16) == Some(" CA ") {
            let resnum = col_i32(line, 22, 4)?;
            let xyz = Vec3::new(
                col_f32(line, 30, 8)?,
                col_f32(line, 38, 8)?,
                col_f32(line, 46, 8)?,
            );
            map.insert(resnum, xyz);
        }
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdb_line(resnum: i32, x: f32, y: f32, z: f32) -> String {
        format!(
            "ATOM  {:>5}  CA  ALA A{:>4}    {:>8.3}{:>8.3}{:>8.3}  1.00  0.00           C",
            resnum, resnum, x, y, z
        )
    }

    fn sample_pdb() -> String {
        let mut text = String::new();
        text.push_str(
            "HELIX    1   1 ALA A    6  ALA A   12  1                                  7\n",
        );
        text.push_str(
            "SHEET    1   A 2 ALA A   1  ALA A   4  0\n",
        );
        text.push_str(
            "SHEET    2   A 2 ALA A  15  ALA A  18 -1\n",
        );
        for r in 1..=18 {
            text.push_str(&pdb_line(r, r as f32, 0.0, 0.0));
            text.push('\n');
        }
        text.push_str("END\n");
        text
    }

    #[test]
    fn parses_headers_and_atoms() {
        let sses = Sses::from_pdb_str(&sample_pdb(), None).unwrap();
        assert_eq!(sses.len(), 3);
        // sorted by init: strand [1,4], helix [6,12], strand [15,18]
        assert_eq!(sses[0].kind, SseKind::Strand);
        assert_eq!((sses[0].init, sses[0].end), (1, 4));
        assert_eq!(sses[1].kind, SseKind::Helix);
        assert_eq!(sses[2].kind, SseKind::Strand);
        assert!(sses[0].entire);
        assert_eq!(sses[0].atoms.len(), 4);
        assert_eq!(sses[0].atoms[2].xyz, Vec3::new(3.0, 0.0, 0.0));
    }

    #[test]
    fn strand_serials_are_dense() {
        let sses = Sses::from_pdb_str(&sample_pdb(), None).unwrap();
        assert_eq!(sses.strand_serial(0), Some(0));
        assert_eq!(sses.strand_serial(1), None);
        assert_eq!(sses.strand_serial(2), Some(1));
        assert_eq!(sses.indices(SseFilter::Strand, true), &[0, 2]);
    }

    #[test]
    fn loops_between_sses() {
        let sses = Sses::from_pdb_str(&sample_pdb(), None).unwrap();
        assert_eq!(sses.loops.len(), 2);
        assert_eq!((sses.loops[0].init, sses.loops[0].end), (5, 5));
        assert_eq!((sses.loops[1].init, sses.loops[1].end), (13, 14));
        assert!(!sses.loops[0].zero_size);
    }

    #[test]
    fn zero_size_loop_when_sses_touch() {
        let ca_map: BTreeMap<i32, Vec3> = (1..=8)
            .map(|r| (r, Vec3::new(r as f32, 0.0, 0.0)))
            .collect();
        let headers = vec![
            SseHeader {
                kind: SseKind::Strand,
                init: 1,
                end: 4,
            },
            SseHeader {
                kind: SseKind::Strand,
                init: 5,
                end: 8,
            },
        ];
        let sses = Sses::from_parts(headers, &ca_map).unwrap();
        assert!(sses.loops[0].zero_size);
    }

    #[test]
    fn sse_containing_respects_hbond_side() {
        let sses = Sses::from_pdb_str(&sample_pdb(), None).unwrap();
        // residue 5 is one past the first strand's C-terminus [1,4]
        assert_eq!(
            sses.sse_containing(5, SseFilter::Strand, 1, true, HbondSide::N),
            Some(0)
        );
        assert_eq!(
            sses.sse_containing(5, SseFilter::Strand, 1, true, HbondSide::C),
            None
        );
        // residue 14 is one before the second strand's N-terminus [15,18]
        assert_eq!(
            sses.sse_containing(14, SseFilter::Strand, 1, true, HbondSide::C),
            Some(2)
        );
        // helix residues are invisible through the strand filter
        assert_eq!(
            sses.sse_containing(8, SseFilter::Strand, 1, true, HbondSide::Any),
            None
        );
        assert_eq!(
            sses.sse_containing(8, SseFilter::Any, 0, true, HbondSide::Any),
            Some(1)
        );
    }
}
