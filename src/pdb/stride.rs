//! STRIDE output: SSE assignments (`LOC` records) and backbone hydrogen
//! bonds (`DNR` records).

use std::fs;
use std::path::Path;
use std::process::Command;

use crate::error::{Result, TopoError};
use crate::pdb::sse::{SseHeader, SseKind};

/// Parsed STRIDE output.
#[derive(Debug, Clone, Default)]
pub struct Stride {
    /// AlphaHelix / Strand location headers.
    pub headers: Vec<SseHeader>,
    /// Donor → acceptor residue pairs (the donor's N–H bonds the acceptor's C=O).
    pub hbonds: Vec<(i32, i32)>,
}

impl Stride {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| TopoError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_str_contents(&text)
    }

    pub fn from_str_contents(text: &str) -> Result<Self> {
        let mut headers = Vec::new();
        let mut hbonds = Vec::new();
        let mut in_loc = true;

        for line in text.lines() {
            if in_loc {
                if line.starts_with("ASG") {
                    in_loc = false;
                } else if line.starts_with("LOC") {
                    let kind = if line.get(5..15) == Some("AlphaHelix") {
                        Some(SseKind::Helix)
                    } else if line.get(5..11) == Some("Strand") {
                        Some(SseKind::Strand)
                    } else {
                        None
                    };
                    if let Some(kind) = kind {
                        headers.push(SseHeader {
                            kind,
                            init: loc_field(line, 22)?,
                            end: loc_field(line, 40)?,
                        });
                    }
                }
            }
            if line.starts_with("DNR") {
                let donor = dnr_field(line, 11)?;
                let acceptor = dnr_field(line, 31)?;
                hbonds.push((donor, acceptor));
            }
        }

        Ok(Stride { headers, hbonds })
    }

    /// Run the external `stride` command on a PDB file and parse its output.
    pub fn from_stride_command(pdb_path: &Path) -> Result<Self> {
        let output = Command::new("stride")
            .arg(pdb_path)
            .output()
            .map_err(|e| TopoError::StrideFailed(e.to_string()))?;
        if !output.status.success() {
            return Err(TopoError::StrideFailed(format!(
                "stride exited with {}",
                output.status
            )));
        }
        let text = String::from_utf8_lossy(&output.stdout);
        Self::from_str_contents(&text)
    }
}

/// First integer starting at `start` in a LOC record.
fn loc_field(line: &str, start: usize) -> Result<i32> {
    line.get(start..)
        .and_then(|s| s.split_whitespace().next())
        .and_then(|tok| tok.parse::<i32>().ok())
        .ok_or_else(|| TopoError::MalformedRecord(line.to_string()))
}

/// Fixed 4-column integer field of a DNR record.
fn dnr_field(line: &str, start: usize) -> Result<i32> {
    line.get(start..start + 4)
        .map(str::trim)
        .and_then(|s| s.parse::<i32>().ok())
        .ok_or_else(|| TopoError::MalformedRecord(line.to_string()))
}
