//! Error types for the topology pipeline.

use thiserror::Error;

/// Errors that can abort the analysis.
///
/// Input errors surface problems with the PDB/STRIDE sources; the remaining
/// variants are invariant violations detected while building the sheet graph.
#[derive(Error, Debug)]
pub enum TopoError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid SSE range [{init}, {end}]")]
    InvalidSseRange { init: i32, end: i32 },

    #[error("unknown SSE kind '{0}'")]
    UnknownSseKind(char),

    #[error("stride invocation failed: {0}")]
    StrideFailed(String),

    #[error("unparsable record: {0}")]
    MalformedRecord(String),

    #[error("undirected adjacency is not symmetric: strands ({0}, {1})")]
    NonSymmetric(usize, usize),

    #[error("undirected adjacency direction mismatch: strands ({0}, {1})")]
    NonSymmetricDirection(usize, usize),

    #[error(
        "cannot decide direction: strand pair ({sse0}, {sse1}), parallel = {parallel}, anti-parallel = {anti}"
    )]
    DirectionUnresolvable {
        sse0: usize,
        sse1: usize,
        parallel: u32,
        anti: u32,
    },

    #[error(
        "third bridge partner on SSE[{sse_id}] residue {resnum}: new partner SSE[{new_sse_id}] residue {new_resnum}"
    )]
    ThirdPairFound {
        sse_id: usize,
        resnum: i32,
        new_sse_id: usize,
        new_resnum: i32,
    },

    #[error("bridge direction changed mid-component for a sub-strand pair")]
    BridgeDirectionChanged,

    #[error("relative direction not set for strand SSE[{0}]")]
    RelativeDirectionNotSet(usize),

    #[error(
        "cannot decide which reverse edge to drop: {s0}_{ss0} ({n0} pairs) vs {s1}_{ss1} ({n1} pairs)"
    )]
    SubstrandCleanupFailure {
        s0: usize,
        ss0: usize,
        n0: u32,
        s1: usize,
        ss1: usize,
        n1: u32,
    },

    #[error("no bridge partner found from SSE[{sse_id}] residue {resnum}")]
    PairedResidueNotFound { sse_id: usize, resnum: i32 },

    #[error("sub-strand adjacency inconsistent: base = {base}, adj = {adj}")]
    AdjacentSubStrandNotFound { base: String, adj: String },

    #[error("cycle between {0} and {1} is reachable in only one direction")]
    OneDirectionalCycle(String, String),
}

pub type Result<T> = std::result::Result<T, TopoError>;
