//! Sheet topology: residue bridges, sub-strands, the directed sub-strand
//! adjacency, sheets, and cycles.

pub mod adjacency;
pub mod cycles;
pub mod filter;
pub mod pairs;
pub mod sheets;
pub mod substrands;
pub mod topology;
pub mod zone;

use std::collections::BTreeMap;

pub use adjacency::{SideIndex, SubStrandAdjacency};
pub use pairs::{Hbond, HbondPairs};
pub use sheets::{Sheet, Sheets};
pub use substrands::SubStrandRanges;
pub use topology::{PairAttribute, SheetTopology};
pub use zone::{BridgeKind, StrictZone, ZoneResidue};

/// Relative orientation of two strands or sub-strands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Direction {
    AntiParallel,
    Parallel,
}

impl Direction {
    pub fn is_parallel(self) -> bool {
        self == Direction::Parallel
    }

    pub fn flip(self) -> Self {
        match self {
            Direction::Parallel => Direction::AntiParallel,
            Direction::AntiParallel => Direction::Parallel,
        }
    }

    /// Compose along a path: parallel is the identity, anti-parallel flips.
    pub fn combine(self, other: Self) -> Self {
        if other.is_parallel() {
            self
        } else {
            self.flip()
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Direction::Parallel => "Parallel",
            Direction::AntiParallel => "Anti-Parallel",
        }
    }

    pub fn short(self) -> &'static str {
        match self {
            Direction::Parallel => "para",
            Direction::AntiParallel => "anti",
        }
    }
}

/// One maximal coherent stretch of a strand. `strand` is the dense serial id
/// over strands only; `substr` indexes the stretch inside the strand, N→C
/// once the registry is finished.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubStrand {
    pub strand: usize,
    pub substr: usize,
}

impl SubStrand {
    pub fn new(strand: usize, substr: usize) -> Self {
        SubStrand { strand, substr }
    }
}

/// Ordered pair of distinct sub-strands; the key of the directed adjacency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PairKey {
    pub s0: SubStrand,
    pub s1: SubStrand,
}

impl PairKey {
    pub fn new(s0: SubStrand, s1: SubStrand) -> Self {
        PairKey { s0, s1 }
    }

    pub fn reverse(self) -> Self {
        PairKey {
            s0: self.s1,
            s1: self.s0,
        }
    }
}

/// Edge payload of the directed sub-strand adjacency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairNode {
    pub direction: Direction,
    /// Signed residue offset at the N-terminal end of the edge.
    pub delta_1: i32,
    /// Signed residue offset at the C-terminal end of the edge.
    pub delta_2: i32,
    /// Number of residues on `s0` bridged to `s1`.
    pub residue_pairs: u32,
}

impl PairNode {
    pub fn new(direction: Direction) -> Self {
        PairNode {
            direction,
            delta_1: 0,
            delta_2: 1,
            residue_pairs: 1,
        }
    }
}

/// Vote-decided data for one unordered strand pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrandPairData {
    pub direction: Direction,
    pub count: u32,
}

/// Strand-level undirected adjacency, keyed by `(sse_id, sse_id)`.
/// Symmetric after construction.
pub type UndirectedAdj = BTreeMap<(usize, usize), StrandPairData>;
