//! β-sheet topology analysis.
//!
//! Given a protein's secondary-structure elements and its backbone hydrogen
//! bonds (PDB + STRIDE), this crate infers residue-level β-bridges, splits
//! strands into sub-strands, builds the directed sub-strand adjacency with
//! consistent orientations, assembles possibly-branched sheets with their
//! cycles, and scores the handedness of β–α–β connections.
//!
//! The entry point is [`sheet::SheetTopology::new`]; the `output` module
//! renders the analysis as record streams, mmCIF-like sections, or a
//! graphviz graph.

pub mod bab;
pub mod color;
pub mod error;
pub mod geometry;
pub mod output;
pub mod pdb;
pub mod sheet;

pub use error::{Result, TopoError};
pub use sheet::SheetTopology;
