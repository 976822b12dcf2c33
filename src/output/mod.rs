//! Rendering of the analysis: record-stream tables, mmCIF-like sections,
//! and the graphviz graph.

pub mod graphviz;
pub mod nomenclature;
pub mod tables;

pub use nomenclature::{extract_adjacent_substrands, TopologyString};
pub use tables::Flavor;

/// Join items into one delimiter-separated string.
pub fn join<I, T: AsRef<str>>(items: I, delim: &str) -> String
where
    I: IntoIterator<Item = T>,
{
    items
        .into_iter()
        .map(|s| s.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(delim)
}
