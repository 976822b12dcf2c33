//! β–α–β handedness: triangulated sides between paired sub-strands and the
//! left/right scoring filter built on them.

pub mod filter;
pub mod side;

pub use filter::{BabConfig, BabFilter, BabResult};
pub use side::TriangleSide;

pub use crate::sheet::filter::direction_with_reverse;
