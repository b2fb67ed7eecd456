// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

//! Finds systematic rectilinear gaps in 2-D point data.
//!
//! Points (typically building centroids) are binned into vertical and
//! horizontal strips. Long empty stretches along each strip are gaps; gaps
//! that cross enough gaps of the other orientation are clustered and turned
//! into alpha-shape polygons marking where data is missing.

#![deny(
    clippy::mutable_key_type,
    clippy::map_entry,
    clippy::boxed_local,
    clippy::let_unit_value,
    clippy::redundant_allocation,
    clippy::bool_comparison,
    clippy::bind_instead_of_map,
    clippy::vec_box,
    clippy::while_let_loop,
    clippy::useless_asref,
    clippy::repeat_once,
    clippy::deref_addrof,
    clippy::suspicious_map,
    clippy::single_char_pattern,
    clippy::for_kv_map,
    clippy::let_and_return,
    clippy::iter_nth,
    clippy::iter_cloned_collect,
    clippy::match_result_ok,
    clippy::cmp_owned,
    clippy::op_ref
)]

pub mod alpha_shape;
pub mod binning;
pub mod chainage;
pub mod clustering;
pub mod crossing;
pub mod error;
pub mod gaps;
pub mod intersections;
pub mod io;
pub mod params;
pub mod pipeline;
pub mod points;
pub mod shapes;
pub mod tiles;
pub mod tune;

#[cfg(test)]
mod test_pipeline;

pub use error::GapError;
pub use params::GapParams;
pub use pipeline::{GapOutput, GapPoints, GapPolygons, mind_the_gap};
pub use points::{PointSet, SpatialRef};

pub const WGS_84_SRID: u32 = 4326;
