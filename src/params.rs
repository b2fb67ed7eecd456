// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

use crate::error::GapError;
use serde::{Deserialize, Serialize};

pub const DEFAULT_ALPHA: f64 = 15.0;

fn default_alpha() -> f64 {
    DEFAULT_ALPHA
}

/// Parameters of one `mind_the_gap` run.
///
/// Bin sizes and gap length thresholds are in the units of the input
/// projection (degrees for EPSG:4326).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapParams {
    /// Width of the vertical strips.
    pub x_bin_size: f64,
    /// Width of the horizontal strips.
    pub y_bin_size: f64,
    /// Minimum length of a gap inside a vertical strip.
    pub x_gap_len_threshold: f64,
    /// Minimum length of a gap inside a horizontal strip.
    pub y_gap_len_threshold: f64,
    /// Minimum number of y gaps an x gap must cross to be kept.
    pub x_min_intersections: usize,
    /// Minimum number of x gaps a y gap must cross to be kept.
    pub y_min_intersections: usize,
    /// Alpha shape parameter; 0 gives the convex hull, larger is tighter.
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    /// Also return the point group each polygon was built from.
    #[serde(default)]
    pub cluster_points: bool,
    /// Return only the raw gap intersection points.
    #[serde(default)]
    pub write_points: bool,
}

impl GapParams {
    pub fn new(
        x_bin_size: f64,
        y_bin_size: f64,
        x_gap_len_threshold: f64,
        y_gap_len_threshold: f64,
        x_min_intersections: usize,
        y_min_intersections: usize,
    ) -> Self {
        Self {
            x_bin_size,
            y_bin_size,
            x_gap_len_threshold,
            y_gap_len_threshold,
            x_min_intersections,
            y_min_intersections,
            alpha: DEFAULT_ALPHA,
            cluster_points: false,
            write_points: false,
        }
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_cluster_points(mut self, cluster_points: bool) -> Self {
        self.cluster_points = cluster_points;
        self
    }

    pub fn with_write_points(mut self, write_points: bool) -> Self {
        self.write_points = write_points;
        self
    }

    pub fn validate(&self) -> Result<(), GapError> {
        GapError::positive("x_bin_size", self.x_bin_size)?;
        GapError::positive("y_bin_size", self.y_bin_size)?;
        GapError::positive("x_gap_len_threshold", self.x_gap_len_threshold)?;
        GapError::positive("y_gap_len_threshold", self.y_gap_len_threshold)?;
        GapError::non_negative("alpha", self.alpha)?;
        Ok(())
    }
}
