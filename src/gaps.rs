// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

use crate::binning::{BinnedPoint, BinnedPoints};
use crate::error::GapError;
use geo::{Line, coord};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Which set of strips a gap was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Axis {
    /// Vertical strips; the gap runs north-south.
    X,
    /// Horizontal strips; the gap runs east-west.
    Y,
}

/// An empty stretch along one strip.
///
/// For an x gap `bin_coord` is the strip's x position and `low`/`high` are y
/// values. For a y gap the roles of x and y swap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gap {
    pub axis: Axis,
    pub bin_index: usize,
    pub bin_coord: f64,
    /// Position of the lower endpoint within the strip's sorted points.
    pub low_index: usize,
    pub low: f64,
    pub high_index: usize,
    pub high: f64,
    pub length: f64,
}

impl Gap {
    /// The gap as a line segment: vertical for x gaps, horizontal for y gaps.
    pub fn segment(&self) -> Line<f64> {
        match self.axis {
            Axis::X => Line::new(
                coord! { x: self.bin_coord, y: self.low },
                coord! { x: self.bin_coord, y: self.high },
            ),
            Axis::Y => Line::new(
                coord! { x: self.low, y: self.bin_coord },
                coord! { x: self.high, y: self.bin_coord },
            ),
        }
    }
}

impl Axis {
    fn bin_of(self, point: &BinnedPoint) -> usize {
        match self {
            Axis::X => point.x_bin,
            Axis::Y => point.y_bin,
        }
    }

    /// Coordinate along the long axis of this axis' strips.
    fn along(self, point: &BinnedPoint) -> f64 {
        match self {
            Axis::X => point.y,
            Axis::Y => point.x,
        }
    }
}

/// Finds every stretch of at least `threshold` without points, strip by strip.
pub fn find_gaps(
    binned: &BinnedPoints,
    axis: Axis,
    threshold: f64,
) -> Result<Vec<Gap>, GapError> {
    GapError::positive(
        match axis {
            Axis::X => "x_gap_len_threshold",
            Axis::Y => "y_gap_len_threshold",
        },
        threshold,
    )?;

    let bins = match axis {
        Axis::X => &binned.x_bins,
        Axis::Y => &binned.y_bins,
    };

    let mut members: Vec<Vec<f64>> = vec![Vec::new(); bins.len()];
    for point in &binned.points {
        members[axis.bin_of(point)].push(axis.along(point));
    }

    let mut gaps = Vec::new();

    for (bin_index, (&bin_coord, values)) in bins.iter().zip(members.iter_mut()).enumerate() {
        if values.len() < 2 {
            continue;
        }

        values.sort_by(|a, b| a.total_cmp(b));

        for (low_index, (&low, &high)) in values.iter().tuple_windows().enumerate() {
            let length = high - low;
            if length >= threshold {
                gaps.push(Gap {
                    axis,
                    bin_index,
                    bin_coord,
                    low_index,
                    low,
                    high_index: low_index + 1,
                    high,
                    length,
                });
            }
        }
    }

    debug!(?axis, threshold, found = gaps.len(), "gap search done");

    Ok(gaps)
}

/// Gaps in the vertical strips.
pub fn find_x_gaps(binned: &BinnedPoints, threshold: f64) -> Result<Vec<Gap>, GapError> {
    find_gaps(binned, Axis::X, threshold)
}

/// Gaps in the horizontal strips.
pub fn find_y_gaps(binned: &BinnedPoints, threshold: f64) -> Result<Vec<Gap>, GapError> {
    find_gaps(binned, Axis::Y, threshold)
}
