// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

use crate::error::GapError;
use geo::Coord;

/// A point with the indices of the horizontal (y) and vertical (x) strips it
/// was assigned to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinnedPoint {
    pub x: f64,
    pub y: f64,
    pub y_bin: usize,
    pub x_bin: usize,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BinnedPoints {
    pub points: Vec<BinnedPoint>,
    /// Centers of the vertical strips.
    pub x_bins: Vec<f64>,
    /// Centers of the horizontal strips.
    pub y_bins: Vec<f64>,
}

/// Bin centers from `min` in steps of `size`, up to the first center at or
/// beyond `max`.
fn bin_centers(min: f64, max: f64, size: f64) -> Vec<f64> {
    let steps = ((max - min) / size).ceil() as usize;
    (0..=steps).map(|i| min + i as f64 * size).collect()
}

/// Index of the center closest to `value`. Ties go to the lowest index.
///
/// Centers are evenly spaced, so only the centers around the estimated
/// position need comparing.
fn nearest_bin(value: f64, min: f64, size: f64, centers: &[f64]) -> usize {
    let estimate = ((value - min) / size).floor() as usize;
    let first = estimate.saturating_sub(1);
    let last = (estimate + 2).min(centers.len() - 1);

    let mut best = first;
    let mut best_dist = f64::INFINITY;
    for (i, center) in centers.iter().enumerate().take(last + 1).skip(first) {
        let dist = (value - center).abs();
        if dist < best_dist {
            best = i;
            best_dist = dist;
        }
    }
    best
}

fn axis_bins(values: impl Iterator<Item = f64> + Clone, size: f64) -> (Vec<usize>, Vec<f64>) {
    let (min, max) = values
        .clone()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    let centers = bin_centers(min, max, size);
    let assignment = values.map(|v| nearest_bin(v, min, size, &centers)).collect();
    (assignment, centers)
}

/// Sorts points into vertical and horizontal strips by nearest strip center.
pub fn into_the_bins(
    coords: &[Coord<f64>],
    x_bin_size: f64,
    y_bin_size: f64,
) -> Result<BinnedPoints, GapError> {
    GapError::positive("x_bin_size", x_bin_size)?;
    GapError::positive("y_bin_size", y_bin_size)?;

    if coords.is_empty() {
        return Ok(BinnedPoints::default());
    }

    let (x_assignment, x_bins) = axis_bins(coords.iter().map(|c| c.x), x_bin_size);
    let (y_assignment, y_bins) = axis_bins(coords.iter().map(|c| c.y), y_bin_size);

    let points = coords
        .iter()
        .zip(x_assignment.into_iter().zip(y_assignment))
        .map(|(c, (x_bin, y_bin))| BinnedPoint {
            x: c.x,
            y: c.y,
            y_bin,
            x_bin,
        })
        .collect();

    Ok(BinnedPoints {
        points,
        x_bins,
        y_bins,
    })
}
