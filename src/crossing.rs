// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

use crate::gaps::{Axis, Gap};
use tracing::debug;

/// Whether a vertical x gap and a horizontal y gap cross.
///
/// Both spans are inclusive. Because one gap is always vertical and the other
/// horizontal, a bounding overlap test is an exact segment intersection test.
pub fn does_cross(x_gap: &Gap, y_gap: &Gap) -> bool {
    (y_gap.low <= x_gap.bin_coord && x_gap.bin_coord <= y_gap.high)
        && (x_gap.low <= y_gap.bin_coord && y_gap.bin_coord <= x_gap.high)
}

/// `does_cross` for gaps of either axis. Gaps of the same axis never cross.
pub fn gaps_cross(a: &Gap, b: &Gap) -> bool {
    match (a.axis, b.axis) {
        (Axis::X, Axis::Y) => does_cross(a, b),
        (Axis::Y, Axis::X) => does_cross(b, a),
        _ => false,
    }
}

/// Drops gaps that cross fewer than the minimum number of gaps of the other
/// axis, repeating until nothing more is dropped.
pub fn intersection_filter(
    x_gaps: Vec<Gap>,
    y_gaps: Vec<Gap>,
    x_min_intersections: usize,
    y_min_intersections: usize,
) -> (Vec<Gap>, Vec<Gap>) {
    let mut x_gaps = x_gaps;
    let mut y_gaps = y_gaps;
    let mut passes = 0;

    loop {
        let mut x_counts = vec![0usize; x_gaps.len()];
        let mut y_counts = vec![0usize; y_gaps.len()];

        for (i, x_gap) in x_gaps.iter().enumerate() {
            for (j, y_gap) in y_gaps.iter().enumerate() {
                if does_cross(x_gap, y_gap) {
                    x_counts[i] += 1;
                    y_counts[j] += 1;
                }
            }
        }

        let kept_x: Vec<Gap> = x_gaps
            .iter()
            .zip(&x_counts)
            .filter(|&(_, &count)| count >= x_min_intersections)
            .map(|(gap, _)| *gap)
            .collect();
        let kept_y: Vec<Gap> = y_gaps
            .iter()
            .zip(&y_counts)
            .filter(|&(_, &count)| count >= y_min_intersections)
            .map(|(gap, _)| *gap)
            .collect();

        passes += 1;

        let converged = kept_x.len() == x_gaps.len() && kept_y.len() == y_gaps.len();
        x_gaps = kept_x;
        y_gaps = kept_y;

        if converged {
            break;
        }
    }

    debug!(
        passes,
        x_gaps = x_gaps.len(),
        y_gaps = y_gaps.len(),
        "intersection filter converged"
    );

    (x_gaps, y_gaps)
}
