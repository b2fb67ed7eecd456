// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

use geo::line_intersection::{LineIntersection, line_intersection};
use geo::{Line, Point};

/// Intersection points between every ordered pair of distinct segments.
///
/// Pairs are visited in both orders, so a crossing between segments `i` and
/// `j` is reported once as `(i, j)` and again as `(j, i)`. Pairs that do not
/// meet, or that overlap along a stretch, contribute nothing.
pub fn find_intersections(segments: &[Line<f64>]) -> Vec<Point<f64>> {
    let mut intersections = Vec::new();

    for (i, a) in segments.iter().enumerate() {
        for (j, b) in segments.iter().enumerate() {
            if i == j {
                continue;
            }

            if let Some(LineIntersection::SinglePoint { intersection, .. }) =
                line_intersection(*a, *b)
            {
                intersections.push(Point::from(intersection));
            }
        }
    }

    intersections
}
