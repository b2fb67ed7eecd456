// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

use crate::error::GapError;
use crate::points::UniquePoints;
use geo::{LineString, MultiLineString, MultiPolygon, Point};

/// Every exterior and interior ring of a boundary, as lines.
pub fn boundary_lines(boundary: &MultiPolygon<f64>) -> MultiLineString<f64> {
    MultiLineString(
        boundary
            .iter()
            .flat_map(|polygon| {
                std::iter::once(polygon.exterior())
                    .chain(polygon.interiors())
                    .cloned()
            })
            .collect(),
    )
}

/// Points every `interval` along a line, starting at its first coordinate.
fn walk_line(line: &LineString<f64>, interval: f64, points: &mut UniquePoints) {
    let Some(&first) = line.0.first() else {
        return;
    };

    // index of the next point to emit; it sits at `step * interval`
    let mut step = 0usize;
    let mut travelled = 0.0;

    for segment in line.lines() {
        let delta = segment.delta();
        let length = delta.x.hypot(delta.y);
        if length == 0.0 {
            continue;
        }

        loop {
            let at = step as f64 * interval;
            if at >= travelled + length {
                break;
            }
            let t = (at - travelled) / length;
            points.push(Point::from(segment.start + delta * t));
            step += 1;
        }

        travelled += length;
    }

    if travelled == 0.0 {
        points.push(Point::from(first));
        return;
    }

    if !line.is_closed() {
        points.push(Point::from(first));
        if let Some(&last) = line.0.last() {
            points.push(Point::from(last));
        }
    }
}

/// Samples points at a fixed spacing along boundary lines.
///
/// Points fall at distances `0, interval, 2 * interval, ...` below each
/// line's length. Lines that are not closed also contribute both end
/// points. Repeated coordinates are kept once, at their first position.
pub fn chainage(lines: &MultiLineString<f64>, interval: f64) -> Result<Vec<Point<f64>>, GapError> {
    GapError::positive("interval", interval)?;

    let mut points = UniquePoints::new();
    for line in lines {
        walk_line(line, interval, &mut points);
    }

    Ok(points.into_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Rect, coord, line_string};

    #[test]
    fn test_open_line_gets_endpoints() {
        let lines = MultiLineString(vec![line_string![(x: 0.0, y: 0.0), (x: 2.5, y: 0.0)]]);

        let points = chainage(&lines, 1.0).unwrap();

        assert_eq!(
            points,
            vec![
                Point::new(0.0, 0.0),
                Point::new(1.0, 0.0),
                Point::new(2.0, 0.0),
                Point::new(2.5, 0.0),
            ]
        );
    }

    #[test]
    fn test_closed_ring_spacing_carries_over_corners() {
        let square = Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 2.0, y: 2.0 }).to_polygon();
        let lines = boundary_lines(&MultiPolygon(vec![square]));

        let points = chainage(&lines, 1.5).unwrap();

        // perimeter 8, so points at 0, 1.5, 3, 4.5, 6 and 7.5
        assert_eq!(points.len(), 6);
        assert!(points.iter().all(|p| {
            p.x() == 0.0 || p.x() == 2.0 || p.y() == 0.0 || p.y() == 2.0
        }));
    }

    #[test]
    fn test_boundary_lines_include_holes() {
        let outer = Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 10.0, y: 10.0 }).to_polygon();
        let hole = Rect::new(coord! { x: 4.0, y: 4.0 }, coord! { x: 6.0, y: 6.0 }).to_polygon();
        let polygon = geo::Polygon::new(outer.exterior().clone(), vec![hole.exterior().clone()]);

        let lines = boundary_lines(&MultiPolygon(vec![polygon]));

        assert_eq!(lines.0.len(), 2);
    }

    #[test]
    fn test_duplicates_are_dropped() {
        let lines = MultiLineString(vec![
            line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)],
            line_string![(x: 1.0, y: 0.0), (x: 2.0, y: 0.0)],
        ]);

        let points = chainage(&lines, 1.0).unwrap();

        assert_eq!(
            points,
            vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(2.0, 0.0)]
        );
    }

    #[test]
    fn test_long_boundary() {
        let square = Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 100.0, y: 100.0 }).to_polygon();
        let lines = boundary_lines(&MultiPolygon(vec![square]));

        let points = chainage(&lines, 0.01).unwrap();

        // perimeter 400, one point per step
        assert_eq!(points.len(), 40_000);
        assert_eq!(points[0], Point::new(0.0, 0.0));
    }

    #[test]
    fn test_non_positive_interval_is_rejected() {
        let lines = MultiLineString(vec![line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)]]);
        assert!(chainage(&lines, 0.0).is_err());
        assert!(chainage(&lines, -0.5).is_err());
    }
}
