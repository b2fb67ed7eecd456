// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

use crate::alpha_shape::alpha_shape;
use crate::error::GapError;
use crate::intersections::find_intersections;
use crate::points::UniquePoints;
use geo::{Line, MultiPoint, Point, Polygon};
use tracing::debug;

/// Polygons and point groups for a set of gap clusters.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClusterShapes {
    /// Every part of every cluster's alpha shape, in cluster order.
    pub polygons: Vec<Polygon<f64>>,
    /// The points each cluster's shape was built from, one per cluster.
    pub point_groups: Vec<MultiPoint<f64>>,
    /// Clusters that produced no polygon.
    pub degenerate_clusters: Vec<usize>,
}

/// Segment endpoints followed by the exact intersections between the
/// segments, with repeated coordinates removed.
pub fn cluster_points(
    x_inds: &[usize],
    y_inds: &[usize],
    segments: &[Line<f64>],
) -> MultiPoint<f64> {
    let cluster_segments: Vec<Line<f64>> = x_inds
        .iter()
        .chain(y_inds)
        .map(|&i| segments[i])
        .collect();

    let endpoints = cluster_segments
        .iter()
        .flat_map(|segment| [Point::from(segment.start), Point::from(segment.end)]);

    let mut points = UniquePoints::new();
    for point in endpoints.chain(find_intersections(&cluster_segments)) {
        points.push(point);
    }

    MultiPoint(points.into_vec())
}

/// Builds an alpha shape for every cluster.
///
/// `x_clusters[i]` and `y_clusters[i]` hold the indices into `segments` of
/// cluster `i`'s x and y gaps. Clusters that give no polygon are recorded
/// rather than treated as errors.
pub fn generate_alpha_polygons(
    x_clusters: &[Vec<usize>],
    y_clusters: &[Vec<usize>],
    segments: &[Line<f64>],
    alpha: f64,
) -> Result<ClusterShapes, GapError> {
    GapError::non_negative("alpha", alpha)?;

    let mut shapes = ClusterShapes::default();

    for (cluster, (x_inds, y_inds)) in x_clusters.iter().zip(y_clusters).enumerate() {
        let points = cluster_points(x_inds, y_inds, segments);
        let parts = alpha_shape(&points.0, alpha);

        if parts.is_empty() {
            debug!(cluster, points = points.0.len(), "cluster yields no polygon");
            shapes.degenerate_clusters.push(cluster);
        }

        shapes.polygons.extend(parts);
        shapes.point_groups.push(points);
    }

    Ok(shapes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Area, coord};

    fn vertical(x: f64, y1: f64, y2: f64) -> Line<f64> {
        Line::new(coord! { x: x, y: y1 }, coord! { x: x, y: y2 })
    }

    fn horizontal(y: f64, x1: f64, x2: f64) -> Line<f64> {
        Line::new(coord! { x: x1, y: y }, coord! { x: x2, y: y })
    }

    /// A 2x2 lattice of gaps: x gaps at x = 1, 2 and y gaps at y = 1, 2.
    fn lattice() -> Vec<Line<f64>> {
        vec![
            vertical(1.0, 0.0, 3.0),
            vertical(2.0, 0.0, 3.0),
            horizontal(1.0, 0.0, 3.0),
            horizontal(2.0, 0.0, 3.0),
        ]
    }

    #[test]
    fn test_cluster_points_dedup_keeps_first_occurrence() {
        let points = cluster_points(&[0, 1], &[2, 3], &lattice());

        let expected: Vec<Point<f64>> = vec![
            (1.0, 0.0),
            (1.0, 3.0),
            (2.0, 0.0),
            (2.0, 3.0),
            (0.0, 1.0),
            (3.0, 1.0),
            (0.0, 2.0),
            (3.0, 2.0),
            (1.0, 1.0),
            (1.0, 2.0),
            (2.0, 1.0),
            (2.0, 2.0),
        ]
        .into_iter()
        .map(Point::from)
        .collect();

        assert_eq!(points.0, expected);
    }

    #[test]
    fn test_generate_alpha_polygons() {
        let segments = lattice();

        let shapes = generate_alpha_polygons(&[vec![0, 1]], &[vec![2, 3]], &segments, 0.0).unwrap();

        assert_eq!(shapes.point_groups.len(), 1);
        assert_eq!(shapes.point_groups[0].0.len(), 12);
        assert_eq!(shapes.polygons.len(), 1);
        // convex hull of the plus-shaped point cloud: a 3x3 square minus
        // four corner triangles
        assert!((shapes.polygons[0].unsigned_area() - 7.0).abs() < 1e-9);
        assert!(shapes.degenerate_clusters.is_empty());
    }

    #[test]
    fn test_lone_gap_is_degenerate() {
        let segments = vec![vertical(1.0, 0.0, 3.0), horizontal(9.0, 5.0, 6.0)];

        let shapes = generate_alpha_polygons(&[vec![0], vec![]], &[vec![], vec![1]], &segments, 15.0)
                .unwrap();

        assert!(shapes.polygons.is_empty());
        assert_eq!(shapes.point_groups.len(), 2);
        assert_eq!(shapes.degenerate_clusters, vec![0, 1]);
    }

    #[test]
    fn test_negative_alpha_is_rejected() {
        let err = generate_alpha_polygons(&[vec![0, 1]], &[vec![2, 3]], &lattice(), -1.0)
            .unwrap_err();
        assert!(matches!(err, GapError::InvalidParameter { name: "alpha", .. }));
    }
}
