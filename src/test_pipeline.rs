// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

//! End-to-end runs over a lattice with a square hole in the middle.

use crate::clustering::find_clusters;
use crate::gaps::{Axis, Gap};
use crate::pipeline::{GapOutput, mind_the_gap, surviving_gaps};
use crate::{GapParams, PointSet};
use geo::{Area, BoundingRect, Point, coord};

/// Integer lattice over `[0, 10]` without the block `[3, 7] x [3, 7]`.
fn holey_lattice() -> PointSet {
    let mut points = Vec::new();
    for x in 0..=10 {
        for y in 0..=10 {
            if (3..=7).contains(&x) && (3..=7).contains(&y) {
                continue;
            }
            points.push(Point::new(x as f64, y as f64));
        }
    }
    PointSet::from_points(points)
}

fn params() -> GapParams {
    GapParams::new(1.0, 1.0, 3.0, 3.0, 3, 3)
}

fn expected_gaps(axis: Axis) -> Vec<Gap> {
    (3..=7)
        .map(|i| Gap {
            axis,
            bin_index: i,
            bin_coord: i as f64,
            low_index: 2,
            low: 2.0,
            high_index: 3,
            high: 8.0,
            length: 6.0,
        })
        .collect()
}

#[test]
fn test_surviving_gaps() {
    let (x_gaps, y_gaps) = surviving_gaps(&holey_lattice(), &params()).unwrap();

    assert_eq!(x_gaps, expected_gaps(Axis::X));
    assert_eq!(y_gaps, expected_gaps(Axis::Y));

    let clusters = find_clusters(&x_gaps, &y_gaps);
    assert_eq!(clusters.clusters, vec![(0..10).collect::<Vec<usize>>()]);
}

#[test]
fn test_hole_becomes_one_polygon() {
    let output = mind_the_gap(&holey_lattice(), &params().with_alpha(1.0)).unwrap();

    let GapOutput::Polygons(gaps) = output else {
        panic!("expected polygons, got {:?}", output);
    };

    assert_eq!(gaps.polygons.len(), 1);
    assert!(gaps.degenerate_clusters.is_empty());
    assert!(gaps.point_groups.is_none());

    // a 6 x 6 square with the four unit corners cut diagonally
    let polygon = &gaps.polygons[0];
    assert!((polygon.unsigned_area() - 34.0).abs() < 1e-9);
    let bounds = polygon.bounding_rect().unwrap();
    assert_eq!(bounds.min(), coord! { x: 2.0, y: 2.0 });
    assert_eq!(bounds.max(), coord! { x: 8.0, y: 8.0 });
}

#[test]
fn test_convex_hull_matches_alpha_shape() {
    let tight = mind_the_gap(&holey_lattice(), &params().with_alpha(1.0)).unwrap();
    let hull = mind_the_gap(&holey_lattice(), &params().with_alpha(0.0)).unwrap();

    assert_eq!(hull.polygons().len(), 1);
    assert!((hull.polygons()[0].unsigned_area() - tight.polygons()[0].unsigned_area()).abs() < 1e-9);
}

#[test]
fn test_cluster_points() {
    let output = mind_the_gap(
        &holey_lattice(),
        &params().with_alpha(1.0).with_cluster_points(true),
    )
    .unwrap();

    let GapOutput::Polygons(gaps) = output else {
        panic!("expected polygons");
    };
    let groups = gaps.point_groups.unwrap();

    // 20 gap endpoints and 25 distinct crossings
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].0.len(), 45);
}

#[test]
fn test_tight_alpha_leaves_a_degenerate_cluster() {
    let output = mind_the_gap(&holey_lattice(), &params().with_alpha(2.0)).unwrap();

    let GapOutput::Polygons(gaps) = output else {
        panic!("expected polygons");
    };
    assert!(gaps.polygons.is_empty());
    assert_eq!(gaps.degenerate_clusters, vec![0]);
}

#[test]
fn test_write_points() {
    let output = mind_the_gap(&holey_lattice(), &params().with_write_points(true)).unwrap();

    let GapOutput::Points(points) = output else {
        panic!("expected points");
    };

    // every crossing is seen from both gaps
    assert_eq!(points.points.len(), 50);
    assert!(
        points
            .points
            .iter()
            .all(|p| (3.0..=7.0).contains(&p.x()) && (3.0..=7.0).contains(&p.y()))
    );
}

#[test]
fn test_high_minimum_removes_everything() {
    let output = mind_the_gap(&holey_lattice(), &GapParams::new(1.0, 1.0, 3.0, 3.0, 6, 6)).unwrap();
    assert!(output.polygons().is_empty());
}

#[test]
fn test_runs_are_deterministic() {
    let params = params().with_alpha(1.0).with_cluster_points(true);

    let first = mind_the_gap(&holey_lattice(), &params).unwrap();
    let second = mind_the_gap(&holey_lattice(), &params).unwrap();

    assert_eq!(first, second);
}
