// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

use crate::binning::into_the_bins;
use crate::clustering::find_clusters;
use crate::crossing::intersection_filter;
use crate::error::GapError;
use crate::gaps::{Gap, find_x_gaps, find_y_gaps};
use crate::intersections::find_intersections;
use crate::params::GapParams;
use crate::points::{PointSet, SpatialRef, get_coordinates};
use crate::shapes::generate_alpha_polygons;
use geo::{Line, MultiPoint, Point, Polygon};
use tracing::{debug, info};

/// Gap polygons of one run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GapPolygons {
    pub srs: SpatialRef,
    pub polygons: Vec<Polygon<f64>>,
    /// One point group per cluster, present when `cluster_points` was set.
    pub point_groups: Option<Vec<MultiPoint<f64>>>,
    /// Clusters whose alpha shape came out empty.
    pub degenerate_clusters: Vec<usize>,
}

/// Raw gap intersection points of one run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GapPoints {
    pub srs: SpatialRef,
    pub points: Vec<Point<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GapOutput {
    Polygons(GapPolygons),
    Points(GapPoints),
}

impl GapOutput {
    pub fn srs(&self) -> &SpatialRef {
        match self {
            GapOutput::Polygons(polygons) => &polygons.srs,
            GapOutput::Points(points) => &points.srs,
        }
    }

    /// The polygons of a polygon run; empty for a points run.
    pub fn polygons(&self) -> &[Polygon<f64>] {
        match self {
            GapOutput::Polygons(polygons) => &polygons.polygons,
            GapOutput::Points(_) => &[],
        }
    }
}

fn segments(x_gaps: &[Gap], y_gaps: &[Gap]) -> Vec<Line<f64>> {
    x_gaps.iter().chain(y_gaps).map(Gap::segment).collect()
}

/// Finds the surviving x and y gaps of a point set.
pub fn surviving_gaps(
    points: &PointSet,
    params: &GapParams,
) -> Result<(Vec<Gap>, Vec<Gap>), GapError> {
    params.validate()?;

    let coords = get_coordinates(points)?;
    let binned = into_the_bins(&coords, params.x_bin_size, params.y_bin_size)?;
    debug!(
        points = coords.len(),
        x_bins = binned.x_bins.len(),
        y_bins = binned.y_bins.len(),
        "binned points"
    );

    let x_gaps = find_x_gaps(&binned, params.x_gap_len_threshold)?;
    let y_gaps = find_y_gaps(&binned, params.y_gap_len_threshold)?;
    debug!(x_gaps = x_gaps.len(), y_gaps = y_gaps.len(), "found gaps");

    Ok(intersection_filter(
        x_gaps,
        y_gaps,
        params.x_min_intersections,
        params.y_min_intersections,
    ))
}

/// Runs the full gap pipeline over a point set.
///
/// With `write_points` the output is the set of intersection points between
/// all surviving gaps. Otherwise surviving gaps are clustered and every
/// cluster becomes one or more alpha-shape polygons. A run that finds no
/// gaps returns an empty output.
pub fn mind_the_gap(points: &PointSet, params: &GapParams) -> Result<GapOutput, GapError> {
    let (x_gaps, y_gaps) = surviving_gaps(points, params)?;
    let srs = points.srs.clone();

    if params.write_points {
        let points = find_intersections(&segments(&x_gaps, &y_gaps));
        info!(
            x_gaps = x_gaps.len(),
            y_gaps = y_gaps.len(),
            intersections = points.len(),
            "gap intersections found"
        );
        return Ok(GapOutput::Points(GapPoints { srs, points }));
    }

    let clusters = find_clusters(&x_gaps, &y_gaps);
    let gap_segments: Vec<Line<f64>> = clusters.gaps.iter().map(Gap::segment).collect();

    let (x_clusters, y_clusters): (Vec<Vec<usize>>, Vec<Vec<usize>>) = clusters
        .clusters
        .iter()
        .map(|cluster| clusters.split(cluster))
        .unzip();

    let shapes = generate_alpha_polygons(&x_clusters, &y_clusters, &gap_segments, params.alpha)?;

    info!(
        x_gaps = x_gaps.len(),
        y_gaps = y_gaps.len(),
        clusters = clusters.len(),
        polygons = shapes.polygons.len(),
        degenerate = shapes.degenerate_clusters.len(),
        "gap polygons built"
    );

    Ok(GapOutput::Polygons(GapPolygons {
        srs,
        polygons: shapes.polygons,
        point_groups: params.cluster_points.then_some(shapes.point_groups),
        degenerate_clusters: shapes.degenerate_clusters,
    }))
}
