// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

use crate::error::GapError;
use geo::{Coord, Geometry, Point};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Opaque spatial reference tag, passed from the input to every output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpatialRef(pub String);

impl Default for SpatialRef {
    fn default() -> Self {
        SpatialRef(format!("EPSG:{}", crate::WGS_84_SRID))
    }
}

impl fmt::Display for SpatialRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The input points of one run, in the order they were read.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PointSet {
    pub geometries: Vec<Geometry<f64>>,
    pub srs: SpatialRef,
}

impl PointSet {
    pub fn new(geometries: Vec<Geometry<f64>>, srs: SpatialRef) -> Self {
        Self { geometries, srs }
    }

    pub fn from_points(points: impl IntoIterator<Item = Point<f64>>) -> Self {
        Self {
            geometries: points.into_iter().map(Geometry::Point).collect(),
            srs: SpatialRef::default(),
        }
    }

    /// Appends extra points, e.g. boundary chainage, after the existing ones.
    pub fn extend_points(&mut self, points: impl IntoIterator<Item = Point<f64>>) {
        self.geometries
            .extend(points.into_iter().map(Geometry::Point));
    }

    pub fn len(&self) -> usize {
        self.geometries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.geometries.is_empty()
    }
}

fn finite(index: usize, coord: Coord<f64>) -> Result<Coord<f64>, GapError> {
    if coord.x.is_finite() && coord.y.is_finite() {
        Ok(coord)
    } else {
        Err(GapError::InvalidGeometry {
            index,
            reason: format!("non-finite coordinate ({}, {})", coord.x, coord.y),
        })
    }
}

/// Flattens a point set into raw coordinates, one per element, in order.
///
/// A `MultiPoint` element reduces to its last member. Any element that is not
/// a point, an empty `MultiPoint` or a non-finite coordinate aborts the call.
pub fn get_coordinates(points: &PointSet) -> Result<Vec<Coord<f64>>, GapError> {
    points
        .geometries
        .iter()
        .enumerate()
        .map(|(index, geometry)| match geometry {
            Geometry::Point(point) => finite(index, point.0),
            Geometry::MultiPoint(multi) => match multi.0.last() {
                Some(point) => finite(index, point.0),
                None => Err(GapError::InvalidGeometry {
                    index,
                    reason: "empty MultiPoint".to_string(),
                }),
            },
            other => Err(GapError::InvalidGeometry {
                index,
                reason: format!("expected Point or MultiPoint, found {}", kind_name(other)),
            }),
        })
        .collect()
}

fn kind_name(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}

/// Points in first-seen order with exact repeats dropped.
#[derive(Debug, Default)]
pub struct UniquePoints {
    seen: BTreeSet<(u64, u64)>,
    points: Vec<Point<f64>>,
}

impl UniquePoints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `point` unless an equal one is already held.
    pub fn push(&mut self, point: Point<f64>) -> bool {
        // -0.0 and 0.0 compare equal, so they share a key
        let key = ((point.x() + 0.0).to_bits(), (point.y() + 0.0).to_bits());
        if self.seen.insert(key) {
            self.points.push(point);
            true
        } else {
            false
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn into_vec(self) -> Vec<Point<f64>> {
        self.points
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, MultiPoint, coord};

    #[test]
    fn test_get_coordinates_preserves_order() {
        let points = PointSet::from_points(vec![
            Point::new(1.0, 2.0),
            Point::new(2.0, 1.0),
            Point::new(3.0, 4.0),
        ]);

        let coords = get_coordinates(&points).unwrap();

        assert_eq!(
            coords,
            vec![
                coord! { x: 1.0, y: 2.0 },
                coord! { x: 2.0, y: 1.0 },
                coord! { x: 3.0, y: 4.0 },
            ]
        );
    }

    #[test]
    fn test_multipoint_reduces_to_last_member() {
        let points = PointSet::new(
            vec![
                Geometry::Point(Point::new(0.0, 0.0)),
                Geometry::MultiPoint(MultiPoint(vec![
                    Point::new(5.0, 5.0),
                    Point::new(6.0, 7.0),
                ])),
            ],
            SpatialRef::default(),
        );

        let coords = get_coordinates(&points).unwrap();
        assert_eq!(coords.len(), 2);
        assert_eq!(coords[1], coord! { x: 6.0, y: 7.0 });
    }

    #[test]
    fn test_invalid_geometry_aborts() {
        let points = PointSet::new(
            vec![
                Geometry::Point(Point::new(0.0, 0.0)),
                Geometry::LineString(LineString::from(vec![(0.0, 0.0), (1.0, 1.0)])),
            ],
            SpatialRef::default(),
        );

        match get_coordinates(&points) {
            Err(GapError::InvalidGeometry { index, reason }) => {
                assert_eq!(index, 1);
                assert!(reason.contains("LineString"));
            }
            other => panic!("expected InvalidGeometry, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_multipoint_and_nan_are_invalid() {
        let empty = PointSet::new(
            vec![Geometry::MultiPoint(MultiPoint(vec![]))],
            SpatialRef::default(),
        );
        assert!(get_coordinates(&empty).is_err());

        let nan = PointSet::from_points(vec![Point::new(f64::NAN, 1.0)]);
        assert!(matches!(
            get_coordinates(&nan),
            Err(GapError::InvalidGeometry { index: 0, .. })
        ));
    }

    #[test]
    fn test_default_srs_is_wgs84() {
        assert_eq!(SpatialRef::default().to_string(), "EPSG:4326");
    }

    #[test]
    fn test_unique_points_keep_first_occurrence() {
        let mut unique = UniquePoints::new();
        assert!(unique.push(Point::new(1.0, 2.0)));
        assert!(unique.push(Point::new(0.0, 0.0)));
        assert!(!unique.push(Point::new(1.0, 2.0)));
        assert!(!unique.push(Point::new(-0.0, 0.0)));
        assert!(unique.push(Point::new(2.0, 1.0)));

        assert_eq!(unique.len(), 3);
        assert_eq!(
            unique.into_vec(),
            vec![Point::new(1.0, 2.0), Point::new(0.0, 0.0), Point::new(2.0, 1.0)]
        );
    }
}
