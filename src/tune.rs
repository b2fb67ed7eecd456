// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

//! Automatic parameter selection for one region.
//!
//! A region holds building points, the chainage of its boundary and a grid of
//! cells clipped to the boundary. Each attempt runs the gap pipeline with a
//! strip width and intersection minimum, then scores the result against the
//! grid: gaps should cover few buildings and a moderate share of the empty
//! cells.

use crate::chainage::{boundary_lines, chainage};
use crate::error::GapError;
use crate::params::GapParams;
use crate::pipeline::mind_the_gap;
use crate::points::{PointSet, get_coordinates};
use geo::{
    Area, BooleanOps, BoundingRect, Contains, Coord, Geometry, Intersects, MultiPolygon, Point,
    Rect, coord,
};
use rstar::{AABB, RTree};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Widths below this are float residue from stepping down to zero.
const WIDTH_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitThresholds {
    /// Largest share of buildings allowed inside gaps.
    pub build_thresh: f64,
    /// Share of empty area the gaps must exceed.
    pub area_floor: f64,
    /// Share of empty area the gaps must stay under.
    pub area_ceiling: f64,
}

impl Default for FitThresholds {
    fn default() -> Self {
        Self {
            build_thresh: 0.07,
            area_floor: 0.4,
            area_ceiling: 0.6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TuneConfig {
    pub chainage_interval: f64,
    pub grid_size: f64,
    pub start_width: f64,
    pub width_step: f64,
    pub length_ratio: f64,
    pub alpha: f64,
    pub intersection_candidates: Vec<usize>,
    pub thresholds: FitThresholds,
}

impl Default for TuneConfig {
    fn default() -> Self {
        Self {
            chainage_interval: 0.01,
            grid_size: 0.02,
            start_width: 0.03,
            width_step: 0.005,
            length_ratio: 2.0,
            alpha: 20.0,
            intersection_candidates: vec![2, 3, 4],
            thresholds: FitThresholds::default(),
        }
    }
}

impl TuneConfig {
    pub fn validate(&self) -> Result<(), GapError> {
        GapError::positive("chainage_interval", self.chainage_interval)?;
        GapError::positive("grid_size", self.grid_size)?;
        GapError::positive("start_width", self.start_width)?;
        GapError::positive("width_step", self.width_step)?;
        GapError::positive("length_ratio", self.length_ratio)?;
        GapError::non_negative("alpha", self.alpha)?;
        Ok(())
    }

    /// Strip widths to try, from `start_width` down while still positive.
    pub fn widths(&self) -> impl Iterator<Item = f64> + '_ {
        (0..)
            .map(|step| self.start_width - step as f64 * self.width_step)
            .take_while(|&width| width > WIDTH_EPSILON)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FitReport {
    /// Share of buildings that fall inside a gap.
    pub in_gaps_ratio: f64,
    /// Share of the empty grid area the gaps cover.
    pub area_ratio: f64,
    pub fits: bool,
}

/// One pipeline run made while tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TuneAttempt {
    pub width: f64,
    pub intersections: usize,
    /// `None` when the pipeline failed for these parameters.
    pub report: Option<FitReport>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TunedGaps {
    pub params: GapParams,
    pub gaps: MultiPolygon<f64>,
    pub report: FitReport,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TuneOutcome {
    pub attempts: Vec<TuneAttempt>,
    pub tuned: Option<TunedGaps>,
}

pub struct Region {
    buildings: Vec<Coord<f64>>,
    /// Buildings followed by boundary chainage; what the pipeline runs on.
    points: PointSet,
    cells: Vec<MultiPolygon<f64>>,
    empty_cells: Vec<MultiPolygon<f64>>,
    empty_area: f64,
}

/// Square cells of `size` covering `bounds`. Cells crossing the boundary are
/// clipped to it; cells inside it keep their exact corners.
fn make_grid(boundary: &MultiPolygon<f64>, bounds: Rect<f64>, size: f64) -> Vec<MultiPolygon<f64>> {
    let cols = (bounds.width() / size).ceil().max(1.0) as usize;
    let rows = (bounds.height() / size).ceil().max(1.0) as usize;

    let mut cells = Vec::with_capacity(cols * rows);
    for col in 0..cols {
        let x = bounds.min().x + col as f64 * size;
        for row in 0..rows {
            let y = bounds.min().y + row as f64 * size;
            let cell = Rect::new(coord! { x: x, y: y }, coord! { x: x + size, y: y + size });
            let cell = MultiPolygon(vec![cell.to_polygon()]);
            if boundary.contains(&cell) {
                cells.push(cell);
                continue;
            }

            let clipped = cell.intersection(boundary);
            if clipped.unsigned_area() > 0.0 {
                cells.push(clipped);
            }
        }
    }
    cells
}

fn is_empty_cell(cell: &MultiPolygon<f64>, tree: &RTree<[f64; 2]>) -> bool {
    let Some(rect) = cell.bounding_rect() else {
        return true;
    };
    let envelope = AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]);

    !tree
        .locate_in_envelope(&envelope)
        .any(|&[x, y]| cell.contains(&Point::new(x, y)))
}

impl Region {
    /// Prepares a region: boundary chainage, the grid and its empty cells.
    pub fn new(
        buildings: &PointSet,
        boundary: &MultiPolygon<f64>,
        config: &TuneConfig,
    ) -> Result<Self, GapError> {
        config.validate()?;

        let building_coords = get_coordinates(buildings)?;
        let chain = chainage(&boundary_lines(boundary), config.chainage_interval)?;

        let mut points = PointSet::new(
            building_coords.iter().map(|&c| Geometry::Point(Point::from(c))).collect(),
            buildings.srs.clone(),
        );
        points.extend_points(chain);

        let tree = RTree::bulk_load(
            get_coordinates(&points)?
                .into_iter()
                .map(|c| [c.x, c.y])
                .collect(),
        );

        let cells = match boundary.bounding_rect() {
            Some(bounds) => make_grid(boundary, bounds, config.grid_size),
            None => Vec::new(),
        };

        let empty_cells: Vec<MultiPolygon<f64>> = cells
            .iter()
            .filter(|cell| is_empty_cell(cell, &tree))
            .cloned()
            .collect();
        let empty_area: f64 = empty_cells.iter().map(|cell| cell.unsigned_area()).sum();

        debug!(
            buildings = building_coords.len(),
            points = points.len(),
            cells = cells.len(),
            empty_cells = empty_cells.len(),
            "region prepared"
        );

        Ok(Self {
            buildings: building_coords,
            points,
            cells,
            empty_cells,
            empty_area,
        })
    }

    pub fn points(&self) -> &PointSet {
        &self.points
    }

    pub fn cells(&self) -> &[MultiPolygon<f64>] {
        &self.cells
    }

    pub fn empty_area(&self) -> f64 {
        self.empty_area
    }

    pub fn params(width: f64, length_ratio: f64, intersections: usize, alpha: f64) -> GapParams {
        let length = width * length_ratio + width / 4.0;
        GapParams::new(width, width, length, length, intersections, intersections).with_alpha(alpha)
    }

    /// Runs the pipeline over buildings and chainage with square strips.
    pub fn mind(
        &self,
        width: f64,
        length_ratio: f64,
        intersections: usize,
        alpha: f64,
    ) -> Result<MultiPolygon<f64>, GapError> {
        let params = Self::params(width, length_ratio, intersections, alpha);
        let output = mind_the_gap(&self.points, &params)?;
        Ok(MultiPolygon(output.polygons().to_vec()))
    }

    /// Scores gap polygons against the buildings and the empty grid cells.
    pub fn fit_check(&self, gaps: &MultiPolygon<f64>, thresholds: &FitThresholds) -> FitReport {
        if gaps.0.is_empty() {
            return FitReport::default();
        }

        let in_gaps = self
            .buildings
            .iter()
            .filter(|&&c| gaps.intersects(&Point::from(c)))
            .count();
        let in_gaps_ratio = if self.buildings.is_empty() {
            0.0
        } else {
            in_gaps as f64 / self.buildings.len() as f64
        };

        // clusters can overlap, so merge before measuring
        let merged = gaps
            .iter()
            .fold(MultiPolygon::new(Vec::new()), |acc, gap| {
                acc.union(&MultiPolygon(vec![gap.clone()]))
            });

        let covered: f64 = self
            .empty_cells
            .iter()
            .map(|cell| cell.intersection(&merged).unsigned_area())
            .sum();

        let area_ratio = if self.empty_area > 0.0 {
            covered / self.empty_area
        } else {
            0.0
        };

        let fits = self.empty_area > 0.0
            && in_gaps_ratio < thresholds.build_thresh
            && thresholds.area_floor < area_ratio
            && area_ratio < thresholds.area_ceiling;

        FitReport {
            in_gaps_ratio,
            area_ratio,
            fits,
        }
    }

    /// Shrinks the strip width until some intersection minimum gives gaps
    /// that fit. Attempts that fail are logged and count as not fitting.
    pub fn run(&self, config: &TuneConfig) -> Result<TuneOutcome, GapError> {
        config.validate()?;

        let mut outcome = TuneOutcome::default();

        for width in config.widths() {
            for &intersections in &config.intersection_candidates {
                let gaps = match self.mind(width, config.length_ratio, intersections, config.alpha)
                {
                    Ok(gaps) => gaps,
                    Err(err) => {
                        warn!(width, intersections, %err, "gap run failed");
                        outcome.attempts.push(TuneAttempt {
                            width,
                            intersections,
                            report: None,
                        });
                        continue;
                    }
                };

                let report = self.fit_check(&gaps, &config.thresholds);
                info!(
                    width,
                    intersections,
                    gaps = gaps.0.len(),
                    in_gaps_ratio = report.in_gaps_ratio,
                    area_ratio = report.area_ratio,
                    fits = report.fits,
                    "tuning attempt"
                );
                outcome.attempts.push(TuneAttempt {
                    width,
                    intersections,
                    report: Some(report),
                });

                if report.fits {
                    outcome.tuned = Some(TunedGaps {
                        params: Self::params(width, config.length_ratio, intersections, config.alpha),
                        gaps,
                        report,
                    });
                    return Ok(outcome);
                }
            }
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(min: f64, max: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![
            Rect::new(coord! { x: min, y: min }, coord! { x: max, y: max }).to_polygon(),
        ])
    }

    fn rect(x1: f64, y1: f64, x2: f64, y2: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![
            Rect::new(coord! { x: x1, y: y1 }, coord! { x: x2, y: y2 }).to_polygon(),
        ])
    }

    /// Buildings on a `step` lattice over `[0, max]`, minus the open square
    /// `(hole_min, hole_max)`.
    fn lattice(max_step: i32, step: f64, hole: Option<(i32, i32)>) -> PointSet {
        let mut points = Vec::new();
        for i in 0..=max_step {
            for j in 0..=max_step {
                if let Some((lo, hi)) = hole {
                    if lo < i && i < hi && lo < j && j < hi {
                        continue;
                    }
                }
                points.push(Point::new(i as f64 * step, j as f64 * step));
            }
        }
        PointSet::from_points(points)
    }

    /// One building in three of four half-unit cells.
    fn quarter_region() -> Region {
        let buildings = PointSet::from_points(vec![
            Point::new(0.25, 0.25),
            Point::new(0.75, 0.25),
            Point::new(0.25, 0.75),
        ]);
        let config = TuneConfig {
            grid_size: 0.5,
            ..TuneConfig::default()
        };
        Region::new(&buildings, &square(0.0, 1.0), &config).unwrap()
    }

    #[test]
    fn test_grid_and_empty_cells() {
        let region = quarter_region();

        assert_eq!(region.cells().len(), 4);
        assert!((region.empty_area() - 0.25).abs() < 1e-9);
        // 400 chainage points along the unit square
        assert_eq!(region.points().len(), 403);
    }

    #[test]
    fn test_inner_cells_keep_their_corners() {
        let boundary = square(0.0, 0.3);
        let bounds = boundary.bounding_rect().unwrap();
        let cells = make_grid(&boundary, bounds, 0.02);

        assert_eq!(cells.len(), 225);

        // column 5, row 5
        let cell = &cells[5 * 15 + 5];
        let rect = cell.bounding_rect().unwrap();
        assert_eq!(rect.min(), coord! { x: 0.1, y: 0.1 });

        let tree = RTree::bulk_load(vec![[0.1, 0.11], [0.11, 0.1]]);
        assert!(is_empty_cell(cell, &tree));

        let tree = RTree::bulk_load(vec![[0.11, 0.11]]);
        assert!(!is_empty_cell(cell, &tree));
    }

    #[test]
    fn test_fit_check_scores() {
        let region = quarter_region();
        let thresholds = FitThresholds::default();

        let half = region.fit_check(&rect(0.5, 0.5, 1.0, 0.75), &thresholds);
        assert_eq!(half.in_gaps_ratio, 0.0);
        assert!((half.area_ratio - 0.5).abs() < 1e-9);
        assert!(half.fits);

        let full = region.fit_check(&rect(0.5, 0.5, 1.0, 1.0), &thresholds);
        assert!((full.area_ratio - 1.0).abs() < 1e-9);
        assert!(!full.fits);

        let over_buildings = region.fit_check(&rect(0.0, 0.5, 1.0, 0.8), &thresholds);
        assert!((over_buildings.in_gaps_ratio - 1.0 / 3.0).abs() < 1e-9);
        assert!(!over_buildings.fits);
    }

    #[test]
    fn test_overlapping_gaps_are_not_double_counted() {
        let region = quarter_region();
        let mut gaps = rect(0.5, 0.5, 1.0, 0.75);
        gaps.0.extend(rect(0.5, 0.5, 1.0, 0.75));

        let report = region.fit_check(&gaps, &FitThresholds::default());

        assert!((report.area_ratio - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_no_gaps_never_fit() {
        let region = quarter_region();
        let report = region.fit_check(&MultiPolygon::new(vec![]), &FitThresholds::default());
        assert_eq!(report, FitReport::default());
        assert!(!report.fits);
    }

    #[test]
    fn test_widths_step_down_to_zero() {
        let widths: Vec<f64> = TuneConfig::default().widths().collect();
        assert_eq!(widths.len(), 6);
        assert_eq!(widths[0], 0.03);
        assert!((widths[5] - 0.005).abs() < 1e-12);
    }

    #[test]
    fn test_mind_finds_the_hole() {
        let buildings = lattice(30, 0.01, Some((10, 20)));
        let region = Region::new(&buildings, &square(0.0, 0.3), &TuneConfig::default()).unwrap();

        let gaps = region.mind(0.01, 2.0, 2, 0.0).unwrap();
        assert!(!gaps.0.is_empty());

        // the only empty cells are the hole; the hull of the gaps misses a
        // small triangle in each of its corners
        let report = region.fit_check(&gaps, &FitThresholds::default());
        assert!((region.empty_area() - 0.01).abs() < 1e-9);
        assert!((report.area_ratio - 0.98).abs() < 1e-6);
        assert!(report.in_gaps_ratio < 0.07);
        assert!(!report.fits);
    }

    #[test]
    fn test_uniform_region_never_fits() {
        let buildings = lattice(20, 0.005, None);
        let config = TuneConfig::default();
        let region = Region::new(&buildings, &square(0.0, 0.1), &config).unwrap();

        let outcome = region.run(&config).unwrap();

        assert!(outcome.tuned.is_none());
        assert_eq!(outcome.attempts.len(), 18);
        assert!(outcome.attempts.iter().all(|a| a.report.is_some_and(|r| !r.fits)));
    }

    #[test]
    fn test_bad_config_is_rejected() {
        let config = TuneConfig {
            width_step: 0.0,
            ..TuneConfig::default()
        };
        let buildings = PointSet::from_points(vec![Point::new(0.5, 0.5)]);
        assert!(Region::new(&buildings, &square(0.0, 1.0), &config).is_err());
    }
}
