// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

use crate::error::GapError;
use crate::params::GapParams;
use crate::points::{PointSet, get_coordinates};
use crate::tune::{Region, TuneConfig};
use geo::{MultiPolygon, Point, Rect, coord};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileStatus {
    GapsFound,
    NoGaps,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TileOutcome {
    pub row: i64,
    pub col: i64,
    pub status: TileStatus,
    pub gaps: MultiPolygon<f64>,
    /// Parameters of the fitting run, when one was found.
    pub params: Option<GapParams>,
}

impl TileOutcome {
    fn empty(row: i64, col: i64, status: TileStatus) -> Self {
        Self {
            row,
            col,
            status,
            gaps: MultiPolygon::new(Vec::new()),
            params: None,
        }
    }
}

/// `(row, col)` of the square tile holding `point`.
pub fn tile_key(point: Point<f64>, tile_size: f64) -> (i64, i64) {
    (
        (point.y() / tile_size).floor() as i64,
        (point.x() / tile_size).floor() as i64,
    )
}

pub fn tile_bounds(row: i64, col: i64, tile_size: f64) -> Rect<f64> {
    let x = col as f64 * tile_size;
    let y = row as f64 * tile_size;
    Rect::new(
        coord! { x: x, y: y },
        coord! { x: x + tile_size, y: y + tile_size },
    )
}

fn run_tile(
    row: i64,
    col: i64,
    points: PointSet,
    tile_size: f64,
    config: &TuneConfig,
) -> TileOutcome {
    let boundary = MultiPolygon(vec![tile_bounds(row, col, tile_size).to_polygon()]);

    let region = match Region::new(&points, &boundary, config) {
        Ok(region) => region,
        Err(err) => {
            warn!(row, col, %err, "failed to prepare tile");
            return TileOutcome::empty(row, col, TileStatus::Failed);
        }
    };

    match region.run(config) {
        Ok(outcome) => match outcome.tuned {
            Some(tuned) => {
                info!(
                    row,
                    col,
                    width = tuned.params.x_bin_size,
                    polygons = tuned.gaps.0.len(),
                    "gaps found"
                );
                TileOutcome {
                    row,
                    col,
                    status: TileStatus::GapsFound,
                    gaps: tuned.gaps,
                    params: Some(tuned.params),
                }
            }
            None => {
                info!(row, col, attempts = outcome.attempts.len(), "no gaps");
                TileOutcome::empty(row, col, TileStatus::NoGaps)
            }
        },
        Err(err) => {
            warn!(row, col, %err, "failed to tune tile");
            TileOutcome::empty(row, col, TileStatus::Failed)
        }
    }
}

/// Splits points into square tiles and tunes every tile independently.
///
/// Tiles run in parallel on the current rayon pool. Outcomes come back in
/// `(row, col)` order; a tile that fails is reported rather than aborting
/// the others.
pub fn run_tiles(
    points: &PointSet,
    tile_size: f64,
    config: &TuneConfig,
) -> Result<Vec<TileOutcome>, GapError> {
    GapError::positive("tile_size", tile_size)?;

    let mut tiles: BTreeMap<(i64, i64), Vec<Point<f64>>> = BTreeMap::new();
    for coord in get_coordinates(points)? {
        let point = Point::from(coord);
        tiles.entry(tile_key(point, tile_size)).or_default().push(point);
    }

    info!(tiles = tiles.len(), points = points.len(), "running tiles");

    let tiles: Vec<((i64, i64), Vec<Point<f64>>)> = tiles.into_iter().collect();

    Ok(tiles
        .into_par_iter()
        .map(|((row, col), tile_points)| {
            let mut tile_set = PointSet::from_points(tile_points);
            tile_set.srs = points.srs.clone();
            run_tile(row, col, tile_set, tile_size, config)
        })
        .collect())
}
