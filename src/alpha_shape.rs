// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

use delaunator::{Point as DPoint, triangulate};
use geo::{Area, Contains, InteriorPoint};
use geo_types::{Coord, LineString, Point, Polygon};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::f64::consts::TAU;
use tracing::debug;

/// Twice the signed area of triangle `abc`, positive when counter-clockwise.
fn orient2(a: Coord<f64>, b: Coord<f64>, c: Coord<f64>) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

fn circumradius(a: Coord<f64>, b: Coord<f64>, c: Coord<f64>) -> f64 {
    let ab = (b - a).x.hypot((b - a).y);
    let bc = (c - b).x.hypot((c - b).y);
    let ca = (a - c).x.hypot((a - c).y);
    ab * bc * ca / (2.0 * orient2(a, b, c).abs())
}

/// Angle needed to turn clockwise from direction `from` onto direction `to`,
/// in `(0, 2π]`.
fn clockwise_turn(from: Coord<f64>, to: Coord<f64>) -> f64 {
    let ccw = (from.x * to.y - from.y * to.x).atan2(from.x * to.x + from.y * to.y);
    let cw = (-ccw).rem_euclid(TAU);
    if cw == 0.0 { TAU } else { cw }
}

/// Sorts and dedups points so the triangulation never sees a repeated vertex.
fn unique_coords(points: &[Point<f64>]) -> Vec<Coord<f64>> {
    let mut coords: Vec<Coord<f64>> = points.iter().map(|p| p.0).collect();
    coords.sort_by(|a, b| a.x.total_cmp(&b.x).then_with(|| a.y.total_cmp(&b.y)));
    coords.dedup();
    coords
}

/// Counter-clockwise triangles of the Delaunay triangulation whose
/// circumradius is below `1 / alpha`. Zero-area triangles are always dropped.
fn kept_triangles(coords: &[Coord<f64>], alpha: f64) -> Vec<[usize; 3]> {
    let d_points: Vec<DPoint> = coords.iter().map(|c| DPoint { x: c.x, y: c.y }).collect();
    let triangulation = triangulate(&d_points);

    let max_radius = if alpha > 0.0 { 1.0 / alpha } else { f64::INFINITY };

    triangulation
        .triangles
        .chunks_exact(3)
        .filter_map(|t| {
            let (a, b, c) = (coords[t[0]], coords[t[1]], coords[t[2]]);
            let area2 = orient2(a, b, c);
            if area2 == 0.0 {
                return None;
            }
            let radius = circumradius(a, b, c);
            if !radius.is_finite() || radius >= max_radius {
                return None;
            }
            if area2 > 0.0 {
                Some([t[0], t[1], t[2]])
            } else {
                Some([t[0], t[2], t[1]])
            }
        })
        .collect()
}

/// Walks the boundary edges of the kept triangles into closed rings.
///
/// The triangles are counter-clockwise, so every ring keeps the covered area
/// on its left: outer rings come out counter-clockwise and holes clockwise.
/// Where several boundary edges leave the same vertex, the walk takes the
/// first one clockwise from the edge it arrived on, which splits shapes that
/// only touch at a vertex into separate rings.
fn boundary_rings(coords: &[Coord<f64>], triangles: &[[usize; 3]]) -> Vec<Vec<usize>> {
    let directed: BTreeSet<(usize, usize)> = triangles
        .iter()
        .flat_map(|t| [(t[0], t[1]), (t[1], t[2]), (t[2], t[0])])
        .collect();

    let mut remaining: BTreeSet<(usize, usize)> = directed
        .iter()
        .filter(|&&(u, v)| !directed.contains(&(v, u)))
        .copied()
        .collect();

    let mut outgoing: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for &(u, v) in &remaining {
        outgoing.entry(u).or_default().push(v);
    }

    let mut rings = Vec::new();

    while let Some(&first) = remaining.iter().next() {
        remaining.remove(&first);

        let mut ring = vec![first.0];
        let (mut prev, mut current) = first;
        let mut closed = false;

        loop {
            let back = coords[prev] - coords[current];
            let next = outgoing.get(&current).and_then(|candidates| {
                candidates.iter().copied().min_by(|&a, &b| {
                    let turn_a = clockwise_turn(back, coords[a] - coords[current]);
                    let turn_b = clockwise_turn(back, coords[b] - coords[current]);
                    turn_a.partial_cmp(&turn_b).unwrap_or(Ordering::Equal)
                })
            });

            let Some(next) = next else { break };

            if (current, next) == first {
                closed = true;
                break;
            }
            if !remaining.remove(&(current, next)) {
                break;
            }

            ring.push(current);
            prev = current;
            current = next;
        }

        if closed && ring.len() >= 3 {
            rings.push(ring);
        } else {
            debug!(vertices = ring.len(), "dropped an unclosed boundary walk");
        }
    }

    rings
}

fn ring_polygon(coords: &[Coord<f64>], ring: &[usize]) -> Polygon<f64> {
    Polygon::new(
        LineString::from(ring.iter().map(|&i| coords[i]).collect::<Vec<_>>()),
        vec![],
    )
}

/// Computes the alpha shape of a point set as one polygon per part.
///
/// Delaunay triangles with a circumradius of `1 / alpha` or more are removed
/// and the union of the rest is returned. `alpha == 0` keeps every triangle,
/// giving the convex hull; larger values carve the shape tighter. Fewer than
/// three distinct points, all-collinear points or an alpha that removes every
/// triangle give an empty result.
pub fn alpha_shape(points: &[Point<f64>], alpha: f64) -> Vec<Polygon<f64>> {
    let coords = unique_coords(points);
    if coords.len() < 3 {
        return Vec::new();
    }

    let triangles = kept_triangles(&coords, alpha);
    if triangles.is_empty() {
        return Vec::new();
    }

    let mut shells = Vec::new();
    let mut holes = Vec::new();
    for ring in boundary_rings(&coords, &triangles) {
        let polygon = ring_polygon(&coords, &ring);
        if polygon.signed_area() > 0.0 {
            shells.push(polygon);
        } else {
            holes.push(polygon);
        }
    }

    let mut interiors: Vec<Vec<LineString<f64>>> = vec![Vec::new(); shells.len()];
    for hole in holes {
        let Some(inside) = hole.interior_point() else {
            continue;
        };
        let owner = shells
            .iter()
            .enumerate()
            .filter(|(_, shell)| shell.contains(&inside))
            .min_by(|(_, a), (_, b)| {
                a.unsigned_area()
                    .partial_cmp(&b.unsigned_area())
                    .unwrap_or(Ordering::Equal)
            })
            .map(|(i, _)| i);

        match owner {
            Some(i) => interiors[i].push(hole.exterior().clone()),
            None => debug!("hole without an enclosing shell dropped"),
        }
    }

    shells
        .into_iter()
        .zip(interiors)
        .map(|(shell, interiors)| Polygon::new(shell.exterior().clone(), interiors))
        .collect()
}
