//! Planar predicates over lat/lon pairs. Distances are never computed, so
//! working directly in degrees is fine for the small, user-drawn zones
//! these are used on.

use crate::{BoundingBox, Coordinate};

/// Whether segment `a1-a2` properly crosses segment `b1-b2`.
///
/// Parallel and collinear segments never intersect, and neither do
/// segments that only touch at an endpoint: the crossing point has to be
/// strictly interior to both. Adjacent polygon edges share a vertex, so
/// they are never reported.
pub fn segments_intersect(a1: Coordinate, a2: Coordinate, b1: Coordinate, b2: Coordinate) -> bool {
    let det = (a2.longitude - a1.longitude) * (b2.latitude - b1.latitude)
        - (b2.longitude - b1.longitude) * (a2.latitude - a1.latitude);
    if det == 0.0 {
        return false;
    }

    let lambda = ((b2.latitude - b1.latitude) * (b2.longitude - a1.longitude)
        + (b1.longitude - b2.longitude) * (b2.latitude - a1.latitude))
        / det;
    let gamma = ((a1.latitude - a2.latitude) * (b2.longitude - a1.longitude)
        + (a2.longitude - a1.longitude) * (b2.latitude - a1.latitude))
        / det;

    (0.0 < lambda && lambda < 1.0) && (0.0 < gamma && gamma < 1.0)
}

/// Whether any edge of `a` crosses any edge of `b`. Both outlines are
/// treated as closed.
pub fn polygons_intersect(a: &[Coordinate], b: &[Coordinate]) -> bool {
    edges(a).any(|(a1, a2)| edges(b).any(|(b1, b2)| segments_intersect(a1, a2, b1, b2)))
}

/// Whether any two non-adjacent edges of the closed outline cross,
/// including the closing edge from the last point back to the first.
pub fn polygon_self_intersects(points: &[Coordinate]) -> bool {
    let count = points.len();
    let edges: Vec<_> = edges(points).collect();
    edges.iter().enumerate().any(|(i, &(a1, a2))| {
        edges
            .iter()
            .enumerate()
            .skip(i + 2)
            // The closing edge shares the first vertex with edge 0.
            .filter(|&(j, _)| !(i == 0 && j == count - 1))
            .any(|(_, &(b1, b2))| segments_intersect(a1, a2, b1, b2))
    })
}

/// Even-odd containment test.
///
/// The ray is swept along longitude and crossings are compared on
/// latitude. Outlines with fewer than three vertices contain nothing.
pub fn point_in_polygon(point: Coordinate, polygon: &[Coordinate]) -> bool {
    if polygon.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let (xi, yi) = (polygon[i].latitude, polygon[i].longitude);
        let (xj, yj) = (polygon[j].latitude, polygon[j].longitude);
        let crosses = ((yi > point.longitude) != (yj > point.longitude))
            && (point.latitude < (xj - xi) * (point.longitude - yi) / (yj - yi) + xi);
        if crosses {
            inside = !inside;
        }
        j = i;
    }
    inside
}

pub fn bounding_box(points: &[Coordinate]) -> Option<BoundingBox> {
    let first = points.first()?;
    let seed = BoundingBox {
        min_latitude: first.latitude,
        max_latitude: first.latitude,
        min_longitude: first.longitude,
        max_longitude: first.longitude,
    };
    Some(points.iter().skip(1).fold(seed, |range, point| BoundingBox {
        min_latitude: range.min_latitude.min(point.latitude),
        max_latitude: range.max_latitude.max(point.latitude),
        min_longitude: range.min_longitude.min(point.longitude),
        max_longitude: range.max_longitude.max(point.longitude),
    }))
}

/// Cyclic edge iterator: `(p[0], p[1]), ..., (p[n-1], p[0])`.
fn edges(points: &[Coordinate]) -> impl Iterator<Item = (Coordinate, Coordinate)> + '_ {
    let count = points.len();
    (0..count).map(move |i| (points[i], points[(i + 1) % count]))
}
