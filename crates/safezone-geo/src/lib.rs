pub mod geometry;

use serde::{Deserialize, Serialize};

pub use geometry::{
    bounding_box, point_in_polygon, polygon_self_intersects, polygons_intersect, segments_intersect,
};

/// WGS84 position in degrees. Longitude is treated as the x axis and
/// latitude as the y axis by the planar predicates in [`geometry`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Axis-aligned envelope of a zone. This is what the backend stores in
/// place of the full polygon.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_latitude: f64,
    pub max_latitude: f64,
    pub min_longitude: f64,
    pub max_longitude: f64,
}

impl BoundingBox {
    pub fn center(&self) -> Coordinate {
        Coordinate::new(
            (self.min_latitude + self.max_latitude) / 2.0,
            (self.min_longitude + self.max_longitude) / 2.0,
        )
    }

    /// The rectangle implied by the range, wound
    /// (min,min) -> (min,max) -> (max,max) -> (max,min) in (lat, lon).
    pub fn corners(&self) -> [Coordinate; 4] {
        [
            Coordinate::new(self.min_latitude, self.min_longitude),
            Coordinate::new(self.min_latitude, self.max_longitude),
            Coordinate::new(self.max_latitude, self.max_longitude),
            Coordinate::new(self.max_latitude, self.min_longitude),
        ]
    }
}

/// Zone geometry as the backend hands it back: either just the stored
/// range, or the range plus the explicit outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ZoneShape {
    Box { range: BoundingBox },
    Polygon { points: Vec<Coordinate> },
}

impl ZoneShape {
    pub fn from_range(range: BoundingBox, coordinates: Option<Vec<Coordinate>>) -> Self {
        match coordinates {
            Some(points) if points.len() > 2 => Self::Polygon { points },
            _ => Self::Box { range },
        }
    }

    pub fn into_polygon(self) -> Vec<Coordinate> {
        match self {
            Self::Box { range } => range.corners().to_vec(),
            Self::Polygon { points } => points,
        }
    }
}
