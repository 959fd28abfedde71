//! Point entities.

use std::fmt;

use geo::Coord;

use crate::{EntityError, OsmId, parse_osm_id};

/// Spatial reference of every staged geometry (WGS84).
pub const SRID: u32 = 4326;

const LON_RANGE: (f64, f64) = (-180.0, 180.0);
const LAT_RANGE: (f64, f64) = (-90.0, 90.0);

/// A point with validated WGS84 coordinates.
///
/// Coordinates are stored with `x = longitude` and `y = latitude`.
///
/// # Examples
/// ```
/// use hydrograph_core::Node;
///
/// let node = Node::new(1, 2.5, 48.8)?;
/// assert_eq!(node.wkt(), "SRID=4326;POINT(2.500000 48.800000)");
/// assert!(Node::new(2, 181.0, 0.0).is_err());
/// # Ok::<(), hydrograph_core::EntityError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Node {
    /// Node identifier.
    pub id: OsmId,
    /// WGS84 position.
    pub location: Coord<f64>,
}

impl Node {
    /// Construct a node, rejecting coordinates outside the WGS84 range.
    ///
    /// Non-finite values never satisfy the range check and are rejected too.
    pub fn new(id: OsmId, lon: f64, lat: f64) -> Result<Self, EntityError> {
        check_range("lon", lon, LON_RANGE)?;
        check_range("lat", lat, LAT_RANGE)?;
        Ok(Self {
            id,
            location: Coord { x: lon, y: lat },
        })
    }

    /// Construct a node from the raw `id`, `lon` and `lat` attribute values.
    pub fn from_attributes(
        id: Option<&str>,
        lon: Option<&str>,
        lat: Option<&str>,
    ) -> Result<Self, EntityError> {
        let id = parse_osm_id(id)?;
        let lon = parse_coordinate("lon", lon)?;
        let lat = parse_coordinate("lat", lat)?;
        Self::new(id, lon, lat)
    }

    /// Longitude in degrees.
    #[must_use]
    pub const fn lon(&self) -> f64 {
        self.location.x
    }

    /// Latitude in degrees.
    #[must_use]
    pub const fn lat(&self) -> f64 {
        self.location.y
    }

    /// Extended well-known text for the point, with six decimals per axis.
    #[must_use]
    pub fn wkt(&self) -> String {
        format!("SRID={SRID};POINT({:.6} {:.6})", self.lon(), self.lat())
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node #{}: <{:.6}, {:.6}>", self.id, self.lon(), self.lat())
    }
}

fn parse_coordinate(axis: &'static str, raw: Option<&str>) -> Result<f64, EntityError> {
    let raw = raw.ok_or(EntityError::MissingAttribute { attribute: axis })?;
    raw.trim()
        .parse::<f64>()
        .map_err(|_| EntityError::InvalidCoordinate {
            axis,
            value: raw.to_owned(),
        })
}

fn check_range(axis: &'static str, value: f64, (min, max): (f64, f64)) -> Result<(), EntityError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(EntityError::CoordinateOutOfRange {
            axis,
            value,
            min,
            max,
        })
    }
}
