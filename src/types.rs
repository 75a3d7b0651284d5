//! Core data types for utmkit

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::projection::flags::UtmFlags;

/// A geodetic position, angles in radians
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeodeticPoint {
    /// Latitude in radians
    pub latitude: f64,
    /// Longitude in radians
    pub longitude: f64,
}

impl GeodeticPoint {
    /// Creates a point from radians
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Creates a point from degrees
    pub fn from_degrees(latitude: f64, longitude: f64) -> Self {
        Self::new(latitude.to_radians(), longitude.to_radians())
    }

    /// Latitude in degrees
    pub fn latitude_degrees(&self) -> f64 {
        self.latitude.to_degrees()
    }

    /// Longitude in degrees
    pub fn longitude_degrees(&self) -> f64 {
        self.longitude.to_degrees()
    }
}

/// A projected position in meters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectedPoint {
    /// Easting in meters
    pub easting: f64,
    /// Northing in meters
    pub northing: f64,
}

impl ProjectedPoint {
    /// Creates a projected point
    pub fn new(easting: f64, northing: f64) -> Self {
        Self { easting, northing }
    }
}

/// UTM hemisphere
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hemisphere {
    North,
    South,
}

impl Hemisphere {
    /// Hemisphere containing the given latitude (radians)
    pub fn from_latitude(latitude: f64) -> Self {
        if latitude < 0.0 {
            Hemisphere::South
        } else {
            Hemisphere::North
        }
    }

    /// False northing used by UTM in this hemisphere
    pub fn false_northing(&self) -> f64 {
        match self {
            Hemisphere::North => 0.0,
            Hemisphere::South => 10_000_000.0,
        }
    }

    /// Single letter code
    pub fn code(&self) -> &'static str {
        match self {
            Hemisphere::North => "N",
            Hemisphere::South => "S",
        }
    }
}

impl fmt::Display for Hemisphere {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Hemisphere {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "n" | "north" => Ok(Hemisphere::North),
            "s" | "south" => Ok(Hemisphere::South),
            _ => Err(Error::Utm {
                flags: UtmFlags::HEMISPHERE_ERROR,
            }),
        }
    }
}
