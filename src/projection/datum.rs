use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::projection::ellipsoid::{Ellipsoid, CLARKE_1866, WGS84};
use crate::types::GeodeticPoint;

/// Geocentric translation from WGS-84 to NAD-27 (CONUS mean), meters
const WGS84_TO_NAD27: (f64, f64, f64) = (8.0, -160.0, -176.0);

/// Geodetic datums understood by the UTM converters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Datum {
    #[default]
    Wgs84,
    Nad27,
}

impl Datum {
    /// Ellipsoid the datum is defined on
    pub fn ellipsoid(&self) -> Ellipsoid {
        match self {
            Datum::Wgs84 => WGS84,
            Datum::Nad27 => CLARKE_1866,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Datum::Wgs84 => "WGS84",
            Datum::Nad27 => "NAD27",
        }
    }

    /// Moves a WGS-84 position onto this datum
    pub fn from_wgs84(&self, point: GeodeticPoint) -> GeodeticPoint {
        match self {
            Datum::Wgs84 => point,
            Datum::Nad27 => wgs84_to_nad27(point),
        }
    }

    /// Moves a position on this datum back to WGS-84
    pub fn to_wgs84(&self, point: GeodeticPoint) -> GeodeticPoint {
        match self {
            Datum::Wgs84 => point,
            Datum::Nad27 => nad27_to_wgs84(point),
        }
    }
}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Datum {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace(['-', ' '], "").as_str() {
            "WGS84" => Ok(Datum::Wgs84),
            "NAD27" => Ok(Datum::Nad27),
            other => Err(Error::InvalidInput(format!("Unknown datum: {}", other))),
        }
    }
}

/// Shifts a WGS-84 position to NAD-27 at zero height
pub fn wgs84_to_nad27(point: GeodeticPoint) -> GeodeticPoint {
    let (dx, dy, dz) = WGS84_TO_NAD27;
    molodensky(point, &WGS84, &CLARKE_1866, dx, dy, dz)
}

/// Shifts a NAD-27 position to WGS-84 at zero height
pub fn nad27_to_wgs84(point: GeodeticPoint) -> GeodeticPoint {
    let (dx, dy, dz) = WGS84_TO_NAD27;
    molodensky(point, &CLARKE_1866, &WGS84, -dx, -dy, -dz)
}

/// Abridged Molodensky transformation between two ellipsoids
fn molodensky(
    point: GeodeticPoint,
    from: &Ellipsoid,
    to: &Ellipsoid,
    dx: f64,
    dy: f64,
    dz: f64,
) -> GeodeticPoint {
    let a = from.a;
    let f = from.f;
    let es = from.es();
    let da = to.a - a;
    let df = to.f - f;

    let (sin_lat, cos_lat) = point.latitude.sin_cos();
    let (sin_lon, cos_lon) = point.longitude.sin_cos();
    let w2 = 1.0 - es * sin_lat * sin_lat;

    let rn = a / w2.sqrt();
    let rm = a * (1.0 - es) / w2.powf(1.5);

    let dlat = (-dx * sin_lat * cos_lon - dy * sin_lat * sin_lon
        + dz * cos_lat
        + (a * df + f * da) * (2.0 * point.latitude).sin())
        / rm;
    let dlon = (-dx * sin_lon + dy * cos_lon) / (rn * cos_lat);

    GeodeticPoint::new(point.latitude + dlat, point.longitude + dlon)
}
