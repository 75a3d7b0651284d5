use std::fmt;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::projection::ellipsoid::Ellipsoid;
use crate::projection::tm::{TmParameters, TransverseMercator};

/// A position expressed both geodetically and in a Transverse Mercator grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TmCoord {
    /// Latitude in radians
    pub latitude: f64,
    /// Longitude in radians
    pub longitude: f64,
    pub easting: f64,
    pub northing: f64,
    pub ellipsoid: Ellipsoid,
    pub parameters: TmParameters,
}

impl TmCoord {
    /// Projects a geodetic position. The longitude distortion warning is
    /// tolerated; every other flag becomes an error.
    pub fn from_lat_lon(
        latitude: f64,
        longitude: f64,
        ellipsoid: Ellipsoid,
        parameters: TmParameters,
    ) -> Result<Self> {
        let converter = configure(ellipsoid, parameters)?;
        let converted = converter.geodetic_to_tm(latitude, longitude);

        let projected = converted.value.ok_or_else(|| {
            warn!("transverse mercator projection failed: {}", converted.flags.describe());
            Error::TransverseMercator {
                flags: converted.flags,
            }
        })?;

        Ok(Self {
            latitude,
            longitude,
            easting: projected.easting,
            northing: projected.northing,
            ellipsoid,
            parameters: converter.parameters(),
        })
    }

    /// Converts grid coordinates back to a geodetic position
    pub fn from_tm(
        easting: f64,
        northing: f64,
        ellipsoid: Ellipsoid,
        parameters: TmParameters,
    ) -> Result<Self> {
        let converter = configure(ellipsoid, parameters)?;
        let converted = converter.tm_to_geodetic(easting, northing);

        let point = converted.value.ok_or_else(|| {
            warn!("transverse mercator inverse failed: {}", converted.flags.describe());
            Error::TransverseMercator {
                flags: converted.flags,
            }
        })?;

        Ok(Self {
            latitude: point.latitude,
            longitude: point.longitude,
            easting,
            northing,
            ellipsoid,
            parameters: converter.parameters(),
        })
    }
}

impl fmt::Display for TmCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.0}E {:.0}N ({:.6}, {:.6})",
            self.easting,
            self.northing,
            self.latitude.to_degrees(),
            self.longitude.to_degrees()
        )
    }
}

fn configure(ellipsoid: Ellipsoid, parameters: TmParameters) -> Result<TransverseMercator> {
    TransverseMercator::new(ellipsoid, parameters).map_err(|flags| {
        warn!("rejected transverse mercator parameters: {}", flags.describe());
        Error::TransverseMercator { flags }
    })
}
