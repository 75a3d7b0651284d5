use std::fmt;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::projection::datum::Datum;
use crate::projection::ellipsoid::Ellipsoid;
use crate::projection::flags::UtmFlags;
use crate::projection::utm::UtmConverter;
use crate::types::{GeodeticPoint, Hemisphere};

/// A position expressed both geodetically and in UTM
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UtmCoord {
    /// Latitude in radians
    pub latitude: f64,
    /// Longitude in radians
    pub longitude: f64,
    pub zone: u8,
    pub hemisphere: Hemisphere,
    pub easting: f64,
    pub northing: f64,
    /// Central meridian of the zone in radians
    pub central_meridian: f64,
}

impl UtmCoord {
    /// Converts a WGS-84 position (radians) to UTM.
    ///
    /// With `Some(Datum::Nad27)` the position is first shifted to NAD-27 and
    /// projected on the Clarke 1866 ellipsoid.
    pub fn from_lat_lon(latitude: f64, longitude: f64, datum: Option<Datum>) -> Result<Self> {
        let datum = datum.unwrap_or_default();
        Self::project(&converter_for(datum), datum, latitude, longitude)
    }

    /// Converts a position to UTM on an explicit ellipsoid, no datum shift
    pub fn from_lat_lon_on(latitude: f64, longitude: f64, ellipsoid: Ellipsoid) -> Result<Self> {
        let converter = UtmConverter::new(ellipsoid, 0).map_err(utm_error)?;
        Self::project(&converter, Datum::Wgs84, latitude, longitude)
    }

    /// Converts UTM coordinates to a position, reported on WGS-84
    pub fn from_utm(
        zone: u8,
        hemisphere: Hemisphere,
        easting: f64,
        northing: f64,
        datum: Option<Datum>,
    ) -> Result<Self> {
        let datum = datum.unwrap_or_default();
        Self::unproject(&converter_for(datum), datum, zone, hemisphere, easting, northing)
    }

    /// Geodetic position of UTM coordinates, reported on WGS-84
    pub fn location_from_utm(
        zone: u8,
        hemisphere: Hemisphere,
        easting: f64,
        northing: f64,
    ) -> Result<GeodeticPoint> {
        Self::from_utm(zone, hemisphere, easting, northing, None).map(|coord| coord.location())
    }

    /// Projects with a prepared converter whose ellipsoid matches `datum`
    pub(crate) fn project(
        converter: &UtmConverter,
        datum: Datum,
        latitude: f64,
        longitude: f64,
    ) -> Result<Self> {
        let shifted = datum.from_wgs84(GeodeticPoint::new(latitude, longitude));
        let point = converter
            .geodetic_to_utm(shifted.latitude, shifted.longitude)
            .into_result()
            .map_err(utm_error)?;

        Ok(Self {
            latitude,
            longitude,
            zone: point.zone,
            hemisphere: point.hemisphere,
            easting: point.easting,
            northing: point.northing,
            central_meridian: point.central_meridian,
        })
    }

    /// Inverse of [`UtmCoord::project`]
    pub(crate) fn unproject(
        converter: &UtmConverter,
        datum: Datum,
        zone: u8,
        hemisphere: Hemisphere,
        easting: f64,
        northing: f64,
    ) -> Result<Self> {
        let point = converter
            .utm_to_geodetic(zone, hemisphere, easting, northing)
            .into_result()
            .map_err(utm_error)?;
        let location = datum.to_wgs84(point);

        Ok(Self {
            latitude: location.latitude,
            longitude: location.longitude,
            zone,
            hemisphere,
            easting,
            northing,
            central_meridian: crate::projection::utm::central_meridian(zone),
        })
    }

    pub fn location(&self) -> GeodeticPoint {
        GeodeticPoint::new(self.latitude, self.longitude)
    }
}

impl fmt::Display for UtmCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {:.0}E {:.0}N",
            self.zone, self.hemisphere, self.easting, self.northing
        )
    }
}

/// Converter on the ellipsoid of a known datum
pub(crate) fn converter_for(datum: Datum) -> UtmConverter {
    match UtmConverter::new(datum.ellipsoid(), 0) {
        Ok(converter) => converter,
        // known datums always validate
        Err(_) => UtmConverter::default(),
    }
}

fn utm_error(flags: UtmFlags) -> Error {
    warn!("UTM conversion failed: {}", flags.describe());
    Error::Utm { flags }
}
