//! Universal Transverse Mercator on top of [`TransverseMercator`]
//!
//! Like the Transverse Mercator layer this reports problems as [`UtmFlags`]
//! bits instead of failing.

use std::f64::consts::PI;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::cache::{ZoneCache, ZoneKey};
use crate::projection::ellipsoid::{Ellipsoid, WGS84};
use crate::projection::flags::{TmFlags, UtmFlags};
use crate::projection::tm::{Converted, TmParameters, TransverseMercator};
use crate::types::{GeodeticPoint, Hemisphere};

/// Southernmost latitude covered by UTM, -82 degrees
pub const MIN_LAT: f64 = (-82.0 * PI) / 180.0;

/// Northernmost latitude covered by UTM, 86 degrees
pub const MAX_LAT: f64 = (86.0 * PI) / 180.0;

pub const MIN_EASTING: f64 = 100_000.0;
pub const MAX_EASTING: f64 = 900_000.0;
pub const MIN_NORTHING: f64 = 0.0;
pub const MAX_NORTHING: f64 = 10_000_000.0;

pub const FALSE_EASTING: f64 = 500_000.0;
pub const SCALE_FACTOR: f64 = 0.9996;

const MIN_INV_F: f64 = 250.0;
const MAX_INV_F: f64 = 350.0;

/// A position in a UTM zone
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UtmPoint {
    pub zone: u8,
    pub hemisphere: Hemisphere,
    pub easting: f64,
    pub northing: f64,
    /// Central meridian of the zone in radians
    pub central_meridian: f64,
}

/// Result of a UTM conversion
pub type UtmConverted<T> = Converted<T, UtmFlags>;

/// Central meridian of a UTM zone, radians in [-177, 177] degrees
pub fn central_meridian(zone: u8) -> f64 {
    (6.0 * f64::from(zone) - 183.0).to_radians()
}

/// UTM zone for a position, including the Norway and Svalbard exceptions.
///
/// Latitude and longitude must already be in range.
pub fn zone_for(latitude: f64, longitude: f64) -> u8 {
    let longitude = positive_longitude(longitude);
    let (lat_degrees, long_degrees) = truncated_degrees(latitude, longitude);

    let mut zone = if longitude < PI {
        (31.0 + longitude.to_degrees() / 6.0) as i64
    } else {
        (longitude.to_degrees() / 6.0 - 29.0) as i64
    };
    if zone > 60 {
        zone = 1;
    }

    if lat_degrees > 55 && lat_degrees < 64 {
        if long_degrees > -1 && long_degrees < 3 {
            zone = 31;
        }
        if long_degrees > 2 && long_degrees < 12 {
            zone = 32;
        }
    }
    if lat_degrees > 71 {
        if long_degrees > -1 && long_degrees < 9 {
            zone = 31;
        }
        if long_degrees > 8 && long_degrees < 21 {
            zone = 33;
        }
        if long_degrees > 20 && long_degrees < 33 {
            zone = 35;
        }
        if long_degrees > 32 && long_degrees < 42 {
            zone = 37;
        }
    }

    zone as u8
}

/// Svalbard band, where zones 32, 34 and 36 are not used
fn in_svalbard_band(latitude: f64, longitude: f64) -> bool {
    let (lat_degrees, long_degrees) = truncated_degrees(latitude, positive_longitude(longitude));
    lat_degrees > 71 && long_degrees > -1 && long_degrees < 42
}

fn positive_longitude(longitude: f64) -> f64 {
    if longitude < 0.0 {
        longitude + 2.0 * PI + 1.0e-10
    } else {
        longitude
    }
}

/// Whole degrees truncated toward zero, as the exception table expects
fn truncated_degrees(latitude: f64, longitude: f64) -> (i64, i64) {
    (latitude.to_degrees() as i64, longitude.to_degrees() as i64)
}

/// UTM converter for one ellipsoid, with an optional zone override
#[derive(Debug, Clone)]
pub struct UtmConverter {
    ellipsoid: Ellipsoid,
    zone_override: u8,
    cache: Option<ZoneCache>,
}

impl Default for UtmConverter {
    fn default() -> Self {
        Self {
            ellipsoid: WGS84,
            zone_override: 0,
            cache: None,
        }
    }
}

impl UtmConverter {
    /// Creates a converter. `zone_override` of 0 means no override.
    pub fn new(ellipsoid: Ellipsoid, zone_override: u8) -> std::result::Result<Self, UtmFlags> {
        let mut flags = UtmFlags::empty();

        if ellipsoid.a.is_nan() || ellipsoid.a <= 0.0 {
            flags |= UtmFlags::A_ERROR;
        }
        let inv_f = ellipsoid.inverse_flattening();
        if !(MIN_INV_F..=MAX_INV_F).contains(&inv_f) {
            flags |= UtmFlags::INV_F_ERROR;
        }
        if zone_override > 60 {
            flags |= UtmFlags::ZONE_OVERRIDE_ERROR;
        }

        if !flags.is_empty() {
            return Err(flags);
        }

        Ok(Self {
            ellipsoid,
            zone_override,
            cache: None,
        })
    }

    /// Shares zone converters through `cache` instead of rebuilding them per call
    pub fn with_cache(mut self, cache: ZoneCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn ellipsoid(&self) -> Ellipsoid {
        self.ellipsoid
    }

    pub fn zone_override(&self) -> u8 {
        self.zone_override
    }

    /// Converts a geodetic position (radians) to UTM
    pub fn geodetic_to_utm(&self, latitude: f64, longitude: f64) -> UtmConverted<UtmPoint> {
        let mut flags = UtmFlags::empty();

        if !(MIN_LAT..=MAX_LAT).contains(&latitude) {
            flags |= UtmFlags::LAT_ERROR;
        }
        if !(-PI..=2.0 * PI).contains(&longitude) {
            flags |= UtmFlags::LON_ERROR;
        }
        if !flags.is_empty() {
            return Converted::rejected(flags);
        }

        let zone = match self.apply_override(zone_for(latitude, longitude), latitude, longitude) {
            Some(zone) => zone,
            None => return Converted::rejected(UtmFlags::ZONE_OVERRIDE_ERROR),
        };
        let hemisphere = Hemisphere::from_latitude(latitude);

        let tm = match self.zone_converter(zone, hemisphere) {
            Ok(tm) => tm,
            Err(_) => return Converted::rejected(UtmFlags::TM_ERROR),
        };
        let projected = match tm.geodetic_to_tm(latitude, longitude).value {
            Some(projected) => projected,
            None => return Converted::rejected(UtmFlags::TM_ERROR),
        };

        if !(MIN_EASTING..=MAX_EASTING).contains(&projected.easting) {
            flags |= UtmFlags::EASTING_ERROR;
        }
        if !(MIN_NORTHING..=MAX_NORTHING).contains(&projected.northing) {
            flags |= UtmFlags::NORTHING_ERROR;
        }
        if !flags.is_empty() {
            return Converted::rejected(flags);
        }

        Converted::accepted(
            UtmPoint {
                zone,
                hemisphere,
                easting: projected.easting,
                northing: projected.northing,
                central_meridian: central_meridian(zone),
            },
            flags,
        )
    }

    /// Converts a UTM position back to geodetic (radians).
    ///
    /// Easting is not range checked so that data extending into a
    /// neighbouring zone can still be reprojected.
    pub fn utm_to_geodetic(
        &self,
        zone: u8,
        hemisphere: Hemisphere,
        easting: f64,
        northing: f64,
    ) -> UtmConverted<GeodeticPoint> {
        let mut flags = UtmFlags::empty();

        if !(1..=60).contains(&zone) {
            flags |= UtmFlags::ZONE_ERROR;
        }
        if !(MIN_NORTHING..=MAX_NORTHING).contains(&northing) {
            flags |= UtmFlags::NORTHING_ERROR;
        }
        if !flags.is_empty() {
            return Converted::rejected(flags);
        }

        let tm = match self.zone_converter(zone, hemisphere) {
            Ok(tm) => tm,
            Err(_) => return Converted::rejected(UtmFlags::TM_ERROR),
        };
        let point = match tm.tm_to_geodetic(easting, northing).value {
            Some(point) => point,
            None => return Converted::rejected(UtmFlags::TM_ERROR),
        };

        if !(MIN_LAT..=MAX_LAT).contains(&point.latitude) {
            return Converted::rejected(UtmFlags::NORTHING_ERROR);
        }

        Converted::accepted(point, flags)
    }

    /// Applies the zone override. Only neighbouring zones may be forced,
    /// which reach two zones away inside the Svalbard band.
    fn apply_override(&self, zone: u8, latitude: f64, longitude: f64) -> Option<u8> {
        let forced = self.zone_override;
        if forced == 0 {
            return Some(zone);
        }

        let reach = if in_svalbard_band(latitude, longitude) { 2 } else { 1 };
        let wraps = (zone == 1 && forced == 60) || (zone == 60 && forced == 1);
        let adjacent = zone.saturating_sub(reach) <= forced && forced <= zone + reach;
        if wraps || adjacent {
            Some(forced)
        } else {
            None
        }
    }

    fn zone_converter(
        &self,
        zone: u8,
        hemisphere: Hemisphere,
    ) -> std::result::Result<Arc<TransverseMercator>, TmFlags> {
        let build = || {
            TransverseMercator::new(
                self.ellipsoid,
                TmParameters {
                    origin_latitude: 0.0,
                    central_meridian: central_meridian(zone),
                    false_easting: FALSE_EASTING,
                    false_northing: hemisphere.false_northing(),
                    scale_factor: SCALE_FACTOR,
                },
            )
        };

        match &self.cache {
            Some(cache) => {
                cache.get_or_try_insert_with(ZoneKey::new(zone, hemisphere, &self.ellipsoid), build)
            }
            None => build().map(Arc::new),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::ellipsoid::CLARKE_1866;
    use approx::assert_abs_diff_eq;

    fn deg(value: f64) -> f64 {
        value.to_radians()
    }

    #[test]
    fn test_zone_for_standard_bands() {
        assert_eq!(zone_for(0.0, deg(-180.0)), 1);
        assert_eq!(zone_for(0.0, deg(-177.0)), 1);
        assert_eq!(zone_for(0.0, deg(-81.0)), 17);
        assert_eq!(zone_for(0.0, deg(0.5)), 31);
        assert_eq!(zone_for(0.0, deg(179.9)), 60);
        assert_eq!(zone_for(0.0, deg(183.0)), 1);
        assert_eq!(zone_for(deg(-33.9), deg(151.2)), 56);
    }

    #[test]
    fn test_zone_matches_floor_formula() {
        for lon in -179..180 {
            let expected = ((lon as f64 + 180.0) / 6.0).floor() as u8 + 1;
            assert_eq!(zone_for(deg(10.0), deg(lon as f64 + 0.5)), expected, "lon {}", lon);
        }
    }

    #[test]
    fn test_zone_norway_exception() {
        assert_eq!(zone_for(deg(60.0), deg(5.0)), 32);
        assert_eq!(zone_for(deg(60.0), deg(1.0)), 31);
        assert_eq!(zone_for(deg(50.0), deg(5.0)), 31);
    }

    #[test]
    fn test_zone_svalbard_exception() {
        assert_eq!(zone_for(deg(78.0), deg(10.0)), 33);
        assert_eq!(zone_for(deg(78.0), deg(7.0)), 31);
        assert_eq!(zone_for(deg(78.0), deg(25.0)), 35);
        assert_eq!(zone_for(deg(78.0), deg(40.0)), 37);
    }

    #[test]
    fn test_central_meridian() {
        assert_abs_diff_eq!(central_meridian(17).to_degrees(), -81.0, epsilon = 1e-12);
        assert_abs_diff_eq!(central_meridian(1).to_degrees(), -177.0, epsilon = 1e-12);
        assert_abs_diff_eq!(central_meridian(60).to_degrees(), 177.0, epsilon = 1e-12);
    }

    #[test]
    fn test_converter_validation() {
        assert_eq!(
            UtmConverter::new(Ellipsoid::new(0.0, 1.0 / 100.0), 61).unwrap_err(),
            UtmFlags::A_ERROR | UtmFlags::INV_F_ERROR | UtmFlags::ZONE_OVERRIDE_ERROR
        );
        assert!(UtmConverter::new(CLARKE_1866, 60).is_ok());
    }

    #[test]
    fn test_geodetic_to_utm_equator() {
        let out = UtmConverter::default().geodetic_to_utm(0.0, deg(-81.0));
        assert!(out.flags.is_empty());
        let point = out.value.unwrap();
        assert_eq!(point.zone, 17);
        assert_eq!(point.hemisphere, Hemisphere::North);
        assert_abs_diff_eq!(point.easting, 500_000.0, epsilon = 1e-6);
        assert_abs_diff_eq!(point.northing, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_geodetic_to_utm_southern_hemisphere() {
        let point = UtmConverter::default()
            .geodetic_to_utm(deg(-45.0), deg(-75.0))
            .value
            .unwrap();
        assert_eq!(point.zone, 18);
        assert_eq!(point.hemisphere, Hemisphere::South);
        assert_abs_diff_eq!(point.northing, 10_000_000.0 - 4_982_950.400_2, epsilon = 1e-3);
    }

    #[test]
    fn test_geodetic_to_utm_range_errors() {
        let converter = UtmConverter::default();
        assert_eq!(converter.geodetic_to_utm(deg(87.0), 0.0).flags, UtmFlags::LAT_ERROR);
        assert_eq!(converter.geodetic_to_utm(deg(-83.0), 0.0).flags, UtmFlags::LAT_ERROR);
        assert_eq!(
            converter.geodetic_to_utm(deg(90.0), deg(400.0)).flags,
            UtmFlags::LAT_ERROR | UtmFlags::LON_ERROR
        );
    }

    #[test]
    fn test_zone_override() {
        let neighbour = UtmConverter::new(WGS84, 18).unwrap();
        let point = neighbour.geodetic_to_utm(deg(40.0), deg(-79.0)).value.unwrap();
        assert_eq!(point.zone, 18);
        assert!(point.easting < 500_000.0);

        let wrapped = UtmConverter::new(WGS84, 60).unwrap();
        assert_eq!(wrapped.geodetic_to_utm(deg(60.0), deg(-179.0)).value.unwrap().zone, 60);

        let far = UtmConverter::new(WGS84, 20).unwrap();
        assert_eq!(
            far.geodetic_to_utm(deg(40.0), deg(-79.0)).flags,
            UtmFlags::ZONE_OVERRIDE_ERROR
        );
    }

    #[test]
    fn test_zone_override_in_svalbard_band() {
        let western = UtmConverter::new(WGS84, 31).unwrap();
        let point = western.geodetic_to_utm(deg(78.0), deg(10.0)).value.unwrap();
        assert_eq!(point.zone, 31);
        assert!(point.easting > 500_000.0);

        let too_far = UtmConverter::new(WGS84, 36).unwrap();
        assert_eq!(
            too_far.geodetic_to_utm(deg(78.0), deg(10.0)).flags,
            UtmFlags::ZONE_OVERRIDE_ERROR
        );

        // two zones away is only allowed inside the band
        let south = UtmConverter::new(WGS84, 31).unwrap();
        assert_eq!(
            south.geodetic_to_utm(deg(60.0), deg(16.0)).flags,
            UtmFlags::ZONE_OVERRIDE_ERROR
        );
    }

    #[test]
    fn test_nan_semi_major_axis() {
        let flags = UtmConverter::new(Ellipsoid::new(f64::NAN, WGS84.f), 0).unwrap_err();
        assert_eq!(flags, UtmFlags::A_ERROR);
    }

    #[test]
    fn test_utm_to_geodetic_zone_17_origin() {
        let out = UtmConverter::default().utm_to_geodetic(17, Hemisphere::North, 500_000.0, 0.0);
        assert!(out.flags.is_empty());
        let point = out.value.unwrap();
        assert_abs_diff_eq!(point.latitude_degrees(), 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(point.longitude_degrees(), -81.0, epsilon = 1e-9);
    }

    #[test]
    fn test_utm_to_geodetic_errors() {
        let converter = UtmConverter::default();
        assert_eq!(
            converter.utm_to_geodetic(0, Hemisphere::North, 500_000.0, 0.0).flags,
            UtmFlags::ZONE_ERROR
        );
        assert_eq!(
            converter
                .utm_to_geodetic(61, Hemisphere::North, 500_000.0, -1.0)
                .flags,
            UtmFlags::ZONE_ERROR | UtmFlags::NORTHING_ERROR
        );
        // 9,900 km north is past 86 degrees
        assert_eq!(
            converter
                .utm_to_geodetic(31, Hemisphere::North, 500_000.0, 9_900_000.0)
                .flags,
            UtmFlags::NORTHING_ERROR
        );
    }

    #[test]
    fn test_easting_outside_zone_is_accepted_on_inverse() {
        let out = UtmConverter::default().utm_to_geodetic(31, Hemisphere::North, 950_000.0, 5_000_000.0);
        assert!(out.is_ok());
        assert!(out.value.unwrap().longitude_degrees() > 6.0);
    }

    #[test]
    fn test_round_trip_every_zone() {
        let converter = UtmConverter::default().with_cache(ZoneCache::new(8));
        for zone in 1..=60u8 {
            for hemisphere in [Hemisphere::North, Hemisphere::South] {
                let northing = match hemisphere {
                    Hemisphere::North => 4_500_000.0,
                    Hemisphere::South => 5_500_000.0,
                };
                let point = converter
                    .utm_to_geodetic(zone, hemisphere, 500_000.0, northing)
                    .value
                    .unwrap();
                assert_abs_diff_eq!(point.longitude, central_meridian(zone), epsilon = 1e-9);

                let back = converter
                    .geodetic_to_utm(point.latitude, point.longitude)
                    .value
                    .unwrap();
                assert_eq!(back.zone, zone);
                assert_eq!(back.hemisphere, hemisphere);
                assert_abs_diff_eq!(back.northing, northing, epsilon = 1e-3);
            }
        }
    }
}
