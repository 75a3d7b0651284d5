//! Transverse Mercator projection
//!
//! Series expansion after the NGA GeoTrans reference implementation. The
//! numeric layer never fails: every problem with the input is reported as a
//! bit in [`TmFlags`] and the caller decides what to do with it.

use std::f64::consts::PI;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::projection::ellipsoid::{Ellipsoid, WGS84};
use crate::projection::flags::TmFlags;
use crate::types::{GeodeticPoint, ProjectedPoint};

/// Largest accepted latitude, 89.99 degrees
pub const MAX_LAT: f64 = (PI * 89.99) / 180.0;

/// Largest accepted distance from the central meridian, 90 degrees
pub const MAX_DELTA_LONG: f64 = (PI * 90.0) / 180.0;

pub const MIN_SCALE_FACTOR: f64 = 0.3;
pub const MAX_SCALE_FACTOR: f64 = 3.0;

const MIN_INV_F: f64 = 250.0;
const MAX_INV_F: f64 = 350.0;

/// Distortion grows quickly past this distance from the central meridian
const LON_WARNING_LIMIT: f64 = (9.0 * PI) / 180.0;

/// Easting/northing envelope used until parameters are set
const DEFAULT_DELTA: f64 = 40_000_000.0;

/// Fixed footpoint refinement count. There is no convergence test, so
/// northings far outside the envelope may be under-refined.
const FOOTPOINT_ITERATIONS: usize = 5;

/// Projection parameters, angles in radians and offsets in meters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TmParameters {
    pub origin_latitude: f64,
    pub central_meridian: f64,
    pub false_easting: f64,
    pub false_northing: f64,
    pub scale_factor: f64,
}

impl TmParameters {
    /// Parameters with no offsets and unit scale around the given meridian
    pub fn unit(central_meridian: f64) -> Self {
        Self {
            origin_latitude: 0.0,
            central_meridian,
            false_easting: 0.0,
            false_northing: 0.0,
            scale_factor: 1.0,
        }
    }
}

impl Default for TmParameters {
    fn default() -> Self {
        Self {
            origin_latitude: 0.0,
            central_meridian: 0.0,
            false_easting: 500_000.0,
            false_northing: 0.0,
            scale_factor: 0.9996,
        }
    }
}

/// Outcome of a numeric conversion: the status bits and, unless an error
/// bit is set, the converted value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Converted<T, F = TmFlags> {
    pub value: Option<T>,
    pub flags: F,
}

impl<T, F> Converted<T, F> {
    pub(crate) fn rejected(flags: F) -> Self {
        Self { value: None, flags }
    }

    pub(crate) fn accepted(value: T, flags: F) -> Self {
        Self {
            value: Some(value),
            flags,
        }
    }

    /// True when a value was produced, with or without a warning
    pub fn is_ok(&self) -> bool {
        self.value.is_some()
    }

    /// The value, or the flags that prevented it
    pub fn into_result(self) -> std::result::Result<T, F> {
        match self.value {
            Some(value) => Ok(value),
            None => Err(self.flags),
        }
    }
}

/// Meridian arc series coefficients for one ellipsoid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeridianArc {
    pub ap: f64,
    pub bp: f64,
    pub cp: f64,
    pub dp: f64,
    pub ep: f64,
}

impl MeridianArc {
    pub fn new(ellipsoid: &Ellipsoid) -> Self {
        let a = ellipsoid.a;
        let tn = ellipsoid.n();
        let tn2 = tn * tn;
        let tn3 = tn2 * tn;
        let tn4 = tn3 * tn;
        let tn5 = tn4 * tn;

        Self {
            ap: a * (1.0 - tn + 5.0 * (tn2 - tn3) / 4.0 + 81.0 * (tn4 - tn5) / 64.0),
            bp: 3.0 * a * (tn - tn2 + 7.0 * (tn3 - tn4) / 8.0 + 55.0 * tn5 / 64.0) / 2.0,
            cp: 15.0 * a * (tn2 - tn3 + 3.0 * (tn4 - tn5) / 4.0) / 16.0,
            dp: 35.0 * a * (tn3 - tn4 + 11.0 * tn5 / 16.0) / 48.0,
            ep: 315.0 * a * (tn4 - tn5) / 512.0,
        }
    }

    /// True meridional distance from the equator to `latitude`
    pub fn distance(&self, latitude: f64) -> f64 {
        self.ap * latitude - self.bp * (2.0 * latitude).sin() + self.cp * (4.0 * latitude).sin()
            - self.dp * (6.0 * latitude).sin()
            + self.ep * (8.0 * latitude).sin()
    }
}

/// Transverse Mercator converter for one ellipsoid and parameter set
#[derive(Debug, Clone, PartialEq)]
pub struct TransverseMercator {
    ellipsoid: Ellipsoid,
    es: f64,
    ebs: f64,
    params: TmParameters,
    arc: MeridianArc,
    delta_easting: f64,
    delta_northing: f64,
}

impl Default for TransverseMercator {
    fn default() -> Self {
        Self {
            ellipsoid: WGS84,
            es: WGS84.es(),
            ebs: WGS84.ebs(),
            params: TmParameters::default(),
            arc: MeridianArc::new(&WGS84),
            delta_easting: DEFAULT_DELTA,
            delta_northing: DEFAULT_DELTA,
        }
    }
}

impl TransverseMercator {
    /// Builds a configured converter, or returns every parameter violation
    pub fn new(ellipsoid: Ellipsoid, params: TmParameters) -> std::result::Result<Self, TmFlags> {
        let mut converter = Self::default();
        let flags = converter.set_parameters(ellipsoid, params);
        if flags.is_empty() {
            Ok(converter)
        } else {
            Err(flags)
        }
    }

    /// Validates and applies ellipsoid and projection parameters.
    ///
    /// Returns the OR of every violated constraint. The converter is left
    /// untouched unless the result is empty.
    pub fn set_parameters(&mut self, ellipsoid: Ellipsoid, params: TmParameters) -> TmFlags {
        let flags = validate(&ellipsoid, &params);
        if !flags.is_empty() {
            return flags;
        }

        let mut next = Self {
            ellipsoid,
            es: ellipsoid.es(),
            ebs: ellipsoid.ebs(),
            params: TmParameters::unit(0.0),
            arc: MeridianArc::new(&ellipsoid),
            delta_easting: DEFAULT_DELTA,
            delta_northing: DEFAULT_DELTA,
        };

        next.delta_northing = next.project(MAX_LAT, MAX_DELTA_LONG).northing;
        next.delta_easting = next.project(0.0, MAX_DELTA_LONG).easting;

        let mut central_meridian = params.central_meridian;
        if central_meridian > PI {
            central_meridian -= 2.0 * PI;
        }
        next.params = TmParameters {
            central_meridian,
            ..params
        };

        debug!(
            "transverse mercator configured: a={} 1/f={:.6} cm={:.6} envelope=({:.1}, {:.1})",
            ellipsoid.a,
            ellipsoid.inverse_flattening(),
            central_meridian.to_degrees(),
            next.delta_easting,
            next.delta_northing
        );

        *self = next;
        flags
    }

    pub fn ellipsoid(&self) -> Ellipsoid {
        self.ellipsoid
    }

    pub fn parameters(&self) -> TmParameters {
        self.params
    }

    pub fn meridian_arc(&self) -> MeridianArc {
        self.arc
    }

    /// Accepted easting and northing distance around the false origin
    pub fn envelope(&self) -> (f64, f64) {
        (self.delta_easting, self.delta_northing)
    }

    /// Projects a geodetic position (radians) to easting/northing (meters)
    pub fn geodetic_to_tm(&self, latitude: f64, longitude: f64) -> Converted<ProjectedPoint> {
        let mut flags = TmFlags::empty();
        let origin_long = self.params.central_meridian;

        if !(-MAX_LAT..=MAX_LAT).contains(&latitude) {
            flags |= TmFlags::LAT_ERROR;
        }

        let mut longitude = longitude;
        if longitude > PI {
            longitude -= 2.0 * PI;
        }
        if !((origin_long - MAX_DELTA_LONG)..=(origin_long + MAX_DELTA_LONG)).contains(&longitude) {
            // retry on the 0..2PI circle before giving up
            let temp_long = if longitude < 0.0 { longitude + 2.0 * PI } else { longitude };
            let temp_origin = if origin_long < 0.0 { origin_long + 2.0 * PI } else { origin_long };
            if !((temp_origin - MAX_DELTA_LONG)..=(temp_origin + MAX_DELTA_LONG)).contains(&temp_long) {
                flags |= TmFlags::LON_ERROR;
            }
        }

        if flags.is_error() {
            return Converted::rejected(flags);
        }

        let mut dlam = longitude - origin_long;
        if dlam > PI {
            dlam -= 2.0 * PI;
        }
        if dlam < -PI {
            dlam += 2.0 * PI;
        }
        if dlam.abs() > LON_WARNING_LIMIT {
            flags |= TmFlags::LON_WARNING;
        }
        if dlam.abs() < 2.0e-10 {
            dlam = 0.0;
        }

        Converted::accepted(self.project(latitude, dlam), flags)
    }

    /// Converts easting/northing (meters) back to a geodetic position (radians)
    pub fn tm_to_geodetic(&self, easting: f64, northing: f64) -> Converted<GeodeticPoint> {
        let mut flags = TmFlags::empty();
        let p = &self.params;

        let easting_range =
            (p.false_easting - self.delta_easting)..=(p.false_easting + self.delta_easting);
        if !easting_range.contains(&easting) {
            flags |= TmFlags::EASTING_ERROR;
        }
        let northing_range =
            (p.false_northing - self.delta_northing)..=(p.false_northing + self.delta_northing);
        if !northing_range.contains(&northing) {
            flags |= TmFlags::NORTHING_ERROR;
        }

        if flags.is_error() {
            return Converted::rejected(flags);
        }

        let k = p.scale_factor;
        let tmdo = self.arc.distance(p.origin_latitude);
        let tmd = tmdo + (northing - p.false_northing) / k;

        let mut ftphi = tmd / self.meridian_radius(0.0);
        for _ in 0..FOOTPOINT_ITERATIONS {
            ftphi += (tmd - self.arc.distance(ftphi)) / self.meridian_radius(ftphi);
        }

        let sr = self.meridian_radius(ftphi);
        let sn = self.prime_vertical_radius(ftphi);

        let c = ftphi.cos();
        let t = ftphi.tan();
        let tan2 = t * t;
        let tan4 = tan2 * tan2;
        let tan6 = tan4 * tan2;
        let eta = self.ebs * c * c;
        let eta2 = eta * eta;
        let eta3 = eta2 * eta;
        let eta4 = eta3 * eta;

        let mut de = easting - p.false_easting;
        if de.abs() < 0.0001 {
            de = 0.0;
        }

        let t10 = t / (2.0 * sr * sn * k.powi(2));
        let t11 = t * (5.0 + 3.0 * tan2 + eta - 4.0 * eta2 - 9.0 * tan2 * eta)
            / (24.0 * sr * sn.powi(3) * k.powi(4));
        let t12 = t
            * (61.0 + 90.0 * tan2 + 46.0 * eta + 45.0 * tan4 - 252.0 * tan2 * eta - 3.0 * eta2
                + 100.0 * eta3
                - 66.0 * tan2 * eta2
                - 90.0 * tan4 * eta
                + 88.0 * eta4
                + 225.0 * tan4 * eta2
                + 84.0 * tan2 * eta3
                - 192.0 * tan2 * eta4)
            / (720.0 * sr * sn.powi(5) * k.powi(6));
        let t13 = t * (1385.0 + 3633.0 * tan2 + 4095.0 * tan4 + 1575.0 * tan6)
            / (40320.0 * sr * sn.powi(7) * k.powi(8));

        let mut latitude =
            ftphi - de.powi(2) * t10 + de.powi(4) * t11 - de.powi(6) * t12 + de.powi(8) * t13;

        let t14 = 1.0 / (sn * c * k);
        let t15 = (1.0 + 2.0 * tan2 + eta) / (6.0 * sn.powi(3) * c * k.powi(3));
        let t16 = (5.0 + 6.0 * eta + 28.0 * tan2 - 3.0 * eta2 + 8.0 * tan2 * eta + 24.0 * tan4
            - 4.0 * eta3
            + 4.0 * tan2 * eta2
            + 24.0 * tan2 * eta3)
            / (120.0 * sn.powi(5) * c * k.powi(5));
        let t17 = (61.0 + 662.0 * tan2 + 1320.0 * tan4 + 720.0 * tan6)
            / (5040.0 * sn.powi(7) * c * k.powi(7));

        let dlam = de * t14 - de.powi(3) * t15 + de.powi(5) * t16 - de.powi(7) * t17;
        let mut longitude = p.central_meridian + dlam;

        // fold results that ran over a pole back onto the globe
        while latitude > PI / 2.0 {
            latitude = PI - latitude;
            longitude += PI;
            if longitude > PI {
                longitude -= 2.0 * PI;
            }
        }
        while latitude < -PI / 2.0 {
            latitude = -(latitude + PI);
            longitude += PI;
            if longitude > PI {
                longitude -= 2.0 * PI;
            }
        }
        if longitude > PI {
            longitude -= 2.0 * PI;
        }
        if longitude < -PI {
            longitude += 2.0 * PI;
        }

        // the usable band narrows toward the poles
        if dlam.abs() > LON_WARNING_LIMIT * latitude.cos() {
            flags |= TmFlags::LON_WARNING;
        }

        Converted::accepted(GeodeticPoint::new(latitude, longitude), flags)
    }

    /// Forward series for an already validated latitude and longitude offset
    fn project(&self, latitude: f64, dlam: f64) -> ProjectedPoint {
        let p = &self.params;
        let k = p.scale_factor;

        let s = latitude.sin();
        let c = latitude.cos();
        let c2 = c * c;
        let c3 = c2 * c;
        let c5 = c3 * c2;
        let c7 = c5 * c2;
        let t = latitude.tan();
        let tan2 = t * t;
        let tan4 = tan2 * tan2;
        let tan6 = tan4 * tan2;
        let eta = self.ebs * c2;
        let eta2 = eta * eta;
        let eta3 = eta2 * eta;
        let eta4 = eta3 * eta;

        let sn = self.prime_vertical_radius(latitude);
        let tmd = self.arc.distance(latitude);
        let tmdo = self.arc.distance(p.origin_latitude);

        let t1 = (tmd - tmdo) * k;
        let t2 = sn * s * c * k / 2.0;
        let t3 = sn * s * c3 * k * (5.0 - tan2 + 9.0 * eta + 4.0 * eta2) / 24.0;
        let t4 = sn * s * c5 * k
            * (61.0 - 58.0 * tan2 + tan4 + 270.0 * eta - 330.0 * tan2 * eta + 445.0 * eta2
                + 324.0 * eta3
                - 680.0 * tan2 * eta2
                + 88.0 * eta4
                - 600.0 * tan2 * eta3
                - 192.0 * tan2 * eta4)
            / 720.0;
        let t5 = sn * s * c7 * k * (1385.0 - 3111.0 * tan2 + 543.0 * tan4 - tan6) / 40320.0;

        let northing = p.false_northing
            + t1
            + dlam.powi(2) * t2
            + dlam.powi(4) * t3
            + dlam.powi(6) * t4
            + dlam.powi(8) * t5;

        let t6 = sn * c * k;
        let t7 = sn * c3 * k * (1.0 - tan2 + eta) / 6.0;
        let t8 = sn * c5 * k
            * (5.0 - 18.0 * tan2 + tan4 + 14.0 * eta - 58.0 * tan2 * eta + 13.0 * eta2
                + 4.0 * eta3
                - 64.0 * tan2 * eta2
                - 24.0 * tan2 * eta3)
            / 120.0;
        let t9 = sn * c7 * k * (61.0 - 479.0 * tan2 + 179.0 * tan4 - tan6) / 5040.0;

        let easting = p.false_easting
            + dlam * t6
            + dlam.powi(3) * t7
            + dlam.powi(5) * t8
            + dlam.powi(7) * t9;

        ProjectedPoint::new(easting, northing)
    }

    /// Radius of curvature in the prime vertical
    fn prime_vertical_radius(&self, latitude: f64) -> f64 {
        self.ellipsoid.a / (1.0 - self.es * latitude.sin().powi(2)).sqrt()
    }

    /// Radius of curvature in the meridian
    fn meridian_radius(&self, latitude: f64) -> f64 {
        self.ellipsoid.a * (1.0 - self.es)
            / (1.0 - self.es * latitude.sin().powi(2)).sqrt().powi(3)
    }
}

fn validate(ellipsoid: &Ellipsoid, params: &TmParameters) -> TmFlags {
    let mut flags = TmFlags::empty();

    if ellipsoid.a.is_nan() || ellipsoid.a <= 0.0 {
        flags |= TmFlags::A_ERROR;
    }
    let inv_f = ellipsoid.inverse_flattening();
    if !(MIN_INV_F..=MAX_INV_F).contains(&inv_f) {
        flags |= TmFlags::INV_F_ERROR;
    }
    if !(-MAX_LAT..=MAX_LAT).contains(&params.origin_latitude) {
        flags |= TmFlags::ORIGIN_LAT_ERROR;
    }
    if !(-PI..=2.0 * PI).contains(&params.central_meridian) {
        flags |= TmFlags::CENT_MER_ERROR;
    }
    if !(MIN_SCALE_FACTOR..=MAX_SCALE_FACTOR).contains(&params.scale_factor) {
        flags |= TmFlags::SCALE_FACTOR_ERROR;
    }

    flags
}
