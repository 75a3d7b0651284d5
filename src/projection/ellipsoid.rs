use serde::{Deserialize, Serialize};

/// Reference ellipsoid, semi-major axis in meters and flattening
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ellipsoid {
    pub a: f64,
    pub f: f64,
}

/// World Geodetic System 1984
pub const WGS84: Ellipsoid = Ellipsoid::new(6_378_137.0, 1.0 / 298.257_223_563);

/// Clarke 1866, the NAD-27 ellipsoid
pub const CLARKE_1866: Ellipsoid = Ellipsoid::new(6_378_206.4, 1.0 / 294.978_698_2);

/// Geodetic Reference System 1980
pub const GRS80: Ellipsoid = Ellipsoid::new(6_378_137.0, 1.0 / 298.257_222_101);

impl Ellipsoid {
    pub const fn new(a: f64, f: f64) -> Self {
        Self { a, f }
    }

    pub fn inverse_flattening(&self) -> f64 {
        1.0 / self.f
    }

    /// Semi-minor axis in meters
    pub fn b(&self) -> f64 {
        self.a * (1.0 - self.f)
    }

    /// First eccentricity squared
    pub fn es(&self) -> f64 {
        2.0 * self.f - self.f * self.f
    }

    /// Second eccentricity squared
    pub fn ebs(&self) -> f64 {
        1.0 / (1.0 - self.es()) - 1.0
    }

    /// Third flattening, (a - b) / (a + b)
    pub fn n(&self) -> f64 {
        let b = self.b();
        (self.a - b) / (self.a + b)
    }

    /// Stable identity for hashing, built from the raw bits of a and f
    pub fn key(&self) -> (u64, u64) {
        (self.a.to_bits(), self.f.to_bits())
    }
}

impl Default for Ellipsoid {
    fn default() -> Self {
        WGS84
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_wgs84_derived() {
        assert_relative_eq!(WGS84.es(), 0.006_694_379_990_141_3, max_relative = 1e-12);
        assert_relative_eq!(WGS84.ebs(), 0.006_739_496_742_276_5, max_relative = 1e-10);
        assert_relative_eq!(WGS84.b(), 6_356_752.314_245, max_relative = 1e-12);
    }

    #[test]
    fn test_clarke_inverse_flattening() {
        assert_relative_eq!(CLARKE_1866.inverse_flattening(), 294.978_698_2, max_relative = 1e-12);
    }

    #[test]
    fn test_key_distinguishes_ellipsoids() {
        assert_ne!(WGS84.key(), GRS80.key());
        assert_eq!(WGS84.key(), Ellipsoid::default().key());
    }
}
