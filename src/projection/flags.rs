//! Status flag sets returned by the numeric converters
//!
//! Bit values match the GeoTrans reference codes so callers that store or
//! compare raw integers keep working.

use bitflags::bitflags;

bitflags! {
    /// Transverse Mercator status bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TmFlags: u32 {
        const LAT_ERROR = 0x0001;
        const LON_ERROR = 0x0002;
        const EASTING_ERROR = 0x0004;
        const NORTHING_ERROR = 0x0008;
        const ORIGIN_LAT_ERROR = 0x0010;
        const CENT_MER_ERROR = 0x0020;
        const A_ERROR = 0x0040;
        const INV_F_ERROR = 0x0080;
        const SCALE_FACTOR_ERROR = 0x0100;
        /// Longitude is more than 9 degrees from the central meridian.
        /// The result is still computed.
        const LON_WARNING = 0x0200;
    }
}

impl TmFlags {
    /// Every bit that aborts a conversion
    pub const ERRORS: TmFlags = TmFlags::all().difference(TmFlags::LON_WARNING);

    /// Returns true if any hard error bit is set
    pub fn is_error(&self) -> bool {
        self.intersects(Self::ERRORS)
    }

    /// Returns true if the longitude distortion warning is set
    pub fn is_warning(&self) -> bool {
        self.contains(Self::LON_WARNING)
    }

    /// Human readable list of the set bits
    pub fn describe(&self) -> String {
        describe(
            TM_MESSAGES
                .iter()
                .filter(|(flag, _)| self.contains(*flag))
                .map(|(_, name)| *name),
        )
    }
}

bitflags! {
    /// UTM status bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct UtmFlags: u32 {
        const LAT_ERROR = 0x0001;
        const LON_ERROR = 0x0002;
        const EASTING_ERROR = 0x0004;
        const NORTHING_ERROR = 0x0008;
        const ZONE_ERROR = 0x0010;
        const HEMISPHERE_ERROR = 0x0020;
        const ZONE_OVERRIDE_ERROR = 0x0040;
        const A_ERROR = 0x0080;
        const INV_F_ERROR = 0x0100;
        /// The underlying Transverse Mercator conversion failed
        const TM_ERROR = 0x0200;
    }
}

impl UtmFlags {
    /// Human readable list of the set bits
    pub fn describe(&self) -> String {
        describe(
            UTM_MESSAGES
                .iter()
                .filter(|(flag, _)| self.contains(*flag))
                .map(|(_, name)| *name),
        )
    }
}

const TM_MESSAGES: [(TmFlags, &str); 10] = [
    (TmFlags::LAT_ERROR, "latitude out of range"),
    (TmFlags::LON_ERROR, "longitude out of range"),
    (TmFlags::EASTING_ERROR, "easting out of range"),
    (TmFlags::NORTHING_ERROR, "northing out of range"),
    (TmFlags::ORIGIN_LAT_ERROR, "origin latitude out of range"),
    (TmFlags::CENT_MER_ERROR, "central meridian out of range"),
    (TmFlags::A_ERROR, "semi-major axis must be greater than zero"),
    (TmFlags::INV_F_ERROR, "inverse flattening out of range"),
    (TmFlags::SCALE_FACTOR_ERROR, "scale factor out of range"),
    (TmFlags::LON_WARNING, "longitude more than 9 degrees from central meridian"),
];

const UTM_MESSAGES: [(UtmFlags, &str); 10] = [
    (UtmFlags::LAT_ERROR, "latitude out of range"),
    (UtmFlags::LON_ERROR, "longitude out of range"),
    (UtmFlags::EASTING_ERROR, "easting out of range"),
    (UtmFlags::NORTHING_ERROR, "northing out of range"),
    (UtmFlags::ZONE_ERROR, "zone out of range"),
    (UtmFlags::HEMISPHERE_ERROR, "invalid hemisphere"),
    (UtmFlags::ZONE_OVERRIDE_ERROR, "zone override out of range"),
    (UtmFlags::A_ERROR, "semi-major axis must be greater than zero"),
    (UtmFlags::INV_F_ERROR, "inverse flattening out of range"),
    (UtmFlags::TM_ERROR, "transverse mercator conversion failed"),
];

fn describe<'a>(names: impl Iterator<Item = &'a str>) -> String {
    let names: Vec<&str> = names.collect();
    if names.is_empty() {
        "no error".to_string()
    } else {
        names.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tm_bit_values() {
        assert_eq!(TmFlags::LAT_ERROR.bits(), 0x0001);
        assert_eq!(TmFlags::NORTHING_ERROR.bits(), 0x0008);
        assert_eq!(TmFlags::A_ERROR.bits(), 0x0040);
        assert_eq!(TmFlags::INV_F_ERROR.bits(), 0x0080);
        assert_eq!(TmFlags::SCALE_FACTOR_ERROR.bits(), 0x0100);
        assert_eq!(TmFlags::LON_WARNING.bits(), 0x0200);
    }

    #[test]
    fn test_warning_is_not_error() {
        assert!(!TmFlags::LON_WARNING.is_error());
        assert!(TmFlags::LON_WARNING.is_warning());
        assert!((TmFlags::LON_WARNING | TmFlags::LAT_ERROR).is_error());
        assert!(!TmFlags::empty().is_error());
    }

    #[test]
    fn test_raw_bits_round_trip() {
        let flags = TmFlags::from_bits_truncate(0x0041);
        assert_eq!(flags, TmFlags::LAT_ERROR | TmFlags::A_ERROR);
    }

    #[test]
    fn test_describe() {
        assert_eq!(TmFlags::empty().describe(), "no error");
        assert_eq!(
            (UtmFlags::LAT_ERROR | UtmFlags::LON_ERROR).describe(),
            "latitude out of range, longitude out of range"
        );
    }
}
