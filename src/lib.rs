//! utmkit - Transverse Mercator and UTM coordinate conversion
//!
//! utmkit converts geodetic positions to and from Transverse Mercator grids
//! and the Universal Transverse Mercator system, with batch conversion over
//! CSV files and an HTTP API.
//!
//! # Examples
//!
//! ## Geodetic to UTM
//!
//! ```
//! use utmkit::UtmCoord;
//!
//! let coord = UtmCoord::from_lat_lon(45f64.to_radians(), (-75f64).to_radians(), None)?;
//! assert_eq!(coord.zone, 18);
//! println!("{}", coord);
//! # Ok::<(), utmkit::Error>(())
//! ```
//!
//! ## Custom Transverse Mercator grid
//!
//! ```
//! use utmkit::{TransverseMercator, TmParameters, Ellipsoid};
//!
//! let params = TmParameters {
//!     central_meridian: 9f64.to_radians(),
//!     scale_factor: 1.0,
//!     ..TmParameters::default()
//! };
//! let converter = TransverseMercator::new(Ellipsoid::default(), params).unwrap();
//!
//! let converted = converter.geodetic_to_tm(0.8, 0.16);
//! if let Some(point) = converted.value {
//!     println!("{} {}", point.easting, point.northing);
//! }
//! ```
//!
//! ## Converter flags
//!
//! ```
//! use utmkit::{UtmConverter, UtmFlags};
//!
//! let converted = UtmConverter::default().geodetic_to_utm(1.6, 0.0);
//! assert!(converted.value.is_none());
//! assert!(converted.flags.contains(UtmFlags::LAT_ERROR));
//! ```

pub mod error;
pub mod types;
pub mod cache;
pub mod projection;
pub mod batch;
pub mod api;

pub use error::{Error, Result};
pub use types::{GeodeticPoint, Hemisphere, ProjectedPoint};
pub use cache::{ZoneCache, ZoneKey};
pub use projection::{
    Converted, Datum, Ellipsoid, TmCoord, TmFlags, TmParameters, TransverseMercator,
    UtmConverter, UtmCoord, UtmFlags, UtmPoint,
};
