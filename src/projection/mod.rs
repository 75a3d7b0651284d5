//! Transverse Mercator and UTM coordinate conversion
//!
//! The numeric converters in [`tm`] and [`utm`] report problems as flag
//! sets and never panic. [`TmCoord`] and [`UtmCoord`] wrap them and turn
//! flags into [`crate::Error`] values.

pub mod ellipsoid;
pub mod flags;
pub mod tm;
pub mod tm_coord;
pub mod utm;
pub mod utm_coord;
pub mod datum;

pub use datum::Datum;
pub use ellipsoid::Ellipsoid;
pub use flags::{TmFlags, UtmFlags};
pub use tm::{Converted, TmParameters, TransverseMercator};
pub use tm_coord::TmCoord;
pub use utm::{UtmConverter, UtmPoint};
pub use utm_coord::UtmCoord;
