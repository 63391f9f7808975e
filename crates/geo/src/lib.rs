#![warn(clippy::unwrap_used)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub type Result<T = ()> = std::result::Result<T, Error>;
pub mod crs;
mod error;
pub mod srs;
pub mod vector;

#[doc(inline)]
pub use error::Error;
#[doc(inline)]
pub use srs::LengthUnit;
#[cfg(feature = "proj4rs")]
#[doc(inline)]
pub use srs::SpatialReference;

pub type Point<T = f64> = geo_types::Point<T>;
