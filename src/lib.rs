//! Stream reach preprocessing for streamflow-routing (SFR) model setups.
//!
//! Re-exports the table and spatial reference support of [`geo`] and the reach cleanup of [`sfr`].

pub use geo;
pub use sfr;
