#![warn(clippy::unwrap_used)]

//! Cleanup of the stream reaches of a streamflow-routing (SFR) model.
//!
//! Flowline segments without elevation data or flagged by network thinning are removed,
//! followed by the reaches that are too short and the grid cells that lost their connection
//! to the river network.

pub type Result<T = ()> = std::result::Result<T, Error>;

pub mod attributefilter;
pub mod cleanup;
pub mod config;
pub mod connectivity;
mod error;
pub mod fieldmapping;
pub mod io;
pub mod lengthfilter;
pub mod records;

#[doc(inline)]
pub use cleanup::{CleanupInput, CleanupOutput, CleanupReport, CleanupWarning, ReachCleanup};
#[doc(inline)]
pub use config::{CleanupConfig, ConnectivityCheck, MalformedRecordPolicy, SetupConfig};
#[doc(inline)]
pub use error::Error;
#[doc(inline)]
pub use records::{CellId, CellRecord, MalformedRecord, ReachRecord, SegmentId, SegmentRecord};
