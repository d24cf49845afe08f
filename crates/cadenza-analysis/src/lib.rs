//! Track aggregation, arbitration, calibration, and the analysis engine
//!
//! The downstream half of the Cadenza pipeline: per-key evidence folds into
//! three track scores, arbitration labels each candidate, calibration remaps
//! raw confidences through a loaded artifact, and the engine assembles the
//! ranked, immutable report.

pub mod arbitration;
pub mod calibration;
pub mod context;
pub mod engine;
pub mod error;
pub mod report;
pub mod tracks;

pub use arbitration::*;
pub use calibration::*;
pub use context::*;
pub use engine::*;
pub use error::*;
pub use report::*;
pub use tracks::*;
