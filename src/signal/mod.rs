//! Signal-domain stages: validated matrices, confound regression,
//! motion scrubbing, and parcel aggregation.
//!
//! Each stage consumes immutable inputs and produces a fresh output;
//! nothing here mutates shared state, so stages compose freely across
//! confound-set variants.

mod matrix;
mod parcel;
mod regression;
mod scrub;

pub use matrix::{ConfoundMatrix, SignalMatrix};
pub use parcel::{aggregate_parcels, LabelAssignment, ParcelSignal};
pub use regression::{build_design, regress_confounds};
pub use scrub::{RetainMask, ScrubReport};
