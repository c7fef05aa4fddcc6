//! Circuit subsystem: the component/wire graph and its electrical analysis.
//!
//! Provides:
//! - `model`: components, terminals, wires, and the spatial queries the
//!   interaction controller uses for hit-testing
//! - `analysis`: a pure snapshot analysis (current, power, topology) read
//!   by the rendering collaborator; never fed back into interaction logic

pub mod analysis;
pub mod model;
