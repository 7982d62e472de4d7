//! Input aggregation for the simulated XR rig
//!
//! Holds the latest value of every logical control. Event sources (the
//! gamepad collector, the console reset reader) write into the aggregator,
//! the tick reads a [`InputSample`] snapshot out of it.
//!
//! ```text
//! Event Source ──► ControlEvent ──► InputAggregator ──► InputSample
//!                  (typed ports)    (held values)       (per tick)
//! ```

pub mod aggregator;
pub mod control;

pub use aggregator::{InputAggregator, InputSample};
pub use control::{Control, ControlEvent, ControlKind, ControlValue, InputError};
