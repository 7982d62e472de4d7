//! Event sources for the simulator
//!
//! 1. [`event_collector`] - gilrs gamepad polling
//! 2. [`bindings`] - physical element to logical control layout
//! 3. [`console`] - reset key from stdin
//! 4. [`controller_handle`] - spawns the sources and owns the channel
//!
//! # Architecture
//!
//! ```text
//! Gamepad ──► Collector ──► Bindings ──┐
//!                                      ├──► ControlEvent ──► tick loop
//! stdin ───► Console reset ────────────┘
//! ```

pub mod bindings;
pub mod console;
pub mod controller_handle;
pub mod event_collector;
