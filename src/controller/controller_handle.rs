//! Controller Handle - starts the event sources feeding the simulator
//!
//! Spawns the gamepad collector and the console reset reader. Both write
//! into the same bounded channel that the tick loop drains.
//!
//! ```text
//! EventCollector (blocking thread) ─┐
//!                                   ├─[ControlEvent]→ tick loop
//! Console reset (tokio task) ───────┘  (mpsc::channel(1000))
//! ```

use gilrs::Button;
use tokio::sync::mpsc;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::bindings::InputBindings;
use super::console::{run_console_reset, spawn_stdin_reader, ConsoleSettings};
use super::event_collector::{CollectorHandle, CollectorSettings};
use crate::input::ControlEvent;

/// Buffer between event sources and the tick loop
pub const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Configuration for all event sources
#[derive(Clone, Debug)]
pub struct ControllerSettings {
    pub preferred_gamepad: Option<usize>,
    /// Console line that requests a reset
    pub reset_key: String,
    /// Bind the guide button to Reset
    pub guide_button_resets: bool,
    /// Tick interval, used as the hold time of a console reset
    pub tick_interval_ms: u64,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            preferred_gamepad: None,
            reset_key: "v".to_string(),
            guide_button_resets: false,
            tick_interval_ms: 11,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error("Event source task failed: {0}")]
    TaskError(String),
}

/// Running event sources
///
/// Holding the handle keeps nothing alive by itself; sources stop when the
/// shutdown token is cancelled or the receiver is dropped.
pub struct ControllerHandle {
    collector: Option<CollectorHandle>,
    console: tokio::task::JoinHandle<()>,
}

impl ControllerHandle {
    /// Spawns both event sources and returns the receiving end
    ///
    /// A gamepad backend that fails to start is logged and skipped; the
    /// console source keeps working on its own.
    pub fn spawn(
        settings: Option<ControllerSettings>,
        shutdown: CancellationToken,
    ) -> (Self, mpsc::Receiver<ControlEvent>) {
        info!("Initializing event sources with settings: {:?}", settings);
        let settings = settings.unwrap_or_default();

        let (event_sender, event_receiver) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        debug!(
            "Created event channel with buffer capacity {}",
            EVENT_CHANNEL_CAPACITY
        );

        let collector_settings = CollectorSettings {
            preferred_gamepad: settings.preferred_gamepad,
        };
        let mut bindings = InputBindings::default_layout();
        if settings.guide_button_resets {
            info!("Guide button bound to reset");
            bindings = bindings.with_reset_button(Button::Mode);
        }
        let collector = match CollectorHandle::spawn(
            Some(collector_settings),
            bindings,
            event_sender.clone(),
            shutdown.clone(),
        ) {
            Ok(handle) => Some(handle),
            Err(e) => {
                error!("Gamepad input unavailable: {}", e);
                None
            }
        };

        let console_settings = ConsoleSettings {
            reset_key: settings.reset_key.clone(),
            hold: Duration::from_millis(settings.tick_interval_ms.max(1)),
        };
        let console = tokio::spawn(run_console_reset(
            spawn_stdin_reader(),
            console_settings,
            event_sender,
            shutdown,
        ));

        info!("Event sources started");
        (Self { collector, console }, event_receiver)
    }

    pub fn has_gamepad_backend(&self) -> bool {
        self.collector
            .as_ref()
            .is_some_and(|collector| !collector.is_finished())
    }

    /// Waits for the console task after shutdown was requested
    pub async fn join(self) -> Result<(), ControllerError> {
        self.console
            .await
            .map_err(|e| ControllerError::TaskError(e.to_string()))
    }
}
