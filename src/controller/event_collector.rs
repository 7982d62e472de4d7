use gilrs::{Event, EventType, Gamepad, GamepadId, Gilrs};
use statum::{machine, state};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::bindings::InputBindings;
use crate::input::ControlEvent;

// Collector settings
#[derive(Clone, Debug, Default)]
pub struct CollectorSettings {
    /// Index into the connected gamepads; `None` picks the first one
    pub preferred_gamepad: Option<usize>,
}

// Collector errors
#[derive(Debug, thiserror::Error)]
pub enum CollectorError {
    #[error("Failed to initialize collector: {0}")]
    InitializationError(String),

    #[error("Failed to send event: {0}")]
    EventSendError(String),
}

#[state]
#[derive(Debug, Clone)]
pub enum CollectionState {
    Initializing,
    Collecting,
}

#[machine]
#[derive(Debug)]
pub struct EventCollector<S: CollectionState> {
    // Gilrs context
    gilrs: Gilrs,

    // Active gamepad, events from others are dropped
    active_gamepad: Option<GamepadId>,

    settings: CollectorSettings,

    // Physical to logical translation
    bindings: InputBindings,

    // Channel into the tick loop
    event_sender: mpsc::Sender<ControlEvent>,
}

impl<S: CollectionState> EventCollector<S> {
    pub fn settings(&self) -> &CollectorSettings {
        &self.settings
    }
}

impl EventCollector<Initializing> {
    pub fn create(
        settings: Option<CollectorSettings>,
        bindings: InputBindings,
        event_sender: mpsc::Sender<ControlEvent>,
    ) -> Result<Self, CollectorError> {
        let settings = settings.unwrap_or_default();
        debug!("Creating Event Collector with settings: {:?}", settings);

        info!("Initializing gilrs controller interface");
        let gilrs = match Gilrs::new() {
            Ok(g) => {
                info!("Successfully initialized gilrs");
                g
            }
            Err(e) => {
                error!("Failed to initialize gilrs: {}", e);
                return Err(CollectorError::InitializationError(e.to_string()));
            }
        };

        Ok(Self::new(gilrs, None, settings, bindings, event_sender))
    }

    // Pick the active gamepad and transition to Collecting
    pub fn initialize(mut self) -> EventCollector<Collecting> {
        let gamepads: Vec<(GamepadId, Gamepad<'_>)> = self.gilrs.gamepads().collect();

        if gamepads.is_empty() {
            warn!("No gamepad connected, waiting for one to appear");
        } else {
            info!("Found {} gamepads:", gamepads.len());
            for (idx, (id, gamepad)) in gamepads.iter().enumerate() {
                info!(
                    "  [{}] ID: {}, Name: {}, UUID: {:?}",
                    idx,
                    id,
                    gamepad.name(),
                    gamepad.uuid()
                );
            }

            let index = match self.settings.preferred_gamepad {
                Some(index) if index < gamepads.len() => index,
                Some(index) => {
                    warn!(
                        "Preferred gamepad {} not connected, falling back to the first one",
                        index
                    );
                    0
                }
                None => 0,
            };
            let (id, gamepad) = &gamepads[index];
            self.active_gamepad = Some(*id);
            info!("Selected gamepad: {} ({})", gamepad.name(), id);
        }

        info!("Event Collector initialized, transitioning to Collecting state");
        self.transition()
    }
}

impl EventCollector<Collecting> {
    // Translate and forward every pending gilrs event
    pub fn collect_pending(&mut self) -> Result<usize, CollectorError> {
        let mut forwarded = 0;

        while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
            match route_event(&mut self.active_gamepad, id, &event) {
                Routing::Skip => {
                    debug!("Skipping event from non-active gamepad: {:?}", id);
                    continue;
                }
                Routing::Selected => {
                    info!("Gamepad {} connected, selecting it", id);
                    continue;
                }
                Routing::Forward => {}
            }

            for control_event in self.convert_gilrs_event(event) {
                self.event_sender
                    .try_send(control_event)
                    .map_err(|e| CollectorError::EventSendError(e.to_string()))?;
                forwarded += 1;
            }
        }

        Ok(forwarded)
    }

    // Poll gilrs until cancelled; runs on a blocking thread
    pub fn run_collection_loop(&mut self, shutdown: CancellationToken) {
        info!("Starting Event Collector loop");

        while !shutdown.is_cancelled() {
            if let Err(e) = self.collect_pending() {
                error!("Error collecting events: {}", e);
                if self.event_sender.is_closed() {
                    warn!("Event receiver dropped, stopping collector");
                    break;
                }
            }

            std::thread::sleep(std::time::Duration::from_millis(1));
        }

        info!("Event Collector loop finished");
    }

    fn convert_gilrs_event(&mut self, event: EventType) -> Vec<ControlEvent> {
        let translated = match event {
            EventType::AxisChanged(axis, value, _) => self.bindings.translate_axis(axis, value),
            EventType::ButtonChanged(button, value, _) => {
                self.bindings.translate_button_value(button, value)
            }
            EventType::ButtonPressed(button, _) => {
                info!("Button pressed: {:?}", button);
                self.bindings.translate_button(button, true)
            }
            EventType::ButtonReleased(button, _) => {
                info!("Button released: {:?}", button);
                self.bindings.translate_button(button, false)
            }
            EventType::Disconnected => {
                warn!("Controller disconnected, releasing held controls");
                return self.bindings.release_all();
            }
            EventType::Connected => {
                info!("Controller reconnected");
                None
            }
            _ => {
                debug!("Unhandled event type: {:?}", event);
                None
            }
        };

        translated.into_iter().collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Routing {
    Forward,
    Skip,
    /// A pad was adopted through its `Connected` event
    Selected,
}

// Decide what to do with an event from gamepad `id`. Disconnecting the
// active pad frees the slot; with no active pad, the next pad that shows
// up is adopted.
fn route_event<Id>(active: &mut Option<Id>, id: Id, event: &EventType) -> Routing
where
    Id: Copy + PartialEq + std::fmt::Debug,
{
    match *active {
        Some(active_id) if id != active_id => Routing::Skip,
        Some(_) => {
            if *event == EventType::Disconnected {
                *active = None;
            }
            Routing::Forward
        }
        None => match event {
            EventType::Connected => {
                *active = Some(id);
                Routing::Selected
            }
            EventType::Disconnected => Routing::Forward,
            _ => {
                debug!("Adopting gamepad {:?} as active", id);
                *active = Some(id);
                Routing::Forward
            }
        },
    }
}

// Public interface for spawning the collector
pub struct CollectorHandle {
    task: tokio::task::JoinHandle<()>,
}

impl CollectorHandle {
    pub fn spawn(
        settings: Option<CollectorSettings>,
        bindings: InputBindings,
        event_sender: mpsc::Sender<ControlEvent>,
        shutdown: CancellationToken,
    ) -> Result<Self, CollectorError> {
        info!("Spawning Event Collector with settings: {:?}", settings);

        let collector = EventCollector::create(settings, bindings, event_sender)?;

        // gilrs polling blocks, keep it off the async workers
        let task = tokio::task::spawn_blocking(move || {
            let mut collecting = collector.initialize();
            collecting.run_collection_loop(shutdown);
        });

        info!("Event Collector successfully started");
        Ok(Self { task })
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
