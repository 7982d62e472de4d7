//! Simulated XR rig: HMD plus two hand controllers driven by a gamepad
//!
//! [`Simulator`] ties the pieces together and owns their lifecycle:
//!
//! ```text
//!              enable()                         disable()
//! Disabled ────────────► Enabled ── tick() ──► ... ────────► Disabled
//!  (no devices)          (devices registered,            (devices released,
//!                         reset pass run)                 orientations kept)
//! ```
//!
//! Each tick reads the aggregator, runs the [`PoseUpdater`] and then pushes
//! all three device records to the [`DeviceSink`], so a consumer never sees
//! half a tick.

pub mod device;
pub mod orientation;
pub mod reference;
pub mod runner;
pub mod sink;
pub mod updater;

use statum::{machine, state};
use tracing::{debug, error, info, warn};

use crate::input::InputAggregator;
use device::{DeviceKind, DeviceState, PerDevice};
use orientation::EulerAccumulator;
use reference::ReferenceSource;
use sink::{DeviceHandle, DeviceSink};
use updater::{OrientationPhase, PoseUpdater, TickOutcome, UpdaterSettings};

pub use runner::{run_tick_loop, TickLoopStats};

#[state]
#[derive(Debug, Clone)]
pub enum SimulatorState {
    Disabled,
    Enabled,
}

#[machine]
pub struct Simulator<S: SimulatorState> {
    input: InputAggregator,
    updater: PoseUpdater,
    sink: Box<dyn DeviceSink>,
    reference: Box<dyn ReferenceSource>,
    handles: PerDevice<Option<DeviceHandle>>,
    ticks: u64,
}

// Available in both states
impl<S: SimulatorState> Simulator<S> {
    pub fn input(&self) -> &InputAggregator {
        &self.input
    }

    /// Write side of the aggregator, for event sources
    pub fn input_mut(&mut self) -> &mut InputAggregator {
        &mut self.input
    }

    pub fn orientation(&self, kind: DeviceKind) -> &EulerAccumulator {
        self.updater.orientation(kind)
    }

    pub fn device_state(&self, kind: DeviceKind) -> &DeviceState {
        self.updater.state(kind)
    }

    pub fn handle(&self, kind: DeviceKind) -> Option<DeviceHandle> {
        *self.handles.get(kind)
    }

    pub fn settings(&self) -> &UpdaterSettings {
        self.updater.settings()
    }

    pub fn phase(&self) -> OrientationPhase {
        self.updater.phase()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

impl Simulator<Disabled> {
    pub fn create(
        settings: UpdaterSettings,
        sink: Box<dyn DeviceSink>,
        reference: Box<dyn ReferenceSource>,
    ) -> Self {
        info!("Creating simulator with settings: {:?}", settings);

        Self::new(
            InputAggregator::new(),
            PoseUpdater::new(settings),
            sink,
            reference,
            PerDevice::default(), // handles
            0,                    // ticks
        )
    }

    /// Registers the devices and runs the initialization reset pass
    ///
    /// A device that fails to register is logged and stays without a
    /// handle; its records are computed but never pushed.
    pub fn enable(mut self) -> Simulator<Enabled> {
        info!("Enabling simulator");

        for kind in DeviceKind::ALL {
            let handle = match self.sink.register(kind) {
                Ok(handle) => {
                    debug!("{} registered with id {}", kind, handle.id());
                    Some(handle)
                }
                Err(e) => {
                    error!("Failed to register {}: {}", kind, e);
                    None
                }
            };
            *self.handles.get_mut(kind) = handle;
        }

        let reference = self.reference.reference_pose();
        if reference.is_none() && self.updater.settings().rotation_space.requires_reference() {
            warn!("No reference pose yet, pose updates are skipped until one arrives");
        }
        self.updater.initialize(reference);

        info!("Simulator enabled, transitioning to Enabled state");
        self.transition()
    }
}

impl Simulator<Enabled> {
    /// Runs one tick against the current aggregator values
    pub fn tick(&mut self) -> TickOutcome {
        let sample = self.input.snapshot();
        let reference = self.reference.reference_pose();

        let outcome = self.updater.tick(&sample, reference);
        self.ticks += 1;

        self.publish();
        outcome
    }

    /// Releases the device registrations
    ///
    /// Orientations and held input survive; the next `enable` runs a fresh
    /// reset pass.
    pub fn disable(mut self) -> Simulator<Disabled> {
        info!("Disabling simulator after {} ticks", self.ticks);

        for kind in DeviceKind::ALL {
            if let Some(handle) = self.handles.get_mut(kind).take() {
                self.sink.unregister(handle);
            }
        }

        self.transition()
    }

    fn publish(&mut self) {
        for (kind, state) in self.updater.states().iter() {
            let Some(handle) = self.handles.get(kind) else {
                continue;
            };
            if !self.sink.is_valid(handle) {
                debug!("Skipping push for {}, handle no longer valid", kind);
                continue;
            }
            if let Err(e) = self.sink.push(handle, state) {
                error!("Failed to push {} state: {}", kind, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{Control, ControlEvent};
    use glam::{Vec2, Vec3};
    use reference::{FixedReference, ReferencePose};
    use sink::SinkError;
    use std::sync::{Arc, Mutex};

    /// Records every push, optionally refusing one device's registration
    #[derive(Default)]
    struct RecordingSink {
        pushes: Arc<Mutex<Vec<DeviceState>>>,
        refuse: Option<DeviceKind>,
        registered: Vec<DeviceHandle>,
        next_id: u32,
    }

    impl DeviceSink for RecordingSink {
        fn register(&mut self, kind: DeviceKind) -> Result<DeviceHandle, SinkError> {
            if self.refuse == Some(kind) {
                return Err(SinkError::RegistrationFailed("refused".to_string()));
            }
            self.next_id += 1;
            let handle = DeviceHandle::new(kind, self.next_id);
            self.registered.push(handle);
            Ok(handle)
        }

        fn unregister(&mut self, handle: DeviceHandle) {
            self.registered.retain(|h| *h != handle);
        }

        fn is_valid(&self, handle: &DeviceHandle) -> bool {
            self.registered.contains(handle)
        }

        fn push(&mut self, _handle: &DeviceHandle, state: &DeviceState) -> Result<(), SinkError> {
            self.pushes.lock().unwrap().push(*state);
            Ok(())
        }
    }

    fn simulator(refuse: Option<DeviceKind>) -> (Simulator<Disabled>, Arc<Mutex<Vec<DeviceState>>>) {
        let sink = RecordingSink {
            refuse,
            ..RecordingSink::default()
        };
        let pushes = sink.pushes.clone();
        let simulator = Simulator::create(
            UpdaterSettings {
                hand_separation: 0.5,
                ..UpdaterSettings::default()
            },
            Box::new(sink),
            Box::new(FixedReference(ReferencePose::at(Vec3::new(0.0, 1.0, 0.0)))),
        );
        (simulator, pushes)
    }

    #[test]
    fn tick_pushes_all_three_devices() {
        let (simulator, pushes) = simulator(None);
        let mut simulator = simulator.enable();

        simulator.tick();

        let pushed: Vec<_> = pushes.lock().unwrap().iter().map(|s| s.kind).collect();
        assert_eq!(pushed, DeviceKind::ALL.to_vec());
        assert_eq!(simulator.ticks(), 1);
    }

    #[test]
    fn enable_places_controllers_around_reference() {
        let (simulator, _) = simulator(None);
        let simulator = simulator.enable();

        assert_eq!(
            simulator.device_state(DeviceKind::LeftController).position,
            Vec3::new(-0.25, 1.0, 0.0)
        );
        assert_eq!(
            simulator.device_state(DeviceKind::RightController).position,
            Vec3::new(0.25, 1.0, 0.0)
        );
    }

    #[test]
    fn failed_registration_only_silences_that_device() {
        let (simulator, pushes) = simulator(Some(DeviceKind::RightController));
        let mut simulator = simulator.enable();
        assert!(simulator.handle(DeviceKind::RightController).is_none());

        simulator
            .input_mut()
            .apply(ControlEvent::axis(Control::RightStick, Vec2::X))
            .unwrap();
        simulator.tick();
        simulator.tick();

        let pushed = pushes.lock().unwrap();
        assert_eq!(pushed.len(), 4);
        assert!(pushed.iter().all(|s| s.kind != DeviceKind::RightController));
        // still simulated, just not published
        assert_eq!(simulator.orientation(DeviceKind::RightController).yaw(), 2.0);
    }

    #[test]
    fn events_apply_before_the_tick_reads_them() {
        let (simulator, _) = simulator(None);
        let mut simulator = simulator.enable();

        simulator
            .input_mut()
            .apply(ControlEvent::axis(Control::LeftStick, Vec2::new(1.0, 0.0)))
            .unwrap();
        simulator.tick();
        assert_eq!(simulator.orientation(DeviceKind::LeftController).yaw(), 1.0);

        simulator
            .input_mut()
            .apply(ControlEvent::canceled(Control::LeftStick))
            .unwrap();
        simulator.tick();
        assert_eq!(simulator.orientation(DeviceKind::LeftController).yaw(), 1.0);
    }

    #[test]
    fn reset_event_zeroes_every_orientation() {
        let (simulator, _) = simulator(None);
        let mut simulator = simulator.enable();
        let input = simulator.input_mut();
        input.set_left_stick(Vec2::ONE);
        input.set_right_stick(Vec2::NEG_ONE);
        input.set_head_control(Vec2::Y);
        for _ in 0..3 {
            simulator.tick();
        }

        simulator
            .input_mut()
            .apply(ControlEvent::pressed(Control::Reset))
            .unwrap();
        assert_eq!(simulator.tick(), TickOutcome::Reset);
        assert_eq!(simulator.phase(), OrientationPhase::ResetApplied);
        for kind in DeviceKind::ALL {
            assert!(simulator.orientation(kind).is_zero(), "{kind}");
        }
    }

    #[test]
    fn disable_keeps_orientations_and_reenable_resets_them() {
        let (simulator, pushes) = simulator(None);
        let mut simulator = simulator.enable();
        simulator.input_mut().set_head_control(Vec2::X);
        simulator.tick();

        let simulator = simulator.disable();
        assert!(simulator.handle(DeviceKind::Hmd).is_none());
        assert_eq!(simulator.orientation(DeviceKind::Hmd).yaw(), 1.0);

        let mut simulator = simulator.enable();
        assert!(simulator.orientation(DeviceKind::Hmd).is_zero());
        assert!(simulator.handle(DeviceKind::Hmd).is_some());

        pushes.lock().unwrap().clear();
        simulator.tick();
        assert_eq!(pushes.lock().unwrap().len(), 3);
    }
}
