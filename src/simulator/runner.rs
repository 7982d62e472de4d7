//! Frame-synchronous tick loop
//!
//! Every interval tick drains all pending [`ControlEvent`]s into the
//! aggregator and then runs exactly one simulator tick, so writes always
//! land before the read of the same tick.

use chrono::Local;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::updater::TickOutcome;
use super::{Disabled, Enabled, Simulator};
use crate::input::{Control, ControlEvent};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickLoopStats {
    pub ticks: u64,
    pub events: u64,
    pub resets: u64,
    pub skipped: u64,
}

impl TickLoopStats {
    fn record(&mut self, outcome: TickOutcome) {
        self.ticks += 1;
        match outcome {
            TickOutcome::Reset => self.resets += 1,
            TickOutcome::PoseSkipped => self.skipped += 1,
            TickOutcome::Integrated => {}
        }
    }
}

/// Moves queued events into the aggregator
///
/// Draining stops right after a Reset press so the following tick reads
/// it, even when its release is already queued behind it. The rest is
/// picked up on the next tick.
///
/// Returns the number of events applied and whether all senders are gone.
pub fn drain_events(
    simulator: &mut Simulator<Enabled>,
    events: &mut mpsc::Receiver<ControlEvent>,
) -> (u64, bool) {
    let mut applied = 0;
    loop {
        match events.try_recv() {
            Ok(event) => {
                if let Err(e) = simulator.input_mut().apply(event) {
                    error!("Dropping event {:?}: {}", event, e);
                    continue;
                }
                applied += 1;

                if event == ControlEvent::pressed(Control::Reset) {
                    debug!("Reset pressed, holding remaining events for the next tick");
                    return (applied, false);
                }
            }
            Err(mpsc::error::TryRecvError::Empty) => return (applied, false),
            Err(mpsc::error::TryRecvError::Disconnected) => return (applied, true),
        }
    }
}

/// Runs ticks until `shutdown` is cancelled, then disables the simulator
pub async fn run_tick_loop(
    mut simulator: Simulator<Enabled>,
    mut events: mpsc::Receiver<ControlEvent>,
    tick_interval_ms: u64,
    shutdown: CancellationToken,
) -> (Simulator<Disabled>, TickLoopStats) {
    info!("Starting tick loop with {}ms interval", tick_interval_ms);

    let mut interval_timer =
        tokio::time::interval(tokio::time::Duration::from_millis(tick_interval_ms));
    interval_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    let mut totals = TickLoopStats::default();
    let mut window = TickLoopStats::default();
    let mut sources_gone = false;
    let mut last_stats_time = Local::now();
    let stats_interval = chrono::Duration::seconds(30);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("Shutdown requested, leaving tick loop");
                break;
            }
            _ = interval_timer.tick() => {}
        }

        let (applied, disconnected) = drain_events(&mut simulator, &mut events);
        if disconnected && !sources_gone {
            warn!("All input sources disconnected, holding last control values");
            sources_gone = true;
        }
        window.events += applied;

        let outcome = simulator.tick();
        window.record(outcome);
        debug!("Tick {} finished: {:?}", simulator.ticks(), outcome);

        let now = Local::now();
        if now - last_stats_time > stats_interval {
            let elapsed_seconds = (now - last_stats_time).num_seconds().max(1);
            info!(
                "Tick loop stats: {} ticks, {} events, {} resets, {} skipped in {} seconds ({:.1} ticks/sec)",
                window.ticks,
                window.events,
                window.resets,
                window.skipped,
                elapsed_seconds,
                window.ticks as f64 / elapsed_seconds as f64
            );

            totals.ticks += window.ticks;
            totals.events += window.events;
            totals.resets += window.resets;
            totals.skipped += window.skipped;
            window = TickLoopStats::default();
            last_stats_time = now;
        }
    }

    totals.ticks += window.ticks;
    totals.events += window.events;
    totals.resets += window.resets;
    totals.skipped += window.skipped;

    (simulator.disable(), totals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::device::DeviceKind;
    use crate::simulator::reference::FixedReference;
    use crate::simulator::sink::WatchDeviceSink;
    use crate::simulator::updater::UpdaterSettings;
    use glam::Vec2;

    fn enabled() -> Simulator<Enabled> {
        Simulator::create(
            UpdaterSettings::default(),
            Box::new(WatchDeviceSink::new()),
            Box::new(FixedReference::default()),
        )
        .enable()
    }

    #[test]
    fn drain_applies_every_queued_event() {
        let mut simulator = enabled();
        let (tx, mut rx) = mpsc::channel(8);
        tx.try_send(ControlEvent::axis(Control::LeftStick, Vec2::X)).unwrap();
        tx.try_send(ControlEvent::pressed(Control::ButtonA)).unwrap();
        tx.try_send(ControlEvent::canceled(Control::ButtonA)).unwrap();

        let (applied, disconnected) = drain_events(&mut simulator, &mut rx);

        assert_eq!(applied, 3);
        assert!(!disconnected);
        assert_eq!(simulator.input().sample().left_stick, Vec2::X);
        assert!(!simulator.input().sample().button_a);

        drop(tx);
        assert_eq!(drain_events(&mut simulator, &mut rx), (0, true));
    }

    #[test]
    fn reset_released_in_the_same_batch_still_reaches_a_tick() {
        let mut simulator = enabled();
        let (tx, mut rx) = mpsc::channel(8);
        simulator.input_mut().set_head_control(Vec2::X);
        simulator.tick();
        tx.try_send(ControlEvent::pressed(Control::Reset)).unwrap();
        tx.try_send(ControlEvent::canceled(Control::Reset)).unwrap();

        assert_eq!(drain_events(&mut simulator, &mut rx), (1, false));
        assert_eq!(simulator.tick(), TickOutcome::Reset);
        assert!(simulator.orientation(DeviceKind::Hmd).is_zero());

        assert_eq!(drain_events(&mut simulator, &mut rx), (1, false));
        assert!(!simulator.input().sample().reset_requested);
        assert_eq!(simulator.tick(), TickOutcome::Integrated);
        assert_eq!(simulator.orientation(DeviceKind::Hmd).yaw(), 1.0);
    }

    #[tokio::test(start_paused = true)]
    async fn loop_ticks_until_cancelled() {
        let simulator = enabled();
        let (tx, rx) = mpsc::channel(8);
        let shutdown = CancellationToken::new();

        tx.send(ControlEvent::axis(Control::HeadControl, Vec2::X))
            .await
            .unwrap();

        let task = tokio::spawn(run_tick_loop(simulator, rx, 10, shutdown.clone()));
        tokio::time::sleep(tokio::time::Duration::from_millis(45)).await;
        shutdown.cancel();

        let (simulator, stats) = task.await.unwrap();
        assert!(stats.ticks >= 4, "{stats:?}");
        assert_eq!(stats.events, 1);
        assert_eq!(
            simulator.orientation(DeviceKind::Hmd).yaw(),
            stats.ticks as f32
        );
        assert!(simulator.handle(DeviceKind::Hmd).is_none());
    }
}
