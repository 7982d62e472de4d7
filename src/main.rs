pub mod controller;
pub mod input;
pub mod persistence;
pub mod simulator;

use crate::controller::controller_handle::ControllerHandle;
use crate::persistence::config_store::ConfigStore;
use crate::persistence::SimulatorConfig;
use crate::simulator::device::DeviceKind;
use crate::simulator::orientation::quat_to_euler;
use crate::simulator::reference::{FixedReference, ReferencePose};
use crate::simulator::sink::{DeviceSnapshot, WatchDeviceSink};
use crate::simulator::{run_tick_loop, Simulator};
use color_eyre::Result;
use glam::Vec3;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let config = setup().await?;

    let shutdown = CancellationToken::new();
    spawn_ctrl_c_handler(shutdown.clone());

    // Sink first so the monitor can subscribe before the simulator owns it
    let sink = WatchDeviceSink::new();
    let monitor = spawn_state_monitor(
        [
            sink.subscribe(DeviceKind::Hmd),
            sink.subscribe(DeviceKind::LeftController),
            sink.subscribe(DeviceKind::RightController),
        ],
        shutdown.clone(),
    );

    let settings = config.updater_settings();
    let reference = FixedReference(ReferencePose::at(settings.origin));

    info!("Initializing simulator");
    let simulator = Simulator::create(settings, Box::new(sink), Box::new(reference)).enable();

    let (controller_handle, events) =
        ControllerHandle::spawn(Some(config.controller_settings()), shutdown.clone());
    if !controller_handle.has_gamepad_backend() {
        warn!("Running without gamepad input, only the console reset is available");
    }

    let (_simulator, stats) = run_tick_loop(
        simulator,
        events,
        config.simulator.tick_interval_ms,
        shutdown.clone(),
    )
    .await;
    info!(
        "Simulator stopped: {} ticks, {} events, {} resets",
        stats.ticks, stats.events, stats.resets
    );

    if let Err(e) = monitor.await {
        warn!("State monitor did not stop cleanly: {}", e);
    }
    if let Err(e) = controller_handle.join().await {
        warn!("Event sources did not stop cleanly: {}", e);
    }

    Ok(())
}

async fn setup() -> Result<SimulatorConfig> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;

    let store = ConfigStore::from_env();
    store.ensure_default_config().await?;
    let config = store.load().await?;

    setup_logging_env(config.log_level()?);
    info!("Loaded configuration from {}", store.path().display());
    Ok(config)
}

fn setup_logging_env(level: Level) {
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}

fn spawn_ctrl_c_handler(shutdown: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Ctrl-C received, shutting down"),
            Err(e) => warn!("Unable to listen for Ctrl-C: {}", e),
        }
        shutdown.cancel();
    });
}

// Periodic summary of what consumers of the sink currently see
fn spawn_state_monitor(
    receivers: [watch::Receiver<Option<DeviceSnapshot>>; 3],
    shutdown: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(5));

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = interval.tick() => {}
            }

            for receiver in &receivers {
                let Some(snapshot) = receiver.borrow().clone() else {
                    continue;
                };
                let angles: Vec3 = quat_to_euler(snapshot.state.rotation);
                info!(
                    "{}: pos {:.2} pitch {:.1} yaw {:.1} (tick {}, {})",
                    snapshot.state.kind,
                    snapshot.state.position,
                    angles.x,
                    angles.y,
                    snapshot.tick,
                    snapshot.published_at.format("%H:%M:%S%.3f")
                );
            }
        }
    })
}
