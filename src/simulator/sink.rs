//! Device sink - where finished device records go
//!
//! Stands in for the host's device registry. A device must be registered to
//! receive pushes; a push through a handle the sink no longer knows is an
//! error the caller logs and drops.

use chrono::{DateTime, Local};
use std::collections::HashMap;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::device::{DeviceKind, DeviceState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceHandle {
    kind: DeviceKind,
    id: u32,
}

impl DeviceHandle {
    pub fn new(kind: DeviceKind, id: u32) -> Self {
        Self { kind, id }
    }

    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    pub fn id(&self) -> u32 {
        self.id
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SinkError {
    #[error("Device already registered: {0}")]
    AlreadyRegistered(DeviceKind),

    #[error("Device registration failed: {0}")]
    RegistrationFailed(String),

    #[error("Unknown device handle {0:?}")]
    InvalidHandle(DeviceHandle),
}

pub trait DeviceSink: Send {
    fn register(&mut self, kind: DeviceKind) -> Result<DeviceHandle, SinkError>;

    fn unregister(&mut self, handle: DeviceHandle);

    fn is_valid(&self, handle: &DeviceHandle) -> bool;

    fn push(&mut self, handle: &DeviceHandle, state: &DeviceState) -> Result<(), SinkError>;
}

/// Published value of one device
#[derive(Debug, Clone)]
pub struct DeviceSnapshot {
    pub state: DeviceState,
    /// Number of pushes this device has received since registration
    pub tick: u64,
    pub published_at: DateTime<Local>,
}

struct DeviceChannel {
    sender: watch::Sender<Option<DeviceSnapshot>>,
    handle: Option<DeviceHandle>,
    pushes: u64,
}

/// Sink that publishes every device on its own watch channel
///
/// Subscribers see the latest snapshot only. Unregistering a device
/// publishes `None` so consumers can tell the device went away.
pub struct WatchDeviceSink {
    channels: HashMap<DeviceKind, DeviceChannel>,
    next_id: u32,
}

impl WatchDeviceSink {
    pub fn new() -> Self {
        let channels = DeviceKind::ALL
            .into_iter()
            .map(|kind| {
                let (sender, _) = watch::channel(None);
                (
                    kind,
                    DeviceChannel {
                        sender,
                        handle: None,
                        pushes: 0,
                    },
                )
            })
            .collect();

        Self {
            channels,
            next_id: 1,
        }
    }

    pub fn subscribe(&self, kind: DeviceKind) -> watch::Receiver<Option<DeviceSnapshot>> {
        debug!("New subscriber for {}", kind);
        // every kind gets a channel in new()
        self.channels[&kind].sender.subscribe()
    }
}

impl Default for WatchDeviceSink {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceSink for WatchDeviceSink {
    fn register(&mut self, kind: DeviceKind) -> Result<DeviceHandle, SinkError> {
        let channel = self
            .channels
            .get_mut(&kind)
            .ok_or_else(|| SinkError::RegistrationFailed(format!("no channel for {kind}")))?;

        if channel.handle.is_some() {
            return Err(SinkError::AlreadyRegistered(kind));
        }

        let handle = DeviceHandle::new(kind, self.next_id);
        self.next_id += 1;
        channel.handle = Some(handle);
        channel.pushes = 0;

        info!("Registered {} as device {}", kind, handle.id());
        Ok(handle)
    }

    fn unregister(&mut self, handle: DeviceHandle) {
        match self.channels.get_mut(&handle.kind()) {
            Some(channel) if channel.handle == Some(handle) => {
                channel.handle = None;
                channel.sender.send_replace(None);
                info!("Unregistered {} (device {})", handle.kind(), handle.id());
            }
            _ => warn!("Ignoring unregister of unknown handle {:?}", handle),
        }
    }

    fn is_valid(&self, handle: &DeviceHandle) -> bool {
        self.channels
            .get(&handle.kind())
            .is_some_and(|channel| channel.handle.as_ref() == Some(handle))
    }

    fn push(&mut self, handle: &DeviceHandle, state: &DeviceState) -> Result<(), SinkError> {
        let channel = match self.channels.get_mut(&handle.kind()) {
            Some(channel) if channel.handle.as_ref() == Some(handle) => channel,
            _ => return Err(SinkError::InvalidHandle(*handle)),
        };

        channel.pushes += 1;
        // send_replace keeps the value even while nobody is subscribed
        channel.sender.send_replace(Some(DeviceSnapshot {
            state: *state,
            tick: channel.pushes,
            published_at: Local::now(),
        }));
        Ok(())
    }
}
