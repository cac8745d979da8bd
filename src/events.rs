use crate::error::{BridgeError, Result};
use crate::types::{SourceCode, VolumeValue};
use tokio::sync::mpsc;

/// Capacity of the device event channel
pub(crate) const EVENT_CHANNEL_CAPACITY: usize = 100;

/// Notification emitted by a device session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    /// The amplifier answered on the transport
    Connected,

    /// The transport was lost or could not be opened
    Disconnected,

    /// The amplifier reported a new volume level
    VolumeChanged(VolumeValue),

    /// The amplifier reported a new source value (which also carries mute state)
    SourceChanged(String),
}

/// A device event stamped with the session it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SessionEvent {
    pub generation: u64,
    pub event: DeviceEvent,
}

/// Sending half of the device event channel, handed to a device session
///
/// Each sender is bound to one session; once that session is replaced the
/// bridge drops whatever it still sends.
#[derive(Debug, Clone)]
pub struct EventSender {
    generation: u64,
    tx: mpsc::Sender<SessionEvent>,
}

impl EventSender {
    pub(crate) fn new(generation: u64, tx: mpsc::Sender<SessionEvent>) -> Self {
        Self { generation, tx }
    }

    /// Deliver an event, waiting for channel capacity
    pub async fn send(&self, event: DeviceEvent) -> Result<()> {
        self.tx
            .send(self.stamp(event))
            .await
            .map_err(|_| BridgeError::ChannelClosed)
    }

    /// Deliver an event from a blocking context such as a serial reader thread
    ///
    /// Panics if called from within an async execution context.
    pub fn blocking_send(&self, event: DeviceEvent) -> Result<()> {
        self.tx
            .blocking_send(self.stamp(event))
            .map_err(|_| BridgeError::ChannelClosed)
    }

    /// Deliver an event without waiting
    pub fn try_send(&self, event: DeviceEvent) -> Result<()> {
        self.tx.try_send(self.stamp(event)).map_err(|e| match e {
            mpsc::error::TrySendError::Full(dropped) => {
                tracing::warn!("Event channel full, dropping {:?}", dropped.event);
                BridgeError::ChannelFull
            }
            mpsc::error::TrySendError::Closed(_) => BridgeError::ChannelClosed,
        })
    }

    fn stamp(&self, event: DeviceEvent) -> SessionEvent {
        SessionEvent {
            generation: self.generation,
            event,
        }
    }
}

/// Meaning of a source value reported by the amplifier
///
/// The amplifier reports mute state on the source stream, so a single
/// source value can concern either control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceEvent {
    /// Mute state changed
    Mute(bool),

    /// The amplifier went to standby
    Standby,

    /// The configured default source is now playing
    Selected,

    /// Any other source value
    Other(String),
}

/// Classify a source value reported by the amplifier
pub fn classify_source_event(value: &str, default_source: &SourceCode) -> SourceEvent {
    let value = value.trim();
    if value.eq_ignore_ascii_case("muted") {
        SourceEvent::Mute(true)
    } else if value.eq_ignore_ascii_case("unmuted") {
        SourceEvent::Mute(false)
    } else if is_standby(value) {
        SourceEvent::Standby
    } else if value.eq_ignore_ascii_case("selected") || value == default_source.as_str() {
        SourceEvent::Selected
    } else {
        SourceEvent::Other(value.to_string())
    }
}

/// Whether a source value means the amplifier is in standby
pub(crate) fn is_standby(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("standby")
}

/// Whether a source value means the amplifier is muted
pub(crate) fn is_muted(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("muted")
}
