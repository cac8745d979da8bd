use crate::events::{self, EventSender};
use crate::types::SourceCode;
use std::sync::Arc;

/// Explicit mute state the amplifier understands as "mute on"
pub const MUTE_ON: u8 = 2;

/// Explicit mute state the amplifier understands as "mute off"
pub const MUTE_OFF: u8 = 3;

/// Power state reported by the amplifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PowerState {
    On,
    Standby,
    #[default]
    Unknown,
}

/// Snapshot of the amplifier's properties
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceProperties {
    /// Last source value reported, e.g. `"01"`, `"Standby"` or `"Muted"`
    pub source: Option<String>,
    pub power: PowerState,
}

impl DeviceProperties {
    pub fn is_standby(&self) -> bool {
        self.power == PowerState::Standby || self.source.as_deref().is_some_and(events::is_standby)
    }

    pub fn is_muted(&self) -> bool {
        self.source.as_deref().is_some_and(events::is_muted)
    }

    pub fn is_source(&self, code: &SourceCode) -> bool {
        self.source.as_deref().map(str::trim) == Some(code.as_str())
    }
}

/// Connection to one physical amplifier
///
/// Implemented by the serial transport driver. Commands are fire-and-forget:
/// failures are the driver's to log, and the driver reports what actually
/// happened through the [`EventSender`] it was created with.
///
/// Commands must not block. Volume commands are issued while the pulse timer
/// is locked, so a command that waits on the transport also holds up the
/// pending `volume_stop`. Queue the write and return.
pub trait DeviceSession: Send + Sync {
    /// Open the transport and start talking to the amplifier
    fn connect(&self, transport_identifier: &str);

    /// Close the transport; no further events should be sent
    fn disconnect(&self);

    fn set_source(&self, code: &SourceCode);

    fn power_on(&self);

    fn power_off(&self);

    /// Mute with an explicit state ([`MUTE_ON`] / [`MUTE_OFF`]), or toggle when `None`
    fn mute(&self, state: Option<u8>);

    fn volume_up(&self);

    fn volume_down(&self);

    fn volume_stop(&self);

    fn set_speaker(&self, enabled: bool);

    /// Current properties, readable synchronously when `Connected` is delivered
    fn properties(&self) -> DeviceProperties;
}

/// Creates device sessions for the lifecycle manager
pub trait SessionFactory: Send + Sync {
    /// Create an unconnected session that reports through `events`
    fn create(&self, events: EventSender) -> Arc<dyn DeviceSession>;
}
