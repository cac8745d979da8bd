//! Bridge a serial-controlled Simaudio Moon amplifier to host control surfaces
//!
//! This library keeps a volume control and a source/power control in sync
//! with a single amplifier. It supports:
//!
//! - Connection lifecycle: session setup on start or serial port change, and
//!   teardown of both controls together when the amplifier goes away
//! - Relative volume emulated with timed volume-up/down pulses and a stop
//! - Explicit and toggled mute
//! - A convenience switch (power on, select the default input, enable the
//!   speaker output) and standby
//! - Reflecting amplifier-reported volume, mute, source and standby changes
//! - Status reporting and JSON settings persistence
//!
//! The serial driver and the host platform are collaborators: the driver
//! implements [`DeviceSession`] and [`SessionFactory`], the host implements
//! [`ControlSurface`] and [`StatusSink`].
//!
//! # Quick Start
//!
//! ```no_run
//! use moon_bridge::{Bridge, Collaborators, Configuration};
//!
//! # async fn run(collaborators: Collaborators) {
//! let config = Configuration::new("/dev/ttyUSB0");
//! let mut bridge = Bridge::start(config, collaborators);
//!
//! // The bridge now connects, registers the controls once the amplifier
//! // answers and serves host requests until stopped.
//! tokio::signal::ctrl_c().await.ok();
//! bridge.stop().await;
//! # }
//! ```
//!
//! # Architecture
//!
//! - **Service**: [`Bridge`], a single dispatch task that serialises device
//!   events, host requests and settings changes
//! - **Lifecycle**: owns the device session and the registered controls
//! - **Volume / Source**: the two bridges, with cancellable timers for the
//!   volume stop and the delayed speaker command
//! - **Events**: device event channel and source value classification
//! - **Config**: configuration record and its JSON store

mod config;
mod control;
mod error;
mod events;
mod host;
mod lifecycle;
#[cfg(test)]
mod mock;
mod service;
mod session;
mod source;
mod timer;
mod types;
mod volume;

// Public exports
pub use config::{ConfigStore, Configuration, JsonConfigStore, StoredConfiguration};
pub use control::{SourceRequestHandler, VolumeRequestHandler};
pub use error::{BridgeError, Result};
pub use events::{classify_source_event, DeviceEvent, EventSender, SourceEvent};
pub use host::{ControlHandle, ControlSurface, SourceControlHandle, StatusSink, VolumeControlHandle};
pub use lifecycle::Collaborators;
pub use service::Bridge;
pub use session::{DeviceProperties, DeviceSession, PowerState, SessionFactory, MUTE_OFF, MUTE_ON};
pub use source::{initial_status, next_status, SPEAKER_ENABLE_DELAY};
pub use types::{
    MuteMode, SourceCode, SourceControlState, SourceOperation, SourceStateUpdate, SourceStatus,
    SpeakerOutput, VolumeControlState, VolumeDirection, VolumeMode, VolumeStateUpdate, VolumeType,
    VolumeValue, SOURCE_DISPLAY_NAME, VOLUME_DISPLAY_NAME,
};
