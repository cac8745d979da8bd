//! Source/power bridge: convenience switch and standby state machine

use crate::host::SourceControlHandle;
use crate::session::{DeviceProperties, DeviceSession};
use crate::timer::DelayedCommand;
use crate::types::{SourceCode, SourceOperation, SourceStatus, SourceStateUpdate, SpeakerOutput};
use std::sync::Arc;
use std::time::Duration;

/// Delay between selecting a source and switching the speaker output
pub const SPEAKER_ENABLE_DELAY: Duration = Duration::from_millis(150);

/// Status of the source control right after the amplifier connects
pub fn initial_status(properties: &DeviceProperties, default_source: &SourceCode) -> SourceStatus {
    if properties.is_standby() {
        SourceStatus::Standby
    } else if properties.is_source(default_source) {
        SourceStatus::Selected
    } else {
        SourceStatus::Deselected
    }
}

/// Status after an explicit operation
///
/// The convenience switch only changes the status when leaving standby; from
/// `Deselected` it issues the source command but waits for the amplifier to
/// report the default source before showing `Selected`.
pub fn next_status(current: SourceStatus, operation: SourceOperation) -> SourceStatus {
    match (current, operation) {
        (_, SourceOperation::Standby) => SourceStatus::Standby,
        (SourceStatus::Standby, SourceOperation::ConvenienceSwitch) => SourceStatus::Selected,
        (status, SourceOperation::ConvenienceSwitch) => status,
    }
}

pub(crate) struct SourceBridge {
    device: Arc<dyn DeviceSession>,
    handle: Option<SourceControlHandle>,
    status: SourceStatus,
    speaker: DelayedCommand<bool>,
}

impl SourceBridge {
    pub fn new(device: Arc<dyn DeviceSession>, handle: SourceControlHandle, status: SourceStatus) -> Self {
        Self {
            device,
            handle: Some(handle),
            status,
            speaker: DelayedCommand::new(),
        }
    }

    pub fn status(&self) -> SourceStatus {
        self.status
    }

    pub fn convenience_switch(&mut self, source: &SourceCode, speaker: SpeakerOutput) {
        if self.status == SourceStatus::Standby {
            tracing::info!("Powering on and selecting {}", source);
            self.device.power_on();
        } else {
            tracing::info!("Selecting {}", source);
        }
        self.set_status(next_status(self.status, SourceOperation::ConvenienceSwitch));
        self.device.set_source(source);

        let enabled = speaker.is_enabled();
        let device = Arc::clone(&self.device);
        self.speaker.restart(
            enabled,
            SPEAKER_ENABLE_DELAY,
            |_| {},
            move || device.set_speaker(enabled),
        );
    }

    pub fn standby(&mut self) {
        tracing::info!("Entering standby");
        if let Some(enabled) = self.speaker.cancel() {
            tracing::debug!("Dropped pending speaker {} command", enabled);
        }
        self.device.power_off();
        self.set_status(next_status(self.status, SourceOperation::Standby));
    }

    /// Status change reported by the amplifier itself
    pub fn on_device_status(&mut self, status: SourceStatus) {
        if self.status != status {
            tracing::debug!("Device reported source status {:?}", status);
            self.set_status(status);
        }
    }

    /// Cancel any pending speaker command and unregister the control
    pub fn teardown(&mut self) {
        self.speaker.cancel();
        if let Some(handle) = self.handle.take() {
            handle.destroy();
        }
    }

    fn set_status(&mut self, status: SourceStatus) {
        if self.status == status {
            return;
        }
        self.status = status;
        if let Some(handle) = self.handle.as_mut() {
            handle.update_state(SourceStateUpdate::status(status));
        }
    }
}
