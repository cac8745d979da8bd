//! Lifecycle manager: owns the device session and the controls bound to it

use crate::config::Configuration;
use crate::control::{ControlRequest, RequestKind, SourceRequestHandler, VolumeRequestHandler};
use crate::error::{BridgeError, Result};
use crate::events::{classify_source_event, DeviceEvent, EventSender, SessionEvent, SourceEvent};
use crate::host::{ControlSurface, StatusSink};
use crate::session::{DeviceSession, SessionFactory};
use crate::source::{self, SourceBridge};
use crate::types::{SourceControlState, SourceStatus, VolumeControlState};
use crate::volume::VolumeBridge;
use std::sync::Arc;
use tokio::sync::mpsc;

pub(crate) const STATUS_NOT_CONFIGURED: &str = "Not configured, please check settings.";
pub(crate) const STATUS_CONNECTED: &str = "Connected to Moon";

fn disconnected_status(transport_identifier: &str) -> String {
    format!("Could not connect to Moon on \"{}\"", transport_identifier)
}

/// External collaborators the bridge talks to
#[derive(Clone)]
pub struct Collaborators {
    pub factory: Arc<dyn SessionFactory>,
    pub surface: Arc<dyn ControlSurface>,
    pub status: Arc<dyn StatusSink>,
}

/// Controls registered while the amplifier is connected
///
/// Both bridges live and die together.
struct Controls {
    epoch: u64,
    volume: VolumeBridge,
    source: SourceBridge,
}

impl Controls {
    fn teardown(mut self, session_live: bool) {
        self.volume.teardown(session_live);
        self.source.teardown();
    }
}

struct LiveSession {
    generation: u64,
    device: Arc<dyn DeviceSession>,
}

pub(crate) struct LifecycleManager {
    config: Configuration,
    collaborators: Collaborators,
    events_tx: mpsc::Sender<SessionEvent>,
    requests_tx: mpsc::Sender<ControlRequest>,
    session: Option<LiveSession>,
    controls: Option<Controls>,
    generation: u64,
    epoch: u64,
}

impl LifecycleManager {
    pub fn new(
        config: Configuration,
        collaborators: Collaborators,
        events_tx: mpsc::Sender<SessionEvent>,
        requests_tx: mpsc::Sender<ControlRequest>,
    ) -> Self {
        Self {
            config,
            collaborators,
            events_tx,
            requests_tx,
            session: None,
            controls: None,
            generation: 0,
            epoch: 0,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.controls.is_some()
    }

    /// Tear down the current session and start a new one for `config`
    pub fn apply_configuration(&mut self, config: Configuration) -> Result<()> {
        self.teardown_session();
        self.config = config;

        if !self.config.is_configured() {
            tracing::warn!("No serial port configured");
            self.collaborators
                .status
                .set_status(STATUS_NOT_CONFIGURED, true);
            return Err(BridgeError::NotConfigured);
        }

        self.generation += 1;
        let events = EventSender::new(self.generation, self.events_tx.clone());
        let device = self.collaborators.factory.create(events);

        tracing::info!(
            "Connecting to Moon on {} (session {})",
            self.config.transport_identifier,
            self.generation
        );
        device.connect(&self.config.transport_identifier);

        self.session = Some(LiveSession {
            generation: self.generation,
            device,
        });
        Ok(())
    }

    /// Accept a saved configuration
    ///
    /// Only a new transport identifier forces a new session; anything else is
    /// picked up by the next request.
    pub fn update_configuration(&mut self, config: Configuration) -> Result<()> {
        if config.transport_identifier != self.config.transport_identifier || self.session.is_none() {
            return self.apply_configuration(config);
        }

        tracing::debug!("Settings updated without changing the serial port");
        self.config = config;
        Ok(())
    }

    pub fn handle_event(&mut self, event: SessionEvent) {
        let Some(device) = self.current_device(event.generation) else {
            tracing::debug!(
                "Dropping {:?} from stale session {}",
                event.event,
                event.generation
            );
            return;
        };

        match event.event {
            DeviceEvent::Connected => self.on_connected(device),
            DeviceEvent::Disconnected => self.on_disconnected(),
            DeviceEvent::VolumeChanged(value) => {
                tracing::debug!("Received volume change from device: {}", value);
                if let Some(controls) = self.controls.as_mut() {
                    controls.volume.on_volume(value);
                }
            }
            DeviceEvent::SourceChanged(value) => {
                tracing::debug!("Received source change from device: {}", value);
                self.on_source(&value);
            }
        }
    }

    pub fn handle_request(&mut self, request: ControlRequest) {
        let result = self.execute(request.epoch, request.kind);
        if let Err(e) = &result {
            tracing::warn!("Rejected {:?}: {}", request.kind, e);
        }
        request.complete(result);
    }

    /// Tear everything down before the bridge exits
    pub fn shutdown(&mut self) {
        tracing::info!("Shutting down (connected: {})", self.is_connected());
        self.teardown_session();
    }

    fn execute(&mut self, epoch: u64, kind: RequestKind) -> Result<()> {
        let controls = self.controls.as_mut().ok_or(BridgeError::NotConnected)?;
        if controls.epoch != epoch {
            return Err(BridgeError::StaleControl);
        }

        match kind {
            RequestKind::SetVolume { mode, value } => {
                controls.volume.set_volume(mode, value, self.config.volume_step)
            }
            RequestKind::SetMute(mode) => {
                controls.volume.set_mute(mode);
                Ok(())
            }
            RequestKind::ConvenienceSwitch => {
                controls
                    .source
                    .convenience_switch(&self.config.default_source, self.config.speaker);
                tracing::debug!("Source status now {:?}", controls.source.status());
                Ok(())
            }
            RequestKind::Standby => {
                controls.source.standby();
                Ok(())
            }
        }
    }

    fn current_device(&self, generation: u64) -> Option<Arc<dyn DeviceSession>> {
        self.session
            .as_ref()
            .filter(|session| session.generation == generation)
            .map(|session| Arc::clone(&session.device))
    }

    fn on_connected(&mut self, device: Arc<dyn DeviceSession>) {
        tracing::info!("Connected");
        self.collaborators.status.set_status(STATUS_CONNECTED, false);

        // a repeated connect replaces the controls rather than duplicating them
        self.teardown_controls(true);

        device.set_source(&self.config.default_source);
        let properties = device.properties();
        let status = source::initial_status(&properties, &self.config.default_source);

        self.epoch += 1;
        let volume_handle = self.collaborators.surface.register_volume_device(
            VolumeControlState::new(properties.is_muted()),
            VolumeRequestHandler::new(self.epoch, self.requests_tx.clone()),
        );
        let source_handle = self.collaborators.surface.register_source_device(
            SourceControlState::new(status),
            SourceRequestHandler::new(self.epoch, self.requests_tx.clone()),
        );

        tracing::debug!("Registered controls (epoch {}), source {:?}", self.epoch, status);
        self.controls = Some(Controls {
            epoch: self.epoch,
            volume: VolumeBridge::new(Arc::clone(&device), volume_handle),
            source: SourceBridge::new(device, source_handle, status),
        });
    }

    fn on_disconnected(&mut self) {
        tracing::info!("Disconnected");
        self.collaborators
            .status
            .set_status(&disconnected_status(&self.config.transport_identifier), true);
        // the driver may reconnect this same session on its own
        self.teardown_controls(true);
    }

    fn on_source(&mut self, value: &str) {
        let Some(controls) = self.controls.as_mut() else {
            return;
        };

        match classify_source_event(value, &self.config.default_source) {
            SourceEvent::Mute(muted) => controls.volume.on_mute(muted),
            SourceEvent::Standby => controls.source.on_device_status(SourceStatus::Standby),
            SourceEvent::Selected => controls.source.on_device_status(SourceStatus::Selected),
            SourceEvent::Other(other) => {
                tracing::debug!("Ignoring source value {}", other);
            }
        }
    }

    fn teardown_controls(&mut self, session_live: bool) {
        if let Some(controls) = self.controls.take() {
            tracing::debug!("Tearing down controls (epoch {})", controls.epoch);
            controls.teardown(session_live);
        }
    }

    fn teardown_session(&mut self) {
        self.teardown_controls(false);
        if let Some(session) = self.session.take() {
            tracing::info!("Stopping session {}", session.generation);
            session.device.disconnect();
        }
    }
}
