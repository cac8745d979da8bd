//! Recording collaborators for unit tests

use crate::control::{SourceRequestHandler, VolumeRequestHandler};
use crate::events::EventSender;
use crate::host::{
    ControlHandle, ControlSurface, SourceControlHandle, StatusSink, VolumeControlHandle,
};
use crate::session::{DeviceProperties, DeviceSession, SessionFactory};
use crate::types::{
    SourceCode, SourceControlState, SourceStateUpdate, VolumeControlState, VolumeStateUpdate,
};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Connect(String),
    Disconnect,
    SetSource(String),
    PowerOn,
    PowerOff,
    Mute(Option<u8>),
    VolumeUp,
    VolumeDown,
    VolumeStop,
    SetSpeaker(bool),
}

#[derive(Default)]
pub struct RecordingSession {
    commands: Mutex<Vec<Command>>,
    properties: Mutex<DeviceProperties>,
}

impl RecordingSession {
    pub fn with_properties(properties: DeviceProperties) -> Self {
        Self {
            commands: Mutex::default(),
            properties: Mutex::new(properties),
        }
    }

    pub fn commands(&self) -> Vec<Command> {
        self.commands.lock().unwrap().clone()
    }

    pub fn count(&self, command: &Command) -> usize {
        self.commands.lock().unwrap().iter().filter(|c| *c == command).count()
    }

    pub fn clear(&self) {
        self.commands.lock().unwrap().clear();
    }

    fn record(&self, command: Command) {
        self.commands.lock().unwrap().push(command);
    }
}

impl DeviceSession for RecordingSession {
    fn connect(&self, transport_identifier: &str) {
        self.record(Command::Connect(transport_identifier.to_string()));
    }

    fn disconnect(&self) {
        self.record(Command::Disconnect);
    }

    fn set_source(&self, code: &SourceCode) {
        self.record(Command::SetSource(code.as_str().to_string()));
    }

    fn power_on(&self) {
        self.record(Command::PowerOn);
    }

    fn power_off(&self) {
        self.record(Command::PowerOff);
    }

    fn mute(&self, state: Option<u8>) {
        self.record(Command::Mute(state));
    }

    fn volume_up(&self) {
        self.record(Command::VolumeUp);
    }

    fn volume_down(&self) {
        self.record(Command::VolumeDown);
    }

    fn volume_stop(&self) {
        self.record(Command::VolumeStop);
    }

    fn set_speaker(&self, enabled: bool) {
        self.record(Command::SetSpeaker(enabled));
    }

    fn properties(&self) -> DeviceProperties {
        self.properties.lock().unwrap().clone()
    }
}

/// Factory that hands out recording sessions reporting `properties`
#[derive(Default)]
pub struct RecordingFactory {
    properties: Mutex<DeviceProperties>,
    created: Mutex<Vec<(Arc<RecordingSession>, EventSender)>>,
}

impl RecordingFactory {
    pub fn set_properties(&self, properties: DeviceProperties) {
        *self.properties.lock().unwrap() = properties;
    }

    pub fn created(&self) -> usize {
        self.created.lock().unwrap().len()
    }

    pub fn session(&self, index: usize) -> Arc<RecordingSession> {
        self.created.lock().unwrap()[index].0.clone()
    }

    pub fn sender(&self, index: usize) -> EventSender {
        self.created.lock().unwrap()[index].1.clone()
    }
}

impl SessionFactory for RecordingFactory {
    fn create(&self, events: EventSender) -> Arc<dyn DeviceSession> {
        let properties = self.properties.lock().unwrap().clone();
        let session = Arc::new(RecordingSession::with_properties(properties));
        self.created.lock().unwrap().push((session.clone(), events));
        session
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    VolumeRegistered(VolumeControlState),
    VolumeUpdated(VolumeStateUpdate),
    VolumeDestroyed,
    SourceRegistered(SourceControlState),
    SourceUpdated(SourceStateUpdate),
    SourceDestroyed,
}

#[derive(Clone, Default)]
pub struct RecordingSurface {
    events: Arc<Mutex<Vec<SurfaceEvent>>>,
}

impl RecordingSurface {
    pub fn events(&self) -> Vec<SurfaceEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, event: &SurfaceEvent) -> usize {
        self.events.lock().unwrap().iter().filter(|e| *e == event).count()
    }

    pub fn volume_updates(&self) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, SurfaceEvent::VolumeUpdated(_)))
            .count()
    }

    pub fn source_updates(&self) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, SurfaceEvent::SourceUpdated(_)))
            .count()
    }

    pub fn last_source_registration(&self) -> Option<SourceControlState> {
        self.events.lock().unwrap().iter().rev().find_map(|e| match e {
            SurfaceEvent::SourceRegistered(state) => Some(state.clone()),
            _ => None,
        })
    }

    pub fn volume_handle(&self, initial_state: VolumeControlState) -> VolumeControlHandle {
        self.push(SurfaceEvent::VolumeRegistered(initial_state));
        Box::new(RecordingHandle {
            events: self.events.clone(),
            updated: SurfaceEvent::VolumeUpdated,
            destroyed: SurfaceEvent::VolumeDestroyed,
        })
    }

    pub fn source_handle(&self, initial_state: SourceControlState) -> SourceControlHandle {
        self.push(SurfaceEvent::SourceRegistered(initial_state));
        Box::new(RecordingHandle {
            events: self.events.clone(),
            updated: SurfaceEvent::SourceUpdated,
            destroyed: SurfaceEvent::SourceDestroyed,
        })
    }

    fn push(&self, event: SurfaceEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl ControlSurface for RecordingSurface {
    fn register_volume_device(
        &self,
        initial_state: VolumeControlState,
        _handler: VolumeRequestHandler,
    ) -> VolumeControlHandle {
        self.volume_handle(initial_state)
    }

    fn register_source_device(
        &self,
        initial_state: SourceControlState,
        _handler: SourceRequestHandler,
    ) -> SourceControlHandle {
        self.source_handle(initial_state)
    }
}

struct RecordingHandle<U> {
    events: Arc<Mutex<Vec<SurfaceEvent>>>,
    updated: fn(U) -> SurfaceEvent,
    destroyed: SurfaceEvent,
}

impl<U: Send> ControlHandle<U> for RecordingHandle<U> {
    fn update_state(&mut self, update: U) {
        self.events.lock().unwrap().push((self.updated)(update));
    }

    fn destroy(self: Box<Self>) {
        let destroyed = self.destroyed;
        self.events.lock().unwrap().push(destroyed);
    }
}

#[derive(Default)]
pub struct RecordingStatus {
    statuses: Mutex<Vec<(String, bool)>>,
}

impl RecordingStatus {
    pub fn last(&self) -> Option<(String, bool)> {
        self.statuses.lock().unwrap().last().cloned()
    }
}

impl StatusSink for RecordingStatus {
    fn set_status(&self, message: &str, is_error: bool) {
        self.statuses
            .lock()
            .unwrap()
            .push((message.to_string(), is_error));
    }
}
