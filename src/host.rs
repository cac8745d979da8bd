//! Interfaces the host platform provides to the bridge

use crate::control::{SourceRequestHandler, VolumeRequestHandler};
use crate::types::{SourceControlState, SourceStateUpdate, VolumeControlState, VolumeStateUpdate};

/// Receives human-readable status for the extension
pub trait StatusSink: Send + Sync {
    fn set_status(&self, message: &str, is_error: bool);
}

/// A control registered with the host
pub trait ControlHandle<U>: Send {
    /// Push a partial state change to the host
    fn update_state(&mut self, update: U);

    /// Unregister the control. Consumes the handle so it can only happen once.
    fn destroy(self: Box<Self>);
}

/// Handle to a registered volume control
pub type VolumeControlHandle = Box<dyn ControlHandle<VolumeStateUpdate>>;

/// Handle to a registered source control
pub type SourceControlHandle = Box<dyn ControlHandle<SourceStateUpdate>>;

/// Registers controls with the host
///
/// The host keeps the handler and calls it when the user acts on the control.
pub trait ControlSurface: Send + Sync {
    fn register_volume_device(
        &self,
        initial_state: VolumeControlState,
        handler: VolumeRequestHandler,
    ) -> VolumeControlHandle;

    fn register_source_device(
        &self,
        initial_state: SourceControlState,
        handler: SourceRequestHandler,
    ) -> SourceControlHandle;
}
