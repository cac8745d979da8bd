//! Volume bridge: relative steps become timed pulse-and-stop commands

use crate::error::{BridgeError, Result};
use crate::host::VolumeControlHandle;
use crate::session::{DeviceSession, MUTE_OFF, MUTE_ON};
use crate::timer::DelayedCommand;
use crate::types::{MuteMode, VolumeDirection, VolumeMode, VolumeStateUpdate, VolumeValue};
use std::sync::Arc;
use std::time::Duration;

pub(crate) struct VolumeBridge {
    device: Arc<dyn DeviceSession>,
    handle: Option<VolumeControlHandle>,
    pulse: DelayedCommand<VolumeDirection>,
}

impl VolumeBridge {
    pub fn new(device: Arc<dyn DeviceSession>, handle: VolumeControlHandle) -> Self {
        Self {
            device,
            handle: Some(handle),
            pulse: DelayedCommand::new(),
        }
    }

    /// Start (or extend) a volume pulse lasting `step`
    ///
    /// A repeat in the same direction restarts the stop timer. A reversal
    /// stops the running pulse before starting the new one.
    pub fn set_volume(&self, mode: VolumeMode, value: VolumeValue, step: Duration) -> Result<()> {
        if mode != VolumeMode::Relative {
            return Err(BridgeError::UnsupportedRequest(
                "absolute volume is not supported".to_string(),
            ));
        }
        let direction = VolumeDirection::from_step(value).ok_or_else(|| {
            BridgeError::UnsupportedRequest(format!("relative volume step {}", value))
        })?;

        let device = Arc::clone(&self.device);
        let stop = Arc::clone(&self.device);
        self.pulse.restart(
            direction,
            step,
            |previous| {
                if previous.is_some_and(|p| p != direction) {
                    tracing::debug!("Volume pulse reversed, stopping {:?}", previous);
                    device.volume_stop();
                }
                match direction {
                    VolumeDirection::Up => device.volume_up(),
                    VolumeDirection::Down => device.volume_down(),
                }
            },
            move || stop.volume_stop(),
        );

        tracing::debug!("Volume pulse {:?} for {:?}", direction, step);
        Ok(())
    }

    pub fn set_mute(&self, mode: MuteMode) {
        let state = match mode {
            MuteMode::On => Some(MUTE_ON),
            MuteMode::Off => Some(MUTE_OFF),
            MuteMode::Toggle => None,
        };
        self.device.mute(state);
    }

    pub fn on_volume(&mut self, value: VolumeValue) {
        if let Some(handle) = self.handle.as_mut() {
            handle.update_state(VolumeStateUpdate::volume(value));
        }
    }

    pub fn on_mute(&mut self, is_muted: bool) {
        if let Some(handle) = self.handle.as_mut() {
            handle.update_state(VolumeStateUpdate::muted(is_muted));
        }
    }

    /// Cancel any pending stop and unregister the control
    ///
    /// While the session stays live a running pulse is stopped right away,
    /// otherwise the amplifier would keep ramping with nobody left to stop it.
    pub fn teardown(&mut self, session_live: bool) {
        if let Some(direction) = self.pulse.cancel() {
            if session_live {
                tracing::debug!("Stopping {:?} pulse on teardown", direction);
                self.device.volume_stop();
            } else {
                tracing::debug!("Cancelled pending {:?} pulse", direction);
            }
        }
        if let Some(handle) = self.handle.take() {
            handle.destroy();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{Command, RecordingSession, RecordingSurface, SurfaceEvent};
    use crate::types::VolumeControlState;
    use tokio::time::sleep;

    const STEP: Duration = Duration::from_millis(50);

    fn bridge() -> (VolumeBridge, Arc<RecordingSession>, RecordingSurface) {
        let session = Arc::new(RecordingSession::default());
        let surface = RecordingSurface::default();
        let handle = surface.volume_handle(VolumeControlState::new(false));
        (VolumeBridge::new(session.clone(), handle), session, surface)
    }

    #[tokio::test(start_paused = true)]
    async fn single_step_pulses_then_stops() {
        let (bridge, session, _surface) = bridge();

        bridge.set_volume(VolumeMode::Relative, 1, STEP).unwrap();
        assert_eq!(session.commands(), vec![Command::VolumeUp]);

        sleep(Duration::from_millis(60)).await;
        assert_eq!(session.commands(), vec![Command::VolumeUp, Command::VolumeStop]);
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_repeats_extend_to_a_single_stop() {
        let (bridge, session, _surface) = bridge();

        bridge.set_volume(VolumeMode::Relative, 1, STEP).unwrap();
        sleep(Duration::from_millis(30)).await;
        bridge.set_volume(VolumeMode::Relative, 1, STEP).unwrap();

        // the first deadline (50 ms) passes without a stop
        sleep(Duration::from_millis(30)).await;
        assert_eq!(session.count(&Command::VolumeStop), 0);

        sleep(Duration::from_millis(100)).await;
        assert_eq!(
            session.commands(),
            vec![Command::VolumeUp, Command::VolumeUp, Command::VolumeStop]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn reversal_stops_before_pulsing_the_other_way() {
        let (bridge, session, _surface) = bridge();

        bridge.set_volume(VolumeMode::Relative, 1, STEP).unwrap();
        sleep(Duration::from_millis(10)).await;
        bridge.set_volume(VolumeMode::Relative, -1, STEP).unwrap();
        assert_eq!(
            session.commands(),
            vec![Command::VolumeUp, Command::VolumeStop, Command::VolumeDown]
        );

        sleep(Duration::from_millis(100)).await;
        assert_eq!(session.count(&Command::VolumeStop), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn unsupported_requests_issue_nothing() {
        let (bridge, session, _surface) = bridge();

        assert!(matches!(
            bridge.set_volume(VolumeMode::Absolute, 40, STEP),
            Err(BridgeError::UnsupportedRequest(_))
        ));
        assert!(matches!(
            bridge.set_volume(VolumeMode::Relative, 3, STEP),
            Err(BridgeError::UnsupportedRequest(_))
        ));

        sleep(Duration::from_millis(100)).await;
        assert!(session.commands().is_empty());
    }

    #[tokio::test]
    async fn mute_modes_map_to_device_states() {
        let (bridge, session, _surface) = bridge();

        bridge.set_mute(MuteMode::On);
        bridge.set_mute(MuteMode::Off);
        bridge.set_mute(MuteMode::Toggle);

        assert_eq!(
            session.commands(),
            vec![
                Command::Mute(Some(MUTE_ON)),
                Command::Mute(Some(MUTE_OFF)),
                Command::Mute(None)
            ]
        );
    }

    #[tokio::test]
    async fn device_reports_update_the_control() {
        let (mut bridge, _session, surface) = bridge();

        bridge.on_volume(42);
        bridge.on_mute(true);

        assert_eq!(
            surface.events(),
            vec![
                SurfaceEvent::VolumeRegistered(VolumeControlState::new(false)),
                SurfaceEvent::VolumeUpdated(VolumeStateUpdate::volume(42)),
                SurfaceEvent::VolumeUpdated(VolumeStateUpdate::muted(true)),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_cancels_pulse_and_destroys_once() {
        let (mut bridge, session, surface) = bridge();

        bridge.set_volume(VolumeMode::Relative, -1, STEP).unwrap();
        bridge.teardown(false);
        bridge.teardown(false);
        bridge.on_volume(10);

        sleep(Duration::from_millis(100)).await;
        assert_eq!(session.commands(), vec![Command::VolumeDown]);
        assert_eq!(surface.count(&SurfaceEvent::VolumeDestroyed), 1);
        assert_eq!(surface.volume_updates(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_on_live_session_stops_running_pulse_once() {
        let (mut bridge, session, surface) = bridge();

        bridge.set_volume(VolumeMode::Relative, 1, STEP).unwrap();
        bridge.teardown(true);
        assert_eq!(session.commands(), vec![Command::VolumeUp, Command::VolumeStop]);

        bridge.teardown(true);
        sleep(Duration::from_millis(100)).await;
        assert_eq!(session.count(&Command::VolumeStop), 1);
        assert_eq!(surface.count(&SurfaceEvent::VolumeDestroyed), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_after_pulse_ended_sends_nothing() {
        let (mut bridge, session, _surface) = bridge();

        bridge.set_volume(VolumeMode::Relative, 1, STEP).unwrap();
        sleep(Duration::from_millis(60)).await;
        bridge.teardown(true);

        assert_eq!(session.commands(), vec![Command::VolumeUp, Command::VolumeStop]);
    }
}
