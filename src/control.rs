use crate::error::{BridgeError, Result};
use crate::types::{MuteMode, VolumeMode, VolumeValue};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Capacity of the control request channel
pub(crate) const REQUEST_CHANNEL_CAPACITY: usize = 32;

/// What the host asked a control to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RequestKind {
    SetVolume { mode: VolumeMode, value: VolumeValue },
    SetMute(MuteMode),
    ConvenienceSwitch,
    Standby,
}

/// A host request travelling to the dispatch loop
#[derive(Debug)]
pub(crate) struct ControlRequest {
    /// Registration epoch of the control that produced the request
    pub epoch: u64,
    pub kind: RequestKind,
    pub reply: oneshot::Sender<Result<()>>,
}

impl ControlRequest {
    /// Complete the request; the host may have stopped waiting
    pub fn complete(self, result: Result<()>) {
        let _ = self.reply.send(result);
    }
}

#[derive(Debug, Clone)]
struct RequestChannel {
    epoch: u64,
    tx: mpsc::Sender<ControlRequest>,
}

impl RequestChannel {
    async fn request(&self, kind: RequestKind) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(ControlRequest {
                epoch: self.epoch,
                kind,
                reply,
            })
            .await
            .map_err(|_| BridgeError::ChannelClosed)?;

        match timeout(REQUEST_TIMEOUT, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(BridgeError::ChannelClosed),
            Err(_) => Err(BridgeError::Timeout),
        }
    }
}

/// Handler the host calls for its volume control
///
/// Every call resolves once the bridge has issued the device command, not
/// when the amplifier finishes acting on it.
#[derive(Debug, Clone)]
pub struct VolumeRequestHandler {
    channel: RequestChannel,
}

impl VolumeRequestHandler {
    pub(crate) fn new(epoch: u64, tx: mpsc::Sender<ControlRequest>) -> Self {
        Self {
            channel: RequestChannel { epoch, tx },
        }
    }

    /// Change the volume. Only relative single steps (`1` / `-1`) are supported.
    pub async fn set_volume(&self, mode: VolumeMode, value: VolumeValue) -> Result<()> {
        self.channel
            .request(RequestKind::SetVolume { mode, value })
            .await
    }

    pub async fn set_mute(&self, mode: MuteMode) -> Result<()> {
        self.channel.request(RequestKind::SetMute(mode)).await
    }
}

/// Handler the host calls for its source control
#[derive(Debug, Clone)]
pub struct SourceRequestHandler {
    channel: RequestChannel,
}

impl SourceRequestHandler {
    pub(crate) fn new(epoch: u64, tx: mpsc::Sender<ControlRequest>) -> Self {
        Self {
            channel: RequestChannel { epoch, tx },
        }
    }

    /// Power on if needed and switch to the configured default source
    pub async fn convenience_switch(&self) -> Result<()> {
        self.channel.request(RequestKind::ConvenienceSwitch).await
    }

    /// Put the amplifier in standby
    pub async fn standby(&self) -> Result<()> {
        self.channel.request(RequestKind::Standby).await
    }
}
