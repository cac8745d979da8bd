use crate::error::{BridgeError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Display name of the registered volume control
pub const VOLUME_DISPLAY_NAME: &str = "Moon";

/// Display name of the registered source control
pub const SOURCE_DISPLAY_NAME: &str = "Moon Source Control";

/// Volume level as reported by the amplifier
pub type VolumeValue = i32;

/// Two-digit amplifier input code, e.g. `"01"`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SourceCode(String);

impl SourceCode {
    /// Parse and validate a source code
    pub fn parse(code: impl Into<String>) -> Result<Self> {
        let code = code.into();
        if code.len() == 2 && code.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(code))
        } else {
            Err(BridgeError::InvalidConfiguration(format!(
                "source code must be two digits, got {:?}",
                code
            )))
        }
    }

    /// The raw code sent to the amplifier
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Front-panel title of the input, if the code is a known one
    pub fn title(&self) -> Option<&'static str> {
        let title = match self.0.as_str() {
            "00" => "MP",
            "01" => "CD",
            "02" => "A1",
            "03" => "A2 / HT",
            "04" => "A3 / Phono",
            "05" => "Balanced",
            "06" => "D1",
            "07" => "D2",
            "08" => "D3",
            "09" => "D4",
            _ => return None,
        };
        Some(title)
    }
}

impl Default for SourceCode {
    fn default() -> Self {
        Self("01".to_string())
    }
}

impl fmt::Display for SourceCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.title() {
            Some(title) => write!(f, "{} ({})", self.0, title),
            None => f.write_str(&self.0),
        }
    }
}

impl FromStr for SourceCode {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SourceCode {
    type Error = BridgeError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}

impl From<SourceCode> for String {
    fn from(code: SourceCode) -> Self {
        code.0
    }
}

/// Speaker output setting applied after a convenience switch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeakerOutput {
    #[default]
    On,
    Off,
}

impl SpeakerOutput {
    pub fn is_enabled(self) -> bool {
        self == SpeakerOutput::On
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SpeakerOutput::On => "on",
            SpeakerOutput::Off => "off",
        }
    }
}

impl FromStr for SpeakerOutput {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "on" => Ok(SpeakerOutput::On),
            "off" => Ok(SpeakerOutput::Off),
            other => Err(BridgeError::InvalidConfiguration(format!(
                "speaker output must be \"on\" or \"off\", got {:?}",
                other
            ))),
        }
    }
}

/// Status of the source control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceStatus {
    Standby,
    Selected,
    Deselected,
}

/// Explicit operations the host can invoke on the source control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceOperation {
    ConvenienceSwitch,
    Standby,
}

/// Kind of volume control exposed to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeType {
    Incremental,
}

/// How the host expresses a volume change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeMode {
    Absolute,
    Relative,
}

/// Direction of a volume pulse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeDirection {
    Up,
    Down,
}

impl VolumeDirection {
    /// Map a relative step from the host to a pulse direction
    ///
    /// Only single steps are meaningful for the pulse protocol.
    pub fn from_step(step: VolumeValue) -> Option<Self> {
        match step {
            1 => Some(VolumeDirection::Up),
            -1 => Some(VolumeDirection::Down),
            _ => None,
        }
    }
}

/// Mute request from the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MuteMode {
    On,
    Off,
    Toggle,
}

/// Full state of the volume control at registration time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeControlState {
    pub display_name: String,
    pub volume_type: VolumeType,
    pub is_muted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_value: Option<VolumeValue>,
}

impl VolumeControlState {
    pub fn new(is_muted: bool) -> Self {
        Self {
            display_name: VOLUME_DISPLAY_NAME.to_string(),
            volume_type: VolumeType::Incremental,
            is_muted,
            volume_value: None,
        }
    }
}

/// Partial update pushed to a registered volume control
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VolumeStateUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_value: Option<VolumeValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_muted: Option<bool>,
}

impl VolumeStateUpdate {
    pub fn volume(value: VolumeValue) -> Self {
        Self {
            volume_value: Some(value),
            ..Self::default()
        }
    }

    pub fn muted(is_muted: bool) -> Self {
        Self {
            is_muted: Some(is_muted),
            ..Self::default()
        }
    }
}

/// Full state of the source control at registration time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceControlState {
    pub display_name: String,
    pub supports_standby: bool,
    pub status: SourceStatus,
}

impl SourceControlState {
    pub fn new(status: SourceStatus) -> Self {
        Self {
            display_name: SOURCE_DISPLAY_NAME.to_string(),
            supports_standby: true,
            status,
        }
    }
}

/// Partial update pushed to a registered source control
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceStateUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<SourceStatus>,
}

impl SourceStateUpdate {
    pub fn status(status: SourceStatus) -> Self {
        Self {
            status: Some(status),
        }
    }
}
