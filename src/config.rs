use crate::error::{BridgeError, Result};
use crate::types::{SourceCode, SpeakerOutput};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_VOLUME_STEP_MS: u64 = 50;

/// Bridge configuration
///
/// Replaced wholesale whenever settings are saved. Persisted through
/// [`StoredConfiguration`], which keeps every field as a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredConfiguration", into = "StoredConfiguration")]
pub struct Configuration {
    /// Serial port the amplifier is attached to; empty when unset
    pub transport_identifier: String,

    /// Input selected by the convenience switch
    pub default_source: SourceCode,

    /// How long a single volume pulse lasts before the stop command
    pub volume_step: Duration,

    /// Speaker output applied after the convenience switch
    pub speaker: SpeakerOutput,
}

impl Configuration {
    /// Create a configuration bound to a transport, with defaults for the rest
    pub fn new(transport_identifier: impl Into<String>) -> Self {
        Self {
            transport_identifier: transport_identifier.into(),
            ..Self::default()
        }
    }

    /// Whether a transport identifier is present
    pub fn is_configured(&self) -> bool {
        !self.transport_identifier.trim().is_empty()
    }

    /// Clear the transport identifier if it is not among `available`
    ///
    /// Returns `true` if the identifier was cleared.
    pub fn retain_transport<S: AsRef<str>>(&mut self, available: &[S]) -> bool {
        if !self.is_configured() {
            tracing::info!("No serial port configured");
            return false;
        }
        if available
            .iter()
            .any(|port| port.as_ref() == self.transport_identifier)
        {
            return false;
        }

        tracing::warn!(
            "Configured port {} no longer exists",
            self.transport_identifier
        );
        self.transport_identifier.clear();
        true
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            transport_identifier: String::new(),
            default_source: SourceCode::default(),
            volume_step: Duration::from_millis(DEFAULT_VOLUME_STEP_MS),
            speaker: SpeakerOutput::default(),
        }
    }
}

/// On-disk layout of the configuration record
///
/// Field names from earlier releases are accepted as aliases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredConfiguration {
    #[serde(default, alias = "serialport")]
    pub transport_identifier: String,

    #[serde(alias = "setsource")]
    pub default_source_code: String,

    #[serde(alias = "volumesteps")]
    pub volume_step_duration_ms: String,

    #[serde(alias = "setspeaker")]
    pub default_speaker_enabled: String,
}

impl TryFrom<StoredConfiguration> for Configuration {
    type Error = BridgeError;

    fn try_from(stored: StoredConfiguration) -> Result<Self> {
        let step_ms: u64 = stored.volume_step_duration_ms.trim().parse().map_err(|_| {
            BridgeError::InvalidConfiguration(format!(
                "volume step must be a whole number of milliseconds, got {:?}",
                stored.volume_step_duration_ms
            ))
        })?;

        Ok(Self {
            transport_identifier: stored.transport_identifier,
            default_source: SourceCode::parse(stored.default_source_code)?,
            volume_step: Duration::from_millis(step_ms),
            speaker: stored.default_speaker_enabled.parse()?,
        })
    }
}

impl From<Configuration> for StoredConfiguration {
    fn from(config: Configuration) -> Self {
        Self {
            transport_identifier: config.transport_identifier,
            default_source_code: config.default_source.into(),
            volume_step_duration_ms: config.volume_step.as_millis().to_string(),
            default_speaker_enabled: config.speaker.as_str().to_string(),
        }
    }
}

/// Persistence for the configuration record
pub trait ConfigStore: Send + Sync {
    /// Load the saved configuration, or `None` if nothing was saved yet
    fn load(&self) -> Result<Option<Configuration>>;

    /// Replace the saved configuration
    fn save(&self, config: &Configuration) -> Result<()>;
}

/// Configuration store backed by a single JSON file
#[derive(Debug, Clone)]
pub struct JsonConfigStore {
    path: PathBuf,
}

impl JsonConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigStore for JsonConfigStore {
    fn load(&self) -> Result<Option<Configuration>> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No saved settings at {}", self.path.display());
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let config: Configuration = serde_json::from_str(&text)?;
        tracing::debug!("Loaded settings from {}", self.path.display());
        Ok(Some(config))
    }

    fn save(&self, config: &Configuration) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(config)?;
        std::fs::write(&self.path, json)?;
        tracing::debug!("Saved settings to {}", self.path.display());
        Ok(())
    }
}
