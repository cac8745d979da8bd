use thiserror::Error;

/// Result type for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Errors that can occur while bridging the amplifier to its control surfaces
#[derive(Error, Debug)]
pub enum BridgeError {
    /// No transport identifier is configured
    #[error("Not configured")]
    NotConfigured,

    /// A configuration field failed validation
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The control surface asked for something the amplifier cannot do
    #[error("Unsupported request: {0}")]
    UnsupportedRequest(String),

    /// A request arrived while the amplifier is not connected
    #[error("Device not connected")]
    NotConnected,

    /// A request arrived through a control that has since been torn down
    #[error("Control is no longer registered")]
    StaleControl,

    /// The dispatch loop is gone
    #[error("Channel closed")]
    ChannelClosed,

    /// Request timed out waiting for the dispatch loop
    #[error("Request timeout")]
    Timeout,

    /// The event channel has no spare capacity
    #[error("Channel full")]
    ChannelFull,

    /// The settings file holds malformed JSON or an invalid field
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Reading or writing the settings file failed (`JsonConfigStore`)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
