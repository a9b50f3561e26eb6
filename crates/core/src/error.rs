use crate::capture::CaptureError;

/// Result alias that carries the custom [`ToneLinkError`] type.
pub type Result<T> = std::result::Result<T, ToneLinkError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum ToneLinkError {
    /// Free-form message for conditions that do not warrant their own variant.
    #[error("{0}")]
    Message(String),
    /// A display, audio device, or signal file could not be acquired.
    #[error("setup failed: {0}")]
    Setup(String),
    /// The carrier basis or the application configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// A call into the host display/input subsystem failed.
    #[error("host input error: {0}")]
    Host(String),
    /// The capture device reported an unrecoverable error.
    #[error("capture device error: {0}")]
    Capture(String),
    /// Reading or writing the persisted signal file failed.
    #[error("signal file error: {0}")]
    Signal(#[from] hound::Error),
    /// A JSON configuration or report could not be (de)serialised.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl ToneLinkError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    pub fn setup<T: Into<String>>(msg: T) -> Self {
        Self::Setup(msg.into())
    }

    pub fn host<T: Into<String>>(msg: T) -> Self {
        Self::Host(msg.into())
    }
}

impl From<&str> for ToneLinkError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for ToneLinkError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}

impl From<CaptureError> for ToneLinkError {
    fn from(value: CaptureError) -> Self {
        Self::Capture(value.to_string())
    }
}
