//! Error types for the glove engine runtime.

use mg_protocol::{DeviceType, ErrorCode};
use thiserror::Error;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur talking to the glove engine.
///
/// Engine-reported codes are authoritative and are never masked: a wire
/// error decodes into the matching contract variant, or into
/// [`Error::Engine`] when the engine reports a code this client has no
/// dedicated variant for.
#[derive(Debug, Error)]
pub enum Error {
    /// Engine executable was not found.
    #[error("glove engine not found. Set MG_ENGINE_EXE or install the engine on PATH")]
    EngineNotFound,

    /// Failed to launch the engine process.
    #[error("failed to launch glove engine: {0}")]
    LaunchFailed(String),

    /// Failed to establish a connection with the engine.
    #[error("failed to connect to glove engine: {0}")]
    ConnectionFailed(String),

    /// Transport-level error (stdio framing).
    #[error("transport error: {0}")]
    TransportError(String),

    /// Protocol-level error (malformed or unexpected message).
    #[error("protocol error: {0}")]
    ProtocolError(String),

    /// Connection channel closed while a request was in flight.
    #[error("connection closed unexpectedly")]
    ChannelClosed,

    /// An argument was out of range or not a valid enum value.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Device unreachable, or no fresh sample arrived within the timeout.
    #[error("device disconnected{}", device.map(|d| format!(": {d}")).unwrap_or_default())]
    Disconnected {
        /// Which glove the operation addressed, when known.
        device: Option<DeviceType>,
    },

    /// Engine failed to read or write profile storage.
    #[error("profile storage error: {0}")]
    Filesystem(String),

    /// Session handle used before initialization or after shutdown.
    #[error("invalid session: the session is not initialized or was shut down")]
    InvalidSession,

    /// Operation not implemented by this engine build.
    #[error("not implemented by this engine")]
    NotImplemented,

    /// Engine-reported error with no dedicated variant.
    #[error("engine error {code}: {message}")]
    Engine {
        /// Raw wire code reported by the engine.
        code: u32,
        /// Engine-provided message.
        message: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Decode an engine-reported wire error into the matching variant.
    ///
    /// `device` provides context for disconnect errors on device-scoped
    /// operations.
    pub fn from_wire(code: u32, message: String, device: Option<DeviceType>) -> Error {
        match ErrorCode::from_code(code) {
            Some(ErrorCode::InvalidArgument) => Error::InvalidArgument(message),
            Some(ErrorCode::Disconnected) => Error::Disconnected { device },
            Some(ErrorCode::FilesystemError) => Error::Filesystem(message),
            Some(ErrorCode::InvalidSession) => Error::InvalidSession,
            Some(ErrorCode::NotImplemented) => Error::NotImplemented,
            _ => Error::Engine { code, message },
        }
    }

    /// The wire code this error maps onto.
    ///
    /// Infrastructure failures (launch, transport, protocol) collapse to
    /// [`ErrorCode::GenericError`]; contract variants keep their own code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Error::Disconnected { .. } => ErrorCode::Disconnected,
            Error::Filesystem(_) => ErrorCode::FilesystemError,
            Error::InvalidSession => ErrorCode::InvalidSession,
            Error::NotImplemented => ErrorCode::NotImplemented,
            Error::Engine { code, .. } => {
                ErrorCode::from_code(*code).unwrap_or(ErrorCode::GenericError)
            }
            _ => ErrorCode::GenericError,
        }
    }

    /// Human-readable description for the mapped wire code.
    pub fn description(&self) -> &'static str {
        self.code().description()
    }

    /// Attach device context to a disconnect error that lacks it.
    pub fn with_device(self, device: DeviceType) -> Error {
        match self {
            Error::Disconnected { device: None } => Error::Disconnected {
                device: Some(device),
            },
            other => other,
        }
    }

    /// Returns true if this is a disconnect/timeout error.
    pub fn is_disconnected(&self) -> bool {
        matches!(self, Error::Disconnected { .. })
    }

    /// Returns true if this is an invalid-session error.
    pub fn is_invalid_session(&self) -> bool {
        matches!(self, Error::InvalidSession)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_codes_decode_to_contract_variants() {
        assert!(matches!(
            Error::from_wire(2, "bad index".into(), None),
            Error::InvalidArgument(_)
        ));
        assert!(
            Error::from_wire(3, String::new(), Some(DeviceType::Right)).is_disconnected()
        );
        assert!(Error::from_wire(5, String::new(), None).is_invalid_session());
        assert!(matches!(
            Error::from_wire(100, String::new(), None),
            Error::NotImplemented
        ));
        // Unknown codes are preserved, not masked.
        match Error::from_wire(42, "vendor-specific".into(), None) {
            Error::Engine { code, message } => {
                assert_eq!(code, 42);
                assert_eq!(message, "vendor-specific");
            }
            other => panic!("expected Engine error, got: {other:?}"),
        }
    }

    #[test]
    fn infra_errors_collapse_to_generic_code() {
        assert_eq!(Error::EngineNotFound.code(), ErrorCode::GenericError);
        assert_eq!(
            Error::TransportError("broken pipe".into()).code(),
            ErrorCode::GenericError
        );
        assert_eq!(
            Error::Disconnected {
                device: Some(DeviceType::Left)
            }
            .code(),
            ErrorCode::Disconnected
        );
    }
}
