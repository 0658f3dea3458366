//! Core protocol enums used across the wire.
//!
//! Numeric values match the engine's C ABI, so conversions to and from raw
//! codes are explicit and total: an out-of-range code is `None`, never a
//! silently remapped variant.

use serde::{Deserialize, Serialize};

/// Physical device selector, one per glove.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    /// Left-hand glove
    Left,
    /// Right-hand glove
    Right,
}

impl DeviceType {
    /// Both devices, in wire order (left = 0, right = 1).
    pub const ALL: [DeviceType; 2] = [DeviceType::Left, DeviceType::Right];

    /// Numeric wire code for this device.
    pub fn code(self) -> u32 {
        match self {
            DeviceType::Left => 0,
            DeviceType::Right => 1,
        }
    }

    /// Decode a numeric wire code. Returns `None` for out-of-enum values.
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(DeviceType::Left),
            1 => Some(DeviceType::Right),
            _ => None,
        }
    }
}

impl std::fmt::Display for DeviceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceType::Left => write!(f, "left"),
            DeviceType::Right => write!(f, "right"),
        }
    }
}

/// Which world axis points up in every pose the engine produces or consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordUp {
    X,
    Y,
    Z,
}

impl CoordUp {
    /// Numeric wire code for this axis.
    pub fn code(self) -> u32 {
        match self {
            CoordUp::X => 0,
            CoordUp::Y => 1,
            CoordUp::Z => 2,
        }
    }

    /// Decode a numeric wire code. Returns `None` for out-of-enum values.
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(CoordUp::X),
            1 => Some(CoordUp::Y),
            2 => Some(CoordUp::Z),
            _ => None,
        }
    }
}

/// Handedness of the coordinate system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Handedness {
    /// Left-handed coordinate system
    Left,
    /// Right-handed coordinate system
    Right,
}

impl Handedness {
    /// Numeric wire code for this handedness.
    pub fn code(self) -> u32 {
        match self {
            Handedness::Left => 0,
            Handedness::Right => 1,
        }
    }

    /// Decode a numeric wire code. Returns `None` for out-of-enum values.
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Handedness::Left),
            1 => Some(Handedness::Right),
            _ => None,
        }
    }
}

/// Result codes reported by the engine.
///
/// The engine returns these as raw `u32` values on the wire to keep a known
/// data size; `NotImplemented` is reserved for operations a given engine
/// build does not support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorCode {
    Success,
    GenericError,
    InvalidArgument,
    Disconnected,
    FilesystemError,
    InvalidSession,
    NotImplemented,
}

impl ErrorCode {
    /// Numeric wire code for this result.
    pub fn code(self) -> u32 {
        match self {
            ErrorCode::Success => 0,
            ErrorCode::GenericError => 1,
            ErrorCode::InvalidArgument => 2,
            ErrorCode::Disconnected => 3,
            ErrorCode::FilesystemError => 4,
            ErrorCode::InvalidSession => 5,
            ErrorCode::NotImplemented => 100,
        }
    }

    /// Decode a numeric wire code. Returns `None` for out-of-enum values.
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(ErrorCode::Success),
            1 => Some(ErrorCode::GenericError),
            2 => Some(ErrorCode::InvalidArgument),
            3 => Some(ErrorCode::Disconnected),
            4 => Some(ErrorCode::FilesystemError),
            5 => Some(ErrorCode::InvalidSession),
            100 => Some(ErrorCode::NotImplemented),
            _ => None,
        }
    }

    /// Human-readable description, suitable for user-facing error output.
    pub fn description(self) -> &'static str {
        match self {
            ErrorCode::Success => "success",
            ErrorCode::GenericError => "an unspecified engine error occurred",
            ErrorCode::InvalidArgument => "an argument was out of range or not a valid enum value",
            ErrorCode::Disconnected => "the device is not reachable or timed out",
            ErrorCode::FilesystemError => "the engine failed to read or write profile storage",
            ErrorCode::InvalidSession => "the session handle is not valid (not initialized, shut down, or corrupted)",
            ErrorCode::NotImplemented => "the operation is not implemented by this engine",
        }
    }

    /// Description for an arbitrary raw code, including unknown ones.
    pub fn describe(code: u32) -> &'static str {
        match ErrorCode::from_code(code) {
            Some(c) => c.description(),
            None => "unknown error code",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_round_trip() {
        for code in [
            ErrorCode::Success,
            ErrorCode::GenericError,
            ErrorCode::InvalidArgument,
            ErrorCode::Disconnected,
            ErrorCode::FilesystemError,
            ErrorCode::InvalidSession,
            ErrorCode::NotImplemented,
        ] {
            assert_eq!(ErrorCode::from_code(code.code()), Some(code));
        }
    }

    #[test]
    fn out_of_enum_codes_are_rejected() {
        assert_eq!(ErrorCode::from_code(6), None);
        assert_eq!(ErrorCode::from_code(99), None);
        assert_eq!(CoordUp::from_code(3), None);
        assert_eq!(Handedness::from_code(2), None);
        assert_eq!(DeviceType::from_code(2), None);
    }

    #[test]
    fn not_implemented_keeps_reserved_code() {
        assert_eq!(ErrorCode::NotImplemented.code(), 100);
    }

    #[test]
    fn every_code_has_a_description() {
        assert_eq!(ErrorCode::describe(3), ErrorCode::Disconnected.description());
        assert_eq!(ErrorCode::describe(12345), "unknown error code");
    }
}
