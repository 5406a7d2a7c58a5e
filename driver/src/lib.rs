//! Controller for a dual-channel hardware PWM output.
//!
//! A [PwmController](controller::PwmController) owns the logical configuration
//! (channel, frequency, duty level, enable flag), validates every change and
//! applies it to the selected hardware channel under a single lock.
pub mod attr;
pub mod channel;
pub mod controller;
pub mod convert;
pub mod description;
pub mod device;
pub mod pwm;
pub mod validate;

use thiserror::Error;

/// Errors reported by a PWM hardware backend.
#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum PwmError {
    #[error("channel already in use")]
    AlreadyInUse,
    #[error("invalid argument")]
    InvalidArgument,
    /// The channel exists but cannot be used yet; acquisition may succeed later.
    #[error("channel not ready yet")]
    NotReady,
    #[error("IO error: {0}")]
    Io(std::io::ErrorKind),
    #[error("error: {0}")]
    Other(String),
}

impl From<std::io::Error> for PwmError {
    fn from(err: std::io::Error) -> Self {
        PwmError::Io(err.kind())
    }
}

pub type PwmResult<T> = Result<T, PwmError>;

/// Errors reported by the controller and the attribute layer on top of it.
#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum ControlError {
    #[error("invalid parameter: duty level {duty_level} (0-255), frequency {frequency_hz} Hz (1-1999999)")]
    InvalidParameter { duty_level: i64, frequency_hz: i64 },
    #[error("no PWM channel is available for the selected index")]
    HandleUnavailable,
    #[error("applying PWM state failed: {0}")]
    HardwareApplyFailed(PwmError),
    #[error("enabling PWM output failed: {0}")]
    HardwareEnableFailed(PwmError),
    #[error("unknown attribute {0:?}")]
    UnknownAttribute(String),
    #[error("invalid attribute value {0:?}")]
    InvalidValue(String),
}

pub type ControlResult<T> = Result<T, ControlError>;
