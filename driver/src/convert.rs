//! Conversion of frequency and duty level into hardware timing.

use crate::pwm::{PwmPolarity, PwmState};
use crate::validate::{MAX_DUTY_LEVEL, MAX_FREQUENCY_HZ};
use crate::{ControlError, ControlResult};

pub const NSEC_PER_SEC: u64 = 1_000_000_000;
/// Divisor of the duty level; a level of 256 would be the whole period.
pub const DUTY_SCALE: u64 = MAX_DUTY_LEVEL as u64 + 1;

/// Period and high time derived from a frequency and a duty level.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PwmTiming {
    pub period_ns: u64,
    pub duty_ns: u64,
}

impl PwmTiming {
    /// Hardware state with normal polarity.
    pub fn to_state(self) -> PwmState {
        PwmState {
            period_ns: self.period_ns,
            duty_ns: self.duty_ns,
            polarity: PwmPolarity::Normal,
        }
    }
}

/// Checks that `duty_level` is within `0..=255` and `frequency_hz` within `1..2_000_000`.
pub fn check(duty_level: i64, frequency_hz: i64) -> ControlResult<(u8, u32)> {
    let duty = u8::try_from(duty_level);
    let frequency = u32::try_from(frequency_hz)
        .ok()
        .filter(|hz| (1..MAX_FREQUENCY_HZ).contains(hz));

    match (duty, frequency) {
        (Ok(duty), Some(frequency)) => Ok((duty, frequency)),
        _ => Err(ControlError::InvalidParameter {
            duty_level,
            frequency_hz,
        }),
    }
}

/// Truncating conversion. A frequency of zero is treated as 1 Hz, like the clamp does.
pub fn convert(frequency_hz: u32, duty_level: u8) -> PwmTiming {
    let period_ns = NSEC_PER_SEC / u64::from(frequency_hz.max(1));
    let duty_ns = period_ns * u64::from(duty_level) / DUTY_SCALE;
    PwmTiming { period_ns, duty_ns }
}
