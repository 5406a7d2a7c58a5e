mod mock;
mod sysfs;

use crate::{PwmError, PwmResult};
use std::fmt::{Debug, Display};
use std::str::FromStr;
pub use mock::*;
pub use sysfs::*;

/// A source of PWM channels, usually one PWM chip.
pub trait PwmProvider: Debug {
    /// Gets the amount of PWM channels on this chip.
    fn count(&self) -> PwmResult<usize>;

    /// Claims the PWM channel at the given index.
    ///
    /// # Errors
    /// - `PwmError::NotReady` if the channel cannot be claimed yet but might be later.
    /// - `PwmError::AlreadyInUse` if somebody else holds the channel.
    fn request(&self, index: usize) -> PwmResult<Box<dyn PwmChannel>>;
}

/// A claimed PWM channel.
pub trait PwmChannel: Debug + Send {
    /// Index of the channel on its chip.
    fn index(&self) -> usize;

    /// Reads back the current hardware configuration.
    fn state(&self) -> PwmResult<PwmState>;
    /// Configures period, duty and polarity as one request.
    ///
    /// Does not change whether the output is enabled.
    fn apply(&mut self, state: &PwmState) -> PwmResult<()>;

    fn is_enabled(&self) -> PwmResult<bool>;
    fn enable(&mut self) -> PwmResult<()>;
    fn disable(&mut self) -> PwmResult<()>;

    /// Gives the channel back to the provider.
    fn release(self: Box<Self>) -> PwmResult<()>;
}

/// Hardware configuration of a PWM channel, in nanoseconds.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct PwmState {
    pub period_ns: u64,
    pub duty_ns: u64,
    pub polarity: PwmPolarity,
}

impl Display for PwmState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "period {} ns, duty {} ns, polarity {}",
            self.period_ns, self.duty_ns, self.polarity
        )
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum PwmPolarity {
    #[default]
    Normal,
    Inversed,
}

impl FromStr for PwmPolarity {
    type Err = PwmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(PwmPolarity::Normal),
            "inversed" => Ok(PwmPolarity::Inversed),
            _ => Err(PwmError::Other("parsing PWM polarity failed".to_string())),
        }
    }
}

impl Display for PwmPolarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let str = match self {
            PwmPolarity::Normal => "normal",
            PwmPolarity::Inversed => "inversed",
        };
        write!(f, "{}", str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polarity_text() {
        assert_eq!("normal".parse::<PwmPolarity>(), Ok(PwmPolarity::Normal));
        assert_eq!("inversed".parse::<PwmPolarity>(), Ok(PwmPolarity::Inversed));
        assert!("reversed".parse::<PwmPolarity>().is_err());
        assert_eq!(PwmPolarity::Inversed.to_string(), "inversed");
    }

    #[test]
    fn test_state_display() {
        let state = PwmState {
            period_ns: 500_000_000,
            duty_ns: 62_500_000,
            polarity: PwmPolarity::Normal,
        };
        assert_eq!(
            state.to_string(),
            "period 500000000 ns, duty 62500000 ns, polarity normal"
        );
    }
}
