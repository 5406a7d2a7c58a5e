//! Named read/write endpoints over a [PwmController].

use crate::controller::PwmController;
use crate::{ControlError, ControlResult};
use log::{debug, warn};
use std::fmt::{Debug, Display, Formatter};
use std::num::IntErrorKind;
use std::str::FromStr;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Attribute {
    PwmChannel,
    DutyCycle,
    Hz,
    Enable,
}

impl Attribute {
    pub const ALL: [Attribute; 4] = [
        Attribute::PwmChannel,
        Attribute::DutyCycle,
        Attribute::Hz,
        Attribute::Enable,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Attribute::PwmChannel => "pwm_channel",
            Attribute::DutyCycle => "duty_cycle",
            Attribute::Hz => "hz",
            Attribute::Enable => "enable",
        }
    }
}

impl FromStr for Attribute {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Attribute::ALL
            .into_iter()
            .find(|attribute| attribute.name() == s)
            .ok_or_else(|| ControlError::UnknownAttribute(s.to_string()))
    }
}

impl Display for Attribute {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Access to attributes by name.
pub trait AttributeStore: Debug {
    /// Renders the attribute value, newline terminated.
    fn get(&self, name: &str) -> ControlResult<String>;
    /// Parses `value` and writes it to the attribute.
    fn set(&self, name: &str, value: &str) -> ControlResult<()>;
}

/// Parses the leading decimal integer of `input`, the way `%d` does.
///
/// Leading whitespace and trailing garbage are ignored. Magnitudes beyond `i64` saturate.
pub fn parse_integer(input: &str) -> ControlResult<i64> {
    let trimmed = input.trim_start();
    let sign_len = usize::from(trimmed.starts_with(['+', '-']));
    let digits = trimmed[sign_len..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    if digits == 0 {
        return Err(ControlError::InvalidValue(input.to_string()));
    }

    let number = &trimmed[..sign_len + digits];
    number.parse::<i64>().or_else(|err: std::num::ParseIntError| match err.kind() {
        IntErrorKind::PosOverflow => Ok(i64::MAX),
        IntErrorKind::NegOverflow => Ok(i64::MIN),
        _ => Err(ControlError::InvalidValue(input.to_string())),
    })
}

/// The four endpoints of one controller.
pub struct ControllerAttributes<'a> {
    controller: &'a PwmController,
}

impl<'a> ControllerAttributes<'a> {
    pub fn new(controller: &'a PwmController) -> Self {
        Self { controller }
    }

    pub fn show(&self, attribute: Attribute) -> String {
        let config = self.controller.read();
        debug!("{} show", attribute);
        match attribute {
            Attribute::PwmChannel => format!("{}\n", config.channel()),
            Attribute::DutyCycle => format!("{}\n", config.duty_level()),
            Attribute::Hz => format!("{}\n", config.frequency_hz()),
            Attribute::Enable => format!("{}\n", u8::from(config.enabled())),
        }
    }

    pub fn store(&self, attribute: Attribute, value: i64) -> ControlResult<()> {
        debug!("{} store {}", attribute, value);
        let result = match attribute {
            Attribute::PwmChannel => self.controller.set_channel(value),
            Attribute::DutyCycle => self.controller.set_duty_level(value),
            Attribute::Hz => self.controller.set_frequency(value),
            Attribute::Enable => self.controller.set_enable(value),
        };
        if let Err(err) = &result {
            warn!("Writing {} = {} failed: {}", attribute, value, err);
        }
        result
    }
}

impl Debug for ControllerAttributes<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "ControllerAttributes({:?})", self.controller)
    }
}

impl AttributeStore for ControllerAttributes<'_> {
    fn get(&self, name: &str) -> ControlResult<String> {
        Ok(self.show(name.parse()?))
    }

    fn set(&self, name: &str, value: &str) -> ControlResult<()> {
        let attribute: Attribute = name.parse()?;
        self.store(attribute, parse_integer(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ChannelSlots;
    use crate::controller::Configuration;
    use crate::pwm::MockPwmChip;

    #[test]
    fn test_attribute_names() {
        for attribute in Attribute::ALL {
            assert_eq!(attribute.name().parse::<Attribute>(), Ok(attribute));
        }
        assert_eq!(
            "period".parse::<Attribute>(),
            Err(ControlError::UnknownAttribute("period".to_string()))
        );
    }

    #[test]
    fn test_parse_integer() {
        assert_eq!(parse_integer("42"), Ok(42));
        assert_eq!(parse_integer("  7\n"), Ok(7));
        assert_eq!(parse_integer("-3"), Ok(-3));
        assert_eq!(parse_integer("+12abc"), Ok(12));
        assert_eq!(parse_integer("99999999999999999999999"), Ok(i64::MAX));
        assert_eq!(parse_integer("-99999999999999999999999"), Ok(i64::MIN));
        assert!(parse_integer("").is_err());
        assert!(parse_integer("abc").is_err());
        assert!(parse_integer("-").is_err());
    }

    #[test]
    fn test_get_and_set() {
        let chip = MockPwmChip::new(2);
        let controller = PwmController::new(Configuration::default(), ChannelSlots::acquire(&chip));
        let attributes = ControllerAttributes::new(&controller);

        assert_eq!(attributes.get("duty_cycle"), Ok("32\n".to_string()));
        assert_eq!(attributes.get("hz"), Ok("2\n".to_string()));
        assert_eq!(attributes.get("pwm_channel"), Ok("0\n".to_string()));

        attributes.set("hz", "1000\n").unwrap();
        attributes.set("duty_cycle", "128").unwrap();
        attributes.set("enable", "1").unwrap();
        assert_eq!(attributes.get("enable"), Ok("1\n".to_string()));
        let record = chip.record(0).unwrap();
        assert_eq!(record.state.period_ns, 1_000_000);
        assert_eq!(record.state.duty_ns, 500_000);
        assert!(record.enabled);

        attributes.set("enable", "0").unwrap();
        assert_eq!(attributes.get("enable"), Ok("0\n".to_string()));
    }

    #[test]
    fn test_set_rejects_garbage() {
        let chip = MockPwmChip::new(2);
        let controller = PwmController::new(Configuration::default(), ChannelSlots::acquire(&chip));
        let attributes = ControllerAttributes::new(&controller);

        assert!(matches!(
            attributes.set("hz", "fast"),
            Err(ControlError::InvalidValue(_))
        ));
        assert!(matches!(
            attributes.set("period", "5"),
            Err(ControlError::UnknownAttribute(_))
        ));
        assert_eq!(controller.read(), Configuration::default());
        assert_eq!(chip.record(0).unwrap().apply_count, 0);
    }
}
