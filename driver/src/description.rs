//! Device description read at attach time, modelled on a device tree node.
//!
//! ```json
//! { "compatible": "dualpwm", "properties": { "pwm_channel": 0, "hz": 2, "duty_cycle": 32, "enable": 1 } }
//! ```

use crate::controller::Configuration;
use log::{error, info};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;

/// Value of `compatible` this driver binds to.
pub const COMPATIBLE: &str = "dualpwm";

pub const DEFAULT_PWM_CHANNEL: u32 = 0;
pub const DEFAULT_HZ: u32 = 2;
pub const DEFAULT_DUTY_CYCLE: u32 = 32;
pub const DEFAULT_ENABLE: u32 = 1;

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
pub struct DeviceDescription {
    #[serde(default)]
    pub compatible: Option<String>,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl DeviceDescription {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Loads the description at `path`; a missing file is an empty description.
    pub fn load(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!("No device description at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn is_compatible(&self) -> bool {
        self.compatible.as_deref().is_none_or(|c| c == COMPATIBLE)
    }

    /// Reads a property as an unsigned 32-bit integer.
    ///
    /// Returns `None` if it is missing or holds anything else.
    pub fn property_u32(&self, name: &str) -> Option<u32> {
        self.properties
            .get(name)?
            .as_u64()
            .and_then(|value| u32::try_from(value).ok())
    }

    /// Cells are signed, so `0xffffffff` reads as `-1`.
    fn property_or(&self, name: &str, default: u32) -> i64 {
        match self.property_u32(name) {
            Some(value) => {
                let value = value as i32;
                info!("{} = {}", name, value);
                value.into()
            }
            None => {
                error!("Failed to read device description: {}, using {}", name, default);
                default.into()
            }
        }
    }

    /// Initial configuration, with defaults for unreadable properties and every value clamped.
    pub fn resolve(&self) -> Configuration {
        Configuration::clamped(
            self.property_or("pwm_channel", DEFAULT_PWM_CHANNEL),
            self.property_or("hz", DEFAULT_HZ),
            self.property_or("duty_cycle", DEFAULT_DUTY_CYCLE),
            self.property_or("enable", DEFAULT_ENABLE),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_description_defaults() {
        let description = DeviceDescription::from_json("{}").unwrap();
        assert!(description.is_compatible());
        assert_eq!(description.resolve(), Configuration::default());
    }

    #[test]
    fn test_properties_are_clamped() {
        let description = DeviceDescription::from_json(
            r#"{ "properties": { "pwm_channel": 5, "hz": 0, "duty_cycle": 4000, "enable": 0 } }"#,
        )
        .unwrap();
        assert_eq!(description.resolve(), Configuration::clamped(1, 1, 255, 0));
    }

    #[test]
    fn test_unreadable_property_falls_back() {
        let description = DeviceDescription::from_json(
            r#"{ "properties": { "hz": "fast", "duty_cycle": -3, "enable": 4294967296, "pwm_channel": 1 } }"#,
        )
        .unwrap();
        assert_eq!(description.property_u32("hz"), None);
        assert_eq!(description.property_u32("duty_cycle"), None);
        assert_eq!(description.property_u32("enable"), None);
        let config = description.resolve();
        assert_eq!(config.channel(), 1);
        assert_eq!(config.frequency_hz(), DEFAULT_HZ);
        assert_eq!(u32::from(config.duty_level()), DEFAULT_DUTY_CYCLE);
        assert!(config.enabled());
    }

    #[test]
    fn test_cells_read_as_signed() {
        let description = DeviceDescription::from_json(
            r#"{ "properties": { "pwm_channel": 4294967295, "hz": 4294967295, "duty_cycle": 2147483648 } }"#,
        )
        .unwrap();
        assert_eq!(description.property_u32("hz"), Some(u32::MAX));
        let config = description.resolve();
        assert_eq!(config.channel(), 0);
        assert_eq!(config.frequency_hz(), 1);
        assert_eq!(config.duty_level(), 1);
    }

    #[test]
    fn test_compatible() {
        let ours = DeviceDescription::from_json(r#"{ "compatible": "dualpwm" }"#).unwrap();
        assert!(ours.is_compatible());
        let other = DeviceDescription::from_json(r#"{ "compatible": "other-pwm" }"#).unwrap();
        assert!(!other.is_compatible());
    }

    #[test]
    fn test_load_missing_file() {
        let path = std::env::temp_dir().join("dualpwm-no-such-description.json");
        assert_eq!(DeviceDescription::load(path).unwrap(), DeviceDescription::default());
    }
}
