use std::env::var;
use std::path::PathBuf;
use std::str::FromStr;
use dualpwm_driver::pwm::SYSFS_PWM_ROOT;
use thiserror::Error;

#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    #[error("unknown backend {0:?}, expected \"sysfs\" or \"mock\"")]
    UnknownBackend(String),
    #[error("{name} is not a valid number: {value:?}")]
    InvalidNumber { name: &'static str, value: String },
}

/// Where PWM channels come from.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Backend {
    #[default]
    Sysfs,
    /// In-memory channels, for running without PWM hardware.
    Mock,
}

impl FromStr for Backend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sysfs" => Ok(Backend::Sysfs),
            "mock" => Ok(Backend::Mock),
            _ => Err(ConfigError::UnknownBackend(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct AppConfig {
    pub backend: Backend,
    pub sysfs_root: PathBuf,
    pub chip: usize,
    pub description: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = AppConfig::default();
        if let Some(backend) = lookup("DUALPWM_BACKEND") {
            config.backend = backend.parse()?;
        }
        if let Some(root) = lookup("DUALPWM_SYSFS_ROOT") {
            config.sysfs_root = root.into();
        }
        if let Some(chip) = lookup("DUALPWM_CHIP") {
            config.chip = chip.trim().parse().map_err(|_| ConfigError::InvalidNumber {
                name: "DUALPWM_CHIP",
                value: chip.clone(),
            })?;
        }
        if let Some(description) = lookup("DUALPWM_DESCRIPTION") {
            config.description = description.into();
        }
        Ok(config)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            backend: Backend::default(),
            sysfs_root: PathBuf::from(SYSFS_PWM_ROOT),
            chip: 0,
            description: PathBuf::from("dualpwm.json"),
        }
    }
}
