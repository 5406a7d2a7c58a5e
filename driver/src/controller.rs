//! The PWM parameter controller.
//!
//! All four logical fields and the channel slots live behind one mutex. Each
//! public operation holds it from validation through the last hardware call,
//! so concurrent writers are applied one after another, entirely.

use crate::channel::ChannelSlots;
use crate::convert::{check, convert};
use crate::validate::{clamp_channel, clamp_duty, clamp_enable, clamp_frequency};
use crate::{ControlError, ControlResult};
use log::{debug, error, info, warn};
use std::fmt::{Debug, Formatter};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Logical configuration of the output.
///
/// Only built through [Configuration::clamped] or `Default`, so every field is
/// always within its legal range.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Configuration {
    channel: usize,
    frequency_hz: u32,
    duty_level: u8,
    enabled: bool,
}

impl Configuration {
    /// Builds a configuration from unchecked values, clamping each into range.
    pub fn clamped(channel: i64, frequency_hz: i64, duty_level: i64, enable: i64) -> Self {
        Self {
            channel: clamp_channel(channel),
            frequency_hz: clamp_frequency(frequency_hz),
            duty_level: clamp_duty(duty_level),
            enabled: clamp_enable(enable),
        }
    }

    /// Selected channel, `0` or `1`.
    pub fn channel(&self) -> usize {
        self.channel
    }

    /// Output frequency, `1..2_000_000`.
    pub fn frequency_hz(&self) -> u32 {
        self.frequency_hz
    }

    /// Fraction of the period held high, in 256ths, `1..=255`.
    pub fn duty_level(&self) -> u8 {
        self.duty_level
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            channel: 0,
            frequency_hz: 2,
            duty_level: 32,
            enabled: true,
        }
    }
}

struct ControllerState {
    config: Configuration,
    slots: ChannelSlots,
}

impl ControllerState {
    fn apply(&mut self, duty_level: i64, frequency_hz: i64) -> ControlResult<()> {
        let (duty_level, frequency_hz) = check(duty_level, frequency_hz).inspect_err(|err| {
            error!("Refusing to apply PWM parameters: {}", err);
        })?;
        self.config.duty_level = clamp_duty(duty_level.into());
        self.config.frequency_hz = frequency_hz;
        self.apply_stored()
    }

    /// Pushes the stored duty level and frequency to the active handle.
    ///
    /// Without an active handle only the stored fields matter and this succeeds.
    fn apply_stored(&mut self) -> ControlResult<()> {
        let Configuration {
            channel,
            frequency_hz,
            duty_level,
            ..
        } = self.config;
        check(duty_level.into(), frequency_hz.into())?;
        let timing = convert(frequency_hz, duty_level);

        let Some(pwm) = self.slots.active_mut(channel) else {
            debug!(
                "No PWM handle for channel {}, stored duty level {} at {} Hz",
                channel, duty_level, frequency_hz
            );
            return Ok(());
        };

        if let Err(err) = pwm.apply(&timing.to_state()) {
            error!("Applying PWM state on channel {} failed: {}", channel, err);
            if let Err(err) = pwm.disable() {
                warn!("Disabling PWM channel {} failed: {}", channel, err);
            }
            self.config.enabled = false;
            return Err(ControlError::HardwareApplyFailed(err));
        }

        info!(
            "Applied PWM channel {}: duty level {} ({} ns), frequency {} Hz ({} ns)",
            channel, duty_level, timing.duty_ns, frequency_hz, timing.period_ns
        );
        Ok(())
    }

    fn enable(&mut self) -> ControlResult<()> {
        let result = self.try_enable();
        self.config.enabled = result.is_ok();
        result
    }

    fn try_enable(&mut self) -> ControlResult<()> {
        self.apply_stored()?;
        let channel = self.config.channel;
        let pwm = self
            .slots
            .active_mut(channel)
            .ok_or(ControlError::HandleUnavailable)?;
        pwm.enable().map_err(|err| {
            error!("Enabling PWM channel {} failed: {}", channel, err);
            ControlError::HardwareEnableFailed(err)
        })
    }

    fn disable(&mut self) {
        let channel = self.config.channel;
        if let Some(pwm) = self.slots.active_mut(channel) {
            if let Err(err) = pwm.disable() {
                warn!("Disabling PWM channel {} failed: {}", channel, err);
            }
        }
        self.config.enabled = false;
    }

    fn set_channel(&mut self, channel: i64) -> ControlResult<()> {
        let channel = clamp_channel(channel);
        self.disable();
        self.config.channel = channel;
        if self.slots.active(channel).is_none() {
            warn!("PWM channel {} selected but no handle is available for it", channel);
        }
        self.apply_stored()
    }
}

/// Owns the configuration and the hardware handles of one device.
pub struct PwmController {
    state: Mutex<ControllerState>,
}

impl PwmController {
    pub fn new(config: Configuration, slots: ChannelSlots) -> Self {
        Self {
            state: Mutex::new(ControllerState { config, slots }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        // Every critical section keeps the fields in range, so a poisoned state is still valid.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the current configuration. Never touches hardware.
    pub fn read(&self) -> Configuration {
        self.lock().config
    }

    /// Index of the handle that output currently goes to.
    pub fn active_channel(&self) -> Option<usize> {
        let state = self.lock();
        state.slots.active(state.config.channel).map(|pwm| pwm.index())
    }

    /// Stores and applies a duty level (`0..=255`) and frequency (`1..2_000_000` Hz).
    ///
    /// A stored duty level of zero is raised to `1`.
    ///
    /// # Errors
    /// - `ControlError::InvalidParameter` if a value is out of range; nothing is changed.
    /// - `ControlError::HardwareApplyFailed` if the handle rejected the state; the
    ///   values stay stored and the output is disabled.
    pub fn apply(&self, duty_level: i64, frequency_hz: i64) -> ControlResult<()> {
        self.lock().apply(duty_level, frequency_hz)
    }

    pub fn set_duty_level(&self, duty_level: i64) -> ControlResult<()> {
        let mut state = self.lock();
        let frequency_hz = state.config.frequency_hz;
        state.apply(clamp_duty(duty_level).into(), frequency_hz.into())
    }

    pub fn set_frequency(&self, frequency_hz: i64) -> ControlResult<()> {
        let mut state = self.lock();
        let duty_level = state.config.duty_level;
        state.apply(duty_level.into(), clamp_frequency(frequency_hz).into())
    }

    /// Switches output to another channel.
    ///
    /// The previous channel is disabled first and the new one is configured
    /// but left disabled.
    pub fn set_channel(&self, channel: i64) -> ControlResult<()> {
        self.lock().set_channel(channel)
    }

    /// Applies the stored parameters and turns the output on.
    ///
    /// `enabled` is only set once the hardware confirmed the enable.
    pub fn enable(&self) -> ControlResult<()> {
        self.lock().enable()
    }

    /// Turns the output off. Harmless when already off or without a handle.
    pub fn disable(&self) {
        self.lock().disable()
    }

    pub fn set_enable(&self, enable: i64) -> ControlResult<()> {
        let mut state = self.lock();
        if clamp_enable(enable) {
            state.enable()
        } else {
            state.disable();
            Ok(())
        }
    }

    /// Brings the hardware in line with the initial configuration.
    pub fn start(&self) -> ControlResult<()> {
        let mut state = self.lock();
        let channel = state.config.channel;
        state.slots.disable_inactive(channel);

        let current = state
            .slots
            .active(channel)
            .map(|pwm| (pwm.state(), pwm.is_enabled()));
        let Some(current) = current else {
            warn!("No PWM handle for channel {}, output stays disabled", channel);
            state.config.enabled = false;
            return Ok(());
        };
        match current {
            (Ok(current), Ok(enabled)) => {
                info!("PWM channel {} state: {}, enabled: {}", channel, current, enabled)
            }
            (Err(err), _) | (_, Err(err)) => {
                warn!("Reading PWM channel {} state failed: {}", channel, err)
            }
        }

        state.apply_stored()?;
        if state.config.enabled {
            state.enable()?;
        }
        Ok(())
    }

    /// Disables and releases both handles. Later calls do nothing.
    pub fn shutdown(&self) {
        let mut state = self.lock();
        state.slots.release_all();
        state.config.enabled = false;
    }
}

impl Debug for PwmController {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "PwmController({:?})", self.read())
    }
}

impl Drop for PwmController {
    fn drop(&mut self) {
        self.shutdown();
    }
}
