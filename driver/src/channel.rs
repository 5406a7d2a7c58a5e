//! The two hardware channel slots and selection between them.

use crate::pwm::{PwmChannel, PwmProvider};
use crate::validate::CHANNEL_COUNT;
use crate::PwmError;
use log::{debug, error, info, warn};

/// Picks the slot for `channel` if that slot holds a handle.
///
/// Never falls back to the other slot.
pub fn select(channel: usize, available: [bool; CHANNEL_COUNT]) -> Option<usize> {
    match channel {
        0 if available[0] => Some(0),
        1 if available[1] => Some(1),
        _ => None,
    }
}

/// Handles acquired for channels 0 and 1; either may be missing.
#[derive(Debug, Default)]
pub struct ChannelSlots {
    slots: [Option<Box<dyn PwmChannel>>; CHANNEL_COUNT],
}

impl ChannelSlots {
    pub fn new(slots: [Option<Box<dyn PwmChannel>>; CHANNEL_COUNT]) -> Self {
        Self { slots }
    }

    /// Requests both channels from `provider`.
    ///
    /// A failure on one index leaves that slot empty and does not affect the other.
    pub fn acquire(provider: &dyn PwmProvider) -> Self {
        let slots = std::array::from_fn(|index| match provider.request(index) {
            Ok(channel) => {
                info!("Acquired {:?} for channel {}", channel, index);
                Some(channel)
            }
            Err(PwmError::NotReady) => {
                debug!("PWM channel {} on {:?} not ready, deferring", index, provider);
                None
            }
            Err(err) => {
                error!("Requesting PWM channel {} on {:?} failed: {}", index, provider, err);
                None
            }
        });
        Self { slots }
    }

    pub fn available(&self) -> [bool; CHANNEL_COUNT] {
        std::array::from_fn(|index| self.slots[index].is_some())
    }

    /// The handle that `channel` resolves to, if any.
    pub fn active(&self, channel: usize) -> Option<&dyn PwmChannel> {
        let index = select(channel, self.available())?;
        self.slots[index].as_deref()
    }

    pub fn active_mut(&mut self, channel: usize) -> Option<&mut (dyn PwmChannel + 'static)> {
        let index = select(channel, self.available())?;
        self.slots[index].as_deref_mut()
    }

    /// Disables every handle other than the one `channel` resolves to that is still driving.
    pub fn disable_inactive(&mut self, channel: usize) {
        let active = select(channel, self.available());
        for (index, slot) in self.slots.iter_mut().enumerate() {
            let Some(pwm) = slot else {
                continue;
            };
            if Some(index) == active || !matches!(pwm.is_enabled(), Ok(true)) {
                continue;
            }
            match pwm.disable() {
                Ok(()) => info!("Disabled PWM channel {} left running", index),
                Err(err) => warn!("Disabling PWM channel {} failed: {}", index, err),
            }
        }
    }

    /// Disables and releases every held handle, leaving all slots empty.
    pub fn release_all(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            let Some(mut channel) = slot.take() else {
                continue;
            };
            if let Err(err) = channel.disable() {
                warn!("Disabling PWM channel {} failed: {}", index, err);
            }
            match channel.release() {
                Ok(()) => debug!("Released PWM channel {}", index),
                Err(err) => warn!("Releasing PWM channel {} failed: {}", index, err),
            }
        }
    }
}
