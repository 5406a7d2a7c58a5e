//! Attach and detach of the whole device.

use crate::attr::ControllerAttributes;
use crate::channel::ChannelSlots;
use crate::controller::PwmController;
use crate::description::DeviceDescription;
use crate::pwm::PwmProvider;
use log::{debug, info, warn};

/// A bound device: both channel handles plus the controller driving them.
#[derive(Debug)]
pub struct PwmDevice {
    controller: PwmController,
}

impl PwmDevice {
    /// Acquires channels 0 and 1 from `provider` and starts output as described.
    ///
    /// Never fails because of hardware; unusable channels stay unavailable
    /// and the output disabled.
    pub fn attach(provider: &dyn PwmProvider, description: &DeviceDescription) -> Self {
        debug!("Attaching to {:?}", provider);

        let config = description.resolve();
        let slots = ChannelSlots::acquire(provider);
        let controller = PwmController::new(config, slots);

        if let Err(err) = controller.start() {
            warn!("Starting PWM output failed: {}", err);
        }

        info!("Attached: {:?}", controller.read());
        Self { controller }
    }

    pub fn controller(&self) -> &PwmController {
        &self.controller
    }

    /// Endpoints bound to this device; they cannot outlive it.
    pub fn attributes(&self) -> ControllerAttributes<'_> {
        ControllerAttributes::new(&self.controller)
    }

    /// Disables and releases both channels, whichever one is active.
    pub fn detach(self) {
        self.controller.shutdown();
        debug!("Detached");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attr::AttributeStore;
    use crate::pwm::{MockAvailability, MockPwmChip};

    #[test]
    fn test_attach_with_defaults() {
        let chip = MockPwmChip::new(2);
        let device = PwmDevice::attach(&chip, &DeviceDescription::default());
        assert_eq!(device.attributes().get("enable"), Ok("1\n".to_string()));
        assert_eq!(chip.record(0).unwrap().enable_count, 1);
        assert_eq!(chip.record(1).unwrap().apply_count, 0);
        device.detach();
    }

    #[test]
    fn test_attach_without_channels() {
        let chip = MockPwmChip::new(2)
            .with_availability(0, MockAvailability::Failed)
            .with_availability(1, MockAvailability::NotReady);
        let device = PwmDevice::attach(&chip, &DeviceDescription::default());
        assert!(!device.controller().read().enabled());
        device.detach();
        assert_eq!(chip.record(0).unwrap().release_count, 0);
    }

    #[test]
    fn test_detach_releases_both() {
        let chip = MockPwmChip::new(2);
        let device = PwmDevice::attach(&chip, &DeviceDescription::default());
        device.detach();
        for index in 0..2 {
            let record = chip.record(index).unwrap();
            assert!(!record.enabled);
            assert_eq!(record.release_count, 1);
        }
    }
}
