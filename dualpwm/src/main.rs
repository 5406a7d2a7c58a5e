mod config;
mod console;

use std::io::{stdin, stdout};
use dotenv::dotenv;
use dualpwm_driver::description::{COMPATIBLE, DeviceDescription};
use dualpwm_driver::device::PwmDevice;
use dualpwm_driver::pwm::{MockPwmChip, PwmProvider, SysfsPwmChip};
use dualpwm_driver::validate::CHANNEL_COUNT;
use log::{debug, info};
use crate::config::{AppConfig, Backend};

fn main() -> eyre::Result<()> {
    // Initialize environment and logger
    dotenv().ok();
    pretty_env_logger::init();

    info!("dualpwm v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::from_env()?;
    debug!("{:?}", config);

    let description = DeviceDescription::load(&config.description)?;
    if !description.is_compatible() {
        return Err(eyre::eyre!(
            "Device description {:?} is not compatible with {:?}",
            config.description,
            COMPATIBLE
        ));
    }

    debug!("Initializing PWM backend...");
    let provider: Box<dyn PwmProvider> = match config.backend {
        Backend::Sysfs => Box::new(SysfsPwmChip::open(&config.sysfs_root, config.chip)?),
        Backend::Mock => Box::new(MockPwmChip::new(CHANNEL_COUNT)),
    };
    debug!("{:?} initialized.", provider);

    let device = PwmDevice::attach(&*provider, &description);

    info!("Serving attributes on stdin...");
    let attributes = device.attributes();
    console::run(&attributes, stdin().lock(), stdout().lock())?;
    drop(attributes);

    device.detach();
    info!("dualpwm stopped.");

    Ok(())
}
