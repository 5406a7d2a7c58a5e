use crate::pwm::{PwmChannel, PwmPolarity, PwmProvider, PwmState};
use crate::{PwmError, PwmResult};
use log::{debug, trace, warn};
use std::fmt::{Debug, Display, Formatter};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default location of PWM chips in sysfs.
pub const SYSFS_PWM_ROOT: &str = "/sys/class/pwm";

/// PWM chip exposed by the Linux kernel through sysfs.
pub struct SysfsPwmChip {
    base_path: PathBuf,
}

impl SysfsPwmChip {
    /// Counts the consecutive `pwmchipN` directories under `root`.
    pub fn count_chips(root: impl AsRef<Path>) -> PwmResult<usize> {
        let root = root.as_ref();
        let mut count = 0;
        for index in 0.. {
            let chip_path = root.join(format!("pwmchip{}", index));
            if chip_path.exists() {
                count += 1;
            } else {
                break;
            }
        }
        Ok(count)
    }

    pub fn open(root: impl AsRef<Path>, index: usize) -> PwmResult<Self> {
        let chip_path = root.as_ref().join(format!("pwmchip{}", index));
        if !chip_path.exists() {
            return Err(PwmError::InvalidArgument);
        }
        Ok(SysfsPwmChip { base_path: chip_path })
    }
}

impl Debug for SysfsPwmChip {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "SysfsPwmChip({:?})", self.base_path)
    }
}

impl PwmProvider for SysfsPwmChip {
    fn count(&self) -> PwmResult<usize> {
        let path = self.base_path.join("npwm");
        let content = std::fs::read_to_string(&path)?;
        let count: usize = content
            .trim()
            .parse()
            .map_err(|_| PwmError::Other("parsing PWM channel count failed".to_string()))?;
        Ok(count)
    }

    fn request(&self, index: usize) -> PwmResult<Box<dyn PwmChannel>> {
        if index >= self.count()? {
            return Err(PwmError::InvalidArgument);
        }

        let export_path = self.base_path.join("export");
        std::fs::write(&export_path, index.to_string()).map_err(|err| match err.kind() {
            ErrorKind::ResourceBusy => PwmError::AlreadyInUse,
            kind => PwmError::Io(kind),
        })?;

        // The kernel creates the channel directory asynchronously after export.
        let path = self.base_path.join(format!("pwm{}", index));
        if !path.exists() {
            // No handle owns this export.
            if let Err(err) = std::fs::write(self.base_path.join("unexport"), index.to_string()) {
                warn!("Unexporting deferred PWM channel {} failed: {}", index, err);
            }
            return Err(PwmError::NotReady);
        }

        debug!("Exported PWM channel {} on {:?}", index, self);

        Ok(Box::new(SysfsPwmChannel {
            chip_path: self.base_path.clone(),
            path,
            index,
        }))
    }
}

/// A channel exported through the `export` file of a [SysfsPwmChip].
pub struct SysfsPwmChannel {
    chip_path: PathBuf,
    path: PathBuf,
    index: usize,
}

impl SysfsPwmChannel {
    fn read_attr<T: FromStr>(&self, name: &str) -> PwmResult<T> {
        let content = std::fs::read_to_string(self.path.join(name))?;
        content
            .trim()
            .parse()
            .map_err(|_| PwmError::Other(format!("parsing PWM {} failed", name)))
    }

    fn write_attr(&self, name: &str, value: impl Display) -> PwmResult<()> {
        std::fs::write(self.path.join(name), value.to_string())?;
        trace!("Set PWM {}: index={} value={}", name, self.index, value);
        Ok(())
    }
}

impl Debug for SysfsPwmChannel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "SysfsPwmChannel({:?})", self.path)
    }
}

impl PwmChannel for SysfsPwmChannel {
    fn index(&self) -> usize {
        self.index
    }

    fn state(&self) -> PwmResult<PwmState> {
        Ok(PwmState {
            period_ns: self.read_attr("period")?,
            duty_ns: self.read_attr("duty_cycle")?,
            polarity: self.read_attr("polarity")?,
        })
    }

    fn apply(&mut self, state: &PwmState) -> PwmResult<()> {
        if state.duty_ns > state.period_ns {
            return Err(PwmError::InvalidArgument);
        }

        // The kernel rejects any write leaving duty_cycle above period.
        let current_duty: u64 = self.read_attr("duty_cycle")?;
        if state.period_ns >= current_duty {
            self.write_attr("period", state.period_ns)?;
            self.write_attr("duty_cycle", state.duty_ns)?;
        } else {
            self.write_attr("duty_cycle", state.duty_ns)?;
            self.write_attr("period", state.period_ns)?;
        }

        match self.read_attr::<PwmPolarity>("polarity") {
            Ok(polarity) if polarity == state.polarity => {}
            _ => self.write_attr("polarity", state.polarity)?,
        }

        Ok(())
    }

    fn is_enabled(&self) -> PwmResult<bool> {
        let content = std::fs::read_to_string(self.path.join("enable"))?;
        match content.trim() {
            "1" => Ok(true),
            "0" => Ok(false),
            _ => Err(PwmError::Other("parsing PWM enabled state failed".to_string())),
        }
    }

    fn enable(&mut self) -> PwmResult<()> {
        self.write_attr("enable", 1)
    }

    fn disable(&mut self) -> PwmResult<()> {
        self.write_attr("enable", 0)
    }

    fn release(self: Box<Self>) -> PwmResult<()> {
        std::fs::write(self.chip_path.join("unexport"), self.index.to_string())?;
        debug!("Unexported PWM channel {}", self.index);
        Ok(())
    }
}
