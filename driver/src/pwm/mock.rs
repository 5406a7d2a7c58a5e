//! In-memory PWM backend.
//!
//! Every channel keeps a [MockChannelRecord] shared with the chip, so the
//! caller can inspect what was written and inject failures while the
//! channel is in use elsewhere.

use crate::pwm::{PwmChannel, PwmProvider, PwmState};
use crate::{PwmError, PwmResult};
use log::trace;
use std::fmt::{Debug, Formatter};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// What happens when a mock channel is requested.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum MockAvailability {
    #[default]
    Available,
    /// Acquisition fails for good.
    Failed,
    /// Acquisition is deferred with [PwmError::NotReady].
    NotReady,
}

/// Everything the hardware side of a mock channel has seen.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MockChannelRecord {
    pub state: PwmState,
    pub enabled: bool,
    pub claimed: bool,
    pub apply_count: usize,
    pub enable_count: usize,
    pub disable_count: usize,
    pub release_count: usize,
    pub fail_apply: bool,
    pub fail_enable: bool,
}

type SharedRecord = Arc<Mutex<MockChannelRecord>>;

fn lock(record: &SharedRecord) -> MutexGuard<'_, MockChannelRecord> {
    record.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct MockPwmChip {
    channels: Vec<(MockAvailability, SharedRecord)>,
}

impl MockPwmChip {
    pub fn new(count: usize) -> Self {
        Self {
            channels: (0..count)
                .map(|_| (MockAvailability::Available, SharedRecord::default()))
                .collect(),
        }
    }

    pub fn with_availability(mut self, index: usize, availability: MockAvailability) -> Self {
        if let Some(channel) = self.channels.get_mut(index) {
            channel.0 = availability;
        }
        self
    }

    /// Snapshot of the record of the channel at `index`.
    pub fn record(&self, index: usize) -> Option<MockChannelRecord> {
        self.channels.get(index).map(|(_, record)| lock(record).clone())
    }

    /// Mutates the record of the channel at `index`, e.g. to inject failures.
    pub fn configure(&self, index: usize, f: impl FnOnce(&mut MockChannelRecord)) {
        if let Some((_, record)) = self.channels.get(index) {
            f(&mut lock(record));
        }
    }
}

impl Debug for MockPwmChip {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "MockPwmChip({})", self.channels.len())
    }
}

impl PwmProvider for MockPwmChip {
    fn count(&self) -> PwmResult<usize> {
        Ok(self.channels.len())
    }

    fn request(&self, index: usize) -> PwmResult<Box<dyn PwmChannel>> {
        let (availability, record) = self.channels.get(index).ok_or(PwmError::InvalidArgument)?;

        match availability {
            MockAvailability::Available => {}
            MockAvailability::Failed => return Err(PwmError::Other("no such device".to_string())),
            MockAvailability::NotReady => return Err(PwmError::NotReady),
        }

        let mut guard = lock(record);
        if guard.claimed {
            return Err(PwmError::AlreadyInUse);
        }
        guard.claimed = true;
        drop(guard);

        Ok(Box::new(MockPwmChannel {
            index,
            record: Arc::clone(record),
        }))
    }
}

pub struct MockPwmChannel {
    index: usize,
    record: SharedRecord,
}

impl Debug for MockPwmChannel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "MockPwmChannel({})", self.index)
    }
}

impl PwmChannel for MockPwmChannel {
    fn index(&self) -> usize {
        self.index
    }

    fn state(&self) -> PwmResult<PwmState> {
        Ok(lock(&self.record).state)
    }

    fn apply(&mut self, state: &PwmState) -> PwmResult<()> {
        let mut record = lock(&self.record);
        if record.fail_apply {
            return Err(PwmError::Io(std::io::ErrorKind::Other));
        }
        record.state = *state;
        record.apply_count += 1;
        trace!("Mock PWM {} applied: {}", self.index, state);
        Ok(())
    }

    fn is_enabled(&self) -> PwmResult<bool> {
        Ok(lock(&self.record).enabled)
    }

    fn enable(&mut self) -> PwmResult<()> {
        let mut record = lock(&self.record);
        if record.fail_enable {
            return Err(PwmError::Io(std::io::ErrorKind::Other));
        }
        record.enabled = true;
        record.enable_count += 1;
        Ok(())
    }

    fn disable(&mut self) -> PwmResult<()> {
        let mut record = lock(&self.record);
        record.enabled = false;
        record.disable_count += 1;
        Ok(())
    }

    fn release(self: Box<Self>) -> PwmResult<()> {
        let mut record = lock(&self.record);
        record.claimed = false;
        record.release_count += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_availability() {
        let chip = MockPwmChip::new(2)
            .with_availability(0, MockAvailability::NotReady)
            .with_availability(1, MockAvailability::Failed);
        assert_eq!(chip.request(0).unwrap_err(), PwmError::NotReady);
        assert!(matches!(chip.request(1).unwrap_err(), PwmError::Other(_)));
        assert_eq!(chip.request(2).unwrap_err(), PwmError::InvalidArgument);
    }

    #[test]
    fn test_mock_claim_and_release() {
        let chip = MockPwmChip::new(2);
        let channel = chip.request(0).unwrap();
        assert_eq!(chip.request(0).unwrap_err(), PwmError::AlreadyInUse);

        channel.release().unwrap();
        assert_eq!(chip.record(0).unwrap().release_count, 1);
        assert!(chip.request(0).is_ok());
    }

    #[test]
    fn test_mock_records_calls() {
        let chip = MockPwmChip::new(1);
        let mut channel = chip.request(0).unwrap();
        let state = PwmState {
            period_ns: 1_000,
            duty_ns: 250,
            ..Default::default()
        };
        channel.apply(&state).unwrap();
        channel.enable().unwrap();
        channel.disable().unwrap();

        let record = chip.record(0).unwrap();
        assert_eq!(record.state, state);
        assert_eq!(record.apply_count, 1);
        assert_eq!(record.enable_count, 1);
        assert_eq!(record.disable_count, 1);
        assert!(!record.enabled);
    }

    #[test]
    fn test_mock_injected_failures() {
        let chip = MockPwmChip::new(1);
        let mut channel = chip.request(0).unwrap();
        chip.configure(0, |record| {
            record.fail_apply = true;
            record.fail_enable = true;
        });
        assert!(channel.apply(&PwmState::default()).is_err());
        assert!(channel.enable().is_err());
        assert_eq!(channel.is_enabled(), Ok(false));
    }
}
