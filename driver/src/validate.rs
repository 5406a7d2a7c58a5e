//! Clamping of externally supplied values into their legal ranges.
//!
//! Every clamp is idempotent and total: any integer maps into range.

/// Exclusive upper bound of the output frequency, in hertz.
pub const MAX_FREQUENCY_HZ: u32 = 2_000_000;
/// Duty level meaning the whole period.
pub const MAX_DUTY_LEVEL: u8 = 255;
/// Number of selectable channels.
pub const CHANNEL_COUNT: usize = 2;

pub fn clamp_channel(channel: i64) -> usize {
    channel.clamp(0, CHANNEL_COUNT as i64 - 1) as usize
}

/// A duty level of zero is not allowed and becomes `1`.
pub fn clamp_duty(duty_level: i64) -> u8 {
    duty_level.clamp(1, MAX_DUTY_LEVEL.into()) as u8
}

pub fn clamp_frequency(frequency_hz: i64) -> u32 {
    frequency_hz.clamp(1, i64::from(MAX_FREQUENCY_HZ) - 1) as u32
}

pub fn clamp_enable(enable: i64) -> bool {
    enable >= 1
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: [i64; 14] = [
        i64::MIN,
        -2_000_000,
        -1,
        0,
        1,
        2,
        32,
        255,
        256,
        1_999_999,
        2_000_000,
        2_000_001,
        u32::MAX as i64 + 1,
        i64::MAX,
    ];

    #[test]
    fn test_clamp_channel() {
        assert_eq!(clamp_channel(-3), 0);
        assert_eq!(clamp_channel(0), 0);
        assert_eq!(clamp_channel(1), 1);
        assert_eq!(clamp_channel(5), 1);
        for c in SAMPLES {
            let once = clamp_channel(c);
            assert!(once < CHANNEL_COUNT);
            assert_eq!(clamp_channel(once as i64), once);
        }
    }

    #[test]
    fn test_clamp_duty() {
        assert_eq!(clamp_duty(0), 1);
        assert_eq!(clamp_duty(-7), 1);
        assert_eq!(clamp_duty(32), 32);
        assert_eq!(clamp_duty(255), 255);
        assert_eq!(clamp_duty(1000), 255);
        for d in SAMPLES {
            let once = clamp_duty(d);
            assert!((1..=255).contains(&once));
            assert_eq!(clamp_duty(once.into()), once);
        }
    }

    #[test]
    fn test_clamp_frequency() {
        assert_eq!(clamp_frequency(0), 1);
        assert_eq!(clamp_frequency(-100), 1);
        assert_eq!(clamp_frequency(2), 2);
        assert_eq!(clamp_frequency(1_999_999), 1_999_999);
        assert_eq!(clamp_frequency(2_000_000), 1_999_999);
        for f in SAMPLES {
            let once = clamp_frequency(f);
            assert!((1..MAX_FREQUENCY_HZ).contains(&once));
            assert_eq!(clamp_frequency(once.into()), once);
        }
    }

    #[test]
    fn test_clamp_enable() {
        assert!(!clamp_enable(-1));
        assert!(!clamp_enable(0));
        assert!(clamp_enable(1));
        assert!(clamp_enable(42));
        for e in SAMPLES {
            let once = clamp_enable(e);
            assert_eq!(clamp_enable(once.into()), once);
        }
    }
}
