// The host pulls the line low for at least 18 ms to start a transaction.
const MIN_RESET_LOW_MS: u32 = 18;
// After the reset pulse the host keeps the line released for 20–40 µs.
const MIN_RELEASE_US: u32 = 20;
const MAX_RELEASE_US: u32 = 40;

/// Default reset pulse duration in milliseconds.
///
/// The datasheet requires at least 18 ms, the default keeps some margin.
pub const RESET_LOW_MS: u32 = 20;
/// Default time in microseconds the line stays released before the sensor
/// is expected to take it over.
pub const RELEASE_US: u32 = 30;
/// Default delay in microseconds between the rising edge of a bit and the
/// instant the bit value is sampled.
pub const BIT_SAMPLE_US: u32 = 30;
/// Default delay in microseconds between two consecutive line polls.
pub const POLL_INTERVAL_US: u32 = 1;
/// Default maximum number of line polls for a single wait phase.
pub const POLL_BUDGET: u16 = 100;

/// Bus timing configuration.
///
/// Every wait phase of a transaction polls the line at a fixed
/// [`Timing::poll_interval_us`] granularity for at most
/// [`Timing::poll_budget`] iterations. There is no adaptive timing.
///
/// The defaults match the sensor's documented 40–80 µs pulse widths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    reset_low_ms: u32,
    release_us: u32,
    bit_sample_us: u32,
    poll_interval_us: u32,
    poll_budget: u16,
}

impl Default for Timing {
    fn default() -> Self {
        Self::new()
    }
}

impl Timing {
    /// Creates a [`Timing`] with the default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            reset_low_ms: RESET_LOW_MS,
            release_us: RELEASE_US,
            bit_sample_us: BIT_SAMPLE_US,
            poll_interval_us: POLL_INTERVAL_US,
            poll_budget: POLL_BUDGET,
        }
    }

    /// Sets the reset pulse duration in milliseconds.
    ///
    /// Values below 18 ms are raised to 18 ms.
    #[must_use]
    pub const fn with_reset_low_ms(mut self, reset_low_ms: u32) -> Self {
        self.reset_low_ms = if reset_low_ms < MIN_RESET_LOW_MS {
            MIN_RESET_LOW_MS
        } else {
            reset_low_ms
        };
        self
    }

    /// Sets the release window in microseconds.
    ///
    /// The value is clamped between 20 µs and 40 µs.
    #[must_use]
    pub const fn with_release_us(mut self, release_us: u32) -> Self {
        self.release_us = if release_us < MIN_RELEASE_US {
            MIN_RELEASE_US
        } else if release_us > MAX_RELEASE_US {
            MAX_RELEASE_US
        } else {
            release_us
        };
        self
    }

    /// Sets the bit settle window in microseconds.
    #[must_use]
    pub const fn with_bit_sample_us(mut self, bit_sample_us: u32) -> Self {
        self.bit_sample_us = bit_sample_us;
        self
    }

    /// Sets the line poll granularity in microseconds.
    #[must_use]
    pub const fn with_poll_interval_us(mut self, poll_interval_us: u32) -> Self {
        self.poll_interval_us = poll_interval_us;
        self
    }

    /// Sets the maximum number of polls for a single wait phase.
    ///
    /// A budget of zero is raised to one, so every phase samples the line at
    /// least once.
    #[must_use]
    pub const fn with_poll_budget(mut self, poll_budget: u16) -> Self {
        self.poll_budget = if poll_budget == 0 { 1 } else { poll_budget };
        self
    }

    /// Returns the reset pulse duration in milliseconds.
    #[must_use]
    pub const fn reset_low_ms(&self) -> u32 {
        self.reset_low_ms
    }

    /// Returns the release window in microseconds.
    #[must_use]
    pub const fn release_us(&self) -> u32 {
        self.release_us
    }

    /// Returns the bit settle window in microseconds.
    #[must_use]
    pub const fn bit_sample_us(&self) -> u32 {
        self.bit_sample_us
    }

    /// Returns the line poll granularity in microseconds.
    #[must_use]
    pub const fn poll_interval_us(&self) -> u32 {
        self.poll_interval_us
    }

    /// Returns the maximum number of polls for a single wait phase.
    #[must_use]
    pub const fn poll_budget(&self) -> u16 {
        self.poll_budget
    }

    /// Returns the upper bound in microseconds of a single wait phase.
    #[must_use]
    pub const fn phase_timeout_us(&self) -> u32 {
        self.poll_interval_us.saturating_mul(self.poll_budget as u32)
    }
}
