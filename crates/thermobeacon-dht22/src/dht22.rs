//! # DHT22 Driver
//!
//! This module provides an architecture-agnostic driver for the `DHT22`
//! temperature and humidity sensor.
//!
//! The sensor shares a single bidirectional line with the host and encodes
//! bit values in pulse widths, so the whole transaction is software-timed:
//!
//! 1. The host pulls the line low for at least 18 ms, then releases it.
//! 2. The sensor answers with a low pulse followed by a high pulse.
//! 3. The sensor sends 40 bits, most significant bit first. Every bit starts
//!    with a low phase, and the length of the following high phase encodes
//!    its value. The line is sampled once, a fixed settle window after the
//!    rising edge.
//! 4. The last of the five received bytes is a checksum of the other four.
//!
//! Every wait phase polls the line with the fixed granularity and budget of
//! the driver [`Timing`]. Any delay inserted by an interrupt corrupts the
//! sampled bits, hence the blocking transaction runs inside a critical
//! section that is restored on every exit path.
//!
//! A transaction is marked as in flight before the line is touched. A second
//! transaction started meanwhile, for instance from an interrupt handler,
//! fails with [`Dht22Error::Busy`] and leaves its line alone.
//!
//! For detailed specifications, refer to the
//! [datasheet](https://www.alldatasheet.com/datasheet-pdf/pdf/1132459/ETC2/DHT22.html)
//! and the description of the proprietary
//! [communication protocol](https://www.ocfreaks.com/basics-interfacing-dht11-dht22-humidity-temperature-sensor-mcu/).

use core::result::Result::{self, Err, Ok};

use embedded_hal::delay::DelayNs as SyncDelay;
use embedded_hal::digital::PinState;

#[cfg(feature = "async")]
use embedded_hal_async::delay::DelayNs as AsyncDelay;

use log::{debug, trace};

use crate::atomic::{AtomicSection, InFlight};
use crate::frame::{FRAME_LEN, Frame, RawFrame};
use crate::line::{DriveMode, Line, LineSnapshot};
use crate::reading::Reading;
use crate::timing::Timing;

/// Progress of a single bus transaction.
///
/// Every transaction starts again from [`BusState::Idle`]. The state a
/// transaction ended in is kept for diagnostics only, see
/// [`Dht22::last_state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusState {
    /// No transaction started yet.
    Idle,
    /// The host is holding the reset pulse.
    ResetAsserted,
    /// The host released the line and waits for the sensor answer.
    PresenceWait,
    /// The sensor answered the reset pulse.
    PresenceConfirmed,
    /// Reading the bit with the given 0-based index.
    BitSync(u8),
    /// The byte with the given 0-based index has been assembled.
    ByteAssembled(u8),
    /// All five bytes have been received.
    FrameComplete,
    /// A wait phase exhausted its poll budget.
    TimedOut,
}

/// Errors that may occur when interacting with the `DHT22` sensor.
///
/// Every variant means the reading is unavailable for this cycle. None is
/// fatal and none is retried by the driver.
#[derive(Debug, PartialEq, Eq)]
pub enum Dht22Error<E> {
    /// GPIO pin errors.
    Pin(E),
    /// The sensor did not answer the reset pulse within the poll budget.
    NoPresence,
    /// A bit phase exceeded its poll budget.
    BitTimeout {
        /// 0-based index of the bit in the frame.
        bit: u8,
    },
    /// Data checksum mismatch.
    ChecksumMismatch,
    /// Another transaction is already in flight.
    Busy,
}

impl<E> From<E> for Dht22Error<E> {
    fn from(e: E) -> Self {
        Dht22Error::Pin(e)
    }
}

impl<E: core::fmt::Debug> core::fmt::Display for Dht22Error<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Pin(e) => write!(f, "pin error: {e:?}"),
            Self::NoPresence => f.write_str("the sensor did not answer the reset pulse"),
            Self::BitTimeout { bit } => write!(f, "timed out while reading bit {bit}"),
            Self::ChecksumMismatch => f.write_str("frame checksum mismatch"),
            Self::Busy => f.write_str("a transaction is already in flight"),
        }
    }
}

/// The `DHT22` driver.
///
/// The driver exclusively owns the line. It assumes the bus is idle when
/// created, that is released and pulled up.
pub struct Dht22<P, D>
where
    P: Line,
    D: SyncDelay,
{
    line: P,
    delay: D,
    timing: Timing,
    mode: DriveMode,
    level: PinState,
    last_state: BusState,
}

impl<P, D> Dht22<P, D>
where
    P: Line,
    D: SyncDelay,
{
    /// Creates a [`Dht22`] driver for the given line and delay provider,
    /// using the default [`Timing`].
    #[must_use]
    pub fn new(line: P, delay: D) -> Self {
        Self::with_timing(line, delay, Timing::new())
    }

    /// Creates a [`Dht22`] driver with a custom [`Timing`].
    #[must_use]
    pub fn with_timing(line: P, delay: D, timing: Timing) -> Self {
        Self {
            line,
            delay,
            timing,
            mode: DriveMode::InputPullUp,
            level: PinState::High,
            last_state: BusState::Idle,
        }
    }

    /// Returns the bus timing in use.
    #[must_use]
    pub const fn timing(&self) -> &Timing {
        &self.timing
    }

    /// Returns the state the most recent transaction ended in.
    ///
    /// A transaction rejected with [`Dht22Error::Busy`] never starts, so it
    /// leaves this value unchanged.
    #[must_use]
    pub const fn last_state(&self) -> BusState {
        self.last_state
    }

    /// Releases the line and the delay provider.
    #[must_use]
    pub fn release(self) -> (P, D) {
        (self.line, self.delay)
    }

    /// Reads a single humidity and temperature measurement.
    ///
    /// # Errors
    ///
    /// See [`Dht22::read_frame`].
    pub fn read(&mut self) -> Result<Reading, Dht22Error<P::Error>> {
        self.read_frame().map(|frame| Reading::decode(&frame))
    }

    /// Runs a complete bus transaction and returns the validated frame.
    ///
    /// The call blocks for the whole transaction, reset pulse included,
    /// with preemption disabled.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Reading from or writing to the line fails
    /// - The sensor does not answer the reset pulse in time
    /// - A bit phase exceeds its poll budget
    /// - The received data fails checksum validation
    /// - Another transaction is already in flight
    pub fn read_frame(&mut self) -> Result<Frame, Dht22Error<P::Error>> {
        let section = AtomicSection::scoped_acquire();
        let claim = Self::claim()?;

        let mut transaction = Transaction::new(self);
        let result = transaction.execute();
        let state = transaction.state;

        drop(claim);
        drop(section);

        self.conclude(result, state)
    }

    /// Parks the line for a chip low-power mode.
    ///
    /// The returned snapshot records the drive mode and level in use and
    /// must be passed back to [`Dht22::resume`].
    ///
    /// # Errors
    ///
    /// Returns an error if the line cannot be reconfigured.
    pub fn suspend(&mut self) -> Result<LineSnapshot, Dht22Error<P::Error>> {
        let snapshot = LineSnapshot {
            mode: self.mode,
            level: self.level,
        };

        self.drive(DriveMode::Disconnected)?;
        trace!("DHT22 line suspended from {:?}", snapshot.mode);

        Ok(snapshot)
    }

    /// Restores the line configuration recorded by [`Dht22::suspend`].
    ///
    /// # Errors
    ///
    /// Returns an error if the line cannot be reconfigured or written.
    pub fn resume(&mut self, snapshot: LineSnapshot) -> Result<(), Dht22Error<P::Error>> {
        self.drive(snapshot.mode)?;
        self.write(snapshot.level)?;
        trace!("DHT22 line resumed to {:?}", snapshot.mode);

        Ok(())
    }

    fn claim() -> Result<InFlight, Dht22Error<P::Error>> {
        InFlight::claim().map_err(|_| {
            debug!("DHT22 read rejected, a transaction is already in flight");
            Dht22Error::Busy
        })
    }

    // Called once the line is released, so logging never disturbs the timed
    // window.
    fn conclude(
        &mut self,
        result: Result<RawFrame, Dht22Error<P::Error>>,
        state: BusState,
    ) -> Result<Frame, Dht22Error<P::Error>> {
        self.last_state = state;

        let raw = result.inspect_err(|e| {
            debug!("DHT22 transaction aborted in state {state:?}: {e}");
        })?;

        raw.validate().map_err(|e| {
            debug!("DHT22 frame {:02x?} discarded: {e}", raw.bytes());
            Dht22Error::ChecksumMismatch
        })
    }

    #[inline]
    fn drive(&mut self, mode: DriveMode) -> Result<(), Dht22Error<P::Error>> {
        self.line.set_drive_mode(mode)?;
        self.mode = mode;
        Ok(())
    }

    #[inline]
    fn write(&mut self, level: PinState) -> Result<(), Dht22Error<P::Error>> {
        self.line.set_state(level)?;
        self.level = level;
        Ok(())
    }
}

#[cfg(feature = "async")]
impl<P, D> Dht22<P, D>
where
    P: Line,
    D: SyncDelay + AsyncDelay,
{
    /// Reads a single humidity and temperature measurement, awaiting the
    /// reset pulse.
    ///
    /// # Errors
    ///
    /// See [`Dht22::read_frame_async`].
    pub async fn read_async(&mut self) -> Result<Reading, Dht22Error<P::Error>> {
        self.read_frame_async()
            .await
            .map(|frame| Reading::decode(&frame))
    }

    /// Runs a complete bus transaction and returns the validated frame.
    ///
    /// The reset pulse is awaited without blocking the executor. Everything
    /// after it is timing-critical and runs blocking, with preemption
    /// disabled. The transaction is marked as in flight for its whole
    /// duration, awaited reset pulse included.
    ///
    /// # Errors
    ///
    /// Same as [`Dht22::read_frame`].
    pub async fn read_frame_async(&mut self) -> Result<Frame, Dht22Error<P::Error>> {
        let claim = Self::claim()?;
        let reset_low = self.timing.reset_low_ms();

        let mut transaction = Transaction::new(self);
        let result = match transaction.assert_reset() {
            Ok(()) => {
                AsyncDelay::delay_ms(&mut transaction.dht.delay, reset_low).await;

                let section = AtomicSection::scoped_acquire();
                let result = transaction.sample_frame();
                drop(section);

                result
            }
            Err(e) => Err(e),
        };
        let state = transaction.state;

        drop(claim);

        self.conclude(result, state)
    }
}

// One bus transaction, from the reset pulse to the last bit.
struct Transaction<'a, P, D>
where
    P: Line,
    D: SyncDelay,
{
    dht: &'a mut Dht22<P, D>,
    state: BusState,
}

impl<'a, P, D> Transaction<'a, P, D>
where
    P: Line,
    D: SyncDelay,
{
    fn new(dht: &'a mut Dht22<P, D>) -> Self {
        Self {
            dht,
            state: BusState::Idle,
        }
    }

    fn execute(&mut self) -> Result<RawFrame, Dht22Error<P::Error>> {
        self.assert_reset()?;
        SyncDelay::delay_ms(&mut self.dht.delay, self.dht.timing.reset_low_ms());

        self.sample_frame()
    }

    fn sample_frame(&mut self) -> Result<RawFrame, Dht22Error<P::Error>> {
        self.release_bus()?;
        SyncDelay::delay_us(&mut self.dht.delay, self.dht.timing.release_us());

        self.await_presence()?;
        self.read_raw_frame()
    }

    fn assert_reset(&mut self) -> Result<(), Dht22Error<P::Error>> {
        // Drive the line low to start the reset pulse.
        self.dht.drive(DriveMode::Output)?;
        self.dht.write(PinState::Low)?;
        self.state = BusState::ResetAsserted;

        Ok(())
    }

    fn release_bus(&mut self) -> Result<(), Dht22Error<P::Error>> {
        // Let the pull-up take the line high before the sensor takes over.
        self.dht.write(PinState::High)?;
        self.dht.drive(DriveMode::InputPullUp)
    }

    fn await_presence(&mut self) -> Result<(), Dht22Error<P::Error>> {
        self.state = BusState::PresenceWait;

        // Low pulse, high pulse, then the line drops for the first bit.
        self.wait_until(PinState::Low)?;
        self.wait_until(PinState::High)?;
        self.wait_until(PinState::Low)?;

        self.state = BusState::PresenceConfirmed;

        Ok(())
    }

    fn read_raw_frame(&mut self) -> Result<RawFrame, Dht22Error<P::Error>> {
        let mut bytes = [0; FRAME_LEN];

        for (index, byte) in (0u8..).zip(bytes.iter_mut()) {
            *byte = self.read_byte(index)?;
            self.state = BusState::ByteAssembled(index);
        }
        self.state = BusState::FrameComplete;

        Ok(RawFrame::new(bytes))
    }

    fn read_byte(&mut self, index: u8) -> Result<u8, Dht22Error<P::Error>> {
        let mut byte = 0;

        for i in 0..8 {
            self.state = BusState::BitSync(index * 8 + i);
            byte = (byte << 1) | self.read_bit()?; // MSB first.
        }

        Ok(byte)
    }

    fn read_bit(&mut self) -> Result<u8, Dht22Error<P::Error>> {
        // Rising edge marks the start of the bit.
        self.wait_until(PinState::High)?;

        // A high line after the settle window is a 1. The sample is taken
        // once, without debouncing.
        SyncDelay::delay_us(&mut self.dht.delay, self.dht.timing.bit_sample_us());
        let bit = u8::from(self.dht.line.is_high()?);

        // Falling edge closes the bit slot.
        self.wait_until(PinState::Low)?;

        Ok(bit)
    }

    fn wait_until(&mut self, level: PinState) -> Result<(), Dht22Error<P::Error>> {
        // Poll the line until it matches the desired level or the budget
        // runs out.
        for _ in 0..self.dht.timing.poll_budget() {
            let reached = match level {
                PinState::High => self.dht.line.is_high()?,
                PinState::Low => self.dht.line.is_low()?,
            };
            if reached {
                return Ok(());
            }
            SyncDelay::delay_us(&mut self.dht.delay, self.dht.timing.poll_interval_us());
        }

        Err(self.timed_out())
    }

    fn timed_out(&mut self) -> Dht22Error<P::Error> {
        let error = match self.state {
            BusState::BitSync(bit) => Dht22Error::BitTimeout { bit },
            _ => Dht22Error::NoPresence,
        };
        self.state = BusState::TimedOut;

        error
    }
}
