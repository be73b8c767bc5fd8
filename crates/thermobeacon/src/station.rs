use embedded_hal::delay::DelayNs as SyncDelay;

use log::{debug, error, warn};

use thermobeacon_dht22::{Dht22, Line, Reading};

use crate::payload::{AdvertisementPayload, Layout};
use crate::publisher::{PublishError, Publication, check_layout, publish};

/// The radio broadcasting the advertisement payload.
pub trait Radio {
    /// Whether the current advertisement event is closed, that is whether
    /// the payload is safe to mutate.
    fn event_closed(&self) -> bool;

    /// Hands the updated payload over to the radio.
    fn update_advertisement(&mut self, payload: &[u8]);
}

/// Result of a single [`Station::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The reading has been rendered and handed to the radio.
    Published(Reading),
    /// The reading is valid, but the radio was busy.
    ///
    /// It is dropped and the payload is left untouched.
    Withheld(Reading),
    /// The sensor read failed. The payload is left untouched.
    Unavailable,
}

/// A beacon station.
///
/// On every external trigger, such as an advertisement tick or a timer,
/// the station performs exactly one sensor read. A successful reading is
/// published when the radio allows it. A failed read leaves the previously
/// published values in place, and the next trigger is the retry.
pub struct Station<P, D, R>
where
    P: Line,
    D: SyncDelay,
    R: Radio,
{
    sensor: Dht22<P, D>,
    radio: R,
    payload: AdvertisementPayload,
    layout: Layout,
    published: Option<Reading>,
    failures: u32,
}

impl<P, D, R> Station<P, D, R>
where
    P: Line,
    D: SyncDelay,
    R: Radio,
{
    /// Creates a [`Station`] broadcasting the default
    /// [`AdvertisementPayload`] with the default [`Layout`].
    #[must_use]
    pub fn new(sensor: Dht22<P, D>, radio: R) -> Self {
        Self {
            sensor,
            radio,
            payload: AdvertisementPayload::new(),
            layout: Layout::default(),
            published: None,
            failures: 0,
        }
    }

    /// Creates a [`Station`] with a custom payload and layout.
    ///
    /// # Errors
    ///
    /// Returns an error if the layout cannot be rendered into the payload.
    pub fn with_payload(
        sensor: Dht22<P, D>,
        radio: R,
        payload: AdvertisementPayload,
        layout: Layout,
    ) -> Result<Self, PublishError> {
        check_layout(&layout, payload.as_bytes().len())?;

        Ok(Self {
            sensor,
            radio,
            payload,
            layout,
            published: None,
            failures: 0,
        })
    }

    /// Performs one read and publishes the result.
    pub fn tick(&mut self) -> Outcome {
        match self.sensor.read() {
            Ok(reading) => self.accept(reading),
            Err(e) => {
                self.reject(&e);
                Outcome::Unavailable
            }
        }
    }

    /// Returns the last published reading, if any.
    #[must_use]
    pub const fn published(&self) -> Option<Reading> {
        self.published
    }

    /// Returns the number of consecutive failed reads.
    #[must_use]
    pub const fn consecutive_failures(&self) -> u32 {
        self.failures
    }

    /// Returns the current advertisement payload.
    #[must_use]
    pub const fn payload(&self) -> &AdvertisementPayload {
        &self.payload
    }

    /// Returns the sensor driver, for instance to suspend its line before
    /// entering a low-power mode.
    pub fn sensor(&mut self) -> &mut Dht22<P, D> {
        &mut self.sensor
    }

    /// Returns the radio.
    #[must_use]
    pub const fn radio(&self) -> &R {
        &self.radio
    }

    /// Releases the sensor driver and the radio.
    #[must_use]
    pub fn release(self) -> (Dht22<P, D>, R) {
        (self.sensor, self.radio)
    }

    fn accept(&mut self, reading: Reading) -> Outcome {
        self.failures = 0;

        let ready = self.radio.event_closed();
        match publish(self.payload.as_mut_bytes(), &self.layout, &reading, ready) {
            Ok(Publication::Published) => {
                self.radio.update_advertisement(self.payload.as_bytes());
                self.published = Some(reading);
                debug!("Published {reading}");
                Outcome::Published(reading)
            }
            Ok(Publication::Skipped) => {
                debug!("Advertisement event still open, {reading} not published");
                Outcome::Withheld(reading)
            }
            Err(e) => {
                error!("Cannot publish {reading}: {e}");
                Outcome::Withheld(reading)
            }
        }
    }

    fn reject<E: core::fmt::Display>(&mut self, e: &E) {
        self.failures = self.failures.saturating_add(1);
        warn!(
            "Reading unavailable ({} consecutive failures): {e}",
            self.failures
        );
    }
}

#[cfg(feature = "async")]
impl<P, D, R> Station<P, D, R>
where
    P: Line,
    D: SyncDelay + embedded_hal_async::delay::DelayNs,
    R: Radio,
{
    /// Performs one read, awaiting the sensor reset pulse, and publishes the
    /// result.
    pub async fn tick_async(&mut self) -> Outcome {
        match self.sensor.read_async().await {
            Ok(reading) => self.accept(reading),
            Err(e) => {
                self.reject(&e);
                Outcome::Unavailable
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    extern crate std;
    use std::vec;
    use std::vec::Vec;

    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::digital::{Mock as PinMock, State, Transaction as PinTransaction};

    use serial_test::serial;

    use thermobeacon_dht22::OpenDrain;

    use crate::payload::PAYLOAD_LEN;

    #[derive(Default)]
    struct FakeRadio {
        closed: bool,
        updates: Vec<Vec<u8>>,
    }

    impl Radio for FakeRadio {
        fn event_closed(&self) -> bool {
            self.closed
        }

        fn update_advertisement(&mut self, payload: &[u8]) {
            self.updates.push(payload.to_vec());
        }
    }

    fn successful_read(bytes: [u8; 5]) -> Vec<PinTransaction> {
        let mut expectations = vec![
            // Reset pulse.
            PinTransaction::set(State::Low),
            PinTransaction::set(State::High),
            // Presence pulses.
            PinTransaction::get(State::Low),
            PinTransaction::get(State::High),
            PinTransaction::get(State::Low),
        ];
        for byte in bytes {
            for i in (0..8).rev() {
                let level = if (byte >> i) & 1 == 1 {
                    State::High
                } else {
                    State::Low
                };
                expectations.push(PinTransaction::get(State::High));
                expectations.push(PinTransaction::get(level));
                expectations.push(PinTransaction::get(State::Low));
            }
        }
        expectations
    }

    fn absent_sensor() -> Vec<PinTransaction> {
        let mut expectations = vec![
            PinTransaction::set(State::Low),
            PinTransaction::set(State::High),
        ];
        expectations.extend(vec![PinTransaction::get(State::High); 100]);
        expectations
    }

    fn station(
        expectations: &[PinTransaction],
        closed: bool,
    ) -> (Station<OpenDrain<PinMock>, NoopDelay, FakeRadio>, PinMock) {
        let pin = PinMock::new(expectations);
        let sensor = Dht22::new(OpenDrain::new(pin.clone()), NoopDelay::new());
        let radio = FakeRadio {
            closed,
            updates: Vec::new(),
        };
        (Station::new(sensor, radio), pin)
    }

    #[test]
    #[serial]
    fn test_tick_publishes_reading() {
        let (mut station, mut pin) = station(&successful_read([0x02, 0x8C, 0x01, 0x11, 0xA0]), true);

        assert_eq!(station.tick(), Outcome::Published(Reading::new(27, 160)));
        assert_eq!(station.published(), Some(Reading::new(27, 160)));
        assert_eq!(&station.payload().as_bytes()[5..], b"DHT22 02.7C 16%");

        let (_, radio) = station.release();
        assert_eq!(radio.updates.len(), 1);
        assert_eq!(radio.updates[0].len(), PAYLOAD_LEN);

        pin.done();
    }

    #[test]
    #[serial]
    fn test_tick_withholds_while_event_open() {
        let (mut station, mut pin) = station(&successful_read([0x02, 0x8C, 0x01, 0x11, 0xA0]), false);

        assert_eq!(station.tick(), Outcome::Withheld(Reading::new(27, 160)));
        assert_eq!(station.published(), None);
        assert_eq!(station.payload(), &AdvertisementPayload::new());
        assert!(station.radio().updates.is_empty());

        pin.done();
    }

    #[test]
    #[serial]
    fn test_failed_read_keeps_published_values() {
        let mut expectations = successful_read([0x02, 0x8C, 0x01, 0x11, 0xA0]);
        expectations.extend(absent_sensor());
        expectations.extend(successful_read([0x02, 0x8C, 0x01, 0x11, 0x9E]));

        let (mut station, mut pin) = station(&expectations, true);

        assert!(matches!(station.tick(), Outcome::Published(_)));
        let published = station.payload().clone();

        assert_eq!(station.tick(), Outcome::Unavailable);
        assert_eq!(station.tick(), Outcome::Unavailable);
        assert_eq!(station.consecutive_failures(), 2);
        assert_eq!(station.payload(), &published);
        assert_eq!(station.published(), Some(Reading::new(27, 160)));
        assert_eq!(station.radio().updates.len(), 1);

        pin.done();
    }

    #[test]
    #[serial]
    fn test_success_resets_failure_count() {
        let mut expectations = absent_sensor();
        expectations.extend(successful_read([0x00, 0x05, 0x02, 0x03, 0x0A]));

        let (mut station, mut pin) = station(&expectations, true);

        assert_eq!(station.tick(), Outcome::Unavailable);
        assert_eq!(station.consecutive_failures(), 1);
        assert_eq!(station.tick(), Outcome::Published(Reading::new(23, 5)));
        assert_eq!(station.consecutive_failures(), 0);

        pin.done();
    }

    #[test]
    fn test_with_payload_rejects_invalid_layout() {
        let (sensor, mut pin) = {
            let pin = PinMock::new(&[] as &[PinTransaction]);
            (
                Dht22::new(OpenDrain::new(pin.clone()), NoopDelay::new()),
                pin,
            )
        };

        let result = Station::with_payload(
            sensor,
            FakeRadio::default(),
            AdvertisementPayload::new(),
            Layout::new(18, 0),
        );
        assert!(matches!(
            result,
            Err(PublishError::BufferTooShort {
                required: 22,
                len: PAYLOAD_LEN
            })
        ));

        pin.done();
    }

    #[test]
    fn test_suspend_through_station() {
        let (mut station, mut pin) = station(&[PinTransaction::set(State::High)], true);

        let snapshot = station.sensor().suspend().unwrap();
        station.sensor().resume(snapshot).unwrap();

        pin.done();
    }

    #[cfg(feature = "async")]
    #[tokio::test]
    #[serial]
    async fn test_tick_async_publishes_reading() {
        let (mut station, mut pin) = station(&successful_read([0x02, 0x8C, 0x01, 0x11, 0xA0]), true);

        assert_eq!(
            station.tick_async().await,
            Outcome::Published(Reading::new(27, 160))
        );

        pin.done();
    }
}
