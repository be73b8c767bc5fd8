use embedded_hal::digital::{ErrorType, InputPin, OutputPin, PinState};

/// Drive modes a single-wire line must support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveMode {
    /// Strong drive, used to emit the reset pulse.
    Output,
    /// High impedance with pull-up, used while sampling the sensor.
    InputPullUp,
    /// Analog high impedance, used while the chip sleeps.
    Disconnected,
}

/// A bidirectional digital line with a configurable drive mode.
///
/// The driver writes the line through [`OutputPin`], samples it through
/// [`InputPin`], and switches between driving and sampling through
/// [`Line::set_drive_mode`].
pub trait Line: InputPin + OutputPin {
    /// Changes the drive mode of the line.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying pin cannot be reconfigured.
    fn set_drive_mode(&mut self, mode: DriveMode) -> Result<(), Self::Error>;
}

/// A [`Line`] backed by an open-drain pin with an external pull-up.
///
/// An open-drain pin never needs reconfiguring: writing a high level
/// releases the bus and the sensor is free to pull it low.
#[derive(Debug)]
pub struct OpenDrain<P>(P);

impl<P> OpenDrain<P>
where
    P: InputPin + OutputPin,
{
    /// Wraps an open-drain pin.
    #[must_use]
    pub const fn new(pin: P) -> Self {
        Self(pin)
    }

    /// Returns the wrapped pin.
    #[must_use]
    pub fn into_inner(self) -> P {
        self.0
    }
}

impl<P: ErrorType> ErrorType for OpenDrain<P> {
    type Error = P::Error;
}

impl<P: InputPin> InputPin for OpenDrain<P> {
    #[inline]
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.0.is_high()
    }

    #[inline]
    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.0.is_low()
    }
}

impl<P: OutputPin> OutputPin for OpenDrain<P> {
    #[inline]
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.set_low()
    }

    #[inline]
    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.set_high()
    }
}

impl<P> Line for OpenDrain<P>
where
    P: InputPin + OutputPin,
{
    #[inline]
    fn set_drive_mode(&mut self, _mode: DriveMode) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Line configuration saved before the chip enters a low-power mode.
///
/// A snapshot is returned by [`crate::Dht22::suspend`] and must be handed
/// back to [`crate::Dht22::resume`], which consumes it.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a suspended line stays disconnected until its snapshot is resumed"]
pub struct LineSnapshot {
    pub(crate) mode: DriveMode,
    pub(crate) level: PinState,
}

impl LineSnapshot {
    /// Returns the drive mode the line had before suspension.
    #[must_use]
    pub const fn mode(&self) -> DriveMode {
        self.mode
    }

    /// Returns the level last written to the line before suspension.
    #[must_use]
    pub const fn level(&self) -> PinState {
        self.level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use embedded_hal_mock::eh1::digital::{Mock as PinMock, State, Transaction as PinTransaction};

    #[test]
    fn test_open_drain_forwards_pin_operations() {
        let expectations = [
            PinTransaction::set(State::Low),
            PinTransaction::set(State::High),
            PinTransaction::get(State::Low),
            PinTransaction::get(State::High),
        ];

        let mut pin = PinMock::new(&expectations);
        let mut line = OpenDrain::new(pin.clone());

        line.set_drive_mode(DriveMode::Output).unwrap();
        line.set_low().unwrap();
        line.set_high().unwrap();
        line.set_drive_mode(DriveMode::InputPullUp).unwrap();
        assert!(line.is_low().unwrap());
        assert!(line.is_high().unwrap());

        pin.done();
    }
}
