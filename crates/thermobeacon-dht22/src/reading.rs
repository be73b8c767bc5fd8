use crate::frame::Frame;

/// A decoded humidity and temperature measurement in fixed-point units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Reading {
    /// Temperature in hundredths of a degree Celsius.
    pub temperature_centidegrees: i16,
    /// Relative humidity in tenths of a percent.
    pub humidity_deci_percent: u16,
}

impl Reading {
    /// Creates a [`Reading`] from already scaled values.
    #[must_use]
    pub const fn new(temperature_centidegrees: i16, humidity_deci_percent: u16) -> Self {
        Self {
            temperature_centidegrees,
            humidity_deci_percent,
        }
    }

    /// Decodes a frame treating each byte as a decimal digit group.
    ///
    /// - temperature = temperature high × 10 + temperature low
    /// - humidity = humidity high × 10 + humidity low
    ///
    /// This is the arithmetic deployed beacons publish. It does not follow
    /// the sensor's documented big-endian encoding, see
    /// [`Reading::decode_native`] for that one.
    #[must_use]
    pub const fn decode(frame: &Frame) -> Self {
        // 255 * 10 + 255 fits in both an `i16` and a `u16`.
        let temperature = frame.temperature_high() as i16 * 10 + frame.temperature_low() as i16;
        let humidity = frame.humidity_high() as u16 * 10 + frame.humidity_low() as u16;

        Self::new(temperature, humidity)
    }

    /// Decodes a frame following the sensor's datasheet.
    ///
    /// Humidity and temperature are big-endian 16-bit values in tenths, and
    /// the most significant bit of the temperature is its sign.
    #[must_use]
    pub const fn decode_native(frame: &Frame) -> Self {
        let humidity = u16::from_be_bytes([frame.humidity_high(), frame.humidity_low()]);

        let raw = u16::from_be_bytes([frame.temperature_high() & 0x7F, frame.temperature_low()]);
        // Tenths to hundredths.
        let mut temperature = (raw as i16).saturating_mul(10);
        if frame.temperature_high() & 0x80 != 0 {
            temperature = -temperature;
        }

        Self::new(temperature, humidity)
    }

    /// Returns the three decimal digits rendered for the temperature.
    ///
    /// Digits are hundreds, tens, and units of the absolute value, which is
    /// reduced modulo 1000.
    #[must_use]
    pub const fn temperature_digits(&self) -> [u8; 3] {
        let value = self.temperature_centidegrees.unsigned_abs() % 1000;
        [
            (value / 100) as u8,
            (value / 10 % 10) as u8,
            (value % 10) as u8,
        ]
    }

    /// Returns the two decimal digits rendered for the humidity.
    ///
    /// Digits are the hundreds and tens of the value, the tenths digit is
    /// dropped.
    #[must_use]
    pub const fn humidity_digits(&self) -> [u8; 2] {
        let value = self.humidity_deci_percent;
        [(value / 100 % 10) as u8, (value / 10 % 10) as u8]
    }
}

impl core::fmt::Display for Reading {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let t = self.temperature_centidegrees;
        let h = self.humidity_deci_percent;
        write!(
            f,
            "{}{}.{:02} °C, {}.{} % RH",
            if t < 0 { "-" } else { "" },
            t.unsigned_abs() / 100,
            t.unsigned_abs() % 100,
            h / 10,
            h % 10
        )
    }
}

impl From<Frame> for Reading {
    fn from(frame: Frame) -> Self {
        Self::decode(&frame)
    }
}
