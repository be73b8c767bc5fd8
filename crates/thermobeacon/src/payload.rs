use core::ops::Range;

use thermobeacon_dht22::Reading;

/// Length of the default advertisement payload.
pub const PAYLOAD_LEN: usize = 20;

/// Offset of the first temperature digit in the default payload.
pub const TEMPERATURE_OFFSET: usize = 11;
/// Offset of the first humidity digit in the default payload.
pub const HUMIDITY_OFFSET: usize = 17;

// Temperature: two digits, a decimal point, one digit.
const TEMPERATURE_LEN: usize = 4;
const DECIMAL_POINT: usize = 2;
// Humidity: two digits.
const HUMIDITY_LEN: usize = 2;

// Flags AD structure followed by the complete local name "DHT22 00.0C 00%".
const DEFAULT_PAYLOAD: [u8; PAYLOAD_LEN] = [
    0x02, 0x01, 0x06, // Flags: LE general discoverable, BR/EDR not supported.
    0x10, 0x09, // Complete local name, 15 bytes.
    b'D', b'H', b'T', b'2', b'2', b' ', b'0', b'0', b'.', b'0', b'C', b' ', b'0', b'0', b'%',
];

/// Positions of the temperature and humidity digit groups in a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    temperature: usize,
    humidity: usize,
}

impl Default for Layout {
    fn default() -> Self {
        Self::new(TEMPERATURE_OFFSET, HUMIDITY_OFFSET)
    }
}

impl Layout {
    /// Creates a [`Layout`] from the offsets of the first temperature digit
    /// and the first humidity digit.
    ///
    /// The temperature group spans four bytes: two digits, a reserved
    /// decimal-point byte, and one digit. The humidity group spans two
    /// digits.
    #[must_use]
    pub const fn new(temperature: usize, humidity: usize) -> Self {
        Self {
            temperature,
            humidity,
        }
    }

    /// Bytes covered by the temperature group.
    ///
    /// The end saturates at `usize::MAX`, a layout that does not fit in any
    /// buffer.
    #[must_use]
    pub const fn temperature_range(&self) -> Range<usize> {
        self.temperature..self.temperature.saturating_add(TEMPERATURE_LEN)
    }

    /// Bytes covered by the humidity group.
    ///
    /// The end saturates at `usize::MAX`, a layout that does not fit in any
    /// buffer.
    #[must_use]
    pub const fn humidity_range(&self) -> Range<usize> {
        self.humidity..self.humidity.saturating_add(HUMIDITY_LEN)
    }

    /// Minimum buffer length able to hold both groups.
    #[must_use]
    pub const fn required_len(&self) -> usize {
        let temperature = self.temperature_range().end;
        let humidity = self.humidity_range().end;

        if temperature > humidity {
            temperature
        } else {
            humidity
        }
    }

    /// Whether the two groups overlap.
    #[must_use]
    pub const fn overlaps(&self) -> bool {
        let t = self.temperature_range();
        let h = self.humidity_range();
        t.start < h.end && h.start < t.end
    }

    // Writes the ASCII digits of a reading. The buffer must be at least
    // `required_len` bytes long.
    pub(crate) fn render(&self, buffer: &mut [u8], reading: &Reading) {
        let [hundreds, tens, units] = reading.temperature_digits();
        let t = self.temperature;
        buffer[t] = ascii(hundreds);
        buffer[t + 1] = ascii(tens);
        // `t + DECIMAL_POINT` keeps its literal.
        buffer[t + DECIMAL_POINT + 1] = ascii(units);

        let [hundreds, tens] = reading.humidity_digits();
        let h = self.humidity;
        buffer[h] = ascii(hundreds);
        buffer[h + 1] = ascii(tens);
    }
}

#[inline]
const fn ascii(digit: u8) -> u8 {
    b'0' + digit
}

/// The default advertisement payload broadcast by a beacon.
///
/// It carries a flags structure and the complete local name
/// `DHT22 xx.xC xx%`, whose digits follow the default [`Layout`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvertisementPayload([u8; PAYLOAD_LEN]);

impl Default for AdvertisementPayload {
    fn default() -> Self {
        Self::new()
    }
}

impl AdvertisementPayload {
    /// Creates an [`AdvertisementPayload`] showing all-zero readings.
    #[must_use]
    pub const fn new() -> Self {
        Self(DEFAULT_PAYLOAD)
    }

    /// Returns the payload bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the payload bytes for in-place rendering.
    #[must_use]
    pub fn as_mut_bytes(&mut self) -> &mut [u8] {
        &mut self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout_matches_payload() {
        let payload = AdvertisementPayload::new();
        let layout = Layout::default();

        assert_eq!(&payload.as_bytes()[layout.temperature_range()], b"00.0");
        assert_eq!(&payload.as_bytes()[layout.humidity_range()], b"00");
        assert_eq!(layout.required_len(), PAYLOAD_LEN - 1);
        assert!(!layout.overlaps());
        assert_eq!(usize::from(payload.as_bytes()[3]), PAYLOAD_LEN - 4);
    }

    #[test]
    fn test_render() {
        let mut payload = AdvertisementPayload::new();
        Layout::default().render(payload.as_mut_bytes(), &Reading::new(254, 653));

        assert_eq!(&payload.as_bytes()[5..], b"DHT22 25.4C 65%");
    }

    #[test]
    fn test_render_keeps_decimal_point_byte() {
        let mut buffer = [b'#'; 8];
        Layout::new(0, 5).render(&mut buffer, &Reading::new(27, 160));

        assert_eq!(&buffer, b"02#7#16#");
    }

    #[test]
    fn test_ranges_saturate() {
        let layout = Layout::new(usize::MAX - 1, usize::MAX);

        assert_eq!(layout.temperature_range(), usize::MAX - 1..usize::MAX);
        assert_eq!(layout.humidity_range(), usize::MAX..usize::MAX);
        assert_eq!(layout.required_len(), usize::MAX);
    }

    #[test]
    fn test_overlapping_layout() {
        assert!(Layout::new(0, 3).overlaps());
        assert!(Layout::new(3, 2).overlaps());
        assert!(!Layout::new(0, 4).overlaps());
        assert!(!Layout::new(2, 0).overlaps());
    }
}
