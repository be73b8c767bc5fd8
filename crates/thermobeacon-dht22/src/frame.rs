/// Number of bytes transmitted by the sensor in a single transaction.
pub const FRAME_LEN: usize = 5;

/// The checksum carried by a frame does not match its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChecksumError {
    /// Checksum computed from the four payload bytes.
    pub expected: u8,
    /// Checksum byte received from the sensor.
    pub received: u8,
}

impl core::fmt::Display for ChecksumError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "checksum mismatch: expected {:#04x}, received {:#04x}",
            self.expected, self.received
        )
    }
}

/// The five bytes received in one transaction, not yet validated.
///
/// Layout: humidity high, humidity low, temperature high, temperature low,
/// checksum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawFrame([u8; FRAME_LEN]);

impl RawFrame {
    /// Creates a [`RawFrame`] from the received bytes.
    #[must_use]
    pub const fn new(bytes: [u8; FRAME_LEN]) -> Self {
        Self(bytes)
    }

    /// Returns the received bytes.
    #[must_use]
    pub const fn bytes(&self) -> [u8; FRAME_LEN] {
        self.0
    }

    /// Returns the checksum byte received from the sensor.
    #[must_use]
    pub const fn checksum(&self) -> u8 {
        self.0[4]
    }

    /// Returns the low 8 bits of the sum of the four payload bytes.
    #[must_use]
    pub const fn expected_checksum(&self) -> u8 {
        self.0[0]
            .wrapping_add(self.0[1])
            .wrapping_add(self.0[2])
            .wrapping_add(self.0[3])
    }

    /// Validates the checksum, consuming the raw frame.
    ///
    /// A frame failing validation is discarded entirely.
    ///
    /// # Errors
    ///
    /// Returns a [`ChecksumError`] if the received checksum differs from
    /// the one computed over the payload.
    pub const fn validate(self) -> Result<Frame, ChecksumError> {
        let expected = self.expected_checksum();
        let received = self.checksum();

        if expected == received {
            Ok(Frame([self.0[0], self.0[1], self.0[2], self.0[3]]))
        } else {
            Err(ChecksumError { expected, received })
        }
    }
}

/// A checksum-validated frame payload.
///
/// A [`Frame`] can only be obtained through [`RawFrame::validate`], so the
/// decoder never sees corrupted data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame([u8; 4]);

impl Frame {
    /// Humidity high byte.
    #[must_use]
    pub const fn humidity_high(&self) -> u8 {
        self.0[0]
    }

    /// Humidity low byte.
    #[must_use]
    pub const fn humidity_low(&self) -> u8 {
        self.0[1]
    }

    /// Temperature high byte.
    #[must_use]
    pub const fn temperature_high(&self) -> u8 {
        self.0[2]
    }

    /// Temperature low byte.
    #[must_use]
    pub const fn temperature_low(&self) -> u8 {
        self.0[3]
    }

    /// Returns the four payload bytes.
    #[must_use]
    pub const fn payload(&self) -> [u8; 4] {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_checksum() {
        let frame = RawFrame::new([0x02, 0x8C, 0x01, 0x11, 0xA0]).validate().unwrap();

        assert_eq!(frame.humidity_high(), 0x02);
        assert_eq!(frame.humidity_low(), 0x8C);
        assert_eq!(frame.temperature_high(), 0x01);
        assert_eq!(frame.temperature_low(), 0x11);
    }

    #[test]
    fn test_checksum_wraps() {
        let raw = RawFrame::new([0xFF, 0xFF, 0xFF, 0xFF, 0xFC]);

        assert_eq!(raw.expected_checksum(), 0xFC);
        assert!(raw.validate().is_ok());
    }

    #[test]
    fn test_every_wrong_checksum_is_rejected() {
        // The payload sum takes every value in 0..=255 as the first byte
        // varies, so every (sum, checksum) pair is covered.
        let (hl, th, tl) = (0x8C_u8, 0x01_u8, 0x11_u8);

        for hh in 0..=u8::MAX {
            let expected = hh.wrapping_add(hl).wrapping_add(th).wrapping_add(tl);

            for checksum in 0..=u8::MAX {
                let result = RawFrame::new([hh, hl, th, tl, checksum]).validate();
                if checksum == expected {
                    assert_eq!(result.map(|frame| frame.payload()), Ok([hh, hl, th, tl]));
                } else {
                    assert_eq!(
                        result,
                        Err(ChecksumError {
                            expected,
                            received: checksum
                        })
                    );
                }
            }
        }
    }

    #[test]
    fn test_mistyped_checksum_is_rejected() {
        // 0x02 + 0x8C + 0x01 + 0x11 is 0xA0, not 0x9E.
        let result = RawFrame::new([0x02, 0x8C, 0x01, 0x11, 0x9E]).validate();
        assert_eq!(
            result,
            Err(ChecksumError {
                expected: 0xA0,
                received: 0x9E
            })
        );
    }
}
