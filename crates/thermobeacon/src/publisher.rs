use thermobeacon_dht22::Reading;

use crate::payload::Layout;

/// Result of a publish request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Publication {
    /// The digits have been rendered into the buffer.
    Published,
    /// The buffer was not safe to mutate and has been left untouched.
    ///
    /// The reading is dropped, not queued.
    Skipped,
}

/// Errors that may occur when publishing a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishError {
    /// The layout does not fit in the buffer.
    BufferTooShort {
        /// Minimum length required by the layout.
        required: usize,
        /// Actual buffer length.
        len: usize,
    },
    /// The temperature and humidity groups overlap.
    OverlappingLayout,
}

impl core::fmt::Display for PublishError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::BufferTooShort { required, len } => write!(
                f,
                "the payload buffer is {len} bytes long, the layout requires {required}"
            ),
            Self::OverlappingLayout => f.write_str("the digit groups overlap"),
        }
    }
}

/// Checks that a layout can be rendered into a buffer of the given length.
///
/// # Errors
///
/// Returns an error if the groups overlap or do not fit.
pub const fn check_layout(layout: &Layout, len: usize) -> Result<(), PublishError> {
    if layout.overlaps() {
        return Err(PublishError::OverlappingLayout);
    }

    let required = layout.required_len();
    if len < required {
        return Err(PublishError::BufferTooShort { required, len });
    }

    Ok(())
}

/// Renders a reading as ASCII digits into an externally owned buffer.
///
/// The buffer is only written when `ready` is `true`, that is when its
/// owner reports it is safe to mutate. Otherwise the call leaves the buffer
/// byte-for-byte unchanged and returns [`Publication::Skipped`].
///
/// # Errors
///
/// Returns an error if the layout is invalid for the buffer, in which case
/// the buffer is never written.
pub fn publish(
    buffer: &mut [u8],
    layout: &Layout,
    reading: &Reading,
    ready: bool,
) -> Result<Publication, PublishError> {
    check_layout(layout, buffer.len())?;

    if !ready {
        return Ok(Publication::Skipped);
    }

    layout.render(buffer, reading);

    Ok(Publication::Published)
}
