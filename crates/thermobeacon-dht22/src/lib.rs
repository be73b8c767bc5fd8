//! `thermobeacon-dht22` is a library crate that provides an
//! architecture-agnostic driver for the `DHT22` temperature and humidity
//! sensor.
//!
//! The driver talks to the sensor over a bidirectional single-wire bus with
//! no clock signal, so every step of a transaction is software-timed.
//! Timing-critical phases run inside a critical section provided by the
//! [`critical-section`] crate, while the line and the delay provider are
//! abstracted through the [`embedded-hal`] and [`embedded-hal-async`] traits.
//!
//! A transaction produces a checksum-validated [`frame::Frame`], which is
//! then decoded into a fixed-point [`reading::Reading`].
//!
//! [`critical-section`]: https://crates.io/crates/critical-section
//! [`embedded-hal`]: https://crates.io/crates/embedded-hal
//! [`embedded-hal-async`]: https://crates.io/crates/embedded-hal-async

#![deny(missing_docs)]
#![no_std]

#[cfg(test)]
extern crate std;

// The only module allowed to use `unsafe`, for the raw critical section.
mod atomic;

/// The `DHT22` driver.
#[forbid(unsafe_code)]
pub mod dht22;
/// Raw and validated sensor frames.
#[forbid(unsafe_code)]
pub mod frame;
/// The single-wire line capability.
#[forbid(unsafe_code)]
pub mod line;
/// Decoded measurements.
#[forbid(unsafe_code)]
pub mod reading;
/// Bus timing configuration.
#[forbid(unsafe_code)]
pub mod timing;

pub use dht22::{BusState, Dht22, Dht22Error};
pub use frame::{Frame, RawFrame};
pub use line::{DriveMode, Line, LineSnapshot, OpenDrain};
pub use reading::Reading;
pub use timing::Timing;
