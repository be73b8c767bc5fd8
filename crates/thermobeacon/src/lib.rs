//! The publishing side of a `DHT22` beacon.
//!
//! This crate provides APIs to:
//!
//! - Describe the advertisement payload a beacon broadcasts and where the
//!   temperature and humidity digits live inside it.
//! - Render a [`thermobeacon_dht22::Reading`] as ASCII digits into that
//!   payload, only when the radio reports the buffer is safe to mutate.
//! - Drive a periodic [`station::Station`] that performs one sensor read per
//!   trigger and publishes the result.
//!
//! A failed read never touches the payload, so the last published values
//! stay visible until a new reading arrives.
//!
//! This crate is `no_std` and does not allocate.

#![deny(missing_docs)]
#![forbid(unsafe_code)]
#![no_std]

#[cfg(test)]
extern crate std;

/// Advertisement payload and digit layout.
pub mod payload;
/// Readiness-gated rendering of readings.
pub mod publisher;
/// The periodic read-and-publish loop.
pub mod station;

pub use thermobeacon_dht22 as dht22;
