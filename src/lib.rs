#![cfg_attr(not(test), no_std)]

//! A driver for the HX711 24-bit load cell ADC, bit-banged over two
//! `embedded-hal` lines.
//!
//! The clock line (PD_SCK) is driven by the host, the data line (DOUT) by the
//! chip. Channel A is read at gain 128 or 64, channel B at gain 32. Each
//! channel keeps its own offset and reference unit, so raw readings can be
//! turned into weights with [`hx711::Hx711::get_weight`].

pub mod error;
pub mod hx711;
pub mod line_map;

pub use error::Error;
pub use hx711::{Channel, Gain, Hx711};

/// Channel A view of a load cell, for callers that only wire up one bridge.
pub trait LoadCell {
    type Error;

    /// Read one raw value from the load cell
    fn read(&mut self) -> Result<i32, Self::Error>;

    /// Read the value after removing the offset and dividing by the scale,
    /// filtering `num_samples` readings through a median.
    fn read_scaled(&mut self, num_samples: usize) -> Result<f32, Self::Error>;

    /// Zero the load cell offset by averaging `num_samples` readings.
    /// Returns the new offset.
    fn tare(&mut self, num_samples: usize) -> Result<f32, Self::Error>;

    /// Get the load cell offset.
    fn get_offset(&self) -> f32;

    /// Set the scale (AKA calibrate the scale).
    /// Use this to ensure that 1kg ~ 1kg
    fn set_scale(&mut self, scale: f32) -> Result<(), Self::Error>;

    /// Get the scale.
    fn get_scale(&self) -> f32;
}
