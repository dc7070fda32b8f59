// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Sensing
//!
//! Accelerometer capability and the conversion from raw acceleration to an elevation angle.
//!
//! ## Modules
//!
//! - [`angle`] - Gravity-vector to signed elevation angle, with fault detection.

pub mod angle;

pub use angle::{resolve, SensorFault, G, RAD2DEG};

/// One accelerometer sample in m/s².
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Acceleration {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Acceleration {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Source of acceleration samples for the elevation loop.
///
/// Implemented by the board's accelerometer driver, and by test doubles.
pub trait Accelerometer {
    type Error;

    /// Probe and configure the device. May be called again after a failure.
    fn begin(&mut self) -> Result<(), Self::Error>;

    /// Read the latest sample.
    fn read_acceleration(&mut self) -> Result<Acceleration, Self::Error>;
}

impl<T: Accelerometer + ?Sized> Accelerometer for &mut T {
    type Error = T::Error;

    fn begin(&mut self) -> Result<(), Self::Error> {
        (**self).begin()
    }

    fn read_acceleration(&mut self) -> Result<Acceleration, Self::Error> {
        (**self).read_acceleration()
    }
}
