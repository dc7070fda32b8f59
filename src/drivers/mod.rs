// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Device-Specific Drivers
//!
//! This module contains device-specific drivers that sit above the raw `hw/` layer and below the
//! control logic.
//!
//! ## Existing drivers
//!
//! - [`lis3dh`] – ST LIS3DH 3-axis accelerometer over 4-wire SPI
//! - [`servo`] – Hobby servo positioned by pulse width

pub mod lis3dh;
pub mod servo;

#[cfg(feature = "firmware")]
pub use lis3dh::Lis3dh;
pub use servo::Servo;

/// Anything that can be sent a position command in degrees of travel, [0, 180].
pub trait Actuator {
    fn write_degrees(&mut self, degrees: f32);
}

impl<T: Actuator + ?Sized> Actuator for &mut T {
    #[inline]
    fn write_degrees(&mut self, degrees: f32) {
        (**self).write_degrees(degrees)
    }
}
