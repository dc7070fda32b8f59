// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Elevation angle from the gravity vector.
//!
//! The accelerometer is mounted so that its X axis tilts with the launcher rail. `asin(ax / G)`
//! alone only covers ±90°, so the sign of the Y axis picks which half of the circle the rail is
//! in. The resulting frame covers (0, 180] above the horizon and [-180, 0) below it.
//!
//! `asinf` from `libm` is used rather than `micromath`'s approximation because overload
//! detection relies on IEEE behaviour: any input outside [-1, 1] must come back as NaN.

use super::Acceleration;

/// Standard gravity (m/s²).
pub const G: f32 = 9.80665;

/// Radians to degrees.
pub const RAD2DEG: f32 = 180.0 / core::f32::consts::PI;

/// Reasons a sample cannot be turned into an angle.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SensorFault {
    /// Both X and Y resolve to exactly zero degrees, which is what a loose connector looks like.
    Disconnected,
    /// The X reading exceeds 1 g, e.g. a shock past the sensor's range.
    Overloaded,
}

/// Convert a sample into the launcher's signed elevation angle (degrees).
pub fn resolve(accel: Acceleration) -> Result<f32, SensorFault> {
    let angle_y = libm::asinf(accel.y / G) * RAD2DEG;
    // X axis is mounted inverted
    let mut angle_x = -(libm::asinf(accel.x / G) * RAD2DEG);

    // Judged on the angles, so readings too small to survive `/ G` count as zero too.
    if angle_x == 0.0 && angle_y == 0.0 {
        return Err(SensorFault::Disconnected);
    }
    if angle_x.is_nan() {
        return Err(SensorFault::Overloaded);
    }

    // Positive Y means the rail is past vertical: fold X into the far quadrant.
    if angle_y > 0.0 {
        if angle_x > 0.0 {
            angle_x = 180.0 - angle_x;
        } else {
            angle_x = -180.0 - angle_x;
        }
    }

    Ok(angle_x)
}
