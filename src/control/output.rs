// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Mapping from the PID corrective signal to a servo command.
//!
//! The signal range [-100, 100] maps linearly onto [0, 180] degrees of servo travel. The result
//! is kept as `f32` without rounding, so `u = 13.75` becomes exactly `90 + 13.75 * 0.9`.

/// Command that holds the actuator still.
pub const NEUTRAL: f32 = 90.0;

/// Lowest servo command (degrees).
pub const COMMAND_MIN: f32 = 0.0;
/// Highest servo command (degrees).
pub const COMMAND_MAX: f32 = 180.0;

/// Magnitude of the PID signal that maps onto a full half-stroke.
pub const SIGNAL_LIMIT: f32 = 100.0;

/// Map a corrective signal onto the servo range.
///
/// Out-of-range signals saturate at the ends of travel. A NaN signal yields [`NEUTRAL`].
pub fn to_command(u: f32) -> f32 {
    if u.is_nan() {
        return NEUTRAL;
    }
    // Multiply before dividing so round signals map to exact commands.
    let travel = u * (COMMAND_MAX - COMMAND_MIN) / (2.0 * SIGNAL_LIMIT);
    (NEUTRAL + travel).clamp(COMMAND_MIN, COMMAND_MAX)
}
