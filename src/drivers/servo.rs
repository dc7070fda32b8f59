// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Hobby servo driven by pulse width.
//!
//! Commands are degrees of travel in [0, 180], mapped linearly onto a pulse between `min_us` and
//! `max_us`. The defaults (544 µs to 2400 µs) match the common Arduino servo timing, which is what
//! the elevation servo was trimmed against.

use crate::control::output::{COMMAND_MAX, COMMAND_MIN};
use crate::drivers::Actuator;

/// Default pulse width at 0°.
pub const MIN_PULSE_US: u16 = 544;
/// Default pulse width at 180°.
pub const MAX_PULSE_US: u16 = 2400;

/// A PWM channel that can hold a pulse of a given width each frame.
pub trait PulseOutput {
    fn set_pulse_us(&mut self, us: u16);
}

pub struct Servo<P> {
    pwm: P,
    min_us: u16,
    max_us: u16,
    degrees: f32,
}

impl<P: PulseOutput> Servo<P> {
    /// Wrap a PWM channel using the default pulse range. The servo is not moved until the first
    /// write.
    pub fn new(pwm: P) -> Self {
        Self::with_pulse_range(pwm, MIN_PULSE_US, MAX_PULSE_US)
    }

    pub fn with_pulse_range(pwm: P, min_us: u16, max_us: u16) -> Self {
        Self {
            pwm,
            min_us,
            max_us,
            degrees: f32::NAN,
        }
    }

    /// Pulse width for a command, clamped to the servo's travel.
    pub fn pulse_for(&self, degrees: f32) -> u16 {
        let degrees = if degrees.is_nan() {
            (COMMAND_MIN + COMMAND_MAX) / 2.0
        } else {
            degrees.clamp(COMMAND_MIN, COMMAND_MAX)
        };
        let span = self.max_us as f32 - self.min_us as f32;
        let fraction = (degrees - COMMAND_MIN) / (COMMAND_MAX - COMMAND_MIN);
        (self.min_us as f32 + fraction * span + 0.5) as u16
    }

    /// Last commanded position (NaN before the first write).
    #[inline]
    pub fn degrees(&self) -> f32 {
        self.degrees
    }

    pub fn free(self) -> P {
        self.pwm
    }
}

impl<P: PulseOutput> Actuator for Servo<P> {
    fn write_degrees(&mut self, degrees: f32) {
        let us = self.pulse_for(degrees);
        self.pwm.set_pulse_us(us);
        self.degrees = degrees;
    }
}
