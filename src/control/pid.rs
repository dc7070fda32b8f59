// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! PID controller for the elevation loop.
//!
//! Works in `no_std` and does not allocate memory.
//!
//! The loop runs at a fixed rate, so the integral and derivative terms are per-cycle sums and
//! differences rather than time-scaled quantities. Anti-windup is done two ways: the integrator
//! only accumulates while the actuator sat near neutral on the previous cycle, and it is hard
//! clamped afterwards.

#[cfg(not(test))]
use micromath::F32Ext;

use crate::control::output::NEUTRAL;

/// PID controller with deadband, conditional integration and output clamping.
#[derive(Clone, Debug)]
pub struct Pid {
    /// Proportional gain
    kp: f32,
    /// Integral gain
    ki: f32,
    /// Derivative gain
    kd: f32,

    /// Accumulated error
    integral: f32,
    /// Error of the previous cycle (for derivative term)
    prev_error: f32,

    /// Output clamp
    out_min: f32,
    out_max: f32,

    /// Integral anti-windup clamp
    int_min: f32,
    int_max: f32,

    /// Errors with magnitude at or below this are treated as zero.
    deadband: f32,
    in_deadband: bool,

    /// The integrator only runs when the previous command was closer than this to neutral.
    saturation_window: f32,
}

impl Pid {
    /// Create a new PID controller.
    ///
    /// `kp`, `ki`, `kd` are the gain constants. Limits default to the elevation loop's values:
    /// output in [-100, 100], integral in [-500, 500], no deadband, integration window of 5.
    pub fn new(kp: f32, ki: f32, kd: f32) -> Self {
        Self {
            kp,
            ki,
            kd,

            integral: 0.0,
            prev_error: 0.0,

            out_min: -100.0,
            out_max: 100.0,

            int_min: -500.0,
            int_max: 500.0,

            deadband: 0.0,
            in_deadband: false,

            saturation_window: 5.0,
        }
    }

    /// Set output limits.
    pub fn with_output_limits(mut self, min: f32, max: f32) -> Self {
        self.out_min = min;
        self.out_max = max;
        self
    }

    /// Set integral limits for anti-windup.
    pub fn with_integral_limits(mut self, min: f32, max: f32) -> Self {
        self.int_min = min;
        self.int_max = max;
        self
    }

    /// Set the half-width of the zero-error window around the setpoint.
    pub fn with_deadband(mut self, tolerance: f32) -> Self {
        self.deadband = tolerance;
        self
    }

    /// Set how far from neutral the previous command may be while still integrating.
    pub fn with_saturation_window(mut self, window: f32) -> Self {
        self.saturation_window = window;
        self
    }

    pub fn set_gains(&mut self, kp: f32, ki: f32, kd: f32) {
        self.kp = kp;
        self.ki = ki;
        self.kd = kd;
    }

    #[inline]
    pub fn kp(&self) -> f32 {
        self.kp
    }

    #[inline]
    pub fn ki(&self) -> f32 {
        self.ki
    }

    #[inline]
    pub fn kd(&self) -> f32 {
        self.kd
    }

    #[inline]
    pub fn deadband(&self) -> f32 {
        self.deadband
    }

    /// True if the last update landed inside the deadband.
    #[inline]
    pub fn in_deadband(&self) -> bool {
        self.in_deadband
    }

    #[inline]
    pub fn integral(&self) -> f32 {
        self.integral
    }

    #[inline]
    pub fn previous_error(&self) -> f32 {
        self.prev_error
    }

    /// Reset integrator + derivative history.
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = 0.0;
        self.in_deadband = false;
    }

    /// Update the controller.
    ///
    /// `setpoint`: desired angle
    /// `estimate`: current filtered angle
    /// `prev_command`: actuator command issued on the previous cycle, in degrees of travel
    ///
    /// Returns the corrective signal in [`out_min`, `out_max`].
    pub fn update(&mut self, setpoint: f32, estimate: f32, prev_command: f32) -> f32 {
        // Positive error means the platform sits above the setpoint.
        let mut error = estimate - setpoint;

        // ----- Deadband -----
        if error.abs() <= self.deadband {
            error = 0.0;
            self.in_deadband = true;
        } else {
            self.in_deadband = false;
        }

        // ----- D term (previous minus current) -----
        let derivative = self.prev_error - error;

        // ----- I term -----
        if error == 0.0 {
            self.integral = 0.0;
        } else if error.is_finite() && (prev_command - NEUTRAL).abs() < self.saturation_window {
            self.integral += error;
        }

        // Anti-windup clamp
        if self.integral > self.int_max {
            self.integral = self.int_max;
        }
        if self.integral < self.int_min {
            self.integral = self.int_min;
        }

        let mut out = self.kp * error + self.ki * self.integral + self.kd * derivative;

        // ----- Output clamp -----
        if out > self.out_max {
            out = self.out_max;
        }
        if out < self.out_min {
            out = self.out_min;
        }

        self.prev_error = error;

        out
    }
}
