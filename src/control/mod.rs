// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Control Algorithms
//!
//! The elevation loop, from filtered angle to servo command.
//!
//! ## Modules
//!
//! - [`kalman`] - Scalar Kalman filter smoothing the measured angle.
//! - [`pid`] - PID controller with deadband and conditional integration.
//! - [`output`] - Corrective signal to servo command mapping.
//! - [`elevation`] - Closed-loop elevation controller tying the above to the accelerometer.

pub mod elevation;
pub mod kalman;
pub mod output;
pub mod pid;

pub use elevation::{ElevationConfig, ElevationController};
pub use kalman::{Divergence, Kalman1d};
pub use output::NEUTRAL;
pub use pid::Pid;
