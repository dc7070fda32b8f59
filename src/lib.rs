// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Launcher Base Firmware
//!
//! This crate holds the elevation control firmware for the launcher base, written in Rust,
//! targeting an STM32F777 MCU. An accelerometer on the launcher rail measures elevation; a servo
//! drives the rail toward a target angle.
//!
//! ## Crate Structure
//!
//! | Module | Purpose |
//! | ------ | -------- |
//! | [`control`] | Kalman filter, PID, elevation controller |
//! | [`sensing`] | Accelerometer capability, angle from the gravity vector |
//! | [`drivers`] | Device-level drivers (LIS3DH, servo) and the actuator capability |
//! | [`diag`] | Debug console helpers |
//! | `hw` | MCU-level wrappers around USART, SPI, timers (`firmware` feature) |
//!
//! Everything outside `hw` is hardware-independent and is tested on the host:
//!
//! ```bash
//! cargo test
//! ```
//!
//! Flash the board:
//!
//! ```bash
//! cargo run --release --features firmware --target thumbv7em-none-eabihf
//! ```
//!
//! ## License
//!
//! Licensed under the **MIT License**.
//! See the `LICENSE` file in the repository root for full terms.
//!
//! © 2025–2026 Christopher Liu

#![cfg_attr(not(test), no_std)]

pub mod control;
pub mod diag;
pub mod drivers;
#[cfg(feature = "firmware")]
pub mod hw;
pub mod sensing;
