// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! MCU-level wrappers for the launcher base board (STM32F777).

pub mod pins;
pub mod pwm;
pub mod spi;
pub mod usart;

pub use pins::BoardPins;
pub use pwm::ServoPwm;
pub use spi::ChipSelect;
pub use spi::SpiBus;
pub use usart::Usart;
