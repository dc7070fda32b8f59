// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! LIS3DH 3-axis accelerometer over 4-wire SPI.
//!
//! SPI framing: the first byte is the register address with bit 7 set for reads and bit 6 set to
//! auto-increment across consecutive registers. Output registers hold left-justified 16-bit
//! two's-complement samples, little-endian.
//!
//! The device runs at 400 Hz in high-resolution mode with block data update, so a six-byte burst
//! from `OUT_X_L` always returns one coherent sample.

use crate::sensing::{Acceleration, G};

// Register addresses
pub mod reg {
    pub const WHO_AM_I: u8 = 0x0F;
    pub const CTRL_REG1: u8 = 0x20;
    pub const CTRL_REG4: u8 = 0x23;
    pub const OUT_X_L: u8 = 0x28;
}

/// Expected `WHO_AM_I` contents.
pub const DEVICE_ID: u8 = 0x33;

const READ: u8 = 1 << 7;
const AUTO_INCREMENT: u8 = 1 << 6;

/// 400 Hz ODR, normal power, X/Y/Z enabled.
const CTRL_REG1_ON: u8 = 0x77;
/// Block data update + high-resolution.
const CTRL_REG4_BASE: u8 = 0x88;

/// Full-scale range.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Range {
    G2,
    G4,
    G8,
    G16,
}

impl Range {
    /// `FS` field of `CTRL_REG4`.
    #[inline]
    pub fn bits(self) -> u8 {
        match self {
            Range::G2 => 0b00,
            Range::G4 => 0b01,
            Range::G8 => 0b10,
            Range::G16 => 0b11,
        }
    }

    /// Raw counts per g for left-justified samples.
    #[inline]
    pub fn counts_per_g(self) -> f32 {
        match self {
            Range::G2 => 16380.0,
            Range::G4 => 8190.0,
            Range::G8 => 4096.0,
            Range::G16 => 1365.0,
        }
    }

    /// Full `CTRL_REG4` value for this range.
    #[inline]
    pub fn ctrl_reg4(self) -> u8 {
        CTRL_REG4_BASE | (self.bits() << 4)
    }
}

/// First byte of a read transaction starting at `addr`.
#[inline]
pub fn read_header(addr: u8, burst: bool) -> u8 {
    let mut header = READ | (addr & 0x3F);
    if burst {
        header |= AUTO_INCREMENT;
    }
    header
}

/// First byte of a single-register write to `addr`.
#[inline]
pub fn write_header(addr: u8) -> u8 {
    addr & 0x3F
}

/// Convert an `OUT_X_L..OUT_Z_H` burst into m/s².
pub fn decode_sample(buf: &[u8; 6], range: Range) -> Acceleration {
    let scale = G / range.counts_per_g();
    let axis = |lo: u8, hi: u8| i16::from_le_bytes([lo, hi]) as f32 * scale;
    Acceleration::new(
        axis(buf[0], buf[1]),
        axis(buf[2], buf[3]),
        axis(buf[4], buf[5]),
    )
}

#[cfg(feature = "firmware")]
pub use self::device::{Lis3dh, Lis3dhError};

#[cfg(feature = "firmware")]
mod device {
    use stm32f7xx_hal::spi;

    use super::*;
    use crate::hw::{ChipSelect, SpiBus};
    use crate::sensing::Accelerometer;

    #[derive(Copy, Clone, Debug)]
    pub enum Lis3dhError {
        /// Bus-level failure.
        Spi(spi::Error),
        /// Something answered, but not a LIS3DH. Holds the `WHO_AM_I` byte that came back.
        WrongDevice(u8),
    }

    impl From<spi::Error> for Lis3dhError {
        fn from(e: spi::Error) -> Self {
            Lis3dhError::Spi(e)
        }
    }

    /// LIS3DH driver owning its SPI bus and chip-select pin.
    pub struct Lis3dh<I, PINS, const P: char, const N: u8> {
        spi: SpiBus<I, PINS>,
        cs: ChipSelect<P, N>,
        range: Range,
    }

    impl<I, PINS, const P: char, const N: u8> Lis3dh<I, PINS, P, N>
    where
        I: spi::Instance,
        PINS: spi::Pins<I>,
    {
        /// `spi` must be in SPI mode 3 (CPOL=1, CPHA=1) at up to 10 MHz.
        pub fn new(spi: SpiBus<I, PINS>, cs: ChipSelect<P, N>, range: Range) -> Self {
            Self { spi, cs, range }
        }

        pub fn read_reg(&mut self, addr: u8) -> Result<u8, spi::Error> {
            let mut buf = [0u8; 1];
            self.spi
                .read_after(&mut self.cs, read_header(addr, false), &mut buf)?;
            Ok(buf[0])
        }

        pub fn write_reg(&mut self, addr: u8, value: u8) -> Result<(), spi::Error> {
            self.spi.write_pair(&mut self.cs, write_header(addr), value)
        }

        /// Change the full-scale range.
        pub fn set_range(&mut self, range: Range) -> Result<(), spi::Error> {
            self.write_reg(reg::CTRL_REG4, range.ctrl_reg4())?;
            self.range = range;
            Ok(())
        }
    }

    impl<I, PINS, const P: char, const N: u8> Accelerometer for Lis3dh<I, PINS, P, N>
    where
        I: spi::Instance,
        PINS: spi::Pins<I>,
    {
        type Error = Lis3dhError;

        /// Check the device ID, then enable all axes and apply the configured range.
        fn begin(&mut self) -> Result<(), Lis3dhError> {
            let id = self.read_reg(reg::WHO_AM_I)?;
            if id != DEVICE_ID {
                return Err(Lis3dhError::WrongDevice(id));
            }
            self.write_reg(reg::CTRL_REG1, CTRL_REG1_ON)?;
            self.set_range(self.range)?;
            Ok(())
        }

        fn read_acceleration(&mut self) -> Result<Acceleration, Lis3dhError> {
            let mut buf = [0u8; 6];
            self.spi
                .read_after(&mut self.cs, read_header(reg::OUT_X_L, true), &mut buf)?;
            Ok(decode_sample(&buf, self.range))
        }
    }
}
