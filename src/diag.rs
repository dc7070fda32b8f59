// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Diagnostic output helpers.
//!
//! Everything here writes through `core::fmt::Write`, so the same code drives the USART debug
//! console on the board and a `String` in host tests. Lines end in `\r\n` for the terminal.

use core::fmt::{self, Write};

/// Sink that throws everything away.
#[derive(Copy, Clone, Debug, Default)]
pub struct NullSink;

impl Write for NullSink {
    #[inline]
    fn write_str(&mut self, _s: &str) -> fmt::Result {
        Ok(())
    }
}

/// Cycles between loop reports when none is given.
pub const DEFAULT_REPORT_PERIOD: u32 = 100;

/// Prints `<command> | <estimate>` once every `period` control cycles.
#[derive(Clone, Debug)]
pub struct LoopReporter {
    period: u32,
    count: u32,
}

impl LoopReporter {
    pub fn new(period: u32) -> Self {
        Self {
            period: period.max(1),
            count: 0,
        }
    }

    #[inline]
    pub fn period(&self) -> u32 {
        self.period
    }

    /// Count one cycle. Writes a report line and returns `Ok(true)` when the period elapses.
    pub fn tick<W: Write>(
        &mut self,
        out: &mut W,
        command: f32,
        estimate: f32,
    ) -> Result<bool, fmt::Error> {
        self.count += 1;
        if self.count < self.period {
            return Ok(false);
        }
        self.count = 0;
        write!(out, "{:.2} | {:.2}\r\n", command, estimate)?;
        Ok(true)
    }
}

impl Default for LoopReporter {
    fn default() -> Self {
        Self::new(DEFAULT_REPORT_PERIOD)
    }
}
