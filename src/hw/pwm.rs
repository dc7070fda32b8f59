// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Servo pulse generation on TIM4 channel 1 (PD12), using direct PAC register access.
//!
//! The timer is prescaled to a 1 µs tick with a 20 ms period, so the compare register holds the
//! pulse width in microseconds directly.

use stm32f7xx_hal::pac;

use crate::drivers::servo::PulseOutput;

/// Servo frame length (µs), i.e. 50 Hz.
pub const FRAME_US: u32 = 20_000;

pub struct ServoPwm {
    tim: pac::TIM4,
}

impl ServoPwm {
    /// Configure TIM4 CH1 for 50 Hz PWM.
    ///
    /// `timer_clk_hz` is the TIM4 kernel clock (APB1 timer clock).
    pub fn tim4(tim4: pac::TIM4, timer_clk_hz: u32) -> Self {
        let rcc = unsafe { &*pac::RCC::ptr() };
        rcc.apb1enr.modify(|_, w| w.tim4en().set_bit());

        let tim = tim4;

        // Disable counter while configuring
        tim.cr1.modify(|_, w| w.cen().clear_bit());

        // 1 MHz tick, 20 ms period
        let psc = (timer_clk_hz / 1_000_000).saturating_sub(1) as u16;
        tim.psc.write(|w| w.psc().bits(psc));
        tim.arr.write(|w| unsafe { w.bits(FRAME_US - 1) });
        tim.ccr1.write(|w| unsafe { w.bits(0) });

        // PWM mode 1 with preload on CH1
        tim.ccmr1_output()
            .modify(|_, w| unsafe { w.oc1m().bits(0b110) }.oc1pe().set_bit());
        tim.ccer.modify(|_, w| w.cc1p().clear_bit().cc1e().set_bit());

        // Latch PSC/ARR, then start
        tim.egr.write(|w| w.ug().set_bit());
        tim.cr1.modify(|_, w| w.arpe().set_bit().cen().set_bit());

        Self { tim }
    }
}

impl PulseOutput for ServoPwm {
    #[inline]
    fn set_pulse_us(&mut self, us: u16) {
        let us = (us as u32).min(FRAME_US - 1);
        self.tim.ccr1.write(|w| unsafe { w.bits(us) });
    }
}
