// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

#![no_main]
#![no_std]

use cortex_m::delay::Delay;
use cortex_m_rt::entry;
use panic_halt as _;

use hal::{
    pac,
    prelude::*,
    serial::{Config, Serial},
    spi::{Mode, Phase, Polarity, Spi},
};
use stm32f7xx_hal as hal;

use launcher_base::control::{ElevationController, NEUTRAL};
use launcher_base::diag::LoopReporter;
use launcher_base::drivers::{lis3dh::Range, Actuator, Lis3dh, Servo};
use launcher_base::hw::{usart, BoardPins, ChipSelect, ServoPwm, SpiBus, Usart};

// Elevation gains
const KP: f32 = 3.0;
const KI: f32 = 0.5;
const KD: f32 = 0.75;

/// Target rail elevation (degrees).
const SETPOINT_DEG: f32 = 35.0;

const LOOP_DELAY_MS: u32 = 7;
const SENSOR_RETRY_MS: u32 = 500;

#[entry]
fn main() -> ! {
    // Peripherals
    let dp = pac::Peripherals::take().unwrap();
    let cp = cortex_m::Peripherals::take().unwrap();

    // Clocks
    let rcc = dp.RCC.constrain();
    let clocks = rcc.cfgr.freeze();
    let mut apb2 = rcc.apb2;

    let pins = BoardPins::new(dp.GPIOA, dp.GPIOD, dp.GPIOE);

    // SysTick delay
    let mut delay = Delay::new(cp.SYST, clocks.sysclk().raw());

    // USART1 (DBG)
    let usart_cfg = Config {
        baud_rate: usart::BAUD.bps(),
        ..Default::default()
    };
    let serial = Serial::new(dp.USART1, (pins.usart1.tx, pins.usart1.rx), &clocks, usart_cfg);
    let mut usart = Usart::new(serial);
    usart.println("Initializing launcher base controls");

    // Elevation servo on TIM4 CH1, parked at neutral
    let _servo_pin = pins.servo.elevation;
    let mut servo = Servo::new(ServoPwm::tim4(dp.TIM4, clocks.timclk1().raw()));
    servo.write_degrees(NEUTRAL);

    // SPI4 -> LIS3DH, mode 3
    let spi_mode = Mode {
        polarity: Polarity::IdleHigh,
        phase: Phase::CaptureOnSecondTransition,
    };
    let spi4 = Spi::new(dp.SPI4, (pins.spi4.sck, pins.spi4.miso, pins.spi4.mosi))
        .enable::<u8>(spi_mode, 1_000.kHz(), &clocks, &mut apb2);
    let accel = Lis3dh::new(
        SpiBus::new(spi4),
        ChipSelect::active_low(pins.spi4.cs_accel),
        Range::G2,
    );

    let mut elevation = ElevationController::new(accel, KP, KI, KD);

    // Never run the loop without a working sensor.
    usart.println("starting elevation sensor");
    while elevation.start_sensor().is_err() {
        usart.println("Reattempt sensor start");
        delay.delay_ms(SENSOR_RETRY_MS);
    }

    elevation.set_setpoint(SETPOINT_DEG);

    let mut reporter = LoopReporter::default();

    loop {
        let ctrl = elevation.drive(&mut servo, &mut usart);
        delay.delay_ms(LOOP_DELAY_MS);

        let _ = reporter.tick(&mut usart, ctrl, elevation.filtered_estimate());
    }
}
