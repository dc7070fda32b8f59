// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Closed-loop elevation controller for the launcher base.
//!
//! The controller owns the accelerometer, a [`Kalman1d`] smoothing the measured angle and a
//! [`Pid`] producing the correction. Each call to [`control_val`](ElevationController::control_val)
//! runs one full cycle and returns a servo command in [0, 180] degrees.
//!
//! Typical usage pattern:
//!
//! ```ignore
//! controller.start_sensor_retrying(u32::MAX, |_| delay.delay_ms(500_u32))?;
//! controller.set_setpoint(35.0);
//!
//! loop {
//!     controller.drive(&mut servo, &mut usart);
//!     delay.delay_ms(7_u32);
//! }
//! ```
//!
//! A disconnected or overloaded sensor short-circuits the cycle to [`NEUTRAL`] without touching
//! the filter or the PID history.

use core::fmt::Write;

use crate::control::kalman::Kalman1d;
use crate::control::output::{self, NEUTRAL, SIGNAL_LIMIT};
use crate::control::Pid;
use crate::diag::NullSink;
use crate::drivers::Actuator;
use crate::sensing::{self, Accelerometer, SensorFault};

/// Tuning for everything except the gains.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ElevationConfig {
    /// Target elevation (degrees).
    pub setpoint: f32,
    /// Half-width of the deadband around the setpoint (degrees).
    pub tolerance: f32,

    /// Filter estimate before the first sample (degrees).
    pub initial_estimate: f32,
    /// Filter covariance before the first sample.
    pub initial_covariance: f32,
    /// Q
    pub process_noise: f32,
    /// R, LIS3DH angle noise in degrees.
    pub measurement_noise: f32,

    /// Bound on the accumulated error.
    pub integral_limit: f32,
    /// The integrator only runs if the previous command was within this of neutral.
    pub saturation_window: f32,
}

impl Default for ElevationConfig {
    fn default() -> Self {
        Self {
            setpoint: 35.0,
            tolerance: 0.25,

            initial_estimate: 35.0,
            initial_covariance: 1.0,
            process_noise: 0.01,
            measurement_noise: 0.125,

            integral_limit: 500.0,
            saturation_window: 5.0,
        }
    }
}

impl ElevationConfig {
    pub fn with_setpoint(mut self, setpoint: f32) -> Self {
        self.setpoint = setpoint;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f32) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_initial_estimate(mut self, estimate: f32, covariance: f32) -> Self {
        self.initial_estimate = estimate;
        self.initial_covariance = covariance;
        self
    }

    pub fn with_noise(mut self, process_noise: f32, measurement_noise: f32) -> Self {
        self.process_noise = process_noise;
        self.measurement_noise = measurement_noise;
        self
    }

    pub fn with_integral_limit(mut self, limit: f32) -> Self {
        self.integral_limit = limit;
        self
    }

    pub fn with_saturation_window(mut self, window: f32) -> Self {
        self.saturation_window = window;
        self
    }

    fn filter(&self) -> Kalman1d {
        Kalman1d::new(
            self.initial_estimate,
            self.initial_covariance,
            self.process_noise,
            self.measurement_noise,
        )
    }

    fn pid(&self, kp: f32, ki: f32, kd: f32) -> Pid {
        Pid::new(kp, ki, kd)
            .with_output_limits(-SIGNAL_LIMIT, SIGNAL_LIMIT)
            .with_integral_limits(-self.integral_limit, self.integral_limit)
            .with_deadband(self.tolerance)
            .with_saturation_window(self.saturation_window)
    }
}

/// Elevation controller state and configuration, one per controlled axis.
pub struct ElevationController<A> {
    sensor: A,
    filter: Kalman1d,
    pid: Pid,
    config: ElevationConfig,

    /// Commanded elevation (degrees)
    setpoint: f32,
    /// Command returned by the last completed cycle
    previous_output: f32,

    sensor_failure: bool,
    last_fault: Option<SensorFault>,
}

impl<A: Accelerometer> ElevationController<A> {
    /// Create a controller with the launcher's default tuning and the given PID gains.
    pub fn new(sensor: A, kp: f32, ki: f32, kd: f32) -> Self {
        Self::with_config(sensor, kp, ki, kd, ElevationConfig::default())
    }

    pub fn with_config(sensor: A, kp: f32, ki: f32, kd: f32, config: ElevationConfig) -> Self {
        Self {
            sensor,
            filter: config.filter(),
            pid: config.pid(kp, ki, kd),
            config,
            setpoint: config.setpoint,
            previous_output: NEUTRAL,
            sensor_failure: false,
            last_fault: None,
        }
    }

    /// Make one attempt to bring up the accelerometer.
    pub fn start_sensor(&mut self) -> Result<(), A::Error> {
        self.sensor.begin()
    }

    /// Bring up the accelerometer, trying at most `max_attempts` times.
    ///
    /// `on_retry(n)` runs after the `n`th failed attempt when another attempt follows; that is
    /// where the caller waits and reports. Returns the number of attempts it took, or the error
    /// from the final attempt.
    pub fn start_sensor_retrying<F>(
        &mut self,
        max_attempts: u32,
        mut on_retry: F,
    ) -> Result<u32, A::Error>
    where
        F: FnMut(u32),
    {
        let max_attempts = max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.sensor.begin() {
                Ok(()) => return Ok(attempt),
                Err(e) if attempt >= max_attempts => return Err(e),
                Err(_) => {
                    on_retry(attempt);
                    attempt += 1;
                }
            }
        }
    }

    /// Run one control cycle and return the servo command.
    pub fn control_val(&mut self) -> f32 {
        self.control_val_logged(&mut NullSink)
    }

    /// Run one control cycle, reporting filter divergence to `log`.
    pub fn control_val_logged<W: Write>(&mut self, log: &mut W) -> f32 {
        // A failed bus read is handled like a loose connector.
        let angle = match self.sensor.read_acceleration() {
            Ok(sample) => sensing::resolve(sample),
            Err(_) => Err(SensorFault::Disconnected),
        };

        let angle = match angle {
            Ok(angle) => angle,
            Err(fault) => {
                self.sensor_failure = fault == SensorFault::Disconnected;
                self.last_fault = Some(fault);
                return NEUTRAL;
            }
        };
        self.sensor_failure = false;
        self.last_fault = None;

        let estimate = self.filter.step(angle);
        if let Some(d) = self.filter.take_divergence() {
            let _ = write!(
                log,
                "KF nan - Zk: {:.2} | Kk: {:.2} | Pk: {:.2}\r\n",
                d.measurement, d.gain, d.covariance
            );
        }

        let u = self.pid.update(self.setpoint, estimate, self.previous_output);
        let command = output::to_command(u);

        self.previous_output = command;
        command
    }

    /// Run one cycle and apply the result to `actuator`.
    ///
    /// If the sensor reads as disconnected the actuator is parked at neutral and a failure line
    /// goes to `log`. Returns the command computed for this cycle.
    pub fn drive<S: Actuator, W: Write>(&mut self, actuator: &mut S, log: &mut W) -> f32 {
        let command = self.control_val_logged(log);
        if self.is_sensor_healthy() {
            actuator.write_degrees(command);
        } else {
            actuator.write_degrees(NEUTRAL);
            let _ = log.write_str("Sensor Failure!\r\n");
        }
        command
    }

    /// Set a new target elevation (degrees).
    pub fn set_setpoint(&mut self, setpoint: f32) {
        self.setpoint = setpoint;
    }

    #[inline]
    pub fn setpoint(&self) -> f32 {
        self.setpoint
    }

    pub fn set_gains(&mut self, kp: f32, ki: f32, kd: f32) {
        self.pid.set_gains(kp, ki, kd);
    }

    /// Set gains from a `[kp, ki, kd]` triple.
    pub fn set_gains_array(&mut self, gains: &[f32; 3]) {
        self.set_gains(gains[0], gains[1], gains[2]);
    }

    #[inline]
    pub fn kp(&self) -> f32 {
        self.pid.kp()
    }

    #[inline]
    pub fn ki(&self) -> f32 {
        self.pid.ki()
    }

    #[inline]
    pub fn kd(&self) -> f32 {
        self.pid.kd()
    }

    /// Current smoothed elevation (degrees).
    #[inline]
    pub fn filtered_estimate(&self) -> f32 {
        self.filter.estimate()
    }

    /// Returns true if the last completed cycle had its error inside the deadband.
    #[inline]
    pub fn is_in_deadband(&self) -> bool {
        self.pid.in_deadband()
    }

    /// False if the last cycle saw a disconnected sensor.
    ///
    /// An overload still counts as healthy; see [`last_fault`](Self::last_fault).
    #[inline]
    pub fn is_sensor_healthy(&self) -> bool {
        !self.sensor_failure
    }

    /// Fault that short-circuited the last cycle, if any.
    #[inline]
    pub fn last_fault(&self) -> Option<SensorFault> {
        self.last_fault
    }

    #[inline]
    pub fn filter(&self) -> &Kalman1d {
        &self.filter
    }

    #[inline]
    pub fn pid(&self) -> &Pid {
        &self.pid
    }

    /// Access the accelerometer.
    #[inline]
    pub fn sensor_mut(&mut self) -> &mut A {
        &mut self.sensor
    }

    /// Return the filter and PID history to their construction state.
    ///
    /// Gains and setpoint are kept.
    pub fn reset(&mut self) {
        self.filter
            .reset(self.config.initial_estimate, self.config.initial_covariance);
        self.pid.reset();
        self.previous_output = NEUTRAL;
        self.sensor_failure = false;
        self.last_fault = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensing::{Acceleration, G, RAD2DEG};
    use std::string::String;
    use std::vec::Vec;

    /// Accelerometer double that replays a script of samples, repeating the last one.
    struct ScriptedAccel {
        samples: Vec<Result<Acceleration, ()>>,
        next: usize,
        failed_begins: u32,
        begin_calls: u32,
    }

    impl ScriptedAccel {
        fn new(samples: Vec<Result<Acceleration, ()>>) -> Self {
            Self {
                samples,
                next: 0,
                failed_begins: 0,
                begin_calls: 0,
            }
        }

        fn holding(deg: f32) -> Self {
            Self::new(vec![Ok(at_angle(deg))])
        }

        fn failing_begins(mut self, n: u32) -> Self {
            self.failed_begins = n;
            self
        }
    }

    impl Accelerometer for ScriptedAccel {
        type Error = ();

        fn begin(&mut self) -> Result<(), ()> {
            self.begin_calls += 1;
            if self.begin_calls <= self.failed_begins {
                Err(())
            } else {
                Ok(())
            }
        }

        fn read_acceleration(&mut self) -> Result<Acceleration, ()> {
            let i = self.next.min(self.samples.len() - 1);
            self.next += 1;
            self.samples[i]
        }
    }

    #[derive(Default)]
    struct RecordingServo {
        writes: Vec<f32>,
    }

    impl Actuator for RecordingServo {
        fn write_degrees(&mut self, degrees: f32) {
            self.writes.push(degrees);
        }
    }

    /// Sample for a rail at `deg` elevation, `deg` in (-90, 90), Y axis pointing down.
    fn at_angle(deg: f32) -> Acceleration {
        let rad = deg / RAD2DEG;
        Acceleration::new(-G * libm::sinf(rad), -G * libm::cosf(rad), 0.0)
    }

    const DISCONNECTED: Acceleration = Acceleration::new(0.0, 0.0, 0.0);
    const OVERLOADED: Acceleration = Acceleration::new(3.0 * G, -1.0, 0.0);

    fn launcher(sensor: ScriptedAccel) -> ElevationController<ScriptedAccel> {
        ElevationController::new(sensor, 3.0, 0.5, 0.75)
    }

    /// Filter that takes each measurement as-is, so the estimate equals the resolved angle.
    fn transparent(sensor: ScriptedAccel) -> ElevationController<ScriptedAccel> {
        let config = ElevationConfig::default().with_noise(0.01, 0.0);
        ElevationController::with_config(sensor, 3.0, 0.5, 0.75, config)
    }

    fn assert_close(actual: f32, expected: f32) {
        assert!(
            (actual - expected).abs() < 1e-3,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    #[test]
    fn defaults_match_launcher_tuning() {
        let ctrl = launcher(ScriptedAccel::holding(35.0));
        assert_eq!((ctrl.kp(), ctrl.ki(), ctrl.kd()), (3.0, 0.5, 0.75));
        assert_eq!(ctrl.setpoint(), 35.0);
        assert_eq!(ctrl.filtered_estimate(), 35.0);
        assert_eq!(ctrl.filter().covariance(), 1.0);
        assert_eq!(ctrl.filter().measurement_noise(), 0.125);
        assert_eq!(ctrl.filter().process_noise(), 0.01);
        assert_eq!(ctrl.pid().deadband(), 0.25);
        assert!(ctrl.is_sensor_healthy());
    }

    #[test]
    fn on_target_holds_neutral() {
        let mut ctrl = launcher(ScriptedAccel::holding(35.0));
        for _ in 0..10 {
            assert_eq!(ctrl.control_val(), NEUTRAL);
            assert!(ctrl.is_in_deadband());
        }
        assert_eq!(ctrl.pid().integral(), 0.0);
    }

    #[test]
    fn five_degree_step_from_rest() {
        let mut ctrl = transparent(ScriptedAccel::holding(40.0));
        let command = ctrl.control_val();

        assert_close(ctrl.filtered_estimate(), 40.0);
        // u = 3*5 + 0.5*5 + 0.75*(0 - 5) = 13.75
        assert_close(command, 90.0 + 13.75 * 0.9);
        assert!(!ctrl.is_in_deadband());
        assert_close(ctrl.pid().integral(), 5.0);
    }

    #[test]
    fn disconnect_returns_neutral_and_leaves_state_alone() {
        let mut ctrl = launcher(ScriptedAccel::new(vec![
            Ok(at_angle(45.0)),
            Ok(DISCONNECTED),
        ]));
        ctrl.control_val();
        let filter = ctrl.filter().clone();
        let (integral, prev_error) = (ctrl.pid().integral(), ctrl.pid().previous_error());

        assert_eq!(ctrl.control_val(), 90.0);
        assert!(!ctrl.is_sensor_healthy());
        assert_eq!(ctrl.last_fault(), Some(SensorFault::Disconnected));
        assert_eq!(ctrl.filter().estimate(), filter.estimate());
        assert_eq!(ctrl.filter().covariance(), filter.covariance());
        assert_eq!(ctrl.pid().integral(), integral);
        assert_eq!(ctrl.pid().previous_error(), prev_error);
    }

    #[test]
    fn overload_returns_neutral_and_leaves_state_alone() {
        let mut ctrl = launcher(ScriptedAccel::new(vec![Ok(at_angle(50.0)), Ok(OVERLOADED)]));
        ctrl.control_val();
        let filter = ctrl.filter().clone();
        let (integral, prev_error) = (ctrl.pid().integral(), ctrl.pid().previous_error());

        assert_eq!(ctrl.control_val(), 90.0);
        assert!(ctrl.is_sensor_healthy());
        assert_eq!(ctrl.last_fault(), Some(SensorFault::Overloaded));
        assert_eq!(ctrl.filtered_estimate(), filter.estimate());
        assert_eq!(ctrl.filter().covariance(), filter.covariance());
        assert_eq!(ctrl.pid().integral(), integral);
        assert_eq!(ctrl.pid().previous_error(), prev_error);
    }

    #[test]
    fn vanishing_readings_count_as_disconnect() {
        let tiny = f32::from_bits(1);
        let mut ctrl = launcher(ScriptedAccel::new(vec![Ok(Acceleration::new(tiny, tiny, 0.0))]));

        assert_eq!(ctrl.control_val(), NEUTRAL);
        assert!(!ctrl.is_sensor_healthy());
        assert_eq!(ctrl.last_fault(), Some(SensorFault::Disconnected));
        assert_eq!(ctrl.filtered_estimate(), 35.0);
        assert_eq!(ctrl.filter().covariance(), 1.0);
        assert_eq!(ctrl.pid().integral(), 0.0);
        assert_eq!(ctrl.pid().previous_error(), 0.0);
    }

    #[test]
    fn read_error_counts_as_disconnect() {
        let mut ctrl = launcher(ScriptedAccel::new(vec![Err(())]));
        assert_eq!(ctrl.control_val(), NEUTRAL);
        assert!(!ctrl.is_sensor_healthy());
        assert_eq!(ctrl.filtered_estimate(), 35.0);
    }

    #[test]
    fn fault_clears_on_next_good_sample() {
        let mut ctrl = launcher(ScriptedAccel::new(vec![Ok(DISCONNECTED), Ok(at_angle(35.0))]));
        ctrl.control_val();
        assert!(!ctrl.is_sensor_healthy());
        ctrl.control_val();
        assert!(ctrl.is_sensor_healthy());
        assert_eq!(ctrl.last_fault(), None);
    }

    #[test]
    fn commands_stay_in_servo_range() {
        // Deterministic LCG sweep over the full circle, faults included.
        let mut seed: u32 = 0x1234_5678;
        let mut samples = Vec::new();
        for _ in 0..500 {
            seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            let r = (seed >> 8) as f32 / (1u32 << 24) as f32;
            let ax = (r * 2.0 - 1.0) * 1.2 * G;
            seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            let r = (seed >> 8) as f32 / (1u32 << 24) as f32;
            let ay = (r * 2.0 - 1.0) * G;
            samples.push(Ok(Acceleration::new(ax, ay, 0.0)));
        }

        let mut ctrl = ElevationController::new(ScriptedAccel::new(samples), 8.0, 2.0, 1.5);
        for _ in 0..500 {
            let command = ctrl.control_val();
            assert!((0.0..=180.0).contains(&command), "command {}", command);
            assert!(ctrl.pid().integral().abs() <= 500.0);
        }
    }

    #[test]
    fn saturated_output_freezes_integrator() {
        let mut ctrl = transparent(ScriptedAccel::holding(80.0));

        // error 45 from a neutral start: integrates once, then drives the servo to the end stop
        assert_eq!(ctrl.control_val(), 180.0);
        assert_close(ctrl.pid().integral(), 45.0);

        ctrl.control_val();
        assert_close(ctrl.pid().integral(), 45.0);
    }

    #[test]
    fn fault_keeps_last_command_for_integrator_gate() {
        let mut ctrl = transparent(ScriptedAccel::new(vec![
            Ok(at_angle(80.0)),
            Ok(DISCONNECTED),
            Ok(at_angle(80.0)),
        ]));

        assert_eq!(ctrl.control_val(), 180.0);
        assert_close(ctrl.pid().integral(), 45.0);

        assert_eq!(ctrl.control_val(), NEUTRAL);

        // Gate still sees the saturated command from before the fault.
        assert_eq!(ctrl.control_val(), 180.0);
        assert_close(ctrl.pid().integral(), 45.0);
    }

    #[test]
    fn raising_setpoint_drives_below_neutral() {
        let mut ctrl = launcher(ScriptedAccel::holding(35.0));
        ctrl.set_setpoint(45.0);
        assert!(ctrl.control_val() < NEUTRAL);
        assert!(!ctrl.is_in_deadband());
    }

    #[test]
    fn gains_can_be_replaced() {
        let mut ctrl = launcher(ScriptedAccel::holding(35.0));
        ctrl.set_gains(1.0, 0.0, 0.0);
        assert_eq!((ctrl.kp(), ctrl.ki(), ctrl.kd()), (1.0, 0.0, 0.0));
        ctrl.set_gains_array(&[2.0, 0.25, 0.5]);
        assert_eq!((ctrl.kp(), ctrl.ki(), ctrl.kd()), (2.0, 0.25, 0.5));
    }

    #[test]
    fn filter_divergence_logged_once() {
        let config = ElevationConfig::default().with_initial_estimate(f32::NAN, 1.0);
        let mut ctrl = ElevationController::with_config(
            ScriptedAccel::holding(35.0),
            3.0,
            0.5,
            0.75,
            config,
        );
        let mut log = String::new();

        for _ in 0..5 {
            assert_eq!(ctrl.control_val_logged(&mut log), NEUTRAL);
        }
        assert!(ctrl.filtered_estimate().is_nan());
        assert!(log.starts_with("KF nan - Zk: 35.00 | Kk: 0.89 | Pk: NaN"));
        assert_eq!(log.matches("KF nan").count(), 1);
        assert!(ctrl.pid().integral().abs() <= 500.0);
    }

    #[test]
    fn drive_writes_command_or_parks_servo() {
        let mut ctrl = transparent(ScriptedAccel::new(vec![Ok(at_angle(40.0)), Ok(DISCONNECTED)]));
        let mut servo = RecordingServo::default();
        let mut log = String::new();

        let first = ctrl.drive(&mut servo, &mut log);
        ctrl.drive(&mut servo, &mut log);

        assert_eq!(servo.writes.len(), 2);
        assert_eq!(servo.writes[0], first);
        assert_eq!(servo.writes[1], NEUTRAL);
        assert_eq!(log, "Sensor Failure!\r\n");
    }

    #[test]
    fn start_sensor_single_attempt() {
        let mut ctrl = launcher(ScriptedAccel::holding(35.0).failing_begins(1));
        assert_eq!(ctrl.start_sensor(), Err(()));
        assert_eq!(ctrl.start_sensor(), Ok(()));
    }

    #[test]
    fn start_sensor_retries_until_up() {
        let mut ctrl = launcher(ScriptedAccel::holding(35.0).failing_begins(3));
        let mut retries = Vec::new();

        let attempts = ctrl.start_sensor_retrying(10, |n| retries.push(n));

        assert_eq!(attempts, Ok(4));
        assert_eq!(retries, vec![1, 2, 3]);
    }

    #[test]
    fn start_sensor_gives_up_after_limit() {
        let mut ctrl = launcher(ScriptedAccel::holding(35.0).failing_begins(u32::MAX));
        let mut retries = 0;

        assert_eq!(ctrl.start_sensor_retrying(3, |_| retries += 1), Err(()));
        assert_eq!(retries, 2);
        assert_eq!(ctrl.sensor_mut().begin_calls, 3);
    }

    #[test]
    fn reset_restores_construction_state() {
        let mut ctrl = launcher(ScriptedAccel::holding(60.0));
        for _ in 0..20 {
            ctrl.control_val();
        }
        ctrl.set_setpoint(40.0);
        ctrl.reset();

        assert_eq!(ctrl.filtered_estimate(), 35.0);
        assert_eq!(ctrl.filter().covariance(), 1.0);
        assert_eq!(ctrl.pid().integral(), 0.0);
        assert_eq!(ctrl.pid().previous_error(), 0.0);
        assert_eq!(ctrl.setpoint(), 40.0);
    }

    #[test]
    fn axes_do_not_share_state() {
        let mut a = launcher(ScriptedAccel::holding(60.0));
        let mut b = launcher(ScriptedAccel::holding(35.0));
        for _ in 0..10 {
            a.control_val();
        }
        assert_eq!(b.control_val(), NEUTRAL);
        assert_eq!(b.pid().integral(), 0.0);
        assert_close(b.filtered_estimate(), 35.0);
    }
}
