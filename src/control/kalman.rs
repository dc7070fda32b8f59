// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Scalar Kalman filter for the elevation angle.
//!
//! There is no motion model: each step blends the new measurement into the estimate with gain
//! `P / (P + R)`. The covariance grows by `Q` times the size of the correction that was just
//! applied, so a large jump in the measurement reopens the gain for the next few samples.
//!
//! A NaN estimate is not recovered from. The first time it happens a [`Divergence`] is recorded
//! for the caller to report; later NaN steps are silent.

#[cfg(not(test))]
use micromath::F32Ext;

/// Snapshot of the filter at the step that first produced a NaN estimate.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Divergence {
    /// Measurement fed into the step (Zk).
    pub measurement: f32,
    /// Gain used by the step (Kk).
    pub gain: f32,
    /// Covariance after the step (Pk).
    pub covariance: f32,
}

#[derive(Clone, Debug)]
pub struct Kalman1d {
    /// Xk
    estimate: f32,
    /// Pk
    covariance: f32,
    /// Q
    process_noise: f32,
    /// R
    measurement_noise: f32,

    diverged: bool,
    pending: Option<Divergence>,
}

impl Kalman1d {
    pub fn new(
        initial_estimate: f32,
        initial_covariance: f32,
        process_noise: f32,
        measurement_noise: f32,
    ) -> Self {
        Self {
            estimate: initial_estimate,
            covariance: initial_covariance,
            process_noise,
            measurement_noise,
            diverged: false,
            pending: None,
        }
    }

    /// Fold one measurement into the estimate and return the new estimate.
    pub fn step(&mut self, measurement: f32) -> f32 {
        let gain = self.covariance / (self.covariance + self.measurement_noise);
        let estimate = self.estimate + gain * (measurement - self.estimate);
        let covariance =
            (1.0 - gain) * self.covariance + (self.estimate - estimate).abs() * self.process_noise;

        self.estimate = estimate;
        self.covariance = covariance;

        if estimate.is_nan() && !self.diverged {
            self.diverged = true;
            self.pending = Some(Divergence {
                measurement,
                gain,
                covariance,
            });
        }

        estimate
    }

    #[inline]
    pub fn estimate(&self) -> f32 {
        self.estimate
    }

    #[inline]
    pub fn covariance(&self) -> f32 {
        self.covariance
    }

    #[inline]
    pub fn process_noise(&self) -> f32 {
        self.process_noise
    }

    #[inline]
    pub fn measurement_noise(&self) -> f32 {
        self.measurement_noise
    }

    /// True once any step has produced a NaN estimate.
    #[inline]
    pub fn has_diverged(&self) -> bool {
        self.diverged
    }

    /// Take the divergence record. Yields `Some` at most once per filter lifetime.
    pub fn take_divergence(&mut self) -> Option<Divergence> {
        self.pending.take()
    }

    /// Restart from a fresh estimate and covariance. Noise parameters are kept.
    pub fn reset(&mut self, estimate: f32, covariance: f32) {
        self.estimate = estimate;
        self.covariance = covariance;
        self.diverged = false;
        self.pending = None;
    }
}
