use interp::{interp_slice, InterpMode};
use num::complex::Complex;

use crate::device::Device;
use crate::error::Result;
use crate::signal::Signal;

/// Measured magnitude response of a microphone as shipped in its
/// calibration file.
#[derive(Debug, Clone, PartialEq)]
pub struct MicCalibrationData {
    /// Sensitivity correction in dB.
    pub sensitivity_db: f64,
    /// Ascending frequencies in Hz.
    pub frequency: Vec<f64>,
    /// Response at each frequency in dB.
    pub response_db: Vec<f64>,
}

impl MicCalibrationData {
    /// Response in dB at `target_freqs`, holding the first and last
    /// calibration points outside the measured range.
    pub fn interpolate(&self, target_freqs: &[f64]) -> Vec<f64> {
        interp_slice(
            &self.frequency,
            &self.response_db,
            target_freqs,
            &InterpMode::FirstLast,
        )
    }

    pub fn sensitivity_factor(&self) -> f64 {
        db_to_linear(self.sensitivity_db)
    }

    /// Zero-phase filter undoing the measured magnitude response, sampled
    /// on the `n_samples / 2 + 1` bins of an `n_samples` long FFT.
    pub fn compensation_response(&self, n_samples: usize, sampling_rate: f64) -> Result<Signal> {
        let delta_f = sampling_rate / n_samples.max(1) as f64;
        let target_freqs: Vec<f64> = (0..n_samples / 2 + 1).map(|i| i as f64 * delta_f).collect();
        let bins: Vec<Complex<f64>> = self
            .interpolate(&target_freqs)
            .into_iter()
            .map(|db| Complex::new(db_to_linear(-db), 0.0))
            .collect();
        Signal::from_spectrum(vec![bins], sampling_rate, Some(n_samples))
    }

    /// A chain device carrying the compensation filter and the sensitivity
    /// factor of this calibration.
    pub fn compensation_device(
        &self,
        name: impl Into<String>,
        n_samples: usize,
        sampling_rate: f64,
    ) -> Result<Device> {
        let response = self.compensation_response(n_samples, sampling_rate)?;
        Device::try_new(name, Some(response), self.sensitivity_factor(), None)
    }
}

pub fn db_to_linear(db: f64) -> f64 {
    10f64.powf(db / 20.0)
}
