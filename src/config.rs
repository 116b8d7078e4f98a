//! JSON description of a measurement chain.
//!
//! ```json
//! {
//!   "sampling_rate": 48000,
//!   "sound_device": 2,
//!   "comment": "living room",
//!   "devices": [
//!     { "name": "umik-1", "calibration_file": "calibration_data/demo_umik.txt" },
//!     { "name": "preamp", "sensitivity": 2.0, "unit": "V/V" },
//!     { "name": "eq", "response": { "domain": "freq", "data": [[1, 1, 0.5, 0.5]] } }
//!   ]
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Context;
use num::complex::Complex;
use serde::Deserialize;

use crate::calibration::load_calibration_file;
use crate::chain::MeasurementChain;
use crate::device::Device;
use crate::error::{ChainError, Result};
use crate::signal::{Domain, Signal};

const DEFAULT_CALIBRATION_SAMPLES: usize = 8192;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChainConfig {
    pub sampling_rate: f64,
    #[serde(default)]
    pub sound_device: Option<u32>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub devices: Vec<DeviceConfig>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DeviceConfig {
    pub name: String,
    #[serde(default = "default_sensitivity")]
    pub sensitivity: f64,
    #[serde(default)]
    pub unit: Option<String>,
    /// Microphone calibration file; its compensation becomes the response.
    #[serde(default)]
    pub calibration_file: Option<PathBuf>,
    /// FFT length used to sample the calibration curve.
    #[serde(default = "default_calibration_samples")]
    pub n_samples: usize,
    /// Response given inline instead of through a calibration file.
    #[serde(default)]
    pub response: Option<ResponseConfig>,
}

/// Inline response. In the `freq` domain each value is a real, zero-phase
/// bin magnitude.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResponseConfig {
    pub domain: String,
    pub data: Vec<Vec<f64>>,
    #[serde(default)]
    pub n_samples: Option<usize>,
}

fn default_sensitivity() -> f64 {
    1.0
}

fn default_calibration_samples() -> usize {
    DEFAULT_CALIBRATION_SAMPLES
}

impl ChainConfig {
    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("invalid measurement chain description")
    }

    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .with_context(|| format!("failed to read chain description {}", path.display()))?;
        ChainConfig::from_json_str(&json).with_context(|| format!("in {}", path.display()))
    }

    /// Builds the chain, adding devices in the listed order.
    pub fn build(&self) -> Result<MeasurementChain> {
        let mut chain = MeasurementChain::with_devices(
            self.sampling_rate,
            self.sound_device,
            Vec::new(),
            self.comment.clone(),
        )?;
        for device in &self.devices {
            chain.add_existing_device(device.build(self.sampling_rate)?)?;
        }
        Ok(chain)
    }
}

impl DeviceConfig {
    fn build(&self, sampling_rate: f64) -> Result<Device> {
        let response = match (&self.calibration_file, &self.response) {
            (Some(_), Some(_)) => {
                return Err(ChainError::invalid(
                    "response",
                    format!("device '{}' has both a calibration file and an inline response", self.name),
                ))
            }
            (Some(path), None) => {
                let calibration = load_calibration_file(path)?;
                let mut device = calibration.compensation_device(&self.name, self.n_samples, sampling_rate)?;
                // the file's sensitivity applies on top of the configured one
                device.set_sensitivity(self.sensitivity * calibration.sensitivity_factor())?;
                device.set_unit(self.unit.clone());
                return Ok(device);
            }
            (None, Some(inline)) => Some(inline.to_signal(sampling_rate)?),
            (None, None) => None,
        };

        Device::try_new(&self.name, response, self.sensitivity, self.unit.clone())
    }
}

impl ResponseConfig {
    fn to_signal(&self, sampling_rate: f64) -> Result<Signal> {
        let domain = Domain::from_str(&self.domain).map_err(|_| {
            ChainError::invalid("domain", format!("expected 'time' or 'freq', got '{}'", self.domain))
        })?;
        match domain {
            Domain::Time => Signal::new(self.data.clone(), sampling_rate),
            Domain::Freq => {
                let bins: Vec<Vec<Complex<f64>>> = self
                    .data
                    .iter()
                    .map(|channel| channel.iter().map(|&m| Complex::new(m, 0.0)).collect())
                    .collect();
                Signal::from_spectrum(bins, sampling_rate, self.n_samples)
            }
        }
    }
}
