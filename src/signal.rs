//! Multi-channel sample sequences with a switchable time/frequency view.

use std::ops::Mul;

use num::complex::Complex;
use strum_macros::{Display, EnumString};

use crate::dsp::{irfft, rfft};
use crate::error::{ChainError, Result};

/// Which view of a [`Signal`] is current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum Domain {
    #[strum(serialize = "time")]
    Time,
    #[strum(to_string = "freq", serialize = "frequency")]
    Freq,
}

/// A real, multi-channel signal sampled at a fixed rate.
///
/// The time-domain samples are the stored truth. The frequency view is the
/// unnormalized one-sided spectrum of those samples, so switching [`Domain`]
/// never changes the signal itself. Every channel has the same length and
/// there is at least one channel holding at least one sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    time: Vec<Vec<f64>>,
    sampling_rate: f64,
    domain: Domain,
}

impl Signal {
    /// Builds a signal from `channels × samples` time data.
    pub fn new(time: Vec<Vec<f64>>, sampling_rate: f64) -> Result<Self> {
        validate_sampling_rate(sampling_rate)?;
        let n_samples = time.first().map(Vec::len).unwrap_or(0);
        if n_samples == 0 {
            return Err(ChainError::invalid("time", "signal needs at least one channel and one sample"));
        }
        if time.iter().any(|channel| channel.len() != n_samples) {
            return Err(ChainError::invalid("time", "all channels must have the same length"));
        }
        Ok(Signal {
            time,
            sampling_rate,
            domain: Domain::Time,
        })
    }

    /// Single channel convenience constructor.
    pub fn mono(samples: Vec<f64>, sampling_rate: f64) -> Result<Self> {
        Signal::new(vec![samples], sampling_rate)
    }

    /// Builds a signal from one-sided spectra, one per channel.
    ///
    /// `n_samples` defaults to `2 * (n_bins - 1)`, i.e. an even length. The
    /// returned signal shows its frequency view.
    pub fn from_spectrum(
        bins: Vec<Vec<Complex<f64>>>,
        sampling_rate: f64,
        n_samples: Option<usize>,
    ) -> Result<Self> {
        let n_bins = bins.first().map(Vec::len).unwrap_or(0);
        if n_bins == 0 {
            return Err(ChainError::invalid("freq", "spectrum needs at least one channel and one bin"));
        }
        if bins.iter().any(|channel| channel.len() != n_bins) {
            return Err(ChainError::invalid("freq", "all channels must have the same number of bins"));
        }
        let n_samples = n_samples.unwrap_or_else(|| (2 * (n_bins - 1)).max(1));
        if n_samples / 2 + 1 != n_bins {
            return Err(ChainError::invalid(
                "n_samples",
                format!("{} samples do not match {} frequency bins", n_samples, n_bins),
            ));
        }

        let time = bins.iter().map(|channel| irfft(channel, n_samples)).collect();
        let mut signal = Signal::new(time, sampling_rate)?;
        signal.domain = Domain::Freq;
        Ok(signal)
    }

    pub fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    /// Switches the current view without touching the samples.
    pub fn set_domain(&mut self, domain: Domain) {
        self.domain = domain;
    }

    pub fn n_channels(&self) -> usize {
        self.time.len()
    }

    pub fn n_samples(&self) -> usize {
        self.time.first().map(Vec::len).unwrap_or(0)
    }

    pub fn n_bins(&self) -> usize {
        self.n_samples() / 2 + 1
    }

    pub fn time(&self) -> &[Vec<f64>] {
        &self.time
    }

    /// One-sided spectrum per channel, `n_bins` bins each.
    pub fn freq(&self) -> Vec<Vec<Complex<f64>>> {
        self.time.iter().map(|channel| rfft(channel)).collect()
    }

    /// Bin center frequencies in Hz.
    pub fn frequencies(&self) -> Vec<f64> {
        let delta_f = self.sampling_rate / self.n_samples() as f64;
        (0..self.n_bins()).map(|i| i as f64 * delta_f).collect()
    }
}

impl Mul<f64> for &Signal {
    type Output = Signal;

    fn mul(self, rhs: f64) -> Signal {
        Signal {
            time: self
                .time
                .iter()
                .map(|channel| channel.iter().map(|x| x * rhs).collect())
                .collect(),
            sampling_rate: self.sampling_rate,
            domain: self.domain,
        }
    }
}

impl Mul<f64> for Signal {
    type Output = Signal;

    fn mul(self, rhs: f64) -> Signal {
        &self * rhs
    }
}

pub(crate) fn validate_sampling_rate(sampling_rate: f64) -> Result<()> {
    if sampling_rate.is_finite() && sampling_rate > 0.0 {
        Ok(())
    } else {
        Err(ChainError::invalid(
            "sampling_rate",
            format!("must be a positive number of Hz, got {}", sampling_rate),
        ))
    }
}
