//! Combined response of a measurement signal chain.
//!
//! A [`MeasurementChain`] is an ordered cascade of linear, time-invariant
//! [`Device`]s (sound cards, pre-amplifiers, microphones). Each device has an
//! optional compensation filter and a sensitivity factor; the chain keeps the
//! impulse response of the whole series connection up to date so calibration
//! code can correct measured signals.

pub mod calibration;
pub mod chain;
pub mod config;
pub mod device;
pub mod dsp;
pub mod error;
pub mod signal;

pub mod domain {
    pub mod types;
}

pub use chain::{CombinedResponse, DeviceSelector, MeasurementChain};
pub use device::{Device, Response};
pub use error::{ChainError, Result};
pub use signal::{Domain, Signal};
