use std::fmt;

use crate::error::{ChainError, Result};
use crate::signal::Signal;

/// What a single stage contributes to the cascade.
///
/// A device without a frequency response is a pure gain; callers have to
/// match on the variant rather than assume a filter.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Gain(f64),
    Filter(Signal),
}

impl Response {
    pub fn as_gain(&self) -> Option<f64> {
        match self {
            Response::Gain(gain) => Some(*gain),
            Response::Filter(_) => None,
        }
    }

    pub fn as_signal(&self) -> Option<&Signal> {
        match self {
            Response::Gain(_) => None,
            Response::Filter(signal) => Some(signal),
        }
    }
}

/// One stage of a measurement chain, e.g. a sound card, pre-amplifier or
/// microphone.
///
/// `response` holds the stage's compensation (inverse) filter. Without one
/// the stage is flat and only `sensitivity` applies. `unit` is descriptive
/// and never used in computation.
#[derive(Debug, Clone, PartialEq)]
pub struct Device {
    name: String,
    response: Option<Signal>,
    sensitivity: f64,
    unit: Option<String>,
}

impl Device {
    /// A flat device with unit sensitivity.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        Device::try_new(name, None, 1.0, None)
    }

    pub fn try_new(
        name: impl Into<String>,
        response: Option<Signal>,
        sensitivity: f64,
        unit: Option<String>,
    ) -> Result<Self> {
        let name = name.into();
        validate_name(&name)?;
        validate_sensitivity(sensitivity)?;
        Ok(Device {
            name,
            response,
            sensitivity,
            unit,
        })
    }

    pub fn with_response(mut self, response: Signal) -> Self {
        self.response = Some(response);
        self
    }

    pub fn with_sensitivity(mut self, sensitivity: f64) -> Result<Self> {
        self.set_sensitivity(sensitivity)?;
        Ok(self)
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        validate_name(&name)?;
        self.name = name;
        Ok(())
    }

    pub fn response(&self) -> Option<&Signal> {
        self.response.as_ref()
    }

    /// Replaces the frequency response. `None` makes the device flat.
    ///
    /// The sampling rate is not checked here: a chain validates it only when
    /// the device is added.
    pub fn set_response(&mut self, response: Option<Signal>) {
        self.response = response;
    }

    pub fn sensitivity(&self) -> f64 {
        self.sensitivity
    }

    pub fn set_sensitivity(&mut self, sensitivity: f64) -> Result<()> {
        validate_sensitivity(sensitivity)?;
        self.sensitivity = sensitivity;
        Ok(())
    }

    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    pub fn set_unit(&mut self, unit: Option<String>) {
        self.unit = unit;
    }

    /// `response * sensitivity`, or the bare sensitivity for a flat device.
    pub fn effective_response(&self) -> Response {
        match &self.response {
            Some(response) => Response::Filter(response * self.sensitivity),
            None => Response::Gain(self.sensitivity),
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} defined by ", self.name)?;
        if let Some(response) = &self.response {
            write!(f, "{} freq-bins, ", response.n_bins())?;
        }
        write!(f, "sensitivity={} unit=", self.sensitivity)?;
        match &self.unit {
            Some(unit) => write!(f, "{}", unit),
            None => write!(f, "None"),
        }
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ChainError::invalid("name", "device name must not be empty"));
    }
    Ok(())
}

fn validate_sensitivity(sensitivity: f64) -> Result<()> {
    if !sensitivity.is_finite() {
        return Err(ChainError::invalid(
            "sensitivity",
            format!("must be a finite number, got {}", sensitivity),
        ));
    }
    Ok(())
}
