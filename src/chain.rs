use std::fmt;

use crate::device::{Device, Response};
use crate::dsp::convolve_full;
use crate::error::{ChainError, Result};
use crate::signal::{validate_sampling_rate, Domain, Signal};

/// Aggregate response of a whole chain.
///
/// An empty chain is the identity system and carries the bare scalar `1.0`.
/// As soon as one device is present the result is a full signal, even when
/// every device is a pure gain.
#[derive(Debug, Clone, PartialEq)]
pub enum CombinedResponse {
    Identity(f64),
    Response(Signal),
}

impl CombinedResponse {
    pub fn is_identity(&self) -> bool {
        matches!(self, CombinedResponse::Identity(_))
    }

    pub fn as_signal(&self) -> Option<&Signal> {
        match self {
            CombinedResponse::Identity(_) => None,
            CombinedResponse::Response(signal) => Some(signal),
        }
    }
}

/// Addresses a device either by position or by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceSelector<'a> {
    Index(usize),
    /// First device carrying this name. Names are not unique.
    Name(&'a str),
}

impl From<usize> for DeviceSelector<'_> {
    fn from(index: usize) -> Self {
        DeviceSelector::Index(index)
    }
}

impl<'a> From<&'a str> for DeviceSelector<'a> {
    fn from(name: &'a str) -> Self {
        DeviceSelector::Name(name)
    }
}

impl<'a> From<&'a String> for DeviceSelector<'a> {
    fn from(name: &'a String) -> Self {
        DeviceSelector::Name(name)
    }
}

/// An ordered cascade of devices sharing one sampling rate.
///
/// The combined response is recomputed on every structural change and is
/// never stale with respect to the device list. A mutation that fails leaves
/// both untouched.
#[derive(Debug, Clone)]
pub struct MeasurementChain {
    sampling_rate: f64,
    sound_device: Option<u32>,
    devices: Vec<Device>,
    comment: Option<String>,
    combined: CombinedResponse,
}

impl MeasurementChain {
    /// An empty chain at `sampling_rate` Hz.
    pub fn new(sampling_rate: f64) -> Result<Self> {
        MeasurementChain::with_devices(sampling_rate, None, Vec::new(), None)
    }

    pub fn with_devices(
        sampling_rate: f64,
        sound_device: Option<u32>,
        devices: Vec<Device>,
        comment: Option<String>,
    ) -> Result<Self> {
        validate_sampling_rate(sampling_rate)?;
        for device in &devices {
            check_rate(sampling_rate, device)?;
        }
        let combined = cascade(&devices, sampling_rate)?;
        Ok(MeasurementChain {
            sampling_rate,
            sound_device,
            devices,
            comment,
            combined,
        })
    }

    pub fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }

    pub fn sound_device(&self) -> Option<u32> {
        self.sound_device
    }

    pub fn set_sound_device(&mut self, sound_device: Option<u32>) {
        self.sound_device = sound_device;
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn set_comment(&mut self, comment: Option<String>) {
        self.comment = comment;
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// The cached response of the whole cascade.
    pub fn combined_response(&self) -> &CombinedResponse {
        &self.combined
    }

    /// Builds a device and appends it to the end of the chain.
    pub fn add_device(
        &mut self,
        name: impl Into<String>,
        response: Option<Signal>,
        sensitivity: f64,
        unit: Option<String>,
    ) -> Result<()> {
        let device = Device::try_new(name, response, sensitivity, unit)?;
        self.add_existing_device(device)
    }

    /// Appends an already built device.
    ///
    /// The response's sampling rate is only compared against the chain when
    /// the chain already holds devices; the first device is taken as is.
    pub fn add_existing_device(&mut self, device: Device) -> Result<()> {
        if self.devices.is_empty() {
            if let Some(response) = device.response() {
                if response.sampling_rate() != self.sampling_rate {
                    log::warn!(
                        "device '{}' at {} Hz added to empty chain at {} Hz",
                        device.name(),
                        response.sampling_rate(),
                        self.sampling_rate
                    );
                }
            }
        } else {
            check_rate(self.sampling_rate, &device)?;
        }

        log::info!("adding device '{}' at position {}", device.name(), self.devices.len());
        self.devices.push(device);
        if let Err(err) = self.refresh() {
            self.devices.pop();
            return Err(err);
        }
        Ok(())
    }

    /// Removes one device and returns it.
    pub fn remove_device<'a>(&mut self, selector: impl Into<DeviceSelector<'a>>) -> Result<Device> {
        let index = self.resolve(selector.into())?;
        let removed = self.devices.remove(index);
        if let Err(err) = self.refresh() {
            self.devices.insert(index, removed);
            return Err(err);
        }
        log::info!("removed device '{}' from position {}", removed.name(), index);
        Ok(removed)
    }

    /// Drops every device. Sampling rate, sound device and comment stay.
    pub fn reset_devices(&mut self) {
        log::info!("resetting chain with {} devices", self.devices.len());
        self.devices.clear();
        self.combined = CombinedResponse::Identity(1.0);
    }

    pub fn list_device_names(&self) -> Vec<&str> {
        self.devices.iter().map(Device::name).collect()
    }

    /// Effective response of a single device.
    pub fn device_response<'a>(&self, selector: impl Into<DeviceSelector<'a>>) -> Result<Response> {
        let index = self.resolve(selector.into())?;
        self.devices
            .get(index)
            .map(Device::effective_response)
            .ok_or(ChainError::IndexOutOfRange {
                index,
                len: self.devices.len(),
            })
    }

    /// Index of the first device called `name`.
    pub fn find_device_index(&self, name: &str) -> Result<usize> {
        self.devices
            .iter()
            .position(|device| device.name() == name)
            .ok_or_else(|| ChainError::NotFound(name.to_string()))
    }

    fn resolve(&self, selector: DeviceSelector<'_>) -> Result<usize> {
        let index = match selector {
            DeviceSelector::Index(index) => index,
            DeviceSelector::Name(name) => self.find_device_index(name)?,
        };
        if index >= self.devices.len() {
            return Err(ChainError::IndexOutOfRange {
                index,
                len: self.devices.len(),
            });
        }
        Ok(index)
    }

    fn refresh(&mut self) -> Result<()> {
        self.combined = cascade(&self.devices, self.sampling_rate)?;
        Ok(())
    }
}

impl fmt::Display for MeasurementChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "measurement chain with {} devices @ {} Hz sampling rate.",
            self.devices.len(),
            self.sampling_rate
        )?;
        for (i, device) in self.devices.iter().enumerate() {
            write!(f, "\n# {:2}: {}", i, device)?;
        }
        Ok(())
    }
}

fn check_rate(sampling_rate: f64, device: &Device) -> Result<()> {
    match device.response() {
        Some(response) if response.sampling_rate() != sampling_rate => Err(ChainError::ValueMismatch {
            expected: sampling_rate,
            actual: response.sampling_rate(),
        }),
        _ => Ok(()),
    }
}

/// Impulse response of all devices in series.
///
/// Starts from a unit impulse and fully convolves it with each device's
/// effective response in order, so the result grows by `len - 1` samples per
/// filter. A pure gain acts as a one-sample kernel.
fn cascade(devices: &[Device], sampling_rate: f64) -> Result<CombinedResponse> {
    if devices.is_empty() {
        return Ok(CombinedResponse::Identity(1.0));
    }

    let mut acc = vec![vec![1.0]];
    for device in devices {
        acc = match device.effective_response() {
            Response::Filter(signal) => convolve_full(&acc, signal.time())?,
            Response::Gain(gain) => convolve_full(&acc, &[vec![gain]])?,
        };
    }

    let mut signal = Signal::new(acc, sampling_rate)?;
    signal.set_domain(Domain::Freq);
    log::debug!(
        "cascade of {} devices -> {} channels x {} samples",
        devices.len(),
        signal.n_channels(),
        signal.n_samples()
    );
    Ok(CombinedResponse::Response(signal))
}
