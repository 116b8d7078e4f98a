use num::complex::Complex;
use rustfft::FftPlanner;

use crate::error::{ChainError, Result};

/// Below this kernel length the direct sum beats planning an FFT.
const DIRECT_CONVOLUTION_MAX: usize = 64;

/// One-sided spectrum of a real sequence, `n / 2 + 1` bins, unnormalized.
pub fn rfft(samples: &[f64]) -> Vec<Complex<f64>> {
    let n = samples.len();
    if n == 0 {
        return Vec::new();
    }
    let mut buffer: Vec<Complex<f64>> = samples.iter().map(|&x| Complex::new(x, 0.0)).collect();
    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(n);
    fft.process(&mut buffer);
    buffer.truncate(n / 2 + 1);
    buffer
}

/// Inverse of [`rfft`] for a real sequence of `n_samples` samples.
///
/// Missing bins are treated as zero, surplus bins are ignored. The
/// negative-frequency half is the conjugate mirror of the given bins.
pub fn irfft(bins: &[Complex<f64>], n_samples: usize) -> Vec<f64> {
    if n_samples == 0 {
        return Vec::new();
    }
    let half = n_samples / 2;
    let bin = |k: usize| bins.get(k).copied().unwrap_or_default();
    let mut buffer: Vec<Complex<f64>> = (0..n_samples)
        .map(|k| if k <= half { bin(k) } else { bin(n_samples - k).conj() })
        .collect();

    // DC and an even-length Nyquist bin must be real for the result to be.
    if let Some(dc) = buffer.first_mut() {
        dc.im = 0.0;
    }
    if n_samples % 2 == 0 {
        if let Some(nyquist) = buffer.get_mut(half) {
            nyquist.im = 0.0;
        }
    }

    let mut planner = FftPlanner::new();
    let ifft = planner.plan_fft_inverse(n_samples);
    ifft.process(&mut buffer);
    let scale = n_samples as f64;
    buffer.iter().map(|c| c.re / scale).collect()
}

/// Full linear convolution of two multi-channel sequences.
///
/// Both inputs are `channels × samples`. Channel counts broadcast when they
/// are equal or when either side has a single channel. The output has
/// `a_len + b_len - 1` samples per channel; an empty side yields empty
/// channels.
pub fn convolve_full(a: &[Vec<f64>], b: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
    let channels = broadcast_channels(a.len(), b.len())?;
    let pick = |side: &[Vec<f64>], c: usize| -> Vec<f64> {
        let idx = if side.len() == 1 { 0 } else { c };
        side.get(idx).cloned().unwrap_or_default()
    };

    Ok((0..channels)
        .map(|c| convolve_channel(&pick(a, c), &pick(b, c)))
        .collect())
}

fn broadcast_channels(lhs: usize, rhs: usize) -> Result<usize> {
    match (lhs, rhs) {
        (l, r) if l == r => Ok(l),
        (1, r) => Ok(r),
        (l, 1) => Ok(l),
        (l, r) => Err(ChainError::ShapeMismatch { lhs: l, rhs: r }),
    }
}

fn convolve_channel(src: &[f64], kernel: &[f64]) -> Vec<f64> {
    if src.is_empty() || kernel.is_empty() {
        return Vec::new();
    }
    if src.len().min(kernel.len()) <= DIRECT_CONVOLUTION_MAX {
        convolve_direct(src, kernel)
    } else {
        convolve_fft(src, kernel)
    }
}

fn convolve_direct(src: &[f64], kernel: &[f64]) -> Vec<f64> {
    let mut dst = vec![0.0; src.len() + kernel.len() - 1];
    for (i, &x) in src.iter().enumerate() {
        for (acc, &h) in dst.iter_mut().skip(i).zip(kernel) {
            *acc += x * h;
        }
    }
    dst
}

fn convolve_fft(src: &[f64], kernel: &[f64]) -> Vec<f64> {
    let full_len = src.len() + kernel.len() - 1;
    let padded_len = full_len.next_power_of_two();

    let padded = |x: &[f64]| -> Vec<Complex<f64>> {
        let mut buffer: Vec<Complex<f64>> = x.iter().map(|&v| Complex::new(v, 0.0)).collect();
        buffer.resize(padded_len, Complex::default());
        buffer
    };
    let mut lhs = padded(src);
    let mut rhs = padded(kernel);

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(padded_len);
    fft.process(&mut lhs);
    fft.process(&mut rhs);

    for (l, r) in lhs.iter_mut().zip(&rhs) {
        *l *= *r;
    }

    let ifft = planner.plan_fft_inverse(padded_len);
    ifft.process(&mut lhs);
    let scale = padded_len as f64;
    lhs.iter().take(full_len).map(|c| c.re / scale).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(got: &[f64], expected: &[f64]) {
        assert_eq!(got.len(), expected.len());
        for (i, (g, e)) in got.iter().zip(expected).enumerate() {
            assert!((g - e).abs() < 1e-9, "sample {}: got {}, expected {}", i, g, e);
        }
    }

    #[test]
    fn test_convolve_known() {
        // [1, 2, 3] * [1, 1] = [1, 3, 5, 3]
        let out = convolve_full(&[vec![1.0, 2.0, 3.0]], &[vec![1.0, 1.0]]).unwrap();
        assert_eq!(out.len(), 1);
        assert_close(&out[0], &[1.0, 3.0, 5.0, 3.0]);
    }

    #[test]
    fn test_convolve_unit_kernel_is_scaling() {
        let src = vec![0.5, -1.25, 3.0];
        let out = convolve_full(&[src.clone()], &[vec![4.0]]).unwrap();
        let scaled: Vec<f64> = src.iter().map(|x| x * 4.0).collect();
        assert_eq!(out[0], scaled);
    }

    #[test]
    fn test_fft_path_matches_direct() {
        let src: Vec<f64> = (0..300).map(|i| ((i * 7) % 13) as f64 - 6.0).collect();
        let kernel: Vec<f64> = (0..100).map(|i| 1.0 / (1.0 + i as f64)).collect();
        let direct = convolve_direct(&src, &kernel);
        let fft = convolve_fft(&src, &kernel);
        assert_eq!(fft.len(), 399);
        assert_close(&fft, &direct);
    }

    #[test]
    fn test_channel_broadcast() {
        let a = vec![vec![1.0]];
        let b = vec![vec![1.0, 2.0], vec![3.0, 4.0]];
        let out = convolve_full(&a, &b).unwrap();
        assert_eq!(out, b);

        let out = convolve_full(&b, &[vec![2.0], vec![0.5]]).unwrap();
        assert_close(&out[0], &[2.0, 4.0]);
        assert_close(&out[1], &[1.5, 2.0]);
    }

    #[test]
    fn test_channel_mismatch() {
        let a = vec![vec![1.0], vec![1.0]];
        let b = vec![vec![1.0], vec![1.0], vec![1.0]];
        assert_eq!(
            convolve_full(&a, &b),
            Err(ChainError::ShapeMismatch { lhs: 2, rhs: 3 })
        );
    }

    #[test]
    fn test_rfft_irfft_inverse() {
        let samples = vec![1.0, 0.25, -0.5, 0.0, 2.0, 1.5];
        let bins = rfft(&samples);
        assert_eq!(bins.len(), 4);
        assert_close(&irfft(&bins, samples.len()), &samples);

        let odd = vec![0.1, 0.2, 0.3, 0.4, 0.5];
        assert_close(&irfft(&rfft(&odd), odd.len()), &odd);
    }

    #[test]
    fn test_flat_spectrum_is_impulse() {
        let bins = vec![Complex::new(1.0, 0.0); 4];
        assert_close(&irfft(&bins, 6), &[1.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    }
}
