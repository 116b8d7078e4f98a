//! Reader for microphone calibration files.
//!
//! The expected layout is the one miniDSP ships with the UMIK-1: a header
//! line containing `Sens Factor =<value>dB`, followed by `<freq> <dB>` rows.
//! Rows whose first token is not a number are skipped, extra columns (phase)
//! are ignored.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::domain::types::MicCalibrationData;
use crate::error::{ChainError, Result};

pub fn load_calibration_file<P: AsRef<Path>>(path: P) -> Result<MicCalibrationData> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|err| ChainError::Calibration(format!("{}: {}", path.display(), err)))?;
    let data = parse_calibration(BufReader::new(file))?;
    log::info!(
        "loaded calibration {} ({} points, sensitivity {} dB)",
        path.display(),
        data.frequency.len(),
        data.sensitivity_db
    );
    Ok(data)
}

pub fn parse_calibration<R: BufRead>(reader: R) -> Result<MicCalibrationData> {
    let mut lines = reader.lines();
    let first_line = lines
        .next()
        .ok_or_else(|| ChainError::Calibration("file is empty".into()))?
        .map_err(io_error)?;
    let sensitivity_db = extract_sensitivity(&first_line)?;

    let mut frequency: Vec<f64> = Vec::new();
    let mut response_db: Vec<f64> = Vec::new();

    for (number, line) in lines.enumerate() {
        let line = line.map_err(io_error)?;
        let mut parts = line.split_whitespace();
        let (Some(freq), Some(resp)) = (parts.next(), parts.next()) else {
            continue;
        };
        let Ok(freq) = freq.parse::<f64>() else {
            continue;
        };
        let resp: f64 = resp.parse().map_err(|_| {
            ChainError::Calibration(format!("line {}: invalid response value '{}'", number + 2, resp))
        })?;
        if !freq.is_finite() || !resp.is_finite() {
            return Err(ChainError::Calibration(format!(
                "line {}: non-finite calibration point '{} {}'",
                number + 2,
                freq,
                resp
            )));
        }

        if frequency.last().is_some_and(|&last| freq <= last) {
            return Err(ChainError::Calibration(format!(
                "line {}: frequencies must be strictly ascending",
                number + 2
            )));
        }
        frequency.push(freq);
        response_db.push(resp);
    }

    if frequency.is_empty() {
        return Err(ChainError::Calibration("no calibration points".into()));
    }

    Ok(MicCalibrationData {
        sensitivity_db,
        frequency,
        response_db,
    })
}

pub fn parse_calibration_str(text: &str) -> Result<MicCalibrationData> {
    parse_calibration(text.as_bytes())
}

fn extract_sensitivity(line: &str) -> Result<f64> {
    for part in line.split(',') {
        if part.contains("Sens Factor") {
            let value_part = part
                .split('=')
                .nth(1)
                .ok_or_else(|| ChainError::Calibration("invalid sensitivity format".into()))?;
            let value_str = value_part
                .trim()
                .trim_matches('"')
                .trim_end_matches("dB")
                .trim();
            return match value_str.parse::<f64>() {
                Ok(value) if value.is_finite() => Ok(value),
                _ => Err(ChainError::Calibration(format!(
                    "invalid sensitivity value '{}'",
                    value_str
                ))),
            };
        }
    }
    Err(ChainError::Calibration("sensitivity not found".into()))
}

fn io_error(err: std::io::Error) -> ChainError {
    ChainError::Calibration(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const UMIK: &str = "\"Sens Factor =-1.359dB, SERNO: 0000000\"\n\
                        10.054\t-0.9614\n\
                        10.179\t-0.8913\n\
                        1000.0\t0.0\n\
                        20000.0\t-1.2\n";

    #[test]
    fn test_parse_umik_file() {
        let data = parse_calibration_str(UMIK).unwrap();
        assert!((data.sensitivity_db + 1.359).abs() < 1e-12);
        assert_eq!(data.frequency, vec![10.054, 10.179, 1000.0, 20000.0]);
        assert_eq!(data.response_db, vec![-0.9614, -0.8913, 0.0, -1.2]);
    }

    #[test]
    fn test_skips_headers_and_phase_column() {
        let text = "Sens Factor =0.5dB\nFreq(Hz) dB Phase\n20 1.0 12.5\n\n40 2.0 -3\n";
        let data = parse_calibration_str(text).unwrap();
        assert_eq!(data.frequency, vec![20.0, 40.0]);
        assert_eq!(data.response_db, vec![1.0, 2.0]);
    }

    #[test]
    fn test_missing_sensitivity() {
        let err = parse_calibration_str("SERNO: 1\n20 1.0\n").unwrap_err();
        assert_eq!(err, ChainError::Calibration("sensitivity not found".into()));
    }

    #[test]
    fn test_rejects_bad_rows() {
        assert!(parse_calibration_str("").is_err());
        assert!(parse_calibration_str("Sens Factor =0dB\n").is_err());
        assert!(parse_calibration_str("Sens Factor =0dB\n20 loud\n").is_err());
        assert!(parse_calibration_str("Sens Factor =0dB\n40 1\n20 1\n").is_err());
    }

    #[test]
    fn test_rejects_non_finite_points() {
        let err = parse_calibration_str("Sens Factor =0dB\nnan 3.0\n100 1.0\n").unwrap_err();
        assert_eq!(
            err,
            ChainError::Calibration("line 2: non-finite calibration point 'NaN 3'".into())
        );
        assert!(parse_calibration_str("Sens Factor =0dB\n20 1.0\n40 inf\n").is_err());
        assert!(parse_calibration_str("Sens Factor =0dB\n20 1.0\ninf 1.0\n").is_err());
        assert!(parse_calibration_str("Sens Factor =NaNdB\n20 1.0\n").is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = load_calibration_file("/nonexistent/cal.txt").unwrap_err();
        assert!(matches!(err, ChainError::Calibration(_)));
    }
}
