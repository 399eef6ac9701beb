use std::path::Path;

use anyhow::{anyhow, Result};
use bmm350_forced_mode::{compute_noise, mean_of, MagTempReading, MagVector, NoiseLevel};

/// Loads readings written by `MagReadingCSVWriter` (or anything with the same column order).
pub fn read_readings_csv<P: AsRef<Path>>(path: P) -> Result<Vec<MagTempReading>> {
    let mut readings = Vec::new();

    for (line, record) in csv::Reader::from_path(path)?.records().enumerate() {
        let record = record?;
        if record.len() < 5 {
            return Err(anyhow!(
                "row {} has {} columns, expected 5",
                line + 1,
                record.len()
            ));
        }
        let field = |i: usize| -> Result<f64> {
            record[i]
                .trim()
                .parse::<f64>()
                .map_err(|e| anyhow!("row {} column {}: {}", line + 1, i + 1, e))
        };
        readings.push(MagTempReading::new(field(1)?, field(2)?, field(3)?, field(4)?));
    }

    Ok(readings)
}

pub fn analyze_readings(readings: &[MagTempReading], scale: f64) -> Result<(MagVector, NoiseLevel)> {
    let mean = mean_of(readings).map_err(|e| anyhow!("{}", e))?;
    let noise = compute_noise(readings, &mean, scale).map_err(|e| anyhow!("{}", e))?;
    Ok((mean, noise))
}
