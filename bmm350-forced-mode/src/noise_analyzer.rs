use libm::sqrt;

use crate::{
    error::NoiseError,
    mag_reading::{MagTempReading, MagVector, NoiseLevel},
};

/// uT deviation -> nT rms
pub const NOISE_SCALE_UT_TO_NT: f64 = 1000.0;

/// Per-axis arithmetic mean of a batch.
pub fn mean_of(batch: &[MagTempReading]) -> Result<MagVector, NoiseError> {
    if batch.is_empty() {
        return Err(NoiseError::EmptyBatch);
    }

    let mut sum = MagVector::ZERO;
    for reading in batch {
        sum.accumulate(reading);
    }
    Ok(sum.divide(batch.len()))
}

/// RMS noise of `batch` around `mean`, multiplied by `scale`.
///
/// Uses the population variance (divides by N, not N - 1). `mean` is expected to be the mean of
/// this exact batch; nothing checks that.
pub fn compute_noise(
    batch: &[MagTempReading],
    mean: &MagVector,
    scale: f64,
) -> Result<NoiseLevel, NoiseError> {
    if batch.is_empty() {
        return Err(NoiseError::EmptyBatch);
    }
    if !scale.is_finite() || scale <= 0.0 {
        return Err(NoiseError::InvalidScale(scale));
    }

    let mut variance = MagVector::ZERO;
    for reading in batch {
        variance.x += (reading.x - mean.x) * (reading.x - mean.x);
        variance.y += (reading.y - mean.y) * (reading.y - mean.y);
        variance.z += (reading.z - mean.z) * (reading.z - mean.z);
    }
    let variance = variance.divide(batch.len());

    Ok(NoiseLevel {
        x: sqrt(variance.x) * scale,
        y: sqrt(variance.y) * scale,
        z: sqrt(variance.z) * scale,
    })
}
