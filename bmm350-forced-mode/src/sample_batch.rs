use core::ops::Deref;

use heapless::Vec;

use crate::{
    error::NoiseError,
    mag_reading::{MagTempReading, MagVector, NoiseLevel},
    noise_analyzer::{compute_noise, mean_of},
};

pub const MAG_SAMPLE_COUNT: usize = 100;

/// A captured, non-empty batch of readings. There is no way to change it after capture.
#[derive(Debug, Clone)]
pub struct SampleBatch<const N: usize = MAG_SAMPLE_COUNT> {
    readings: Vec<MagTempReading, N>,
}

impl<const N: usize> SampleBatch<N> {
    pub fn from_slice(readings: &[MagTempReading]) -> Result<Self, NoiseError> {
        if readings.is_empty() {
            return Err(NoiseError::EmptyBatch);
        }
        let readings = Vec::from_slice(readings).map_err(|_| NoiseError::BatchFull)?;
        Ok(Self { readings })
    }

    pub fn as_slice(&self) -> &[MagTempReading] {
        self.readings.as_slice()
    }

    pub fn mean(&self) -> MagVector {
        // never empty, see constructors
        mean_of(self.as_slice()).unwrap_or(MagVector::ZERO)
    }

    pub fn noise(&self, scale: f64) -> Result<NoiseLevel, NoiseError> {
        compute_noise(self.as_slice(), &self.mean(), scale)
    }
}

impl<const N: usize> Deref for SampleBatch<N> {
    type Target = [MagTempReading];

    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

/// Collects readings one by one while keeping a running per-axis sum.
pub struct BatchRecorder<const N: usize = MAG_SAMPLE_COUNT> {
    readings: Vec<MagTempReading, N>,
    sum: MagVector,
}

impl<const N: usize> BatchRecorder<N> {
    pub fn new() -> Self {
        Self {
            readings: Vec::new(),
            sum: MagVector::ZERO,
        }
    }

    pub fn push(&mut self, reading: MagTempReading) -> Result<(), NoiseError> {
        self.readings
            .push(reading)
            .map_err(|_| NoiseError::BatchFull)?;
        self.sum.accumulate(&reading);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.readings.is_full()
    }

    /// Returns the batch together with its mean (running sum / count).
    pub fn finish(self) -> Result<(SampleBatch<N>, MagVector), NoiseError> {
        if self.readings.is_empty() {
            return Err(NoiseError::EmptyBatch);
        }
        let mean = self.sum.divide(self.readings.len());
        Ok((
            SampleBatch {
                readings: self.readings,
            },
            mean,
        ))
    }
}

impl<const N: usize> Default for BatchRecorder<N> {
    fn default() -> Self {
        Self::new()
    }
}
