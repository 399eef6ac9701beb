#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NoiseError {
    /// A batch needs at least one sample, the variance divides by its length.
    EmptyBatch,
    BatchFull,
    /// Scale must be finite and positive.
    InvalidScale(f64),
}

impl core::fmt::Display for NoiseError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            NoiseError::EmptyBatch => write!(f, "batch length must be > 0"),
            NoiseError::BatchFull => write!(f, "batch is full"),
            NoiseError::InvalidScale(scale) => write!(f, "invalid noise scale {}", scale),
        }
    }
}

/// A combination name or description longer than the fixed capacity. Carries the byte length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CombinationError {
    NameTooLong(usize),
    DescriptionTooLong(usize),
}

impl core::fmt::Display for CombinationError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            CombinationError::NameTooLong(len) => write!(
                f,
                "combination name is {} bytes, at most {} fit",
                len,
                crate::forced_mode::COMBINATION_NAME_LEN
            ),
            CombinationError::DescriptionTooLong(len) => write!(
                f,
                "combination description is {} bytes, at most {} fit",
                len,
                crate::forced_mode::COMBINATION_DESCRIPTION_LEN
            ),
        }
    }
}

#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AcquisitionError<E> {
    Driver(E),
    Noise(NoiseError),
    InvalidSampleCount(usize),
}

impl<E> From<NoiseError> for AcquisitionError<E> {
    fn from(value: NoiseError) -> Self {
        Self::Noise(value)
    }
}

impl<E: core::fmt::Debug> core::fmt::Display for AcquisitionError<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            AcquisitionError::Driver(e) => write!(f, "magnetometer error: {:?}", e),
            AcquisitionError::Noise(e) => write!(f, "{}", e),
            AcquisitionError::InvalidSampleCount(count) => {
                write!(f, "sample count {} out of range", count)
            }
        }
    }
}
