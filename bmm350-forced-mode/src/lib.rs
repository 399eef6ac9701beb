#![cfg_attr(not(test), no_std)]

// must stay first, the log_* macros are textually scoped
mod fmt;

pub mod device_check;
pub mod driver;
mod error;
pub mod forced_mode;
mod mag_reading;
pub mod noise_analyzer;
pub mod sample_batch;

pub use device_check::{check_device, DeviceStatus};
pub use error::{AcquisitionError, CombinationError, NoiseError};
pub use forced_mode::{
    default_combinations, run_combination, run_sequence, Combination, CombinationOutcome,
    ReadingSink, Trigger,
};
pub use mag_reading::{MagTempReading, MagVector, NoiseLevel, TimedMagReading};
pub use noise_analyzer::{compute_noise, mean_of, NOISE_SCALE_UT_TO_NT};
pub use sample_batch::{BatchRecorder, SampleBatch, MAG_SAMPLE_COUNT};
