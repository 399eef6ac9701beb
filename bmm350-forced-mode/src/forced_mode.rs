use heapless::{String, Vec};

use crate::{
    driver::{Averaging, AxisEnable, Clock, DataRate, Magnetometer, PowerMode},
    error::{AcquisitionError, CombinationError},
    mag_reading::{MagTempReading, MagVector, NoiseLevel, TimedMagReading},
    noise_analyzer::compute_noise,
    sample_batch::{BatchRecorder, MAG_SAMPLE_COUNT},
};

pub const MAX_COMBINATIONS: usize = 16;
pub const COMBINATION_NAME_LEN: usize = 32;
pub const COMBINATION_DESCRIPTION_LEN: usize = 96;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Trigger {
    /// Set the power mode once, then read repeatedly.
    Once,
    /// Set the power mode before every read, one conversion per sample.
    EverySample,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Combination {
    pub name: String<COMBINATION_NAME_LEN>,
    pub description: String<COMBINATION_DESCRIPTION_LEN>,
    pub data_rate: DataRate,
    pub averaging: Averaging,
    pub power_mode: PowerMode,
    pub trigger: Trigger,
    pub sample_count: usize,
    pub analyze_noise: bool,
}

impl Combination {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: &str,
        description: &str,
        data_rate: DataRate,
        averaging: Averaging,
        power_mode: PowerMode,
        trigger: Trigger,
        sample_count: usize,
        analyze_noise: bool,
    ) -> Result<Self, CombinationError> {
        Ok(Self {
            name: String::try_from(name).map_err(|_| CombinationError::NameTooLong(name.len()))?,
            description: String::try_from(description)
                .map_err(|_| CombinationError::DescriptionTooLong(description.len()))?,
            data_rate,
            averaging,
            power_mode,
            trigger,
            sample_count,
            analyze_noise,
        })
    }
}

/// The six ODR / averaging / power mode combinations of the BMM350 forced mode walkthrough.
pub fn default_combinations() -> Vec<Combination, MAX_COMBINATIONS> {
    let combinations = [
        Combination::new(
            "forced-fast-avg4-single",
            "Set forced mode fast and read data with averaging between 4 samples",
            DataRate::Hz100,
            Averaging::Averaging4,
            PowerMode::ForcedFast,
            Trigger::Once,
            10,
            false,
        ),
        Combination::new(
            "forced-fast-avg4-loop",
            "Set forced mode fast and read data with averaging between 4 samples in a loop",
            DataRate::Hz100,
            Averaging::Averaging4,
            PowerMode::ForcedFast,
            Trigger::EverySample,
            10,
            false,
        ),
        Combination::new(
            "forced-no-avg-loop",
            "Set forced mode and read data with no averaging between samples in a loop",
            DataRate::Hz100,
            Averaging::NoAveraging,
            PowerMode::Forced,
            Trigger::EverySample,
            10,
            false,
        ),
        Combination::new(
            "forced-fast-avg4-noise",
            "Set forced mode fast and read data with averaging between 4 samples in a loop",
            DataRate::Hz100,
            Averaging::Averaging4,
            PowerMode::ForcedFast,
            Trigger::EverySample,
            MAG_SAMPLE_COUNT,
            true,
        ),
        Combination::new(
            "forced-no-avg-noise",
            "Set forced mode and read data with no averaging between samples in a loop",
            DataRate::Hz100,
            Averaging::NoAveraging,
            PowerMode::Forced,
            Trigger::EverySample,
            MAG_SAMPLE_COUNT,
            true,
        ),
        Combination::new(
            "forced-fast-avg2-noise",
            "Set forced mode fast and read data with averaging between 2 samples in a loop",
            DataRate::Hz100,
            Averaging::Averaging2,
            PowerMode::ForcedFast,
            Trigger::EverySample,
            MAG_SAMPLE_COUNT,
            true,
        ),
    ];

    let mut list = Vec::new();
    // every name and description above fits, 6 < MAX_COMBINATIONS
    for combination in combinations.into_iter().flatten() {
        let _ = list.push(combination);
    }
    list
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CombinationOutcome {
    pub sample_count: usize,
    /// Averaging actually written, after limiting it to what the data rate allows.
    pub averaging: Averaging,
    pub mean: Option<MagVector>,
    pub noise: Option<NoiseLevel>,
}

/// Receives readings as they arrive. This is where printing and file output live.
#[allow(unused_variables)]
pub trait ReadingSink {
    fn on_combination_start(&mut self, index: usize, combination: &Combination) {}

    fn on_reading(&mut self, reading: &TimedMagReading);

    fn on_combination_end(
        &mut self,
        index: usize,
        combination: &Combination,
        outcome: &CombinationOutcome,
    ) {
    }
}

/// Configures the magnetometer for `combination`, reads its samples and, when asked for,
/// computes the batch mean and RMS noise (`scale` per uT).
pub async fn run_combination<M: Magnetometer, C: Clock, S: ReadingSink>(
    mag: &mut M,
    clock: &C,
    combination: &Combination,
    scale: f64,
    sink: &mut S,
) -> Result<CombinationOutcome, AcquisitionError<M::Error>> {
    if combination.sample_count == 0 || combination.sample_count > MAG_SAMPLE_COUNT {
        return Err(AcquisitionError::InvalidSampleCount(
            combination.sample_count,
        ));
    }

    let averaging = combination.averaging.limit_for(combination.data_rate);
    if averaging != combination.averaging {
        log_warn!(
            "averaging over {} samples not supported at {} Hz, using {}",
            combination.averaging.samples(),
            combination.data_rate.hz(),
            averaging.samples(),
        );
    }
    mag.set_odr_performance(combination.data_rate, averaging)
        .await
        .map_err(AcquisitionError::Driver)?;

    if combination.trigger == Trigger::Once {
        mag.set_power_mode(combination.power_mode)
            .await
            .map_err(AcquisitionError::Driver)?;
    }

    let mut recorder = BatchRecorder::<MAG_SAMPLE_COUNT>::new();
    let start_time = clock.now_ms();
    for _ in 0..combination.sample_count {
        if combination.trigger == Trigger::EverySample {
            mag.set_power_mode(combination.power_mode)
                .await
                .map_err(AcquisitionError::Driver)?;
        }

        let reading: MagTempReading = mag
            .read_compensated()
            .await
            .map_err(AcquisitionError::Driver)?;
        sink.on_reading(&TimedMagReading {
            elapsed_ms: clock.now_ms() - start_time,
            reading,
        });
        recorder.push(reading)?;
    }

    let (mean, noise) = if combination.analyze_noise {
        let (batch, mean) = recorder.finish()?;
        let noise = compute_noise(&batch, &mean, scale)?;
        log_debug!(
            "noise x={} y={} z={} over {} samples",
            noise.x,
            noise.y,
            noise.z,
            batch.len(),
        );
        (Some(mean), Some(noise))
    } else {
        (None, None)
    };

    Ok(CombinationOutcome {
        sample_count: combination.sample_count,
        averaging,
        mean,
        noise,
    })
}

/// Enables all axes and runs every combination in order.
pub async fn run_sequence<M: Magnetometer, C: Clock, S: ReadingSink>(
    mag: &mut M,
    clock: &C,
    combinations: &[Combination],
    scale: f64,
    sink: &mut S,
) -> Result<(), AcquisitionError<M::Error>> {
    mag.enable_axes(AxisEnable::ALL)
        .await
        .map_err(AcquisitionError::Driver)?;

    for (index, combination) in combinations.iter().enumerate() {
        log_info!("running combination {}: {}", index + 1, combination.name.as_str());
        sink.on_combination_start(index, combination);
        let outcome = run_combination(mag, clock, combination, scale, sink).await?;
        sink.on_combination_end(index, combination, &outcome);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use core::cell::Cell;
    use std::vec::Vec as StdVec;

    use approx::assert_abs_diff_eq;
    use embedded_hal_async::delay::DelayNs;

    use super::*;
    use crate::{
        driver::{DummyMagnetometer, InterruptConfig},
        error::NoiseError,
    };

    struct NoDelay;

    impl DelayNs for NoDelay {
        async fn delay_ns(&mut self, _ns: u32) {}
    }

    /// Advances 10ms every time it is read.
    struct StepClock(Cell<f64>);

    impl Clock for StepClock {
        fn now_ms(&self) -> f64 {
            let now = self.0.get();
            self.0.set(now + 10.0);
            now
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        started: StdVec<usize>,
        readings: StdVec<TimedMagReading>,
        outcomes: StdVec<CombinationOutcome>,
    }

    impl ReadingSink for RecordingSink {
        fn on_combination_start(&mut self, index: usize, _combination: &Combination) {
            self.started.push(index);
        }

        fn on_reading(&mut self, reading: &TimedMagReading) {
            self.readings.push(*reading);
        }

        fn on_combination_end(
            &mut self,
            _index: usize,
            _combination: &Combination,
            outcome: &CombinationOutcome,
        ) {
            self.outcomes.push(outcome.clone());
        }
    }

    /// x alternates between 11 and 9 uT.
    struct AlternatingMagnetometer {
        reads: usize,
        fail_after: Option<usize>,
    }

    impl Magnetometer for AlternatingMagnetometer {
        type Error = &'static str;

        async fn chip_id(&mut self) -> Result<u8, Self::Error> {
            Ok(0x33)
        }
        async fn pmu_cmd_busy(&mut self) -> Result<bool, Self::Error> {
            Ok(false)
        }
        async fn error_register(&mut self) -> Result<u8, Self::Error> {
            Ok(0)
        }
        async fn configure_interrupt(&mut self, _: InterruptConfig) -> Result<(), Self::Error> {
            Ok(())
        }
        async fn enable_data_ready_interrupt(&mut self, _: bool) -> Result<(), Self::Error> {
            Ok(())
        }
        async fn interrupt_control(&mut self) -> Result<u8, Self::Error> {
            Ok(0x86)
        }
        async fn set_odr_performance(
            &mut self,
            _: DataRate,
            _: Averaging,
        ) -> Result<(), Self::Error> {
            Ok(())
        }
        async fn enable_axes(&mut self, _: AxisEnable) -> Result<(), Self::Error> {
            Ok(())
        }
        async fn set_power_mode(&mut self, _: PowerMode) -> Result<(), Self::Error> {
            Ok(())
        }
        async fn read_compensated(&mut self) -> Result<MagTempReading, Self::Error> {
            if self.fail_after == Some(self.reads) {
                return Err("i2c nack");
            }
            let x = if self.reads % 2 == 0 { 11.0 } else { 9.0 };
            self.reads += 1;
            Ok(MagTempReading::new(x, -20.0, 45.0, 25.0))
        }
    }

    fn combination(trigger: Trigger, sample_count: usize, analyze_noise: bool) -> Combination {
        Combination::new(
            "test",
            "test combination",
            DataRate::Hz100,
            Averaging::Averaging4,
            PowerMode::ForcedFast,
            trigger,
            sample_count,
            analyze_noise,
        )
        .unwrap()
    }

    #[test]
    fn default_combinations_match_walkthrough() {
        let combinations = default_combinations();
        assert_eq!(combinations.len(), 6);
        assert_eq!(combinations[0].trigger, Trigger::Once);
        assert!(combinations[1..]
            .iter()
            .all(|c| c.trigger == Trigger::EverySample));
        assert!(combinations[..3].iter().all(|c| c.sample_count == 10));
        assert!(combinations[3..]
            .iter()
            .all(|c| c.analyze_noise && c.sample_count == MAG_SAMPLE_COUNT));
        assert_eq!(combinations[5].averaging, Averaging::Averaging2);
        assert_eq!(combinations[4].power_mode, PowerMode::Forced);
    }

    #[test]
    fn names_that_do_not_fit_are_rejected() {
        let name = "forced-fast-avg4-noise-run-for-bench-7";
        let result = Combination::new(
            name,
            "",
            DataRate::Hz100,
            Averaging::Averaging4,
            PowerMode::ForcedFast,
            Trigger::EverySample,
            10,
            true,
        );
        assert_eq!(result, Err(CombinationError::NameTooLong(38)));

        let description = [b'a'; COMBINATION_DESCRIPTION_LEN + 1];
        let description = core::str::from_utf8(&description).unwrap();
        let result = Combination::new(
            "ok",
            description,
            DataRate::Hz100,
            Averaging::NoAveraging,
            PowerMode::Forced,
            Trigger::Once,
            10,
            false,
        );
        assert_eq!(
            result,
            Err(CombinationError::DescriptionTooLong(COMBINATION_DESCRIPTION_LEN + 1))
        );

        let exact = [b'b'; COMBINATION_NAME_LEN];
        let exact = core::str::from_utf8(&exact).unwrap();
        let combination = Combination::new(
            exact,
            "",
            DataRate::Hz100,
            Averaging::NoAveraging,
            PowerMode::Forced,
            Trigger::Once,
            10,
            false,
        )
        .unwrap();
        assert_eq!(combination.name.as_str(), exact);
    }

    #[tokio::test]
    async fn trigger_once_sets_power_mode_once() {
        let mut mag = DummyMagnetometer::new(NoDelay, MagTempReading::new(1.0, 2.0, 3.0, 20.0));
        let clock = StepClock(Cell::new(0.0));
        let mut sink = RecordingSink::default();

        let outcome = run_combination(
            &mut mag,
            &clock,
            &combination(Trigger::Once, 10, false),
            1000.0,
            &mut sink,
        )
        .await
        .unwrap();

        assert_eq!(mag.power_mode_writes, 1);
        assert_eq!(mag.reads, 10);
        assert_eq!(mag.data_rate, Some(DataRate::Hz100));
        assert_eq!(sink.readings.len(), 10);
        assert_eq!(outcome.mean, None);
        assert_eq!(outcome.noise, None);
    }

    #[tokio::test]
    async fn every_sample_trigger_and_zero_noise() {
        let mut mag = DummyMagnetometer::new(NoDelay, MagTempReading::new(1.0, 2.0, 3.0, 20.0));
        let clock = StepClock(Cell::new(0.0));
        let mut sink = RecordingSink::default();

        let outcome = run_combination(
            &mut mag,
            &clock,
            &combination(Trigger::EverySample, MAG_SAMPLE_COUNT, true),
            1000.0,
            &mut sink,
        )
        .await
        .unwrap();

        assert_eq!(mag.power_mode_writes, MAG_SAMPLE_COUNT);
        assert_eq!(mag.power_mode, PowerMode::ForcedFast);
        assert_eq!(outcome.mean, Some(MagVector::new(1.0, 2.0, 3.0)));
        assert_eq!(outcome.noise, Some(NoiseLevel::default()));
    }

    #[tokio::test]
    async fn elapsed_time_is_relative_to_start() {
        let mut mag = DummyMagnetometer::new(NoDelay, MagTempReading::default());
        let clock = StepClock(Cell::new(5000.0));
        let mut sink = RecordingSink::default();

        run_combination(
            &mut mag,
            &clock,
            &combination(Trigger::EverySample, 3, false),
            1000.0,
            &mut sink,
        )
        .await
        .unwrap();

        let elapsed: StdVec<f64> = sink.readings.iter().map(|r| r.elapsed_ms).collect();
        assert_eq!(elapsed, [10.0, 20.0, 30.0]);
    }

    #[tokio::test]
    async fn noise_of_alternating_signal() {
        let mut mag = AlternatingMagnetometer {
            reads: 0,
            fail_after: None,
        };
        let clock = StepClock(Cell::new(0.0));
        let mut sink = RecordingSink::default();

        let outcome = run_combination(
            &mut mag,
            &clock,
            &combination(Trigger::EverySample, 100, true),
            1000.0,
            &mut sink,
        )
        .await
        .unwrap();

        let mean = outcome.mean.unwrap();
        let noise = outcome.noise.unwrap();
        assert_abs_diff_eq!(mean.x, 10.0, epsilon = 1e-9);
        assert_abs_diff_eq!(noise.x, 1000.0, epsilon = 1e-6);
        assert_abs_diff_eq!(noise.y, 0.0, epsilon = 1e-9);
    }

    #[tokio::test]
    async fn averaging_is_limited_before_writing() {
        let mut mag = DummyMagnetometer::new(NoDelay, MagTempReading::default());
        let clock = StepClock(Cell::new(0.0));
        let mut sink = RecordingSink::default();
        let mut fast = combination(Trigger::Once, 1, false);
        fast.data_rate = DataRate::Hz400;

        let outcome = run_combination(&mut mag, &clock, &fast, 1000.0, &mut sink)
            .await
            .unwrap();
        assert_eq!(outcome.averaging, Averaging::NoAveraging);
        assert_eq!(mag.averaging, Some(Averaging::NoAveraging));
    }

    #[tokio::test]
    async fn invalid_sample_counts() {
        let mut mag = DummyMagnetometer::new(NoDelay, MagTempReading::default());
        let clock = StepClock(Cell::new(0.0));
        let mut sink = RecordingSink::default();

        for count in [0, MAG_SAMPLE_COUNT + 1] {
            let result = run_combination(
                &mut mag,
                &clock,
                &combination(Trigger::EverySample, count, true),
                1000.0,
                &mut sink,
            )
            .await;
            assert!(matches!(
                result,
                Err(AcquisitionError::InvalidSampleCount(c)) if c == count
            ));
        }
        assert_eq!(mag.reads, 0);
    }

    #[tokio::test]
    async fn bad_scale_surfaces_as_noise_error() {
        let mut mag = DummyMagnetometer::new(NoDelay, MagTempReading::default());
        let clock = StepClock(Cell::new(0.0));
        let mut sink = RecordingSink::default();

        let result = run_combination(
            &mut mag,
            &clock,
            &combination(Trigger::EverySample, 4, true),
            -1.0,
            &mut sink,
        )
        .await;
        assert!(matches!(
            result,
            Err(AcquisitionError::Noise(NoiseError::InvalidScale(_)))
        ));
    }

    #[tokio::test]
    async fn driver_error_aborts_sequence() {
        let mut mag = AlternatingMagnetometer {
            reads: 0,
            fail_after: Some(15),
        };
        let clock = StepClock(Cell::new(0.0));
        let mut sink = RecordingSink::default();

        let result = run_sequence(
            &mut mag,
            &clock,
            &default_combinations(),
            1000.0,
            &mut sink,
        )
        .await;

        assert!(matches!(result, Err(AcquisitionError::Driver("i2c nack"))));
        assert_eq!(sink.started, [0, 1]);
        assert_eq!(sink.outcomes.len(), 1);
        assert_eq!(sink.readings.len(), 15);
    }

    #[tokio::test]
    async fn full_sequence_reports_every_combination() {
        let mut mag = DummyMagnetometer::new(NoDelay, MagTempReading::new(3.0, 4.0, 5.0, 21.0));
        let clock = StepClock(Cell::new(0.0));
        let mut sink = RecordingSink::default();

        run_sequence(
            &mut mag,
            &clock,
            &default_combinations(),
            1000.0,
            &mut sink,
        )
        .await
        .unwrap();

        assert_eq!(mag.axes, Some(AxisEnable::ALL));
        assert_eq!(sink.started, [0, 1, 2, 3, 4, 5]);
        assert_eq!(sink.readings.len(), 3 * 10 + 3 * MAG_SAMPLE_COUNT);
        assert_eq!(
            sink.outcomes.iter().filter(|o| o.noise.is_some()).count(),
            3
        );
        // trigger once: 1, then one per sample
        assert_eq!(mag.power_mode_writes, 1 + 2 * 10 + 3 * MAG_SAMPLE_COUNT);
    }
}
