use bmm350_forced_mode::{
    driver::{
        Averaging, AxisEnable, DataRate, InterruptConfig, Magnetometer, PowerMode,
        BMM350_CHIP_ID, DRDY_DATA_REG_EN_MSK,
    },
    MagTempReading,
};
use embedded_hal_async::delay::DelayNs;
use rand::{rngs::SmallRng, Rng, SeedableRng};
use rand_distr::StandardNormal;

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    /// None seeds from entropy
    pub seed: Option<u64>,
    pub field_ut: [f64; 3],
    pub temperature_degc: f64,
    /// rms noise of one conversion in forced mode without averaging
    pub noise_ut_rms: f64,
    /// forced mode fast is this much noisier than forced mode
    pub fast_noise_factor: f64,
    pub temperature_noise_degc: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: None,
            field_ut: [22.5, -4.8, -41.3],
            temperature_degc: 24.0,
            noise_ut_rms: 0.19,
            fast_noise_factor: 1.6,
            temperature_noise_degc: 0.02,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SimulatedError {
    #[error("no conversion has completed yet")]
    NoData,
}

const SUSPEND_SETTLE_US: u32 = 6_000;

/// A BMM350 stand-in: a constant field plus gaussian noise that shrinks with averaging.
pub struct SimulatedBmm350<D: DelayNs> {
    delay: D,
    rng: SmallRng,
    config: SimulationConfig,
    data_rate: DataRate,
    averaging: Averaging,
    axes: AxisEnable,
    power_mode: PowerMode,
    int_ctrl: u8,
    last_conversion: Option<MagTempReading>,
    suspend_hops: usize,
}

impl<D: DelayNs> SimulatedBmm350<D> {
    pub fn new(delay: D, config: SimulationConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        Self {
            delay,
            rng,
            config,
            data_rate: DataRate::Hz100,
            averaging: Averaging::NoAveraging,
            axes: AxisEnable::ALL,
            power_mode: PowerMode::Suspend,
            int_ctrl: 0,
            last_conversion: None,
            suspend_hops: 0,
        }
    }

    pub fn power_mode(&self) -> PowerMode {
        self.power_mode
    }

    /// How many times a forced mode request had to leave normal mode through suspend.
    pub fn suspend_hops(&self) -> usize {
        self.suspend_hops
    }

    fn gaussian(&mut self, stddev: f64) -> f64 {
        if stddev == 0.0 {
            return 0.0;
        }
        let n: f64 = self.rng.sample(StandardNormal);
        n * stddev
    }

    fn conversion_noise(&self, mode: PowerMode) -> f64 {
        let mut noise = self.config.noise_ut_rms / (self.averaging.samples() as f64).sqrt();
        if mode == PowerMode::ForcedFast {
            noise *= self.config.fast_noise_factor;
        }
        noise
    }

    fn convert(&mut self, mode: PowerMode) -> MagTempReading {
        let noise = self.conversion_noise(mode);
        let [x, y, z] = self.config.field_ut;
        let x = if self.axes.x { x + self.gaussian(noise) } else { 0.0 };
        let y = if self.axes.y { y + self.gaussian(noise) } else { 0.0 };
        let z = if self.axes.z { z + self.gaussian(noise) } else { 0.0 };
        let temperature_noise = self.config.temperature_noise_degc;
        let temperature = self.config.temperature_degc + self.gaussian(temperature_noise);

        let reading = MagTempReading::new(x, y, z, temperature);
        self.last_conversion = Some(reading);
        reading
    }
}

impl<D: DelayNs> Magnetometer for SimulatedBmm350<D> {
    type Error = SimulatedError;

    async fn chip_id(&mut self) -> Result<u8, Self::Error> {
        Ok(BMM350_CHIP_ID)
    }

    async fn pmu_cmd_busy(&mut self) -> Result<bool, Self::Error> {
        Ok(false)
    }

    async fn error_register(&mut self) -> Result<u8, Self::Error> {
        Ok(0)
    }

    async fn configure_interrupt(&mut self, config: InterruptConfig) -> Result<(), Self::Error> {
        self.int_ctrl = (self.int_ctrl & 0xF0) | config.control_bits();
        Ok(())
    }

    async fn enable_data_ready_interrupt(&mut self, enable: bool) -> Result<(), Self::Error> {
        if enable {
            self.int_ctrl |= DRDY_DATA_REG_EN_MSK;
        } else {
            self.int_ctrl &= !DRDY_DATA_REG_EN_MSK;
        }
        Ok(())
    }

    async fn interrupt_control(&mut self) -> Result<u8, Self::Error> {
        Ok(self.int_ctrl)
    }

    async fn set_odr_performance(
        &mut self,
        data_rate: DataRate,
        averaging: Averaging,
    ) -> Result<(), Self::Error> {
        self.data_rate = data_rate;
        self.averaging = averaging.limit_for(data_rate);
        Ok(())
    }

    async fn enable_axes(&mut self, axes: AxisEnable) -> Result<(), Self::Error> {
        self.axes = axes;
        Ok(())
    }

    async fn set_power_mode(&mut self, mode: PowerMode) -> Result<(), Self::Error> {
        if mode.is_forced() && self.power_mode == PowerMode::Normal {
            // a forced conversion can not start from normal mode, go through suspend first
            self.power_mode = PowerMode::Suspend;
            self.suspend_hops += 1;
            self.delay.delay_us(SUSPEND_SETTLE_US).await;
        }

        if let Some(conversion_time_us) = mode.forced_conversion_time_us(self.averaging) {
            self.delay.delay_us(conversion_time_us).await;
            self.convert(mode);
            // back to suspend once the single conversion is done
            self.power_mode = PowerMode::Suspend;
        } else {
            self.power_mode = mode;
        }
        Ok(())
    }

    async fn read_compensated(&mut self) -> Result<MagTempReading, Self::Error> {
        if self.power_mode == PowerMode::Normal {
            let period_us = (1_000_000.0 / self.data_rate.hz()) as u32;
            self.delay.delay_us(period_us).await;
            return Ok(self.convert(PowerMode::Normal));
        }
        self.last_conversion.ok_or(SimulatedError::NoData)
    }
}

#[cfg(test)]
mod tests {
    use bmm350_forced_mode::{compute_noise, mean_of};

    use super::*;
    use crate::host::NoDelay;

    fn config() -> SimulationConfig {
        SimulationConfig {
            seed: Some(7),
            ..Default::default()
        }
    }

    async fn noise_x(mode: PowerMode, averaging: Averaging) -> f64 {
        let mut mag = SimulatedBmm350::new(NoDelay, config());
        mag.set_odr_performance(DataRate::Hz25, averaging)
            .await
            .unwrap();
        let mut readings = vec![];
        for _ in 0..2000 {
            mag.set_power_mode(mode).await.unwrap();
            readings.push(mag.read_compensated().await.unwrap());
        }
        let mean = mean_of(&readings).unwrap();
        compute_noise(&readings, &mean, 1000.0).unwrap().x
    }

    #[tokio::test]
    async fn read_before_conversion_fails() {
        let mut mag = SimulatedBmm350::new(NoDelay, config());
        assert!(matches!(
            mag.read_compensated().await,
            Err(SimulatedError::NoData)
        ));
    }

    #[tokio::test]
    async fn forced_mode_returns_to_suspend() {
        let mut mag = SimulatedBmm350::new(NoDelay, config());
        mag.set_power_mode(PowerMode::ForcedFast).await.unwrap();
        assert_eq!(mag.power_mode(), PowerMode::Suspend);

        let first = mag.read_compensated().await.unwrap();
        let second = mag.read_compensated().await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn forced_from_normal_goes_through_suspend() {
        let mut mag = SimulatedBmm350::new(NoDelay, config());
        mag.set_power_mode(PowerMode::Normal).await.unwrap();
        let continuous = mag.read_compensated().await.unwrap();

        mag.set_power_mode(PowerMode::Forced).await.unwrap();
        assert_eq!(mag.suspend_hops(), 1);
        assert_eq!(mag.power_mode(), PowerMode::Suspend);
        let forced = mag.read_compensated().await.unwrap();
        assert_ne!(forced, continuous);

        // already suspended, no extra hop
        mag.set_power_mode(PowerMode::ForcedFast).await.unwrap();
        assert_eq!(mag.suspend_hops(), 1);
    }

    #[tokio::test]
    async fn unseeded_simulations_still_convert() {
        let mut mag = SimulatedBmm350::new(NoDelay, SimulationConfig::default());
        mag.set_power_mode(PowerMode::Forced).await.unwrap();
        let reading = mag.read_compensated().await.unwrap();
        assert!((reading.x - 22.5).abs() < 5.0);
    }

    #[tokio::test]
    async fn disabled_axes_read_zero() {
        let mut mag = SimulatedBmm350::new(NoDelay, config());
        mag.enable_axes(AxisEnable {
            x: true,
            y: false,
            z: true,
        })
        .await
        .unwrap();
        mag.set_power_mode(PowerMode::Forced).await.unwrap();
        let reading = mag.read_compensated().await.unwrap();
        assert_eq!(reading.y, 0.0);
        assert!(reading.x != 0.0);
    }

    #[tokio::test]
    async fn averaging_lowers_noise() {
        let no_avg = noise_x(PowerMode::Forced, Averaging::NoAveraging).await;
        let avg_8 = noise_x(PowerMode::Forced, Averaging::Averaging8).await;
        let fast = noise_x(PowerMode::ForcedFast, Averaging::NoAveraging).await;

        // 190 nT rms configured, sqrt(8) less with averaging, 1.6x more in fast mode
        assert!((no_avg - 190.0).abs() < 20.0, "{}", no_avg);
        assert!((avg_8 - 190.0 / 8f64.sqrt()).abs() < 10.0, "{}", avg_8);
        assert!((fast - 304.0).abs() < 30.0, "{}", fast);
    }

    #[tokio::test]
    async fn same_seed_same_readings() {
        let mut a = SimulatedBmm350::new(NoDelay, config());
        let mut b = SimulatedBmm350::new(NoDelay, config());
        for _ in 0..5 {
            a.set_power_mode(PowerMode::Forced).await.unwrap();
            b.set_power_mode(PowerMode::Forced).await.unwrap();
            assert_eq!(
                a.read_compensated().await.unwrap(),
                b.read_compensated().await.unwrap()
            );
        }
    }
}
