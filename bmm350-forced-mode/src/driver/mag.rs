use core::fmt::Debug;

use embedded_hal_async::delay::DelayNs;

use crate::mag_reading::MagTempReading;

use super::config::{
    Averaging, AxisEnable, DataRate, InterruptConfig, PowerMode, BMM350_CHIP_ID,
    DRDY_DATA_REG_EN_MSK,
};

/// Everything the forced-mode sequence needs from a BMM350 driver. Register access, bus
/// transport and compensation stay inside the implementation.
#[allow(async_fn_in_trait)]
pub trait Magnetometer {
    type Error: Debug;

    async fn chip_id(&mut self) -> Result<u8, Self::Error>;
    async fn pmu_cmd_busy(&mut self) -> Result<bool, Self::Error>;
    async fn error_register(&mut self) -> Result<u8, Self::Error>;

    async fn configure_interrupt(&mut self, config: InterruptConfig) -> Result<(), Self::Error>;
    async fn enable_data_ready_interrupt(&mut self, enable: bool) -> Result<(), Self::Error>;
    async fn interrupt_control(&mut self) -> Result<u8, Self::Error>;

    async fn set_odr_performance(
        &mut self,
        data_rate: DataRate,
        averaging: Averaging,
    ) -> Result<(), Self::Error>;
    async fn enable_axes(&mut self, axes: AxisEnable) -> Result<(), Self::Error>;

    /// Forced modes start exactly one conversion.
    async fn set_power_mode(&mut self, mode: PowerMode) -> Result<(), Self::Error>;

    async fn read_compensated(&mut self) -> Result<MagTempReading, Self::Error>;
}

/// Always returns the same reading.
pub struct DummyMagnetometer<D: DelayNs> {
    delay: D,
    reading: MagTempReading,
    int_ctrl: u8,
    pub data_rate: Option<DataRate>,
    pub averaging: Option<Averaging>,
    pub axes: Option<AxisEnable>,
    pub power_mode: PowerMode,
    pub power_mode_writes: usize,
    pub reads: usize,
}

impl<D: DelayNs> DummyMagnetometer<D> {
    pub fn new(delay: D, reading: MagTempReading) -> Self {
        Self {
            delay,
            reading,
            int_ctrl: 0,
            data_rate: None,
            averaging: None,
            axes: None,
            power_mode: PowerMode::Suspend,
            power_mode_writes: 0,
            reads: 0,
        }
    }
}

impl<D: DelayNs> Magnetometer for DummyMagnetometer<D> {
    type Error = ();

    async fn chip_id(&mut self) -> Result<u8, ()> {
        Ok(BMM350_CHIP_ID)
    }

    async fn pmu_cmd_busy(&mut self) -> Result<bool, ()> {
        Ok(false)
    }

    async fn error_register(&mut self) -> Result<u8, ()> {
        Ok(0)
    }

    async fn configure_interrupt(&mut self, config: InterruptConfig) -> Result<(), ()> {
        self.int_ctrl = (self.int_ctrl & 0xF0) | config.control_bits();
        Ok(())
    }

    async fn enable_data_ready_interrupt(&mut self, enable: bool) -> Result<(), ()> {
        if enable {
            self.int_ctrl |= DRDY_DATA_REG_EN_MSK;
        } else {
            self.int_ctrl &= !DRDY_DATA_REG_EN_MSK;
        }
        Ok(())
    }

    async fn interrupt_control(&mut self) -> Result<u8, ()> {
        Ok(self.int_ctrl)
    }

    async fn set_odr_performance(
        &mut self,
        data_rate: DataRate,
        averaging: Averaging,
    ) -> Result<(), ()> {
        self.data_rate = Some(data_rate);
        self.averaging = Some(averaging);
        Ok(())
    }

    async fn enable_axes(&mut self, axes: AxisEnable) -> Result<(), ()> {
        self.axes = Some(axes);
        Ok(())
    }

    async fn set_power_mode(&mut self, mode: PowerMode) -> Result<(), ()> {
        self.power_mode = mode;
        self.power_mode_writes += 1;
        Ok(())
    }

    async fn read_compensated(&mut self) -> Result<MagTempReading, ()> {
        self.delay.delay_ms(1).await;
        self.reads += 1;
        Ok(self.reading)
    }
}
