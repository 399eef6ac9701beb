use crate::driver::{InterruptConfig, Magnetometer, BMM350_CHIP_ID, DRDY_DATA_REG_EN_MSK};

/// Register read-back taken before acquisition starts.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceStatus {
    pub chip_id: u8,
    pub pmu_cmd_busy: bool,
    pub error_register: u8,
    pub interrupt_control: u8,
    pub expected_interrupt_control: u8,
}

impl DeviceStatus {
    pub fn data_ready_enabled(&self) -> bool {
        self.interrupt_control & DRDY_DATA_REG_EN_MSK != 0
    }

    pub fn is_healthy(&self) -> bool {
        self.chip_id == BMM350_CHIP_ID
            && !self.pmu_cmd_busy
            && self.error_register == 0
            && self.interrupt_control == self.expected_interrupt_control
    }
}

/// Reads the status registers, applies `interrupt` and enables the data ready interrupt.
pub async fn check_device<M: Magnetometer>(
    mag: &mut M,
    interrupt: InterruptConfig,
) -> Result<DeviceStatus, M::Error> {
    let chip_id = mag.chip_id().await?;
    log_debug!("chip id {}", chip_id);
    let pmu_cmd_busy = mag.pmu_cmd_busy().await?;
    let error_register = mag.error_register().await?;

    mag.configure_interrupt(interrupt).await?;
    mag.enable_data_ready_interrupt(true).await?;
    let interrupt_control = mag.interrupt_control().await?;

    let status = DeviceStatus {
        chip_id,
        pmu_cmd_busy,
        error_register,
        interrupt_control,
        expected_interrupt_control: interrupt.expected_int_ctrl(),
    };
    if !status.is_healthy() {
        log_warn!(
            "device status unexpected: chip id {}, pmu busy {}, err {}, int ctrl {}",
            chip_id,
            pmu_cmd_busy,
            error_register,
            interrupt_control,
        );
    }
    Ok(status)
}
