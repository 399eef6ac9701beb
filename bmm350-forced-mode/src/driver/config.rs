#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataRate {
    Hz400 = 0x2,
    Hz200 = 0x3,
    Hz100 = 0x4,
    Hz50 = 0x5,
    Hz25 = 0x6,
    Hz12_5 = 0x7,
    Hz6_25 = 0x8,
    Hz3_125 = 0x9,
    Hz1_5625 = 0xA,
}

impl DataRate {
    pub fn hz(&self) -> f64 {
        match self {
            DataRate::Hz400 => 400.0,
            DataRate::Hz200 => 200.0,
            DataRate::Hz100 => 100.0,
            DataRate::Hz50 => 50.0,
            DataRate::Hz25 => 25.0,
            DataRate::Hz12_5 => 12.5,
            DataRate::Hz6_25 => 6.25,
            DataRate::Hz3_125 => 3.125,
            DataRate::Hz1_5625 => 1.5625,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Averaging {
    NoAveraging = 0,
    Averaging2 = 1,
    Averaging4 = 2,
    Averaging8 = 3,
}

impl Averaging {
    pub fn samples(&self) -> u8 {
        match self {
            Averaging::NoAveraging => 1,
            Averaging::Averaging2 => 2,
            Averaging::Averaging4 => 4,
            Averaging::Averaging8 => 8,
        }
    }

    /// Highest averaging the sensor can sustain at `data_rate`.
    pub fn limit_for(self, data_rate: DataRate) -> Self {
        let max = match data_rate {
            DataRate::Hz400 => Averaging::NoAveraging,
            DataRate::Hz200 => Averaging::Averaging2,
            DataRate::Hz100 => Averaging::Averaging4,
            _ => Averaging::Averaging8,
        };
        self.min(max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerMode {
    Suspend = 0,
    Normal = 1,
    Forced = 3,
    ForcedFast = 4,
}

impl PowerMode {
    pub fn is_forced(&self) -> bool {
        matches!(self, PowerMode::Forced | PowerMode::ForcedFast)
    }

    /// Suspend to forced transition time, i.e. how long one forced conversion takes.
    pub fn forced_conversion_time_us(&self, averaging: Averaging) -> Option<u32> {
        let time = match (self, averaging) {
            (PowerMode::Forced, Averaging::NoAveraging) => 15_000,
            (PowerMode::Forced, Averaging::Averaging2) => 17_000,
            (PowerMode::Forced, Averaging::Averaging4) => 20_000,
            (PowerMode::Forced, Averaging::Averaging8) => 28_000,
            (PowerMode::ForcedFast, Averaging::NoAveraging) => 4_000,
            (PowerMode::ForcedFast, Averaging::Averaging2) => 5_000,
            (PowerMode::ForcedFast, Averaging::Averaging4) => 9_000,
            (PowerMode::ForcedFast, Averaging::Averaging8) => 16_000,
            _ => return None,
        };
        Some(time)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxisEnable {
    pub x: bool,
    pub y: bool,
    pub z: bool,
}

impl AxisEnable {
    pub const ALL: Self = Self {
        x: true,
        y: true,
        z: true,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InterruptLatch {
    Pulsed = 0,
    Latched = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InterruptPolarity {
    ActiveLow = 0,
    ActiveHigh = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InterruptDrive {
    OpenDrain = 0,
    PushPull = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InterruptMap {
    Unmapped = 0,
    MappedToPin = 1,
}

pub const REG_CHIP_ID: u8 = 0x00;
pub const REG_ERR_REG: u8 = 0x02;
pub const REG_PMU_CMD_STATUS_0: u8 = 0x07;
pub const REG_INT_CTRL: u8 = 0x2E;

pub const BMM350_CHIP_ID: u8 = 0x33;
pub const DRDY_DATA_REG_EN_MSK: u8 = 0x80;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InterruptConfig {
    pub latch: InterruptLatch,
    pub polarity: InterruptPolarity,
    pub drive: InterruptDrive,
    pub map: InterruptMap,
}

impl InterruptConfig {
    /// INT_CTRL bits 0..=3, data ready enable (bit 7) not included
    pub fn control_bits(&self) -> u8 {
        (self.latch as u8)
            | (self.polarity as u8) << 1
            | (self.drive as u8) << 2
            | (self.map as u8) << 3
    }

    /// INT_CTRL value expected after this config is applied and data ready is enabled
    pub fn expected_int_ctrl(&self) -> u8 {
        self.control_bits() | DRDY_DATA_REG_EN_MSK
    }
}

impl Default for InterruptConfig {
    fn default() -> Self {
        Self {
            latch: InterruptLatch::Pulsed,
            polarity: InterruptPolarity::ActiveHigh,
            drive: InterruptDrive::PushPull,
            map: InterruptMap::Unmapped,
        }
    }
}
