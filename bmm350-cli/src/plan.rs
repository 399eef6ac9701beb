use std::{fs::read_to_string, path::Path};

use anyhow::{anyhow, Result};
use bmm350_forced_mode::{
    default_combinations,
    driver::{Averaging, DataRate, PowerMode},
    Combination, Trigger, MAG_SAMPLE_COUNT, NOISE_SCALE_UT_TO_NT,
};
use serde::{Deserialize, Serialize};

use crate::simulated_bmm350::SimulationConfig;

/// Everything `run` needs: analyzer scale, simulated sensor and the combinations to go through.
#[derive(Debug, Clone)]
pub struct Plan {
    pub scale: f64,
    pub simulation: SimulationConfig,
    pub combinations: Vec<Combination>,
}

impl Default for Plan {
    fn default() -> Self {
        Self {
            scale: NOISE_SCALE_UT_TO_NT,
            simulation: SimulationConfig::default(),
            combinations: default_combinations().into_iter().collect(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PlanSerde {
    #[serde(default = "default_scale")]
    pub scale: f64,
    #[serde(default)]
    pub simulation: Option<SimulationConfigSerde>,
    pub combinations: Vec<CombinationSerde>,
}

fn default_scale() -> f64 {
    NOISE_SCALE_UT_TO_NT
}

impl TryFrom<PlanSerde> for Plan {
    type Error = anyhow::Error;

    fn try_from(value: PlanSerde) -> Result<Self> {
        Ok(Plan {
            scale: value.scale,
            simulation: value
                .simulation
                .map_or(SimulationConfig::default(), |s| s.into()),
            combinations: value
                .combinations
                .into_iter()
                .map(Combination::try_from)
                .collect::<Result<_>>()?,
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SimulationConfigSerde {
    #[serde(default)]
    pub seed: Option<u64>,
    pub field_ut: [f64; 3],
    pub temperature_degc: f64,
    pub noise_ut_rms: f64,
    pub fast_noise_factor: f64,
    #[serde(default)]
    pub temperature_noise_degc: f64,
}

impl Into<SimulationConfig> for SimulationConfigSerde {
    fn into(self) -> SimulationConfig {
        SimulationConfig {
            seed: self.seed,
            field_ut: self.field_ut,
            temperature_degc: self.temperature_degc,
            noise_ut_rms: self.noise_ut_rms,
            fast_noise_factor: self.fast_noise_factor,
            temperature_noise_degc: self.temperature_noise_degc,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CombinationSerde {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub data_rate: DataRateSerde,
    pub averaging: AveragingSerde,
    pub power_mode: PowerModeSerde,
    pub trigger: TriggerSerde,
    pub sample_count: usize,
    #[serde(default)]
    pub analyze_noise: bool,
}

impl TryFrom<CombinationSerde> for Combination {
    type Error = anyhow::Error;

    fn try_from(value: CombinationSerde) -> Result<Self> {
        Combination::new(
            &value.name,
            &value.description,
            value.data_rate.into(),
            value.averaging.into(),
            value.power_mode.into(),
            value.trigger.into(),
            value.sample_count,
            value.analyze_noise,
        )
        .map_err(|e| anyhow!("combination {:?}: {}", value.name, e))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub enum DataRateSerde {
    #[serde(rename = "400Hz")]
    Hz400,
    #[serde(rename = "200Hz")]
    Hz200,
    #[serde(rename = "100Hz")]
    Hz100,
    #[serde(rename = "50Hz")]
    Hz50,
    #[serde(rename = "25Hz")]
    Hz25,
    #[serde(rename = "12.5Hz")]
    Hz12_5,
    #[serde(rename = "6.25Hz")]
    Hz6_25,
    #[serde(rename = "3.125Hz")]
    Hz3_125,
    #[serde(rename = "1.5625Hz")]
    Hz1_5625,
}

impl Into<DataRate> for DataRateSerde {
    fn into(self) -> DataRate {
        match self {
            DataRateSerde::Hz400 => DataRate::Hz400,
            DataRateSerde::Hz200 => DataRate::Hz200,
            DataRateSerde::Hz100 => DataRate::Hz100,
            DataRateSerde::Hz50 => DataRate::Hz50,
            DataRateSerde::Hz25 => DataRate::Hz25,
            DataRateSerde::Hz12_5 => DataRate::Hz12_5,
            DataRateSerde::Hz6_25 => DataRate::Hz6_25,
            DataRateSerde::Hz3_125 => DataRate::Hz3_125,
            DataRateSerde::Hz1_5625 => DataRate::Hz1_5625,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub enum AveragingSerde {
    #[serde(rename = "none")]
    NoAveraging,
    #[serde(rename = "2")]
    Averaging2,
    #[serde(rename = "4")]
    Averaging4,
    #[serde(rename = "8")]
    Averaging8,
}

impl Into<Averaging> for AveragingSerde {
    fn into(self) -> Averaging {
        match self {
            AveragingSerde::NoAveraging => Averaging::NoAveraging,
            AveragingSerde::Averaging2 => Averaging::Averaging2,
            AveragingSerde::Averaging4 => Averaging::Averaging4,
            AveragingSerde::Averaging8 => Averaging::Averaging8,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub enum PowerModeSerde {
    Forced,
    ForcedFast,
}

impl Into<PowerMode> for PowerModeSerde {
    fn into(self) -> PowerMode {
        match self {
            PowerModeSerde::Forced => PowerMode::Forced,
            PowerModeSerde::ForcedFast => PowerMode::ForcedFast,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub enum TriggerSerde {
    Once,
    EverySample,
}

impl Into<Trigger> for TriggerSerde {
    fn into(self) -> Trigger {
        match self {
            TriggerSerde::Once => Trigger::Once,
            TriggerSerde::EverySample => Trigger::EverySample,
        }
    }
}

pub fn read_plan<P: AsRef<Path>>(path: P) -> Result<Plan> {
    let plan = read_to_string(path)?;
    let plan: PlanSerde = serde_json::from_str(&plan)?;
    let plan = Plan::try_from(plan)?;
    validate_plan(&plan)?;
    Ok(plan)
}

pub fn validate_plan(plan: &Plan) -> Result<()> {
    if !plan.scale.is_finite() || plan.scale <= 0.0 {
        return Err(anyhow!("scale must be positive, got {}", plan.scale));
    }
    if plan.combinations.is_empty() {
        return Err(anyhow!("plan has no combinations"));
    }
    for combination in &plan.combinations {
        let name = combination.name.as_str();
        // the name ends up in a CSV file name under --csv-dir
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        {
            return Err(anyhow!(
                "combination name {:?} may only use ASCII letters, digits, '-', '_' and '.'",
                name
            ));
        }
        if combination.sample_count == 0 || combination.sample_count > MAG_SAMPLE_COUNT {
            return Err(anyhow!(
                "combination {} has {} samples, expected 1..={}",
                combination.name,
                combination.sample_count,
                MAG_SAMPLE_COUNT
            ));
        }
    }
    Ok(())
}
