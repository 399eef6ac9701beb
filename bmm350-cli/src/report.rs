use std::{io::Write, path::PathBuf};

use anyhow::Result;
use bmm350_forced_mode::{
    driver::{REG_CHIP_ID, REG_ERR_REG, REG_INT_CTRL, REG_PMU_CMD_STATUS_0},
    Combination, CombinationOutcome, DeviceStatus, MagVector, NoiseLevel, ReadingSink,
    TimedMagReading,
};
use log::{error, info};

use crate::csv_writer::MagReadingCSVWriter;

pub const READING_HEADER: &str = "Timestamp(ms), Mag_X(uT), Mag_Y(uT), Mag_Z(uT), Temperature(degC)";

pub fn write_device_status<W: Write>(out: &mut W, status: &DeviceStatus) -> Result<()> {
    writeln!(
        out,
        "Read : 0x{:02X} : BMM350 Chip ID : 0x{:X}",
        REG_CHIP_ID, status.chip_id
    )?;
    writeln!(
        out,
        "Expected : 0x{:02X} : PMU cmd busy : 0x0",
        REG_PMU_CMD_STATUS_0
    )?;
    writeln!(
        out,
        "Read : 0x{:02X} : PMU cmd busy : 0x{:X}",
        REG_PMU_CMD_STATUS_0, status.pmu_cmd_busy as u8
    )?;
    writeln!(out, "Expected : 0x{:02X} : Error Register : 0x0", REG_ERR_REG)?;
    writeln!(
        out,
        "Read : 0x{:02X} : Error Register : 0x{:X}",
        REG_ERR_REG, status.error_register
    )?;
    writeln!(
        out,
        "Expected : 0x{:02X} : Interrupt control : 0x{:X}",
        REG_INT_CTRL, status.expected_interrupt_control
    )?;
    writeln!(
        out,
        "Read : 0x{:02X} : Interrupt control : 0x{:X}",
        REG_INT_CTRL, status.interrupt_control
    )?;
    if status.data_ready_enabled() {
        writeln!(out, "Data ready enabled")?;
    }
    Ok(())
}

pub fn write_reading<W: Write>(out: &mut W, reading: &TimedMagReading) -> Result<()> {
    writeln!(
        out,
        "{}, {}",
        reading.elapsed_ms.max(0.0) as u64,
        reading.reading
    )?;
    Ok(())
}

pub fn write_mean<W: Write>(out: &mut W, mean: &MagVector) -> Result<()> {
    writeln!(out, "***** AVERAGE MAG VALUE *****")?;
    writeln!(out, "Average_Mag_X(uT), Average_Mag_Y(uT), Average_Mag_Z(uT)")?;
    writeln!(out, "{}", mean)?;
    Ok(())
}

pub fn write_noise<W: Write>(out: &mut W, noise: &NoiseLevel) -> Result<()> {
    writeln!(out)?;
    writeln!(
        out,
        "Noise level x (nTrms), Noise level y (nTrms), Noise level z (nTrms)"
    )?;
    writeln!(out, "{}", noise)?;
    Ok(())
}

/// Prints the run as text and optionally keeps one CSV file per combination.
pub struct ConsoleReport<W: Write> {
    out: W,
    csv_dir: Option<PathBuf>,
    csv_writer: Option<MagReadingCSVWriter>,
    first_error: Option<anyhow::Error>,
}

impl<W: Write> ConsoleReport<W> {
    pub fn new(out: W, csv_dir: Option<PathBuf>) -> Self {
        Self {
            out,
            csv_dir,
            csv_writer: None,
            first_error: None,
        }
    }

    fn record(&mut self, result: Result<()>) {
        if let Err(e) = result {
            error!("report output failed: {:?}", e);
            if self.first_error.is_none() {
                self.first_error = Some(e);
            }
        }
    }

    fn start(&mut self, index: usize, combination: &Combination) -> Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "COMBINATION {} :", index + 1)?;
        writeln!(self.out, "{}", combination.description)?;
        writeln!(self.out, "{}", READING_HEADER)?;

        if let Some(csv_dir) = &self.csv_dir {
            let mut path = csv_dir.clone();
            path.push(format!("{}-{}.csv", index + 1, combination.name));
            info!("writing readings to {:?}", path);
            self.csv_writer = Some(MagReadingCSVWriter::new(path)?);
        }
        Ok(())
    }

    fn reading(&mut self, reading: &TimedMagReading) -> Result<()> {
        write_reading(&mut self.out, reading)?;
        if let Some(csv_writer) = &mut self.csv_writer {
            csv_writer.write(reading)?;
        }
        Ok(())
    }

    fn end(&mut self, outcome: &CombinationOutcome) -> Result<()> {
        if let Some(mut csv_writer) = self.csv_writer.take() {
            csv_writer.flush()?;
        }
        if let Some(mean) = &outcome.mean {
            write_mean(&mut self.out, mean)?;
        }
        if let Some(noise) = &outcome.noise {
            write_noise(&mut self.out, noise)?;
        }
        self.out.flush()?;
        Ok(())
    }

    /// Gives back the output and the first error hit while reporting, if any.
    pub fn finish(self) -> Result<W> {
        match self.first_error {
            Some(e) => Err(e),
            None => Ok(self.out),
        }
    }
}

impl<W: Write> ReadingSink for ConsoleReport<W> {
    fn on_combination_start(&mut self, index: usize, combination: &Combination) {
        let result = self.start(index, combination);
        self.record(result);
    }

    fn on_reading(&mut self, reading: &TimedMagReading) {
        let result = self.reading(reading);
        self.record(result);
    }

    fn on_combination_end(
        &mut self,
        _index: usize,
        _combination: &Combination,
        outcome: &CombinationOutcome,
    ) {
        let result = self.end(outcome);
        self.record(result);
    }
}
