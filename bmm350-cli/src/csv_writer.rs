use std::{fs::File, path::Path};

use anyhow::Result;
use bmm350_forced_mode::TimedMagReading;

pub const CSV_TITLES: [&str; 5] = [
    "elapsed ms",
    "mag x (uT)",
    "mag y (uT)",
    "mag z (uT)",
    "temperature (degC)",
];

pub struct MagReadingCSVWriter {
    writer: csv::Writer<File>,
}

impl MagReadingCSVWriter {
    pub fn new<P: AsRef<Path>>(file_path: P) -> Result<Self> {
        let mut writer = csv::Writer::from_path(file_path)?;
        writer.write_record(CSV_TITLES)?;
        Ok(Self { writer })
    }

    pub fn write(&mut self, reading: &TimedMagReading) -> Result<()> {
        self.writer.write_record([
            format!("{}", reading.elapsed_ms),
            format!("{}", reading.reading.x),
            format!("{}", reading.reading.y),
            format!("{}", reading.reading.z),
            format!("{}", reading.reading.temperature),
        ])?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
