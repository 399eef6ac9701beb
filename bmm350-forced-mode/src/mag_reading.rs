/// One compensated BMM350 sample.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MagTempReading {
    pub x: f64,           // uT
    pub y: f64,           // uT
    pub z: f64,           // uT
    pub temperature: f64, // degC
}

impl MagTempReading {
    pub fn new(x: f64, y: f64, z: f64, temperature: f64) -> Self {
        Self {
            x,
            y,
            z,
            temperature,
        }
    }
}

impl core::fmt::Display for MagTempReading {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "{:.6}, {:.6}, {:.6}, {:.6}",
            self.x, self.y, self.z, self.temperature
        )
    }
}

/// Per-axis triple, used for batch means (uT).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MagVector {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl MagVector {
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub(crate) fn accumulate(&mut self, reading: &MagTempReading) {
        self.x += reading.x;
        self.y += reading.y;
        self.z += reading.z;
    }

    pub(crate) fn divide(self, count: usize) -> Self {
        let n = count as f64;
        Self::new(self.x / n, self.y / n, self.z / n)
    }
}

impl core::fmt::Display for MagVector {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "{:.6}, {:.6}, {:.6}", self.x, self.y, self.z)
    }
}

/// RMS noise per axis, in whatever unit the analyzer scale produced (nT rms for scale 1000).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NoiseLevel {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl core::fmt::Display for NoiseLevel {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "{:.6}, {:.6}, {:.6}", self.x, self.y, self.z)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimedMagReading {
    pub elapsed_ms: f64, // since the combination started
    pub reading: MagTempReading,
}
