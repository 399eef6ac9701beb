pub mod clock;
pub mod config;
pub mod mag;

pub use clock::Clock;
pub use config::*;
pub use mag::{DummyMagnetometer, Magnetometer};
