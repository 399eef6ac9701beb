pub trait Clock {
    fn now_ms(&self) -> f64;
}
