use lazy_static::lazy_static;
use std::time::Instant;

lazy_static! {
    static ref START_INSTANT: Instant = Instant::now();
}

pub struct NetworkTime;

impl NetworkTime {
    /// Seconds since process start. Monotonic, shared by every component's
    /// min-interval sync throttle.
    pub fn local_time() -> f64 {
        START_INSTANT.elapsed().as_secs_f64()
    }
}
