mod simulated;
mod timer;

pub use simulated::SimulatedTimer;
pub use timer::{millis_between, HighPrecisionTimer, Timer};
