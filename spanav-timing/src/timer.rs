use std::time::{Duration, Instant};

/// Monotonic clock used to timestamp trial events.
pub trait Timer: Clone + Send + Sync {
    type Timestamp: Copy + Clone + Send + Sync;
    fn now(&self) -> Self::Timestamp;
    fn elapsed(&self, ts: Self::Timestamp) -> Duration;
    /// Blocks until `now() >= deadline`. Returns at once if it already is.
    fn sleep_until(&self, deadline: Self::Timestamp);
}

/// Whole milliseconds between two nanosecond timestamps, rounded half up.
pub fn millis_between(start_ns: u64, end_ns: u64) -> u64 {
    (end_ns.saturating_sub(start_ns) + 500_000) / 1_000_000
}

/// Nanoseconds since construction, on the monotonic clock.
#[derive(Debug, Clone)]
pub struct HighPrecisionTimer {
    pub start: Instant,
}

impl Timer for HighPrecisionTimer {
    type Timestamp = u64;
    fn now(&self) -> u64 {
        self.start.elapsed().as_nanos() as u64
    }
    fn elapsed(&self, ts: u64) -> Duration {
        Duration::from_nanos(self.now().saturating_sub(ts))
    }
    fn sleep_until(&self, deadline: u64) {
        // Signals cut sleeps short; re-check against the clock.
        loop {
            let now = self.now();
            if now >= deadline {
                return;
            }
            monotonic_sleep(Duration::from_nanos(deadline - now));
        }
    }
}

impl HighPrecisionTimer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for HighPrecisionTimer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_os = "linux")]
fn monotonic_sleep(d: Duration) {
    let req = libc::timespec {
        tv_sec: d.as_secs() as libc::time_t,
        tv_nsec: d.subsec_nanos() as libc::c_long,
    };
    // SAFETY: `req` outlives the call and a null remainder pointer is allowed.
    unsafe {
        libc::clock_nanosleep(libc::CLOCK_MONOTONIC, 0, &req, std::ptr::null_mut());
    }
}

#[cfg(not(target_os = "linux"))]
fn monotonic_sleep(d: Duration) {
    std::thread::sleep(d);
}
