//! Scheduling clocks.
//!
//! The scan loop takes its time from a [`Clock`] so tests can drive it
//! deterministically. [`StdClock`] is the production monotonic clock;
//! [`ManualClock`] only moves when told to.

use ladder_common::iec_types::{duration_from_time, time_from_duration, TIME};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Instant;

/// Clock interface for the scan scheduler.
pub trait Clock: Send + Sync + 'static {
    /// Current time in nanoseconds since the clock's epoch.
    fn now(&self) -> TIME;

    /// Sleep until the given deadline. Returns immediately if it passed.
    fn sleep_until(&self, deadline: TIME);

    /// Wake any sleeper (best effort).
    fn wake(&self) {
        // Default: no wait mechanism to interrupt.
    }
}

/// Monotonic clock based on `std::time::Instant`.
#[derive(Debug, Clone)]
pub struct StdClock {
    start: Instant,
}

impl StdClock {
    /// Create a clock with its epoch at now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for StdClock {
    fn now(&self) -> TIME {
        time_from_duration(self.start.elapsed())
    }

    fn sleep_until(&self, deadline: TIME) {
        let now = self.now();
        if deadline <= now {
            return;
        }
        precise_sleep(duration_from_time(deadline - now));
    }
}

/// High-precision sleep.
///
/// Uses `clock_nanosleep` with `TIMER_ABSTIME` so a signal-interrupted
/// sleep resumes against the same absolute deadline instead of
/// accumulating drift.
#[cfg(target_os = "linux")]
fn precise_sleep(duration: std::time::Duration) {
    let mut now_ts = libc::timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };
    // SAFETY: clock_gettime is safe with a valid clock id and pointer.
    unsafe {
        libc::clock_gettime(libc::CLOCK_MONOTONIC, &mut now_ts);
    }

    #[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
    let deadline = {
        let total_nsec = now_ts.tv_nsec as u64 + u64::from(duration.subsec_nanos());
        libc::timespec {
            tv_sec: now_ts.tv_sec
                + duration.as_secs() as libc::time_t
                + (total_nsec / 1_000_000_000) as libc::time_t,
            tv_nsec: (total_nsec % 1_000_000_000) as libc::c_long,
        }
    };

    loop {
        // SAFETY: clock_nanosleep is safe with valid parameters.
        let ret = unsafe {
            libc::clock_nanosleep(
                libc::CLOCK_MONOTONIC,
                libc::TIMER_ABSTIME,
                &deadline,
                std::ptr::null_mut(),
            )
        };
        if ret != libc::EINTR {
            break;
        }
    }
}

#[cfg(not(target_os = "linux"))]
fn precise_sleep(duration: std::time::Duration) {
    std::thread::sleep(duration);
}

#[derive(Debug)]
struct ManualState {
    now: TIME,
    interrupted: bool,
    sleep_calls: u64,
}

/// Deterministic clock for tests and simulation.
///
/// `sleep_until` blocks until another thread advances the clock past the
/// deadline or calls [`Clock::wake`]. A wake releases one pending sleep.
#[derive(Debug, Clone)]
pub struct ManualClock {
    inner: Arc<(Mutex<ManualState>, Condvar)>,
}

impl ManualClock {
    /// Create a clock at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new((
                Mutex::new(ManualState {
                    now: 0,
                    interrupted: false,
                    sleep_calls: 0,
                }),
                Condvar::new(),
            )),
        }
    }

    /// Advance time by `delta` nanoseconds, releasing satisfied sleepers.
    pub fn advance(&self, delta: TIME) -> TIME {
        let (lock, cvar) = &*self.inner;
        let mut state = lock.lock().expect("manual clock lock poisoned");
        state.now = state.now.saturating_add(delta);
        cvar.notify_all();
        state.now
    }

    /// Jump to an absolute time.
    pub fn set_time(&self, time: TIME) {
        let (lock, cvar) = &*self.inner;
        let mut state = lock.lock().expect("manual clock lock poisoned");
        state.now = time;
        cvar.notify_all();
    }

    /// Number of `sleep_until` calls observed.
    #[must_use]
    pub fn sleep_calls(&self) -> u64 {
        let (lock, _) = &*self.inner;
        lock.lock().expect("manual clock lock poisoned").sleep_calls
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> TIME {
        let (lock, _) = &*self.inner;
        lock.lock().expect("manual clock lock poisoned").now
    }

    fn sleep_until(&self, deadline: TIME) {
        let (lock, cvar) = &*self.inner;
        let mut state = lock.lock().expect("manual clock lock poisoned");
        state.sleep_calls += 1;
        while !state.interrupted && state.now < deadline {
            state = cvar.wait(state).expect("manual clock wait poisoned");
        }
        // A wake releases exactly one sleep
        state.interrupted = false;
    }

    fn wake(&self) {
        let (lock, cvar) = &*self.inner;
        let mut state = lock.lock().expect("manual clock lock poisoned");
        state.interrupted = true;
        cvar.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ladder_common::iec_types::MILLISECOND;

    #[test]
    fn test_std_clock_is_monotonic() {
        let clock = StdClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }

    #[test]
    fn test_std_clock_sleep_until_past_deadline_returns() {
        let clock = StdClock::new();
        // Deadline already behind us
        clock.sleep_until(0);
    }

    #[test]
    fn test_manual_clock_advance() {
        let clock = ManualClock::new();
        assert_eq!(clock.now(), 0);
        clock.advance(5 * MILLISECOND);
        assert_eq!(clock.now(), 5 * MILLISECOND);
        clock.set_time(MILLISECOND);
        assert_eq!(clock.now(), MILLISECOND);
    }

    #[test]
    fn test_manual_clock_releases_sleeper_on_advance() {
        let clock = ManualClock::new();
        let sleeper = clock.clone();

        let handle = std::thread::spawn(move || {
            sleeper.sleep_until(10 * MILLISECOND);
        });

        // Wait until the sleeper is actually parked
        while clock.sleep_calls() == 0 {
            std::thread::yield_now();
        }
        clock.advance(10 * MILLISECOND);
        handle.join().unwrap();
    }

    #[test]
    fn test_manual_clock_wake_releases_sleeper() {
        let clock = ManualClock::new();
        let sleeper = clock.clone();

        let handle = std::thread::spawn(move || {
            sleeper.sleep_until(TIME::MAX);
        });

        while clock.sleep_calls() == 0 {
            std::thread::yield_now();
        }
        clock.wake();
        handle.join().unwrap();

        // The interrupt is consumed; a satisfied sleep still works
        clock.advance(1);
        clock.sleep_until(1);
    }
}
