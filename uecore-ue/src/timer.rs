//! NAS timer management (3GPP TS 24.501 Section 10.2)
//!
//! The authentication core starts and stops NAS timers; expiry is delivered
//! back to the host task as a separate event. Timers relevant here:
//!
//! - T3516: RAND/RES* retention during 5G-AKA
//! - T3520: authentication failure guard
//! - T3510/T3517/T3519/T3521: stopped on Authentication Reject

use std::time::{Duration, Instant};

/// Timer code for T3510 (registration procedure)
pub const TIMER_T3510: u16 = 3510;
/// Timer code for T3516 (5G-AKA RAND/RES* retention)
pub const TIMER_T3516: u16 = 3516;
/// Timer code for T3517 (service request)
pub const TIMER_T3517: u16 = 3517;
/// Timer code for T3519 (SUCI storage)
pub const TIMER_T3519: u16 = 3519;
/// Timer code for T3520 (authentication failure)
pub const TIMER_T3520: u16 = 3520;
/// Timer code for T3521 (deregistration)
pub const TIMER_T3521: u16 = 3521;

/// Default T3510 interval: 15 seconds
pub const DEFAULT_T3510_INTERVAL: u32 = 15;
/// Default T3516 interval: 30 seconds
pub const DEFAULT_T3516_INTERVAL: u32 = 30;
/// Default T3517 interval: 15 seconds
pub const DEFAULT_T3517_INTERVAL: u32 = 15;
/// Default T3519 interval: 60 seconds
pub const DEFAULT_T3519_INTERVAL: u32 = 60;
/// Default T3520 interval: 15 seconds
pub const DEFAULT_T3520_INTERVAL: u32 = 15;
/// Default T3521 interval: 15 seconds
pub const DEFAULT_T3521_INTERVAL: u32 = 15;

/// A single NAS timer.
///
/// Tracks the running state, start instant and an expiry count used by
/// retry logic in the owning procedures.
#[derive(Debug)]
pub struct UeTimer {
    code: u16,
    interval_secs: u32,
    start_time: Option<Instant>,
    is_running: bool,
    expiry_count: u32,
}

impl UeTimer {
    /// Creates a stopped timer with the given code and interval.
    pub fn new(code: u16, interval_secs: u32) -> Self {
        Self {
            code,
            interval_secs,
            start_time: None,
            is_running: false,
            expiry_count: 0,
        }
    }

    /// Starts (or restarts) the timer.
    pub fn start(&mut self) {
        self.start_time = Some(Instant::now());
        self.is_running = true;
    }

    /// Stops the timer if running.
    pub fn stop(&mut self) {
        self.start_time = None;
        self.is_running = false;
    }

    /// Checks expiry; returns true if the timer expired on this tick.
    pub fn perform_tick(&mut self) -> bool {
        if !self.is_running {
            return false;
        }
        if let Some(start) = self.start_time {
            if start.elapsed() >= Duration::from_secs(self.interval_secs as u64) {
                self.stop();
                self.expiry_count += 1;
                return true;
            }
        }
        false
    }

    /// Whether the timer is running.
    pub fn is_running(&self) -> bool {
        self.is_running
    }

    /// The timer code.
    pub fn code(&self) -> u16 {
        self.code
    }

    /// The configured interval in seconds.
    pub fn interval(&self) -> u32 {
        self.interval_secs
    }

    /// How often this timer has expired since creation.
    pub fn expiry_count(&self) -> u32 {
        self.expiry_count
    }
}

impl std::fmt::Display for UeTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_running {
            write!(f, "T{}: running int[{}]", self.code, self.interval_secs)
        } else {
            write!(f, "T{}: .", self.code)
        }
    }
}

/// The set of MM timers touched by the authentication procedures.
#[derive(Debug)]
pub struct NasTimerManager {
    /// T3510: registration procedure timer
    pub t3510: UeTimer,
    /// T3516: 5G-AKA RAND/RES* retention timer
    pub t3516: UeTimer,
    /// T3517: service request timer
    pub t3517: UeTimer,
    /// T3519: SUCI storage timer
    pub t3519: UeTimer,
    /// T3520: authentication failure timer
    pub t3520: UeTimer,
    /// T3521: deregistration timer
    pub t3521: UeTimer,
}

impl NasTimerManager {
    /// Creates the timer set with TS 24.501 default intervals.
    pub fn new() -> Self {
        Self {
            t3510: UeTimer::new(TIMER_T3510, DEFAULT_T3510_INTERVAL),
            t3516: UeTimer::new(TIMER_T3516, DEFAULT_T3516_INTERVAL),
            t3517: UeTimer::new(TIMER_T3517, DEFAULT_T3517_INTERVAL),
            t3519: UeTimer::new(TIMER_T3519, DEFAULT_T3519_INTERVAL),
            t3520: UeTimer::new(TIMER_T3520, DEFAULT_T3520_INTERVAL),
            t3521: UeTimer::new(TIMER_T3521, DEFAULT_T3521_INTERVAL),
        }
    }

    /// Ticks all timers, returning the codes that expired.
    pub fn perform_tick(&mut self) -> Vec<u16> {
        let mut expired = Vec::new();
        for timer in [
            &mut self.t3510,
            &mut self.t3516,
            &mut self.t3517,
            &mut self.t3519,
            &mut self.t3520,
            &mut self.t3521,
        ] {
            if timer.perform_tick() {
                expired.push(timer.code());
            }
        }
        expired
    }

    /// Returns the codes of all running timers.
    pub fn running_timers(&self) -> Vec<u16> {
        [
            &self.t3510,
            &self.t3516,
            &self.t3517,
            &self.t3519,
            &self.t3520,
            &self.t3521,
        ]
        .iter()
        .filter(|t| t.is_running())
        .map(|t| t.code())
        .collect()
    }
}

impl Default for NasTimerManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_timer_start_stop() {
        let mut timer = UeTimer::new(TIMER_T3520, 15);
        assert!(!timer.is_running());

        timer.start();
        assert!(timer.is_running());

        timer.stop();
        assert!(!timer.is_running());
        assert_eq!(timer.expiry_count(), 0);
    }

    #[test]
    fn test_timer_expiry() {
        let mut timer = UeTimer::new(TIMER_T3516, 0);
        timer.start();
        sleep(Duration::from_millis(10));
        assert!(timer.perform_tick());
        assert!(!timer.is_running());
        assert_eq!(timer.expiry_count(), 1);
        // a stopped timer does not expire again
        assert!(!timer.perform_tick());
    }

    #[test]
    fn test_timer_not_expired_before_interval() {
        let mut timer = UeTimer::new(TIMER_T3510, 60);
        timer.start();
        assert!(!timer.perform_tick());
        assert!(timer.is_running());
    }

    #[test]
    fn test_manager_running_timers() {
        let mut timers = NasTimerManager::new();
        assert!(timers.running_timers().is_empty());

        timers.t3516.start();
        timers.t3520.start();
        let running = timers.running_timers();
        assert_eq!(running, vec![TIMER_T3516, TIMER_T3520]);
    }

    #[test]
    fn test_timer_display() {
        let mut timer = UeTimer::new(TIMER_T3520, 15);
        assert_eq!(format!("{timer}"), "T3520: .");
        timer.start();
        assert_eq!(format!("{timer}"), "T3520: running int[15]");
    }
}
