//! This module contains the time manager: it turns the remaining clock
//! into a per-move budget and answers the search's "is it time to stop"
//! question, which also observes the host's stop request.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub struct SearchClock {

    // When the current search started
    start_time: Instant,

    // Budget for the current move in seconds; 0 means no deadline
    // (depth-only mode)
    time_limit: f64,

    // Set by the UCI front end when the host sends "stop"
    stop: Arc<AtomicBool>,
}

impl SearchClock {

    pub fn new(stop: Arc<AtomicBool>) -> SearchClock {
        SearchClock {
            start_time: Instant::now(),
            time_limit: 0.0,
            stop,
        }
    }

    // Begin timing a search, deriving the budget from the clock
    pub fn start(&mut self, time_left: f64, increment: f64) {
        self.start_time = Instant::now();
        self.time_limit = allocate_time(time_left, increment);
    }

    // Whether the search must unwind.  With no deadline this always
    // answers no, so a depth-forced search only observes "stop" between
    // iterations.
    pub fn is_time_up(&self) -> bool {
        if self.time_limit <= 0.0 {
            return false;
        }
        self.stop.load(Ordering::Relaxed) || self.start_time.elapsed().as_secs_f64() >= self.time_limit
    }

    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

}

// Pick the per-move budget from the remaining clock, in seconds.  Deeper
// reserves allow more generous slices; every bucket carries a hard cap
// so a huge clock never produces an absurd think.
pub fn allocate_time(time_left: f64, increment: f64) -> f64 {
    if time_left <= 0.0 {
        return 0.0;
    }
    if time_left > 1800.0 {
        (time_left / 40.0 + increment * 0.8).min(30.0)
    } else if time_left > 600.0 {
        (time_left / 30.0 + increment * 0.8).min(20.0)
    } else if time_left > 60.0 {
        (time_left / 20.0 + increment * 0.8).min(10.0)
    } else {
        (time_left / 10.0 + increment * 0.8).min(5.0)
    }
}

// =====================================
//             UNIT TESTS
// =====================================

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn test_allocation_buckets() {
        // No clock means no deadline
        assert_eq!(allocate_time(0.0, 5.0), 0.0);
        assert_eq!(allocate_time(-1.0, 0.0), 0.0);
        // One hour: left/40 + 0.8 * increment, capped at 30
        assert_eq!(allocate_time(3600.0, 10.0), 30.0);
        // Twenty minutes: left/30, capped at 20
        assert_eq!(allocate_time(1200.0, 0.0), 20.0);
        // Under ten minutes: left/20, capped at 10
        assert_eq!(allocate_time(100.0, 2.0), 100.0 / 20.0 + 1.6);
        assert_eq!(allocate_time(500.0, 0.0), 10.0);
        // Last minute: left/10, capped at 5
        assert_eq!(allocate_time(50.0, 0.0), 5.0);
        assert_eq!(allocate_time(30.0, 0.0), 3.0);
        assert!((allocate_time(0.05, 0.0) - 0.005).abs() < 1e-9);
    }

    #[test]
    fn test_no_deadline_never_expires() {
        let stop = Arc::new(AtomicBool::new(false));
        let mut clock = SearchClock::new(stop.clone());
        clock.start(0.0, 0.0);
        assert!(!clock.is_time_up());
        // Even a stop request is not observed by the in-search check
        // when there is no deadline; only stop_requested reports it.
        stop.store(true, Ordering::Relaxed);
        assert!(!clock.is_time_up());
        assert!(clock.stop_requested());
    }

    #[test]
    fn test_stop_flag_expires_timed_search() {
        let stop = Arc::new(AtomicBool::new(false));
        let mut clock = SearchClock::new(stop.clone());
        clock.start(300.0, 0.0);
        assert!(!clock.is_time_up());
        stop.store(true, Ordering::Relaxed);
        assert!(clock.is_time_up());
    }

    #[test]
    fn test_deadline_expiry() {
        let stop = Arc::new(AtomicBool::new(false));
        let mut clock = SearchClock::new(stop);
        clock.start(0.001, 0.0); // 0.1 ms budget
        std::thread::sleep(Duration::from_millis(5));
        assert!(clock.is_time_up());
    }
}
