use chrono::Utc;
use parking_lot::Mutex;
use stress_core::Timestamp;
use stress_ports::Clock;

/// Wall clock that never runs backwards
///
/// Readings follow `Utc::now()`, but if the system time steps back (NTP
/// adjustment) the last issued timestamp is repeated until real time catches
/// up again.
#[derive(Default)]
pub struct SystemClock {
    last: Mutex<Option<Timestamp>>,
}

impl SystemClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let mut last = self.last.lock();
        let now = match *last {
            Some(prev) => Utc::now().max(prev),
            None => Utc::now(),
        };
        *last = Some(now);
        now
    }

    fn name(&self) -> &str {
        "SystemClock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_follows_wall_time() {
        let clock = SystemClock::new();
        let time1 = clock.now();
        thread::sleep(std::time::Duration::from_millis(10));

        assert!(clock.since(time1) >= Duration::milliseconds(9));
    }

    #[test]
    fn test_readings_never_decrease_across_threads() {
        let clock = Arc::new(SystemClock::new());

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let clock = clock.clone();
                thread::spawn(move || {
                    let readings: Vec<_> = (0..1000).map(|_| clock.now()).collect();
                    readings.windows(2).all(|w| w[0] <= w[1])
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap());
        }
    }

    #[test]
    fn test_since_is_never_negative() {
        let clock = SystemClock::new();
        let future = clock.now() + Duration::hours(1);

        assert_eq!(clock.since(future), Duration::zero());
    }
}
