use std::time::{Duration, Instant};

pub const DEFAULT_MAX_TAB_SWITCHES: u32 = 3;
pub const DEFAULT_VIOLATION_COOLDOWN: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationOutcome {
    /// Not listening, or inside the cooldown window of the previous switch.
    Ignored,
    Warning { count: u32, max: u32, is_final: bool },
    /// The threshold was reached; the session must be submitted now.
    AutoSubmit { count: u32 },
}

/// Counts focus losses while a session is live.
///
/// Counts `1..max` warn, the `max`-th forces submission. The counter never
/// goes down. Once stopped, later events are silently ignored.
#[derive(Debug, Clone)]
pub struct TabSwitchMonitor {
    max_switches: u32,
    cooldown: Duration,
    count: u32,
    last_counted: Option<Instant>,
    listening: bool,
}

impl TabSwitchMonitor {
    pub fn new(max_switches: u32, cooldown: Duration) -> Self {
        Self {
            max_switches: max_switches.max(1),
            cooldown,
            count: 0,
            last_counted: None,
            listening: false,
        }
    }

    pub fn start(&mut self) {
        self.listening = true;
    }

    pub fn stop(&mut self) {
        self.listening = false;
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn max_switches(&self) -> u32 {
        self.max_switches
    }

    pub fn record_focus_lost(&mut self, at: Instant) -> ViolationOutcome {
        if !self.listening {
            return ViolationOutcome::Ignored;
        }

        if let Some(last) = self.last_counted {
            if at.saturating_duration_since(last) < self.cooldown {
                tracing::debug!(count = self.count, "focus loss inside cooldown, not counted");
                return ViolationOutcome::Ignored;
            }
        }

        self.count += 1;
        self.last_counted = Some(at);

        if self.count >= self.max_switches {
            tracing::warn!(count = self.count, "tab switch limit reached");
            ViolationOutcome::AutoSubmit { count: self.count }
        } else {
            tracing::warn!(count = self.count, max = self.max_switches, "tab switch detected");
            ViolationOutcome::Warning {
                count: self.count,
                max: self.max_switches,
                is_final: self.count + 1 == self.max_switches,
            }
        }
    }
}

impl Default for TabSwitchMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TAB_SWITCHES, DEFAULT_VIOLATION_COOLDOWN)
    }
}

pub fn warning_message(count: u32, max: u32, is_final: bool) -> String {
    if is_final {
        format!(
            "Tab switch {count} of {max}: this is your final warning. One more switch will submit your test automatically."
        )
    } else {
        format!(
            "Tab switch {count} of {max} detected. Leaving the test window is not allowed; at {max} the test is submitted automatically."
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn spaced(start: Instant, n: u64) -> Instant {
        start + Duration::from_secs(2 * n)
    }

    #[test]
    fn ignores_events_until_started() {
        let mut monitor = TabSwitchMonitor::default();
        assert_eq!(monitor.record_focus_lost(Instant::now()), ViolationOutcome::Ignored);
        assert_eq!(monitor.count(), 0);
    }

    #[test]
    fn warns_twice_then_forces_submit_on_third() {
        let t0 = Instant::now();
        let mut monitor = TabSwitchMonitor::default();
        monitor.start();

        assert_eq!(
            monitor.record_focus_lost(spaced(t0, 0)),
            ViolationOutcome::Warning { count: 1, max: 3, is_final: false }
        );
        assert_eq!(
            monitor.record_focus_lost(spaced(t0, 1)),
            ViolationOutcome::Warning { count: 2, max: 3, is_final: true }
        );
        assert_eq!(
            monitor.record_focus_lost(spaced(t0, 2)),
            ViolationOutcome::AutoSubmit { count: 3 }
        );
    }

    #[test]
    fn cooldown_debounces_flapping_focus() {
        let t0 = Instant::now();
        let mut monitor = TabSwitchMonitor::default();
        monitor.start();

        monitor.record_focus_lost(t0);
        assert_eq!(
            monitor.record_focus_lost(t0 + Duration::from_millis(300)),
            ViolationOutcome::Ignored
        );
        assert_eq!(monitor.count(), 1);
        assert_matches!(
            monitor.record_focus_lost(t0 + Duration::from_millis(1000)),
            ViolationOutcome::Warning { count: 2, .. }
        );
    }

    #[test]
    fn stopped_monitor_is_a_no_op() {
        let t0 = Instant::now();
        let mut monitor = TabSwitchMonitor::default();
        monitor.start();
        monitor.record_focus_lost(t0);
        monitor.stop();

        assert_eq!(monitor.record_focus_lost(spaced(t0, 5)), ViolationOutcome::Ignored);
        assert_eq!(monitor.count(), 1);
    }

    #[test]
    fn counter_keeps_rising_past_threshold() {
        let t0 = Instant::now();
        let mut monitor = TabSwitchMonitor::new(2, Duration::ZERO);
        monitor.start();

        let mut previous = 0;
        for n in 0..5 {
            monitor.record_focus_lost(spaced(t0, n));
            assert!(monitor.count() > previous);
            previous = monitor.count();
        }
        assert_matches!(
            monitor.record_focus_lost(spaced(t0, 6)),
            ViolationOutcome::AutoSubmit { count: 6 }
        );
    }

    #[test]
    fn zero_max_is_clamped_to_one() {
        let mut monitor = TabSwitchMonitor::new(0, Duration::ZERO);
        monitor.start();
        assert_matches!(
            monitor.record_focus_lost(Instant::now()),
            ViolationOutcome::AutoSubmit { count: 1 }
        );
    }

    #[test]
    fn messages_cite_running_count() {
        assert!(warning_message(1, 3, false).contains("1 of 3"));
        assert!(warning_message(2, 3, true).contains("final warning"));
    }
}
