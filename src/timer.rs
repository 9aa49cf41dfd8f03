use std::time::Duration;

const ONE_SECOND: Duration = Duration::from_secs(1);

pub const WARNING_SECS: u64 = 600;
pub const CRITICAL_SECS: u64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// One whole second elapsed; carries the new remaining value.
    Tick { remaining: u64 },
    /// The countdown reached zero. Emitted once per countdown lifecycle.
    Expired,
}

/// Whole-second countdown driven by elapsed wall time.
///
/// The owner feeds it elapsed durations at whatever cadence its event loop
/// runs; sub-second remainders are carried over so the number of ticks does
/// not depend on how often `advance` is called. Expiry is guarded by an
/// arm flag: once fired it stays silent until `reset`.
#[derive(Debug, Clone)]
pub struct Countdown {
    duration_secs: u64,
    remaining_secs: u64,
    carry: Duration,
    running: bool,
    expired: bool,
}

impl Countdown {
    /// A stopped countdown holding `duration_secs`.
    pub fn new(duration_secs: u64) -> Self {
        Self {
            duration_secs,
            remaining_secs: duration_secs,
            carry: Duration::ZERO,
            running: false,
            expired: false,
        }
    }

    pub fn start(&mut self) {
        if !self.expired {
            self.running = true;
        }
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Restart from `duration_secs`, re-arming expiry.
    pub fn reset(&mut self, duration_secs: u64) {
        self.duration_secs = duration_secs;
        self.remaining_secs = duration_secs;
        self.carry = Duration::ZERO;
        self.expired = false;
        self.running = true;
    }

    /// Halt permanently for this lifecycle; no further events until `reset`.
    pub fn cancel(&mut self) {
        self.running = false;
        self.carry = Duration::ZERO;
    }

    pub fn advance(&mut self, elapsed: Duration) -> Vec<TimerEvent> {
        let mut events = Vec::new();
        if !self.running || self.expired {
            return events;
        }

        if self.remaining_secs == 0 {
            self.expire(&mut events);
            return events;
        }

        self.carry += elapsed;
        while self.carry >= ONE_SECOND && !self.expired {
            self.carry -= ONE_SECOND;
            self.remaining_secs = self.remaining_secs.saturating_sub(1);
            events.push(TimerEvent::Tick {
                remaining: self.remaining_secs,
            });
            if self.remaining_secs == 0 {
                self.expire(&mut events);
            }
        }

        events
    }

    fn expire(&mut self, events: &mut Vec<TimerEvent>) {
        self.expired = true;
        self.running = false;
        self.carry = Duration::ZERO;
        events.push(TimerEvent::Expired);
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn has_expired(&self) -> bool {
        self.expired
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Urgency {
    #[strum(to_string = "normal")]
    Normal,
    #[strum(to_string = "low")]
    Warning,
    #[strum(to_string = "critical")]
    Critical,
}

impl Urgency {
    pub fn for_remaining(secs: u64) -> Self {
        if secs <= CRITICAL_SECS {
            Urgency::Critical
        } else if secs <= WARNING_SECS {
            Urgency::Warning
        } else {
            Urgency::Normal
        }
    }
}

/// `MM:SS`, or `HH:MM:SS` once an hour or more remains.
pub fn format_clock(secs: u64) -> String {
    let hrs = secs / 3600;
    let mins = (secs % 3600) / 60;
    let secs = secs % 60;

    if hrs > 0 {
        format!("{hrs:02}:{mins:02}:{secs:02}")
    } else {
        format!("{mins:02}:{secs:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expirations(events: &[TimerEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, TimerEvent::Expired))
            .count()
    }

    #[test]
    fn new_countdown_is_stopped() {
        let mut cd = Countdown::new(5);
        assert!(!cd.is_running());
        assert!(cd.advance(Duration::from_secs(3)).is_empty());
        assert_eq!(cd.remaining_secs(), 5);
    }

    #[test]
    fn ticks_once_per_whole_second() {
        let mut cd = Countdown::new(10);
        cd.start();

        let events = cd.advance(Duration::from_millis(2500));
        assert_eq!(
            events,
            vec![
                TimerEvent::Tick { remaining: 9 },
                TimerEvent::Tick { remaining: 8 }
            ]
        );

        // the half second carried over completes the next tick
        let events = cd.advance(Duration::from_millis(500));
        assert_eq!(events, vec![TimerEvent::Tick { remaining: 7 }]);
    }

    #[test]
    fn sub_second_cadence_matches_coarse_cadence() {
        let mut fine = Countdown::new(3);
        let mut coarse = Countdown::new(3);
        fine.start();
        coarse.start();

        let mut fine_events = Vec::new();
        for _ in 0..30 {
            fine_events.extend(fine.advance(Duration::from_millis(100)));
        }
        let coarse_events = coarse.advance(Duration::from_secs(3));

        assert_eq!(fine_events, coarse_events);
    }

    #[test]
    fn expiry_fires_exactly_once() {
        let mut cd = Countdown::new(2);
        cd.start();

        let mut all = Vec::new();
        for _ in 0..10 {
            all.extend(cd.advance(Duration::from_secs(1)));
        }

        assert_eq!(expirations(&all), 1);
        assert!(cd.has_expired());
        assert_eq!(cd.remaining_secs(), 0);
    }

    #[test]
    fn huge_elapsed_still_expires_once() {
        let mut cd = Countdown::new(3);
        cd.start();

        let events = cd.advance(Duration::from_secs(100));
        assert_eq!(expirations(&events), 1);
        assert_eq!(events.len(), 4);
        assert!(cd.advance(Duration::from_secs(100)).is_empty());
    }

    #[test]
    fn zero_duration_expires_on_first_advance() {
        let mut cd = Countdown::new(0);
        cd.start();
        assert_eq!(cd.advance(Duration::ZERO), vec![TimerEvent::Expired]);
        assert!(cd.advance(Duration::from_secs(1)).is_empty());
    }

    #[test]
    fn reset_rearms_expiry() {
        let mut cd = Countdown::new(1);
        cd.start();
        assert_eq!(expirations(&cd.advance(Duration::from_secs(1))), 1);

        cd.reset(2);
        assert!(cd.is_running());
        assert!(!cd.has_expired());
        assert_eq!(cd.remaining_secs(), 2);

        let events = cd.advance(Duration::from_secs(2));
        assert_eq!(expirations(&events), 1);
    }

    #[test]
    fn reset_discards_partial_second() {
        let mut cd = Countdown::new(5);
        cd.start();
        cd.advance(Duration::from_millis(900));
        cd.reset(5);
        assert!(cd.advance(Duration::from_millis(200)).is_empty());
    }

    #[test]
    fn cancel_halts_the_clock() {
        let mut cd = Countdown::new(5);
        cd.start();
        cd.cancel();
        assert!(cd.advance(Duration::from_secs(10)).is_empty());
        assert_eq!(cd.remaining_secs(), 5);
    }

    #[test]
    fn paused_countdown_resumes() {
        let mut cd = Countdown::new(5);
        cd.start();
        cd.advance(Duration::from_secs(1));
        cd.pause();
        assert!(cd.advance(Duration::from_secs(3)).is_empty());
        cd.start();
        assert_eq!(
            cd.advance(Duration::from_secs(1)),
            vec![TimerEvent::Tick { remaining: 3 }]
        );
    }

    #[test]
    fn format_clock_switches_to_hours() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(59), "00:59");
        assert_eq!(format_clock(600), "10:00");
        assert_eq!(format_clock(3600), "01:00:00");
        assert_eq!(format_clock(3725), "01:02:05");
    }

    #[test]
    fn urgency_thresholds() {
        assert_eq!(Urgency::for_remaining(601), Urgency::Normal);
        assert_eq!(Urgency::for_remaining(600), Urgency::Warning);
        assert_eq!(Urgency::for_remaining(300), Urgency::Critical);
        assert_eq!(Urgency::for_remaining(0), Urgency::Critical);
        assert_eq!(Urgency::Warning.to_string(), "low");
    }
}
