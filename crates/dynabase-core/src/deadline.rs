use crate::Error;
use std::time::{Duration, Instant};

/// Loop iterations between clock reads in [`Pulse::tick`].
const PULSE_INTERVAL: u32 = 1024;

///
/// Deadline
///
/// Point in time an operation must finish by. The registry checks it
/// between stages; backends poll it inside long loops through a [`Pulse`].
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Deadline {
    at: Option<Instant>,
}

impl Deadline {
    #[must_use]
    pub const fn none() -> Self {
        Self { at: None }
    }

    /// Deadline `timeout` from now. A timeout too large to represent means
    /// no deadline.
    #[must_use]
    pub fn after(timeout: Option<Duration>) -> Self {
        Self {
            at: timeout.and_then(|t| Instant::now().checked_add(t)),
        }
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.at.is_some_and(|at| Instant::now() >= at)
    }

    /// Time left, or `None` without a deadline.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.at
            .map(|at| at.saturating_duration_since(Instant::now()))
    }

    /// Fail with a timeout naming `stage` once the deadline has passed.
    pub fn check(&self, stage: &str) -> Result<(), Error> {
        if self.is_expired() {
            Err(Error::timeout(stage))
        } else {
            Ok(())
        }
    }

    /// `limit`, shortened to whatever time is left.
    #[must_use]
    pub fn clamp(&self, limit: Duration) -> Duration {
        self.remaining().map_or(limit, |left| left.min(limit))
    }

    #[must_use]
    pub const fn pulse(&self) -> Pulse<'_> {
        Pulse {
            deadline: self,
            ticks: 0,
        }
    }
}

///
/// Pulse
///
/// Amortized expiry check for tight loops: the clock is read once every
/// [`PULSE_INTERVAL`] ticks.
///

#[derive(Debug)]
pub struct Pulse<'a> {
    deadline: &'a Deadline,
    ticks: u32,
}

impl Pulse<'_> {
    /// Count one iteration; true once the deadline has passed.
    pub fn tick(&mut self) -> bool {
        self.ticks = self.ticks.wrapping_add(1);

        self.ticks % PULSE_INTERVAL == 0 && self.deadline.is_expired()
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorClass;

    #[test]
    fn no_deadline_never_expires() {
        let deadline = Deadline::none();

        assert!(deadline.check("anything").is_ok());
        assert_eq!(deadline.remaining(), None);
        assert_eq!(deadline.clamp(Duration::from_secs(3)), Duration::from_secs(3));
        assert_eq!(Deadline::after(None), deadline);
    }

    #[test]
    fn zero_timeout_is_already_expired() {
        let deadline = Deadline::after(Some(Duration::ZERO));

        let err = deadline.check("label allocation").unwrap_err();
        assert_eq!(err.class, ErrorClass::Timeout);
        assert!(err.message.contains("label allocation"));
        assert_eq!(deadline.clamp(Duration::from_secs(3)), Duration::ZERO);
    }

    #[test]
    fn distant_deadlines_clamp_to_the_limit() {
        let deadline = Deadline::after(Some(Duration::from_secs(3600)));

        assert!(deadline.check("commit").is_ok());
        assert_eq!(
            deadline.clamp(Duration::from_millis(10)),
            Duration::from_millis(10)
        );
    }

    #[test]
    fn pulse_reads_the_clock_once_per_interval() {
        let expired = Deadline::after(Some(Duration::ZERO));
        let mut pulse = expired.pulse();

        let first = (1..=PULSE_INTERVAL).find(|_| pulse.tick());
        assert_eq!(first, Some(PULSE_INTERVAL));

        let open = Deadline::none();
        let mut pulse = open.pulse();
        assert!((0..4 * PULSE_INTERVAL).all(|_| !pulse.tick()));
    }
}
