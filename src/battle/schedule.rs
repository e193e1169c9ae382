//! Virtual clock and scheduled continuations.
//!
//! Turn pacing never blocks. Each delayed step is recorded as a
//! [`Scheduled`] continuation and fires when the host advances the clock
//! past its due time. At most one continuation is pending at a time.

use serde::{Deserialize, Serialize};

use crate::effects::EffectCode;

/// A deferred engine step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Continuation {
    /// Reveal the die that is rolling.
    FinishRoll,
    /// Trigger a spell on behalf of the automated side.
    AutoTrigger(EffectCode),
    /// End the animation and run the end-of-turn checks.
    FinishAnimation,
}

/// A continuation with its due time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scheduled {
    pub due_at: u64,
    pub continuation: Continuation,
}

/// Clock measured in abstract time units.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualClock {
    now: u64,
    pending: Option<Scheduled>,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn now(&self) -> u64 {
        self.now
    }

    #[must_use]
    pub fn pending(&self) -> Option<&Scheduled> {
        self.pending.as_ref()
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.pending.is_none()
    }

    /// Time left until the pending continuation is due.
    #[must_use]
    pub fn remaining(&self) -> Option<u64> {
        self.pending
            .as_ref()
            .map(|scheduled| scheduled.due_at.saturating_sub(self.now))
    }

    /// Schedule `continuation` to run `delay` units from now. Only one
    /// continuation may be pending.
    pub fn schedule(&mut self, delay: u64, continuation: Continuation) {
        debug_assert!(self.pending.is_none(), "continuation already pending");
        self.pending = Some(Scheduled {
            due_at: self.now.saturating_add(delay),
            continuation,
        });
    }

    /// Take the pending continuation if it is due by `deadline`, moving
    /// the clock to its due time.
    pub fn pop_due(&mut self, deadline: u64) -> Option<Continuation> {
        let due_at = self.pending.as_ref()?.due_at;
        if due_at > deadline {
            return None;
        }
        self.now = self.now.max(due_at);
        self.pending.take().map(|scheduled| scheduled.continuation)
    }

    /// Take the pending continuation regardless of its due time.
    pub fn pop_now(&mut self) -> Option<Continuation> {
        let scheduled = self.pending.take()?;
        self.now = self.now.max(scheduled.due_at);
        Some(scheduled.continuation)
    }

    /// Move the clock forward to `time`. Never moves backwards.
    pub fn set_now(&mut self, time: u64) {
        self.now = self.now.max(time);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_and_pop_due() {
        let mut clock = VirtualClock::new();
        clock.schedule(1000, Continuation::FinishRoll);
        assert_eq!(clock.remaining(), Some(1000));

        assert_eq!(clock.pop_due(999), None);
        assert_eq!(clock.now(), 0);

        assert_eq!(clock.pop_due(1500), Some(Continuation::FinishRoll));
        assert_eq!(clock.now(), 1000);
        assert!(clock.is_idle());
    }

    #[test]
    fn test_pop_now_jumps_clock() {
        let mut clock = VirtualClock::new();
        clock.set_now(50);
        clock.schedule(300, Continuation::AutoTrigger(EffectCode::dice(2)));
        assert_eq!(clock.pending().map(|s| s.due_at), Some(350));

        assert_eq!(clock.pop_now(), Some(Continuation::AutoTrigger(EffectCode::dice(2))));
        assert_eq!(clock.now(), 350);
        assert_eq!(clock.pop_now(), None);
    }

    #[test]
    fn test_clock_never_moves_backwards() {
        let mut clock = VirtualClock::new();
        clock.set_now(10);
        clock.set_now(5);
        assert_eq!(clock.now(), 10);
    }

    #[test]
    fn test_zero_delay_is_due_immediately() {
        let mut clock = VirtualClock::new();
        clock.schedule(0, Continuation::FinishAnimation);
        assert_eq!(clock.remaining(), Some(0));
        assert_eq!(clock.pop_due(0), Some(Continuation::FinishAnimation));
        assert!(clock.is_idle());
        assert_eq!(clock.remaining(), None);
    }
}
