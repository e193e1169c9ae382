//! Battle session configuration.
//!
//! Hosts configure a session at startup with `BattleConfig`:
//! - Pacing delays for the turn sequence (in abstract time units)
//! - Which side opens the battle
//! - RNG seed
//! - How strictly ranged tokens are validated
//!
//! Delays are presentation pacing, not computation. The engine never
//! sleeps; it schedules continuations that the host advances.

use serde::{Deserialize, Serialize};

use super::TurnOwner;

/// Default delay between a roll starting and its result.
pub const DEFAULT_ROLL_DELAY: u64 = 1000;

/// Default delay before an automated side triggers its rolled spell.
pub const DEFAULT_AUTO_TRIGGER_DELAY: u64 = 300;

/// Default duration of the spell animation phase.
pub const DEFAULT_ANIMATION_DELAY: u64 = 2000;

/// Complete battle session configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleConfig {
    /// Time units between starting a roll and revealing it.
    pub roll_delay: u64,

    /// Time units between an automated roll and its spell trigger.
    pub auto_trigger_delay: u64,

    /// Time units spent in the animating phase.
    pub animation_delay: u64,

    /// Side that takes the first turn.
    pub first_owner: TurnOwner,

    /// Seed for the session RNG.
    pub seed: u64,

    /// Reject effects whose ranged tokens fail to resolve instead of
    /// dispatching them with the parameter missing.
    pub strict_ranged_values: bool,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            roll_delay: DEFAULT_ROLL_DELAY,
            auto_trigger_delay: DEFAULT_AUTO_TRIGGER_DELAY,
            animation_delay: DEFAULT_ANIMATION_DELAY,
            first_owner: TurnOwner::Player,
            seed: 42,
            strict_ranged_values: false,
        }
    }
}

impl BattleConfig {
    /// Create a configuration with default pacing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration with every delay set to zero (headless simulation).
    #[must_use]
    pub fn instant() -> Self {
        Self::default().with_delays(0, 0, 0)
    }

    /// Set all three pacing delays.
    #[must_use]
    pub fn with_delays(mut self, roll: u64, auto_trigger: u64, animation: u64) -> Self {
        self.roll_delay = roll;
        self.auto_trigger_delay = auto_trigger;
        self.animation_delay = animation;
        self
    }

    /// Set the opening side.
    #[must_use]
    pub fn with_first_owner(mut self, owner: TurnOwner) -> Self {
        self.first_owner = owner;
        self
    }

    /// Set the RNG seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Reject effects with unresolvable ranged tokens.
    #[must_use]
    pub fn strict(mut self) -> Self {
        self.strict_ranged_values = true;
        self
    }

    /// Total pacing of one automated turn, roll to end of animation.
    #[must_use]
    pub fn automated_turn_duration(&self) -> u64 {
        self.roll_delay + self.auto_trigger_delay + self.animation_delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BattleConfig::default();
        assert_eq!(config.roll_delay, 1000);
        assert_eq!(config.auto_trigger_delay, 300);
        assert_eq!(config.animation_delay, 2000);
        assert_eq!(config.first_owner, TurnOwner::Player);
        assert!(!config.strict_ranged_values);
        assert_eq!(config.automated_turn_duration(), 3300);
    }

    #[test]
    fn test_builder() {
        let config = BattleConfig::new()
            .with_first_owner(TurnOwner::Enemy)
            .with_seed(7)
            .with_delays(10, 3, 20)
            .strict();

        assert_eq!(config.first_owner, TurnOwner::Enemy);
        assert_eq!(config.seed, 7);
        assert_eq!(config.automated_turn_duration(), 33);
        assert!(config.strict_ranged_values);
    }

    #[test]
    fn test_instant() {
        let config = BattleConfig::instant();
        assert_eq!(config.automated_turn_duration(), 0);
    }

    #[test]
    fn test_config_serde() {
        let config = BattleConfig::default().with_seed(99);
        let json = serde_json::to_string(&config).unwrap();
        let back: BattleConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }
}
