//! Turn ownership.

use serde::{Deserialize, Serialize};

/// Which side currently acts.
///
/// Ownership alternates strictly; see [`TurnOwner::opposite`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnOwner {
    /// The human side. Rolls and spell triggers wait for input.
    #[default]
    Player,
    /// The automated side. Rolls and triggers run on their own.
    Enemy,
}

impl TurnOwner {
    /// The side that acts next.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            TurnOwner::Player => TurnOwner::Enemy,
            TurnOwner::Enemy => TurnOwner::Player,
        }
    }

    /// Whether this side acts without external events.
    #[must_use]
    pub const fn is_automated(self) -> bool {
        matches!(self, TurnOwner::Enemy)
    }

    /// Banner shown when handing the turn to this side.
    #[must_use]
    pub const fn turn_label(self) -> &'static str {
        match self {
            TurnOwner::Player => "Players Turn",
            TurnOwner::Enemy => "Enemies Turn",
        }
    }
}

impl std::fmt::Display for TurnOwner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TurnOwner::Player => f.write_str("player"),
            TurnOwner::Enemy => f.write_str("enemy"),
        }
    }
}
