use serde::{Deserialize, Serialize};
use std::fmt;

use crate::board::FIRST_TILE;

/// Seat identity for the two fixed players in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerId {
    Human,
    Ai,
}

impl PlayerId {
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Human => Self::Ai,
            Self::Ai => Self::Human,
        }
    }

    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Human => 0,
            Self::Ai => 1,
        }
    }

    #[must_use]
    pub const fn is_ai(self) -> bool {
        matches!(self, Self::Ai)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Human => "human",
            Self::Ai => "ai",
        }
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Presentation-only fields; never read by game logic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cosmetics {
    pub name: String,
    pub avatar: String,
    pub color: String,
}

impl Cosmetics {
    #[must_use]
    pub fn default_for(id: PlayerId) -> Self {
        match id {
            PlayerId::Human => Self {
                name: String::from("Explorer"),
                avatar: String::from("avatar.leaf"),
                color: String::from("#2e8b57"),
            },
            PlayerId::Ai => Self {
                name: String::from("Eco-Bot"),
                avatar: String::from("avatar.bot"),
                color: String::from("#4169e1"),
            },
        }
    }
}

/// One seat on the board: position, the one-shot snake shield, and cosmetics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    /// Current tile, 1 (start) to 100 (goal).
    pub position: u8,
    /// Armed by the shield power-up; cleared by exactly one snake block.
    pub shield_active: bool,
    pub turns_taken: u32,
    pub cosmetics: Cosmetics,
}

impl Player {
    #[must_use]
    pub fn new(id: PlayerId) -> Self {
        Self {
            id,
            position: FIRST_TILE,
            shield_active: false,
            turns_taken: 0,
            cosmetics: Cosmetics::default_for(id),
        }
    }

    #[must_use]
    pub const fn is_ai(&self) -> bool {
        self.id.is_ai()
    }

    /// Restore gameplay fields to their session-start values, keeping cosmetics.
    pub fn reset(&mut self) {
        self.position = FIRST_TILE;
        self.shield_active = false;
        self.turns_taken = 0;
    }
}
