//! Static board configuration: pure lookup tables, no behavior.
//!
//! Overlapping tile roles are rejected at construction time rather than
//! being resolved implicitly by effect order. Milestones are crossing-based
//! and may coincide with any tile role.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

use crate::facts::RewardBundle;

pub const FIRST_TILE: u8 = 1;
pub const LAST_TILE: u8 = 100;
pub const MILESTONE_STEP: u8 = 10;

/// The single grant carried by a power-up tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerUp {
    Energy,
    Shield,
    Coin,
    Oxygen,
    /// Teleport forward to the nearest ladder source ahead.
    Rainbow,
}

impl PowerUp {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Energy => "energy",
            Self::Shield => "shield",
            Self::Coin => "coin",
            Self::Oxygen => "oxygen",
            Self::Rainbow => "rainbow",
        }
    }
}

/// Fixed reward granted the first time a turn reaches or passes its tile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub tile: u8,
    /// i18n key for the milestone fact shown by the host.
    pub text: String,
    pub reward: RewardBundle,
}

/// Raw board layout as data; validated into a [`Board`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BoardConfig {
    #[serde(default)]
    pub ladders: BTreeMap<u8, u8>,
    #[serde(default)]
    pub snakes: BTreeMap<u8, u8>,
    #[serde(default)]
    pub green_tiles: BTreeSet<u8>,
    #[serde(default)]
    pub red_tiles: BTreeSet<u8>,
    #[serde(default)]
    pub power_tiles: BTreeMap<u8, PowerUp>,
    #[serde(default)]
    pub milestones: Vec<Milestone>,
}

impl BoardConfig {
    /// Load a board layout from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into a valid layout.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Compiled-in default Eco Ladders layout.
    #[must_use]
    pub fn default_config() -> Self {
        fn milestone(tile: u8, coins: u32, oxygen: f32, energy: u32, shields: u32) -> Milestone {
            Milestone {
                tile,
                text: format!("milestone.{tile}"),
                reward: RewardBundle {
                    coins,
                    oxygen,
                    energy,
                    shields,
                },
            }
        }
        Self {
            ladders: BTreeMap::from([
                (3, 22),
                (8, 26),
                (20, 38),
                (28, 45),
                (36, 57),
                (43, 62),
                (51, 72),
                (59, 80),
                (66, 87),
                (75, 94),
            ]),
            snakes: BTreeMap::from([
                (17, 7),
                (24, 12),
                (33, 19),
                (42, 30),
                (55, 39),
                (63, 48),
                (71, 52),
                (82, 65),
                (90, 74),
                (97, 78),
            ]),
            green_tiles: BTreeSet::from([5, 14, 31, 47, 58, 69, 84, 92]),
            red_tiles: BTreeSet::from([11, 23, 37, 49, 61, 77, 88, 95]),
            power_tiles: BTreeMap::from([
                (6, PowerUp::Energy),
                (18, PowerUp::Shield),
                (27, PowerUp::Coin),
                (44, PowerUp::Oxygen),
                (53, PowerUp::Rainbow),
                (68, PowerUp::Energy),
                (79, PowerUp::Shield),
                (86, PowerUp::Oxygen),
                (93, PowerUp::Coin),
            ]),
            milestones: vec![
                milestone(10, 4, 2.0, 0, 0),
                milestone(20, 5, 2.0, 0, 0),
                milestone(30, 5, 3.0, 0, 0),
                milestone(40, 6, 3.0, 1, 0),
                milestone(50, 8, 4.0, 0, 1),
                milestone(60, 6, 3.0, 0, 0),
                milestone(70, 7, 4.0, 0, 0),
                milestone(80, 8, 4.0, 1, 0),
                milestone(90, 9, 5.0, 0, 0),
                milestone(100, 12, 6.0, 0, 1),
            ],
        }
    }
}

/// Errors raised when a board layout violates its invariants.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BoardError {
    #[error("tile {tile} is out of range {FIRST_TILE}..={LAST_TILE}")]
    TileOutOfRange { tile: u8 },
    #[error("ladder at {start} must climb upward (destination {destination})")]
    LadderNotUpward { start: u8, destination: u8 },
    #[error("snake at {start} must slide downward (destination {destination})")]
    SnakeNotDownward { start: u8, destination: u8 },
    #[error("tile {tile} is assigned more than one role")]
    OverlappingRole { tile: u8 },
    #[error("milestone tile {tile} is not a positive multiple of {MILESTONE_STEP}")]
    MilestoneOffGrid { tile: u8 },
}

/// Validated, immutable board. All lookups are O(log n) map probes over a
/// fixed layout; no mutation after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    cfg: BoardConfig,
    milestones: BTreeMap<u8, Milestone>,
}

impl Board {
    /// Validate a layout into a board.
    ///
    /// # Errors
    ///
    /// Returns a [`BoardError`] when any tile is out of range, a ladder or
    /// snake points the wrong way, a milestone is off the 10-grid, or one
    /// tile carries more than one role.
    pub fn new(cfg: BoardConfig) -> Result<Self, BoardError> {
        let range_check = |tile: u8| {
            if (FIRST_TILE..=LAST_TILE).contains(&tile) {
                Ok(())
            } else {
                Err(BoardError::TileOutOfRange { tile })
            }
        };

        for (&source, &destination) in &cfg.ladders {
            range_check(source)?;
            range_check(destination)?;
            if destination <= source {
                return Err(BoardError::LadderNotUpward {
                    start: source,
                    destination,
                });
            }
        }
        for (&source, &destination) in &cfg.snakes {
            range_check(source)?;
            range_check(destination)?;
            if destination >= source {
                return Err(BoardError::SnakeNotDownward {
                    start: source,
                    destination,
                });
            }
        }
        for &tile in cfg.green_tiles.iter().chain(cfg.red_tiles.iter()) {
            range_check(tile)?;
        }
        for &tile in cfg.power_tiles.keys() {
            range_check(tile)?;
        }

        let mut roles = BTreeSet::new();
        let role_tiles = cfg
            .ladders
            .keys()
            .chain(cfg.snakes.keys())
            .chain(cfg.green_tiles.iter())
            .chain(cfg.red_tiles.iter())
            .chain(cfg.power_tiles.keys());
        for &tile in role_tiles {
            if !roles.insert(tile) {
                return Err(BoardError::OverlappingRole { tile });
            }
        }

        let mut milestones = BTreeMap::new();
        for milestone in &cfg.milestones {
            range_check(milestone.tile)?;
            if milestone.tile % MILESTONE_STEP != 0 {
                return Err(BoardError::MilestoneOffGrid {
                    tile: milestone.tile,
                });
            }
            milestones.insert(milestone.tile, milestone.clone());
        }

        Ok(Self { cfg, milestones })
    }

    /// The default Eco Ladders board.
    ///
    /// # Panics
    ///
    /// Panics when the compiled-in layout is invalid, which is a programming
    /// error caught by the test suite.
    #[must_use]
    pub fn default_board() -> Self {
        Self::new(BoardConfig::default_config()).expect("default board layout is valid")
    }

    #[must_use]
    pub fn ladder_destination(&self, tile: u8) -> Option<u8> {
        self.cfg.ladders.get(&tile).copied()
    }

    #[must_use]
    pub fn snake_destination(&self, tile: u8) -> Option<u8> {
        self.cfg.snakes.get(&tile).copied()
    }

    #[must_use]
    pub fn power_up(&self, tile: u8) -> Option<PowerUp> {
        self.cfg.power_tiles.get(&tile).copied()
    }

    #[must_use]
    pub fn is_green(&self, tile: u8) -> bool {
        self.cfg.green_tiles.contains(&tile)
    }

    #[must_use]
    pub fn is_red(&self, tile: u8) -> bool {
        self.cfg.red_tiles.contains(&tile)
    }

    #[must_use]
    pub fn milestone(&self, tile: u8) -> Option<&Milestone> {
        self.milestones.get(&tile)
    }

    /// Nearest ladder source strictly ahead of `tile`, if any.
    #[must_use]
    pub fn next_ladder_ahead(&self, tile: u8) -> Option<u8> {
        if tile >= LAST_TILE {
            return None;
        }
        self.cfg
            .ladders
            .range(tile + 1..=LAST_TILE)
            .next()
            .map(|(&source, _)| source)
    }

    /// Milestones at multiples of 10 in `(start, end]`, in crossing order.
    #[must_use]
    pub fn milestones_crossed(&self, start: u8, end: u8) -> Vec<&Milestone> {
        if end <= start {
            return Vec::new();
        }
        self.milestones
            .range(start.saturating_add(1)..=end)
            .map(|(_, milestone)| milestone)
            .collect()
    }
}
