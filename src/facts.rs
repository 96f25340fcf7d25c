//! Educational fact data and the per-player scheduling that gates each turn.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::player::PlayerId;

/// Fact category; the two lists alternate per player per turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactCategory {
    Control,
    Impact,
}

impl FactCategory {
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Control => Self::Impact,
            Self::Impact => Self::Control,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Control => "control",
            Self::Impact => "impact",
        }
    }
}

/// Resources granted by a milestone or a green-tile control fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RewardBundle {
    #[serde(default)]
    pub coins: u32,
    #[serde(default)]
    pub oxygen: f32,
    #[serde(default)]
    pub energy: u32,
    #[serde(default)]
    pub shields: u32,
}

/// One educational fact. `text` is an i18n key; rendering belongs to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fact {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub reward: RewardBundle,
}

/// Container for both fact lists; content is external data with a compiled-in
/// default set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FactData {
    #[serde(default)]
    pub control: Vec<Fact>,
    #[serde(default)]
    pub impact: Vec<Fact>,
}

impl FactData {
    /// Create empty fact data (useful for tests).
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load fact data from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into valid fact data.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Compiled-in default fact set.
    #[must_use]
    pub fn default_data() -> Self {
        fn fact(id: &str, coins: u32, oxygen: f32) -> Fact {
            Fact {
                id: id.to_string(),
                text: format!("fact.{id}"),
                reward: RewardBundle {
                    coins,
                    oxygen,
                    energy: 0,
                    shields: 0,
                },
            }
        }
        fn plain(id: &str) -> Fact {
            Fact {
                id: id.to_string(),
                text: format!("fact.{id}"),
                reward: RewardBundle::default(),
            }
        }
        let mut solar = fact("control.solar", 5, 4.0);
        solar.reward.energy = 1;
        let mut mangrove = fact("control.mangroves", 6, 5.0);
        mangrove.reward.shields = 1;
        Self {
            control: vec![
                fact("control.recycling", 3, 2.0),
                solar,
                fact("control.reforestation", 4, 5.0),
                fact("control.composting", 3, 2.0),
                fact("control.public-transit", 4, 3.0),
                fact("control.water-saving", 3, 3.0),
                mangrove,
                fact("control.wind-power", 5, 4.0),
                fact("control.plastic-free", 4, 2.0),
                fact("control.green-roofs", 4, 3.0),
            ],
            impact: vec![
                plain("impact.smog"),
                plain("impact.ocean-plastic"),
                plain("impact.deforestation"),
                plain("impact.coral-bleaching"),
                plain("impact.melting-ice"),
                plain("impact.acid-rain"),
                plain("impact.landfill-methane"),
                plain("impact.species-loss"),
                plain("impact.heat-islands"),
                plain("impact.water-scarcity"),
            ],
        }
    }

    #[must_use]
    pub fn list(&self, category: FactCategory) -> &[Fact] {
        match category {
            FactCategory::Control => &self.control,
            FactCategory::Impact => &self.impact,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.control.is_empty() && self.impact.is_empty()
    }
}

/// Per-player cursor: the turn count plus the category rule for even turns.
///
/// The mapping cursor -> (category, index) is pure; only `advanced` moves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactCursor {
    pub count: u32,
    pub even_category: FactCategory,
}

impl FactCursor {
    #[must_use]
    pub const fn new(even_category: FactCategory) -> Self {
        Self {
            count: 0,
            even_category,
        }
    }

    /// Category drawn on the cursor's current turn.
    #[must_use]
    pub const fn category(self) -> FactCategory {
        if self.count % 2 == 0 {
            self.even_category
        } else {
            self.even_category.other()
        }
    }

    /// Index within the current category's list; cycles once exhausted.
    #[must_use]
    pub fn index(self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        (self.count / 2) as usize % len
    }

    #[must_use]
    pub const fn advanced(self) -> Self {
        Self {
            count: self.count + 1,
            even_category: self.even_category,
        }
    }
}

/// A scheduled fact plus where it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactCard {
    pub fact: Fact,
    pub category: FactCategory,
    pub index: usize,
}

/// Deterministic alternating fact scheduler with independent per-player
/// cursors. The human draws Control on even turns; the AI draws Impact.
#[derive(Debug, Clone)]
pub struct FactScheduler {
    data: FactData,
    human: FactCursor,
    ai: FactCursor,
    learned_control: HashSet<usize>,
    learned_impact: HashSet<usize>,
}

impl FactScheduler {
    #[must_use]
    pub fn new(data: FactData) -> Self {
        Self {
            data,
            human: FactCursor::new(FactCategory::Control),
            ai: FactCursor::new(FactCategory::Impact),
            learned_control: HashSet::new(),
            learned_impact: HashSet::new(),
        }
    }

    #[must_use]
    pub fn has_facts(&self) -> bool {
        !self.data.is_empty()
    }

    #[must_use]
    pub const fn cursor(&self, player: PlayerId) -> FactCursor {
        match player {
            PlayerId::Human => self.human,
            PlayerId::Ai => self.ai,
        }
    }

    /// Draw the next fact for the player's turn, advancing their cursor.
    ///
    /// Returns `None` only when the selected category's list is empty.
    pub fn next_fact(&mut self, player: PlayerId) -> Option<FactCard> {
        let cursor = self.cursor(player);
        let category = cursor.category();
        let list = self.data.list(category);
        let card = if list.is_empty() {
            None
        } else {
            let index = cursor.index(list.len());
            let fact = list[index].clone();
            self.learned_set(category).insert(index);
            Some(FactCard {
                fact,
                category,
                index,
            })
        };
        let advanced = cursor.advanced();
        match player {
            PlayerId::Human => self.human = advanced,
            PlayerId::Ai => self.ai = advanced,
        }
        card
    }

    /// Pick a random control-measure fact for a green tile, avoiding exact
    /// repetition until the list is exhausted.
    pub fn pick_green_reward<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Fact> {
        if self.data.control.is_empty() {
            return None;
        }
        let fresh: Vec<usize> = (0..self.data.control.len())
            .filter(|idx| !self.learned_control.contains(idx))
            .collect();
        let index = if fresh.is_empty() {
            rng.random_range(0..self.data.control.len())
        } else {
            fresh[rng.random_range(0..fresh.len())]
        };
        self.learned_control.insert(index);
        Some(self.data.control[index].clone())
    }

    /// Total distinct facts shown so far, across both categories.
    #[must_use]
    pub fn learned_count(&self) -> usize {
        self.learned_control.len() + self.learned_impact.len()
    }

    /// Clear both cursors and the learned sets, keeping the fact data.
    pub fn reset(&mut self) {
        self.human = FactCursor::new(FactCategory::Control);
        self.ai = FactCursor::new(FactCategory::Impact);
        self.learned_control.clear();
        self.learned_impact.clear();
    }

    fn learned_set(&mut self, category: FactCategory) -> &mut HashSet<usize> {
        match category {
            FactCategory::Control => &mut self.learned_control,
            FactCategory::Impact => &mut self.learned_impact,
        }
    }
}
