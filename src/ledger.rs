use serde::{Deserialize, Serialize};

use crate::facts::RewardBundle;

const PERCENT_MIN: f32 = 0.0;
const PERCENT_MAX: f32 = 100.0;
const DEFAULT_OXYGEN: f32 = 50.0;
const DEFAULT_POLLUTION: f32 = 50.0;
const DEFAULT_ENERGY: u32 = 1;

/// Shared resource ledger mutated only during turn resolution.
///
/// `oxygen` and `pollution` are percentages clamped to [0, 100] after every
/// mutation; the integer resources never go negative (debits clamp at zero).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceLedger {
    pub oxygen: f32,
    pub pollution: f32,
    pub coins: u32,
    pub energy: u32,
    pub shields: u32,
}

impl Default for ResourceLedger {
    fn default() -> Self {
        Self {
            oxygen: DEFAULT_OXYGEN,
            pollution: DEFAULT_POLLUTION,
            coins: 0,
            energy: DEFAULT_ENERGY,
            shields: 0,
        }
    }
}

impl ResourceLedger {
    pub fn clamp(&mut self) {
        self.oxygen = self.oxygen.clamp(PERCENT_MIN, PERCENT_MAX);
        self.pollution = self.pollution.clamp(PERCENT_MIN, PERCENT_MAX);
    }

    pub fn credit_oxygen(&mut self, amount: f32) {
        self.oxygen += amount.max(0.0);
        self.clamp();
    }

    pub fn debit_oxygen(&mut self, amount: f32) {
        self.oxygen -= amount.max(0.0);
        self.clamp();
    }

    pub fn raise_pollution(&mut self, amount: f32) {
        self.pollution += amount.max(0.0);
        self.clamp();
    }

    pub fn lower_pollution(&mut self, amount: f32) {
        self.pollution -= amount.max(0.0);
        self.clamp();
    }

    pub fn add_coins(&mut self, amount: u32) {
        self.coins = self.coins.saturating_add(amount);
    }

    /// Debit up to `requested` coins, returning the amount actually removed.
    pub fn spend_coins(&mut self, requested: u32) -> u32 {
        let spent = self.coins.min(requested);
        self.coins -= spent;
        spent
    }

    pub fn add_energy(&mut self, amount: u32) {
        self.energy = self.energy.saturating_add(amount);
    }

    /// Spend one energy point if any is available.
    pub fn spend_energy(&mut self) -> bool {
        if self.energy == 0 {
            return false;
        }
        self.energy -= 1;
        true
    }

    pub fn add_shields(&mut self, amount: u32) {
        self.shields = self.shields.saturating_add(amount);
    }

    /// Consume one shield if any is available.
    pub fn consume_shield(&mut self) -> bool {
        if self.shields == 0 {
            return false;
        }
        self.shields -= 1;
        true
    }

    /// Apply a reward bundle (milestone or green-tile grant) in one step.
    pub fn apply_bundle(&mut self, bundle: &RewardBundle) {
        self.add_coins(bundle.coins);
        self.credit_oxygen(bundle.oxygen);
        self.add_energy(bundle.energy);
        self.add_shields(bundle.shields);
    }
}
