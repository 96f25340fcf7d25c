//! The turn state machine.
//!
//! A turn is a pull-driven pipeline: `FactGate -> Rolling -> Moving ->
//! ResolvingEffects -> MilestoneCheck -> WinCheck -> Handoff`. Each call to
//! [`GameSession::advance`](crate::session::GameSession::advance) runs the
//! machine to the next suspension point and yields exactly one [`TurnSignal`].
//! The engine never sleeps; signals carry delay hints and the host schedules
//! real timers from them.

use std::collections::VecDeque;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::board::{FIRST_TILE, LAST_TILE, Milestone, PowerUp};
use crate::dice::{hazard_triggers, roll_die};
use crate::event::{EventKind, EventSeverity, turn_tags};
use crate::facts::{FactCard, RewardBundle};
use crate::player::PlayerId;
use crate::session::{GameCompleted, GameSession};

const ENERGY_BONUS_STEPS: u8 = 2;
const ENERGY_GUARD_TILE: u8 = 94;
const AI_ENERGY_SPEND_CHANCE: f64 = 0.5;
const RED_READ_BONUS: u32 = 1;
const RED_COIN_PENALTY: u32 = 2;
const RED_OXYGEN_PENALTY: f32 = 4.0;
const RED_POLLUTION_PENALTY: f32 = 3.0;
const POWER_COIN_GRANT: u32 = 5;
const POWER_OXYGEN_GRANT: f32 = 8.0;
const GREEN_POLLUTION_DROP: f32 = 2.0;
const MILESTONE_POLLUTION_DROP: f32 = 2.0;
const AMBIENT_DECAY_SCALE: f32 = 1.2;

/// Landing-tile effects resolve in this order, always. The order is a visible
/// contract: a rainbow teleport lands before the ladder stage runs, so the
/// chain rainbow -> ladder source -> climb happens inside one turn.
pub const EFFECT_ORDER: [EffectStage; 6] = [
    EffectStage::PowerUp,
    EffectStage::GreenTile,
    EffectStage::Ladder,
    EffectStage::RedTile,
    EffectStage::Snake,
    EffectStage::AmbientDecay,
];

/// One slot in the fixed effect pipeline. Each stage inspects the player's
/// current tile, so an earlier relocation changes what later stages see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectStage {
    PowerUp,
    GreenTile,
    Ladder,
    RedTile,
    Snake,
    AmbientDecay,
}

/// How a red-tile hazard resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HazardOutcome {
    /// The hazard draw did not trigger.
    Spared,
    /// One shield was consumed; no other penalty applied.
    Absorbed,
    /// Full penalty: coins (up to 2), oxygen, pollution.
    Penalized { coins_lost: u32 },
}

/// The state change produced by one effect stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectOutcome {
    PowerUpCollected {
        tile: u8,
        power: PowerUp,
        /// Rainbow teleport destination, when one existed ahead.
        relocated_to: Option<u8>,
    },
    GreenReward {
        tile: u8,
        fact_id: Option<String>,
        reward: RewardBundle,
    },
    LadderClimbed {
        from: u8,
        to: u8,
    },
    RedTileResolved {
        tile: u8,
        hazard: HazardOutcome,
    },
    SnakeSlide {
        from: u8,
        to: u8,
    },
    /// The one-shot snake shield was spent; the player stays put.
    SnakeBlocked {
        tile: u8,
    },
    AmbientDecay {
        pollution_drop: f32,
    },
}

/// One suspension point yielded by `advance`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnSignal {
    /// The educational fact blocking this turn. Repeats until acknowledged.
    FactGate {
        card: FactCard,
        /// Set on AI turns; the host dismisses the card itself after this.
        auto_dismiss_ms: Option<u32>,
    },
    DiceRolled {
        value: u8,
        energy_bonus: u8,
    },
    /// One intermediate movement step; the token is now on `tile`.
    StepTo {
        tile: u8,
        delay_ms: u32,
    },
    Effect {
        outcome: EffectOutcome,
        pause_ms: u32,
    },
    Milestone {
        tile: u8,
        reward: RewardBundle,
    },
    GameOver(GameCompleted),
    TurnEnded {
        next: PlayerId,
        /// Set when the next seat is the AI, which rolls on its own.
        auto_roll_delay_ms: Option<u32>,
    },
}

/// Errors from the turn admission and driving API.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TurnError {
    #[error("a turn is already being resolved")]
    TurnInProgress,
    #[error("the game is over")]
    GameOver,
    #[error("it is {expected}'s turn")]
    OutOfTurn { expected: PlayerId },
    #[error("turn handle is stale; the session was reset")]
    StaleHandle,
    #[error("no turn is active")]
    NoActiveTurn,
    #[error("no fact is awaiting acknowledgement")]
    NoFactPending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TurnPhase {
    FactGate,
    Rolling,
    Moving,
    ResolvingEffects,
    MilestoneCheck,
    WinCheck,
    Handoff,
    Complete,
}

/// In-flight state for the turn currently being resolved.
#[derive(Debug)]
pub(crate) struct TurnMachine {
    pub(crate) player: PlayerId,
    pub(crate) phase: TurnPhase,
    gate: Option<FactCard>,
    path: VecDeque<u8>,
    move_start: u8,
    stage_index: usize,
    pending_milestones: Option<VecDeque<Milestone>>,
}

impl TurnMachine {
    pub(crate) fn new(player: PlayerId, gate: Option<FactCard>) -> Self {
        Self {
            player,
            phase: if gate.is_some() {
                TurnPhase::FactGate
            } else {
                TurnPhase::Rolling
            },
            gate,
            path: VecDeque::new(),
            move_start: FIRST_TILE,
            stage_index: 0,
            pending_milestones: None,
        }
    }

    /// Unblock the fact gate. Returns false when no gate is pending.
    pub(crate) fn acknowledge(&mut self) -> bool {
        if self.phase == TurnPhase::FactGate && self.gate.is_some() {
            self.phase = TurnPhase::Rolling;
            true
        } else {
            false
        }
    }
}

impl GameSession {
    /// Run the machine to its next suspension point.
    pub(crate) fn step_machine(
        &mut self,
        machine: &mut TurnMachine,
    ) -> Result<TurnSignal, TurnError> {
        loop {
            match machine.phase {
                TurnPhase::FactGate => {
                    let Some(card) = machine.gate.clone() else {
                        machine.phase = TurnPhase::Rolling;
                        continue;
                    };
                    let auto_dismiss_ms = machine
                        .player
                        .is_ai()
                        .then(|| self.timing().fact_auto_dismiss_ms);
                    return Ok(TurnSignal::FactGate {
                        card,
                        auto_dismiss_ms,
                    });
                }
                TurnPhase::Rolling => return Ok(self.step_roll(machine)),
                TurnPhase::Moving => {
                    if let Some(signal) = self.step_move(machine) {
                        return Ok(signal);
                    }
                    machine.phase = TurnPhase::ResolvingEffects;
                }
                TurnPhase::ResolvingEffects => {
                    if let Some(signal) = self.step_effects(machine) {
                        return Ok(signal);
                    }
                    machine.phase = TurnPhase::MilestoneCheck;
                }
                TurnPhase::MilestoneCheck => {
                    if let Some(signal) = self.step_milestones(machine) {
                        return Ok(signal);
                    }
                    machine.phase = TurnPhase::WinCheck;
                }
                TurnPhase::WinCheck => {
                    if let Some(signal) = self.step_win(machine) {
                        return Ok(signal);
                    }
                    machine.phase = TurnPhase::Handoff;
                }
                TurnPhase::Handoff => return Ok(self.step_handoff(machine)),
                TurnPhase::Complete => return Err(TurnError::NoActiveTurn),
            }
        }
    }

    fn step_roll(&mut self, machine: &mut TurnMachine) -> TurnSignal {
        let value = self.draw_die();
        let energy_bonus = self.energy_bonus(machine.player);
        let start = self.players[machine.player.index()].position;
        machine.move_start = start;
        let target = start.saturating_add(value + energy_bonus).min(LAST_TILE);
        machine.path = ((start + 1)..=target).collect();
        machine.phase = TurnPhase::Moving;
        self.push_log("log.roll");
        self.push_event(
            EventKind::DiceRolled,
            EventSeverity::Info,
            turn_tags(&["roll"]),
            serde_json::json!({
                "player": machine.player.as_str(),
                "value": value,
                "bonus": energy_bonus,
                "target": target,
            }),
        );
        TurnSignal::DiceRolled {
            value,
            energy_bonus,
        }
    }

    fn step_move(&mut self, machine: &mut TurnMachine) -> Option<TurnSignal> {
        let tile = machine.path.pop_front()?;
        self.players[machine.player.index()].position = tile;
        self.push_event(
            EventKind::StepAdvanced,
            EventSeverity::Info,
            turn_tags(&["move"]),
            serde_json::json!({ "tile": tile }),
        );
        Some(TurnSignal::StepTo {
            tile,
            delay_ms: self.timing().step_ms,
        })
    }

    fn step_effects(&mut self, machine: &mut TurnMachine) -> Option<TurnSignal> {
        while machine.stage_index < EFFECT_ORDER.len() {
            let stage = EFFECT_ORDER[machine.stage_index];
            machine.stage_index += 1;
            if let Some(outcome) = self.apply_stage(machine.player, stage) {
                self.record_effect(&outcome);
                return Some(TurnSignal::Effect {
                    outcome,
                    pause_ms: self.timing().effect_pause_ms,
                });
            }
        }
        None
    }

    fn step_milestones(&mut self, machine: &mut TurnMachine) -> Option<TurnSignal> {
        let seat = machine.player;
        let settled = self.players[seat.index()].position;
        let queue = machine.pending_milestones.get_or_insert_with(|| {
            self.board
                .milestones_crossed(machine.move_start, settled)
                .into_iter()
                .cloned()
                .collect()
        });
        let milestone = queue.pop_front()?;
        self.ledger.apply_bundle(&milestone.reward);
        self.ledger.lower_pollution(MILESTONE_POLLUTION_DROP);
        self.milestones_collected += 1;
        self.push_log("log.milestone");
        self.push_event(
            EventKind::MilestoneReached,
            EventSeverity::Info,
            turn_tags(&["milestone"]),
            serde_json::json!({ "tile": milestone.tile, "text": milestone.text }),
        );
        Some(TurnSignal::Milestone {
            tile: milestone.tile,
            reward: milestone.reward,
        })
    }

    fn step_win(&mut self, machine: &mut TurnMachine) -> Option<TurnSignal> {
        let seat = machine.player;
        if self.players[seat.index()].position < LAST_TILE {
            return None;
        }
        let completed = self.build_completion(seat);
        self.completed = Some(completed.clone());
        machine.phase = TurnPhase::Complete;
        self.push_log("log.win");
        self.push_event(
            EventKind::GameCompleted,
            EventSeverity::Critical,
            turn_tags(&["win", seat.as_str()]),
            serde_json::json!({ "winner": seat.as_str(), "points": completed.points }),
        );
        Some(TurnSignal::GameOver(completed))
    }

    fn step_handoff(&mut self, machine: &mut TurnMachine) -> TurnSignal {
        self.current = machine.player.other();
        machine.phase = TurnPhase::Complete;
        self.push_event(
            EventKind::TurnEnded,
            EventSeverity::Info,
            turn_tags(&["handoff"]),
            serde_json::json!({ "next": self.current.as_str() }),
        );
        let auto_roll_delay_ms = self
            .current
            .is_ai()
            .then(|| self.timing().ai_roll_delay_ms);
        TurnSignal::TurnEnded {
            next: self.current,
            auto_roll_delay_ms,
        }
    }

    fn draw_die(&mut self) -> u8 {
        #[cfg(test)]
        if let Some(forced) = self.forced_die.take() {
            return forced;
        }
        let mut rng = self.rng.dice();
        roll_die(self.config.dice_profile, &mut *rng)
    }

    /// Energy-spend policy. The human spends whenever energy is available and
    /// the finish is not yet in reach; the AI flips a coin.
    fn energy_bonus(&mut self, seat: PlayerId) -> u8 {
        let position = self.players[seat.index()].position;
        let wants = if seat.is_ai() {
            self.ledger.energy > 0 && self.rng.energy().random_bool(AI_ENERGY_SPEND_CHANCE)
        } else {
            self.ledger.energy > 0 && position < ENERGY_GUARD_TILE
        };
        if wants && self.ledger.spend_energy() {
            self.push_event(
                EventKind::EnergySpent,
                EventSeverity::Info,
                turn_tags(&["energy"]),
                serde_json::json!({ "player": seat.as_str() }),
            );
            ENERGY_BONUS_STEPS
        } else {
            0
        }
    }

    fn apply_stage(&mut self, seat: PlayerId, stage: EffectStage) -> Option<EffectOutcome> {
        let tile = self.players[seat.index()].position;
        match stage {
            EffectStage::PowerUp => {
                let power = self.board.power_up(tile)?;
                let relocated_to = self.collect_power_up(seat, power);
                Some(EffectOutcome::PowerUpCollected {
                    tile,
                    power,
                    relocated_to,
                })
            }
            EffectStage::GreenTile => {
                if !self.board.is_green(tile) {
                    return None;
                }
                let fact = {
                    let mut rng = self.rng.reward();
                    self.scheduler.pick_green_reward(&mut *rng)
                }?;
                self.ledger.apply_bundle(&fact.reward);
                self.ledger.lower_pollution(GREEN_POLLUTION_DROP);
                Some(EffectOutcome::GreenReward {
                    tile,
                    fact_id: Some(fact.id),
                    reward: fact.reward,
                })
            }
            EffectStage::Ladder => {
                let to = self.board.ladder_destination(tile)?;
                self.players[seat.index()].position = to;
                Some(EffectOutcome::LadderClimbed { from: tile, to })
            }
            EffectStage::RedTile => {
                if !self.board.is_red(tile) {
                    return None;
                }
                let hazard = self.resolve_red_hazard();
                Some(EffectOutcome::RedTileResolved { tile, hazard })
            }
            EffectStage::Snake => {
                let to = self.board.snake_destination(tile)?;
                let player = &mut self.players[seat.index()];
                if player.shield_active {
                    player.shield_active = false;
                    Some(EffectOutcome::SnakeBlocked { tile })
                } else {
                    player.position = to;
                    Some(EffectOutcome::SnakeSlide { from: tile, to })
                }
            }
            EffectStage::AmbientDecay => {
                let draw: f32 = {
                    let mut rng = self.rng.ambient();
                    rng.random()
                };
                let pollution_drop = draw * AMBIENT_DECAY_SCALE;
                self.ledger.lower_pollution(pollution_drop);
                Some(EffectOutcome::AmbientDecay { pollution_drop })
            }
        }
    }

    fn collect_power_up(&mut self, seat: PlayerId, power: PowerUp) -> Option<u8> {
        match power {
            PowerUp::Energy => {
                self.ledger.add_energy(1);
                None
            }
            PowerUp::Shield => {
                self.ledger.add_shields(1);
                self.players[seat.index()].shield_active = true;
                None
            }
            PowerUp::Coin => {
                self.ledger.add_coins(POWER_COIN_GRANT);
                None
            }
            PowerUp::Oxygen => {
                self.ledger.credit_oxygen(POWER_OXYGEN_GRANT);
                None
            }
            PowerUp::Rainbow => {
                let tile = self.players[seat.index()].position;
                let destination = self.board.next_ladder_ahead(tile)?;
                self.players[seat.index()].position = destination;
                Some(destination)
            }
        }
    }

    /// Red tiles always pay the one-coin read bonus; the hazard draw decides
    /// whether the penalty lands, and a banked shield absorbs it whole.
    fn resolve_red_hazard(&mut self) -> HazardOutcome {
        self.ledger.add_coins(RED_READ_BONUS);
        let triggered = {
            let mut rng = self.rng.hazard();
            hazard_triggers(self.config.dice_profile, &mut *rng)
        };
        if !triggered {
            return HazardOutcome::Spared;
        }
        if self.ledger.consume_shield() {
            return HazardOutcome::Absorbed;
        }
        let coins_lost = self.ledger.spend_coins(RED_COIN_PENALTY);
        self.ledger.debit_oxygen(RED_OXYGEN_PENALTY);
        self.ledger.raise_pollution(RED_POLLUTION_PENALTY);
        HazardOutcome::Penalized { coins_lost }
    }

    fn record_effect(&mut self, outcome: &EffectOutcome) {
        match outcome {
            EffectOutcome::PowerUpCollected { tile, power, .. } => {
                self.push_log(format!("log.power.{}", power.as_str()));
                self.push_event(
                    EventKind::PowerUpCollected,
                    EventSeverity::Info,
                    turn_tags(&["power", power.as_str()]),
                    serde_json::json!({ "tile": tile, "power": power.as_str() }),
                );
            }
            EffectOutcome::GreenReward { tile, fact_id, .. } => {
                self.push_log("log.green");
                self.push_event(
                    EventKind::GreenReward,
                    EventSeverity::Info,
                    turn_tags(&["green"]),
                    serde_json::json!({ "tile": tile, "fact": fact_id }),
                );
            }
            EffectOutcome::LadderClimbed { from, to } => {
                self.push_log("log.ladder");
                self.push_event(
                    EventKind::LadderClimbed,
                    EventSeverity::Info,
                    turn_tags(&["ladder"]),
                    serde_json::json!({ "from": from, "to": to }),
                );
            }
            EffectOutcome::RedTileResolved { tile, hazard } => {
                let (key, severity) = match hazard {
                    HazardOutcome::Spared => ("log.hazard.spared", EventSeverity::Info),
                    HazardOutcome::Absorbed => ("log.hazard.absorbed", EventSeverity::Info),
                    HazardOutcome::Penalized { .. } => {
                        ("log.hazard.penalized", EventSeverity::Warning)
                    }
                };
                self.push_log(key);
                self.push_event(
                    EventKind::HazardResolved,
                    severity,
                    turn_tags(&["hazard"]),
                    serde_json::json!({ "tile": tile, "outcome": hazard }),
                );
            }
            EffectOutcome::SnakeSlide { from, to } => {
                self.push_log("log.snake");
                self.push_event(
                    EventKind::SnakeSlide,
                    EventSeverity::Warning,
                    turn_tags(&["snake"]),
                    serde_json::json!({ "from": from, "to": to }),
                );
            }
            EffectOutcome::SnakeBlocked { tile } => {
                self.push_log("log.snake.blocked");
                self.push_event(
                    EventKind::ShieldBlocked,
                    EventSeverity::Info,
                    turn_tags(&["snake", "shield"]),
                    serde_json::json!({ "tile": tile }),
                );
            }
            EffectOutcome::AmbientDecay { pollution_drop } => {
                self.push_event(
                    EventKind::AmbientDecayApplied,
                    EventSeverity::Info,
                    turn_tags(&["ambient"]),
                    serde_json::json!({ "drop": pollution_drop }),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Board, BoardConfig};
    use crate::facts::FactData;
    use crate::session::{GameSession, SessionConfig};

    fn board(cfg: BoardConfig) -> Board {
        Board::new(cfg).expect("test board")
    }

    /// Session on a custom board with no quiz gate and no starting energy, so
    /// forced dice land exactly where a test puts them.
    fn quiet_session(cfg: BoardConfig) -> GameSession {
        let config = SessionConfig {
            quiz_mode: false,
            ..SessionConfig::default()
        };
        let mut session = GameSession::new(board(cfg), FactData::empty(), config);
        session.ledger.energy = 0;
        session
    }

    fn milestones(signals: &[TurnSignal]) -> Vec<u8> {
        signals
            .iter()
            .filter_map(|signal| match signal {
                TurnSignal::Milestone { tile, .. } => Some(*tile),
                _ => None,
            })
            .collect()
    }

    fn outcomes(signals: &[TurnSignal]) -> Vec<EffectOutcome> {
        signals
            .iter()
            .filter_map(|signal| match signal {
                TurnSignal::Effect { outcome, .. } => Some(outcome.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn effect_order_is_the_documented_pipeline() {
        assert_eq!(
            EFFECT_ORDER,
            [
                EffectStage::PowerUp,
                EffectStage::GreenTile,
                EffectStage::Ladder,
                EffectStage::RedTile,
                EffectStage::Snake,
                EffectStage::AmbientDecay,
            ]
        );
    }

    #[test]
    fn crossing_a_milestone_mid_step_grants_its_bundle_once() {
        let mut cfg = BoardConfig::default();
        cfg.milestones = BoardConfig::default_config().milestones;
        let mut session = quiet_session(cfg);
        session.players[0].position = 47;
        session.forced_die = Some(6);

        let handle = session.begin_turn(PlayerId::Human).expect("begin");
        let signals = session.play_out(&handle).expect("play");

        // 47 -> 53 passes 50 without landing on it; the reward fires once.
        assert_eq!(milestones(&signals), vec![50]);
        assert_eq!(session.players[0].position, 53);
        // Milestone 50: 8 coins, 4 oxygen, 1 shield.
        assert_eq!(session.ledger.coins, 8);
        assert_eq!(session.ledger.shields, 1);
        assert_eq!(session.milestones_collected, 1);
    }

    #[test]
    fn landing_exactly_on_a_milestone_also_counts() {
        let mut cfg = BoardConfig::default();
        cfg.milestones = BoardConfig::default_config().milestones;
        let mut session = quiet_session(cfg);
        session.players[0].position = 47;
        session.forced_die = Some(3);

        let handle = session.begin_turn(PlayerId::Human).expect("begin");
        let signals = session.play_out(&handle).expect("play");

        assert_eq!(milestones(&signals), vec![50]);
        assert_eq!(session.players[0].position, 50);
        assert_eq!(session.milestones_collected, 1);
    }

    #[test]
    fn overshoot_clamps_to_the_goal_and_ends_the_game() {
        let mut cfg = BoardConfig::default();
        cfg.milestones = BoardConfig::default_config().milestones;
        let mut session = quiet_session(cfg);
        session.players[0].position = 95;
        session.forced_die = Some(6);

        let handle = session.begin_turn(PlayerId::Human).expect("begin");
        let signals = session.play_out(&handle).expect("play");

        let steps: Vec<u8> = signals
            .iter()
            .filter_map(|signal| match signal {
                TurnSignal::StepTo { tile, .. } => Some(*tile),
                _ => None,
            })
            .collect();
        assert_eq!(steps, vec![96, 97, 98, 99, 100]);
        assert_eq!(milestones(&signals), vec![100]);

        let Some(TurnSignal::GameOver(completed)) = signals.last() else {
            panic!("expected game over, got {:?}", signals.last());
        };
        assert_eq!(completed.winner, PlayerId::Human);
        assert!(completed.is_player_win);
        // Milestone 100: 12 coins, 6 oxygen, 1 shield.
        assert_eq!(completed.coins, 12);
        assert!((completed.oxygen - 56.0).abs() < f32::EPSILON);
        assert_eq!(completed.points, 12 * 10 + 56 * 2 + 15);

        assert_eq!(
            session.begin_turn(PlayerId::Ai),
            Err(TurnError::GameOver)
        );
    }

    #[test]
    fn rainbow_teleport_chains_into_the_ladder_stage() {
        let mut cfg = BoardConfig::default();
        cfg.power_tiles.insert(10, PowerUp::Rainbow);
        cfg.ladders.insert(12, 30);
        let mut session = quiet_session(cfg);
        session.players[0].position = 7;
        session.forced_die = Some(3);

        let handle = session.begin_turn(PlayerId::Human).expect("begin");
        let signals = session.play_out(&handle).expect("play");

        let effects = outcomes(&signals);
        assert_eq!(
            effects[0],
            EffectOutcome::PowerUpCollected {
                tile: 10,
                power: PowerUp::Rainbow,
                relocated_to: Some(12),
            }
        );
        assert_eq!(effects[1], EffectOutcome::LadderClimbed { from: 12, to: 30 });
        assert!(matches!(effects[2], EffectOutcome::AmbientDecay { .. }));
        assert_eq!(session.players[0].position, 30);
    }

    #[test]
    fn rainbow_with_no_ladder_ahead_stays_put() {
        let mut cfg = BoardConfig::default();
        cfg.power_tiles.insert(10, PowerUp::Rainbow);
        let mut session = quiet_session(cfg);
        session.players[0].position = 7;
        session.forced_die = Some(3);

        let handle = session.begin_turn(PlayerId::Human).expect("begin");
        let signals = session.play_out(&handle).expect("play");

        assert_eq!(
            outcomes(&signals)[0],
            EffectOutcome::PowerUpCollected {
                tile: 10,
                power: PowerUp::Rainbow,
                relocated_to: None,
            }
        );
        assert_eq!(session.players[0].position, 10);
    }

    #[test]
    fn armed_shield_blocks_one_snake() {
        let mut cfg = BoardConfig::default();
        cfg.snakes.insert(20, 5);
        let mut session = quiet_session(cfg);
        session.players[0].position = 17;
        session.players[0].shield_active = true;
        session.forced_die = Some(3);

        let handle = session.begin_turn(PlayerId::Human).expect("begin");
        let signals = session.play_out(&handle).expect("play");

        assert!(outcomes(&signals).contains(&EffectOutcome::SnakeBlocked { tile: 20 }));
        assert_eq!(session.players[0].position, 20);
        assert!(!session.players[0].shield_active);
    }

    #[test]
    fn unshielded_snake_slides_down() {
        let mut cfg = BoardConfig::default();
        cfg.snakes.insert(20, 5);
        let mut session = quiet_session(cfg);
        session.players[0].position = 17;
        session.forced_die = Some(3);

        let handle = session.begin_turn(PlayerId::Human).expect("begin");
        let signals = session.play_out(&handle).expect("play");

        assert!(outcomes(&signals).contains(&EffectOutcome::SnakeSlide { from: 20, to: 5 }));
        assert_eq!(session.players[0].position, 5);
    }

    #[test]
    fn red_tile_ledger_matches_its_outcome() {
        let mut cfg = BoardConfig::default();
        cfg.red_tiles.insert(10);
        let mut session = quiet_session(cfg);
        session.players[0].position = 7;
        session.forced_die = Some(3);

        let handle = session.begin_turn(PlayerId::Human).expect("begin");
        let signals = session.play_out(&handle).expect("play");

        let red = outcomes(&signals)
            .into_iter()
            .find_map(|outcome| match outcome {
                EffectOutcome::RedTileResolved { tile, hazard } => Some((tile, hazard)),
                _ => None,
            })
            .expect("red tile resolved");
        assert_eq!(red.0, 10);
        match red.1 {
            HazardOutcome::Spared => {
                assert_eq!(session.ledger.coins, 1);
                assert!((session.ledger.oxygen - 50.0).abs() < f32::EPSILON);
            }
            HazardOutcome::Absorbed => panic!("no shield was banked"),
            HazardOutcome::Penalized { coins_lost } => {
                // Read bonus lands first, so only that one coin is at stake.
                assert_eq!(coins_lost, 1);
                assert_eq!(session.ledger.coins, 0);
                assert!((session.ledger.oxygen - 46.0).abs() < f32::EPSILON);
                assert!(session.ledger.pollution > 50.0);
            }
        }
    }

    #[test]
    fn banked_shield_absorbs_the_red_penalty() {
        let mut session = quiet_session(BoardConfig::default());
        session.ledger.add_shields(1);
        session.ledger.add_coins(4);
        let before_oxygen = session.ledger.oxygen;
        // The trigger draw is random; the first triggered hazard must absorb.
        for _ in 0..32 {
            match session.resolve_red_hazard() {
                HazardOutcome::Spared => {}
                HazardOutcome::Absorbed => {
                    assert_eq!(session.ledger.shields, 0);
                    assert!((session.ledger.oxygen - before_oxygen).abs() < f32::EPSILON);
                    return;
                }
                HazardOutcome::Penalized { .. } => {
                    assert_eq!(session.ledger.shields, 0, "penalty only after absorb");
                }
            }
        }
    }

    #[test]
    fn human_energy_guard_holds_near_the_goal() {
        let mut session = quiet_session(BoardConfig::default());
        session.ledger.energy = 1;
        session.players[0].position = 94;
        session.forced_die = Some(2);

        let handle = session.begin_turn(PlayerId::Human).expect("begin");
        let signals = session.play_out(&handle).expect("play");

        assert!(signals.contains(&TurnSignal::DiceRolled {
            value: 2,
            energy_bonus: 0,
        }));
        assert_eq!(session.ledger.energy, 1);
        assert_eq!(session.players[0].position, 96);
    }

    #[test]
    fn human_spends_energy_below_the_guard() {
        let mut session = quiet_session(BoardConfig::default());
        session.ledger.energy = 1;
        session.players[0].position = 50;
        session.forced_die = Some(2);

        let handle = session.begin_turn(PlayerId::Human).expect("begin");
        let signals = session.play_out(&handle).expect("play");

        assert!(signals.contains(&TurnSignal::DiceRolled {
            value: 2,
            energy_bonus: 2,
        }));
        assert_eq!(session.ledger.energy, 0);
        assert_eq!(session.players[0].position, 54);
    }

    #[test]
    fn fact_gate_repeats_until_acknowledged() {
        let mut session = GameSession::new(
            board(BoardConfig::default()),
            FactData::default_data(),
            SessionConfig::default(),
        );
        session.ledger.energy = 0;

        let handle = session.begin_turn(PlayerId::Human).expect("begin");
        let first = session.advance(&handle).expect("advance");
        let TurnSignal::FactGate {
            auto_dismiss_ms, ..
        } = &first
        else {
            panic!("expected fact gate, got {first:?}");
        };
        assert_eq!(auto_dismiss_ms, &None, "human gate never auto-dismisses");

        let again = session.advance(&handle).expect("advance");
        assert_eq!(again, first, "gate repeats the same card");
        // The cursor advanced exactly once for this turn.
        assert_eq!(session.scheduler.cursor(PlayerId::Human).count, 1);

        session.acknowledge_fact(&handle).expect("acknowledge");
        assert_eq!(
            session.acknowledge_fact(&handle),
            Err(TurnError::NoFactPending)
        );
        assert!(matches!(
            session.advance(&handle),
            Ok(TurnSignal::DiceRolled { .. })
        ));
    }

    #[test]
    fn ai_fact_gate_carries_the_auto_dismiss_hint() {
        let mut session = GameSession::new(
            board(BoardConfig::default()),
            FactData::default_data(),
            SessionConfig::default(),
        );
        session.ledger.energy = 0;

        let handle = session.begin_turn(PlayerId::Human).expect("begin");
        session.play_out(&handle).expect("human turn");

        let handle = session.begin_turn(PlayerId::Ai).expect("begin ai");
        let gate = session.advance(&handle).expect("advance");
        assert!(matches!(
            gate,
            TurnSignal::FactGate {
                auto_dismiss_ms: Some(3_000),
                ..
            }
        ));
    }
}
