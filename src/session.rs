//! The session controller: owns the board, players, ledger and scheduler as
//! one explicit value, and admits turns through an epoch-stamped handle.
//!
//! Cancellation model: `reset` bumps the session epoch. Every handle minted
//! before the reset becomes stale, and any call made through a stale handle
//! fails with [`TurnError::StaleHandle`] before touching state. A host timer
//! that fires after a reset therefore cannot mutate the new game.

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::dice::DiceProfile;
use crate::event::{Event, EventId, EventKind, EventSeverity, TurnTagSet, turn_tags};
use crate::facts::{FactData, FactScheduler};
use crate::ledger::ResourceLedger;
use crate::player::{Cosmetics, Player, PlayerId};
use crate::rng::RngBundle;
use crate::timing::TimingProfile;
use crate::turn::{TurnError, TurnMachine, TurnPhase, TurnSignal};

const COIN_POINTS: u32 = 10;
const OXYGEN_POINTS: u32 = 2;
const MILESTONE_POINTS: u32 = 15;

/// Immutable-per-game settings chosen at session creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub seed: u64,
    pub dice_profile: DiceProfile,
    pub kid_mode: bool,
    pub quiz_mode: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            dice_profile: DiceProfile::Normal,
            kid_mode: false,
            quiz_mode: true,
        }
    }
}

/// Capability to drive the turn minted by `begin_turn`. Stamped with the
/// session epoch; a reset invalidates every outstanding handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnHandle {
    epoch: u64,
}

/// Final outcome payload carried by [`TurnSignal::GameOver`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameCompleted {
    pub winner: PlayerId,
    pub winner_name: String,
    pub is_player_win: bool,
    pub coins: u32,
    pub oxygen: f32,
    pub points: u32,
}

/// Counters surfaced for the host's end-of-game summary screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub human_turns: u32,
    pub ai_turns: u32,
    pub facts_learned: usize,
    pub milestones_collected: u32,
}

/// One full game between the human seat and the AI seat.
#[derive(Debug)]
pub struct GameSession {
    pub(crate) board: Board,
    pub(crate) players: [Player; 2],
    pub(crate) ledger: ResourceLedger,
    pub(crate) scheduler: FactScheduler,
    pub(crate) rng: RngBundle,
    pub(crate) config: SessionConfig,
    pub(crate) current: PlayerId,
    pub(crate) epoch: u64,
    pub(crate) turn_counter: u32,
    event_seq: u16,
    pub(crate) active_turn: Option<TurnMachine>,
    pub(crate) completed: Option<GameCompleted>,
    pub(crate) milestones_collected: u32,
    /// Presentation log keys in emission order; rendering belongs to the host.
    pub logs: Vec<String>,
    events: Vec<Event>,
    #[cfg(test)]
    pub(crate) forced_die: Option<u8>,
}

impl GameSession {
    #[must_use]
    pub fn new(board: Board, facts: FactData, config: SessionConfig) -> Self {
        let mut session = Self {
            board,
            players: [Player::new(PlayerId::Human), Player::new(PlayerId::Ai)],
            ledger: ResourceLedger::default(),
            scheduler: FactScheduler::new(facts),
            rng: RngBundle::from_user_seed(config.seed),
            config,
            current: PlayerId::Human,
            epoch: 0,
            turn_counter: 0,
            event_seq: 0,
            active_turn: None,
            completed: None,
            milestones_collected: 0,
            logs: Vec::new(),
            events: Vec::new(),
            #[cfg(test)]
            forced_die: None,
        };
        session.push_event(
            EventKind::SessionInitialized,
            EventSeverity::Info,
            turn_tags(&["session"]),
            serde_json::json!({ "seed": config.seed }),
        );
        session
    }

    /// Session on the compiled-in board and fact set.
    #[must_use]
    pub fn with_defaults(config: SessionConfig) -> Self {
        Self::new(Board::default_board(), FactData::default_data(), config)
    }

    /// Return the session to its initial state, invalidating every
    /// outstanding [`TurnHandle`]. Cosmetics survive; everything else,
    /// including the RNG streams, is re-derived from the configured seed.
    pub fn reset(&mut self) {
        self.epoch += 1;
        self.active_turn = None;
        self.completed = None;
        self.rng = RngBundle::from_user_seed(self.config.seed);
        for player in &mut self.players {
            player.reset();
        }
        self.ledger = ResourceLedger::default();
        self.scheduler.reset();
        self.current = PlayerId::Human;
        self.turn_counter = 0;
        self.event_seq = 0;
        self.milestones_collected = 0;
        self.logs.clear();
        self.events.clear();
        self.push_log("log.session.reset");
        self.push_event(
            EventKind::SessionReset,
            EventSeverity::Info,
            turn_tags(&["session"]),
            serde_json::Value::Null,
        );
    }

    /// Admit a new turn for `seat`.
    ///
    /// # Errors
    ///
    /// [`TurnError::GameOver`] once the game is complete,
    /// [`TurnError::TurnInProgress`] while another turn is being resolved,
    /// and [`TurnError::OutOfTurn`] when it is not `seat`'s turn.
    pub fn begin_turn(&mut self, seat: PlayerId) -> Result<TurnHandle, TurnError> {
        if self.completed.is_some() {
            return Err(TurnError::GameOver);
        }
        if self.active_turn.is_some() {
            return Err(TurnError::TurnInProgress);
        }
        if seat != self.current {
            return Err(TurnError::OutOfTurn {
                expected: self.current,
            });
        }
        self.turn_counter += 1;
        self.event_seq = 0;
        self.players[seat.index()].turns_taken += 1;
        self.push_log("log.turn.start");

        let gate = if self.config.quiz_mode && self.scheduler.has_facts() {
            let card = self.scheduler.next_fact(seat);
            if let Some(card) = &card {
                self.push_event(
                    EventKind::FactShown,
                    EventSeverity::Info,
                    turn_tags(&["fact", card.category.as_str()]),
                    serde_json::json!({ "id": card.fact.id, "player": seat.as_str() }),
                );
            }
            card
        } else {
            None
        };
        self.active_turn = Some(TurnMachine::new(seat, gate));
        Ok(TurnHandle { epoch: self.epoch })
    }

    /// Drive the active turn to its next suspension point.
    ///
    /// # Errors
    ///
    /// [`TurnError::StaleHandle`] when the session was reset after the handle
    /// was minted, [`TurnError::GameOver`] after completion, and
    /// [`TurnError::NoActiveTurn`] when no turn is being resolved.
    pub fn advance(&mut self, handle: &TurnHandle) -> Result<TurnSignal, TurnError> {
        self.check_handle(handle)?;
        let Some(mut machine) = self.active_turn.take() else {
            return Err(if self.completed.is_some() {
                TurnError::GameOver
            } else {
                TurnError::NoActiveTurn
            });
        };
        let result = self.step_machine(&mut machine);
        if machine.phase != TurnPhase::Complete {
            self.active_turn = Some(machine);
        }
        result
    }

    /// Dismiss the fact gate blocking the active turn.
    ///
    /// # Errors
    ///
    /// [`TurnError::StaleHandle`] for handles from before a reset and
    /// [`TurnError::NoFactPending`] when no gate is waiting.
    pub fn acknowledge_fact(&mut self, handle: &TurnHandle) -> Result<(), TurnError> {
        self.check_handle(handle)?;
        let acknowledged = self
            .active_turn
            .as_mut()
            .is_some_and(TurnMachine::acknowledge);
        if acknowledged {
            self.push_event(
                EventKind::FactAcknowledged,
                EventSeverity::Info,
                turn_tags(&["fact"]),
                serde_json::Value::Null,
            );
            Ok(())
        } else {
            Err(TurnError::NoFactPending)
        }
    }

    /// Drain the active turn, acknowledging fact gates as they appear, and
    /// return every signal it produced. The last signal is always
    /// [`TurnSignal::TurnEnded`] or [`TurnSignal::GameOver`].
    ///
    /// # Errors
    ///
    /// Propagates the first error from [`Self::advance`] or
    /// [`Self::acknowledge_fact`].
    pub fn play_out(&mut self, handle: &TurnHandle) -> Result<Vec<TurnSignal>, TurnError> {
        let mut signals = Vec::new();
        loop {
            let signal = self.advance(handle)?;
            match &signal {
                TurnSignal::FactGate { .. } => {
                    self.acknowledge_fact(handle)?;
                    signals.push(signal);
                }
                TurnSignal::GameOver(_) | TurnSignal::TurnEnded { .. } => {
                    signals.push(signal);
                    return Ok(signals);
                }
                _ => signals.push(signal),
            }
        }
    }

    pub fn set_dice_profile(&mut self, profile: DiceProfile) {
        self.config.dice_profile = profile;
    }

    pub fn set_kid_mode(&mut self, kid_mode: bool) {
        self.config.kid_mode = kid_mode;
    }

    pub fn set_quiz_mode(&mut self, quiz_mode: bool) {
        self.config.quiz_mode = quiz_mode;
    }

    /// Cosmetics never feed game logic, so this is allowed mid-turn.
    pub fn customize_human(&mut self, cosmetics: Cosmetics) {
        self.players[PlayerId::Human.index()].cosmetics = cosmetics;
    }

    #[must_use]
    pub fn player(&self, id: PlayerId) -> &Player {
        &self.players[id.index()]
    }

    /// Seat whose turn it is (or would be next).
    #[must_use]
    pub const fn current_turn(&self) -> PlayerId {
        self.current
    }

    /// True while a turn is mid-resolution; new turns are refused.
    #[must_use]
    pub const fn is_animating(&self) -> bool {
        self.active_turn.is_some()
    }

    #[must_use]
    pub const fn board(&self) -> &Board {
        &self.board
    }

    #[must_use]
    pub const fn ledger(&self) -> &ResourceLedger {
        &self.ledger
    }

    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub const fn completed(&self) -> Option<&GameCompleted> {
        self.completed.as_ref()
    }

    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    #[must_use]
    pub const fn timing(&self) -> TimingProfile {
        TimingProfile::for_kid_mode(self.config.kid_mode)
    }

    #[must_use]
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            human_turns: self.players[PlayerId::Human.index()].turns_taken,
            ai_turns: self.players[PlayerId::Ai.index()].turns_taken,
            facts_learned: self.scheduler.learned_count(),
            milestones_collected: self.milestones_collected,
        }
    }

    pub(crate) fn build_completion(&self, winner: PlayerId) -> GameCompleted {
        let coins = self.ledger.coins;
        let oxygen = self.ledger.oxygen;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let oxygen_points = oxygen.round().max(0.0) as u32;
        let points = coins * COIN_POINTS
            + oxygen_points * OXYGEN_POINTS
            + self.milestones_collected * MILESTONE_POINTS;
        GameCompleted {
            winner,
            winner_name: self.players[winner.index()].cosmetics.name.clone(),
            is_player_win: !winner.is_ai(),
            coins,
            oxygen,
            points,
        }
    }

    pub(crate) fn record_reward_failure(&mut self, error: &anyhow::Error) {
        self.push_log("log.reward.failed");
        self.push_event(
            EventKind::RewardDeliveryFailed,
            EventSeverity::Warning,
            turn_tags(&["reward"]),
            serde_json::json!({ "error": error.to_string() }),
        );
    }

    pub(crate) fn push_log(&mut self, key: impl Into<String>) {
        self.logs.push(key.into());
    }

    pub(crate) fn push_event(
        &mut self,
        kind: EventKind,
        severity: EventSeverity,
        tags: TurnTagSet,
        payload: serde_json::Value,
    ) {
        let id = EventId::new(self.turn_counter, self.event_seq);
        self.event_seq = self.event_seq.saturating_add(1);
        self.events.push(Event::new(id, kind, severity, tags, payload));
    }

    const fn check_handle(&self, handle: &TurnHandle) -> Result<(), TurnError> {
        if handle.epoch == self.epoch {
            Ok(())
        } else {
            Err(TurnError::StaleHandle)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::FIRST_TILE;

    fn run_to_completion(mut session: GameSession) -> GameSession {
        for _ in 0..2_000 {
            if session.completed.is_some() {
                return session;
            }
            let seat = session.current;
            let handle = session.begin_turn(seat).expect("begin");
            session.play_out(&handle).expect("play");
        }
        panic!("game did not complete");
    }

    #[test]
    fn turns_strictly_alternate() {
        let mut session = GameSession::with_defaults(SessionConfig::default());
        assert_eq!(
            session.begin_turn(PlayerId::Ai),
            Err(TurnError::OutOfTurn {
                expected: PlayerId::Human
            })
        );
        let handle = session.begin_turn(PlayerId::Human).expect("begin");
        assert_eq!(
            session.begin_turn(PlayerId::Human),
            Err(TurnError::TurnInProgress)
        );
        session.play_out(&handle).expect("play");
        assert!(!session.is_animating());
        if session.completed.is_none() {
            assert_eq!(session.current_turn(), PlayerId::Ai);
        }
    }

    #[test]
    fn reset_invalidates_handles_without_mutating() {
        let mut session = GameSession::with_defaults(SessionConfig::default());
        let handle = session.begin_turn(PlayerId::Human).expect("begin");
        session.advance(&handle).expect("gate");
        session.acknowledge_fact(&handle).expect("acknowledge");
        session.advance(&handle).expect("roll");

        session.reset();
        assert_eq!(session.player(PlayerId::Human).position, FIRST_TILE);

        assert_eq!(session.advance(&handle), Err(TurnError::StaleHandle));
        assert_eq!(
            session.acknowledge_fact(&handle),
            Err(TurnError::StaleHandle)
        );
        assert_eq!(session.player(PlayerId::Human).position, FIRST_TILE);
        assert_eq!(session.ledger().coins, 0);
        assert!(!session.is_animating());

        // A fresh handle works against the reset session.
        let handle = session.begin_turn(PlayerId::Human).expect("begin");
        session.play_out(&handle).expect("play");
    }

    #[test]
    fn quiz_mode_off_skips_the_fact_gate() {
        let config = SessionConfig {
            quiz_mode: false,
            ..SessionConfig::default()
        };
        let mut session = GameSession::with_defaults(config);
        let handle = session.begin_turn(PlayerId::Human).expect("begin");
        let first = session.advance(&handle).expect("advance");
        assert!(matches!(first, TurnSignal::DiceRolled { .. }));
        assert_eq!(session.scheduler.cursor(PlayerId::Human).count, 0);
    }

    #[test]
    fn full_game_completes_and_replays_deterministically() {
        let config = SessionConfig {
            seed: 42,
            ..SessionConfig::default()
        };
        let first = run_to_completion(GameSession::with_defaults(config));
        let second = run_to_completion(GameSession::with_defaults(config));

        assert_eq!(first.logs, second.logs);
        assert_eq!(first.completed, second.completed);
        assert_eq!(first.ledger, second.ledger);
        assert_eq!(first.summary(), second.summary());

        let completed = first.completed.expect("completed");
        assert_eq!(
            completed.winner,
            first.players.iter().find(|p| p.position == 100).expect("winner").id
        );
    }

    #[test]
    fn summary_tracks_turns_and_milestones() {
        let session = run_to_completion(GameSession::with_defaults(SessionConfig {
            seed: 7,
            ..SessionConfig::default()
        }));
        let summary = session.summary();
        assert!(summary.human_turns > 0);
        assert!(summary.ai_turns > 0);
        assert!(summary.facts_learned > 0);
        assert!(summary.milestones_collected > 0);
        assert_eq!(
            summary.human_turns,
            session.player(PlayerId::Human).turns_taken
        );
    }

    #[test]
    fn cosmetics_change_mid_turn_without_touching_state() {
        let mut session = GameSession::with_defaults(SessionConfig::default());
        let handle = session.begin_turn(PlayerId::Human).expect("begin");
        session.advance(&handle).expect("gate");

        session.customize_human(Cosmetics {
            name: String::from("Sam"),
            avatar: String::from("avatar.turtle"),
            color: String::from("#ffaa00"),
        });
        assert_eq!(session.player(PlayerId::Human).cosmetics.name, "Sam");

        session.acknowledge_fact(&handle).expect("acknowledge");
        session.play_out(&handle).expect("play");
        assert_eq!(session.player(PlayerId::Human).cosmetics.name, "Sam");
    }

    #[test]
    fn events_carry_turn_scoped_ids() {
        let mut session = GameSession::with_defaults(SessionConfig::default());
        let handle = session.begin_turn(PlayerId::Human).expect("begin");
        session.play_out(&handle).expect("play");

        let turn_events: Vec<&Event> = session
            .events()
            .iter()
            .filter(|event| event.id.turn == 1)
            .collect();
        assert!(!turn_events.is_empty());
        for (seq, event) in turn_events.iter().enumerate() {
            assert_eq!(usize::from(event.id.seq), seq);
        }
    }
}
