//! Eco Ladders game engine.
//!
//! A deterministic, platform-agnostic simulation of the eco-themed
//! snakes-and-ladders learning game: a human and an AI seat alternate turns
//! on a 100-tile board, educational fact cards gate each roll, and landing
//! tiles resolve through a fixed effect pipeline into a shared resource
//! ledger. The crate owns the rules and the randomness; rendering, timers
//! and persistence belong to the host, which drives turns through the pull
//! API on [`GameSession`] and schedules real delays from the hints on each
//! [`TurnSignal`].
//!
//! Content and reward delivery are collaborator seams: a [`FactSource`]
//! provides the board layout and fact lists, and a [`RewardSink`] receives
//! the end-of-game award. [`EcoEngine`] wires the two around session
//! creation.

pub mod board;
pub mod dice;
pub mod event;
pub mod facts;
pub mod ledger;
pub mod player;
pub mod rng;
pub mod session;
pub mod timing;
pub mod turn;

pub use board::{Board, BoardConfig, BoardError, FIRST_TILE, LAST_TILE, Milestone, PowerUp};
pub use dice::DiceProfile;
pub use event::{Event, EventId, EventKind, EventSeverity, TurnTag, TurnTagSet};
pub use facts::{Fact, FactCard, FactCategory, FactData, FactScheduler, RewardBundle};
pub use ledger::ResourceLedger;
pub use player::{Cosmetics, Player, PlayerId};
pub use rng::RngBundle;
pub use session::{GameCompleted, GameSession, SessionConfig, SessionSummary, TurnHandle};
pub use timing::TimingProfile;
pub use turn::{EFFECT_ORDER, EffectOutcome, EffectStage, HazardOutcome, TurnError, TurnSignal};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Stable identifier reported with every reward award.
pub const GAME_ID: &str = "eco-ladders";
/// Human-readable game name reported with every reward award.
pub const GAME_NAME: &str = "Eco Ladders";

/// Provides board and fact content for new sessions.
pub trait FactSource {
    /// Load the fact lists.
    ///
    /// # Errors
    ///
    /// Returns an error when the content cannot be loaded or parsed.
    fn load_fact_data(&self) -> Result<FactData>;

    /// Load the board layout.
    ///
    /// # Errors
    ///
    /// Returns an error when the layout cannot be loaded or parsed.
    fn load_board(&self) -> Result<BoardConfig>;
}

/// Receives the end-of-game award payload.
pub trait RewardSink {
    /// Persist or forward one award.
    ///
    /// # Errors
    ///
    /// Returns an error when the award could not be delivered; the engine
    /// records the failure on the session and never rolls back game state.
    fn award(&mut self, award: &RewardAward) -> Result<()>;
}

/// End-of-game payload handed to the reward sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardAward {
    pub student_id: String,
    pub game_id: String,
    pub game_name: String,
    pub is_player_win: bool,
    pub points_earned: u32,
    pub coins_earned: u32,
}

/// Built-in source serving the compiled-in board and fact set.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultSource;

impl FactSource for DefaultSource {
    fn load_fact_data(&self) -> Result<FactData> {
        Ok(FactData::default_data())
    }

    fn load_board(&self) -> Result<BoardConfig> {
        Ok(BoardConfig::default_config())
    }
}

/// Wires a content source and a reward sink around game sessions.
pub struct EcoEngine<F: FactSource, R: RewardSink> {
    source: F,
    sink: R,
}

impl<F: FactSource, R: RewardSink> EcoEngine<F, R> {
    pub const fn new(source: F, sink: R) -> Self {
        Self { source, sink }
    }

    /// Build a session from the source's board and fact content.
    ///
    /// # Errors
    ///
    /// Returns an error when content loading fails or the board layout is
    /// invalid.
    pub fn create_session(&self, config: SessionConfig) -> Result<GameSession> {
        let layout = self.source.load_board().context("loading board layout")?;
        let board = Board::new(layout).context("validating board layout")?;
        let facts = self
            .source
            .load_fact_data()
            .context("loading fact data")?;
        Ok(GameSession::new(board, facts, config))
    }

    /// Deliver the end-of-game award for a completed session. Fire-and-forget:
    /// a sink failure is recorded on the session and never rolls back game
    /// state. Returns true when the award reached the sink.
    pub fn deliver_reward(&mut self, session: &mut GameSession, student_id: &str) -> bool {
        let Some(completed) = session.completed().cloned() else {
            return false;
        };
        let award = RewardAward {
            student_id: student_id.to_string(),
            game_id: GAME_ID.to_string(),
            game_name: GAME_NAME.to_string(),
            is_player_win: completed.is_player_win,
            points_earned: completed.points,
            coins_earned: completed.coins,
        };
        match self.sink.award(&award) {
            Ok(()) => true,
            Err(error) => {
                session.record_reward_failure(&error);
                false
            }
        }
    }
}
