//! Structured simulation events emitted by the turn machine.
//!
//! Log keys on the session remain the lightweight presentation hints; events
//! carry the mechanical record with a structured payload for downstream
//! rendering and debugging.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Maximum tag capacity stored inline without additional allocations.
pub type TurnTagSet = SmallVec<[TurnTag; 4]>;

/// Tag describing why an event ended up in its recorded state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TurnTag(pub String);

impl TurnTag {
    /// Construct a tag from a string slice, trimming whitespace.
    #[must_use]
    pub fn new(value: &str) -> Self {
        Self(value.trim().to_string())
    }

    /// Returns true when the tag has no visible characters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

/// Build a tag set from string slices.
#[must_use]
pub fn turn_tags(values: &[&str]) -> TurnTagSet {
    values.iter().map(|value| TurnTag::new(value)).collect()
}

/// Stable, deterministic identifier for a single event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId {
    /// One-based turn counter when the event occurred.
    pub turn: u32,
    /// Per-turn sequence number (0-based) within the emitted event stream.
    pub seq: u16,
}

impl EventId {
    #[must_use]
    pub const fn new(turn: u32, seq: u16) -> Self {
        Self { turn, seq }
    }
}

/// Mechanical event kind emitted by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    SessionInitialized,
    SessionReset,
    FactShown,
    FactAcknowledged,
    DiceRolled,
    EnergySpent,
    StepAdvanced,
    PowerUpCollected,
    GreenReward,
    LadderClimbed,
    HazardResolved,
    SnakeSlide,
    ShieldBlocked,
    AmbientDecayApplied,
    MilestoneReached,
    GameCompleted,
    TurnEnded,
    RewardDeliveryFailed,
}

/// Severity tier for a simulation event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSeverity {
    Info,
    Warning,
    Critical,
}

/// Structured event emitted by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub kind: EventKind,
    pub severity: EventSeverity,
    /// Stable tags describing the event (e.g., `hazard`, `milestone`).
    #[serde(default)]
    pub tags: TurnTagSet,
    /// Optional structured payload for debugging and downstream rendering.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub payload: serde_json::Value,
}

impl Event {
    #[must_use]
    pub fn new(
        id: EventId,
        kind: EventKind,
        severity: EventSeverity,
        tags: TurnTagSet,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            id,
            kind,
            severity,
            tags,
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_roundtrips_and_has_stable_id() {
        let id = EventId::new(4, 2);
        let mut tags = TurnTagSet::new();
        tags.push(TurnTag::new("hazard"));
        let event = Event::new(
            id,
            EventKind::HazardResolved,
            EventSeverity::Warning,
            tags,
            serde_json::json!({ "tile": 37, "outcome": "absorbed" }),
        );

        let json = serde_json::to_string(&event).expect("serialize");
        let restored: Event = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(restored, event);
        assert_eq!(restored.id, id);
        assert_eq!(restored.payload["tile"], 37);
    }

    #[test]
    fn empty_tags_are_detected() {
        assert!(TurnTag::new("   ").is_empty());
        assert!(!TurnTag::new(" ladder ").is_empty());
    }
}
