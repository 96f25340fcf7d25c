use serde::{Deserialize, Serialize};

const STEP_MS: u32 = 350;
const EFFECT_PAUSE_MS: u32 = 450;
const AI_ROLL_DELAY_MS: u32 = 1_500;
const FACT_AUTO_DISMISS_MS: u32 = 3_000;
const KID_STEP_MS: u32 = 630;
const KID_EFFECT_PAUSE_MS: u32 = 810;

/// Millisecond delay hints attached to turn signals.
///
/// The engine never sleeps; a presentation host schedules real timers from
/// these values. Kid mode slows token movement and effect pauses only — the
/// AI auto-roll and fact auto-dismiss timers stay fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingProfile {
    pub step_ms: u32,
    pub effect_pause_ms: u32,
    pub ai_roll_delay_ms: u32,
    pub fact_auto_dismiss_ms: u32,
}

impl TimingProfile {
    pub const STANDARD: Self = Self {
        step_ms: STEP_MS,
        effect_pause_ms: EFFECT_PAUSE_MS,
        ai_roll_delay_ms: AI_ROLL_DELAY_MS,
        fact_auto_dismiss_ms: FACT_AUTO_DISMISS_MS,
    };

    pub const KID: Self = Self {
        step_ms: KID_STEP_MS,
        effect_pause_ms: KID_EFFECT_PAUSE_MS,
        ai_roll_delay_ms: AI_ROLL_DELAY_MS,
        fact_auto_dismiss_ms: FACT_AUTO_DISMISS_MS,
    };

    #[must_use]
    pub const fn for_kid_mode(kid_mode: bool) -> Self {
        if kid_mode { Self::KID } else { Self::STANDARD }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kid_mode_slows_movement_but_not_fixed_timers() {
        let standard = TimingProfile::for_kid_mode(false);
        let kid = TimingProfile::for_kid_mode(true);
        assert!(kid.step_ms > standard.step_ms);
        assert!(kid.effect_pause_ms > standard.effect_pause_ms);
        assert_eq!(kid.ai_roll_delay_ms, standard.ai_roll_delay_ms);
        assert_eq!(kid.fact_auto_dismiss_ms, standard.fact_auto_dismiss_ms);
    }
}
