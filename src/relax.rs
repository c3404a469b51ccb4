use serde::{Deserialize, Serialize};

/// Seconds of breathing required before the exercise may be completed
/// manually.
pub const MIN_COMPLETE_SECS: u32 = 30;
/// Seconds after which the exercise completes on its own.
pub const AUTO_COMPLETE_SECS: u32 = 60;
/// Fade change per millisecond of the breathing animation.
pub const FADE_RATE_PER_MS: f32 = 0.0005;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BreathPhase {
    Idle,
    Breathing,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum RelaxEvent {
    Completed { seconds: u32 },
}

/// Color-breathing relaxation exercise. The caller ticks it once per
/// second while breathing is active; completion is signalled exactly
/// once, either automatically at [`AUTO_COMPLETE_SECS`] or manually
/// once [`MIN_COMPLETE_SECS`] have accumulated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RelaxSession {
    seconds: u32,
    phase: BreathPhase,
}

impl RelaxSession {
    pub fn new() -> Self {
        Self {
            seconds: 0,
            phase: BreathPhase::Idle,
        }
    }

    pub fn seconds(&self) -> u32 {
        self.seconds
    }

    pub fn phase(&self) -> BreathPhase {
        self.phase
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.phase, BreathPhase::Completed)
    }

    /// Begin (or resume) breathing. Ignored once completed.
    pub fn start(&mut self) {
        if matches!(self.phase, BreathPhase::Idle) {
            self.phase = BreathPhase::Breathing;
        }
    }

    /// Pause breathing; accumulated time is kept.
    pub fn pause(&mut self) {
        if matches!(self.phase, BreathPhase::Breathing) {
            self.phase = BreathPhase::Idle;
        }
    }

    /// Advance one second of breathing. Ignored while paused or after
    /// completion.
    pub fn tick(&mut self) -> Vec<RelaxEvent> {
        if !matches!(self.phase, BreathPhase::Breathing) {
            return Vec::new();
        }
        self.seconds += 1;
        if self.seconds >= AUTO_COMPLETE_SECS {
            return self.complete();
        }
        Vec::new()
    }

    /// Finish the exercise early. Rejected (no event, no state change)
    /// until the minimum duration has accumulated.
    pub fn try_complete(&mut self) -> Vec<RelaxEvent> {
        if matches!(self.phase, BreathPhase::Completed) || self.seconds < MIN_COMPLETE_SECS {
            return Vec::new();
        }
        self.complete()
    }

    fn complete(&mut self) -> Vec<RelaxEvent> {
        self.phase = BreathPhase::Completed;
        vec![RelaxEvent::Completed {
            seconds: self.seconds,
        }]
    }
}

impl Default for RelaxSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Fade oscillator behind the breathing animation: a value bouncing
/// between 0.0 and 1.0 at [`FADE_RATE_PER_MS`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BreathCycle {
    value: f32,
    direction: f32,
}

impl BreathCycle {
    pub fn new() -> Self {
        Self {
            value: 0.0,
            direction: 1.0,
        }
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    /// Advance the oscillator by `delta_ms`, reversing direction at the
    /// bounds, and return the new value.
    pub fn advance(&mut self, delta_ms: u32) -> f32 {
        let next = self.value + self.direction * FADE_RATE_PER_MS * delta_ms as f32;
        if next > 1.0 {
            self.value = 1.0;
            self.direction = -1.0;
        } else if next < 0.0 {
            self.value = 0.0;
            self.direction = 1.0;
        } else {
            self.value = next;
        }
        self.value
    }
}

impl Default for BreathCycle {
    fn default() -> Self {
        Self::new()
    }
}
