//! Activity engines for a mental-wellness app.
//!
//! Two self-contained, timer-driven exercises feed completion scores
//! back to the surrounding application:
//!
//! - [`memory`] — the memory-match mini-game: a shuffled deck of paired
//!   symbols, flip legality, pair evaluation with a visible revert
//!   delay, move and elapsed-time tracking, and a clamped 0-100 score.
//! - [`relax`] — the color-breathing relaxation exercise: a paused or
//!   breathing timer with minimum and automatic completion thresholds,
//!   plus the fade oscillator that drives its animation.
//!
//! Both run single-threaded on the deterministic [`scheduler`]; time
//! only moves when the caller pumps it, so every behavior here is
//! reproducible in tests. Decks are dealt with a seedable ChaCha8 RNG
//! for the same reason.

pub mod memory;
pub mod relax;
pub mod scheduler;

pub use memory::{
    Card, CardView, ConfigError, MemoryGame, Phase, Session, SessionEvent, DEFAULT_ALPHABET,
    DEFAULT_PAIR_COUNT, GRACE_PERIOD_SECS, REVERT_DELAY_MS, TICK_INTERVAL_MS,
};
pub use relax::{BreathCycle, BreathPhase, RelaxEvent, RelaxSession};
pub use scheduler::{Scheduler, TaskHandle};
