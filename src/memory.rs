use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scheduler::{Scheduler, TaskHandle};

/// How long a missed pair stays visible before flipping back down.
pub const REVERT_DELAY_MS: u64 = 800;
/// Interval of the elapsed-time tick.
pub const TICK_INTERVAL_MS: u64 = 1_000;

pub const BASE_SCORE: u32 = 100;
pub const MOVE_PENALTY: u32 = 2;
pub const TIME_PENALTY: u32 = 1;
/// Seconds below which no time penalty applies.
pub const GRACE_PERIOD_SECS: u32 = 30;

/// Card faces used when the caller has no alphabet of its own.
pub const DEFAULT_ALPHABET: [char; 12] = [
    '😊', '😎', '🥳', '😍', '🤔', '😴', '🌞', '🌈', '🌻', '🦋', '🐢', '🦉',
];
pub const DEFAULT_PAIR_COUNT: usize = 6;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("pair count must be at least 1")]
    ZeroPairCount,
    #[error("alphabet has {available} symbols, {needed} needed")]
    AlphabetTooSmall { needed: usize, available: usize },
    #[error("alphabet repeats symbol {0:?}")]
    DuplicateSymbol(char),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Card {
    pub symbol: char,
    pub face_up: bool,
    pub matched: bool,
}

/// Card as shown to the player: the symbol is hidden while face-down.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CardView {
    pub symbol: Option<char>,
    pub face_up: bool,
    pub matched: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    NotStarted,
    Running,
    Evaluating,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum SessionEvent {
    Started,
    CardFlipped { index: usize },
    PairMatched { first: usize, second: usize },
    PairMissed { first: usize, second: usize },
    PairReverted { first: usize, second: usize },
    Completed { score: u32 },
}

/// Matching-game session state machine. Pure: no clocks or timers
/// inside, the caller (or [`MemoryGame`]) drives `tick` and the
/// delayed revert of a missed pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    cards: Vec<Card>,
    pair_count: usize,
    moves: u32,
    elapsed_secs: u32,
    face_up: Vec<usize>,
    phase: Phase,
    score: Option<u32>,
}

impl Session {
    /// Build a session of `2 * pair_count` cards, each of the first
    /// `pair_count` alphabet symbols appearing exactly twice, in a
    /// uniformly random permutation.
    pub fn new(
        alphabet: &[char],
        pair_count: usize,
        rng: &mut impl Rng,
    ) -> Result<Self, ConfigError> {
        if pair_count == 0 {
            return Err(ConfigError::ZeroPairCount);
        }
        if alphabet.len() < pair_count {
            return Err(ConfigError::AlphabetTooSmall {
                needed: pair_count,
                available: alphabet.len(),
            });
        }
        let mut seen = HashSet::new();
        for &symbol in alphabet {
            if !seen.insert(symbol) {
                return Err(ConfigError::DuplicateSymbol(symbol));
            }
        }

        let mut cards: Vec<Card> = alphabet[..pair_count]
            .iter()
            .flat_map(|&symbol| {
                let card = Card {
                    symbol,
                    face_up: false,
                    matched: false,
                };
                [card, card]
            })
            .collect();
        // Fisher-Yates
        cards.shuffle(rng);

        Ok(Self {
            cards,
            pair_count,
            moves: 0,
            elapsed_secs: 0,
            face_up: Vec::new(),
            phase: Phase::NotStarted,
            score: None,
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn moves(&self) -> u32 {
        self.moves
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.elapsed_secs
    }

    pub fn pair_count(&self) -> usize {
        self.pair_count
    }

    /// Final score, present once the session has completed.
    pub fn score(&self) -> Option<u32> {
        self.score
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.phase, Phase::Completed)
    }

    pub fn cards(&self) -> Vec<CardView> {
        self.cards
            .iter()
            .map(|card| CardView {
                symbol: (card.face_up || card.matched).then_some(card.symbol),
                face_up: card.face_up,
                matched: card.matched,
            })
            .collect()
    }

    /// Turn a card face up. Illegal flips are silently ignored: a pair
    /// awaiting its revert, a finished session, an out-of-range index,
    /// or a card that is already face-up or matched. The first accepted
    /// flip moves the session into `Running`.
    pub fn flip(&mut self, index: usize) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        if matches!(self.phase, Phase::Evaluating | Phase::Completed) {
            return events;
        }
        let Some(card) = self.cards.get(index) else {
            return events;
        };
        if card.face_up || card.matched || self.face_up.len() >= 2 {
            return events;
        }

        if matches!(self.phase, Phase::NotStarted) {
            self.phase = Phase::Running;
            events.push(SessionEvent::Started);
        }

        self.cards[index].face_up = true;
        self.face_up.push(index);
        events.push(SessionEvent::CardFlipped { index });

        if self.face_up.len() == 2 {
            let (first, second) = (self.face_up[0], self.face_up[1]);
            self.moves += 1;
            if self.cards[first].symbol == self.cards[second].symbol {
                self.cards[first].matched = true;
                self.cards[second].matched = true;
                self.face_up.clear();
                events.push(SessionEvent::PairMatched { first, second });
                if self.cards.iter().all(|card| card.matched) {
                    let score = self.compute_score();
                    self.score = Some(score);
                    self.phase = Phase::Completed;
                    events.push(SessionEvent::Completed { score });
                }
            } else {
                self.phase = Phase::Evaluating;
                events.push(SessionEvent::PairMissed { first, second });
            }
        }

        events
    }

    /// Flip a missed pair back down after its visible delay. No-op
    /// outside the evaluating phase.
    pub fn resolve_missed_pair(&mut self) -> Vec<SessionEvent> {
        if !matches!(self.phase, Phase::Evaluating) {
            return Vec::new();
        }
        let (first, second) = (self.face_up[0], self.face_up[1]);
        for &index in &self.face_up {
            self.cards[index].face_up = false;
        }
        self.face_up.clear();
        self.phase = Phase::Running;
        vec![SessionEvent::PairReverted { first, second }]
    }

    /// Advance elapsed time by one second while the session is active.
    pub fn tick(&mut self) {
        if matches!(self.phase, Phase::Running | Phase::Evaluating) {
            self.elapsed_secs += 1;
        }
    }

    fn compute_score(&self) -> u32 {
        let move_penalty = MOVE_PENALTY * self.moves.saturating_sub(self.pair_count as u32);
        let time_penalty = TIME_PENALTY * self.elapsed_secs.saturating_sub(GRACE_PERIOD_SECS);
        BASE_SCORE
            .saturating_sub(move_penalty)
            .saturating_sub(time_penalty)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimedTask {
    Tick { generation: u64 },
    RevertPair { generation: u64 },
}

/// Session driver: owns the scheduler that fires the one-second tick
/// and the delayed revert of a missed pair. Timed tasks carry the
/// generation of the session they were scheduled for, so a callback
/// outliving a `reset` can never mutate the superseding session.
pub struct MemoryGame {
    session: Session,
    scheduler: Scheduler<TimedTask>,
    generation: u64,
    tick_task: Option<TaskHandle>,
    alphabet: Vec<char>,
    pair_count: usize,
}

impl MemoryGame {
    /// Passing a seed gives a reproducible deal; `None` draws one from
    /// entropy.
    pub fn new(alphabet: &[char], pair_count: usize, seed: Option<u64>) -> Result<Self, ConfigError> {
        let mut rng = seeded_rng(seed);
        let session = Session::new(alphabet, pair_count, &mut rng)?;
        Ok(Self {
            session,
            scheduler: Scheduler::new(),
            generation: 0,
            tick_task: None,
            alphabet: alphabet.to_vec(),
            pair_count,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn cards(&self) -> Vec<CardView> {
        self.session.cards()
    }

    pub fn flip(&mut self, index: usize) -> Vec<SessionEvent> {
        let events = self.session.flip(index);
        for event in &events {
            match event {
                SessionEvent::Started => {
                    let handle = self.scheduler.schedule_repeating(
                        TICK_INTERVAL_MS,
                        TimedTask::Tick {
                            generation: self.generation,
                        },
                    );
                    self.tick_task = Some(handle);
                }
                SessionEvent::PairMissed { .. } => {
                    self.scheduler.schedule(
                        REVERT_DELAY_MS,
                        TimedTask::RevertPair {
                            generation: self.generation,
                        },
                    );
                }
                SessionEvent::Completed { .. } => self.stop_ticking(),
                _ => {}
            }
        }
        events
    }

    /// Move wall-clock time forward, dispatching any timer work that
    /// came due. Returns the session events that work produced.
    pub fn advance(&mut self, ms: u64) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        for task in self.scheduler.advance(ms) {
            match task {
                TimedTask::Tick { generation } if generation == self.generation => {
                    self.session.tick();
                }
                TimedTask::RevertPair { generation } if generation == self.generation => {
                    events.extend(self.session.resolve_missed_pair());
                }
                // Stale task from a superseded session.
                _ => {}
            }
        }
        events
    }

    /// Discard the session and deal a fresh one. Pending timer work is
    /// cancelled and the generation bumped, so anything already in
    /// flight is dropped on arrival.
    pub fn reset(&mut self, seed: Option<u64>) -> Result<(), ConfigError> {
        let mut rng = seeded_rng(seed);
        let session = Session::new(&self.alphabet, self.pair_count, &mut rng)?;
        self.generation += 1;
        self.scheduler.clear();
        self.tick_task = None;
        self.session = session;
        Ok(())
    }

    fn stop_ticking(&mut self) {
        if let Some(handle) = self.tick_task.take() {
            self.scheduler.cancel(handle);
        }
    }
}

fn seeded_rng(seed: Option<u64>) -> ChaCha8Rng {
    seed.map(ChaCha8Rng::seed_from_u64)
        .unwrap_or_else(ChaCha8Rng::from_entropy)
}
