//! WorldState: the complete snapshot of a running game.
//!
//! ## Authored vs. Runtime
//!
//! Two layers, like the level table and the table in play:
//!   - `levels` holds every authored `LevelSpec`. **Never mutated**
//!     after construction.
//!   - the active-level fields (`platforms`, `hazards`, `enemies`,
//!     `finish`, `start`) are runtime copies, rebuilt wholesale by
//!     `level::activate`.
//!
//! Enemies in particular are rebuilt from their authored specs on
//! every activation, so a respawn never inherits mid-patrol state.
//!
//! ## Progression
//!
//! `phase` plus an optional `PendingTransition` deadline record form
//! the whole state machine: `pending` is `Some` exactly while the
//! phase is not `Playing`, and the step function counts it down and
//! fires it. Outcome emissions while a transition is armed are
//! ignored by the handlers in `step`.
//!
//! ## Camera
//!
//! A horizontal world-pixel offset, derived from the player every
//! playing tick and zeroed on activation. The renderer subtracts it
//! when mapping world space to terminal cells.

use crate::config::TuningConfig;
use crate::domain::entity::{Enemy, Player};
use crate::domain::physics::Rect;

use super::level::LevelSpec;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Playing,
    /// Non-interactive wait after a death, a level clear, or a win.
    Transitioning,
    /// Non-interactive wait after the last life. Distinct from
    /// `Transitioning` only so the frontend can dress it differently;
    /// it resumes through the same pending record.
    GameOver,
}

/// What a deferred transition performs when its deadline expires.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PendingAction {
    /// Re-enter the current level after a death.
    Respawn,
    /// Enter the (already incremented) current level.
    Advance,
    /// Lives back to starting value, level 0 re-entered.
    RestartRun,
}

/// One-shot deferred transition. The machine holds at most one; it is
/// never replaced, only fired or cancelled by a manual restart.
#[derive(Clone, Copy, Debug)]
pub struct PendingTransition {
    pub action: PendingAction,
    pub remaining_ms: f32,
}

/// Horizontal viewport anchor in world pixels. Derived, not
/// authoritative: recomputed from the player each playing tick.
#[derive(Clone, Copy, Debug, Default)]
pub struct Camera {
    pub x: f32,
}

impl Camera {
    /// Keep the player `lead` pixels from the view's left edge, never
    /// scrolling past the world's left boundary.
    pub fn follow(&mut self, player_x: f32, lead: f32) {
        self.x = (player_x - lead).max(0.0);
    }

    pub fn reset(&mut self) {
        self.x = 0.0;
    }
}

pub struct WorldState {
    // ── Authored data ──
    /// Full level sequence. Never mutated after construction.
    pub levels: Vec<LevelSpec>,

    // ── Active level runtime ──
    pub platforms: Vec<Rect>,
    pub hazards: Vec<Rect>,
    pub enemies: Vec<Enemy>,
    pub finish: Rect,
    pub start: (f32, f32),

    // ── Entities ──
    pub player: Player,

    // ── Progression ──
    pub phase: Phase,
    pub pending: Option<PendingTransition>,
    pub lives: u32,
    pub current_level: usize,

    // ── Tuning ──
    pub tuning: TuningConfig,

    // ── Meta ──
    pub tick: u64,
    pub paused: bool,

    // ── UI ──
    pub camera: Camera,
    pub message: String,
    /// Remaining display time for a transient banner. 0 with a
    /// non-empty `message` means persistent: it stays until the
    /// transition that posted it clears it.
    pub message_timer_ms: f32,
}

impl WorldState {
    pub fn new(levels: Vec<LevelSpec>, tuning: TuningConfig) -> Self {
        let lives = tuning.starting_lives;
        WorldState {
            levels,
            platforms: vec![],
            hazards: vec![],
            enemies: vec![],
            finish: Rect::new(0.0, 0.0, 0.0, 0.0),
            start: (0.0, 0.0),
            player: Player::new(0.0, 0.0),
            phase: Phase::Playing,
            pending: None,
            lives,
            current_level: 0,
            tuning,
            tick: 0,
            paused: false,
            camera: Camera::default(),
            message: String::new(),
            message_timer_ms: 0.0,
        }
    }

    pub fn total_levels(&self) -> usize {
        self.levels.len()
    }

    /// True when the active level is the final one of the sequence.
    pub fn on_last_level(&self) -> bool {
        self.current_level + 1 >= self.levels.len()
    }

    /// Post a banner. `duration_ms` of 0 makes it persistent; anything
    /// else auto-hides after the duration.
    pub fn set_message(&mut self, msg: &str, duration_ms: f32) {
        self.message = msg.to_string();
        self.message_timer_ms = duration_ms;
    }

    pub fn clear_message(&mut self) {
        self.message.clear();
        self.message_timer_ms = 0.0;
    }

    /// Whether the current banner outlives the tick that posted it.
    pub fn message_is_persistent(&self) -> bool {
        !self.message.is_empty() && self.message_timer_ms == 0.0
    }
}
