//! Authored levels and level activation.
//!
//! Levels are an embedded table, not a loaded asset: every `LevelSpec`
//! is authored in code against the fixed design viewport below and
//! validated once at startup. The world never reads these templates
//! directly while playing; `activate` copies a level's geometry into
//! the runtime fields and spawns fresh enemies from the authored
//! specs.

use crate::domain::entity::EnemySpec;
use crate::domain::physics::Rect;

use super::world::{Phase, WorldState};

/// Design viewport the levels are authored against, in world pixels.
/// Player falls "off the world" when below `VIEW_H` plus the tuned
/// margin; the renderer maps this viewport onto the terminal grid.
pub const VIEW_W: f32 = 960.0;
pub const VIEW_H: f32 = 540.0;

/// Immutable authored level: the template every activation rebuilds
/// the runtime world from.
#[derive(Clone, Debug)]
pub struct LevelSpec {
    /// Solid geometry, in authored order (collision is first-match).
    pub platforms: Vec<Rect>,
    pub hazards: Vec<Rect>,
    pub enemies: Vec<EnemySpec>,
    pub start: (f32, f32),
    pub finish: Rect,
}

// ══════════════════════════════════════════════════════════════
// Activation
// ══════════════════════════════════════════════════════════════

/// Copy level `idx` into the world and begin playing it.
///
/// Always: player repositioned to the level start, every enemy rebuilt
/// from its authored spec (mid-patrol state discarded), camera zeroed,
/// any pending transition and banner dropped, tick counter restarted.
pub fn activate(world: &mut WorldState, idx: usize) {
    let spec = world.levels[idx].clone();
    world.current_level = idx;
    world.platforms = spec.platforms;
    world.hazards = spec.hazards;
    world.enemies = spec
        .enemies
        .iter()
        .map(|e| e.spawn(world.tuning.enemy_speed))
        .collect();
    world.finish = spec.finish;
    world.start = spec.start;
    world.player.reset(spec.start.0, spec.start.1);
    world.camera.reset();
    world.pending = None;
    world.clear_message();
    world.tick = 0;
    world.phase = Phase::Playing;
}

/// Startup precondition check. The simulation core assumes well-formed
/// levels and performs no validation of its own.
pub fn validate(levels: &[LevelSpec]) -> Result<(), String> {
    if levels.is_empty() {
        return Err("level table is empty".into());
    }
    for (i, lvl) in levels.iter().enumerate() {
        if lvl.platforms.is_empty() {
            return Err(format!("level {} has no platforms", i + 1));
        }
        if lvl.finish.w <= 0.0 || lvl.finish.h <= 0.0 {
            return Err(format!("level {} has a degenerate finish zone", i + 1));
        }
    }
    Ok(())
}

// ══════════════════════════════════════════════════════════════
// The campaign
// ══════════════════════════════════════════════════════════════

pub fn authored_levels() -> Vec<LevelSpec> {
    vec![level_one(), level_two()]
}

fn level_one() -> LevelSpec {
    LevelSpec {
        platforms: vec![
            Rect::new(0.0, VIEW_H - 40.0, VIEW_W, 40.0), // ground
            Rect::new(200.0, 420.0, 160.0, 20.0),
            Rect::new(420.0, 340.0, 140.0, 20.0),
            Rect::new(620.0, 260.0, 180.0, 20.0),
            Rect::new(860.0, 200.0, 120.0, 20.0),
            Rect::new(1020.0, 420.0, 240.0, 20.0), // past the first screen
        ],
        hazards: vec![Rect::new(360.0, VIEW_H - 58.0, 40.0, 18.0)],
        enemies: vec![EnemySpec::new(450.0, 300.0, 36.0, 36.0, 80.0)],
        start: (40.0, VIEW_H - 88.0),
        finish: Rect::new(900.0, 150.0, 36.0, 80.0),
    }
}

fn level_two() -> LevelSpec {
    LevelSpec {
        platforms: vec![
            Rect::new(0.0, VIEW_H - 40.0, VIEW_W, 40.0),
            Rect::new(150.0, 460.0, 120.0, 20.0),
            Rect::new(320.0, 400.0, 120.0, 20.0),
            Rect::new(480.0, 340.0, 120.0, 20.0),
            Rect::new(640.0, 280.0, 120.0, 20.0),
            Rect::new(860.0, 220.0, 120.0, 20.0),
            Rect::new(1040.0, 420.0, 220.0, 20.0),
            Rect::new(1250.0, 360.0, 180.0, 20.0),
        ],
        hazards: vec![
            Rect::new(250.0, VIEW_H - 58.0, 40.0, 18.0),
            Rect::new(1010.0, VIEW_H - 58.0, 60.0, 18.0),
        ],
        enemies: vec![
            EnemySpec::new(520.0, 300.0, 36.0, 36.0, 120.0),
            EnemySpec::new(1100.0, 330.0, 36.0, 36.0, 90.0),
        ],
        start: (20.0, VIEW_H - 88.0),
        finish: Rect::new(1300.0, 300.0, 36.0, 80.0),
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
