//! The step function: advances the world by one tick.
//!
//! Processing order while playing:
//!   1. Banner timer
//!   2. Player kinematics (axis-separated, against the platforms)
//!   3. Enemy patrols
//!   4. Camera follow
//!   5. Outcome checks: fall-off, hazards, enemies, finish
//!
//! The outcome order is load-bearing: fall-off does not stop the
//! pass, hazard and enemy contact do, and the handlers no-op once the
//! phase has left `Playing`, so at most one outcome takes effect per
//! tick. While a transition is pending, the step only counts its
//! deadline down (by the clamped elapsed time) and fires it on
//! expiry; gameplay input is ignored. Pausing freezes the simulation
//! and any pending countdown; the banner timer alone keeps running.
//!
//! Physics constants are tuned per nominal tick: a step advances one
//! fixed physics tick regardless of `dt_ms`. The clamped `dt_ms`
//! drives the transition and banner timers only.

use crate::domain::entity::{Actor, FrameInput, TickCtx};

use super::event::GameEvent;
use super::level::{self, VIEW_H};
use super::world::{PendingAction, PendingTransition, Phase, WorldState};

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(world: &mut WorldState, input: FrameInput, dt_ms: f32) -> Vec<GameEvent> {
    let mut events: Vec<GameEvent> = Vec::new();
    // A stalled frame must not fast-forward the timers.
    let dt = dt_ms.min(world.tuning.max_step_ms);

    tick_banner(world, dt);

    if world.paused {
        return events;
    }
    if world.phase != Phase::Playing {
        tick_transition(world, dt, &mut events);
        return events;
    }

    world.tick += 1;

    // Player first, then every patrol.
    let ctx = TickCtx {
        input,
        tuning: &world.tuning,
        platforms: &world.platforms,
    };
    world.player.update(&ctx);
    for e in &mut world.enemies {
        e.update(&ctx);
    }

    world.camera.follow(world.player.x, world.tuning.camera_lead);

    check_outcomes(world, &mut events);

    events
}

/// Player-requested restart: takes effect immediately from any phase.
pub fn manual_restart(world: &mut WorldState) {
    restart_run(world);
    world.set_message("Restarting...", world.tuning.banner_ms);
}

// ══════════════════════════════════════════════════════════════
// Timers
// ══════════════════════════════════════════════════════════════

fn tick_banner(world: &mut WorldState, dt: f32) {
    if world.message_timer_ms > 0.0 {
        world.message_timer_ms -= dt;
        if world.message_timer_ms <= 0.0 {
            world.clear_message();
        }
    }
}

fn tick_transition(world: &mut WorldState, dt: f32, events: &mut Vec<GameEvent>) {
    let pending = match world.pending.as_mut() {
        Some(p) => p,
        // Armed together with every phase change; nothing to count
        // down otherwise.
        None => return,
    };
    pending.remaining_ms -= dt;
    if pending.remaining_ms > 0.0 {
        return;
    }
    let action = pending.action;

    // `activate` drops the pending record and the banner it owns.
    match action {
        PendingAction::Respawn | PendingAction::Advance => {
            let idx = world.current_level;
            level::activate(world, idx);
        }
        PendingAction::RestartRun => restart_run(world),
    }
    events.push(GameEvent::LevelActivated { level: world.current_level });
}

fn restart_run(world: &mut WorldState) {
    world.lives = world.tuning.starting_lives;
    level::activate(world, 0);
}

// ══════════════════════════════════════════════════════════════
// Outcome checks
// ══════════════════════════════════════════════════════════════

/// Fall-off, hazards, enemies, finish, in that order. Fall-off does
/// not return early; hazard and enemy contact do. Either way the
/// phase guard in the handlers keeps a double hit in one tick from
/// counting twice.
fn check_outcomes(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let hitbox = world.player.bounds();

    if world.player.y > VIEW_H + world.tuning.fall_margin {
        lose_life(world, events);
    }

    if world.hazards.iter().any(|hz| hitbox.overlaps(hz)) {
        lose_life(world, events);
        return;
    }

    if world.enemies.iter().any(|e| hitbox.overlaps(&e.bounds())) {
        lose_life(world, events);
        return;
    }

    if hitbox.overlaps(&world.finish) {
        reach_finish(world, events);
    }
}

fn lose_life(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if world.phase != Phase::Playing {
        return;
    }

    // Saturating: the tuning file may start a run at zero lives.
    world.lives = world.lives.saturating_sub(1);
    events.push(GameEvent::LifeLost { remaining: world.lives });

    if world.lives == 0 {
        world.phase = Phase::GameOver;
        world.pending = Some(PendingTransition {
            action: PendingAction::RestartRun,
            remaining_ms: world.tuning.game_over_delay_ms,
        });
        world.set_message("Game Over! Restarting...", 0.0);
        events.push(GameEvent::GameOver);
    } else {
        world.phase = Phase::Transitioning;
        world.pending = Some(PendingTransition {
            action: PendingAction::Respawn,
            remaining_ms: world.tuning.respawn_delay_ms,
        });
        world.set_message("You Died! -1 life", 0.0);
    }
}

fn reach_finish(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if world.phase != Phase::Playing {
        return;
    }

    if world.on_last_level() {
        // The index stays on the final level during the win wait.
        world.phase = Phase::Transitioning;
        world.pending = Some(PendingTransition {
            action: PendingAction::RestartRun,
            remaining_ms: world.tuning.win_delay_ms,
        });
        world.set_message("You Win! Congratulations!", 0.0);
        events.push(GameEvent::GameWon);
    } else {
        world.current_level += 1;
        world.phase = Phase::Transitioning;
        world.pending = Some(PendingTransition {
            action: PendingAction::Advance,
            remaining_ms: world.tuning.clear_delay_ms,
        });
        // 0-based index after the bump reads as the 1-based number of
        // the level just cleared.
        world.set_message(&format!("Level {} Cleared!", world.current_level), 0.0);
        events.push(GameEvent::LevelCleared { next: world.current_level });
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TuningConfig;
    use crate::domain::entity::EnemySpec;
    use crate::domain::physics::Rect;
    use crate::sim::level::LevelSpec;

    const DT: f32 = 16.0;

    /// A flat floor with one hazard, one enemy, and a finish post,
    /// then a second floor-only level.
    fn test_levels() -> Vec<LevelSpec> {
        vec![
            LevelSpec {
                platforms: vec![Rect::new(0.0, 500.0, 2000.0, 40.0)],
                hazards: vec![Rect::new(600.0, 482.0, 40.0, 18.0)],
                enemies: vec![EnemySpec::new(300.0, 464.0, 36.0, 36.0, 50.0)],
                start: (40.0, 452.0),
                finish: Rect::new(900.0, 420.0, 36.0, 80.0),
            },
            LevelSpec {
                platforms: vec![Rect::new(0.0, 500.0, 2000.0, 40.0)],
                hazards: vec![],
                enemies: vec![],
                start: (40.0, 452.0),
                finish: Rect::new(400.0, 420.0, 36.0, 80.0),
            },
        ]
    }

    fn world() -> WorldState {
        let mut w = WorldState::new(test_levels(), TuningConfig::default());
        level::activate(&mut w, 0);
        w
    }

    fn idle() -> FrameInput {
        FrameInput::default()
    }

    fn right_held() -> FrameInput {
        FrameInput { right: true, ..FrameInput::default() }
    }

    /// Step until the armed transition fires and play resumes,
    /// collecting every event on the way.
    fn run_until_playing(world: &mut WorldState) -> Vec<GameEvent> {
        let mut events = vec![];
        for _ in 0..400 {
            events.extend(step(world, FrameInput::default(), DT));
            if world.phase == Phase::Playing {
                return events;
            }
        }
        panic!("transition never fired");
    }

    // ── Life loss ──

    #[test]
    fn hazard_contact_costs_one_life() {
        let mut w = world();
        w.player.x = 600.0;
        w.player.y = 450.0;

        let events = step(&mut w, idle(), DT);
        assert!(events.contains(&GameEvent::LifeLost { remaining: 2 }));
        assert_eq!(w.lives, 2);
        assert_eq!(w.phase, Phase::Transitioning);
        assert_eq!(w.message, "You Died! -1 life");
        assert!(w.message_is_persistent());
        assert!(matches!(
            w.pending,
            Some(PendingTransition { action: PendingAction::Respawn, .. })
        ));
    }

    #[test]
    fn hazard_matching_hitbox_exactly_fires() {
        // Hazard authored as exactly the player's resting hitbox on
        // the floor.
        let levels = vec![LevelSpec {
            platforms: vec![Rect::new(0.0, 500.0, 2000.0, 40.0)],
            hazards: vec![Rect::new(40.0, 500.0 - 48.0 - 0.1, 36.0, 48.0)],
            enemies: vec![],
            start: (40.0, 452.0),
            finish: Rect::new(900.0, 420.0, 36.0, 80.0),
        }];
        let mut w = WorldState::new(levels, TuningConfig::default());
        level::activate(&mut w, 0);

        let events = step(&mut w, idle(), DT);
        assert!(events.contains(&GameEvent::LifeLost { remaining: 2 }));
    }

    #[test]
    fn enemy_contact_costs_one_life() {
        let mut w = world();
        w.player.x = 300.0;
        w.player.y = 452.0;

        let events = step(&mut w, idle(), DT);
        assert!(events.contains(&GameEvent::LifeLost { remaining: 2 }));
        assert_eq!(w.phase, Phase::Transitioning);
    }

    #[test]
    fn falling_off_the_world_costs_one_life() {
        let mut w = world();
        w.player.x = 40.0;
        w.player.y = 800.0;

        let events = step(&mut w, idle(), DT);
        assert!(events.contains(&GameEvent::LifeLost { remaining: 2 }));
    }

    #[test]
    fn fall_off_plus_hazard_in_one_tick_costs_one_life() {
        // A hazard sits in the fall path below the world bound, so
        // both checks trigger on the same tick.
        let levels = vec![LevelSpec {
            platforms: vec![Rect::new(5000.0, 500.0, 100.0, 40.0)],
            hazards: vec![Rect::new(0.0, 786.0, 400.0, 100.0)],
            enemies: vec![],
            start: (40.0, 735.0),
            finish: Rect::new(900.0, 420.0, 36.0, 80.0),
        }];
        let mut w = WorldState::new(levels, TuningConfig::default());
        level::activate(&mut w, 0);

        let mut life_events = 0;
        for _ in 0..10 {
            let events = step(&mut w, idle(), DT);
            life_events += events
                .iter()
                .filter(|e| matches!(e, GameEvent::LifeLost { .. }))
                .count();
            if w.phase != Phase::Playing {
                break;
            }
        }
        assert_eq!(life_events, 1);
        assert_eq!(w.lives, 2);
    }

    // ── Transitioning guard ──

    #[test]
    fn outcomes_and_input_ignored_while_transitioning() {
        let mut w = world();
        w.player.x = 600.0;
        w.player.y = 450.0;
        step(&mut w, idle(), DT);
        assert_eq!(w.phase, Phase::Transitioning);

        // Still overlapping the hazard, still pushing right: neither
        // costs a life nor moves the body.
        let x = w.player.x;
        for _ in 0..5 {
            let events = step(&mut w, right_held(), DT);
            assert!(events.is_empty());
        }
        assert_eq!(w.lives, 2);
        assert_eq!(w.player.x, x);
    }

    #[test]
    fn tick_counter_freezes_while_transitioning() {
        let mut w = world();
        w.player.x = 600.0;
        w.player.y = 450.0;
        step(&mut w, idle(), DT);

        let t0 = w.tick;
        for _ in 0..5 {
            step(&mut w, idle(), DT);
        }
        assert_eq!(w.tick, t0);
    }

    // ── Respawn ──

    #[test]
    fn respawn_returns_player_to_level_start() {
        let mut w = world();
        w.player.x = 600.0;
        w.player.y = 450.0;
        step(&mut w, idle(), DT);

        let events = run_until_playing(&mut w);
        assert!(events.contains(&GameEvent::LevelActivated { level: 0 }));
        assert_eq!(w.current_level, 0);
        assert_eq!(w.lives, 2);
        assert_eq!((w.player.x, w.player.y), (40.0, 452.0));
        assert_eq!(w.camera.x, 0.0);
        assert!(w.message.is_empty());
        assert!(w.pending.is_none());
    }

    #[test]
    fn respawn_rebuilds_enemies_from_authored_state() {
        let mut w = world();
        // Let the patrol wander first.
        for _ in 0..30 {
            step(&mut w, idle(), DT);
        }
        assert_ne!(w.enemies[0].x, 300.0);

        w.player.x = 600.0;
        w.player.y = 450.0;
        step(&mut w, idle(), DT);
        run_until_playing(&mut w);

        assert_eq!(w.enemies[0].x, 300.0);
        assert_eq!(w.enemies[0].dir, 1.0);
    }

    // ── Level clear and win ──

    #[test]
    fn clearing_a_mid_level_advances_to_the_next() {
        let mut w = world();
        w.player.x = 900.0;
        w.player.y = 430.0;

        let events = step(&mut w, idle(), DT);
        assert!(events.contains(&GameEvent::LevelCleared { next: 1 }));
        assert_eq!(w.current_level, 1);
        assert_eq!(w.message, "Level 1 Cleared!");
        assert!(matches!(
            w.pending,
            Some(PendingTransition { action: PendingAction::Advance, .. })
        ));

        let events = run_until_playing(&mut w);
        assert!(events.contains(&GameEvent::LevelActivated { level: 1 }));
        assert_eq!(w.current_level, 1);
        assert_eq!((w.player.x, w.player.y), (40.0, 452.0));
    }

    #[test]
    fn clearing_the_final_level_wins_without_advancing() {
        let mut w = world();
        level::activate(&mut w, 1);
        w.player.x = 400.0;
        w.player.y = 430.0;

        let events = step(&mut w, idle(), DT);
        assert!(events.contains(&GameEvent::GameWon));
        assert!(!events.iter().any(|e| matches!(e, GameEvent::LevelCleared { .. })));
        assert_eq!(w.current_level, 1);
        assert_eq!(w.message, "You Win! Congratulations!");
        assert!(matches!(
            w.pending,
            Some(PendingTransition { action: PendingAction::RestartRun, .. })
        ));
    }

    #[test]
    fn win_restarts_the_whole_run() {
        let mut w = world();
        level::activate(&mut w, 1);
        w.player.x = 400.0;
        w.player.y = 430.0;
        step(&mut w, idle(), DT);

        run_until_playing(&mut w);
        assert_eq!(w.current_level, 0);
        assert_eq!(w.lives, 3);
        assert_eq!((w.player.x, w.player.y), (40.0, 452.0));
    }

    // ── Game over ──

    #[test]
    fn last_life_enters_game_over_then_fully_restarts() {
        let mut w = world();
        w.lives = 1;
        w.player.x = 600.0;
        w.player.y = 450.0;

        let events = step(&mut w, idle(), DT);
        assert!(events.contains(&GameEvent::LifeLost { remaining: 0 }));
        assert!(events.contains(&GameEvent::GameOver));
        assert_eq!(w.phase, Phase::GameOver);
        assert_eq!(w.message, "Game Over! Restarting...");

        run_until_playing(&mut w);
        assert_eq!(w.lives, 3);
        assert_eq!(w.current_level, 0);
        assert_eq!((w.player.x, w.player.y), (40.0, 452.0));
    }

    #[test]
    fn zero_starting_lives_goes_straight_to_game_over() {
        // starting_lives = 0 is loadable from the tuning file; the
        // first touch must not wrap the counter.
        let tuning = TuningConfig { starting_lives: 0, ..TuningConfig::default() };
        let mut w = WorldState::new(test_levels(), tuning);
        level::activate(&mut w, 0);
        w.player.x = 600.0;
        w.player.y = 450.0;

        let events = step(&mut w, idle(), DT);
        assert!(events.contains(&GameEvent::LifeLost { remaining: 0 }));
        assert!(events.contains(&GameEvent::GameOver));
        assert_eq!(w.lives, 0);
        assert_eq!(w.phase, Phase::GameOver);
    }

    // ── Timers ──

    #[test]
    fn oversized_dt_is_clamped_per_step() {
        let mut w = world();
        w.player.x = 600.0;
        w.player.y = 450.0;
        step(&mut w, idle(), DT);

        step(&mut w, idle(), 100_000.0);
        let remaining = w.pending.unwrap().remaining_ms;
        assert_eq!(remaining, w.tuning.respawn_delay_ms - w.tuning.max_step_ms);
        assert_eq!(w.phase, Phase::Transitioning);
    }

    #[test]
    fn transient_banner_clears_itself() {
        let mut w = world();
        w.set_message("Good luck!", 100.0);
        for _ in 0..7 {
            step(&mut w, idle(), DT);
        }
        assert!(w.message.is_empty());
    }

    #[test]
    fn persistent_banner_survives_until_its_transition_fires() {
        let mut w = world();
        w.player.x = 600.0;
        w.player.y = 450.0;
        step(&mut w, idle(), DT);
        assert!(w.message_is_persistent());

        for _ in 0..10 {
            step(&mut w, idle(), DT);
        }
        assert_eq!(w.message, "You Died! -1 life");

        run_until_playing(&mut w);
        assert!(w.message.is_empty());
    }

    // ── Camera ──

    #[test]
    fn camera_trails_the_player_by_the_lead_margin() {
        let mut w = world();
        w.player.x = 500.0;
        step(&mut w, idle(), DT);
        assert_eq!(w.camera.x, 300.0);

        w.player.x = 50.0;
        step(&mut w, idle(), DT);
        assert_eq!(w.camera.x, 0.0);
    }

    // ── Pause and manual restart ──

    #[test]
    fn paused_step_is_inert() {
        let mut w = world();
        w.paused = true;
        let (x, t0) = (w.player.x, w.tick);

        let events = step(&mut w, right_held(), DT);
        assert!(events.is_empty());
        assert_eq!(w.player.x, x);
        assert_eq!(w.tick, t0);
    }

    #[test]
    fn pause_freezes_the_pending_countdown() {
        let mut w = world();
        w.player.x = 600.0;
        w.player.y = 450.0;
        step(&mut w, idle(), DT);
        assert_eq!(w.phase, Phase::Transitioning);

        // 200 paused steps outlast the respawn delay several times
        // over; the deadline must not move.
        w.paused = true;
        for _ in 0..200 {
            step(&mut w, idle(), DT);
        }
        assert_eq!(w.phase, Phase::Transitioning);
        assert_eq!(w.pending.unwrap().remaining_ms, w.tuning.respawn_delay_ms);
        assert_eq!(w.message, "You Died! -1 life");

        w.paused = false;
        run_until_playing(&mut w);
        assert_eq!(w.phase, Phase::Playing);
    }

    #[test]
    fn transient_banner_fades_even_while_paused() {
        let mut w = world();
        w.set_message("Good luck!", 100.0);
        w.paused = true;
        for _ in 0..7 {
            step(&mut w, idle(), DT);
        }
        assert!(w.message.is_empty());
        assert_eq!(w.tick, 0);
    }

    #[test]
    fn manual_restart_resets_the_run_immediately() {
        let mut w = world();
        w.player.x = 600.0;
        w.player.y = 450.0;
        step(&mut w, idle(), DT);
        assert_eq!(w.phase, Phase::Transitioning);

        manual_restart(&mut w);
        assert_eq!(w.phase, Phase::Playing);
        assert_eq!(w.lives, 3);
        assert_eq!(w.current_level, 0);
        assert_eq!(w.message, "Restarting...");
        assert!(!w.message_is_persistent());
    }
}
