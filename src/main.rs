//! Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::time::{Duration, Instant};

use config::GameConfig;
use sim::level;
use sim::step;
use sim::world::WorldState;
use ui::gamepad::GamepadState;
use ui::input::{InputState, KEYS_PAUSE, KEYS_QUIT, KEYS_RESTART};
use ui::renderer::Renderer;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

fn main() {
    let config = GameConfig::load();

    let levels = level::authored_levels();
    if let Err(e) = level::validate(&levels) {
        eprintln!("Level data error: {e}");
        return;
    }

    let mut world = WorldState::new(levels, config.tuning.clone());
    level::activate(&mut world, 0);
    world.set_message(
        "Move: ←/→ or A/D · Jump: ↑/W/Space · Reach the gold flag!",
        world.tuning.banner_ms,
    );

    let mut renderer = Renderer::new();

    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let result = game_loop(&mut world, &mut renderer, &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Cragdash!");
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);

    let tick_rate = Duration::from_millis(world.tuning.tick_ms);
    let mut last_tick = Instant::now();

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() || kb.any_pressed(KEYS_QUIT) || gp.cancel_pressed() {
            break;
        }
        if kb.any_pressed(KEYS_PAUSE) {
            world.paused = !world.paused;
        }
        if kb.any_pressed(KEYS_RESTART) || gp.restart_pressed() {
            world.paused = false;
            step::manual_restart(world);
        }

        let elapsed = last_tick.elapsed();
        if elapsed >= tick_rate {
            let mut input = kb.frame_input();
            input.left |= gp.left_held();
            input.right |= gp.right_held();
            input.jump |= gp.jump_held();

            // Wall-clock delta feeds the transition timers; the step
            // clamps it so a stalled terminal can't fast-forward them.
            let dt_ms = elapsed.as_secs_f32() * 1000.0;
            step::step(world, input, dt_ms);
            last_tick = Instant::now();
        }

        renderer.render(world, gp.connected)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}
