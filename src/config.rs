//! External configuration loader.
//!
//! Reads `config.toml` from the executable's directory (or CWD).
//! Falls back to built-in defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub tuning: TuningConfig,
    pub gamepad: GamepadConfig,
}

/// Every knob the simulation consumes. Loaded from the `[tuning]` table;
/// each field independently falls back to its default, so a partial file
/// only overrides the keys it names.
#[derive(Clone, Debug, Deserialize)]
pub struct TuningConfig {
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    #[serde(default = "default_max_step_ms")]
    pub max_step_ms: f32,
    #[serde(default = "default_gravity")]
    pub gravity: f32,
    #[serde(default = "default_max_fall_speed")]
    pub max_fall_speed: f32,
    #[serde(default = "default_move_accel")]
    pub move_accel: f32,
    #[serde(default = "default_max_run_speed")]
    pub max_run_speed: f32,
    #[serde(default = "default_run_damping")]
    pub run_damping: f32,
    #[serde(default = "default_jump_impulse")]
    pub jump_impulse: f32,
    #[serde(default = "default_enemy_speed")]
    pub enemy_speed: f32,
    #[serde(default = "default_camera_lead")]
    pub camera_lead: f32,
    #[serde(default = "default_fall_margin")]
    pub fall_margin: f32,
    #[serde(default = "default_respawn_delay")]
    pub respawn_delay_ms: f32,
    #[serde(default = "default_clear_delay")]
    pub clear_delay_ms: f32,
    #[serde(default = "default_game_over_delay")]
    pub game_over_delay_ms: f32,
    #[serde(default = "default_win_delay")]
    pub win_delay_ms: f32,
    #[serde(default = "default_banner_ms")]
    pub banner_ms: f32,
    #[serde(default = "default_starting_lives")]
    pub starting_lives: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct GamepadConfig {
    #[serde(default = "default_jump_buttons")]
    pub jump: Vec<String>,
    #[serde(default = "default_restart_buttons")]
    pub restart: Vec<String>,
    #[serde(default = "default_cancel_buttons")]
    pub cancel: Vec<String>,
}

// ── TOML Schema ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    tuning: TuningConfig,
    #[serde(default)]
    gamepad: GamepadConfig,
}

// ── Defaults ──

fn default_tick_ms() -> u64 { 16 }           // ~60 simulation steps per second
fn default_max_step_ms() -> f32 { 32.0 }     // clamp after a stall: at most 2 ticks of time
fn default_gravity() -> f32 { 0.9 }
fn default_max_fall_speed() -> f32 { 25.0 }
fn default_move_accel() -> f32 { 1.0 }
fn default_max_run_speed() -> f32 { 6.0 }
fn default_run_damping() -> f32 { 0.8 }      // per-tick vx decay with no key held
fn default_jump_impulse() -> f32 { 18.0 }
fn default_enemy_speed() -> f32 { 1.5 }
fn default_camera_lead() -> f32 { 200.0 }
fn default_fall_margin() -> f32 { 200.0 }    // below view bottom before a fall counts
fn default_respawn_delay() -> f32 { 900.0 }
fn default_clear_delay() -> f32 { 1000.0 }
fn default_game_over_delay() -> f32 { 1400.0 }
fn default_win_delay() -> f32 { 2000.0 }
fn default_banner_ms() -> f32 { 1200.0 }
fn default_starting_lives() -> u32 { 3 }

fn default_jump_buttons() -> Vec<String> { vec!["A".into(), "X".into()] }
fn default_restart_buttons() -> Vec<String> { vec!["Start".into()] }
fn default_cancel_buttons() -> Vec<String> { vec!["Select".into()] }

impl Default for TuningConfig {
    fn default() -> Self {
        TuningConfig {
            tick_ms: default_tick_ms(),
            max_step_ms: default_max_step_ms(),
            gravity: default_gravity(),
            max_fall_speed: default_max_fall_speed(),
            move_accel: default_move_accel(),
            max_run_speed: default_max_run_speed(),
            run_damping: default_run_damping(),
            jump_impulse: default_jump_impulse(),
            enemy_speed: default_enemy_speed(),
            camera_lead: default_camera_lead(),
            fall_margin: default_fall_margin(),
            respawn_delay_ms: default_respawn_delay(),
            clear_delay_ms: default_clear_delay(),
            game_over_delay_ms: default_game_over_delay(),
            win_delay_ms: default_win_delay(),
            banner_ms: default_banner_ms(),
            starting_lives: default_starting_lives(),
        }
    }
}

impl Default for GamepadConfig {
    fn default() -> Self {
        GamepadConfig {
            jump: default_jump_buttons(),
            restart: default_restart_buttons(),
            cancel: default_cancel_buttons(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory,
    /// (3) XDG config dir, (4) system share dir.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let toml_cfg = load_toml(&candidate_dirs());
        GameConfig {
            tuning: toml_cfg.tuning,
            gamepad: toml_cfg.gamepad,
        }
    }
}

/// Candidate directories to search: exe dir + CWD + system paths (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        // Resolve symlinks so /usr/bin/cragdash → /usr/games/cragdash
        // still finds its config next to the real binary.
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. XDG config dir (~/.config/cragdash)
    let xdg = match std::env::var("XDG_CONFIG_HOME") {
        Ok(base) if !base.is_empty() => Some(PathBuf::from(base).join("cragdash")),
        _ => std::env::var("HOME")
            .ok()
            .map(|home| PathBuf::from(home).join(".config/cragdash")),
    };
    if let Some(xdg) = xdg {
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    // 4. System share directory (/usr/share/cragdash)
    let sys = PathBuf::from("/usr/share/cragdash");
    if sys.is_dir() && !dirs.iter().any(|d| d == &sys) {
        dirs.push(sys);
    }

    // 5. Fallback
    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        eprintln!("Warning: config.toml parse error: {e}");
                        eprintln!("Using default settings.");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    eprintln!("Warning: could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}

// ══════════════════════════════════════════
// Tests
// ══════════════════════════════════════════
