//! Entities: the player's kinematic body and the patrolling enemies,
//! plus the `Actor` capability every simulated body exposes to the
//! tick loop (advance one tick, report a hitbox).

use crate::config::TuningConfig;

use super::physics::{first_hit, Rect, SKIN};

/// Player hitbox size in world pixels. Levels are authored around it.
pub const PLAYER_W: f32 = 36.0;
pub const PLAYER_H: f32 = 48.0;

/// Frame input: held-state intents sampled once per tick by the frame
/// loop. Last state wins; key transitions inside one tick collapse to
/// whatever is held at read time. Left beats right when both are down.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameInput {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
}

/// Read-only view of the world handed to each actor for one tick.
pub struct TickCtx<'a> {
    pub input: FrameInput,
    pub tuning: &'a TuningConfig,
    pub platforms: &'a [Rect],
}

/// Capability shared by every simulated body. Behavior differs
/// entirely between implementors; the tick loop only needs these two.
pub trait Actor {
    fn update(&mut self, ctx: &TickCtx);
    fn bounds(&self) -> Rect;
}

// ══════════════════════════════════════════════════════════════
// Player
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct Player {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub vx: f32,
    pub vy: f32,
    pub on_ground: bool,
}

impl Player {
    pub fn new(x: f32, y: f32) -> Self {
        Player {
            x, y,
            w: PLAYER_W,
            h: PLAYER_H,
            vx: 0.0,
            vy: 0.0,
            on_ground: false,
        }
    }

    /// Reinitialize in place for a respawn or level change. The body
    /// is created once per run and reused across levels.
    pub fn reset(&mut self, x: f32, y: f32) {
        self.x = x;
        self.y = y;
        self.vx = 0.0;
        self.vy = 0.0;
        self.on_ground = false;
    }
}

impl Actor for Player {
    /// Axis-separated kinematics, one pass per tick: integrate intent
    /// and gravity, resolve X against the platforms at the current Y,
    /// then resolve Y using the already-resolved X. Tunnelling through
    /// thin geometry at extreme speed is an accepted limitation.
    fn update(&mut self, ctx: &TickCtx) {
        let t = ctx.tuning;

        // ── Horizontal intent ──
        if ctx.input.left {
            self.vx = (self.vx - t.move_accel).max(-t.max_run_speed);
        } else if ctx.input.right {
            self.vx = (self.vx + t.move_accel).min(t.max_run_speed);
        } else {
            // Exponential decay, never an instant stop.
            self.vx *= t.run_damping;
        }

        // ── Jump: grounded only, no double-jump, no buffering.
        // A held key re-fires on the first grounded tick after landing.
        if ctx.input.jump && self.on_ground {
            self.vy = -t.jump_impulse;
            self.on_ground = false;
        }

        // ── Gravity, applied even while grounded; the vertical snap
        // below absorbs the sustained downward pressure.
        self.vy = (self.vy + t.gravity).min(t.max_fall_speed);

        let mut next_x = self.x + self.vx;
        let mut next_y = self.y + self.vy;

        // ── Horizontal resolution, probed at the current y ──
        let probe = Rect::new(next_x, self.y, self.w, self.h);
        if let Some(hit) = first_hit(&probe, ctx.platforms) {
            if self.vx > 0.0 {
                next_x = hit.x - self.w - SKIN;
            } else if self.vx < 0.0 {
                next_x = hit.right() + SKIN;
            }
            self.vx = 0.0;
        }

        // ── Vertical resolution, probed with the resolved x ──
        let probe = Rect::new(next_x, next_y, self.w, self.h);
        if let Some(hit) = first_hit(&probe, ctx.platforms) {
            if self.vy > 0.0 {
                next_y = hit.y - self.h - SKIN;
                self.on_ground = true;
            } else {
                // Rising into a ceiling; grounded flag is untouched.
                next_y = hit.bottom() + SKIN;
            }
            self.vy = 0.0;
        } else {
            self.on_ground = false;
        }

        // Exactly one position commit per tick.
        self.x = next_x;
        self.y = next_y;
    }

    fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.w, self.h)
    }
}

// ══════════════════════════════════════════════════════════════
// Enemies
// ══════════════════════════════════════════════════════════════

/// Authored enemy placement: spawn point, hitbox size, patrol range.
/// Immutable level data; runtime enemies are rebuilt from these on
/// every activation, so mid-patrol state never survives a reset.
#[derive(Clone, Copy, Debug)]
pub struct EnemySpec {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub range: f32,
}

impl EnemySpec {
    pub const fn new(x: f32, y: f32, w: f32, h: f32, range: f32) -> Self {
        EnemySpec { x, y, w, h, range }
    }

    /// Build a fresh runtime enemy at the authored start, marching
    /// right.
    pub fn spawn(&self, speed: f32) -> Enemy {
        Enemy {
            start_x: self.x,
            x: self.x,
            y: self.y,
            w: self.w,
            h: self.h,
            range: self.range,
            speed,
            dir: 1.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Enemy {
    pub start_x: f32, // patrol anchor
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub range: f32,
    pub speed: f32,
    pub dir: f32, // -1.0 or 1.0
}

impl Actor for Enemy {
    /// March across the patrol band `[start_x - range, start_x + range]`
    /// and turn around at the edges. The position is clamped to the
    /// violated bound on the flip tick, so the band is a true
    /// invariant. No terrain collision, no input; contact with the
    /// player is the step function's business, not the agent's.
    fn update(&mut self, _ctx: &TickCtx) {
        self.x += self.speed * self.dir;
        if self.x > self.start_x + self.range {
            self.x = self.start_x + self.range;
            self.dir = -1.0;
        }
        if self.x < self.start_x - self.range {
            self.x = self.start_x - self.range;
            self.dir = 1.0;
        }
    }

    fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.w, self.h)
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn tuning() -> TuningConfig {
        TuningConfig::default()
    }

    fn tick(p: &mut Player, input: FrameInput, t: &TuningConfig, platforms: &[Rect]) {
        p.update(&TickCtx { input, tuning: t, platforms });
    }

    fn held(left: bool, right: bool, jump: bool) -> FrameInput {
        FrameInput { left, right, jump }
    }

    // ── Falling and landing ──

    #[test]
    fn falls_onto_platform_and_rests_at_its_top() {
        let t = tuning();
        let platforms = [Rect::new(0.0, 360.0, 800.0, 40.0)];
        let mut p = Player::new(40.0, 300.0);

        for _ in 0..60 {
            tick(&mut p, FrameInput::default(), &t, &platforms);
        }

        // Resting height is platform top minus body height, within the
        // snap gap.
        assert!((p.y - (360.0 - PLAYER_H)).abs() <= 2.0 * SKIN, "y = {}", p.y);
        assert!(p.on_ground);
        assert_eq!(p.vy, 0.0);
        assert_eq!(p.x, 40.0);
    }

    #[test]
    fn resting_body_stays_put() {
        let t = tuning();
        let platforms = [Rect::new(0.0, 360.0, 800.0, 40.0)];
        let mut p = Player::new(40.0, 300.0);

        for _ in 0..60 {
            tick(&mut p, FrameInput::default(), &t, &platforms);
        }
        let settled_y = p.y;
        for _ in 0..30 {
            tick(&mut p, FrameInput::default(), &t, &platforms);
            assert_eq!(p.y, settled_y);
            assert!(p.on_ground);
        }
    }

    #[test]
    fn terminal_fall_speed_is_capped() {
        let t = tuning();
        let mut p = Player::new(0.0, 0.0);

        for _ in 0..100 {
            tick(&mut p, FrameInput::default(), &t, &[]);
        }
        assert_eq!(p.vy, t.max_fall_speed);
        assert!(!p.on_ground);
    }

    // ── Horizontal motion ──

    #[test]
    fn runs_right_into_wall_and_stops_at_its_face() {
        let t = tuning();
        // Floor with a wall standing on it to the player's right.
        let platforms = [
            Rect::new(0.0, 348.0, 800.0, 40.0),
            Rect::new(300.0, 248.0, 40.0, 100.0),
        ];
        let mut p = Player::new(150.0, 299.0);

        for _ in 0..60 {
            tick(&mut p, held(false, true, false), &t, &platforms);
        }
        assert!((p.x - (300.0 - PLAYER_W)).abs() <= 2.0 * SKIN, "x = {}", p.x);
        assert_eq!(p.vx, 0.0);
        assert!(p.on_ground);
    }

    #[test]
    fn run_speed_is_capped() {
        let t = tuning();
        let platforms = [Rect::new(0.0, 348.0, 4000.0, 40.0)];
        let mut p = Player::new(50.0, 299.0);

        for _ in 0..30 {
            tick(&mut p, held(false, true, false), &t, &platforms);
        }
        assert_eq!(p.vx, t.max_run_speed);
    }

    #[test]
    fn releasing_keys_decays_vx_exponentially() {
        let t = tuning();
        let platforms = [Rect::new(0.0, 348.0, 4000.0, 40.0)];
        let mut p = Player::new(50.0, 299.0);

        for _ in 0..20 {
            tick(&mut p, held(false, true, false), &t, &platforms);
        }
        let v0 = p.vx;
        tick(&mut p, FrameInput::default(), &t, &platforms);
        assert!((p.vx - v0 * t.run_damping).abs() < 1e-4);
        // Never an instant stop.
        assert!(p.vx > 0.0);
    }

    #[test]
    fn left_wins_when_both_directions_held() {
        let t = tuning();
        let mut p = Player::new(0.0, 0.0);
        tick(&mut p, held(true, true, false), &t, &[]);
        assert!(p.vx < 0.0);
    }

    // ── Jumping ──

    #[test]
    fn grounded_jump_launches_upward() {
        let t = tuning();
        let platforms = [Rect::new(0.0, 348.0, 800.0, 40.0)];
        let mut p = Player::new(100.0, 299.0);

        // Settle onto the floor first.
        for _ in 0..10 {
            tick(&mut p, FrameInput::default(), &t, &platforms);
        }
        assert!(p.on_ground);
        let y0 = p.y;

        tick(&mut p, held(false, false, true), &t, &platforms);
        assert!(!p.on_ground);
        assert!(p.vy < 0.0);
        assert!(p.y < y0);
    }

    #[test]
    fn airborne_jump_input_is_ignored() {
        let t = tuning();
        let mut p = Player::new(0.0, 0.0);

        tick(&mut p, FrameInput::default(), &t, &[]);
        let vy_before = p.vy;
        tick(&mut p, held(false, false, true), &t, &[]);
        // Gravity is the only vertical change.
        assert!((p.vy - (vy_before + t.gravity)).abs() < 1e-4);
    }

    #[test]
    fn rising_body_bumps_ceiling_and_drops() {
        let t = tuning();
        let platforms = [
            Rect::new(0.0, 348.0, 800.0, 40.0),
            Rect::new(0.0, 140.0, 800.0, 40.0), // ceiling, bottom at 180
        ];
        let mut p = Player::new(100.0, 299.0);
        for _ in 0..10 {
            tick(&mut p, FrameInput::default(), &t, &platforms);
        }

        tick(&mut p, held(false, false, true), &t, &platforms);
        let mut min_y = p.y;
        for _ in 0..30 {
            tick(&mut p, FrameInput::default(), &t, &platforms);
            min_y = min_y.min(p.y);
        }
        // Capped just under the ceiling, then back on the floor.
        assert!((min_y - (180.0 + SKIN)).abs() <= 2.0 * SKIN, "min_y = {min_y}");
        assert!(p.on_ground);
    }

    #[test]
    fn reset_clears_motion_state() {
        let t = tuning();
        let mut p = Player::new(0.0, 0.0);
        for _ in 0..5 {
            tick(&mut p, held(false, true, false), &t, &[]);
        }
        p.reset(40.0, 452.0);
        assert_eq!((p.x, p.y), (40.0, 452.0));
        assert_eq!((p.vx, p.vy), (0.0, 0.0));
        assert!(!p.on_ground);
    }

    // ── Patrol ──

    #[test]
    fn patrol_never_leaves_its_band() {
        let t = tuning();
        let mut e = EnemySpec::new(450.0, 300.0, 36.0, 36.0, 80.0).spawn(t.enemy_speed);
        let ctx = TickCtx { input: FrameInput::default(), tuning: &t, platforms: &[] };

        for _ in 0..2000 {
            e.update(&ctx);
            assert!(e.x >= 370.0 && e.x <= 530.0, "x = {}", e.x);
        }
    }

    #[test]
    fn patrol_reverses_at_each_bound() {
        let t = tuning();
        let mut e = EnemySpec::new(100.0, 0.0, 36.0, 36.0, 30.0).spawn(t.enemy_speed);
        let ctx = TickCtx { input: FrameInput::default(), tuning: &t, platforms: &[] };

        let mut min_x = e.x;
        let mut max_x = e.x;
        let mut flips = 0;
        let mut last_dir = e.dir;
        for _ in 0..500 {
            e.update(&ctx);
            min_x = min_x.min(e.x);
            max_x = max_x.max(e.x);
            if e.dir != last_dir {
                flips += 1;
                last_dir = e.dir;
            }
        }
        // Both bounds reached exactly, and the walk keeps oscillating.
        assert_eq!(min_x, 70.0);
        assert_eq!(max_x, 130.0);
        assert!(flips >= 4);
    }

    #[test]
    fn spawn_rebuilds_authored_state() {
        let spec = EnemySpec::new(520.0, 300.0, 36.0, 36.0, 120.0);
        let t = tuning();
        let mut e = spec.spawn(t.enemy_speed);
        let ctx = TickCtx { input: FrameInput::default(), tuning: &t, platforms: &[] };
        for _ in 0..77 {
            e.update(&ctx);
        }

        let fresh = spec.spawn(t.enemy_speed);
        assert_eq!(fresh.x, 520.0);
        assert_eq!(fresh.dir, 1.0);
        assert_eq!(fresh.start_x, 520.0);
    }
}
