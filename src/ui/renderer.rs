//! Presentation layer: double-buffered, diff-based terminal renderer.
//!
//! How it works:
//!   1. Build the next frame into `front` buffer (array of Cell)
//!   2. Compare each cell with `back` buffer (previous frame)
//!   3. Only emit terminal commands for cells that changed
//!   4. All commands are batched with `queue!`, flushed once at the end
//!   5. Swap front/back
//!
//! This eliminates flicker caused by full-screen redraws.
//!
//! The world is metered in pixels (960×540 view); each terminal cell
//! covers a 12×24 pixel block, so the full view fits an 80×22 map area
//! plus a HUD row on top and a help row below. Every map cell is colored
//! by sampling the world at the cell's center point, testing objects in
//! front-to-back order (player, flag, enemies, spikes, platforms, hills,
//! sky).

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::entity::Actor;
use crate::domain::physics::Rect;
use crate::sim::world::WorldState;
use crate::sim::level::{VIEW_H, VIEW_W};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: [u8; 4],
    ch_len: u8,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for all terminal cells outside the map.
    ///
    /// On VTE-based Linux terminals the inter-row gap pixels use the
    /// background color from the last Clear. Using the SAME explicit RGB
    /// for `Clear(ClearType::All)` and every chrome cell keeps the gap
    /// color consistent, eliminating visible horizontal lines.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell {
        ch: [b' ', 0, 0, 0],
        ch_len: 1,
        fg: Color::White,
        bg: Cell::BASE_BG,
    };

    /// Sentinel cell used to invalidate the back buffer.
    /// Different from any real cell, so every position will be diff'd.
    const INVALID: Cell = Cell {
        ch: [b'?', 0, 0, 0],
        ch_len: 1,
        fg: Color::Magenta,
        bg: Color::Magenta,
    };

    /// Normalize bg: Color::Reset → BASE_BG so that every cell gets an
    /// explicit background color (never terminal-default).
    #[inline]
    fn norm_bg(bg: Color) -> Color {
        match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        }
    }

    fn from_char(c: char, fg: Color, bg: Color) -> Self {
        let mut cell = Self::BLANK;
        let len = c.encode_utf8(&mut cell.ch).len() as u8;
        cell.ch_len = len;
        cell.fg = fg;
        cell.bg = Self::norm_bg(bg);
        cell
    }

    fn as_str(&self) -> &str {
        if self.ch_len == 0 { return ""; }
        unsafe { std::str::from_utf8_unchecked(&self.ch[..self.ch_len as usize]) }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer {
            width: w,
            height: h,
            cells: vec![Cell::BLANK; w * h],
        }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write a string at (x, y) with given colors. Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        let mut cx = x;
        for ch in s.chars() {
            if cx >= self.width { break; }
            self.set(cx, y, Cell::from_char(ch, fg, bg));
            cx += 1;
        }
    }
}

// ── Renderer ──

/// World pixels covered by one terminal cell.
const CELL_PX_X: f32 = 12.0;
const CELL_PX_Y: f32 = 24.0;

/// Map area in terminal cells. 540 px / 24 px truncates to 22 rows, which
/// crops the lower half of the ground band; everything interactive sits
/// above it.
const MAP_COLS: usize = (VIEW_W / CELL_PX_X) as usize;
const MAP_ROWS: usize = (VIEW_H / CELL_PX_Y) as usize;

/// Vertical offsets
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 1;

// Palette
const SKY_TOP: (u8, u8, u8) = (0xae, 0xe1, 0xff);
const SKY_BOTTOM: (u8, u8, u8) = (0xdb, 0xef, 0xff);
const HILL: Color = Color::Rgb { r: 0x8f, g: 0xd4, b: 0x8f };
const PLATFORM_BG: Color = Color::Rgb { r: 101, g: 67, b: 33 };
const PLATFORM_FG: Color = Color::Rgb { r: 139, g: 94, b: 60 };
const SPIKE_FG: Color = Color::Rgb { r: 34, g: 34, b: 34 };
const PLAYER_BODY: Color = Color::Rgb { r: 255, g: 221, b: 87 };
const ENEMY_BODY: Color = Color::Rgb { r: 231, g: 76, b: 60 };
const FLAG_GOLD: Color = Color::Rgb { r: 255, g: 215, b: 0 };
const PENNANT_RED: Color = Color::Rgb { r: 192, g: 57, b: 43 };
const EYE: Color = Color::Rgb { r: 0, g: 0, b: 0 };
const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const BANNER_BG: Color = Color::Rgb { r: 200, g: 180, b: 50 };

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, world: &WorldState, pad_connected: bool) -> io::Result<()> {
        // Detect terminal resize
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            // Force full repaint after resize.
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // Build front buffer
        self.front.clear();
        self.compose_game(world, pad_connected);
        if world.paused {
            self.compose_pause_overlay();
        }

        // Diff and emit
        self.flush_diff()?;

        // Swap: current front becomes next back
        std::mem::swap(&mut self.front, &mut self.back);

        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Set explicit base colors at start of frame.
        // IMPORTANT: Do NOT use ResetColor here — it resets to the terminal's
        // native default, which may differ from BASE_BG and cause line artifacts.
        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                let prev = self.back.get(x, y);

                if cell == prev {
                    need_move = true;
                    continue;
                }

                // Position cursor if needed
                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }

                // Set colors only if changed
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }

                queue!(self.writer, Print(cell.as_str()))?;

                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose_game(&mut self, w: &WorldState, pad_connected: bool) {
        let buf_w = self.front.width;
        let map_w = MAP_COLS.min(buf_w);
        let map_h = MAP_ROWS.min(self.term_h.saturating_sub(2));

        // ── HUD row ──
        let hud = format!(
            " Level {:>2}/{}   ♥×{} ",
            w.current_level + 1, w.total_levels(), w.lives,
        );
        for x in 0..buf_w {
            self.front.set(x, HUD_ROW, Cell::from_char(' ', Color::White, HUD_BG));
        }
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);

        // ── Map (camera viewport) ──
        for vy in 0..map_h {
            let row = MAP_ROW + vy;
            if row >= self.front.height { break; }
            for vx in 0..map_w {
                let cell = self.sample_world(w, vx, vy);
                self.front.set(vx, row, cell);
            }
        }

        // ── Banner overlay (centered over the map) ──
        if !w.message.is_empty() {
            let text = format!(" ◆ {} ◆ ", w.message);
            let wlen = text.chars().count();
            let row = MAP_ROW + map_h / 2;
            let cx = map_w.saturating_sub(wlen) / 2;
            self.front.put_str(cx, row, &text, Color::Black, BANNER_BG);
        }

        // ── Help bar ──
        let help_row = MAP_ROW + map_h;
        if help_row < self.front.height {
            let mut help = String::from(" ←→/AD: Move   ↑/W/Space: Jump   R: Restart   P: Pause   Q: Quit");
            if pad_connected {
                help.push_str("   │ Pad ✓");
            }
            self.front.put_str(0, help_row, &help, Color::DarkGrey, Color::Reset);
        }
    }

    /// Color for one map cell, chosen by sampling the world at the cell's
    /// center. Objects are tested front-to-back, so the first hit is the
    /// topmost thing under that point.
    fn sample_world(&self, w: &WorldState, vx: usize, vy: usize) -> Cell {
        let cam_x = w.camera.x;
        let wx = cam_x + (vx as f32 + 0.5) * CELL_PX_X;
        let wy = (vy as f32 + 0.5) * CELL_PX_Y;

        // Player body, with eye dots on the top band
        let pb = w.player.bounds();
        if hit(&pb, wx, wy) {
            return body_cell(&pb, wx, wy, PLAYER_BODY);
        }

        // Finish flag: pole down the middle, pennant pointing right
        let f = &w.finish;
        let pole_x = f.x + f.w / 2.0;
        if wy >= f.y && wy < f.y + f.h && (wx - pole_x).abs() <= CELL_PX_X / 2.0 {
            return Cell::from_char(' ', Color::White, FLAG_GOLD);
        }
        let t = (wx - pole_x) / 40.0;
        if (0.0..=1.0).contains(&t) && (wy - (f.y + 22.0)).abs() <= 12.0 * (1.0 - t) {
            return Cell::from_char(' ', Color::White, PENNANT_RED);
        }

        // Enemies
        for e in &w.enemies {
            let eb = e.bounds();
            if hit(&eb, wx, wy) {
                return body_cell(&eb, wx, wy, ENEMY_BODY);
            }
        }

        // Spikes: dark triangles against the sky
        for h in &w.hazards {
            if hit(h, wx, wy) {
                return Cell::from_char('▲', SPIKE_FG, sky_color(wy));
            }
        }

        // Platforms
        for p in &w.platforms {
            if hit(p, wx, wy) {
                return Cell::from_char('▒', PLATFORM_FG, PLATFORM_BG);
            }
        }

        // Parallax hills drift at 0.3 of the camera speed
        let hx = wx - 0.7 * cam_x;
        if in_hill(hx, wy, 120.0, 420.0, 260.0, 100.0)
            || in_hill(hx, wy, 520.0, 430.0, 200.0, 80.0)
        {
            return Cell::from_char(' ', Color::White, HILL);
        }

        Cell::from_char(' ', Color::White, sky_color(wy))
    }

    fn compose_pause_overlay(&mut self) {
        let lines = [
            "╔══════════════════╗",
            "║    ▶ PAUSED ◀    ║",
            "║ P resume  Q quit ║",
            "╚══════════════════╝",
        ];
        let dim = Color::Rgb { r: 40, g: 40, b: 40 };
        let hdr = Color::Rgb { r: 255, g: 220, b: 50 };

        let map_h = MAP_ROWS.min(self.term_h.saturating_sub(2));
        let box_w = lines[0].chars().count();
        let box_x = self.front.width.saturating_sub(box_w) / 2;
        let box_y = MAP_ROW + map_h.saturating_sub(lines.len()) / 2;

        for (i, line) in lines.iter().enumerate() {
            self.front.put_str(box_x, box_y + i, line, hdr, dim);
        }
    }
}

// ── Sampling helpers ──

#[inline]
fn hit(r: &Rect, px: f32, py: f32) -> bool {
    px >= r.x && px < r.x + r.w && py >= r.y && py < r.y + r.h
}

/// Body cell for the player or an enemy: solid fill, with black eye dots
/// in the outer columns of the top band.
fn body_cell(b: &Rect, wx: f32, wy: f32, body: Color) -> Cell {
    let local_x = wx - b.x;
    let local_y = wy - b.y;
    let eye_band = local_y < CELL_PX_Y;
    let eye_col = local_x < CELL_PX_X || local_x >= b.w - CELL_PX_X;
    if eye_band && eye_col {
        Cell::from_char('•', EYE, body)
    } else {
        Cell::from_char(' ', Color::White, body)
    }
}

fn in_hill(hx: f32, hy: f32, cx: f32, cy: f32, rx: f32, ry: f32) -> bool {
    let dx = (hx - cx) / rx;
    let dy = (hy - cy) / ry;
    dx * dx + dy * dy <= 1.0
}

/// Vertical sky gradient, light blue at the top fading toward the horizon.
fn sky_color(wy: f32) -> Color {
    let t = (wy / VIEW_H).clamp(0.0, 1.0);
    let lerp = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t) as u8;
    Color::Rgb {
        r: lerp(SKY_TOP.0, SKY_BOTTOM.0),
        g: lerp(SKY_TOP.1, SKY_BOTTOM.1),
        b: lerp(SKY_TOP.2, SKY_BOTTOM.2),
    }
}
