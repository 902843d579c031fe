/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// One world unit maps to `CELL_W` terminal columns and one row. Sprites
/// are drawn as a two-column glyph pair anchored at the sprite box's
/// bottom centre; rectangles become edge glyphs or a background tint.

use std::error::Error;
use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::error::ConfigError;
use crate::domain::grid::{SideMask, TileGrid};
use crate::sim::present::{Canvas, Shade, SpriteDraw};

use super::camera::Camera;
use super::particles::Particles;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells, so the
    /// inter-row gap colour matches on VTE terminals.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel cell used to invalidate the back buffer.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
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

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    fn cell_mut(&mut self, x: i32, y: i32) -> Option<&mut Cell> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        let w = self.width;
        self.cells.get_mut(y as usize * w + x as usize)
    }

    /// Glyph over whatever background is already there.
    fn put_glyph(&mut self, x: i32, y: i32, ch: char, fg: Color) {
        if let Some(cell) = self.cell_mut(x, y) {
            cell.ch = ch;
            cell.fg = fg;
        }
    }

    fn tint(&mut self, x: i32, y: i32, bg: Color) {
        if let Some(cell) = self.cell_mut(x, y) {
            cell.bg = bg;
        }
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width {
                break;
            }
            if let Some(cell) = self.cell_mut((x + i) as i32, y as i32) {
                *cell = Cell { ch, fg, bg: Cell::BASE_BG };
            }
        }
    }
}

// ── Palette ──

fn tile_color(id: u8) -> Color {
    match id % 4 {
        0 => Color::Rgb { r: 92, g: 78, b: 64 },
        1 => Color::Rgb { r: 70, g: 86, b: 104 },
        2 => Color::Rgb { r: 84, g: 100, b: 70 },
        _ => Color::Rgb { r: 104, g: 76, b: 86 },
    }
}

const TILE_EDGE: Color = Color::Rgb { r: 150, g: 140, b: 120 };
const PLAYER_FG: Color = Color::Rgb { r: 240, g: 220, b: 160 };
const ATTACK_FG: Color = Color::Rgb { r: 255, g: 150, b: 90 };
const HURT_FG: Color = Color::Rgb { r: 230, g: 80, b: 80 };
const HUD_FG: Color = Color::Rgb { r: 180, g: 180, b: 200 };
const HELP_FG: Color = Color::Rgb { r: 110, g: 110, b: 130 };

fn shade_color(shade: Shade) -> Color {
    match shade {
        Shade::BodyGrounded => Color::Rgb { r: 60, g: 140, b: 80 },
        Shade::BodyAirborne => Color::Rgb { r: 60, g: 90, b: 160 },
        Shade::Hostile => Color::Rgb { r: 255, g: 70, b: 70 },
        Shade::MaskEdge => Color::Rgb { r: 240, g: 200, b: 60 },
        Shade::Contact => Color::Rgb { r: 255, g: 60, b: 200 },
    }
}

/// Blend `fg` toward the background by `alpha` (0 = invisible).
fn fade(fg: (u8, u8, u8), alpha: f32) -> Color {
    let a = alpha.clamp(0.0, 1.0);
    let mix = |c: u8, b: u8| (b as f32 + (c as f32 - b as f32) * a) as u8;
    Color::Rgb { r: mix(fg.0, 22), g: mix(fg.1, 22), b: mix(fg.2, 35) }
}

// ── Sprite glyphs ──

/// How a sprite looks in the terminal: a body glyph, the glyph beside it
/// on the facing side, and a colour.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Glyph {
    pub body: char,
    pub lead: char,
    pub fg: Color,
}

const fn glyph(body: char, lead: char, fg: Color) -> Glyph {
    Glyph { body, lead, fg }
}

const SPRITE_GLYPHS: &[(&str, Glyph)] = &[
    ("player_idle", glyph('@', ' ', PLAYER_FG)),
    ("player_look_up", glyph('@', '\'', PLAYER_FG)),
    ("player_run", glyph('@', '›', PLAYER_FG)),
    ("player_jump", glyph('@', '↑', PLAYER_FG)),
    ("player_land", glyph('@', '_', PLAYER_FG)),
    ("player_slide", glyph('⊂', '»', PLAYER_FG)),
    ("player_front_flip", glyph('ø', '↻', PLAYER_FG)),
    ("player_combat_combo_01_attack_01", glyph('@', '─', ATTACK_FG)),
    ("player_combat_combo_01_attack_02", glyph('@', '╱', ATTACK_FG)),
    ("player_combat_combo_01_attack_03", glyph('@', '╲', ATTACK_FG)),
    ("player_combat_combo_01_attack_04", glyph('@', '═', ATTACK_FG)),
    ("player_combat_ground_slam", glyph('@', '↓', ATTACK_FG)),
    ("player_knockback", glyph('@', '✶', HURT_FG)),
    ("player_ledge_climb", glyph('@', '┘', PLAYER_FG)),
    ("player_ledge_hang", glyph('@', '┐', PLAYER_FG)),
    ("player_wall_jump", glyph('@', '⇡', PLAYER_FG)),
    ("player_crouch", glyph('o', ' ', PLAYER_FG)),
    ("player_crawl", glyph('o', '›', PLAYER_FG)),
];

pub fn sprite_glyph(name: &str) -> Option<Glyph> {
    SPRITE_GLYPHS.iter().find(|(n, _)| *n == name).map(|(_, g)| *g)
}

// ── Renderer ──

/// Each world unit = 2 terminal columns.
const CELL_W: usize = 2;

/// Vertical layout: HUD on top, help line at the bottom, map between.
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 1;
const RESERVED_ROWS: usize = 2;

/// Status line contents.
pub struct Hud<'a> {
    pub level: &'a str,
    pub state: &'a str,
    pub hostiles: usize,
    pub show_info: bool,
}

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    /// World position of the top-left map cell for the frame being built.
    origin: (f32, f32),
    unknown_sprite: Option<String>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            origin: (0.0, 0.0),
            unknown_sprite: None,
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
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    /// Visible world size for the current terminal.
    pub fn view_size(&self) -> (f32, f32) {
        let cols = self.term_w / CELL_W;
        let rows = self.term_h.saturating_sub(RESERVED_ROWS).max(1);
        (cols as f32, rows as f32)
    }

    /// Pick up terminal resizes, size the camera, and clear the front buffer.
    pub fn begin_frame(&mut self, camera: &mut Camera) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        let (vw, vh) = self.view_size();
        camera.resize(vw, vh);
        let (x0, y0, _, _) = camera.rect();
        self.origin = (x0, y0);
        self.front.clear();
        Ok(())
    }

    // ── World → screen ──

    fn to_col(&self, wx: f32) -> i32 {
        ((wx - self.origin.0) * CELL_W as f32).floor() as i32
    }

    fn to_row(&self, wy: f32) -> i32 {
        (wy - self.origin.1).floor() as i32 + MAP_ROW as i32
    }

    fn map_rows(&self) -> std::ops::Range<i32> {
        MAP_ROW as i32..(self.term_h.saturating_sub(RESERVED_ROWS - MAP_ROW)) as i32
    }

    // ── Compose ──

    /// Sample the grid at each map cell's centre. Exposed top faces get an
    /// edge glyph so platforms read at a glance.
    pub fn draw_tiles(&mut self, grid: &TileGrid) {
        for row in self.map_rows() {
            let wy = self.origin.1 + (row - MAP_ROW as i32) as f32 + 0.5;
            let gy = wy.floor() as i32;
            for col in 0..self.front.width as i32 {
                let wx = self.origin.0 + (col as f32 + 0.5) / CELL_W as f32;
                let gx = wx.floor() as i32;
                let id = grid.tile(gx, gy);
                if id == 0 {
                    continue;
                }
                self.front.tint(col, row, tile_color(id));
                let top_exposed = grid
                    .index(gx, gy)
                    .map(|i| grid.side_mask(i).contains(SideMask::TOP))
                    .unwrap_or(false);
                if top_exposed {
                    self.front.put_glyph(col, row, '▔', TILE_EDGE);
                }
            }
        }
    }

    pub fn draw_particles(&mut self, particles: &Particles) {
        for p in particles.iter() {
            let ch = if p.size > 0.045 { '•' } else { '·' };
            let (col, row) = (self.to_col(p.x), self.to_row(p.y));
            if self.map_rows().contains(&row) {
                self.front.put_glyph(col, row, ch, fade((200, 190, 170), p.alpha));
            }
        }
    }

    pub fn draw_hud(&mut self, hud: &Hud) {
        self.front.put_str(
            0,
            HUD_ROW,
            &format!(" {}   state: {:<24} hostiles: {}", hud.level, hud.state, hud.hostiles),
            HUD_FG,
        );
        let help = if hud.show_info {
            " ←→ move  ↑ jump  ↓ crouch/slide  J attack  Z walk  F knockback  G hide info  R restart  Q quit"
        } else {
            " ←→ move  ↑ jump  ↓ crouch/slide  J attack  Z walk  F knockback  G info  R restart  Q quit"
        };
        let last = self.term_h.saturating_sub(1);
        self.front.put_str(0, last, help, HELP_FG);
    }

    /// Emit the diff. An unknown sprite name seen this frame is an error.
    pub fn end_frame(&mut self) -> Result<(), Box<dyn Error>> {
        if let Some(name) = self.unknown_sprite.take() {
            return Err(Box::new(ConfigError::UnknownSprite(name)));
        }
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Explicit base colours, never ResetColor: the terminal default may
        // differ from BASE_BG.
        queue!(self.writer, SetForegroundColor(Color::White), SetBackgroundColor(Cell::BASE_BG))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }
}

impl Canvas for Renderer {
    fn draw_sprite(&mut self, sprite: &SpriteDraw) {
        let Some(g) = sprite_glyph(sprite.sprite) else {
            self.unknown_sprite.get_or_insert_with(|| sprite.sprite.to_string());
            return;
        };
        let cx = sprite.x + sprite.w / 2.0;
        let row = self.to_row(sprite.y + sprite.h - 0.5);
        let col = self.to_col(cx) & !1;
        if !self.map_rows().contains(&row) {
            return;
        }
        let (first, second) = if sprite.flip { (g.lead, g.body) } else { (g.body, g.lead) };
        self.front.put_glyph(col, row, first, g.fg);
        self.front.put_glyph(col + 1, row, second, g.fg);
    }

    fn draw_rect(&mut self, x: f32, y: f32, w: f32, h: f32, shade: Shade) {
        let color = shade_color(shade);
        let (c0, c1) = (self.to_col(x), self.to_col(x + w));
        let (r0, r1) = (self.to_row(y), self.to_row(y + h));
        let rows = self.map_rows();

        // Sub-cell rectangles collapse to a single glyph.
        if w < 0.5 && h < 0.5 {
            if rows.contains(&r0) {
                self.front.put_glyph(c0, r0, '•', color);
            }
            return;
        }
        if w < 0.25 {
            let ch = if (x - x.floor()) < 0.5 { '▏' } else { '▕' };
            for row in r0..=r1 {
                if rows.contains(&row) {
                    self.front.put_glyph(c0, row, ch, color);
                }
            }
            return;
        }
        if h < 0.25 {
            let ch = if (y - y.floor()) < 0.5 { '▔' } else { '▁' };
            if rows.contains(&r0) {
                for col in c0..c1.max(c0 + 1) {
                    self.front.put_glyph(col, r0, ch, color);
                }
            }
            return;
        }
        for row in r0..r1.max(r0 + 1) {
            if !rows.contains(&row) {
                continue;
            }
            for col in c0..c1.max(c0 + 1) {
                self.front.tint(col, row, color);
            }
        }
    }
}
