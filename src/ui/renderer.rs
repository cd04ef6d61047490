/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// The level is drawn at a fixed scale: one tile is `TILE_COLS` terminal
/// columns by `TILE_ROWS` rows. Anything outside the level's screen
/// (config `screen.width` × `screen.height`) is clipped.

use std::io::{self, BufWriter, Write};
use std::ops::Range;

use crossterm::{
    cursor::{self, MoveTo},
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::entity::{EffectKind, PlayerStatus};
use crate::domain::geometry::Rect;
use crate::domain::tile::{LayerKind, Visual};
use crate::sim::world::{LevelState, Outcome};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit background for every "empty" cell, so row gaps on VTE
    /// terminals match the cell colour.
    const BASE_BG: Color = Color::Rgb { r: 18, g: 16, b: 24 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel used to invalidate the back buffer.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    const fn new(ch: char, fg: Color, bg: Color) -> Self {
        Cell { ch, fg, bg }
    }
}

// ── Palette ──

const STONE_DARK: Color = Color::Rgb { r: 58, g: 52, b: 64 };
const STONE_LIGHT: Color = Color::Rgb { r: 104, g: 96, b: 112 };
const MOSS: Color = Color::Rgb { r: 86, g: 140, b: 72 };
const PILLAR: Color = Color::Rgb { r: 140, g: 132, b: 120 };
const CHAIN: Color = Color::Rgb { r: 92, g: 92, b: 100 };
const GOLD: Color = Color::Rgb { r: 240, g: 200, b: 60 };
const HERO: Color = Color::Rgb { r: 90, g: 200, b: 230 };
const HERO_BG: Color = Color::Rgb { r: 24, g: 48, b: 72 };
const GOAL: Color = Color::Rgb { r: 210, g: 90, b: 220 };
const DUST: Color = Color::Rgb { r: 180, g: 170, b: 150 };
const HUD_FG: Color = Color::Rgb { r: 230, g: 220, b: 200 };
const HUD_BG: Color = Color::Rgb { r: 40, g: 32, b: 48 };

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

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    /// Paint a whole row with `bg`, then write `s` from column 0.
    fn put_bar(&mut self, y: usize, s: &str, fg: Color, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::new(' ', fg, bg));
        }
        self.put_str(0, y, s, fg, bg);
    }
}

// ── Viewport: pixel → cell mapping ──

/// Terminal columns per tile.
const TILE_COLS: f32 = 4.0;
/// Terminal rows per tile.
const TILE_ROWS: f32 = 2.0;

const HUD_ROW: usize = 0;
const MAP_ROW: usize = 1;

#[derive(Clone, Copy, Debug)]
struct Viewport {
    px_per_col: f32,
    px_per_row: f32,
    cols: usize,
    rows: usize,
}

impl Viewport {
    fn for_level(level: &LevelState) -> Self {
        let ts = level.config.tile_size;
        let px_per_col = ts / TILE_COLS;
        let px_per_row = ts / TILE_ROWS;
        Viewport {
            px_per_col,
            px_per_row,
            cols: (level.config.screen_width / px_per_col).ceil() as usize,
            rows: (level.config.screen_height / px_per_row).ceil() as usize,
        }
    }

    /// Cells covered by `rect`, clipped to the viewport. Empty if off-screen.
    fn cells(&self, rect: &Rect) -> (Range<usize>, Range<usize>) {
        (
            span(rect.left(), rect.right(), self.px_per_col, self.cols),
            span(rect.top(), rect.bottom(), self.px_per_row, self.rows),
        )
    }
}

/// Cell indices touched by the pixel interval `[lo, hi)`, clipped to `0..limit`.
fn span(lo: f32, hi: f32, unit: f32, limit: usize) -> Range<usize> {
    if hi <= lo || unit <= 0.0 { return 0..0; }
    let start = (lo / unit).floor().max(0.0) as usize;
    let end = ((hi / unit).ceil().max(0.0) as usize).min(limit);
    start.min(end)..end
}

// ── Glyphs ──

fn tile_cell(kind: LayerKind, visual: Visual, frame: u64) -> Cell {
    match (kind, visual) {
        (LayerKind::Terrain, Visual::Static(0)) => Cell::new('▀', MOSS, STONE_DARK),
        (LayerKind::Terrain, _) => Cell::new('▓', STONE_LIGHT, STONE_DARK),
        (LayerKind::Pillars, _) => Cell::new('┃', PILLAR, Cell::BASE_BG),
        (LayerKind::Chains, _) => Cell::new('┊', CHAIN, Cell::BASE_BG),
        (LayerKind::Coins, _) => {
            let ch = if (frame / 10) % 2 == 0 { '●' } else { '◍' };
            Cell::new(ch, GOLD, Cell::BASE_BG)
        }
        (LayerKind::Goal, _) => Cell::new('▒', GOAL, Cell::BASE_BG),
    }
}

fn player_cell(status: PlayerStatus, facing_right: bool) -> Cell {
    let ch = match status {
        PlayerStatus::Jump => '▲',
        PlayerStatus::Fall => '▼',
        PlayerStatus::Run if facing_right => '▶',
        PlayerStatus::Run => '◀',
        PlayerStatus::Idle => '█',
    };
    Cell::new(ch, HERO, HERO_BG)
}

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_outcome: Option<Outcome>,
    enhanced_keys: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_outcome: None,
            enhanced_keys: false,
        }
    }

    /// Enter raw mode and the alternate screen. Returns whether the terminal
    /// reports key releases.
    pub fn init(&mut self) -> io::Result<bool> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        if terminal::supports_keyboard_enhancement().unwrap_or(false) {
            execute!(
                self.writer,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
            self.enhanced_keys = true;
        }

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame.
        self.back.cells.fill(Cell::INVALID);

        Ok(self.enhanced_keys)
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.enhanced_keys {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
        }
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, level: &LevelState) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.invalidate()?;
        }

        // Outcome change (or a fresh level) → clean repaint.
        if self.last_outcome != Some(level.outcome()) {
            self.invalidate()?;
            self.last_outcome = Some(level.outcome());
        }

        self.front.clear();
        self.compose(level);
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    /// Force the next frame to repaint every cell.
    pub fn invalidate(&mut self) -> io::Result<()> {
        self.back.cells.fill(Cell::INVALID);
        queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Explicit base colours; ResetColor would fall back to the terminal default.
        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

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

    // ── Compose: build front buffer content ──

    fn compose(&mut self, level: &LevelState) {
        let view = Viewport::for_level(level);

        let hud = format!(
            " {}   Coins: {:<3}  Depth: {:<4.0} {}",
            level.name,
            level.coins_collected,
            level.distance_tiles(),
            if level.goal.is_empty() { "" } else { " Find the exit ▒" },
        );
        self.front.put_bar(HUD_ROW, &hud, HUD_FG, HUD_BG);

        for layer in level.render_layers() {
            for (rect, visual) in layer.placed() {
                self.fill(&view, &rect, tile_cell(layer.kind(), visual, level.frame));
            }
        }

        let p = &level.player;
        self.fill(&view, &p.rect(), player_cell(p.status, p.facing_right));

        for (rect, visual) in level.goal.placed() {
            self.fill(&view, &rect, tile_cell(LayerKind::Goal, visual, level.frame));
        }

        self.compose_effects(&view, level);

        let msg_row = MAP_ROW + view.rows;
        match level.outcome() {
            Outcome::Running => {}
            Outcome::Won => self.front.put_bar(
                msg_row,
                &format!(" You escaped the crypt with {} coins!  [R] Play again  [Q] Quit", level.coins_collected),
                Color::Black, GOLD,
            ),
            Outcome::Lost => self.front.put_bar(
                msg_row,
                " You fell into the abyss.  [R] Retry  [Q] Quit",
                Color::White, Color::DarkRed,
            ),
        }
        self.front.put_str(
            0, msg_row + 1,
            " ←/→ A/D: Move   ↑/W/Space: Jump   R: Restart   Q/Esc: Quit",
            Color::DarkGrey, Cell::BASE_BG,
        );
    }

    /// Dust puffs: a short row of specks at the anchor that thins out with age.
    fn compose_effects(&mut self, view: &Viewport, level: &LevelState) {
        let half_w = level.config.player_width / 2.0;
        for effect in &level.effects {
            let t = effect.progress();
            let spread = match effect.kind {
                EffectKind::JumpDust => half_w * (0.5 + t),
                EffectKind::LandingDust => half_w * (1.0 + t),
            };
            let ch = if t < 0.5 { '░' } else { '·' };
            let puff = Rect::new(
                effect.anchor.x - spread,
                effect.anchor.y - view.px_per_row,
                spread * 2.0,
                view.px_per_row,
            );
            let (cols, rows) = view.cells(&puff);
            for y in rows {
                for x in cols.clone() {
                    let under = self.front.get(x, MAP_ROW + y);
                    self.front.set(x, MAP_ROW + y, Cell::new(ch, DUST, under.bg));
                }
            }
        }
    }

    fn fill(&mut self, view: &Viewport, rect: &Rect, cell: Cell) {
        let (cols, rows) = view.cells(rect);
        for y in rows {
            for x in cols.clone() {
                self.front.set(x, MAP_ROW + y, cell);
            }
        }
    }
}
