/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into the `front` buffer (array of Cell)
///   2. Compare each cell with the `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// Each grid cell is drawn two terminal columns wide so the board looks square.

use std::io::{self, BufWriter, Write};
use std::mem::{discriminant, Discriminant};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::entity::{Entity, GoodieKind, Kind, ThiefTier};
use crate::domain::grid::{Dir, Pos};
use crate::sim::session::{GameSession, Phase};
use crate::sim::world::WorldState;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for every cell, so the board never shows the
    /// terminal's own default colour between rows.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Differs from any real cell, so every position is repainted.
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
            *self = FrameBuffer::new(w, h);
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

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color) {
        for (i, ch) in s.chars().enumerate() {
            self.set(x + i, y, Cell { ch, fg, bg: Cell::BASE_BG });
        }
    }

    /// Row contents as a string (tests).
    #[cfg(test)]
    fn row_text(&self, y: usize) -> String {
        (0..self.width).map(|x| self.get(x, y).ch).collect()
    }
}

// ── Layout ──

const CELL_W: usize = 2;
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;

/// The status line shown above the board.
pub fn status_line(score: u32, level: u32, lives: u32, health: i32, ammo: u32, bonus: u32) -> String {
    format!(
        "Score: {score:07}  Level: {level:02}  Lives: {lives:2}  Health: {health:3}%  Ammo: {ammo:3}  Bonus: {bonus:4}"
    )
}

/// Draw order among entities sharing a cell: higher wins.
fn layer(kind: &Kind) -> u8 {
    match kind {
        Kind::Pea => 6,
        Kind::Patroller { .. } | Kind::Thief(_) => 5,
        Kind::Marble { .. } => 4,
        Kind::Crystal | Kind::Goodie(_) => 3,
        Kind::Spawner { .. } | Kind::Exit { .. } => 2,
        Kind::Wall => 1,
        Kind::Pit => 0,
    }
}

/// Two-column glyph for an entity. `None` for invisible ones (a hidden exit).
fn entity_glyph(e: &Entity) -> Option<(&'static str, Color)> {
    let g = match &e.kind {
        Kind::Wall => ("██", Color::DarkGrey),
        Kind::Pit => ("░░", Color::DarkBlue),
        Kind::Exit { revealed: false } => return None,
        Kind::Exit { revealed: true } => ("[]", Color::Green),
        Kind::Crystal => ("<>", Color::Cyan),
        Kind::Goodie(GoodieKind::ExtraLife) => ("1U", Color::Magenta),
        Kind::Goodie(GoodieKind::RestoreHealth) => ("HP", Color::Red),
        Kind::Goodie(GoodieKind::Ammo) => ("AM", Color::Yellow),
        Kind::Marble { .. } => ("()", Color::Grey),
        Kind::Pea => ("• ", Color::Yellow),
        Kind::Patroller { .. } => ("RB", Color::Red),
        Kind::Thief(t) if t.tier == ThiefTier::Mean => ("MT", Color::DarkYellow),
        Kind::Thief(_) => ("TB", Color::DarkCyan),
        Kind::Spawner { .. } => ("FA", Color::DarkMagenta),
    };
    Some(g)
}

fn avatar_glyph(dir: Dir) -> &'static str {
    match dir {
        Dir::Up => "▲ ",
        Dir::Down => "▼ ",
        Dir::Left => "◀ ",
        Dir::Right => "▶ ",
    }
}

/// What to draw at `pos`: the avatar, else the topmost visible entity.
fn cell_glyph(w: &WorldState, pos: Pos) -> Option<(&'static str, Color)> {
    if w.avatar.alive && w.avatar.pos == pos {
        return Some((avatar_glyph(w.avatar.dir), Color::White));
    }
    w.entities_at(pos)
        .filter_map(|e| entity_glyph(e).map(|g| (layer(&e.kind), g)))
        .max_by_key(|(l, _)| *l)
        .map(|(_, g)| g)
}

fn compose_board(buf: &mut FrameBuffer, w: &WorldState) {
    for y in 0..w.bounds.height {
        for x in 0..w.bounds.width {
            if let Some((glyph, fg)) = cell_glyph(w, Pos::new(x, y)) {
                buf.put_str(x as usize * CELL_W, MAP_ROW + y as usize, glyph, fg);
            }
        }
    }
}

/// Build a whole frame for the session's current phase.
fn compose(buf: &mut FrameBuffer, session: &GameSession) {
    let sb = &session.scoreboard;
    let (health, ammo, bonus, board_h) = match &session.world {
        Some(w) => (w.avatar.health_percent(), w.avatar.ammo, w.bonus, w.bounds.height as usize),
        None => (0, 0, 0, 0),
    };
    let hud = status_line(sb.score, session.level, sb.lives, health, ammo, bonus);
    buf.put_str(0, HUD_ROW, &hud, Color::White);

    if let Some(w) = &session.world {
        compose_board(buf, w);
    }

    let msg_row = MAP_ROW + board_h + 1;
    let (msg, fg) = match &session.phase {
        Phase::Playing => (String::new(), Color::White),
        Phase::Dying { .. } => ("Ouch! Restarting level...".to_string(), Color::Red),
        Phase::LevelComplete { .. } => ("Level complete!".to_string(), Color::Green),
        Phase::GameOver => ("GAME OVER  (Enter or Esc to quit)".to_string(), Color::Red),
        Phase::GameWon => ("You cleared every level!  (Enter or Esc to quit)".to_string(), Color::Green),
        Phase::LoadError(e) => (format!("Level error: {e}"), Color::Red),
    };
    buf.put_str(0, msg_row, &msg, fg);
    buf.put_str(
        0,
        msg_row + 1,
        "Arrows/WASD move  Space fire  F2 restart  Esc quit",
        Color::DarkGrey,
    );
}

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Discriminant<Phase>>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
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
        self.fit_terminal();
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

    /// Track the terminal size. Returns true if it changed.
    fn fit_terminal(&mut self) -> bool {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        let (tw, th) = (tw as usize, th as usize);
        if tw == self.term_w && th == self.term_h {
            return false;
        }
        self.term_w = tw;
        self.term_h = th;
        self.front.resize(tw, th);
        self.back.resize(tw, th);
        self.back.cells.fill(Cell::INVALID);
        true
    }

    pub fn render(&mut self, session: &GameSession) -> io::Result<()> {
        let phase = discriminant(&session.phase);
        let resized = self.fit_terminal();
        if resized || self.last_phase != Some(phase) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(phase);
        }

        self.front.clear();
        compose(&mut self.front, session);
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) { continue; }

                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
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
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::sim::level::test_support::world_from;
    use crate::sim::level::LevelSource;

    #[test]
    fn status_line_fixed_widths() {
        assert_eq!(
            status_line(0, 0, 3, 100, 20, 1000),
            "Score: 0000000  Level: 00  Lives:  3  Health: 100%  Ammo:  20  Bonus: 1000"
        );
        assert_eq!(
            status_line(4321, 7, 12, 40, 5, 93),
            "Score: 0004321  Level: 07  Lives: 12  Health:  40%  Ammo:   5  Bonus:   93"
        );
    }

    #[test]
    fn avatar_drawn_over_everything() {
        let w = world_from(&["@x"], 1);
        assert_eq!(cell_glyph(&w, Pos::new(0, 0)), Some(("▶ ", Color::White)));
    }

    #[test]
    fn hidden_exit_invisible_until_revealed() {
        let mut w = world_from(&["@x*"], 1);
        assert_eq!(cell_glyph(&w, Pos::new(1, 0)), None);
        for e in &mut w.entities {
            if let Kind::Exit { revealed } = &mut e.kind {
                *revealed = true;
            }
        }
        assert_eq!(cell_glyph(&w, Pos::new(1, 0)).map(|g| g.0), Some("[]"));
    }

    #[test]
    fn projectile_drawn_over_pickup() {
        let mut w = world_from(&["@*"], 1);
        w.spawn(Pos::new(1, 0), Dir::Right, Kind::Pea);
        assert_eq!(cell_glyph(&w, Pos::new(1, 0)).map(|g| g.0), Some("• "));
    }

    #[test]
    fn frame_has_hud_and_board() {
        let mut cfg = GameConfig::default();
        cfg.seed = Some(1);
        let session = GameSession::with_source(&cfg, LevelSource::Embedded);
        let mut buf = FrameBuffer::new(80, 24);
        compose(&mut buf, &session);
        assert!(buf.row_text(HUD_ROW).starts_with("Score: 0000000  Level: 00"));
        assert!(buf.row_text(MAP_ROW).starts_with("██████"));
    }
}
