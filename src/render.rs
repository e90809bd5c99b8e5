//! Terminal drawing: bodies are rasterised onto a character canvas scaled to the
//! terminal, and only cells that changed since the last frame are redrawn.

use std::io::{self, Write};

use crossterm::cursor::MoveTo;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{Clear, ClearType};
use crossterm::QueueableCommand;
use unicode_width::UnicodeWidthStr;

use crate::game::MatchState;
use crate::physics::{Body, BodyTag, Shape, Style};
use crate::player::Player;

const MIN_COLS: u16 = 24;
const MIN_ROWS: u16 = 8;
const MAX_COLS: u16 = 120;
const MAX_ROWS: u16 = 40;
const HUD_ROWS: u16 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Glyph {
    Empty,
    Wall,
    Goal,
    Avatar,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    pub glyph: Glyph,
    pub style: Style,
}

impl Cell {
    const EMPTY: Cell = Cell {
        glyph: Glyph::Empty,
        style: Style::Plain,
    };
}

/// Character grid the world is projected onto.
#[derive(Clone, Debug)]
pub struct Canvas {
    cols: usize,
    rows: usize,
    cells: Vec<Cell>,
}

impl Canvas {
    pub fn new(cols: usize, rows: usize) -> Self {
        Self {
            cols,
            rows,
            cells: vec![Cell::EMPTY; cols * rows],
        }
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn get(&self, x: usize, y: usize) -> Cell {
        self.cells[y * self.cols + x]
    }

    /// Redraws the canvas from scratch. Avatars are painted over everything else.
    pub fn rasterize(&mut self, bodies: &[Body], world_w: f32, world_h: f32) {
        self.cells.fill(Cell::EMPTY);
        let sx = self.cols as f32 / world_w;
        let sy = self.rows as f32 / world_h;

        let (circles, rects): (Vec<&Body>, Vec<&Body>) = bodies
            .iter()
            .partition(|b| matches!(b.shape, Shape::Circle { .. }));
        for body in rects.into_iter().chain(circles) {
            let cell = Cell {
                glyph: glyph_for(body.tag),
                style: body.style,
            };
            match body.shape {
                Shape::Rect { .. } => self.fill_rect(body, sx, sy, cell),
                Shape::Circle { radius } => self.fill_circle(body, radius, sx, sy, cell),
            }
        }
    }

    fn fill_rect(&mut self, body: &Body, sx: f32, sy: f32, cell: Cell) {
        let b = body.bounds();
        let Some((x0, x1)) = span(b.left() * sx, b.right() * sx, self.cols) else {
            return;
        };
        let Some((y0, y1)) = span(b.top() * sy, b.bottom() * sy, self.rows) else {
            return;
        };
        for y in y0..=y1 {
            for x in x0..=x1 {
                self.cells[y * self.cols + x] = cell;
            }
        }
    }

    fn fill_circle(&mut self, body: &Body, radius: f32, sx: f32, sy: f32, cell: Cell) {
        let b = body.bounds();
        let Some((x0, x1)) = span(b.left() * sx, b.right() * sx, self.cols) else {
            return;
        };
        let Some((y0, y1)) = span(b.top() * sy, b.bottom() * sy, self.rows) else {
            return;
        };
        let c = body.position;
        for y in y0..=y1 {
            for x in x0..=x1 {
                let dx = (x as f32 + 0.5) / sx - c.x;
                let dy = (y as f32 + 0.5) / sy - c.y;
                if dx.hypot(dy) <= radius {
                    self.cells[y * self.cols + x] = cell;
                }
            }
        }
        // Small avatars still occupy the cell holding their centre.
        let cx = (c.x * sx).floor();
        let cy = (c.y * sy).floor();
        if cx >= 0.0 && cy >= 0.0 && (cx as usize) < self.cols && (cy as usize) < self.rows {
            self.cells[cy as usize * self.cols + cx as usize] = cell;
        }
    }
}

/// Inclusive cell range covered by `[lo, hi]` in canvas units, clipped to `len`.
fn span(lo: f32, hi: f32, len: usize) -> Option<(usize, usize)> {
    if hi < 0.0 || lo >= len as f32 || len == 0 {
        return None;
    }
    let first = lo.floor().max(0.0) as usize;
    let last = (hi.ceil() as usize).saturating_sub(1).max(first).min(len - 1);
    Some((first.min(len - 1), last))
}

fn glyph_for(tag: BodyTag) -> Glyph {
    match tag {
        BodyTag::Boundary | BodyTag::Wall => Glyph::Wall,
        BodyTag::Goal => Glyph::Goal,
        BodyTag::Avatar(_) => Glyph::Avatar,
    }
}

fn color_for(style: Style) -> Color {
    match style {
        Style::Plain => Color::Grey,
        Style::Orange => Color::DarkYellow,
        Style::Red => Color::Red,
        Style::Green => Color::Green,
        Style::Blue => Color::Blue,
    }
}

/// Scores, round number and the winner banner.
pub fn hud_line(state: &MatchState) -> String {
    let mut hud = format!(
        "{} {}  {} {}  round {}",
        Player::One.name(),
        state.score(Player::One),
        Player::Two.name(),
        state.score(Player::Two),
        state.round().number
    );
    if let Some(label) = state.winner_label() {
        hud.push_str("  ");
        hud.push_str(&label.to_uppercase());
    }
    hud.push_str("  (wasd / arrows, q to quit)");
    hud
}

pub struct Renderer {
    canvas: Canvas,
    last: Vec<Cell>,
    last_hud: String,
    needs_full: bool,
    origin_x: u16,
    origin_y: u16,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer {
    pub fn new() -> Self {
        Self {
            canvas: Canvas::new(0, 0),
            last: Vec::new(),
            last_hud: String::new(),
            needs_full: true,
            origin_x: 0,
            origin_y: HUD_ROWS,
        }
    }

    /// Draws one frame for a terminal of `term_w x term_h` characters.
    pub fn draw<W: Write>(
        &mut self,
        out: &mut W,
        (term_w, term_h): (u16, u16),
        hud: &str,
        bodies: &[Body],
        (world_w, world_h): (f32, f32),
    ) -> io::Result<()> {
        out.queue(MoveTo(0, 0))?;

        if term_w < MIN_COLS || term_h < MIN_ROWS + HUD_ROWS {
            out.queue(Clear(ClearType::All))?;
            let msg = format!(
                "Terminal too small. Need at least {}x{} (cols x rows). Current: {}x{}.",
                MIN_COLS,
                MIN_ROWS + HUD_ROWS,
                term_w,
                term_h
            );
            out.queue(Print(msg))?;
            out.flush()?;
            self.needs_full = true;
            return Ok(());
        }

        let cols = term_w.min(MAX_COLS);
        let rows = (term_h - HUD_ROWS).min(MAX_ROWS);
        if cols as usize != self.canvas.cols() || rows as usize != self.canvas.rows() {
            self.canvas = Canvas::new(cols as usize, rows as usize);
            self.last = vec![Cell::EMPTY; cols as usize * rows as usize];
            self.needs_full = true;
        }
        let origin_x = (term_w - cols) / 2;
        let origin_y = (term_h - HUD_ROWS - rows) / 2 + HUD_ROWS;
        if origin_x != self.origin_x || origin_y != self.origin_y {
            self.origin_x = origin_x;
            self.origin_y = origin_y;
            self.needs_full = true;
        }
        if self.needs_full {
            out.queue(Clear(ClearType::All))?;
        }

        if self.needs_full || hud != self.last_hud {
            let width = UnicodeWidthStr::width(hud);
            let x = self.origin_x + (cols.saturating_sub(width as u16)) / 2;
            out.queue(MoveTo(self.origin_x, self.origin_y - HUD_ROWS))?;
            out.queue(Clear(ClearType::CurrentLine))?;
            out.queue(MoveTo(x, self.origin_y - HUD_ROWS))?;
            out.queue(SetForegroundColor(Color::White))?;
            out.queue(Print(hud))?;
            out.queue(ResetColor)?;
            self.last_hud = hud.to_string();
        }

        self.canvas.rasterize(bodies, world_w, world_h);
        for y in 0..self.canvas.rows() {
            for x in 0..self.canvas.cols() {
                let cell = self.canvas.get(x, y);
                let idx = y * self.canvas.cols() + x;
                if self.needs_full || cell != self.last[idx] {
                    self.last[idx] = cell;
                    self.draw_cell(out, x, y, cell)?;
                }
            }
        }
        self.needs_full = false;

        out.flush()
    }

    fn draw_cell<W: Write>(&self, out: &mut W, x: usize, y: usize, cell: Cell) -> io::Result<()> {
        let text = match cell.glyph {
            Glyph::Empty => " ",
            Glyph::Wall => "█",
            Glyph::Goal => "▓",
            Glyph::Avatar => "●",
        };
        out.queue(MoveTo(self.origin_x + x as u16, self.origin_y + y as u16))?;
        out.queue(SetForegroundColor(color_for(cell.style)))?;
        out.queue(Print(text))?;
        out.queue(ResetColor)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Point, Rect};
    use crate::physics::{BodySpec, PhysicsEngine, World};

    fn world_with(specs: &[BodySpec]) -> World {
        let mut world = World::new();
        for spec in specs {
            world.add_body(*spec);
        }
        world
    }

    #[test]
    fn boundary_lands_on_canvas_edges() {
        let world = world_with(&[
            BodySpec::rect(BodyTag::Boundary, Rect::new(50.0, 0.0, 100.0, 1.0), Style::Plain),
            BodySpec::rect(BodyTag::Boundary, Rect::new(100.0, 25.0, 1.0, 50.0), Style::Plain),
        ]);
        let mut canvas = Canvas::new(20, 10);
        canvas.rasterize(world.bodies(), 100.0, 50.0);
        for x in 0..20 {
            assert_eq!(canvas.get(x, 0).glyph, Glyph::Wall, "top row at {}", x);
        }
        for y in 0..10 {
            assert_eq!(canvas.get(19, y).glyph, Glyph::Wall, "right column at {}", y);
        }
        assert_eq!(canvas.get(5, 5).glyph, Glyph::Empty);
    }

    #[test]
    fn avatars_are_drawn_over_walls() {
        let world = world_with(&[
            BodySpec::circle(
                BodyTag::Avatar(Player::Two),
                Point::new(50.0, 25.0),
                1.0,
                Style::Blue,
            ),
            BodySpec::rect(BodyTag::Wall, Rect::new(50.0, 25.0, 20.0, 20.0), Style::Orange),
        ]);
        let mut canvas = Canvas::new(20, 10);
        canvas.rasterize(world.bodies(), 100.0, 50.0);
        assert_eq!(
            canvas.get(10, 5),
            Cell {
                glyph: Glyph::Avatar,
                style: Style::Blue
            }
        );
        assert_eq!(canvas.get(8, 4).glyph, Glyph::Wall);
    }

    #[test]
    fn bodies_outside_the_world_are_clipped() {
        let world = world_with(&[BodySpec::rect(
            BodyTag::Wall,
            Rect::new(50.0, 400.0, 10.0, 10.0),
            Style::Orange,
        )]);
        let mut canvas = Canvas::new(20, 10);
        canvas.rasterize(world.bodies(), 100.0, 50.0);
        assert!((0..10).all(|y| (0..20).all(|x| canvas.get(x, y).glyph == Glyph::Empty)));
    }

    #[test]
    fn unchanged_frames_redraw_nothing() {
        let world = world_with(&[BodySpec::rect(
            BodyTag::Goal,
            Rect::new(50.0, 25.0, 10.0, 10.0),
            Style::Red,
        )]);
        let mut renderer = Renderer::new();
        let mut first = Vec::new();
        renderer
            .draw(&mut first, (40, 20), "hud", world.bodies(), (100.0, 50.0))
            .unwrap();
        let mut second = Vec::new();
        renderer
            .draw(&mut second, (40, 20), "hud", world.bodies(), (100.0, 50.0))
            .unwrap();
        assert!(second.len() < first.len());
        assert!(!String::from_utf8_lossy(&second).contains('▓'));
        assert!(String::from_utf8_lossy(&first).contains('▓'));
    }

    #[test]
    fn tiny_terminal_gets_a_message() {
        let mut renderer = Renderer::new();
        let mut out = Vec::new();
        renderer.draw(&mut out, (10, 5), "hud", &[], (100.0, 50.0)).unwrap();
        assert!(String::from_utf8_lossy(&out).contains("Terminal too small"));
    }
}
