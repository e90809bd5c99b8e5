//! Maps a carved passage set onto wall rectangles in continuous world space.

use crate::grid::Passages;
use crate::player::Player;

/// Thickness of the walls between cells.
pub const WALL_THICKNESS: f32 = 4.0;
/// Thickness of the four walls enclosing the world.
pub const BOUNDARY_THICKNESS: f32 = 1.0;
/// Goal size relative to one cell.
pub const GOAL_SCALE: f32 = 0.7;

#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }

    pub fn dot(self, other: Point) -> f32 {
        self.x * other.x + self.y * other.y
    }

    pub fn scale(self, k: f32) -> Point {
        Point::new(self.x * k, self.y * k)
    }
}

impl std::ops::Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Axis-aligned rectangle given by its centre and size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub center: Point,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        Self {
            center: Point::new(cx, cy),
            width,
            height,
        }
    }

    pub fn left(&self) -> f32 {
        self.center.x - self.width / 2.0
    }

    pub fn right(&self) -> f32 {
        self.center.x + self.width / 2.0
    }

    pub fn top(&self) -> f32 {
        self.center.y - self.height / 2.0
    }

    pub fn bottom(&self) -> f32 {
        self.center.y + self.height / 2.0
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left() && p.x <= self.right() && p.y >= self.top() && p.y <= self.bottom()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WallKind {
    /// One of the four walls enclosing the world. Stays put when a round ends.
    Boundary,
    /// A closed boundary between two cells.
    Maze,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WallSegment {
    pub rect: Rect,
    pub orientation: Orientation,
    pub kind: WallKind,
}

/// Everything placed in the world for one round.
#[derive(Clone, Debug, PartialEq)]
pub struct Layout {
    pub width: f32,
    pub height: f32,
    pub cell_width: f32,
    pub cell_height: f32,
    /// Boundary walls first, then horizontal maze walls, then vertical ones.
    pub walls: Vec<WallSegment>,
    pub goal: Rect,
    pub start1: Point,
    pub start2: Point,
}

impl Layout {
    pub fn start(&self, player: Player) -> Point {
        match player {
            Player::One => self.start1,
            Player::Two => self.start2,
        }
    }

    pub fn maze_walls(&self) -> impl Iterator<Item = &WallSegment> {
        self.walls.iter().filter(|w| w.kind == WallKind::Maze)
    }
}

/// Derives wall, goal and start placements for a `width x height` world.
///
/// Every closed boundary becomes one wall, centred on the shared cell edge.
pub fn derive_geometry(passages: &Passages, width: f32, height: f32) -> Layout {
    assert!(
        width > 0.0 && height > 0.0,
        "world size must be positive, got {}x{}",
        width,
        height
    );
    let dims = passages.dims();
    let rows = dims.rows();
    let cell_w = width / dims.cols() as f32;
    let cell_h = height / rows as f32;

    let mut walls = Vec::with_capacity(4 + dims.boundary_count());
    walls.extend(boundary(width, height));

    for (i, row) in passages.horizontal().iter().enumerate() {
        for (k, open) in row.iter().enumerate() {
            if !open {
                walls.push(WallSegment {
                    rect: Rect::new(
                        cell_w / 2.0 + cell_w * k as f32,
                        cell_h + cell_h * i as f32,
                        cell_w,
                        WALL_THICKNESS,
                    ),
                    orientation: Orientation::Horizontal,
                    kind: WallKind::Maze,
                });
            }
        }
    }

    for (i, row) in passages.vertical().iter().enumerate() {
        for (k, open) in row.iter().enumerate() {
            if !open {
                walls.push(WallSegment {
                    rect: Rect::new(
                        cell_w + cell_w * k as f32,
                        cell_h / 2.0 + cell_h * i as f32,
                        WALL_THICKNESS,
                        cell_h,
                    ),
                    orientation: Orientation::Vertical,
                    kind: WallKind::Maze,
                });
            }
        }
    }

    let goal = Rect::new(
        width - cell_w / 2.0,
        (rows / 2) as f32 * cell_h + cell_h / 2.0,
        cell_w * GOAL_SCALE,
        cell_h * GOAL_SCALE,
    );

    Layout {
        width,
        height,
        cell_width: cell_w,
        cell_height: cell_h,
        walls,
        goal,
        start1: Point::new(cell_w / 2.0, cell_h / 2.0),
        start2: Point::new(cell_w / 2.0, height - cell_h / 2.0),
    }
}

fn boundary(width: f32, height: f32) -> [WallSegment; 4] {
    let horizontal = |cy| WallSegment {
        rect: Rect::new(width / 2.0, cy, width, BOUNDARY_THICKNESS),
        orientation: Orientation::Horizontal,
        kind: WallKind::Boundary,
    };
    let vertical = |cx| WallSegment {
        rect: Rect::new(cx, height / 2.0, BOUNDARY_THICKNESS, height),
        orientation: Orientation::Vertical,
        kind: WallKind::Boundary,
    };
    [
        horizontal(0.0),
        horizontal(height),
        vertical(0.0),
        vertical(width),
    ]
}
