//! Grid coordinates and inclusive rectangles.

use std::fmt;

use mazerace_protocol::Direction;

/// An integer grid coordinate. `x` grows to the right, `y` grows down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The neighbouring point one step in `dir`.
    pub fn translate(self, dir: Direction) -> Self {
        match dir {
            Direction::Left => Self::new(self.x - 1, self.y),
            Direction::Right => Self::new(self.x + 1, self.y),
            Direction::Up => Self::new(self.x, self.y - 1),
            Direction::Down => Self::new(self.x, self.y + 1),
        }
    }

    pub fn offset(self, by: Point) -> Self {
        Self::new(self.x + by.x, self.y + by.y)
    }

    /// This point expressed relative to `origin`.
    pub fn rel(self, origin: Point) -> Self {
        Self::new(self.x - origin.x, self.y - origin.y)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A rectangle with inclusive bounds on both corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub top_left: Point,
    pub bottom_right: Point,
}

impl Rect {
    pub const fn new(top_left: Point, bottom_right: Point) -> Self {
        Self {
            top_left,
            bottom_right,
        }
    }

    /// A rect of `size` centered on `center`.
    ///
    /// Half-extents use integer division, so an even size yields a window
    /// one cell larger than requested, centered on the floor midpoint.
    pub fn from_center_and_size(center: Point, size: Point) -> Self {
        let half = Point::new(size.x / 2, size.y / 2);
        Self {
            top_left: Point::new(center.x - half.x, center.y - half.y),
            bottom_right: center.offset(half),
        }
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.top_left.x
            && p.x <= self.bottom_right.x
            && p.y >= self.top_left.y
            && p.y <= self.bottom_right.y
    }

    pub fn width(&self) -> i32 {
        self.bottom_right.x - self.top_left.x + 1
    }

    pub fn height(&self) -> i32 {
        self.bottom_right.y - self.top_left.y + 1
    }
}
