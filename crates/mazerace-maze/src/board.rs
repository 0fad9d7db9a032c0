//! The immutable maze grid.

use std::fmt;
use std::str::FromStr;

use crate::{ParseError, Point, Rect, generator};

const WALL: char = '#';
const SPACE: char = ' ';
const START: char = 'S';
const END: char = 'E';

/// One cell of the grid. Start and end cells are passable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Wall,
    Space,
    Start,
    End,
}

impl Cell {
    fn from_glyph(ch: char) -> Option<Self> {
        match ch {
            WALL => Some(Self::Wall),
            SPACE => Some(Self::Space),
            START => Some(Self::Start),
            END => Some(Self::End),
            _ => None,
        }
    }

    /// The character this cell is written as.
    pub fn glyph(self) -> char {
        match self {
            Self::Wall => WALL,
            Self::Space => SPACE,
            Self::Start => START,
            Self::End => END,
        }
    }

    pub fn is_passable(self) -> bool {
        self != Self::Wall
    }
}

/// A rectangular maze with exactly one start and one end cell.
///
/// Every row has the same width. A `Board` is never modified after
/// construction; games share it behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    rows: Vec<Vec<Cell>>,
    start: Point,
    end: Point,
}

impl Board {
    /// Parses the text form: one line per row, `#` wall, space path,
    /// `S` start, `E` end.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let mut start: Option<Point> = None;
        let mut end: Option<Point> = None;
        let mut rows: Vec<Vec<Cell>> = Vec::new();
        let mut expected_width = None;

        for (y, line) in text.lines().enumerate() {
            let mut row = Vec::with_capacity(line.len());
            for (x, ch) in line.chars().enumerate() {
                let at = Point::new(x as i32, y as i32);
                let cell = Cell::from_glyph(ch)
                    .ok_or(ParseError::IllegalChar { ch, at })?;
                match cell {
                    Cell::Start => {
                        if let Some(first) = start {
                            return Err(ParseError::DuplicateStart {
                                first,
                                second: at,
                            });
                        }
                        start = Some(at);
                    }
                    Cell::End => {
                        if let Some(first) = end {
                            return Err(ParseError::DuplicateEnd {
                                first,
                                second: at,
                            });
                        }
                        end = Some(at);
                    }
                    Cell::Wall | Cell::Space => {}
                }
                row.push(cell);
            }

            let expected = *expected_width.get_or_insert(row.len());
            if row.len() != expected {
                return Err(ParseError::RaggedRow {
                    row: y,
                    expected,
                    found: row.len(),
                });
            }
            rows.push(row);
        }

        if rows.is_empty() {
            return Err(ParseError::Empty);
        }
        let start = start.ok_or(ParseError::MissingStart)?;
        let end = end.ok_or(ParseError::MissingEnd)?;

        Ok(Self { rows, start, end })
    }

    /// Generates a maze of `width` × `height` maze cells from `seed` and
    /// validates it through [`Board::parse`].
    pub fn generate(
        seed: u64,
        width: usize,
        height: usize,
    ) -> Result<Self, ParseError> {
        Self::parse(&generator::generate(seed, width, height))
    }

    /// Width in grid cells.
    pub fn width(&self) -> i32 {
        self.rows.first().map_or(0, |row| row.len() as i32)
    }

    /// Height in grid cells.
    pub fn height(&self) -> i32 {
        self.rows.len() as i32
    }

    pub fn start(&self) -> Point {
        self.start
    }

    pub fn end(&self) -> Point {
        self.end
    }

    /// The cell at `p`, or `None` when `p` is off the board.
    pub fn cell(&self, p: Point) -> Option<Cell> {
        let x = usize::try_from(p.x).ok()?;
        let y = usize::try_from(p.y).ok()?;
        self.rows.get(y)?.get(x).copied()
    }

    /// `true` iff `p` is on the board and not a wall.
    pub fn is_path(&self, p: Point) -> bool {
        self.cell(p).is_some_and(Cell::is_passable)
    }

    /// Clamps `r` to the board. Each edge is clamped on its own, so a
    /// window near a border shrinks instead of shifting.
    pub fn window_rect(&self, r: Rect) -> Rect {
        Rect::new(
            Point::new(r.top_left.x.max(0), r.top_left.y.max(0)),
            Point::new(
                r.bottom_right.x.min(self.width() - 1),
                r.bottom_right.y.min(self.height() - 1),
            ),
        )
    }

    /// Copies the glyphs inside `r`, which must already be clamped with
    /// [`Board::window_rect`]. Parts of `r` off the board are skipped.
    pub fn slice(&self, r: Rect) -> Vec<Vec<char>> {
        (r.top_left.y..=r.bottom_right.y)
            .filter_map(|y| {
                let row = self.rows.get(usize::try_from(y).ok()?)?;
                Some(
                    (r.top_left.x..=r.bottom_right.x)
                        .filter_map(|x| {
                            row.get(usize::try_from(x).ok()?).map(|c| c.glyph())
                        })
                        .collect(),
                )
            })
            .collect()
    }
}

impl FromStr for Board {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.rows.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            for cell in row {
                write!(f, "{}", cell.glyph())?;
            }
        }
        Ok(())
    }
}
