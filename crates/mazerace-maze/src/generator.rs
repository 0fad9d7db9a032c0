//! Maze generation.
//!
//! Produces the text form consumed by [`Board::parse`](crate::Board::parse):
//! a `width` × `height` grid of maze cells becomes a
//! `(2 * width + 1)` × `(2 * height + 1)` block of walls with passages
//! carved by a randomized depth-first walk. The start opening is on the
//! left wall next to the top-left cell, the end opening on the right wall
//! next to the bottom-right cell.

use mazerace_protocol::Direction;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Generates the text of a perfect maze. The same seed and size always
/// yield the same maze. A zero dimension yields a grid with no markers,
/// which the parser rejects.
pub fn generate(seed: u64, width: usize, height: usize) -> String {
    let cols = 2 * width + 1;
    let rows = 2 * height + 1;
    let mut grid = vec![vec!['#'; cols]; rows];

    if width > 0 && height > 0 {
        carve(&mut grid, &mut StdRng::seed_from_u64(seed), width, height);
        grid[1][0] = 'S';
        grid[rows - 2][cols - 1] = 'E';
    }
    tracing::debug!(seed, width, height, "generated maze");

    grid.into_iter()
        .map(|row| row.into_iter().collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Iterative recursive-backtracker over maze cells. Cell `(cx, cy)` sits
/// at grid position `(2cx + 1, 2cy + 1)`.
fn carve(grid: &mut [Vec<char>], rng: &mut StdRng, width: usize, height: usize) {
    let mut visited = vec![vec![false; width]; height];
    let mut stack = vec![(0usize, 0usize)];
    visited[0][0] = true;
    grid[1][1] = ' ';

    while let Some(&(cx, cy)) = stack.last() {
        let mut dirs = Direction::ALL;
        dirs.shuffle(rng);

        let next = dirs.into_iter().find_map(|dir| {
            neighbour(cx, cy, dir, width, height)
                .filter(|&(nx, ny)| !visited[ny][nx])
        });

        match next {
            Some((nx, ny)) => {
                visited[ny][nx] = true;
                // Knock down the wall between the two cells.
                grid[cy + ny + 1][cx + nx + 1] = ' ';
                grid[2 * ny + 1][2 * nx + 1] = ' ';
                stack.push((nx, ny));
            }
            None => {
                stack.pop();
            }
        }
    }
}

fn neighbour(
    x: usize,
    y: usize,
    dir: Direction,
    width: usize,
    height: usize,
) -> Option<(usize, usize)> {
    match dir {
        Direction::Left => x.checked_sub(1).map(|x| (x, y)),
        Direction::Right => (x + 1 < width).then_some((x + 1, y)),
        Direction::Up => y.checked_sub(1).map(|y| (x, y)),
        Direction::Down => (y + 1 < height).then_some((x, y + 1)),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashSet, VecDeque};

    use super::*;
    use crate::{Board, ParseError, Point};

    fn reachable(board: &Board, from: Point) -> HashSet<Point> {
        let mut seen = HashSet::from([from]);
        let mut queue = VecDeque::from([from]);
        while let Some(p) = queue.pop_front() {
            for dir in Direction::ALL {
                let q = p.translate(dir);
                if board.is_path(q) && seen.insert(q) {
                    queue.push_back(q);
                }
            }
        }
        seen
    }

    #[test]
    fn test_generated_board_has_expected_dimensions() {
        let board = Board::generate(7, 10, 5).unwrap();
        assert_eq!(board.width(), 21);
        assert_eq!(board.height(), 11);
        assert_eq!(board.start(), Point::new(0, 1));
        assert_eq!(board.end(), Point::new(20, 9));
    }

    #[test]
    fn test_generated_maze_connects_start_to_every_cell() {
        let board = Board::generate(42, 8, 6).unwrap();
        let seen = reachable(&board, board.start());
        assert!(seen.contains(&board.end()));
        for cy in 0..6 {
            for cx in 0..8 {
                assert!(seen.contains(&Point::new(2 * cx + 1, 2 * cy + 1)));
            }
        }
    }

    #[test]
    fn test_same_seed_same_maze() {
        assert_eq!(generate(99, 6, 4), generate(99, 6, 4));
    }

    #[test]
    fn test_generated_text_round_trips_through_parser() {
        let text = generate(3, 5, 5);
        let board = Board::parse(&text).unwrap();
        assert_eq!(board.to_string(), text);
    }

    #[test]
    fn test_zero_sized_maze_is_rejected_by_parser() {
        assert_eq!(Board::generate(1, 0, 4).unwrap_err(), ParseError::MissingStart);
    }

    #[test]
    fn test_single_cell_maze() {
        let board = Board::generate(0, 1, 1).unwrap();
        assert_eq!(board.to_string(), "###\nS E\n###");
    }
}
