//! Integration tests: generated boards played end to end.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use mazerace_maze::{Board, Game, Outcome, Point, generate};
use mazerace_protocol::{Direction, Token};

/// Shortest list of moves from `from` to `to`, found by BFS.
fn route(board: &Board, from: Point, to: Point) -> Vec<Direction> {
    let mut came_from: HashMap<Point, (Point, Direction)> = HashMap::new();
    let mut queue = VecDeque::from([from]);
    while let Some(p) = queue.pop_front() {
        if p == to {
            break;
        }
        for dir in Direction::ALL {
            let q = p.translate(dir);
            if q != from && board.is_path(q) && !came_from.contains_key(&q) {
                came_from.insert(q, (p, dir));
                queue.push_back(q);
            }
        }
    }

    let mut moves = Vec::new();
    let mut at = to;
    while at != from {
        let (prev, dir) = came_from[&at];
        moves.push(dir);
        at = prev;
    }
    moves.reverse();
    moves
}

#[test]
fn test_generated_board_text_keeps_wall_layout() {
    let raw = generate(2024, 9, 6);
    let board = Board::parse(&raw).unwrap();

    let strip = |s: &str| s.replace(['S', 'E'], " ");
    assert_eq!(strip(&board.to_string()), strip(&raw));

    // Cell by cell against the generator's own text.
    for (y, line) in raw.lines().enumerate() {
        for (x, ch) in line.chars().enumerate() {
            let p = Point::new(x as i32, y as i32);
            assert_eq!(board.is_path(p), ch != '#', "cell {p:?} was {ch:?}");
        }
    }
}

#[test]
fn test_race_through_generated_maze() {
    let board = Arc::new(Board::generate(5, 6, 4).unwrap());
    let moves = route(&board, board.start(), board.end());
    assert!(!moves.is_empty());

    let (a, b) = (Token('@'), Token('$'));
    let mut game = Game::new(Arc::clone(&board), Point::new(9, 9))
        .with_player(a)
        .unwrap()
        .with_player(b)
        .unwrap();

    for dir in &moves {
        game = game.step(b, *dir).unwrap();
    }
    assert_eq!(game.outcome(), Outcome::Finished { winner: b });

    for dir in &moves {
        game = game.step(a, *dir).unwrap();
    }
    assert_eq!(game.winner(), Some(b));
    assert_eq!(game.player(a).unwrap().pos, board.end());
    assert_eq!(game.solved_times().len(), 2);
}

#[test]
fn test_every_window_shows_its_owner() {
    let board = Arc::new(Board::generate(8, 5, 5).unwrap());
    let tokens = [Token('@'), Token('$'), Token('%')];
    let mut game = Game::new(board, Point::new(5, 5));
    for t in tokens {
        game = game.with_player(t).unwrap();
    }
    game = game.step(Token('$'), Direction::Right).unwrap();

    for t in tokens {
        let window = game.window(t).unwrap();
        assert!(window.contains(t.glyph()), "{t} missing from its window");
        assert!(window.lines().all(|l| l.len() == window.lines().next().unwrap().len()));
    }
}
