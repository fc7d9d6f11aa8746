//! Grid pathfinding using A*.
//!
//! Four-connected moves, uniform step cost and the Manhattan heuristic,
//! which is admissible and consistent here, so the first time the goal is
//! popped its path is optimal.
//!
//! Nodes with equal `f` are ordered by smaller heuristic first (prefer the
//! node closer to the goal), then by row-major coordinate. The order is
//! therefore fully deterministic and does not depend on discovery order.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

use crate::board::{Board, Pos, Tile};
use crate::constants::{N, TILE_COUNT};

/// A node in the A* open set.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
struct Node {
    pos: Pos,
    f: i32,
    h: i32,
}

impl Ord for Node {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap: reverse every key for min-first.
        other
            .f
            .cmp(&self.f)
            .then_with(|| other.h.cmp(&self.h))
            .then_with(|| (other.pos.y, other.pos.x).cmp(&(self.pos.y, self.pos.x)))
    }
}

impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[inline]
fn slot(pos: Pos) -> usize {
    (pos.y * N + pos.x) as usize
}

/// Find a shortest walkable path from `start` to `goal`.
///
/// The returned tiles exclude `start` and end on `goal`. `start == goal`
/// yields an empty path. `None` means the goal cannot be reached: it is off
/// the grid, void, in `blocked`, or walled off. Tiles in `blocked` are never
/// stepped on; `start` itself is exempt.
pub fn find_path(board: &Board, start: Pos, goal: Pos, blocked: &HashSet<Pos>) -> Option<Vec<Tile>> {
    if !start.in_bounds() {
        return None;
    }
    if start == goal {
        return Some(Vec::new());
    }
    let goal_tile = board.tile_at(goal)?;
    if !goal_tile.state.is_walkable() || blocked.contains(&goal) {
        return None;
    }

    let mut g_score = [i32::MAX; TILE_COUNT];
    let mut came_from: [Option<Pos>; TILE_COUNT] = [None; TILE_COUNT];
    let mut closed = [false; TILE_COUNT];
    let mut open = BinaryHeap::new();

    g_score[slot(start)] = 0;
    open.push(Node {
        pos: start,
        f: start.distance(goal),
        h: start.distance(goal),
    });

    while let Some(current) = open.pop() {
        if current.pos == goal {
            return Some(reconstruct(board, &came_from, start, goal));
        }
        let ci = slot(current.pos);
        if closed[ci] {
            continue;
        }
        closed[ci] = true;

        let tentative = g_score[ci] + 1;
        for tile in board.neighbors(current.pos) {
            let ni = slot(tile.pos);
            if closed[ni] || blocked.contains(&tile.pos) {
                continue;
            }
            if tentative < g_score[ni] {
                g_score[ni] = tentative;
                came_from[ni] = Some(current.pos);
                let h = tile.pos.distance(goal);
                open.push(Node {
                    pos: tile.pos,
                    f: tentative + h,
                    h,
                });
            }
        }
    }

    None
}

/// Walk the predecessor links back from `goal` to `start`.
fn reconstruct(board: &Board, came_from: &[Option<Pos>; TILE_COUNT], start: Pos, goal: Pos) -> Vec<Tile> {
    let mut path = Vec::new();
    let mut current = goal;
    while current != start {
        if let Some(tile) = board.tile_at(current) {
            path.push(tile);
        }
        match came_from[slot(current)] {
            Some(prev) => current = prev,
            None => break,
        }
    }
    path.reverse();
    path
}

/// First step on a shortest path, if the goal is reachable and distinct
/// from `start`.
pub fn next_step(board: &Board, start: Pos, goal: Pos, blocked: &HashSet<Pos>) -> Option<Pos> {
    find_path(board, start, goal, blocked)?.first().map(|t| t.pos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::TileState;

    fn board(rows: &[&str]) -> Board {
        Board::from_rows(rows).unwrap()
    }

    fn open() -> Board {
        Board::new()
    }

    #[test]
    fn test_same_start_and_goal() {
        let path = find_path(&open(), Pos::new(3, 3), Pos::new(3, 3), &HashSet::new());
        assert_eq!(path, Some(vec![]));
    }

    #[test]
    fn test_straight_line() {
        let path = find_path(&open(), Pos::new(0, 0), Pos::new(5, 0), &HashSet::new()).unwrap();
        assert_eq!(path.len(), 5);
        assert_eq!(path.last().unwrap().pos, Pos::new(5, 0));
        assert!(path.iter().all(|t| t.pos != Pos::new(0, 0)));
    }

    #[test]
    fn test_detour_around_wall() {
        let b = board(&[
            "..#.........",
            "..#.........",
            "..#.........",
            "............",
            "............",
            "............",
            "............",
            "............",
            "............",
            "............",
            "............",
            "............",
        ]);
        let path = find_path(&b, Pos::new(0, 0), Pos::new(4, 0), &HashSet::new()).unwrap();
        // Down 3, across 4, up 3.
        assert_eq!(path.len(), 10);
        assert!(path.iter().all(|t| t.state != TileState::Void));
    }

    #[test]
    fn test_blocked_tiles_avoided() {
        let blocked: HashSet<Pos> = [Pos::new(1, 0), Pos::new(1, 1)].into_iter().collect();
        let path = find_path(&open(), Pos::new(0, 0), Pos::new(2, 0), &blocked).unwrap();
        assert_eq!(path.len(), 6);
        assert!(path.iter().all(|t| !blocked.contains(&t.pos)));
    }

    #[test]
    fn test_walled_in_goal() {
        let b = board(&[
            "............",
            "............",
            "............",
            "............",
            ".....#......",
            "....#.#.....",
            ".....#......",
            "............",
            "............",
            "............",
            "............",
            "............",
        ]);
        assert!(find_path(&b, Pos::new(0, 0), Pos::new(5, 5), &HashSet::new()).is_none());
    }

    #[test]
    fn test_goal_enclosed_by_blocked_set() {
        let goal = Pos::new(6, 6);
        let blocked: HashSet<Pos> = goal.orthogonal().into_iter().collect();
        assert!(find_path(&open(), Pos::new(0, 0), goal, &blocked).is_none());
    }

    #[test]
    fn test_goal_void_or_blocked() {
        let mut b = open();
        b.set_state(Pos::new(4, 4), TileState::Void);
        assert!(find_path(&b, Pos::new(0, 0), Pos::new(4, 4), &HashSet::new()).is_none());
        let blocked: HashSet<Pos> = [Pos::new(2, 2)].into_iter().collect();
        assert!(find_path(&b, Pos::new(0, 0), Pos::new(2, 2), &blocked).is_none());
        assert!(find_path(&b, Pos::new(0, 0), Pos::new(12, 2), &HashSet::new()).is_none());
    }

    #[test]
    fn test_deterministic_tie_break() {
        let a = find_path(&open(), Pos::new(0, 0), Pos::new(3, 3), &HashSet::new());
        let b = find_path(&open(), Pos::new(0, 0), Pos::new(3, 3), &HashSet::new());
        assert_eq!(a, b);
    }

    #[test]
    fn test_next_step() {
        let step = next_step(&open(), Pos::new(0, 0), Pos::new(0, 4), &HashSet::new());
        assert_eq!(step, Some(Pos::new(0, 1)));
        assert_eq!(next_step(&open(), Pos::new(1, 1), Pos::new(1, 1), &HashSet::new()), None);
    }
}
