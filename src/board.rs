//! The 12x12 tile grid: coordinates, tile states and neighbor queries.

use std::fmt;
use std::ops::Index;

use crate::constants::{N, TILE_COUNT};
use crate::error::{GameError, Result};

/// A grid coordinate. Signed so neighbor offsets can step off the board
/// before the bounds check rejects them.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pos {
    pub x: i32,
    pub y: i32,
}

impl Pos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance, the true step count on an open grid.
    #[inline]
    pub fn distance(self, other: Pos) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// Squared Euclidean distance, used for cheap tie-break ranking.
    #[inline]
    pub fn square_distance(self, other: Pos) -> i32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// True when `other` lies in the 3x3 square centred on `self`.
    #[inline]
    pub fn touches(self, other: Pos) -> bool {
        (self.x - other.x).abs() <= 1 && (self.y - other.y).abs() <= 1
    }

    #[inline]
    pub fn in_bounds(self) -> bool {
        (0..N).contains(&self.x) && (0..N).contains(&self.y)
    }

    /// The four orthogonal neighbors, unchecked. Order: down, up, left, right.
    #[inline]
    pub fn orthogonal(self) -> [Pos; 4] {
        [
            Pos::new(self.x, self.y - 1),
            Pos::new(self.x, self.y + 1),
            Pos::new(self.x - 1, self.y),
            Pos::new(self.x + 1, self.y),
        ]
    }

    /// Row-major index. Only meaningful for in-bounds positions.
    #[inline]
    fn index(self) -> usize {
        (self.y * N + self.x) as usize
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.x, self.y)
    }
}

/// Ownership and activity of a tile, as reported by the server.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TileState {
    /// `#` - not part of the map.
    Void,
    /// `.` - nobody owns it.
    Neutral,
    /// `O` - ours and connected to our headquarters.
    OwnedActive,
    /// `o` - ours but cut off.
    OwnedInactive,
    /// `X` - theirs and connected to their headquarters.
    EnemyActive,
    /// `x` - theirs but cut off.
    EnemyInactive,
}

impl TileState {
    /// Decode a tile character. Unknown codes are fatal for the snapshot.
    pub fn from_code(code: char, pos: Pos) -> Result<Self> {
        Ok(match code {
            '#' => TileState::Void,
            '.' => TileState::Neutral,
            'O' => TileState::OwnedActive,
            'o' => TileState::OwnedInactive,
            'X' => TileState::EnemyActive,
            'x' => TileState::EnemyInactive,
            other => {
                return Err(GameError::InvalidTileCode {
                    code: other,
                    x: pos.x,
                    y: pos.y,
                });
            }
        })
    }

    pub fn code(self) -> char {
        match self {
            TileState::Void => '#',
            TileState::Neutral => '.',
            TileState::OwnedActive => 'O',
            TileState::OwnedInactive => 'o',
            TileState::EnemyActive => 'X',
            TileState::EnemyInactive => 'x',
        }
    }

    #[inline]
    pub fn is_walkable(self) -> bool {
        self != TileState::Void
    }

    #[inline]
    pub fn is_enemy(self) -> bool {
        matches!(self, TileState::EnemyActive | TileState::EnemyInactive)
    }
}

/// One cell of the grid: where it is and what state it is in.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Tile {
    pub pos: Pos,
    pub state: TileState,
}

/// The tile grid, stored row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    cells: Vec<TileState>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// An all-neutral board.
    pub fn new() -> Self {
        Self {
            cells: vec![TileState::Neutral; TILE_COUNT],
        }
    }

    /// Build a board from `N` rows of `N` tile codes.
    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> Result<Self> {
        if rows.len() != N as usize {
            return Err(GameError::RowCount(rows.len()));
        }
        let mut cells = Vec::with_capacity(TILE_COUNT);
        for (y, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            let len = row.chars().count();
            if len != N as usize {
                return Err(GameError::RowLength {
                    row: y,
                    len,
                    expected: N as usize,
                });
            }
            for (x, code) in row.chars().enumerate() {
                cells.push(TileState::from_code(code, Pos::new(x as i32, y as i32))?);
            }
        }
        Ok(Self { cells })
    }

    /// Advisory lookup: `None` when `pos` is off the grid.
    pub fn tile_at(&self, pos: Pos) -> Option<Tile> {
        pos.in_bounds().then(|| Tile {
            pos,
            state: self.cells[pos.index()],
        })
    }

    /// Overwrite the state of a tile. Off-grid positions are ignored.
    pub fn set_state(&mut self, pos: Pos, state: TileState) {
        if pos.in_bounds() {
            let i = pos.index();
            self.cells[i] = state;
        }
    }

    /// Walkable orthogonal neighbors of `pos` (no void, nothing off-grid).
    pub fn neighbors(&self, pos: Pos) -> impl Iterator<Item = Tile> + '_ {
        pos.orthogonal()
            .into_iter()
            .filter_map(|p| self.tile_at(p))
            .filter(|t| t.state.is_walkable())
    }

    /// Number of orthogonal neighbors in the given state.
    pub fn count_neighbors(&self, pos: Pos, state: TileState) -> usize {
        self.neighbors(pos).filter(|t| t.state == state).count()
    }

    /// Every tile in row-major order.
    pub fn tiles(&self) -> impl Iterator<Item = Tile> + '_ {
        self.cells.iter().enumerate().map(|(i, &state)| Tile {
            pos: Pos::new(i as i32 % N, i as i32 / N),
            state,
        })
    }

    /// Every tile in the given state, row-major.
    pub fn tiles_in(&self, state: TileState) -> impl Iterator<Item = Tile> + '_ {
        self.tiles().filter(move |t| t.state == state)
    }
}

impl Index<Pos> for Board {
    type Output = TileState;

    /// Panics when `pos` is off the grid.
    fn index(&self, pos: Pos) -> &TileState {
        assert!(pos.in_bounds(), "tile ({pos}) is outside the grid");
        &self.cells[pos.index()]
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.chunks(N as usize) {
            for state in row {
                write!(f, "{}", state.code())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
