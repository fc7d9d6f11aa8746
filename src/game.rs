//! Game snapshot: the board plus both players' ledgers, buildings and mine
//! spots.
//!
//! A [`Game`] lives for the whole match. Every turn [`Game::apply_snapshot`]
//! replaces tiles and buildings wholesale and reconciles units by id, so
//! that unit identity survives between turns. During planning the strategy
//! engine mutates the same structure optimistically (see
//! [`Turn`](crate::strategy::Turn)); the next snapshot overwrites whatever
//! the server disagreed with.

use std::collections::HashSet;

use crate::board::{Board, Pos, TileState};
use crate::constants::MAX_LEVEL;
use crate::error::{GameError, Result};

/// Which side something belongs to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Owner {
    Me,
    Enemy,
}

impl Owner {
    /// Decode the protocol owner flag (0 = me, 1 = enemy).
    pub fn from_flag(flag: i32) -> Result<Self> {
        match flag {
            0 => Ok(Owner::Me),
            1 => Ok(Owner::Enemy),
            other => Err(GameError::InvalidOwner(other)),
        }
    }

    /// Tile state marking territory of this owner that is still connected.
    pub fn active_state(self) -> TileState {
        match self {
            Owner::Me => TileState::OwnedActive,
            Owner::Enemy => TileState::EnemyActive,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Owner::Me => "me",
            Owner::Enemy => "enemy",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BuildingKind {
    Headquarters,
    Mine,
    Tower,
}

impl BuildingKind {
    /// Decode the protocol building type (0 = HQ, 1 = mine, 2 = tower).
    pub fn from_code(code: i32) -> Result<Self> {
        match code {
            0 => Ok(BuildingKind::Headquarters),
            1 => Ok(BuildingKind::Mine),
            2 => Ok(BuildingKind::Tower),
            other => Err(GameError::InvalidBuildingType(other)),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Building {
    pub pos: Pos,
    pub kind: BuildingKind,
    pub owner: Owner,
}

/// A unit on the board.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Unit {
    /// Server id, or [`PENDING_UNIT_ID`](crate::constants::PENDING_UNIT_ID)
    /// for units trained this turn.
    pub id: i32,
    pub level: u8,
    pub pos: Pos,
    /// False until the server has confirmed the unit and it may act.
    pub ready: bool,
}

/// Whether a unit of `attacker` level destroys a unit of `defender` level
/// when it moves or is trained onto it. Level 3 beats everything, including
/// another level 3; below that only strictly weaker units fall.
pub fn can_defeat(attacker: u8, defender: u8) -> bool {
    attacker == MAX_LEVEL || defender < attacker
}

/// A location where a mine may be built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MineSpot {
    pub pos: Pos,
    /// Id of the explorer heading here this turn. Cleared at end of turn.
    pub targeted_by: Option<i32>,
}

impl MineSpot {
    pub fn new(pos: Pos) -> Self {
        Self {
            pos,
            targeted_by: None,
        }
    }
}

/// A player's ledger.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Player {
    pub gold: i32,
    pub income: i32,
    pub units: Vec<Unit>,
}

impl Player {
    pub fn ready_units(&self, level: u8) -> impl Iterator<Item = &Unit> + '_ {
        self.units
            .iter()
            .filter(move |u| u.ready && u.level == level)
    }
}

/// Raw building record as read from the protocol, not yet validated.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RawBuilding {
    pub owner: i32,
    pub kind: i32,
    pub x: i32,
    pub y: i32,
}

/// Raw unit record as read from the protocol, not yet validated.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RawUnit {
    pub owner: i32,
    pub id: i32,
    pub level: i32,
    pub x: i32,
    pub y: i32,
}

/// Everything the server sends for one turn.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub gold: i32,
    pub income: i32,
    pub enemy_gold: i32,
    pub enemy_income: i32,
    pub rows: Vec<String>,
    pub buildings: Vec<RawBuilding>,
    pub units: Vec<RawUnit>,
}

/// The whole game state as the engine sees it.
#[derive(Clone, Debug)]
pub struct Game {
    pub me: Player,
    pub enemy: Player,
    pub board: Board,
    pub buildings: Vec<Building>,
    pub mine_spots: Vec<MineSpot>,
}

impl Game {
    /// A game before its first snapshot.
    pub fn new(mine_spots: Vec<MineSpot>) -> Self {
        Self {
            me: Player::default(),
            enemy: Player::default(),
            board: Board::new(),
            buildings: Vec::new(),
            mine_spots,
        }
    }

    /// Build a game straight from a first snapshot.
    pub fn from_snapshot(mine_spots: Vec<MineSpot>, snapshot: &Snapshot) -> Result<Self> {
        let mut game = Self::new(mine_spots);
        game.apply_snapshot(snapshot)?;
        Ok(game)
    }

    /// Ingest a turn snapshot.
    ///
    /// Tiles and buildings are replaced. Units are reconciled by id: known
    /// ids are updated in place and marked ready, unknown ids are inserted as
    /// ready units, and ids missing from the snapshot are dropped.
    ///
    /// Validation happens before anything is touched, so a malformed
    /// snapshot leaves the previous state intact.
    pub fn apply_snapshot(&mut self, snapshot: &Snapshot) -> Result<()> {
        let board = Board::from_rows(&snapshot.rows)?;

        let buildings = snapshot
            .buildings
            .iter()
            .map(|b| {
                let pos = checked_pos(b.x, b.y)?;
                Ok(Building {
                    pos,
                    kind: BuildingKind::from_code(b.kind)?,
                    owner: Owner::from_flag(b.owner)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        for owner in [Owner::Me, Owner::Enemy] {
            let hqs = buildings
                .iter()
                .filter(|b| b.owner == owner && b.kind == BuildingKind::Headquarters)
                .count();
            match hqs {
                0 => return Err(GameError::MissingHeadquarters(owner.label())),
                1 => {}
                _ => return Err(GameError::DuplicateHeadquarters(owner.label())),
            }
        }

        let mut seen = Vec::with_capacity(snapshot.units.len());
        for u in &snapshot.units {
            let owner = Owner::from_flag(u.owner)?;
            let pos = checked_pos(u.x, u.y)?;
            let level = u8::try_from(u.level)
                .ok()
                .filter(|l| (1..=MAX_LEVEL).contains(l))
                .ok_or(GameError::InvalidUnitLevel {
                    id: u.id,
                    level: u.level,
                })?;
            seen.push((owner, u.id, level, pos));
        }

        self.me.gold = snapshot.gold;
        self.me.income = snapshot.income;
        self.enemy.gold = snapshot.enemy_gold;
        self.enemy.income = snapshot.enemy_income;
        self.board = board;
        self.buildings = buildings;

        let mut alive: HashSet<(Owner, i32)> = HashSet::with_capacity(seen.len());
        for (owner, id, level, pos) in seen {
            alive.insert((owner, id));
            let player = self.player_mut(owner);
            match player.units.iter_mut().find(|u| u.id == id) {
                Some(unit) => {
                    unit.level = level;
                    unit.pos = pos;
                    unit.ready = true;
                }
                None => player.units.push(Unit {
                    id,
                    level,
                    pos,
                    ready: true,
                }),
            }
        }
        self.me.units.retain(|u| alive.contains(&(Owner::Me, u.id)));
        self.enemy
            .units
            .retain(|u| alive.contains(&(Owner::Enemy, u.id)));
        Ok(())
    }

    pub fn player(&self, owner: Owner) -> &Player {
        match owner {
            Owner::Me => &self.me,
            Owner::Enemy => &self.enemy,
        }
    }

    pub fn player_mut(&mut self, owner: Owner) -> &mut Player {
        match owner {
            Owner::Me => &mut self.me,
            Owner::Enemy => &mut self.enemy,
        }
    }

    /// Position of a player's headquarters.
    ///
    /// Snapshots without both headquarters are rejected, so this only falls
    /// back to the grid corner on a game that never received a snapshot.
    pub fn headquarters(&self, owner: Owner) -> Pos {
        self.buildings
            .iter()
            .find(|b| b.owner == owner && b.kind == BuildingKind::Headquarters)
            .map(|b| b.pos)
            .unwrap_or_default()
    }

    pub fn buildings_of(
        &self,
        owner: Owner,
        kind: BuildingKind,
    ) -> impl Iterator<Item = &Building> + '_ {
        self.buildings
            .iter()
            .filter(move |b| b.owner == owner && b.kind == kind)
    }

    pub fn building_at(&self, pos: Pos) -> Option<&Building> {
        self.buildings.iter().find(|b| b.pos == pos)
    }

    /// True if a unit of either player stands on `pos`.
    pub fn any_unit_on(&self, pos: Pos) -> bool {
        self.me.units.iter().chain(&self.enemy.units).any(|u| u.pos == pos)
    }

    /// The unit standing on `pos`, with its owner.
    pub fn unit_at(&self, pos: Pos) -> Option<(Owner, &Unit)> {
        self.me
            .units
            .iter()
            .find(|u| u.pos == pos)
            .map(|u| (Owner::Me, u))
            .or_else(|| {
                self.enemy
                    .units
                    .iter()
                    .find(|u| u.pos == pos)
                    .map(|u| (Owner::Enemy, u))
            })
    }

    /// True if `pos` is covered by an active tower of `owner`.
    ///
    /// A tower covers its own tile and the four orthogonal neighbors, and
    /// only while it stands on active territory.
    pub fn is_protected_by(&self, pos: Pos, owner: Owner) -> bool {
        self.buildings_of(owner, BuildingKind::Tower).any(|t| {
            t.pos.distance(pos) <= 1
                && self.board.tile_at(t.pos).map(|tile| tile.state) == Some(owner.active_state())
        })
    }

    /// Every tile holding a unit of either player.
    pub fn occupied(&self) -> HashSet<Pos> {
        self.me
            .units
            .iter()
            .chain(&self.enemy.units)
            .map(|u| u.pos)
            .collect()
    }

    /// Remove the enemy unit on `pos`, if any. Returns whether one died.
    pub fn kill_enemy_at(&mut self, pos: Pos) -> bool {
        let before = self.enemy.units.len();
        self.enemy.units.retain(|u| u.pos != pos);
        before != self.enemy.units.len()
    }

    /// Forget every explorer target. Runs unconditionally at end of turn.
    pub fn clear_mine_targets(&mut self) {
        for spot in &mut self.mine_spots {
            spot.targeted_by = None;
        }
    }
}

fn checked_pos(x: i32, y: i32) -> Result<Pos> {
    let pos = Pos::new(x, y);
    if pos.in_bounds() {
        Ok(pos)
    } else {
        Err(GameError::out_of_bounds(pos))
    }
}
