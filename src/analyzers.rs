//! Tactical queries over a [`Game`].
//!
//! Everything here is read-only and returns ranked candidate lists (or an
//! `Option` for single answers). An empty result is normal and means "skip
//! this decision"; none of these functions fail.
//!
//! Rankings use squared distance where the exact path cost does not matter
//! and Manhattan distance where it stands in for a step count. Ties keep
//! row-major order, so every ranking is deterministic.

use std::collections::{HashSet, VecDeque};

use crate::board::{Board, Pos, Tile, TileState};
use crate::constants::{MAX_LEVEL, N, TILE_COUNT, train_cost};
use crate::game::{BuildingKind, Game, Owner};

/// Tiles bordering our active territory that are not yet ours.
fn border_tiles(game: &Game) -> impl Iterator<Item = Tile> + '_ {
    game.board.tiles().filter(|t| {
        t.state.is_walkable()
            && t.state != TileState::OwnedActive
            && game.board.count_neighbors(t.pos, TileState::OwnedActive) > 0
    })
}

/// True if a unit of `level` may be trained onto or walk onto `pos` as far
/// as enemy towers are concerned.
pub fn passes_towers(game: &Game, pos: Pos, level: u8) -> bool {
    level >= MAX_LEVEL
        || !(game.is_protected_by(pos, Owner::Enemy)
            || game
                .building_at(pos)
                .is_some_and(|b| b.owner == Owner::Enemy && b.kind == BuildingKind::Tower))
}

/// Tiles a unit of `level` must not step on: every unit-occupied tile and,
/// below level 3, everything covered by an enemy tower.
pub fn movement_blockers(game: &Game, level: u8) -> HashSet<Pos> {
    let mut blocked = game.occupied();
    if level < MAX_LEVEL {
        blocked.extend(
            game.board
                .tiles()
                .filter(|t| !passes_towers(game, t.pos, level))
                .map(|t| t.pos),
        );
    }
    blocked
}

/// Where a level-1 unit could be trained to grow the territory.
///
/// Candidates border our active territory, are walkable, hold no unit and
/// none of our buildings, and are not covered by an enemy tower. Sorted by
/// squared distance to `target` (normally the enemy headquarters).
pub fn training_frontier(game: &Game, target: Pos) -> Vec<Tile> {
    let mut tiles: Vec<Tile> = border_tiles(game)
        .filter(|t| !game.any_unit_on(t.pos))
        .filter(|t| {
            game.building_at(t.pos)
                .is_none_or(|b| b.owner == Owner::Enemy)
        })
        .filter(|t| passes_towers(game, t.pos, 1))
        .collect();
    tiles.sort_by_key(|t| t.pos.square_distance(target));
    tiles
}

/// Enemy-held tiles next to our territory that a unit of `attacker_level`
/// can be trained onto, killing the enemy unit of level at most
/// `max_enemy_level` standing there.
pub fn contested_tiles(game: &Game, attacker_level: u8, max_enemy_level: u8, target: Pos) -> Vec<Tile> {
    let mut tiles: Vec<Tile> = border_tiles(game)
        .filter(|t| {
            game.enemy
                .units
                .iter()
                .any(|u| u.pos == t.pos && u.level <= max_enemy_level)
        })
        .filter(|t| passes_towers(game, t.pos, attacker_level))
        .collect();
    tiles.sort_by_key(|t| t.pos.square_distance(target));
    tiles
}

/// Mine spots on our active territory with nothing built or standing on
/// them, closest to our headquarters first.
pub fn available_mine_spots(game: &Game) -> Vec<Pos> {
    let hq = game.headquarters(Owner::Me);
    let mut spots: Vec<Pos> = game
        .mine_spots
        .iter()
        .map(|s| s.pos)
        .filter(|&p| game.board.tile_at(p).map(|t| t.state) == Some(TileState::OwnedActive))
        .filter(|&p| !game.any_unit_on(p) && game.building_at(p).is_none())
        .collect();
    spots.sort_by_key(|p| p.square_distance(hq));
    spots
}

/// Active own tile, empty, with no building, and not in the 3x3 square
/// around one of our towers.
pub fn is_tower_site(game: &Game, pos: Pos) -> bool {
    game.board.tile_at(pos).map(|t| t.state) == Some(TileState::OwnedActive)
        && !game.any_unit_on(pos)
        && game.building_at(pos).is_none()
        && !game
            .buildings_of(Owner::Me, BuildingKind::Tower)
            .any(|tower| tower.pos.touches(pos))
}

fn tower_sites(game: &Game) -> impl Iterator<Item = Tile> + '_ {
    game.board
        .tiles_in(TileState::OwnedActive)
        .filter(|t| is_tower_site(game, t.pos))
}

/// Tower sites on our active territory away from existing towers, nearest
/// to `protect` first.
pub fn defensive_tower_sites(game: &Game, protect: Pos) -> Vec<Tile> {
    let mut tiles: Vec<Tile> = tower_sites(game).collect();
    tiles.sort_by_key(|t| t.pos.distance(protect));
    tiles
}

/// Like [`defensive_tower_sites`] but only on the front line: each site
/// touches at least one enemy active tile.
pub fn aggressive_tower_sites(game: &Game, toward: Pos) -> Vec<Tile> {
    let mut tiles: Vec<Tile> = tower_sites(game)
        .filter(|t| game.board.count_neighbors(t.pos, TileState::EnemyActive) > 0)
        .collect();
    tiles.sort_by_key(|t| t.pos.distance(toward));
    tiles
}

/// Own tile that an enemy cannot simply train onto.
fn is_guarded(game: &Game, pos: Pos) -> bool {
    game.me.units.iter().any(|u| u.pos == pos)
        || game.building_at(pos).is_some_and(|b| b.owner == Owner::Me)
        || game.is_protected_by(pos, Owner::Me)
}

fn active_around(board: &Board, pos: Pos) -> impl Iterator<Item = Pos> + '_ {
    board
        .neighbors(pos)
        .filter(|t| t.state == TileState::OwnedActive)
        .map(|t| t.pos)
}

/// Walk back along the single-width corridor behind one of our units and
/// return the first tile that nothing guards.
///
/// The walk only starts when the unit has exactly one active neighbor. See
/// [`follow_corridor`] for when it stops.
pub fn find_choke_point(game: &Game, unit: Pos, max_steps: usize) -> Option<Pos> {
    let mut forward = active_around(&game.board, unit);
    let first = forward.next()?;
    if forward.next().is_some() {
        return None;
    }
    follow_corridor(game, unit, first, max_steps)
}

/// Follow our territory from `prev` into `current` and onward.
///
/// Any unguarded tile that still leads somewhere is the answer, including
/// the junction where the corridor widens into the main body. A guarded
/// tile is only passed when exactly one way continues. Dead ends, revisits
/// and running out of `max_steps` give `None`.
fn follow_corridor(game: &Game, mut prev: Pos, mut current: Pos, max_steps: usize) -> Option<Pos> {
    let mut visited = HashSet::from([prev]);
    for _ in 0..max_steps {
        if !visited.insert(current) {
            return None;
        }
        let ahead: Vec<Pos> = active_around(&game.board, current)
            .filter(|&p| p != prev)
            .collect();
        if ahead.is_empty() {
            return None;
        }
        if !is_guarded(game, current) {
            return Some(current);
        }
        let [next] = ahead[..] else {
            return None;
        };
        prev = current;
        current = next;
    }
    None
}

/// A stretch of enemy corridor: the unit(s) that open it, then the empty
/// corridor tiles behind them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CorridorSegment {
    pub units: Vec<Pos>,
    pub tiles: Vec<Pos>,
}

/// A corridor of enemy territory whose capture strands enemy units.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KillPath {
    /// Segments from the corridor tip inward.
    pub segments: Vec<CorridorSegment>,
    /// Enemy tile whose capture severs the corridor.
    pub cut: Pos,
    /// Tiles to train level-1 units on, in order, ending at `cut`.
    pub route: Vec<Pos>,
    /// Positions of the enemy units cut off by seizing `cut`.
    pub stranded: Vec<Pos>,
    /// Number of enemy units cut off by seizing `cut`.
    pub units_killed: usize,
    /// Corridor tiles, occupied or not, left without a link to the enemy
    /// headquarters once `cut` is ours.
    pub severed: Vec<Pos>,
    /// Corridor tiles walked from the tip.
    pub distance: usize,
}

impl KillPath {
    /// Gold needed to train the whole route.
    pub fn cost(&self) -> i32 {
        self.route.len() as i32 * train_cost(1)
    }
}

/// Cheapest chain of level-1 trainings that reaches `goal` from our active
/// territory, in training order. Empty when `goal` is already ours.
///
/// Every active tile of ours is a free starting point, so a breadth-first
/// search seeded with all of them finds the chain with the fewest
/// trainings. Tiles a level-1 unit cannot take are never part of a chain.
pub fn training_route(game: &Game, goal: Pos) -> Option<Vec<Pos>> {
    let slot = |p: Pos| (p.y * N + p.x) as usize;
    if game.board.tile_at(goal)?.state == TileState::OwnedActive {
        return Some(Vec::new());
    }

    let blocked = movement_blockers(game, 1);
    let mut reached = [false; TILE_COUNT];
    let mut came_from: [Option<Pos>; TILE_COUNT] = [None; TILE_COUNT];
    let mut queue = VecDeque::new();
    for tile in game.board.tiles_in(TileState::OwnedActive) {
        reached[slot(tile.pos)] = true;
        queue.push_back(tile.pos);
    }

    while let Some(pos) = queue.pop_front() {
        if pos == goal {
            let mut route = Vec::new();
            let mut step = pos;
            while game.board[step] != TileState::OwnedActive {
                route.push(step);
                step = came_from[slot(step)]?;
            }
            route.reverse();
            return Some(route);
        }
        for tile in game.board.neighbors(pos) {
            if reached[slot(tile.pos)] || blocked.contains(&tile.pos) {
                continue;
            }
            reached[slot(tile.pos)] = true;
            came_from[slot(tile.pos)] = Some(pos);
            queue.push_back(tile.pos);
        }
    }
    None
}

/// Find every enemy corridor worth cutting.
///
/// Starts from each enemy unit on an active tile with exactly one active
/// enemy neighbor and walks inward along the single-width corridor for at
/// most `max_steps` tiles. Meeting another unit closes the current segment
/// and opens a new one at that unit. The cut is placed in the innermost
/// segment that still has a trainable empty tile, which strands every unit
/// of that segment and the ones before it.
///
/// Results are ranked by units killed per gold, best first.
pub fn find_kill_paths(game: &Game, max_steps: usize) -> Vec<KillPath> {
    let mut paths: Vec<KillPath> = game
        .enemy
        .units
        .iter()
        .filter(|u| game.board.tile_at(u.pos).map(|t| t.state) == Some(TileState::EnemyActive))
        .filter_map(|u| walk_enemy_corridor(game, u.pos, max_steps))
        .collect();
    paths.sort_by(|a, b| {
        (b.units_killed as i64 * i64::from(a.cost()))
            .cmp(&(a.units_killed as i64 * i64::from(b.cost())))
            .then_with(|| a.cost().cmp(&b.cost()))
    });
    paths
}

fn walk_enemy_corridor(game: &Game, tip: Pos, max_steps: usize) -> Option<KillPath> {
    let board = &game.board;
    let enemy_around = |p: Pos| {
        board
            .neighbors(p)
            .filter(|t| t.state == TileState::EnemyActive)
            .map(|t| t.pos)
    };

    let mut forward = enemy_around(tip);
    let first = forward.next()?;
    if forward.next().is_some() {
        return None;
    }

    let enemy_hq = game.headquarters(Owner::Enemy);
    let mut segments = Vec::new();
    let mut segment = CorridorSegment {
        units: vec![tip],
        tiles: Vec::new(),
    };
    let mut visited = HashSet::from([tip]);
    let mut distance = 0;
    let mut prev = tip;
    let mut current = first;

    for _ in 0..max_steps {
        if current == enemy_hq || !visited.insert(current) {
            break;
        }
        let ahead: Vec<Pos> = enemy_around(current).filter(|&p| p != prev).collect();
        let [next] = ahead[..] else {
            break;
        };
        distance += 1;
        if game.enemy.units.iter().any(|u| u.pos == current) {
            let closed = std::mem::replace(
                &mut segment,
                CorridorSegment {
                    units: vec![current],
                    tiles: Vec::new(),
                },
            );
            segments.push(closed);
        } else {
            segment.tiles.push(current);
        }
        prev = current;
        current = next;
    }
    segments.push(segment);

    // Innermost segment with a tile we could actually seize.
    let (depth, routes) = segments.iter().enumerate().rev().find_map(|(i, seg)| {
        let routes: Vec<(Pos, Vec<Pos>)> = seg
            .tiles
            .iter()
            .filter(|&&p| passes_towers(game, p, 1))
            .filter_map(|&p| training_route(game, p).map(|r| (p, r)))
            .collect();
        (!routes.is_empty()).then_some((i, routes))
    })?;

    let (cut, route) = routes.into_iter().min_by_key(|(_, r)| r.len())?;
    let stranded: Vec<Pos> = segments[..=depth]
        .iter()
        .flat_map(|s| s.units.iter().copied())
        .collect();
    let inner = &segments[depth];
    let before_cut = inner.tiles.iter().take_while(|&&p| p != cut);
    let severed: Vec<Pos> = segments[..depth]
        .iter()
        .flat_map(|s| s.units.iter().chain(&s.tiles))
        .chain(&inner.units)
        .chain(before_cut)
        .copied()
        .collect();
    Some(KillPath {
        segments,
        cut,
        route,
        units_killed: stranded.len(),
        stranded,
        severed,
        distance,
    })
}

/// Enemy level-3 units touching our territory, a unit of ours, or one of
/// our buildings.
pub fn exposed_enemy_level3(game: &Game) -> Vec<Pos> {
    game.enemy
        .units
        .iter()
        .filter(|u| u.level == MAX_LEVEL)
        .filter(|u| {
            game.board.neighbors(u.pos).any(|t| {
                t.state == TileState::OwnedActive
                    || game.me.units.iter().any(|m| m.pos == t.pos)
                    || game.building_at(t.pos).is_some_and(|b| b.owner == Owner::Me)
            })
        })
        .map(|u| u.pos)
        .collect()
}

/// Index of the nearest neutral mine spot no unit stands on and no explorer
/// has claimed this turn.
pub fn closest_free_mine_spot(game: &Game, from: Pos) -> Option<usize> {
    game.mine_spots
        .iter()
        .enumerate()
        .filter(|(_, s)| s.targeted_by.is_none())
        .filter(|(_, s)| game.board.tile_at(s.pos).map(|t| t.state) == Some(TileState::Neutral))
        .filter(|(_, s)| !game.any_unit_on(s.pos))
        .min_by_key(|(_, s)| s.pos.distance(from))
        .map(|(i, _)| i)
}

/// Nearest walkable tile not yet in our active territory. Among equally
/// near tiles, prefer the one farthest from the rest of our army so
/// explorers fan out.
pub fn closest_unclaimed_tile(game: &Game, from: Pos) -> Option<Pos> {
    let candidates: Vec<Pos> = game
        .board
        .tiles()
        .filter(|t| t.state.is_walkable() && t.state != TileState::OwnedActive)
        .filter(|t| !game.any_unit_on(t.pos))
        .map(|t| t.pos)
        .collect();
    let nearest = candidates.iter().map(|p| p.distance(from)).min()?;
    let spread = |p: Pos| -> i32 { game.me.units.iter().map(|u| u.pos.distance(p)).sum() };
    candidates
        .into_iter()
        .filter(|p| p.distance(from) == nearest)
        .fold(None, |best: Option<Pos>, p| match best {
            Some(b) if spread(b) >= spread(p) => Some(b),
            _ => Some(p),
        })
}

/// Where a level-1 attacker on `from` should head: the nearest enemy mine
/// when it is closer than the enemy headquarters, the headquarters
/// otherwise.
pub fn conquest_target(game: &Game, from: Pos) -> Pos {
    let hq = game.headquarters(Owner::Enemy);
    game.buildings_of(Owner::Enemy, BuildingKind::Mine)
        .map(|b| b.pos)
        .min_by_key(|p| p.distance(from))
        .filter(|p| p.distance(from) < hq.distance(from))
        .unwrap_or(hq)
}

/// Neighbor of `unit` a level-1 unit can safely claim, closest to `target`.
///
/// Safe means not already ours, empty, and outside every enemy tower's
/// reach.
pub fn conquest_step(game: &Game, unit: Pos, target: Pos) -> Option<Pos> {
    game.board
        .neighbors(unit)
        .filter(|t| t.state != TileState::OwnedActive)
        .filter(|t| !game.any_unit_on(t.pos))
        .filter(|t| passes_towers(game, t.pos, 1))
        .filter(|t| {
            game.building_at(t.pos)
                .is_none_or(|b| b.owner == Owner::Enemy)
        })
        .min_by_key(|t| t.pos.square_distance(target))
        .map(|t| t.pos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{RawBuilding, RawUnit, Snapshot};

    fn game(rows: &[&str], buildings: &[(i32, i32, i32, i32)], units: &[(i32, i32, i32, i32, i32)]) -> Game {
        let snapshot = Snapshot {
            gold: 100,
            income: 10,
            enemy_gold: 0,
            enemy_income: 0,
            rows: rows.iter().map(|r| r.to_string()).collect(),
            buildings: buildings
                .iter()
                .map(|&(owner, kind, x, y)| RawBuilding { owner, kind, x, y })
                .collect(),
            units: units
                .iter()
                .map(|&(owner, id, level, x, y)| RawUnit { owner, id, level, x, y })
                .collect(),
        };
        Game::from_snapshot(vec![], &snapshot).unwrap()
    }

    const HQS: [(i32, i32, i32, i32); 2] = [(0, 0, 0, 0), (1, 0, 11, 11)];

    fn corner_rows() -> Vec<&'static str> {
        vec![
            "OO..........",
            "O...........",
            "............",
            "............",
            "............",
            "............",
            "............",
            "............",
            "............",
            "............",
            "...........X",
            "..........XX",
        ]
    }

    #[test]
    fn test_frontier_ranked_toward_target() {
        let g = game(&corner_rows(), &HQS, &[]);
        let frontier = training_frontier(&g, Pos::new(11, 11));
        let positions: Vec<Pos> = frontier.iter().map(|t| t.pos).collect();
        assert_eq!(positions.len(), 3);
        assert!(positions.contains(&Pos::new(1, 1)));
        assert_eq!(positions[0], Pos::new(1, 1));
        let d: Vec<i32> = positions.iter().map(|p| p.square_distance(Pos::new(11, 11))).collect();
        assert!(d.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_frontier_skips_units_and_towers() {
        let mut rows = corner_rows();
        rows[1] = "OX..........";
        let g = game(
            &rows,
            &[HQS[0], HQS[1], (1, 2, 1, 1)],
            &[(1, 5, 1, 2, 0)],
        );
        // (2,0) has a unit, (1,1) holds a tower, (0,2) is covered by nothing.
        let positions: Vec<Pos> = training_frontier(&g, Pos::new(11, 11)).iter().map(|t| t.pos).collect();
        assert_eq!(positions, vec![Pos::new(0, 2)]);
    }

    #[test]
    fn test_frontier_empty_without_territory() {
        let rows = vec!["............"; 12];
        let g = game(&rows, &HQS, &[]);
        assert!(training_frontier(&g, Pos::new(11, 11)).is_empty());
    }

    #[test]
    fn test_mine_spots() {
        let mut g = game(&corner_rows(), &HQS, &[(0, 1, 1, 0, 1)]);
        g.mine_spots = vec![
            crate::game::MineSpot::new(Pos::new(1, 0)),
            crate::game::MineSpot::new(Pos::new(0, 1)),
            crate::game::MineSpot::new(Pos::new(5, 5)),
        ];
        assert_eq!(available_mine_spots(&g), vec![Pos::new(1, 0)]);
    }

    #[test]
    fn test_tower_sites_avoid_existing_towers() {
        let rows = vec![
            "OOOOO.......",
            "OOOOOX......",
            "............",
            "............",
            "............",
            "............",
            "............",
            "............",
            "............",
            "............",
            "............",
            "...........X",
        ];
        let g = game(&rows, &[HQS[0], HQS[1], (0, 2, 1, 1)], &[]);
        let sites: Vec<Pos> = defensive_tower_sites(&g, Pos::new(0, 0)).iter().map(|t| t.pos).collect();
        assert!(sites.iter().all(|p| !p.touches(Pos::new(1, 1))));
        assert!(!sites.contains(&Pos::new(0, 0)));
        assert_eq!(sites[0], Pos::new(3, 0));

        let aggressive: Vec<Pos> = aggressive_tower_sites(&g, Pos::new(11, 11)).iter().map(|t| t.pos).collect();
        assert_eq!(aggressive, vec![Pos::new(4, 1)]);
    }

    #[test]
    fn test_choke_point_found() {
        // HQ body at the top left, a one-wide corridor going right.
        let rows = vec![
            "OOOOOO......",
            "OO..........",
            "............",
            "............",
            "............",
            "............",
            "............",
            "............",
            "............",
            "............",
            "............",
            "...........X",
        ];
        let g = game(&rows, &HQS, &[(0, 1, 1, 5, 0), (0, 2, 1, 4, 0)]);
        assert_eq!(find_choke_point(&g, Pos::new(5, 0), 6), Some(Pos::new(3, 0)));
        assert_eq!(find_choke_point(&g, Pos::new(5, 0), 1), None);
    }

    #[test]
    fn test_choke_point_not_at_risk() {
        let g = game(&corner_rows(), &HQS, &[(0, 1, 1, 1, 0)]);
        // (1,0) touches only (0,0): at risk, but the HQ guards (0,0) and the
        // corridor ends at (0,1).
        assert_eq!(find_choke_point(&g, Pos::new(1, 0), 6), None);
        let g = game(&corner_rows(), &HQS, &[(0, 1, 1, 5, 5)]);
        assert_eq!(find_choke_point(&g, Pos::new(5, 5), 6), None);
    }

    #[test]
    fn test_choke_walk_terminates_on_ring() {
        let rows = vec![
            "OOOO........",
            "O..O........",
            "O..O........",
            "OOOOO.......",
            "............",
            "............",
            "............",
            "............",
            "............",
            "............",
            "............",
            "...........X",
        ];
        let ring = [
            (1, 0), (2, 0), (3, 0), (3, 1), (3, 2), (3, 3), (2, 3), (1, 3), (0, 3), (0, 2), (0, 1),
        ];
        let mut units: Vec<(i32, i32, i32, i32, i32)> = ring
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| (0, i as i32 + 1, 1, x, y))
            .collect();
        units.push((0, 99, 1, 4, 3));
        let g = game(&rows, &HQS, &units);
        assert_eq!(find_choke_point(&g, Pos::new(4, 3), 100), None);
        for &(x, y) in &ring {
            assert_eq!(find_choke_point(&g, Pos::new(x, y), 100), None);
        }
    }

    #[test]
    fn test_choke_point_at_unguarded_junction() {
        let rows = vec![
            "OOOOOO......",
            "OO..........",
            "............",
            "............",
            "............",
            "............",
            "............",
            "............",
            "............",
            "............",
            "............",
            "...........X",
        ];
        let units = [(0, 1, 1, 5, 0), (0, 2, 1, 4, 0), (0, 3, 1, 3, 0), (0, 4, 1, 2, 0)];
        let g = game(&rows, &HQS, &units);
        // (1,0) joins the corridor to the body and nothing stands on it.
        assert_eq!(find_choke_point(&g, Pos::new(5, 0), 6), Some(Pos::new(1, 0)));
    }

    #[test]
    fn test_choke_walk_gives_up_at_step_cap() {
        let mut rows = corner_rows();
        rows[0] = "OOOOOOOOOOOO";
        let units: Vec<(i32, i32, i32, i32, i32)> = (2..12).map(|x| (0, x, 1, x, 0)).collect();
        let g = game(&rows, &HQS, &units);
        assert_eq!(find_choke_point(&g, Pos::new(11, 0), 6), None);
        assert_eq!(find_choke_point(&g, Pos::new(11, 0), 20), Some(Pos::new(1, 0)));
    }

    #[test]
    fn test_corridor_walk_round_guarded_ring() {
        let rows = vec![
            "OOOO........",
            "O..O........",
            "O..O........",
            "OOOO........",
            "............",
            "............",
            "............",
            "............",
            "............",
            "............",
            "............",
            "...........X",
        ];
        let ring = [
            (1, 0), (2, 0), (3, 0), (3, 1), (3, 2), (3, 3), (2, 3), (1, 3), (0, 3), (0, 2), (0, 1),
        ];
        let units: Vec<(i32, i32, i32, i32, i32)> = ring
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| (0, i as i32 + 1, 1, x, y))
            .collect();
        let g = game(&rows, &HQS, &units);
        let (hq, start) = (Pos::new(0, 0), Pos::new(1, 0));
        // Every tile is guarded: the walk comes back round to the HQ.
        assert_eq!(follow_corridor(&g, hq, start, 100), None);
        assert_eq!(follow_corridor(&g, hq, start, 5), None);

        // Freeing the far side shows the walk really went round.
        let open: Vec<_> = units.iter().copied().filter(|u| (u.3, u.4) != (0, 2)).collect();
        let g = game(&rows, &HQS, &open);
        assert_eq!(follow_corridor(&g, hq, start, 100), Some(Pos::new(0, 2)));
        assert_eq!(follow_corridor(&g, hq, start, 9), None);
    }

    #[test]
    fn test_training_route_skips_own_tiles() {
        let g = game(&corner_rows(), &HQS, &[]);
        let route = training_route(&g, Pos::new(3, 0)).unwrap();
        assert_eq!(route, vec![Pos::new(2, 0), Pos::new(3, 0)]);
    }

    #[test]
    fn test_training_route_takes_cheapest_chain() {
        let mut rows = vec!["............"; 12];
        rows[0] = "O...........";
        rows[9] = "...........O";
        rows[10] = "..........##";
        rows[11] = ".........O.X";
        let g = game(&rows, &HQS, &[]);
        // (11,9) is closest but walled off by the void tiles.
        let route = training_route(&g, Pos::new(11, 11)).unwrap();
        assert_eq!(route, vec![Pos::new(10, 11), Pos::new(11, 11)]);
        assert_eq!(training_route(&g, Pos::new(0, 0)), Some(vec![]));
        assert_eq!(training_route(&g, Pos::new(10, 10)), None);
    }

    #[test]
    fn test_exposed_level3() {
        let mut rows = corner_rows();
        rows[1] = "OX..........";
        let g = game(&rows, &HQS, &[(1, 4, 3, 1, 1), (1, 5, 3, 8, 8)]);
        assert_eq!(exposed_enemy_level3(&g), vec![Pos::new(1, 1)]);
    }

    #[test]
    fn test_explorer_targets() {
        let mut g = game(&corner_rows(), &HQS, &[(0, 1, 1, 1, 0)]);
        g.mine_spots = vec![
            crate::game::MineSpot::new(Pos::new(6, 6)),
            crate::game::MineSpot::new(Pos::new(3, 0)),
        ];
        assert_eq!(closest_free_mine_spot(&g, Pos::new(1, 0)), Some(1));
        g.mine_spots[1].targeted_by = Some(1);
        assert_eq!(closest_free_mine_spot(&g, Pos::new(1, 0)), Some(0));
        assert!(closest_unclaimed_tile(&g, Pos::new(1, 0)).is_some());
        assert_eq!(conquest_step(&g, Pos::new(1, 0), Pos::new(11, 11)), Some(Pos::new(1, 1)));
    }

    #[test]
    fn test_conquest_target_prefers_closer_enemy_mine() {
        let mut rows = corner_rows();
        rows[6] = "X...........";
        let g = game(&rows, &HQS, &[]);
        assert_eq!(conquest_target(&g, Pos::new(0, 1)), Pos::new(11, 11));

        let g = game(&rows, &[HQS[0], HQS[1], (1, 1, 0, 6)], &[]);
        assert_eq!(conquest_target(&g, Pos::new(0, 1)), Pos::new(0, 6));
        assert_eq!(conquest_target(&g, Pos::new(10, 10)), Pos::new(11, 11));
        assert_eq!(conquest_step(&g, Pos::new(0, 1), Pos::new(0, 6)), Some(Pos::new(0, 2)));
    }
}
