//! Turn planning: phases, policies and the per-turn commit ledger.
//!
//! Every turn the [`Engine`] opens a [`Turn`] over the game, runs the
//! conditional policies whose `is_applicable` check holds right now, then
//! the primary policy of the current phase:
//!
//! - [`InstantKill`] - a chain of level-1 trainings reaching the enemy
//!   headquarters, when the whole chain is affordable
//! - [`HuntLevel3`] - cut off or overrun enemy level-3 units at our border
//! - [`TowerDefense`] - tower next to our headquarters when the enemy could
//!   train its way in this turn
//! - [`Expansion`] - early phase: explore, mine, spread level-1 units
//! - [`Offensive`] - main phase: fight, cut corridors, build, train
//!
//! Commits go through [`Turn`], which checks affordability before touching
//! anything and applies the expected outcome at once so later decisions in
//! the same turn see it.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::action::Action;
use crate::analyzers::{
    aggressive_tower_sites, available_mine_spots, closest_free_mine_spot, closest_unclaimed_tile,
    conquest_step, conquest_target, contested_tiles, defensive_tower_sites, exposed_enemy_level3, find_choke_point,
    find_kill_paths, is_tower_site, movement_blockers, passes_towers, training_frontier,
    training_route,
};
use crate::board::{Pos, TileState};
use crate::constants::{
    CHOKE_WALK_CAP, EARLY_MINE_MIN_UNITS, EARLY_PHASE_TURNS, ENGAGEMENT_RANGE, KILL_WALK_CAP,
    LEVEL2_MIN_INCOME, LEVEL3_MIN_INCOME, MAX_EARLY_UNITS, MINE_INCOME, PENDING_UNIT_ID,
    TOWER_COST, TOWER_MIN_INCOME, mine_cost, train_cost, upkeep,
};
use crate::game::{Building, BuildingKind, Game, Owner, Unit, can_defeat};
use crate::pathfinding::{find_path, next_step};

/// Runtime tuning knobs. Defaults come from [`crate::constants`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Turns played in the expansion phase.
    pub early_turns: u32,
    /// Unit count at which early-phase training stops.
    pub max_early_units: usize,
    /// Unit count required before the early phase builds a mine.
    pub early_mine_min_units: usize,
    pub choke_walk_cap: usize,
    pub kill_walk_cap: usize,
    /// Manhattan distance within which units go after enemy units.
    pub engagement_range: i32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            early_turns: EARLY_PHASE_TURNS,
            max_early_units: MAX_EARLY_UNITS,
            early_mine_min_units: EARLY_MINE_MIN_UNITS,
            choke_walk_cap: CHOKE_WALK_CAP,
            kill_walk_cap: KILL_WALK_CAP,
            engagement_range: ENGAGEMENT_RANGE,
        }
    }
}

/// Game phase. Only ever moves from `Early` to `Main`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    Early,
    Main,
}

// =============================================================================
// Turn ledger
// =============================================================================

/// Exclusive handle on the game for the duration of one turn.
///
/// Each commit method returns `false` and leaves the game untouched when the
/// command is unaffordable or illegal. On success the expected result is
/// applied immediately: gold and income are adjusted, captured tiles become
/// ours, defeated enemy units and captured enemy buildings disappear.
pub struct Turn<'a> {
    game: &'a mut Game,
    config: &'a EngineConfig,
    actions: Vec<Action>,
    moved: HashSet<i32>,
}

impl<'a> Turn<'a> {
    pub fn new(game: &'a mut Game, config: &'a EngineConfig) -> Self {
        Self {
            game,
            config,
            actions: Vec::new(),
            moved: HashSet::new(),
        }
    }

    pub fn game(&self) -> &Game {
        self.game
    }

    pub fn config(&self) -> &EngineConfig {
        self.config
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    #[inline]
    pub fn can_afford(&self, cost: i32) -> bool {
        self.game.me.gold >= cost
    }

    /// Train a unit of `level` on `pos`.
    ///
    /// The tile must be walkable, touch our active territory (or be part of
    /// it), carry none of our units or buildings, and any enemy unit there
    /// must be one `level` defeats.
    pub fn train(&mut self, level: u8, pos: Pos) -> bool {
        let cost = train_cost(level);
        if !self.can_afford(cost) || !self.can_enter(level, pos) {
            return false;
        }
        let reachable = self.game.board[pos] == TileState::OwnedActive
            || self.game.board.count_neighbors(pos, TileState::OwnedActive) > 0;
        if !reachable || self.game.building_at(pos).is_some_and(|b| b.owner == Owner::Me) {
            return false;
        }

        self.game.me.gold -= cost;
        self.game.me.income -= upkeep(level);
        self.capture(pos);
        self.game.me.units.push(Unit {
            id: PENDING_UNIT_ID,
            level,
            pos,
            ready: false,
        });
        self.actions.push(Action::Train { level, at: pos });
        debug!(level, %pos, gold = self.game.me.gold, "train");
        true
    }

    /// Move a ready unit one step onto `to`. Each unit moves at most once.
    pub fn move_unit(&mut self, id: i32, to: Pos) -> bool {
        if self.moved.contains(&id) {
            return false;
        }
        let Some(unit) = self.game.me.units.iter().find(|u| u.id == id && u.ready) else {
            return false;
        };
        let (level, from) = (unit.level, unit.pos);
        if from.distance(to) != 1 || !self.can_enter(level, to) {
            return false;
        }

        if let Some(unit) = self.game.me.units.iter_mut().find(|u| u.id == id) {
            unit.pos = to;
        }
        self.moved.insert(id);
        self.capture(to);
        self.actions.push(Action::Move { id, to });
        debug!(id, %from, %to, "move");
        true
    }

    /// Build a mine on a free mine spot inside our active territory.
    pub fn build_mine(&mut self, pos: Pos) -> bool {
        let cost = mine_cost(self.game.buildings_of(Owner::Me, BuildingKind::Mine).count());
        let is_spot = self.game.mine_spots.iter().any(|s| s.pos == pos);
        if !self.can_afford(cost) || !is_spot || !self.is_free_own_tile(pos) {
            return false;
        }
        self.game.me.gold -= cost;
        self.game.me.income += MINE_INCOME;
        self.place(pos, BuildingKind::Mine);
        self.actions.push(Action::BuildMine(pos));
        debug!(%pos, cost, "build mine");
        true
    }

    /// Build a tower on a free tile of our active territory.
    pub fn build_tower(&mut self, pos: Pos) -> bool {
        if !self.can_afford(TOWER_COST) || !self.is_free_own_tile(pos) {
            return false;
        }
        self.game.me.gold -= TOWER_COST;
        self.place(pos, BuildingKind::Tower);
        self.actions.push(Action::BuildTower(pos));
        debug!(%pos, "build tower");
        true
    }

    /// Record that the enemy unit on `pos` will not survive the turn.
    pub fn mark_enemy_dead(&mut self, pos: Pos) {
        if self.game.kill_enemy_at(pos) {
            debug!(%pos, "enemy unit cut off");
        }
    }

    /// Record that the enemy tile on `pos` lost its link to the enemy
    /// headquarters.
    pub fn sever_enemy_tile(&mut self, pos: Pos) {
        if self.game.board.tile_at(pos).map(|t| t.state) == Some(TileState::EnemyActive) {
            self.game.board.set_state(pos, TileState::EnemyInactive);
        }
    }

    /// Let unit `id` claim mine spot `index` as its destination.
    pub fn claim_mine_spot(&mut self, index: usize, id: i32) {
        if let Some(spot) = self.game.mine_spots.get_mut(index) {
            spot.targeted_by = Some(id);
        }
    }

    /// Close the turn and hand back the commands in commit order.
    pub fn finish(self) -> Vec<Action> {
        self.game.clear_mine_targets();
        self.actions
    }

    fn can_enter(&self, level: u8, pos: Pos) -> bool {
        let Some(tile) = self.game.board.tile_at(pos) else {
            return false;
        };
        if !tile.state.is_walkable() || !passes_towers(self.game, pos, level) {
            return false;
        }
        match self.game.unit_at(pos) {
            Some((Owner::Me, _)) => false,
            Some((Owner::Enemy, enemy)) => can_defeat(level, enemy.level),
            None => true,
        }
    }

    fn is_free_own_tile(&self, pos: Pos) -> bool {
        self.game.board.tile_at(pos).map(|t| t.state) == Some(TileState::OwnedActive)
            && !self.game.any_unit_on(pos)
            && self.game.building_at(pos).is_none()
    }

    fn capture(&mut self, pos: Pos) {
        if self.game.kill_enemy_at(pos) {
            debug!(%pos, "enemy unit destroyed");
        }
        self.game.buildings.retain(|b| {
            b.pos != pos || b.owner == Owner::Me || b.kind == BuildingKind::Headquarters
        });
        self.game.board.set_state(pos, TileState::OwnedActive);
    }

    fn place(&mut self, pos: Pos, kind: BuildingKind) {
        self.game.buildings.push(Building {
            pos,
            kind,
            owner: Owner::Me,
        });
    }
}

// =============================================================================
// Policies
// =============================================================================

/// One unit of decision making.
pub trait Policy {
    fn name(&self) -> &'static str;

    /// Checked against the live state right before the policy would run.
    fn is_applicable(&self, _game: &Game) -> bool {
        true
    }

    fn play(&self, turn: &mut Turn<'_>);
}

/// Train a level-1 chain all the way onto the enemy headquarters.
pub struct InstantKill;

impl Policy for InstantKill {
    fn name(&self) -> &'static str {
        "instant-kill"
    }

    fn is_applicable(&self, game: &Game) -> bool {
        training_route(game, game.headquarters(Owner::Enemy))
            .is_some_and(|route| !route.is_empty() && route.len() as i32 * train_cost(1) <= game.me.gold)
    }

    fn play(&self, turn: &mut Turn<'_>) {
        let goal = turn.game().headquarters(Owner::Enemy);
        let Some(route) = training_route(turn.game(), goal) else {
            return;
        };
        info!(length = route.len(), "training through to the enemy headquarters");
        for pos in route {
            if !turn.train(1, pos) {
                break;
            }
        }
    }
}

/// Deal with enemy level-3 units touching our side.
///
/// When the unit touches exactly one active enemy tile and a level-1 unit
/// can be trained there, that severs it; otherwise a level-3 unit is
/// trained straight onto it.
pub struct HuntLevel3;

impl Policy for HuntLevel3 {
    fn name(&self) -> &'static str {
        "hunt-level3"
    }

    fn is_applicable(&self, game: &Game) -> bool {
        !exposed_enemy_level3(game).is_empty()
    }

    fn play(&self, turn: &mut Turn<'_>) {
        for target in exposed_enemy_level3(turn.game()) {
            let game = turn.game();
            let links: Vec<Pos> = game
                .board
                .neighbors(target)
                .filter(|t| t.state == TileState::EnemyActive)
                .map(|t| t.pos)
                .collect();

            // Occupied links count too.
            if let [cut] = links[..]
                && !game.any_unit_on(cut)
                && game.board.count_neighbors(cut, TileState::OwnedActive) > 0
                && passes_towers(game, cut, 1)
                && turn.train(1, cut)
            {
                turn.mark_enemy_dead(target);
                continue;
            }
            turn.train(3, target);
        }
    }
}

/// Build a tower by our headquarters when enemy units are close enough for
/// the enemy to train into it this turn.
///
/// Applicability is the exposure alone; the tower is only built when we can
/// pay for it and no tower covers the headquarters yet.
pub struct TowerDefense;

impl TowerDefense {
    /// Distance the enemy can cover by training level-1 units with the gold
    /// it will have at the start of its turn.
    pub fn enemy_reach(game: &Game) -> i32 {
        (game.enemy.gold + game.enemy.income.max(0)) / train_cost(1)
    }
}

impl Policy for TowerDefense {
    fn name(&self) -> &'static str {
        "tower-defense"
    }

    fn is_applicable(&self, game: &Game) -> bool {
        let hq = game.headquarters(Owner::Me);
        let reach = Self::enemy_reach(game);
        game.enemy.units.iter().any(|u| u.pos.distance(hq) <= reach)
    }

    fn play(&self, turn: &mut Turn<'_>) {
        let hq = turn.game().headquarters(Owner::Me);
        if !turn.can_afford(TOWER_COST) || turn.game().is_protected_by(hq, Owner::Me) {
            debug!("headquarters exposed, no tower this turn");
            return;
        }
        if let Some(site) = defensive_tower_sites(turn.game(), hq).first() {
            info!(site = %site.pos, "enemy within reach of headquarters");
            turn.build_tower(site.pos);
        }
    }
}

/// Move a unit toward a mine spot, or failing that the nearest tile we do
/// not hold yet.
fn explore(turn: &mut Turn<'_>, id: i32, level: u8, from: Pos) {
    let game = turn.game();
    let target = if let Some(index) = closest_free_mine_spot(game, from) {
        let pos = game.mine_spots[index].pos;
        turn.claim_mine_spot(index, id);
        pos
    } else if let Some(pos) = closest_unclaimed_tile(game, from) {
        pos
    } else {
        game.headquarters(Owner::Enemy)
    };
    advance(turn, id, level, from, target);
}

/// Step a unit along a shortest path to `target`.
fn advance(turn: &mut Turn<'_>, id: i32, level: u8, from: Pos, target: Pos) -> bool {
    let game = turn.game();
    let blocked = movement_blockers(game, level);
    match next_step(&game.board, from, target, &blocked) {
        Some(step) => turn.move_unit(id, step),
        None => false,
    }
}

/// Ready units of one level, as `(id, pos)`.
fn ready(game: &Game, level: u8) -> Vec<(i32, Pos)> {
    game.me.ready_units(level).map(|u| (u.id, u.pos)).collect()
}

/// Early-phase primary policy.
pub struct Expansion;

impl Policy for Expansion {
    fn name(&self) -> &'static str {
        "expansion"
    }

    fn play(&self, turn: &mut Turn<'_>) {
        if turn.game().me.units.len() >= turn.config().early_mine_min_units
            && let Some(&spot) = available_mine_spots(turn.game()).first()
        {
            turn.build_mine(spot);
        }

        for level in 1..=3 {
            for (id, pos) in ready(turn.game(), level) {
                explore(turn, id, level, pos);
            }
        }

        let enemy_hq = turn.game().headquarters(Owner::Enemy);
        while turn.game().me.units.len() < turn.config().max_early_units {
            let Some(tile) = training_frontier(turn.game(), enemy_hq).first().copied() else {
                break;
            };
            if !turn.train(1, tile.pos) {
                break;
            }
        }
    }
}

/// Main-phase primary policy.
pub struct Offensive;

impl Offensive {
    /// Move every ready unit, strongest first. Level-1 attackers go for an
    /// enemy mine when one is nearer than the enemy headquarters.
    fn fight(turn: &mut Turn<'_>) {
        let enemy_hq = turn.game().headquarters(Owner::Enemy);
        for level in [3, 2] {
            for (id, pos) in ready(turn.game(), level) {
                if !Self::engage(turn, id, level, pos) {
                    advance(turn, id, level, pos, enemy_hq);
                }
            }
        }

        let mut scouts = ready(turn.game(), 1).into_iter();
        if let Some((id, pos)) = scouts.next() {
            explore(turn, id, 1, pos);
        }
        let mut attackers: Vec<(i32, Pos)> = scouts.collect();
        attackers.sort_by_key(|&(_, pos)| pos.distance(enemy_hq));
        for (id, pos) in attackers {
            let target = conquest_target(turn.game(), pos);
            let moved = match conquest_step(turn.game(), pos, target) {
                Some(step) => turn.move_unit(id, step),
                None => false,
            };
            if !moved {
                advance(turn, id, 1, pos, target);
            }
        }
    }

    /// Step toward the nearest enemy unit this level defeats, if one is in
    /// range and reachable.
    fn engage(turn: &mut Turn<'_>, id: i32, level: u8, from: Pos) -> bool {
        let game = turn.game();
        let range = turn.config().engagement_range;
        let blocked = movement_blockers(game, level);

        let step = game
            .enemy
            .units
            .iter()
            .filter(|e| can_defeat(level, e.level) && e.pos.distance(from) <= range)
            .filter(|e| passes_towers(game, e.pos, level))
            .filter_map(|e| {
                let mut open = blocked.clone();
                open.remove(&e.pos);
                let path = find_path(&game.board, from, e.pos, &open)?;
                Some((path.len(), path.first()?.pos))
            })
            .min_by_key(|&(len, _)| len)
            .map(|(_, step)| step);

        match step {
            Some(step) => turn.move_unit(id, step),
            None => false,
        }
    }

    /// Train along affordable kill paths until none is left.
    fn cut_corridors(turn: &mut Turn<'_>) {
        loop {
            let cap = turn.config().kill_walk_cap;
            let gold = turn.game().me.gold;
            let Some(path) = find_kill_paths(turn.game(), cap)
                .into_iter()
                .find(|p| p.cost() <= gold)
            else {
                return;
            };
            debug!(cut = %path.cut, killed = path.units_killed, cost = path.cost(), "kill path");
            for &pos in &path.route {
                if !turn.train(1, pos) {
                    return;
                }
            }
            for &pos in &path.stranded {
                turn.mark_enemy_dead(pos);
            }
            for &pos in &path.severed {
                turn.sever_enemy_tile(pos);
            }
        }
    }

    fn build_towers(turn: &mut Turn<'_>) {
        if turn.game().me.income < TOWER_MIN_INCOME {
            return;
        }
        let cap = turn.config().choke_walk_cap;
        let at_risk: Vec<Pos> = turn.game().me.units.iter().map(|u| u.pos).collect();
        for unit in at_risk {
            let game = turn.game();
            if let Some(choke) = find_choke_point(game, unit, cap)
                && game.board.count_neighbors(choke, TileState::EnemyActive) > 0
                && is_tower_site(game, choke)
            {
                turn.build_tower(choke);
            }
        }

        let enemy_hq = turn.game().headquarters(Owner::Enemy);
        if let Some(site) = aggressive_tower_sites(turn.game(), enemy_hq).first() {
            turn.build_tower(site.pos);
        }
    }

    /// Train on the best contested tile while income stays at or above
    /// `min_income`. With `once` set, stop after the first unit.
    fn train_contested(turn: &mut Turn<'_>, level: u8, max_enemy_level: u8, min_income: i32, once: bool) {
        let enemy_hq = turn.game().headquarters(Owner::Enemy);
        while turn.game().me.income >= min_income && turn.can_afford(train_cost(level)) {
            let Some(tile) = contested_tiles(turn.game(), level, max_enemy_level, enemy_hq)
                .first()
                .copied()
            else {
                return;
            };
            if !turn.train(level, tile.pos) || once {
                return;
            }
        }
    }
}

impl Policy for Offensive {
    fn name(&self) -> &'static str {
        "offensive"
    }

    fn play(&self, turn: &mut Turn<'_>) {
        Self::fight(turn);
        Self::cut_corridors(turn);
        Self::build_towers(turn);
        Self::train_contested(turn, 2, 1, LEVEL2_MIN_INCOME + 1, false);

        if let Some(&spot) = available_mine_spots(turn.game()).first() {
            turn.build_mine(spot);
        }

        Self::train_contested(turn, 3, 3, LEVEL3_MIN_INCOME, true);

        let enemy_hq = turn.game().headquarters(Owner::Enemy);
        while turn.can_afford(train_cost(1)) {
            let Some(tile) = training_frontier(turn.game(), enemy_hq).first().copied() else {
                break;
            };
            if !turn.train(1, tile.pos) {
                break;
            }
        }
    }
}

// =============================================================================
// Engine
// =============================================================================

/// Plans one turn at a time and keeps track of the phase.
pub struct Engine {
    config: EngineConfig,
    turn: u32,
    phase: Phase,
    conditionals: Vec<Box<dyn Policy>>,
    expansion: Expansion,
    offensive: Offensive,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            turn: 0,
            phase: Phase::Early,
            conditionals: vec![Box::new(InstantKill), Box::new(HuntLevel3), Box::new(TowerDefense)],
            expansion: Expansion,
            offensive: Offensive,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Number of turns played so far.
    pub fn turn(&self) -> u32 {
        self.turn
    }

    /// Names of the conditional policies that would fire on `game`.
    pub fn applicable_policies(&self, game: &Game) -> Vec<&'static str> {
        self.conditionals
            .iter()
            .filter(|p| p.is_applicable(game))
            .map(|p| p.name())
            .collect()
    }

    /// Plan and commit one turn. Returns the commands in commit order.
    pub fn play_turn(&mut self, game: &mut Game) -> Vec<Action> {
        self.turn += 1;
        if self.phase == Phase::Early && self.turn > self.config.early_turns {
            self.phase = Phase::Main;
            info!(turn = self.turn, "entering main phase");
        }
        info!(
            turn = self.turn,
            phase = ?self.phase,
            gold = game.me.gold,
            income = game.me.income,
            units = game.me.units.len(),
            "planning turn"
        );

        let mut turn = Turn::new(game, &self.config);
        for policy in &self.conditionals {
            if policy.is_applicable(turn.game()) {
                debug!(policy = policy.name(), "conditional policy fires");
                policy.play(&mut turn);
            }
        }
        let primary: &dyn Policy = match self.phase {
            Phase::Early => &self.expansion,
            Phase::Main => &self.offensive,
        };
        debug!(policy = primary.name(), "primary policy");
        primary.play(&mut turn);
        turn.finish()
    }
}
