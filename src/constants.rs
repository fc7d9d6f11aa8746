//! Constants for grid dimensions, game economy, and engine parameters.
//!
//! Everything here mirrors the rules enforced by the game server. Values that
//! are engine tuning knobs rather than rules are only defaults: see
//! [`EngineConfig`](crate::strategy::EngineConfig) for the runtime copy.

// =============================================================================
// Grid Geometry
// =============================================================================

/// Grid size (NxN). The map is always 12x12.
pub const N: i32 = 12;

/// Total number of tiles on the grid.
pub const TILE_COUNT: usize = (N * N) as usize;

// =============================================================================
// Economy
// =============================================================================

/// Gold cost to train a unit, indexed by `level - 1`.
pub const TRAIN_COST: [i32; 3] = [10, 20, 30];

/// Upkeep (income reduction) of a unit, indexed by `level - 1`.
pub const UPKEEP: [i32; 3] = [1, 4, 20];

/// Base cost of a mine. Each mine already owned adds [`MINE_COST_STEP`].
pub const MINE_BASE_COST: i32 = 20;

/// Extra cost per mine already owned.
pub const MINE_COST_STEP: i32 = 4;

/// Income produced by one mine.
pub const MINE_INCOME: i32 = 4;

/// Cost of a tower.
pub const TOWER_COST: i32 = 15;

/// Highest unit level.
pub const MAX_LEVEL: u8 = 3;

// =============================================================================
// Affordability Tiers
// =============================================================================

/// Level-2 training requires income strictly above this.
pub const LEVEL2_MIN_INCOME: i32 = 4;

/// Tower construction requires at least this much income.
pub const TOWER_MIN_INCOME: i32 = 5;

/// Level-3 training requires at least this much income.
pub const LEVEL3_MIN_INCOME: i32 = 35;

// =============================================================================
// Engine Defaults
// =============================================================================

/// Number of expansion-only turns before the main phase starts.
pub const EARLY_PHASE_TURNS: u32 = 6;

/// Maximum number of own units during the early phase.
pub const MAX_EARLY_UNITS: usize = 7;

/// Minimum own units before the early phase spends gold on a mine.
pub const EARLY_MINE_MIN_UNITS: usize = 3;

/// Step cap for the own-corridor vulnerability walk.
pub const CHOKE_WALK_CAP: usize = 6;

/// Step cap for the enemy-corridor kill-path walk.
pub const KILL_WALK_CAP: usize = 12;

/// Manhattan range within which a unit engages an enemy unit.
pub const ENGAGEMENT_RANGE: i32 = 4;

/// Id carried by units queued this turn and not yet confirmed by the server.
pub const PENDING_UNIT_ID: i32 = -1;

/// Cost to train a unit of the given level.
#[inline]
pub fn train_cost(level: u8) -> i32 {
    TRAIN_COST[usize::from(level.clamp(1, MAX_LEVEL)) - 1]
}

/// Upkeep of a unit of the given level.
#[inline]
pub fn upkeep(level: u8) -> i32 {
    UPKEEP[usize::from(level.clamp(1, MAX_LEVEL)) - 1]
}

/// Cost of the next mine given how many mines are already owned.
#[inline]
pub fn mine_cost(owned_mines: usize) -> i32 {
    MINE_BASE_COST + MINE_COST_STEP * owned_mines as i32
}
