//! Line protocol spoken with the game server.
//!
//! The server first sends the mine spots, then one snapshot per turn:
//!
//! ```text
//! <mine spot count>
//! <x> <y>                        (one line per spot)
//! <gold> <income> <enemy gold> <enemy income>
//! <12 rows of 12 tile codes>
//! <building count>
//! <owner> <type> <x> <y>         (one line per building)
//! <unit count>
//! <owner> <id> <level> <x> <y>   (one line per unit)
//! ```
//!
//! The bot answers every snapshot with a single line of `;`-terminated
//! commands ending in `WAIT;`.

use std::collections::VecDeque;
use std::io::{BufRead, Write};

use tracing::{info, warn};

use crate::action::Action;
use crate::board::Pos;
use crate::constants::N;
use crate::error::{GameError, Result};
use crate::game::{Game, MineSpot, RawBuilding, RawUnit, Snapshot};
use crate::strategy::Engine;

/// Whitespace-separated token reader over any buffered input.
pub struct TokenReader<R> {
    reader: R,
    pending: VecDeque<String>,
}

impl<R: BufRead> TokenReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            pending: VecDeque::new(),
        }
    }

    /// Next token, or `None` once the input is exhausted.
    pub fn next_token(&mut self) -> Result<Option<String>> {
        while self.pending.is_empty() {
            let mut line = String::new();
            if self.reader.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            self.pending
                .extend(line.split_whitespace().map(str::to_owned));
        }
        Ok(self.pending.pop_front())
    }

    /// Next token; running out of input is an error.
    pub fn token(&mut self, field: &'static str) -> Result<String> {
        self.next_token()?.ok_or(GameError::UnexpectedEof(field))
    }

    pub fn int(&mut self, field: &'static str) -> Result<i32> {
        let token = self.token(field)?;
        parse_int(token, field)
    }

    /// A count that must not be negative.
    pub fn count(&mut self, field: &'static str) -> Result<usize> {
        let token = self.token(field)?;
        token
            .parse::<usize>()
            .map_err(|_| GameError::InvalidToken { token, field })
    }
}

fn parse_int(token: String, field: &'static str) -> Result<i32> {
    token
        .parse::<i32>()
        .map_err(|_| GameError::InvalidToken { token, field })
}

/// Read the one-off list of mine spots.
pub fn read_mine_spots<R: BufRead>(tokens: &mut TokenReader<R>) -> Result<Vec<MineSpot>> {
    let count = tokens.count("mine spot count")?;
    (0..count)
        .map(|_| {
            let x = tokens.int("mine spot x")?;
            let y = tokens.int("mine spot y")?;
            Ok(MineSpot::new(Pos::new(x, y)))
        })
        .collect()
}

/// Read one turn snapshot. `Ok(None)` means the input ended cleanly before
/// the snapshot started.
pub fn read_snapshot<R: BufRead>(tokens: &mut TokenReader<R>) -> Result<Option<Snapshot>> {
    let Some(first) = tokens.next_token()? else {
        return Ok(None);
    };
    let gold = parse_int(first, "gold")?;
    let income = tokens.int("income")?;
    let enemy_gold = tokens.int("enemy gold")?;
    let enemy_income = tokens.int("enemy income")?;

    let rows = (0..N)
        .map(|_| tokens.token("tile row"))
        .collect::<Result<Vec<_>>>()?;

    let building_count = tokens.count("building count")?;
    let mut buildings = Vec::with_capacity(building_count);
    for _ in 0..building_count {
        buildings.push(RawBuilding {
            owner: tokens.int("building owner")?,
            kind: tokens.int("building type")?,
            x: tokens.int("building x")?,
            y: tokens.int("building y")?,
        });
    }

    let unit_count = tokens.count("unit count")?;
    let mut units = Vec::with_capacity(unit_count);
    for _ in 0..unit_count {
        units.push(RawUnit {
            owner: tokens.int("unit owner")?,
            id: tokens.int("unit id")?,
            level: tokens.int("unit level")?,
            x: tokens.int("unit x")?,
            y: tokens.int("unit y")?,
        });
    }

    Ok(Some(Snapshot {
        gold,
        income,
        enemy_gold,
        enemy_income,
        rows,
        buildings,
        units,
    }))
}

/// Render a turn's commands as one output line (without the newline).
pub fn format_actions(actions: &[Action]) -> String {
    let mut line: String = actions.iter().map(|a| format!("{a};")).collect();
    line.push_str(&format!("{};", Action::Wait));
    line
}

/// Engine plus game state, driven by the server's input stream.
pub struct Bot {
    engine: Engine,
    game: Game,
}

impl Default for Bot {
    fn default() -> Self {
        Self::new(Engine::default())
    }
}

impl Bot {
    pub fn new(engine: Engine) -> Self {
        Self {
            engine,
            game: Game::new(Vec::new()),
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    /// Play until the input ends.
    ///
    /// A snapshot that fails validation is answered with a bare `WAIT;` so
    /// the server stays in step; the previous state is kept. Malformed
    /// tokens or I/O failures end the match with an error.
    pub fn run<R: BufRead, W: Write>(&mut self, reader: R, mut writer: W) -> Result<()> {
        let mut tokens = TokenReader::new(reader);
        self.game = Game::new(read_mine_spots(&mut tokens)?);
        info!(mine_spots = self.game.mine_spots.len(), "match started");

        while let Some(snapshot) = read_snapshot(&mut tokens)? {
            let actions = match self.game.apply_snapshot(&snapshot) {
                Ok(()) => self.engine.play_turn(&mut self.game),
                Err(err) => {
                    warn!(%err, "snapshot rejected, waiting this turn");
                    Vec::new()
                }
            };
            writeln!(writer, "{}", format_actions(&actions))?;
            writer.flush()?;
        }

        info!(turns = self.engine.turn(), "input closed");
        Ok(())
    }
}
