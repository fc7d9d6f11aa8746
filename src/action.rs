//! Commands the engine sends back to the server.

use std::fmt;

use crate::board::Pos;

/// One command of the turn's output line.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Move { id: i32, to: Pos },
    Train { level: u8, at: Pos },
    BuildMine(Pos),
    BuildTower(Pos),
    Wait,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Move { id, to } => write!(f, "MOVE {id} {to}"),
            Action::Train { level, at } => write!(f, "TRAIN {level} {at}"),
            Action::BuildMine(pos) => write!(f, "BUILD MINE {pos}"),
            Action::BuildTower(pos) => write!(f, "BUILD TOWER {pos}"),
            Action::Wait => write!(f, "WAIT"),
        }
    }
}
