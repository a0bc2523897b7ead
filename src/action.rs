//! Resolves a mapped action into a concrete world command.

use std::ops::Add;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

/// Offset relative to the reference position at dispatch time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PositionOffset {
    pub dx: i32,
    pub dy: i32,
    pub dz: i32,
}

impl PositionOffset {
    pub const fn new(dx: i32, dy: i32, dz: i32) -> Self {
        Self { dx, dy, dz }
    }
}

impl Add<PositionOffset> for Position {
    type Output = Position;

    fn add(self, o: PositionOffset) -> Position {
        Position::new(
            self.x.wrapping_add(o.dx),
            self.y.wrapping_add(o.dy),
            self.z.wrapping_add(o.dz),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Face {
    Up,
    North,
    East,
    South,
    West,
}

/// What a mapped key does at its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Action {
    #[default]
    Strike,
    Up,
    North,
    East,
    South,
    West,
}

impl Action {
    /// Profile action codes: `-1` strike, `0` up, `1..=4` north/east/south/west.
    pub fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            -1 => Action::Strike,
            0 => Action::Up,
            1 => Action::North,
            2 => Action::East,
            3 => Action::South,
            4 => Action::West,
            _ => return None,
        })
    }

    pub fn code(self) -> i32 {
        match self {
            Action::Strike => -1,
            Action::Up => 0,
            Action::North => 1,
            Action::East => 2,
            Action::South => 3,
            Action::West => 4,
        }
    }

    /// Face an interaction uses; strikes have none.
    pub fn face(self) -> Option<Face> {
        match self {
            Action::Strike => None,
            Action::Up => Some(Face::Up),
            Action::North => Some(Face::North),
            Action::East => Some(Face::East),
            Action::South => Some(Face::South),
            Action::West => Some(Face::West),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorldCommand {
    InteractAt { position: Position, face: Face },
    StrikeAt { position: Position, face: Face },
}

impl WorldCommand {
    pub fn position(&self) -> Position {
        match *self {
            WorldCommand::InteractAt { position, .. } | WorldCommand::StrikeAt { position, .. } => {
                position
            }
        }
    }
}

pub fn translate(reference: Position, offset: PositionOffset, action: Action) -> WorldCommand {
    let position = reference + offset;
    match action.face() {
        Some(face) => WorldCommand::InteractAt { position, face },
        None => WorldCommand::StrikeAt {
            position,
            face: Face::Up,
        },
    }
}
