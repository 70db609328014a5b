use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// One of the four directional responses a participant can give.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }

    pub fn arrow(&self) -> char {
        match self {
            Direction::Up => '↑',
            Direction::Down => '↓',
            Direction::Left => '←',
            Direction::Right => '→',
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a trial captured: a direction, or nothing before the deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    Pressed(Direction),
    Timeout,
}

impl Response {
    pub fn direction(&self) -> Option<Direction> {
        match self {
            Response::Pressed(d) => Some(*d),
            Response::Timeout => None,
        }
    }

    /// Export label; timeouts are written as `none`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Response::Pressed(d) => d.as_str(),
            Response::Timeout => "none",
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Response {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
