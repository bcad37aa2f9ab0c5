use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::SimError;

/// The way a player faces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    #[default]
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    /// The unit step this direction points at.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| SimError::unknown("direction", s))
    }
}

/// What a player is doing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    #[default]
    Idle,
    Walk,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Walk => "walk",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "idle" => Ok(Self::Idle),
            "walk" => Ok(Self::Walk),
            other => Err(SimError::unknown("action", other)),
        }
    }
}

/// A participant's avatar. Owned and moved only by the simulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub color: String,
    pub x: i32,
    pub y: i32,
    pub direction: Direction,
    pub action: Action,
}

impl Player {
    /// A freshly joined player: facing down, idle.
    pub fn new(id: impl Into<String>, color: impl Into<String>, x: i32, y: i32) -> Self {
        Self {
            id: id.into(),
            color: color.into(),
            x,
            y,
            direction: Direction::default(),
            action: Action::default(),
        }
    }

    pub fn position(&self) -> (i32, i32) {
        (self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_player_faces_down_and_idles() {
        let p = Player::new("a", "#FF0000", 3, 4);
        assert_eq!(p.direction, Direction::Down);
        assert_eq!(p.action, Action::Idle);
        assert_eq!(p.position(), (3, 4));
    }

    #[test]
    fn test_direction_parse_and_delta() {
        assert_eq!("left".parse::<Direction>().unwrap().delta(), (-1, 0));
        assert!("north".parse::<Direction>().is_err());
    }

    #[test]
    fn test_action_parse_rejects_unknown() {
        let err = "run".parse::<Action>().unwrap_err();
        assert_eq!(err.to_string(), "unknown action: \"run\"");
    }
}
