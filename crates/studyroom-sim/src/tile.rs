//! Tile kinds and the fixed palette.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::SimError;

/// What occupies a grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileKind {
    Wall,
    Floor,
    Counter,
    CoffeeMachine,
    CashRegister,
    Table,
    Chair,
    Stool,
    TvStand,
    Plant,
    Sofa,
    Rug,
}

impl TileKind {
    pub const ALL: [TileKind; 12] = [
        Self::Wall,
        Self::Floor,
        Self::Counter,
        Self::CoffeeMachine,
        Self::CashRegister,
        Self::Table,
        Self::Chair,
        Self::Stool,
        Self::TvStand,
        Self::Plant,
        Self::Sofa,
        Self::Rug,
    ];

    /// Chair variants a table can attach.
    pub const SEATS: [TileKind; 2] = [Self::Chair, Self::Stool];

    /// Extra decor scattered after tables.
    pub const SCATTER_DECOR: [TileKind; 2] = [Self::Sofa, Self::Rug];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Wall => "wall",
            Self::Floor => "floor",
            Self::Counter => "counter",
            Self::CoffeeMachine => "coffee_machine",
            Self::CashRegister => "cash_register",
            Self::Table => "table",
            Self::Chair => "chair",
            Self::Stool => "stool",
            Self::TvStand => "tv_stand",
            Self::Plant => "plant",
            Self::Sofa => "sofa",
            Self::Rug => "rug",
        }
    }

    /// Palette color as `#RRGGBB`.
    pub fn color(self) -> &'static str {
        match self {
            Self::Wall => "#8B4513",
            Self::Floor => "#F5DEB3",
            Self::Counter => "#D2691E",
            Self::CoffeeMachine => "#4682B4",
            Self::CashRegister => "#DAA520",
            Self::Table => "#A0522D",
            Self::Chair => "#DEB887",
            Self::Stool => "#CD853F",
            Self::TvStand => "#2F4F4F",
            Self::Plant => "#228B22",
            Self::Sofa => "#800000",
            Self::Rug => "#BC8F8F",
        }
    }

    /// A player may stand here: bare floor or any seat.
    pub fn is_walkable(self) -> bool {
        matches!(self, Self::Floor) || self.is_seat()
    }

    pub fn is_seat(self) -> bool {
        Self::SEATS.contains(&self)
    }
}

impl fmt::Display for TileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TileKind {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| SimError::unknown("tile kind", s))
    }
}

/// One grid cell. Immutable once the layout is generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    /// `{kind}-{x}-{y}`, stable for the lifetime of the room.
    pub id: String,
    pub color: String,
    pub kind: TileKind,
}

impl Tile {
    pub fn new(kind: TileKind, x: u32, y: u32) -> Self {
        Self {
            id: format!("{kind}-{x}-{y}"),
            color: kind.color().to_owned(),
            kind,
        }
    }
}
