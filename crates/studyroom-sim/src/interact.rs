//! Staff roles and what they can do with the service fixtures.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{SimError, TileKind};

/// A staff role. Each one owns exactly one kind of fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Barista,
    Cashier,
    Waiter,
}

impl Role {
    pub const ALL: [Role; 3] = [Self::Barista, Self::Cashier, Self::Waiter];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Barista => "barista",
            Self::Cashier => "cashier",
            Self::Waiter => "waiter",
        }
    }

    /// The fixture this role operates.
    pub fn station(self) -> TileKind {
        match self {
            Self::Barista => TileKind::CoffeeMachine,
            Self::Cashier => TileKind::CashRegister,
            Self::Waiter => TileKind::Table,
        }
    }

    /// The role that may operate `kind`, if any.
    pub fn for_station(kind: TileKind) -> Option<Role> {
        Self::ALL.into_iter().find(|role| role.station() == kind)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| SimError::unknown("role", s))
    }
}

/// Result of interacting with one tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    /// The role operated its own fixture.
    Used { kind: TileKind },
    /// The fixture belongs to another role.
    Refused { kind: TileKind, owner: Role },
    /// Not a fixture, or out of bounds.
    Nothing,
}

impl Interaction {
    pub(crate) fn with(kind: Option<TileKind>, role: Role) -> Self {
        let Some((kind, owner)) = kind.and_then(|k| Role::for_station(k).map(|r| (k, r))) else {
            return Self::Nothing;
        };
        if owner == role {
            Self::Used { kind }
        } else {
            Self::Refused { kind, owner }
        }
    }

    pub fn is_used(&self) -> bool {
        matches!(self, Self::Used { .. })
    }

    /// A line for the acting player.
    pub fn message(&self) -> &'static str {
        match *self {
            Self::Used { kind: TileKind::CoffeeMachine } => "You made a delicious coffee!",
            Self::Used { kind: TileKind::CashRegister } => "You processed a payment.",
            Self::Used { .. } => "You cleaned the table.",
            Self::Refused { owner: Role::Barista, .. } => {
                "Only the barista can use the coffee machine."
            }
            Self::Refused { owner: Role::Cashier, .. } => {
                "Only the cashier can use the cash register."
            }
            Self::Refused { owner: Role::Waiter, .. } => "Only the waiter can clean tables.",
            Self::Nothing => "Nothing to interact with here.",
        }
    }
}
