//! Wire descriptors for the room entities and the patches that carry them.
//!
//! The mirrored room state has two scalar fields and two collections:
//!
//! | name           | shape                     | entry    |
//! |----------------|---------------------------|----------|
//! | `width_units`  | int field                 |          |
//! | `height_units` | int field                 |          |
//! | `layout`       | list, row-major           | [`Tile`] |
//! | `players`      | keyed by player id        | [`Player`] |

use studyroom_protocol::{
    FieldDescriptor, FieldReader, FieldValue, ProtocolError, Schema, SchemaDescriptor, StatePatch,
    encode_record,
};

use crate::{Player, RoomState, Tile};

pub const WIDTH_UNITS: &str = "width_units";
pub const HEIGHT_UNITS: &str = "height_units";
pub const LAYOUT: &str = "layout";
pub const PLAYERS: &str = "players";

pub const TILE_DESCRIPTOR: SchemaDescriptor = SchemaDescriptor {
    name: "Tile",
    fields: &[
        FieldDescriptor::string("id"),
        FieldDescriptor::string("color"),
        FieldDescriptor::string("kind"),
    ],
};

pub const PLAYER_DESCRIPTOR: SchemaDescriptor = SchemaDescriptor {
    name: "Player",
    fields: &[
        FieldDescriptor::string("id"),
        FieldDescriptor::string("color"),
        FieldDescriptor::int("x"),
        FieldDescriptor::int("y"),
        FieldDescriptor::string("direction"),
        FieldDescriptor::string("action"),
    ],
};

impl Schema for Tile {
    const DESCRIPTOR: &'static SchemaDescriptor = &TILE_DESCRIPTOR;

    fn to_fields(&self) -> Vec<FieldValue> {
        vec![
            self.id.as_str().into(),
            self.color.as_str().into(),
            self.kind.as_str().into(),
        ]
    }

    fn from_fields(fields: Vec<FieldValue>) -> Result<Self, ProtocolError> {
        let mut reader = FieldReader::new(Self::DESCRIPTOR, fields);
        Ok(Self {
            id: reader.string()?,
            color: reader.string()?,
            kind: reader.parse()?,
        })
    }
}

impl Schema for Player {
    const DESCRIPTOR: &'static SchemaDescriptor = &PLAYER_DESCRIPTOR;

    fn to_fields(&self) -> Vec<FieldValue> {
        vec![
            self.id.as_str().into(),
            self.color.as_str().into(),
            i64::from(self.x).into(),
            i64::from(self.y).into(),
            self.direction.as_str().into(),
            self.action.as_str().into(),
        ]
    }

    fn from_fields(fields: Vec<FieldValue>) -> Result<Self, ProtocolError> {
        let mut reader = FieldReader::new(Self::DESCRIPTOR, fields);
        Ok(Self {
            id: reader.string()?,
            color: reader.string()?,
            x: coordinate(reader.int()?)?,
            y: coordinate(reader.int()?)?,
            direction: reader.parse()?,
            action: reader.parse()?,
        })
    }
}

fn coordinate(value: i64) -> Result<i32, ProtocolError> {
    i32::try_from(value)
        .map_err(|_| ProtocolError::schema("Player", format!("coordinate {value} out of range")))
}

/// The patch a new participant receives first: both collections cleared,
/// scalars set, every tile pushed in row-major order, every player put.
pub fn full_state_patch(state: &RoomState) -> Result<StatePatch, ProtocolError> {
    let mut patch = StatePatch::new()
        .clear(LAYOUT)
        .clear(PLAYERS)
        .field(WIDTH_UNITS, i64::from(state.width_units).into())
        .field(HEIGHT_UNITS, i64::from(state.height_units).into());
    for tile in state.grid.tiles() {
        patch = patch.push(LAYOUT, encode_record(tile)?);
    }
    for (id, player) in &state.players {
        patch = patch.put(PLAYERS, id.as_str(), encode_record(player)?);
    }
    Ok(patch)
}

/// Inserts or replaces one player entry.
pub fn player_put(player: &Player) -> Result<StatePatch, ProtocolError> {
    Ok(StatePatch::new().put(PLAYERS, player.id.as_str(), encode_record(player)?))
}

/// Removes one player entry.
pub fn player_delete(id: &str) -> StatePatch {
    StatePatch::new().delete(PLAYERS, id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Action, Direction, Simulation, TileKind, layout::skeleton};
    use studyroom_protocol::{PatchOp, Record, decode_record};

    #[test]
    fn test_tile_record_shape() {
        let record = encode_record(&Tile::new(TileKind::Wall, 0, 0)).unwrap();
        assert_eq!(
            serde_json::to_string(&record).unwrap(),
            r##"["wall-0-0","#8B4513","wall"]"##
        );
    }

    #[test]
    fn test_player_record_decodes() {
        let record: Record =
            serde_json::from_str(r##"["p1","#00FF00",4,7,"left","walk"]"##).unwrap();
        let player: Player = decode_record(record).unwrap();
        assert_eq!(player.position(), (4, 7));
        assert_eq!(player.direction, Direction::Left);
        assert_eq!(player.action, Action::Walk);
    }

    #[test]
    fn test_player_record_with_unknown_direction_fails() {
        let record: Record =
            serde_json::from_str(r##"["p1","#00FF00",4,7,"sideways","walk"]"##).unwrap();
        let err = decode_record::<Player>(record).unwrap_err();
        assert!(matches!(err, ProtocolError::Schema { schema: "Player", .. }));
    }

    #[test]
    fn test_tile_record_with_number_for_kind_fails() {
        let record: Record = serde_json::from_str(r##"["x","#000000",3]"##).unwrap();
        assert!(decode_record::<Tile>(record).is_err());
    }

    #[test]
    fn test_full_state_patch_layout() {
        let mut sim = Simulation::from_grid(skeleton(6, 5));
        sim.add_player("a", "#0000FF", (3, 2)).unwrap();

        let patch = full_state_patch(sim.state()).unwrap();

        assert!(matches!(&patch.ops[0], PatchOp::Clear { collection } if collection == LAYOUT));
        assert!(matches!(&patch.ops[1], PatchOp::Clear { collection } if collection == PLAYERS));
        let pushes = patch
            .ops
            .iter()
            .filter(|op| matches!(op, PatchOp::Push { .. }))
            .count();
        assert_eq!(pushes, 30);
        assert!(matches!(patch.ops.last(), Some(PatchOp::Put { key, .. }) if key == "a"));
    }
}
