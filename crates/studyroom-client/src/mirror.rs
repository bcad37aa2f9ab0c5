//! The client's live copy of a room, mutated only by incoming patches.

use studyroom_protocol::{FieldValue, PatchOp, ProtocolError, Record, StatePatch, decode_record};
use studyroom_sim::schema::{HEIGHT_UNITS, LAYOUT, PLAYERS, WIDTH_UNITS};
use studyroom_sim::{Player, Tile};

use crate::observe::{ObservedList, ObservedMap};

/// Mirrored room state.
///
/// Readers outside the client never see this object; they get
/// [`RoomSnapshot`](crate::RoomSnapshot)s copied from it.
#[derive(Default)]
pub struct LiveRoomState {
    pub width_units: u32,
    pub height_units: u32,
    pub layout: ObservedList<Tile>,
    pub players: ObservedMap<Player>,
}

impl LiveRoomState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies every operation in order and returns how many applied.
    ///
    /// A bad operation is logged and skipped; the rest still apply.
    pub fn apply_patch(&mut self, patch: &StatePatch) -> usize {
        let mut applied = 0;
        for op in &patch.ops {
            match self.apply_op(op) {
                Ok(()) => applied += 1,
                Err(e) => tracing::warn!(error = %e, ?op, "skipping patch op"),
            }
        }
        applied
    }

    fn apply_op(&mut self, op: &PatchOp) -> Result<(), ProtocolError> {
        match op {
            PatchOp::Field { name, value } => {
                let value = dimension(name, value)?;
                match name.as_str() {
                    WIDTH_UNITS => self.width_units = value,
                    HEIGHT_UNITS => self.height_units = value,
                    other => return Err(unknown("field", other)),
                }
            }
            PatchOp::Push { collection, record } => match collection.as_str() {
                LAYOUT => self.layout.push(decode_record(record.clone())?),
                other => return Err(unknown("list", other)),
            },
            PatchOp::Put {
                collection,
                key,
                record,
            } => match collection.as_str() {
                PLAYERS => self.players.put(key.as_str(), decode_player(key, record)?),
                other => return Err(unknown("map", other)),
            },
            PatchOp::Delete { collection, key } => match collection.as_str() {
                PLAYERS => {
                    self.players.remove(key);
                }
                other => return Err(unknown("map", other)),
            },
            PatchOp::Clear { collection } => match collection.as_str() {
                LAYOUT => self.layout.clear(),
                PLAYERS => self.players.clear(),
                other => return Err(unknown("collection", other)),
            },
        }
        Ok(())
    }
}

fn dimension(name: &str, value: &FieldValue) -> Result<u32, ProtocolError> {
    value
        .as_int()
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| ProtocolError::InvalidMessage(format!("field `{name}` is not a dimension")))
}

fn decode_player(key: &str, record: &Record) -> Result<Player, ProtocolError> {
    let player: Player = decode_record(record.clone())?;
    if player.id != key {
        return Err(ProtocolError::InvalidMessage(format!(
            "player `{}` stored under key `{key}`",
            player.id
        )));
    }
    Ok(player)
}

fn unknown(what: &str, name: &str) -> ProtocolError {
    ProtocolError::InvalidMessage(format!("unknown {what} `{name}`"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use studyroom_protocol::encode_record;
    use studyroom_sim::{Direction, Simulation, layout::skeleton, schema};

    fn room() -> Simulation {
        let mut sim = Simulation::from_grid(skeleton(8, 6));
        sim.add_player("a", "#0000FF", (4, 4)).unwrap();
        sim
    }

    #[test]
    fn test_full_state_rebuilds_the_room() {
        let sim = room();
        let mut live = LiveRoomState::new();

        let patch = schema::full_state_patch(sim.state()).unwrap();
        let applied = live.apply_patch(&patch);

        assert_eq!(applied, patch.len());
        assert_eq!((live.width_units, live.height_units), (8, 6));
        assert_eq!(live.layout.as_slice(), sim.grid().tiles());
        assert_eq!(live.players.get("a"), sim.player("a"));
    }

    #[test]
    fn test_second_full_state_replaces_the_first() {
        let sim = room();
        let mut live = LiveRoomState::new();
        let patch = schema::full_state_patch(sim.state()).unwrap();

        live.apply_patch(&patch);
        live.apply_patch(&patch);

        assert_eq!(live.layout.len(), 48);
        assert_eq!(live.players.len(), 1);
    }

    #[test]
    fn test_put_and_delete_player() {
        let mut sim = room();
        let mut live = LiveRoomState::new();
        live.apply_patch(&schema::full_state_patch(sim.state()).unwrap());

        sim.apply_move("a", 1, 0, Direction::Right);
        live.apply_patch(&schema::player_put(sim.player("a").unwrap()).unwrap());
        assert_eq!(live.players.get("a").unwrap().position(), (5, 4));

        live.apply_patch(&schema::player_delete("a"));
        assert!(live.players.is_empty());
    }

    #[test]
    fn test_bad_ops_are_skipped() {
        let sim = room();
        let player = sim.player("a").unwrap();
        let patch = StatePatch::new()
            .field(WIDTH_UNITS, FieldValue::Str("wide".into()))
            .push("furniture", encode_record(&sim.grid().tiles()[0]).unwrap())
            .put(PLAYERS, "not-a", encode_record(player).unwrap())
            .put(LAYOUT, "a", encode_record(player).unwrap())
            .put(PLAYERS, "a", encode_record(player).unwrap());

        let mut live = LiveRoomState::new();
        let applied = live.apply_patch(&patch);

        assert_eq!(applied, 1);
        assert_eq!(live.width_units, 0);
        assert_eq!(live.players.len(), 1);
    }
}
