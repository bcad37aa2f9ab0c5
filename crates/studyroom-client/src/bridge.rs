//! Copy-on-write reconciliation of the live mirror into snapshots.
//!
//! ```text
//! patch ──apply──→ LiveRoomState ──listeners──→ dirty flags
//!                        │
//!                "state changed"
//!                        ▼
//!          dirty collection: fresh copy, new Arc
//!          clean collection: previous snapshot's Arc
//!                        ▼
//!              KeyedStore<Option<RoomSnapshot>>
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use studyroom_protocol::StatePatch;
use studyroom_sim::{Player, Tile};

use crate::observe::ListenerId;
use crate::{KeyedStore, LiveRoomState};

/// An immutable, point-in-time copy of a room.
///
/// Cloning is cheap. Two snapshots share a collection's `Arc` exactly when
/// that collection did not change between them, so `Arc::ptr_eq` is a
/// valid "unchanged" test for renderers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSnapshot {
    pub width_units: u32,
    pub height_units: u32,
    /// Row-major, `width_units * height_units` tiles once fully synced.
    pub layout: Arc<Vec<Tile>>,
    pub players: Arc<BTreeMap<String, Player>>,
}

impl RoomSnapshot {
    pub fn tile_at(&self, x: i32, y: i32) -> Option<&Tile> {
        if x < 0 || y < 0 || x as u32 >= self.width_units || y as u32 >= self.height_units {
            return None;
        }
        self.layout
            .get(y as usize * self.width_units as usize + x as usize)
    }

    /// The layout as rows, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[Tile]> {
        self.layout.chunks(self.width_units.max(1) as usize)
    }

    pub fn player(&self, id: &str) -> Option<&Player> {
        self.players.get(id)
    }
}

/// Owns the live mirror and publishes snapshots of it.
///
/// Both dirty flags start set, so the first snapshot copies everything.
pub struct SyncBridge {
    live: LiveRoomState,
    layout_dirty: Arc<AtomicBool>,
    players_dirty: Arc<AtomicBool>,
    listeners: (ListenerId, ListenerId),
    last: Option<RoomSnapshot>,
    store: KeyedStore<Option<RoomSnapshot>>,
}

impl SyncBridge {
    /// Attaches change listeners to both collections of `live`.
    pub fn install(mut live: LiveRoomState, store: KeyedStore<Option<RoomSnapshot>>) -> Self {
        let layout_dirty = Arc::new(AtomicBool::new(true));
        let players_dirty = Arc::new(AtomicBool::new(true));

        let flag = Arc::clone(&layout_dirty);
        let layout_listener = live
            .layout
            .on_change(move |_| flag.store(true, Ordering::Release));
        let flag = Arc::clone(&players_dirty);
        let players_listener = live
            .players
            .on_change(move |_| flag.store(true, Ordering::Release));

        Self {
            live,
            layout_dirty,
            players_dirty,
            listeners: (layout_listener, players_listener),
            last: None,
            store,
        }
    }

    /// Applies one patch, then publishes exactly one snapshot.
    pub fn apply(&mut self, patch: &StatePatch) {
        self.live.apply_patch(patch);
        self.state_changed();
    }

    /// Builds a snapshot from the dirty flags and pushes it into the store.
    pub fn state_changed(&mut self) {
        let layout = match &self.last {
            Some(last) if !self.layout_dirty.swap(false, Ordering::AcqRel) => {
                Arc::clone(&last.layout)
            }
            _ => {
                self.layout_dirty.store(false, Ordering::Release);
                Arc::new(self.live.layout.to_vec())
            }
        };
        let players = match &self.last {
            Some(last) if !self.players_dirty.swap(false, Ordering::AcqRel) => {
                Arc::clone(&last.players)
            }
            _ => {
                self.players_dirty.store(false, Ordering::Release);
                Arc::new(self.live.players.to_map())
            }
        };

        // Dimensions never change after creation, so they are read, not tracked.
        let snapshot = RoomSnapshot {
            width_units: self.live.width_units,
            height_units: self.live.height_units,
            layout,
            players,
        };
        self.last = Some(snapshot.clone());
        self.store.set(Some(snapshot));
    }

    /// Removes the listeners and hands back the mirror.
    pub fn detach(mut self) -> LiveRoomState {
        let (layout, players) = self.listeners;
        self.live.layout.remove_listener(layout);
        self.live.players.remove_listener(players);
        self.live
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use studyroom_sim::{Direction, Simulation, layout::skeleton, schema};

    fn synced() -> (Simulation, SyncBridge, KeyedStore<Option<RoomSnapshot>>) {
        let mut sim = Simulation::from_grid(skeleton(10, 8));
        sim.add_player("a", "#0000FF", (5, 5)).unwrap();
        let store = KeyedStore::new(None);
        let mut bridge = SyncBridge::install(LiveRoomState::new(), store.clone());
        bridge.apply(&schema::full_state_patch(sim.state()).unwrap());
        (sim, bridge, store)
    }

    #[test]
    fn test_first_snapshot_copies_everything() {
        let (sim, bridge, store) = synced();
        let snap = store.get().unwrap();

        assert_eq!((snap.width_units, snap.height_units), (10, 8));
        assert_eq!(snap.layout.as_slice(), sim.grid().tiles());
        assert_eq!(*snap.players, sim.state().players);
        assert!(!std::ptr::eq(
            snap.layout.as_ptr(),
            bridge.live.layout.as_slice().as_ptr()
        ));
    }

    #[test]
    fn test_player_change_copies_players_and_reuses_layout() {
        let (mut sim, mut bridge, store) = synced();
        let before = store.get().unwrap();

        sim.apply_move("a", 1, 0, Direction::Right);
        bridge.apply(&schema::player_put(sim.player("a").unwrap()).unwrap());
        let after = store.get().unwrap();

        assert!(Arc::ptr_eq(&before.layout, &after.layout));
        assert!(!Arc::ptr_eq(&before.players, &after.players));
        assert_eq!(*after.players, bridge.live.players.to_map());
        assert_eq!(after.player("a").unwrap().position(), (6, 5));
        assert_eq!(before.player("a").unwrap().position(), (5, 5));
    }

    #[test]
    fn test_empty_patch_reuses_both_collections() {
        let (_, mut bridge, store) = synced();
        let before = store.get().unwrap();

        bridge.apply(&StatePatch::new());
        let after = store.get().unwrap();

        assert!(Arc::ptr_eq(&before.layout, &after.layout));
        assert!(Arc::ptr_eq(&before.players, &after.players));
    }

    #[test]
    fn test_every_patch_publishes_once() {
        let (_, mut bridge, store) = synced();
        let count = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let _sub = store.subscribe(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        bridge.apply(&schema::player_delete("a"));
        bridge.apply(&StatePatch::new());

        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert!(store.get().unwrap().players.is_empty());
    }

    #[test]
    fn test_detached_mirror_no_longer_marks_dirty() {
        let (_, bridge, _) = synced();
        let flag = Arc::clone(&bridge.players_dirty);

        let mut live = bridge.detach();
        live.players.clear();

        assert!(!flag.load(Ordering::Acquire));
    }

    #[test]
    fn test_tile_lookup_and_rows() {
        let (sim, _, store) = synced();
        let snap = store.get().unwrap();

        assert_eq!(snap.tile_at(2, 1), sim.grid().get(2, 1));
        assert_eq!(snap.tile_at(10, 0), None);
        assert_eq!(snap.tile_at(-1, 0), None);
        let rows: Vec<_> = snap.rows().collect();
        assert_eq!(rows.len(), 8);
        assert!(rows.iter().all(|row| row.len() == 10));
    }
}
