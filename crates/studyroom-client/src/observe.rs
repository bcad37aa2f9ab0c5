//! Collections that report their own structural changes.
//!
//! The mirrored room state keeps its tile list and player map in these
//! wrappers. Listeners are plain callbacks registered under a stable
//! [`ListenerId`]; every mutating method calls them before it returns.

use std::collections::BTreeMap;

/// Identifies a registered listener so it can be removed later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// A structural change to an observed collection.
///
/// `K` is the position for lists and the key for maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change<K> {
    Added(K),
    /// An existing entry was overwritten in place.
    Replaced(K),
    Removed(K),
    Cleared,
}

type Listener<K> = Box<dyn FnMut(Change<K>) + Send>;

struct Listeners<K> {
    next_id: u64,
    entries: Vec<(ListenerId, Listener<K>)>,
}

impl<K: Copy> Listeners<K> {
    fn new() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }

    fn add(&mut self, listener: Listener<K>) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, listener));
        id
    }

    fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(lid, _)| *lid != id);
        self.entries.len() != before
    }

    fn emit(&mut self, change: Change<K>) {
        for (_, listener) in &mut self.entries {
            listener(change);
        }
    }
}

// ---------------------------------------------------------------------------
// ObservedList
// ---------------------------------------------------------------------------

/// An append-only list with change listeners.
pub struct ObservedList<T> {
    items: Vec<T>,
    listeners: Listeners<usize>,
}

impl<T: Clone> ObservedList<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            listeners: Listeners::new(),
        }
    }

    pub fn on_change(
        &mut self,
        listener: impl FnMut(Change<usize>) + Send + 'static,
    ) -> ListenerId {
        self.listeners.add(Box::new(listener))
    }

    /// Returns `false` if the id was not registered.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    pub fn push(&mut self, item: T) {
        self.items.push(item);
        self.listeners.emit(Change::Added(self.items.len() - 1));
    }

    /// Empties the list. Clearing an empty list reports nothing.
    pub fn clear(&mut self) {
        if self.items.is_empty() {
            return;
        }
        self.items.clear();
        self.listeners.emit(Change::Cleared);
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// An independent copy of the current contents.
    pub fn to_vec(&self) -> Vec<T> {
        self.items.clone()
    }
}

impl<T: Clone> Default for ObservedList<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// ObservedMap
// ---------------------------------------------------------------------------

/// A string-keyed map with change listeners. Listeners get the key only.
pub struct ObservedMap<V> {
    entries: BTreeMap<String, V>,
    listeners: Listeners<()>,
}

impl<V: Clone> ObservedMap<V> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            listeners: Listeners::new(),
        }
    }

    /// Registers a listener. Map changes carry no position, so the
    /// listener receives `Change<()>`; look the key up in the map if needed.
    pub fn on_change(&mut self, listener: impl FnMut(Change<()>) + Send + 'static) -> ListenerId {
        self.listeners.add(Box::new(listener))
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Inserts or replaces the entry under `key`.
    pub fn put(&mut self, key: impl Into<String>, value: V) {
        let change = match self.entries.insert(key.into(), value) {
            Some(_) => Change::Replaced(()),
            None => Change::Added(()),
        };
        self.listeners.emit(change);
    }

    pub fn remove(&mut self, key: &str) -> Option<V> {
        let removed = self.entries.remove(key)?;
        self.listeners.emit(Change::Removed(()));
        Some(removed)
    }

    pub fn clear(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        self.entries.clear();
        self.listeners.emit(Change::Cleared);
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &V)> {
        self.entries.iter()
    }

    /// An independent copy of the current contents.
    pub fn to_map(&self) -> BTreeMap<String, V> {
        self.entries.clone()
    }
}

impl<V: Clone> Default for ObservedMap<V> {
    fn default() -> Self {
        Self::new()
    }
}
