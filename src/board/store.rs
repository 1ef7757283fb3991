use std::collections::HashMap;

use crate::errors::BoardError;
use crate::geometry::Position;

use super::models::{ItemId, MovableItem};

/// Authoritative in-memory collection of board items.
///
/// All mutation happens on the single UI event loop, so there is no locking.
/// Writes are optimistic: they succeed whenever the item exists, and are used
/// both for live drag feedback and for rollback.
#[derive(Debug, Clone, Default)]
pub struct BoardStateStore {
    /// Items in insertion order.
    items: Vec<MovableItem>,
    index: HashMap<ItemId, usize>,
}

impl BoardStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from loaded items. Duplicate ids keep the first occurrence.
    ///
    /// Positions are trusted as loaded, even when they fall outside the
    /// current clamp rectangle.
    pub fn from_items(items: impl IntoIterator<Item = MovableItem>) -> Self {
        let mut store = Self::new();
        for item in items {
            if let Err(err) = store.insert(item) {
                tracing::warn!(%err, "skipping duplicate item in snapshot");
            }
        }
        store
    }

    pub fn get_item(&self, id: ItemId) -> Option<&MovableItem> {
        self.index.get(&id).map(|&i| &self.items[i])
    }

    pub fn position_of(&self, id: ItemId) -> Option<Position> {
        self.get_item(id).map(|item| item.position)
    }

    pub fn set_position(&mut self, id: ItemId, position: Position) -> Result<(), BoardError> {
        self.get_mut(id)?.position = position;
        Ok(())
    }

    pub fn set_z_order(&mut self, id: ItemId, z_order: i64) -> Result<(), BoardError> {
        self.get_mut(id)?.z_order = z_order;
        Ok(())
    }

    /// Items in draw order: ascending z-order, ties in insertion order.
    pub fn list_ordered_by_z(&self) -> Vec<&MovableItem> {
        let mut ordered: Vec<&MovableItem> = self.items.iter().collect();
        ordered.sort_by_key(|item| item.z_order);
        ordered
    }

    pub fn insert(&mut self, item: MovableItem) -> Result<(), BoardError> {
        if self.index.contains_key(&item.id) {
            return Err(BoardError::DuplicateItem { id: item.id });
        }
        self.index.insert(item.id, self.items.len());
        self.items.push(item);
        Ok(())
    }

    pub fn remove(&mut self, id: ItemId) -> Option<MovableItem> {
        let slot = self.index.remove(&id)?;
        let removed = self.items.remove(slot);
        for i in self.index.values_mut() {
            if *i > slot {
                *i -= 1;
            }
        }
        Some(removed)
    }

    /// Highest z-order on the board, used to seed the z-order counter.
    /// Reassign z-orders as `1..=N`, keeping the current stacking. Returns
    /// the new top value.
    pub fn renumber_z_orders(&mut self) -> i64 {
        let mut order: Vec<usize> = (0..self.items.len()).collect();
        order.sort_by_key(|&i| self.items[i].z_order);
        for (rank, i) in order.into_iter().enumerate() {
            self.items[i].z_order = rank as i64 + 1;
        }
        self.items.len() as i64
    }

    pub fn max_z_order(&self) -> i64 {
        self.items.iter().map(|item| item.z_order).max().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MovableItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn get_mut(&mut self, id: ItemId) -> Result<&mut MovableItem, BoardError> {
        match self.index.get(&id) {
            Some(&i) => Ok(&mut self.items[i]),
            None => Err(BoardError::UnknownItem { id }),
        }
    }
}
