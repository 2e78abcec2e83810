//! Bounded player inventories.
//!
//! Capacity counts carried units across all items. Additions are all or
//! nothing; nothing here panics or silently overflows.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::PlayerError;

/// A player's carried items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    capacity: u32,
    items: BTreeMap<String, u32>,
}

impl Inventory {
    /// An empty inventory holding at most `capacity` units.
    pub const fn new(capacity: u32) -> Self {
        Self {
            capacity,
            items: BTreeMap::new(),
        }
    }

    /// Maximum carried units.
    pub const fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Units currently carried. Saturates instead of overflowing.
    pub fn load(&self) -> u32 {
        self.items
            .values()
            .fold(0_u32, |total, qty| total.saturating_add(*qty))
    }

    /// Quantity held of `item`.
    pub fn quantity(&self, item: &str) -> u32 {
        self.items.get(item).copied().unwrap_or(0)
    }

    /// Add `amount` of `item`.
    ///
    /// # Errors
    ///
    /// Returns [`PlayerError::InventoryFull`] if the items do not all fit;
    /// the inventory is unchanged.
    pub fn add(&mut self, item: &str, amount: u32) -> Result<(), PlayerError> {
        let current_load = self.load();
        let fits = current_load
            .checked_add(amount)
            .is_some_and(|load| load <= self.capacity);
        if !fits {
            return Err(PlayerError::InventoryFull {
                item: item.to_owned(),
                attempted: amount,
                current_load,
                capacity: self.capacity,
            });
        }
        if amount > 0 {
            let entry = self.items.entry(item.to_owned()).or_insert(0);
            *entry = entry.saturating_add(amount);
        }
        Ok(())
    }
}
