// SPDX-License-Identifier: Apache-2.0
//! Projection register: explicit projection links between items in the fit,
//! used to resolve the `target`/`other` affectee domains for remote/targeted
//! modifiers.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::ident::ItemId;

/// Tracks which affector items are projected onto which affectee items, for
/// the `target` and `other` domains respectively. The two domains are kept
/// as separate link sets because a single affector can simultaneously
/// target one set of items (its locked target) and have an "other" relation
/// to a different set (e.g. a fleet booster's squad members).
#[derive(Default)]
pub struct ProjectionRegister {
    target_links: FxHashMap<ItemId, FxHashSet<ItemId>>,
    other_links: FxHashMap<ItemId, FxHashSet<ItemId>>,
}

impl ProjectionRegister {
    /// Creates an empty register.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Items `source` is currently projecting its `target`-domain modifiers
    /// onto.
    #[must_use]
    pub fn targets_of(&self, source: ItemId) -> FxHashSet<ItemId> {
        self.target_links.get(&source).cloned().unwrap_or_default()
    }

    /// Items `source` is currently projecting its `other`-domain modifiers
    /// onto.
    #[must_use]
    pub fn others_of(&self, source: ItemId) -> FxHashSet<ItemId> {
        self.other_links.get(&source).cloned().unwrap_or_default()
    }

    /// Adds a `target`-domain projection link from `source` to `target`.
    /// Returns whether the link was newly added (caller re-evaluates
    /// affectors on `source` only when it was).
    pub fn link_target(&mut self, source: ItemId, target: ItemId) -> bool {
        self.target_links.entry(source).or_default().insert(target)
    }

    /// Removes a `target`-domain projection link.
    pub fn unlink_target(&mut self, source: ItemId, target: ItemId) -> bool {
        let removed = self
            .target_links
            .get_mut(&source)
            .is_some_and(|set| set.remove(&target));
        if removed && self.target_links.get(&source).is_some_and(FxHashSet::is_empty) {
            self.target_links.remove(&source);
        }
        removed
    }

    /// Adds an `other`-domain projection link from `source` to `other`.
    pub fn link_other(&mut self, source: ItemId, other: ItemId) -> bool {
        self.other_links.entry(source).or_default().insert(other)
    }

    /// Removes an `other`-domain projection link.
    pub fn unlink_other(&mut self, source: ItemId, other: ItemId) -> bool {
        let removed = self
            .other_links
            .get_mut(&source)
            .is_some_and(|set| set.remove(&other));
        if removed && self.other_links.get(&source).is_some_and(FxHashSet::is_empty) {
            self.other_links.remove(&source);
        }
        removed
    }

    /// Drops every link involving `item`, as either source or target/other.
    /// Called when `item` unloads.
    pub fn drop_item(&mut self, item: ItemId) {
        self.target_links.remove(&item);
        self.other_links.remove(&item);
        for set in self.target_links.values_mut() {
            set.remove(&item);
        }
        for set in self.other_links.values_mut() {
            set.remove(&item);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ProjectionRegister;
    use crate::ident::ItemId;

    #[test]
    fn links_and_unlinks_round_trip() {
        let mut reg = ProjectionRegister::new();
        let source = ItemId(1);
        let target = ItemId(2);
        assert!(reg.link_target(source, target));
        assert!(!reg.link_target(source, target), "second link is a no-op");
        assert_eq!(reg.targets_of(source), [target].into_iter().collect());
        assert!(reg.unlink_target(source, target));
        assert!(reg.targets_of(source).is_empty());
    }

    #[test]
    fn drop_item_clears_both_directions() {
        let mut reg = ProjectionRegister::new();
        reg.link_target(ItemId(1), ItemId(2));
        reg.drop_item(ItemId(2));
        assert!(reg.targets_of(ItemId(1)).is_empty());
    }
}
