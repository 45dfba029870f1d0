// SPDX-License-Identifier: Apache-2.0
//! Domain resolution: where a modifier's affectees live, relative to
//! whichever item is running it.
//!
//! A `Fit` carries exactly one ship and one character, so resolving the
//! `ship`/`character`
//! domains never requires walking a general carrier chain: it is always
//! "the fit's ship" or "the fit's character", or no resolution at all when
//! that slot is empty. This is the Open Question (a) resolution recorded in
//! `DESIGN.md` — "carrier" collapses to "the fit" for a single-ship,
//! single-character fit model.

use rustc_hash::FxHashSet;

use crate::fit::Fit;
use crate::ident::ItemId;
use crate::item::ItemKind;
use crate::model::AffecteeDomain;

/// Resolves `domain` to the set of concrete anchor items it points at, from
/// the perspective of `affector_item`.
///
/// - `SelfDomain` always resolves to `[affector_item]`.
/// - `Ship`/`Character` resolve to the fit's single ship/character, or an
///   empty set when that slot is unfilled, silently rather than as an error.
/// - `Target`/`Other` resolve through the projection register to whatever
///   the affector is currently projected onto.
#[must_use]
pub fn resolve_anchor_items(fit: &Fit, affector_item: ItemId, domain: AffecteeDomain) -> Vec<ItemId> {
    match domain {
        AffecteeDomain::SelfDomain => vec![affector_item],
        AffecteeDomain::Ship => fit.ship().into_iter().collect(),
        AffecteeDomain::Character => fit.character().into_iter().collect(),
        AffecteeDomain::Target => fit.projection().targets_of(affector_item).iter().copied().collect(),
        AffecteeDomain::Other => fit.projection().others_of(affector_item).iter().copied().collect(),
    }
}

/// Expands a single anchor item into its full domain-subtree membership for
/// the `domain`/`domain_group`/`domain_skillrq` affectee filters ("all items
/// on the ship", rooted at the anchor).
///
/// - If the anchor is the ship, membership is every item currently tagged
///   [`ItemKind::ship_domain_member`], including the ship itself and any
///   charges loaded into its modules.
/// - If the anchor is the character, membership is every item tagged
///   [`ItemKind::character_domain_member`].
/// - Otherwise (e.g. a `self`-domain anchor that is neither), the anchor's
///   own subtree is just itself.
#[must_use]
pub fn domain_subtree(fit: &Fit, anchor: ItemId) -> FxHashSet<ItemId> {
    let Some(anchor_item) = fit.item(anchor) else {
        return FxHashSet::default();
    };
    match anchor_item.kind {
        ItemKind::Ship => fit
            .items()
            .filter(|(_, it)| it.kind.ship_domain_member() && it.is_loaded())
            .map(|(id, _)| id)
            .collect(),
        ItemKind::Character => fit
            .items()
            .filter(|(_, it)| it.kind.character_domain_member() && it.is_loaded())
            .map(|(id, _)| id)
            .collect(),
        _ => std::iter::once(anchor).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ident::TypeId;
    use crate::model::Database;

    #[test]
    fn self_domain_resolves_to_affector() {
        let db = Database::default();
        let mut fit = Fit::new(db);
        let id = fit.spawn(ItemKind::ModuleHigh, TypeId(1));
        assert_eq!(resolve_anchor_items(&fit, id, AffecteeDomain::SelfDomain), vec![id]);
    }

    #[test]
    fn ship_domain_empty_without_ship() {
        let db = Database::default();
        let fit = Fit::new(db);
        let id = ItemId(42);
        assert!(resolve_anchor_items(&fit, id, AffecteeDomain::Ship).is_empty());
    }
}
