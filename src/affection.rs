// SPDX-License-Identifier: Apache-2.0
//! Affection register: the bidirectional index of running modifiers
//! (affectors) to the items/attributes they affect (affectees), under the
//! filter algebra rooted at contextual domains.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::warn;

use crate::domain::{domain_subtree, resolve_anchor_items};
use crate::fit::Fit;
use crate::ident::{AttrId, EffectId, ItemId, ModifierIndex};
use crate::model::{AffecteeFilter, FilterExtraArg, ModifierRecord};

/// A running `(affector_item, effect_id, modifier)` triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Affector {
    /// The item running the effect this modifier belongs to.
    pub affector_item: ItemId,
    /// The effect id this modifier belongs to.
    pub effect_id: EffectId,
    /// Index of the modifier within the effect's `modifiers` tuple.
    pub modifier_index: ModifierIndex,
}

/// Bidirectional affector/affectee index.
#[derive(Default)]
pub struct AffectionRegister {
    by_affector: FxHashMap<Affector, FxHashSet<ItemId>>,
    by_affectee: FxHashMap<(ItemId, AttrId), FxHashSet<Affector>>,
    /// `(affector_item, affector_attr_id) -> affectors currently reading
    /// that attribute as their operand source`, used to cascade invalidation
    /// downstream.
    by_source: FxHashMap<(ItemId, AttrId), FxHashSet<Affector>>,
}

impl AffectionRegister {
    /// Creates an empty register.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the affectors currently touching `(item, attr)`, for the
    /// attribute calculator to fold into a modified value.
    #[must_use]
    pub fn affectors_of(&self, item: ItemId, attr: AttrId) -> &FxHashSet<Affector> {
        static EMPTY: std::sync::OnceLock<FxHashSet<Affector>> = std::sync::OnceLock::new();
        self.by_affectee
            .get(&(item, attr))
            .unwrap_or_else(|| EMPTY.get_or_init(FxHashSet::default))
    }

    /// Returns the affectors that currently read `(item, attr)` as their
    /// operand source, for downstream invalidation cascades.
    #[must_use]
    pub fn affectors_sourced_from(&self, item: ItemId, attr: AttrId) -> &FxHashSet<Affector> {
        static EMPTY: std::sync::OnceLock<FxHashSet<Affector>> = std::sync::OnceLock::new();
        self.by_source
            .get(&(item, attr))
            .unwrap_or_else(|| EMPTY.get_or_init(FxHashSet::default))
    }

    /// Returns the affectee items currently indexed for `affector`, if any.
    #[must_use]
    pub fn affectees_of(&self, affector: Affector) -> Option<&FxHashSet<ItemId>> {
        self.by_affector.get(&affector)
    }

    /// Whether `affector` currently has any edges installed.
    #[must_use]
    pub fn is_installed(&self, affector: Affector) -> bool {
        self.by_affector.contains_key(&affector)
    }

    fn insert_edges(
        &mut self,
        affector: Affector,
        affectee_attr: AttrId,
        affector_attr: AttrId,
        affectees: FxHashSet<ItemId>,
    ) -> Vec<ItemId> {
        let mut newly_affected = Vec::new();
        for &affectee in &affectees {
            let set = self.by_affectee.entry((affectee, affectee_attr)).or_default();
            if set.insert(affector) {
                newly_affected.push(affectee);
            }
        }
        self.by_source
            .entry((affector.affector_item, affector_attr))
            .or_default()
            .insert(affector);
        self.by_affector.insert(affector, affectees);
        newly_affected
    }

    fn remove_edges(&mut self, affector: Affector, affectee_attr: AttrId, affector_attr: AttrId) -> Vec<ItemId> {
        let Some(affectees) = self.by_affector.remove(&affector) else {
            return Vec::new();
        };
        let mut removed = Vec::new();
        for affectee in &affectees {
            if let Some(set) = self.by_affectee.get_mut(&(*affectee, affectee_attr)) {
                if set.remove(&affector) {
                    removed.push(*affectee);
                }
                if set.is_empty() {
                    self.by_affectee.remove(&(*affectee, affectee_attr));
                }
            }
        }
        if let Some(set) = self.by_source.get_mut(&(affector.affector_item, affector_attr)) {
            set.remove(&affector);
            if set.is_empty() {
                self.by_source.remove(&(affector.affector_item, affector_attr));
            }
        }
        removed
    }
}

/// Resolves the affectee item set for one modifier on `affector_item`.
/// Returns an empty set — logged when the filter/domain combination is
/// malformed or simply unresolved — rather than erroring, as a dynamic,
/// silently degraded condition.
#[must_use]
pub fn resolve_affectees(fit: &Fit, affector_item: ItemId, modifier: &ModifierRecord) -> FxHashSet<ItemId> {
    if modifier.affectee_filter == AffecteeFilter::OwnerSkillrq {
        return resolve_owner_skillrq(fit, affector_item, modifier);
    }

    let anchors = resolve_anchor_items(fit, affector_item, modifier.affectee_domain);
    if anchors.is_empty() {
        return FxHashSet::default();
    }

    match modifier.affectee_filter {
        AffecteeFilter::Item => anchors.into_iter().collect(),
        AffecteeFilter::Domain => anchors
            .into_iter()
            .flat_map(|anchor| domain_subtree(fit, anchor))
            .collect(),
        AffecteeFilter::DomainGroup => {
            let Some(FilterExtraArg::Group(group)) = modifier.affectee_filter_extra_arg else {
                warn!(
                    affector = %affector_item,
                    "malformed modifier: domain_group filter without a group extra_arg"
                );
                return FxHashSet::default();
            };
            anchors
                .into_iter()
                .flat_map(|anchor| domain_subtree(fit, anchor))
                .filter(|id| {
                    fit.item(*id)
                        .and_then(|it| it.type_())
                        .and_then(|t| t.group_id)
                        .is_some_and(|g| g == group)
                })
                .collect()
        }
        AffecteeFilter::DomainSkillrq => {
            let Some(skill) = resolve_skill_extra_arg(fit, affector_item, modifier.affectee_filter_extra_arg) else {
                warn!(
                    affector = %affector_item,
                    "malformed modifier: domain_skillrq filter without a resolvable skill extra_arg"
                );
                return FxHashSet::default();
            };
            anchors
                .into_iter()
                .flat_map(|anchor| domain_subtree(fit, anchor))
                .filter(|id| {
                    fit.item(*id)
                        .and_then(|it| it.type_())
                        .is_some_and(|t| t.required_skills.contains_key(&skill))
                })
                .collect()
        }
        AffecteeFilter::OwnerSkillrq => unreachable!("handled above"),
    }
}

fn resolve_owner_skillrq(fit: &Fit, affector_item: ItemId, modifier: &ModifierRecord) -> FxHashSet<ItemId> {
    if fit.character().is_none() {
        // Owner-scope edges require a character to exist.
        return FxHashSet::default();
    }
    let Some(skill) = resolve_skill_extra_arg(fit, affector_item, modifier.affectee_filter_extra_arg) else {
        warn!(
            affector = %affector_item,
            "malformed modifier: owner_skillrq filter without a resolvable skill extra_arg"
        );
        return FxHashSet::default();
    };
    fit.items()
        .filter(|(_, it)| it.kind.owner_modifiable())
        .filter(|(_, it)| {
            it.type_()
                .is_some_and(|t| t.required_skills.contains_key(&skill))
        })
        .map(|(id, _)| id)
        .collect()
}

fn resolve_skill_extra_arg(
    fit: &Fit,
    affector_item: ItemId,
    extra: Option<FilterExtraArg>,
) -> Option<crate::ident::SkillTypeId> {
    match extra? {
        FilterExtraArg::SkillType(id) => Some(id),
        FilterExtraArg::CurrentSelf => {
            let type_id = fit.item(affector_item)?.type_id;
            Some(crate::ident::SkillTypeId(type_id.value()))
        }
        FilterExtraArg::Group(_) => None,
    }
}

/// Installs the edges for `affector` (whose effect just started running),
/// emitting `AttrsValueChanged` for every newly-affected `(item, attr)` pair.
pub fn install_affector(fit: &mut Fit, affector: Affector, modifier: ModifierRecord) {
    let affectees = resolve_affectees(fit, affector.affector_item, &modifier);
    let newly_affected = fit
        .affection_mut()
        .insert_edges(affector, modifier.affectee_attr_id, modifier.affector_attr_id, affectees);
    for item in newly_affected {
        fit.notify_attrs_changed(item, vec![modifier.affectee_attr_id]);
    }
}

/// Removes the edges for `affector` (whose effect just stopped running),
/// emitting `AttrsValueChanged` for every formerly-affected `(item, attr)`
/// pair.
pub fn remove_affector(fit: &mut Fit, affector: Affector, affectee_attr: AttrId, affector_attr: AttrId) {
    let removed = fit.affection_mut().remove_edges(affector, affectee_attr, affector_attr);
    for item in removed {
        fit.notify_attrs_changed(item, vec![affectee_attr]);
    }
}

/// Re-evaluates every currently-installed affector's affectee set against
/// the fit's current membership, adding/removing edges as needed. Called on
/// item load/unload and projection-link changes, since any of those can
/// shift which items match a filter/domain combination.
pub fn reresolve_all(fit: &mut Fit) {
    let affectors: Vec<Affector> = fit.affection().by_affector.keys().copied().collect();
    for affector in affectors {
        let Some(modifier) = lookup_modifier(fit, affector) else {
            continue;
        };
        let fresh = resolve_affectees(fit, affector.affector_item, &modifier);
        let stale = fit
            .affection()
            .by_affector
            .get(&affector)
            .cloned()
            .unwrap_or_default();
        if fresh == stale {
            continue;
        }
        let added: Vec<ItemId> = fresh.difference(&stale).copied().collect();
        let removed: Vec<ItemId> = stale.difference(&fresh).copied().collect();
        fit.affection_mut().by_affector.insert(affector, fresh);

        let attr = modifier.affectee_attr_id;
        for item in added {
            fit.affection_mut()
                .by_affectee
                .entry((item, attr))
                .or_default()
                .insert(affector);
            fit.notify_attrs_changed(item, vec![attr]);
        }
        for item in removed {
            let reg = fit.affection_mut();
            if let Some(set) = reg.by_affectee.get_mut(&(item, attr)) {
                set.remove(&affector);
                if set.is_empty() {
                    reg.by_affectee.remove(&(item, attr));
                }
            }
            fit.notify_attrs_changed(item, vec![attr]);
        }
    }
}

/// Looks up the [`ModifierRecord`] an [`Affector`] refers to. Indices below
/// `effect.modifiers.len()` address the effect's static modifier list
/// directly; indices at or above it address a warfare-buff template slot,
/// re-expanded on every lookup via [`crate::warfare::expand`] rather than
/// stored, so a buff affector is looked up exactly like a static one.
/// Shared with the attribute calculator, which needs the same lookup to
/// fold an affector's contribution.
pub(crate) fn lookup_modifier(fit: &Fit, affector: Affector) -> Option<ModifierRecord> {
    let effect = fit.database().effect(affector.effect_id)?;
    if let Some(modifier) = effect.modifiers.get(affector.modifier_index) {
        return Some(*modifier);
    }
    let buff_index = affector.modifier_index.checked_sub(effect.modifiers.len())?;
    let template_id = effect.buff_template_id?;
    let buff_value_attr_id = effect.buff_value_attr_id?;
    crate::warfare::expand(fit, affector.affector_item, template_id, buff_value_attr_id)
        .get(buff_index)
        .copied()
}
