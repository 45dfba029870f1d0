// SPDX-License-Identifier: Apache-2.0
//! Attribute map and calculator.
//!
//! One [`AttributeMap`] lives per item, holding its base-value source, its
//! memoized cache, and any installed override. The actual modified-value
//! algorithm ([`modified`]) needs the whole fit (to walk the affection
//! register's edges and recurse into other items' attributes), so it lives
//! as a free function over `&Fit` rather than a method on `AttributeMap`
//! itself; the cache is read/written through `RefCell` so that recursive,
//! cross-item computation never needs more than a shared `&Fit`.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::affection::{lookup_modifier, Affector};
use crate::error::AttrError;
use crate::fit::Fit;
use crate::ident::{AttrId, ItemId, TypeId};
use crate::model::{AggregateMode, AttrMetadata, Operator, TypeRecord};

/// A user- or sim-installed replacement for one attribute of one item
/// (installed replacement values, bypassing the normal fold).
#[derive(Clone)]
pub enum Override {
    /// A fixed replacement value.
    Value(f64),
    /// A callback re-evaluated once per lookup (e.g. the reactive armor
    /// hardener's resonance override).
    Callback(Rc<dyn Fn() -> f64>),
}

impl Override {
    fn evaluate(&self) -> f64 {
        match self {
            Self::Value(v) => *v,
            Self::Callback(f) => f(),
        }
    }
}

/// Per-item attribute storage: base-value source, memoized modified-value
/// cache, overrides, and the reverse cap-dependency index that lets cache
/// invalidation cascade through `max_attr_id` clamps.
pub struct AttributeMap {
    type_id: TypeId,
    base_source: Option<Rc<TypeRecord>>,
    cache: RefCell<FxHashMap<AttrId, f64>>,
    overrides: RefCell<FxHashMap<AttrId, Override>>,
    /// `cap_attr -> attrs on this same item whose last computation read
    /// `cap_attr` as its cap`, so invalidating a cap attribute can cascade
    /// to every attribute it clamps.
    cap_dependents: RefCell<FxHashMap<AttrId, FxHashSet<AttrId>>>,
}

impl AttributeMap {
    /// Creates an empty map for an item constructed from `type_id`.
    #[must_use]
    pub fn new(type_id: TypeId) -> Self {
        Self {
            type_id,
            base_source: None,
            cache: RefCell::new(FxHashMap::default()),
            overrides: RefCell::new(FxHashMap::default()),
            cap_dependents: RefCell::new(FxHashMap::default()),
        }
    }

    pub(crate) fn set_base_source(&mut self, type_rec: Rc<TypeRecord>) {
        self.base_source = Some(type_rec);
    }

    /// Clears the cache and overrides, leaving the base source detached
    /// (called on item unload).
    pub(crate) fn clear(&mut self) {
        self.base_source = None;
        self.cache.borrow_mut().clear();
        self.overrides.borrow_mut().clear();
        self.cap_dependents.borrow_mut().clear();
    }

    /// Records that `capped_attr`'s last computation read `cap_attr` (on
    /// this same item) as its cap.
    fn record_cap_dependency(&self, cap_attr: AttrId, capped_attr: AttrId) {
        self.cap_dependents.borrow_mut().entry(cap_attr).or_default().insert(capped_attr);
    }

    /// Attributes on this item whose cached value depends on `cap_attr`.
    fn cap_dependents_of(&self, cap_attr: AttrId) -> Vec<AttrId> {
        self.cap_dependents
            .borrow()
            .get(&cap_attr)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Returns the last-computed value for `attr`, if cached, without
    /// triggering computation. Used by hooks that only have an `&Item` and
    /// no `&Fit` context (e.g. [`crate::model::EffectRecord::get_duration`]).
    #[must_use]
    pub fn peek(&self, attr: AttrId) -> Option<f64> {
        self.cache.borrow().get(&attr).copied()
    }

    fn cached(&self, attr: AttrId) -> Option<f64> {
        self.cache.borrow().get(&attr).copied()
    }

    fn store(&self, attr: AttrId, value: f64) {
        self.cache.borrow_mut().insert(attr, value);
    }

    /// Invalidates the cached value for `attr`. Returns whether a cached
    /// value was actually present (callers use this to decide whether to
    /// cascade further).
    pub fn invalidate(&self, attr: AttrId) -> bool {
        self.cache.borrow_mut().remove(&attr).is_some()
    }

    fn base_value(&self, attr: AttrId, meta: &AttrMetadata) -> Result<f64, AttrError> {
        if let Some(type_rec) = &self.base_source {
            if let Some(&v) = type_rec.attrs.get(&attr) {
                return Ok(v);
            }
        }
        meta.default_value
            .ok_or_else(|| AttrError::BaseValue(attr, self.type_id))
    }

    /// Installs an override for `attr`. Overrides bypass the normal
    /// stacking/cap computation entirely: reads return the override value
    /// directly.
    pub fn set_override(&self, attr: AttrId, over: Override) {
        self.overrides.borrow_mut().insert(attr, over);
    }

    /// Removes any override for `attr`, falling back to normal computation.
    pub fn clear_override(&self, attr: AttrId) {
        self.overrides.borrow_mut().remove(&attr);
    }

    fn override_value(&self, attr: AttrId) -> Option<f64> {
        self.overrides.borrow().get(&attr).map(Override::evaluate)
    }
}

/// Invalidates the cached value of `(item_id, attr_id)`, then cascades to:
/// every downstream `(affectee, affectee_attr)` pair that currently reads
/// this attribute as its edge's operand source, and every attribute on this
/// same item whose cached value was capped by this one. A no-op when
/// nothing was cached, which also stops the cascade — an uncached
/// attribute has nothing downstream that could have been computed from it.
pub fn invalidate(fit: &Fit, item_id: ItemId, attr_id: AttrId) {
    let Some(item) = fit.item(item_id) else {
        return;
    };
    if !item.attrs.invalidate(attr_id) {
        return;
    }
    let sourced: Vec<Affector> = fit
        .affection()
        .affectors_sourced_from(item_id, attr_id)
        .iter()
        .copied()
        .collect();
    for affector in sourced {
        let Some(modifier) = lookup_modifier(fit, affector) else {
            continue;
        };
        let Some(affectees) = fit.affection().affectees_of(affector) else {
            continue;
        };
        let affectee_attr = modifier.affectee_attr_id;
        for &affectee in affectees {
            invalidate(fit, affectee, affectee_attr);
        }
    }

    let capped: Vec<AttrId> = item.attrs.cap_dependents_of(attr_id);
    for capped_attr in capped {
        invalidate(fit, item_id, capped_attr);
    }
}

/// Computes the modified value of `(item, attr)`: override if installed,
/// else the memoized/base/stacked/capped value.
///
/// Errors propagate only for programmer-error-adjacent conditions (unloaded
/// item, unknown attribute metadata, no base value anywhere); dynamic
/// degradations (unresolved domains, missing operands) are absorbed while
/// folding modifiers and simply contribute nothing.
pub fn modified(fit: &Fit, item_id: ItemId, attr_id: AttrId) -> Result<f64, AttrError> {
    let item = fit.item(item_id).ok_or(AttrError::NotLoaded(item_id))?;
    if !item.is_loaded() {
        return Err(AttrError::NotLoaded(item_id));
    }
    if let Some(value) = item.attrs.override_value(attr_id) {
        return Ok(value);
    }
    if let Some(value) = item.attrs.cached(attr_id) {
        return Ok(value);
    }

    let meta = *fit
        .database()
        .attr_meta(attr_id)
        .ok_or(AttrError::AttrMetadata(attr_id))?;
    let base = item.attrs.base_value(attr_id, &meta)?;

    let affectors: Vec<Affector> = fit.affection().affectors_of(item_id, attr_id).iter().copied().collect();
    let mut result = fold_modifiers(fit, base, &meta, &affectors);

    if let Some(cap_attr) = meta.max_attr_id {
        if let Ok(cap) = modified(fit, item_id, cap_attr) {
            item.attrs.record_cap_dependency(cap_attr, attr_id);
            if result > cap {
                result = cap;
            }
        }
    }

    item.attrs.store(attr_id, result);
    Ok(result)
}

struct Contribution {
    operator: Operator,
    operand: f64,
}

fn fold_modifiers(fit: &Fit, base: f64, meta: &AttrMetadata, affectors: &[Affector]) -> f64 {
    let mut contributions = Vec::with_capacity(affectors.len());
    for affector in affectors {
        let Some(modifier) = lookup_modifier(fit, *affector) else {
            continue;
        };
        debug_assert!(matches!(modifier.aggregate_mode, AggregateMode::Stack));
        let Ok(operand) = modified(fit, affector.affector_item, modifier.affector_attr_id) else {
            // Missing operand: a dynamic, silently-degraded condition
            // a dynamic, silently-degraded condition. This contribution is simply dropped.
            continue;
        };
        contributions.push(Contribution {
            operator: modifier.operator,
            operand,
        });
    }

    let mut acc = base;

    if let Some(v) = pick_assign(&contributions, meta.high_is_good, Operator::PreAssign) {
        acc = v;
    }

    let pre_factors: Vec<f64> = contributions
        .iter()
        .filter(|c| c.operator.is_pre_group())
        .map(|c| match c.operator {
            Operator::PreDiv => 1.0 / c.operand,
            _ => c.operand,
        })
        .collect();
    acc *= combine_group(&pre_factors, meta);

    for c in &contributions {
        match c.operator {
            Operator::ModAdd => acc += c.operand,
            Operator::ModSub => acc -= c.operand,
            _ => {}
        }
    }

    let post_factors: Vec<f64> = contributions
        .iter()
        .filter(|c| c.operator.is_post_group())
        .map(|c| match c.operator {
            Operator::PostDiv => 1.0 / c.operand,
            Operator::PostPercent => 1.0 + c.operand / 100.0,
            _ => c.operand,
        })
        .collect();
    acc *= combine_group(&post_factors, meta);

    if let Some(v) = pick_assign(&contributions, meta.high_is_good, Operator::PostAssign) {
        acc = v;
    }

    acc
}

fn combine_group(factors: &[f64], meta: &AttrMetadata) -> f64 {
    if factors.is_empty() {
        return 1.0;
    }
    if meta.stackable {
        crate::math::stacking::combine_stackable(factors)
    } else {
        crate::math::stacking::combine_penalized(factors, meta.high_is_good)
    }
}

/// Picks the winning operand among same-kind assign contributions
/// (sort ascending, last wins for `high_is_good`,
/// else first).
fn pick_assign(contributions: &[Contribution], high_is_good: bool, which: Operator) -> Option<f64> {
    let mut values: Vec<f64> = contributions
        .iter()
        .filter(|c| c.operator == which)
        .map(|c| c.operand)
        .collect();
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    if high_is_good {
        values.last().copied()
    } else {
        values.first().copied()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::fit::Fit;
    use crate::ident::{AttrId, TypeId};
    use crate::item::ItemKind;
    use crate::model::{AttrMetadata, Database, TypeRecord};
    use rustc_hash::FxHashMap;

    fn make_db(attrs: Vec<(AttrId, AttrMetadata)>) -> Database {
        let type_id = TypeId(1);
        let mut types = FxHashMap::default();
        types.insert(
            type_id,
            TypeRecord {
                id: type_id,
                group_id: None,
                category_id: None,
                attrs: FxHashMap::default(),
                effects: Vec::new(),
                default_effect: None,
                abilities_data: FxHashMap::default(),
                required_skills: FxHashMap::default(),
            },
        );
        Database::new("test".to_string(), types, attrs.into_iter().collect(), FxHashMap::default())
    }

    #[test]
    fn base_value_falls_back_to_metadata_default() {
        let attr = AttrId(1);
        let db = make_db(vec![(
            attr,
            AttrMetadata {
                attr_id: attr,
                max_attr_id: None,
                default_value: Some(7.0),
                high_is_good: true,
                stackable: true,
            },
        )]);
        let mut fit = Fit::new(db);
        let id = fit.spawn(ItemKind::ModuleHigh, TypeId(1));
        fit.load(id).expect("load");
        assert_eq!(modified(&fit, id, attr).expect("value"), 7.0);
    }

    #[test]
    fn override_bypasses_computation() {
        let attr = AttrId(1);
        let db = make_db(vec![(
            attr,
            AttrMetadata {
                attr_id: attr,
                max_attr_id: None,
                default_value: Some(7.0),
                high_is_good: true,
                stackable: true,
            },
        )]);
        let mut fit = Fit::new(db);
        let id = fit.spawn(ItemKind::ModuleHigh, TypeId(1));
        fit.load(id).expect("load");
        fit.item(id).expect("item").attrs.set_override(attr, Override::Value(42.0));
        assert_eq!(modified(&fit, id, attr).expect("value"), 42.0);
    }
}
