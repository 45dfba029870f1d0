// SPDX-License-Identifier: Apache-2.0
//! Effect-status resolver.
//!
//! Computes which of an item's effects are running from its state, each
//! effect's category, the item's per-effect run-mode, and a global predicate
//! set; diffs the result against the item's previously-running set and
//! drives the affection register accordingly.

use rustc_hash::FxHashSet;
use tracing::warn;

use crate::affection::{self, Affector};
use crate::fit::Fit;
use crate::ident::{EffectId, ItemId};
use crate::item::{ItemState, RunMode};

/// Whether the global resource/fitting-chance predicates pass for `item`.
///
/// The source system consults a live resource simulator (capacitor state,
/// fitting-chance rolls) here; that simulator is out of scope for this core.
/// Absent it, predicates are modeled as always-satisfied — recorded as an
/// Open Question resolution in `DESIGN.md`: the gating predicate set for
/// `full_compliance` on non-default effects reduces to "state requirement
/// only" until a resource collaborator is wired in.
#[must_use]
pub const fn predicates_pass(_fit: &Fit, _item: ItemId) -> bool {
    true
}

/// Whether `effect_id` should be considered running on `item_id` right now,
/// per the run-mode semantics table.
#[must_use]
pub fn is_effect_running(fit: &Fit, item_id: ItemId, effect_id: EffectId) -> bool {
    let Some(item) = fit.item(item_id) else {
        return false;
    };
    if !item.is_loaded() {
        return false;
    }
    let mode = item.effect_mode(effect_id);
    if mode == RunMode::ForceStop {
        return false;
    }
    if mode == RunMode::ForceRun {
        return true;
    }

    let Some(effect) = fit.database().effect(effect_id) else {
        return false;
    };
    let is_default = item.type_().is_some_and(|t| t.default_effect == Some(effect_id));
    let min_state = if is_default {
        ItemState::Active
    } else {
        effect.category.min_state()
    };
    let state_ok = item.state >= min_state;
    if !state_ok {
        return false;
    }

    match mode {
        RunMode::FullCompliance => predicates_pass(fit, item_id),
        RunMode::StateCompliance => true,
        RunMode::ForceRun | RunMode::ForceStop => unreachable!("handled above"),
    }
}

/// Recomputes the running-effect set for `item_id`, installing/removing
/// affectors for every effect that started/stopped, and publishing the
/// corresponding `EffectsStarted`/`EffectsStopped` messages.
///
/// Called by [`Fit`] on load/unload, state transitions, and run-mode
/// changes — any change that could flip an effect's running status.
pub fn resync(fit: &mut Fit, item_id: ItemId) {
    let Some(item) = fit.item(item_id) else {
        return;
    };
    if !item.is_loaded() {
        return;
    }
    let Some(type_rec) = item.type_().cloned() else {
        return;
    };

    let desired: FxHashSet<EffectId> = type_rec
        .effects
        .iter()
        .copied()
        .filter(|&effect_id| is_effect_running(fit, item_id, effect_id))
        .collect();
    let current: FxHashSet<EffectId> = fit
        .item(item_id)
        .map(|it| it.running_effect_ids().clone())
        .unwrap_or_default();

    if desired == current {
        return;
    }

    let started: Vec<EffectId> = desired.difference(&current).copied().collect();
    let stopped: Vec<EffectId> = current.difference(&desired).copied().collect();

    if let Some(item) = fit.item_mut(item_id) {
        *item.running_effect_ids_mut() = desired;
    }

    for &effect_id in &started {
        install_effect_affectors(fit, item_id, effect_id);
    }
    for &effect_id in &stopped {
        remove_effect_affectors(fit, item_id, effect_id);
    }

    if !started.is_empty() {
        fit.bus_mut().publish(crate::bus::Message::EffectsStarted {
            item: item_id,
            effect_ids: started,
        });
    }
    if !stopped.is_empty() {
        fit.bus_mut().publish(crate::bus::Message::EffectsStopped {
            item: item_id,
            effect_ids: stopped,
        });
    }
}

/// Unconditionally stops every currently-running effect on `item_id`,
/// removing their affectors and publishing one `EffectsStopped`. Used by
/// [`Fit::unload`] to tear an item down wholesale rather than diffing
/// against an empty desired set.
pub(crate) fn stop_all(fit: &mut Fit, item_id: ItemId) {
    let Some(item) = fit.item(item_id) else {
        return;
    };
    let running: Vec<EffectId> = item.running_effect_ids().iter().copied().collect();
    if running.is_empty() {
        return;
    }
    for &effect_id in &running {
        remove_effect_affectors(fit, item_id, effect_id);
    }
    if let Some(item) = fit.item_mut(item_id) {
        item.running_effect_ids_mut().clear();
    }
    fit.bus_mut().publish(crate::bus::Message::EffectsStopped {
        item: item_id,
        effect_ids: running,
    });
}

fn install_effect_affectors(fit: &mut Fit, item_id: ItemId, effect_id: EffectId) {
    let Some(effect) = fit.database().effect(effect_id) else {
        warn!(item = %item_id, effect = %effect_id.value(), "effect started with no database record");
        return;
    };
    let modifier_count = effect.modifiers.len();
    for modifier_index in 0..modifier_count {
        let Some(modifier) = fit.database().effect(effect_id).and_then(|e| e.modifiers.get(modifier_index).copied())
        else {
            continue;
        };
        let affector = Affector {
            affector_item: item_id,
            effect_id,
            modifier_index,
        };
        affection::install_affector(fit, affector, modifier);
    }

    for buff_index in 0..buff_modifier_count(fit, item_id, effect_id) {
        let modifier_index = modifier_count + buff_index;
        let affector = Affector {
            affector_item: item_id,
            effect_id,
            modifier_index,
        };
        let Some(modifier) = affection::lookup_modifier(fit, affector) else {
            continue;
        };
        affection::install_affector(fit, affector, modifier);
    }
}

fn remove_effect_affectors(fit: &mut Fit, item_id: ItemId, effect_id: EffectId) {
    let Some(effect) = fit.database().effect(effect_id) else {
        return;
    };
    let modifiers: Vec<_> = effect.modifiers.clone();
    let modifier_count = modifiers.len();
    for (modifier_index, modifier) in modifiers.into_iter().enumerate() {
        let affector = Affector {
            affector_item: item_id,
            effect_id,
            modifier_index,
        };
        affection::remove_affector(fit, affector, modifier.affectee_attr_id, modifier.affector_attr_id);
    }

    for buff_index in 0..buff_modifier_count(fit, item_id, effect_id) {
        let modifier_index = modifier_count + buff_index;
        let affector = Affector {
            affector_item: item_id,
            effect_id,
            modifier_index,
        };
        let Some(modifier) = affection::lookup_modifier(fit, affector) else {
            continue;
        };
        affection::remove_affector(fit, affector, modifier.affectee_attr_id, modifier.affector_attr_id);
    }
}

/// Number of warfare-buff modifier slots `effect_id` expands into on
/// `item_id`, or zero when the effect carries no buff template.
fn buff_modifier_count(fit: &Fit, item_id: ItemId, effect_id: EffectId) -> usize {
    let Some(effect) = fit.database().effect(effect_id) else {
        return 0;
    };
    let (Some(template_id), Some(buff_value_attr_id)) = (effect.buff_template_id, effect.buff_value_attr_id) else {
        return 0;
    };
    crate::warfare::expand(fit, item_id, template_id, buff_value_attr_id).len()
}

/// One tick of the restartable cycling sequence used by external collaborators
/// (e.g. the reactive armor hardener simulator) to walk an item's
/// duration-bearing effects forward in time.
///
/// `time_passed` is the delta since the previous tick (zero on the first
/// tick), `cycled` is the set of effects that completed a cycle exactly at
/// this tick, and `cycling` is the snapshot of every effect still cycling
/// (duration known and positive) at this tick.
pub type CycleTick = (f64, FxHashSet<EffectId>, FxHashSet<EffectId>);

/// A finite, restartable generator over an item's duration-bearing running
/// effects, yielding [`CycleTick`]s in increasing time order.
///
/// Restartable: [`Self::restart`] rewinds to tick zero without re-deriving
/// the duration table, so a caller does not need to rebuild it from the
/// item's attributes on every replay.
pub struct EffectCycleIter {
    durations: Vec<(EffectId, f64)>,
    elapsed: Vec<f64>,
    last_tick: f64,
    started: bool,
}

impl EffectCycleIter {
    /// Builds a cycle iterator from `(effect_id, duration_seconds)` pairs.
    /// Effects with a non-positive duration never cycle and are dropped.
    #[must_use]
    pub fn new(durations: Vec<(EffectId, f64)>) -> Self {
        let durations: Vec<(EffectId, f64)> = durations.into_iter().filter(|(_, d)| *d > 0.0).collect();
        let elapsed = vec![0.0; durations.len()];
        Self {
            durations,
            elapsed,
            last_tick: 0.0,
            started: false,
        }
    }

    /// Builds a cycle iterator for every duration-bearing running effect on
    /// `item_id`, reading durations via [`crate::model::EffectRecord::get_duration`].
    #[must_use]
    pub fn for_item(fit: &Fit, item_id: ItemId) -> Self {
        let mut durations = Vec::new();
        if let Some(item) = fit.item(item_id) {
            for &effect_id in item.running_effect_ids() {
                if let Some(effect) = fit.database().effect(effect_id) {
                    if let Some(d) = effect.get_duration(item) {
                        durations.push((effect_id, d));
                    }
                }
            }
        }
        Self::new(durations)
    }

    /// Rewinds this iterator to tick zero, replaying the same duration table.
    pub fn restart(&mut self) {
        self.elapsed.fill(0.0);
        self.last_tick = 0.0;
        self.started = false;
    }

    /// The set of effects still able to cycle (non-empty duration table).
    #[must_use]
    pub fn cycling_snapshot(&self) -> FxHashSet<EffectId> {
        self.durations.iter().map(|(id, _)| *id).collect()
    }
}

impl Iterator for EffectCycleIter {
    type Item = CycleTick;

    fn next(&mut self) -> Option<Self::Item> {
        if self.durations.is_empty() {
            return None;
        }
        if !self.started {
            self.started = true;
            return Some((0.0, FxHashSet::default(), self.cycling_snapshot()));
        }

        let next_tick = self
            .durations
            .iter()
            .zip(&self.elapsed)
            .map(|((_, d), e)| e + d)
            .fold(f64::INFINITY, f64::min);
        if !next_tick.is_finite() {
            return None;
        }

        let mut cycled = FxHashSet::default();
        for ((effect_id, d), e) in self.durations.iter().zip(self.elapsed.iter_mut()) {
            if (*e + d - next_tick).abs() < 1e-9 {
                cycled.insert(*effect_id);
                *e = next_tick;
            }
        }

        let time_passed = next_tick - self.last_tick;
        self.last_tick = next_tick;
        Some((time_passed, cycled, self.cycling_snapshot()))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::{is_effect_running, EffectCycleIter};
    use crate::fit::Fit;
    use crate::ident::{EffectId, TypeId};
    use crate::item::{ItemKind, ItemState, RunMode};
    use crate::model::{Database, EffectBuildStatus, EffectCategory, EffectRecord, TypeRecord};
    use rustc_hash::FxHashMap;

    fn db_with_passive_effect(effect_id: EffectId, type_id: TypeId) -> Database {
        let mut types = FxHashMap::default();
        types.insert(
            type_id,
            TypeRecord {
                id: type_id,
                group_id: None,
                category_id: None,
                attrs: FxHashMap::default(),
                effects: vec![effect_id],
                default_effect: None,
                abilities_data: FxHashMap::default(),
                required_skills: FxHashMap::default(),
            },
        );
        let mut effects = FxHashMap::default();
        effects.insert(
            effect_id,
            EffectRecord {
                id: effect_id,
                category: EffectCategory::Passive,
                is_offensive: false,
                is_assistance: false,
                duration_attr_id: None,
                discharge_attr_id: None,
                range_attr_id: None,
                falloff_attr_id: None,
                tracking_attr_id: None,
                fitting_usage_chance_attr_id: None,
                resist_attr_id: None,
                build_status: EffectBuildStatus::Success,
                modifiers: Vec::new(),
                autocharge_type_id: None,
                buff_template_id: None,
                buff_value_attr_id: None,
            },
        );
        Database::new("test".to_string(), types, FxHashMap::default(), effects)
    }

    #[test]
    fn passive_effect_runs_from_offline_onward() {
        let effect_id = EffectId(1);
        let type_id = TypeId(1);
        let db = db_with_passive_effect(effect_id, type_id);
        let mut fit = Fit::new(db);
        let id = fit.spawn(ItemKind::ModuleHigh, type_id);
        fit.load(id).expect("load");
        assert!(is_effect_running(&fit, id, effect_id));
    }

    #[test]
    fn force_stop_overrides_state() {
        let effect_id = EffectId(1);
        let type_id = TypeId(1);
        let db = db_with_passive_effect(effect_id, type_id);
        let mut fit = Fit::new(db);
        let id = fit.spawn(ItemKind::ModuleHigh, type_id);
        fit.load(id).expect("load");
        fit.set_effect_mode(id, effect_id, RunMode::ForceStop);
        assert!(!is_effect_running(&fit, id, effect_id));
    }

    #[test]
    fn state_switch_recomputes_running_set() {
        let effect_id = EffectId(1);
        let type_id = TypeId(1);
        let db = db_with_passive_effect(effect_id, type_id);
        let mut fit = Fit::new(db);
        let id = fit.spawn(ItemKind::ModuleHigh, type_id);
        fit.load(id).expect("load");
        fit.set_state(id, ItemState::Ghost).expect("state");
        assert!(!fit.item(id).expect("item").running_effect_ids().contains(&effect_id));
        fit.set_state(id, ItemState::Offline).expect("state");
        assert!(fit.item(id).expect("item").running_effect_ids().contains(&effect_id));
    }

    #[test]
    fn cycle_iter_is_restartable() {
        let e1 = EffectId(1);
        let e2 = EffectId(2);
        let mut iter = EffectCycleIter::new(vec![(e1, 2.0), (e2, 3.0)]);
        let ticks: Vec<_> = (&mut iter).take(3).collect();
        assert_eq!(ticks[0].0, 0.0);
        iter.restart();
        let replayed: Vec<_> = iter.take(3).collect();
        assert_eq!(ticks.len(), replayed.len());
    }
}
