// SPDX-License-Identifier: Apache-2.0
//! Item entities.

use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::attrs::AttributeMap;
use crate::ident::{EffectId, ItemId, TypeId};
use crate::model::TypeRecord;

/// Discrete item states, totally ordered.
///
/// Declaration order is significant: `derive(PartialOrd, Ord)` ranks variants
/// by declaration order, giving exactly the `ghost < offline < online <
/// active < overload` lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ItemState {
    /// Not fitted/present in any meaningful sense; the weakest state.
    Ghost,
    /// Fitted but switched off.
    Offline,
    /// Switched on.
    Online,
    /// Actively running (module cycling, drone engaging, etc.).
    Active,
    /// Overloaded.
    Overload,
}

impl ItemState {
    /// All states at or below `self` in the lattice, inclusive, lowest
    /// first. Used to compute which `StatesActivated`/`StatesDeactivated`
    /// messages a state transition implies.
    #[must_use]
    pub fn ladder_up_to(self) -> &'static [ItemState] {
        use ItemState::{Active, Ghost, Offline, Online, Overload};
        match self {
            Ghost => &[Ghost],
            Offline => &[Ghost, Offline],
            Online => &[Ghost, Offline, Online],
            Active => &[Ghost, Offline, Online, Active],
            Overload => &[Ghost, Offline, Online, Active, Overload],
        }
    }
}

/// Per-effect run-mode override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RunMode {
    /// Runs iff state is sufficient and all global predicates pass. Default.
    #[default]
    FullCompliance,
    /// Runs iff state is sufficient, ignoring fitting-chance-like predicates.
    StateCompliance,
    /// Always runs, as long as the item is loaded.
    ForceRun,
    /// Never runs.
    ForceStop,
}

/// The closed set of item kinds.
///
/// Behavioral differences between kinds reduce to three tagged properties,
/// exposed as methods below rather than duplicated per call site:
/// [`ItemKind::ship_domain_member`], [`ItemKind::character_domain_member`],
/// and [`ItemKind::owner_modifiable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ItemKind {
    /// The fit's ship.
    Ship,
    /// The fit's character (pilot).
    Character,
    /// High-slot module.
    ModuleHigh,
    /// Mid-slot module.
    ModuleMid,
    /// Low-slot module.
    ModuleLow,
    /// Rig.
    Rig,
    /// Subsystem.
    Subsystem,
    /// Drone.
    Drone,
    /// Fighter squad.
    FighterSquad,
    /// Implant.
    Implant,
    /// Booster.
    Booster,
    /// Skill.
    Skill,
    /// Charge loaded into a module.
    Charge,
    /// Autocharge materialized by an effect at load time.
    Autocharge,
}

impl ItemKind {
    /// Whether items of this kind sit in the ship's domain subtree (the
    /// affectee set for `affectee_domain: ship`). Charges and
    /// autocharges inherit ship-subtree membership from whatever they are
    /// loaded into, which the affection register resolves via the item's
    /// `container`, not via this method. Drones and fighter squads live
    /// outside the ship subtree entirely; [`Self::owner_modifiable`] is the
    /// sole path that lets character-borne bonuses reach them.
    #[must_use]
    pub const fn ship_domain_member(self) -> bool {
        matches!(
            self,
            Self::Ship
                | Self::ModuleHigh
                | Self::ModuleMid
                | Self::ModuleLow
                | Self::Rig
                | Self::Subsystem
                | Self::Charge
                | Self::Autocharge
        )
    }

    /// Whether items of this kind sit in the character's domain subtree
    /// (the affectee set for `affectee_domain: character`).
    #[must_use]
    pub const fn character_domain_member(self) -> bool {
        matches!(
            self,
            Self::Character | Self::Implant | Self::Booster | Self::Skill
        )
    }

    /// Whether items of this kind are "owned by the character" for the
    /// purposes of the `owner_skillrq` filter, independent of
    /// ship-domain membership. Drones and fighter squads are both
    /// ship-domain members *and* owner-modifiable.
    #[must_use]
    pub const fn owner_modifiable(self) -> bool {
        matches!(
            self,
            Self::Drone | Self::FighterSquad | Self::Implant | Self::Booster | Self::Skill
        )
    }
}

/// A live item within a [`crate::fit::Fit`].
pub struct Item {
    /// This item's kind (closed variant set).
    pub kind: ItemKind,
    /// The type id this item was constructed from.
    pub type_id: TypeId,
    /// The resolved type record, or `None` when unloaded.
    resolved_type: Option<Rc<TypeRecord>>,
    /// Non-owning back-pointer to the containing item (module's ship, rig's
    /// ship, charge's module, implant/booster/skill's character), if any.
    pub container: Option<ItemId>,
    /// Current discrete state.
    pub state: ItemState,
    /// Effect ids currently considered running on this item.
    running_effect_ids: rustc_hash::FxHashSet<EffectId>,
    /// Per-effect run-mode overrides; effects absent from this map use
    /// [`RunMode::FullCompliance`].
    effect_modes: FxHashMap<EffectId, RunMode>,
    /// Autocharges materialized at load time, keyed by the effect that
    /// produced them, resolved through the `Fit`'s item arena.
    pub autocharges: FxHashMap<EffectId, ItemId>,
    /// This item's attribute map.
    pub attrs: AttributeMap,
}

impl Item {
    /// Constructs a new, unloaded item of `kind` for `type_id`.
    #[must_use]
    pub fn new(kind: ItemKind, type_id: TypeId) -> Self {
        Self {
            kind,
            type_id,
            resolved_type: None,
            container: None,
            state: ItemState::Offline,
            running_effect_ids: rustc_hash::FxHashSet::default(),
            effect_modes: FxHashMap::default(),
            autocharges: FxHashMap::default(),
            attrs: AttributeMap::new(type_id),
        }
    }

    /// Whether this item is loaded (its type resolved).
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        self.resolved_type.is_some()
    }

    /// The resolved type, or `None` when unloaded.
    #[must_use]
    pub fn type_(&self) -> Option<&Rc<TypeRecord>> {
        self.resolved_type.as_ref()
    }

    /// Resolves this item's type from `type_rec` and attaches it, clearing
    /// any stale per-item state from a previous load. Does not itself
    /// publish messages or attach autocharges; the caller ([`crate::fit::Fit`])
    /// orchestrates the full load sequence.
    pub(crate) fn attach_type(&mut self, type_rec: Rc<TypeRecord>) {
        self.attrs.set_base_source(Rc::clone(&type_rec));
        self.resolved_type = Some(type_rec);
    }

    /// Clears the resolved type, running-effect set, and attribute cache.
    /// Autocharges are detached by the caller, which also removes them from
    /// the arena.
    pub(crate) fn detach_type(&mut self) {
        self.resolved_type = None;
        self.running_effect_ids.clear();
        self.effect_modes.clear();
        self.autocharges.clear();
        self.attrs.clear();
    }

    /// The effect ids currently considered running on this item.
    #[must_use]
    pub fn running_effect_ids(&self) -> &rustc_hash::FxHashSet<EffectId> {
        &self.running_effect_ids
    }

    pub(crate) fn running_effect_ids_mut(&mut self) -> &mut rustc_hash::FxHashSet<EffectId> {
        &mut self.running_effect_ids
    }

    /// The run-mode for `effect_id`, defaulting to
    /// [`RunMode::FullCompliance`] when unset.
    #[must_use]
    pub fn effect_mode(&self, effect_id: EffectId) -> RunMode {
        self.effect_modes.get(&effect_id).copied().unwrap_or_default()
    }

    /// Sets the run-mode override for `effect_id`. Does not itself
    /// recompute running-effect status; callers go through
    /// [`crate::fit::Fit::set_effect_mode`] so the change is published and
    /// the effect-status resolver re-evaluates.
    pub(crate) fn set_effect_mode_raw(&mut self, effect_id: EffectId, mode: RunMode) {
        if mode == RunMode::default() {
            self.effect_modes.remove(&effect_id);
        } else {
            self.effect_modes.insert(effect_id, mode);
        }
    }

    /// Iterates over `(effect_id, mode)` for every non-default run-mode
    /// override on this item.
    pub fn effect_mode_overrides(&self) -> impl Iterator<Item = (EffectId, RunMode)> + '_ {
        self.effect_modes.iter().map(|(id, mode)| (*id, *mode))
    }
}
