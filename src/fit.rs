// SPDX-License-Identifier: Apache-2.0
//! Fit aggregate: the top-level owner of a single fit's items.
//!
//! Owns every item in a single fit, the ordered/unordered containers that
//! structure them, and the affection/projection registers and message bus
//! that drive the rest of the core. `Fit` itself carries no business logic
//! beyond translating structural mutations into bus messages and
//! orchestrating the load/unload sequence; computing attribute values and
//! effect status is delegated entirely to `attrs`/`effects`/`affection`.

use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::affection::{self, AffectionRegister};
use crate::attrs;
use crate::bus::{Message, MessageBus};
use crate::effects;
use crate::error::{AttrError, ItemError, StructureError};
use crate::ident::{AttrId, EffectId, ItemId, SkillTypeId, TypeId};
use crate::item::{Item, ItemKind, ItemState, RunMode};
use crate::model::{Database, TypeRecord};
use crate::projection::ProjectionRegister;

/// An ordered module bank (`modules.high/mid/low`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleBank {
    /// High-power slots.
    High,
    /// Mid-power slots.
    Mid,
    /// Low-power slots.
    Low,
}

/// An unordered container of fit-scoped items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnorderedBucket {
    /// Rigs.
    Rig,
    /// Subsystems.
    Subsystem,
    /// Drones in space/bay.
    Drone,
    /// Fighter squads.
    FighterSquad,
    /// Implants.
    Implant,
    /// Boosters.
    Booster,
}

/// An ordered, gap-aware slot container (`modules.high.append/insert/place/remove`).
#[derive(Debug, Default)]
pub struct SlotContainer {
    slots: Vec<Option<ItemId>>,
}

impl SlotContainer {
    /// Creates an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The current slots, in index order; `None` marks an empty slot.
    #[must_use]
    pub fn slots(&self) -> &[Option<ItemId>] {
        &self.slots
    }

    /// Appends `item` to the first free trailing slot.
    pub fn append(&mut self, item: ItemId) -> usize {
        self.slots.push(Some(item));
        self.slots.len() - 1
    }

    /// Places `item` at `slot`, growing the container if needed. Fails if
    /// the slot is already occupied.
    pub fn place(&mut self, slot: usize, item: ItemId) -> Result<(), StructureError> {
        if slot >= self.slots.len() {
            self.slots.resize(slot + 1, None);
        }
        if self.slots[slot].is_some() {
            return Err(StructureError::SlotTaken { slot });
        }
        self.slots[slot] = Some(item);
        Ok(())
    }

    /// Removes `item`, freeing its slot. Fails if `item` is not a member.
    pub fn remove(&mut self, item: ItemId) -> Result<usize, StructureError> {
        let slot = self
            .slots
            .iter()
            .position(|s| *s == Some(item))
            .ok_or(StructureError::NotAMember(item))?;
        self.slots[slot] = None;
        Ok(slot)
    }

    /// Iterates over the occupied slots' items, in index order.
    pub fn iter(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.slots.iter().filter_map(|s| *s)
    }
}

/// Owns a single fit's items and drives the core's message/index plumbing.
pub struct Fit {
    database: Database,
    items: FxHashMap<ItemId, Item>,
    next_item_id: u64,
    ship: Option<ItemId>,
    character: Option<ItemId>,
    modules_high: SlotContainer,
    modules_mid: SlotContainer,
    modules_low: SlotContainer,
    rigs: Vec<ItemId>,
    subsystems: Vec<ItemId>,
    drones: Vec<ItemId>,
    fighters: Vec<ItemId>,
    implants: Vec<ItemId>,
    boosters: Vec<ItemId>,
    skills: FxHashMap<SkillTypeId, ItemId>,
    affection: AffectionRegister,
    projection: ProjectionRegister,
    bus: MessageBus,
}

impl Fit {
    /// Creates an empty fit over `database`.
    #[must_use]
    pub fn new(database: Database) -> Self {
        Self {
            database,
            items: FxHashMap::default(),
            next_item_id: 0,
            ship: None,
            character: None,
            modules_high: SlotContainer::new(),
            modules_mid: SlotContainer::new(),
            modules_low: SlotContainer::new(),
            rigs: Vec::new(),
            subsystems: Vec::new(),
            drones: Vec::new(),
            fighters: Vec::new(),
            implants: Vec::new(),
            boosters: Vec::new(),
            skills: FxHashMap::default(),
            affection: AffectionRegister::new(),
            projection: ProjectionRegister::new(),
            bus: MessageBus::new(),
        }
    }

    /// The shared game database backing this fit.
    #[must_use]
    pub const fn database(&self) -> &Database {
        &self.database
    }

    /// Mutable access to the message bus, for subscriber registration.
    pub fn bus_mut(&mut self) -> &mut MessageBus {
        &mut self.bus
    }

    /// The affection register.
    #[must_use]
    pub const fn affection(&self) -> &AffectionRegister {
        &self.affection
    }

    /// Mutable access to the affection register.
    pub fn affection_mut(&mut self) -> &mut AffectionRegister {
        &mut self.affection
    }

    /// The projection register.
    #[must_use]
    pub const fn projection(&self) -> &ProjectionRegister {
        &self.projection
    }

    /// Looks up a live item by id.
    #[must_use]
    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }

    /// Mutably looks up a live item by id.
    pub fn item_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        self.items.get_mut(&id)
    }

    /// Iterates over every item currently in the arena, loaded or not.
    pub fn items(&self) -> impl Iterator<Item = (ItemId, &Item)> {
        self.items.iter().map(|(&id, item)| (id, item))
    }

    /// The fit's single ship, if any.
    #[must_use]
    pub const fn ship(&self) -> Option<ItemId> {
        self.ship
    }

    /// The fit's single character, if any.
    #[must_use]
    pub const fn character(&self) -> Option<ItemId> {
        self.character
    }

    /// Allocates a new, unloaded item of `kind` for `type_id`, without
    /// attaching it to any container. Higher-level container methods
    /// (`set_ship`, `append_module`, ...) call this and then place the
    /// result; direct callers are responsible for attaching it themselves.
    pub fn spawn(&mut self, kind: ItemKind, type_id: TypeId) -> ItemId {
        let id = ItemId(self.next_item_id);
        self.next_item_id += 1;
        self.items.insert(id, Item::new(kind, type_id));
        id
    }

    /// Resolves `id`'s type from the database, attaches autocharges, and
    /// publishes the load sequence: `ItemLoaded`,
    /// a full affection re-resolution (the new item may now belong to an
    /// existing affector's domain subtree), then an initial effect-status
    /// resync to install this item's own affectors.
    pub fn load(&mut self, id: ItemId) -> Result<(), ItemError> {
        let Some(item) = self.items.get(&id) else {
            return Err(ItemError::UnknownItem(id));
        };
        let type_id = item.type_id;
        let Some(type_rec) = self.database.type_(type_id) else {
            return Err(ItemError::TypeFetch(type_id));
        };
        if let Some(item) = self.items.get_mut(&id) {
            item.attach_type(Rc::clone(&type_rec));
        }
        self.attach_autocharges(id, &type_rec);
        self.bus.publish(Message::ItemLoaded { item: id });
        affection::reresolve_all(self);
        effects::resync(self, id);
        Ok(())
    }

    fn attach_autocharges(&mut self, parent: ItemId, type_rec: &TypeRecord) {
        let effect_ids = type_rec.effects.clone();
        for effect_id in effect_ids {
            let Some(autocharge_type) = self.database.effect(effect_id).and_then(|e| e.autocharge_type_id) else {
                continue;
            };
            let autocharge_id = self.spawn(ItemKind::Autocharge, autocharge_type);
            if let Some(autocharge) = self.items.get_mut(&autocharge_id) {
                autocharge.container = Some(parent);
            }
            if self.load(autocharge_id).is_ok() {
                if let Some(parent_item) = self.items.get_mut(&parent) {
                    parent_item.autocharges.insert(effect_id, autocharge_id);
                }
            }
        }
    }

    /// Unloads `id`: stops every running effect (removing their affectors),
    /// tears down its autocharges, clears its cache, and re-resolves
    /// affection so other affectors' domain subtrees drop it.
    pub fn unload(&mut self, id: ItemId) -> Result<(), ItemError> {
        let Some(item) = self.items.get(&id) else {
            return Err(ItemError::UnknownItem(id));
        };
        if !item.is_loaded() {
            return Ok(());
        }
        let autocharges: Vec<ItemId> = item.autocharges.values().copied().collect();

        effects::stop_all(self, id);
        for autocharge in autocharges {
            let _ = self.unload(autocharge);
            self.items.remove(&autocharge);
        }
        self.projection.drop_item(id);
        if let Some(item) = self.items.get_mut(&id) {
            item.detach_type();
        }
        self.bus.publish(Message::ItemUnloaded { item: id });
        affection::reresolve_all(self);
        Ok(())
    }

    /// Sets `id`'s discrete state, publishing `StatesActivated`/
    /// `StatesDeactivated` (and their loaded variants) for the states that
    /// entered/left the ladder, then re-syncing effect status.
    pub fn set_state(&mut self, id: ItemId, state: ItemState) -> Result<(), ItemError> {
        let Some(item) = self.items.get(&id) else {
            return Err(ItemError::UnknownItem(id));
        };
        let old = item.state;
        if old == state {
            return Ok(());
        }
        if let Some(item) = self.items.get_mut(&id) {
            item.state = state;
        }

        let old_ladder = old.ladder_up_to();
        let new_ladder = state.ladder_up_to();
        let mut activated: Vec<ItemState> = new_ladder.iter().copied().filter(|s| !old_ladder.contains(s)).collect();
        let mut deactivated: Vec<ItemState> = old_ladder.iter().copied().filter(|s| !new_ladder.contains(s)).collect();
        activated.sort();
        deactivated.sort();

        let loaded = self.items.get(&id).is_some_and(Item::is_loaded);
        if !activated.is_empty() {
            self.bus.publish(Message::StatesActivated {
                item: id,
                states: activated.clone(),
            });
            if loaded {
                self.bus.publish(Message::StatesActivatedLoaded {
                    item: id,
                    states: activated,
                });
            }
        }
        if !deactivated.is_empty() {
            self.bus.publish(Message::StatesDeactivated {
                item: id,
                states: deactivated.clone(),
            });
            if loaded {
                self.bus.publish(Message::StatesDeactivatedLoaded {
                    item: id,
                    states: deactivated,
                });
            }
        }

        effects::resync(self, id);
        Ok(())
    }

    /// Sets the run-mode override for `effect_id` on `id` and re-syncs its
    /// running-effect set.
    pub fn set_effect_mode(&mut self, id: ItemId, effect_id: EffectId, mode: RunMode) {
        if let Some(item) = self.items.get_mut(&id) {
            item.set_effect_mode_raw(effect_id, mode);
        }
        effects::resync(self, id);
    }

    /// Every `(effect_id, run_mode, is_running)` triple for `id`'s type
    /// (`item.effects → {effect_id: (effect, mode, running)}`).
    #[must_use]
    pub fn item_effects(&self, id: ItemId) -> Vec<(EffectId, RunMode, bool)> {
        let Some(item) = self.items.get(&id) else {
            return Vec::new();
        };
        let Some(type_rec) = item.type_() else {
            return Vec::new();
        };
        type_rec
            .effects
            .iter()
            .map(|&effect_id| {
                let mode = item.effect_mode(effect_id);
                let running = item.running_effect_ids().contains(&effect_id);
                (effect_id, mode, running)
            })
            .collect()
    }

    /// Reads `id`'s modified value of `attr_id` (`item.attrs[attr_id]`).
    pub fn attr(&self, id: ItemId, attr_id: AttrId) -> Result<f64, AttrError> {
        attrs::modified(self, id, attr_id)
    }

    /// Looks up `id`'s fighter-squad ability data for `ability_id`, failing
    /// if the item isn't loaded or its type has no such ability.
    pub fn ability(&self, id: ItemId, ability_id: crate::ident::AbilityId) -> Result<&crate::model::AbilityData, ItemError> {
        let item = self.items.get(&id).ok_or(ItemError::UnknownItem(id))?;
        let type_rec = item.type_().ok_or(ItemError::TypeFetch(item.type_id))?;
        type_rec
            .ability(ability_id)
            .ok_or(ItemError::NoSuchAbility(item.type_id, ability_id))
    }

    /// Invalidates `attrs` on `item` and notifies subscribers, cascading to
    /// every downstream attribute that reads one of them as an operand
    /// source.
    pub fn notify_attrs_changed(&mut self, item: ItemId, attrs: Vec<AttrId>) {
        for &attr in &attrs {
            attrs::invalidate(self, item, attr);
        }
        self.bus.publish(Message::AttrsValueChanged { item, attrs });
    }

    /// Masked variant of [`Self::notify_attrs_changed`]: invalidates without
    /// notifying override callbacks, for a producer reporting a change to
    /// its own backing attribute.
    pub fn notify_attrs_changed_masked(&mut self, item: ItemId, attrs: Vec<AttrId>) {
        for &attr in &attrs {
            attrs::invalidate(self, item, attr);
        }
        self.bus.publish(Message::AttrsValueChangedMasked { item, attrs });
    }

    /// Replaces the fit's ship, unloading and discarding the previous one.
    pub fn set_ship(&mut self, type_id: TypeId) -> ItemId {
        if let Some(old) = self.ship.take() {
            let _ = self.unload(old);
            self.items.remove(&old);
        }
        let id = self.spawn(ItemKind::Ship, type_id);
        self.ship = Some(id);
        let _ = self.load(id);
        id
    }

    /// Removes the fit's ship, if any.
    pub fn unset_ship(&mut self) -> Option<ItemId> {
        let id = self.ship.take()?;
        let _ = self.unload(id);
        self.items.remove(&id);
        Some(id)
    }

    /// Replaces the fit's character, unloading and discarding the previous
    /// one.
    pub fn set_character(&mut self, type_id: TypeId) -> ItemId {
        if let Some(old) = self.character.take() {
            let _ = self.unload(old);
            self.items.remove(&old);
        }
        let id = self.spawn(ItemKind::Character, type_id);
        self.character = Some(id);
        let _ = self.load(id);
        id
    }

    /// Removes the fit's character, if any.
    pub fn unset_character(&mut self) -> Option<ItemId> {
        let id = self.character.take()?;
        let _ = self.unload(id);
        self.items.remove(&id);
        Some(id)
    }

    /// Adds a skill of `type_id` to the character.
    pub fn add_skill(&mut self, type_id: TypeId) -> ItemId {
        let id = self.spawn(ItemKind::Skill, type_id);
        if let Some(character) = self.character {
            if let Some(item) = self.items.get_mut(&id) {
                item.container = Some(character);
            }
        }
        self.skills.insert(SkillTypeId(type_id.value()), id);
        let _ = self.load(id);
        id
    }

    /// Removes a skill by item id.
    pub fn remove_skill(&mut self, id: ItemId) -> Result<(), StructureError> {
        let Some(item) = self.items.get(&id) else {
            return Err(StructureError::NotAMember(id));
        };
        let key = SkillTypeId(item.type_id.value());
        if self.skills.get(&key) != Some(&id) {
            return Err(StructureError::NotAMember(id));
        }
        self.skills.remove(&key);
        let _ = self.unload(id);
        self.items.remove(&id);
        Ok(())
    }

    fn bank_mut(&mut self, bank: ModuleBank) -> &mut SlotContainer {
        match bank {
            ModuleBank::High => &mut self.modules_high,
            ModuleBank::Mid => &mut self.modules_mid,
            ModuleBank::Low => &mut self.modules_low,
        }
    }

    /// The slots of `bank`, in index order.
    #[must_use]
    pub const fn modules(&self, bank: ModuleBank) -> &SlotContainer {
        match bank {
            ModuleBank::High => &self.modules_high,
            ModuleBank::Mid => &self.modules_mid,
            ModuleBank::Low => &self.modules_low,
        }
    }

    /// Appends a new module of `type_id` to the end of `bank`, attaching it
    /// to the ship and loading it.
    pub fn append_module(&mut self, bank: ModuleBank, type_id: TypeId) -> ItemId {
        let kind = module_kind(bank);
        let id = self.spawn(kind, type_id);
        if let Some(ship) = self.ship {
            if let Some(item) = self.items.get_mut(&id) {
                item.container = Some(ship);
            }
        }
        self.bank_mut(bank).append(id);
        let _ = self.load(id);
        id
    }

    /// Places a new module of `type_id` at a specific `slot` in `bank`,
    /// failing with `SlotTaken` if occupied.
    pub fn place_module(&mut self, bank: ModuleBank, slot: usize, type_id: TypeId) -> Result<ItemId, StructureError> {
        let kind = module_kind(bank);
        let id = self.spawn(kind, type_id);
        if let Some(ship) = self.ship {
            if let Some(item) = self.items.get_mut(&id) {
                item.container = Some(ship);
            }
        }
        if let Err(err) = self.bank_mut(bank).place(slot, id) {
            self.items.remove(&id);
            return Err(err);
        }
        let _ = self.load(id);
        Ok(id)
    }

    /// Removes `item` from `bank`, unloading and discarding it.
    pub fn remove_module(&mut self, bank: ModuleBank, item: ItemId) -> Result<(), StructureError> {
        self.bank_mut(bank).remove(item)?;
        let _ = self.unload(item);
        self.items.remove(&item);
        Ok(())
    }

    /// Loads a charge of `type_id` into `module`, failing if `module` is not
    /// a live item.
    pub fn set_charge(&mut self, module: ItemId, type_id: TypeId) -> Result<ItemId, StructureError> {
        if !self.items.contains_key(&module) {
            return Err(StructureError::NotAMember(module));
        }
        let id = self.spawn(ItemKind::Charge, type_id);
        if let Some(item) = self.items.get_mut(&id) {
            item.container = Some(module);
        }
        let _ = self.load(id);
        Ok(id)
    }

    /// Unloads and discards a charge.
    pub fn unset_charge(&mut self, charge: ItemId) -> Result<(), StructureError> {
        if !self.items.contains_key(&charge) {
            return Err(StructureError::NotAMember(charge));
        }
        let _ = self.unload(charge);
        self.items.remove(&charge);
        Ok(())
    }

    fn bucket_mut(&mut self, bucket: UnorderedBucket) -> &mut Vec<ItemId> {
        match bucket {
            UnorderedBucket::Rig => &mut self.rigs,
            UnorderedBucket::Subsystem => &mut self.subsystems,
            UnorderedBucket::Drone => &mut self.drones,
            UnorderedBucket::FighterSquad => &mut self.fighters,
            UnorderedBucket::Implant => &mut self.implants,
            UnorderedBucket::Booster => &mut self.boosters,
        }
    }

    /// The items currently in `bucket`.
    #[must_use]
    pub fn items_in(&self, bucket: UnorderedBucket) -> &[ItemId] {
        match bucket {
            UnorderedBucket::Rig => &self.rigs,
            UnorderedBucket::Subsystem => &self.subsystems,
            UnorderedBucket::Drone => &self.drones,
            UnorderedBucket::FighterSquad => &self.fighters,
            UnorderedBucket::Implant => &self.implants,
            UnorderedBucket::Booster => &self.boosters,
        }
    }

    /// Adds a new item of `type_id` to `bucket`, attaching it to the ship
    /// (rigs/subsystems/drones/fighters) or character (implants/boosters).
    pub fn add_item(&mut self, bucket: UnorderedBucket, type_id: TypeId) -> ItemId {
        let kind = bucket_kind(bucket);
        let id = self.spawn(kind, type_id);
        let carrier = match bucket {
            UnorderedBucket::Implant | UnorderedBucket::Booster => self.character,
            UnorderedBucket::Rig | UnorderedBucket::Subsystem | UnorderedBucket::Drone | UnorderedBucket::FighterSquad => {
                self.ship
            }
        };
        if let Some(carrier) = carrier {
            if let Some(item) = self.items.get_mut(&id) {
                item.container = Some(carrier);
            }
        }
        self.bucket_mut(bucket).push(id);
        let _ = self.load(id);
        id
    }

    /// Removes `item` from `bucket`, unloading and discarding it.
    pub fn remove_item(&mut self, bucket: UnorderedBucket, item: ItemId) -> Result<(), StructureError> {
        let vec = self.bucket_mut(bucket);
        let pos = vec.iter().position(|&i| i == item).ok_or(StructureError::NotAMember(item))?;
        vec.remove(pos);
        let _ = self.unload(item);
        self.items.remove(&item);
        Ok(())
    }

    /// Links `source`'s `target`-domain modifiers onto `target` and
    /// re-evaluates affection.
    pub fn link_target(&mut self, source: ItemId, target: ItemId) {
        if self.projection.link_target(source, target) {
            affection::reresolve_all(self);
        }
    }

    /// Removes a `target`-domain projection link.
    pub fn unlink_target(&mut self, source: ItemId, target: ItemId) {
        if self.projection.unlink_target(source, target) {
            affection::reresolve_all(self);
        }
    }

    /// Links `source`'s `other`-domain modifiers onto `other` and
    /// re-evaluates affection.
    pub fn link_other(&mut self, source: ItemId, other: ItemId) {
        if self.projection.link_other(source, other) {
            affection::reresolve_all(self);
        }
    }

    /// Removes an `other`-domain projection link.
    pub fn unlink_other(&mut self, source: ItemId, other: ItemId) {
        if self.projection.unlink_other(source, other) {
            affection::reresolve_all(self);
        }
    }
}

const fn module_kind(bank: ModuleBank) -> ItemKind {
    match bank {
        ModuleBank::High => ItemKind::ModuleHigh,
        ModuleBank::Mid => ItemKind::ModuleMid,
        ModuleBank::Low => ItemKind::ModuleLow,
    }
}

const fn bucket_kind(bucket: UnorderedBucket) -> ItemKind {
    match bucket {
        UnorderedBucket::Rig => ItemKind::Rig,
        UnorderedBucket::Subsystem => ItemKind::Subsystem,
        UnorderedBucket::Drone => ItemKind::Drone,
        UnorderedBucket::FighterSquad => ItemKind::FighterSquad,
        UnorderedBucket::Implant => ItemKind::Implant,
        UnorderedBucket::Booster => ItemKind::Booster,
    }
}
