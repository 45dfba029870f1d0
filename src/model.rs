// SPDX-License-Identifier: Apache-2.0
//! Immutable data model: types, attribute metadata,
//! effects, and modifiers. Everything in this module is built once per
//! database load and never mutated afterward; the attribute calculator and
//! affection register only ever read from it.

use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::ident::{AbilityId, AttrId, BuffTemplateId, CategoryId, EffectId, GroupId, SkillTypeId, TypeId};

/// A single row of `evetypes` plus its joined attribute/effect/skill-req
/// tables, flattened into one immutable record.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TypeRecord {
    /// Type id.
    pub id: TypeId,
    /// Group id, when the cleaner retained it.
    pub group_id: Option<GroupId>,
    /// Category id, when the cleaner retained it.
    pub category_id: Option<CategoryId>,
    /// Base attribute values keyed by attribute id.
    pub attrs: FxHashMap<AttrId, f64>,
    /// Effect ids reachable from this type.
    pub effects: Vec<EffectId>,
    /// The type's default effect, if any (must be a member of `effects`).
    pub default_effect: Option<EffectId>,
    /// Fighter/ability data: `ability_id -> (cooldown_seconds, charge_quantity)`.
    /// `charge_quantity` of `f64::INFINITY` means unlimited charges.
    pub abilities_data: FxHashMap<AbilityId, AbilityData>,
    /// Skill requirements to use/fit this type: `skill_type_id -> level`.
    pub required_skills: FxHashMap<SkillTypeId, u8>,
}

impl TypeRecord {
    /// Looks up the fighter-squad ability data for `ability_id`.
    #[must_use]
    pub fn ability(&self, ability_id: AbilityId) -> Option<&AbilityData> {
        self.abilities_data.get(&ability_id)
    }
}

/// Cooldown/charge data for one fighter-squad ability.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AbilityData {
    /// Cooldown between uses, in seconds.
    pub cooldown: f64,
    /// Number of charges the ability can fire before being resupplied.
    /// `f64::INFINITY` denotes unlimited charges.
    pub charge_quantity: f64,
}

/// Immutable metadata for one attribute id.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttrMetadata {
    /// The attribute this metadata describes.
    pub attr_id: AttrId,
    /// Attribute id whose final value caps this one, if any.
    pub max_attr_id: Option<AttrId>,
    /// Value used when the type has no base value for this attribute.
    pub default_value: Option<f64>,
    /// Whether larger values are better for this attribute (drives
    /// stacking-penalty ordering).
    pub high_is_good: bool,
    /// Whether this attribute combines multiplicative modifiers unstacked
    /// (`true`) or under stacking penalty (`false`).
    pub stackable: bool,
}

/// An effect's category, which determines the minimum
/// item state at which it may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EffectCategory {
    /// Minimum state: any (including offline).
    Passive,
    /// Minimum state: active.
    Active,
    /// Minimum state: active (targeted).
    Target,
    /// Minimum state: active (area).
    Area,
    /// Minimum state: online.
    Online,
    /// Minimum state: overload.
    Overload,
    /// Dungeon-only effect; never runs in a standalone fit.
    Dungeon,
    /// System-wide effect; never runs in a standalone fit.
    System,
}

impl EffectCategory {
    /// The minimum item state required for an effect of this category to be
    /// eligible to run.
    #[must_use]
    pub const fn min_state(self) -> crate::item::ItemState {
        use crate::item::ItemState as S;
        match self {
            Self::Passive => S::Offline,
            Self::Online => S::Online,
            Self::Active | Self::Target | Self::Area => S::Active,
            Self::Overload => S::Overload,
            // Dungeon/system effects have no standalone-fit state; treat as
            // unreachable by requiring a state above the top of the lattice.
            Self::Dungeon | Self::System => S::Overload,
        }
    }
}

/// Build outcome for an effect's modifier list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EffectBuildStatus {
    /// Modifiers built from modifierInfo YAML or expression trees cleanly.
    Success,
    /// A custom (non-generic) handler supplies this effect's behavior.
    Custom,
    /// Some modifiers built, others were dropped.
    Partial,
    /// Modifier extraction failed entirely.
    Error,
    /// The effect was skipped at build time (e.g. dungeon/system-only).
    Skipped,
}

/// Immutable effect record.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectRecord {
    /// Effect id.
    pub id: EffectId,
    /// Effect category; drives the minimum state and default-effect rule.
    pub category: EffectCategory,
    /// Whether this effect is flagged offensive (used by external DPS/tank
    /// aggregation, not interpreted by the core itself).
    pub is_offensive: bool,
    /// Whether this effect is flagged assistance (same caveat as above).
    pub is_assistance: bool,
    /// Attribute id supplying this effect's duration, if any.
    pub duration_attr_id: Option<AttrId>,
    /// Attribute id supplying this effect's capacitor discharge, if any.
    pub discharge_attr_id: Option<AttrId>,
    /// Attribute id supplying this effect's range, if any.
    pub range_attr_id: Option<AttrId>,
    /// Attribute id supplying this effect's falloff, if any.
    pub falloff_attr_id: Option<AttrId>,
    /// Attribute id supplying this effect's tracking, if any.
    pub tracking_attr_id: Option<AttrId>,
    /// Attribute id supplying this effect's fitting-usage-chance, if any.
    pub fitting_usage_chance_attr_id: Option<AttrId>,
    /// Attribute id supplying this effect's resist, if any.
    pub resist_attr_id: Option<AttrId>,
    /// Build status of this effect's modifier list.
    pub build_status: EffectBuildStatus,
    /// The modifiers this effect applies while running, in order.
    pub modifiers: Vec<ModifierRecord>,
    /// Type id this effect materializes as an autocharge on its carrier at
    /// load time, if any (e.g. the ancillary armor
    /// repairer's charge item). Fixed per effect rather than computed from
    /// the parent item, which simplifies the `get_autocharge_type_id(item)`
    /// hook to a direct lookup — no known effect needs the parent to pick
    /// between multiple autocharge types.
    pub autocharge_type_id: Option<TypeId>,
    /// Warfare-buff template this effect expands into at run time, if any
    ///
    pub buff_template_id: Option<BuffTemplateId>,
    /// Attribute on the affector supplying the buff's bound value, paired
    /// with `buff_template_id`.
    pub buff_value_attr_id: Option<AttrId>,
}

impl EffectRecord {
    /// Returns the duration (in seconds) this effect runs for on `item`, by
    /// reading `duration_attr_id` off the item's attribute map. `None` when
    /// the effect has no duration attribute or the read fails.
    pub fn get_duration(&self, item: &crate::item::Item) -> Option<f64> {
        let attr_id = self.duration_attr_id?;
        item.attrs.peek(attr_id)
    }

    /// Returns the type id this effect materializes as an autocharge on
    /// `item`, if any.
    #[must_use]
    pub const fn get_autocharge_type_id(&self, _item: &crate::item::Item) -> Option<TypeId> {
        self.autocharge_type_id
    }
}

/// Which items a modifier's value applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AffecteeFilter {
    /// The single resolved domain item itself.
    Item,
    /// All items under the resolved domain's carrier.
    Domain,
    /// Same as `Domain`, restricted to a group id.
    DomainGroup,
    /// Same as `Domain`, restricted to items requiring a skill.
    DomainSkillrq,
    /// All items owned by the character requiring a skill.
    OwnerSkillrq,
}

/// Contextual root an affectee filter resolves against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AffecteeDomain {
    /// The affector's own item.
    SelfDomain,
    /// The affector's carrier's character.
    Character,
    /// The affector's carrier's ship.
    Ship,
    /// An externally projected target.
    Target,
    /// An externally projected "other" item.
    Other,
}

/// Extra argument to an affectee filter: a group id, a skill type id, or the
/// `current_self` sentinel (resolves to the affector's own type).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FilterExtraArg {
    /// Restrict by `type.group_id == group`.
    Group(GroupId),
    /// Restrict by a required skill type id.
    SkillType(SkillTypeId),
    /// Resolves to the affector's own `type_id` at evaluation time.
    CurrentSelf,
}

/// How modifiers of a stackable attribute combine within their operator
/// group. Only `Stack` is currently defined; other modes are
/// reserved for future aggregate behaviors and are treated as `Stack`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AggregateMode {
    /// Combine multiplicatively, penalized per stacking rules when the
    /// affected attribute is non-stackable.
    Stack,
}

/// A modifier's operator, in their fixed application order.
/// The discriminant values match the wire encoding used by modifierInfo
/// YAML (`operator: -1..7`), skipping 3 (`mod_sub` has no dedicated id in
/// the wire format and is synthesized from `mod_add` with a negated
/// operand by the extractor).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Operator {
    /// Replace the accumulator (lowest priority of the two assign forms).
    PreAssign,
    /// `acc *= operand`, pre-group.
    PreMul,
    /// `acc /= operand`, pre-group.
    PreDiv,
    /// `acc += operand`.
    ModAdd,
    /// `acc -= operand`.
    ModSub,
    /// `acc *= operand`, post-group.
    PostMul,
    /// `acc /= operand`, post-group.
    PostDiv,
    /// `acc *= (1 + operand / 100)`.
    PostPercent,
    /// Replace the accumulator; overrides every prior operator if present.
    PostAssign,
}

impl Operator {
    /// Returns the fixed application order index,
    /// lowest first.
    #[must_use]
    pub const fn order(self) -> u8 {
        match self {
            Self::PreAssign => 1,
            Self::PreMul => 2,
            Self::PreDiv => 3,
            Self::ModAdd => 4,
            Self::ModSub => 5,
            Self::PostMul => 6,
            Self::PostDiv => 7,
            Self::PostPercent => 8,
            Self::PostAssign => 9,
        }
    }

    /// Whether this operator is one of the two "assign" forms, which bypass
    /// stacking penalty and apply a deterministic tie-break instead
    /// bypassing stacking penalty.
    #[must_use]
    pub const fn is_assign(self) -> bool {
        matches!(self, Self::PreAssign | Self::PostAssign)
    }

    /// Whether this operator belongs to the pre-multiplicative group
    /// (`pre_mul`/`pre_div`).
    #[must_use]
    pub const fn is_pre_group(self) -> bool {
        matches!(self, Self::PreMul | Self::PreDiv)
    }

    /// Whether this operator belongs to the post-multiplicative group
    /// (`post_mul`/`post_div`/`post_percent`).
    #[must_use]
    pub const fn is_post_group(self) -> bool {
        matches!(self, Self::PostMul | Self::PostDiv | Self::PostPercent)
    }
}

/// Immutable modifier record.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModifierRecord {
    /// Which items are affected, relative to the resolved domain.
    pub affectee_filter: AffecteeFilter,
    /// The contextual root the filter resolves against.
    pub affectee_domain: AffecteeDomain,
    /// Extra restriction argument for `DomainGroup`/`DomainSkillrq`/
    /// `OwnerSkillrq` filters.
    pub affectee_filter_extra_arg: Option<FilterExtraArg>,
    /// Attribute id on the affectee this modifier changes.
    pub affectee_attr_id: AttrId,
    /// Operator applied to fold this modifier's operand into the affectee's
    /// accumulator.
    pub operator: Operator,
    /// Aggregation mode across modifiers touching the same affectee/attr.
    pub aggregate_mode: AggregateMode,
    /// Attribute id on the affector supplying the operand value.
    pub affector_attr_id: AttrId,
}

/// One modifier slot of a [`BuffTemplate`], identical to [`ModifierRecord`]
/// minus `affector_attr_id`: the template binds that slot to whichever
/// attribute carries the buff's bound value at expansion time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BuffModifierTemplate {
    /// Which items are affected, relative to the resolved domain.
    pub affectee_filter: AffecteeFilter,
    /// The contextual root the filter resolves against.
    pub affectee_domain: AffecteeDomain,
    /// Extra restriction argument for `DomainGroup`/`DomainSkillrq`/
    /// `OwnerSkillrq` filters.
    pub affectee_filter_extra_arg: Option<FilterExtraArg>,
    /// Attribute id on the affectee this modifier changes.
    pub affectee_attr_id: AttrId,
    /// Operator applied to fold the bound buff value into the affectee's
    /// accumulator.
    pub operator: Operator,
    /// Aggregation mode across modifiers touching the same affectee/attr.
    pub aggregate_mode: AggregateMode,
}

/// A `dbuffcollections` warfare-buff template: a set of modifier
/// slots expanded, at run time, against whichever attribute on the affector
/// carries the bound "buff value" (e.g. a fleet command burst's active
/// skill level).
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BuffTemplate {
    /// Template id.
    pub id: BuffTemplateId,
    /// Modifier slots this template expands into.
    pub modifiers: Vec<BuffModifierTemplate>,
}

/// The immutable, once-built game database.
///
/// Built once per load by an external data-ingestion collaborator;
/// shared read-only by every `Fit` that uses it.
#[derive(Debug, Clone, Default)]
pub struct Database {
    /// Dump schema version string.
    pub version: String,
    types: FxHashMap<TypeId, Rc<TypeRecord>>,
    attrs: FxHashMap<AttrId, AttrMetadata>,
    effects: FxHashMap<EffectId, EffectRecord>,
    buff_templates: FxHashMap<BuffTemplateId, BuffTemplate>,
}

impl Database {
    /// Builds a database from its component tables. Intended to be called
    /// once by the data-ingestion collaborator after validation/cleaning.
    #[must_use]
    pub fn new(
        version: String,
        types: FxHashMap<TypeId, TypeRecord>,
        attrs: FxHashMap<AttrId, AttrMetadata>,
        effects: FxHashMap<EffectId, EffectRecord>,
    ) -> Self {
        Self::with_buff_templates(version, types, attrs, effects, FxHashMap::default())
    }

    /// Builds a database including warfare-buff templates.
    #[must_use]
    pub fn with_buff_templates(
        version: String,
        types: FxHashMap<TypeId, TypeRecord>,
        attrs: FxHashMap<AttrId, AttrMetadata>,
        effects: FxHashMap<EffectId, EffectRecord>,
        buff_templates: FxHashMap<BuffTemplateId, BuffTemplate>,
    ) -> Self {
        Self {
            version,
            types: types.into_iter().map(|(id, t)| (id, Rc::new(t))).collect(),
            attrs,
            effects,
            buff_templates,
        }
    }

    /// Looks up a type by id, returning a cheaply-cloneable handle shared
    /// with every item currently loaded as that type.
    #[must_use]
    pub fn type_(&self, id: TypeId) -> Option<Rc<TypeRecord>> {
        self.types.get(&id).cloned()
    }

    /// Looks up attribute metadata by id.
    #[must_use]
    pub fn attr_meta(&self, id: AttrId) -> Option<&AttrMetadata> {
        self.attrs.get(&id)
    }

    /// Looks up an effect record by id.
    #[must_use]
    pub fn effect(&self, id: EffectId) -> Option<&EffectRecord> {
        self.effects.get(&id)
    }

    /// Looks up a warfare-buff template by id.
    #[must_use]
    pub fn buff_template(&self, id: BuffTemplateId) -> Option<&BuffTemplate> {
        self.buff_templates.get(&id)
    }
}
