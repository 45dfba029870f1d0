#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Owner-skillrq scenario: an implant modifier using
//! `owner_skillrq` + `current_self` grants a bonus to every item the
//! character owns that requires the implant's own type as a skill,
//! regardless of where that item sits in the ship's domain tree.

use fit_core::fit::{Fit, UnorderedBucket};
use fit_core::ident::{AttrId, EffectId, SkillTypeId, TypeId};
use fit_core::model::{
    AffecteeDomain, AffecteeFilter, AggregateMode, AttrMetadata, Database, EffectBuildStatus, EffectCategory,
    EffectRecord, FilterExtraArg, ModifierRecord, Operator, TypeRecord,
};
use rustc_hash::FxHashMap;

const DMG: AttrId = AttrId(1);
const BONUS: AttrId = AttrId(2);
const IMPLANT_TYPE: TypeId = TypeId(10);
const DRONE_TYPE: TypeId = TypeId(20);
const EFFECT_ID: EffectId = EffectId(1);

fn build_db() -> Database {
    let mut implant_attrs = FxHashMap::default();
    implant_attrs.insert(BONUS, 20.0);
    let mut types = FxHashMap::default();
    types.insert(
        IMPLANT_TYPE,
        TypeRecord {
            id: IMPLANT_TYPE,
            group_id: None,
            category_id: None,
            attrs: implant_attrs,
            effects: vec![EFFECT_ID],
            default_effect: None,
            abilities_data: FxHashMap::default(),
            required_skills: FxHashMap::default(),
        },
    );

    let mut drone_attrs = FxHashMap::default();
    drone_attrs.insert(DMG, 100.0);
    let mut drone_required = FxHashMap::default();
    drone_required.insert(SkillTypeId(IMPLANT_TYPE.value()), 1u8);
    types.insert(
        DRONE_TYPE,
        TypeRecord {
            id: DRONE_TYPE,
            group_id: None,
            category_id: None,
            attrs: drone_attrs,
            effects: Vec::new(),
            default_effect: None,
            abilities_data: FxHashMap::default(),
            required_skills: drone_required,
        },
    );

    let mut attr_meta = FxHashMap::default();
    attr_meta.insert(
        DMG,
        AttrMetadata {
            attr_id: DMG,
            max_attr_id: None,
            default_value: None,
            high_is_good: true,
            stackable: true,
        },
    );
    attr_meta.insert(
        BONUS,
        AttrMetadata {
            attr_id: BONUS,
            max_attr_id: None,
            default_value: None,
            high_is_good: true,
            stackable: true,
        },
    );

    let mut effects = FxHashMap::default();
    effects.insert(
        EFFECT_ID,
        EffectRecord {
            id: EFFECT_ID,
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
            modifiers: vec![ModifierRecord {
                affectee_filter: AffecteeFilter::OwnerSkillrq,
                affectee_domain: AffecteeDomain::SelfDomain,
                affectee_filter_extra_arg: Some(FilterExtraArg::CurrentSelf),
                affectee_attr_id: DMG,
                operator: Operator::PostPercent,
                aggregate_mode: AggregateMode::Stack,
                affector_attr_id: BONUS,
            }],
            autocharge_type_id: None,
            buff_template_id: None,
            buff_value_attr_id: None,
        },
    );

    Database::new("test".to_string(), types, attr_meta, effects)
}

#[test]
fn implant_grants_bonus_to_owned_item_requiring_its_own_type_as_a_skill() {
    let db = build_db();
    let mut fit = Fit::new(db);
    fit.set_character(TypeId(1));
    let drone = fit.add_item(UnorderedBucket::Drone, DRONE_TYPE);
    fit.add_item(UnorderedBucket::Implant, IMPLANT_TYPE);

    assert!((fit.attr(drone, DMG).expect("dmg") - 120.0).abs() < 1e-9);
}

#[test]
fn bonus_disappears_once_character_is_cleared() {
    let db = build_db();
    let mut fit = Fit::new(db);
    fit.set_character(TypeId(1));
    let drone = fit.add_item(UnorderedBucket::Drone, DRONE_TYPE);
    fit.add_item(UnorderedBucket::Implant, IMPLANT_TYPE);
    assert!((fit.attr(drone, DMG).expect("dmg") - 120.0).abs() < 1e-9);

    fit.unset_character();
    assert!((fit.attr(drone, DMG).expect("dmg") - 100.0).abs() < 1e-9);
}
