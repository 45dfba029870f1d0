#![allow(clippy::unwrap_used, clippy::expect_used)]
//! State-switching scenario: an attribute accumulates
//! one multiplier per state threshold as the item's state rises, and
//! sheds them again in reverse as it falls.

use fit_core::fit::{Fit, ModuleBank};
use fit_core::ident::{AttrId, EffectId, TypeId};
use fit_core::item::ItemState;
use fit_core::model::{
    AffecteeDomain, AffecteeFilter, AggregateMode, AttrMetadata, Database, EffectBuildStatus, EffectCategory,
    EffectRecord, ModifierRecord, Operator, TypeRecord,
};
use rustc_hash::FxHashMap;

const X: AttrId = AttrId(1);
const F_PASSIVE: AttrId = AttrId(2);
const F_ONLINE: AttrId = AttrId(3);
const F_ACTIVE: AttrId = AttrId(4);
const F_OVERLOAD: AttrId = AttrId(5);
const TYPE_ID: TypeId = TypeId(1);

fn effect(id: EffectId, category: EffectCategory, factor_attr: AttrId) -> EffectRecord {
    EffectRecord {
        id,
        category,
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
            affectee_filter: AffecteeFilter::Item,
            affectee_domain: AffecteeDomain::SelfDomain,
            affectee_filter_extra_arg: None,
            affectee_attr_id: X,
            operator: Operator::PostMul,
            aggregate_mode: AggregateMode::Stack,
            affector_attr_id: factor_attr,
        }],
        autocharge_type_id: None,
        buff_template_id: None,
        buff_value_attr_id: None,
    }
}

fn build_db() -> Database {
    let mut type_attrs = FxHashMap::default();
    type_attrs.insert(X, 100.0);
    type_attrs.insert(F_PASSIVE, 1.1);
    type_attrs.insert(F_ONLINE, 1.3);
    type_attrs.insert(F_ACTIVE, 1.5);
    type_attrs.insert(F_OVERLOAD, 1.7);

    let effect_ids = vec![EffectId(1), EffectId(2), EffectId(3), EffectId(4)];
    let mut types = FxHashMap::default();
    types.insert(
        TYPE_ID,
        TypeRecord {
            id: TYPE_ID,
            group_id: None,
            category_id: None,
            attrs: type_attrs,
            effects: effect_ids,
            default_effect: None,
            abilities_data: FxHashMap::default(),
            required_skills: FxHashMap::default(),
        },
    );

    let mut attr_meta = FxHashMap::default();
    for &attr in &[X, F_PASSIVE, F_ONLINE, F_ACTIVE, F_OVERLOAD] {
        attr_meta.insert(
            attr,
            AttrMetadata {
                attr_id: attr,
                max_attr_id: None,
                default_value: None,
                high_is_good: true,
                stackable: true,
            },
        );
    }

    let mut effects = FxHashMap::default();
    effects.insert(EffectId(1), effect(EffectId(1), EffectCategory::Passive, F_PASSIVE));
    effects.insert(EffectId(2), effect(EffectId(2), EffectCategory::Online, F_ONLINE));
    effects.insert(EffectId(3), effect(EffectId(3), EffectCategory::Active, F_ACTIVE));
    effects.insert(EffectId(4), effect(EffectId(4), EffectCategory::Overload, F_OVERLOAD));

    Database::new("test".to_string(), types, attr_meta, effects)
}

#[test]
fn attribute_accumulates_and_sheds_multipliers_as_state_rises_and_falls() {
    let db = build_db();
    let mut fit = Fit::new(db);
    let id = fit.append_module(ModuleBank::High, TYPE_ID);

    // Freshly loaded: state is Offline, so only the passive effect runs.
    assert!((fit.attr(id, X).expect("x") - 110.0).abs() < 1e-9);

    fit.set_state(id, ItemState::Online).expect("state");
    assert!((fit.attr(id, X).expect("x") - 143.0).abs() < 1e-9);

    fit.set_state(id, ItemState::Active).expect("state");
    assert!((fit.attr(id, X).expect("x") - 214.5).abs() < 1e-6);

    fit.set_state(id, ItemState::Overload).expect("state");
    assert!((fit.attr(id, X).expect("x") - 364.65).abs() < 1e-6);

    // Reverse: dropping back down sheds the multipliers in order.
    fit.set_state(id, ItemState::Active).expect("state");
    assert!((fit.attr(id, X).expect("x") - 214.5).abs() < 1e-6);

    fit.set_state(id, ItemState::Online).expect("state");
    assert!((fit.attr(id, X).expect("x") - 143.0).abs() < 1e-9);

    fit.set_state(id, ItemState::Offline).expect("state");
    assert!((fit.attr(id, X).expect("x") - 110.0).abs() < 1e-9);
}
