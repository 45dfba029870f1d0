#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Unknown-affectee-filter scenario: a malformed
//! `domain_group` modifier (missing its group extra-arg) resolves to no
//! affectees and is logged, while a sibling modifier on the same effect
//! still applies normally.

use fit_core::fit::{Fit, ModuleBank};
use fit_core::ident::{AttrId, EffectId, TypeId};
use fit_core::item::ItemState;
use fit_core::model::{
    AffecteeDomain, AffecteeFilter, AggregateMode, AttrMetadata, Database, EffectBuildStatus, EffectCategory,
    EffectRecord, ModifierRecord, Operator, TypeRecord,
};
use rustc_hash::FxHashMap;

const GOOD: AttrId = AttrId(1);
const MALFORMED: AttrId = AttrId(2);
const SRC: AttrId = AttrId(3);
const EFFECT_ID: EffectId = EffectId(1);
const TYPE_ID: TypeId = TypeId(1);

fn build_db() -> Database {
    let mut type_attrs = FxHashMap::default();
    type_attrs.insert(GOOD, 10.0);
    type_attrs.insert(SRC, 2.0);

    let mut types = FxHashMap::default();
    types.insert(
        TYPE_ID,
        TypeRecord {
            id: TYPE_ID,
            group_id: None,
            category_id: None,
            attrs: type_attrs,
            effects: vec![EFFECT_ID],
            default_effect: None,
            abilities_data: FxHashMap::default(),
            required_skills: FxHashMap::default(),
        },
    );

    let mut attr_meta = FxHashMap::default();
    for &attr in &[GOOD, MALFORMED, SRC] {
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
            modifiers: vec![
                // Malformed: `domain_group` with no group extra-arg.
                ModifierRecord {
                    affectee_filter: AffecteeFilter::DomainGroup,
                    affectee_domain: AffecteeDomain::Ship,
                    affectee_filter_extra_arg: None,
                    affectee_attr_id: MALFORMED,
                    operator: Operator::PostMul,
                    aggregate_mode: AggregateMode::Stack,
                    affector_attr_id: SRC,
                },
                // Valid sibling modifier on the same effect.
                ModifierRecord {
                    affectee_filter: AffecteeFilter::Item,
                    affectee_domain: AffecteeDomain::SelfDomain,
                    affectee_filter_extra_arg: None,
                    affectee_attr_id: GOOD,
                    operator: Operator::PostMul,
                    aggregate_mode: AggregateMode::Stack,
                    affector_attr_id: SRC,
                },
            ],
            autocharge_type_id: None,
            buff_template_id: None,
            buff_value_attr_id: None,
        },
    );

    Database::new("test".to_string(), types, attr_meta, effects)
}

#[test]
fn malformed_sibling_modifier_is_ignored_but_valid_one_still_applies() {
    let db = build_db();
    let mut fit = Fit::new(db);
    let id = fit.append_module(ModuleBank::High, TYPE_ID);
    fit.set_state(id, ItemState::Active).expect("state");

    assert!((fit.attr(id, GOOD).expect("good") - 20.0).abs() < 1e-9);
    assert!(fit.affection().affectors_of(id, MALFORMED).is_empty());
}
