#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Rig-size restriction surface: the core exposes a
//! rig's `rig_size` attribute and the `RestrictionError::RigSize` type for
//! an external restriction-checking collaborator to consume; the
//! restriction registry itself is out of scope here.

use fit_core::error::RestrictionError;
use fit_core::fit::{Fit, UnorderedBucket};
use fit_core::ident::{AttrId, TypeId};
use fit_core::model::{AttrMetadata, Database, TypeRecord};
use rustc_hash::FxHashMap;

const RIG_SIZE: AttrId = AttrId(1);
const RIG_TYPE: TypeId = TypeId(1);

fn build_db(rig_size: f64) -> Database {
    let mut type_attrs = FxHashMap::default();
    type_attrs.insert(RIG_SIZE, rig_size);

    let mut types = FxHashMap::default();
    types.insert(
        RIG_TYPE,
        TypeRecord {
            id: RIG_TYPE,
            group_id: None,
            category_id: None,
            attrs: type_attrs,
            effects: Vec::new(),
            default_effect: None,
            abilities_data: FxHashMap::default(),
            required_skills: FxHashMap::default(),
        },
    );

    let mut attr_meta = FxHashMap::default();
    attr_meta.insert(
        RIG_SIZE,
        AttrMetadata {
            attr_id: RIG_SIZE,
            max_attr_id: None,
            default_value: None,
            high_is_good: false,
            stackable: true,
        },
    );

    Database::new("test".to_string(), types, attr_meta, FxHashMap::default())
}

#[test]
fn rig_size_attribute_is_readable_by_an_external_restriction_checker() {
    let db = build_db(3.0);
    let mut fit = Fit::new(db);
    let rig = fit.add_item(UnorderedBucket::Rig, RIG_TYPE);
    assert!((fit.attr(rig, RIG_SIZE).expect("rig_size") - 3.0).abs() < 1e-9);
}

#[test]
fn restriction_error_surfaces_size_mismatch() {
    let err = RestrictionError::RigSize {
        size: 3,
        allowed_size: 2,
    };
    assert_eq!(err.to_string(), "rig size 3 exceeds allowed size 2");
}
