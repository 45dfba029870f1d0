// SPDX-License-Identifier: Apache-2.0
//! Warfare buffs: fleet/command-burst modifier templates.
//!
//! A [`crate::model::BuffTemplate`] expands, at run time, into a set of
//! concrete [`ModifierRecord`]s bound to whichever attribute on the
//! affector carries the buff's bound value (e.g. a command burst's active
//! skill level). Expansion is otherwise identical to static modifiers and
//! goes through the affection register exactly like them.

use crate::fit::Fit;
use crate::ident::{AttrId, BuffTemplateId, ItemId};
use crate::model::ModifierRecord;

/// Expands `template_id`, bound to `buff_value_attr_id` on `affector_item`,
/// into concrete modifier records. Returns an empty vec and logs when the
/// template is unknown — a static, logged-once ingestion anomaly.
#[must_use]
pub fn expand(
    fit: &Fit,
    affector_item: ItemId,
    template_id: BuffTemplateId,
    buff_value_attr_id: AttrId,
) -> Vec<ModifierRecord> {
    let Some(template) = fit.database().buff_template(template_id) else {
        tracing::warn!(
            item = %affector_item,
            template = %template_id.value(),
            "unknown warfare-buff template"
        );
        return Vec::new();
    };
    template
        .modifiers
        .iter()
        .map(|slot| ModifierRecord {
            affectee_filter: slot.affectee_filter,
            affectee_domain: slot.affectee_domain,
            affectee_filter_extra_arg: slot.affectee_filter_extra_arg,
            affectee_attr_id: slot.affectee_attr_id,
            operator: slot.operator,
            aggregate_mode: slot.aggregate_mode,
            affector_attr_id: buff_value_attr_id,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::expand;
    use crate::fit::Fit;
    use crate::ident::{AttrId, BuffTemplateId, ItemId, TypeId};
    use crate::model::{
        AffecteeDomain, AffecteeFilter, AggregateMode, BuffModifierTemplate, BuffTemplate, Database, Operator,
    };
    use rustc_hash::FxHashMap;

    #[test]
    fn expands_template_with_bound_affector_attr() {
        let template_id = BuffTemplateId(1);
        let buff_value_attr = AttrId(99);
        let affectee_attr = AttrId(7);
        let mut templates = FxHashMap::default();
        templates.insert(
            template_id,
            BuffTemplate {
                id: template_id,
                modifiers: vec![BuffModifierTemplate {
                    affectee_filter: AffecteeFilter::Domain,
                    affectee_domain: AffecteeDomain::Ship,
                    affectee_filter_extra_arg: None,
                    affectee_attr_id: affectee_attr,
                    operator: Operator::PostPercent,
                    aggregate_mode: AggregateMode::Stack,
                }],
            },
        );
        let db = Database::with_buff_templates(
            "test".to_string(),
            FxHashMap::default(),
            FxHashMap::default(),
            FxHashMap::default(),
            templates,
        );
        let fit = Fit::new(db);
        let modifiers = expand(&fit, ItemId(1), template_id, buff_value_attr);
        assert_eq!(modifiers.len(), 1);
        assert_eq!(modifiers[0].affector_attr_id, buff_value_attr);
        assert_eq!(modifiers[0].affectee_attr_id, affectee_attr);
    }

    #[test]
    fn unknown_template_expands_to_nothing() {
        let db = Database::default();
        let fit = Fit::new(db);
        let modifiers = expand(&fit, ItemId(1), BuffTemplateId(404), AttrId(1));
        assert!(modifiers.is_empty());
    }
}
