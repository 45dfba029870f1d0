// SPDX-License-Identifier: Apache-2.0
//! Identifier newtypes.
//!
//! All ids in the game database are plain integers assigned by the data
//! dump (`evetypes.typeID`, `dgmattribs.attributeID`, ...). Unlike a
//! content-addressed graph, there is no hashing involved here — these
//! wrappers exist purely to keep the id spaces from being mixed up at the
//! type level (an [`AttrId`] must never be usable where an [`ItemId`] is
//! expected, even though both are `u32` underneath).

use std::fmt;

macro_rules! id_newtype {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[repr(transparent)]
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub struct $name(pub u32);

        impl $name {
            /// Returns the raw integer id.
            #[must_use]
            pub const fn value(self) -> u32 {
                self.0
            }
        }

        impl From<u32> for $name {
            fn from(v: u32) -> Self {
                Self(v)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(TypeId, "Identifier for an `evetypes` row (`type_id`).");
id_newtype!(GroupId, "Identifier for an `evegroups` row (`group_id`).");
id_newtype!(CategoryId, "Identifier for a type category (`category_id`).");
id_newtype!(AttrId, "Identifier for a `dgmattribs` row (`attr_id`).");
id_newtype!(EffectId, "Identifier for a `dgmeffects` row (`effect_id`).");
id_newtype!(AbilityId, "Identifier for a fighter-squad ability.");
id_newtype!(SkillTypeId, "Type id of a skill, used as a skill requirement key.");
id_newtype!(BuffTemplateId, "Identifier for a `dbuffcollections` warfare-buff template.");

/// Identifier for a live [`crate::item::Item`] within a [`crate::fit::Fit`].
///
/// Items are arena-allocated by the `Fit`; this id indexes that arena and is
/// stable for the lifetime of the item (it is not reused while the item is
/// loaded). Back-pointers are non-owning, id-based references resolved
/// through the arena.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemId(pub u64);

impl ItemId {
    /// Returns the raw integer id.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item#{}", self.0)
    }
}

/// Index of a [`crate::model::ModifierRecord`] within its owning effect's
/// `modifiers` tuple.
pub type ModifierIndex = usize;
