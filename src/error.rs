// SPDX-License-Identifier: Apache-2.0
//! Error taxonomy.
//!
//! Errors here are value-like: they never unwind across the core's public
//! API. Static ingestion anomalies and dynamic degradations are logged via
//! `tracing` and swallowed at their origin — see `effects.rs` and
//! `affection.rs`. Only structural misuse reaches the caller as an `Err`.

use thiserror::Error;

use crate::ident::{AbilityId, AttrId, GroupId, ItemId, TypeId};

/// Errors surfaced by the attribute calculator (`attrs.rs`).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AttrError {
    /// The attribute id has no metadata row and no base value on the type.
    #[error("no metadata for attribute {0}")]
    AttrMetadata(AttrId),
    /// The attribute has metadata but neither a type-supplied base value nor
    /// a metadata default.
    #[error("no base value for attribute {0} on type {1}")]
    BaseValue(AttrId, TypeId),
    /// The item has no resolved type (it is unloaded).
    #[error("item {0} is not loaded")]
    NotLoaded(ItemId),
}

/// Errors surfaced by domain/filter resolution in the affection register.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A `ship`/`character` domain modifier had no carrier to resolve
    /// against. This is a dynamic, silently-degraded condition when
    /// encountered during calculation; it is exposed as a typed error only
    /// for callers that want to distinguish "no affectees" from "error".
    #[error("unexpected or unresolvable domain for item {0}")]
    UnexpectedDomain(ItemId),
}

/// Errors surfaced by item/effect lookups.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ItemError {
    /// `type.abilities_data` has no entry for the requested ability id.
    #[error("type {0} has no ability {1}")]
    NoSuchAbility(TypeId, AbilityId),
    /// The type could not be fetched from the data cache during load.
    #[error("type {0} could not be fetched")]
    TypeFetch(TypeId),
    /// The requested item id is not present in the fit's arena.
    #[error("item {0} does not exist in this fit")]
    UnknownItem(ItemId),
}

/// Raised on structural misuse, never on data anomalies. The caller's
/// attempted mutation is rejected and the `Fit`'s structure is left
/// unchanged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StructureError {
    /// An ordered slot container (`modules.high`, etc.) already has an item
    /// at the requested position.
    #[error("slot {slot} is already occupied in this container")]
    SlotTaken {
        /// The slot index that was already occupied.
        slot: usize,
    },
    /// Attempted to remove an item that is not a member of the container.
    #[error("item {0} is not a member of this container")]
    NotAMember(ItemId),
}

/// Errors surfaced by ingestion-adjacent validation that the core still
/// exposes as typed values for collaborators that wrap it (e.g. the
/// restriction registers consuming `rig_size`).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RestrictionError {
    /// A rig's `rig_size` attribute exceeds the ship's allowed size.
    #[error("rig size {size} exceeds allowed size {allowed_size}")]
    RigSize {
        /// The rig's own size.
        size: i64,
        /// The ship's allowed rig size.
        allowed_size: i64,
    },
    /// A module's group is restricted and the fit already has the maximum
    /// allowed count fitted.
    #[error("group {0} already has the maximum number of modules fitted")]
    MaxGroupFitted(GroupId),
}
