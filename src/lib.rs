// SPDX-License-Identifier: Apache-2.0
//! fit-core: the affection graph, attribute calculator, and effect-lifecycle
//! engine behind an offline ship-fitting simulator.
//!
//! Given a data-driven [`model::Database`] of types, attribute metadata,
//! effects, and modifiers, a [`fit::Fit`] holds a composition of items (a
//! ship, its modules, charges, drones, fighters, rigs, subsystems,
//! implants, boosters, skills, and a character) and computes, for every
//! attribute of every item, its current modified numeric value — lazily,
//! and incrementally as items load/unload or change state.
//!
//! Higher-level features (damage/DPS/tank aggregation, fitting
//! restrictions, reactive-armor-hardener simulation, data ingestion from a
//! game dump) are external collaborators against this core's public
//! surface; they are not implemented here.

pub mod affection;
pub mod attrs;
pub mod bus;
pub mod domain;
pub mod effects;
pub mod error;
pub mod fit;
pub mod ident;
pub mod item;
pub mod math;
pub mod model;
pub mod projection;
pub mod warfare;

pub use attrs::{AttributeMap, Override};
pub use bus::{Message, MessageBus, Subscriber};
pub use error::{AttrError, DomainError, ItemError, RestrictionError, StructureError};
pub use fit::{Fit, ModuleBank, SlotContainer, UnorderedBucket};
pub use ident::{AttrId, BuffTemplateId, EffectId, ItemId, TypeId};
pub use item::{Item, ItemKind, ItemState, RunMode};
pub use model::Database;
