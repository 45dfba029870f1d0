// SPDX-License-Identifier: Apache-2.0
//! Deterministic numerics used by the attribute calculator.

/// Stacking-penalty math.
pub mod stacking;
