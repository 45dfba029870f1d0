// SPDX-License-Identifier: Apache-2.0
//! Stacking-penalty curve for multiplicative modifier groups.
//!
//! Uses `libm::exp` rather than the platform `f64::exp` so the penalty curve
//! is bit-for-bit stable across targets, matching the teacher's use of
//! `libm` for deterministic floating point in its own math module.

/// Penalty applied to the k-th strongest operand in a stacking group
/// (`k = 0, 1, 2, ...`), strongest first. `k = 0` is unpenalized.
fn penalty_at(k: usize) -> f64 {
    let k = k as f64;
    libm::exp(-(k / 2.67).powi(2))
}

/// Combines a group of multiplicative `factors` (each `acc *= factor`) for a
/// *stackable* attribute: no diminishing returns, straight product.
#[must_use]
pub fn combine_stackable(factors: &[f64]) -> f64 {
    factors.iter().product()
}

/// Combines a group of multiplicative `factors` for a *non-stackable*
/// attribute, applying EVE-style stacking penalty.
///
/// Factors are first split into a "bonus" camp (pushes the attribute in the
/// direction `high_is_good` favors) and a "malus" camp (pushes it the other
/// way); penalty is applied within each camp independently — sorted by
/// strength (`|ln(factor)|`) descending, multiplying the bonus/malus
/// component of the k-th-strongest by [`penalty_at(k)`] — so a large malus
/// never dampens a small bonus's position in the curve or vice versa. The
/// two camps' results are then multiplied together along with any
/// unpenalized factors (there are none in this grouping; every factor
/// belongs to one camp or the other, `1.0` factors are inert either way).
#[must_use]
pub fn combine_penalized(factors: &[f64], high_is_good: bool) -> f64 {
    let mut bonus = Vec::new();
    let mut malus = Vec::new();
    for &f in factors {
        if (f > 1.0) == high_is_good {
            bonus.push(f);
        } else if (f - 1.0).abs() > f64::EPSILON {
            malus.push(f);
        }
        // f == 1.0 contributes nothing either way.
    }
    penalize_camp(&mut bonus) * penalize_camp(&mut malus)
}

/// Sorts `camp` by strength (`|ln(factor)|`) descending and returns the
/// product of each factor's penalized contribution.
fn penalize_camp(camp: &mut [f64]) -> f64 {
    camp.sort_by(|a, b| {
        strength(*b)
            .partial_cmp(&strength(*a))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    camp.iter()
        .enumerate()
        .map(|(k, &f)| {
            let penalty = penalty_at(k);
            // Penalize the *bonus component* (f - 1), not f itself, so a
            // fully-penalized operand degrades toward 1.0 (no effect)
            // rather than toward 0.0.
            1.0 + (f - 1.0) * penalty
        })
        .product()
}

fn strength(factor: f64) -> f64 {
    libm::log(factor).abs()
}
