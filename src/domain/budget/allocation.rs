//! Continuous mode - bounded water-filling by efficiency.

use super::item::{Allocation, BudgetConstraint, BudgetItem, OptimizationResult, Selection};
use super::optimizer::COST_TOLERANCE;
use crate::domain::foundation::AnalysisError;

/// Relative gap under which two efficiencies share a tier.
const TIER_TOLERANCE: f64 = 1e-12;

/// Solves the continuous mode.
///
/// # Algorithm
/// 1. Every non-excluded item starts at the lower bound; mandatory items start
///    at their cost clamped into the bounds.
/// 2. Items with positive cost and utility are grouped into tiers of equal
///    efficiency, best first.
/// 3. Each tier shares the remaining budget equally; members that reach the
///    upper bound drop out and their unused share is redistributed within the
///    tier. The next tier starts once the current one is saturated.
///
/// Utility of an allocation is `efficiency × amount`. Free items contribute
/// their full utility.
pub(super) fn solve(
    items: &[BudgetItem],
    constraint: &BudgetConstraint,
) -> Result<OptimizationResult, AnalysisError> {
    let total_budget = constraint.total_budget;
    let (min, max) = constraint.bounds();

    let candidates: Vec<usize> = (0..items.len())
        .filter(|&i| !constraint.is_excluded(&items[i].id))
        .collect();

    let mut amounts = vec![0.0; items.len()];
    for &i in &candidates {
        amounts[i] = if constraint.is_mandatory(&items[i].id) {
            items[i].cost.clamp(min, max)
        } else {
            min
        };
    }

    let required: f64 = candidates.iter().map(|&i| amounts[i]).sum();
    if required > total_budget + COST_TOLERANCE {
        return Err(AnalysisError::BudgetInfeasible {
            required,
            available: total_budget,
        });
    }
    let mut remaining = total_budget - required;

    let mut fillable: Vec<usize> = candidates
        .iter()
        .copied()
        .filter(|&i| items[i].cost > 0.0 && items[i].utility > 0.0)
        .collect();
    fillable.sort_by(|&a, &b| items[b].efficiency().total_cmp(&items[a].efficiency()));

    for tier in tiers(items, &fillable) {
        if remaining <= COST_TOLERANCE {
            break;
        }
        remaining = fill_tier(tier, &mut amounts, max, remaining);
    }

    let allocations: Vec<Allocation> = candidates
        .iter()
        .map(|&i| {
            let item = &items[i];
            let utility = if item.cost > 0.0 {
                item.efficiency() * amounts[i]
            } else {
                item.utility
            };
            Allocation {
                item_id: item.id.clone(),
                amount: amounts[i],
                utility,
            }
        })
        .collect();

    let total_cost = allocations.iter().map(|a| a.amount).sum();
    let total_utility = allocations.iter().map(|a| a.utility).sum();

    Ok(OptimizationResult::new(
        Selection::Continuous { allocations },
        total_cost,
        total_utility,
        total_budget,
    ))
}

/// Splits an efficiency-sorted list into runs of equal efficiency.
fn tiers<'a>(items: &[BudgetItem], sorted: &'a [usize]) -> Vec<&'a [usize]> {
    let mut tiers = Vec::new();
    let mut start = 0;
    for end in 1..=sorted.len() {
        let boundary = end == sorted.len() || {
            let leader = items[sorted[start]].efficiency();
            let next = items[sorted[end]].efficiency();
            (leader - next).abs() > TIER_TOLERANCE * leader.abs().max(1.0)
        };
        if boundary {
            tiers.push(&sorted[start..end]);
            start = end;
        }
    }
    tiers
}

/// Pours `remaining` into one tier. Returns what is left afterwards.
fn fill_tier(tier: &[usize], amounts: &mut [f64], max: f64, mut remaining: f64) -> f64 {
    let mut active: Vec<usize> = tier.iter().copied().filter(|&i| amounts[i] < max).collect();

    while !active.is_empty() && remaining > COST_TOLERANCE {
        let share = remaining / active.len() as f64;
        for &i in &active {
            let given = share.min(max - amounts[i]);
            amounts[i] += given;
            remaining -= given;
        }
        active.retain(|&i| amounts[i] < max);
    }
    remaining.max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amount(result: &OptimizationResult, id: &str) -> f64 {
        result.allocation_of(id).unwrap()
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    #[test]
    fn most_efficient_item_is_filled_first() {
        let items = vec![
            BudgetItem::new("A", 100.0, 80.0),
            BudgetItem::new("B", 150.0, 100.0),
        ];
        let constraint = BudgetConstraint::new(200.0).with_bounds(0.0, 120.0);
        let result = solve(&items, &constraint).unwrap();

        assert_close(amount(&result, "A"), 120.0);
        assert_close(amount(&result, "B"), 80.0);
        assert_close(result.total_cost, 200.0);
        // 0.8 × 120 + (2/3) × 80
        assert_close(result.total_utility, 96.0 + 160.0 / 3.0);
    }

    #[test]
    fn unbounded_budget_goes_to_the_best_item() {
        let items = vec![
            BudgetItem::new("A", 100.0, 80.0),
            BudgetItem::new("B", 150.0, 100.0),
        ];
        let result = solve(&items, &BudgetConstraint::new(200.0)).unwrap();
        assert_close(amount(&result, "A"), 200.0);
        assert_eq!(amount(&result, "B"), 0.0);
        assert_eq!(result.funded_item_ids(), vec!["A"]);
    }

    #[test]
    fn equal_efficiency_tier_shares_evenly() {
        let items = vec![
            BudgetItem::new("A", 10.0, 10.0),
            BudgetItem::new("B", 20.0, 20.0),
            BudgetItem::new("C", 10.0, 1.0),
        ];
        let constraint = BudgetConstraint::new(90.0).with_bounds(0.0, 40.0);
        let result = solve(&items, &constraint).unwrap();
        assert_close(amount(&result, "A"), 40.0);
        assert_close(amount(&result, "B"), 40.0);
        assert_close(amount(&result, "C"), 10.0);
    }

    #[test]
    fn minimum_bound_applies_to_every_item() {
        let items = vec![
            BudgetItem::new("A", 10.0, 10.0),
            BudgetItem::new("B", 10.0, 0.0),
        ];
        let constraint = BudgetConstraint::new(50.0).with_bounds(5.0, 30.0);
        let result = solve(&items, &constraint).unwrap();
        assert_close(amount(&result, "A"), 30.0);
        // Zero utility: lower bound only
        assert_close(amount(&result, "B"), 5.0);
        assert_close(result.unused_budget, 15.0);
    }

    #[test]
    fn mandatory_items_get_their_cost() {
        let items = vec![
            BudgetItem::new("A", 10.0, 10.0),
            BudgetItem::new("B", 40.0, 1.0),
        ];
        let constraint = BudgetConstraint::new(60.0).with_mandatory(&["B"]);
        let result = solve(&items, &constraint).unwrap();
        assert_close(amount(&result, "B"), 40.0);
        assert_close(amount(&result, "A"), 20.0);
    }

    #[test]
    fn mandatory_cost_is_clamped_to_bounds() {
        let items = vec![BudgetItem::new("A", 500.0, 10.0)];
        let constraint = BudgetConstraint::new(1_000.0)
            .with_mandatory(&["A"])
            .with_bounds(0.0, 100.0);
        let result = solve(&items, &constraint).unwrap();
        assert_close(amount(&result, "A"), 100.0);
    }

    #[test]
    fn lower_bounds_beyond_budget_are_infeasible() {
        let items = vec![
            BudgetItem::new("A", 10.0, 10.0),
            BudgetItem::new("B", 10.0, 10.0),
        ];
        let constraint = BudgetConstraint::new(15.0).with_bounds(10.0, 20.0);
        assert_eq!(
            solve(&items, &constraint).unwrap_err(),
            AnalysisError::BudgetInfeasible {
                required: 20.0,
                available: 15.0
            }
        );
    }

    #[test]
    fn excluded_items_receive_nothing() {
        let items = vec![
            BudgetItem::new("A", 10.0, 10.0),
            BudgetItem::new("B", 10.0, 5.0),
        ];
        let constraint = BudgetConstraint::new(10.0).with_excluded(&["A"]);
        let result = solve(&items, &constraint).unwrap();
        assert!(result.allocation_of("A").is_none());
        assert_close(amount(&result, "B"), 10.0);
    }

    #[test]
    fn free_items_count_full_utility() {
        let items = vec![BudgetItem::new("free", 0.0, 3.0)];
        let result = solve(&items, &BudgetConstraint::new(10.0)).unwrap();
        assert_eq!(result.total_utility, 3.0);
        assert_eq!(result.total_cost, 0.0);
    }
}
