//! Binary mode - exact 0/1 knapsack.
//!
//! Three strategies, tried in order:
//! 1. a DP over a budget grid whose unit divides every cost exactly,
//! 2. a Pareto frontier of `(cost, utility)` states over the true costs,
//! 3. a DP over a coarse grid with costs rounded up, followed by a slack fill.
//!
//! The first two are exact. The third only runs when both exceed the cell cap.

use std::cmp::Ordering;
use tracing::{debug, warn};

use super::item::{BudgetConstraint, BudgetItem, OptimizationResult, Selection};
use super::optimizer::COST_TOLERANCE;
use crate::domain::foundation::AnalysisError;

/// Smallest utility gain that counts as an improvement.
const UTILITY_EPSILON: f64 = 1e-12;

/// Most decimal places tried when looking for an exact cost grid.
const MAX_DECIMALS: i32 = 6;

/// Largest integer an `f64` holds exactly.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Budget axis resolution for one solve.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Resolution {
    /// Currency amount represented by one DP column.
    unit: f64,
    /// Number of columns after the zero column.
    capacity: usize,
}

impl Resolution {
    /// A grid on which every cost is a whole number of units.
    ///
    /// Costs are scaled by the smallest power of ten that makes them integral
    /// and the unit is the GCD of the scaled costs. `None` when no such scale
    /// exists or the table would exceed `max_cells`.
    fn exact(remaining: f64, costs: &[f64], max_cells: usize) -> Option<Self> {
        let rows = costs.len().max(1);
        for decimals in 0..=MAX_DECIMALS {
            let scale = 10f64.powi(decimals);
            let scaled: Option<Vec<u64>> = costs.iter().map(|c| as_integer(c * scale)).collect();
            let Some(scaled) = scaled else { continue };

            let divisor = scaled.iter().fold(0, |g, &c| gcd(g, c));
            if divisor == 0 {
                return None;
            }
            let unit = divisor as f64 / scale;
            let ratio = remaining / unit;
            let nearest = ratio.round();
            let columns = if (ratio - nearest).abs() <= 1e-9 * nearest.max(1.0) {
                nearest
            } else {
                ratio.floor()
            };
            if !(columns < MAX_EXACT_INTEGER) {
                return None;
            }
            let capacity = columns as usize;
            let fits = capacity
                .checked_add(1)
                .and_then(|cols| cols.checked_mul(rows))
                .map_or(false, |cells| cells <= max_cells);
            return fits.then_some(Self { unit, capacity });
        }
        None
    }

    /// An even split of the remaining budget that fits `max_cells`.
    fn approximate(remaining: f64, rows: usize, max_cells: usize) -> Self {
        let capacity = (max_cells / rows.max(1)).saturating_sub(1).max(1);
        Self {
            unit: remaining / capacity as f64,
            capacity,
        }
    }

    /// Columns needed to hold `cost`, rounded up so the budget is never overrun.
    fn units(&self, cost: f64) -> usize {
        let scaled = cost / self.unit;
        let nearest = scaled.round();
        let units = if (scaled - nearest).abs() < 1e-9 {
            nearest
        } else {
            scaled.ceil()
        };
        units as usize
    }
}

fn as_integer(value: f64) -> Option<u64> {
    let nearest = value.round();
    let close = (value - nearest).abs() <= 1e-9 * nearest.abs().max(1.0);
    (close && nearest >= 0.0 && nearest < MAX_EXACT_INTEGER).then_some(nearest as u64)
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Solves the binary mode.
///
/// # Algorithm
/// 1. Mandatory items are funded first; their cost is removed from the budget.
/// 2. Excluded items and items that cannot help are dropped.
/// 3. Free items with utility are always taken.
/// 4. The rest are solved exactly on a cost grid or a Pareto frontier, both
///    bounded by `max_cells`.
/// 5. Past that bound, a rounded-up grid DP runs and any unchosen item that
///    still fits the true remaining budget is added, most efficient first.
pub(super) fn solve(
    items: &[BudgetItem],
    constraint: &BudgetConstraint,
    max_cells: usize,
) -> Result<OptimizationResult, AnalysisError> {
    let total_budget = constraint.total_budget;
    let mandatory_cost: f64 = items
        .iter()
        .filter(|i| constraint.is_mandatory(&i.id))
        .map(|i| i.cost)
        .sum();
    if mandatory_cost > total_budget + COST_TOLERANCE {
        return Err(AnalysisError::BudgetInfeasible {
            required: mandatory_cost,
            available: total_budget,
        });
    }
    let remaining = (total_budget - mandatory_cost).max(0.0);

    let mut chosen = vec![false; items.len()];
    let mut candidates = Vec::new();
    for (index, item) in items.iter().enumerate() {
        if constraint.is_mandatory(&item.id) {
            chosen[index] = true;
        } else if constraint.is_excluded(&item.id)
            || item.utility <= 0.0
            || item.cost > remaining + COST_TOLERANCE
        {
            continue;
        } else if item.cost == 0.0 {
            chosen[index] = true;
        } else {
            candidates.push(index);
        }
    }

    if !candidates.is_empty() && remaining > 0.0 {
        let costs: Vec<f64> = candidates.iter().map(|&i| items[i].cost).collect();
        let utilities: Vec<f64> = candidates.iter().map(|&i| items[i].utility).collect();

        let (picked, rounded) = if let Some(resolution) =
            Resolution::exact(remaining, &costs, max_cells)
        {
            debug!(
                candidates = candidates.len(),
                unit = resolution.unit,
                capacity = resolution.capacity,
                "Solving knapsack on exact grid"
            );
            let weights: Vec<usize> = costs.iter().map(|c| resolution.units(*c)).collect();
            (pick(&weights, &utilities, resolution.capacity), false)
        } else if let Some(picked) = frontier(&costs, &utilities, remaining, max_cells) {
            debug!(candidates = candidates.len(), "Solved knapsack on Pareto frontier");
            (picked, false)
        } else {
            let resolution = Resolution::approximate(remaining, costs.len(), max_cells);
            warn!(
                candidates = candidates.len(),
                unit = resolution.unit,
                max_cells,
                "Knapsack exceeds exact limits, rounding costs up"
            );
            let weights: Vec<usize> = costs.iter().map(|c| resolution.units(*c)).collect();
            (pick(&weights, &utilities, resolution.capacity), true)
        };

        for k in picked {
            chosen[candidates[k]] = true;
        }
        if rounded {
            fill_slack(items, &candidates, &mut chosen, remaining);
        }
    }

    let selected: Vec<&BudgetItem> = items
        .iter()
        .zip(&chosen)
        .filter(|(_, c)| **c)
        .map(|(item, _)| item)
        .collect();
    let total_cost = selected.iter().map(|i| i.cost).sum();
    let total_utility = selected.iter().map(|i| i.utility).sum();

    Ok(OptimizationResult::new(
        Selection::Binary {
            selected_item_ids: selected.iter().map(|i| i.id.clone()).collect(),
        },
        total_cost,
        total_utility,
        total_budget,
    ))
}

/// Classic 0/1 knapsack. Returns the indices of the chosen rows.
fn pick(weights: &[usize], utilities: &[f64], capacity: usize) -> Vec<usize> {
    let columns = capacity + 1;
    let mut best = vec![0.0_f64; columns];
    let mut keep = vec![false; weights.len() * columns];

    for (k, (&weight, &utility)) in weights.iter().zip(utilities).enumerate() {
        if weight > capacity {
            continue;
        }
        for c in (weight..=capacity).rev() {
            let candidate = best[c - weight] + utility;
            if candidate > best[c] + UTILITY_EPSILON {
                best[c] = candidate;
                keep[k * columns + c] = true;
            }
        }
    }

    let mut picked = Vec::new();
    let mut c = capacity;
    for k in (0..weights.len()).rev() {
        if keep[k * columns + c] {
            picked.push(k);
            c -= weights[k];
        }
    }
    picked.reverse();
    picked
}

/// One reachable selection: its true cost, utility and last decision.
#[derive(Debug, Clone, Copy)]
struct State {
    cost: f64,
    utility: f64,
    trail: Option<usize>,
}

/// Back-pointer for reconstructing a frontier state.
#[derive(Debug, Clone, Copy)]
struct Step {
    row: usize,
    previous: Option<usize>,
}

/// Exact 0/1 knapsack over non-dominated `(cost, utility)` states.
///
/// The frontier is kept sorted by cost with strictly increasing utility, so
/// its last state is the optimum. Returns `None` once frontier plus trail
/// would exceed `max_states`.
fn frontier(costs: &[f64], utilities: &[f64], capacity: f64, max_states: usize) -> Option<Vec<usize>> {
    let mut trail: Vec<Step> = Vec::new();
    let mut states = vec![State {
        cost: 0.0,
        utility: 0.0,
        trail: None,
    }];

    for (row, (&cost, &utility)) in costs.iter().zip(utilities).enumerate() {
        let mut extended = Vec::with_capacity(states.len());
        for state in &states {
            let total = state.cost + cost;
            if total > capacity + COST_TOLERANCE {
                break;
            }
            trail.push(Step {
                row,
                previous: state.trail,
            });
            extended.push(State {
                cost: total,
                utility: state.utility + utility,
                trail: Some(trail.len() - 1),
            });
        }
        states = merge(&states, &extended);
        if trail.len() + states.len() > max_states {
            return None;
        }
    }

    let mut picked = Vec::new();
    let mut cursor = states.last().and_then(|s| s.trail);
    while let Some(index) = cursor {
        picked.push(trail[index].row);
        cursor = trail[index].previous;
    }
    picked.reverse();
    Some(picked)
}

/// Merges two cost-sorted state lists, dropping dominated states.
fn merge(a: &[State], b: &[State]) -> Vec<State> {
    let mut merged: Vec<State> = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() || j < b.len() {
        let take_a = match (a.get(i), b.get(j)) {
            (Some(x), Some(y)) => match x.cost.total_cmp(&y.cost) {
                Ordering::Less => true,
                Ordering::Greater => false,
                Ordering::Equal => x.utility >= y.utility,
            },
            (Some(_), None) => true,
            _ => false,
        };
        let next = if take_a {
            i += 1;
            a[i - 1]
        } else {
            j += 1;
            b[j - 1]
        };
        if merged
            .last()
            .map_or(true, |last| next.utility > last.utility + UTILITY_EPSILON)
        {
            merged.push(next);
        }
    }
    merged
}

fn fill_slack(items: &[BudgetItem], candidates: &[usize], chosen: &mut [bool], remaining: f64) {
    let mut spent: f64 = candidates
        .iter()
        .filter(|&&i| chosen[i])
        .map(|&i| items[i].cost)
        .sum();

    let mut leftovers: Vec<usize> = candidates.iter().copied().filter(|&i| !chosen[i]).collect();
    leftovers.sort_by(|&a, &b| items[b].efficiency().total_cmp(&items[a].efficiency()));

    for index in leftovers {
        if spent + items[index].cost <= remaining + COST_TOLERANCE {
            chosen[index] = true;
            spent += items[index].cost;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selected(result: &OptimizationResult) -> Vec<&str> {
        result.funded_item_ids()
    }

    #[test]
    fn minimal_instance_maximizes_utility() {
        // Both together cost 250; B alone beats A alone
        let items = vec![
            BudgetItem::new("A", 100.0, 80.0),
            BudgetItem::new("B", 150.0, 100.0),
        ];
        let result = solve(&items, &BudgetConstraint::new(200.0), 100_000).unwrap();

        assert_eq!(selected(&result), vec!["B"]);
        assert_eq!(result.total_utility, 100.0);
        assert_eq!(result.total_cost, 150.0);
        assert_eq!(result.unused_budget, 50.0);
        assert_eq!(result.utilization_ratio, 0.75);
    }

    #[test]
    fn minimal_instance_with_b_excluded_selects_a() {
        let items = vec![
            BudgetItem::new("A", 100.0, 80.0),
            BudgetItem::new("B", 150.0, 100.0),
        ];
        let constraint = BudgetConstraint::new(200.0).with_excluded(&["B"]);
        let result = solve(&items, &constraint, 100_000).unwrap();
        assert_eq!(selected(&result), vec!["A"]);
        assert_eq!(result.total_utility, 80.0);
    }

    #[test]
    fn beats_greedy_by_efficiency() {
        // Greedy by efficiency takes A (1.2) then nothing else fits; B + C is better
        let items = vec![
            BudgetItem::new("A", 6.0, 7.2),
            BudgetItem::new("B", 5.0, 5.0),
            BudgetItem::new("C", 5.0, 5.0),
        ];
        let result = solve(&items, &BudgetConstraint::new(10.0), 100_000).unwrap();
        assert_eq!(selected(&result), vec!["B", "C"]);
        assert_eq!(result.total_utility, 10.0);
    }

    #[test]
    fn mandatory_items_are_funded_first() {
        let items = vec![
            BudgetItem::new("A", 100.0, 80.0),
            BudgetItem::new("B", 150.0, 10.0),
            BudgetItem::new("C", 50.0, 30.0),
        ];
        let constraint = BudgetConstraint::new(200.0).with_mandatory(&["B"]);
        let result = solve(&items, &constraint, 100_000).unwrap();
        assert_eq!(selected(&result), vec!["B", "C"]);
        assert_eq!(result.total_cost, 200.0);
    }

    #[test]
    fn mandatory_overrun_is_infeasible() {
        let items = vec![
            BudgetItem::new("A", 150.0, 80.0),
            BudgetItem::new("B", 100.0, 10.0),
        ];
        let constraint = BudgetConstraint::new(200.0).with_mandatory(&["A", "B"]);
        assert_eq!(
            solve(&items, &constraint, 100_000).unwrap_err(),
            AnalysisError::BudgetInfeasible {
                required: 250.0,
                available: 200.0
            }
        );
    }

    #[test]
    fn excluded_items_are_never_selected() {
        let items = vec![
            BudgetItem::new("A", 100.0, 80.0),
            BudgetItem::new("B", 100.0, 100.0),
        ];
        let constraint = BudgetConstraint::new(100.0).with_excluded(&["B"]);
        let result = solve(&items, &constraint, 100_000).unwrap();
        assert_eq!(selected(&result), vec!["A"]);
    }

    #[test]
    fn free_useful_items_are_always_taken() {
        let items = vec![
            BudgetItem::new("free", 0.0, 5.0),
            BudgetItem::new("useless", 0.0, 0.0),
            BudgetItem::new("A", 10.0, 1.0),
        ];
        let result = solve(&items, &BudgetConstraint::new(5.0), 100_000).unwrap();
        assert_eq!(selected(&result), vec!["free"]);
    }

    #[test]
    fn fractional_costs_respect_the_budget() {
        let items: Vec<BudgetItem> = (0..40)
            .map(|i| BudgetItem::new(format!("i{}", i), 10.37 + i as f64 * 1.913, 1.0 + (i % 7) as f64))
            .collect();
        let result = solve(&items, &BudgetConstraint::new(250.55), 2_000).unwrap();
        assert!(result.total_cost <= 250.55 + 1e-6);
        assert!(result.total_utility > 0.0);
    }

    #[test]
    fn half_unit_costs_can_fill_the_budget_exactly() {
        // A + B costs exactly 20 and beats B + C
        let items = vec![
            BudgetItem::new("A", 12.5, 10.0),
            BudgetItem::new("B", 7.5, 6.0),
            BudgetItem::new("C", 8.0, 9.0),
        ];
        let result = solve(&items, &BudgetConstraint::new(20.0), 100_000).unwrap();
        assert_eq!(selected(&result), vec!["A", "B"]);
        assert_eq!(result.total_utility, 16.0);
        assert_eq!(result.unused_budget, 0.0);
    }

    #[test]
    fn large_budget_can_be_filled_exactly() {
        // A + B spends the whole million for 7; C alone gives 6.5
        let items = vec![
            BudgetItem::new("A", 400_000.0, 3.0),
            BudgetItem::new("B", 600_000.0, 4.0),
            BudgetItem::new("C", 650_000.0, 6.5),
        ];
        let result = solve(&items, &BudgetConstraint::new(1_000_000.0), 100_000).unwrap();
        assert_eq!(selected(&result), vec!["A", "B"]);
        assert_eq!(result.total_utility, 7.0);
    }

    #[test]
    fn large_integral_budget_is_scaled() {
        let items = vec![
            BudgetItem::new("A", 400_000.0, 3.0),
            BudgetItem::new("B", 600_000.0, 4.0),
            BudgetItem::new("C", 500_000.0, 4.5),
        ];
        let result = solve(&items, &BudgetConstraint::new(1_000_000.0), 1_000).unwrap();
        // A + C costs 900k for 7.5; A + B spends everything for only 7
        assert_eq!(selected(&result), vec!["A", "C"]);
    }

    #[test]
    fn coprime_costs_use_the_frontier() {
        // Unit 0.01 needs ~3 million cells; the frontier stays tiny
        let items = vec![
            BudgetItem::new("A", 9_999.99, 5.0),
            BudgetItem::new("B", 20_000.01, 8.0),
            BudgetItem::new("C", 10_000.00, 4.0),
        ];
        assert!(Resolution::exact(30_000.0, &[9_999.99, 20_000.01, 10_000.0], 100_000).is_none());

        let result = solve(&items, &BudgetConstraint::new(30_000.0), 100_000).unwrap();
        assert_eq!(selected(&result), vec!["A", "B"]);
        assert_eq!(result.total_utility, 13.0);
    }

    #[test]
    fn slack_fill_reclaims_rounding_loss() {
        // Too small for either exact strategy: both items round up to the
        // single column and only one fits before the slack fill
        let items = vec![
            BudgetItem::new("A", 0.6, 1.0),
            BudgetItem::new("B", 0.4, 1.0),
        ];
        let result = solve(&items, &BudgetConstraint::new(1.0), 4).unwrap();
        assert_eq!(selected(&result), vec!["A", "B"]);
    }

    #[test]
    fn exact_grid_uses_the_cost_gcd() {
        let resolution = Resolution::exact(200.0, &[100.0, 150.0], 100_000).unwrap();
        assert_eq!(resolution, Resolution { unit: 50.0, capacity: 4 });

        let resolution = Resolution::exact(20.0, &[12.5, 7.5, 8.0], 100_000).unwrap();
        assert_eq!(resolution, Resolution { unit: 0.5, capacity: 40 });
    }

    #[test]
    fn exact_grid_keeps_budgets_that_divide_in_decimal() {
        // 123.45 / 0.01 lands just below 12345 in binary floating point
        let resolution = Resolution::exact(123.45, &[0.01, 100.0], 100_000).unwrap();
        assert_eq!(resolution.capacity, 12_345);
    }

    #[test]
    fn exact_grid_respects_the_cell_cap() {
        assert!(Resolution::exact(1_000.0, &[1.0, 3.0], 100).is_none());
    }

    #[test]
    fn frontier_gives_up_past_the_state_cap() {
        let costs: Vec<f64> = (0..20).map(|i| 1.0 + i as f64 * 0.37).collect();
        let utilities: Vec<f64> = (0..20).map(|i| 1.0 + i as f64).collect();
        assert!(frontier(&costs, &utilities, 100.0, 50).is_none());
    }

    #[test]
    fn approximate_grid_rounds_costs_up() {
        let resolution = Resolution { unit: 2.0, capacity: 10 };
        assert_eq!(resolution.units(4.0), 2);
        assert_eq!(resolution.units(4.1), 3);
        assert_eq!(resolution.units(4.000_000_000_1), 2);
    }
}
