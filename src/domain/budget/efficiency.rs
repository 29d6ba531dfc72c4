//! Efficiency Recommender - Top-K shortlist by utility per cost.

use serde::{Deserialize, Serialize};

use super::BudgetItem;
use crate::domain::foundation::AnalysisError;

/// An item's place in the efficiency shortlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EfficiencyRank {
    pub item_id: String,
    /// Utility per cost. A free item with utility is written as the string
    /// `"Infinity"`, since JSON numbers cannot hold it.
    #[serde(with = "efficiency_value")]
    pub efficiency: f64,
    pub utility: f64,
    pub cost: f64,
    /// 1-based position.
    pub rank: usize,
}

mod efficiency_value {
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

    const INFINITY: &str = "Infinity";

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Wire {
        Number(f64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if *value == f64::INFINITY {
            INFINITY.serialize(serializer)
        } else {
            value.serialize(serializer)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Wire::deserialize(deserializer)? {
            Wire::Number(value) => Ok(value),
            Wire::Text(text) if text == INFINITY => Ok(f64::INFINITY),
            Wire::Text(text) => Err(de::Error::invalid_value(
                de::Unexpected::Str(&text),
                &"a number or \"Infinity\"",
            )),
        }
    }
}

/// Ranks items by efficiency.
pub struct EfficiencyRecommender;

impl EfficiencyRecommender {
    /// Returns the `k` most efficient items, or all of them if fewer exist.
    ///
    /// Sorted by descending efficiency, then descending utility; remaining
    /// ties keep input order.
    ///
    /// # Errors
    /// - `InvalidTopK` if `k` is 0
    /// - `InvalidBudgetInput` for a negative or non-finite cost or utility
    pub fn top_k(items: &[BudgetItem], k: usize) -> Result<Vec<EfficiencyRank>, AnalysisError> {
        if k < 1 {
            return Err(AnalysisError::InvalidTopK { k });
        }
        for item in items {
            item.check()?;
        }

        let mut ranked: Vec<&BudgetItem> = items.iter().collect();
        ranked.sort_by(|a, b| {
            b.efficiency()
                .total_cmp(&a.efficiency())
                .then_with(|| b.utility.total_cmp(&a.utility))
        });

        Ok(ranked
            .into_iter()
            .take(k)
            .enumerate()
            .map(|(i, item)| EfficiencyRank {
                item_id: item.id.clone(),
                efficiency: item.efficiency(),
                utility: item.utility,
                cost: item.cost,
                rank: i + 1,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(ranks: &[EfficiencyRank]) -> Vec<&str> {
        ranks.iter().map(|r| r.item_id.as_str()).collect()
    }

    #[test]
    fn returns_k_most_efficient() {
        let items = vec![
            BudgetItem::new("A", 100.0, 80.0),
            BudgetItem::new("B", 150.0, 100.0),
            BudgetItem::new("C", 10.0, 9.0),
        ];
        let top = EfficiencyRecommender::top_k(&items, 2).unwrap();
        assert_eq!(ids(&top), vec!["C", "A"]);
        assert_eq!(top[0].rank, 1);
        assert_eq!(top[1].efficiency, 0.8);
    }

    #[test]
    fn returns_everything_when_k_exceeds_len() {
        let items = vec![BudgetItem::new("A", 1.0, 1.0)];
        assert_eq!(EfficiencyRecommender::top_k(&items, 5).unwrap().len(), 1);
    }

    #[test]
    fn ties_prefer_higher_utility() {
        let items = vec![
            BudgetItem::new("small", 10.0, 5.0),
            BudgetItem::new("large", 100.0, 50.0),
            BudgetItem::new("twin", 10.0, 5.0),
        ];
        let top = EfficiencyRecommender::top_k(&items, 3).unwrap();
        assert_eq!(ids(&top), vec!["large", "small", "twin"]);
    }

    #[test]
    fn free_items_lead() {
        let items = vec![
            BudgetItem::new("A", 10.0, 9.0),
            BudgetItem::new("free", 0.0, 0.1),
        ];
        let top = EfficiencyRecommender::top_k(&items, 1).unwrap();
        assert_eq!(ids(&top), vec!["free"]);
    }

    #[test]
    fn free_item_efficiency_survives_json() {
        let items = vec![
            BudgetItem::new("free", 0.0, 0.1),
            BudgetItem::new("A", 10.0, 9.0),
        ];
        let top = EfficiencyRecommender::top_k(&items, 2).unwrap();

        let value = serde_json::to_value(&top).unwrap();
        assert_eq!(value[0]["efficiency"], "Infinity");
        assert_eq!(value[1]["efficiency"], 0.9);

        let back: Vec<EfficiencyRank> = serde_json::from_value(value).unwrap();
        assert_eq!(back, top);
    }

    #[test]
    fn unknown_efficiency_text_is_rejected() {
        let value = serde_json::json!({
            "itemId": "a", "efficiency": "lots", "utility": 1.0, "cost": 0.0, "rank": 1
        });
        assert!(serde_json::from_value::<EfficiencyRank>(value).is_err());
    }

    #[test]
    fn rejects_zero_k() {
        assert_eq!(
            EfficiencyRecommender::top_k(&[], 0).unwrap_err(),
            AnalysisError::InvalidTopK { k: 0 }
        );
    }
}
