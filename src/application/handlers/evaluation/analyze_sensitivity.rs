//! AnalyzeSensitivityHandler - Builds the hierarchy and sweeps one criterion.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::AnalysisConfig;
use crate::domain::ahp::{
    AlternativeScores, HierarchyAggregator, HierarchyInput, RankReversal, SensitivityAnalyzer,
    SensitivityPoint, SensitivityRequest,
};
use crate::domain::foundation::AnalysisError;

/// Command to analyze ranking sensitivity to one criterion's weight.
///
/// Serialized as `{ criteriaHierarchy, alternativeScores, targetCriterionId,
/// weightAdjustments }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeSensitivityCommand {
    pub criteria_hierarchy: HierarchyInput,
    pub alternative_scores: AlternativeScores,
    #[serde(flatten)]
    pub request: SensitivityRequest,
}

/// Result of a sensitivity analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensitivityAnalysis {
    pub points: Vec<SensitivityPoint>,
    pub rank_reversals: Vec<RankReversal>,
}

/// Handler for sensitivity analysis.
pub struct AnalyzeSensitivityHandler {
    hierarchy: HierarchyAggregator,
    analyzer: SensitivityAnalyzer,
}

impl AnalyzeSensitivityHandler {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            hierarchy: HierarchyAggregator::new(config.hierarchy),
            analyzer: SensitivityAnalyzer::new(config.sensitivity),
        }
    }

    pub fn handle(&self, cmd: AnalyzeSensitivityCommand) -> Result<SensitivityAnalysis, AnalysisError> {
        // 1. Global weights
        let hierarchy = self.hierarchy.build(&cmd.criteria_hierarchy)?;

        // 2. One ranking per requested weight
        let points = self
            .analyzer
            .analyze(&hierarchy, &cmd.alternative_scores, &cmd.request)?;

        // 3. Leader changes
        let rank_reversals = SensitivityAnalyzer::rank_reversals(&points);

        info!(
            criterion = %cmd.request.target_criterion_id,
            points = points.len(),
            reversals = rank_reversals.len(),
            "Sensitivity analyzed"
        );

        Ok(SensitivityAnalysis {
            points,
            rank_reversals,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ahp::WeightAdjustments;
    use serde_json::json;

    fn handler() -> AnalyzeSensitivityHandler {
        AnalyzeSensitivityHandler::new(&AnalysisConfig::default())
    }

    fn contract() -> serde_json::Value {
        json!({
            "criteriaHierarchy": {
                "nodes": [
                    { "id": "price", "parentId": null, "name": "Price", "level": 1 },
                    { "id": "speed", "parentId": null, "name": "Speed", "level": 1 }
                ],
                "localWeights": { "price": 0.5, "speed": 0.5 }
            },
            "alternativeScores": {
                "alternatives": ["x", "y"],
                "scores": {
                    "price": { "x": 0.8, "y": 0.2 },
                    "speed": { "x": 0.3, "y": 0.7 }
                }
            },
            "targetCriterionId": "price",
            "weightAdjustments": [0.0, 0.5, 1.0]
        })
    }

    #[test]
    fn command_deserializes_from_contract_shape() {
        let cmd: AnalyzeSensitivityCommand = serde_json::from_value(contract()).unwrap();
        assert_eq!(cmd.request.target_criterion_id, "price");
        assert_eq!(
            cmd.request.weight_adjustments,
            WeightAdjustments::Discrete(vec![0.0, 0.5, 1.0])
        );
        assert_eq!(cmd.alternative_scores.alternatives, vec!["x", "y"]);
        assert_eq!(serde_json::to_value(&cmd).unwrap(), contract());
    }

    #[test]
    fn reports_points_and_reversals() {
        let cmd: AnalyzeSensitivityCommand = serde_json::from_value(contract()).unwrap();
        let analysis = handler().handle(cmd).unwrap();

        assert_eq!(analysis.points.len(), 3);
        let leaders: Vec<&str> = analysis
            .points
            .iter()
            .map(|p| p.ranking.leader().unwrap().alternative_id.as_str())
            .collect();
        // speed alone favours y, price alone favours x
        assert_eq!(leaders, vec!["y", "x", "x"]);
        assert_eq!(analysis.rank_reversals.len(), 1);
        assert_eq!(analysis.rank_reversals[0].new_leader, "x");
    }

    #[test]
    fn invalid_hierarchy_is_reported_before_sweeping() {
        let mut value = contract();
        value["criteriaHierarchy"]["localWeights"]["speed"] = json!(0.9);
        let cmd: AnalyzeSensitivityCommand = serde_json::from_value(value).unwrap();
        assert!(matches!(
            handler().handle(cmd),
            Err(AnalysisError::InvalidHierarchy { .. })
        ));
    }
}
