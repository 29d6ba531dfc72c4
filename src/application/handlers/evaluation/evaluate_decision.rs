//! EvaluateDecisionHandler - Runs judgments through the full AHP pipeline.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info};

use crate::config::AnalysisConfig;
use crate::domain::ahp::{
    AlternativeScores, ConsistencyEvaluator, ConsistencyReport, CriterionNode, GroupAggregator,
    GroupPriorities, HierarchyAggregator, HierarchyInput, JudgmentRevision, MatrixInput,
    MatrixValidator, MatrixWarning, NodeInput, PriorityVector, Ranking,
};
use crate::domain::foundation::{AnalysisError, HierarchyDefect, ValidationError};

/// Revision hints attached to each unacceptable matrix.
const REVISION_HINTS: usize = 3;

/// One evaluator's pairwise judgments under one parent node.
///
/// Under the goal or an inner criterion the elements are the child criteria;
/// under a leaf criterion they are the alternatives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluatorJudgment {
    pub evaluator_id: String,
    /// `None` compares the top-level criteria.
    #[serde(default)]
    pub parent_id: Option<String>,
    pub matrix: MatrixInput,
}

/// Command to evaluate a decision from raw judgments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateDecisionCommand {
    pub nodes: Vec<NodeInput>,
    pub alternatives: Vec<String>,
    pub judgments: Vec<EvaluatorJudgment>,
    #[serde(default)]
    pub evaluator_weights: BTreeMap<String, f64>,
}

/// Validation and consistency outcome of one submitted matrix.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JudgmentAssessment {
    pub evaluator_id: String,
    pub parent_id: Option<String>,
    pub priorities: PriorityVector,
    pub consistency: ConsistencyReport,
    pub warnings: Vec<MatrixWarning>,
    /// Judgments to revisit, present only when the matrix is unacceptable.
    pub revisions: Vec<JudgmentRevision>,
}

/// Group consensus under one parent node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePriorities {
    pub parent_id: Option<String>,
    pub consensus: PriorityVector,
    pub group: GroupPriorities,
}

/// Result of a successful evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionEvaluation {
    pub assessments: Vec<JudgmentAssessment>,
    pub node_priorities: Vec<NodePriorities>,
    pub criteria: Vec<CriterionNode>,
    pub ranking: Ranking,
}

impl DecisionEvaluation {
    /// Returns true if every submitted matrix passed the consistency check.
    pub fn all_consistent(&self) -> bool {
        self.assessments.iter().all(|a| a.consistency.is_acceptable)
    }
}

/// Handler for evaluating decisions.
pub struct EvaluateDecisionHandler {
    validator: MatrixValidator,
    consistency: ConsistencyEvaluator,
    hierarchy: HierarchyAggregator,
}

impl EvaluateDecisionHandler {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            validator: MatrixValidator::new(config.matrix),
            consistency: ConsistencyEvaluator::new(config.consistency),
            hierarchy: HierarchyAggregator::new(config.hierarchy),
        }
    }

    pub fn handle(&self, cmd: EvaluateDecisionCommand) -> Result<DecisionEvaluation, AnalysisError> {
        if cmd.alternatives.is_empty() {
            return Err(ValidationError::empty_field("alternatives").into());
        }

        // 1. Sibling groups keyed by parent (None = goal)
        let mut groups: BTreeMap<Option<String>, Vec<String>> = BTreeMap::new();
        for node in &cmd.nodes {
            groups
                .entry(node.parent_id.clone())
                .or_default()
                .push(node.id.clone());
        }
        let known: HashSet<&str> = cmd.nodes.iter().map(|n| n.id.as_str()).collect();

        // 2. Validate each matrix, derive priorities and check consistency
        let mut assessments = Vec::with_capacity(cmd.judgments.len());
        let mut by_parent: BTreeMap<Option<String>, BTreeMap<String, PriorityVector>> =
            BTreeMap::new();
        for judgment in &cmd.judgments {
            if let Some(parent) = &judgment.parent_id {
                if !known.contains(parent.as_str()) {
                    return Err(AnalysisError::invalid_hierarchy(
                        HierarchyDefect::UnknownCriterion(parent.clone()),
                    ));
                }
            }

            let validated = self.validator.validate(&judgment.matrix)?;
            let (priorities, consistency) = self.consistency.assess(&validated.matrix);
            let revisions = if consistency.is_acceptable {
                Vec::new()
            } else {
                ConsistencyEvaluator::inconsistent_judgments(
                    &validated.matrix,
                    &priorities,
                    REVISION_HINTS,
                )?
            };

            let previous = by_parent
                .entry(judgment.parent_id.clone())
                .or_default()
                .insert(judgment.evaluator_id.clone(), priorities.clone());
            if previous.is_some() {
                return Err(ValidationError::invalid_format(
                    "judgments",
                    format!(
                        "evaluator '{}' judged '{}' twice",
                        judgment.evaluator_id,
                        node_label(&judgment.parent_id)
                    ),
                )
                .into());
            }

            assessments.push(JudgmentAssessment {
                evaluator_id: judgment.evaluator_id.clone(),
                parent_id: judgment.parent_id.clone(),
                priorities,
                consistency,
                warnings: validated.warnings,
                revisions,
            });
        }

        // 3. Aggregate evaluators per parent node
        let mut node_priorities = Vec::with_capacity(by_parent.len());
        for (parent_id, vectors) in &by_parent {
            let (consensus, group) =
                GroupAggregator::aggregate_labelled(&cmd.evaluator_weights, vectors)?;
            debug!(
                node = node_label(parent_id),
                participants = group.participants,
                "Aggregated node priorities"
            );
            node_priorities.push(NodePriorities {
                parent_id: parent_id.clone(),
                consensus,
                group,
            });
        }
        let consensus_of = |parent: &Option<String>| {
            node_priorities
                .iter()
                .find(|p| &p.parent_id == parent)
                .map(|p| &p.consensus)
        };

        // 4. Local criterion weights from the consensus of each sibling group
        let mut local_weights = HashMap::new();
        for (parent_id, children) in &groups {
            if children.len() == 1 {
                continue;
            }
            let consensus = consensus_of(parent_id).ok_or_else(|| AnalysisError::MissingJudgment {
                node: node_label(parent_id).to_string(),
            })?;
            for (id, weight) in weights_by_id(children, consensus, parent_id)? {
                local_weights.insert(id, weight);
            }
        }

        // 5. Global weights
        let hierarchy = self.hierarchy.build(&HierarchyInput {
            nodes: cmd.nodes.clone(),
            local_weights,
        })?;

        // 6. Alternative scores under every leaf criterion
        let mut scores = AlternativeScores::new(cmd.alternatives.clone());
        for leaf in hierarchy.leaves() {
            let parent = Some(leaf.id.clone());
            if cmd.alternatives.len() == 1 {
                scores
                    .scores
                    .insert(leaf.id.clone(), [(cmd.alternatives[0].clone(), 1.0)].into());
                continue;
            }
            let consensus = consensus_of(&parent).ok_or_else(|| AnalysisError::MissingJudgment {
                node: leaf.id.clone(),
            })?;
            weights_by_id(&cmd.alternatives, consensus, &parent)?;
            scores.insert_priorities(leaf.id.clone(), consensus);
        }

        // 7. Composite ranking
        let ranking = self.hierarchy.composite_scores(&hierarchy, &scores)?;

        let evaluation = DecisionEvaluation {
            assessments,
            node_priorities,
            criteria: hierarchy.nodes().to_vec(),
            ranking,
        };

        info!(
            criteria = evaluation.criteria.len(),
            alternatives = cmd.alternatives.len(),
            judgments = evaluation.assessments.len(),
            all_consistent = evaluation.all_consistent(),
            leader = evaluation.ranking.leader().map(|r| r.alternative_id.as_str()),
            "Decision evaluated"
        );

        Ok(evaluation)
    }
}

fn node_label(parent_id: &Option<String>) -> &str {
    parent_id.as_deref().unwrap_or("goal")
}

/// Checks that a consensus compares exactly `expected` and returns its weights by id.
fn weights_by_id(
    expected: &[String],
    consensus: &PriorityVector,
    parent_id: &Option<String>,
) -> Result<Vec<(String, f64)>, AnalysisError> {
    let compared: HashSet<&str> = consensus.elements().iter().map(String::as_str).collect();
    let wanted: HashSet<&str> = expected.iter().map(String::as_str).collect();
    if compared != wanted || consensus.len() != expected.len() {
        return Err(AnalysisError::invalid_priorities(format!(
            "judgments under '{}' compare {:?}, expected {:?}",
            node_label(parent_id),
            consensus.elements(),
            expected
        )));
    }
    Ok(consensus.iter().map(|(id, w)| (id.to_string(), w)).collect())
}
