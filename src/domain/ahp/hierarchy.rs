//! Hierarchy Aggregator - Global weights and composite scores over a criteria tree.
//!
//! The tree is stored as an arena: nodes live in a `Vec`, parents and children
//! are indices into it, and an id → index map gives O(1) lookup.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};

use super::PriorityVector;
use crate::config::HierarchyConfig;
use crate::domain::foundation::{AnalysisError, HierarchyDefect, ValidationError};

/// A criterion as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInput {
    pub id: String,
    /// `None` places the node directly under the goal.
    #[serde(default)]
    pub parent_id: Option<String>,
    pub name: String,
    /// 1 for criteria directly under the goal.
    pub level: u8,
}

impl NodeInput {
    /// Creates a node input.
    pub fn new(
        id: impl Into<String>,
        parent_id: Option<&str>,
        name: impl Into<String>,
        level: u8,
    ) -> Self {
        Self {
            id: id.into(),
            parent_id: parent_id.map(String::from),
            name: name.into(),
            level,
        }
    }
}

/// Tree structure plus each node's local weight within its sibling group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyInput {
    pub nodes: Vec<NodeInput>,
    /// Local weights keyed by node id. A node without siblings may be omitted
    /// and receives weight 1.
    #[serde(default)]
    pub local_weights: HashMap<String, f64>,
}

impl HierarchyInput {
    /// Creates a builder for constructing a hierarchy input.
    pub fn builder() -> HierarchyInputBuilder {
        HierarchyInputBuilder::default()
    }
}

/// Builder for constructing HierarchyInput instances.
#[derive(Debug, Default)]
pub struct HierarchyInputBuilder {
    input: HierarchyInput,
}

impl HierarchyInputBuilder {
    /// Adds a criterion directly under the goal.
    pub fn top(self, id: impl Into<String>, local_weight: f64) -> Self {
        let id = id.into();
        self.node(NodeInput::new(id.clone(), None, id, 1), Some(local_weight))
    }

    /// Adds a sub-criterion under `parent_id` at the given level.
    pub fn child(
        self,
        id: impl Into<String>,
        parent_id: &str,
        level: u8,
        local_weight: Option<f64>,
    ) -> Self {
        let id = id.into();
        self.node(
            NodeInput::new(id.clone(), Some(parent_id), id, level),
            local_weight,
        )
    }

    /// Adds an arbitrary node.
    pub fn node(mut self, node: NodeInput, local_weight: Option<f64>) -> Self {
        if let Some(weight) = local_weight {
            self.input.local_weights.insert(node.id.clone(), weight);
        }
        self.input.nodes.push(node);
        self
    }

    /// Builds the HierarchyInput.
    pub fn build(self) -> HierarchyInput {
        self.input
    }
}

/// A criterion with its resolved weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriterionNode {
    pub id: String,
    pub name: String,
    pub parent_id: Option<String>,
    pub level: u8,
    pub local_weight: f64,
    /// Product of this node's and all ancestors' local weights.
    pub global_weight: f64,
}

/// A validated criteria tree with global weights.
#[derive(Debug, Clone)]
pub struct CriteriaHierarchy {
    nodes: Vec<CriterionNode>,
    parents: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
    top_level: Vec<usize>,
    index: HashMap<String, usize>,
    breadth_first: Vec<usize>,
}

impl CriteriaHierarchy {
    /// Returns all nodes in input order.
    pub fn nodes(&self) -> &[CriterionNode] {
        &self.nodes
    }

    /// Looks up a node by id.
    pub fn node(&self, id: &str) -> Option<&CriterionNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    /// Returns the children of a node, or the top-level criteria for `None`.
    pub fn children(&self, id: Option<&str>) -> Vec<&CriterionNode> {
        let indices = match id {
            None => Some(&self.top_level),
            Some(id) => self.index.get(id).map(|&i| &self.children[i]),
        };
        indices
            .map(|ix| ix.iter().map(|&i| &self.nodes[i]).collect())
            .unwrap_or_default()
    }

    /// Returns the leaf criteria (nodes without children) in input order.
    pub fn leaves(&self) -> impl Iterator<Item = &CriterionNode> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(i, _)| self.children[*i].is_empty())
            .map(|(_, node)| node)
    }

    /// Returns the deepest level in the tree.
    pub fn depth(&self) -> usize {
        self.nodes.iter().map(|n| n.level as usize).max().unwrap_or(0)
    }

    /// Returns the number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the tree has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub(crate) fn is_leaf(&self, index: usize) -> bool {
        self.children[index].is_empty()
    }

    /// Indices of the group `index` belongs to, itself included.
    pub(crate) fn sibling_group(&self, index: usize) -> &[usize] {
        match self.parents[index] {
            Some(parent) => &self.children[parent],
            None => &self.top_level,
        }
    }

    pub(crate) fn local_weights(&self) -> Vec<f64> {
        self.nodes.iter().map(|n| n.local_weight).collect()
    }

    pub(crate) fn global_weights(&self) -> Vec<f64> {
        self.nodes.iter().map(|n| n.global_weight).collect()
    }

    /// Propagates a full set of local weights down the tree.
    pub(crate) fn global_weights_for(&self, local: &[f64]) -> Vec<f64> {
        let mut global = vec![0.0; self.nodes.len()];
        for &i in &self.breadth_first {
            global[i] = match self.parents[i] {
                Some(parent) => local[i] * global[parent],
                None => local[i],
            };
        }
        global
    }
}

/// Local score of every alternative under each leaf criterion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlternativeScores {
    /// Ordered alternative ids; ties in the ranking keep this order.
    pub alternatives: Vec<String>,
    /// `scores[criterion_id][alternative_id]`. Missing entries count as 0.
    #[serde(default)]
    pub scores: HashMap<String, HashMap<String, f64>>,
}

impl AlternativeScores {
    /// Creates an empty score table for the given alternatives.
    pub fn new(alternatives: Vec<impl Into<String>>) -> Self {
        Self {
            alternatives: alternatives.into_iter().map(|s| s.into()).collect(),
            scores: HashMap::new(),
        }
    }

    /// Sets the scores under one criterion.
    pub fn with_criterion(
        mut self,
        criterion_id: impl Into<String>,
        scores: Vec<(impl Into<String>, f64)>,
    ) -> Self {
        self.scores.insert(
            criterion_id.into(),
            scores.into_iter().map(|(a, s)| (a.into(), s)).collect(),
        );
        self
    }

    /// Sets the scores under one criterion from a derived priority vector.
    pub fn insert_priorities(&mut self, criterion_id: impl Into<String>, priorities: &PriorityVector) {
        self.scores.insert(
            criterion_id.into(),
            priorities.iter().map(|(a, w)| (a.to_string(), w)).collect(),
        );
    }
}

/// One alternative's place in a ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedAlternative {
    pub alternative_id: String,
    pub score: f64,
    /// 1-based position.
    pub rank: usize,
}

/// Alternatives ordered by descending composite score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ranking(Vec<RankedAlternative>);

impl Ranking {
    /// Sorts alternatives by descending score; equal scores keep input order.
    pub fn from_scores(alternatives: &[String], scores: &[f64]) -> Self {
        let mut entries: Vec<(&String, f64)> = alternatives.iter().zip(scores.iter().copied()).collect();
        entries.sort_by(|a, b| b.1.total_cmp(&a.1));

        Ranking(
            entries
                .into_iter()
                .enumerate()
                .map(|(i, (id, score))| RankedAlternative {
                    alternative_id: id.clone(),
                    score,
                    rank: i + 1,
                })
                .collect(),
        )
    }

    /// Returns the top-ranked alternative.
    pub fn leader(&self) -> Option<&RankedAlternative> {
        self.0.first()
    }

    /// Returns the ranked entries.
    pub fn entries(&self) -> &[RankedAlternative] {
        &self.0
    }

    /// Returns the alternative ids in rank order.
    pub fn order(&self) -> Vec<&str> {
        self.0.iter().map(|r| r.alternative_id.as_str()).collect()
    }

    /// Returns the rank of an alternative.
    pub fn rank_of(&self, alternative_id: &str) -> Option<usize> {
        self.0
            .iter()
            .find(|r| r.alternative_id == alternative_id)
            .map(|r| r.rank)
    }

    /// Returns the composite score of an alternative.
    pub fn score_of(&self, alternative_id: &str) -> Option<f64> {
        self.0
            .iter()
            .find(|r| r.alternative_id == alternative_id)
            .map(|r| r.score)
    }

    /// Returns the number of ranked alternatives.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if nothing was ranked.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Alternative scores resolved against a hierarchy's leaf indices.
#[derive(Debug, Clone)]
pub(crate) struct ScoreTable {
    alternatives: Vec<String>,
    leaves: Vec<(usize, Vec<f64>)>,
}

impl ScoreTable {
    /// Checks criterion and alternative ids and lays scores out per leaf.
    ///
    /// Scores recorded under non-leaf criteria do not contribute.
    pub(crate) fn resolve(
        hierarchy: &CriteriaHierarchy,
        scores: &AlternativeScores,
    ) -> Result<Self, AnalysisError> {
        let mut seen = HashSet::new();
        for alternative in &scores.alternatives {
            if !seen.insert(alternative.as_str()) {
                return Err(AnalysisError::invalid_priorities(format!(
                    "duplicate alternative '{}'",
                    alternative
                )));
            }
        }

        for (criterion_id, by_alternative) in &scores.scores {
            if hierarchy.index_of(criterion_id).is_none() {
                return Err(AnalysisError::invalid_hierarchy(
                    HierarchyDefect::UnknownCriterion(criterion_id.clone()),
                ));
            }
            for (alternative, score) in by_alternative {
                if !seen.contains(alternative.as_str()) {
                    return Err(AnalysisError::invalid_priorities(format!(
                        "score for unknown alternative '{}'",
                        alternative
                    )));
                }
                if !score.is_finite() {
                    return Err(AnalysisError::invalid_priorities(format!(
                        "score of '{}' under '{}' is not finite",
                        alternative, criterion_id
                    )));
                }
            }
        }

        let leaves = (0..hierarchy.len())
            .filter(|&i| hierarchy.is_leaf(i))
            .map(|i| {
                let by_alternative = scores.scores.get(&hierarchy.nodes()[i].id);
                let row = scores
                    .alternatives
                    .iter()
                    .map(|a| {
                        by_alternative
                            .and_then(|m| m.get(a))
                            .copied()
                            .unwrap_or(0.0)
                    })
                    .collect();
                (i, row)
            })
            .collect();

        Ok(Self {
            alternatives: scores.alternatives.clone(),
            leaves,
        })
    }

    /// `finalScore[alt] = Σ_leaf global[leaf] · score[leaf][alt]`
    pub(crate) fn rank(&self, global: &[f64]) -> Ranking {
        let mut totals = vec![0.0; self.alternatives.len()];
        for (leaf, row) in &self.leaves {
            let weight = global[*leaf];
            for (total, score) in totals.iter_mut().zip(row) {
                *total += weight * score;
            }
        }
        Ranking::from_scores(&self.alternatives, &totals)
    }
}

/// Builds criteria trees and combines leaf scores into a final ranking.
#[derive(Debug, Clone, Copy, Default)]
pub struct HierarchyAggregator {
    config: HierarchyConfig,
}

impl HierarchyAggregator {
    /// Creates an aggregator with the given limits.
    pub fn new(config: HierarchyConfig) -> Self {
        Self { config }
    }

    /// Validates the tree and computes every node's global weight.
    ///
    /// # Algorithm
    /// Breadth-first from the goal: top-level nodes get
    /// `global = local`, every other node `global = local · parent.global`.
    ///
    /// # Errors
    /// - `HierarchyTooDeep` if any node sits below `max_depth`
    /// - `InvalidHierarchy` for duplicate ids, unknown parents, cycles, declared
    ///   levels that disagree with the tree, and missing or unnormalized local
    ///   weights
    pub fn build(&self, input: &HierarchyInput) -> Result<CriteriaHierarchy, AnalysisError> {
        let n = input.nodes.len();
        if n == 0 {
            return Err(ValidationError::empty_field("nodes").into());
        }

        let mut index = HashMap::with_capacity(n);
        for (i, node) in input.nodes.iter().enumerate() {
            if node.id.is_empty() {
                return Err(ValidationError::empty_field("node.id").into());
            }
            if index.insert(node.id.clone(), i).is_some() {
                return Err(AnalysisError::invalid_hierarchy(HierarchyDefect::DuplicateNode(
                    node.id.clone(),
                )));
            }
        }

        let mut parents = Vec::with_capacity(n);
        for node in &input.nodes {
            let parent = match &node.parent_id {
                None => None,
                Some(parent_id) => Some(index.get(parent_id).copied().ok_or_else(|| {
                    AnalysisError::invalid_hierarchy(HierarchyDefect::UnknownParent {
                        node_id: node.id.clone(),
                        parent_id: parent_id.clone(),
                    })
                })?),
            };
            parents.push(parent);
        }

        let depths = Self::depths(&input.nodes, &parents)?;
        let deepest = depths.iter().copied().max().unwrap_or(0);
        if deepest > self.config.max_depth {
            return Err(AnalysisError::HierarchyTooDeep {
                depth: deepest,
                max_depth: self.config.max_depth,
            });
        }
        for (node, &depth) in input.nodes.iter().zip(&depths) {
            if node.level as usize != depth {
                return Err(AnalysisError::invalid_hierarchy(HierarchyDefect::LevelMismatch {
                    node_id: node.id.clone(),
                    declared: node.level,
                    actual: depth,
                }));
            }
        }

        for id in input.local_weights.keys() {
            if !index.contains_key(id) {
                return Err(AnalysisError::invalid_hierarchy(
                    HierarchyDefect::UnknownCriterion(id.clone()),
                ));
            }
        }

        let mut children = vec![Vec::new(); n];
        let mut top_level = Vec::new();
        for (i, parent) in parents.iter().enumerate() {
            match parent {
                Some(p) => children[*p].push(i),
                None => top_level.push(i),
            }
        }

        let mut local = vec![0.0; n];
        let groups = std::iter::once((None, &top_level)).chain(
            children
                .iter()
                .enumerate()
                .filter(|(_, group)| !group.is_empty())
                .map(|(p, group)| (Some(p), group)),
        );
        for (parent, group) in groups {
            self.resolve_group(input, group, &mut local)?;
            let total: f64 = group.iter().map(|&i| local[i]).sum();
            if (total - 1.0).abs() > self.config.weight_sum_tolerance {
                return Err(AnalysisError::invalid_hierarchy(
                    HierarchyDefect::SiblingWeightsNotNormalized {
                        parent_id: parent.map(|p: usize| input.nodes[p].id.clone()),
                    },
                ));
            }
        }

        let mut breadth_first = Vec::with_capacity(n);
        let mut queue: VecDeque<usize> = top_level.iter().copied().collect();
        while let Some(i) = queue.pop_front() {
            breadth_first.push(i);
            queue.extend(children[i].iter().copied());
        }

        let mut hierarchy = CriteriaHierarchy {
            nodes: input
                .nodes
                .iter()
                .zip(&local)
                .map(|(node, &local_weight)| CriterionNode {
                    id: node.id.clone(),
                    name: node.name.clone(),
                    parent_id: node.parent_id.clone(),
                    level: node.level,
                    local_weight,
                    global_weight: 0.0,
                })
                .collect(),
            parents,
            children,
            top_level,
            index,
            breadth_first,
        };

        let global = hierarchy.global_weights_for(&local);
        for (node, weight) in hierarchy.nodes.iter_mut().zip(global) {
            node.global_weight = weight;
        }

        Ok(hierarchy)
    }

    /// Combines per-leaf alternative scores into a ranking using the
    /// hierarchy's global weights.
    pub fn composite_scores(
        &self,
        hierarchy: &CriteriaHierarchy,
        scores: &AlternativeScores,
    ) -> Result<Ranking, AnalysisError> {
        let table = ScoreTable::resolve(hierarchy, scores)?;
        Ok(table.rank(&hierarchy.global_weights()))
    }

    fn depths(nodes: &[NodeInput], parents: &[Option<usize>]) -> Result<Vec<usize>, AnalysisError> {
        let n = nodes.len();
        let mut depths = Vec::with_capacity(n);
        for (i, node) in nodes.iter().enumerate() {
            let mut depth = 1;
            let mut current = i;
            while let Some(parent) = parents[current] {
                depth += 1;
                current = parent;
                if depth > n {
                    return Err(AnalysisError::invalid_hierarchy(HierarchyDefect::Cycle(
                        node.id.clone(),
                    )));
                }
            }
            depths.push(depth);
        }
        Ok(depths)
    }

    fn resolve_group(
        &self,
        input: &HierarchyInput,
        group: &[usize],
        local: &mut [f64],
    ) -> Result<(), AnalysisError> {
        let tolerance = self.config.weight_sum_tolerance;
        for &i in group {
            let id = &input.nodes[i].id;
            let weight = match input.local_weights.get(id) {
                Some(&w) => w,
                None if group.len() == 1 => 1.0,
                None => {
                    return Err(AnalysisError::invalid_hierarchy(
                        HierarchyDefect::MissingLocalWeight(id.clone()),
                    ))
                }
            };
            if !weight.is_finite() || weight < -tolerance || weight > 1.0 + tolerance {
                return Err(AnalysisError::invalid_hierarchy(
                    HierarchyDefect::InvalidLocalWeight(id.clone()),
                ));
            }
            local[i] = weight.clamp(0.0, 1.0);
        }
        Ok(())
    }
}
