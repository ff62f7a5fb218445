//! Model artifact types: a boosted ensemble of regression trees.
//!
//! Trees are stored as flat node lists rooted at index 0. A split sends a row
//! left when `x[feature] < threshold`. Leaf values already include the
//! learning rate, so a prediction is `base_score + Σ leaf`.

use serde::{Deserialize, Serialize};

use crate::inference::domain::{Feature, FeatureVector, N_FEATURES};

pub const FORMAT_VERSION: u32 = 1;

/// One tree node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

impl Node {
    pub fn leaf(value: f64) -> Self {
        Node::Leaf { value }
    }

    pub fn split(feature: Feature, threshold: f64, left: usize, right: usize) -> Self {
        Node::Split {
            feature: feature.index(),
            threshold,
            left,
            right,
        }
    }
}

/// A single regression tree.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Walk from the root to a leaf.
    ///
    /// Assumes a checked tree (see [`GbdtModel::check`]); a malformed node
    /// index ends the walk with `NaN` instead of panicking.
    pub fn score(&self, x: &[f64; N_FEATURES]) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes.get(idx) {
                Some(Node::Leaf { value }) => return *value,
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let v = x.get(*feature).copied().unwrap_or(f64::NAN);
                    // Children always sit after their parent, so this terminates.
                    let next = if v < *threshold { *left } else { *right };
                    if next <= idx {
                        return f64::NAN;
                    }
                    idx = next;
                }
                None => return f64::NAN,
            }
        }
    }

    #[cfg(test)]
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match nodes.get(idx) {
                Some(Node::Split { left, right, .. }) if *left > idx && *right > idx => {
                    1 + walk(nodes, *left).max(walk(nodes, *right))
                }
                _ => 0,
            }
        }
        walk(&self.nodes, 0)
    }
}

/// Trained, immutable model artifact.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GbdtModel {
    pub format_version: u32,
    /// Column names in the order the trees index them.
    pub feature_names: Vec<String>,
    pub base_score: f64,
    pub trees: Vec<Tree>,
}

impl GbdtModel {
    pub fn new(base_score: f64, trees: Vec<Tree>) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            feature_names: Feature::names().iter().map(|s| s.to_string()).collect(),
            base_score,
            trees,
        }
    }

    /// Score exactly one row.
    pub fn predict(&self, features: &FeatureVector) -> f64 {
        let x = features.to_array();
        self.base_score + self.trees.iter().map(|t| t.score(&x)).sum::<f64>()
    }

    /// Structural checks applied to anything read from disk.
    pub fn check(&self) -> Result<(), String> {
        if self.format_version != FORMAT_VERSION {
            return Err(format!(
                "unsupported format_version {} (expected {FORMAT_VERSION})",
                self.format_version
            ));
        }
        let expected = Feature::names();
        if self.feature_names.len() != expected.len()
            || self.feature_names.iter().zip(expected).any(|(a, b)| a != b)
        {
            return Err(format!(
                "feature_names {:?} do not match model columns {:?}",
                self.feature_names, expected
            ));
        }
        if !self.base_score.is_finite() {
            return Err("base_score is not finite".to_string());
        }
        for (t, tree) in self.trees.iter().enumerate() {
            if tree.nodes.is_empty() {
                return Err(format!("tree {t} has no nodes"));
            }
            for (idx, node) in tree.nodes.iter().enumerate() {
                match node {
                    Node::Leaf { value } if !value.is_finite() => {
                        return Err(format!("tree {t} node {idx}: leaf value is not finite"));
                    }
                    Node::Leaf { .. } => {}
                    Node::Split {
                        feature,
                        threshold,
                        left,
                        right,
                    } => {
                        if *feature >= N_FEATURES {
                            return Err(format!(
                                "tree {t} node {idx}: feature {feature} out of range"
                            ));
                        }
                        if !threshold.is_finite() {
                            return Err(format!("tree {t} node {idx}: threshold is not finite"));
                        }
                        for child in [*left, *right] {
                            if child <= idx || child >= tree.nodes.len() {
                                return Err(format!("tree {t} node {idx}: bad child index {child}"));
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

/// Hyper-parameters for [`crate::training::gbdt::train`].
#[derive(Clone, Debug, PartialEq)]
pub struct TrainParams {
    pub max_depth: usize,
    pub learning_rate: f64,
    pub n_rounds: usize,
    /// L2 regularisation on leaf weights.
    pub lambda: f64,
    pub min_child_weight: f64,
    pub base_score: f64,
}

impl Default for TrainParams {
    fn default() -> Self {
        Self {
            max_depth: 3,
            learning_rate: 0.1,
            n_rounds: 10,
            lambda: 1.0,
            min_child_weight: 1.0,
            base_score: 0.5,
        }
    }
}

/// Where the served model came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModelOrigin {
    Loaded(std::path::PathBuf),
    Bootstrapped { seed: u64 },
    /// Handed to the cell directly, e.g. by tests.
    Injected,
}

/// A model plus the provenance the lifecycle manager hands out.
#[derive(Debug)]
pub struct LoadedModel {
    pub model: GbdtModel,
    pub origin: ModelOrigin,
    /// 64-bit FNV-1a of the artifact bytes, hex encoded.
    pub fingerprint: String,
}
