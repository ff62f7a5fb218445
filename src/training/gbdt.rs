//! Exact-greedy gradient boosting for squared-error regression.
//!
//! With squared error every row has gradient `pred - y` and hessian `1`, so
//! a node's statistics are just the gradient sum and the row count.

use tracing::debug;

use crate::common::error::{PrepError, PrepResult};
use crate::inference::domain::{Feature, FeatureVector};

use super::domain::{GbdtModel, Node, TrainParams, Tree};

/// Fit a boosted ensemble. Deterministic for identical inputs.
pub fn train(
    rows: &[FeatureVector],
    labels: &[f64],
    params: &TrainParams,
) -> PrepResult<GbdtModel> {
    if rows.is_empty() {
        return Err(PrepError::config("training set is empty"));
    }
    if rows.len() != labels.len() {
        return Err(PrepError::config(format!(
            "{} rows but {} labels",
            rows.len(),
            labels.len()
        )));
    }
    if !labels.iter().all(|y| y.is_finite()) || !rows.iter().all(FeatureVector::is_finite) {
        return Err(PrepError::config("training data contains non-finite values"));
    }

    let mut preds = vec![params.base_score; rows.len()];
    let mut trees = Vec::with_capacity(params.n_rounds);

    for round in 0..params.n_rounds {
        let grads: Vec<f64> = preds.iter().zip(labels).map(|(p, y)| p - y).collect();
        let mut builder = TreeBuilder {
            rows,
            grads: &grads,
            params,
            nodes: Vec::new(),
        };
        let all: Vec<usize> = (0..rows.len()).collect();
        builder.grow(&all, 0);
        let tree = Tree::new(builder.nodes);

        for (pred, row) in preds.iter_mut().zip(rows) {
            *pred += tree.score(&row.to_array());
        }
        debug!(round, nodes = tree.nodes.len(), "boosting round finished");
        trees.push(tree);
    }

    Ok(GbdtModel::new(params.base_score, trees))
}

struct TreeBuilder<'a> {
    rows: &'a [FeatureVector],
    grads: &'a [f64],
    params: &'a TrainParams,
    nodes: Vec<Node>,
}

struct Candidate {
    gain: f64,
    feature: Feature,
    threshold: f64,
}

impl TreeBuilder<'_> {
    /// Append the subtree for `idx` in pre-order and return its root index.
    fn grow(&mut self, idx: &[usize], depth: usize) -> usize {
        let at = self.nodes.len();
        let g: f64 = idx.iter().map(|&i| self.grads[i]).sum();
        let h = idx.len() as f64;

        let split = if depth < self.params.max_depth {
            self.best_split(idx, g, h)
        } else {
            None
        };

        let Some(split) = split else {
            let weight = -g / (h + self.params.lambda) * self.params.learning_rate;
            self.nodes.push(Node::leaf(weight));
            return at;
        };

        // Placeholder until both children have been placed.
        self.nodes.push(Node::leaf(0.0));
        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = idx
            .iter()
            .copied()
            .partition(|&i| self.rows[i].get(split.feature) < split.threshold);
        let left = self.grow(&left_rows, depth + 1);
        let right = self.grow(&right_rows, depth + 1);
        self.nodes[at] = Node::split(split.feature, split.threshold, left, right);
        at
    }

    fn best_split(&self, idx: &[usize], g: f64, h: f64) -> Option<Candidate> {
        let lambda = self.params.lambda;
        let min_child = self.params.min_child_weight;
        let parent = g * g / (h + lambda);
        let mut best: Option<Candidate> = None;

        for feature in Feature::ALL {
            let mut order = idx.to_vec();
            order.sort_by(|&a, &b| {
                self.rows[a]
                    .get(feature)
                    .total_cmp(&self.rows[b].get(feature))
                    .then(a.cmp(&b))
            });

            let mut gl = 0.0;
            for pos in 0..order.len().saturating_sub(1) {
                gl += self.grads[order[pos]];
                let x = self.rows[order[pos]].get(feature);
                let next = self.rows[order[pos + 1]].get(feature);
                if x == next {
                    continue;
                }
                let hl = (pos + 1) as f64;
                let hr = h - hl;
                if hl < min_child || hr < min_child {
                    continue;
                }
                let gr = g - gl;
                let gain = 0.5 * (gl * gl / (hl + lambda) + gr * gr / (hr + lambda) - parent);
                if gain > 0.0 && best.as_ref().map_or(true, |b| gain > b.gain) {
                    best = Some(Candidate {
                        gain,
                        feature,
                        threshold: x + (next - x) / 2.0,
                    });
                }
            }
        }
        best
    }
}
