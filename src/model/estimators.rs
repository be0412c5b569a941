//! Estimators - the classifier families the offline trainer selects from
//!
//! Each variant mirrors the fitted state of its training-side counterpart:
//! - `gaussian_nb`: per-class priors, means and variances
//! - `k_neighbors`: the stored training points and their class indices
//! - `decision_tree`: a flattened CART tree
//! - `linear_svc`: one-vs-rest weights, no probability estimates

use serde::{Deserialize, Serialize};

use super::classifier::{argmax, ModelError};

/// A node of a flattened decision tree
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    /// Go `left` when `x[feature] <= threshold`, else `right`
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Per-class sample weight reaching this leaf
    Leaf { value: Vec<f64> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Estimator {
    GaussianNb {
        class_prior: Vec<f64>,
        theta: Vec<Vec<f64>>,
        var: Vec<Vec<f64>>,
    },
    KNeighbors {
        n_neighbors: usize,
        points: Vec<Vec<f64>>,
        labels: Vec<usize>,
    },
    DecisionTree {
        n_features: usize,
        nodes: Vec<TreeNode>,
    },
    LinearSvc {
        coef: Vec<Vec<f64>>,
        intercept: Vec<f64>,
    },
}

fn invalid(msg: impl Into<String>) -> ModelError {
    ModelError::Invalid(msg.into())
}

fn check_rows(name: &str, rows: &[Vec<f64>], width: usize) -> Result<(), ModelError> {
    for (i, row) in rows.iter().enumerate() {
        if row.len() != width {
            return Err(invalid(format!(
                "{}[{}] has {} columns, expected {}",
                name,
                i,
                row.len(),
                width
            )));
        }
        if row.iter().any(|v| !v.is_finite()) {
            return Err(invalid(format!("{}[{}] contains a non-finite value", name, i)));
        }
    }
    Ok(())
}

fn dot(weights: &[f64], x: &[f64]) -> f64 {
    weights.iter().zip(x).map(|(w, v)| w * v).sum()
}

impl Estimator {
    pub fn n_features(&self) -> usize {
        match self {
            Estimator::GaussianNb { theta, .. } => theta.first().map_or(0, Vec::len),
            Estimator::KNeighbors { points, .. } => points.first().map_or(0, Vec::len),
            Estimator::DecisionTree { n_features, .. } => *n_features,
            Estimator::LinearSvc { coef, .. } => coef.first().map_or(0, Vec::len),
        }
    }

    pub fn supports_proba(&self) -> bool {
        !matches!(self, Estimator::LinearSvc { .. })
    }

    /// Structural checks against the pipeline's class count
    pub fn validate(&self, n_classes: usize) -> Result<(), ModelError> {
        let width = self.n_features();
        if width == 0 {
            return Err(invalid("estimator has no features"));
        }

        match self {
            Estimator::GaussianNb { class_prior, theta, var } => {
                if class_prior.len() != n_classes
                    || theta.len() != n_classes
                    || var.len() != n_classes
                {
                    return Err(invalid(format!(
                        "gaussian_nb needs {} priors, means and variances",
                        n_classes
                    )));
                }
                if class_prior.iter().any(|p| !p.is_finite() || *p <= 0.0) {
                    return Err(invalid("gaussian_nb priors must be positive"));
                }
                check_rows("theta", theta, width)?;
                check_rows("var", var, width)?;
                if var.iter().flatten().any(|v| *v <= 0.0) {
                    return Err(invalid("gaussian_nb variances must be positive"));
                }
            }
            Estimator::KNeighbors { n_neighbors, points, labels } => {
                if labels.len() != points.len() {
                    return Err(invalid(format!(
                        "k_neighbors has {} points but {} labels",
                        points.len(),
                        labels.len()
                    )));
                }
                if *n_neighbors == 0 || *n_neighbors > points.len() {
                    return Err(invalid(format!(
                        "n_neighbors must be in 1..={}, got {}",
                        points.len(),
                        n_neighbors
                    )));
                }
                check_rows("points", points, width)?;
                if let Some(bad) = labels.iter().find(|l| **l >= n_classes) {
                    return Err(invalid(format!("label {} out of range", bad)));
                }
            }
            Estimator::DecisionTree { n_features, nodes } => {
                if nodes.is_empty() {
                    return Err(invalid("decision_tree has no nodes"));
                }
                for (idx, node) in nodes.iter().enumerate() {
                    match node {
                        TreeNode::Split { feature, threshold, left, right } => {
                            if feature >= n_features {
                                return Err(invalid(format!(
                                    "node {} splits on feature {}",
                                    idx, feature
                                )));
                            }
                            if !threshold.is_finite() {
                                return Err(invalid(format!(
                                    "node {} has a non-finite threshold",
                                    idx
                                )));
                            }
                            // forward-only children rule out cycles
                            for child in [left, right] {
                                if *child <= idx || *child >= nodes.len() {
                                    return Err(invalid(format!(
                                        "node {} has bad child {}",
                                        idx, child
                                    )));
                                }
                            }
                        }
                        TreeNode::Leaf { value } => {
                            if value.len() != n_classes {
                                return Err(invalid(format!(
                                    "leaf {} has {} values, expected {}",
                                    idx,
                                    value.len(),
                                    n_classes
                                )));
                            }
                            if value.iter().any(|v| !v.is_finite() || *v < 0.0)
                                || value.iter().sum::<f64>() <= 0.0
                            {
                                return Err(invalid(format!("leaf {} has no usable weight", idx)));
                            }
                        }
                    }
                }
            }
            Estimator::LinearSvc { coef, intercept } => {
                let binary = n_classes == 2 && coef.len() == 1;
                if !binary && coef.len() != n_classes {
                    return Err(invalid(format!(
                        "linear_svc needs {} coefficient rows, got {}",
                        n_classes,
                        coef.len()
                    )));
                }
                if intercept.len() != coef.len() {
                    return Err(invalid("linear_svc intercept length mismatch"));
                }
                check_rows("coef", coef, width)?;
            }
        }

        Ok(())
    }

    pub fn predict_index(&self, x: &[f64], n_classes: usize) -> Result<usize, ModelError> {
        let idx = match self {
            Estimator::GaussianNb { .. } => argmax(&self.joint_log_likelihood(x)),
            Estimator::KNeighbors { .. } => argmax(&self.neighbour_votes(x, n_classes)),
            Estimator::DecisionTree { .. } => argmax(self.leaf(x)?),
            Estimator::LinearSvc { coef, intercept } => {
                let scores: Vec<f64> = coef
                    .iter()
                    .zip(intercept)
                    .map(|(w, b)| dot(w, x) + b)
                    .collect();
                if scores.len() == 1 {
                    Some(usize::from(scores[0] > 0.0))
                } else {
                    argmax(&scores)
                }
            }
        };

        idx.ok_or_else(|| invalid("estimator produced no scores"))
    }

    pub fn predict_proba(&self, x: &[f64], n_classes: usize) -> Result<Vec<f64>, ModelError> {
        match self {
            Estimator::GaussianNb { .. } => {
                let jll = self.joint_log_likelihood(x);
                let max = jll.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                if !max.is_finite() {
                    return Err(invalid("joint log-likelihood is not finite for any class"));
                }
                let log_norm = max + jll.iter().map(|v| (v - max).exp()).sum::<f64>().ln();
                let proba: Vec<f64> = jll.iter().map(|v| (v - log_norm).exp()).collect();
                if proba.iter().any(|p| !p.is_finite()) {
                    return Err(invalid("probability estimate is not finite"));
                }
                Ok(proba)
            }
            Estimator::KNeighbors { n_neighbors, .. } => {
                let k = *n_neighbors as f64;
                Ok(self
                    .neighbour_votes(x, n_classes)
                    .into_iter()
                    .map(|votes| votes / k)
                    .collect())
            }
            Estimator::DecisionTree { .. } => {
                let value = self.leaf(x)?;
                let total: f64 = value.iter().sum();
                if total <= 0.0 {
                    return Err(invalid("leaf has no weight"));
                }
                Ok(value.iter().map(|v| v / total).collect())
            }
            Estimator::LinearSvc { .. } => Err(ModelError::ProbabilityUnsupported),
        }
    }

    fn joint_log_likelihood(&self, x: &[f64]) -> Vec<f64> {
        let Estimator::GaussianNb { class_prior, theta, var } = self else {
            return Vec::new();
        };

        class_prior
            .iter()
            .zip(theta.iter().zip(var))
            .map(|(prior, (means, variances))| {
                let mut jll = prior.ln();
                for ((xi, mean), variance) in x.iter().zip(means).zip(variances) {
                    jll -= 0.5 * (2.0 * std::f64::consts::PI * variance).ln();
                    jll -= 0.5 * (xi - mean).powi(2) / variance;
                }
                jll
            })
            .collect()
    }

    fn neighbour_votes(&self, x: &[f64], n_classes: usize) -> Vec<f64> {
        let Estimator::KNeighbors { n_neighbors, points, labels } = self else {
            return Vec::new();
        };

        let mut distances: Vec<(usize, f64)> = points
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let d2: f64 = p.iter().zip(x).map(|(a, b)| (a - b).powi(2)).sum();
                (i, d2)
            })
            .collect();
        // stable: equal distances keep training order
        distances.sort_by(|a, b| a.1.total_cmp(&b.1));

        let mut votes = vec![0.0; n_classes];
        for (i, _) in distances.iter().take(*n_neighbors) {
            if let Some(slot) = votes.get_mut(labels[*i]) {
                *slot += 1.0;
            }
        }
        votes
    }

    fn leaf(&self, x: &[f64]) -> Result<&[f64], ModelError> {
        let Estimator::DecisionTree { nodes, .. } = self else {
            return Err(invalid("not a decision tree"));
        };

        let mut idx = 0;
        for _ in 0..nodes.len() {
            match nodes.get(idx) {
                Some(TreeNode::Split { feature, threshold, left, right }) => {
                    let value = x
                        .get(*feature)
                        .ok_or_else(|| invalid(format!("feature {} missing from row", feature)))?;
                    idx = if *value <= *threshold { *left } else { *right };
                }
                Some(TreeNode::Leaf { value }) => return Ok(value.as_slice()),
                None => return Err(invalid(format!("node {} does not exist", idx))),
            }
        }

        Err(invalid("decision tree walk did not reach a leaf"))
    }
}
