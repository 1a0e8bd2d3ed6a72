//! Least-squares gradient boosting over shallow regression trees.
//!
//! Each tree is fit to the residuals of the running prediction on a seeded row
//! subsample, and its output is added scaled by the learning rate. Fitting is
//! deterministic for fixed data, parameters and seed.

use ndarray::{Array2, ArrayView1};
use rand::{rngs::StdRng, SeedableRng};

use crate::config::IndustrialConfig;
use crate::error::{StockError, StockResult};

/// Node in a regression tree.
#[derive(Debug, Clone, PartialEq)]
pub struct GbmNode {
    /// Feature index to split on (negative = leaf node).
    pub feature: i32,
    /// Samples with `feature value <= threshold` go left.
    pub threshold: f64,
    pub left_child: i32,
    pub right_child: i32,
    /// Mean residual of the samples reaching this node.
    pub value: f64,
}

impl GbmNode {
    fn leaf(value: f64) -> Self {
        Self { feature: -1, threshold: 0.0, left_child: -1, right_child: -1, value }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GbmTree {
    nodes: Vec<GbmNode>,
}

struct Split {
    feature: usize,
    threshold: f64,
    gain: f64,
}

impl GbmTree {
    /// Fit a depth-limited tree to `residuals` over the given rows.
    fn fit(x: &Array2<f64>, residuals: &[f64], rows: &[usize], max_depth: usize) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.grow(x, residuals, rows, 0, max_depth);
        tree
    }

    fn grow(&mut self, x: &Array2<f64>, residuals: &[f64], rows: &[usize], depth: usize, max_depth: usize) -> usize {
        let idx = self.nodes.len();
        let mean = rows.iter().map(|&i| residuals[i]).sum::<f64>() / rows.len().max(1) as f64;
        self.nodes.push(GbmNode::leaf(mean));
        if depth >= max_depth || rows.len() < 2 { return idx }

        let Some(split) = best_split(x, residuals, rows) else { return idx };
        let (left, right): (Vec<usize>, Vec<usize>) = rows.iter()
            .partition(|&&i| x[[i, split.feature]] <= split.threshold);
        let left_child = self.grow(x, residuals, &left, depth + 1, max_depth);
        let right_child = self.grow(x, residuals, &right, depth + 1, max_depth);
        self.nodes[idx] = GbmNode {
            feature: split.feature as i32,
            threshold: split.threshold,
            left_child: left_child as i32,
            right_child: right_child as i32,
            value: mean,
        };
        idx
    }

    pub fn predict(&self, features: ArrayView1<f64>) -> f64 {
        let mut idx = 0usize;
        loop {
            let Some(node) = self.nodes.get(idx) else { return 0.0 };
            if node.feature < 0 {
                return node.value;
            }
            let value = features.get(node.feature as usize).copied().unwrap_or(0.0);
            idx = if value <= node.threshold { node.left_child as usize } else { node.right_child as usize };
        }
    }

    #[inline] pub fn len(&self) -> usize { self.nodes.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.nodes.is_empty() }
}

/// Exhaustive search for the split that most reduces squared error.
/// Ties keep the lowest feature and threshold.
fn best_split(x: &Array2<f64>, residuals: &[f64], rows: &[usize]) -> Option<Split> {
    let n = rows.len() as f64;
    let total = rows.iter().map(|&i| residuals[i]).sum::<f64>();
    let base = total * total / n;

    let mut best: Option<Split> = None;
    let mut sorted = rows.to_vec();
    for feature in 0..x.ncols() {
        sorted.sort_by(|&a, &b| x[[a, feature]].total_cmp(&x[[b, feature]]).then(a.cmp(&b)));
        let mut left = 0.0;
        for k in 1..sorted.len() {
            left += residuals[sorted[k - 1]];
            let (lo, hi) = (x[[sorted[k - 1], feature]], x[[sorted[k], feature]]);
            if lo == hi { continue }
            let right = total - left;
            let gain = left * left / k as f64 + right * right / (n - k as f64) - base;
            if gain > 1e-12 && best.as_ref().map_or(true, |b| gain > b.gain) {
                best = Some(Split { feature, threshold: (lo + hi) / 2.0, gain });
            }
        }
    }
    best
}

/// Gradient-boosted regression ensemble.
#[derive(Debug, Clone, PartialEq)]
pub struct GbmRegressor {
    trees: Vec<GbmTree>,
    learning_rate: f64,
    initial_prediction: f64,
    n_features: usize,
}

impl GbmRegressor {
    pub fn fit(x: &Array2<f64>, y: &[f64], params: &IndustrialConfig) -> StockResult<Self> {
        if x.nrows() != y.len() {
            return Err(StockError::Data(format!("{} feature rows for {} targets", x.nrows(), y.len())));
        }
        if y.is_empty() {
            return Err(StockError::Data("cannot fit a regressor without training rows".into()));
        }
        if y.iter().any(|v| !v.is_finite()) {
            return Err(StockError::Data("training targets must be finite".into()));
        }

        let n = y.len();
        let initial_prediction = y.iter().sum::<f64>() / n as f64;
        let mut prediction = vec![initial_prediction; n];
        let mut rng = StdRng::seed_from_u64(params.seed);
        let sample_size = ((params.subsample * n as f64).floor() as usize).clamp(1, n);

        let mut trees = Vec::with_capacity(params.n_estimators);
        for _ in 0..params.n_estimators {
            let residuals = y.iter().zip(&prediction).map(|(t, p)| t - p).collect::<Vec<_>>();
            let rows = if sample_size == n {
                (0..n).collect::<Vec<_>>()
            } else {
                let mut rows = rand::seq::index::sample(&mut rng, n, sample_size).into_vec();
                rows.sort_unstable();
                rows
            };
            let tree = GbmTree::fit(x, &residuals, &rows, params.max_depth);
            for (i, p) in prediction.iter_mut().enumerate() {
                *p += params.learning_rate * tree.predict(x.row(i));
            }
            trees.push(tree);
        }

        Ok(Self { trees, learning_rate: params.learning_rate, initial_prediction, n_features: x.ncols() })
    }

    pub fn predict_one(&self, features: ArrayView1<f64>) -> f64 {
        self.initial_prediction
            + self.learning_rate * self.trees.iter().map(|t| t.predict(features)).sum::<f64>()
    }

    pub fn predict(&self, x: &Array2<f64>) -> StockResult<Vec<f64>> {
        if x.ncols() != self.n_features {
            return Err(StockError::Data(format!("expected {} features, got {}", self.n_features, x.ncols())));
        }
        Ok(x.rows().into_iter().map(|row| self.predict_one(row)).collect())
    }

    #[inline] pub fn n_trees(&self) -> usize { self.trees.len() }
}
