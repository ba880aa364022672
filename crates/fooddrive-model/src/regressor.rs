//! Regressor stage: positional feature vector → target estimate.
//!
//! Trees use the flat node-array layout common to exported tree ensembles:
//! split nodes point at child indices, and a sample goes left when
//! `x[feature] <= threshold`. Children always sit after their parent, which
//! bounds every walk by the node count.

use fooddrive_core::PredictionError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
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

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<TreeNode>,
}

impl Tree {
    fn validate(&self, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".into());
        }
        for (i, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= n_features {
                        return Err(format!(
                            "node {i} splits on feature {feature}, input has {n_features}"
                        ));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("node {i} has non-finite threshold"));
                    }
                    for child in [left, right] {
                        if *child <= i || *child >= self.nodes.len() {
                            return Err(format!("node {i} has invalid child {child}"));
                        }
                    }
                }
                TreeNode::Leaf { value } => {
                    if !value.is_finite() {
                        return Err(format!("leaf {i} has non-finite value"));
                    }
                }
            }
        }
        Ok(())
    }

    fn evaluate(&self, x: &[f64]) -> Result<f64, PredictionError> {
        let mut idx = 0;
        for _ in 0..self.nodes.len() {
            match self.nodes.get(idx) {
                Some(TreeNode::Leaf { value }) => return Ok(*value),
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let v = x.get(*feature).ok_or_else(|| {
                        PredictionError::Unexpected(format!(
                            "tree split on feature {feature} beyond input width {}",
                            x.len()
                        ))
                    })?;
                    idx = if *v <= *threshold { *left } else { *right };
                }
                None => {
                    return Err(PredictionError::Unexpected(format!(
                        "tree node {idx} out of range"
                    )));
                }
            }
        }
        Err(PredictionError::Unexpected(
            "tree walk did not reach a leaf".into(),
        ))
    }
}

/// Fitted regressor over a positional feature vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Regressor {
    Linear {
        coefficients: Vec<f64>,
        intercept: f64,
    },
    /// Mean of the trees' outputs.
    RandomForest { trees: Vec<Tree> },
    /// `init + learning_rate * Σ tree(x)`.
    GradientBoosting {
        init: f64,
        learning_rate: f64,
        trees: Vec<Tree>,
    },
}

impl Regressor {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Linear { .. } => "linear",
            Self::RandomForest { .. } => "random_forest",
            Self::GradientBoosting { .. } => "gradient_boosting",
        }
    }

    /// Check the fitted parameters against the width of the vector it will be fed.
    pub fn validate(&self, n_features: usize) -> Result<(), String> {
        match self {
            Self::Linear {
                coefficients,
                intercept,
            } => {
                if coefficients.len() != n_features {
                    return Err(format!(
                        "linear model has {} coefficients, input has {n_features} features",
                        coefficients.len()
                    ));
                }
                if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
                    return Err("linear model has non-finite parameters".into());
                }
            }
            Self::RandomForest { trees } => {
                if trees.is_empty() {
                    return Err("random forest has no trees".into());
                }
                for (i, tree) in trees.iter().enumerate() {
                    tree.validate(n_features).map_err(|e| format!("tree {i}: {e}"))?;
                }
            }
            Self::GradientBoosting {
                init,
                learning_rate,
                trees,
            } => {
                if !init.is_finite() || !learning_rate.is_finite() {
                    return Err("gradient boosting has non-finite parameters".into());
                }
                for (i, tree) in trees.iter().enumerate() {
                    tree.validate(n_features).map_err(|e| format!("tree {i}: {e}"))?;
                }
            }
        }
        Ok(())
    }

    /// Predict for one sample. Returns one value per target.
    pub fn predict(&self, x: &[f64]) -> Result<Vec<f64>, PredictionError> {
        match self {
            Self::Linear {
                coefficients,
                intercept,
            } => {
                if coefficients.len() != x.len() {
                    return Err(PredictionError::schema_mismatch(
                        None,
                        format!(
                            "input has {} features, model expects {}",
                            x.len(),
                            coefficients.len()
                        ),
                    ));
                }
                let dot: f64 = coefficients.iter().zip(x).map(|(c, v)| c * v).sum();
                Ok(vec![dot + intercept])
            }
            Self::RandomForest { trees } => {
                if trees.is_empty() {
                    return Ok(Vec::new());
                }
                let mut sum = 0.0;
                for tree in trees {
                    sum += tree.evaluate(x)?;
                }
                Ok(vec![sum / trees.len() as f64])
            }
            Self::GradientBoosting {
                init,
                learning_rate,
                trees,
            } => {
                let mut sum = 0.0;
                for tree in trees {
                    sum += tree.evaluate(x)?;
                }
                Ok(vec![init + learning_rate * sum])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(value: f64) -> TreeNode {
        TreeNode::Leaf { value }
    }

    fn split(feature: usize, threshold: f64, left: usize, right: usize) -> TreeNode {
        TreeNode::Split {
            feature,
            threshold,
            left,
            right,
        }
    }

    /// x[0] <= 0.5 → 10, else (x[1] <= 100 → 20, else 30).
    fn stump_tree() -> Tree {
        Tree {
            nodes: vec![
                split(0, 0.5, 1, 2),
                leaf(10.0),
                split(1, 100.0, 3, 4),
                leaf(20.0),
                leaf(30.0),
            ],
        }
    }

    #[test]
    fn linear_dot_product() {
        let r = Regressor::Linear {
            coefficients: vec![2.0, -1.0, 0.5],
            intercept: 3.0,
        };
        assert_eq!(r.predict(&[1.0, 4.0, 10.0]).unwrap(), vec![6.0]);
    }

    #[test]
    fn linear_width_mismatch() {
        let r = Regressor::Linear {
            coefficients: vec![1.0, 1.0],
            intercept: 0.0,
        };
        assert!(matches!(
            r.predict(&[1.0]),
            Err(PredictionError::SchemaMismatch { .. })
        ));
        assert!(r.validate(3).is_err());
        assert!(r.validate(2).is_ok());
    }

    #[test]
    fn tree_walk_left_on_equal() {
        let tree = stump_tree();
        assert_eq!(tree.evaluate(&[0.5, 0.0]).unwrap(), 10.0);
        assert_eq!(tree.evaluate(&[1.0, 100.0]).unwrap(), 20.0);
        assert_eq!(tree.evaluate(&[1.0, 101.0]).unwrap(), 30.0);
    }

    #[test]
    fn forest_averages_trees() {
        let r = Regressor::RandomForest {
            trees: vec![stump_tree(), Tree { nodes: vec![leaf(40.0)] }],
        };
        assert_eq!(r.predict(&[0.0, 0.0]).unwrap(), vec![25.0]);
    }

    #[test]
    fn boosting_sums_scaled_trees() {
        let r = Regressor::GradientBoosting {
            init: 5.0,
            learning_rate: 0.1,
            trees: vec![stump_tree(), stump_tree()],
        };
        let y = r.predict(&[1.0, 500.0]).unwrap();
        assert!((y[0] - 11.0).abs() < 1e-9);
    }

    #[test]
    fn validate_rejects_backward_child() {
        let tree = Tree {
            nodes: vec![split(0, 1.0, 1, 0), leaf(1.0)],
        };
        let err = tree.validate(1).unwrap_err();
        assert!(err.contains("invalid child"));
    }

    #[test]
    fn validate_rejects_feature_out_of_range() {
        let r = Regressor::RandomForest {
            trees: vec![stump_tree()],
        };
        assert!(r.validate(1).is_err());
        assert!(r.validate(2).is_ok());
    }

    #[test]
    fn validate_rejects_empty_forest() {
        let r = Regressor::RandomForest { trees: vec![] };
        assert!(r.validate(3).is_err());
    }

    #[test]
    fn unvalidated_bad_tree_is_unexpected_error() {
        let tree = Tree {
            nodes: vec![split(0, 1.0, 7, 8)],
        };
        assert!(matches!(
            tree.evaluate(&[0.0]),
            Err(PredictionError::Unexpected(_))
        ));
    }

    #[test]
    fn node_json_shapes() {
        let json = r#"{"kind": "random_forest", "trees": [{"nodes": [
            {"feature": 0, "threshold": 2.5, "left": 1, "right": 2},
            {"value": 1.0},
            {"value": 2.0}
        ]}]}"#;
        let r: Regressor = serde_json::from_str(json).unwrap();
        assert_eq!(r.kind(), "random_forest");
        assert_eq!(r.predict(&[3.0]).unwrap(), vec![2.0]);
    }
}
