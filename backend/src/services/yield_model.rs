//! Gradient-boosted yield model
//!
//! Evaluates an XGBoost model saved with `Booster.save_model("*.json")`.
//! Only the regression objectives whose prediction is the raw margin are
//! accepted, since the service reports the model output as a yield directly.

use std::path::Path;

use pungde_shared::{feature_columns, FeatureVector, FEATURE_COUNT};
use serde::Deserialize;
use thiserror::Error;

const IDENTITY_OBJECTIVES: [&str; 6] = [
    "reg:squarederror",
    "reg:linear",
    "reg:absoluteerror",
    "reg:pseudohubererror",
    "reg:squaredlogerror",
    "reg:quantileerror",
];

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read model file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse model JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported booster '{0}', expected gbtree")]
    UnsupportedBooster(String),

    #[error("unsupported objective '{0}'")]
    UnsupportedObjective(String),

    #[error("invalid model parameter {name}: '{value}'")]
    InvalidParam { name: &'static str, value: String },

    #[error("model expects {actual} features, pipeline produces {expected}")]
    FeatureCount { expected: usize, actual: usize },

    #[error("model feature names do not match the trained column order")]
    FeatureNames,

    #[error("tree {tree} is invalid: {reason}")]
    InvalidTree { tree: usize, reason: String },
}

#[derive(Debug, Deserialize)]
struct ModelFile {
    learner: LearnerJson,
}

#[derive(Debug, Deserialize)]
struct LearnerJson {
    #[serde(default)]
    feature_names: Vec<String>,
    gradient_booster: BoosterJson,
    learner_model_param: LearnerParamJson,
    objective: ObjectiveJson,
}

#[derive(Debug, Deserialize)]
struct BoosterJson {
    name: String,
    model: Option<GbTreeJson>,
}

#[derive(Debug, Deserialize)]
struct GbTreeJson {
    trees: Vec<TreeJson>,
}

#[derive(Debug, Deserialize)]
struct LearnerParamJson {
    base_score: String,
    num_feature: String,
    #[serde(default)]
    num_target: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ObjectiveJson {
    name: String,
}

#[derive(Debug, Deserialize)]
struct TreeJson {
    left_children: Vec<i32>,
    right_children: Vec<i32>,
    split_indices: Vec<i64>,
    split_conditions: Vec<f32>,
    default_left: Vec<Flag>,
    #[serde(default)]
    split_type: Vec<u8>,
}

/// Older releases write `default_left` as 0/1, newer ones as booleans
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Int(u8),
}

impl Flag {
    fn is_set(self) -> bool {
        match self {
            Flag::Bool(b) => b,
            Flag::Int(i) => i != 0,
        }
    }
}

#[derive(Debug, Clone)]
struct Node {
    left: i32,
    right: i32,
    feature: usize,
    /// Split threshold for internal nodes, leaf value for leaves
    value: f32,
    default_left: bool,
}

#[derive(Debug, Clone)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn from_json(index: usize, json: TreeJson, num_feature: usize) -> Result<Self, ModelError> {
        let invalid = |reason: String| ModelError::InvalidTree {
            tree: index,
            reason,
        };

        let n = json.left_children.len();
        if n == 0 {
            return Err(invalid("tree has no nodes".into()));
        }
        let lengths = [
            json.right_children.len(),
            json.split_indices.len(),
            json.split_conditions.len(),
            json.default_left.len(),
        ];
        if lengths.iter().any(|len| *len != n) {
            return Err(invalid(format!("node arrays have mismatched lengths {:?}", lengths)));
        }
        if json.split_type.iter().any(|t| *t != 0) {
            return Err(invalid("categorical splits are not supported".into()));
        }

        let mut nodes = Vec::with_capacity(n);
        for i in 0..n {
            let (left, right) = (json.left_children[i], json.right_children[i]);
            let is_leaf = left == -1;
            if is_leaf != (right == -1) {
                return Err(invalid(format!("node {} has exactly one child", i)));
            }

            let mut feature = 0;
            if !is_leaf {
                // Children always follow their parent, which rules out cycles
                for child in [left, right] {
                    if child as usize <= i || child as usize >= n || child < 0 {
                        return Err(invalid(format!("node {} has child {} out of order", i, child)));
                    }
                }
                let split = json.split_indices[i];
                if split < 0 || split as usize >= num_feature {
                    return Err(invalid(format!("node {} splits on feature {}", i, split)));
                }
                feature = split as usize;
            }

            nodes.push(Node {
                left,
                right,
                feature,
                value: json.split_conditions[i],
                default_left: json.default_left[i].is_set(),
            });
        }

        Ok(Self { nodes })
    }

    fn leaf_value(&self, features: &[f32]) -> f32 {
        let mut index = 0;
        loop {
            let node = &self.nodes[index];
            if node.left == -1 {
                return node.value;
            }
            let x = features[node.feature];
            let go_left = if x.is_nan() {
                node.default_left
            } else {
                x < node.value
            };
            index = if go_left { node.left } else { node.right } as usize;
        }
    }
}

/// Pre-trained gradient-boosted regression trees
///
/// Immutable after loading; prediction takes `&self` and can be shared
/// across requests without locking.
#[derive(Debug, Clone)]
pub struct YieldModel {
    base_score: f32,
    num_feature: usize,
    objective: String,
    trees: Vec<Tree>,
}

impl YieldModel {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let bytes = std::fs::read(path)?;
        Self::from_slice(&bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, ModelError> {
        let file: ModelFile = serde_json::from_slice(bytes)?;
        Self::from_learner(file.learner)
    }

    fn from_learner(learner: LearnerJson) -> Result<Self, ModelError> {
        let objective = learner.objective.name;
        if !IDENTITY_OBJECTIVES.contains(&objective.as_str()) {
            return Err(ModelError::UnsupportedObjective(objective));
        }

        let params = learner.learner_model_param;
        let num_feature = parse_param("num_feature", &params.num_feature)?;
        if num_feature != FEATURE_COUNT {
            return Err(ModelError::FeatureCount {
                expected: FEATURE_COUNT,
                actual: num_feature,
            });
        }
        if let Some(targets) = params.num_target.as_deref() {
            if parse_param("num_target", targets)? > 1 {
                return Err(ModelError::InvalidParam {
                    name: "num_target",
                    value: targets.to_string(),
                });
            }
        }
        let base_score = parse_base_score(&params.base_score)?;

        if !learner.feature_names.is_empty()
            && learner.feature_names.iter().map(String::as_str).ne(feature_columns())
        {
            return Err(ModelError::FeatureNames);
        }

        let booster = learner.gradient_booster;
        let model = match (booster.name.as_str(), booster.model) {
            ("gbtree", Some(model)) => model,
            (name, _) => return Err(ModelError::UnsupportedBooster(name.to_string())),
        };

        let trees = model
            .trees
            .into_iter()
            .enumerate()
            .map(|(i, tree)| Tree::from_json(i, tree, num_feature))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            base_score,
            num_feature,
            objective,
            trees,
        })
    }

    /// Predict one row.
    ///
    /// Inputs are narrowed to `f32` and summed in `f32`, as XGBoost does.
    ///
    /// # Panics
    ///
    /// Panics if the vector width differs from the model's feature count.
    pub fn predict(&self, features: &FeatureVector) -> f64 {
        assert_eq!(
            features.len(),
            self.num_feature,
            "feature vector width does not match model"
        );

        let row: Vec<f32> = features.as_slice().iter().map(|v| *v as f32).collect();
        let margin = self
            .trees
            .iter()
            .fold(self.base_score, |acc, tree| acc + tree.leaf_value(&row));
        f64::from(margin)
    }

    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn num_features(&self) -> usize {
        self.num_feature
    }

    pub fn objective(&self) -> &str {
        &self.objective
    }
}

fn parse_param(name: &'static str, value: &str) -> Result<usize, ModelError> {
    value.trim().parse().map_err(|_| ModelError::InvalidParam {
        name,
        value: value.to_string(),
    })
}

/// `base_score` is written as `"5E-1"` or, in newer releases, `"[5E-1]"`
fn parse_base_score(value: &str) -> Result<f32, ModelError> {
    value
        .trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .trim()
        .parse::<f32>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ModelError::InvalidParam {
            name: "base_score",
            value: value.to_string(),
        })
}
