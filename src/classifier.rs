//! Classifier collaborator.
//!
//! The service treats classification as an opaque call: four measurements in,
//! a class id and label out. The built-in model is a pre-trained
//! nearest-centroid classifier over the three iris classes; swapping in a
//! different model only requires another [`Classifier`] implementation.

use serde::Serialize;
use utoipa::ToSchema;

/// Number of input measurements per sample.
pub const FEATURE_COUNT: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Classification {
    pub class_id: i64,
    pub label: String,
}

pub trait Classifier: Send + Sync {
    fn classify(&self, features: [f64; FEATURE_COUNT]) -> Classification;
}

/// Human-readable label for a class id; unknown ids get a sentinel, never an
/// error.
#[must_use]
pub fn label_for(class_id: i64) -> &'static str {
    match class_id {
        0 => "Iris-setosa",
        1 => "Iris-versicolor",
        2 => "Iris-virginica",
        _ => "unknown",
    }
}

/// Nearest-centroid model over per-class mean measurements.
pub struct CentroidModel {
    centroids: [[f64; FEATURE_COUNT]; 3],
}

impl CentroidModel {
    /// Class centroids fitted offline on the iris training set.
    #[must_use]
    pub fn pretrained() -> Self {
        Self {
            centroids: [
                [5.006, 3.418, 1.464, 0.244],
                [5.936, 2.770, 4.260, 1.326],
                [6.588, 2.974, 5.552, 2.026],
            ],
        }
    }
}

impl Classifier for CentroidModel {
    fn classify(&self, features: [f64; FEATURE_COUNT]) -> Classification {
        let mut best = 0usize;
        let mut best_distance = f64::INFINITY;
        for (index, centroid) in self.centroids.iter().enumerate() {
            let distance: f64 = centroid
                .iter()
                .zip(features.iter())
                .map(|(c, f)| (c - f) * (c - f))
                .sum();
            if distance < best_distance {
                best = index;
                best_distance = distance;
            }
        }
        let class_id = best as i64;
        Classification {
            class_id,
            label: label_for(class_id).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_a_setosa_sample() {
        let model = CentroidModel::pretrained();
        let outcome = model.classify([5.1, 3.5, 1.4, 0.2]);
        assert_eq!(outcome.class_id, 0);
        assert_eq!(outcome.label, "Iris-setosa");
    }

    #[test]
    fn classifies_a_virginica_sample() {
        let model = CentroidModel::pretrained();
        let outcome = model.classify([6.7, 3.0, 5.8, 2.2]);
        assert_eq!(outcome.class_id, 2);
        assert_eq!(outcome.label, "Iris-virginica");
    }

    #[test]
    fn classification_is_deterministic() {
        let model = CentroidModel::pretrained();
        let features = [6.0, 2.8, 4.3, 1.3];
        assert_eq!(model.classify(features), model.classify(features));
    }

    #[test]
    fn unknown_class_ids_get_the_sentinel_label() {
        assert_eq!(label_for(3), "unknown");
        assert_eq!(label_for(-1), "unknown");
    }
}
