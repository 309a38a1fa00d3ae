use serde::{Deserialize, Serialize};

use crate::monitoring::geo::DistanceModel;

/// Deployment-wide engine settings. Per-subject settings live in `SubjectProfile`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EvaluationConfig {
    pub distance_model: DistanceModel,
}
