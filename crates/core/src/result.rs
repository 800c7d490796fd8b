use serde::{Deserialize, Serialize};

/// Final classification for one file. Created once, never mutated;
/// consumed by the operation planner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub category: String,
    pub description: String,
    pub tags: Vec<String>,
    pub confidence: f32,
}

impl ClassificationResult {
    pub fn new(
        category: impl Into<String>,
        description: impl Into<String>,
        tags: Vec<String>,
        confidence: f32,
    ) -> Self {
        Self {
            category: category.into(),
            description: description.into(),
            tags,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}
