use std::path::{Path, PathBuf};

use sortd_core::{AiModelKind, ClassificationResult, Resolved, RuleSet};

use crate::ai::{self, Models, CAPTION_MAX_LEN, EXTENSION_BASED};

const RULE_CONFIDENCE: f32 = 1.0;
const DEGRADED_CONFIDENCE: f32 = 0.5;
const CAPTION_CONFIDENCE: f32 = 0.7;

/// Content access behind a seam so tests can inject read failures.
pub trait ContentReader {
    fn read_text(&self, path: &Path) -> anyhow::Result<String>;
}

/// Default reader backed by the filesystem.
pub struct FsReader;

impl ContentReader for FsReader {
    fn read_text(&self, path: &Path) -> anyhow::Result<String> {
        std::fs::read_to_string(path).map_err(Into::into)
    }
}

/// Classify one file: extension rule first, content analysis on top
/// when the rule asks for it. Total; every path yields a category.
pub fn classify_path(
    path: &Path,
    rules: &RuleSet,
    models: &Models,
    reader: &dyn ContentReader,
) -> ClassificationResult {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    let resolved = rules.resolve(ext);

    if !resolved.requires_ai_analysis {
        return rule_result(&resolved);
    }

    match resolved.ai_model_kind {
        Some(AiModelKind::Text) => classify_text(path, &resolved, models, reader),
        Some(AiModelKind::Image) => classify_image(path, &resolved, models),
        None => rule_result(&resolved),
    }
}

/// Classify a batch sequentially. AI capabilities are treated as a
/// single-flight resource; per-file degradation never aborts the batch.
pub fn classify_batch(
    paths: &[PathBuf],
    rules: &RuleSet,
    models: &Models,
    reader: &dyn ContentReader,
) -> Vec<(PathBuf, ClassificationResult)> {
    paths
        .iter()
        .map(|path| (path.clone(), classify_path(path, rules, models, reader)))
        .collect()
}

/// Deterministic rule match: full confidence, no tags.
fn rule_result(resolved: &Resolved) -> ClassificationResult {
    ClassificationResult::new(
        resolved.category.as_str(),
        resolved.description.clone(),
        Vec::new(),
        RULE_CONFIDENCE,
    )
}

/// Degraded result: rule category and description, reduced confidence.
fn degraded_result(resolved: &Resolved, description: String) -> ClassificationResult {
    ClassificationResult::new(
        resolved.category.as_str(),
        description,
        Vec::new(),
        DEGRADED_CONFIDENCE,
    )
}

fn classify_text(
    path: &Path,
    resolved: &Resolved,
    models: &Models,
    reader: &dyn ContentReader,
) -> ClassificationResult {
    // Unreadable content degrades to the rule defaults one level before
    // the adapter gets involved.
    let Ok(content) = reader.read_text(path) else {
        return degraded_result(resolved, resolved.description.clone());
    };

    let result = ai::classify_by_content(path, &content, &resolved.description, models.text());

    // Fallback invariant: an AI failure keeps the rule-derived category,
    // never EXTENSION_BASED and never a silent "Other" bucket. The
    // adapter's failure annotation and confidence are kept.
    if result.category == EXTENSION_BASED {
        return ClassificationResult::new(
            resolved.category.as_str(),
            result.description,
            result.tags,
            result.confidence,
        );
    }

    result
}

fn classify_image(path: &Path, resolved: &Resolved, models: &Models) -> ClassificationResult {
    let Some(model) = models.image() else {
        return degraded_result(
            resolved,
            format!(
                "{} (AI categorization failed: model unavailable)",
                resolved.description
            ),
        );
    };

    match model.caption(path, CAPTION_MAX_LEN) {
        Ok(caption) => {
            let caption = caption.trim();
            let description = if caption.is_empty() {
                resolved.description.clone()
            } else {
                caption.to_string()
            };
            ClassificationResult::new(
                resolved.category.as_str(),
                description,
                Vec::new(),
                CAPTION_CONFIDENCE,
            )
        }
        Err(err) => ClassificationResult::new(
            resolved.category.as_str(),
            format!(
                "{} (AI categorization failed: {err})",
                resolved.description
            ),
            vec!["error".to_string(), "ai-failed".to_string()],
            DEGRADED_CONFIDENCE,
        ),
    }
}
