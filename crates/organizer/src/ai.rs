use std::path::Path;

use sortd_core::ClassificationResult;

/// Sentinel category emitted when content analysis could not run. The
/// pipeline substitutes the rule-derived category whenever it sees it.
pub const EXTENSION_BASED: &str = "EXTENSION_BASED";

/// At most this many characters of file content are embedded in the
/// categorization prompt; longer content is truncated, never an error.
pub const CONTENT_PREVIEW_CHARS: usize = 1000;

/// Response length bound passed to the text capability.
pub const RESPONSE_MAX_LEN: usize = 500;

/// Response length bound passed to the image capability.
pub const CAPTION_MAX_LEN: usize = 50;

const DEFAULT_CONFIDENCE: f32 = 0.7;
const DEGRADED_CONFIDENCE: f32 = 0.5;

/// Opaque text inference capability.
pub trait TextModel {
    fn summarize(&self, text: &str, max_len: usize) -> anyhow::Result<String>;
}

/// Opaque image captioning capability.
pub trait ImageModel {
    fn caption(&self, image: &Path, max_len: usize) -> anyhow::Result<String>;
}

/// Holder for whichever capabilities are loaded. An absent capability
/// is not an error; classification degrades to extension rules.
#[derive(Default)]
pub struct Models {
    text: Option<Box<dyn TextModel>>,
    image: Option<Box<dyn ImageModel>>,
}

impl Models {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, model: Box<dyn TextModel>) -> Self {
        self.text = Some(model);
        self
    }

    pub fn with_image(mut self, model: Box<dyn ImageModel>) -> Self {
        self.image = Some(model);
        self
    }

    pub fn text(&self) -> Option<&dyn TextModel> {
        self.text.as_deref()
    }

    pub fn image(&self) -> Option<&dyn ImageModel> {
        self.image.as_deref()
    }
}

/// The two-level taxonomy the model is asked to categorize into.
const CATEGORY_TAXONOMY: &str = "\
Main Categories:
1. Code/
   - Python/ (Python scripts, modules, packages)
   - JavaScript/ (JS files, Node.js, web scripts)
   - Web/ (HTML, CSS, web frameworks)
   - Database/ (SQL, NoSQL, schemas)
   - Configuration/ (config files, settings)
   - Other/ (other programming languages)

2. Documents/
   - Technical/ (API docs, technical specs, manuals)
   - Business/ (reports, plans, contracts, financial)
   - Academic/ (research papers, theses, studies)
   - Personal/ (notes, diaries, personal docs)
   - Legal/ (legal documents, contracts, policies)
   - Creative/ (stories, scripts, creative writing)

3. Data/
   - Financial/ (budgets, invoices, financial reports)
   - Scientific/ (research data, experiments, analysis)
   - User/ (user data, profiles, preferences)
   - Analytics/ (business intelligence, metrics, KPIs)
   - Database/ (data exports, backups, dumps)

4. Images/
   - Personal Photos/ (family, friends, personal)
   - Professional/ (work-related, business)
   - Graphics/ (designs, logos, illustrations)
   - Screenshots/ (system, application, web)
   - Art/ (creative, artistic, drawings)

5. Media/
   - Audio/ (music, podcasts, voice recordings)
   - Video/ (movies, tutorials, presentations)
   - Entertainment/ (games, entertainment content)

6. Archives/
   - Software/ (installers, packages)
   - Documents/ (document collections)
   - Media/ (media collections)
   - Backups/ (system backups, data backups)

7. Applications/
   - Windows/ (Windows executables)
   - macOS/ (macOS applications)
   - Linux/ (Linux applications)
   - Mobile/ (mobile apps, APKs)

8. System/
   - Configuration/ (system configs)
   - Logs/ (system logs, application logs)
   - Temporary/ (temp files, cache)
   - Security/ (certificates, keys)";

/// Categorize a file by content through the text capability.
///
/// Never fails: an absent capability or a failed invocation is
/// converted to the [`EXTENSION_BASED`] sentinel so the caller can fall
/// back to the rule-derived category.
pub fn classify_by_content(
    path: &Path,
    content: &str,
    prior_description: &str,
    model: Option<&dyn TextModel>,
) -> ClassificationResult {
    let Some(model) = model else {
        return unavailable_result(prior_description);
    };

    let prompt = build_prompt(path, content, prior_description);

    match model.summarize(&prompt, RESPONSE_MAX_LEN) {
        Ok(response) => {
            let parsed = parse_response(&response);
            ClassificationResult::new(
                parsed.category,
                format!("{prior_description} | {}", parsed.reason),
                parsed.tags,
                parsed.confidence,
            )
        }
        Err(err) => failed_result(prior_description, &err.to_string()),
    }
}

fn unavailable_result(prior: &str) -> ClassificationResult {
    ClassificationResult::new(
        EXTENSION_BASED,
        format!("{prior} (AI categorization failed: model unavailable)"),
        Vec::new(),
        DEGRADED_CONFIDENCE,
    )
}

fn failed_result(prior: &str, err: &str) -> ClassificationResult {
    ClassificationResult::new(
        EXTENSION_BASED,
        format!("{prior} (AI categorization failed: {err})"),
        vec!["error".to_string(), "ai-failed".to_string()],
        DEGRADED_CONFIDENCE,
    )
}

fn build_prompt(path: &Path, content: &str, prior_description: &str) -> String {
    format!(
        "Analyze this file and categorize it intelligently based on its content.\n\
         \n\
         File Path: {}\n\
         Description: {}\n\
         \n\
         {}\n\
         \n\
         Instructions:\n\
         1. Analyze the content and description carefully\n\
         2. Choose the most appropriate category and subcategory\n\
         3. Explain why this category was chosen\n\
         4. Suggest additional tags if relevant\n\
         5. Return the result in this exact format:\n\
         \n\
         CATEGORY: [Main Category]/[Subcategory]\n\
         REASON: [Detailed explanation]\n\
         TAGS: [comma-separated tags]\n\
         CONFIDENCE: [0.0-1.0]\n\
         \n\
         File Content Preview:\n\
         {}",
        path.display(),
        prior_description,
        CATEGORY_TAXONOMY,
        truncate_chars(content, CONTENT_PREVIEW_CHARS),
    )
}

/// Truncate to at most `max_chars` characters on a char boundary.
fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

struct ParsedResponse {
    category: String,
    reason: String,
    tags: Vec<String>,
    confidence: f32,
}

/// Line-oriented response parsing. Unmatched fields keep their
/// defaults; an unparseable confidence falls back to 0.7.
fn parse_response(response: &str) -> ParsedResponse {
    let mut parsed = ParsedResponse {
        category: "Other".to_string(),
        reason: "AI analysis provided".to_string(),
        tags: Vec::new(),
        confidence: DEFAULT_CONFIDENCE,
    };

    for line in response.lines().map(str::trim) {
        if let Some(rest) = line.strip_prefix("CATEGORY:") {
            parsed.category = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix("REASON:") {
            parsed.reason = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix("TAGS:") {
            parsed.tags = rest
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from)
                .collect();
        } else if let Some(rest) = line.strip_prefix("CONFIDENCE:") {
            parsed.confidence = rest.trim().parse().unwrap_or(DEFAULT_CONFIDENCE);
        }
    }

    parsed.confidence = parsed.confidence.clamp(0.0, 1.0);
    parsed
}
