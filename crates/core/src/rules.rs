use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::category::Category;
use crate::error::ConfigError;

/// Which inference capability a rule needs for content analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiModelKind {
    Text,
    Image,
}

impl AiModelKind {
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "text" => Some(Self::Text),
            "image" => Some(Self::Image),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
        }
    }
}

impl fmt::Display for AiModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lowercase an extension and ensure the leading dot, so ".TXT", "TXT"
/// and ".txt" all resolve identically.
pub fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim().to_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{ext}")
    }
}

/// Static mapping from a set of extensions to a category, description,
/// and AI requirement. Higher priority rules are checked first.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub extensions: Vec<String>,
    pub category: Category,
    pub description: String,
    pub requires_ai_analysis: bool,
    pub ai_model_kind: Option<AiModelKind>,
    pub priority: i32,
}

impl Rule {
    pub fn new(
        extensions: &[&str],
        category: Category,
        description: impl Into<String>,
        priority: i32,
    ) -> Self {
        Self {
            extensions: extensions.iter().map(|e| normalize_extension(e)).collect(),
            category,
            description: description.into(),
            requires_ai_analysis: false,
            ai_model_kind: None,
            priority,
        }
    }

    pub fn with_ai(mut self, kind: AiModelKind) -> Self {
        self.requires_ai_analysis = true;
        self.ai_model_kind = Some(kind);
        self
    }

    fn matches(&self, normalized_ext: &str) -> bool {
        self.extensions.iter().any(|e| e == normalized_ext)
    }

    fn matches_any(&self, normalized_exts: &[String]) -> bool {
        normalized_exts.iter().any(|e| self.matches(e))
    }
}

/// Partial update for [`RuleSet::update_rule`]; only `Some` fields are
/// applied. `ai_model_kind` is doubly optional so the kind can be
/// cleared explicitly.
#[derive(Debug, Clone, Default)]
pub struct RuleUpdate {
    pub extensions: Option<Vec<String>>,
    pub category: Option<Category>,
    pub description: Option<String>,
    pub requires_ai_analysis: Option<bool>,
    pub ai_model_kind: Option<Option<AiModelKind>>,
    pub priority: Option<i32>,
}

/// Resolver output: the matched rule's classification fields, or the
/// unclassified sentinel when no rule covers the extension.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub category: Category,
    pub description: String,
    pub requires_ai_analysis: bool,
    pub ai_model_kind: Option<AiModelKind>,
}

impl Resolved {
    pub fn unclassified() -> Self {
        Self {
            category: Category::Other,
            description: "Other file".to_string(),
            requires_ai_analysis: false,
            ai_model_kind: None,
        }
    }
}

impl From<&Rule> for Resolved {
    fn from(rule: &Rule) -> Self {
        Self {
            category: rule.category,
            description: rule.description.clone(),
            requires_ai_analysis: rule.requires_ai_analysis,
            ai_model_kind: rule.ai_model_kind,
        }
    }
}

/// Priority-ordered rule table. Kept sorted descending by priority;
/// the sort is stable, so equal priorities keep insertion order.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl Default for RuleSet {
    fn default() -> Self {
        let mut set = Self::empty();
        for rule in default_rules() {
            set.add_rule(rule);
        }
        set
    }
}

impl RuleSet {
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn add_rule(&mut self, rule: Rule) {
        self.rules.push(rule);
        self.rules.sort_by(|a, b| b.priority.cmp(&a.priority));
    }

    /// Remove every rule containing any of the given extensions.
    pub fn remove_rule(&mut self, extensions: &[&str]) {
        let normalized: Vec<String> = extensions.iter().map(|e| normalize_extension(e)).collect();
        self.rules.retain(|rule| !rule.matches_any(&normalized));
    }

    /// Patch the first rule containing any of the given extensions.
    /// Returns true if a rule was updated.
    pub fn update_rule(&mut self, extensions: &[&str], update: RuleUpdate) -> bool {
        let normalized: Vec<String> = extensions.iter().map(|e| normalize_extension(e)).collect();

        let Some(pos) = self.rules.iter().position(|r| r.matches_any(&normalized)) else {
            return false;
        };

        let priority_changed = update.priority.is_some();
        let rule = &mut self.rules[pos];

        if let Some(exts) = update.extensions {
            // An empty set would leave the rule unmatchable, the same
            // state import rejects; keep the existing extensions.
            if !exts.is_empty() {
                rule.extensions = exts.iter().map(|e| normalize_extension(e)).collect();
            }
        }
        if let Some(category) = update.category {
            rule.category = category;
        }
        if let Some(description) = update.description {
            rule.description = description;
        }
        if let Some(requires) = update.requires_ai_analysis {
            rule.requires_ai_analysis = requires;
        }
        if let Some(kind) = update.ai_model_kind {
            rule.ai_model_kind = kind;
        }
        if let Some(priority) = update.priority {
            rule.priority = priority;
        }

        if priority_changed {
            self.rules.sort_by(|a, b| b.priority.cmp(&a.priority));
        }

        true
    }

    /// First rule, in priority order, whose extension set contains the
    /// given extension (case-insensitive, leading dot optional).
    pub fn rule_for_extension(&self, ext: &str) -> Option<&Rule> {
        let normalized = normalize_extension(ext);
        self.rules.iter().find(|rule| rule.matches(&normalized))
    }

    /// Total resolution: the matching rule's fields, or the
    /// unclassified sentinel.
    pub fn resolve(&self, ext: &str) -> Resolved {
        self.rule_for_extension(ext)
            .map(Resolved::from)
            .unwrap_or_else(Resolved::unclassified)
    }

    /// Flat lookups over [`Self::rule_for_extension`], one field each.
    pub fn category_for_extension(&self, ext: &str) -> Option<Category> {
        self.rule_for_extension(ext).map(|rule| rule.category)
    }

    pub fn description_for_extension(&self, ext: &str) -> Option<&str> {
        self.rule_for_extension(ext)
            .map(|rule| rule.description.as_str())
    }

    pub fn requires_ai_analysis(&self, ext: &str) -> bool {
        self.rule_for_extension(ext)
            .map(|rule| rule.requires_ai_analysis)
            .unwrap_or(false)
    }

    pub fn ai_model_kind(&self, ext: &str) -> Option<AiModelKind> {
        self.rule_for_extension(ext)
            .and_then(|rule| rule.ai_model_kind)
    }

    pub fn all_extensions(&self) -> Vec<String> {
        self.rules
            .iter()
            .flat_map(|rule| rule.extensions.iter().cloned())
            .collect()
    }

    pub fn extensions_by_category(&self, category: Category) -> Vec<String> {
        self.rules
            .iter()
            .filter(|rule| rule.category == category)
            .flat_map(|rule| rule.extensions.iter().cloned())
            .collect()
    }

    pub fn categories(&self) -> Vec<Category> {
        let mut categories: Vec<Category> = self.rules.iter().map(|r| r.category).collect();
        categories.sort_by_key(|c| c.as_str());
        categories.dedup();
        categories
    }

    pub fn export_config(&self) -> RulesConfig {
        RulesConfig {
            rules: self.rules.iter().map(RuleConfig::from).collect(),
        }
    }

    pub fn from_config(config: RulesConfig) -> Result<Self, ConfigError> {
        let mut set = Self::empty();
        for rule in config.rules {
            set.add_rule(rule.try_into()?);
        }
        Ok(set)
    }

    /// Replace the whole table with an imported configuration.
    pub fn import_config(&mut self, config: RulesConfig) -> Result<(), ConfigError> {
        *self = Self::from_config(config)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: RulesConfig = serde_json::from_str(&content)?;
        Self::from_config(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(&self.export_config())?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Persisted rule table format: `{ "rules": [...] }`. Order across an
/// export/import boundary is reconstructed by priority, so rules with
/// equal priority may not keep their original relative order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesConfig {
    pub rules: Vec<RuleConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleConfig {
    pub extensions: Vec<String>,
    pub category: String,
    pub description: String,
    #[serde(default)]
    pub requires_ai_analysis: bool,
    #[serde(default)]
    pub ai_model_type: Option<String>,
    #[serde(default)]
    pub priority: i32,
}

impl From<&Rule> for RuleConfig {
    fn from(rule: &Rule) -> Self {
        Self {
            extensions: rule.extensions.clone(),
            category: rule.category.as_str().to_string(),
            description: rule.description.clone(),
            requires_ai_analysis: rule.requires_ai_analysis,
            ai_model_type: rule.ai_model_kind.map(|k| k.as_str().to_string()),
            priority: rule.priority,
        }
    }
}

impl TryFrom<RuleConfig> for Rule {
    type Error = ConfigError;

    fn try_from(config: RuleConfig) -> Result<Self, Self::Error> {
        if config.extensions.is_empty() {
            return Err(ConfigError::EmptyExtensions);
        }

        let category = Category::from_label(&config.category)
            .ok_or_else(|| ConfigError::UnknownCategory(config.category.clone()))?;

        let ai_model_kind = config
            .ai_model_type
            .as_deref()
            .map(|label| {
                AiModelKind::from_label(label)
                    .ok_or_else(|| ConfigError::UnknownModelKind(label.to_string()))
            })
            .transpose()?;

        Ok(Self {
            extensions: config
                .extensions
                .iter()
                .map(|e| normalize_extension(e))
                .collect(),
            category,
            description: config.description,
            requires_ai_analysis: config.requires_ai_analysis,
            ai_model_kind,
            priority: config.priority,
        })
    }
}

/// The reference seed table. Extension lists and priorities are fixed:
/// changing them changes categorization outcomes.
fn default_rules() -> Vec<Rule> {
    vec![
        Rule::new(
            &[
                ".txt", ".md", ".py", ".js", ".html", ".css", ".json", ".xml", ".csv", ".log",
                ".ini", ".conf", ".cfg", ".yml", ".yaml",
            ],
            Category::Documents,
            "Text document",
            100,
        )
        .with_ai(AiModelKind::Text),
        Rule::new(
            &[
                ".jpg", ".jpeg", ".png", ".gif", ".bmp", ".tiff", ".svg", ".webp", ".heic",
                ".heif", ".raw", ".cr2", ".nef", ".arw",
            ],
            Category::Images,
            "Image file",
            100,
        )
        .with_ai(AiModelKind::Image),
        Rule::new(
            &[
                ".mp4", ".avi", ".mov", ".wmv", ".flv", ".mkv", ".webm", ".m4v", ".3gp", ".ogv",
                ".ts",
            ],
            Category::Videos,
            "Video file",
            90,
        ),
        Rule::new(
            &[
                ".mp3", ".wav", ".flac", ".aac", ".ogg", ".wma", ".m4a", ".aiff", ".alac",
                ".opus",
            ],
            Category::Audio,
            "Audio file",
            90,
        ),
        Rule::new(
            &[
                ".zip", ".rar", ".7z", ".tar", ".gz", ".bz2", ".xz", ".lzma", ".dmg", ".pkg",
            ],
            Category::Archives,
            "Archive file",
            80,
        ),
        Rule::new(
            &[
                ".pdf", ".doc", ".docx", ".ppt", ".pptx", ".xls", ".xlsx", ".rtf", ".odt",
                ".odp", ".ods",
            ],
            Category::Documents,
            "Document file",
            85,
        ),
        Rule::new(
            &[".pages", ".numbers", ".keynote"],
            Category::IWork,
            "iWork document",
            85,
        ),
        Rule::new(
            &[
                ".psd", ".ai", ".eps", ".indd", ".sketch", ".fig", ".xd", ".afdesign",
            ],
            Category::Design,
            "Design file",
            80,
        ),
        Rule::new(
            &[".db", ".sqlite", ".sql", ".mdb", ".accdb", ".tsv", ".parquet"],
            Category::Data,
            "Database or data file",
            75,
        ),
        Rule::new(
            &[".exe", ".app", ".deb", ".rpm", ".msi", ".apk"],
            Category::Applications,
            "Application or installer",
            70,
        ),
        Rule::new(
            &[".iso", ".vmdk", ".vhd", ".ova", ".ovf"],
            Category::VirtualMachines,
            "Virtual machine or disk image",
            65,
        ),
        Rule::new(
            &[".bak", ".tmp", ".temp", ".cache", ".old"],
            Category::SystemFiles,
            "Backup or temporary file",
            60,
        ),
        Rule::new(
            &[".font", ".ttf", ".otf", ".woff", ".woff2", ".eot"],
            Category::Fonts,
            "Font file",
            70,
        ),
    ]
}
