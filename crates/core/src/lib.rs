pub mod category;
pub mod error;
pub mod result;
pub mod rules;

pub use category::{Category, CategoryLabel};
pub use error::ConfigError;
pub use result::ClassificationResult;
pub use rules::{
    normalize_extension, AiModelKind, Resolved, Rule, RuleConfig, RuleSet, RuleUpdate, RulesConfig,
};
