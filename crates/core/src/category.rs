use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Top-level classification buckets. The set is closed; free-text
/// categories coming back from AI analysis go through [`CategoryLabel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Code,
    Data,
    Configuration,
    Documents,
    Images,
    Videos,
    Audio,
    Archives,
    #[serde(rename = "iWork")]
    IWork,
    Design,
    Applications,
    #[serde(rename = "Virtual Machines")]
    VirtualMachines,
    #[serde(rename = "System Files")]
    SystemFiles,
    Fonts,
    Other,
}

impl Category {
    pub const ALL: &'static [Category] = &[
        Self::Code,
        Self::Data,
        Self::Configuration,
        Self::Documents,
        Self::Images,
        Self::Videos,
        Self::Audio,
        Self::Archives,
        Self::IWork,
        Self::Design,
        Self::Applications,
        Self::VirtualMachines,
        Self::SystemFiles,
        Self::Fonts,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Code => "Code",
            Self::Data => "Data",
            Self::Configuration => "Configuration",
            Self::Documents => "Documents",
            Self::Images => "Images",
            Self::Videos => "Videos",
            Self::Audio => "Audio",
            Self::Archives => "Archives",
            Self::IWork => "iWork",
            Self::Design => "Design",
            Self::Applications => "Applications",
            Self::VirtualMachines => "Virtual Machines",
            Self::SystemFiles => "System Files",
            Self::Fonts => "Fonts",
            Self::Other => "Other",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(label.trim()))
            .copied()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A final category string broken into its taxonomy position.
///
/// AI output uses two-level labels like "Code/Python"; the top level is
/// matched against [`Category`] and anything unmatched is kept verbatim
/// as `Unrecognized` rather than rejected. At most one subcategory
/// level is retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryLabel {
    Known {
        category: Category,
        subcategory: Option<String>,
    },
    Unrecognized {
        label: String,
        subcategory: Option<String>,
    },
}

impl CategoryLabel {
    pub fn parse(s: &str) -> Self {
        let mut segments = s.splitn(2, '/').map(str::trim);
        let top = segments.next().unwrap_or("").to_string();
        let subcategory = segments
            .next()
            .map(|sub| sub.splitn(2, '/').next().unwrap_or(sub).trim())
            .filter(|sub| !sub.is_empty())
            .map(String::from);

        match Category::from_label(&top) {
            Some(category) => Self::Known {
                category,
                subcategory,
            },
            None => Self::Unrecognized {
                label: top,
                subcategory,
            },
        }
    }

    pub fn top_level(&self) -> &str {
        match self {
            Self::Known { category, .. } => category.as_str(),
            Self::Unrecognized { label, .. } => label,
        }
    }

    pub fn subcategory(&self) -> Option<&str> {
        match self {
            Self::Known { subcategory, .. } | Self::Unrecognized { subcategory, .. } => {
                subcategory.as_deref()
            }
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Self::Known { .. })
    }

    /// Destination directory relative to the output root: the top-level
    /// bucket plus at most one subcategory level.
    pub fn relative_dir(&self) -> PathBuf {
        let mut dir = PathBuf::from(self.top_level());
        if let Some(sub) = self.subcategory() {
            dir.push(sub);
        }
        dir
    }
}

impl fmt::Display for CategoryLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.subcategory() {
            Some(sub) => write!(f, "{}/{}", self.top_level(), sub),
            None => f.write_str(self.top_level()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_label_round_trip() {
        for category in Category::ALL {
            assert_eq!(Category::from_label(category.as_str()), Some(*category));
        }
    }

    #[test]
    fn category_from_label_is_case_insensitive() {
        assert_eq!(Category::from_label("documents"), Some(Category::Documents));
        assert_eq!(Category::from_label("  Images "), Some(Category::Images));
        assert_eq!(
            Category::from_label("virtual machines"),
            Some(Category::VirtualMachines)
        );
        assert_eq!(Category::from_label("Bogus"), None);
    }

    #[test]
    fn parse_known_with_subcategory() {
        let label = CategoryLabel::parse("Code/Python");
        assert!(label.is_known());
        assert_eq!(label.top_level(), "Code");
        assert_eq!(label.subcategory(), Some("Python"));
        assert_eq!(label.relative_dir(), PathBuf::from("Code/Python"));
    }

    #[test]
    fn parse_unrecognized_keeps_text() {
        let label = CategoryLabel::parse("Recipes/Desserts");
        assert!(!label.is_known());
        assert_eq!(label.top_level(), "Recipes");
        assert_eq!(label.subcategory(), Some("Desserts"));
    }

    #[test]
    fn parse_truncates_to_one_subcategory_level() {
        let label = CategoryLabel::parse("Documents/Business/Q3");
        assert_eq!(label.subcategory(), Some("Business"));
        assert_eq!(label.relative_dir(), PathBuf::from("Documents/Business"));
    }

    #[test]
    fn display_rejoins_segments() {
        assert_eq!(CategoryLabel::parse("Data / Financial").to_string(), "Data/Financial");
        assert_eq!(CategoryLabel::parse("Images").to_string(), "Images");
    }
}
