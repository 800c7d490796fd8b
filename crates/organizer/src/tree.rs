use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::planner::Operation;
use crate::scanner::format_size;

/// Key used for leaves that land directly under the output root.
pub const ROOT_DIR: &str = ".";

/// One entry in the simulated destination layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TreeLeaf {
    File {
        name: String,
        source: PathBuf,
        size: u64,
        modified: Option<DateTime<Utc>>,
    },
    /// A whole input folder excluded from per-file classification;
    /// surfaced in the preview rather than recursed into or dropped.
    IgnoredFolder { name: String, source: PathBuf },
}

impl TreeLeaf {
    pub fn name(&self) -> &str {
        match self {
            Self::File { name, .. } | Self::IgnoredFolder { name, .. } => name,
        }
    }
}

/// Preview of the destination layout, keyed by destination-relative
/// directory. Purely derived from an operation batch; regenerate it
/// whenever the batch changes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulatedTree {
    pub entries: BTreeMap<String, Vec<TreeLeaf>>,
}

impl SimulatedTree {
    pub fn directories(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn contains(&self, dir: &str, name: &str) -> bool {
        self.entries
            .get(dir)
            .map(|leaves| leaves.iter().any(|l| l.name() == name))
            .unwrap_or(false)
    }

    /// All (directory, filename) pairs, sorted. The dry-run/execute
    /// parity checks compare these.
    pub fn file_pairs(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .flat_map(|(dir, leaves)| {
                leaves
                    .iter()
                    .filter(|l| matches!(l, TreeLeaf::File { .. }))
                    .map(move |l| (dir.clone(), l.name().to_string()))
            })
            .collect()
    }
}

/// Group operations by destination-relative directory, attaching size
/// and modification time read from the source file (0 / None when
/// unreadable). Ignored folders become marker leaves under the root.
pub fn simulate_tree(
    operations: &[Operation],
    output_root: &Path,
    ignored_dirs: &[PathBuf],
) -> SimulatedTree {
    let mut entries: BTreeMap<String, Vec<TreeLeaf>> = BTreeMap::new();

    for op in operations {
        let relative = op
            .destination
            .strip_prefix(output_root)
            .unwrap_or(&op.destination);

        let dir = relative
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_else(|| ROOT_DIR.to_string());

        let name = relative
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let (size, modified) = source_stat(&op.source);

        entries.entry(dir).or_default().push(TreeLeaf::File {
            name,
            source: op.source.clone(),
            size,
            modified,
        });
    }

    for ignored in ignored_dirs {
        let name = ignored
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| ignored.to_string_lossy().to_string());

        entries
            .entry(ROOT_DIR.to_string())
            .or_default()
            .push(TreeLeaf::IgnoredFolder {
                name,
                source: ignored.clone(),
            });
    }

    for leaves in entries.values_mut() {
        leaves.sort_by(|a, b| a.name().cmp(b.name()));
    }

    SimulatedTree { entries }
}

fn source_stat(source: &Path) -> (u64, Option<DateTime<Utc>>) {
    std::fs::metadata(source)
        .map(|meta| {
            let modified = meta.modified().ok().map(DateTime::<Utc>::from);
            (meta.len(), modified)
        })
        .unwrap_or((0, None))
}

/// Render the simulated tree for terminal preview.
pub fn render_tree(tree: &SimulatedTree) -> String {
    let mut output = String::new();

    for (dir, leaves) in &tree.entries {
        if dir == ROOT_DIR {
            output.push_str("./\n");
        } else {
            output.push_str(&format!("{dir}/\n"));
        }

        let count = leaves.len();
        for (i, leaf) in leaves.iter().enumerate() {
            let connector = if i == count - 1 { "`-- " } else { "|-- " };
            match leaf {
                TreeLeaf::File { name, size, .. } => {
                    output.push_str(&format!("{connector}{name} ({})\n", format_size(*size)));
                }
                TreeLeaf::IgnoredFolder { name, .. } => {
                    output.push_str(&format!("{connector}{name}/ (ignored)\n"));
                }
            }
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::{plan_operations, OperationKind};
    use sortd_core::ClassificationResult;
    use std::fs;
    use tempfile::TempDir;

    fn plan_for(
        classified: &[(PathBuf, ClassificationResult)],
        root: &Path,
    ) -> Vec<Operation> {
        plan_operations(classified, root, OperationKind::Move).operations
    }

    #[test]
    fn groups_by_destination_directory() {
        let ops = plan_for(
            &[
                (
                    PathBuf::from("/in/a.txt"),
                    ClassificationResult::new("Documents", "t", vec![], 1.0),
                ),
                (
                    PathBuf::from("/in/song.mp3"),
                    ClassificationResult::new("Audio", "a", vec![], 1.0),
                ),
            ],
            Path::new("/out"),
        );

        let tree = simulate_tree(&ops, Path::new("/out"), &[]);

        assert!(tree.contains("Documents", "a.txt"));
        assert!(tree.contains("Audio", "song.mp3"));
    }

    #[test]
    fn unreadable_source_has_zero_size() {
        let ops = plan_for(
            &[(
                PathBuf::from("/definitely/not/here.txt"),
                ClassificationResult::new("Documents", "t", vec![], 1.0),
            )],
            Path::new("/out"),
        );

        let tree = simulate_tree(&ops, Path::new("/out"), &[]);
        let leaves = tree.entries.get("Documents").unwrap();

        match &leaves[0] {
            TreeLeaf::File { size, modified, .. } => {
                assert_eq!(*size, 0);
                assert!(modified.is_none());
            }
            other => panic!("unexpected leaf: {other:?}"),
        }
    }

    #[test]
    fn readable_source_has_real_stat() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("a.txt");
        fs::write(&source, "hello").unwrap();

        let ops = plan_for(
            &[(
                source,
                ClassificationResult::new("Documents", "t", vec![], 1.0),
            )],
            Path::new("/out"),
        );

        let tree = simulate_tree(&ops, Path::new("/out"), &[]);
        match &tree.entries.get("Documents").unwrap()[0] {
            TreeLeaf::File { size, modified, .. } => {
                assert_eq!(*size, 5);
                assert!(modified.is_some());
            }
            other => panic!("unexpected leaf: {other:?}"),
        }
    }

    #[test]
    fn ignored_folders_surface_under_root() {
        let tree = simulate_tree(&[], Path::new("/out"), &[PathBuf::from("/in/node_modules")]);

        assert!(tree.contains(ROOT_DIR, "node_modules"));
        assert!(matches!(
            tree.entries.get(ROOT_DIR).unwrap()[0],
            TreeLeaf::IgnoredFolder { .. }
        ));
    }

    #[test]
    fn leaves_sorted_by_name() {
        let ops = plan_for(
            &[
                (
                    PathBuf::from("/in/zeta.txt"),
                    ClassificationResult::new("Documents", "t", vec![], 1.0),
                ),
                (
                    PathBuf::from("/in/alpha.txt"),
                    ClassificationResult::new("Documents", "t", vec![], 1.0),
                ),
            ],
            Path::new("/out"),
        );

        let tree = simulate_tree(&ops, Path::new("/out"), &[]);
        let names: Vec<&str> = tree.entries.get("Documents").unwrap()
            .iter()
            .map(TreeLeaf::name)
            .collect();

        assert_eq!(names, vec!["alpha.txt", "zeta.txt"]);
    }

    #[test]
    fn render_shows_dirs_and_markers() {
        let ops = plan_for(
            &[(
                PathBuf::from("/in/a.txt"),
                ClassificationResult::new("Documents", "t", vec![], 1.0),
            )],
            Path::new("/out"),
        );

        let tree = simulate_tree(&ops, Path::new("/out"), &[PathBuf::from("/in/temp")]);
        let rendered = render_tree(&tree);

        assert!(rendered.contains("Documents/"));
        assert!(rendered.contains("a.txt"));
        assert!(rendered.contains("temp/ (ignored)"));
    }
}
