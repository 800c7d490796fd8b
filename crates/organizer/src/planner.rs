use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use sortd_core::{CategoryLabel, ClassificationResult};

/// Kind of filesystem action an operation performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Move,
    Hardlink,
    Symlink,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Move => "move",
            Self::Hardlink => "hardlink",
            Self::Symlink => "symlink",
        })
    }
}

/// One planned filesystem action. Created by the planner, optionally
/// serialized for preview, consumed exactly once by the executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub kind: OperationKind,
    pub description: String,
    pub category: String,
}

/// Record of a destination collision resolved by suffixing. Callers
/// can surface these before executing, or refuse to execute at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanConflict {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub renamed_to: PathBuf,
}

/// A planned batch: one operation per input, collisions resolved and
/// reported. Preview and execution both consume `operations`, so they
/// agree on the destination layout by construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub operations: Vec<Operation>,
    pub conflicts: Vec<PlanConflict>,
}

/// Map classified files to destinations under the output root:
/// `output_root / category / basename`, with at most one subcategory
/// level. Intra-batch destination collisions are disambiguated
/// deterministically, in planning order, by suffixing the file stem
/// with `-1`, `-2`, ...
pub fn plan_operations(
    classified: &[(PathBuf, ClassificationResult)],
    output_root: &Path,
    kind: OperationKind,
) -> Plan {
    let mut taken: HashSet<PathBuf> = HashSet::new();
    let mut operations = Vec::with_capacity(classified.len());
    let mut conflicts = Vec::new();

    for (source, result) in classified {
        let Some(name) = source.file_name() else {
            continue;
        };

        let dest_dir = output_root.join(CategoryLabel::parse(&result.category).relative_dir());
        let destination = dest_dir.join(name);

        let destination = if taken.contains(&destination) {
            let renamed = disambiguate(&destination, &taken);
            conflicts.push(PlanConflict {
                source: source.clone(),
                destination,
                renamed_to: renamed.clone(),
            });
            renamed
        } else {
            destination
        };

        taken.insert(destination.clone());
        operations.push(Operation {
            source: source.clone(),
            destination,
            kind,
            description: result.description.clone(),
            category: result.category.clone(),
        });
    }

    Plan {
        operations,
        conflicts,
    }
}

fn disambiguate(destination: &Path, taken: &HashSet<PathBuf>) -> PathBuf {
    let dir = destination.parent().unwrap_or_else(|| Path::new(""));
    let stem = destination
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("file");
    let ext = destination
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default();

    (1..)
        .map(|n| dir.join(format!("{stem}-{n}{ext}")))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| destination.to_path_buf())
}

/// A single operation that could not be applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationFailure {
    pub operation: Operation,
    pub error: String,
}

/// Outcome of executing a batch: completed operations and collected
/// per-operation failures. A failure never aborts the batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub completed: Vec<Operation>,
    pub failures: Vec<OperationFailure>,
}

impl ExecutionReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Apply every operation, creating destination directories lazily.
pub fn execute_operations(operations: &[Operation]) -> ExecutionReport {
    operations
        .iter()
        .fold(ExecutionReport::default(), |mut report, op| {
            match apply(op) {
                Ok(()) => report.completed.push(op.clone()),
                Err(err) => report.failures.push(OperationFailure {
                    operation: op.clone(),
                    error: err.to_string(),
                }),
            }
            report
        })
}

fn apply(op: &Operation) -> std::io::Result<()> {
    if let Some(parent) = op.destination.parent() {
        // create_dir_all is idempotent; already-exists is not an error.
        std::fs::create_dir_all(parent)?;
    }

    match op.kind {
        OperationKind::Move => move_file(&op.source, &op.destination),
        OperationKind::Hardlink => std::fs::hard_link(&op.source, &op.destination),
        OperationKind::Symlink => link_symbolic(&op.source, &op.destination),
    }
}

/// Rename, falling back to copy-and-remove across filesystems.
fn move_file(source: &Path, destination: &Path) -> std::io::Result<()> {
    match std::fs::rename(source, destination) {
        Ok(()) => Ok(()),
        Err(_) => {
            std::fs::copy(source, destination)?;
            std::fs::remove_file(source)
        }
    }
}

#[cfg(unix)]
fn link_symbolic(source: &Path, destination: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(source, destination)
}

#[cfg(windows)]
fn link_symbolic(source: &Path, destination: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_file(source, destination)
}
