pub mod ai;
pub mod pipeline;
pub mod planner;
pub mod scanner;
pub mod tree;

pub use ai::{classify_by_content, ImageModel, Models, TextModel, EXTENSION_BASED};
pub use pipeline::{classify_batch, classify_path, ContentReader, FsReader};
pub use planner::{
    execute_operations, plan_operations, ExecutionReport, Operation, OperationFailure,
    OperationKind, Plan, PlanConflict,
};
pub use scanner::{collect_paths, format_size, Scan, ScanOptions, ScannedFile};
pub use tree::{render_tree, simulate_tree, SimulatedTree, TreeLeaf};
