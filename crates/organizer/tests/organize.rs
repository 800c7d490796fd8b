use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use sortd::{
    classify_batch, collect_paths, execute_operations, plan_operations, simulate_tree, FsReader,
    Models, OperationKind, ScanOptions, TextModel,
};
use sortd_core::RuleSet;
use tempfile::TempDir;

struct CannedText(&'static str);

impl TextModel for CannedText {
    fn summarize(&self, _text: &str, _max_len: usize) -> anyhow::Result<String> {
        Ok(self.0.to_string())
    }
}

fn walk_output(output: &Path) -> BTreeSet<(String, String)> {
    walkdir::WalkDir::new(output)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let rel = e.path().strip_prefix(output).unwrap();
            let dir = rel
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(|p| p.to_string_lossy().to_string())
                .unwrap_or_else(|| ".".to_string());
            let name = rel.file_name().unwrap().to_string_lossy().to_string();
            (dir, name)
        })
        .collect()
}

#[test]
fn dry_run_and_execute_agree_on_layout() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in");
    let output = dir.path().join("out");
    fs::create_dir(&input).unwrap();

    fs::write(input.join("report.txt"), "quarterly budget figures").unwrap();
    fs::write(input.join("photo.png"), [0u8; 16]).unwrap();
    fs::write(input.join("song.mp3"), [0u8; 16]).unwrap();
    fs::write(input.join("backup.zip"), [0u8; 16]).unwrap();

    let rules = RuleSet::default();
    let scan = collect_paths(&input, &ScanOptions::default()).unwrap();
    let classified = classify_batch(&scan.paths(), &rules, &Models::none(), &FsReader);
    let plan = plan_operations(&classified, &output, OperationKind::Move);

    let preview = simulate_tree(&plan.operations, &output, &scan.ignored_dirs);
    let preview_pairs: BTreeSet<_> = preview.file_pairs().into_iter().collect();

    let report = execute_operations(&plan.operations);
    assert!(report.is_clean());

    assert_eq!(preview_pairs, walk_output(&output));
    assert!(preview_pairs.contains(&("Documents".to_string(), "report.txt".to_string())));
    assert!(preview_pairs.contains(&("Images".to_string(), "photo.png".to_string())));
    assert!(preview_pairs.contains(&("Audio".to_string(), "song.mp3".to_string())));
    assert!(preview_pairs.contains(&("Archives".to_string(), "backup.zip".to_string())));
}

#[test]
fn ai_unavailable_still_categorizes_by_rule() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("report.txt");
    fs::write(&file, "quarterly budget figures").unwrap();

    let rules = RuleSet::default();
    let classified = classify_batch(&[file], &rules, &Models::none(), &FsReader);

    let (_, result) = &classified[0];
    assert_eq!(result.category, "Documents");
    assert_eq!(result.confidence, 0.5);
    assert!(result.description.contains("AI categorization failed"));
}

#[test]
fn ai_override_routes_into_subcategory() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in");
    let output = dir.path().join("out");
    fs::create_dir(&input).unwrap();
    fs::write(input.join("scraper.txt"), "import requests\nimport json").unwrap();

    let rules = RuleSet::default();
    let models = Models::none().with_text(Box::new(CannedText(
        "CATEGORY: Code/Python\nREASON: Python imports\nTAGS: python\nCONFIDENCE: 0.9",
    )));

    let scan = collect_paths(&input, &ScanOptions::default()).unwrap();
    let classified = classify_batch(&scan.paths(), &rules, &models, &FsReader);
    let plan = plan_operations(&classified, &output, OperationKind::Move);

    let report = execute_operations(&plan.operations);
    assert!(report.is_clean());
    assert!(output.join("Code/Python/scraper.txt").exists());
}

#[test]
fn same_basename_from_different_dirs_both_survive() {
    let dir = TempDir::new().unwrap();
    let one = dir.path().join("one");
    let two = dir.path().join("two");
    let output = dir.path().join("out");
    fs::create_dir_all(&one).unwrap();
    fs::create_dir_all(&two).unwrap();
    fs::write(one.join("x.mp3"), "first").unwrap();
    fs::write(two.join("x.mp3"), "second").unwrap();

    let rules = RuleSet::default();
    let classified = classify_batch(
        &[one.join("x.mp3"), two.join("x.mp3")],
        &rules,
        &Models::none(),
        &FsReader,
    );
    let plan = plan_operations(&classified, &output, OperationKind::Move);

    assert_eq!(plan.conflicts.len(), 1);

    let report = execute_operations(&plan.operations);
    assert!(report.is_clean());
    assert!(output.join("Audio/x.mp3").exists());
    assert!(output.join("Audio/x-1.mp3").exists());
}

#[test]
fn ignored_folders_are_previewed_not_moved() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in");
    let output = dir.path().join("out");
    fs::create_dir(&input).unwrap();
    fs::write(input.join("a.mp3"), "a").unwrap();
    fs::create_dir(input.join(".cache")).unwrap();
    fs::write(input.join(".cache/blob.bin"), "x").unwrap();

    let rules = RuleSet::default();
    let scan = collect_paths(&input, &ScanOptions::default()).unwrap();
    let classified = classify_batch(&scan.paths(), &rules, &Models::none(), &FsReader);
    let plan = plan_operations(&classified, &output, OperationKind::Move);

    let preview = simulate_tree(&plan.operations, &output, &scan.ignored_dirs);
    assert!(preview.contains(".", ".cache"));

    let report = execute_operations(&plan.operations);
    assert!(report.is_clean());
    assert!(input.join(".cache/blob.bin").exists());
    assert!(!output.join(".cache").exists());
}

#[test]
fn hardlink_batch_leaves_sources_in_place() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in");
    let output = dir.path().join("out");
    fs::create_dir(&input).unwrap();
    fs::write(input.join("a.mp3"), "a").unwrap();
    fs::write(input.join("b.zip"), "b").unwrap();

    let rules = RuleSet::default();
    let scan = collect_paths(&input, &ScanOptions::default()).unwrap();
    let classified = classify_batch(&scan.paths(), &rules, &Models::none(), &FsReader);
    let plan = plan_operations(&classified, &output, OperationKind::Hardlink);

    let report = execute_operations(&plan.operations);
    assert!(report.is_clean());
    assert!(input.join("a.mp3").exists());
    assert!(output.join("Audio/a.mp3").exists());
    assert!(output.join("Archives/b.zip").exists());
}

#[test]
fn execution_failures_do_not_abort_batch() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out");
    let good = dir.path().join("good.mp3");
    fs::write(&good, "x").unwrap();

    let rules = RuleSet::default();
    let classified = classify_batch(
        &[dir.path().join("missing.mp3"), good],
        &rules,
        &Models::none(),
        &FsReader,
    );
    let plan = plan_operations(&classified, &output, OperationKind::Move);
    let report = execute_operations(&plan.operations);

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.completed.len(), 1);
    assert!(output.join("Audio/good.mp3").exists());
}
