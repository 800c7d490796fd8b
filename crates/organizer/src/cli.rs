use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};

use sortd::{
    classify_path, collect_paths, execute_operations, plan_operations, render_tree, simulate_tree,
    FsReader, Models, OperationKind, ScanOptions,
};
use sortd_core::RuleSet;

fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template(":: {spinner} {msg:<16} ━{bar:30}━ {pos}/{len} | ETA {eta}")
        .unwrap()
        .tick_chars("▏▎▍▌▋▊▉█▉▋▌▍▎")
        .progress_chars("━━░")
}

#[derive(Parser)]
#[command(name = "sortd")]
#[command(version)]
#[command(about = "Organize files into a categorized tree by extension rules")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
    Move,
    Hardlink,
    Symlink,
}

impl From<KindArg> for OperationKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Move => Self::Move,
            KindArg::Hardlink => Self::Hardlink,
            KindArg::Symlink => Self::Symlink,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Classify files under a directory and preview or apply the moves
    Organize {
        #[arg(short, long, help = "Source directory")]
        input: PathBuf,
        #[arg(short, long, help = "Destination root")]
        output: PathBuf,
        #[arg(long, value_enum, default_value = "move", help = "Operation kind")]
        kind: KindArg,
        #[arg(long, help = "Rule table JSON [default: built-in rules]")]
        rules: Option<PathBuf>,
        #[arg(long, help = "Apply the operations instead of previewing")]
        execute: bool,
        #[arg(long, help = "Include hidden files and folders")]
        include_hidden: bool,
        #[arg(long, value_name = "DIR", help = "Skip directories with this name (repeatable)")]
        exclude: Vec<PathBuf>,
    },
    /// Classify a single file and print the result
    Classify {
        #[arg(help = "File to classify")]
        file: PathBuf,
        #[arg(long, help = "Rule table JSON [default: built-in rules]")]
        rules: Option<PathBuf>,
    },
    /// Inspect or export the rule table
    Rules {
        #[command(subcommand)]
        command: RulesCommands,
    },
    /// Generate shell completions
    Completions {
        #[arg(help = "Shell to generate for (bash, zsh, fish, powershell)")]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum RulesCommands {
    /// Print the active rule table
    Show {
        #[arg(long, help = "Rule table JSON [default: built-in rules]")]
        rules: Option<PathBuf>,
    },
    /// Write the rule table to a JSON file
    Export {
        #[arg(help = "Destination path")]
        path: PathBuf,
        #[arg(long, help = "Rule table JSON to re-export [default: built-in rules]")]
        rules: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Organize {
            input,
            output,
            kind,
            rules,
            execute,
            include_hidden,
            exclude,
        } => cmd_organize(
            &input,
            &output,
            kind.into(),
            rules.as_deref(),
            execute,
            include_hidden,
            exclude,
        ),
        Commands::Classify { file, rules } => cmd_classify(&file, rules.as_deref()),
        Commands::Rules { command } => match command {
            RulesCommands::Show { rules } => cmd_rules_show(rules.as_deref()),
            RulesCommands::Export { path, rules } => cmd_rules_export(&path, rules.as_deref()),
        },
        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "sortd", &mut io::stdout());
            Ok(())
        }
    }
}

fn load_rules(path: Option<&Path>) -> Result<RuleSet> {
    match path {
        Some(path) => RuleSet::load(path).map_err(Into::into),
        None => Ok(RuleSet::default()),
    }
}

fn cmd_organize(
    input: &Path,
    output: &Path,
    kind: OperationKind,
    rules_path: Option<&Path>,
    execute: bool,
    include_hidden: bool,
    exclude: Vec<PathBuf>,
) -> Result<()> {
    anyhow::ensure!(input.exists(), "input path does not exist: {}", input.display());

    let rules = load_rules(rules_path)?;
    let scan = collect_paths(
        input,
        &ScanOptions {
            include_hidden,
            exclude,
            ..Default::default()
        },
    )?;

    // Inference models are optional capabilities loaded by the host;
    // the CLI runs without them and classification degrades to the
    // extension rules.
    let models = Models::none();
    let reader = FsReader;

    let bar = ProgressBar::new(scan.files.len() as u64).with_style(bar_style());
    bar.set_message("classifying");

    let classified: Vec<_> = scan
        .files
        .iter()
        .map(|file| {
            let result = classify_path(&file.path, &rules, &models, &reader);
            bar.inc(1);
            (file.path.clone(), result)
        })
        .collect();
    bar.finish_and_clear();

    let plan = plan_operations(&classified, output, kind);

    for conflict in &plan.conflicts {
        println!(
            "conflict: {} -> {} (renamed to {})",
            conflict.source.display(),
            conflict.destination.display(),
            conflict.renamed_to.display()
        );
    }

    println!("Proposed directory structure:");
    print!(
        "{}",
        render_tree(&simulate_tree(&plan.operations, output, &scan.ignored_dirs))
    );

    if !execute {
        println!("Dry run completed. No files were moved.");
        return Ok(());
    }

    std::fs::create_dir_all(output)?;
    let report = execute_operations(&plan.operations);

    println!(
        "Applied {} of {} operations",
        report.completed.len(),
        plan.operations.len()
    );

    for failure in &report.failures {
        eprintln!(
            "failed: {} -> {}: {}",
            failure.operation.source.display(),
            failure.operation.destination.display(),
            failure.error
        );
    }

    if !report.is_clean() {
        anyhow::bail!("{} operations failed", report.failures.len());
    }

    Ok(())
}

fn cmd_classify(file: &Path, rules_path: Option<&Path>) -> Result<()> {
    let rules = load_rules(rules_path)?;
    let result = classify_path(file, &rules, &Models::none(), &FsReader);

    println!("File:        {}", file.display());
    println!("Category:    {}", result.category);
    println!("Description: {}", result.description);
    if !result.tags.is_empty() {
        println!("Tags:        {}", result.tags.join(", "));
    }
    println!("Confidence:  {:.2}", result.confidence);

    Ok(())
}

fn cmd_rules_show(rules_path: Option<&Path>) -> Result<()> {
    let rules = load_rules(rules_path)?;

    for rule in rules.rules() {
        let ai = rule
            .ai_model_kind
            .map(|k| format!(" [ai: {k}]"))
            .unwrap_or_default();
        println!(
            "{:>4}  {:<16} {}{}  ({})",
            rule.priority,
            rule.category.as_str(),
            rule.description,
            ai,
            rule.extensions.join(" ")
        );
    }

    Ok(())
}

fn cmd_rules_export(path: &Path, rules_path: Option<&Path>) -> Result<()> {
    let rules = load_rules(rules_path)?;
    rules.save(path)?;
    println!("Exported {} rules to {}", rules.len(), path.display());
    Ok(())
}
