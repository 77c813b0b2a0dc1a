//! Command implementations and argument parsing for the cmdtree CLI.

use std::fs;
use std::io::{self, Read, Write};

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser, Subcommand, ValueEnum};
use cmdtree_core::{
    Artifact, CmdtreeError, CollisionPolicy, CollisionRecord, CommandError, DEFAULT_ENTRY,
    DEFAULT_INVOCATION, DEFAULT_RENAME_SUFFIX, DuplicateRecord, LeafLayout, Plan, RunReport,
    Scaffolder, ScaffolderBuilder,
};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{Span, field, info, instrument, warn};

const DEFAULT_ROOT: &str = "docs";
const STDIN_MARKER: &str = "-";

/// Top-level CLI options parsed by [`clap`].
#[derive(Debug, Parser, Clone)]
#[command(
    name = "cmdtree",
    about = "Scaffold a Docusaurus documentation tree from command strings."
)]
pub struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported CLI commands.
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Create the directories, descriptors, and documents for the commands.
    Generate(GenerateCommand),
    /// Show the tree the commands would produce without writing anything.
    Plan(PlanCommand),
}

/// Options accepted by the `generate` command.
#[derive(Debug, Args, Clone)]
pub struct GenerateCommand {
    /// Where the command list comes from.
    #[command(flatten)]
    pub input: InputArgs,

    /// How the command list is folded into a tree.
    #[command(flatten)]
    pub tree: TreeArgs,

    /// Directory holding template overrides (`_category_.json`, `command.md`, ...).
    #[arg(long, value_name = "DIR")]
    pub templates: Option<Utf8PathBuf>,

    /// Output format for the run report.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Options accepted by the `plan` command.
#[derive(Debug, Args, Clone)]
pub struct PlanCommand {
    /// Where the command list comes from.
    #[command(flatten)]
    pub input: InputArgs,

    /// How the command list is folded into a tree.
    #[command(flatten)]
    pub tree: TreeArgs,

    /// Output format for the plan.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Command list sources.
#[derive(Debug, Args, Clone, Default)]
pub struct InputArgs {
    /// JSON file holding an array of command strings; `-` or nothing reads stdin.
    #[arg(value_name = "INPUT")]
    pub path: Option<Utf8PathBuf>,

    /// Inline JSON array of command strings.
    #[arg(long, value_name = "JSON", conflicts_with = "path")]
    pub commands: Option<String>,
}

/// Tree shaping options shared by every command.
#[derive(Debug, Args, Clone)]
pub struct TreeArgs {
    /// Documentation root the tree is written under.
    #[arg(long, value_name = "DIR", default_value = DEFAULT_ROOT)]
    pub root: Utf8PathBuf,

    /// Literal every command must start with.
    #[arg(long, value_name = "NAME", default_value = DEFAULT_INVOCATION)]
    pub tool: String,

    /// Which segment names the generated document.
    #[arg(long, value_enum, default_value_t = LayoutChoice::Action)]
    pub layout: LayoutChoice,

    /// How leaf/directory collisions are resolved.
    #[arg(long, value_enum, default_value_t = CollisionChoice::Merge)]
    pub collision: CollisionChoice,

    /// Suffix used by `--collision rename`.
    #[arg(
        long,
        value_name = "SUFFIX",
        default_value = DEFAULT_RENAME_SUFFIX,
        allow_hyphen_values = true,
    )]
    pub suffix: String,

    /// Document name used by `--collision merge`.
    #[arg(long = "default-entry", value_name = "NAME", default_value = DEFAULT_ENTRY)]
    pub default_entry: String,
}

impl Default for TreeArgs {
    fn default() -> Self {
        Self {
            root: Utf8PathBuf::from(DEFAULT_ROOT),
            tool: DEFAULT_INVOCATION.to_owned(),
            layout: LayoutChoice::Action,
            collision: CollisionChoice::Merge,
            suffix: DEFAULT_RENAME_SUFFIX.to_owned(),
            default_entry: DEFAULT_ENTRY.to_owned(),
        }
    }
}

/// Leaf layouts selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LayoutChoice {
    /// One document per action: `system/config/change.md`.
    Action,
    /// One document per object: `system/config.md`.
    Object,
}

impl From<LayoutChoice> for LeafLayout {
    fn from(choice: LayoutChoice) -> Self {
        match choice {
            LayoutChoice::Action => Self::ActionDocument,
            LayoutChoice::Object => Self::ObjectDocument,
        }
    }
}

/// Collision policies selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CollisionChoice {
    /// Keep the document inside the directory as its default entry.
    Merge,
    /// Move the document to a suffixed sibling.
    Rename,
    /// Drop the colliding command.
    Skip,
}

/// Report formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary.
    Text,
    /// Pretty-printed JSON document.
    Json,
}

/// Errors surfaced while executing CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Reading the input file failed.
    #[error("failed to read `{path}`: {source}")]
    Io {
        /// Path that triggered the failure.
        path: Utf8PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// Reading standard input failed.
    #[error("failed to read commands from stdin: {source}")]
    Stdin {
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// The input was not a JSON array of strings.
    #[error("{origin} is not a JSON array of command strings: {source}")]
    InvalidJson {
        /// Where the input came from.
        origin: String,
        /// Decoder failure.
        #[source]
        source: serde_json::Error,
    },
    /// The input array held no commands.
    #[error("{origin} contains no commands")]
    EmptyInput {
        /// Where the input came from.
        origin: String,
    },
    /// Configuration or generation failed.
    #[error(transparent)]
    Core(#[from] CmdtreeError),
}

/// What a command produced.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// The report of a `generate` run.
    Generated(RunReport),
    /// The tree a `plan` run would produce.
    Planned(Plan),
}

/// Summarises the outcome of executing a CLI command.
#[derive(Debug, Clone)]
pub struct ExecutionSummary {
    /// Requested output format.
    pub format: OutputFormat,
    /// Result of the command.
    pub outcome: Outcome,
}

impl ExecutionSummary {
    /// Returns the error that stopped generation early, if any.
    #[must_use]
    pub fn failure(&self) -> Option<&CmdtreeError> {
        match &self.outcome {
            Outcome::Generated(report) => report.failure(),
            Outcome::Planned(_) => None,
        }
    }
}

/// Executes the CLI command represented by `cli`.
///
/// # Errors
/// Returns [`CliError`] when the input cannot be loaded or the configuration
/// is rejected. Filesystem failures during generation are carried inside the
/// returned report instead.
///
/// # Examples
/// ```
/// # use std::error::Error;
/// # use camino::Utf8PathBuf;
/// # use cmdtree_cli::cli::{
/// #     Cli, Command, GenerateCommand, InputArgs, OutputFormat, Outcome, TreeArgs, run_cli,
/// # };
/// # use tempfile::TempDir;
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let dir = TempDir::new()?;
/// let root = Utf8PathBuf::try_from(dir.path().join("docs"))?;
/// let cli = Cli {
///     command: Command::Generate(GenerateCommand {
///         input: InputArgs {
///             path: None,
///             commands: Some(r#"["acli log get"]"#.into()),
///         },
///         tree: TreeArgs { root: root.clone(), ..TreeArgs::default() },
///         templates: None,
///         format: OutputFormat::Text,
///     }),
/// };
/// let summary = run_cli(cli)?;
/// assert!(matches!(summary.outcome, Outcome::Generated(ref report) if report.is_success()));
/// assert!(root.join("log/get.md").is_file());
/// # Ok(())
/// # }
/// ```
#[instrument(name = "cli.run", err, skip(cli), fields(command = field::Empty))]
pub fn run_cli(cli: Cli) -> Result<ExecutionSummary, CliError> {
    let span = Span::current();
    match cli.command {
        Command::Generate(generate) => {
            span.record("command", field::display("generate"));
            run_generate(generate)
        }
        Command::Plan(plan) => {
            span.record("command", field::display("plan"));
            run_plan(plan)
        }
    }
}

#[instrument(
    name = "cli.generate",
    err,
    skip(command),
    fields(root = %command.tree.root, commands = field::Empty, created = field::Empty),
)]
pub(super) fn run_generate(command: GenerateCommand) -> Result<ExecutionSummary, CliError> {
    let GenerateCommand {
        input,
        tree,
        templates,
        format,
    } = command;
    let commands = load_commands(&input)?;
    let span = Span::current();
    span.record("commands", commands.len());

    let mut builder = configure(&tree);
    if let Some(dir) = templates {
        builder = builder.with_template_dir(dir);
    }
    let report = builder.build()?.run(&tree.root, &commands);
    span.record("created", report.created().len());

    if let Some(failure) = report.failure() {
        warn!(code = failure.code().as_str(), "generation stopped early");
    } else {
        info!(
            created = report.created().len(),
            existing = report.existing().len(),
            issues = report.issues().len(),
            "generation completed"
        );
    }
    Ok(ExecutionSummary {
        format,
        outcome: Outcome::Generated(report),
    })
}

#[instrument(
    name = "cli.plan",
    err,
    skip(command),
    fields(root = %command.tree.root, commands = field::Empty),
)]
pub(super) fn run_plan(command: PlanCommand) -> Result<ExecutionSummary, CliError> {
    let PlanCommand {
        input,
        tree,
        format,
    } = command;
    let commands = load_commands(&input)?;
    Span::current().record("commands", commands.len());

    let scaffolder: Scaffolder = configure(&tree).build()?;
    let plan = scaffolder.plan_against(&tree.root, &commands)?;
    info!(
        paths = plan.paths().len(),
        collisions = plan.collisions().len(),
        "plan completed"
    );
    Ok(ExecutionSummary {
        format,
        outcome: Outcome::Planned(plan),
    })
}

pub(super) fn configure(tree: &TreeArgs) -> ScaffolderBuilder {
    let policy = match tree.collision {
        CollisionChoice::Merge => CollisionPolicy::MergeAsDefault {
            entry: tree.default_entry.clone(),
        },
        CollisionChoice::Rename => CollisionPolicy::RenameWithSuffix {
            suffix: tree.suffix.clone(),
        },
        CollisionChoice::Skip => CollisionPolicy::Skip,
    };
    ScaffolderBuilder::new()
        .with_invocation(tree.tool.clone())
        .with_leaf_layout(tree.layout.into())
        .with_collision_policy(policy)
}

#[instrument(name = "cli.load_commands", err, skip(input), fields(source = field::Empty))]
pub(super) fn load_commands(input: &InputArgs) -> Result<Vec<String>, CliError> {
    let span = Span::current();
    if let Some(raw) = &input.commands {
        span.record("source", field::display("inline"));
        return parse_commands(raw, "--commands");
    }
    match input.path.as_deref() {
        Some(path) if path.as_str() != STDIN_MARKER => {
            span.record("source", field::display(path));
            let raw = read_file(path)?;
            parse_commands(&raw, path.as_str())
        }
        _ => {
            span.record("source", field::display("stdin"));
            let mut raw = String::new();
            io::stdin()
                .lock()
                .read_to_string(&mut raw)
                .map_err(|source| CliError::Stdin { source })?;
            parse_commands(&raw, "stdin")
        }
    }
}

fn read_file(path: &Utf8Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub(super) fn parse_commands(raw: &str, origin: &str) -> Result<Vec<String>, CliError> {
    let commands: Vec<String> =
        serde_json::from_str(raw).map_err(|source| CliError::InvalidJson {
            origin: origin.to_owned(),
            source,
        })?;
    if commands.is_empty() {
        return Err(CliError::EmptyInput {
            origin: origin.to_owned(),
        });
    }
    Ok(commands)
}

/// Renders `summary` to `writer` in the requested format.
///
/// # Errors
/// Returns [`io::Error`] if writing to the supplied writer fails.
///
/// # Examples
/// ```
/// # use std::error::Error;
/// # use cmdtree_cli::cli::{ExecutionSummary, OutputFormat, Outcome, render_summary};
/// # use cmdtree_core::ScaffolderBuilder;
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let plan = ScaffolderBuilder::new().build()?.plan(&["acli log get"]);
/// let summary = ExecutionSummary {
///     format: OutputFormat::Text,
///     outcome: Outcome::Planned(plan),
/// };
/// let mut buffer = Vec::new();
/// render_summary(&summary, &mut buffer)?;
/// assert!(String::from_utf8(buffer)?.starts_with("log/\n  get.md\n"));
/// # Ok(())
/// # }
/// ```
pub fn render_summary(summary: &ExecutionSummary, mut writer: impl Write) -> io::Result<()> {
    match (summary.format, &summary.outcome) {
        (OutputFormat::Text, Outcome::Generated(report)) => render_report(report, &mut writer),
        (OutputFormat::Text, Outcome::Planned(plan)) => render_plan(plan, &mut writer),
        (OutputFormat::Json, Outcome::Generated(report)) => {
            write_json(&report_json(report), &mut writer)
        }
        (OutputFormat::Json, Outcome::Planned(plan)) => write_json(&plan_json(plan), &mut writer),
    }
}

fn render_report(report: &RunReport, writer: &mut impl Write) -> io::Result<()> {
    writeln!(writer, "created: {}", report.created().len())?;
    for artifact in report.created() {
        writeln!(writer, "  {}\t{}", artifact.kind.as_str(), artifact.path)?;
    }
    writeln!(writer, "existing: {}", report.existing().len())?;
    render_findings(
        report.duplicates(),
        report.collisions(),
        report.issues(),
        writer,
    )?;
    writeln!(writer, "label conflicts: {}", report.label_conflicts().len())?;
    for conflict in report.label_conflicts() {
        writeln!(
            writer,
            "  {} `{}` (first used by {})",
            conflict.path, conflict.label, conflict.first
        )?;
    }
    match report.failure() {
        Some(failure) => writeln!(writer, "failure: {} {failure}", failure.code()),
        None => writeln!(writer, "failure: none"),
    }
}

fn render_plan(plan: &Plan, writer: &mut impl Write) -> io::Result<()> {
    write!(writer, "{}", plan.outline())?;
    render_findings(plan.duplicates(), plan.collisions(), plan.issues(), writer)
}

fn render_findings(
    duplicates: &[DuplicateRecord],
    collisions: &[CollisionRecord],
    issues: &[CommandError],
    writer: &mut impl Write,
) -> io::Result<()> {
    writeln!(writer, "duplicates: {}", duplicates.len())?;
    for duplicate in duplicates {
        writeln!(writer, "  {} -> {}", duplicate.command, duplicate.document)?;
    }
    writeln!(writer, "collisions: {}", collisions.len())?;
    for collision in collisions {
        writeln!(
            writer,
            "  {} ({}): {}",
            collision.path,
            collision.kind.as_str(),
            collision.resolution
        )?;
    }
    writeln!(writer, "issues: {}", issues.len())?;
    for issue in issues {
        writeln!(writer, "  {} {issue}", issue.code())?;
    }
    Ok(())
}

fn write_json(value: &Value, writer: &mut impl Write) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, value)?;
    writeln!(writer)
}

pub(super) fn report_json(report: &RunReport) -> Value {
    let artifacts = |artifacts: &[Artifact]| -> Vec<Value> {
        artifacts
            .iter()
            .map(|artifact| json!({ "path": artifact.path.as_str(), "kind": artifact.kind.as_str() }))
            .collect()
    };
    json!({
        "status": if report.is_success() { "ok" } else { "failed" },
        "created": artifacts(report.created()),
        "existing": artifacts(report.existing()),
        "duplicates": duplicates_json(report.duplicates()),
        "collisions": collisions_json(report.collisions()),
        "label_conflicts": report
            .label_conflicts()
            .iter()
            .map(|conflict| json!({
                "label": conflict.label,
                "path": conflict.path.as_str(),
                "first": conflict.first.as_str(),
            }))
            .collect::<Vec<_>>(),
        "issues": issues_json(report.issues()),
        "failure": report.failure().map(|failure| json!({
            "code": failure.code().as_str(),
            "message": failure.to_string(),
        })),
    })
}

pub(super) fn plan_json(plan: &Plan) -> Value {
    json!({
        "paths": plan
            .paths()
            .iter()
            .map(|path| path.as_str().to_owned())
            .collect::<Vec<_>>(),
        "duplicates": duplicates_json(plan.duplicates()),
        "collisions": collisions_json(plan.collisions()),
        "issues": issues_json(plan.issues()),
    })
}

fn duplicates_json(duplicates: &[DuplicateRecord]) -> Vec<Value> {
    duplicates
        .iter()
        .map(|duplicate| json!({ "command": duplicate.command, "document": duplicate.document.as_str() }))
        .collect()
}

fn collisions_json(collisions: &[CollisionRecord]) -> Vec<Value> {
    collisions
        .iter()
        .map(|collision| {
            json!({
                "path": collision.path.as_str(),
                "kind": collision.kind.as_str(),
                "commands": collision.commands,
                "resolution": collision.resolution.to_string(),
            })
        })
        .collect()
}

fn issues_json(issues: &[CommandError]) -> Vec<Value> {
    issues
        .iter()
        .map(|issue| {
            json!({
                "code": issue.code().as_str(),
                "command": issue.command(),
                "message": issue.to_string(),
            })
        })
        .collect()
}
