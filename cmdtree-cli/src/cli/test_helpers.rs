//! Small helpers shared across CLI tests.

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;

use super::{
    Cli, CliError, Command, ExecutionSummary, GenerateCommand, InputArgs, OutputFormat,
    PlanCommand, TreeArgs, render_summary, run_cli,
};

pub(super) type TestResult = Result<(), Box<dyn std::error::Error>>;

pub(super) fn temp_dir() -> TempDir {
    match TempDir::new() {
        Ok(dir) => dir,
        Err(err) => panic!("failed to create temp dir: {err}"),
    }
}

pub(super) fn write_input(
    dir: &TempDir,
    contents: &str,
) -> Result<Utf8PathBuf, Box<dyn std::error::Error>> {
    let path = Utf8PathBuf::try_from(dir.path().join("commands.json"))?;
    fs::write(&path, contents)?;
    Ok(path)
}

pub(super) fn inline(commands: &[&str]) -> InputArgs {
    let raw =
        serde_json::to_string(commands).unwrap_or_else(|err| panic!("encode commands: {err}"));
    InputArgs {
        path: None,
        commands: Some(raw),
    }
}

pub(super) fn tree_at(root: &Utf8Path) -> TreeArgs {
    TreeArgs {
        root: root.to_path_buf(),
        ..TreeArgs::default()
    }
}

pub(super) fn generate(input: InputArgs, tree: TreeArgs, format: OutputFormat) -> Cli {
    Cli {
        command: Command::Generate(GenerateCommand {
            input,
            tree,
            templates: None,
            format,
        }),
    }
}

pub(super) fn plan(input: InputArgs, tree: TreeArgs, format: OutputFormat) -> Cli {
    Cli {
        command: Command::Plan(PlanCommand {
            input,
            tree,
            format,
        }),
    }
}

pub(super) fn run_cli_expecting_error(cli: Cli, panic_msg: &str) -> CliError {
    match run_cli(cli) {
        Ok(_) => panic!("{panic_msg}"),
        Err(err) => err,
    }
}

pub(super) fn rendered(summary: &ExecutionSummary) -> String {
    let mut buffer = Vec::new();
    if let Err(err) = render_summary(summary, &mut buffer) {
        panic!("rendering into memory must succeed: {err}");
    }
    match String::from_utf8(buffer) {
        Ok(text) => text,
        Err(err) => panic!("report must be UTF-8: {err}"),
    }
}
