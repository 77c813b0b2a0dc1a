//! Command-line interface orchestration for cmdtree.
//!
//! `generate` folds a JSON list of command strings into a tree and writes it
//! under the documentation root; `plan` prints the tree it would write.

mod commands;

pub use commands::{
    Cli, CliError, CollisionChoice, Command, ExecutionSummary, GenerateCommand, InputArgs,
    LayoutChoice, Outcome, OutputFormat, PlanCommand, TreeArgs, render_summary, run_cli,
};

#[cfg(test)]
mod test_helpers;
