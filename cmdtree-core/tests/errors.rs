use std::io;

use cmdtree_core::{
    CmdtreeError, CmdtreeErrorCode, CommandError, CommandErrorCode, CommandParser, MalformedReason,
    ScaffolderBuilder,
};
use rstest::rstest;

#[rstest]
#[case(
    CommandError::MalformedCommand {
        command: "getlog".into(),
        reason: MalformedReason::MissingInvocation { expected: "acli".into() },
    },
    CommandErrorCode::MalformedCommand,
)]
#[case(
    CommandError::InvalidSegment { command: "acli .. x".into(), segment: "..".into() },
    CommandErrorCode::InvalidSegment,
)]
#[case(
    CommandError::CollisionUnresolved { path: "log".into(), command: "acli log get".into() },
    CommandErrorCode::CollisionUnresolved,
)]
fn returns_expected_command_code(#[case] error: CommandError, #[case] expected: CommandErrorCode) {
    assert_eq!(error.code(), expected);
    assert_eq!(error.code().as_str(), expected.as_str());
    assert!(expected.as_str().starts_with("CMDTREE_"));
}

#[rstest]
#[case(CmdtreeError::InvalidInvocation { got: String::new() }, "CMDTREE_INVALID_INVOCATION")]
#[case(
    CmdtreeError::InvalidEntryName { role: "rename suffix", got: "/".into() },
    "CMDTREE_INVALID_ENTRY_NAME",
)]
#[case(
    CmdtreeError::InvalidTemplate { path: "t/command.md".into(), reason: "bad".into() },
    "CMDTREE_INVALID_TEMPLATE",
)]
fn returns_expected_cmdtree_code(#[case] error: CmdtreeError, #[case] expected: &str) {
    assert_eq!(error.code().as_str(), expected);
    assert_eq!(error.code().to_string(), expected);
}

#[test]
fn filesystem_failure_keeps_the_source_error() {
    let missing = ScaffolderBuilder::new()
        .with_template_dir("/definitely/not/here")
        .build()
        .expect_err("template dir must exist");
    assert_eq!(missing.code(), CmdtreeErrorCode::FilesystemFailure);
    assert!(std::error::Error::source(&missing).is_some());
    let CmdtreeError::Filesystem { source, .. } = &missing else {
        panic!("expected a filesystem error, got {missing:?}");
    };
    assert_eq!(source.kind(), io::ErrorKind::NotFound);
}

#[test]
fn malformed_command_message_names_the_command() {
    let err = CommandParser::default()
        .parse("acli log")
        .expect_err("one segment is too few");
    assert_eq!(
        err.to_string(),
        "malformed command `acli log`: expected at least 2 segments after the invocation, found 1"
    );
}
