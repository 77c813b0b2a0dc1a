//! Command parsing: raw command strings into ordered path segments.

use std::fmt;

use crate::error::{CmdtreeError, CommandError, MalformedReason, Result};

/// Invocation literal used when none is configured.
pub const DEFAULT_INVOCATION: &str = "acli";

/// A command string that passed validation.
///
/// Equality compares the segment sequences only, so `acli  log get` and
/// `acli log get` are the same command.
///
/// # Examples
/// ```
/// use cmdtree_core::CommandParser;
///
/// let parser = CommandParser::new("acli").expect("literal is valid");
/// let command = parser.parse("acli  network nic   get").expect("command is valid");
/// assert_eq!(command.segments(), ["network", "nic", "get"]);
/// assert_eq!(command.canonical(), "acli network nic get");
/// ```
#[derive(Debug, Clone)]
pub struct ParsedCommand {
    raw: String,
    canonical: String,
    segments: Vec<String>,
}

impl ParsedCommand {
    /// Returns the command string exactly as supplied.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Returns the command with single spaces between tokens.
    #[must_use]
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    /// Returns the path segments following the invocation literal.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl PartialEq for ParsedCommand {
    fn eq(&self, other: &Self) -> bool {
        self.segments == other.segments
    }
}

impl Eq for ParsedCommand {}

impl fmt::Display for ParsedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}

/// Splits command strings into segments after checking the invocation literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandParser {
    invocation: String,
}

impl Default for CommandParser {
    fn default() -> Self {
        Self {
            invocation: DEFAULT_INVOCATION.to_owned(),
        }
    }
}

impl CommandParser {
    /// Creates a parser expecting `invocation` as the first token.
    ///
    /// # Errors
    /// Returns [`CmdtreeError::InvalidInvocation`] when the literal is empty or
    /// contains whitespace, since such a literal could never match a token.
    ///
    /// # Examples
    /// ```
    /// use cmdtree_core::CommandParser;
    ///
    /// assert!(CommandParser::new("acli").is_ok());
    /// assert!(CommandParser::new("two words").is_err());
    /// ```
    pub fn new(invocation: impl Into<String>) -> Result<Self> {
        let invocation = invocation.into();
        if invocation.is_empty() || invocation.chars().any(char::is_whitespace) {
            return Err(CmdtreeError::InvalidInvocation { got: invocation });
        }
        Ok(Self { invocation })
    }

    /// Returns the invocation literal the parser strips.
    #[must_use]
    pub fn invocation(&self) -> &str {
        &self.invocation
    }

    /// Parses one raw command string.
    ///
    /// # Errors
    /// Returns [`CommandError::MalformedCommand`] when the invocation literal is
    /// missing or fewer than two segments follow it, and
    /// [`CommandError::InvalidSegment`] when a segment is not path-safe.
    ///
    /// # Examples
    /// ```
    /// use cmdtree_core::{CommandError, CommandParser};
    ///
    /// let parser = CommandParser::default();
    /// assert!(matches!(
    ///     parser.parse("getlog"),
    ///     Err(CommandError::MalformedCommand { .. })
    /// ));
    /// assert!(matches!(
    ///     parser.parse("acli ../etc passwd"),
    ///     Err(CommandError::InvalidSegment { .. })
    /// ));
    /// ```
    pub fn parse(&self, raw: &str) -> core::result::Result<ParsedCommand, CommandError> {
        let mut tokens = raw.split_whitespace();
        if tokens.next() != Some(self.invocation.as_str()) {
            return Err(CommandError::MalformedCommand {
                command: raw.to_owned(),
                reason: MalformedReason::MissingInvocation {
                    expected: self.invocation.clone(),
                },
            });
        }

        let segments: Vec<String> = tokens.map(ToOwned::to_owned).collect();
        if segments.len() < 2 {
            return Err(CommandError::MalformedCommand {
                command: raw.to_owned(),
                reason: MalformedReason::TooFewSegments {
                    found: segments.len(),
                },
            });
        }

        if let Some(segment) = segments.iter().find(|segment| !is_path_safe(segment)) {
            return Err(CommandError::InvalidSegment {
                command: raw.to_owned(),
                segment: segment.clone(),
            });
        }

        let canonical = format!("{} {}", self.invocation, segments.join(" "));
        Ok(ParsedCommand {
            raw: raw.to_owned(),
            canonical,
            segments,
        })
    }
}

/// Returns whether `segment` can be used verbatim as a file or directory name.
///
/// Separators, NUL, `.`/`..` and hidden names are rejected.
pub(crate) fn is_path_safe(segment: &str) -> bool {
    !segment.is_empty()
        && !segment.starts_with('.')
        && !segment.contains(['/', '\\', '\0'])
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[rstest]
    #[case("acli log get", &["log", "get"])]
    #[case("  acli\tnetwork nic  config get ", &["network", "nic", "config", "get"])]
    #[case("acli Log GET", &["Log", "GET"])]
    fn parse_splits_on_whitespace(#[case] raw: &str, #[case] expected: &[&str]) {
        let command = CommandParser::default()
            .parse(raw)
            .expect("command must parse");
        assert_eq!(command.segments(), expected);
        assert_eq!(command.raw(), raw);
    }

    #[rstest]
    #[case::missing_prefix("getlog", 0)]
    #[case::wrong_prefix("bcli log get", 0)]
    #[case::empty("", 0)]
    #[case::one_segment("acli log", 1)]
    #[case::no_segments("acli", 0)]
    fn parse_rejects_malformed_commands(#[case] raw: &str, #[case] found: usize) {
        let err = CommandParser::default()
            .parse(raw)
            .expect_err("command must be rejected");
        let CommandError::MalformedCommand { command, reason } = err else {
            panic!("unexpected error: {err:?}");
        };
        assert_eq!(command, raw);
        match reason {
            MalformedReason::MissingInvocation { expected } => assert_eq!(expected, "acli"),
            MalformedReason::TooFewSegments { found: actual } => assert_eq!(actual, found),
        }
    }

    #[rstest]
    #[case("acli log/level get", "log/level")]
    #[case("acli log get\\all", "get\\all")]
    #[case("acli .. get", "..")]
    #[case("acli log .", ".")]
    #[case("acli .hidden get", ".hidden")]
    fn parse_rejects_unsafe_segments(#[case] raw: &str, #[case] expected: &str) {
        let err = CommandParser::default()
            .parse(raw)
            .expect_err("segment must be rejected");
        assert_eq!(
            err,
            CommandError::InvalidSegment {
                command: raw.to_owned(),
                segment: expected.to_owned(),
            }
        );
    }

    #[test]
    fn parse_honours_custom_invocation() {
        let parser = CommandParser::new("ctl").expect("literal is valid");
        let command = parser.parse("ctl disk list").expect("command must parse");
        assert_eq!(command.canonical(), "ctl disk list");
        assert!(parser.parse("acli disk list").is_err());
    }

    #[rstest]
    #[case("")]
    #[case("a cli")]
    #[case("acli\n")]
    fn new_rejects_unusable_invocations(#[case] literal: &str) {
        let err = CommandParser::new(literal).expect_err("literal must be rejected");
        assert!(matches!(err, CmdtreeError::InvalidInvocation { got } if got == literal));
    }

    #[test]
    fn commands_compare_by_segments() {
        let parser = CommandParser::default();
        let spaced = parser.parse("acli  log   get").expect("command must parse");
        let plain = parser.parse("acli log get").expect("command must parse");
        let other = parser.parse("acli log set").expect("command must parse");
        assert_eq!(spaced, plain);
        assert_ne!(plain, other);
        assert_eq!(spaced.to_string(), "acli log get");
    }
}
