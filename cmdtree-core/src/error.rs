//! Error types for the cmdtree core library.
//!
//! Two layers are kept apart: [`CommandError`] describes a problem with one
//! input command and is collected into the run report, while [`CmdtreeError`]
//! covers configuration mistakes and filesystem failures that stop a run.

use std::{fmt, io, sync::Arc};

use camino::Utf8PathBuf;
use thiserror::Error;

macro_rules! define_error_codes {
    (
        $(#[$enum_meta:meta])*
        enum $CodeTy:ident for $ErrTy:ident {
            $(
                $(#[$variant_meta:meta])*
                $CodeVariant:ident => $ErrVariant:ident $( { $($pattern:tt)* } )? => $code:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        #[non_exhaustive]
        pub enum $CodeTy {
            $(
                $(#[$variant_meta])*
                $CodeVariant,
            )+
        }

        impl $CodeTy {
            /// Return the stable machine-readable representation of this error code.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$CodeVariant => $code,)+
                }
            }
        }

        impl fmt::Display for $CodeTy {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $ErrTy {
            #[doc = concat!(
                "Retrieve the stable [`",
                stringify!($CodeTy),
                "`] for this error."
            )]
            pub const fn code(&self) -> $CodeTy {
                match self {
                    $(Self::$ErrVariant $( { $($pattern)* } )? => $CodeTy::$CodeVariant,)+
                }
            }
        }
    };
}

/// Why a command string could not be turned into a path.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum MalformedReason {
    /// The first token was not the expected invocation literal.
    #[error("expected the command to start with `{expected}`")]
    MissingInvocation {
        /// Invocation literal the parser was configured with.
        expected: String,
    },
    /// Not enough tokens followed the invocation literal.
    #[error("expected at least 2 segments after the invocation, found {found}")]
    TooFewSegments {
        /// Number of segments present after the invocation literal.
        found: usize,
    },
}

/// A problem with a single input command.
///
/// These errors never abort a run: they are collected into the
/// [`crate::RunReport`] and the remaining commands are still processed.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum CommandError {
    /// The command did not have the `<tool> <segment> <segment>...` shape.
    #[error("malformed command `{command}`: {reason}")]
    MalformedCommand {
        /// Raw command string as supplied by the caller.
        command: String,
        /// What was wrong with it.
        reason: MalformedReason,
    },
    /// A segment would produce an unsafe or hidden filesystem path.
    #[error("command `{command}` contains path-unsafe segment `{segment}`")]
    InvalidSegment {
        /// Raw command string as supplied by the caller.
        command: String,
        /// The offending segment.
        segment: String,
    },
    /// A leaf/directory collision was left unresolved and the command dropped.
    #[error("collision at `{path}` left unresolved; dropped `{command}`")]
    CollisionUnresolved {
        /// Tree path of the contested node.
        path: Utf8PathBuf,
        /// Canonical form of the dropped command.
        command: String,
    },
}

define_error_codes! {
    /// Stable codes describing [`CommandError`] variants.
    enum CommandErrorCode for CommandError {
        /// The command did not have the expected shape.
        MalformedCommand => MalformedCommand { .. } => "CMDTREE_MALFORMED_COMMAND",
        /// A segment would produce an unsafe path.
        InvalidSegment => InvalidSegment { .. } => "CMDTREE_INVALID_SEGMENT",
        /// A collision was left unresolved.
        CollisionUnresolved => CollisionUnresolved { .. } => "CMDTREE_COLLISION_UNRESOLVED",
    }
}

impl CommandError {
    /// Returns the command string the error refers to.
    #[must_use]
    pub fn command(&self) -> &str {
        match self {
            Self::MalformedCommand { command, .. }
            | Self::InvalidSegment { command, .. }
            | Self::CollisionUnresolved { command, .. } => command,
        }
    }
}

/// Filesystem operation that was being attempted when a failure occurred.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FsOperation {
    /// Opening or creating the documentation root.
    OpenRoot,
    /// Listing an existing directory.
    Scan,
    /// Creating a directory.
    CreateDir,
    /// Opening a directory for traversal.
    OpenDir,
    /// Creating or writing a file.
    WriteFile,
    /// Reading a template file.
    ReadTemplate,
}

impl fmt::Display for FsOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::OpenRoot => "open root",
            Self::Scan => "scan",
            Self::CreateDir => "create directory",
            Self::OpenDir => "open directory",
            Self::WriteFile => "write file",
            Self::ReadTemplate => "read template",
        })
    }
}

/// Error type produced when configuring or running a [`crate::Scaffolder`].
#[non_exhaustive]
#[derive(Clone, Debug, Error)]
pub enum CmdtreeError {
    /// The invocation literal must be a single non-empty token.
    #[error("invocation literal `{got}` must be a single non-empty token")]
    InvalidInvocation {
        /// The rejected literal.
        got: String,
    },
    /// A configured file name component is not path-safe.
    #[error("`{got}` is not a usable {role}")]
    InvalidEntryName {
        /// Which setting carried the value.
        role: &'static str,
        /// The rejected value.
        got: String,
    },
    /// A template override could not be used.
    #[error("template `{path}` is invalid: {reason}")]
    InvalidTemplate {
        /// Path of the template file.
        path: Utf8PathBuf,
        /// Description of the problem.
        reason: String,
    },
    /// A filesystem operation failed; the run stops here.
    #[error("failed to {operation} `{path}`: {source}")]
    Filesystem {
        /// What was being attempted.
        operation: FsOperation,
        /// Path relative to the documentation root (or the root itself).
        path: Utf8PathBuf,
        /// Underlying operating system error.
        #[source]
        source: Arc<io::Error>,
    },
}

define_error_codes! {
    /// Stable codes describing [`CmdtreeError`] variants.
    enum CmdtreeErrorCode for CmdtreeError {
        /// The invocation literal is unusable.
        InvalidInvocation => InvalidInvocation { .. } => "CMDTREE_INVALID_INVOCATION",
        /// A configured file name component is not path-safe.
        InvalidEntryName => InvalidEntryName { .. } => "CMDTREE_INVALID_ENTRY_NAME",
        /// A template override could not be used.
        InvalidTemplate => InvalidTemplate { .. } => "CMDTREE_INVALID_TEMPLATE",
        /// A filesystem operation failed.
        FilesystemFailure => Filesystem { .. } => "CMDTREE_FILESYSTEM_FAILURE",
    }
}

impl CmdtreeError {
    pub(crate) fn filesystem(
        operation: FsOperation,
        path: impl Into<Utf8PathBuf>,
        source: io::Error,
    ) -> Self {
        Self::Filesystem {
            operation,
            path: path.into(),
            source: Arc::new(source),
        }
    }
}

/// Convenient alias for results returned by the core API.
pub type Result<T> = core::result::Result<T, CmdtreeError>;
