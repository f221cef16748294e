use nix::errno::Errno;
use std::io;

/// Errors produced while turning a command line into a running command.
///
/// Only [`ShellError::Allocation`] and [`ShellError::MalformedRedirection`]
/// abort the current line. Every other variant is reported and the read loop
/// carries on.
#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    /// Memory ran out while collecting tokens.
    #[error("allocation failed while splitting the command line")]
    Allocation,

    /// A redirection operator was the last token on the line.
    #[error("syntax error: `{operator}` must be followed by a file name")]
    MalformedRedirection { operator: String },

    /// A redirection target could not be opened.
    #[error("{path}: file doesn't exist")]
    FileNotFound {
        path: String,
        #[source]
        source: io::Error,
    },

    /// `cd` could not switch to the requested directory.
    #[error("cd: {path}: {source}")]
    DirectoryChange {
        path: String,
        #[source]
        source: io::Error,
    },

    /// The program could not be started.
    #[error("execvp: {program}: {source}")]
    Exec {
        program: String,
        #[source]
        source: io::Error,
    },

    /// Saving, replacing or restoring a standard descriptor failed.
    #[error("cannot redirect standard streams: {0}")]
    Descriptor(#[from] Errno),
}
