//! Extraction and application of `<`, `>` and `>>` redirections.

use crate::error::ShellError;
use nix::unistd::{dup, dup2_stdin, dup2_stdout};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::os::fd::OwnedFd;
use std::os::unix::fs::OpenOptionsExt;

/// Kind of redirection
///
/// Defines the operation mode for an I/O redirection operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectKind {
    /// Input redirection (`<`): reads standard input from a file.
    Input,
    /// Output redirection (`>`): writes standard output to a file, creating it
    /// or truncating it first.
    Output,
    /// Output redirection with append (`>>`): appends standard output to a
    /// file that must already exist.
    Append,
}

impl RedirectKind {
    /// Recognizes a redirection operator token.
    pub fn from_operator(token: &str) -> Option<Self> {
        match token {
            "<" => Some(Self::Input),
            ">" => Some(Self::Output),
            ">>" => Some(Self::Append),
            _ => None,
        }
    }

    pub fn operator(self) -> &'static str {
        match self {
            Self::Input => "<",
            Self::Output => ">",
            Self::Append => ">>",
        }
    }
}

/// Redirection targets found on a command line.
///
/// Extraction stops at the first operator, so at most one field is set.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Redirections {
    /// File to read standard input from.
    pub input: Option<String>,
    /// File to write standard output to, truncating it.
    pub output: Option<String>,
    /// Existing file to append standard output to.
    pub append: Option<String>,
}

/// An opened redirection target, ready to replace a standard stream.
#[derive(Debug)]
pub enum Redirect {
    Stdin(File),
    Stdout(File),
}

impl Redirections {
    pub fn is_empty(&self) -> bool {
        self.input.is_none() && self.output.is_none() && self.append.is_none()
    }

    fn set(&mut self, kind: RedirectKind, target: String) {
        match kind {
            RedirectKind::Input => self.input = Some(target),
            RedirectKind::Output => self.output = Some(target),
            RedirectKind::Append => self.append = Some(target),
        }
    }

    /// Opens the effective target.
    ///
    /// Precedence is output, then append, then input. Output files are
    /// created with mode 0644 and truncated; append targets are never
    /// created.
    pub fn open(&self) -> Result<Option<Redirect>, ShellError> {
        if let Some(path) = &self.output {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o644)
                .open(path)
                .map_err(|source| not_found(path, source))?;
            return Ok(Some(Redirect::Stdout(file)));
        }
        if let Some(path) = &self.append {
            let file = OpenOptions::new()
                .append(true)
                .open(path)
                .map_err(|source| not_found(path, source))?;
            return Ok(Some(Redirect::Stdout(file)));
        }
        if let Some(path) = &self.input {
            let file = File::open(path).map_err(|source| not_found(path, source))?;
            return Ok(Some(Redirect::Stdin(file)));
        }
        Ok(None)
    }
}

fn not_found(path: &str, source: io::Error) -> ShellError {
    ShellError::FileNotFound {
        path: path.to_owned(),
        source,
    }
}

/// Removes the first redirection from `args` and returns its target.
///
/// The argument list is cut at the operator, so the operator, its file name
/// and anything after them are dropped; later operators never take effect.
/// An operator without a following file name is an error and leaves `args`
/// untouched.
pub fn extract_redirections(args: &mut Vec<String>) -> Result<Redirections, ShellError> {
    let mut redirections = Redirections::default();
    let Some((pos, kind)) = args
        .iter()
        .enumerate()
        .find_map(|(i, arg)| RedirectKind::from_operator(arg).map(|kind| (i, kind)))
    else {
        return Ok(redirections);
    };

    if pos + 1 >= args.len() {
        return Err(ShellError::MalformedRedirection {
            operator: kind.operator().to_owned(),
        });
    }

    let tail = args.split_off(pos);
    if let Some(target) = tail.into_iter().nth(1) {
        log::debug!("redirect {} {target}", kind.operator());
        redirections.set(kind, target);
    }
    Ok(redirections)
}

/// Saved copies of the shell's standard input and output.
///
/// A redirection applied through the guard lasts until the guard is dropped,
/// at which point both streams are put back and the copies are closed.
#[derive(Debug)]
pub struct RedirGuard {
    stdin: OwnedFd,
    stdout: OwnedFd,
}

impl RedirGuard {
    pub fn save() -> Result<Self, ShellError> {
        Ok(Self {
            stdin: dup(io::stdin())?,
            stdout: dup(io::stdout())?,
        })
    }

    /// Points the matching standard stream at the opened file. The file's own
    /// descriptor is closed once it has been duplicated.
    pub fn apply(&mut self, redirect: Redirect) -> Result<(), ShellError> {
        match redirect {
            Redirect::Stdout(file) => {
                let _ = io::stdout().flush();
                dup2_stdout(&file)?;
            }
            Redirect::Stdin(file) => dup2_stdin(&file)?,
        }
        Ok(())
    }
}

impl Drop for RedirGuard {
    fn drop(&mut self) {
        let _ = io::stdout().flush();
        if let Err(e) = dup2_stdin(&self.stdin) {
            log::error!("failed to restore standard input: {e}");
        }
        if let Err(e) = dup2_stdout(&self.stdout) {
            log::error!("failed to restore standard output: {e}");
        }
    }
}
