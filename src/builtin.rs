use crate::env::Environment;
use crate::error::ShellError;
use anyhow::Result;
use argh::{EarlyExit, FromArgs};
use std::env;
use std::io::{self, Write};
use std::path::PathBuf;

/// Conventional process exit code: 0 for success, non-zero for failure.
pub type ExitCode = i32;

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed
/// directly in the shell's own process, which is what lets `cd` and `exit`
/// affect the shell itself.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "cd" or "exit".
    fn name() -> &'static str;

    /// Executes the command using provided IO streams and environment.
    ///
    /// Return value should follow shell conventions: 0 for success, non-zero for error.
    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode>;
}

/// Entry of the builtin table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Cd,
    Help,
    Exit,
    History,
}

impl Builtin {
    /// The builtin table, in lookup order.
    pub const ALL: [Builtin; 4] = [Self::Cd, Self::Help, Self::Exit, Self::History];

    pub fn name(self) -> &'static str {
        match self {
            Self::Cd => Cd::name(),
            Self::Help => Help::name(),
            Self::Exit => Exit::name(),
            Self::History => History::name(),
        }
    }

    /// Parses `args` (without the command name) and runs the builtin.
    ///
    /// Usage and execution errors are written to `stderr`; they never escape
    /// as `Err` because the read loop only needs the exit code.
    pub fn run(
        self,
        args: &[&str],
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
        env: &mut Environment,
    ) -> ExitCode {
        match self {
            Self::Cd => invoke::<Cd>(args, stdout, stderr, env),
            Self::Help => invoke::<Help>(args, stdout, stderr, env),
            Self::Exit => invoke::<Exit>(args, stdout, stderr, env),
            Self::History => invoke::<History>(args, stdout, stderr, env),
        }
    }
}

/// Finds a builtin by name. The table is scanned in order and the first
/// match wins.
pub fn lookup(name: &str) -> Option<Builtin> {
    Builtin::ALL.into_iter().find(|builtin| builtin.name() == name)
}

fn invoke<T: BuiltinCommand>(
    args: &[&str],
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
    env: &mut Environment,
) -> ExitCode {
    let cmd = match T::from_args(&[T::name()], args) {
        Ok(cmd) => cmd,
        Err(EarlyExit { output, status }) => {
            let sink: &mut dyn Write = if status.is_ok() { stdout } else { stderr };
            let _ = write_line(sink, &output);
            return if status.is_ok() { 0 } else { 1 };
        }
    };
    match cmd.execute(stdout, env) {
        Ok(code) => code,
        Err(e) => {
            let _ = write_line(stderr, &e.to_string());
            1
        }
    }
}

fn write_line(out: &mut dyn Write, text: &str) -> io::Result<()> {
    out.write_all(text.as_bytes())?;
    if !text.ends_with('\n') {
        out.write_all(b"\n")?;
    }
    out.flush()
}

/// Change the current working directory.
/// Without a target, or with `~`, changes to the effective user's home directory.
pub struct Cd {
    /// First operand, taken verbatim. Names such as `help` or `-x` are
    /// directories like any other; operands after the first are ignored.
    pub target: Option<String>,
}

impl FromArgs for Cd {
    fn from_args(_command_name: &[&str], args: &[&str]) -> Result<Self, EarlyExit> {
        Ok(Cd {
            target: args.first().map(|arg| arg.to_string()),
        })
    }
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn execute(self, _stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        let target = match self.target.as_deref() {
            None | Some("~") => env.home.clone().ok_or_else(|| ShellError::DirectoryChange {
                path: "~".to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "home directory is unknown"),
            })?,
            Some(path) => PathBuf::from(path),
        };

        env::set_current_dir(&target).map_err(|source| ShellError::DirectoryChange {
            path: target.display().to_string(),
            source,
        })?;
        log::debug!("cwd is now {}", target.display());
        Ok(0)
    }
}

/// Print the names of the builtin commands.
pub struct Help;

impl FromArgs for Help {
    fn from_args(_command_name: &[&str], _args: &[&str]) -> Result<Self, EarlyExit> {
        Ok(Help)
    }
}

impl BuiltinCommand for Help {
    fn name() -> &'static str {
        "help"
    }

    fn execute(self, stdout: &mut dyn Write, _env: &mut Environment) -> Result<ExitCode> {
        writeln!(stdout, "Available commands:")?;
        for builtin in Builtin::ALL {
            writeln!(stdout, "- {}", builtin.name())?;
        }
        Ok(0)
    }
}

/// Exit shell process with status 0. Arguments are accepted and ignored.
pub struct Exit;

impl FromArgs for Exit {
    fn from_args(_command_name: &[&str], _args: &[&str]) -> Result<Self, EarlyExit> {
        Ok(Exit)
    }
}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn execute(self, _stdout: &mut dyn Write, _env: &mut Environment) -> Result<ExitCode> {
        std::process::exit(0)
    }
}

#[derive(FromArgs)]
/// Print the command history of this session, oldest first.
pub struct History {}

impl BuiltinCommand for History {
    fn name() -> &'static str {
        "history"
    }

    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        for (index, line) in env.history.iter().enumerate() {
            writeln!(stdout, "{}. {}", index + 1, line)?;
        }
        Ok(0)
    }
}
