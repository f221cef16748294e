//! Running one command line: builtins in-process, everything else in a child.

use crate::builtin::{self, Builtin};
use crate::env::Environment;
use crate::error::ShellError;
use crate::redirect::{RedirGuard, Redirect, Redirections};
use nix::sys::signal::{SigHandler, Signal, signal};
use nix::sys::wait::{WaitPidFlag, WaitStatus, waitpid};
use nix::unistd::Pid;
use std::io;
use std::os::unix::process::CommandExt;
use std::process::{Child, Command};

/// Token that marks a pipeline. Pipelines are recognized but not run.
const PIPE: &str = "|";

/// Runs `args` with the given redirection.
///
/// Failures are reported on standard error and never returned. When an
/// external program ran, its wait status is handed back so the caller can
/// tell whether it was interrupted; it never becomes the shell's exit code.
pub fn execute(
    args: &[String],
    redirections: &Redirections,
    env: &mut Environment,
) -> Option<WaitStatus> {
    let (name, rest) = args.split_first()?;
    match builtin::lookup(name) {
        Some(builtin) => {
            run_builtin(builtin, rest, redirections, env);
            None
        }
        None if args.iter().any(|arg| arg == PIPE) => {
            log::warn!("pipelines are not supported, ignoring `{}`", args.join(" "));
            None
        }
        None => run_external(name, rest, redirections),
    }
}

/// Whether a child was terminated by SIGINT.
pub fn killed_by_interrupt(status: &WaitStatus) -> bool {
    matches!(status, WaitStatus::Signaled(_, Signal::SIGINT, _))
}

fn run_builtin(builtin: Builtin, args: &[String], redirections: &Redirections, env: &mut Environment) {
    // Held until the streams are restored so other threads cannot write
    // into the redirection target.
    let mut stdout = io::stdout().lock();
    let mut guard = match RedirGuard::save() {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{e}");
            return;
        }
    };
    match redirections.open() {
        Ok(Some(redirect)) => {
            if let Err(e) = guard.apply(redirect) {
                eprintln!("{e}");
            }
        }
        Ok(None) => {}
        Err(e) => eprintln!("{e}"),
    }

    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    let code = builtin.run(&args, &mut stdout, &mut io::stderr(), env);
    log::debug!("builtin {} finished with {code}", builtin.name());
    drop(guard);
}

fn run_external(name: &str, args: &[String], redirections: &Redirections) -> Option<WaitStatus> {
    let mut cmd = Command::new(name);
    cmd.args(args);

    // An unopenable target is reported and the program runs without it.
    match redirections.open() {
        Ok(Some(Redirect::Stdout(file))) => {
            cmd.stdout(file);
        }
        Ok(Some(Redirect::Stdin(file))) => {
            cmd.stdin(file);
        }
        Ok(None) => {}
        Err(e) => eprintln!("{e}"),
    }

    // SAFETY: the hook only calls `signal`, which is async-signal-safe.
    unsafe {
        cmd.pre_exec(restore_default_interrupt);
    }

    match cmd.spawn() {
        Ok(child) => wait_for(child),
        Err(source) => {
            let err = ShellError::Exec {
                program: name.to_owned(),
                source,
            };
            eprintln!("{err}");
            println!("Invalid Command");
            None
        }
    }
}

/// Lets the child be interrupted normally instead of through the shell's
/// handler.
fn restore_default_interrupt() -> io::Result<()> {
    // SAFETY: installing the default disposition registers no Rust code as a
    // signal handler.
    unsafe { signal(Signal::SIGINT, SigHandler::SigDfl) }
        .map(drop)
        .map_err(io::Error::from)
}

/// Blocks until the child terminates or stops.
fn wait_for(child: Child) -> Option<WaitStatus> {
    let pid = match i32::try_from(child.id()) {
        Ok(pid) => Pid::from_raw(pid),
        Err(e) => {
            log::error!("child pid {} out of range: {e}", child.id());
            return None;
        }
    };
    match waitpid(pid, Some(WaitPidFlag::WUNTRACED)) {
        Ok(status) => {
            log::debug!("child {pid} changed state: {status:?}");
            Some(status)
        }
        Err(e) => {
            log::error!("waitpid({pid}) failed: {e}");
            None
        }
    }
}
