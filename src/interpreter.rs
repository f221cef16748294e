use crate::env::Environment;
use crate::error::ShellError;
use crate::executor;
use crate::interrupt::InterruptController;
use crate::lexer;
use crate::prompt;
use crate::redirect;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// How long to wait for the shell's own copy of a SIGINT that killed a child.
const INTERRUPT_SETTLE: Duration = Duration::from_millis(100);

/// An interactive shell session.
///
/// The interpreter owns the session [`Environment`] and the
/// [`InterruptController`] that the SIGINT handler reports to. See
/// [`Interpreter::repl`] for the read loop and [`Interpreter::run_line`] for
/// what happens to each line.
///
/// Example
/// ```no_run
/// use vsh::Interpreter;
/// Interpreter::default().repl().unwrap();
/// ```
pub struct Interpreter {
    env: Environment,
    interrupts: Arc<InterruptController>,
}

impl Interpreter {
    pub fn new(env: Environment) -> Self {
        Self {
            env,
            interrupts: Arc::new(InterruptController::new()),
        }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn interrupts(&self) -> &Arc<InterruptController> {
        &self.interrupts
    }

    /// Tokenizes one line, extracts its redirection and runs it.
    ///
    /// A blank line does nothing. Errors returned here abort the line before
    /// anything runs; errors while running are reported by the executor.
    /// A child killed by SIGINT counts as an interrupt of the line, so the
    /// next iteration of the loop starts on a fresh line.
    pub fn run_line(&mut self, line: &str) -> Result<(), ShellError> {
        let mut args = lexer::tokenize(line)?;
        if args.is_empty() {
            return Ok(());
        }
        log::debug!("tokens: {args:?}");

        let redirections = redirect::extract_redirections(&mut args)?;
        let status = executor::execute(&args, &redirections, &mut self.env);
        if status.as_ref().is_some_and(executor::killed_by_interrupt)
            && !self.interrupts.settle(INTERRUPT_SETTLE)
        {
            log::debug!("child was interrupted without the shell seeing SIGINT");
            self.interrupts.raise();
        }
        Ok(())
    }

    /// Consumes a pending interrupt, moving `out` to a fresh line if there
    /// was one. Returns whether the previous line was interrupted.
    fn restart_if_interrupted(&self, out: &mut dyn Write) -> io::Result<bool> {
        if !self.interrupts.poll_and_clear() {
            return Ok(false);
        }
        writeln!(out)?;
        out.flush()?;
        Ok(true)
    }

    /// Adds a non-blank line to the editor's history, and to the session
    /// history and history file only when the editor kept it. Consecutive
    /// duplicates are dropped by the editor, so `history` lists what
    /// up-arrow recalls.
    fn record_history(
        &mut self,
        rl: &mut DefaultEditor,
        line: &str,
        history_path: Option<&Path>,
    ) -> rustyline::Result<()> {
        if line.trim().is_empty() || !rl.add_history_entry(line)? {
            return Ok(());
        }
        self.env.history.push(line.to_owned());
        if let Some(path) = history_path {
            if let Err(e) = rl.append_history(path) {
                log::warn!("cannot save history to {}: {e}", path.display());
            }
        }
        Ok(())
    }

    /// The read-execute loop.
    ///
    /// Returns at end of input. An interrupt, whether typed while editing or
    /// delivered while a child runs, abandons the current line: the next
    /// iteration prints a newline and prompts again.
    pub fn repl(&mut self) -> anyhow::Result<()> {
        let mut rl = DefaultEditor::new()?;
        let history_path = self.env.history_path();
        if let Some(path) = &history_path {
            load_history(&mut rl, path);
        }
        self.env.history.extend(rl.history().iter().cloned());

        self.interrupts.install()?;
        self.interrupts.arm();

        let result = loop {
            self.restart_if_interrupted(&mut io::stdout())?;

            let prompt = prompt::render(&self.env);
            match rl.readline(&prompt) {
                Ok(line) => {
                    self.record_history(&mut rl, &line, history_path.as_deref())?;
                    if let Err(e) = self.run_line(&line) {
                        eprintln!("vsh: {e}");
                    }
                }
                Err(ReadlineError::Interrupted) => self.interrupts.raise(),
                Err(ReadlineError::Eof) => {
                    println!("Exiting shell...");
                    break Ok(());
                }
                Err(err) => break Err(err.into()),
            }
        };

        self.interrupts.disarm();
        result
    }
}

impl Default for Interpreter {
    /// Create an interpreter for the effective user with an empty history.
    fn default() -> Self {
        Self::new(Environment::new())
    }
}

fn load_history(rl: &mut DefaultEditor, path: &Path) {
    match rl.load_history(path) {
        Ok(()) => log::debug!("loaded history from {}", path.display()),
        Err(ReadlineError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
            log::debug!("no history at {}", path.display());
        }
        Err(e) => log::warn!("cannot load history from {}: {e}", path.display()),
    }
}
