//! A small interactive command shell.
//!
//! A line goes through [`lexer::tokenize`], then
//! [`redirect::extract_redirections`], then [`executor::execute`], which runs
//! a [`builtin`] in-process or spawns the program and waits for it. Interrupts
//! are recorded by [`interrupt::InterruptController`] and acted on by the read
//! loop in [`Interpreter::repl`].

pub mod builtin;
pub mod env;
pub mod error;
pub mod executor;
pub mod interrupt;
mod interpreter;
pub mod lexer;
pub mod prompt;
pub mod redirect;

pub use error::ShellError;
/// Just a convenient re-export of the interactive shell.
pub use interpreter::Interpreter;

/// Serializes tests that change the working directory or the standard
/// descriptors, which are shared by every test thread.
#[cfg(test)]
pub(crate) fn lock_process_state() -> std::sync::MutexGuard<'static, ()> {
    use std::sync::{Mutex, OnceLock};
    static MUTEX: OnceLock<Mutex<()>> = OnceLock::new();
    MUTEX
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
