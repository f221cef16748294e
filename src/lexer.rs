//! Splitting of a raw command line into arguments.
//!
//! The lexer understands three things: runs of separator characters, double
//! quotes (which keep separators inside an argument and are dropped from the
//! output) and arguments of the form `$NAME`, which are replaced by the value
//! of the environment variable `NAME` when it is set.

use crate::error::ShellError;
use std::env;
use std::str::Chars;

/// Characters that separate arguments outside of double quotes. The bell
/// character is accepted for compatibility and has no other meaning.
const DELIMITERS: [char; 5] = [' ', '\t', '\r', '\n', '\x07'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexingState {
    Start,
    ReadingWord,
    ReadingDoubleQuote,
}

struct LexingFSM<'a, F> {
    input: Chars<'a>,
    state: LexingState,
    buffer: String,
    lookup: F,
}

impl<'a, F> LexingFSM<'a, F>
where
    F: Fn(&str) -> Option<String>,
{
    fn new(line: &'a str, lookup: F) -> Self {
        LexingFSM {
            input: line.chars(),
            state: LexingState::Start,
            buffer: String::new(),
            lookup,
        }
    }

    /// Runs the machine over the whole line.
    ///
    /// On failure every argument collected so far is dropped together with
    /// the output vector, so the caller never sees a partial result.
    fn make_tokens(mut self) -> Result<Vec<String>, ShellError> {
        let mut out = Vec::new();

        while let Some(ch) = self.input.next() {
            match self.state {
                LexingState::Start => self.handle_start(ch)?,
                LexingState::ReadingWord => self.handle_word(ch, &mut out)?,
                LexingState::ReadingDoubleQuote => self.handle_double_quote(ch)?,
            }
        }

        // An unterminated quote is closed by the end of the line.
        if self.state != LexingState::Start {
            self.finish_word(&mut out)?;
        }

        Ok(out)
    }

    fn handle_start(&mut self, ch: char) -> Result<(), ShellError> {
        match ch {
            c if DELIMITERS.contains(&c) => {}
            '"' => self.state = LexingState::ReadingDoubleQuote,
            c => {
                self.push_char(c)?;
                self.state = LexingState::ReadingWord;
            }
        }
        Ok(())
    }

    fn handle_word(&mut self, ch: char, out: &mut Vec<String>) -> Result<(), ShellError> {
        match ch {
            c if DELIMITERS.contains(&c) => {
                self.finish_word(out)?;
                self.state = LexingState::Start;
            }
            '"' => self.state = LexingState::ReadingDoubleQuote,
            c => self.push_char(c)?,
        }
        Ok(())
    }

    fn handle_double_quote(&mut self, ch: char) -> Result<(), ShellError> {
        match ch {
            '"' => self.state = LexingState::ReadingWord,
            c => self.push_char(c)?,
        }
        Ok(())
    }

    fn push_char(&mut self, ch: char) -> Result<(), ShellError> {
        self.buffer
            .try_reserve(ch.len_utf8())
            .map_err(|_| ShellError::Allocation)?;
        self.buffer.push(ch);
        Ok(())
    }

    fn finish_word(&mut self, out: &mut Vec<String>) -> Result<(), ShellError> {
        let word = std::mem::take(&mut self.buffer);
        let word = self.expand(word);
        out.try_reserve(1).map_err(|_| ShellError::Allocation)?;
        out.push(word);
        Ok(())
    }

    /// Replaces a whole `$NAME` argument with the variable's value. Unknown
    /// names and a lone `$` are kept as written.
    fn expand(&self, word: String) -> String {
        let value = word
            .strip_prefix('$')
            .filter(|name| !name.is_empty())
            .and_then(|name| (self.lookup)(name));
        value.unwrap_or(word)
    }
}

/// Splits `line` into arguments, expanding `$NAME` from the process
/// environment.
///
/// An empty or all-whitespace line yields an empty vector, which callers
/// treat as "nothing to run".
pub fn tokenize(line: &str) -> Result<Vec<String>, ShellError> {
    tokenize_with(line, |name| env::var(name).ok())
}

/// Same as [`tokenize`], with variable values supplied by `lookup`.
pub fn tokenize_with<F>(line: &str, lookup: F) -> Result<Vec<String>, ShellError>
where
    F: Fn(&str) -> Option<String>,
{
    LexingFSM::new(line, lookup).make_tokens()
}
