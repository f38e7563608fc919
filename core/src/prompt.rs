//! Interactive prompts for handlers.
//!
//! The resolver never prompts; handlers that need input ask through a
//! [`Prompt`] so tests can substitute scripted answers.

use std::io::{self, BufRead, BufReader, Stdin, Stdout, Write};

use futures::FutureExt;
use futures::future::BoxFuture;

/// Asks a question and yields the typed answer.
pub trait Prompt: Send {
    /// Prints `question` and reads one line. A blank answer yields
    /// `default` when one is given.
    fn ask<'a>(
        &'a mut self,
        question: &'a str,
        default: Option<&'a str>,
    ) -> BoxFuture<'a, io::Result<String>>;
}

/// Line-oriented prompt over a reader/writer pair.
///
/// # Examples
///
/// ```
/// use std::io::Cursor;
/// use command_tree_core::prompt::{LinePrompt, Prompt};
///
/// let mut output = Vec::new();
/// let mut prompt = LinePrompt::new(Cursor::new("\n"), &mut output);
/// let answer = futures::executor::block_on(prompt.ask("Remote name", Some("origin")))?;
///
/// assert_eq!(answer, "origin");
/// drop(prompt);
/// assert_eq!(String::from_utf8(output).unwrap(), "Remote name [origin]: ");
/// # Ok::<(), std::io::Error>(())
/// ```
pub struct LinePrompt<R, W> {
    input: R,
    output: W,
}

impl LinePrompt<BufReader<Stdin>, Stdout> {
    /// Prompt on the process's stdin/stdout.
    pub fn stdio() -> Self {
        Self::new(BufReader::new(io::stdin()), io::stdout())
    }
}

impl<R: BufRead + Send, W: Write + Send> LinePrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn read_answer(&mut self, question: &str, default: Option<&str>) -> io::Result<String> {
        match default {
            Some(default) => write!(self.output, "{question} [{default}]: ")?,
            None => write!(self.output, "{question}: ")?,
        }
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 && default.is_none() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input closed before an answer was given",
            ));
        }

        let answer = line.trim();
        Ok(match default {
            Some(default) if answer.is_empty() => default.to_string(),
            _ => answer.to_string(),
        })
    }
}

impl<R: BufRead + Send, W: Write + Send> Prompt for LinePrompt<R, W> {
    fn ask<'a>(
        &'a mut self,
        question: &'a str,
        default: Option<&'a str>,
    ) -> BoxFuture<'a, io::Result<String>> {
        async move { self.read_answer(question, default) }.boxed()
    }
}
