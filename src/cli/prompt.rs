//! Line-based terminal prompts.
//!
//! Menus are numbered lists answered by typing the number. Bad input
//! reprompts; end of input (Ctrl-D, closed pipe) is reported as `None` and
//! callers treat it as Cancel/Back. The reader and writer are generic so
//! tests can drive a menu from a byte slice.

use anyhow::{Context, Result};
use colored::Colorize;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};

pub struct Prompter<R, W> {
    reader: R,
    writer: W,
}

impl Prompter<BufReader<Stdin>, std::io::Stdout> {
    /// Prompts on the process's stdin/stdout.
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), std::io::stdout())
    }
}

impl<R, W> Prompter<R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
        }
    }

    /// Print a line to the prompt's output.
    pub fn say(&mut self, line: impl std::fmt::Display) -> Result<()> {
        writeln!(self.writer, "{line}").context("Failed to write to terminal")
    }

    fn ask(&mut self, prompt: &str) -> Result<()> {
        write!(self.writer, "{prompt}").context("Failed to write to terminal")?;
        self.writer.flush().context("Failed to flush terminal")
    }

    /// Next line without its terminator, or `None` at end of input.
    async fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        let n = self.reader.read_line(&mut line).await.context("Failed to read input")?;
        if n == 0 {
            // keep the shell prompt off our last line
            writeln!(self.writer).ok();
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    /// Numbered menu. Returns the zero-based index picked, or `None` on EOF.
    pub async fn select<S: AsRef<str>>(&mut self, title: &str, options: &[S]) -> Result<Option<usize>> {
        if options.is_empty() {
            return Ok(None);
        }

        self.say(title.bold())?;
        for (i, option) in options.iter().enumerate() {
            self.say(format!("  {}) {}", (i + 1).to_string().cyan(), option.as_ref()))?;
        }

        loop {
            self.ask(&format!("Enter choice [1-{}]: ", options.len()))?;
            let Some(answer) = self.read_line().await? else {
                return Ok(None);
            };
            match answer.trim().parse::<usize>() {
                Ok(n) if (1..=options.len()).contains(&n) => return Ok(Some(n - 1)),
                _ => self.say(
                    format!("Invalid choice, enter a number between 1 and {}.", options.len()).yellow(),
                )?,
            }
        }
    }

    /// Yes/no question. Empty input and EOF take `default`.
    pub async fn confirm(&mut self, question: &str, default: bool) -> Result<bool> {
        let hint = if default { "[Y/n]" } else { "[y/N]" };
        loop {
            self.ask(&format!("{question} {hint} "))?;
            let Some(answer) = self.read_line().await? else {
                return Ok(default);
            };
            match answer.trim().to_ascii_lowercase().as_str() {
                "" => return Ok(default),
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => self.say("Please answer y or n.".yellow())?,
            }
        }
    }

    /// Free text, trimmed. Empty input returns `default` (or an empty string).
    pub async fn text(&mut self, label: &str, default: Option<&str>) -> Result<Option<String>> {
        let prompt = match default {
            Some(d) => format!("{label} [{d}]: "),
            None => format!("{label}: "),
        };
        self.ask(&prompt)?;
        let Some(answer) = self.read_line().await? else {
            return Ok(None);
        };
        let answer = answer.trim();
        if answer.is_empty() {
            Ok(Some(default.unwrap_or_default().to_string()))
        } else {
            Ok(Some(answer.to_string()))
        }
    }

    /// Free text that must not be empty; reprompts until it is not.
    pub async fn required_text(&mut self, label: &str) -> Result<Option<String>> {
        loop {
            match self.text(label, None).await? {
                Some(value) if value.is_empty() => self.say("A value is required.".yellow())?,
                other => return Ok(other),
            }
        }
    }

    pub fn into_writer(self) -> W {
        self.writer
    }
}
