//! Prompt collection.
//!
//! [`Prompter`] asks for one value at a time. Interactive runs read from a
//! [`Terminal`]; non-interactive runs resolve every prompt to its default
//! without touching the terminal and log what was skipped.

use crate::ui;
use anyhow::bail;
use dialoguer::console::Term;
use dialoguer::{Input, Password};
use std::fmt::Display;
use std::io::{self, BufRead, Write};

/// Line-oriented input source.
pub trait Terminal {
    fn read_line(&mut self, prompt: &str) -> io::Result<String>;

    /// Read without echoing the typed characters.
    fn read_secret(&mut self, prompt: &str) -> io::Result<String>;

    fn show(&mut self, line: &str);
}

/// The user's terminal, via dialoguer. Without a tty (piped stdin, CI
/// shells) answers are read as plain lines from stdin.
pub struct Console;

impl Console {
    fn has_tty() -> bool {
        Term::stderr().is_term() && Term::stdout().is_term()
    }
}

/// Print `prompt: ` to `out` and read one line from `input`, without the
/// line terminator. End of input is an error, not an empty answer.
fn read_plain_line(
    input: &mut impl BufRead,
    out: &mut impl Write,
    prompt: &str,
) -> io::Result<String> {
    write!(out, "{prompt}: ")?;
    out.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("input closed while waiting for: {prompt}"),
        ));
    }
    let trimmed = line.trim_end_matches(['\n', '\r']).len();
    line.truncate(trimmed);
    Ok(line)
}

impl Terminal for Console {
    fn read_line(&mut self, prompt: &str) -> io::Result<String> {
        if !Self::has_tty() {
            return read_plain_line(&mut io::stdin().lock(), &mut io::stderr(), prompt);
        }
        Input::<String>::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
            .map_err(io::Error::other)
    }

    fn read_secret(&mut self, prompt: &str) -> io::Result<String> {
        if !Self::has_tty() {
            return read_plain_line(&mut io::stdin().lock(), &mut io::stderr(), prompt);
        }
        Password::new()
            .with_prompt(prompt)
            .interact()
            .map_err(io::Error::other)
    }

    fn show(&mut self, line: &str) {
        eprintln!("{line}");
    }
}

pub struct Prompter {
    terminal: Box<dyn Terminal>,
    non_interactive: bool,
}

impl Prompter {
    pub fn new(terminal: Box<dyn Terminal>, non_interactive: bool) -> Self {
        Self {
            terminal,
            non_interactive,
        }
    }

    pub fn is_interactive(&self) -> bool {
        !self.non_interactive
    }

    /// Free-form answer; empty input yields `default`.
    pub fn ask(&mut self, prompt: &str, default: &str) -> anyhow::Result<String> {
        if self.non_interactive {
            tracing::info!(prompt, default, "non-interactive, using default");
            return Ok(default.to_owned());
        }

        let text = if default.is_empty() {
            prompt.to_owned()
        } else {
            format!("{prompt} [{default}]")
        };
        let answer = self.terminal.read_line(&text)?;
        let answer = answer.trim();
        Ok(if answer.is_empty() {
            default.to_owned()
        } else {
            answer.to_owned()
        })
    }

    /// Ask until `parse` accepts the answer, showing its error each time.
    /// A default that fails to parse is fatal in non-interactive mode.
    pub fn ask_validated<T, E: Display>(
        &mut self,
        prompt: &str,
        default: &str,
        parse: impl Fn(&str) -> Result<T, E>,
    ) -> anyhow::Result<T> {
        loop {
            let answer = self.ask(prompt, default)?;
            match parse(&answer) {
                Ok(value) => return Ok(value),
                Err(e) if self.non_interactive => bail!("{prompt}: {e}"),
                Err(e) => ui::error(e),
            }
        }
    }

    /// Ask until the answer is non-empty.
    pub fn ask_required(&mut self, prompt: &str, default: &str) -> anyhow::Result<String> {
        loop {
            let answer = self.ask(prompt, default)?;
            if !answer.is_empty() {
                return Ok(answer);
            }
            if self.non_interactive {
                bail!("{prompt}: a value is required in non-interactive mode");
            }
            ui::error("a value is required");
        }
    }

    /// Hidden input. There is no default to fall back on.
    pub fn ask_secret(&mut self, prompt: &str) -> anyhow::Result<String> {
        if self.non_interactive {
            bail!("{prompt}: cannot read a secret value in non-interactive mode");
        }
        loop {
            let value = self.terminal.read_secret(prompt)?;
            if !value.is_empty() {
                return Ok(value);
            }
            ui::error("a value is required");
        }
    }

    /// Yes/no question. Only an answer contradicting `default` changes it.
    pub fn confirm(&mut self, prompt: &str, default: bool) -> anyhow::Result<bool> {
        if self.non_interactive {
            tracing::info!(prompt, default, "non-interactive, using default");
            return Ok(default);
        }

        let hint = if default { "Y/n" } else { "y/N" };
        let answer = self.terminal.read_line(&format!("{prompt} ({hint})"))?;
        Ok(match answer.trim().chars().next() {
            None => default,
            Some(c) if default => !matches!(c, 'n' | 'N'),
            Some(c) => matches!(c, 'y' | 'Y'),
        })
    }

    /// Read entries until an empty line. Always empty when non-interactive.
    pub fn collect_list(&mut self, prompt: &str) -> anyhow::Result<Vec<String>> {
        if self.non_interactive {
            tracing::info!(prompt, "non-interactive, no entries collected");
            return Ok(Vec::new());
        }

        self.terminal
            .show(&format!("{prompt} (one per line, empty line to finish)"));
        let mut entries = Vec::new();
        loop {
            let line = self.terminal.read_line("  >")?;
            let line = line.trim();
            if line.is_empty() {
                return Ok(entries);
            }
            entries.push(line.to_owned());
        }
    }

    /// Numbered single choice, matched by position or exact label.
    ///
    /// Empty input picks `default`; with no default, and for anything
    /// unmatched, the list is shown again.
    pub fn choose<T: Copy>(
        &mut self,
        prompt: &str,
        options: &[T],
        label: impl Fn(&T) -> String,
        default: Option<usize>,
    ) -> anyhow::Result<T> {
        let labels: Vec<String> = options.iter().map(&label).collect();
        let pick = |i: usize| {
            options
                .get(i)
                .copied()
                .ok_or_else(|| anyhow::anyhow!("{prompt}: no option {}", i + 1))
        };

        if self.non_interactive {
            let Some(i) = default else {
                bail!("{prompt}: a selection is required in non-interactive mode");
            };
            let choice = labels.get(i).map(String::as_str).unwrap_or_default();
            tracing::info!(prompt, choice, "non-interactive, using default");
            return pick(i);
        }

        loop {
            self.terminal.show(prompt);
            for (i, l) in labels.iter().enumerate() {
                self.terminal.show(&format!("  {}) {l}", i + 1));
            }
            let text = match default {
                Some(i) => format!("Select [1-{}] ({})", labels.len(), i + 1),
                None => format!("Select [1-{}]", labels.len()),
            };
            let answer = self.terminal.read_line(&text)?;
            let answer = answer.trim();

            if answer.is_empty() {
                if let Some(i) = default {
                    return pick(i);
                }
            } else if let Some(i) = match_selection(answer, &labels) {
                return pick(i);
            }
            ui::error(format!("invalid selection '{answer}'"));
        }
    }
}

/// 1-based position or exact label text.
pub fn match_selection(input: &str, labels: &[String]) -> Option<usize> {
    if let Ok(n) = input.parse::<usize>() {
        return (1..=labels.len()).contains(&n).then(|| n - 1);
    }
    labels.iter().position(|l| l == input)
}
