//! Operator prompts
//!
//! Commands never talk to the terminal directly; they ask a [`Prompter`].
//! [`select_prompter`] picks the implementation once at startup:
//! - [`InteractiveRichPrompter`]: `inquire` widgets on a real terminal
//! - [`PlainStdinPrompter`]: line-based prompts for pipes, dumb terminals
//!   and `--non-interactive`, where every question resolves to its default

use std::cell::RefCell;
use std::io::{self, BufRead, IsTerminal, Write};

use inquire::{Confirm, Password, PasswordDisplayMode, Select, Text};

use crate::error::{LampError, Result};

/// Source of operator answers
pub trait Prompter {
    /// Whether questions actually reach a human
    fn is_interactive(&self) -> bool;

    /// Pick one of `options`, returning its index
    fn select(&self, message: &str, options: &[String], default: usize) -> Result<usize>;

    fn text(&self, message: &str, default: Option<&str>) -> Result<String>;

    fn password(&self, message: &str) -> Result<String>;

    fn confirm(&self, message: &str, default: bool) -> Result<bool>;
}

/// Choose the prompter for this process
pub fn select_prompter(non_interactive: bool) -> Box<dyn Prompter> {
    let tty = io::stdin().is_terminal() && io::stderr().is_terminal();
    let dumb = std::env::var("TERM").is_ok_and(|term| term == "dumb");
    if !non_interactive && tty && !dumb {
        Box::new(InteractiveRichPrompter)
    } else {
        Box::new(PlainStdinPrompter::new(
            io::stdin().lock(),
            io::stderr(),
            !non_interactive && io::stdin().is_terminal(),
        ))
    }
}

/// [`Prompter`] backed by `inquire`
#[derive(Debug, Default, Clone, Copy)]
pub struct InteractiveRichPrompter;

impl Prompter for InteractiveRichPrompter {
    fn is_interactive(&self) -> bool {
        true
    }

    fn select(&self, message: &str, options: &[String], default: usize) -> Result<usize> {
        let choice = Select::new(message, options.to_vec())
            .with_starting_cursor(default.min(options.len().saturating_sub(1)))
            .with_page_size(10)
            .without_filtering()
            .with_help_message("↑↓ to move, ENTER to select")
            .raw_prompt()?;
        Ok(choice.index)
    }

    fn text(&self, message: &str, default: Option<&str>) -> Result<String> {
        let mut prompt = Text::new(message);
        if let Some(default) = default {
            prompt = prompt.with_default(default);
        }
        Ok(prompt.prompt()?)
    }

    fn password(&self, message: &str) -> Result<String> {
        Ok(Password::new(message)
            .without_confirmation()
            .with_display_mode(PasswordDisplayMode::Masked)
            .prompt()?)
    }

    fn confirm(&self, message: &str, default: bool) -> Result<bool> {
        Ok(Confirm::new(message).with_default(default).prompt()?)
    }
}

/// Line-oriented [`Prompter`] over any reader/writer pair
pub struct PlainStdinPrompter<R, W> {
    input: RefCell<R>,
    output: RefCell<W>,
    interactive: bool,
}

impl<R: BufRead, W: Write> PlainStdinPrompter<R, W> {
    pub fn new(input: R, output: W, interactive: bool) -> Self {
        Self {
            input: RefCell::new(input),
            output: RefCell::new(output),
            interactive,
        }
    }

    fn ask(&self, question: &str) -> Result<String> {
        {
            let mut output = self.output.borrow_mut();
            write!(output, "{question}")?;
            output.flush()?;
        }
        let mut line = String::new();
        if self.input.borrow_mut().read_line(&mut line)? == 0 {
            return Err(LampError::PromptFailed {
                message: "input closed".to_string(),
            });
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    fn no_answer(message: &str) -> LampError {
        LampError::PromptFailed {
            message: format!("{message} (no default available in non-interactive mode)"),
        }
    }
}

impl<R: BufRead, W: Write> Prompter for PlainStdinPrompter<R, W> {
    fn is_interactive(&self) -> bool {
        self.interactive
    }

    fn select(&self, message: &str, options: &[String], default: usize) -> Result<usize> {
        if options.is_empty() {
            return Err(LampError::PromptFailed {
                message: format!("{message}: nothing to choose from"),
            });
        }
        let default = default.min(options.len() - 1);
        if !self.interactive {
            return Ok(default);
        }

        {
            let mut output = self.output.borrow_mut();
            writeln!(output, "{message}")?;
            for (i, option) in options.iter().enumerate() {
                writeln!(output, "  {}) {option}", i + 1)?;
            }
        }
        loop {
            let answer = self.ask(&format!("Choice [{}]: ", default + 1))?;
            let answer = answer.trim();
            if answer.is_empty() {
                return Ok(default);
            }
            match answer.parse::<usize>() {
                Ok(n) if (1..=options.len()).contains(&n) => return Ok(n - 1),
                _ => writeln!(
                    self.output.borrow_mut(),
                    "Enter a number between 1 and {}",
                    options.len()
                )?,
            }
        }
    }

    fn text(&self, message: &str, default: Option<&str>) -> Result<String> {
        if !self.interactive {
            return default
                .map(str::to_string)
                .ok_or_else(|| Self::no_answer(message));
        }
        let question = match default {
            Some(default) => format!("{message} [{default}]: "),
            None => format!("{message}: "),
        };
        let answer = self.ask(&question)?;
        match (answer.trim(), default) {
            ("", Some(default)) => Ok(default.to_string()),
            (answer, _) => Ok(answer.to_string()),
        }
    }

    fn password(&self, message: &str) -> Result<String> {
        if !self.interactive {
            return Err(Self::no_answer(message));
        }
        self.ask(&format!("{message}: "))
    }

    fn confirm(&self, message: &str, default: bool) -> Result<bool> {
        if !self.interactive {
            return Ok(default);
        }
        let hint = if default { "Y/n" } else { "y/N" };
        loop {
            let answer = self.ask(&format!("{message} [{hint}]: "))?;
            match answer.trim().to_lowercase().as_str() {
                "" => return Ok(default),
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => writeln!(self.output.borrow_mut(), "Please answer y or n")?,
            }
        }
    }
}
