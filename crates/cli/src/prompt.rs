//! Interactive terminal prompt: ask for a link, a number and a caption, then
//! run one job.

use std::io::{BufRead, Write};

use {
    anyhow::{Result, bail},
    clipcast_pipeline::{Job, Outcome, Pipeline},
};

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

const BANNER: &str = r"
  ___ _ _                     _
 / __| (_)_ __  __ __ _ __| |_
| (__| | | '_ \/ _/ _` (_-<  _|
 \___|_|_| .__/\__\__,_/__/\__|
         |_|
";

// ── State machine ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptStep {
    SourceUrl,
    Recipient,
    Caption,
    Done,
}

/// Collected answers, advanced one line of input at a time. No I/O.
#[derive(Debug, Clone)]
pub struct PromptState {
    pub step: PromptStep,
    pub source_url: String,
    pub recipient: String,
    pub caption: Option<String>,
    /// Shown before re-asking when the last answer was rejected.
    pub retry_hint: Option<&'static str>,
}

impl Default for PromptState {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptState {
    pub fn new() -> Self {
        Self {
            step: PromptStep::SourceUrl,
            source_url: String::new(),
            recipient: String::new(),
            caption: None,
            retry_hint: None,
        }
    }

    pub fn prompt(&self) -> &str {
        match self.step {
            PromptStep::SourceUrl => "Video URL:",
            PromptStep::Recipient => "Phone number (international format, digits only, e.g. 212612345678):",
            PromptStep::Caption => "Optional caption (press Enter to skip):",
            PromptStep::Done => "Sending...",
        }
    }

    pub fn advance(&mut self, input: &str) {
        let input = input.trim();
        self.retry_hint = None;
        match self.step {
            PromptStep::SourceUrl => {
                if input.is_empty() {
                    self.retry_hint = Some("A video URL is required.");
                } else {
                    self.source_url = input.to_string();
                    self.step = PromptStep::Recipient;
                }
            },
            PromptStep::Recipient => {
                if input.is_empty() {
                    self.retry_hint = Some("A phone number is required.");
                } else {
                    self.recipient = input.to_string();
                    self.step = PromptStep::Caption;
                }
            },
            PromptStep::Caption => {
                self.caption = Some(input.to_string()).filter(|c| !c.is_empty());
                self.step = PromptStep::Done;
            },
            PromptStep::Done => {},
        }
    }

    pub fn is_done(&self) -> bool {
        self.step == PromptStep::Done
    }

    pub fn into_job(self) -> Job {
        Job::new(self.source_url, self.recipient, self.caption)
    }
}

// ── Terminal loop ───────────────────────────────────────────────────────────

/// Read answers from `input`, run the job, and print its outcome to `output`.
pub async fn run_prompt<R: BufRead, W: Write>(
    pipeline: &Pipeline,
    mut input: R,
    mut output: W,
) -> Result<Outcome> {
    writeln!(output, "{CYAN}{BANNER}{RESET}")?;
    writeln!(output, "{BOLD}Send a video to WhatsApp{RESET}\n")?;

    let mut state = PromptState::new();
    while !state.is_done() {
        if let Some(hint) = state.retry_hint {
            writeln!(output, "{RED}{hint}{RESET}")?;
        }
        write!(output, "{} ", state.prompt())?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            bail!("input closed before all answers were given");
        }
        state.advance(&line);
    }
    writeln!(output, "{}", state.prompt())?;

    let outcome = pipeline.run(state.into_job()).await;
    let color = if outcome.is_success() {
        GREEN
    } else {
        RED
    };
    writeln!(output, "{color}{}{RESET}", outcome.message())?;
    Ok(outcome)
}
