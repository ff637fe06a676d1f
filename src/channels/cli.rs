//! CLI channel: stdin/stdout REPL over a wizard session.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::error::WizardError;
use crate::store::Database;
use crate::wizard::{StepKind, Transition, WizardEngine, WizardStep};

const HELP: &str = "Commands: /done finish a multi-select, /skip skip an optional question, \
/retry resend after a failed submission, /reset start over, /cancel discard and exit, \
/quit exit and keep your answers for next time";

/// One parsed line of terminal input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    /// Pick (or for multi-select, toggle) these options, in order.
    Choose(Vec<String>),
    Continue,
    Answer(String),
    Skip,
    Retry,
    Reset,
    Cancel,
    Quit,
    Help,
}

/// Interpret a line of input against the active step.
///
/// Choice steps accept 1-based option numbers or option names in any case.
/// Multi-select steps take several, separated by commas. Anything that does
/// not resolve is passed through unchanged so the wizard can reject it.
pub fn parse_input(line: &str, step: Option<&WizardStep>) -> CliCommand {
    let line = line.trim();
    if let Some(cmd) = line.strip_prefix('/') {
        match cmd.to_ascii_lowercase().as_str() {
            "done" | "continue" | "next" => return CliCommand::Continue,
            "skip" => return CliCommand::Skip,
            "retry" => return CliCommand::Retry,
            "reset" | "restart" => return CliCommand::Reset,
            "cancel" => return CliCommand::Cancel,
            "quit" | "exit" => return CliCommand::Quit,
            "help" | "?" => return CliCommand::Help,
            _ => {}
        }
    }

    match step {
        Some(step) if step.kind == StepKind::MultiChoice => CliCommand::Choose(
            line.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(|t| resolve_choice(t, step))
                .collect(),
        ),
        Some(step) if step.kind == StepKind::SingleChoice => {
            CliCommand::Choose(vec![resolve_choice(line, step)])
        }
        _ => CliCommand::Answer(line.to_string()),
    }
}

fn resolve_choice(token: &str, step: &WizardStep) -> String {
    if let Ok(n) = token.parse::<usize>()
        && let Some(choice) = n.checked_sub(1).and_then(|i| step.choices.get(i))
    {
        return choice.clone();
    }
    step.choices
        .iter()
        .find(|c| c.eq_ignore_ascii_case(token))
        .cloned()
        .unwrap_or_else(|| token.to_string())
}

/// What applying a command did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliOutcome {
    Transition(Transition),
    Help,
    Reset,
    Cancelled,
    Quit,
}

/// Apply a parsed command to the engine.
///
/// For a multi-select line each option is toggled in turn; the first
/// rejected option stops the rest.
pub async fn apply_command(
    engine: &mut WizardEngine,
    command: CliCommand,
) -> Result<CliOutcome, WizardError> {
    let transition = match command {
        CliCommand::Choose(choices) => {
            let mut last = None;
            for choice in &choices {
                last = Some(engine.submit_choice(choice).await?);
            }
            match last {
                Some(t) => t,
                None => engine.submit_choice("").await?,
            }
        }
        CliCommand::Continue => engine.continue_multi_choice().await?,
        CliCommand::Answer(text) => engine.submit_freeform(&text).await?,
        CliCommand::Skip => engine.skip().await?,
        CliCommand::Retry => engine.retry_submission().await?,
        CliCommand::Reset => {
            engine.reset();
            return Ok(CliOutcome::Reset);
        }
        CliCommand::Cancel => {
            engine.cancel();
            return Ok(CliOutcome::Cancelled);
        }
        CliCommand::Quit => return Ok(CliOutcome::Quit),
        CliCommand::Help => return Ok(CliOutcome::Help),
    };
    Ok(CliOutcome::Transition(transition))
}

fn hint(step: &WizardStep) -> Option<&'static str> {
    match (step.kind, step.optional) {
        (StepKind::MultiChoice, true) => {
            Some("(numbers or names, comma separated, to toggle; /done to continue, /skip to skip)")
        }
        (StepKind::MultiChoice, false) => {
            Some("(numbers or names, comma separated, to toggle; /done to continue)")
        }
        (StepKind::SingleChoice, _) => Some("(type a number or an option name)"),
        (_, true) => Some("(optional, /skip to leave blank)"),
        _ => None,
    }
}

/// Terminal session over one engine. Progress is saved to the database
/// after every accepted answer so `/quit` can resume later.
pub struct CliSession {
    engine: WizardEngine,
    db: Option<Arc<dyn Database>>,
    session_id: String,
    prompt_delay: Duration,
}

impl CliSession {
    pub fn new(engine: WizardEngine, session_id: impl Into<String>, prompt_delay: Duration) -> Self {
        Self {
            engine,
            db: None,
            session_id: session_id.into(),
            prompt_delay,
        }
    }

    /// Save progress to `db` and resume from it.
    pub fn with_store(mut self, db: Arc<dyn Database>) -> Self {
        self.db = Some(db);
        self
    }

    /// Load a saved session, if any. Returns whether one was resumed.
    pub async fn resume(&mut self) -> bool {
        let Some(db) = &self.db else {
            return false;
        };
        match db.load_session(&self.session_id).await {
            Ok(Some(state)) if !state.is_initial() => self.engine.restore(state),
            Ok(_) => false,
            Err(e) => {
                tracing::warn!("Failed to load saved session: {}", e);
                false
            }
        }
    }

    async fn persist(&self) {
        let Some(db) = &self.db else {
            return;
        };
        let state = self.engine.state();
        let result = if state.is_initial() {
            db.delete_session(&self.session_id).await.map(|_| ())
        } else {
            db.save_session(&self.session_id, state).await
        };
        if let Err(e) = result {
            tracing::warn!("Failed to persist wizard session: {}", e);
        }
    }

    fn show_prompt(&mut self) {
        let step_hint = self.engine.current_step().and_then(hint);
        if let Some(text) = self.engine.present_step() {
            let (index, total) = self.engine.progress();
            println!("\n[{}/{}] {}", index + 1, total, text);
            if let Some(step_hint) = step_hint {
                println!("{step_hint}");
            }
        }
        eprint!("> ");
    }

    /// Run until EOF, `/quit`, or `/cancel`.
    pub async fn run(mut self) -> anyhow::Result<()> {
        if self.resume().await {
            let (index, total) = self.engine.progress();
            eprintln!("Resuming your saved answers ({index}/{total} done). /reset to start over.");
        }
        self.show_prompt();

        let stdin = tokio::io::stdin();
        let mut lines = BufReader::new(stdin).lines();

        while let Some(line) = lines.next_line().await? {
            let command = parse_input(&line, self.engine.current_step());
            let outcome = apply_command(&mut self.engine, command).await;

            match outcome {
                Ok(CliOutcome::Quit) => break,
                Ok(CliOutcome::Cancelled) => {
                    self.persist().await;
                    eprintln!("Cancelled. Nothing was sent.");
                    break;
                }
                Ok(CliOutcome::Help) => {
                    println!("{HELP}");
                    eprint!("> ");
                    continue;
                }
                Ok(CliOutcome::Transition(Transition::Toggled { selected, .. })) => {
                    let shown = if selected.is_empty() {
                        "nothing".to_string()
                    } else {
                        selected.join(", ")
                    };
                    println!("Selected: {shown}");
                    eprint!("> ");
                    self.persist().await;
                    continue;
                }
                Ok(CliOutcome::Transition(Transition::Completed { receipt, .. })) => {
                    println!("\n🎉 Thanks! Your request is in (ref {}).", receipt.reference);
                    println!("   {}", receipt.summary);
                    println!("Starting a new request. /quit to exit.");
                }
                Ok(CliOutcome::Transition(Transition::Advanced { .. })) | Ok(CliOutcome::Reset) => {}
                Err(WizardError::SubmissionFailed { .. }) => {
                    self.persist().await;
                    eprintln!("Your answers are kept. Type /retry to send them again.");
                    eprint!("> ");
                    continue;
                }
                // Already reported through the notifier.
                Err(_) => {}
            }

            self.persist().await;
            tokio::time::sleep(self.prompt_delay).await;
            self.show_prompt();
        }

        Ok(())
    }
}
