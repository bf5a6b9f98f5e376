//! Line-oriented console: slider assignments dispatch predictions, the other
//! commands read the view currently on screen.

use anyhow::{anyhow, Result};
use serde_json::json;
use std::io::Write;
use std::sync::Arc;

use crate::analysis::run_analysis;
use crate::archive::SpecimenStore;
use crate::config::now_ms;
use crate::dispatch::{DispatchHandle, DispatchOutcome, Dispatcher};
use crate::logging::{log, obj, v_str, Domain, Level};
use crate::measurements::{parse_assignments, Feature, Sliders};
use crate::render::{Renderer, TerminalRenderer, ViewModel, ViewState};
use crate::service::PredictionService;

pub const HELP: &str = "\
commands:
  sl 5.1 | sl=5.1 pw=0.2   move sliders (sl, sw, pl, pw) and classify
  save                     archive the specimen on screen
  archive [n]              list the n most recent specimens (default 10)
  analyze                  report on the current classification
  help                     this text
  quit                     wait for pending requests and exit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Set(Vec<(Feature, f64)>),
    Save,
    Archive(usize),
    Analyze,
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> Result<Command> {
    let line = line.trim();
    let mut words = line.split_whitespace();
    match words.next().map(|w| w.to_lowercase()).as_deref() {
        None => Err(anyhow!("empty command")),
        Some("save") => Ok(Command::Save),
        Some("analyze") | Some("analyse") => Ok(Command::Analyze),
        Some("help") | Some("?") => Ok(Command::Help),
        Some("quit") | Some("exit") => Ok(Command::Quit),
        Some("archive") => match words.next() {
            None => Ok(Command::Archive(10)),
            Some(n) => n
                .parse()
                .map(Command::Archive)
                .map_err(|_| anyhow!("archive expects a count, got {:?}", n)),
        },
        Some(_) => Ok(Command::Set(parse_assignments(line)?)),
    }
}

/// Render sink for the console: remembers the last view and prints it.
pub struct ConsoleView<W: Write + Send> {
    state: ViewState,
    terminal: TerminalRenderer<W>,
}

impl<W: Write + Send> ConsoleView<W> {
    pub fn new(terminal: TerminalRenderer<W>) -> Self {
        Self { state: ViewState::default(), terminal }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }
}

impl<W: Write + Send> Renderer for ConsoleView<W> {
    fn render(&mut self, view: &ViewModel) {
        self.state.render(view);
        self.terminal.render(view);
    }
}

pub enum Reply {
    Text(String),
    Quit,
}

pub struct Session<W: Write + Send + 'static> {
    sliders: Sliders,
    dispatcher: Dispatcher<ConsoleView<W>>,
    store: SpecimenStore,
    pending: Vec<DispatchHandle>,
}

impl<W: Write + Send + 'static> Session<W> {
    pub fn new(
        service: Arc<dyn PredictionService>,
        view: ConsoleView<W>,
        store: SpecimenStore,
        cancel_superseded: bool,
    ) -> Self {
        let view = Arc::new(std::sync::Mutex::new(view));
        Self {
            sliders: Sliders::default(),
            dispatcher: Dispatcher::new(service, view).cancel_superseded(cancel_superseded),
            store,
            pending: Vec::new(),
        }
    }

    pub fn sliders(&self) -> &Sliders {
        &self.sliders
    }

    /// Classifies the current slider position, as on first page load.
    pub fn sync(&mut self) {
        self.pending.retain(|h| !h.is_finished());
        let handle = self.dispatcher.dispatch(self.sliders.snapshot());
        self.pending.push(handle);
    }

    fn current_view(&self) -> Option<ViewModel> {
        let view = self.dispatcher.view().lock().unwrap_or_else(|e| e.into_inner());
        view.state().current().cloned()
    }

    pub fn handle(&mut self, cmd: Command) -> Result<Reply> {
        match cmd {
            Command::Set(changes) => {
                self.sliders.apply(&changes)?;
                let labels: Vec<String> = self
                    .sliders
                    .display()
                    .iter()
                    .map(|(f, v)| format!("{}={}", f.key(), v))
                    .collect();
                log(
                    Level::Debug,
                    Domain::Input,
                    "sliders",
                    obj(&[("values", v_str(&labels.join(" ")))]),
                );
                self.sync();
                Ok(Reply::Text(labels.join("  ")))
            }
            Command::Save => {
                let view = self
                    .current_view()
                    .ok_or_else(|| anyhow!("nothing to archive yet, no prediction on screen"))?;
                let id = self.store.save(now_ms(), &view)?;
                Ok(Reply::Text(format!("Specimen #{} archived ({})", id, view.species.label())))
            }
            Command::Archive(limit) => {
                let specimens = self.store.recent(limit)?;
                if specimens.is_empty() {
                    return Ok(Reply::Text("archive is empty".to_string()));
                }
                let lines: Vec<String> = specimens
                    .iter()
                    .map(|s| {
                        format!(
                            "#{:<4} {:<16} {:>3.0}%  {}",
                            s.id,
                            s.species.label(),
                            s.confidence * 100.0,
                            s.input
                        )
                    })
                    .collect();
                Ok(Reply::Text(lines.join("\n")))
            }
            Command::Analyze => {
                let view = self
                    .current_view()
                    .ok_or_else(|| anyhow!("no prediction on screen to analyze"))?;
                Ok(Reply::Text(run_analysis(&view)))
            }
            Command::Help => Ok(Reply::Text(HELP.to_string())),
            Command::Quit => Ok(Reply::Quit),
        }
    }

    /// Waits for every request still in flight.
    pub async fn settle(&mut self) -> Vec<DispatchOutcome> {
        let pending = std::mem::take(&mut self.pending);
        let mut outcomes = Vec::with_capacity(pending.len());
        for handle in pending {
            outcomes.push(handle.outcome().await);
        }
        outcomes
    }

    pub async fn finish(mut self) -> Vec<DispatchOutcome> {
        let outcomes = self.settle().await;
        log(
            Level::Info,
            Domain::System,
            "drained",
            obj(&[
                ("pending", json!(outcomes.len())),
                ("applied", json!(outcomes.iter().filter(|o| o.is_applied()).count())),
            ]),
        );
        outcomes
    }

    pub fn applied_count(&self) -> u64 {
        let view = self.dispatcher.view().lock().unwrap_or_else(|e| e.into_inner());
        view.state().applied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_command("save").unwrap(), Command::Save);
        assert_eq!(parse_command("ANALYZE").unwrap(), Command::Analyze);
        assert_eq!(parse_command("archive").unwrap(), Command::Archive(10));
        assert_eq!(parse_command("archive 3").unwrap(), Command::Archive(3));
        assert_eq!(parse_command("quit").unwrap(), Command::Quit);
        assert_eq!(
            parse_command("pw 1.8").unwrap(),
            Command::Set(vec![(Feature::PetalWidth, 1.8)])
        );
    }

    #[test]
    fn test_parse_command_errors() {
        assert!(parse_command("   ").is_err());
        assert!(parse_command("archive many").is_err());
        assert!(parse_command("launch").is_err());
    }
}
