//! Parser run/stop state.
//!
//! The backend streams `parser_log` events while parsers run.  An event may
//! carry an explicit `event` tag (`started`, `stopped`, `log`); those drive
//! the state machine directly.  Untagged events from older backends are
//! classified by the human-readable phrases the backend is known to emit.
//! That vocabulary is kept exactly as the backend writes it: a source name
//! that happens to occur inside unrelated log text can still be
//! misclassified, and widening or narrowing the phrase set needs the
//! backend's confirmation.

use std::collections::BTreeSet;

use serde::Deserialize;
use tracing::{debug, info};

use crate::log_panel::LogLevel;

/// Emitted when a parser process is launched.
pub const LEGACY_START_PHRASE: &str = "Запуск парсера";
/// Emitted when a parser finishes or is stopped.
pub const LEGACY_STOP_PHRASES: &[&str] = &["завершен", "остановлен"];
/// Emitted when the universal parser creates a table for a new site.
pub const TABLE_CREATED_PHRASE: &str = "Создана таблица";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventTag {
    Started,
    Stopped,
    Log,
}

/// Payload of a `parser_log` event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ParserLog {
    #[serde(default)]
    pub message: String,
    #[serde(rename = "type", default)]
    pub level: LogLevel,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub event: Option<EventTag>,
}

impl ParserLog {
    /// What this event means for the run state.
    pub fn tag(&self) -> EventTag {
        if let Some(tag) = self.event {
            return tag;
        }
        if self.message.contains(LEGACY_START_PHRASE) {
            EventTag::Started
        } else if LEGACY_STOP_PHRASES.iter().any(|p| self.message.contains(p)) {
            EventTag::Stopped
        } else {
            EventTag::Log
        }
    }

    /// A new site table appeared, so the source list is stale.
    pub fn announces_new_table(&self) -> bool {
        self.level == LogLevel::Success && self.message.contains(TABLE_CREATED_PHRASE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ParserState {
    #[default]
    Idle,
    Running { sources: BTreeSet<String> },
}

impl ParserState {
    fn from_sources(sources: BTreeSet<String>) -> Self {
        if sources.is_empty() {
            Self::Idle
        } else {
            Self::Running { sources }
        }
    }
}

/// Effect of one log event on the run state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    None,
    Started,
    /// `all_finished` is set when this stop emptied the running set.
    Stopped { all_finished: bool },
}

#[derive(Debug, Clone, Default)]
pub struct ParserControl {
    state: ParserState,
    rollback: Option<ParserState>,
}

impl ParserControl {
    #[cfg(test)]
    pub fn state(&self) -> &ParserState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, ParserState::Running { .. })
    }

    pub fn running(&self) -> Vec<&str> {
        match &self.state {
            ParserState::Idle => Vec::new(),
            ParserState::Running { sources } => sources.iter().map(String::as_str).collect(),
        }
    }

    /// Optimistically mark `sources` running while the run request is in
    /// flight.  [`run_failed`](Self::run_failed) undoes this.
    pub fn run_requested<'a>(&mut self, sources: impl IntoIterator<Item = &'a str>) {
        self.rollback = Some(self.state.clone());
        let mut running = match &self.state {
            ParserState::Idle => BTreeSet::new(),
            ParserState::Running { sources } => sources.clone(),
        };
        running.extend(sources.into_iter().map(str::to_string));
        self.state = ParserState::from_sources(running);
        info!(running = ?self.running(), "parser run requested");
    }

    pub fn run_accepted(&mut self) {
        self.rollback = None;
    }

    pub fn run_failed(&mut self) {
        if let Some(previous) = self.rollback.take() {
            self.state = previous;
        }
        info!(running = ?self.running(), "parser run rolled back");
    }

    pub fn stop_succeeded(&mut self) {
        self.state = ParserState::Idle;
        self.rollback = None;
    }

    /// Replace local state with the backend's view.
    pub fn sync(&mut self, active: Vec<String>) {
        self.state = ParserState::from_sources(active.into_iter().collect());
        debug!(running = ?self.running(), "parser state synced");
    }

    pub fn on_log(&mut self, log: &ParserLog) -> Transition {
        match log.tag() {
            EventTag::Log => Transition::None,
            EventTag::Started => {
                let mut running = match std::mem::take(&mut self.state) {
                    ParserState::Idle => BTreeSet::new(),
                    ParserState::Running { sources } => sources,
                };
                running.insert(log.source.clone());
                self.state = ParserState::from_sources(running);
                Transition::Started
            }
            EventTag::Stopped => {
                if let ParserState::Running { sources } = &mut self.state {
                    sources.remove(&log.source);
                    if sources.is_empty() {
                        self.state = ParserState::Idle;
                    }
                }
                Transition::Stopped {
                    all_finished: !self.is_active(),
                }
            }
        }
    }
}
