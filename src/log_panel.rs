//! Parser log panel.
//!
//! Lines carry a severity tag and a wall-clock stamp.  The panel can be
//! flattened to text and rebuilt from it, which is how it survives restarts
//! via [`crate::session::UiSessionState`].

use chrono::Local;
use serde::{Deserialize, Serialize};

/// Lines kept before the oldest are dropped.
const MAX_ENTRIES: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Success,
    Warning,
    Error,
    #[default]
    #[serde(other)]
    Info,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }

    fn parse(tag: &str) -> Self {
        match tag {
            "success" => Self::Success,
            "warning" => Self::Warning,
            "error" => Self::Error,
            _ => Self::Info,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub stamp: String,
    pub level: LogLevel,
    pub message: String,
}

impl LogEntry {
    /// `[12:00:01] [error] message`, with line breaks in the message escaped.
    fn to_line(&self) -> String {
        format!("[{}] [{}] {}", self.stamp, self.level.as_str(), escape(&self.message))
    }

    fn from_line(line: &str) -> Option<Self> {
        let rest = line.strip_prefix('[')?;
        let (stamp, rest) = rest.split_once("] [")?;
        let (level, message) = rest.split_once("] ")?;
        Some(Self {
            stamp: stamp.to_string(),
            level: LogLevel::parse(level),
            message: unescape(message),
        })
    }
}

fn escape(message: &str) -> String {
    let mut out = String::with_capacity(message.len());
    for c in message.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out
}

fn unescape(message: &str) -> String {
    let mut out = String::with_capacity(message.len());
    let mut chars = message.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[derive(Debug, Clone, Default)]
pub struct LogPanel {
    pub visible: bool,
    entries: Vec<LogEntry>,
}

impl LogPanel {
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn push(&mut self, message: impl Into<String>, level: LogLevel) {
        let stamp = Local::now().format("%H:%M:%S").to_string();
        self.push_stamped(stamp, message, level);
    }

    fn push_stamped(&mut self, stamp: String, message: impl Into<String>, level: LogLevel) {
        self.entries.push(LogEntry {
            stamp,
            level,
            message: message.into(),
        });
        if self.entries.len() > MAX_ENTRIES {
            let overflow = self.entries.len() - MAX_ENTRIES;
            self.entries.drain(..overflow);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
    }

    /// One line per entry.
    pub fn to_text(&self) -> String {
        self.entries
            .iter()
            .map(LogEntry::to_line)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Replace the contents with lines previously produced by [`to_text`].
    /// Lines that do not parse are kept verbatim as info messages.
    ///
    /// [`to_text`]: LogPanel::to_text
    pub fn restore_text(&mut self, text: &str) {
        self.entries.clear();
        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            match LogEntry::from_line(line) {
                Some(entry) => self.push_stamped(entry.stamp, entry.message, entry.level),
                None => self.push_stamped(String::new(), line, LogLevel::Info),
            }
        }
    }
}
