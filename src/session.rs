//! UI state that survives a restart.
//!
//! Only the log panel is persisted: whether it was open and, if so, what it
//! showed.  The file lives in the temp directory by default, so it lasts as
//! long as the login session does.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::log_panel::LogPanel;

pub const DEFAULT_FILE_NAME: &str = "newswatch-session.json";

pub fn default_path() -> PathBuf {
    std::env::temp_dir().join(DEFAULT_FILE_NAME)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiSessionState {
    pub log_window_visible: bool,
    #[serde(default)]
    pub log_content: String,
}

impl UiSessionState {
    /// Snapshot the panel.  Content is kept only while the panel is open.
    pub fn capture(panel: &LogPanel) -> Self {
        Self {
            log_window_visible: panel.visible,
            log_content: if panel.visible {
                panel.to_text()
            } else {
                String::new()
            },
        }
    }

    pub fn apply(&self, panel: &mut LogPanel) {
        panel.visible = self.log_window_visible;
        if self.log_window_visible && !self.log_content.is_empty() {
            panel.restore_text(&self.log_content);
        }
    }

    /// Read the saved state.  A missing or unreadable file yields defaults.
    pub fn load(path: &Path) -> Self {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) => {
                debug!(path = %path.display(), error = %err, "no saved session");
                return Self::default();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(state) => state,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "ignoring malformed session file");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        debug!(path = %path.display(), "session saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log_panel::LogLevel;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let state = UiSessionState::load(&dir.path().join("nope.json"));
        assert_eq!(state, UiSessionState::default());
    }

    #[test]
    fn malformed_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.json");
        fs::write(&path, "{not json").unwrap();
        assert_eq!(UiSessionState::load(&path), UiSessionState::default());
    }

    #[test]
    fn saved_state_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.json");
        let state = UiSessionState {
            log_window_visible: true,
            log_content: "[10:00:00] [info] hello".into(),
        };
        state.save(&path).unwrap();
        assert_eq!(UiSessionState::load(&path), state);

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("logWindowVisible"));
        assert!(raw.contains("logContent"));
    }

    #[test]
    fn hidden_panel_drops_content() {
        let mut panel = LogPanel::default();
        panel.push("x", LogLevel::Info);
        let state = UiSessionState::capture(&panel);
        assert!(!state.log_window_visible);
        assert!(state.log_content.is_empty());
    }

    #[test]
    fn capture_then_apply_restores_panel() {
        let mut panel = LogPanel::default();
        panel.visible = true;
        panel.push("Запуск парсера ria", LogLevel::Info);
        panel.push("done", LogLevel::Success);

        let state = UiSessionState::capture(&panel);
        let mut restored = LogPanel::default();
        state.apply(&mut restored);
        assert!(restored.visible);
        assert_eq!(restored.entries(), panel.entries());
    }
}
