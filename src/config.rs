//! Command-line and environment configuration.
//!
//! Every option can also be given as a `NEWSWATCH_*` environment variable;
//! the command line wins when both are set.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::fetch::ResponseOrdering;
use crate::query::{ListConfig, PaginationStyle, DEFAULT_DAYS};
use crate::realtime::SOCKETIO_PATH;
use crate::session;

pub const DEFAULT_LOG_FILE: &str = "newswatch.log";

#[derive(Debug, Clone, Parser)]
#[command(name = "newswatch")]
#[command(about = "Terminal dashboard for the news and social media monitor", version)]
pub struct Config {
    /// Backend base URL.
    #[arg(long, env = "NEWSWATCH_API_URL", default_value = "http://127.0.0.1:5000")]
    pub api_url: String,

    /// Real-time channel URL.  Derived from the API URL when omitted.
    #[arg(long, env = "NEWSWATCH_WS_URL")]
    pub ws_url: Option<String>,

    /// Source selected at startup.
    #[arg(long, env = "NEWSWATCH_SOURCE", default_value = "all")]
    pub source: String,

    #[arg(
        long,
        env = "NEWSWATCH_PAGE_SIZE",
        default_value_t = 20,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub page_size: u32,

    #[arg(long, env = "NEWSWATCH_PAGINATION", value_enum, default_value_t = PaginationStyle::Offset)]
    pub pagination: PaginationStyle,

    /// Lookback window in days for social sources and statistics.
    #[arg(
        long,
        env = "NEWSWATCH_DAYS",
        default_value_t = DEFAULT_DAYS,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub days: u32,

    /// Quiet period before a typed search is sent.
    #[arg(long, env = "NEWSWATCH_DEBOUNCE_MS", default_value_t = 500)]
    pub debounce_ms: u64,

    /// Which answer wins when list requests overlap.
    #[arg(long, env = "NEWSWATCH_ORDERING", value_enum, default_value_t = ResponseOrdering::LastResponse)]
    pub ordering: ResponseOrdering,

    #[arg(long, env = "NEWSWATCH_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    #[arg(long, env = "NEWSWATCH_SESSION_FILE")]
    pub session_file: Option<PathBuf>,
}

impl Config {
    pub fn list_config(&self) -> ListConfig {
        ListConfig {
            page_size: self.page_size,
            style: self.pagination,
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// `ws_url` if given, else the API URL with a WebSocket scheme and the
    /// Socket.IO transport path.
    pub fn realtime_url(&self) -> String {
        if let Some(url) = &self.ws_url {
            return url.clone();
        }
        let base = self.api_url.trim_end_matches('/');
        let base = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            base.to_string()
        };
        format!("{base}{SOCKETIO_PATH}")
    }

    pub fn log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_LOG_FILE))
    }

    pub fn session_path(&self) -> PathBuf {
        self.session_file.clone().unwrap_or_else(session::default_path)
    }
}
