//! Background network work.
//!
//! The UI thread never blocks on I/O.  It hands [`Command`]s to the
//! [`Worker`], which runs each one as a task on the tokio runtime and sends
//! the outcome back as a [`WorkerMsg`] over an [`mpsc`] channel.  The UI
//! drains that channel once per tick, so all state changes happen on one
//! thread in arrival order.
//!
//! The real-time listener runs on the same runtime and reports through the
//! same channel.

use std::collections::BTreeMap;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tracing::debug;

use crate::api::{ApiClient, CategoryEntry, CommandReply, ListResponse, ParserTarget, Statistics};
use crate::error::ClientResult;
use crate::query::ListRequest;
use crate::realtime::{self, RealtimeEvent};

/// Requests from the UI thread.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    FetchList { seq: u64, request: ListRequest },
    LoadSources,
    LoadCategories,
    /// Statistics for the last `days`, after waiting `delay`.
    LoadStatistics { days: u32, delay: Duration },
    RunParser(Vec<ParserTarget>),
    StopParser,
    CheckParserStatus,
}

/// Results sent back to the UI thread.
#[derive(Debug)]
pub enum WorkerMsg {
    List {
        seq: u64,
        result: ClientResult<ListResponse>,
    },
    Sources(ClientResult<BTreeMap<String, String>>),
    Categories(ClientResult<Vec<CategoryEntry>>),
    Statistics(ClientResult<Statistics>),
    ParserRun(ClientResult<String>),
    ParserStop(ClientResult<CommandReply>),
    ParserStatus(ClientResult<Vec<String>>),
    Realtime(RealtimeEvent),
}

/// Statistics are always requested across all categories.
const STATISTICS_CATEGORY: &str = "all";

pub struct Worker {
    handle: Handle,
    client: Arc<ApiClient>,
    tx: mpsc::Sender<WorkerMsg>,
}

impl Worker {
    /// Create a worker on `handle`.  Returns the receiver the UI drains.
    pub fn new(handle: Handle, client: ApiClient) -> (Self, mpsc::Receiver<WorkerMsg>) {
        let (tx, rx) = mpsc::channel();
        let worker = Self {
            handle,
            client: Arc::new(client),
            tx,
        };
        (worker, rx)
    }

    /// Start listening on the real-time channel.  The listener stops once
    /// the receiver is dropped.
    pub fn spawn_realtime(&self, url: String) {
        let tx = self.tx.clone();
        self.handle.spawn(realtime::run(url, move |event| {
            tx.send(WorkerMsg::Realtime(event)).is_ok()
        }));
    }

    pub fn dispatch(&self, command: Command) {
        debug!(?command, "dispatch");
        let client = Arc::clone(&self.client);
        let tx = self.tx.clone();
        self.handle.spawn(async move {
            let msg = execute(&client, command).await;
            // Receiver gone means the UI has exited.
            let _ = tx.send(msg);
        });
    }
}

async fn execute(client: &ApiClient, command: Command) -> WorkerMsg {
    match command {
        Command::FetchList { seq, request } => WorkerMsg::List {
            seq,
            result: client.list(&request).await,
        },
        Command::LoadSources => WorkerMsg::Sources(client.sources().await),
        Command::LoadCategories => WorkerMsg::Categories(client.categories().await),
        Command::LoadStatistics { days, delay } => {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            WorkerMsg::Statistics(client.statistics(days, STATISTICS_CATEGORY).await)
        }
        Command::RunParser(targets) => WorkerMsg::ParserRun(client.run_parser(&targets).await),
        Command::StopParser => WorkerMsg::ParserStop(client.stop_parser().await),
        Command::CheckParserStatus => WorkerMsg::ParserStatus(client.parser_status().await),
    }
}
