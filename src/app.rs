//! Application state.
//!
//! [`App`] owns the query, the rendered page and every panel.  It never does
//! I/O itself: an action that needs the backend queues a [`Command`], the
//! main loop hands queued commands to the worker, and results come back
//! through [`App::handle_worker_msg`].  That keeps every mutation on the UI
//! thread and makes the whole state machine testable without a network.

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use ratatui::widgets::TableState;
use tracing::{debug, info, warn};

use crate::api::{CategoryEntry, CommandReply, ListResponse, ParserTarget, Statistics, Status};
use crate::catalog::{SourceCatalog, SourceEntry, SourceKind};
use crate::debounce::{Debouncer, DEFAULT_DELAY};
use crate::error::ClientResult;
use crate::fetch::{ListFetcher, Outcome, ResponseOrdering};
use crate::filter::{FilterController, FilterValues};
use crate::highlight::Highlighter;
use crate::log_panel::{LogLevel, LogPanel};
use crate::pagination::{self, PageControl};
use crate::parser::{ParserControl, ParserLog, Transition};
use crate::query::{build_request, ListConfig, QueryState, DEFAULT_DAYS};
use crate::realtime::RealtimeEvent;
use crate::render::{category_label, format_date, render_table, RenderedTable};
use crate::schema::SchemaRegistry;
use crate::session::UiSessionState;
use crate::worker::{Command, WorkerMsg};

/// Lookback windows offered by the days selector.
pub const DAY_CHOICES: &[u32] = &[1, 3, 7, 14, 30];

/// Statistics are reloaded this long after a parser run is accepted.
pub const STATISTICS_REFRESH_DELAY: Duration = Duration::from_secs(5);

const UNTITLED: &str = "Untitled";
const NO_CONTENT: &str = "No content";
const UNKNOWN_SOURCE: &str = "Unknown source";
const UNKNOWN_DATE: &str = "unknown date";
const UNIVERSAL_SOURCE: &str = "universal";

/// Startup options.
#[derive(Debug, Clone)]
pub struct Settings {
    pub source: String,
    pub days: u32,
    pub list: ListConfig,
    pub ordering: ResponseOrdering,
    pub debounce: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            source: "all".into(),
            days: DEFAULT_DAYS,
            list: ListConfig::default(),
            ordering: ResponseOrdering::default(),
            debounce: DEFAULT_DELAY,
        }
    }
}

/// What the keyboard is currently talking to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Normal,
    Search,
    ParserPicker,
    UniversalUrl,
    /// Detail modal for the row at this index.
    Detail(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Table,
    Pagination,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum StatsView {
    #[default]
    Loading,
    Ready(Statistics),
    Unavailable,
}

#[derive(Debug, Clone, Default)]
pub struct ParserPicker {
    pub cursor: usize,
    pub chosen: BTreeSet<String>,
    pub universal_url: String,
}

/// Contents of the item detail modal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detail {
    pub title: String,
    pub content: String,
    pub source: String,
    pub date: String,
    pub link: Option<String>,
}

pub struct App {
    pub query: QueryState,
    list_config: ListConfig,
    pub catalog: SourceCatalog,
    pub fetcher: ListFetcher,
    schemas: SchemaRegistry,

    pub table: RenderedTable,
    pub table_state: TableState,
    pub total_pages: u32,
    pub controls: Vec<PageControl>,
    pub control_cursor: usize,
    pub filter: FilterController,

    /// Text in the search box; applied to the query after the quiet period.
    pub search_input: String,
    debouncer: Debouncer<String>,
    /// Matcher for the applied search query.
    pub highlighter: Option<Highlighter>,

    pub parser: ParserControl,
    pub picker: ParserPicker,
    universal_requested: bool,
    pub log: LogPanel,
    pub connected: bool,

    pub stats: StatsView,
    pub show_stats: bool,
    pub categories: Vec<CategoryEntry>,

    pub mode: Mode,
    pub focus: Focus,
    outbox: Vec<Command>,
    /// Whether the user has requested to quit.
    pub quit: bool,
    pub status: String,
}

impl App {
    pub fn new(settings: Settings) -> Self {
        let mut catalog = SourceCatalog::builtin();
        catalog.select_id(&settings.source);
        Self {
            query: QueryState::new(settings.source, settings.days),
            list_config: settings.list,
            catalog,
            fetcher: ListFetcher::new(settings.ordering),
            schemas: SchemaRegistry::builtin(),
            table: RenderedTable::default(),
            table_state: TableState::default(),
            total_pages: 0,
            controls: Vec::new(),
            control_cursor: 0,
            filter: FilterController::default(),
            search_input: String::new(),
            debouncer: Debouncer::new(settings.debounce),
            highlighter: None,
            parser: ParserControl::default(),
            picker: ParserPicker::default(),
            universal_requested: false,
            log: LogPanel::default(),
            connected: false,
            stats: StatsView::default(),
            show_stats: true,
            categories: Vec::new(),
            mode: Mode::Normal,
            focus: Focus::Table,
            outbox: Vec::new(),
            quit: false,
            status: "Starting…".into(),
        }
    }

    /// Queue everything the first screen needs.
    pub fn start(&mut self) {
        self.outbox.extend([
            Command::LoadSources,
            Command::LoadCategories,
            Command::CheckParserStatus,
        ]);
        self.load_statistics(Duration::ZERO);
        self.fetch();
    }

    /// Commands queued since the last call.
    pub fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.outbox)
    }

    /// Drive time-based work.  Called once per UI tick.
    pub fn tick(&mut self, now: Instant) {
        if let Some(query) = self.debouncer.poll(now) {
            self.apply_search(&query);
        }
    }

    // -- list ----------------------------------------------------------------

    /// Request the page described by the current query.
    pub fn fetch(&mut self) {
        let kind = self.catalog.kind_of(self.query.source());
        let request = build_request(&self.query, kind, &self.list_config);
        let seq = self.fetcher.begin();
        debug!(seq, path = %request.path, page = self.query.page(), "fetching list");
        self.status = format!("Loading {}…", self.query.source());
        self.outbox.push(Command::FetchList { seq, request });
    }

    /// Re-issue the current query unchanged.
    pub fn refresh(&mut self) {
        info!(source = self.query.source(), page = self.query.page(), "manual refresh");
        self.fetch();
    }

    fn apply_list(&mut self, seq: u64, result: ClientResult<ListResponse>) {
        match self.fetcher.complete(seq, result, &mut self.query) {
            (Outcome::Applied, Some(response)) => self.show_page(response),
            (Outcome::Failed, _) => self.status = "Request failed".into(),
            _ => {}
        }
    }

    fn show_page(&mut self, response: ListResponse) {
        let source = self.query.source().to_string();
        self.table = render_table(&response.items, self.schemas.resolve(&source));
        self.total_pages = response.total_pages;
        self.filter.update(&source, &response);
        self.rebuild_controls();
        self.table_state
            .select(if self.table.is_empty() { None } else { Some(0) });
        if let Mode::Detail(_) = self.mode {
            self.mode = Mode::Normal;
        }
        self.status = format!("Fetched {} items", self.table.len());
    }

    fn rebuild_controls(&mut self) {
        self.controls = pagination::build_controls(self.total_pages, self.query.page());
        self.control_cursor = self
            .controls
            .iter()
            .position(PageControl::is_active)
            .unwrap_or(0);
        if self.controls.is_empty() {
            self.focus = Focus::Table;
        }
    }

    // -- sources, days, filter -------------------------------------------------

    pub fn step_source(&mut self, delta: isize) {
        let id = self.catalog.step(delta).id.clone();
        self.select_source(id);
    }

    pub fn select_source(&mut self, id: String) {
        self.catalog.select_id(&id);
        info!(source = %id, "source selected");
        self.query.set_source(id);
        self.filter.reset();
        self.fetch();
    }

    pub fn set_days(&mut self, days: u32) {
        if days == self.query.days_window() {
            return;
        }
        self.query.set_days_window(days);
        self.load_statistics(Duration::ZERO);
        self.fetch();
    }

    pub fn cycle_days(&mut self, delta: isize) {
        let len = DAY_CHOICES.len() as isize;
        let index = match DAY_CHOICES.iter().position(|d| *d == self.query.days_window()) {
            Some(i) => (i as isize + delta).rem_euclid(len) as usize,
            None => DAY_CHOICES
                .iter()
                .position(|d| *d == DEFAULT_DAYS)
                .unwrap_or(0),
        };
        self.set_days(DAY_CHOICES[index]);
    }

    pub fn cycle_filter(&mut self, delta: isize) {
        if self.filter.cycle(delta, &mut self.query) {
            self.fetch();
        }
    }

    /// Display text of the active filter choice.  Category ids are shown by
    /// name when the categories endpoint knows them.
    pub fn filter_display(&self) -> Option<(&'static str, String)> {
        let spec = self.filter.spec()?;
        let raw = self.filter.selected_label(&self.query);
        let shown = match spec.values {
            FilterValues::Categories if self.query.filter().is_some() => self
                .categories
                .iter()
                .find(|c| c.id == raw)
                .map(|c| c.name.clone())
                .unwrap_or_else(|| category_label(raw).to_string()),
            _ => raw.to_string(),
        };
        Some((spec.label, shown))
    }

    // -- search ----------------------------------------------------------------

    pub fn begin_search(&mut self) {
        if !self.debouncer.is_pending() {
            self.search_input = self.query.search_query().to_string();
        }
        self.mode = Mode::Search;
    }

    pub fn search_push(&mut self, c: char, now: Instant) {
        self.search_input.push(c);
        self.debouncer.push(self.search_input.clone(), now);
    }

    pub fn search_backspace(&mut self, now: Instant) {
        if self.search_input.pop().is_some() {
            self.debouncer.push(self.search_input.clone(), now);
        }
    }

    /// Enter: send a pending search right away and leave the box.
    pub fn submit_search(&mut self) {
        self.mode = Mode::Normal;
        if let Some(query) = self.debouncer.flush() {
            self.apply_search(&query);
        }
    }

    /// Esc: leave the box.  A pending search still fires.
    pub fn leave_search(&mut self) {
        self.mode = Mode::Normal;
    }

    pub fn clear_search(&mut self) {
        self.debouncer.cancel();
        self.search_input.clear();
        if !self.query.search_query().is_empty() {
            self.apply_search("");
        }
    }

    fn apply_search(&mut self, query: &str) {
        self.query.set_search_query(query);
        self.highlighter = Highlighter::new(self.query.search_query());
        info!(query = self.query.search_query(), "search applied");
        self.fetch();
    }

    // -- pagination ------------------------------------------------------------

    fn activate(&mut self, control: PageControl) {
        if pagination::activate(&control, &mut self.query) {
            self.fetch();
        }
    }

    pub fn next_page(&mut self) {
        if let Some(control) = self
            .controls
            .iter()
            .find(|c| matches!(c, PageControl::Next(_)))
            .copied()
        {
            self.activate(control);
        }
    }

    pub fn previous_page(&mut self) {
        if let Some(control) = self
            .controls
            .iter()
            .find(|c| matches!(c, PageControl::Previous(_)))
            .copied()
        {
            self.activate(control);
        }
    }

    pub fn toggle_pagination_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Table if !self.controls.is_empty() => Focus::Pagination,
            _ => Focus::Table,
        };
    }

    pub fn move_control_cursor(&mut self, delta: isize) {
        if self.controls.is_empty() {
            return;
        }
        let last = self.controls.len() as isize - 1;
        self.control_cursor = (self.control_cursor as isize + delta).clamp(0, last) as usize;
    }

    pub fn activate_selected_control(&mut self) {
        if let Some(control) = self.controls.get(self.control_cursor).copied() {
            self.activate(control);
        }
    }

    // -- rows ------------------------------------------------------------------

    pub fn select_next(&mut self) {
        if self.table.is_empty() {
            return;
        }
        let i = match self.table_state.selected() {
            Some(i) => (i + 1).min(self.table.len() - 1),
            None => 0,
        };
        self.table_state.select(Some(i));
    }

    pub fn select_previous(&mut self) {
        if self.table.is_empty() {
            return;
        }
        let i = match self.table_state.selected() {
            Some(i) => i.saturating_sub(1),
            None => 0,
        };
        self.table_state.select(Some(i));
    }

    pub fn select_first(&mut self) {
        if !self.table.is_empty() {
            self.table_state.select(Some(0));
        }
    }

    pub fn select_last(&mut self) {
        if !self.table.is_empty() {
            self.table_state.select(Some(self.table.len() - 1));
        }
    }

    /// Expand or collapse the long text of the selected row.
    pub fn toggle_expand(&mut self) -> bool {
        let Some(i) = self.table_state.selected() else {
            return false;
        };
        self.table
            .rows_mut()
            .get_mut(i)
            .map(|row| row.toggle_content())
            .unwrap_or(false)
    }

    pub fn open_detail(&mut self) {
        if let Some(i) = self.table_state.selected().filter(|i| *i < self.table.len()) {
            self.mode = Mode::Detail(i);
        }
    }

    pub fn close_overlay(&mut self) {
        self.mode = Mode::Normal;
    }

    pub fn detail(&self) -> Option<Detail> {
        let Mode::Detail(index) = self.mode else {
            return None;
        };
        let record = &self.table.rows().get(index)?.record;
        Some(Detail {
            title: record.text("title").unwrap_or_else(|| UNTITLED.into()),
            content: record
                .first_text(&["content", "text"])
                .unwrap_or_else(|| NO_CONTENT.into()),
            source: record.text("source").unwrap_or_else(|| UNKNOWN_SOURCE.into()),
            date: record
                .date()
                .map(|raw| format_date(&raw))
                .unwrap_or_else(|| UNKNOWN_DATE.into()),
            link: record.link(),
        })
    }

    // -- parsers -----------------------------------------------------------------

    /// Sources a parser can be started for.
    pub fn parser_candidates(&self) -> Vec<&SourceEntry> {
        self.catalog
            .entries()
            .iter()
            .filter(|e| e.kind == SourceKind::News && e.id != "all")
            .collect()
    }

    pub fn open_parser_picker(&mut self) {
        self.picker = ParserPicker::default();
        self.mode = Mode::ParserPicker;
    }

    pub fn picker_move(&mut self, delta: isize) {
        let len = self.parser_candidates().len();
        if len == 0 {
            return;
        }
        self.picker.cursor = (self.picker.cursor as isize + delta).rem_euclid(len as isize) as usize;
    }

    pub fn picker_toggle(&mut self) {
        let Some(id) = self
            .parser_candidates()
            .get(self.picker.cursor)
            .map(|e| e.id.clone())
        else {
            return;
        };
        if !self.picker.chosen.remove(&id) {
            self.picker.chosen.insert(id);
        }
    }

    pub fn begin_universal_url(&mut self) {
        self.mode = Mode::UniversalUrl;
    }

    pub fn universal_push(&mut self, c: char) {
        self.picker.universal_url.push(c);
    }

    pub fn universal_backspace(&mut self) {
        self.picker.universal_url.pop();
    }

    pub fn leave_universal_url(&mut self) {
        self.mode = Mode::ParserPicker;
    }

    /// Run what the picker holds.
    pub fn confirm_parsers(&mut self) {
        let mut targets: Vec<ParserTarget> = self
            .picker
            .chosen
            .iter()
            .cloned()
            .map(ParserTarget::Named)
            .collect();
        let url = self.picker.universal_url.trim();
        if !url.is_empty() {
            targets.push(ParserTarget::universal(url));
        }
        self.mode = Mode::Normal;
        self.run_parsers(targets);
    }

    pub fn run_parsers(&mut self, targets: Vec<ParserTarget>) {
        self.log.visible = true;
        if targets.is_empty() {
            self.log.push("No sources selected", LogLevel::Warning);
            return;
        }
        self.log.clear();
        self.log.push("Initializing parsers...", LogLevel::Info);
        let described: Vec<String> = targets.iter().map(ParserTarget::describe).collect();
        self.log
            .push(format!("Selected sources: {}", described.join(", ")), LogLevel::Info);

        self.parser.run_requested(targets.iter().map(|t| t.source_id()));
        self.universal_requested = targets
            .iter()
            .any(|t| matches!(t, ParserTarget::Universal { .. }));
        info!(count = targets.len(), "running parsers");
        self.outbox.push(Command::RunParser(targets));
    }

    pub fn stop_parsers(&mut self) {
        if !self.parser.is_active() {
            self.log.push("No active parsers to stop", LogLevel::Info);
            return;
        }
        self.log.push("Sending stop command...", LogLevel::Info);
        self.outbox.push(Command::StopParser);
    }

    fn on_run_reply(&mut self, result: ClientResult<String>) {
        match result {
            Ok(message) => {
                debug!(%message, "run_parser reply");
                self.parser.run_accepted();
                self.log.push("Parse request sent", LogLevel::Success);
                if self.universal_requested {
                    self.log.push(
                        "Universal parser detected: a new section will be created",
                        LogLevel::Info,
                    );
                }
                self.load_statistics(STATISTICS_REFRESH_DELAY);
            }
            Err(err) => {
                warn!(error = %err, "run_parser failed");
                self.parser.run_failed();
                self.log
                    .push(format!("Failed to start parsers: {err}"), LogLevel::Error);
            }
        }
        self.universal_requested = false;
    }

    fn on_stop_reply(&mut self, result: ClientResult<CommandReply>) {
        match result {
            Ok(reply) => {
                let success = reply.status == Status::Success;
                let level = if success { LogLevel::Success } else { LogLevel::Info };
                self.log.push(reply.message, level);
                if success {
                    self.parser.stop_succeeded();
                }
            }
            Err(err) => {
                warn!(error = %err, "stop_parser failed");
                self.log
                    .push(format!("Failed to stop parsers: {err}"), LogLevel::Error);
            }
        }
    }

    fn on_parser_log(&mut self, event: ParserLog) {
        self.log.push(event.message.clone(), event.level);
        if event.announces_new_table() {
            self.log
                .push("New table created, reloading sources", LogLevel::Success);
            self.outbox.push(Command::LoadSources);
        }
        if let Transition::Stopped { all_finished: true } = self.parser.on_log(&event) {
            self.log.push("All parsers finished", LogLevel::Info);
            if event.source == UNIVERSAL_SOURCE {
                self.log
                    .push("Reloading sources to show the new section", LogLevel::Success);
                self.outbox.push(Command::LoadSources);
            }
        }
    }

    // -- panels ------------------------------------------------------------------

    pub fn toggle_log(&mut self) {
        self.log.toggle();
    }

    pub fn toggle_stats(&mut self) {
        self.show_stats = !self.show_stats;
    }

    fn load_statistics(&mut self, delay: Duration) {
        self.outbox.push(Command::LoadStatistics {
            days: self.query.days_window(),
            delay,
        });
    }

    pub fn session_state(&self) -> UiSessionState {
        UiSessionState::capture(&self.log)
    }

    pub fn restore_session(&mut self, state: &UiSessionState) {
        state.apply(&mut self.log);
    }

    // -- worker results ------------------------------------------------------------

    pub fn handle_worker_msg(&mut self, msg: WorkerMsg) {
        match msg {
            WorkerMsg::List { seq, result } => self.apply_list(seq, result),
            WorkerMsg::Sources(Ok(custom)) => {
                let added = self.catalog.merge_custom(&custom);
                self.catalog.select_id(self.query.source());
                info!(added, "custom sources merged");
            }
            WorkerMsg::Sources(Err(err)) => warn!(error = %err, "loading sources failed"),
            WorkerMsg::Categories(Ok(categories)) => self.categories = categories,
            WorkerMsg::Categories(Err(err)) => warn!(error = %err, "loading categories failed"),
            WorkerMsg::Statistics(Ok(stats)) => self.stats = StatsView::Ready(stats),
            WorkerMsg::Statistics(Err(err)) => {
                warn!(error = %err, "loading statistics failed");
                self.stats = StatsView::Unavailable;
            }
            WorkerMsg::ParserRun(result) => self.on_run_reply(result),
            WorkerMsg::ParserStop(result) => self.on_stop_reply(result),
            WorkerMsg::ParserStatus(Ok(active)) => self.parser.sync(active),
            WorkerMsg::ParserStatus(Err(err)) => warn!(error = %err, "parser status check failed"),
            WorkerMsg::Realtime(RealtimeEvent::Connected) => {
                self.connected = true;
                self.outbox.push(Command::CheckParserStatus);
            }
            WorkerMsg::Realtime(RealtimeEvent::Disconnected) => self.connected = false,
            WorkerMsg::Realtime(RealtimeEvent::ParserLog(event)) => self.on_parser_log(event),
        }
    }
}
