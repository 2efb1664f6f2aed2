use std::collections::VecDeque;

use serde::Deserialize;
use serde::Serialize;

use crate::approval::ApprovalSequencer;
use crate::config::RelayConfig;
use crate::events::Run;
use crate::events::RunId;
use crate::streaming::ChatSurface;

pub const DEFAULT_LOG_CAPACITY: usize = 2_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelFocus {
    Activity,
    Chat,
    Plan,
    Logs,
}

impl PanelFocus {
    pub fn next(self) -> Self {
        match self {
            Self::Activity => Self::Chat,
            Self::Chat => Self::Plan,
            Self::Plan => Self::Logs,
            Self::Logs => Self::Activity,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Self::Activity => Self::Logs,
            Self::Chat => Self::Activity,
            Self::Plan => Self::Chat,
            Self::Logs => Self::Plan,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Activity => "Activity",
            Self::Chat => "Chat",
            Self::Plan => "Plan",
            Self::Logs => "Logs",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UiTheme {
    #[default]
    Classic,
    Midnight,
}

impl UiTheme {
    pub fn next(self) -> Self {
        match self {
            Self::Classic => Self::Midnight,
            Self::Midnight => Self::Classic,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Classic => "Classic",
            Self::Midnight => "Midnight",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn label(self) -> &'static str {
        match self {
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSource {
    Activity,
    Chat,
    Approval,
    Panel,
}

impl LogSource {
    pub fn label(self) -> &'static str {
        match self {
            Self::Activity => "activity",
            Self::Chat => "chat",
            Self::Approval => "approval",
            Self::Panel => "panel",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub seq: u64,
    pub level: LogLevel,
    pub ts_ms: Option<u64>,
    pub source: LogSource,
    pub context: Option<String>,
    pub message: String,
    pub run_id: Option<RunId>,
}

impl LogEntry {
    pub fn new(level: LogLevel, source: LogSource, message: impl Into<String>) -> Self {
        Self {
            seq: 0,
            level,
            ts_ms: None,
            source,
            context: None,
            message: message.into(),
            run_id: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_run(mut self, run_id: RunId) -> Self {
        self.run_id = Some(run_id);
        self
    }
}

/// Bounded FIFO of diagnostics; `seq` is assigned on append.
#[derive(Debug, Clone)]
pub struct LogBuffer {
    cap: usize,
    next_seq: u64,
    buf: VecDeque<LogEntry>,
}

impl LogBuffer {
    pub fn new(cap: usize) -> Self {
        let cap = cap.max(1);
        Self {
            cap,
            next_seq: 1,
            buf: VecDeque::with_capacity(cap),
        }
    }

    pub fn append(&mut self, mut entry: LogEntry) {
        entry.seq = self.next_seq;
        self.next_seq += 1;

        if self.buf.len() == self.cap {
            self.buf.pop_front();
        }
        self.buf.push_back(entry);
    }

    pub fn clear(&mut self) {
        self.buf.clear();
        self.next_seq = 1;
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &LogEntry> {
        self.buf.iter()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ActivityState {
    pub runs: Vec<Run>,
    pub active_run_id: Option<RunId>,
}

impl ActivityState {
    pub fn run(&self, run_id: &RunId) -> Option<&Run> {
        self.runs.iter().find(|run| run.id == *run_id)
    }

    pub fn run_mut(&mut self, run_id: &RunId) -> Option<&mut Run> {
        self.runs.iter_mut().find(|run| run.id == *run_id)
    }

    /// Returns the run and whether it was created by this call.
    pub fn run_entry(&mut self, run_id: &RunId) -> (&mut Run, bool) {
        match self.runs.iter().position(|run| run.id == *run_id) {
            Some(idx) => (&mut self.runs[idx], false),
            None => {
                self.runs.push(Run::new(run_id.clone()));
                let idx = self.runs.len() - 1;
                (&mut self.runs[idx], true)
            }
        }
    }

    pub fn active_run(&self) -> Option<&Run> {
        self.active_run_id
            .as_ref()
            .and_then(|run_id| self.run(run_id))
            .or_else(|| self.runs.last())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanelSettings {
    pub approval_timeout_ms: Option<u64>,
    pub collapse_finished_phases: bool,
    pub theme: UiTheme,
}

impl PanelSettings {
    pub fn from_config(config: &RelayConfig) -> Self {
        Self {
            approval_timeout_ms: config.approval.timeout_ms,
            collapse_finished_phases: config.view.collapse_finished_phases,
            theme: config.view.theme,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PanelState {
    pub activity: ActivityState,
    pub chat: ChatSurface,
    pub approval: ApprovalSequencer,
    pub settings: PanelSettings,
    pub logs: LogBuffer,
    pub focus: PanelFocus,
    pub clock_ms: u64,
}

impl Default for PanelState {
    fn default() -> Self {
        Self::new(PanelSettings::default(), DEFAULT_LOG_CAPACITY)
    }
}

impl PanelState {
    pub fn new(settings: PanelSettings, log_capacity: usize) -> Self {
        Self {
            activity: ActivityState::default(),
            chat: ChatSurface::new(),
            approval: ApprovalSequencer::new(),
            settings,
            logs: LogBuffer::new(log_capacity),
            focus: PanelFocus::Activity,
            clock_ms: 0,
        }
    }

    pub fn from_config(config: &RelayConfig) -> Self {
        Self::new(PanelSettings::from_config(config), config.logs.capacity)
    }

    pub fn log(&mut self, mut entry: LogEntry) {
        if self.clock_ms > 0 {
            entry.ts_ms = Some(self.clock_ms);
        }
        self.logs.append(entry);
    }
}
