//! Read-only projections of [`PanelState`] shared by the text replay and the terminal UI.

use std::borrow::Cow;
use std::fmt::Write as _;
use std::sync::OnceLock;

use chrono::DateTime;
use chrono::Utc;
use regex::Regex;

use crate::approval::ActionStatus;
use crate::approval::ActivePlan;
use crate::events::ActivityEvent;
use crate::events::RiskLevel;
use crate::events::Run;
use crate::phases::derive_groups;
use crate::phases::open_phase_ids;
use crate::state::LogEntry;
use crate::state::PanelState;

static ANSI_ESCAPES: OnceLock<Option<Regex>> = OnceLock::new();

/// Removes terminal color/cursor sequences agents tend to leave in tool output.
pub fn strip_ansi(text: &str) -> Cow<'_, str> {
    let pattern = ANSI_ESCAPES.get_or_init(|| Regex::new(r"\x1b\[[0-9;?]*[ -/]*[@-~]").ok());
    match pattern {
        Some(re) => re.replace_all(text, ""),
        None => Cow::Borrowed(text),
    }
}

pub fn event_summary(event: &ActivityEvent) -> String {
    match event {
        ActivityEvent::PhaseStart { title, .. } => title.clone(),
        ActivityEvent::PhaseEnd { phase_id } => format!("end of {phase_id}"),
        ActivityEvent::Analysis { text } => strip_ansi(text).into_owned(),
        ActivityEvent::Progress { label, percent } => match percent {
            Some(percent) => format!("{label} ({percent:.0}%)"),
            None => label.clone(),
        },
        ActivityEvent::Error { message, details } => match details {
            Some(details) => format!("{message}: {}", strip_ansi(details)),
            None => message.clone(),
        },
        ActivityEvent::ToolSearch { query, cwd, files } => {
            let mut line = format!("\"{query}\"");
            if let Some(cwd) = cwd {
                let _ = write!(line, " in {cwd}");
            }
            if let Some(files) = files {
                let _ = write!(line, " ({} files)", files.len());
            }
            line
        }
        ActivityEvent::FileRead { path, range } => match range {
            Some(range) => format!("{path}:{}-{}", range.start, range.end),
            None => path.clone(),
        },
        ActivityEvent::Edit {
            path,
            summary,
            stats,
            ..
        } => {
            let mut line = path.clone();
            if let Some(stats) = stats {
                let _ = write!(line, " (+{} -{})", stats.added, stats.removed);
            }
            if let Some(summary) = summary {
                let _ = write!(line, " {summary}");
            }
            line
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActivityRow {
    Phase {
        phase_id: String,
        title: String,
        event_count: usize,
        collapsed: bool,
        is_implicit: bool,
        open: bool,
    },
    Event {
        phase_id: String,
        label: &'static str,
        text: String,
        path: Option<String>,
        has_diff: bool,
        is_error: bool,
    },
}

impl ActivityRow {
    pub fn phase_id(&self) -> &str {
        match self {
            Self::Phase { phase_id, .. } | Self::Event { phase_id, .. } => phase_id,
        }
    }

    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Event { path, .. } => path.as_deref(),
            Self::Phase { .. } => None,
        }
    }
}

/// Flattens a run into header and event rows, hiding events of collapsed phases.
pub fn activity_rows(run: &Run) -> Vec<ActivityRow> {
    let open = open_phase_ids(&run.events);
    let mut rows = Vec::new();
    for group in derive_groups(&run.events) {
        let collapsed = run.is_collapsed(&group.id);
        rows.push(ActivityRow::Phase {
            phase_id: group.id.clone(),
            title: group.title.clone(),
            event_count: group.events.len(),
            collapsed,
            is_implicit: group.is_implicit,
            open: open.contains(&group.id),
        });
        if collapsed {
            continue;
        }
        for event in &group.events {
            rows.push(ActivityRow::Event {
                phase_id: group.id.clone(),
                label: event.label(),
                text: event_summary(event),
                path: event.path().map(str::to_string),
                has_diff: matches!(event, ActivityEvent::Edit { diff: Some(_), .. }),
                is_error: matches!(event, ActivityEvent::Error { .. }),
            });
        }
    }
    rows
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanLine {
    pub index: usize,
    pub status: ActionStatus,
    pub risk: RiskLevel,
    pub kind: &'static str,
    pub target: String,
    pub warnings: Vec<String>,
    pub error: Option<String>,
}

pub fn plan_lines(active: &ActivePlan) -> Vec<PlanLine> {
    active
        .plan
        .actions
        .iter()
        .enumerate()
        .map(|(index, action)| {
            let status = active.action_status(index);
            PlanLine {
                index,
                status,
                risk: action.risk,
                kind: action.kind.label(),
                target: action.target().to_string(),
                warnings: action.warnings.clone(),
                error: if status == ActionStatus::Failed {
                    active.execution_error.clone()
                } else {
                    None
                },
            }
        })
        .collect()
}

pub fn format_log_entry(entry: &LogEntry) -> String {
    let stamp = entry
        .ts_ms
        .and_then(|ms| i64::try_from(ms).ok())
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|ts| ts.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".to_string());
    let mut line = format!(
        "#{} {stamp} {:<5} [{}]",
        entry.seq,
        entry.level.label(),
        entry.source.label()
    );
    if let Some(context) = &entry.context {
        let _ = write!(line, " {context}:");
    }
    let _ = write!(line, " {}", entry.message);
    line
}

/// Plain-text snapshot of the whole panel.
pub fn render_text(state: &PanelState) -> String {
    let mut out = String::new();

    for run in &state.activity.runs {
        let _ = writeln!(out, "== run {} [{}]", run.id, run.status.label());
        for row in activity_rows(run) {
            match row {
                ActivityRow::Phase {
                    title,
                    event_count,
                    collapsed,
                    open,
                    ..
                } => {
                    let marker = if collapsed { "+" } else { "-" };
                    let suffix = if open { " …" } else { "" };
                    let _ = writeln!(out, "  {marker} {title} ({event_count}){suffix}");
                }
                ActivityRow::Event { label, text, .. } => {
                    let _ = writeln!(out, "      {label:<8} {text}");
                }
            }
        }
    }

    if !state.chat.transcript().is_empty() {
        let _ = writeln!(out, "== chat");
        for message in state.chat.transcript() {
            let cursor = if message.streaming { "▌" } else { "" };
            let _ = writeln!(out, "  {}: {}{cursor}", message.role.label(), message.text);
        }
    }
    if state.chat.is_thinking() {
        let _ = writeln!(out, "  assistant is thinking…");
    }

    if let Some(active) = state.approval.active() {
        let phase = active.phase();
        let _ = writeln!(out, "== plan {} [{}]", active.plan_id(), phase.label());
        if !active.plan.message.is_empty() {
            let _ = writeln!(out, "  {}", active.plan.message);
        }
        for line in plan_lines(active) {
            let _ = writeln!(
                out,
                "  {}. [{}] {:<6} {} {}",
                line.index + 1,
                line.status.label(),
                line.risk.label(),
                line.kind,
                line.target
            );
            for warning in &line.warnings {
                let _ = writeln!(out, "       ! {warning}");
            }
            if let Some(error) = &line.error {
                let _ = writeln!(out, "       x {error}");
            }
        }
    }

    out
}
