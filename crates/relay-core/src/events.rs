use std::collections::BTreeSet;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

macro_rules! correlation_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

correlation_id!(RunId);
correlation_id!(MessageId);
correlation_id!(PlanId);

pub const IMPLICIT_PHASE_ID: &str = "phase-implicit";
pub const IMPLICIT_PHASE_TITLE: &str = "Working";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRange {
    pub start: u32,
    pub end: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditStats {
    pub added: u32,
    pub removed: u32,
}

/// One entry of a run's activity stream, as emitted by the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActivityEvent {
    PhaseStart {
        id: String,
        title: String,
    },
    PhaseEnd {
        #[serde(rename = "phaseId")]
        phase_id: String,
    },
    Analysis {
        text: String,
    },
    Progress {
        label: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        percent: Option<f64>,
    },
    Error {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        details: Option<String>,
    },
    ToolSearch {
        query: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cwd: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        files: Option<Vec<String>>,
    },
    FileRead {
        path: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        range: Option<LineRange>,
    },
    Edit {
        path: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        summary: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stats: Option<EditStats>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        diff: Option<String>,
    },
}

impl ActivityEvent {
    pub fn is_phase_marker(&self) -> bool {
        matches!(self, Self::PhaseStart { .. } | Self::PhaseEnd { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::PhaseStart { .. } => "phase-start",
            Self::PhaseEnd { .. } => "phase-end",
            Self::Analysis { .. } => "analysis",
            Self::Progress { .. } => "progress",
            Self::Error { .. } => "error",
            Self::ToolSearch { .. } => "search",
            Self::FileRead { .. } => "read",
            Self::Edit { .. } => "edit",
        }
    }

    /// File path the event points at, if any. Used for open-file / review-diff requests.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::FileRead { path, .. } | Self::Edit { path, .. } => Some(path.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhaseGroup {
    pub id: String,
    pub title: String,
    pub events: Vec<ActivityEvent>,
    pub is_implicit: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Done,
}

impl RunStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Done => "done",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Run {
    pub id: RunId,
    pub events: Vec<ActivityEvent>,
    pub status: RunStatus,
    pub collapsed_phase_ids: BTreeSet<String>,
}

impl Run {
    pub fn new(id: RunId) -> Self {
        Self {
            id,
            events: Vec::new(),
            status: RunStatus::Running,
            collapsed_phase_ids: BTreeSet::new(),
        }
    }

    pub fn is_collapsed(&self, phase_id: &str) -> bool {
        self.collapsed_phase_ids.contains(phase_id)
    }

    /// Flips the collapsed flag for a phase and returns the new value.
    pub fn toggle_collapsed(&mut self, phase_id: &str) -> bool {
        if self.collapsed_phase_ids.remove(phase_id) {
            false
        } else {
            self.collapsed_phase_ids.insert(phase_id.to_string());
            true
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionKind {
    CreateFile,
    EditFile,
    RunCommand,
}

impl ActionKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::CreateFile => "create file",
            Self::EditFile => "edit file",
            Self::RunCommand => "run command",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanAction {
    pub kind: ActionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    pub risk: RiskLevel,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
}

impl PlanAction {
    /// Short human description: the command for shell actions, the path otherwise.
    pub fn target(&self) -> &str {
        match self.kind {
            ActionKind::RunCommand => self
                .command
                .as_deref()
                .or(self.path.as_deref())
                .unwrap_or("<command>"),
            ActionKind::CreateFile | ActionKind::EditFile => self
                .path
                .as_deref()
                .or(self.command.as_deref())
                .unwrap_or("<path>"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalPlan {
    pub plan_id: PlanId,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub actions: Vec<PlanAction>,
}
