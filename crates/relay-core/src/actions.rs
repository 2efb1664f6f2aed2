use crate::events::RunId;
use crate::protocol::InboundMessage;
use crate::state::PanelFocus;
use crate::state::UiTheme;

#[derive(Debug, Clone)]
pub enum PanelAction {
    Agent(InboundMessage),
    User(UserAction),
    Tick { now_ms: u64 },
}

impl From<InboundMessage> for PanelAction {
    fn from(message: InboundMessage) -> Self {
        Self::Agent(message)
    }
}

impl From<UserAction> for PanelAction {
    fn from(action: UserAction) -> Self {
        Self::User(action)
    }
}

#[derive(Debug, Clone)]
pub enum UserAction {
    ApproveCurrent,
    RejectPlan,
    SendPrompt(String),
    TogglePhaseCollapsed { run_id: RunId, phase_id: String },
    CollapseAllPhases { run_id: RunId },
    ExpandAllPhases { run_id: RunId },
    SelectRun(RunId),
    OpenFile { path: String },
    ReviewDiff { path: String },
    CopyLastMessage,
    ClearChat,
    ClearLogs,
    NextFocus,
    PrevFocus,
    SetFocus(PanelFocus),
    SetTheme(UiTheme),
    CycleTheme,
    RunMenuCommand(MenuCommand),
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuCommand {
    ApproveCurrent,
    RejectPlan,
    CollapseAllPhases,
    ExpandAllPhases,
    CopyLastMessage,
    ClearChat,
    ClearLogs,
    Focus(PanelFocus),
    SetTheme(UiTheme),
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuItem {
    pub label: &'static str,
    pub command: MenuCommand,
}

pub const MENU_ITEMS: [MenuItem; 14] = [
    MenuItem {
        label: "Approve current action",
        command: MenuCommand::ApproveCurrent,
    },
    MenuItem {
        label: "Reject plan",
        command: MenuCommand::RejectPlan,
    },
    MenuItem {
        label: "Collapse all phases",
        command: MenuCommand::CollapseAllPhases,
    },
    MenuItem {
        label: "Expand all phases",
        command: MenuCommand::ExpandAllPhases,
    },
    MenuItem {
        label: "Copy last assistant message",
        command: MenuCommand::CopyLastMessage,
    },
    MenuItem {
        label: "Clear chat",
        command: MenuCommand::ClearChat,
    },
    MenuItem {
        label: "Clear logs",
        command: MenuCommand::ClearLogs,
    },
    MenuItem {
        label: "Focus: Activity",
        command: MenuCommand::Focus(PanelFocus::Activity),
    },
    MenuItem {
        label: "Focus: Chat",
        command: MenuCommand::Focus(PanelFocus::Chat),
    },
    MenuItem {
        label: "Focus: Plan",
        command: MenuCommand::Focus(PanelFocus::Plan),
    },
    MenuItem {
        label: "Focus: Logs",
        command: MenuCommand::Focus(PanelFocus::Logs),
    },
    MenuItem {
        label: "Theme: Classic",
        command: MenuCommand::SetTheme(UiTheme::Classic),
    },
    MenuItem {
        label: "Theme: Midnight",
        command: MenuCommand::SetTheme(UiTheme::Midnight),
    },
    MenuItem {
        label: "Quit Relay",
        command: MenuCommand::Quit,
    },
];

pub fn filtered_menu_indices(query: &str) -> Vec<usize> {
    let query = query.trim().to_ascii_lowercase();
    if query.is_empty() {
        return (0..MENU_ITEMS.len()).collect();
    }

    MENU_ITEMS
        .iter()
        .enumerate()
        .filter_map(|(idx, item)| {
            if item.label.to_ascii_lowercase().contains(&query) {
                Some(idx)
            } else {
                None
            }
        })
        .collect()
}
