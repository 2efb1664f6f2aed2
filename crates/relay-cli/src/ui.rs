use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::io::BufReader;
use std::path::Path;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crossterm::event;
use crossterm::event::Event;
use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyEventKind;
use crossterm::event::KeyModifiers;
use crossterm::execute;
use crossterm::terminal::disable_raw_mode;
use crossterm::terminal::enable_raw_mode;
use crossterm::terminal::EnterAlternateScreen;
use crossterm::terminal::LeaveAlternateScreen;
use ratatui::backend::Backend;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Constraint;
use ratatui::layout::Direction;
use ratatui::layout::Layout;
use ratatui::layout::Rect;
use ratatui::style::Color;
use ratatui::style::Modifier;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::text::Span;
use ratatui::widgets::Block;
use ratatui::widgets::Borders;
use ratatui::widgets::Clear;
use ratatui::widgets::List;
use ratatui::widgets::ListItem;
use ratatui::widgets::ListState;
use ratatui::widgets::Paragraph;
use ratatui::widgets::Wrap;
use ratatui::Frame;
use ratatui::Terminal;
use tracing::info;
use tracing::warn;

use relay_channel::Inbox;
use relay_channel::JsonLinesInbox;
use relay_channel::JsonLinesOutbox;
use relay_channel::Outbox;
use relay_core::actions::filtered_menu_indices;
use relay_core::actions::PanelAction;
use relay_core::actions::UserAction;
use relay_core::actions::MENU_ITEMS;
use relay_core::approval::ActionStatus;
use relay_core::approval::PlanPhase;
use relay_core::events::RiskLevel;
use relay_core::protocol::InboundMessage;
use relay_core::reducer::reduce;
use relay_core::reducer::PanelEffect;
use relay_core::state::LogEntry;
use relay_core::state::LogLevel;
use relay_core::state::LogSource;
use relay_core::state::PanelFocus;
use relay_core::state::PanelState;
use relay_core::state::UiTheme;
use relay_core::streaming::ChatRole;
use relay_core::view::activity_rows;
use relay_core::view::format_log_entry;
use relay_core::view::plan_lines;
use relay_core::view::ActivityRow;

const INBOX_POLL: Duration = Duration::from_millis(200);
const INPUT_POLL: Duration = Duration::from_millis(100);

struct TuiGuard;

impl Drop for TuiGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, crossterm::cursor::Show);
    }
}

enum UiEvent {
    Inbound(InboundMessage),
    ReaderStopped(String),
}

/// Terminal-only state: cursors, the command menu and the prompt being typed.
#[derive(Debug, Default)]
pub struct ViewState {
    pub activity_cursor: usize,
    pub plan_cursor: usize,
    pub menu: Option<CommandMenu>,
    pub prompt: String,
    pub reader_status: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CommandMenu {
    pub query: String,
    pub selected: usize,
}

impl CommandMenu {
    fn matches(&self) -> Vec<usize> {
        filtered_menu_indices(&self.query)
    }
}

pub fn run(mut state: PanelState, inbox_path: &Path, outbox_path: &Path) -> anyhow::Result<()> {
    let inbox_file = File::open(inbox_path)?;
    let outbox_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(outbox_path)?;
    let mut outbox = JsonLinesOutbox::new(outbox_file);

    let (tx, rx) = mpsc::channel();
    spawn_reader(inbox_file, tx);
    info!(inbox = %inbox_path.display(), outbox = %outbox_path.display(), "watch started");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, crossterm::cursor::Hide)?;
    let _guard = TuiGuard;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    let mut view = ViewState::default();
    run_app(&mut terminal, &mut state, &mut view, &rx, &mut outbox)?;
    Ok(())
}

fn spawn_reader(file: File, tx: mpsc::Sender<UiEvent>) {
    thread::spawn(move || {
        let mut inbox = JsonLinesInbox::new(BufReader::new(file));
        loop {
            match inbox.recv() {
                Ok(Some(message)) => {
                    if tx.send(UiEvent::Inbound(message)).is_err() {
                        return;
                    }
                }
                Ok(None) => thread::sleep(INBOX_POLL),
                Err(err) => {
                    warn!(error = %err, "inbox reader stopped");
                    let _ = tx.send(UiEvent::ReaderStopped(err.to_string()));
                    return;
                }
            }
        }
    });
}

fn now_ms() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0)
}

fn run_app<B: Backend, O: Outbox>(
    terminal: &mut Terminal<B>,
    state: &mut PanelState,
    view: &mut ViewState,
    rx: &mpsc::Receiver<UiEvent>,
    outbox: &mut O,
) -> io::Result<()> {
    let mut dirty = true;
    loop {
        let mut effects = reduce(state, PanelAction::Tick { now_ms: now_ms() });
        while let Ok(event) = rx.try_recv() {
            match event {
                UiEvent::Inbound(message) => {
                    effects.extend(reduce(state, PanelAction::Agent(message)));
                }
                UiEvent::ReaderStopped(reason) => {
                    state.log(
                        LogEntry::new(LogLevel::Error, LogSource::Panel, reason.clone())
                            .with_context("inbox"),
                    );
                    view.reader_status = Some(reason);
                    dirty = true;
                }
            }
        }

        if event::poll(INPUT_POLL)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    match handle_key_event(key, state, view) {
                        KeyHandlerResult::Continue(more) => {
                            effects.extend(more);
                            dirty = true;
                        }
                        KeyHandlerResult::Exit => return Ok(()),
                    }
                }
                Event::Resize(_, _) => dirty = true,
                _ => {}
            }
        }

        for effect in effects {
            match effect {
                PanelEffect::RequestFrame => dirty = true,
                PanelEffect::Post(message) => {
                    if let Err(err) = outbox.post(&message) {
                        warn!(kind = message.kind(), error = %err, "failed to post");
                        state.log(
                            LogEntry::new(
                                LogLevel::Error,
                                LogSource::Panel,
                                format!("could not post {}: {err}", message.kind()),
                            )
                            .with_context("outbox"),
                        );
                    }
                    dirty = true;
                }
                PanelEffect::CopyToClipboard(text) => {
                    let copied = arboard::Clipboard::new()
                        .and_then(|mut clipboard| clipboard.set_text(text))
                        .is_ok();
                    let message = if copied {
                        "copied last assistant message"
                    } else {
                        "clipboard unavailable"
                    };
                    state.log(LogEntry::new(LogLevel::Info, LogSource::Chat, message));
                    dirty = true;
                }
                PanelEffect::Quit => return Ok(()),
            }
        }

        if dirty {
            clamp_cursors(state, view);
            terminal.draw(|f| ui(f, state, view))?;
            dirty = false;
        }
    }
}

enum KeyHandlerResult {
    Continue(Vec<PanelEffect>),
    Exit,
}

fn user(state: &mut PanelState, action: UserAction) -> Vec<PanelEffect> {
    reduce(state, PanelAction::User(action))
}

fn handle_key_event(
    key: KeyEvent,
    state: &mut PanelState,
    view: &mut ViewState,
) -> KeyHandlerResult {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return KeyHandlerResult::Exit;
    }
    if view.menu.is_some() {
        return handle_menu_keys(key, state, view);
    }
    if state.focus == PanelFocus::Chat {
        if let Some(result) = handle_prompt_keys(key, state, view) {
            return result;
        }
    }
    handle_global_keys(key, state, view)
}

fn handle_menu_keys(
    key: KeyEvent,
    state: &mut PanelState,
    view: &mut ViewState,
) -> KeyHandlerResult {
    let Some(menu) = view.menu.as_mut() else {
        return KeyHandlerResult::Continue(Vec::new());
    };
    let matches = menu.matches();
    match key.code {
        KeyCode::Esc => view.menu = None,
        KeyCode::Up => menu.selected = menu.selected.saturating_sub(1),
        KeyCode::Down => {
            if menu.selected + 1 < matches.len() {
                menu.selected += 1;
            }
        }
        KeyCode::Backspace => {
            menu.query.pop();
            menu.selected = 0;
        }
        KeyCode::Char(c) => {
            menu.query.push(c);
            menu.selected = 0;
        }
        KeyCode::Enter => {
            let command = matches
                .get(menu.selected)
                .map(|idx| MENU_ITEMS[*idx].command);
            view.menu = None;
            if let Some(command) = command {
                let effects = user(state, UserAction::RunMenuCommand(command));
                if effects.contains(&PanelEffect::Quit) {
                    return KeyHandlerResult::Exit;
                }
                return KeyHandlerResult::Continue(effects);
            }
        }
        _ => {}
    }
    KeyHandlerResult::Continue(Vec::new())
}

/// Typing in the chat pane. Returns `None` for keys the prompt does not consume.
fn handle_prompt_keys(
    key: KeyEvent,
    state: &mut PanelState,
    view: &mut ViewState,
) -> Option<KeyHandlerResult> {
    let effects = match key.code {
        KeyCode::Enter => {
            let prompt = std::mem::take(&mut view.prompt);
            user(state, UserAction::SendPrompt(prompt))
        }
        KeyCode::Backspace => {
            view.prompt.pop();
            Vec::new()
        }
        KeyCode::Esc => user(state, UserAction::SetFocus(PanelFocus::Activity)),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            view.prompt.push(c);
            Vec::new()
        }
        _ => return None,
    };
    Some(KeyHandlerResult::Continue(effects))
}

fn handle_global_keys(
    key: KeyEvent,
    state: &mut PanelState,
    view: &mut ViewState,
) -> KeyHandlerResult {
    let effects = match key.code {
        KeyCode::Char('q') => return KeyHandlerResult::Exit,
        KeyCode::Char('a') => user(state, UserAction::ApproveCurrent),
        KeyCode::Char('x') => user(state, UserAction::RejectPlan),
        KeyCode::Char('y') => user(state, UserAction::CopyLastMessage),
        KeyCode::Char('l') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            user(state, UserAction::ClearChat)
        }
        KeyCode::Char('/') => {
            view.menu = Some(CommandMenu::default());
            Vec::new()
        }
        KeyCode::Tab => user(state, UserAction::NextFocus),
        KeyCode::BackTab => user(state, UserAction::PrevFocus),
        KeyCode::Up => {
            move_cursor(state, view, false);
            Vec::new()
        }
        KeyCode::Down => {
            move_cursor(state, view, true);
            Vec::new()
        }
        KeyCode::Char(' ') => toggle_phase_under_cursor(state, view),
        KeyCode::Char('o') => match selected_path(state, view) {
            Some(path) => user(state, UserAction::OpenFile { path }),
            None => Vec::new(),
        },
        KeyCode::Char('d') => match selected_path(state, view) {
            Some(path) => user(state, UserAction::ReviewDiff { path }),
            None => Vec::new(),
        },
        KeyCode::Char('t') => user(state, UserAction::CycleTheme),
        KeyCode::Char('[') => switch_run(state, view, false),
        KeyCode::Char(']') => switch_run(state, view, true),
        _ => Vec::new(),
    };
    KeyHandlerResult::Continue(effects)
}

/// Makes the previous or next run active, wrapping around.
fn switch_run(
    state: &mut PanelState,
    view: &mut ViewState,
    forward: bool,
) -> Vec<PanelEffect> {
    let runs = &state.activity.runs;
    if runs.len() < 2 {
        return Vec::new();
    }
    let current = state
        .activity
        .active_run_id
        .as_ref()
        .and_then(|id| runs.iter().position(|run| run.id == *id))
        .unwrap_or(0);
    let next = if forward {
        (current + 1) % runs.len()
    } else {
        (current + runs.len() - 1) % runs.len()
    };
    let run_id = runs[next].id.clone();
    view.activity_cursor = 0;
    user(state, UserAction::SelectRun(run_id))
}

fn current_rows(state: &PanelState) -> Vec<ActivityRow> {
    state
        .activity
        .active_run()
        .map(activity_rows)
        .unwrap_or_default()
}

fn move_cursor(state: &PanelState, view: &mut ViewState, down: bool) {
    let (cursor, len) = match state.focus {
        PanelFocus::Activity => (&mut view.activity_cursor, current_rows(state).len()),
        PanelFocus::Plan => (
            &mut view.plan_cursor,
            state
                .approval
                .active()
                .map(|active| active.plan.actions.len())
                .unwrap_or(0),
        ),
        PanelFocus::Chat | PanelFocus::Logs => return,
    };
    if down {
        if *cursor + 1 < len {
            *cursor += 1;
        }
    } else {
        *cursor = cursor.saturating_sub(1);
    }
}

fn clamp_cursors(state: &PanelState, view: &mut ViewState) {
    let rows = current_rows(state).len();
    view.activity_cursor = view.activity_cursor.min(rows.saturating_sub(1));
    let actions = state
        .approval
        .active()
        .map(|active| active.plan.actions.len())
        .unwrap_or(0);
    view.plan_cursor = view.plan_cursor.min(actions.saturating_sub(1));
}

fn toggle_phase_under_cursor(state: &mut PanelState, view: &ViewState) -> Vec<PanelEffect> {
    if state.focus != PanelFocus::Activity {
        return Vec::new();
    }
    let Some(run_id) = state.activity.active_run().map(|run| run.id.clone()) else {
        return Vec::new();
    };
    let rows = current_rows(state);
    let Some(row) = rows.get(view.activity_cursor) else {
        return Vec::new();
    };
    user(
        state,
        UserAction::TogglePhaseCollapsed {
            run_id,
            phase_id: row.phase_id().to_string(),
        },
    )
}

/// File the user is pointing at: the activity row under the cursor, or the selected plan action.
fn selected_path(state: &PanelState, view: &ViewState) -> Option<String> {
    match state.focus {
        PanelFocus::Activity => current_rows(state)
            .get(view.activity_cursor)
            .and_then(|row| row.path().map(str::to_string)),
        PanelFocus::Plan => state
            .approval
            .active()
            .and_then(|active| active.plan.actions.get(view.plan_cursor))
            .and_then(|action| action.path.clone()),
        PanelFocus::Chat | PanelFocus::Logs => None,
    }
}

#[derive(Clone, Copy)]
struct UiPalette {
    accent: Color,
    success: Color,
    warning: Color,
    danger: Color,
    muted: Color,
    border: Color,
    selected_bg: Color,
}

fn palette_for(theme: UiTheme) -> UiPalette {
    match theme {
        UiTheme::Classic => UiPalette {
            accent: Color::Cyan,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
            muted: Color::DarkGray,
            border: Color::Gray,
            selected_bg: Color::DarkGray,
        },
        UiTheme::Midnight => UiPalette {
            accent: Color::LightBlue,
            success: Color::LightGreen,
            warning: Color::Yellow,
            danger: Color::LightRed,
            muted: Color::Gray,
            border: Color::LightBlue,
            selected_bg: Color::Rgb(18, 28, 42),
        },
    }
}

fn risk_color(risk: RiskLevel, palette: UiPalette) -> Color {
    match risk {
        RiskLevel::Low => palette.success,
        RiskLevel::Medium => palette.warning,
        RiskLevel::High => palette.danger,
    }
}

fn pane_block(title: &str, focused: bool, palette: UiPalette) -> Block<'_> {
    let border = if focused { palette.accent } else { palette.border };
    Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(border))
}

pub fn ui(f: &mut Frame, state: &PanelState, view: &ViewState) {
    let palette = palette_for(state.settings.theme);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(6),
            Constraint::Length(7),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .split(f.area());

    render_header(f, chunks[0], state, view, palette);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(chunks[1]);
    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(body[1]);

    render_activity(f, body[0], state, view, palette);
    render_plan(f, right[0], state, view, palette);
    render_chat(f, right[1], state, palette);
    render_logs(f, chunks[2], state, palette);
    render_prompt(f, chunks[3], state, view, palette);

    let footer = Paragraph::new(
        "a approve  x reject  space fold  [ ] run  o open  d diff  y copy  / menu  tab  q quit",
    )
    .style(Style::default().fg(palette.muted));
    f.render_widget(footer, chunks[4]);

    if let Some(menu) = &view.menu {
        render_menu(f, menu, palette);
    }
}

fn render_header(
    f: &mut Frame,
    area: Rect,
    state: &PanelState,
    view: &ViewState,
    palette: UiPalette,
) {
    let run = match state.activity.active_run() {
        Some(run) => format!("run {} {}", run.id, run.status.label()),
        None => "no run yet".to_string(),
    };
    let plan = state
        .approval
        .phase()
        .map(PlanPhase::label)
        .unwrap_or("no plan");
    let mut spans = vec![
        Span::styled(
            "Relay",
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(
            " | {run} | {plan} | {} | {}",
            state.focus.label(),
            state.settings.theme.label()
        )),
    ];
    if let Some(status) = &view.reader_status {
        spans.push(Span::styled(
            format!(" | inbox: {status}"),
            Style::default().fg(palette.danger),
        ));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_activity(
    f: &mut Frame,
    area: Rect,
    state: &PanelState,
    view: &ViewState,
    palette: UiPalette,
) {
    let focused = state.focus == PanelFocus::Activity;
    let rows = current_rows(state);
    let items: Vec<ListItem> = rows
        .iter()
        .map(|row| match row {
            ActivityRow::Phase {
                title,
                event_count,
                collapsed,
                open,
                is_implicit,
                ..
            } => {
                let marker = if *collapsed { "▸" } else { "▾" };
                let style = if *is_implicit {
                    Style::default().fg(palette.muted)
                } else {
                    Style::default().fg(palette.accent).add_modifier(Modifier::BOLD)
                };
                let mut spans = vec![
                    Span::styled(format!("{marker} {title}"), style),
                    Span::styled(format!(" ({event_count})"), Style::default().fg(palette.muted)),
                ];
                if *open {
                    spans.push(Span::styled(" …", Style::default().fg(palette.warning)));
                }
                ListItem::new(Line::from(spans))
            }
            ActivityRow::Event {
                label,
                text,
                has_diff,
                is_error,
                ..
            } => {
                let color = if *is_error { palette.danger } else { palette.muted };
                let mut spans = vec![
                    Span::styled(format!("    {label:<8}"), Style::default().fg(color)),
                    Span::raw(text.clone()),
                ];
                if *has_diff {
                    spans.push(Span::styled(" [diff]", Style::default().fg(palette.accent)));
                }
                ListItem::new(Line::from(spans))
            }
        })
        .collect();

    let mut list_state = ListState::default();
    if focused && !rows.is_empty() {
        list_state.select(Some(view.activity_cursor));
    }
    let list = List::new(items)
        .block(pane_block("Activity", focused, palette))
        .highlight_style(Style::default().bg(palette.selected_bg));
    f.render_stateful_widget(list, area, &mut list_state);
}

fn render_plan(
    f: &mut Frame,
    area: Rect,
    state: &PanelState,
    view: &ViewState,
    palette: UiPalette,
) {
    let focused = state.focus == PanelFocus::Plan;
    let Some(active) = state.approval.active() else {
        let empty = Paragraph::new("No plan proposed.")
            .style(Style::default().fg(palette.muted))
            .block(pane_block("Plan", focused, palette));
        f.render_widget(empty, area);
        return;
    };

    let title = format!(
        "Plan {} · {} · {}/{}",
        active.plan_id(),
        active.phase().label(),
        active.completed_count(),
        active.plan.actions.len()
    );
    let mut items = Vec::new();
    if !active.plan.message.is_empty() {
        items.push(ListItem::new(Line::from(Span::styled(
            active.plan.message.clone(),
            Style::default().add_modifier(Modifier::ITALIC),
        ))));
    }
    let offset = items.len();
    for line in plan_lines(active) {
        let status_color = match line.status {
            ActionStatus::Completed => palette.success,
            ActionStatus::Requested => palette.accent,
            ActionStatus::Failed => palette.danger,
            ActionStatus::Pending => palette.muted,
        };
        let mut lines = vec![Line::from(vec![
            Span::styled(
                format!("{:>2}. {:<8}", line.index + 1, line.status.label()),
                Style::default().fg(status_color),
            ),
            Span::styled(
                format!("{:<7}", line.risk.label()),
                Style::default().fg(risk_color(line.risk, palette)),
            ),
            Span::raw(format!("{} {}", line.kind, line.target)),
        ])];
        for warning in &line.warnings {
            lines.push(Line::from(Span::styled(
                format!("      ! {warning}"),
                Style::default().fg(palette.warning),
            )));
        }
        if let Some(error) = &line.error {
            lines.push(Line::from(Span::styled(
                format!("      ✗ {error} (press a to retry)"),
                Style::default().fg(palette.danger),
            )));
        }
        items.push(ListItem::new(lines));
    }

    let mut list_state = ListState::default();
    if focused && !active.plan.actions.is_empty() {
        list_state.select(Some(offset + view.plan_cursor));
    }
    let list = List::new(items)
        .block(pane_block(&title, focused, palette))
        .highlight_style(Style::default().bg(palette.selected_bg));
    f.render_stateful_widget(list, area, &mut list_state);
}

fn render_chat(f: &mut Frame, area: Rect, state: &PanelState, palette: UiPalette) {
    let focused = state.focus == PanelFocus::Chat;
    let mut lines = Vec::new();
    for message in state.chat.transcript() {
        let role_style = match message.role {
            ChatRole::User => Style::default().fg(palette.accent),
            ChatRole::Assistant => Style::default().fg(palette.success),
            ChatRole::System => Style::default().fg(palette.muted),
        };
        let mut spans = vec![
            Span::styled(format!("{}: ", message.role.label()), role_style),
            Span::raw(message.text.clone()),
        ];
        if message.streaming {
            spans.push(Span::styled("▌", Style::default().fg(palette.accent)));
        }
        lines.push(Line::from(spans));
    }
    if state.chat.is_thinking() {
        lines.push(Line::from(Span::styled(
            "assistant is thinking…",
            Style::default().fg(palette.muted),
        )));
    }

    let inner_height = area.height.saturating_sub(2) as usize;
    let scroll = lines.len().saturating_sub(inner_height);
    let chat = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((u16::try_from(scroll).unwrap_or(u16::MAX), 0))
        .block(pane_block("Chat", focused, palette));
    f.render_widget(chat, area);
}

fn render_logs(f: &mut Frame, area: Rect, state: &PanelState, palette: UiPalette) {
    let focused = state.focus == PanelFocus::Logs;
    let visible = area.height.saturating_sub(2) as usize;
    let mut entries: Vec<&LogEntry> = state
        .logs
        .iter()
        .rev()
        .filter(|entry| focused || entry.level >= LogLevel::Info)
        .take(visible)
        .collect();
    entries.reverse();

    let lines: Vec<Line> = entries
        .into_iter()
        .map(|entry| {
            let color = match entry.level {
                LogLevel::Error => palette.danger,
                LogLevel::Warn => palette.warning,
                LogLevel::Info => palette.border,
                LogLevel::Debug | LogLevel::Trace => palette.muted,
            };
            Line::from(Span::styled(format_log_entry(entry), Style::default().fg(color)))
        })
        .collect();
    f.render_widget(
        Paragraph::new(lines).block(pane_block("Logs", focused, palette)),
        area,
    );
}

fn render_prompt(
    f: &mut Frame,
    area: Rect,
    state: &PanelState,
    view: &ViewState,
    palette: UiPalette,
) {
    let focused = state.focus == PanelFocus::Chat;
    let text = if view.prompt.is_empty() && !focused {
        Line::from(Span::styled(
            "tab to the chat pane to send a prompt",
            Style::default().fg(palette.muted),
        ))
    } else {
        let cursor = if focused { "▏" } else { "" };
        Line::from(format!("> {}{cursor}", view.prompt))
    };
    f.render_widget(
        Paragraph::new(text).block(pane_block("Prompt", focused, palette)),
        area,
    );
}

fn render_menu(f: &mut Frame, menu: &CommandMenu, palette: UiPalette) {
    let area = centered_rect(50, 60, f.area());
    f.render_widget(Clear, area);
    let items: Vec<ListItem> = menu
        .matches()
        .into_iter()
        .map(|idx| ListItem::new(MENU_ITEMS[idx].label))
        .collect();
    let mut list_state = ListState::default();
    if !items.is_empty() {
        list_state.select(Some(menu.selected));
    }
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Commands: {}", menu.query))
                .border_style(Style::default().fg(palette.accent)),
        )
        .highlight_style(Style::default().bg(palette.selected_bg).add_modifier(Modifier::BOLD));
    f.render_stateful_widget(list, area, &mut list_state);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
