// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap};
use saira_app::{
    AppCommand, AppEvent, AppMode, AppState, CallRecord, ContactField, DEFAULT_ASSISTANT_ANNOTATION,
    DEFAULT_CONTACT_RESET, DEFAULT_CUSTOMER_ANNOTATION, DEFAULT_SEARCH_DEBOUNCE, LeadTag,
    LoadState, NO_TRANSCRIPT, RecordRow, SummarySegment, TranscriptLine, annotate_summary,
    capitalize_words, created_datetime, duration_detail, provider_call_id, recording_url,
    text_or_na, transcript_lines,
};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

const PAGE_ROWS: isize = 10;
const STATUS_CLEAR_AFTER: Duration = Duration::from_secs(4);
const SEARCH_PLACEHOLDER: &str = "Search by name, phone, status, or any keyword...";
const NO_MATCHES: &str = "No records found matching the search criteria";

pub trait AppRuntime {
    fn fetch_records(&mut self) -> Result<Vec<CallRecord>>;
    fn open_mailto(&mut self, link: &str) -> Result<()>;

    /// Starts the one fetch for this session. The result must arrive as
    /// `InternalEvent::RecordsLoaded`; the default runs inline.
    fn spawn_fetch(&mut self, tx: Sender<InternalEvent>) -> Result<()> {
        let result = self
            .fetch_records()
            .map_err(|error| format!("{error:#}"));
        tx.send(InternalEvent::RecordsLoaded(result))
            .map_err(|_| anyhow::anyhow!("record event channel closed"))?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
    SearchSettled { token: u64 },
    ContactReset { token: u64 },
    RecordsLoaded(Result<Vec<CallRecord>, String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewOptions {
    pub search_debounce: Duration,
    pub contact_reset: Duration,
    pub customer_annotation: String,
    pub assistant_annotation: String,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            search_debounce: DEFAULT_SEARCH_DEBOUNCE,
            contact_reset: DEFAULT_CONTACT_RESET,
            customer_annotation: DEFAULT_CUSTOMER_ANNOTATION.to_owned(),
            assistant_annotation: DEFAULT_ASSISTANT_ANNOTATION.to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct ViewData {
    status_token: u64,
    /// Text columns inside the detail modal at the last draw; 0 before the
    /// first frame.
    detail_width: u16,
}

pub fn run_app<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    options: &ViewOptions,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::default();
    let (internal_tx, internal_rx) = mpsc::channel();

    if let Err(error) = runtime.spawn_fetch(internal_tx.clone()) {
        state.dispatch(AppCommand::LoadFailed(format!("{error:#}")));
    }

    let mut result: Result<()> = Ok(());
    loop {
        process_internal_events(
            state,
            runtime,
            &mut view_data,
            options,
            &internal_tx,
            &internal_rx,
        );

        let drawn = terminal.draw(|frame| {
            view_data.detail_width = detail_area(frame.area()).width.saturating_sub(2);
            render(frame, state, options);
        });
        if let Err(error) = drawn {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = match event::poll(Duration::from_millis(120)).context("poll event") {
            Ok(has_event) => has_event,
            Err(error) => {
                result = Err(error);
                break;
            }
        };
        if !has_event {
            continue;
        }
        match event::read().context("read event") {
            Ok(Event::Key(key)) => {
                if handle_key_event(state, runtime, &mut view_data, options, &internal_tx, key) {
                    break;
                }
            }
            Ok(_) => {}
            Err(error) => {
                result = Err(error);
                break;
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn process_internal_events<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    options: &ViewOptions,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        let command = match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                AppCommand::ClearStatus
            }
            InternalEvent::ClearStatus { .. } => continue,
            InternalEvent::SearchSettled { token } => AppCommand::SearchSettled { token },
            InternalEvent::ContactReset { token } => AppCommand::ContactResetElapsed { token },
            InternalEvent::RecordsLoaded(Ok(records)) => AppCommand::RecordsLoaded(records),
            InternalEvent::RecordsLoaded(Err(message)) => AppCommand::LoadFailed(message),
        };
        dispatch_and_apply(state, runtime, view_data, options, tx, command);
    }
}

fn dispatch_and_apply<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    options: &ViewOptions,
    tx: &Sender<InternalEvent>,
    command: AppCommand,
) {
    let events = state.dispatch(command);
    for event in events {
        match event {
            AppEvent::SearchScheduled { token } => {
                schedule(tx, options.search_debounce, InternalEvent::SearchSettled { token });
            }
            AppEvent::ContactSubmitted { reset_token } => {
                schedule(
                    tx,
                    options.contact_reset,
                    InternalEvent::ContactReset { token: reset_token },
                );
            }
            AppEvent::MailtoRequested(link) => {
                if let Err(error) = runtime.open_mailto(&link) {
                    dispatch_and_apply(
                        state,
                        runtime,
                        view_data,
                        options,
                        tx,
                        AppCommand::SetStatus(format!("open mail client failed: {error:#}")),
                    );
                }
            }
            AppEvent::StatusUpdated(_) => {
                view_data.status_token = view_data.status_token.saturating_add(1);
                schedule(
                    tx,
                    STATUS_CLEAR_AFTER,
                    InternalEvent::ClearStatus {
                        token: view_data.status_token,
                    },
                );
            }
            AppEvent::LoadFinished { .. }
            | AppEvent::LoadFailed(_)
            | AppEvent::ModeChanged(_)
            | AppEvent::FilterApplied { .. }
            | AppEvent::SelectionChanged(_)
            | AppEvent::DetailOpened(_)
            | AppEvent::DetailClosed
            | AppEvent::ContactReset
            | AppEvent::StatusCleared => {}
        }
    }
}

/// One-shot timer: posts `event` after `delay`. Staleness is decided by the
/// receiver through the token the event carries.
fn schedule(tx: &Sender<InternalEvent>, delay: Duration, event: InternalEvent) {
    let sender = tx.clone();
    thread::spawn(move || {
        thread::sleep(delay);
        let _ = sender.send(event);
    });
}

/// Returns true when the app should exit.
fn handle_key_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    options: &ViewOptions,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.kind == KeyEventKind::Release {
        return false;
    }
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && matches!(key.code, KeyCode::Char('q') | KeyCode::Char('c')) {
        return true;
    }
    if state.mode == AppMode::Table && key.code == KeyCode::Char('q') {
        return true;
    }

    let scroll_max = if state.mode == AppMode::Detail {
        detail_scroll_limit(state, options, view_data.detail_width)
    } else {
        0
    };
    let Some(command) = command_for_key(state, key, scroll_max) else {
        return false;
    };
    dispatch_and_apply(state, runtime, view_data, options, internal_tx, command);
    false
}

fn command_for_key(state: &AppState, key: KeyEvent, scroll_max: u16) -> Option<AppCommand> {
    let scroll = |delta: i32| {
        Some(AppCommand::ScrollDetail {
            delta,
            max: scroll_max,
        })
    };
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match state.mode {
        AppMode::Table => match key.code {
            KeyCode::Char('/') => Some(AppCommand::FocusSearch),
            KeyCode::Char('j') | KeyCode::Down => Some(AppCommand::MoveSelection(1)),
            KeyCode::Char('k') | KeyCode::Up => Some(AppCommand::MoveSelection(-1)),
            KeyCode::Char('d') if ctrl => Some(AppCommand::MoveSelection(PAGE_ROWS)),
            KeyCode::Char('u') if ctrl => Some(AppCommand::MoveSelection(-PAGE_ROWS)),
            KeyCode::PageDown => Some(AppCommand::MoveSelection(PAGE_ROWS)),
            KeyCode::PageUp => Some(AppCommand::MoveSelection(-PAGE_ROWS)),
            KeyCode::Char('g') | KeyCode::Home => Some(AppCommand::SelectFirst),
            KeyCode::Char('G') | KeyCode::End => Some(AppCommand::SelectLast),
            KeyCode::Enter | KeyCode::Char('v') => Some(AppCommand::OpenDetail),
            KeyCode::Char('x') => Some(AppCommand::ClearSearch),
            KeyCode::Esc if !state.query.input().is_empty() => Some(AppCommand::ClearSearch),
            KeyCode::Char('c') => Some(AppCommand::OpenContact),
            _ => None,
        },
        AppMode::Search => match key.code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Down => Some(AppCommand::ExitToTable),
            KeyCode::Backspace => Some(AppCommand::SearchBackspace),
            KeyCode::Char('u') if ctrl => Some(AppCommand::ClearSearch),
            KeyCode::Char(ch) if !ctrl => Some(AppCommand::SearchInput(ch)),
            _ => None,
        },
        AppMode::Detail => match key.code {
            KeyCode::Esc | KeyCode::Char('q') => Some(AppCommand::CloseDetail),
            KeyCode::Char('j') | KeyCode::Down => scroll(1),
            KeyCode::Char('k') | KeyCode::Up => scroll(-1),
            KeyCode::PageDown => scroll(PAGE_ROWS as i32),
            KeyCode::PageUp => scroll(-(PAGE_ROWS as i32)),
            KeyCode::Char('g') | KeyCode::Home => scroll(i32::MIN),
            KeyCode::Char('G') | KeyCode::End => scroll(i32::MAX),
            _ => None,
        },
        AppMode::Contact => match key.code {
            KeyCode::Esc => Some(AppCommand::CloseContact),
            KeyCode::Char('s') if ctrl => Some(AppCommand::SubmitContact),
            KeyCode::Char('e') if ctrl => Some(AppCommand::EmailDirectly),
            KeyCode::Tab | KeyCode::BackTab => Some(AppCommand::ContactNextField),
            KeyCode::Enter => match state.contact.focus {
                ContactField::Email => Some(AppCommand::ContactNextField),
                ContactField::Message => Some(AppCommand::ContactInput('\n')),
            },
            KeyCode::Backspace => Some(AppCommand::ContactBackspace),
            KeyCode::Char(ch) if !ctrl => Some(AppCommand::ContactInput(ch)),
            _ => None,
        },
    }
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, options: &ViewOptions) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let hero = Paragraph::new(vec![
        Line::from(Span::styled(
            "Lead Management Dashboard",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from("To handle all the user calls efficiently."),
    ])
    .block(Block::default().title("saira").borders(Borders::ALL));
    frame.render_widget(hero, layout[0]);

    let search_style = if state.mode == AppMode::Search {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let search = Paragraph::new(search_line(state))
        .block(
            Block::default()
                .title("search")
                .borders(Borders::ALL)
                .border_style(search_style),
        );
    frame.render_widget(search, layout[1]);

    render_body(frame, layout[2], state);

    let footer = Paragraph::new(footer_text(state).unwrap_or_default())
        .style(Style::default().fg(Color::Gray));
    frame.render_widget(footer, layout[3]);

    let status = Paragraph::new(status_text(state))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, layout[4]);

    if state.mode == AppMode::Detail
        && let Some(record) = state.detail_record()
    {
        let area = detail_area(frame.area());
        frame.render_widget(Clear, area);
        let detail = Paragraph::new(detail_lines(record, options))
            .wrap(Wrap { trim: false })
            .scroll((state.detail_scroll, 0))
            .block(Block::default().title("Call Details").borders(Borders::ALL));
        frame.render_widget(detail, area);
    }

    if state.mode == AppMode::Contact {
        let area = centered_rect(70, 70, frame.area());
        frame.render_widget(Clear, area);
        let contact = Paragraph::new(contact_lines(state))
            .wrap(Wrap { trim: false })
            .block(Block::default().title("Contact Us").borders(Borders::ALL));
        frame.render_widget(contact, area);
    }
}

fn search_line(state: &AppState) -> Line<'static> {
    let input = state.query.input();
    let focused = state.mode == AppMode::Search;
    let mut spans = vec![Span::raw("🔍 ")];
    if input.is_empty() && !focused {
        spans.push(Span::styled(
            SEARCH_PLACEHOLDER,
            Style::default().fg(Color::DarkGray),
        ));
    } else {
        spans.push(Span::raw(input.to_owned()));
    }
    if focused {
        spans.push(Span::styled("▏", Style::default().fg(Color::Cyan)));
    }
    if !input.is_empty() {
        spans.push(Span::styled("  ✕ (x)", Style::default().fg(Color::DarkGray)));
    }
    Line::from(spans)
}

fn render_body(frame: &mut ratatui::Frame<'_>, area: Rect, state: &AppState) {
    let block = Block::default().borders(Borders::ALL).title("leads");
    if let Some(message) = body_message(state) {
        let style = if state.load.error().is_some() {
            Style::default().fg(Color::Red)
        } else {
            Style::default()
        };
        frame.render_widget(Paragraph::new(message).style(style).block(block), area);
        return;
    }

    let header = Row::new(RecordRow::HEADERS.iter().map(|label| {
        Cell::from(*label).style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
    }));
    let rows = table_rows(state).into_iter().map(|row| {
        let tag_style = Style::default().fg(tag_color(row.tag));
        let mut cells = row.cells().into_iter().map(Cell::from).collect::<Vec<_>>();
        if let Some(tag) = cells.pop() {
            cells.push(tag.style(tag_style));
        }
        Row::new(cells)
    });
    let widths = [
        Constraint::Length(7),
        Constraint::Min(14),
        Constraint::Length(16),
        Constraint::Min(12),
        Constraint::Length(16),
        Constraint::Length(14),
        Constraint::Length(9),
        Constraint::Length(11),
        Constraint::Length(12),
        Constraint::Length(10),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .row_highlight_style(Style::default().bg(Color::DarkGray))
        .block(block);
    let mut table_state = TableState::default().with_selected(Some(state.selected_row));
    frame.render_stateful_widget(table, area, &mut table_state);
}

fn tag_color(tag: LeadTag) -> Color {
    match tag {
        LeadTag::Converted => Color::Green,
        LeadTag::FollowUp => Color::Yellow,
        LeadTag::NewLead => Color::Cyan,
    }
}

/// Replaces the table while loading, after a failed fetch, or when nothing matches.
fn body_message(state: &AppState) -> Option<String> {
    match &state.load {
        LoadState::Loading => Some("Loading data...".to_owned()),
        LoadState::Failed(message) => Some(format!("Error: {message}")),
        LoadState::Ready if state.visible.is_empty() => Some(NO_MATCHES.to_owned()),
        LoadState::Ready => None,
    }
}

pub fn table_rows(state: &AppState) -> Vec<RecordRow> {
    state
        .visible_records()
        .enumerate()
        .map(|(position, record)| RecordRow::from_record(position, record))
        .collect()
}

fn footer_text(state: &AppState) -> Option<String> {
    if state.load != LoadState::Ready || state.visible.is_empty() {
        return None;
    }
    let mut text = format!(
        "Showing {} of {} records",
        state.visible.len(),
        state.records.len()
    );
    let settled = state.query.settled();
    if !settled.is_empty() {
        text.push_str(&format!(" matching \"{settled}\""));
    }
    Some(text)
}

fn status_text(state: &AppState) -> String {
    let keys = match state.mode {
        AppMode::Table => {
            "j/k move | g/G ends | enter view more | / search | x clear | c contact | q quit"
        }
        AppMode::Search => "type to filter | backspace | ctrl+u clear | enter/esc done",
        AppMode::Detail => "j/k scroll | pgup/pgdn | g top | esc close",
        AppMode::Contact => {
            "tab field | ctrl+s send | ctrl+e email us directly | esc close"
        }
    };
    let mode = state.mode.label();
    match &state.status_line {
        Some(status) => format!("{mode} | {status} | {keys}"),
        None => format!("{mode} | {keys}"),
    }
}

fn heading(text: &str) -> Line<'static> {
    Line::from(Span::styled(
        text.to_owned(),
        Style::default().add_modifier(Modifier::BOLD),
    ))
}

fn labeled(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!("{label}: "),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(value),
    ])
}

fn detail_lines(record: &CallRecord, options: &ViewOptions) -> Vec<Line<'static>> {
    let telephony = record.telephony();
    let mut lines = vec![
        Line::from(Span::styled(
            format!(
                "Customer: {}",
                text_or_na(record.customer_name.as_deref())
            ),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        labeled(
            "Phone",
            record.recipient_phone_number.clone().unwrap_or_default(),
        ),
        labeled(
            "Duration",
            duration_detail(record.conversation_duration.as_deref()),
        ),
        labeled(
            "Status",
            capitalize_words(record.status.as_deref().unwrap_or_default()),
        ),
        labeled("Date", created_datetime(record.created_at.as_deref())),
        labeled("Call ID", provider_call_id(telephony.as_ref())),
        labeled("Recording", recording_url(telephony.as_ref())),
    ];
    if let Some(cost) = record.total_cost.as_deref().filter(|cost| !cost.is_empty()) {
        lines.push(labeled("Cost", cost.to_owned()));
    }

    lines.push(Line::default());
    lines.push(heading("Summary"));
    let summary = record.summary.as_deref().unwrap_or_default();
    lines.push(Line::from(summary.to_owned()));
    if !summary.is_empty() {
        lines.push(Line::default());
        lines.extend(annotated_summary_lines(summary, &options.customer_annotation));
    }

    lines.push(Line::default());
    lines.push(heading("Transcript"));
    lines.extend(transcript_display_lines(
        record.transcript.as_deref(),
        &options.assistant_annotation,
    ));
    lines
}

fn annotated_summary_lines(summary: &str, annotation: &str) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let mut spans: Vec<Span<'static>> = Vec::new();
    for segment in annotate_summary(summary) {
        match segment {
            SummarySegment::Text(word) => spans.push(Span::raw(format!("{word} "))),
            SummarySegment::User => {
                spans.push(Span::styled(
                    "User",
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ));
                lines.push(Line::from(std::mem::take(&mut spans)));
                spans.push(Span::styled(
                    annotation.to_owned(),
                    Style::default().fg(Color::DarkGray),
                ));
                spans.push(Span::raw(" "));
            }
        }
    }
    if !spans.is_empty() {
        lines.push(Line::from(spans));
    }
    lines
}

fn transcript_display_lines(transcript: Option<&str>, annotation: &str) -> Vec<Line<'static>> {
    let transcript = transcript.unwrap_or_default();
    if transcript.is_empty() {
        return vec![Line::from(NO_TRANSCRIPT)];
    }

    let assistant = Style::default().fg(Color::Green);
    let mut lines = Vec::new();
    for line in transcript_lines(transcript) {
        match line {
            TranscriptLine::Assistant { speaker, body } => {
                lines.push(Line::from(Span::styled(
                    format!("{speaker}:"),
                    assistant.add_modifier(Modifier::BOLD),
                )));
                lines.push(Line::from(Span::styled(annotation.to_owned(), assistant)));
                lines.push(Line::from(Span::styled(body, assistant)));
            }
            TranscriptLine::Turn(text) => {
                lines.push(Line::from(Span::styled(
                    text,
                    Style::default().fg(Color::Blue),
                )));
            }
        }
    }
    lines
}

fn contact_lines(state: &AppState) -> Vec<Line<'static>> {
    let details = &state.contact_details;
    let mut lines = vec![
        heading("Get in Touch"),
        Line::from("Have questions about Saira or need help?"),
        Line::default(),
        labeled("Email", details.email.clone()),
    ];
    if !details.phone.is_empty() {
        lines.push(labeled("Phone", details.phone.clone()));
    }
    if !details.hours.is_empty() {
        lines.push(labeled("Hours", details.hours.clone()));
    }
    lines.push(Line::default());

    let form = &state.contact;
    if form.submitted {
        let success = Style::default().fg(Color::Green);
        lines.push(Line::from(Span::styled(
            "✓ Message Sent!",
            success.add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(Span::styled(
            "Thank you for contacting us. We'll get back to you shortly.",
            success,
        )));
        return lines;
    }

    lines.push(heading("Send Us a Message"));
    for field in [ContactField::Email, ContactField::Message] {
        let focused = form.focus == field;
        let marker = if focused { "▶ " } else { "  " };
        let style = if focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        };
        lines.push(Line::from(Span::styled(
            format!("{marker}{}:", field.label()),
            style.add_modifier(Modifier::BOLD),
        )));
        let value = match field {
            ContactField::Email => &form.input.email,
            ContactField::Message => &form.input.message,
        };
        for text in value.split('\n') {
            lines.push(Line::from(format!("    {text}")));
        }
    }
    lines
}

/// Fixed-width text rendering of the visible rows, for non-interactive output.
pub fn plain_table(state: &AppState) -> String {
    let rows: Vec<[String; 10]> = table_rows(state).iter().map(RecordRow::cells).collect();
    let mut widths = RecordRow::HEADERS.map(|header| header.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let format_row = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(widths.iter().copied())
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_owned()
    };

    let mut out = String::new();
    let headers = RecordRow::HEADERS.map(str::to_owned);
    out.push_str(&format_row(&headers));
    out.push('\n');
    if rows.is_empty() {
        out.push_str(NO_MATCHES);
        out.push('\n');
    }
    for row in &rows {
        out.push_str(&format_row(row));
        out.push('\n');
    }
    if let Some(footer) = footer_text(state) {
        out.push_str(&footer);
        out.push('\n');
    }
    out
}

fn detail_area(area: Rect) -> Rect {
    centered_rect(84, 84, area)
}

/// Highest scroll offset for the open record: its rendered row count minus
/// one. Rows are estimated by character wrapping at `width`; a zero width
/// counts one row per line.
fn detail_scroll_limit(state: &AppState, options: &ViewOptions, width: u16) -> u16 {
    let Some(record) = state.detail_record() else {
        return 0;
    };
    let rows: usize = detail_lines(record, options)
        .iter()
        .map(|line| match usize::from(width) {
            0 => 1,
            width => line.width().div_ceil(width).max(1),
        })
        .sum();
    u16::try_from(rows.saturating_sub(1)).unwrap_or(u16::MAX)
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::{
        AppRuntime, InternalEvent, ViewData, ViewOptions, annotated_summary_lines, body_message,
        contact_lines, detail_lines, footer_text, handle_key_event, plain_table,
        process_internal_events, render, status_text, table_rows, transcript_display_lines,
    };
    use anyhow::{Result, anyhow};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use ratatui::text::Line;
    use saira_app::{AppCommand, AppMode, AppState, CallRecord, LeadTag, LoadState};
    use saira_testkit::{CallFaker, JANE_DOE_PAYLOAD};
    use std::sync::mpsc::{self, Receiver, Sender};
    use std::time::Duration;

    #[derive(Debug, Default)]
    struct TestRuntime {
        records: Vec<CallRecord>,
        fetch_error: Option<String>,
        fetch_count: usize,
        opened_links: Vec<String>,
        fail_open: bool,
    }

    impl AppRuntime for TestRuntime {
        fn fetch_records(&mut self) -> Result<Vec<CallRecord>> {
            self.fetch_count += 1;
            match &self.fetch_error {
                Some(message) => Err(anyhow!("{message}")),
                None => Ok(self.records.clone()),
            }
        }

        fn open_mailto(&mut self, link: &str) -> Result<()> {
            if self.fail_open {
                return Err(anyhow!("no mail client"));
            }
            self.opened_links.push(link.to_owned());
            Ok(())
        }
    }

    struct Harness {
        state: AppState,
        runtime: TestRuntime,
        view_data: ViewData,
        options: ViewOptions,
        tx: Sender<InternalEvent>,
        rx: Receiver<InternalEvent>,
    }

    impl Harness {
        fn new(runtime: TestRuntime) -> Self {
            let (tx, rx) = mpsc::channel();
            Self {
                state: AppState::default(),
                runtime,
                view_data: ViewData::default(),
                options: ViewOptions {
                    search_debounce: Duration::from_millis(20),
                    contact_reset: Duration::from_millis(20),
                    ..ViewOptions::default()
                },
                tx,
                rx,
            }
        }

        fn loaded(records: Vec<CallRecord>) -> Self {
            let mut harness = Self::new(TestRuntime {
                records,
                ..TestRuntime::default()
            });
            harness
                .runtime
                .spawn_fetch(harness.tx.clone())
                .expect("spawn fetch");
            harness.pump();
            harness
        }

        fn key(&mut self, code: KeyCode) -> bool {
            self.key_with(code, KeyModifiers::NONE)
        }

        fn key_with(&mut self, code: KeyCode, modifiers: KeyModifiers) -> bool {
            handle_key_event(
                &mut self.state,
                &mut self.runtime,
                &mut self.view_data,
                &self.options,
                &self.tx,
                KeyEvent::new(code, modifiers),
            )
        }

        fn type_text(&mut self, text: &str) {
            for ch in text.chars() {
                self.key(KeyCode::Char(ch));
            }
        }

        fn pump(&mut self) {
            process_internal_events(
                &mut self.state,
                &mut self.runtime,
                &mut self.view_data,
                &self.options,
                &self.tx,
                &self.rx,
            );
        }

        /// Waits for the next timer event and applies it.
        fn wait_for(&mut self, matches: impl Fn(&InternalEvent) -> bool) {
            loop {
                let event = self
                    .rx
                    .recv_timeout(Duration::from_secs(2))
                    .expect("timer event should arrive");
                let wanted = matches(&event);
                self.tx.send(event).expect("requeue event");
                self.pump();
                if wanted {
                    return;
                }
            }
        }
    }

    fn jane_doe() -> Vec<CallRecord> {
        serde_json::from_str(JANE_DOE_PAYLOAD).expect("fixture decodes")
    }

    fn line_text(line: &Line<'_>) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    fn lines_text(lines: &[Line<'_>]) -> Vec<String> {
        lines.iter().map(line_text).collect()
    }

    #[test]
    fn fetch_result_populates_table() {
        let harness = Harness::loaded(jane_doe());
        assert_eq!(harness.runtime.fetch_count, 1);
        assert_eq!(harness.state.load, LoadState::Ready);

        let rows = table_rows(&harness.state);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].serial, 1);
        assert_eq!(rows[0].tag, LeadTag::Converted);
        assert_eq!(rows[0].call_id, "C1");
        assert_eq!(rows[0].recording_url, "http://x");
        assert_eq!(
            footer_text(&harness.state).as_deref(),
            Some("Showing 1 of 1 records")
        );
    }

    #[test]
    fn fetch_failure_renders_error_once() {
        let mut harness = Harness::new(TestRuntime {
            fetch_error: Some("API request failed with status 503".to_owned()),
            ..TestRuntime::default()
        });
        assert_eq!(
            body_message(&harness.state).as_deref(),
            Some("Loading data...")
        );
        harness
            .runtime
            .spawn_fetch(harness.tx.clone())
            .expect("spawn fetch");
        harness.pump();

        assert_eq!(harness.runtime.fetch_count, 1);
        assert_eq!(
            body_message(&harness.state).as_deref(),
            Some("Error: API request failed with status 503")
        );
        assert_eq!(footer_text(&harness.state), None);
    }

    #[test]
    fn typing_filters_after_quiet_period_with_final_value() {
        let mut harness = Harness::loaded(CallFaker::new(4).records(25));
        let target = harness.state.records[7]
            .customer_name
            .clone()
            .expect("faker names every record");

        harness.key(KeyCode::Char('/'));
        assert_eq!(harness.state.mode, AppMode::Search);
        harness.type_text(&target.to_uppercase());
        assert_eq!(harness.state.visible.len(), 25);

        harness.wait_for(|event| matches!(event, InternalEvent::SearchSettled { .. }));
        // Older timers may still be in flight; let them all land.
        std::thread::sleep(Duration::from_millis(60));
        harness.pump();

        assert_eq!(harness.state.query.settled(), target.to_uppercase());
        assert!(harness.state.visible.contains(&7));
        let needle = target.to_lowercase();
        assert!(
            harness
                .state
                .visible_records()
                .all(|record| saira_app::record_matches(record, &needle))
        );

        harness.key(KeyCode::Enter);
        assert_eq!(harness.state.mode, AppMode::Table);
        let footer = footer_text(&harness.state).expect("footer for matches");
        assert!(footer.contains(&format!("matching \"{}\"", target.to_uppercase())));
    }

    #[test]
    fn clear_key_restores_all_rows_after_debounce() {
        let mut harness = Harness::loaded(jane_doe());
        harness.key(KeyCode::Char('/'));
        harness.type_text("zzz");
        harness.key(KeyCode::Esc);
        harness.wait_for(|event| matches!(event, InternalEvent::SearchSettled { .. }));
        std::thread::sleep(Duration::from_millis(60));
        harness.pump();
        assert!(harness.state.visible.is_empty());
        assert_eq!(
            body_message(&harness.state).as_deref(),
            Some("No records found matching the search criteria")
        );

        harness.key(KeyCode::Char('x'));
        harness.wait_for(|event| matches!(event, InternalEvent::SearchSettled { .. }));
        assert_eq!(harness.state.visible, vec![0]);
    }

    #[test]
    fn q_quits_from_table_but_types_in_search() {
        let mut harness = Harness::loaded(jane_doe());
        harness.key(KeyCode::Char('/'));
        assert!(!harness.key(KeyCode::Char('q')));
        assert_eq!(harness.state.query.input(), "q");
        harness.key(KeyCode::Esc);
        assert!(harness.key(KeyCode::Char('q')));
        assert!(harness.key_with(KeyCode::Char('q'), KeyModifiers::CONTROL));
    }

    #[test]
    fn enter_opens_detail_and_escape_closes() {
        let mut harness = Harness::loaded(CallFaker::new(9).records(3));
        harness.key(KeyCode::Char('j'));
        harness.key(KeyCode::Enter);
        assert_eq!(harness.state.mode, AppMode::Detail);
        assert_eq!(harness.state.detail, Some(1));

        harness.key(KeyCode::Char('j'));
        harness.key(KeyCode::Char('j'));
        assert_eq!(harness.state.detail_scroll, 2);
        harness.key(KeyCode::Char('g'));
        assert_eq!(harness.state.detail_scroll, 0);

        harness.key(KeyCode::Esc);
        assert_eq!(harness.state.mode, AppMode::Table);
        assert_eq!(harness.state.detail, None);
    }

    #[test]
    fn contact_submit_opens_mailto_and_resets_after_delay() {
        let mut harness = Harness::loaded(jane_doe());
        harness.key(KeyCode::Char('c'));
        assert_eq!(harness.state.mode, AppMode::Contact);
        harness.type_text("ops@example.com");
        harness.key(KeyCode::Enter);
        harness.type_text("call me");
        harness.key(KeyCode::Enter);
        harness.type_text("soon");
        harness.key_with(KeyCode::Char('s'), KeyModifiers::CONTROL);

        assert_eq!(
            harness.runtime.opened_links,
            vec![
                "mailto:leads@saira.example?subject=Contact%20Form%20Submission&body=call%20me%0Asoon"
                    .to_owned()
            ]
        );
        assert!(harness.state.contact.submitted);
        let text = lines_text(&contact_lines(&harness.state));
        assert!(text.iter().any(|line| line == "✓ Message Sent!"));

        harness.wait_for(|event| matches!(event, InternalEvent::ContactReset { .. }));
        assert!(!harness.state.contact.submitted);
        assert!(harness.state.contact.input.message.is_empty());
    }

    #[test]
    fn email_directly_uses_contact_address_and_reports_failures() {
        let mut harness = Harness::loaded(jane_doe());
        harness.key(KeyCode::Char('c'));
        harness.key_with(KeyCode::Char('e'), KeyModifiers::CONTROL);
        assert_eq!(
            harness.runtime.opened_links,
            vec!["mailto:support@saira.example".to_owned()]
        );

        harness.runtime.fail_open = true;
        harness.key_with(KeyCode::Char('e'), KeyModifiers::CONTROL);
        let status = harness.state.status_line.clone().expect("failure status");
        assert!(status.contains("open mail client failed"));
        assert!(status_text(&harness.state).starts_with("CONTACT | open mail client failed"));
    }

    #[test]
    fn invalid_contact_submit_keeps_form() {
        let mut harness = Harness::loaded(jane_doe());
        harness.key(KeyCode::Char('c'));
        harness.type_text("not-an-email");
        harness.key_with(KeyCode::Char('s'), KeyModifiers::CONTROL);
        assert!(harness.runtime.opened_links.is_empty());
        assert!(!harness.state.contact.submitted);
        assert!(
            harness
                .state
                .status_line
                .as_deref()
                .is_some_and(|status| status.contains("not a valid address"))
        );
    }

    #[test]
    fn status_clears_only_for_latest_token() {
        let mut harness = Harness::loaded(Vec::new());
        harness.key(KeyCode::Enter);
        assert_eq!(
            harness.state.status_line.as_deref(),
            Some("no record selected")
        );
        let stale = harness.view_data.status_token;
        harness.key(KeyCode::Enter);
        harness
            .tx
            .send(InternalEvent::ClearStatus { token: stale })
            .expect("send");
        harness.pump();
        assert!(harness.state.status_line.is_some());

        let current = harness.view_data.status_token;
        harness
            .tx
            .send(InternalEvent::ClearStatus { token: current })
            .expect("send");
        harness.pump();
        assert_eq!(harness.state.status_line, None);
    }

    #[test]
    fn detail_lines_include_annotations_and_transcript_highlights() {
        let record = CallRecord {
            customer_name: Some("Jane Doe".to_owned()),
            recipient_phone_number: Some("+91-9000000000".to_owned()),
            conversation_duration: Some("95".to_owned()),
            status: Some("in progress".to_owned()),
            created_at: Some("2025-03-14T09:26:53Z".to_owned()),
            summary: Some("The user wants a callback".to_owned()),
            transcript: Some("assistant: Hello\\nuser: Hi".to_owned()),
            telephony_data: Some("garbage".to_owned()),
            ..CallRecord::default()
        };
        let text = lines_text(&detail_lines(&record, &ViewOptions::default()));

        assert_eq!(text[0], "Customer: Jane Doe");
        assert!(text.contains(&"Duration: 95 seconds".to_owned()));
        assert!(text.contains(&"Status: In Progress".to_owned()));
        assert!(text.contains(&"Date: 2025-03-14 09:26".to_owned()));
        assert!(text.contains(&"Call ID: N/A".to_owned()));
        assert!(text.contains(&"Recording: #".to_owned()));
        assert!(text.contains(&"The user wants a callback".to_owned()));
        assert!(text.contains(&"The User".to_owned()));
        assert!(text.contains(&"CUSTOMER FROM VOLT MONEY wants a callback ".to_owned()));
        assert!(text.contains(&"ASSISTANT:".to_owned()));
        assert!(text.contains(&"AI POWERED ASSISTANT FROM VOLT MONEY".to_owned()));
        assert!(text.contains(&" Hello".to_owned()));
        assert!(text.contains(&"user: Hi".to_owned()));
    }

    #[test]
    fn detail_scroll_is_bounded_by_rendered_lines() {
        let mut harness = Harness::loaded(CallFaker::new(9).records(1));
        harness.key(KeyCode::Enter);
        let record = harness
            .state
            .detail_record()
            .cloned()
            .expect("detail record");
        let last = detail_lines(&record, &harness.options).len() - 1;

        for _ in 0..50 {
            harness.key(KeyCode::PageDown);
        }
        assert_eq!(usize::from(harness.state.detail_scroll), last);
        harness.key(KeyCode::Char('k'));
        assert_eq!(usize::from(harness.state.detail_scroll), last - 1);
        harness.key(KeyCode::End);
        assert_eq!(usize::from(harness.state.detail_scroll), last);

        harness.view_data.detail_width = 8;
        harness.key(KeyCode::End);
        assert!(usize::from(harness.state.detail_scroll) > last);
    }

    #[test]
    fn detail_lines_show_cost_only_when_present() {
        let options = ViewOptions::default();
        let priced = CallRecord {
            customer_name: Some("Ravi".to_owned()),
            total_cost: Some("1.25".to_owned()),
            ..CallRecord::default()
        };
        let text = lines_text(&detail_lines(&priced, &options));
        assert!(text.contains(&"Cost: 1.25".to_owned()));

        for total_cost in [None, Some(String::new())] {
            let record = CallRecord {
                total_cost,
                ..CallRecord::default()
            };
            let text = lines_text(&detail_lines(&record, &options));
            assert_eq!(text[0], "Customer: N/A");
            assert!(text.iter().all(|line| !line.starts_with("Cost:")));
        }
    }

    #[test]
    fn summary_annotation_breaks_after_each_user_token() {
        let lines = lines_text(&annotated_summary_lines("user called user", "NOTE"));
        assert_eq!(
            lines,
            vec!["User".to_owned(), "NOTE called User".to_owned(), "NOTE ".to_owned()]
        );
    }

    #[test]
    fn missing_transcript_shows_placeholder() {
        assert_eq!(
            lines_text(&transcript_display_lines(None, "A")),
            vec!["No transcript available".to_owned()]
        );
        assert_eq!(
            lines_text(&transcript_display_lines(Some(""), "A")),
            vec!["No transcript available".to_owned()]
        );
    }

    #[test]
    fn plain_table_lists_rows_and_footer() {
        let harness = Harness::loaded(jane_doe());
        let rendered = plain_table(&harness.state);
        let lines: Vec<&str> = rendered.lines().collect();
        assert!(lines[0].starts_with("Sr. No."));
        assert!(lines[1].starts_with("1 "));
        assert!(lines[1].contains("Jane Doe"));
        assert!(lines[1].ends_with("Converted"));
        assert_eq!(lines[2], "Showing 1 of 1 records");
    }

    #[test]
    fn plain_table_reports_no_matches() {
        let mut state = AppState::default();
        state.dispatch(AppCommand::RecordsLoaded(Vec::new()));
        let rendered = plain_table(&state);
        assert!(rendered.contains("No records found matching the search criteria"));
    }

    #[test]
    fn render_draws_table_row_for_fetched_record() -> Result<()> {
        let harness = Harness::loaded(jane_doe());
        let mut terminal = Terminal::new(TestBackend::new(180, 24))?;
        terminal.draw(|frame| render(frame, &harness.state, &harness.options))?;

        let screen: String = terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect();
        assert!(screen.contains("Lead Management Dashboard"));
        assert!(screen.contains("Jane Doe"));
        assert!(screen.contains("Converted"));
        assert!(screen.contains("C1"));
        assert!(screen.contains("Showing 1 of 1 records"));
        Ok(())
    }
}
