// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{
    AppMode, CallRecord, ContactDetails, ContactForm, DebouncedQuery, LoadState, filter_indices,
    mailto_link,
};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    pub mode: AppMode,
    pub load: LoadState,
    pub records: Vec<CallRecord>,
    pub query: DebouncedQuery,
    /// Positions into `records` that match the settled query.
    pub visible: Vec<usize>,
    pub selected_row: usize,
    /// Position into `records` of the record shown in the detail modal.
    pub detail: Option<usize>,
    pub detail_scroll: u16,
    pub contact: ContactForm,
    pub contact_details: ContactDetails,
    pub status_line: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    RecordsLoaded(Vec<CallRecord>),
    LoadFailed(String),
    FocusSearch,
    ExitToTable,
    SearchInput(char),
    SearchBackspace,
    SetSearch(String),
    ClearSearch,
    SearchSettled { token: u64 },
    MoveSelection(isize),
    SelectFirst,
    SelectLast,
    OpenDetail,
    CloseDetail,
    /// `max` is the last offset that still shows modal content.
    ScrollDetail { delta: i32, max: u16 },
    OpenContact,
    CloseContact,
    ContactNextField,
    ContactInput(char),
    ContactBackspace,
    SubmitContact,
    EmailDirectly,
    ContactResetElapsed { token: u64 },
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    LoadFinished { count: usize },
    LoadFailed(String),
    ModeChanged(AppMode),
    SearchScheduled { token: u64 },
    FilterApplied { query: String, matches: usize },
    SelectionChanged(usize),
    DetailOpened(usize),
    DetailClosed,
    MailtoRequested(String),
    ContactSubmitted { reset_token: u64 },
    ContactReset,
    StatusUpdated(String),
    StatusCleared,
}

impl AppState {
    pub fn with_contact_details(contact_details: ContactDetails) -> Self {
        Self {
            contact_details,
            ..Self::default()
        }
    }

    pub fn visible_records(&self) -> impl Iterator<Item = &CallRecord> {
        self.visible.iter().filter_map(|index| self.records.get(*index))
    }

    pub fn selected_record(&self) -> Option<&CallRecord> {
        self.visible
            .get(self.selected_row)
            .and_then(|index| self.records.get(*index))
    }

    pub fn detail_record(&self) -> Option<&CallRecord> {
        self.detail.and_then(|index| self.records.get(index))
    }

    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::RecordsLoaded(records) => {
                if !self.load.is_loading() {
                    return Vec::new();
                }
                self.records = records;
                self.load = LoadState::Ready;
                let count = self.records.len();
                let mut events = vec![AppEvent::LoadFinished { count }];
                events.push(self.apply_filter());
                events
            }
            AppCommand::LoadFailed(message) => {
                if !self.load.is_loading() {
                    return Vec::new();
                }
                self.load = LoadState::Failed(message.clone());
                vec![AppEvent::LoadFailed(message)]
            }
            AppCommand::FocusSearch => self.set_mode(AppMode::Search),
            AppCommand::ExitToTable => self.set_mode(AppMode::Table),
            AppCommand::SearchInput(ch) => {
                let token = self.query.push(ch);
                vec![AppEvent::SearchScheduled { token }]
            }
            AppCommand::SearchBackspace => self
                .query
                .pop()
                .map(|token| vec![AppEvent::SearchScheduled { token }])
                .unwrap_or_default(),
            AppCommand::SetSearch(value) => self
                .query
                .set_input(value)
                .map(|token| vec![AppEvent::SearchScheduled { token }])
                .unwrap_or_default(),
            AppCommand::ClearSearch => self.dispatch(AppCommand::SetSearch(String::new())),
            AppCommand::SearchSettled { token } => {
                if self.query.settle(token).is_none() {
                    return Vec::new();
                }
                vec![self.apply_filter()]
            }
            AppCommand::MoveSelection(delta) => self.move_selection(delta),
            AppCommand::SelectFirst => self.select_row(0),
            AppCommand::SelectLast => self.select_row(self.visible.len().saturating_sub(1)),
            AppCommand::OpenDetail => {
                let Some(index) = self.visible.get(self.selected_row).copied() else {
                    return vec![self.set_status("no record selected")];
                };
                self.detail = Some(index);
                self.detail_scroll = 0;
                let mut events = vec![AppEvent::DetailOpened(index)];
                events.extend(self.set_mode(AppMode::Detail));
                events
            }
            AppCommand::CloseDetail => {
                if self.detail.take().is_none() {
                    return Vec::new();
                }
                self.detail_scroll = 0;
                let mut events = vec![AppEvent::DetailClosed];
                events.extend(self.set_mode(AppMode::Table));
                events
            }
            AppCommand::ScrollDetail { delta, max } => {
                let next = i32::from(self.detail_scroll)
                    .saturating_add(delta)
                    .clamp(0, i32::from(max));
                self.detail_scroll = u16::try_from(next).unwrap_or(max);
                Vec::new()
            }
            AppCommand::OpenContact => self.set_mode(AppMode::Contact),
            AppCommand::CloseContact => self.set_mode(AppMode::Table),
            AppCommand::ContactNextField => {
                self.contact.focus = self.contact.focus.next();
                Vec::new()
            }
            AppCommand::ContactInput(ch) => {
                if let Some(text) = self.contact.focused_text_mut() {
                    text.push(ch);
                }
                Vec::new()
            }
            AppCommand::ContactBackspace => {
                if let Some(text) = self.contact.focused_text_mut() {
                    text.pop();
                }
                Vec::new()
            }
            AppCommand::SubmitContact => {
                match self.contact.submit(&self.contact_details.recipient) {
                    Ok((link, reset_token)) => vec![
                        AppEvent::MailtoRequested(link),
                        AppEvent::ContactSubmitted { reset_token },
                        self.set_status("message sent"),
                    ],
                    Err(error) => vec![self.set_status(&format!("contact form: {error}"))],
                }
            }
            AppCommand::EmailDirectly => vec![AppEvent::MailtoRequested(mailto_link(
                &self.contact_details.email,
                None,
                None,
            ))],
            AppCommand::ContactResetElapsed { token } => {
                if self.contact.reset(token) {
                    vec![AppEvent::ContactReset]
                } else {
                    Vec::new()
                }
            }
            AppCommand::SetStatus(message) => vec![self.set_status(&message)],
            AppCommand::ClearStatus => {
                self.status_line = None;
                vec![AppEvent::StatusCleared]
            }
        }
    }

    fn apply_filter(&mut self) -> AppEvent {
        self.visible = filter_indices(&self.records, self.query.settled());
        self.selected_row = self
            .selected_row
            .min(self.visible.len().saturating_sub(1));
        AppEvent::FilterApplied {
            query: self.query.settled().to_owned(),
            matches: self.visible.len(),
        }
    }

    fn move_selection(&mut self, delta: isize) -> Vec<AppEvent> {
        if self.visible.is_empty() {
            return Vec::new();
        }
        let last = self.visible.len() as isize - 1;
        let next = (self.selected_row as isize + delta).clamp(0, last) as usize;
        self.select_row(next)
    }

    fn select_row(&mut self, row: usize) -> Vec<AppEvent> {
        if self.visible.is_empty() || row == self.selected_row {
            return Vec::new();
        }
        self.selected_row = row.min(self.visible.len() - 1);
        vec![AppEvent::SelectionChanged(self.selected_row)]
    }

    fn set_mode(&mut self, mode: AppMode) -> Vec<AppEvent> {
        if self.mode == mode {
            return Vec::new();
        }
        self.mode = mode;
        vec![AppEvent::ModeChanged(mode)]
    }

    fn set_status(&mut self, message: &str) -> AppEvent {
        self.status_line = Some(message.to_owned());
        AppEvent::StatusUpdated(message.to_owned())
    }
}
