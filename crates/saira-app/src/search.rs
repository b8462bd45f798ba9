// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::time::Duration;

use crate::CallRecord;

pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    CustomerName,
    PhoneNumber,
    Status,
    StepId,
    Summary,
}

impl SearchField {
    pub const ALL: [Self; 5] = [
        Self::CustomerName,
        Self::PhoneNumber,
        Self::Status,
        Self::StepId,
        Self::Summary,
    ];

    pub fn value(self, record: &CallRecord) -> Option<&str> {
        match self {
            Self::CustomerName => record.customer_name.as_deref(),
            Self::PhoneNumber => record.recipient_phone_number.as_deref(),
            Self::Status => record.status.as_deref(),
            Self::StepId => record.step_id.as_deref(),
            Self::Summary => record.summary.as_deref(),
        }
    }
}

/// `needle` must already be lowercased.
pub fn record_matches(record: &CallRecord, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    SearchField::ALL.iter().any(|field| {
        field
            .value(record)
            .is_some_and(|value| value.to_lowercase().contains(needle))
    })
}

/// Positions of matching records, in fetch order.
pub fn filter_indices(records: &[CallRecord], query: &str) -> Vec<usize> {
    let needle = query.to_lowercase();
    records
        .iter()
        .enumerate()
        .filter(|(_, record)| record_matches(record, &needle))
        .map(|(index, _)| index)
        .collect()
}

/// Live input plus the value that survived the quiet period.
///
/// Every change bumps a generation token; the caller schedules a one-shot
/// timer carrying that token. Only the newest token may settle, so older
/// timers are cancelled simply by being outrun.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DebouncedQuery {
    input: String,
    settled: String,
    token: u64,
}

impl DebouncedQuery {
    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn settled(&self) -> &str {
        &self.settled
    }

    #[cfg(test)]
    fn pending_token(&self) -> Option<u64> {
        (self.input != self.settled).then_some(self.token)
    }

    /// Returns the token to schedule, or `None` when the input did not change.
    pub fn set_input(&mut self, value: impl Into<String>) -> Option<u64> {
        let value = value.into();
        if value == self.input {
            return None;
        }
        self.input = value;
        Some(self.bump())
    }

    pub fn push(&mut self, ch: char) -> u64 {
        self.input.push(ch);
        self.bump()
    }

    pub fn pop(&mut self) -> Option<u64> {
        self.input.pop()?;
        Some(self.bump())
    }

    /// Applies the live input if `token` is current and the settled value
    /// actually changes. Returns the newly settled query.
    pub fn settle(&mut self, token: u64) -> Option<&str> {
        if token != self.token || self.input == self.settled {
            return None;
        }
        self.settled.clone_from(&self.input);
        Some(&self.settled)
    }

    fn bump(&mut self) -> u64 {
        self.token = self.token.wrapping_add(1);
        self.token
    }
}
