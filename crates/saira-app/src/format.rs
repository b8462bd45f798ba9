// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};

use crate::{CallRecord, TelephonyData};

pub const NOT_AVAILABLE: &str = "N/A";
pub const NO_RECORDING: &str = "#";
pub const NO_TRANSCRIPT: &str = "No transcript available";
pub const DEFAULT_CUSTOMER_ANNOTATION: &str = "CUSTOMER FROM VOLT MONEY";
pub const DEFAULT_ASSISTANT_ANNOTATION: &str = "AI POWERED ASSISTANT FROM VOLT MONEY";

/// Escaped line break as stored in the sheet's transcript column.
const TRANSCRIPT_LINE_MARKER: &str = "\\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadTag {
    Converted,
    FollowUp,
    NewLead,
}

impl LeadTag {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Converted => "Converted",
            Self::FollowUp => "Follow Up",
            Self::NewLead => "New Lead",
        }
    }

    pub fn for_status(status: Option<&str>) -> Self {
        match status.map(str::to_lowercase).as_deref() {
            Some("completed") => Self::Converted,
            Some("pending") => Self::FollowUp,
            // "active" and anything unrecognized.
            _ => Self::NewLead,
        }
    }
}

/// Uppercases the first character of each space-separated word and lowercases
/// the rest. Runs of spaces are preserved.
pub fn capitalize_words(raw: &str) -> String {
    raw.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn status_label(status: Option<&str>) -> String {
    let label = capitalize_words(status.unwrap_or_default());
    if label.is_empty() {
        NOT_AVAILABLE.to_owned()
    } else {
        label
    }
}

pub fn text_or_na(value: Option<&str>) -> &str {
    match value {
        Some(text) if !text.is_empty() => text,
        _ => NOT_AVAILABLE,
    }
}

pub fn provider_call_id(telephony: Option<&TelephonyData>) -> String {
    telephony
        .and_then(|data| data.provider_call_id.clone())
        .unwrap_or_else(|| NOT_AVAILABLE.to_owned())
}

pub fn recording_url(telephony: Option<&TelephonyData>) -> String {
    telephony
        .and_then(|data| data.recording_url.clone())
        .unwrap_or_else(|| NO_RECORDING.to_owned())
}

pub fn duration_cell(duration: Option<&str>) -> String {
    match duration {
        Some(value) if !value.is_empty() => format!("{value}s"),
        _ => "0s".to_owned(),
    }
}

pub fn duration_detail(duration: Option<&str>) -> String {
    format!("{} seconds", duration.unwrap_or_default())
}

pub fn created_date(created_at: Option<&str>) -> String {
    format_created_at(created_at, false)
}

pub fn created_datetime(created_at: Option<&str>) -> String {
    format_created_at(created_at, true)
}

fn format_created_at(created_at: Option<&str>, with_time: bool) -> String {
    let raw = match created_at {
        Some(value) if !value.trim().is_empty() => value.trim(),
        _ => return NOT_AVAILABLE.to_owned(),
    };
    let Some(parsed) = parse_created_at(raw) else {
        return raw.to_owned();
    };

    let formatted = if with_time {
        parsed.format(format_description!("[year]-[month]-[day] [hour]:[minute]"))
    } else {
        parsed.format(format_description!("[year]-[month]-[day]"))
    };
    formatted.unwrap_or_else(|_| raw.to_owned())
}

/// Timestamps are shown in the offset they were recorded with.
pub fn parse_created_at(raw: &str) -> Option<PrimitiveDateTime> {
    if let Ok(value) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(PrimitiveDateTime::new(value.date(), value.time()));
    }
    if let Ok(value) = PrimitiveDateTime::parse(
        raw,
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    ) {
        return Some(value);
    }
    if let Ok(value) = PrimitiveDateTime::parse(
        raw,
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    ) {
        return Some(value);
    }
    Date::parse(raw, format_description!("[year]-[month]-[day]"))
        .ok()
        .map(|date| PrimitiveDateTime::new(date, Time::MIDNIGHT))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummarySegment {
    Text(String),
    /// A standalone "user" token, rendered as a label plus the customer annotation.
    User,
}

pub fn annotate_summary(summary: &str) -> Vec<SummarySegment> {
    summary
        .split(' ')
        .map(|word| {
            if word.to_lowercase() == "user" {
                SummarySegment::User
            } else {
                SummarySegment::Text(word.to_owned())
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptLine {
    Assistant { speaker: String, body: String },
    Turn(String),
}

pub fn transcript_lines(transcript: &str) -> Vec<TranscriptLine> {
    transcript
        .split(TRANSCRIPT_LINE_MARKER)
        .flat_map(|chunk| chunk.split('\n'))
        .map(|line| line.trim_end_matches('\r'))
        .map(classify_transcript_line)
        .collect()
}

fn classify_transcript_line(line: &str) -> TranscriptLine {
    if !line.to_lowercase().contains("assistant") {
        return TranscriptLine::Turn(line.to_owned());
    }

    match line.split_once(':') {
        Some((speaker, body)) => TranscriptLine::Assistant {
            speaker: speaker.to_uppercase(),
            body: body.to_owned(),
        },
        None => TranscriptLine::Assistant {
            speaker: line.to_uppercase(),
            body: line.to_owned(),
        },
    }
}

/// Display-ready cells for one table row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordRow {
    pub serial: usize,
    pub customer_name: String,
    pub phone_number: String,
    pub recording_url: String,
    pub step_id: String,
    pub call_id: String,
    pub duration: String,
    pub created_at: String,
    pub status: String,
    pub tag: LeadTag,
}

impl RecordRow {
    pub const HEADERS: [&'static str; 10] = [
        "Sr. No.",
        "Customer Name",
        "Phone Number",
        "Recording",
        "Current Step ID",
        "Call ID",
        "Duration",
        "Created At",
        "Status",
        "Tag",
    ];

    /// `position` is the zero-based position in the filtered list.
    pub fn from_record(position: usize, record: &CallRecord) -> Self {
        let telephony = record.telephony();
        Self {
            serial: position + 1,
            customer_name: text_or_na(record.customer_name.as_deref()).to_owned(),
            phone_number: text_or_na(record.recipient_phone_number.as_deref()).to_owned(),
            recording_url: recording_url(telephony.as_ref()),
            step_id: text_or_na(record.step_id.as_deref()).to_owned(),
            call_id: provider_call_id(telephony.as_ref()),
            duration: duration_cell(record.conversation_duration.as_deref()),
            created_at: created_date(record.created_at.as_deref()),
            status: status_label(record.status.as_deref()),
            tag: LeadTag::for_status(record.status.as_deref()),
        }
    }

    pub fn cells(&self) -> [String; 10] {
        [
            self.serial.to_string(),
            self.customer_name.clone(),
            self.phone_number.clone(),
            self.recording_url.clone(),
            self.step_id.clone(),
            self.call_id.clone(),
            self.duration.clone(),
            self.created_at.clone(),
            self.status.clone(),
            self.tag.label().to_owned(),
        ]
    }
}
