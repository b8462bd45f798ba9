// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use saira_app::CallRecord;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use time::format_description::well_known::Rfc3339;
use time::{Date, Month, OffsetDateTime, Time};
use tiny_http::{Header, Response, Server};

const REFERENCE_YEAR: i32 = 2025;

const FIRST_NAMES: [&str; 16] = [
    "Aarav", "Diya", "Kabir", "Ananya", "Rohan", "Isha", "Vikram", "Meera", "Arjun", "Priya",
    "Nikhil", "Sana", "Kunal", "Tara", "Dev", "Nisha",
];
const LAST_NAMES: [&str; 14] = [
    "Sharma", "Iyer", "Patel", "Reddy", "Khan", "Gupta", "Nair", "Mehta", "Das", "Joshi",
    "Kapoor", "Rao", "Bose", "Singh",
];
const STATUSES: [&str; 6] = [
    "completed",
    "pending",
    "active",
    "no answer",
    "in progress",
    "FAILED",
];
const STEP_IDS: [&str; 6] = [
    "intro",
    "kyc_pending",
    "otp_sent",
    "pledge_started",
    "mandate_setup",
    "loan_disbursed",
];
const TOPICS: [&str; 6] = [
    "interest rates on a loan against mutual funds",
    "why the OTP never arrived",
    "how long disbursal takes",
    "the pledge limit on their portfolio",
    "closing an existing credit line",
    "whether a callback could be scheduled",
];
const OUTCOMES: [&str; 5] = [
    "Agreed to finish KYC today.",
    "Asked for a follow-up call next week.",
    "Was not interested at this time.",
    "Completed the mandate setup on the call.",
    "Needs the terms over email.",
];

/// The single-row payload used throughout the dashboard tests.
pub const JANE_DOE_PAYLOAD: &str = r#"[{"id":"1","customer_name":"Jane Doe","status":"completed","telephony_data":"{\"provider_call_id\":\"C1\",\"recording_url\":\"http://x\"}"}]"#;

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

/// Generates plausible lead records with a fixed seed, so demo mode and tests
/// see the same rows every run.
#[derive(Debug, Clone)]
pub struct CallFaker {
    rng: DeterministicRng,
}

impl CallFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
        }
    }

    pub fn records(&mut self, count: usize) -> Vec<CallRecord> {
        (1..=count).map(|id| self.record(id)).collect()
    }

    pub fn record(&mut self, id: usize) -> CallRecord {
        let first = self.pick(&FIRST_NAMES);
        let last = self.pick(&LAST_NAMES);
        let status = self.pick(&STATUSES);
        let duration = self.int_range(15, 600);
        let call_id = format!("CA{:010x}", self.rng.next_u64() & 0xFF_FFFF_FFFF);

        CallRecord {
            id: Some(id.to_string()),
            agent_id: Some(format!("agent-{}", self.int_range(1, 6))),
            customer_name: Some(format!("{first} {last}")),
            recipient_phone_number: Some(format!("+91-9{:09}", self.int_range(0, 999_999_999))),
            conversation_duration: Some(duration.to_string()),
            total_cost: (self.rng.int_n(3) != 0)
                .then(|| format!("{:.2}", duration as f64 * 0.0125)),
            status: Some(status.to_owned()),
            created_at: Some(self.created_at()),
            step_id: Some(self.pick(&STEP_IDS).to_owned()),
            summary: Some(self.summary()),
            transcript: Some(self.transcript(first)),
            telephony_data: self.telephony(&call_id),
            ..CallRecord::default()
        }
    }

    fn summary(&mut self) -> String {
        format!(
            "The user asked about {}. {}",
            self.pick(&TOPICS),
            self.pick(&OUTCOMES)
        )
    }

    fn transcript(&mut self, first_name: &str) -> String {
        let topic = self.pick(&TOPICS);
        [
            format!("assistant: Hi {first_name}, this is Saira calling about your application."),
            format!("user: Hi. I had a question about {topic}."),
            "assistant: Sure, I can help with that.".to_owned(),
            "user: Thanks.".to_owned(),
        ]
        .join("\\n")
    }

    fn telephony(&mut self, call_id: &str) -> Option<String> {
        match self.rng.int_n(10) {
            0 => None,
            1 => Some("{not-json".to_owned()),
            2 => Some(format!(r#"{{"provider_call_id":"{call_id}"}}"#)),
            _ => Some(
                serde_json::json!({
                    "provider_call_id": call_id,
                    "recording_url": format!("https://recordings.example.com/{call_id}.mp3"),
                })
                .to_string(),
            ),
        }
    }

    fn created_at(&mut self) -> String {
        let minutes = self.int_range(0, 60 * 24 * 90);
        let when = reference_now() + time::Duration::minutes(minutes as i64);
        when.format(&Rfc3339).unwrap_or_default()
    }

    fn pick<'a>(&mut self, values: &'a [&'a str]) -> &'a str {
        values[self.rng.int_n(values.len())]
    }

    fn int_range(&mut self, min: usize, max: usize) -> usize {
        min + self.rng.int_n(max - min + 1)
    }
}

pub fn records_json(records: &[CallRecord]) -> Result<String> {
    serde_json::to_string(records).context("encode records")
}

fn reference_now() -> OffsetDateTime {
    Date::from_calendar_date(REFERENCE_YEAR, Month::January, 1)
        .map(|date| date.with_time(Time::MIDNIGHT).assume_utc())
        .unwrap_or(OffsetDateTime::UNIX_EPOCH)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub url: String,
    pub accept: Option<String>,
}

/// A one-request HTTP server standing in for the spreadsheet API.
pub struct MockSheetServer {
    url: String,
    handle: JoinHandle<Result<RecordedRequest>>,
}

impl MockSheetServer {
    pub const PATH: &'static str = "/sheets/test-sheet";

    pub fn respond_once(status: u16, body: impl Into<String>) -> Result<Self> {
        let server =
            Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
        let url = format!("http://{}{}", server.server_addr(), Self::PATH);
        let body = body.into();

        let handle = thread::spawn(move || {
            let request = server
                .recv_timeout(Duration::from_secs(5))
                .context("receive request")?
                .ok_or_else(|| anyhow!("no request within 5s"))?;
            let recorded = RecordedRequest {
                method: request.method().to_string(),
                url: request.url().to_owned(),
                accept: request
                    .headers()
                    .iter()
                    .find(|header| header.field.equiv("Accept"))
                    .map(|header| header.value.to_string()),
            };
            let content_type = Header::from_bytes("Content-Type", "application/json")
                .map_err(|()| anyhow!("invalid content type header"))?;
            let response = Response::from_string(body)
                .with_status_code(status)
                .with_header(content_type);
            request.respond(response).context("send response")?;
            Ok(recorded)
        });

        Ok(Self { url, handle })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Waits for the served request and returns what the client sent.
    pub fn finish(self) -> Result<RecordedRequest> {
        self.handle
            .join()
            .map_err(|_| anyhow!("mock server thread panicked"))?
    }
}
