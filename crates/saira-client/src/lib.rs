// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use reqwest::blocking::Client as HttpClient;
use reqwest::header::{ACCEPT, HeaderValue};
use saira_app::CallRecord;
use serde_json::Value;
use std::time::Duration;
use url::Url;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Reads the lead sheet. One GET per call; no retries, no paging.
#[derive(Debug, Clone)]
pub struct Client {
    url: Url,
    http: HttpClient,
}

impl Client {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let url = parse_endpoint(url)?;
        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self { url, http })
    }

    pub fn fetch_records(&self) -> Result<Vec<CallRecord>> {
        tracing::info!(url = %self.url, "fetching records");
        let response = self
            .http
            .get(self.url.clone())
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .send()
            .map_err(|error| connection_error(&self.url, error))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "record fetch rejected");
            bail!("API request failed with status {}", status.as_u16());
        }

        let body = response.text().context("read response body")?;
        let records = decode_records(&body)?;
        tracing::info!(count = records.len(), "records fetched");
        Ok(records)
    }
}

pub fn parse_endpoint(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        bail!("source.url must not be empty; set [source].url or SAIRA_SOURCE_URL");
    }
    let url = Url::parse(trimmed).with_context(|| format!("invalid source URL {trimmed:?}"))?;
    match url.scheme() {
        "http" | "https" => {}
        other => bail!("source URL {trimmed:?} uses unsupported scheme {other:?}; use http or https"),
    }
    if url.host_str().is_none() {
        bail!("source URL {trimmed:?} has no host");
    }
    Ok(url)
}

/// Decodes a sheet payload. Anything other than an array of objects is an error.
pub fn decode_records(body: &str) -> Result<Vec<CallRecord>> {
    let value: Value = serde_json::from_str(body).context("decode records: body is not JSON")?;
    let Value::Array(items) = value else {
        bail!("decode records: expected a JSON array of records");
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            if !item.is_object() {
                return Err(anyhow!("decode records: entry {index} is not an object"));
            }
            serde_json::from_value(item).with_context(|| format!("decode records: entry {index}"))
        })
        .collect()
}

fn connection_error(url: &Url, error: reqwest::Error) -> anyhow::Error {
    let host = url.host_str().unwrap_or("source");
    if error.is_timeout() {
        return anyhow!("request to {host} timed out ({error})");
    }
    anyhow!("cannot reach {host} -- check the network or [source].url ({error})")
}
