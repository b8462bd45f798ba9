// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use std::env;
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Routes `tracing` output to `file`. The terminal belongs to the dashboard,
/// so nothing is written to stdout or stderr.
pub fn init(level: &str, file: &Path) -> Result<()> {
    if let Some(parent) = file.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create log directory {}", parent.display()))?;
    }
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(file)
        .with_context(|| {
            format!(
                "open log file {} -- set [log].file to a writable path",
                file.display()
            )
        })?;

    let directive = filter_directive(env::var("SAIRA_LOG").ok(), level);
    let filter = EnvFilter::try_new(&directive).with_context(|| {
        format!("invalid log filter {directive:?}; check SAIRA_LOG or [log].level")
    })?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(Mutex::new(log_file)),
        )
        .try_init()
        .context("install log subscriber")?;
    Ok(())
}

fn filter_directive(from_env: Option<String>, configured: &str) -> String {
    match from_env {
        Some(directive) if !directive.trim().is_empty() => directive,
        _ => configured.to_owned(),
    }
}
