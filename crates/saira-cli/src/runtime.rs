// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use saira_app::CallRecord;
use saira_client::Client;
use saira_testkit::CallFaker;
use saira_tui::InternalEvent;
use std::process::{Command, Stdio};
use std::sync::mpsc::Sender;
use std::thread;

pub const DEMO_SEED: u64 = 42;
pub const DEMO_RECORDS: usize = 40;

#[derive(Debug, Clone)]
pub enum RecordSource {
    Remote(Client),
    Demo { seed: u64, count: usize },
}

impl RecordSource {
    pub fn demo() -> Self {
        Self::Demo {
            seed: DEMO_SEED,
            count: DEMO_RECORDS,
        }
    }

    pub fn fetch(&self) -> Result<Vec<CallRecord>> {
        match self {
            Self::Remote(client) => client.fetch_records(),
            Self::Demo { seed, count } => {
                tracing::info!(count, "generating demo records");
                Ok(CallFaker::new(*seed).records(*count))
            }
        }
    }
}

pub struct SheetRuntime {
    source: RecordSource,
}

impl SheetRuntime {
    pub fn new(source: RecordSource) -> Self {
        Self { source }
    }
}

impl saira_tui::AppRuntime for SheetRuntime {
    fn fetch_records(&mut self) -> Result<Vec<CallRecord>> {
        self.source.fetch()
    }

    /// Fetches on a worker thread so the first frame shows the loading state.
    fn spawn_fetch(&mut self, tx: Sender<InternalEvent>) -> Result<()> {
        let source = self.source.clone();
        thread::Builder::new()
            .name("saira-fetch".to_owned())
            .spawn(move || {
                let result = source.fetch().map_err(|error| {
                    tracing::error!(error = %format!("{error:#}"), "record fetch failed");
                    format!("{error:#}")
                });
                // The UI may already be gone.
                let _ = tx.send(InternalEvent::RecordsLoaded(result));
            })
            .context("spawn fetch thread")?;
        Ok(())
    }

    /// Launches the platform opener without waiting on it; a reaper thread
    /// collects the exit status.
    fn open_mailto(&mut self, link: &str) -> Result<()> {
        tracing::info!(link, "handing mailto link to the system mail client");
        let (program, args) = opener_argv(link);
        let mut child = Command::new(program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("launch system opener {program}"))?;
        thread::Builder::new()
            .name("saira-opener".to_owned())
            .spawn(move || match child.wait() {
                Ok(status) if status.success() => {}
                Ok(status) => tracing::warn!(%status, program, "system opener failed"),
                Err(error) => tracing::warn!(%error, program, "wait for system opener"),
            })
            .context("spawn opener reaper thread")?;
        Ok(())
    }
}

/// Program and arguments that open `link` with the desktop's handler. The link
/// is always passed as one argument and never through a shell.
#[cfg(target_os = "macos")]
fn opener_argv(link: &str) -> (&'static str, Vec<String>) {
    ("open", vec![link.to_owned()])
}

// `cmd /C start` would split the link at `&`.
#[cfg(target_os = "windows")]
fn opener_argv(link: &str) -> (&'static str, Vec<String>) {
    (
        "rundll32",
        vec!["url.dll,FileProtocolHandler".to_owned(), link.to_owned()],
    )
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn opener_argv(link: &str) -> (&'static str, Vec<String>) {
    ("xdg-open", vec![link.to_owned()])
}
