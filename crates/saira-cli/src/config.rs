// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use saira_app::{
    ContactDetails, DEFAULT_ASSISTANT_ANNOTATION, DEFAULT_CONTACT_RESET,
    DEFAULT_CUSTOMER_ANNOTATION, DEFAULT_SEARCH_DEBOUNCE,
};
use saira_tui::ViewOptions;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const APP_NAME: &str = "saira";
const CONFIG_VERSION: i64 = 1;
const DEFAULT_TIMEOUT: &str = "10s";
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub source: Source,
    #[serde(default)]
    pub ui: Ui,
    #[serde(default)]
    pub contact: Contact,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            source: Source::default(),
            ui: Ui::default(),
            contact: Contact::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Source {
    pub url: Option<String>,
    pub timeout: Option<String>,
}

impl Default for Source {
    fn default() -> Self {
        Self {
            url: None,
            timeout: Some(DEFAULT_TIMEOUT.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Ui {
    pub search_debounce: Option<String>,
    pub contact_reset: Option<String>,
    pub customer_annotation: Option<String>,
    pub assistant_annotation: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Contact {
    pub email: Option<String>,
    pub recipient: Option<String>,
    pub phone: Option<String>,
    pub hours: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Log {
    pub level: Option<String>,
    pub file: Option<String>,
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("SAIRA_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set SAIRA_CONFIG_PATH to the config file")
        })?;

        let app_dir = config_root.join(APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} is not versioned. Add `version = 1` and put values under [source], [ui], [contact], and [log]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(url) = &self.source.url {
            saira_client::parse_endpoint(url)
                .with_context(|| format!("source.url in {}", path.display()))?;
        }

        if let Some(timeout) = &self.source.timeout {
            let parsed = parse_duration(timeout)?;
            if parsed <= Duration::ZERO {
                bail!(
                    "source.timeout in {} must be positive, got {}",
                    path.display(),
                    timeout
                );
            }
        }

        for (key, value) in [
            ("ui.search_debounce", &self.ui.search_debounce),
            ("ui.contact_reset", &self.ui.contact_reset),
        ] {
            if let Some(raw) = value {
                parse_duration(raw)
                    .with_context(|| format!("{key} in {}", path.display()))?;
            }
        }

        for (key, value) in [
            ("contact.email", &self.contact.email),
            ("contact.recipient", &self.contact.recipient),
        ] {
            if let Some(address) = value
                && !address.contains('@')
            {
                bail!(
                    "{key} in {} must be an email address, got {address:?}",
                    path.display()
                );
            }
        }

        Ok(())
    }

    /// `[source].url` wins; `SAIRA_SOURCE_URL` fills in when it is unset.
    pub fn source_url(&self) -> Result<String> {
        if let Some(url) = &self.source.url {
            return Ok(url.clone());
        }
        match env::var("SAIRA_SOURCE_URL") {
            Ok(url) if !url.trim().is_empty() => Ok(url),
            _ => bail!(
                "no record source configured; set [source].url, SAIRA_SOURCE_URL, or pass --url (or try --demo)"
            ),
        }
    }

    pub fn source_timeout(&self) -> Result<Duration> {
        parse_duration(self.source.timeout.as_deref().unwrap_or(DEFAULT_TIMEOUT))
    }

    pub fn search_debounce(&self) -> Result<Duration> {
        self.ui
            .search_debounce
            .as_deref()
            .map_or(Ok(DEFAULT_SEARCH_DEBOUNCE), parse_duration)
    }

    pub fn contact_reset(&self) -> Result<Duration> {
        self.ui
            .contact_reset
            .as_deref()
            .map_or(Ok(DEFAULT_CONTACT_RESET), parse_duration)
    }

    pub fn view_options(&self) -> Result<ViewOptions> {
        Ok(ViewOptions {
            search_debounce: self.search_debounce()?,
            contact_reset: self.contact_reset()?,
            customer_annotation: self
                .ui
                .customer_annotation
                .clone()
                .unwrap_or_else(|| DEFAULT_CUSTOMER_ANNOTATION.to_owned()),
            assistant_annotation: self
                .ui
                .assistant_annotation
                .clone()
                .unwrap_or_else(|| DEFAULT_ASSISTANT_ANNOTATION.to_owned()),
        })
    }

    pub fn contact_details(&self) -> ContactDetails {
        let defaults = ContactDetails::default();
        ContactDetails {
            email: self.contact.email.clone().unwrap_or(defaults.email),
            recipient: self.contact.recipient.clone().unwrap_or(defaults.recipient),
            phone: self.contact.phone.clone().unwrap_or(defaults.phone),
            hours: self.contact.hours.clone().unwrap_or(defaults.hours),
        }
    }

    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_file(&self) -> Result<PathBuf> {
        if let Some(file) = &self.log.file {
            return Ok(PathBuf::from(file));
        }
        let data_root = dirs::data_dir().ok_or_else(|| {
            anyhow!("cannot resolve data directory; set [log].file to an explicit path")
        })?;
        Ok(data_root.join(APP_NAME).join("saira.log"))
    }

    pub fn example_config(path: &Path) -> String {
        let contact = ContactDetails::default();
        format!(
            "# saira config\n# Place this file at: {}\n\nversion = 1\n\n[source]\n# JSON endpoint returning an array of call records. SAIRA_SOURCE_URL is used when unset.\n# url = \"https://api.sheetbest.com/sheets/<sheet-id>\"\ntimeout = \"{}\"\n\n[ui]\nsearch_debounce = \"300ms\"\ncontact_reset = \"3s\"\ncustomer_annotation = \"{}\"\nassistant_annotation = \"{}\"\n\n[contact]\nemail = \"{}\"\nrecipient = \"{}\"\n# phone = \"+91-00000-00000\"\nhours = \"{}\"\n\n[log]\n# SAIRA_LOG overrides this filter.\nlevel = \"{}\"\n# Default is the platform data dir (for example ~/.local/share/saira/saira.log)\n# file = \"/absolute/path/to/saira.log\"\n",
            path.display(),
            DEFAULT_TIMEOUT,
            DEFAULT_CUSTOMER_ANNOTATION,
            DEFAULT_ASSISTANT_ANNOTATION,
            contact.email,
            contact.recipient,
            contact.hours,
            DEFAULT_LOG_LEVEL,
        )
    }
}

fn parse_duration(raw: &str) -> Result<Duration> {
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        let secs = mins
            .checked_mul(60)
            .ok_or_else(|| anyhow!("invalid duration {raw:?}; value is too large"))?;
        return Ok(Duration::from_secs(secs));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 300ms or 10s)")
}
