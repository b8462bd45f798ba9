// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use std::time::Duration;

pub const DEFAULT_CONTACT_RESET: Duration = Duration::from_secs(3);
pub const CONTACT_SUBJECT: &str = "Contact Form Submission";

/// Characters left alone by a URI component encoder.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactDetails {
    pub email: String,
    pub recipient: String,
    pub phone: String,
    pub hours: String,
}

impl Default for ContactDetails {
    fn default() -> Self {
        Self {
            email: "support@saira.example".to_owned(),
            recipient: "leads@saira.example".to_owned(),
            phone: String::new(),
            hours: "Monday - Friday, 9:00 AM - 6:00 PM IST".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactFormInput {
    pub email: String,
    pub message: String,
}

impl ContactFormInput {
    pub fn validate(&self) -> Result<()> {
        let email = self.email.trim();
        if email.is_empty() {
            bail!("email is required");
        }
        match email.split_once('@') {
            Some((local, domain))
                if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {}
            _ => bail!("email {email:?} is not a valid address"),
        }
        if self.message.trim().is_empty() {
            bail!("message is required");
        }
        Ok(())
    }

    pub fn mailto(&self, recipient: &str) -> String {
        mailto_link(recipient, Some(CONTACT_SUBJECT), Some(&self.message))
    }
}

pub fn mailto_link(recipient: &str, subject: Option<&str>, body: Option<&str>) -> String {
    let mut link = format!("mailto:{recipient}");
    let mut separator = '?';
    for (key, value) in [("subject", subject), ("body", body)] {
        if let Some(value) = value {
            link.push(separator);
            link.push_str(key);
            link.push('=');
            link.push_str(&utf8_percent_encode(value, URI_COMPONENT).to_string());
            separator = '&';
        }
    }
    link
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContactField {
    #[default]
    Email,
    Message,
}

impl ContactField {
    pub const fn next(self) -> Self {
        match self {
            Self::Email => Self::Message,
            Self::Message => Self::Email,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Email => "Email address",
            Self::Message => "Message",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactForm {
    pub input: ContactFormInput,
    pub focus: ContactField,
    pub submitted: bool,
    reset_token: u64,
}

impl ContactForm {
    #[cfg(test)]
    fn focused_text(&self) -> &str {
        match self.focus {
            ContactField::Email => &self.input.email,
            ContactField::Message => &self.input.message,
        }
    }

    /// Edits are ignored while the thank-you message is showing.
    pub fn focused_text_mut(&mut self) -> Option<&mut String> {
        if self.submitted {
            return None;
        }
        Some(match self.focus {
            ContactField::Email => &mut self.input.email,
            ContactField::Message => &mut self.input.message,
        })
    }

    /// Validates, marks the form submitted, and returns the mailto link plus
    /// the token the reset timer must carry.
    pub fn submit(&mut self, recipient: &str) -> Result<(String, u64)> {
        if self.submitted {
            bail!("message already sent");
        }
        self.input.validate()?;
        self.submitted = true;
        self.reset_token = self.reset_token.wrapping_add(1);
        Ok((self.input.mailto(recipient), self.reset_token))
    }

    /// Clears the form if `token` belongs to the latest submission.
    pub fn reset(&mut self, token: u64) -> bool {
        if !self.submitted || token != self.reset_token {
            return false;
        }
        self.input = ContactFormInput::default();
        self.focus = ContactField::Email;
        self.submitted = false;
        true
    }
}
