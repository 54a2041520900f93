//! Email messages handed to the mail sending function
//!
//! Emails are created through [`Mailer::new_email`](crate::Mailer::new_email)
//! so that domain and sender always match the mailer, and completed with the
//! `with_*` builders.

use std::collections::BTreeMap;
use std::fmt;

use dusted_fault::{ResultExt, SystemFailure};
use serde::{Deserialize, Serialize};

/// Email message to be published
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Email {
    pub trace_id: Option<String>,
    pub domain: String,
    pub sender: String,
    pub recipients: Vec<String>,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
    pub reply_to: Option<String>,
    pub subject: String,
    pub plaintext: Option<String>,
    pub html: Option<String>,
    pub template_name: Option<String>,
    pub template_data: BTreeMap<String, String>,
}

impl Email {
    pub(crate) fn new(domain: &str, sender: &str, subject: String, recipients: Vec<String>) -> Self {
        Self {
            trace_id: None,
            domain: domain.to_string(),
            sender: sender.to_string(),
            recipients,
            cc: Vec::new(),
            bcc: Vec::new(),
            reply_to: None,
            subject,
            plaintext: None,
            html: None,
            template_name: None,
            template_data: BTreeMap::new(),
        }
    }

    /// Trace ID forwarded as a message attribute
    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    pub fn with_cc<I, S>(mut self, cc: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cc = cc.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_bcc<I, S>(mut self, bcc: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.bcc = bcc.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_reply_to(mut self, reply_to: impl Into<String>) -> Self {
        self.reply_to = Some(reply_to.into());
        self
    }

    /// Add plain text body content
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.plaintext = Some(text.into());
        self
    }

    /// Add HTML body content
    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }

    /// Render the body from a named template instead
    pub fn with_template(
        mut self,
        name: impl Into<String>,
        data: BTreeMap<String, String>,
    ) -> Self {
        self.template_name = Some(name.into());
        self.template_data = data;
        self
    }

    /// Encode the email for publishing
    pub fn to_bytes(&self) -> Result<Vec<u8>, SystemFailure> {
        serde_json::to_vec(self).wrap_system("mailer", "to_bytes", "failed to encode email message")
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "email: {{ from: \"{}\", to: [{}], subject: \"{}\" }}",
            self.sender,
            self.recipients.join(", "),
            self.subject
        )
    }
}
