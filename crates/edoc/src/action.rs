use serde::{Deserialize, Serialize};

use fiscaledi_core::ValueObject;

use crate::artifact::Attachment;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UrlTarget {
    NewTab,
    SameTab,
}

/// Instruction returned to the UI after a user-facing action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientAction {
    OpenUrl { url: String, target: UrlTarget },
}

impl ClientAction {
    /// Open `attachment` in a new tab, served from `content_base`.
    pub fn open_attachment(content_base: &str, attachment: &Attachment) -> Self {
        ClientAction::OpenUrl {
            url: format!(
                "{}/{}/{}",
                content_base.trim_end_matches('/'),
                attachment.id,
                attachment.name
            ),
            target: UrlTarget::NewTab,
        }
    }

    pub fn url(&self) -> &str {
        match self {
            ClientAction::OpenUrl { url, .. } => url,
        }
    }
}

impl ValueObject for ClientAction {}
