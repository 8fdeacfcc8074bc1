use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fiscaledi_core::{AttachmentId, DocumentId, Entity, EventId};

/// Classification of a fiscal event, stored as the tax-authority code.
///
/// Only the codes this layer reasons about get their own variant; every other
/// code round-trips untouched through [`EventType::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventType {
    /// Batch submission of the document (`"0"`).
    Send,
    /// Cancellation (`"2"`).
    Cancel,
    /// Number-range invalidation (`"3"`).
    Invalidate,
    /// Correction letter (`"14"`).
    Correction,
    Other(String),
}

impl EventType {
    pub const CORRECTION_CODE: &'static str = "14";

    pub fn code(&self) -> &str {
        match self {
            EventType::Send => "0",
            EventType::Cancel => "2",
            EventType::Invalidate => "3",
            EventType::Correction => Self::CORRECTION_CODE,
            EventType::Other(code) => code,
        }
    }

    pub fn from_code(code: &str) -> Self {
        match code {
            "0" => EventType::Send,
            "2" => EventType::Cancel,
            "3" => EventType::Invalidate,
            Self::CORRECTION_CODE => EventType::Correction,
            other => EventType::Other(other.to_string()),
        }
    }

    pub fn is_correction(&self) -> bool {
        self.code() == Self::CORRECTION_CODE
    }
}

impl From<String> for EventType {
    fn from(value: String) -> Self {
        Self::from_code(&value)
    }
}

impl From<EventType> for String {
    fn from(value: EventType) -> Self {
        value.code().to_string()
    }
}

impl core::fmt::Display for EventType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

/// Immutable record of something that happened to a document at the tax authority.
///
/// Events are built once (constructor + `with_*` builders) and then handed to a
/// document's event log, which only ever exposes shared references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiscalEvent {
    id: EventId,
    document_id: DocumentId,
    #[serde(rename = "type")]
    event_type: EventType,
    protocol_date: Option<DateTime<Utc>>,
    protocol_number: Option<String>,
    /// Outbound document sent to the authority.
    file_request_id: Option<AttachmentId>,
    /// Authority response.
    file_response_id: Option<AttachmentId>,
    created_at: DateTime<Utc>,
}

impl FiscalEvent {
    pub fn new(
        id: EventId,
        document_id: DocumentId,
        event_type: EventType,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            document_id,
            event_type,
            protocol_date: None,
            protocol_number: None,
            file_request_id: None,
            file_response_id: None,
            created_at,
        }
    }

    pub fn with_protocol(mut self, number: impl Into<String>, date: DateTime<Utc>) -> Self {
        self.protocol_number = Some(number.into());
        self.protocol_date = Some(date);
        self
    }

    pub fn with_request_file(mut self, attachment_id: AttachmentId) -> Self {
        self.file_request_id = Some(attachment_id);
        self
    }

    pub fn with_response_file(mut self, attachment_id: AttachmentId) -> Self {
        self.file_response_id = Some(attachment_id);
        self
    }

    pub fn document_id(&self) -> DocumentId {
        self.document_id
    }

    pub fn event_type(&self) -> &EventType {
        &self.event_type
    }

    pub fn protocol_date(&self) -> Option<DateTime<Utc>> {
        self.protocol_date
    }

    pub fn protocol_number(&self) -> Option<&str> {
        self.protocol_number.as_deref()
    }

    pub fn file_request_id(&self) -> Option<AttachmentId> {
        self.file_request_id
    }

    pub fn file_response_id(&self) -> Option<AttachmentId> {
        self.file_response_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Entity for FiscalEvent {
    type Id = EventId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
