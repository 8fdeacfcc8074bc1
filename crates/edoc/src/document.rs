use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fiscaledi_core::{AttachmentId, DomainError, DomainResult, DocumentId, Entity, EventId};

use crate::config::EdocConfig;
use crate::event::FiscalEvent;

/// Who issued the document.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Issuer {
    /// Issued by the filing company itself.
    #[serde(rename = "0")]
    Company,
    /// Issued by a third party (e.g. a supplier's invoice being registered).
    #[serde(rename = "1")]
    Partner,
}

/// Transmission backend configured for a document type.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransmissionProcessor {
    /// Nothing is transmitted; sending auto-authorizes.
    None,
    Oca,
}

/// Electronic document state, as driven by the workflow state machine.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdocState {
    Draft,
    ToSend,
    Sent,
    Rejected,
    Authorized,
    Cancelled,
    Denied,
    Invalidated,
}

/// `"{code} - {name}"` when `code` is non-empty, absent otherwise.
pub fn status_description(code: Option<&str>, name: Option<&str>) -> Option<String> {
    match code {
        Some(code) if !code.is_empty() => Some(format!("{} - {}", code, name.unwrap_or(""))),
        _ => None,
    }
}

/// Fiscal document with electronic lifecycle tracking.
///
/// The event log is append-only. The authorization/cancel/invalidate slots
/// point into the log, and every protocol/file accessor reads through them, so
/// those values cannot drift from the event they came from.
///
/// Deserialization goes through [`DocumentRecord`], which rebuilds the status
/// description and re-checks event ownership and slot targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "DocumentRecord")]
pub struct Document {
    id: DocumentId,
    document_electronic: bool,
    processor: TransmissionProcessor,
    state: EdocState,
    issuer: Option<Issuer>,

    status_code: Option<String>,
    status_name: Option<String>,
    status_description: Option<String>,

    document_version: String,
    is_edoc_printed: bool,

    events: Vec<FiscalEvent>,
    authorization_event_id: Option<EventId>,
    cancel_event_id: Option<EventId>,
    invalidate_event_id: Option<EventId>,

    file_report_id: Option<AttachmentId>,
}

impl Document {
    /// New draft, non-electronic document issued by the company.
    pub fn new(id: DocumentId, config: &EdocConfig) -> Self {
        Self {
            id,
            document_electronic: false,
            processor: config.default_processor,
            state: EdocState::Draft,
            issuer: Some(Issuer::Company),
            status_code: None,
            status_name: None,
            status_description: None,
            document_version: config.document_version.clone(),
            is_edoc_printed: false,
            events: Vec::new(),
            authorization_event_id: None,
            cancel_event_id: None,
            invalidate_event_id: None,
            file_report_id: None,
        }
    }

    /// Builder: mark the document as electronic, transmitted through `processor`.
    pub fn electronic(mut self, processor: TransmissionProcessor) -> Self {
        self.document_electronic = true;
        self.processor = processor;
        self
    }

    /// Builder: set the issuer.
    pub fn issued_by(mut self, issuer: Option<Issuer>) -> Self {
        self.issuer = issuer;
        self
    }

    pub fn id_typed(&self) -> DocumentId {
        self.id
    }

    pub fn document_electronic(&self) -> bool {
        self.document_electronic
    }

    pub fn set_document_electronic(&mut self, electronic: bool) {
        self.document_electronic = electronic;
    }

    pub fn processor(&self) -> TransmissionProcessor {
        self.processor
    }

    pub fn set_processor(&mut self, processor: TransmissionProcessor) {
        self.processor = processor;
    }

    pub fn issuer(&self) -> Option<Issuer> {
        self.issuer
    }

    pub fn set_issuer(&mut self, issuer: Option<Issuer>) {
        self.issuer = issuer;
    }

    /// Electronic and issued by the company: the only documents that are
    /// transmitted to the tax authority.
    pub fn is_company_electronic(&self) -> bool {
        self.document_electronic && self.issuer == Some(Issuer::Company)
    }

    pub fn state(&self) -> EdocState {
        self.state
    }

    /// Raw state write. Only workflow implementations should call this; they
    /// own the transition rules.
    pub fn set_state(&mut self, state: EdocState) {
        self.state = state;
    }

    pub fn document_version(&self) -> &str {
        &self.document_version
    }

    pub fn is_edoc_printed(&self) -> bool {
        self.is_edoc_printed
    }

    pub fn set_edoc_printed(&mut self, printed: bool) {
        self.is_edoc_printed = printed;
    }

    // --- status ------------------------------------------------------------

    pub fn status_code(&self) -> Option<&str> {
        self.status_code.as_deref()
    }

    pub fn status_name(&self) -> Option<&str> {
        self.status_name.as_deref()
    }

    pub fn status_description(&self) -> Option<&str> {
        self.status_description.as_deref()
    }

    pub fn set_status_code(&mut self, code: Option<String>) {
        self.status_code = code;
        self.refresh_status_description();
    }

    pub fn set_status_name(&mut self, name: Option<String>) {
        self.status_name = name;
        self.refresh_status_description();
    }

    /// Write both status fields at once (the usual shape of an authority response).
    pub fn set_status(&mut self, code: impl Into<String>, name: impl Into<String>) {
        self.status_code = Some(code.into());
        self.status_name = Some(name.into());
        self.refresh_status_description();
    }

    fn refresh_status_description(&mut self) {
        self.status_description =
            status_description(self.status_code.as_deref(), self.status_name.as_deref());
    }

    // --- validation --------------------------------------------------------

    /// Persistence-time checks. Electronic documents must carry an issuer.
    pub fn validate(&self) -> DomainResult<()> {
        if self.document_electronic && self.issuer.is_none() {
            return Err(DomainError::validation(
                "The field 'Issuer' is required for brazilian electronic documents!",
            ));
        }
        Ok(())
    }

    // --- events ------------------------------------------------------------

    /// All events, oldest first.
    pub fn events(&self) -> &[FiscalEvent] {
        &self.events
    }

    pub fn event_ids(&self) -> impl Iterator<Item = EventId> + '_ {
        self.events.iter().map(|e| *e.id())
    }

    pub fn event(&self, id: EventId) -> Option<&FiscalEvent> {
        self.events.iter().find(|e| *e.id() == id)
    }

    /// Correction letters (`type == "14"`), oldest first.
    pub fn correction_events(&self) -> impl Iterator<Item = &FiscalEvent> + '_ {
        self.events.iter().filter(|e| e.event_type().is_correction())
    }

    /// Append an event without pointing any slot at it.
    pub fn record_event(&mut self, event: FiscalEvent) -> DomainResult<EventId> {
        if event.document_id() != self.id {
            return Err(DomainError::invariant(format!(
                "event {} belongs to document {}, not {}",
                event.id(),
                event.document_id(),
                self.id
            )));
        }
        let id = *event.id();
        if self.event(id).is_some() {
            return Err(DomainError::conflict(format!("event {id} already recorded")));
        }
        self.events.push(event);
        Ok(id)
    }

    pub fn record_correction(&mut self, event: FiscalEvent) -> DomainResult<EventId> {
        self.record_event(event)
    }

    /// Append and make it the current authorization event.
    pub fn record_authorization(&mut self, event: FiscalEvent) -> DomainResult<EventId> {
        let id = self.record_event(event)?;
        self.authorization_event_id = Some(id);
        Ok(id)
    }

    pub fn record_cancellation(&mut self, event: FiscalEvent) -> DomainResult<EventId> {
        let id = self.record_event(event)?;
        self.cancel_event_id = Some(id);
        Ok(id)
    }

    pub fn record_invalidation(&mut self, event: FiscalEvent) -> DomainResult<EventId> {
        let id = self.record_event(event)?;
        self.invalidate_event_id = Some(id);
        Ok(id)
    }

    fn slot(&self, slot: Option<EventId>) -> Option<&FiscalEvent> {
        slot.and_then(|id| self.event(id))
    }

    pub fn authorization_event(&self) -> Option<&FiscalEvent> {
        self.slot(self.authorization_event_id)
    }

    pub fn cancel_event(&self) -> Option<&FiscalEvent> {
        self.slot(self.cancel_event_id)
    }

    pub fn invalidate_event(&self) -> Option<&FiscalEvent> {
        self.slot(self.invalidate_event_id)
    }

    pub fn authorization_date(&self) -> Option<DateTime<Utc>> {
        self.authorization_event().and_then(FiscalEvent::protocol_date)
    }

    pub fn authorization_protocol(&self) -> Option<&str> {
        self.authorization_event().and_then(FiscalEvent::protocol_number)
    }

    /// Request document sent for authorization.
    pub fn send_file_id(&self) -> Option<AttachmentId> {
        self.authorization_event().and_then(FiscalEvent::file_request_id)
    }

    /// Authority response to the authorization request.
    pub fn authorization_file_id(&self) -> Option<AttachmentId> {
        self.authorization_event().and_then(FiscalEvent::file_response_id)
    }

    pub fn cancel_date(&self) -> Option<DateTime<Utc>> {
        self.cancel_event().and_then(FiscalEvent::protocol_date)
    }

    pub fn cancel_protocol_number(&self) -> Option<&str> {
        self.cancel_event().and_then(FiscalEvent::protocol_number)
    }

    pub fn cancel_file_id(&self) -> Option<AttachmentId> {
        self.cancel_event().and_then(FiscalEvent::file_response_id)
    }

    pub fn invalidate_date(&self) -> Option<DateTime<Utc>> {
        self.invalidate_event().and_then(FiscalEvent::protocol_date)
    }

    pub fn invalidate_protocol_number(&self) -> Option<&str> {
        self.invalidate_event().and_then(FiscalEvent::protocol_number)
    }

    pub fn invalidate_file_id(&self) -> Option<AttachmentId> {
        self.invalidate_event().and_then(FiscalEvent::file_response_id)
    }

    // --- print artifact ----------------------------------------------------

    pub fn file_report_id(&self) -> Option<AttachmentId> {
        self.file_report_id
    }

    pub fn set_file_report(&mut self, attachment_id: Option<AttachmentId>) {
        self.file_report_id = attachment_id;
    }

    /// Copy for a new document: events, slots, status and the print artifact
    /// are left behind and the copy starts as a draft.
    pub fn duplicate(&self, id: DocumentId) -> Self {
        Self {
            id,
            document_electronic: self.document_electronic,
            processor: self.processor,
            state: EdocState::Draft,
            issuer: self.issuer,
            status_code: None,
            status_name: None,
            status_description: None,
            document_version: self.document_version.clone(),
            is_edoc_printed: self.is_edoc_printed,
            events: Vec::new(),
            authorization_event_id: None,
            cancel_event_id: None,
            invalidate_event_id: None,
            file_report_id: None,
        }
    }
}

/// Stored shape of a [`Document`]. The status description is derived and
/// therefore not read back.
#[derive(Debug, Deserialize)]
struct DocumentRecord {
    id: DocumentId,
    document_electronic: bool,
    processor: TransmissionProcessor,
    state: EdocState,
    issuer: Option<Issuer>,
    status_code: Option<String>,
    status_name: Option<String>,
    document_version: String,
    is_edoc_printed: bool,
    #[serde(default)]
    events: Vec<FiscalEvent>,
    authorization_event_id: Option<EventId>,
    cancel_event_id: Option<EventId>,
    invalidate_event_id: Option<EventId>,
    file_report_id: Option<AttachmentId>,
}

impl TryFrom<DocumentRecord> for Document {
    type Error = DomainError;

    fn try_from(record: DocumentRecord) -> Result<Self, Self::Error> {
        let mut doc = Self {
            id: record.id,
            document_electronic: record.document_electronic,
            processor: record.processor,
            state: record.state,
            issuer: record.issuer,
            status_code: record.status_code,
            status_name: record.status_name,
            status_description: None,
            document_version: record.document_version,
            is_edoc_printed: record.is_edoc_printed,
            events: Vec::with_capacity(record.events.len()),
            authorization_event_id: None,
            cancel_event_id: None,
            invalidate_event_id: None,
            file_report_id: record.file_report_id,
        };
        doc.refresh_status_description();

        for event in record.events {
            doc.record_event(event)?;
        }

        for (slot, id) in [
            ("authorization", record.authorization_event_id),
            ("cancel", record.cancel_event_id),
            ("invalidate", record.invalidate_event_id),
        ] {
            if let Some(id) = id {
                if doc.event(id).is_none() {
                    return Err(DomainError::invariant(format!(
                        "{slot} event {id} is not in the event log"
                    )));
                }
            }
        }
        doc.authorization_event_id = record.authorization_event_id;
        doc.cancel_event_id = record.cancel_event_id;
        doc.invalidate_event_id = record.invalidate_event_id;

        Ok(doc)
    }
}

impl Entity for Document {
    type Id = DocumentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventType;
    use proptest::prelude::*;

    fn config() -> EdocConfig {
        EdocConfig::default()
    }

    fn test_document() -> Document {
        Document::new(DocumentId::new(), &config()).electronic(TransmissionProcessor::Oca)
    }

    fn event_for(doc: &Document, kind: EventType) -> FiscalEvent {
        FiscalEvent::new(EventId::new(), doc.id_typed(), kind, Utc::now())
    }

    #[test]
    fn new_document_defaults() {
        let doc = Document::new(DocumentId::new(), &config());
        assert_eq!(doc.state(), EdocState::Draft);
        assert_eq!(doc.issuer(), Some(Issuer::Company));
        assert_eq!(doc.document_version(), "4.00");
        assert!(!doc.document_electronic());
        assert!(!doc.is_edoc_printed());
        assert!(doc.status_description().is_none());
        assert!(doc.events().is_empty());
    }

    #[test]
    fn status_description_follows_writes() {
        let mut doc = test_document();

        doc.set_status("100", "Autorizado o uso da NF-e");
        assert_eq!(doc.status_description(), Some("100 - Autorizado o uso da NF-e"));

        doc.set_status_name(Some("Rejeicao".to_string()));
        assert_eq!(doc.status_description(), Some("100 - Rejeicao"));

        doc.set_status_name(None);
        assert_eq!(doc.status_description(), Some("100 - "));

        doc.set_status_code(Some(String::new()));
        assert_eq!(doc.status_description(), None);

        doc.set_status_code(None);
        assert_eq!(doc.status_description(), None);
    }

    #[test]
    fn loading_rebuilds_status_description() {
        let mut doc = test_document();
        doc.set_status("100", "Autorizado");

        let mut json = serde_json::to_value(&doc).unwrap();
        json["status_description"] = serde_json::json!("999 - stale");

        let loaded: Document = serde_json::from_value(json).unwrap();
        assert_eq!(loaded.status_code(), Some("100"));
        assert_eq!(loaded.status_description(), Some("100 - Autorizado"));
        assert_eq!(loaded, doc);
    }

    #[test]
    fn loading_keeps_events_and_slots() {
        let mut doc = test_document();
        let response = AttachmentId::new();
        doc.record_authorization(
            event_for(&doc, EventType::Send)
                .with_protocol("141200000000001", Utc::now())
                .with_response_file(response),
        )
        .unwrap();
        doc.record_correction(event_for(&doc, EventType::Correction)).unwrap();

        let loaded: Document = serde_json::from_value(serde_json::to_value(&doc).unwrap()).unwrap();
        assert_eq!(loaded.authorization_file_id(), Some(response));
        assert_eq!(loaded.correction_events().count(), 1);
        assert_eq!(loaded, doc);
    }

    #[test]
    fn loading_rejects_events_of_another_document() {
        let mut doc = test_document();
        doc.record_authorization(event_for(&doc, EventType::Send)).unwrap();

        let mut json = serde_json::to_value(&doc).unwrap();
        json["id"] = serde_json::to_value(DocumentId::new()).unwrap();

        let err = serde_json::from_value::<Document>(json).unwrap_err();
        assert!(err.to_string().contains("belongs to document"));
    }

    #[test]
    fn loading_rejects_slot_outside_the_log() {
        let mut json = serde_json::to_value(test_document()).unwrap();
        json["cancel_event_id"] = serde_json::to_value(EventId::new()).unwrap();

        let err = serde_json::from_value::<Document>(json).unwrap_err();
        assert!(err.to_string().contains("cancel event"));
    }

    #[test]
    fn electronic_document_requires_issuer() {
        let doc = test_document().issued_by(None);
        let err = doc.validate().unwrap_err();
        match err {
            DomainError::Validation(msg) if msg.contains("'Issuer' is required") => {}
            other => panic!("expected issuer validation error, got {other:?}"),
        }

        assert!(test_document().issued_by(Some(Issuer::Partner)).validate().is_ok());
    }

    #[test]
    fn non_electronic_document_is_exempt_from_issuer_check() {
        let doc = Document::new(DocumentId::new(), &config()).issued_by(None);
        assert!(doc.validate().is_ok());
    }

    #[test]
    fn authorization_fields_read_through_the_event() {
        let mut doc = test_document();
        let request = AttachmentId::new();
        let response = AttachmentId::new();
        let at = Utc::now();

        let event = event_for(&doc, EventType::Send)
            .with_protocol("141200000000001", at)
            .with_request_file(request)
            .with_response_file(response);
        doc.record_authorization(event).unwrap();

        assert_eq!(doc.authorization_date(), Some(at));
        assert_eq!(doc.authorization_protocol(), Some("141200000000001"));
        assert_eq!(doc.send_file_id(), Some(request));
        assert_eq!(doc.authorization_file_id(), Some(response));
        assert!(doc.cancel_event().is_none());
        assert!(doc.invalidate_file_id().is_none());
    }

    #[test]
    fn latest_slot_event_wins_and_history_is_kept() {
        let mut doc = test_document();

        let first = event_for(&doc, EventType::Cancel).with_protocol("1", Utc::now());
        let second = event_for(&doc, EventType::Cancel).with_protocol("2", Utc::now());
        doc.record_cancellation(first).unwrap();
        doc.record_cancellation(second).unwrap();

        assert_eq!(doc.cancel_protocol_number(), Some("2"));
        assert_eq!(doc.events().len(), 2);
    }

    #[test]
    fn invalidation_slot_projects_response_file() {
        let mut doc = test_document();
        let response = AttachmentId::new();
        let event = event_for(&doc, EventType::Invalidate)
            .with_protocol("999", Utc::now())
            .with_response_file(response);
        doc.record_invalidation(event).unwrap();

        assert_eq!(doc.invalidate_protocol_number(), Some("999"));
        assert_eq!(doc.invalidate_file_id(), Some(response));
        assert!(doc.invalidate_date().is_some());
    }

    #[test]
    fn correction_view_filters_by_type() {
        let mut doc = test_document();
        doc.record_correction(event_for(&doc, EventType::Correction)).unwrap();
        doc.record_event(event_for(&doc, EventType::Send)).unwrap();
        doc.record_correction(event_for(&doc, EventType::from_code("14"))).unwrap();

        assert_eq!(doc.correction_events().count(), 2);
        assert_eq!(doc.event_ids().count(), 3);
    }

    #[test]
    fn foreign_events_are_rejected() {
        let mut doc = test_document();
        let other = test_document();
        let err = doc
            .record_authorization(event_for(&other, EventType::Send))
            .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
        assert!(doc.authorization_event().is_none());
    }

    #[test]
    fn same_event_cannot_be_recorded_twice() {
        let mut doc = test_document();
        let event = event_for(&doc, EventType::Send);
        doc.record_event(event.clone()).unwrap();
        let err = doc.record_authorization(event).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert!(doc.authorization_event().is_none());
    }

    #[test]
    fn duplicate_drops_lifecycle_data() {
        let older = EdocConfig {
            document_version: "3.10".to_string(),
            ..EdocConfig::default()
        };
        let mut doc = Document::new(DocumentId::new(), &older)
            .electronic(TransmissionProcessor::Oca)
            .issued_by(Some(Issuer::Partner));
        doc.set_status("100", "Autorizado");
        doc.set_edoc_printed(true);
        doc.set_file_report(Some(AttachmentId::new()));
        doc.set_state(EdocState::Authorized);
        doc.record_authorization(event_for(&doc, EventType::Send)).unwrap();

        let copy_id = DocumentId::new();
        let copy = doc.duplicate(copy_id);

        assert_eq!(copy.id_typed(), copy_id);
        assert!(copy.document_electronic());
        assert_eq!(copy.processor(), TransmissionProcessor::Oca);
        assert_eq!(copy.issuer(), Some(Issuer::Partner));
        assert_eq!(copy.state(), EdocState::Draft);
        assert!(copy.status_code().is_none());
        assert!(copy.status_description().is_none());
        assert!(copy.events().is_empty());
        assert!(copy.authorization_event().is_none());
        assert!(copy.file_report_id().is_none());
        assert_eq!(copy.document_version(), "3.10");
        assert!(copy.is_edoc_printed());
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: after any sequence of status writes the stored description
        /// equals the projection of the current code/name pair.
        #[test]
        fn status_description_is_never_stale(
            writes in prop::collection::vec(
                (
                    any::<bool>(),
                    prop::option::of("[0-9]{0,3}"),
                    prop::option::of("[a-zA-Z ]{0,12}"),
                ),
                1..12,
            )
        ) {
            let mut doc = test_document();
            for (write_code, code, name) in writes {
                if write_code {
                    doc.set_status_code(code);
                } else {
                    doc.set_status_name(name);
                }

                let expected = match doc.status_code() {
                    Some(c) if !c.is_empty() => {
                        Some(format!("{} - {}", c, doc.status_name().unwrap_or("")))
                    }
                    _ => None,
                };
                prop_assert_eq!(doc.status_description().map(str::to_string), expected);
            }
        }
    }
}
