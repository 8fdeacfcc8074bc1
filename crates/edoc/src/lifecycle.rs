//! E-doc lifecycle: two-phase workflow actions, transmission dispatch,
//! serialization and file retrieval.
//!
//! Every public action runs the generic transition from the [`BaseWorkflow`]
//! first and then the matching [`EdocExtension`] continuation. A failure in the
//! first phase skips the second.

use serde_json::Value as JsonValue;

use fiscaledi_core::{AttachmentId, DomainError, Entity};

use crate::action::ClientAction;
use crate::artifact::ArtifactStore;
use crate::config::{CancelBaseTransition, EdocConfig};
use crate::document::{Document, EdocState};
use crate::error::{ArtifactKind, EdocError, EdocResult};
use crate::extension::{BaseEdoc, EdocExtension};
use crate::workflow::{BaseWorkflow, StateChange, StateMachine};

/// Single-record precondition for UI actions.
pub fn ensure_one(selection: &mut [Document]) -> EdocResult<&mut Document> {
    let len = selection.len();
    match selection {
        [doc] => Ok(doc),
        _ => Err(EdocError::ExpectedSingleton(len)),
    }
}

pub struct EdocWorkflow<W = StateMachine, X = BaseEdoc> {
    base: W,
    extension: X,
    config: EdocConfig,
}

impl EdocWorkflow {
    /// Table-driven base workflow with no document-type extension.
    pub fn with_defaults(config: EdocConfig) -> Self {
        Self::new(StateMachine::new(), BaseEdoc, config)
    }
}

impl<W, X> EdocWorkflow<W, X>
where
    W: BaseWorkflow,
    X: EdocExtension,
{
    pub fn new(base: W, extension: X, config: EdocConfig) -> Self {
        Self {
            base,
            extension,
            config,
        }
    }

    pub fn config(&self) -> &EdocConfig {
        &self.config
    }

    pub fn base(&self) -> &W {
        &self.base
    }

    pub fn extension(&self) -> &X {
        &self.extension
    }

    // --- workflow actions ----------------------------------------------------

    pub fn action_document_confirm(&self, doc: &mut Document) -> EdocResult<()> {
        self.base.action_document_confirm(doc)?;
        self.extension.document_confirm_to_send(doc, self)
    }

    pub fn action_document_send(&self, doc: &mut Document) -> EdocResult<()> {
        self.base.action_document_send(doc)?;
        self.extension.action_document_send(doc, self)
    }

    pub fn action_document_back2draft(&self, doc: &mut Document) -> EdocResult<()> {
        self.base.action_document_back2draft(doc)?;
        self.extension.action_document_back2draft(doc, self)
    }

    /// The base transition is chosen by [`EdocConfig::cancel_base_transition`].
    pub fn action_document_cancel(&self, doc: &mut Document) -> EdocResult<()> {
        match self.config.cancel_base_transition {
            CancelBaseTransition::Cancel => self.base.action_document_cancel(doc)?,
            CancelBaseTransition::Confirm => {
                tracing::warn!(
                    document_id = %doc.id(),
                    "running confirm base transition for cancel action"
                );
                self.base.action_document_confirm(doc)?
            }
        }
        self.extension.action_document_cancel(doc, self)
    }

    pub fn action_document_invalidate(&self, doc: &mut Document) -> EdocResult<()> {
        self.base.action_document_invalidate(doc)?;
        self.extension.action_document_invalidate(doc, self)
    }

    pub fn action_document_correction(&self, doc: &mut Document) -> EdocResult<()> {
        self.base.action_document_correction(doc)?;
        self.extension.action_document_correction(doc, self)
    }

    pub fn exec_after_denied(
        &self,
        doc: &mut Document,
        old_state: EdocState,
        new_state: EdocState,
    ) -> EdocResult<()> {
        self.base.exec_after_denied(doc, old_state, new_state)?;
        self.extension.exec_after_denied(doc, old_state, new_state)
    }

    // --- transmission ----------------------------------------------------------

    /// Send a batch.
    ///
    /// Documents that are not electronic, or not issued by the company, take
    /// the base non-electronic path first; the rest go to the extension's
    /// electronic send.
    pub fn document_send(&self, docs: &mut [Document]) -> EdocResult<()> {
        let (mut no_electronic, mut electronic): (Vec<&mut Document>, Vec<&mut Document>) =
            docs.iter_mut().partition(|d| !d.is_company_electronic());

        tracing::info!(
            non_electronic = no_electronic.len(),
            electronic = electronic.len(),
            "dispatching document batch"
        );

        self.base.no_electronic_document_send(&mut no_electronic)?;
        self.extension.electronic_document_send(&mut electronic, self)
    }

    // --- serialization ---------------------------------------------------------

    /// Collect every document's payload. Empty unless the extension contributes.
    pub fn serialize(&self, docs: &[Document]) -> EdocResult<Vec<JsonValue>> {
        let mut edocs = Vec::new();
        for doc in docs {
            self.extension.serialize(doc, &mut edocs)?;
        }
        Ok(edocs)
    }

    pub fn document_status(&self, doc: &mut Document) -> EdocResult<Option<String>> {
        self.extension.document_status(doc)
    }

    // --- file retrieval ------------------------------------------------------

    /// Open the document's XML: the authorization response if present, the
    /// sent request otherwise. Exports once when neither exists.
    pub fn view_xml(
        &self,
        selection: &mut [Document],
        artifacts: &dyn ArtifactStore,
    ) -> EdocResult<ClientAction> {
        let doc = ensure_one(selection)?;

        let mut xml_file = doc.authorization_file_id().or_else(|| doc.send_file_id());
        if xml_file.is_none() {
            tracing::debug!(document_id = %doc.id(), "no XML on record; exporting");
            self.extension.document_export(doc, artifacts)?;
            xml_file = doc.authorization_file_id().or_else(|| doc.send_file_id());
        }

        let xml_file = xml_file.ok_or(EdocError::MissingArtifact(ArtifactKind::Xml))?;
        self.open_attachment(artifacts, xml_file)
    }

    /// Open the printed report, rendering it first when the report or the
    /// authorization response is missing.
    pub fn view_pdf(
        &self,
        selection: &mut [Document],
        artifacts: &dyn ArtifactStore,
    ) -> EdocResult<ClientAction> {
        let doc = ensure_one(selection)?;

        if doc.file_report_id().is_none() || doc.authorization_file_id().is_none() {
            self.extension.make_pdf(doc, artifacts)?;
        }

        let report = doc
            .file_report_id()
            .ok_or(EdocError::MissingArtifact(ArtifactKind::Pdf))?;
        self.open_attachment(artifacts, report)
    }

    fn open_attachment(
        &self,
        artifacts: &dyn ArtifactStore,
        attachment_id: AttachmentId,
    ) -> EdocResult<ClientAction> {
        let attachment = artifacts
            .get(attachment_id)
            .ok_or_else(|| DomainError::not_found(format!("attachment {attachment_id}")))?;
        Ok(ClientAction::open_attachment(&self.config.content_base_path, &attachment))
    }
}

impl<W, X> StateChange for EdocWorkflow<W, X>
where
    W: BaseWorkflow,
    X: EdocExtension,
{
    fn change_state(&self, doc: &mut Document, new_state: EdocState) -> EdocResult<()> {
        let old_state = self.base.change_state(doc, new_state)?;
        if new_state == EdocState::Denied && old_state != EdocState::Denied {
            self.exec_after_denied(doc, old_state, new_state)?;
        }
        Ok(())
    }
}
