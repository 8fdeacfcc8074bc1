//! Document-type extension points.
//!
//! Transmission modules (NF-e, NFS-e, CT-e, ...) implement [`EdocExtension`] to
//! plug their behavior in after each generic transition. Every method has a
//! default that does nothing (or, for [`EdocExtension::electronic_document_send`],
//! only auto-authorizes documents without a transmission processor), so an
//! implementation overrides just what it needs.

use serde_json::Value as JsonValue;

use crate::artifact::ArtifactStore;
use crate::document::{Document, EdocState, TransmissionProcessor};
use crate::error::EdocResult;
use crate::workflow::StateChange;

pub trait EdocExtension: Send + Sync {
    fn document_confirm_to_send(
        &self,
        _doc: &mut Document,
        _ctx: &dyn StateChange,
    ) -> EdocResult<()> {
        Ok(())
    }

    fn action_document_send(&self, _doc: &mut Document, _ctx: &dyn StateChange) -> EdocResult<()> {
        Ok(())
    }

    fn action_document_back2draft(
        &self,
        _doc: &mut Document,
        _ctx: &dyn StateChange,
    ) -> EdocResult<()> {
        Ok(())
    }

    fn action_document_cancel(
        &self,
        _doc: &mut Document,
        _ctx: &dyn StateChange,
    ) -> EdocResult<()> {
        Ok(())
    }

    fn action_document_invalidate(
        &self,
        _doc: &mut Document,
        _ctx: &dyn StateChange,
    ) -> EdocResult<()> {
        Ok(())
    }

    fn action_document_correction(
        &self,
        _doc: &mut Document,
        _ctx: &dyn StateChange,
    ) -> EdocResult<()> {
        Ok(())
    }

    fn exec_after_denied(
        &self,
        _doc: &mut Document,
        _old_state: EdocState,
        _new_state: EdocState,
    ) -> EdocResult<()> {
        Ok(())
    }

    /// Transmit company-issued electronic documents.
    ///
    /// Overrides handle documents with a real processor and should call
    /// [`authorize_without_processor`] for the rest.
    fn electronic_document_send(
        &self,
        docs: &mut [&mut Document],
        ctx: &dyn StateChange,
    ) -> EdocResult<()> {
        authorize_without_processor(docs, ctx)
    }

    /// Append this document's payload to `edocs`.
    fn serialize(&self, _doc: &Document, _edocs: &mut Vec<JsonValue>) -> EdocResult<()> {
        Ok(())
    }

    /// Produce the XML artifacts (request/authorization files).
    fn document_export(
        &self,
        _doc: &mut Document,
        _artifacts: &dyn ArtifactStore,
    ) -> EdocResult<()> {
        Ok(())
    }

    /// Render the printable report into `file_report_id`.
    fn make_pdf(&self, _doc: &mut Document, _artifacts: &dyn ArtifactStore) -> EdocResult<()> {
        Ok(())
    }

    /// Human-readable status, possibly refreshed from the authority.
    fn document_status(&self, _doc: &mut Document) -> EdocResult<Option<String>> {
        Ok(None)
    }
}

/// Electronic documents configured with [`TransmissionProcessor::None`] have
/// nothing to transmit and are authorized directly. Others are left untouched.
pub fn authorize_without_processor(
    docs: &mut [&mut Document],
    ctx: &dyn StateChange,
) -> EdocResult<()> {
    for doc in docs
        .iter_mut()
        .filter(|d| d.document_electronic() && d.processor() == TransmissionProcessor::None)
    {
        ctx.change_state(doc, EdocState::Authorized)?;
    }
    Ok(())
}

/// Extension with every default in place.
#[derive(Debug, Default, Clone, Copy)]
pub struct BaseEdoc;

impl EdocExtension for BaseEdoc {}
