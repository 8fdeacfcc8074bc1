//! Generic fiscal document workflow (the base transitions every document type shares).

use fiscaledi_core::{DomainError, DomainResult, Entity};

use crate::document::{Document, EdocState};
use crate::error::EdocResult;

/// Base state machine consumed by the lifecycle layer.
///
/// Only [`BaseWorkflow::change_state`] is required; each named transition
/// defaults to the move the shared workflow performs. Implementations must not
/// run completion hooks (e.g. the denied hook) themselves: the lifecycle layer
/// runs them so document-type extensions get their turn.
pub trait BaseWorkflow: Send + Sync {
    /// Move `doc` to `new_state`, returning the previous state.
    fn change_state(&self, doc: &mut Document, new_state: EdocState) -> DomainResult<EdocState>;

    fn action_document_confirm(&self, doc: &mut Document) -> DomainResult<()> {
        self.change_state(doc, EdocState::ToSend).map(drop)
    }

    fn action_document_send(&self, doc: &mut Document) -> DomainResult<()> {
        self.change_state(doc, EdocState::Sent).map(drop)
    }

    fn action_document_back2draft(&self, doc: &mut Document) -> DomainResult<()> {
        self.change_state(doc, EdocState::Draft).map(drop)
    }

    fn action_document_cancel(&self, doc: &mut Document) -> DomainResult<()> {
        self.change_state(doc, EdocState::Cancelled).map(drop)
    }

    fn action_document_invalidate(&self, doc: &mut Document) -> DomainResult<()> {
        self.change_state(doc, EdocState::Invalidated).map(drop)
    }

    /// Corrections do not move the document; they require an authorized one.
    fn action_document_correction(&self, doc: &mut Document) -> DomainResult<()> {
        if doc.state() != EdocState::Authorized {
            return Err(DomainError::invariant(format!(
                "correction requires an authorized document (state: {:?})",
                doc.state()
            )));
        }
        Ok(())
    }

    /// Runs after a document entered [`EdocState::Denied`].
    fn exec_after_denied(
        &self,
        doc: &mut Document,
        old_state: EdocState,
        new_state: EdocState,
    ) -> DomainResult<()> {
        tracing::debug!(document_id = %doc.id(), ?old_state, ?new_state, "document denied");
        Ok(())
    }

    /// Send documents that are not transmitted to the tax authority
    /// (non-electronic, or issued by a third party). They are authorized as-is.
    fn no_electronic_document_send(&self, docs: &mut [&mut Document]) -> DomainResult<()> {
        for doc in docs.iter_mut() {
            self.change_state(doc, EdocState::Authorized)?;
        }
        Ok(())
    }
}

/// State change entry point handed to extension hooks.
///
/// Going through this (instead of [`Document::set_state`]) keeps transition
/// checks and completion hooks in play.
pub trait StateChange {
    fn change_state(&self, doc: &mut Document, new_state: EdocState) -> EdocResult<()>;
}

/// Table-driven default workflow.
#[derive(Debug, Default, Clone, Copy)]
pub struct StateMachine;

impl StateMachine {
    pub fn new() -> Self {
        Self
    }

    /// Legal moves. Draft may go straight to authorized for documents that are
    /// never transmitted.
    pub fn allows(from: EdocState, to: EdocState) -> bool {
        use EdocState::*;

        matches!(
            (from, to),
            (Draft, ToSend | Authorized | Invalidated)
                | (ToSend, Sent | Authorized | Rejected | Draft)
                | (Sent, Authorized | Rejected | Denied | ToSend)
                | (Rejected, Draft | ToSend | Authorized | Invalidated)
                | (Authorized, Cancelled | Draft)
        )
    }
}

impl BaseWorkflow for StateMachine {
    fn change_state(&self, doc: &mut Document, new_state: EdocState) -> DomainResult<EdocState> {
        let old_state = doc.state();
        if !Self::allows(old_state, new_state) {
            return Err(DomainError::invariant(format!(
                "illegal transition {old_state:?} -> {new_state:?}"
            )));
        }
        doc.set_state(new_state);
        tracing::debug!(document_id = %doc.id(), ?old_state, ?new_state, "state changed");
        Ok(old_state)
    }
}
