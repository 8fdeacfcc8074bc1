//! Electronic fiscal document (e-doc) lifecycle for Brazilian tax compliance.
//!
//! This crate layers authorization/cancel/invalidate/correction tracking on top
//! of a generic fiscal document workflow. It contains deterministic domain
//! logic plus small in-memory stores; transmission, XML and PDF generation are
//! supplied by [`EdocExtension`] implementations.

pub mod action;
pub mod artifact;
pub mod config;
pub mod document;
pub mod error;
pub mod event;
pub mod extension;
pub mod lifecycle;
pub mod repository;
pub mod workflow;

pub use action::{ClientAction, UrlTarget};
pub use artifact::{ArtifactStore, Attachment, InMemoryArtifactStore};
pub use config::{CancelBaseTransition, EdocConfig};
pub use document::{Document, EdocState, Issuer, TransmissionProcessor};
pub use error::{ArtifactKind, EdocError, EdocResult};
pub use event::{EventType, FiscalEvent};
pub use extension::{BaseEdoc, EdocExtension, authorize_without_processor};
pub use lifecycle::{EdocWorkflow, ensure_one};
pub use repository::{DocumentRepository, InMemoryDocumentRepository};
pub use workflow::{BaseWorkflow, StateChange, StateMachine};
