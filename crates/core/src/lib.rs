//! `fiscaledi-core` — shared building blocks for the fiscal document crates.
//!
//! This crate contains **pure domain** primitives (identifiers, markers, errors)
//! and no storage or transport concerns.

pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{AttachmentId, DocumentId, EventId};
pub use value_object::ValueObject;
