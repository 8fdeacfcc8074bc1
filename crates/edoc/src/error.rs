use thiserror::Error;

use fiscaledi_core::DomainError;

pub type EdocResult<T> = Result<T, EdocError>;

/// Kind of file an action expected to find on a document.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ArtifactKind {
    Xml,
    Pdf,
}

impl core::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ArtifactKind::Xml => f.write_str("XML"),
            ArtifactKind::Pdf => f.write_str("PDF"),
        }
    }
}

/// Errors surfaced by e-doc lifecycle actions.
///
/// All of them abort the current action and are reported to the user as-is.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EdocError {
    /// The artifact could not be produced even after a generation attempt.
    #[error("No {0} file generated!")]
    MissingArtifact(ArtifactKind),

    /// A single-record action was called on a selection of a different size.
    #[error("expected a single document, got {0}")]
    ExpectedSingleton(usize),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl EdocError {
    pub fn is_validation(&self) -> bool {
        matches!(self, EdocError::Domain(DomainError::Validation(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_artifact_messages() {
        assert_eq!(
            EdocError::MissingArtifact(ArtifactKind::Xml).to_string(),
            "No XML file generated!"
        );
        assert_eq!(
            EdocError::MissingArtifact(ArtifactKind::Pdf).to_string(),
            "No PDF file generated!"
        );
    }

    #[test]
    fn domain_errors_pass_through() {
        let err: EdocError = DomainError::validation("issuer").into();
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "validation failed: issuer");
    }
}
