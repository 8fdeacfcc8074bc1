//! Runtime configuration for the e-doc lifecycle layer.

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};

use crate::document::TransmissionProcessor;

/// Version tag stamped on new documents (layout 4.00 of the NF-e schema).
pub const DEFAULT_DOCUMENT_VERSION: &str = "4.00";

/// Route under which stored attachments are served.
pub const DEFAULT_CONTENT_BASE_PATH: &str = "/web/content";

/// Base transition run before the cancel continuation.
///
/// Historically the cancel action ran the *confirm* transition before handing
/// over to the cancel continuation. `Confirm` keeps that behavior available
/// for deployments that depend on it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CancelBaseTransition {
    #[default]
    Cancel,
    Confirm,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdocConfig {
    pub document_version: String,
    pub content_base_path: String,
    pub default_processor: TransmissionProcessor,
    pub cancel_base_transition: CancelBaseTransition,
}

impl Default for EdocConfig {
    fn default() -> Self {
        Self {
            document_version: DEFAULT_DOCUMENT_VERSION.to_string(),
            content_base_path: DEFAULT_CONTENT_BASE_PATH.to_string(),
            default_processor: TransmissionProcessor::None,
            cancel_base_transition: CancelBaseTransition::Cancel,
        }
    }
}

impl EdocConfig {
    /// Build a config from `FISCALEDI_*` environment variables, falling back to defaults.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`EdocConfig::from_env`], reading through `lookup` (tests pass a map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Some(version) = lookup("FISCALEDI_DOCUMENT_VERSION") {
            if version.trim().is_empty() {
                bail!("FISCALEDI_DOCUMENT_VERSION must not be empty");
            }
            config.document_version = version.trim().to_string();
        }

        if let Some(base) = lookup("FISCALEDI_CONTENT_BASE") {
            config.content_base_path = base.trim_end_matches('/').to_string();
        }

        if let Some(processor) = lookup("FISCALEDI_DEFAULT_PROCESSOR") {
            config.default_processor = parse_lowercase(&processor)
                .with_context(|| format!("invalid FISCALEDI_DEFAULT_PROCESSOR: {processor:?}"))?;
        }

        if let Some(transition) = lookup("FISCALEDI_CANCEL_TRANSITION") {
            config.cancel_base_transition = parse_lowercase(&transition)
                .with_context(|| format!("invalid FISCALEDI_CANCEL_TRANSITION: {transition:?}"))?;
        }

        if config.cancel_base_transition == CancelBaseTransition::Confirm {
            tracing::warn!("cancel action configured to run the confirm base transition");
        }

        Ok(config)
    }
}

// Reuses the serde names so env values match the serialized config.
fn parse_lowercase<T: serde::de::DeserializeOwned>(raw: &str) -> anyhow::Result<T> {
    let value = serde_json::Value::String(raw.trim().to_ascii_lowercase());
    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_env() {
        let config = EdocConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, EdocConfig::default());
        assert_eq!(config.document_version, "4.00");
        assert_eq!(config.content_base_path, "/web/content");
    }

    #[test]
    fn reads_overrides() {
        let config = EdocConfig::from_lookup(lookup(&[
            ("FISCALEDI_DOCUMENT_VERSION", "3.10"),
            ("FISCALEDI_CONTENT_BASE", "/files/"),
            ("FISCALEDI_DEFAULT_PROCESSOR", "OCA"),
            ("FISCALEDI_CANCEL_TRANSITION", "confirm"),
        ]))
        .unwrap();

        assert_eq!(config.document_version, "3.10");
        assert_eq!(config.content_base_path, "/files");
        assert_eq!(config.default_processor, TransmissionProcessor::Oca);
        assert_eq!(config.cancel_base_transition, CancelBaseTransition::Confirm);
    }

    #[test]
    fn rejects_unknown_processor() {
        let err = EdocConfig::from_lookup(lookup(&[("FISCALEDI_DEFAULT_PROCESSOR", "sefaz")]))
            .unwrap_err();
        assert!(err.to_string().contains("FISCALEDI_DEFAULT_PROCESSOR"));
    }

    #[test]
    fn deserializes_partial_config() {
        let config: EdocConfig =
            serde_json::from_str(r#"{"cancel_base_transition":"confirm"}"#).unwrap();
        assert_eq!(config.cancel_base_transition, CancelBaseTransition::Confirm);
        assert_eq!(config.document_version, DEFAULT_DOCUMENT_VERSION);
    }
}
