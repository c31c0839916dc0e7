//! Process-wide default normalization settings
//!
//! Settings are the defaults every call context is merged onto. They can be built in
//! code, read from a TOML document, or taken from environment variables:
//!
//! - `ENTITY_NORMALIZER_RELATION_MODE`: relation axis default (e.g., `ONLY_ID`)
//! - `ENTITY_NORMALIZER_COLLECTION_MODE`: collection axis default (e.g., `WITHOUT_RELATIONS`)

use crate::context::NormalizationContext;
use crate::error::ConfigurationError;
use crate::modes::{CollectionNormalizeMode, RelationNormalizeMode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Environment variable for the default relation mode
pub const RELATION_MODE_ENV: &str = "ENTITY_NORMALIZER_RELATION_MODE";

/// Environment variable for the default collection mode
pub const COLLECTION_MODE_ENV: &str = "ENTITY_NORMALIZER_COLLECTION_MODE";

/// Default normalization settings
///
/// # Examples
///
/// ```
/// use entity_normalizer::{NormalizerSettings, RelationNormalizeMode};
///
/// let settings = NormalizerSettings::from_toml_str(r#"
///     relation_normalize_mode = "ONLY_SELF"
///     collection_normalize_mode = "ONLY_ID"
/// "#).unwrap();
/// assert_eq!(settings.relation_normalize_mode, Some(RelationNormalizeMode::OnlyFieldsOfSelf));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NormalizerSettings {
	/// Default relation mode
	#[serde(default)]
	pub relation_normalize_mode: Option<RelationNormalizeMode>,
	/// Default collection mode
	#[serde(default)]
	pub collection_normalize_mode: Option<CollectionNormalizeMode>,
	/// Default pass-through options for the base field normalizer
	#[serde(default)]
	pub options: Map<String, Value>,
}

impl NormalizerSettings {
	/// Create settings with both modes set
	pub fn new(relation: RelationNormalizeMode, collection: CollectionNormalizeMode) -> Self {
		Self {
			relation_normalize_mode: Some(relation),
			collection_normalize_mode: Some(collection),
			options: Map::new(),
		}
	}

	/// Parse settings from a TOML document
	///
	/// # Errors
	///
	/// Returns [`ConfigurationError::Toml`] on malformed documents, unknown keys or
	/// unknown mode spellings.
	#[cfg(feature = "toml")]
	pub fn from_toml_str(document: &str) -> Result<Self, ConfigurationError> {
		Ok(toml::from_str(document)?)
	}

	/// Read settings from the process environment
	///
	/// Unset variables leave the corresponding mode unset.
	pub fn from_env() -> Result<Self, ConfigurationError> {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	/// Read settings through an arbitrary variable lookup
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigurationError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let mut settings = Self::default();

		if let Some(raw) = lookup(RELATION_MODE_ENV) {
			settings.relation_normalize_mode =
				Some(raw.trim().parse().map_err(|e: ConfigurationError| {
					ConfigurationError::Env {
						name: RELATION_MODE_ENV.to_string(),
						reason: e.to_string(),
					}
				})?);
		}

		if let Some(raw) = lookup(COLLECTION_MODE_ENV) {
			settings.collection_normalize_mode =
				Some(raw.trim().parse().map_err(|e: ConfigurationError| {
					ConfigurationError::Env {
						name: COLLECTION_MODE_ENV.to_string(),
						reason: e.to_string(),
					}
				})?);
		}

		tracing::debug!(
			relation_mode = ?settings.relation_normalize_mode,
			collection_mode = ?settings.collection_normalize_mode,
			"Loaded normalizer settings from environment"
		);

		Ok(settings)
	}

	/// Default context every call context is merged onto
	pub fn to_context(&self) -> NormalizationContext {
		let mut context = NormalizationContext::new();
		if let Some(mode) = self.relation_normalize_mode {
			context = context.with_relation_mode(mode);
		}
		if let Some(mode) = self.collection_normalize_mode {
			context = context.with_collection_mode(mode);
		}
		for (name, value) in &self.options {
			context = context.with_option(name.clone(), value.clone());
		}
		context
	}
}
