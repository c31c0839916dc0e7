//! Per-call normalization context
//!
//! A [`NormalizationContext`] carries both expansion modes, the caller's attribute
//! projection, and pass-through options for the base field normalizer. It is built
//! once per call by merging the process-wide defaults with the call-specific
//! context (call values win) and then threaded explicitly through every recursive
//! call.

use crate::error::ConfigurationError;
use crate::modes::{CollectionNormalizeMode, RelationNormalizeMode};
use serde_json::{Map, Value};

/// Option name for the relation axis
pub const RELATION_NORMALIZE_MODE: &str = "relation_normalize_mode";

/// Option name for the collection axis
pub const COLLECTION_NORMALIZE_MODE: &str = "collection_normalize_mode";

/// Option name for an explicit attribute allow-list
pub const ATTRIBUTES: &str = "attributes";

/// Option name for an explicit attribute deny-list
pub const IGNORED_ATTRIBUTES: &str = "ignored_attributes";

/// Typed normalization options
///
/// Unset modes behave as `Disabled`.
///
/// # Examples
///
/// ```
/// use entity_normalizer::{CollectionNormalizeMode, NormalizationContext, RelationNormalizeMode};
///
/// let defaults = NormalizationContext::new()
///     .with_relation_mode(RelationNormalizeMode::OnlyIdentifier)
///     .with_collection_mode(CollectionNormalizeMode::OnlyIdentifier);
/// let call = NormalizationContext::new()
///     .with_collection_mode(CollectionNormalizeMode::WithoutRelations);
///
/// let merged = defaults.merged_with(&call);
/// assert_eq!(merged.relation_mode(), RelationNormalizeMode::OnlyIdentifier);
/// assert_eq!(merged.collection_mode(), CollectionNormalizeMode::WithoutRelations);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizationContext {
	relation_mode: Option<RelationNormalizeMode>,
	collection_mode: Option<CollectionNormalizeMode>,
	attributes: Option<Vec<String>>,
	ignored_attributes: Option<Vec<String>>,
	extra: Map<String, Value>,
}

impl NormalizationContext {
	/// Create an empty context
	pub fn new() -> Self {
		Self::default()
	}

	/// Set the relation mode
	pub fn with_relation_mode(mut self, mode: RelationNormalizeMode) -> Self {
		self.relation_mode = Some(mode);
		self
	}

	/// Set the collection mode
	pub fn with_collection_mode(mut self, mode: CollectionNormalizeMode) -> Self {
		self.collection_mode = Some(mode);
		self
	}

	/// Restrict output to the given attributes
	pub fn with_attributes<I, S>(mut self, attributes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.attributes = Some(attributes.into_iter().map(Into::into).collect());
		self
	}

	/// Exclude the given attributes from output
	pub fn with_ignored_attributes<I, S>(mut self, attributes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.ignored_attributes = Some(attributes.into_iter().map(Into::into).collect());
		self
	}

	/// Add a pass-through option for the base field normalizer
	pub fn with_option(mut self, name: impl Into<String>, value: Value) -> Self {
		self.extra.insert(name.into(), value);
		self
	}

	/// Build a context from loosely typed named options
	///
	/// Recognized keys are parsed into their typed form; every other key is kept as a
	/// pass-through option. A `null` value leaves the option unset.
	///
	/// # Errors
	///
	/// Returns [`ConfigurationError`] for unknown mode strings or values of the wrong
	/// type.
	pub fn from_options(options: &Map<String, Value>) -> Result<Self, ConfigurationError> {
		let mut context = Self::new();
		for (name, value) in options {
			if value.is_null() {
				continue;
			}
			match name.as_str() {
				RELATION_NORMALIZE_MODE => {
					context.relation_mode = Some(option_str(name, value)?.parse()?);
				}
				COLLECTION_NORMALIZE_MODE => {
					context.collection_mode = Some(option_str(name, value)?.parse()?);
				}
				ATTRIBUTES => context.attributes = Some(option_str_list(name, value)?),
				IGNORED_ATTRIBUTES => {
					context.ignored_attributes = Some(option_str_list(name, value)?);
				}
				_ => {
					context.extra.insert(name.clone(), value.clone());
				}
			}
		}
		Ok(context)
	}

	/// Merge `overrides` on top of `self`
	///
	/// Every option set in `overrides` replaces the one in `self`; pass-through options
	/// are merged key by key.
	pub fn merged_with(&self, overrides: &NormalizationContext) -> Self {
		let mut extra = self.extra.clone();
		for (name, value) in &overrides.extra {
			extra.insert(name.clone(), value.clone());
		}
		Self {
			relation_mode: overrides.relation_mode.or(self.relation_mode),
			collection_mode: overrides.collection_mode.or(self.collection_mode),
			attributes: overrides
				.attributes
				.clone()
				.or_else(|| self.attributes.clone()),
			ignored_attributes: overrides
				.ignored_attributes
				.clone()
				.or_else(|| self.ignored_attributes.clone()),
			extra,
		}
	}

	/// Copy of this context with both axes forced to the given modes
	pub(crate) fn forced(
		&self,
		relation_mode: RelationNormalizeMode,
		collection_mode: CollectionNormalizeMode,
	) -> Self {
		let mut child = self.clone();
		child.relation_mode = Some(relation_mode);
		child.collection_mode = Some(collection_mode);
		child
	}

	/// Active relation mode (`Disabled` when unset)
	pub fn relation_mode(&self) -> RelationNormalizeMode {
		self.relation_mode.unwrap_or_default()
	}

	/// Active collection mode (`Disabled` when unset)
	pub fn collection_mode(&self) -> CollectionNormalizeMode {
		self.collection_mode.unwrap_or_default()
	}

	/// Explicit attribute allow-list, if any
	pub fn attributes(&self) -> Option<&[String]> {
		self.attributes.as_deref()
	}

	/// Explicit attribute deny-list, if any
	pub fn ignored_attributes(&self) -> Option<&[String]> {
		self.ignored_attributes.as_deref()
	}

	/// Whether the caller asked for an unmanaged field projection
	pub fn has_attribute_projection(&self) -> bool {
		self.attributes.is_some() || self.ignored_attributes.is_some()
	}

	/// Pass-through option by name
	pub fn option(&self, name: &str) -> Option<&Value> {
		self.extra.get(name)
	}

	/// All pass-through options
	pub fn options(&self) -> &Map<String, Value> {
		&self.extra
	}
}

fn option_str<'v>(name: &str, value: &'v Value) -> Result<&'v str, ConfigurationError> {
	value.as_str().ok_or_else(|| ConfigurationError::InvalidOption {
		name: name.to_string(),
		reason: format!("expected a string, got {}", value),
	})
}

fn option_str_list(name: &str, value: &Value) -> Result<Vec<String>, ConfigurationError> {
	let invalid = || ConfigurationError::InvalidOption {
		name: name.to_string(),
		reason: format!("expected an array of strings, got {}", value),
	};
	value
		.as_array()
		.ok_or_else(invalid)?
		.iter()
		.map(|item| item.as_str().map(String::from).ok_or_else(invalid))
		.collect()
}
