//! Error types for entity normalization
//!
//! Every failure aborts the enclosing normalization call. Nothing is retried and no
//! partial record is ever returned: normalization is a pure projection, so running it
//! again would fail the same way.

use thiserror::Error;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, NormalizerError>;

/// Boxed error returned by a [`FieldNormalizer`](crate::fields::FieldNormalizer)
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised while resolving entity metadata
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetadataError {
	/// The entity type has no association mapping
	#[error("Unknown entity type: {0}")]
	UnknownEntityType(String),

	/// The relation is not declared on the entity type
	#[error("Unknown relation '{relation}' on entity type {entity_type}")]
	UnknownRelation {
		entity_type: String,
		relation: String,
	},

	/// The live relation value does not match the declared shape
	#[error("Relation '{relation}' on {entity_type} is declared {expected} but holds a different value")]
	ShapeMismatch {
		entity_type: String,
		relation: String,
		expected: String,
	},

	/// A primary-key column could not be read from the entity
	#[error("Primary key column '{column}' is missing on entity type {entity_type}")]
	MissingPrimaryKey { entity_type: String, column: String },

	/// An entity schema failed validation at registration time
	#[error("Invalid schema for {entity_type}: {message}")]
	InvalidSchema {
		entity_type: String,
		message: String,
	},
}

/// Errors raised while reading normalization options
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfigurationError {
	/// Unrecognized `relation_normalize_mode` value
	#[error("Invalid relation normalize mode: {0}")]
	InvalidRelationMode(String),

	/// Unrecognized `collection_normalize_mode` value
	#[error("Invalid collection normalize mode: {0}")]
	InvalidCollectionMode(String),

	/// A recognized option carried a value of the wrong type
	#[error("Invalid value for option '{name}': {reason}")]
	InvalidOption { name: String, reason: String },

	/// Settings document could not be parsed
	#[cfg(feature = "toml")]
	#[error("Failed to parse settings: {0}")]
	Toml(#[from] toml::de::Error),

	/// Environment variable held an unusable value
	#[error("Invalid environment variable {name}: {reason}")]
	Env { name: String, reason: String },
}

/// Top-level error for a normalization call
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum NormalizerError {
	/// Metadata lookup failed
	#[error(transparent)]
	Metadata(#[from] MetadataError),

	/// The base field normalizer failed
	#[error("Field normalization failed for {entity_type}: {source}")]
	Delegate {
		entity_type: String,
		#[source]
		source: BoxError,
	},

	/// Normalization options were invalid
	#[error(transparent)]
	Configuration(#[from] ConfigurationError),
}

impl NormalizerError {
	/// Wrap a base field normalizer failure
	pub fn delegate(entity_type: impl Into<String>, source: impl Into<BoxError>) -> Self {
		NormalizerError::Delegate {
			entity_type: entity_type.into(),
			source: source.into(),
		}
	}

	/// Check if this is a metadata error
	pub fn is_metadata_error(&self) -> bool {
		matches!(self, NormalizerError::Metadata(_))
	}

	/// Check if this is a configuration error
	pub fn is_configuration_error(&self) -> bool {
		matches!(self, NormalizerError::Configuration(_))
	}
}
