//! Expansion modes for the relation and collection axes
//!
//! Each axis is a closed enum. The wire spelling (`ONLY_ID`, `ONLY_SELF_WIC`, ...) is
//! what settings files and option maps carry; parsing also accepts the snake-case
//! variant names. Unknown spellings are a [`ConfigurationError`], never a silent
//! fallback to `Disabled`.

use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How to-one relations are rendered
///
/// # Examples
///
/// ```
/// use entity_normalizer::RelationNormalizeMode;
///
/// let mode: RelationNormalizeMode = "ONLY_SELF_WIC".parse().unwrap();
/// assert_eq!(mode, RelationNormalizeMode::SelfPlusOwnCollections);
/// assert_eq!(mode.as_str(), "ONLY_SELF_WIC");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RelationNormalizeMode {
	/// Relation expansion turned off by the caller
	#[default]
	#[serde(rename = "DISABLED", alias = "disabled")]
	Disabled,
	/// Emit the related entity's primary key only
	#[serde(rename = "ONLY_ID", alias = "only_identifier")]
	OnlyIdentifier,
	/// Emit the related entity's own scalar fields
	#[serde(rename = "ONLY_SELF", alias = "only_fields_of_self")]
	OnlyFieldsOfSelf,
	/// Emit the related entity's scalar fields plus its to-many relations, one level
	#[serde(rename = "ONLY_SELF_WIC", alias = "self_plus_own_collections")]
	SelfPlusOwnCollections,
	/// Relation traversal forbidden at this nesting level
	#[serde(rename = "IGNORED", alias = "ignored")]
	Ignored,
}

impl RelationNormalizeMode {
	/// Wire spelling of the mode
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Disabled => "DISABLED",
			Self::OnlyIdentifier => "ONLY_ID",
			Self::OnlyFieldsOfSelf => "ONLY_SELF",
			Self::SelfPlusOwnCollections => "ONLY_SELF_WIC",
			Self::Ignored => "IGNORED",
		}
	}

	/// Whether a to-one relation produces any output under this mode
	pub fn emits(&self) -> bool {
		match self {
			Self::Disabled | Self::Ignored => false,
			Self::OnlyIdentifier | Self::OnlyFieldsOfSelf | Self::SelfPlusOwnCollections => true,
		}
	}
}

impl fmt::Display for RelationNormalizeMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for RelationNormalizeMode {
	type Err = ConfigurationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"DISABLED" | "disabled" => Ok(Self::Disabled),
			"ONLY_ID" | "only_identifier" => Ok(Self::OnlyIdentifier),
			"ONLY_SELF" | "only_fields_of_self" => Ok(Self::OnlyFieldsOfSelf),
			"ONLY_SELF_WIC" | "self_plus_own_collections" => Ok(Self::SelfPlusOwnCollections),
			"IGNORED" | "ignored" => Ok(Self::Ignored),
			_ => Err(ConfigurationError::InvalidRelationMode(s.to_string())),
		}
	}
}

/// How the members of a to-many relation are rendered
///
/// # Examples
///
/// ```
/// use entity_normalizer::CollectionNormalizeMode;
///
/// let mode: CollectionNormalizeMode = "without_relations".parse().unwrap();
/// assert_eq!(mode, CollectionNormalizeMode::WithoutRelations);
/// assert!("WITHOUT_RELATION".parse::<CollectionNormalizeMode>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CollectionNormalizeMode {
	/// Collection rendering turned off by the caller
	#[default]
	#[serde(rename = "DISABLED", alias = "disabled")]
	Disabled,
	/// Emit each member's primary key
	#[serde(rename = "ONLY_ID", alias = "only_identifier")]
	OnlyIdentifier,
	/// Emit each member's own scalar fields
	#[serde(rename = "WITHOUT_RELATIONS", alias = "without_relations")]
	WithoutRelations,
	/// Collection traversal forbidden at this nesting level
	#[serde(rename = "IGNORED", alias = "ignored")]
	Ignored,
}

impl CollectionNormalizeMode {
	/// Wire spelling of the mode
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Disabled => "DISABLED",
			Self::OnlyIdentifier => "ONLY_ID",
			Self::WithoutRelations => "WITHOUT_RELATIONS",
			Self::Ignored => "IGNORED",
		}
	}

	/// Whether a collection produces any output under this mode
	pub fn emits(&self) -> bool {
		match self {
			Self::Disabled | Self::Ignored => false,
			Self::OnlyIdentifier | Self::WithoutRelations => true,
		}
	}
}

impl fmt::Display for CollectionNormalizeMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for CollectionNormalizeMode {
	type Err = ConfigurationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"DISABLED" | "disabled" => Ok(Self::Disabled),
			"ONLY_ID" | "only_identifier" => Ok(Self::OnlyIdentifier),
			"WITHOUT_RELATIONS" | "without_relations" => Ok(Self::WithoutRelations),
			"IGNORED" | "ignored" => Ok(Self::Ignored),
			_ => Err(ConfigurationError::InvalidCollectionMode(s.to_string())),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("DISABLED", RelationNormalizeMode::Disabled)]
	#[case("ONLY_ID", RelationNormalizeMode::OnlyIdentifier)]
	#[case("only_identifier", RelationNormalizeMode::OnlyIdentifier)]
	#[case("ONLY_SELF", RelationNormalizeMode::OnlyFieldsOfSelf)]
	#[case("ONLY_SELF_WIC", RelationNormalizeMode::SelfPlusOwnCollections)]
	#[case("self_plus_own_collections", RelationNormalizeMode::SelfPlusOwnCollections)]
	#[case("IGNORED", RelationNormalizeMode::Ignored)]
	fn test_relation_mode_parses(#[case] input: &str, #[case] expected: RelationNormalizeMode) {
		// Act
		let mode: RelationNormalizeMode = input.parse().unwrap();

		// Assert
		assert_eq!(mode, expected);
	}

	#[rstest]
	#[case("ONLY_IDS")]
	#[case("only_self_wic")]
	#[case("")]
	fn test_relation_mode_rejects_typos(#[case] input: &str) {
		// Act
		let err = input.parse::<RelationNormalizeMode>().unwrap_err();

		// Assert
		assert!(matches!(err, ConfigurationError::InvalidRelationMode(ref s) if s == input));
	}

	#[rstest]
	#[case("DISABLED", CollectionNormalizeMode::Disabled)]
	#[case("ONLY_ID", CollectionNormalizeMode::OnlyIdentifier)]
	#[case("WITHOUT_RELATIONS", CollectionNormalizeMode::WithoutRelations)]
	#[case("ignored", CollectionNormalizeMode::Ignored)]
	fn test_collection_mode_parses(
		#[case] input: &str,
		#[case] expected: CollectionNormalizeMode,
	) {
		// Act
		let mode: CollectionNormalizeMode = input.parse().unwrap();

		// Assert
		assert_eq!(mode, expected);
	}

	#[rstest]
	fn test_collection_mode_rejects_relation_only_spelling() {
		// Act
		let result = "ONLY_SELF".parse::<CollectionNormalizeMode>();

		// Assert
		assert_eq!(
			result.unwrap_err().to_string(),
			"Invalid collection normalize mode: ONLY_SELF"
		);
	}

	#[rstest]
	fn test_display_matches_wire_spelling() {
		assert_eq!(
			RelationNormalizeMode::SelfPlusOwnCollections.to_string(),
			"ONLY_SELF_WIC"
		);
		assert_eq!(
			CollectionNormalizeMode::WithoutRelations.to_string(),
			"WITHOUT_RELATIONS"
		);
	}

	#[rstest]
	fn test_serde_uses_wire_spelling() {
		// Arrange
		let mode = RelationNormalizeMode::OnlyIdentifier;

		// Act
		let json = serde_json::to_value(mode).unwrap();
		let back: RelationNormalizeMode = serde_json::from_value(json.clone()).unwrap();

		// Assert
		assert_eq!(json, serde_json::json!("ONLY_ID"));
		assert_eq!(back, mode);
	}

	#[rstest]
	fn test_emits() {
		assert!(!RelationNormalizeMode::Disabled.emits());
		assert!(!RelationNormalizeMode::Ignored.emits());
		assert!(RelationNormalizeMode::OnlyFieldsOfSelf.emits());
		assert!(!CollectionNormalizeMode::Ignored.emits());
		assert!(CollectionNormalizeMode::OnlyIdentifier.emits());
	}
}
