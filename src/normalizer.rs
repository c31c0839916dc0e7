//! Entry point for application code
//!
//! [`EntityNormalizer`] owns the metadata oracle, the base field normalizer and the
//! process-wide default context. Each call merges the defaults with the call context
//! and routes the entity to the relation-aware path or to the flat field path.

use crate::collection::CollectionNormalizer;
use crate::context::NormalizationContext;
use crate::error::{NormalizerError, Result};
use crate::fields::{FieldNormalizer, Record};
use crate::metadata::{Entity, MetadataOracle};
use crate::relation::RelationNormalizer;
use crate::settings::NormalizerSettings;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Policy-driven normalizer for ORM-managed entities
///
/// # Examples
///
/// ```
/// use entity_normalizer::{
///     EntityNormalizer, EntityRegistry, EntitySchema, Entity, NormalizationContext,
///     RelationNormalizeMode, RelationValue, SerdeFieldNormalizer,
/// };
/// use serde::Serialize;
/// use serde_json::{json, Value};
///
/// #[derive(Serialize)]
/// struct Tag {
///     id: i64,
///     label: String,
///     #[serde(skip)]
///     parent: Option<Box<Tag>>,
/// }
///
/// impl Entity for Tag {
///     fn entity_type(&self) -> &str {
///         "Tag"
///     }
/// }
///
/// fn tag_field(tag: &Tag, name: &str) -> Option<Value> {
///     (name == "id").then(|| json!(tag.id))
/// }
///
/// fn tag_relation<'e>(tag: &'e Tag, name: &str) -> Option<RelationValue<'e, Tag>> {
///     (name == "parent").then(|| RelationValue::One(tag.parent.as_deref()))
/// }
///
/// let registry = EntityRegistry::new()
///     .with_schema(
///         EntitySchema::new("Tag", tag_field, tag_relation)
///             .fields_from(["id", "label"])
///             .to_one("parent"),
///     )
///     .unwrap();
/// let normalizer = EntityNormalizer::new(registry, SerdeFieldNormalizer::new());
///
/// let root = Tag { id: 1, label: "rust".to_string(), parent: None };
/// let child = Tag { id: 2, label: "serde".to_string(), parent: Some(Box::new(root)) };
///
/// let context = NormalizationContext::new()
///     .with_relation_mode(RelationNormalizeMode::OnlyIdentifier);
/// let record = normalizer.normalize(&child, &context).unwrap();
/// assert_eq!(Value::Object(record), json!({"id": 2, "label": "serde", "parent": 1}));
/// ```
pub struct EntityNormalizer<E: ?Sized> {
	metadata: Arc<dyn MetadataOracle<E>>,
	fields: Arc<dyn FieldNormalizer<E>>,
	defaults: NormalizationContext,
}

impl<E: Entity + ?Sized> EntityNormalizer<E> {
	/// Create a normalizer with empty defaults (both modes `Disabled`)
	pub fn new<M, F>(metadata: M, fields: F) -> Self
	where
		M: MetadataOracle<E> + 'static,
		F: FieldNormalizer<E> + 'static,
	{
		Self::from_shared(Arc::new(metadata), Arc::new(fields))
	}

	/// Create a normalizer over collaborators shared with other components
	pub fn from_shared(
		metadata: Arc<dyn MetadataOracle<E>>,
		fields: Arc<dyn FieldNormalizer<E>>,
	) -> Self {
		Self {
			metadata,
			fields,
			defaults: NormalizationContext::new(),
		}
	}

	/// Use the given settings as process-wide defaults
	pub fn with_settings(mut self, settings: &NormalizerSettings) -> Self {
		self.defaults = settings.to_context();
		self
	}

	/// Use the given context as process-wide defaults
	pub fn with_defaults(mut self, defaults: NormalizationContext) -> Self {
		self.defaults = defaults;
		self
	}

	/// Default context every call is merged onto
	pub fn defaults(&self) -> &NormalizationContext {
		&self.defaults
	}

	/// Normalize one entity
	///
	/// The relation-aware path handles the entity when its type is mapped, has
	/// relations, the relation mode is not `Disabled` and no attribute projection was
	/// requested. Otherwise only the declared scalar fields are rendered, narrowed by
	/// the `attributes` and `ignored_attributes` options.
	///
	/// # Errors
	///
	/// Fails with [`NormalizerError::Metadata`] for unmapped types and with
	/// [`NormalizerError::Delegate`] when the base field normalizer fails.
	pub fn normalize(&self, entity: &E, context: &NormalizationContext) -> Result<Record> {
		let context = self.defaults.merged_with(context);
		let relations = self.relation_normalizer();

		if relations.supports_normalization(entity, &context) {
			return relations.normalize(entity, &context);
		}

		tracing::debug!(
			entity_type = entity.entity_type(),
			"Relation expansion not applicable, rendering declared fields"
		);
		self.normalize_flat(entity, &context)
	}

	/// Normalize the members of a collection
	///
	/// Returns `None` when the active collection mode omits collections.
	pub fn normalize_collection(
		&self,
		members: &[&E],
		context: &NormalizationContext,
	) -> Result<Option<Vec<Value>>> {
		let context = self.defaults.merged_with(context);
		CollectionNormalizer::new(self.metadata.as_ref(), self.fields.as_ref())
			.normalize(members, &context)
	}

	/// Normalize one entity using loosely typed named options
	///
	/// # Errors
	///
	/// Fails with [`NormalizerError::Configuration`] for unknown mode strings or
	/// mistyped options, before any entity is read.
	pub fn normalize_with_options(&self, entity: &E, options: &Map<String, Value>) -> Result<Record> {
		let context = NormalizationContext::from_options(options)?;
		self.normalize(entity, &context)
	}

	fn relation_normalizer(&self) -> RelationNormalizer<'_, E> {
		RelationNormalizer::new(self.metadata.as_ref(), self.fields.as_ref())
	}

	fn normalize_flat(&self, entity: &E, context: &NormalizationContext) -> Result<Record> {
		let entity_type = entity.entity_type();
		let mut fields = self.metadata.declared_field_names(entity_type)?;

		if let Some(allowed) = context.attributes() {
			fields.retain(|field| allowed.contains(field));
		}
		if let Some(ignored) = context.ignored_attributes() {
			fields.retain(|field| !ignored.contains(field));
		}

		self.fields
			.normalize_fields(entity, &fields, context)
			.map_err(|source| NormalizerError::delegate(entity_type, source))
	}
}

impl<E: ?Sized> fmt::Debug for EntityNormalizer<E> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("EntityNormalizer")
			.field("defaults", &self.defaults)
			.finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::ConfigurationError;
	use crate::fields::SerdeFieldNormalizer;
	use crate::modes::{CollectionNormalizeMode, RelationNormalizeMode};
	use crate::test_utils::{Row, author, library_registry};
	use rstest::{fixture, rstest};
	use serde_json::json;

	#[fixture]
	fn normalizer() -> EntityNormalizer<Row> {
		EntityNormalizer::new(library_registry(), SerdeFieldNormalizer::new())
	}

	fn options(value: Value) -> Map<String, Value> {
		match value {
			Value::Object(map) => map,
			_ => unreachable!(),
		}
	}

	#[rstest]
	fn test_disabled_mode_renders_declared_fields_only(normalizer: EntityNormalizer<Row>) {
		// Act
		let record = normalizer
			.normalize(&author(), &NormalizationContext::new())
			.unwrap();

		// Assert
		assert_eq!(Value::Object(record), json!({"id": 1, "name": "A"}));
	}

	#[rstest]
	fn test_defaults_apply_when_call_is_silent(normalizer: EntityNormalizer<Row>) {
		// Arrange
		let normalizer = normalizer.with_settings(&NormalizerSettings::new(
			RelationNormalizeMode::OnlyIdentifier,
			CollectionNormalizeMode::OnlyIdentifier,
		));

		// Act
		let record = normalizer
			.normalize(&author(), &NormalizationContext::new())
			.unwrap();

		// Assert
		assert_eq!(
			Value::Object(record),
			json!({"id": 1, "name": "A", "publisher": 5, "books": [10, 11]})
		);
	}

	#[rstest]
	fn test_call_context_wins_over_defaults(normalizer: EntityNormalizer<Row>) {
		// Arrange
		let normalizer = normalizer.with_defaults(
			NormalizationContext::new()
				.with_relation_mode(RelationNormalizeMode::OnlyIdentifier)
				.with_collection_mode(CollectionNormalizeMode::OnlyIdentifier),
		);
		let call = NormalizationContext::new().with_collection_mode(CollectionNormalizeMode::Ignored);

		// Act
		let record = normalizer.normalize(&author(), &call).unwrap();

		// Assert
		assert_eq!(
			Value::Object(record),
			json!({"id": 1, "name": "A", "publisher": 5})
		);
	}

	#[rstest]
	fn test_attribute_projection_uses_flat_path(normalizer: EntityNormalizer<Row>) {
		// Arrange
		let call = NormalizationContext::new()
			.with_relation_mode(RelationNormalizeMode::SelfPlusOwnCollections)
			.with_attributes(["name", "books"]);

		// Act
		let record = normalizer.normalize(&author(), &call).unwrap();

		// Assert
		assert_eq!(Value::Object(record), json!({"name": "A"}));
	}

	#[rstest]
	fn test_ignored_attributes_narrow_flat_path(normalizer: EntityNormalizer<Row>) {
		// Arrange
		let call = NormalizationContext::new().with_ignored_attributes(["name"]);

		// Act
		let record = normalizer.normalize(&author(), &call).unwrap();

		// Assert
		assert_eq!(Value::Object(record), json!({"id": 1}));
	}

	#[rstest]
	fn test_unknown_type_on_flat_path_is_metadata_error(normalizer: EntityNormalizer<Row>) {
		// Arrange
		let ghost = Row::new("Ghost", json!({"id": 1}));

		// Act
		let err = normalizer
			.normalize(&ghost, &NormalizationContext::new())
			.unwrap_err();

		// Assert
		assert!(err.is_metadata_error());
	}

	#[rstest]
	fn test_normalize_with_options(normalizer: EntityNormalizer<Row>) {
		// Arrange
		let opts = options(json!({
			"relation_normalize_mode": "ONLY_ID",
			"collection_normalize_mode": "WITHOUT_RELATIONS",
		}));

		// Act
		let record = normalizer.normalize_with_options(&author(), &opts).unwrap();

		// Assert
		assert_eq!(
			Value::Object(record),
			json!({
				"id": 1,
				"name": "A",
				"publisher": 5,
				"books": [{"id": 10, "title": "T1"}, {"id": 11, "title": "T2"}],
			})
		);
	}

	#[rstest]
	fn test_normalize_with_options_rejects_unknown_mode(normalizer: EntityNormalizer<Row>) {
		// Arrange
		let opts = options(json!({"relation_normalize_mode": "EVERYTHING"}));

		// Act
		let err = normalizer
			.normalize_with_options(&author(), &opts)
			.unwrap_err();

		// Assert
		assert!(matches!(
			err,
			NormalizerError::Configuration(ConfigurationError::InvalidRelationMode(ref raw))
				if raw == "EVERYTHING"
		));
	}

	#[rstest]
	fn test_normalize_collection_merges_defaults(normalizer: EntityNormalizer<Row>) {
		// Arrange
		let normalizer = normalizer.with_defaults(
			NormalizationContext::new().with_collection_mode(CollectionNormalizeMode::OnlyIdentifier),
		);
		let first = author();
		let second = Row::new("Author", json!({"id": 2, "name": "B"}));

		// Act
		let values = normalizer
			.normalize_collection(&[&first, &second], &NormalizationContext::new())
			.unwrap();

		// Assert
		assert_eq!(values, Some(vec![json!(1), json!(2)]));
	}

	#[rstest]
	fn test_normalizer_is_shareable_across_threads(normalizer: EntityNormalizer<Row>) {
		fn assert_send_sync<T: Send + Sync>(_: &T) {}
		assert_send_sync(&normalizer);
	}
}
