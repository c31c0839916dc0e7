//! Relation-aware entity normalization
//!
//! [`RelationNormalizer`] renders an entity's own scalar fields and then decides, for
//! every declared relation, what to emit:
//!
//! | relation mode            | to-one relation                                     |
//! |--------------------------|-----------------------------------------------------|
//! | `Disabled` / `Ignored`   | key omitted                                         |
//! | `OnlyIdentifier`         | related primary key                                 |
//! | `OnlyFieldsOfSelf`       | related scalar fields                               |
//! | `SelfPlusOwnCollections` | related scalar fields + its collections, one level |
//!
//! To-many relations ignore the relation mode and are always rendered by
//! [`CollectionNormalizer`] under the active collection mode.
//!
//! Termination does not rely on a depth counter. Every recursive call site hands the
//! child a strictly more restrictive mode: the one extra level allowed by
//! `SelfPlusOwnCollections` renders collections in `WithoutRelations`, which in turn
//! forces both axes to `Ignored` for each member.

use crate::collection::CollectionNormalizer;
use crate::context::NormalizationContext;
use crate::error::{MetadataError, NormalizerError, Result};
use crate::fields::{FieldNormalizer, Record};
use crate::metadata::{Entity, MetadataOracle, RelationShape, RelationValue};
use crate::modes::{CollectionNormalizeMode, RelationNormalizeMode};
use serde_json::Value;

/// Normalizes one entity and its relations according to the relation mode
pub struct RelationNormalizer<'a, E: ?Sized> {
	metadata: &'a dyn MetadataOracle<E>,
	fields: &'a dyn FieldNormalizer<E>,
}

impl<E: ?Sized> Clone for RelationNormalizer<'_, E> {
	fn clone(&self) -> Self {
		*self
	}
}

impl<E: ?Sized> Copy for RelationNormalizer<'_, E> {}

impl<'a, E: Entity + ?Sized> RelationNormalizer<'a, E> {
	/// Create a relation normalizer over the given collaborators
	pub fn new(metadata: &'a dyn MetadataOracle<E>, fields: &'a dyn FieldNormalizer<E>) -> Self {
		Self { metadata, fields }
	}

	/// Whether this normalizer should handle the entity at all
	///
	/// Requires a mapped entity type with at least one relation, a relation mode other
	/// than `Disabled`, and no explicit attribute allow-list or deny-list in the
	/// context. Otherwise the caller's flat field path applies.
	pub fn supports_normalization(&self, entity: &E, context: &NormalizationContext) -> bool {
		let entity_type = entity.entity_type();
		if !self.metadata.is_known_entity_type(entity_type) {
			return false;
		}
		let has_relations = self
			.metadata
			.declared_relation_names(entity_type)
			.is_ok_and(|relations| !relations.is_empty());

		has_relations
			&& context.relation_mode() != RelationNormalizeMode::Disabled
			&& !context.has_attribute_projection()
	}

	/// Normalize an entity and its relations
	///
	/// # Errors
	///
	/// Fails with [`NormalizerError::Metadata`] when the entity type or one of its
	/// relations cannot be resolved, and with [`NormalizerError::Delegate`] when the
	/// base field normalizer fails. No partial record is returned.
	pub fn normalize(&self, entity: &E, context: &NormalizationContext) -> Result<Record> {
		let entity_type = entity.entity_type();
		let relations = self.metadata.declared_relation_names(entity_type)?;
		let mut record = self.normalize_only_self(entity, context)?;

		if !context.relation_mode().emits() && !context.collection_mode().emits() {
			return Ok(record);
		}

		tracing::debug!(
			entity_type,
			relation_mode = %context.relation_mode(),
			collection_mode = %context.collection_mode(),
			"Normalizing entity relations"
		);

		let collections = CollectionNormalizer::new(self.metadata, self.fields);
		for relation in relations {
			let normalized = match self.metadata.relation_value(entity, &relation)? {
				RelationValue::Many(members) => collections
					.normalize(&members, context)?
					.map(Value::Array),
				RelationValue::One(target) => self.normalize_to_one(target, context)?,
			};

			tracing::trace!(entity_type, relation = %relation, emitted = normalized.is_some());
			if let Some(value) = normalized {
				record.insert(relation, value);
			}
		}

		Ok(record)
	}

	fn normalize_to_one(
		&self,
		target: Option<&E>,
		context: &NormalizationContext,
	) -> Result<Option<Value>> {
		let value = match (context.relation_mode(), target) {
			(RelationNormalizeMode::Disabled | RelationNormalizeMode::Ignored, _) => return Ok(None),
			(_, None) => Value::Null,
			(RelationNormalizeMode::OnlyIdentifier, Some(target)) => {
				self.normalize_only_identifier(target)?
			}
			(RelationNormalizeMode::OnlyFieldsOfSelf, Some(target)) => {
				Value::Object(self.normalize_only_self(target, context)?)
			}
			(RelationNormalizeMode::SelfPlusOwnCollections, Some(target)) => {
				Value::Object(self.normalize_with_collections(target, context)?)
			}
		};
		Ok(Some(value))
	}

	/// Primary key of the entity, without touching any other field
	pub(crate) fn normalize_only_identifier(&self, entity: &E) -> Result<Value> {
		Ok(self.metadata.primary_key_values(entity)?.into_value())
	}

	/// Declared scalar fields of the entity, no relations
	fn normalize_only_self(
		&self,
		entity: &E,
		context: &NormalizationContext,
	) -> Result<Record> {
		let entity_type = entity.entity_type();
		let fields = self.metadata.declared_field_names(entity_type)?;
		self.fields
			.normalize_fields(entity, &fields, context)
			.map_err(|source| NormalizerError::delegate(entity_type, source))
	}

	/// Scalar fields plus every to-many relation rendered without relations
	fn normalize_with_collections(
		&self,
		entity: &E,
		context: &NormalizationContext,
	) -> Result<Record> {
		let entity_type = entity.entity_type();
		let mut record = self.normalize_only_self(entity, context)?;

		let child = context.forced(
			RelationNormalizeMode::Disabled,
			CollectionNormalizeMode::WithoutRelations,
		);
		let collections = CollectionNormalizer::new(self.metadata, self.fields);

		for relation in self.metadata.declared_relation_names(entity_type)? {
			if self.metadata.relation_shape(entity_type, &relation)? != RelationShape::ToMany {
				continue;
			}
			let RelationValue::Many(members) = self.metadata.relation_value(entity, &relation)?
			else {
				return Err(MetadataError::ShapeMismatch {
					entity_type: entity_type.to_string(),
					relation,
					expected: RelationShape::ToMany.to_string(),
				}
				.into());
			};
			if let Some(values) = collections.normalize(&members, &child)? {
				record.insert(relation, Value::Array(values));
			}
		}

		Ok(record)
	}
}
