//! Collection normalization for to-many relations

use crate::context::NormalizationContext;
use crate::error::Result;
use crate::fields::FieldNormalizer;
use crate::metadata::{Entity, MetadataOracle};
use crate::modes::{CollectionNormalizeMode, RelationNormalizeMode};
use crate::relation::RelationNormalizer;
use serde_json::Value;

/// Renders the members of a to-many relation according to the collection mode
///
/// Output follows the source iteration order. Members are never sorted or
/// deduplicated, and one failing member fails the whole collection.
pub struct CollectionNormalizer<'a, E: ?Sized> {
	metadata: &'a dyn MetadataOracle<E>,
	fields: &'a dyn FieldNormalizer<E>,
}

impl<E: ?Sized> Clone for CollectionNormalizer<'_, E> {
	fn clone(&self) -> Self {
		*self
	}
}

impl<E: ?Sized> Copy for CollectionNormalizer<'_, E> {}

impl<'a, E: Entity + ?Sized> CollectionNormalizer<'a, E> {
	/// Create a collection normalizer over the given collaborators
	pub fn new(metadata: &'a dyn MetadataOracle<E>, fields: &'a dyn FieldNormalizer<E>) -> Self {
		Self { metadata, fields }
	}

	/// Whether collections are rendered at all under this context
	pub fn supports_normalization(&self, context: &NormalizationContext) -> bool {
		context.collection_mode() != CollectionNormalizeMode::Disabled
	}

	/// Normalize the members of a collection
	///
	/// Returns `None` when the collection must be omitted from the parent record.
	pub fn normalize(
		&self,
		members: &[&E],
		context: &NormalizationContext,
	) -> Result<Option<Vec<Value>>> {
		let mode = context.collection_mode();
		tracing::trace!(collection_mode = %mode, members = members.len(), "Normalizing collection");

		let relations = RelationNormalizer::new(self.metadata, self.fields);
		let values = match mode {
			CollectionNormalizeMode::Disabled | CollectionNormalizeMode::Ignored => return Ok(None),
			CollectionNormalizeMode::OnlyIdentifier => members
				.iter()
				.map(|member| relations.normalize_only_identifier(member))
				.collect::<Result<Vec<_>>>()?,
			CollectionNormalizeMode::WithoutRelations => {
				let child = context.forced(
					RelationNormalizeMode::Ignored,
					CollectionNormalizeMode::Ignored,
				);
				members
					.iter()
					.map(|member| relations.normalize(member, &child).map(Value::Object))
					.collect::<Result<Vec<_>>>()?
			}
		};

		Ok(Some(values))
	}
}
